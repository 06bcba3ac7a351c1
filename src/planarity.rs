//! Planarity test.
//!
//! The graph is split into biconnected blocks (a graph is planar iff every
//! block is), and each block is embedded by path addition (Demoucron,
//! Malgrange and Pertuiset): start from a cycle, then repeatedly take a
//! fragment of the not-yet-embedded part and route one of its paths through a
//! face that contains all of the fragment's contact vertices. A fragment with
//! no such face proves the block non-planar.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::Graph;

const UNVISITED: usize = usize::MAX;

pub fn is_planar(graph: &Graph) -> bool {
  let n = graph.node_count();
  let m = graph.edge_count();
  if !euler_bound_allows(n, m) {
    return false;
  }
  if m <= 8 || n <= 4 {
    return true;
  }
  biconnected_components(&graph.adjacency())
    .iter()
    .all(|block| block_is_planar(block))
}

/// `m <= 3n - 6` holds for every planar graph with `n >= 3`.
fn euler_bound_allows(n: usize, m: usize) -> bool {
  n < 3 || m <= 3 * n - 6
}

/// =============== Biconnected blocks (Hopcroft–Tarjan) ===============

struct BlockSearch<'a> {
  adj: &'a [Vec<usize>],
  disc: Vec<usize>,
  low: Vec<usize>,
  time: usize,
  stack: Vec<(usize, usize)>,
  blocks: Vec<Vec<(usize, usize)>>,
}

impl BlockSearch<'_> {
  fn enter(&mut self, u: usize) {
    self.time += 1;
    self.disc[u] = self.time;
    self.low[u] = self.time;
  }

  /// Depth-first search from `root` with an explicit stack of
  /// `(vertex, parent, next neighbor index)` frames.
  fn visit(&mut self, root: usize) {
    let adj = self.adj;
    self.enter(root);
    let mut frames = vec![(root, UNVISITED, 0)];

    while let Some(frame) = frames.last_mut() {
      let (u, parent, next) = *frame;
      if let Some(&v) = adj[u].get(next) {
        frame.2 += 1;
        if self.disc[v] == UNVISITED {
          self.stack.push((u, v));
          self.enter(v);
          frames.push((v, u, 0));
        } else if v != parent && self.disc[v] < self.disc[u] {
          self.stack.push((u, v));
          self.low[u] = self.low[u].min(self.disc[v]);
        }
        continue;
      }

      frames.pop();
      let Some(&(p, _, _)) = frames.last() else {
        continue;
      };
      self.low[p] = self.low[p].min(self.low[u]);
      if self.low[u] >= self.disc[p] {
        // p separates the subtree of u: everything above (p, u) is one block
        let mut block = Vec::new();
        while let Some(e) = self.stack.pop() {
          block.push(e);
          if e == (p, u) {
            break;
          }
        }
        self.blocks.push(block);
      }
    }
  }
}

/// Edge sets of the biconnected components; isolated vertices yield none.
fn biconnected_components(adj: &[Vec<usize>]) -> Vec<Vec<(usize, usize)>> {
  let n = adj.len();
  let mut search = BlockSearch {
    adj,
    disc: vec![UNVISITED; n],
    low: vec![0; n],
    time: 0,
    stack: Vec::new(),
    blocks: Vec::new(),
  };
  for root in 0..n {
    if search.disc[root] == UNVISITED && !adj[root].is_empty() {
      search.visit(root);
    }
  }
  search.blocks
}

fn block_is_planar(block: &[(usize, usize)]) -> bool {
  let mut index: HashMap<usize, usize> = HashMap::new();
  for &(u, v) in block {
    let next = index.len();
    index.entry(u).or_insert(next);
    let next = index.len();
    index.entry(v).or_insert(next);
  }
  let k = index.len();
  let m = block.len();
  if !euler_bound_allows(k, m) {
    return false;
  }
  if m <= 8 || k <= 4 {
    return true;
  }

  let mut adj = vec![Vec::new(); k];
  for &(u, v) in block {
    let (a, b) = (index[&u], index[&v]);
    adj[a].push(b);
    adj[b].push(a);
  }
  for neighbors in &mut adj {
    neighbors.sort_unstable();
  }
  PathEmbedding::embed(&adj, m)
}

/// =============== Path addition on one block ===============

fn edge_key(u: usize, v: usize) -> (usize, usize) {
  if u < v { (u, v) } else { (v, u) }
}

/// A piece of the block not yet embedded: either a single chord between two
/// embedded vertices (`interior` empty) or a component of non-embedded
/// vertices together with its attachment edges.
struct Fragment {
  contacts: Vec<usize>,
  interior: Vec<usize>,
}

struct PathEmbedding<'a> {
  adj: &'a [Vec<usize>],
  embedded: Vec<bool>,
  edges: HashSet<(usize, usize)>,
  // each face is a simple cycle of vertices
  faces: Vec<Vec<usize>>,
}

impl<'a> PathEmbedding<'a> {
  fn embed(adj: &'a [Vec<usize>], edge_count: usize) -> bool {
    let Some(cycle) = initial_cycle(adj) else {
      return true;
    };
    let mut emb = PathEmbedding {
      adj,
      embedded: vec![false; adj.len()],
      edges: HashSet::new(),
      faces: vec![cycle.clone(), cycle.clone()],
    };
    for (i, &v) in cycle.iter().enumerate() {
      emb.embedded[v] = true;
      emb.edges.insert(edge_key(v, cycle[(i + 1) % cycle.len()]));
    }

    while emb.edges.len() < edge_count {
      let fragments = emb.fragments();
      let mut forced = None;
      let mut fallback = None;
      for (fi, fragment) in fragments.iter().enumerate() {
        let admissible = emb.admissible_faces(fragment);
        match admissible.as_slice() {
          [] => return false,
          [face] if forced.is_none() => forced = Some((fi, *face)),
          [face, ..] if fallback.is_none() => fallback = Some((fi, *face)),
          _ => {}
        }
      }
      let Some((fi, face)) = forced.or(fallback) else {
        // no fragments left while edges remain: cannot happen in a block
        return true;
      };
      let path = emb.fragment_path(&fragments[fi]);
      emb.split_face(face, &path);
    }
    true
  }

  fn fragments(&self) -> Vec<Fragment> {
    let n = self.adj.len();
    let mut fragments = Vec::new();

    for u in 0..n {
      if !self.embedded[u] {
        continue;
      }
      for &v in &self.adj[u] {
        if u < v && self.embedded[v] && !self.edges.contains(&(u, v)) {
          fragments.push(Fragment { contacts: vec![u, v], interior: Vec::new() });
        }
      }
    }

    let mut seen = vec![false; n];
    for start in 0..n {
      if self.embedded[start] || seen[start] {
        continue;
      }
      let mut interior = Vec::new();
      let mut contacts = Vec::new();
      let mut queue = VecDeque::from([start]);
      seen[start] = true;
      while let Some(x) = queue.pop_front() {
        interior.push(x);
        for &y in &self.adj[x] {
          if self.embedded[y] {
            contacts.push(y);
          } else if !seen[y] {
            seen[y] = true;
            queue.push_back(y);
          }
        }
      }
      contacts.sort_unstable();
      contacts.dedup();
      fragments.push(Fragment { contacts, interior });
    }
    fragments
  }

  fn admissible_faces(&self, fragment: &Fragment) -> Vec<usize> {
    self
      .faces
      .iter()
      .enumerate()
      .filter(|(_, face)| fragment.contacts.iter().all(|c| face.contains(c)))
      .map(|(i, _)| i)
      .collect()
  }

  /// A path through the fragment joining two distinct contact vertices.
  fn fragment_path(&self, fragment: &Fragment) -> Vec<usize> {
    if fragment.interior.is_empty() {
      return fragment.contacts.clone();
    }
    let a = fragment.contacts[0];
    let inside: HashSet<usize> = fragment.interior.iter().copied().collect();
    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::new();
    for &y in &self.adj[a] {
      if inside.contains(&y) && !parent.contains_key(&y) {
        parent.insert(y, a);
        queue.push_back(y);
      }
    }

    while let Some(x) = queue.pop_front() {
      for &y in &self.adj[x] {
        if self.embedded[y] {
          if y != a {
            let mut path = vec![y];
            let mut cur = x;
            while cur != a {
              path.push(cur);
              cur = parent[&cur];
            }
            path.push(a);
            path.reverse();
            return path;
          }
        } else if inside.contains(&y) && !parent.contains_key(&y) {
          parent.insert(y, x);
          queue.push_back(y);
        }
      }
    }
    unreachable!("a fragment of a biconnected block has at least two contacts")
  }

  /// Routes `path` through `face`, replacing it by the two faces it creates.
  fn split_face(&mut self, face: usize, path: &[usize]) {
    let boundary = &self.faces[face];
    let (a, b) = (path[0], path[path.len() - 1]);
    let (Some(ia), Some(ib)) = (
      boundary.iter().position(|&v| v == a),
      boundary.iter().position(|&v| v == b),
    ) else {
      unreachable!("admissible faces contain every contact of the fragment");
    };
    let inner = &path[1..path.len() - 1];

    let mut first = walk(boundary, ia, ib);
    first.extend(inner.iter().rev());
    let mut second = walk(boundary, ib, ia);
    second.extend(inner.iter());

    self.faces[face] = first;
    self.faces.push(second);
    for &v in path {
      self.embedded[v] = true;
    }
    for pair in path.windows(2) {
      self.edges.insert(edge_key(pair[0], pair[1]));
    }
  }
}

/// Boundary vertices from position `from` forward to `to`, both included.
fn walk(boundary: &[usize], from: usize, to: usize) -> Vec<usize> {
  let mut out = Vec::new();
  let mut i = from;
  loop {
    out.push(boundary[i]);
    if i == to {
      return out;
    }
    i = (i + 1) % boundary.len();
  }
}

/// A cycle through vertex 0 and its first neighbor.
fn initial_cycle(adj: &[Vec<usize>]) -> Option<Vec<usize>> {
  let u = 0;
  let v = *adj.first()?.first()?;
  let mut parent: HashMap<usize, Option<usize>> = HashMap::from([(v, None)]);
  let mut queue = VecDeque::from([v]);
  while let Some(x) = queue.pop_front() {
    if x == u {
      break;
    }
    for &y in &adj[x] {
      if edge_key(x, y) == edge_key(u, v) || parent.contains_key(&y) {
        continue;
      }
      parent.insert(y, Some(x));
      queue.push_back(y);
    }
  }
  if !parent.contains_key(&u) {
    return None;
  }
  let mut cycle = Vec::new();
  let mut cur = Some(u);
  while let Some(x) = cur {
    cycle.push(x);
    cur = parent[&x];
  }
  Some(cycle)
}
