//! Canonical labeling by individualization-refinement.
//!
//! The vertex set is kept as an ordered partition. Refinement splits cells by
//! how many neighbors each vertex has in every cell until the partition is
//! equitable; when a non-singleton cell remains, each of its vertices is
//! individualized in turn and the search recurses. Every discrete partition
//! reached is a relabeling of the graph, and the canonical key is the
//! smallest graph6 string among them. Isomorphic graphs reach the same set of
//! relabeled graphs, and the key is itself a graph encoding, so equal keys
//! mean isomorphic graphs.
//!
//! Prunings keep the tree small. Of several twin vertices in the target cell
//! only one is tried. A leaf giving the same graph as the first or the best
//! leaf so far yields an automorphism; the search then returns to the node
//! where the two paths diverge, since the rest of that branch is an image of
//! one already explored. At every node, children in the same orbit of the
//! discovered automorphisms fixing the current path are tried only once.

use std::fmt;

use itertools::Itertools;

use crate::error::OracleError;
use crate::graph::Graph;
use crate::graph6;

/// Isomorphism-invariant identifier of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_string(self) -> String {
    self.0
  }
}

impl fmt::Display for CanonicalKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

pub trait Canonicalizer: Send + Sync {
  fn canonical_form(&self, graph: &Graph) -> Result<CanonicalKey, OracleError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementCanonicalizer;

impl RefinementCanonicalizer {
  /// A relabeling `perm` (vertex `v` becomes `perm[v]`) producing the
  /// canonical form.
  pub fn canonical_labeling(&self, graph: &Graph) -> Vec<usize> {
    let n = graph.node_count();
    let mut search = Search::new(graph);
    let unit: Partition = if n == 0 { Vec::new() } else { vec![(0..n).collect()] };
    let root = refine(&search.adj, unit);
    search.descend(root, &mut Vec::new());
    search.best.map(|leaf| leaf.perm).unwrap_or_default()
  }
}

impl Canonicalizer for RefinementCanonicalizer {
  fn canonical_form(&self, graph: &Graph) -> Result<CanonicalKey, OracleError> {
    let perm = self.canonical_labeling(graph);
    Ok(CanonicalKey(graph6::encode(&graph.relabel(&perm))))
  }
}

type Partition = Vec<Vec<usize>>;

/// Splits cells until every vertex of a cell has the same number of
/// neighbors in each cell. Split pieces stay in place, ordered by their
/// neighbor counts, and the scan restarts from the first cell.
fn refine(adj: &[Vec<usize>], mut cells: Partition) -> Partition {
  let mut cell_of = vec![0; adj.len()];
  loop {
    for (i, cell) in cells.iter().enumerate() {
      for &v in cell {
        cell_of[v] = i;
      }
    }

    let mut split = None;
    for (i, cell) in cells.iter().enumerate() {
      if cell.len() < 2 {
        continue;
      }
      let mut keyed: Vec<(Vec<usize>, usize)> = cell
        .iter()
        .map(|&v| {
          let mut signature = vec![0; cells.len()];
          for &w in &adj[v] {
            signature[cell_of[w]] += 1;
          }
          (signature, v)
        })
        .collect();
      keyed.sort_unstable();
      if keyed[0].0 != keyed[keyed.len() - 1].0 {
        split = Some((i, keyed));
        break;
      }
    }

    let Some((i, keyed)) = split else {
      return cells;
    };
    let chunks = keyed.iter().chunk_by(|(signature, _)| signature);
    let pieces: Vec<Vec<usize>> = chunks
      .into_iter()
      .map(|(_, piece)| piece.map(|&(_, v)| v).collect())
      .collect();
    cells.splice(i..=i, pieces);
  }
}

fn individualize(cells: &Partition, target: usize, v: usize) -> Partition {
  let mut out = Vec::with_capacity(cells.len() + 1);
  out.extend_from_slice(&cells[..target]);
  out.push(vec![v]);
  out.push(cells[target].iter().copied().filter(|&w| w != v).collect());
  out.extend_from_slice(&cells[target + 1..]);
  out
}

/// A discrete partition reached by the search, with the individualized
/// vertices leading to it.
struct Leaf {
  key: String,
  perm: Vec<usize>,
  path: Vec<usize>,
}

struct Search {
  graph: Graph,
  adj: Vec<Vec<usize>>,
  first_leaf: Option<Leaf>,
  best: Option<Leaf>,
  // automorphisms discovered at leaves
  generators: Vec<Vec<usize>>,
}

impl Search {
  fn new(graph: &Graph) -> Self {
    Search {
      graph: graph.clone(),
      adj: graph.adjacency(),
      first_leaf: None,
      best: None,
      generators: Vec::new(),
    }
  }

  /// Explores the subtree below `cells`, reached by individualizing `path`.
  ///
  /// Returns `Some(depth)` when a leaf proved the subtree containing it
  /// equivalent to one already explored: every node deeper than `depth`
  /// abandons its remaining children.
  fn descend(&mut self, cells: Partition, path: &mut Vec<usize>) -> Option<usize> {
    let Some(target) = cells.iter().position(|c| c.len() > 1) else {
      return self.leaf(&cells, path);
    };
    let depth = path.len();
    let mut explored: Vec<usize> = Vec::new();
    let mut orbits: Vec<usize> = Vec::new();
    let mut known_generators = 0;

    for v in self.twin_representatives(&cells[target]) {
      if known_generators != self.generators.len() {
        known_generators = self.generators.len();
        orbits = self.stabilizer_orbits(path);
      }
      if !orbits.is_empty() {
        let orbit = find(&mut orbits, v);
        if explored.iter().any(|&u| find(&mut orbits, u) == orbit) {
          continue;
        }
      }

      path.push(v);
      let child = refine(&self.adj, individualize(&cells, target, v));
      let jump = self.descend(child, path);
      path.pop();
      explored.push(v);
      if jump.is_some_and(|to| to < depth) {
        return jump;
      }
    }
    None
  }

  fn leaf(&mut self, cells: &Partition, path: &[usize]) -> Option<usize> {
    let mut perm = vec![0; cells.len()];
    for (i, cell) in cells.iter().enumerate() {
      perm[cell[0]] = i;
    }
    let key = graph6::encode(&self.graph.relabel(&perm));

    // an equal graph at a leaf with a different path yields an automorphism
    // mapping this path onto the other one, fixing their common prefix
    let mut jump: Option<usize> = None;
    let mut found: Vec<Vec<usize>> = Vec::new();
    for other in [&self.first_leaf, &self.best].into_iter().flatten() {
      if other.key != key || other.path == path {
        continue;
      }
      let automorphism = compose_inverse(&other.perm, &perm);
      if !found.contains(&automorphism) {
        found.push(automorphism);
      }
      let common = other.path.iter().zip(path).take_while(|(a, b)| a == b).count();
      jump = Some(jump.map_or(common, |j| j.min(common)));
    }
    self.generators.extend(found);

    if self.first_leaf.is_none() {
      self.first_leaf = Some(Leaf { key: key.clone(), perm: perm.clone(), path: path.to_vec() });
    }
    if self.best.as_ref().is_none_or(|best| key < best.key) {
      self.best = Some(Leaf { key, perm, path: path.to_vec() });
    }
    jump
  }

  /// Orbits of the group generated by the known automorphisms that fix
  /// every vertex of `path`, as a union-find forest.
  fn stabilizer_orbits(&self, path: &[usize]) -> Vec<usize> {
    let mut orbits: Vec<usize> = (0..self.adj.len()).collect();
    for generator in self.generators.iter().filter(|g| path.iter().all(|&v| g[v] == v)) {
      for (v, &image) in generator.iter().enumerate() {
        union(&mut orbits, v, image);
      }
    }
    orbits
  }

  /// One vertex per twin class: `v` and `w` are twins when
  /// `N(v) \ {w} == N(w) \ {v}`, so swapping them is an automorphism.
  fn twin_representatives(&self, cell: &[usize]) -> Vec<usize> {
    let mut reps: Vec<usize> = Vec::new();
    for &v in cell {
      if !reps.iter().any(|&r| self.twins(r, v)) {
        reps.push(v);
      }
    }
    reps
  }

  fn twins(&self, v: usize, w: usize) -> bool {
    let nv = self.adj[v].iter().filter(|&&x| x != w);
    let nw = self.adj[w].iter().filter(|&&x| x != v);
    nv.eq(nw)
  }
}

/// `first⁻¹ ∘ perm`: maps each vertex to the vertex holding the same label
/// under `first`.
fn compose_inverse(first: &[usize], perm: &[usize]) -> Vec<usize> {
  let mut inverse_first = vec![0; first.len()];
  for (v, &p) in first.iter().enumerate() {
    inverse_first[p] = v;
  }
  perm.iter().map(|&p| inverse_first[p]).collect()
}

fn find(orbits: &mut [usize], mut v: usize) -> usize {
  while orbits[v] != v {
    orbits[v] = orbits[orbits[v]];
    v = orbits[v];
  }
  v
}

fn union(orbits: &mut [usize], a: usize, b: usize) {
  let (ra, rb) = (find(orbits, a), find(orbits, b));
  if ra != rb {
    orbits[ra.max(rb)] = ra.min(rb);
  }
}

#[cfg(test)]
mod tests {
  use std::collections::{HashMap, HashSet};

  use petgraph::algo::is_isomorphic;

  use super::*;
  use crate::enumerate::{build_candidate, EdgeUniverse};
  use crate::planarity::is_planar;

  fn key(g: &Graph) -> CanonicalKey {
    RefinementCanonicalizer.canonical_form(g).unwrap()
  }

  fn graph(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edges(n, edges.iter().copied()).unwrap()
  }

  /// A few fixed relabelings: reversal, rotations and a multiplicative shuffle.
  fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut perms = vec![(0..n).rev().collect::<Vec<_>>()];
    for shift in 1..n {
      perms.push((0..n).map(|v| (v + shift) % n).collect());
    }
    if n > 2 {
      let step = (2..n).find(|s| gcd(*s, n) == 1).unwrap_or(1);
      perms.push((0..n).map(|v| (v * step + 1) % n).collect());
    }
    perms
  }

  fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
  }

  #[test]
  fn triangle_key_ignores_labeling() {
    let a = graph(3, &[(0, 1), (0, 2), (1, 2)]);
    assert_eq!(key(&a).as_str(), "Bw");
    let path_a = graph(3, &[(0, 1), (1, 2)]);
    let path_b = graph(3, &[(0, 2), (2, 1)]);
    assert_eq!(key(&path_a), key(&path_b));
    assert_ne!(key(&path_a), key(&a));
  }

  #[test]
  fn degenerate_orders() {
    assert_eq!(key(&graph(0, &[])).as_str(), "?");
    assert_eq!(key(&graph(1, &[])).as_str(), "@");
    assert_eq!(key(&graph(2, &[(0, 1)])).as_str(), "A_");
  }

  #[test]
  fn key_is_invariant_under_permutation() {
    let petersen = Graph::from_edges(
      10,
      (0..5)
        .map(|i| (i, (i + 1) % 5))
        .chain((0..5).map(|i| (i, i + 5)))
        .chain((0..5).map(|i| (5 + i, 5 + (i + 2) % 5))),
    )
    .unwrap();
    let cube = graph(8, &[
      (0, 1), (1, 2), (2, 3), (3, 0),
      (4, 5), (5, 6), (6, 7), (7, 4),
      (0, 4), (1, 5), (2, 6), (3, 7),
    ]);
    let lopsided = graph(7, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 3), (6, 0)]);
    for g in [petersen, cube, lopsided] {
      let expected = key(&g);
      for perm in permutations(g.node_count()) {
        assert_eq!(key(&g.permute(&perm).unwrap()), expected);
      }
    }
  }

  #[test]
  fn labeling_reproduces_the_key() {
    let g = graph(6, &[(0, 3), (3, 5), (5, 1), (1, 0), (2, 4)]);
    let perm = RefinementCanonicalizer.canonical_labeling(&g);
    let mut sorted = perm.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    assert_eq!(graph6::encode(&g.permute(&perm).unwrap()), key(&g).into_string());
  }

  #[test]
  fn counts_unlabeled_graphs() {
    for (n, expected) in [(1, 1), (2, 2), (3, 4), (4, 11), (5, 34)] {
      let universe = EdgeUniverse::new(n);
      let keys: HashSet<CanonicalKey> = universe
        .subsets()
        .unwrap()
        .map(|mask| key(&build_candidate(&universe, mask)))
        .collect();
      assert_eq!(keys.len(), expected, "n = {n}");
    }
  }

  #[test]
  fn counts_unlabeled_planar_graphs() {
    let universe = EdgeUniverse::new(5);
    let keys: HashSet<CanonicalKey> = universe
      .subsets()
      .unwrap()
      .map(|mask| build_candidate(&universe, mask))
      .filter(is_planar)
      .map(|g| key(&g))
      .collect();
    assert_eq!(keys.len(), 33);
  }

  #[test]
  fn keys_agree_with_petgraph_isomorphism() {
    let universe = EdgeUniverse::new(5);
    let mut classes: HashMap<CanonicalKey, Graph> = HashMap::new();
    for mask in universe.subsets().unwrap() {
      let g = build_candidate(&universe, mask);
      let representative = classes.entry(key(&g)).or_insert_with(|| g.clone());
      assert!(is_isomorphic(&g.to_petgraph(), &representative.to_petgraph()));
    }
    let reps: Vec<&Graph> = classes.values().collect();
    for (a, b) in reps.iter().tuple_combinations() {
      assert!(!is_isomorphic(&a.to_petgraph(), &b.to_petgraph()));
    }
  }

  /// Fisher-Yates driven by xorshift, so relabelings are reproducible.
  fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut state = seed | 1;
    let mut next = move || {
      state ^= state << 13;
      state ^= state >> 7;
      state ^= state << 17;
      state
    };
    let mut perm: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
      perm.swap(i, (next() % (i as u64 + 1)) as usize);
    }
    perm
  }

  fn disjoint_cycles(copies: usize, len: usize) -> Graph {
    let edges = (0..copies).flat_map(|c| (0..len).map(move |i| (c * len + i, c * len + (i + 1) % len)));
    Graph::from_edges(copies * len, edges).unwrap()
  }

  fn assert_invariant(g: &Graph) {
    let expected = key(g);
    for seed in [3, 17, 2024] {
      let relabeled = g.permute(&shuffled(g.node_count(), seed)).unwrap();
      assert_eq!(key(&relabeled), expected, "seed {seed}");
    }
  }

  #[test]
  fn disjoint_copies_of_a_cycle() {
    for copies in 6..=8 {
      assert_invariant(&disjoint_cycles(copies, 5));
    }
  }

  #[test]
  fn two_regular_graphs_of_one_order_are_told_apart() {
    let keys: HashSet<CanonicalKey> = [(8, 5), (4, 10), (5, 8), (2, 20), (1, 40)]
      .into_iter()
      .map(|(copies, len)| key(&disjoint_cycles(copies, len)))
      .collect();
    assert_eq!(keys.len(), 5);
  }

  #[test]
  fn large_symmetric_graphs() {
    let side = 10;
    let grid = Graph::from_edges(
      side * side,
      (0..side * side).flat_map(|v| {
        let right = (v % side + 1 < side).then_some((v, v + 1));
        let down = (v + side < side * side).then_some((v, v + side));
        right.into_iter().chain(down)
      }),
    )
    .unwrap();
    let hypercube = Graph::from_edges(
      64,
      (0..64usize).flat_map(|v| (0..6).map(move |b| (v, v ^ (1 << b)))).filter(|&(u, v)| u < v),
    )
    .unwrap();
    let petersens = Graph::from_edges(
      40,
      (0..4).flat_map(|c| {
        let o = 10 * c;
        (0..5).flat_map(move |i| [(o + i, o + (i + 1) % 5), (o + i, o + i + 5), (o + 5 + i, o + 5 + (i + 2) % 5)])
      }),
    )
    .unwrap();
    let cliques = Graph::from_edges(
      32,
      (0..8).flat_map(|c| (0..4).flat_map(move |j| (0..j).map(move |i| (4 * c + i, 4 * c + j)))),
    )
    .unwrap();
    for g in [grid, hypercube, petersens, cliques] {
      assert_invariant(&g);
    }
  }

  #[test]
  fn sparse_graphs_on_sixty_vertices() {
    for seed in [5, 11, 99] {
      let coin = shuffled(60 * 59 / 2, seed);
      let edges = EdgeUniverse::new(60)
        .edges()
        .iter()
        .zip(coin)
        .filter(|(_, c)| c % 10 == 0)
        .map(|(&e, _)| e)
        .collect::<Vec<_>>();
      let g = Graph::from_edges(60, edges).unwrap();
      assert_invariant(&g);
      let relabeled = g.permute(&shuffled(60, seed + 1)).unwrap();
      assert!(is_isomorphic(&g.to_petgraph(), &relabeled.to_petgraph()));
    }
  }
}
