use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Largest vertex count the crate handles (the 4-byte graph6 header limit).
///
/// graph6 output grows quadratically: near this limit one encoded graph
/// takes about 5.5 GB (see [`crate::graph6::encoded_len`]). In practice
/// graphs beyond a few tens of thousands of vertices should not be written
/// as graph6.
pub const MAX_ORDER: usize = 258_047;

/// Simple undirected graph on the vertices `0..node_count`.
///
/// Edges are kept normalized (`u < v`), sorted and free of duplicates, so two
/// graphs built from the same edge set compare equal no matter in which order
/// the edges were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Graph {
  node_count: usize,
  edges: Vec<(usize, usize)>,
}

/// Serde form used for JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
  pub node_count: usize,
  pub edges: Vec<(usize, usize)>,
}

impl Graph {
  /// Graph with `node_count` isolated vertices.
  pub fn empty(node_count: usize) -> Result<Self, FormatError> {
    Self::from_edges(node_count, std::iter::empty())
  }

  /// Builds a graph from arbitrary `(u, v)` pairs, normalizing their order.
  /// Duplicate pairs collapse into one edge; self-loops and endpoints outside
  /// `0..node_count` are rejected.
  pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self, FormatError>
  where
    I: IntoIterator<Item = (usize, usize)>,
  {
    if node_count > MAX_ORDER {
      return Err(FormatError::TooManyVertices { n: node_count as u64, max: MAX_ORDER as u64 });
    }
    let mut normalized = Vec::new();
    for (u, v) in edges {
      if u == v {
        return Err(FormatError::SelfLoop(u));
      }
      if u >= node_count || v >= node_count {
        return Err(FormatError::VertexOutOfRange { u, v, n: node_count });
      }
      normalized.push(if u < v { (u, v) } else { (v, u) });
    }
    normalized.sort_unstable();
    normalized.dedup();
    Ok(Graph { node_count, edges: normalized })
  }

  /// Caller guarantees the edges are already normalized, sorted and unique.
  pub(crate) fn from_normalized(node_count: usize, edges: Vec<(usize, usize)>) -> Self {
    debug_assert!(node_count <= MAX_ORDER);
    debug_assert!(edges.windows(2).all(|w| w[0] < w[1]));
    debug_assert!(edges.iter().all(|&(u, v)| u < v && v < node_count));
    Graph { node_count, edges }
  }

  pub fn node_count(&self) -> usize {
    self.node_count
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  pub fn edges(&self) -> &[(usize, usize)] {
    &self.edges
  }

  pub fn has_edge(&self, u: usize, v: usize) -> bool {
    let key = if u < v { (u, v) } else { (v, u) };
    self.edges.binary_search(&key).is_ok()
  }

  /// Neighbor lists indexed by vertex, each sorted ascending.
  pub fn adjacency(&self) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); self.node_count];
    for &(u, v) in &self.edges {
      adj[u].push(v);
      adj[v].push(u);
    }
    for neighbors in &mut adj {
      neighbors.sort_unstable();
    }
    adj
  }

  pub fn degrees(&self) -> Vec<usize> {
    let mut deg = vec![0; self.node_count];
    for &(u, v) in &self.edges {
      deg[u] += 1;
      deg[v] += 1;
    }
    deg
  }

  /// Relabels vertex `v` as `perm[v]`. `perm` must be a permutation of
  /// `0..node_count`.
  pub fn permute(&self, perm: &[usize]) -> Result<Graph, FormatError> {
    let mut hit = vec![false; self.node_count];
    let bijective = perm.len() == self.node_count
      && perm.iter().all(|&p| p < self.node_count && !std::mem::replace(&mut hit[p], true));
    if !bijective {
      return Err(FormatError::InvalidPermutation { len: perm.len(), n: self.node_count });
    }
    Ok(self.relabel(perm))
  }

  /// [`Graph::permute`] for permutations built inside the crate.
  pub(crate) fn relabel(&self, perm: &[usize]) -> Graph {
    debug_assert_eq!(perm.len(), self.node_count);
    let mut edges: Vec<(usize, usize)> = self
      .edges
      .iter()
      .map(|&(u, v)| {
        let (a, b) = (perm[u], perm[v]);
        if a < b { (a, b) } else { (b, a) }
      })
      .collect();
    edges.sort_unstable();
    Graph { node_count: self.node_count, edges }
  }

  pub fn to_petgraph(&self) -> UnGraph<(), ()> {
    let mut graph = UnGraph::<(), ()>::with_capacity(self.node_count, self.edges.len());
    let nodes: Vec<NodeIndex> = (0..self.node_count).map(|_| graph.add_node(())).collect();
    for &(u, v) in &self.edges {
      graph.add_edge(nodes[u], nodes[v], ());
    }
    graph
  }

  pub fn from_petgraph(graph: &UnGraph<(), ()>) -> Result<Self, FormatError> {
    let edges = graph
      .edge_indices()
      .filter_map(|e| graph.edge_endpoints(e))
      .map(|(u, v)| (u.index(), v.index()));
    Graph::from_edges(graph.node_count(), edges)
  }
}

impl From<&Graph> for SerializableGraph {
  fn from(g: &Graph) -> Self {
    SerializableGraph { node_count: g.node_count, edges: g.edges.clone() }
  }
}

impl TryFrom<SerializableGraph> for Graph {
  type Error = FormatError;

  fn try_from(g: SerializableGraph) -> Result<Self, Self::Error> {
    Graph::from_edges(g.node_count, g.edges)
  }
}
