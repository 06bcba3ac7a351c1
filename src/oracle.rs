//! Structural predicates a candidate graph must satisfy.
//!
//! The pipeline only sees the [`StructuralPredicate`] trait, so planarity can
//! be swapped for any other property (or a conjunction of several) without
//! touching enumeration or I/O code.

use std::collections::VecDeque;

use itertools::Itertools;
use petgraph::algo::connected_components;

use crate::error::OracleError;
use crate::graph::Graph;
use crate::planarity::is_planar;

/// A pure test on a graph. Implementations are called concurrently from
/// worker threads on distinct graphs and must not keep mutable state.
pub trait StructuralPredicate: Send + Sync {
  fn name(&self) -> &str;

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError>;
}

impl<P: StructuralPredicate + ?Sized> StructuralPredicate for Box<P> {
  fn name(&self) -> &str {
    (**self).name()
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    (**self).accepts(graph)
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl StructuralPredicate for Planar {
  fn name(&self) -> &str {
    "planar"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    Ok(is_planar(graph))
  }
}

/// The empty graph and a single vertex count as connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connected;

impl StructuralPredicate for Connected {
  fn name(&self) -> &str {
    "connected"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    Ok(connected_components(&graph.to_petgraph()) <= 1)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct MinDegree(pub usize);

impl StructuralPredicate for MinDegree {
  fn name(&self) -> &str {
    "min-degree"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    Ok(graph.degrees().into_iter().all(|d| d >= self.0))
  }
}

/// 3-vertex-connected: at least four vertices, and no pair of vertices
/// whose removal disconnects the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Triconnected;

impl StructuralPredicate for Triconnected {
  fn name(&self) -> &str {
    "triconnected"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    let n = graph.node_count();
    if n < 4 || graph.degrees().into_iter().any(|d| d < 3) {
      return Ok(false);
    }
    let adj = graph.adjacency();
    let mut removed = vec![false; n];
    if !connected_without(&adj, &removed) {
      return Ok(false);
    }
    for (a, b) in (0..n).tuple_combinations() {
      removed[a] = true;
      removed[b] = true;
      let ok = connected_without(&adj, &removed);
      removed[a] = false;
      removed[b] = false;
      if !ok {
        return Ok(false);
      }
    }
    Ok(true)
  }
}

fn connected_without(adj: &[Vec<usize>], removed: &[bool]) -> bool {
  let Some(start) = (0..adj.len()).find(|&v| !removed[v]) else {
    return true;
  };
  let mut seen = removed.to_vec();
  seen[start] = true;
  let mut reached = 1;
  let mut queue = VecDeque::from([start]);
  while let Some(x) = queue.pop_front() {
    for &y in &adj[x] {
      if !seen[y] {
        seen[y] = true;
        reached += 1;
        queue.push_back(y);
      }
    }
  }
  reached == removed.iter().filter(|&&r| !r).count()
}

/// For every `(degree, count)` pair, exactly `count` vertices have that
/// degree. Degrees not listed are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct DegreeConstraints(pub Vec<(usize, usize)>);

impl StructuralPredicate for DegreeConstraints {
  fn name(&self) -> &str {
    "degree-constraints"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    let counts = graph.degrees().into_iter().counts();
    Ok(
      self
        .0
        .iter()
        .all(|&(degree, count)| counts.get(&degree).copied().unwrap_or(0) == count),
    )
  }
}

/// Conjunction, evaluated in order; the first rejecting predicate wins.
#[derive(Default)]
pub struct AllOf(pub Vec<Box<dyn StructuralPredicate>>);

impl StructuralPredicate for AllOf {
  fn name(&self) -> &str {
    "all-of"
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    for predicate in &self.0 {
      if !predicate.accepts(graph)? {
        return Ok(false);
      }
    }
    Ok(true)
  }
}

/// Wraps a plain function value as a predicate.
pub struct FnPredicate<F> {
  name: String,
  f: F,
}

pub fn predicate_fn<F>(name: impl Into<String>, f: F) -> FnPredicate<F>
where
  F: Fn(&Graph) -> Result<bool, OracleError> + Send + Sync,
{
  FnPredicate { name: name.into(), f }
}

impl<F> StructuralPredicate for FnPredicate<F>
where
  F: Fn(&Graph) -> Result<bool, OracleError> + Send + Sync,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn accepts(&self, graph: &Graph) -> Result<bool, OracleError> {
    (self.f)(graph)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::enumerate::EdgeUniverse;

  fn graph(n: usize, edges: &[(usize, usize)]) -> Graph {
    Graph::from_edges(n, edges.iter().copied()).unwrap()
  }

  fn complete(n: usize) -> Graph {
    Graph::from_edges(n, EdgeUniverse::new(n).edges().iter().copied()).unwrap()
  }

  fn cycle(n: usize) -> Graph {
    Graph::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).unwrap()
  }

  #[test]
  fn connectivity() {
    assert!(Connected.accepts(&graph(0, &[])).unwrap());
    assert!(Connected.accepts(&graph(1, &[])).unwrap());
    assert!(Connected.accepts(&cycle(5)).unwrap());
    assert!(!Connected.accepts(&graph(3, &[(0, 1)])).unwrap());
  }

  #[test]
  fn min_degree() {
    assert!(MinDegree(2).accepts(&cycle(6)).unwrap());
    assert!(!MinDegree(3).accepts(&cycle(6)).unwrap());
    assert!(MinDegree(0).accepts(&graph(2, &[])).unwrap());
  }

  #[test]
  fn triconnectivity() {
    assert!(Triconnected.accepts(&complete(4)).unwrap());
    assert!(Triconnected.accepts(&complete(5)).unwrap());
    assert!(!Triconnected.accepts(&complete(3)).unwrap());
    assert!(!Triconnected.accepts(&cycle(6)).unwrap());
    // two K4 glued along an edge: {0, 1} is a separating pair
    let glued = graph(6, &[
      (0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3),
      (0, 4), (0, 5), (1, 4), (1, 5), (4, 5),
    ]);
    assert!(!Triconnected.accepts(&glued).unwrap());
    // prism is 3-connected
    let prism = graph(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (0, 3), (1, 4), (2, 5)]);
    assert!(Triconnected.accepts(&prism).unwrap());
  }

  #[test]
  fn degree_constraints() {
    // path 0-1-2-3: two leaves, two inner vertices
    let path = graph(4, &[(0, 1), (1, 2), (2, 3)]);
    assert!(DegreeConstraints(vec![(1, 2), (2, 2)]).accepts(&path).unwrap());
    assert!(DegreeConstraints(vec![(1, 2)]).accepts(&path).unwrap());
    assert!(!DegreeConstraints(vec![(3, 1)]).accepts(&path).unwrap());
    assert!(DegreeConstraints(vec![(3, 0)]).accepts(&path).unwrap());
  }

  #[test]
  fn conjunction_short_circuits_on_first_rejection() {
    let failing = predicate_fn("boom", |_: &Graph| {
      Err(OracleError::Unsupported { oracle: "boom".into(), reason: "always".into() })
    });
    let all = AllOf(vec![Box::new(Connected), Box::new(failing)]);
    // disconnected graph is rejected before the failing predicate runs
    assert!(!all.accepts(&graph(3, &[(0, 1)])).unwrap());
    assert!(all.accepts(&cycle(3)).is_err());
  }

  #[test]
  fn function_values_are_predicates() {
    let even_edges = predicate_fn("even-edges", |g: &Graph| Ok(g.edge_count() % 2 == 0));
    assert_eq!(even_edges.name(), "even-edges");
    assert!(even_edges.accepts(&cycle(4)).unwrap());
    assert!(!even_edges.accepts(&cycle(5)).unwrap());
  }

  #[test]
  fn planar_predicate() {
    assert!(Planar.accepts(&complete(4)).unwrap());
    assert!(!Planar.accepts(&complete(5)).unwrap());
  }
}
