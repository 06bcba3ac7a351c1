use crate::error::{Error, Result};
use crate::graph::Graph;

/// Widest edge universe a `u64` subset mask may cover.
pub const MAX_MASK_BITS: usize = 62;

/// All `C(n, 2)` vertex pairs `(i, j)`, `i < j`, in lexicographic order.
/// Edge `k` of the universe corresponds to bit `k` of a subset mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeUniverse {
  node_count: usize,
  edges: Vec<(usize, usize)>,
}

impl EdgeUniverse {
  pub fn new(node_count: usize) -> Self {
    let mut edges = Vec::with_capacity(node_count * node_count.saturating_sub(1) / 2);
    for i in 0..node_count {
      for j in (i + 1)..node_count {
        edges.push((i, j));
      }
    }
    EdgeUniverse { node_count, edges }
  }

  pub fn node_count(&self) -> usize {
    self.node_count
  }

  pub fn len(&self) -> usize {
    self.edges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.edges.is_empty()
  }

  pub fn edges(&self) -> &[(usize, usize)] {
    &self.edges
  }

  /// Every mask over this universe, ascending.
  pub fn subsets(&self) -> Result<SubsetEnumerator> {
    SubsetEnumerator::new(self.len())
  }
}

/// Lazy ascending walk over `[start, 2^m)`.
///
/// Construction fails with [`Error::CapacityExceeded`] when `m` exceeds
/// [`MAX_MASK_BITS`], before a single mask is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetEnumerator {
  next: u64,
  end: u64,
}

impl SubsetEnumerator {
  pub fn new(edge_count: usize) -> Result<Self> {
    Self::starting_at(edge_count, 0)
  }

  /// Resumes a run at `mask`; masks below it are skipped.
  pub fn starting_at(edge_count: usize, mask: u64) -> Result<Self> {
    if edge_count > MAX_MASK_BITS {
      return Err(Error::CapacityExceeded { edges: edge_count, max: MAX_MASK_BITS });
    }
    let end = 1u64 << edge_count;
    Ok(SubsetEnumerator { next: mask.min(end), end })
  }

  /// Size of the whole mask space, `2^m`.
  pub fn total(&self) -> u64 {
    self.end
  }

  pub fn remaining(&self) -> u64 {
    self.end - self.next
  }

  /// The mask the next call to `next()` would yield; saved to resume later.
  pub fn position(&self) -> u64 {
    self.next
  }
}

impl Iterator for SubsetEnumerator {
  type Item = u64;

  fn next(&mut self) -> Option<u64> {
    if self.next >= self.end {
      return None;
    }
    let mask = self.next;
    self.next += 1;
    Some(mask)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    match usize::try_from(self.remaining()) {
      Ok(n) => (n, Some(n)),
      Err(_) => (usize::MAX, None),
    }
  }
}

/// Materializes the subgraph of `K_n` selected by `mask`: edge `k` of the
/// universe is present iff bit `k` is set. Isolated vertices are kept.
pub fn build_candidate(universe: &EdgeUniverse, mask: u64) -> Graph {
  debug_assert!(universe.len() >= 64 || mask >> universe.len() == 0);
  let mut edges = Vec::with_capacity(mask.count_ones() as usize);
  let mut rest = mask;
  while rest != 0 {
    let k = rest.trailing_zeros() as usize;
    edges.push(universe.edges[k]);
    rest &= rest - 1;
  }
  // ascending k walks the universe in lexicographic order, so edges stay sorted
  Graph::from_normalized(universe.node_count, edges)
}
