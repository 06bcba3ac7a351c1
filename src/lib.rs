//! Exhaustive graph enumeration with structural filters.
//!
//! Two ways in:
//!
//! - brute force: every edge subset of `K_n` is built from a `u64` mask and
//!   run through a [`pipeline::FilterPipeline`];
//! - streams: graphs produced elsewhere (blocks of edge lines, graph6 lines,
//!   a single edge-list file) are read and filtered the same way.
//!
//! Accepted graphs come out as graph6 text, optionally one per isomorphism
//! class.
//!
//! ```
//! use planar_enumeration::prelude::*;
//!
//! let pipeline = FilterPipeline::new(Planar).with_dedup(RefinementCanonicalizer);
//! let mut accepted: Vec<String> = Vec::new();
//! let summary = enumerate_subgraphs(&pipeline, 4, &EnumerationOptions::default(), &mut accepted).unwrap();
//! // 64 labeled graphs on four vertices, 11 up to isomorphism
//! assert_eq!(summary.candidates, 64);
//! assert_eq!(accepted.len(), 11);
//! ```

pub mod canon;
pub mod config;
pub mod edge_list;
pub mod enumerate;
pub mod error;
pub mod graph;
pub mod graph6;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod planarity;
pub mod stats;
pub mod stream;

pub mod prelude {
  pub use crate::canon::{CanonicalKey, Canonicalizer, RefinementCanonicalizer};
  pub use crate::edge_list::EdgeListGraph;
  pub use crate::enumerate::{build_candidate, EdgeUniverse, SubsetEnumerator};
  pub use crate::error::{Error, FormatError, OracleError, SourceId};
  pub use crate::graph::Graph;
  pub use crate::oracle::{AllOf, Connected, DegreeConstraints, MinDegree, Planar, StructuralPredicate, Triconnected};
  pub use crate::output::GraphSink;
  pub use crate::pipeline::{enumerate_subgraphs, Decision, EnumerationOptions, FilterPipeline};
  pub use crate::stream::{run_blocks, run_edge_list, run_graph6_lines, StreamGraphBatchReader};
}
