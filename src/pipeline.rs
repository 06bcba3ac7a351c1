//! Filtering, deduplication and the brute-force driver.
//!
//! Processing a graph is split in two halves. [`FilterPipeline::evaluate`]
//! runs the predicate, the canonicalizer and the output formatting; it reads
//! no shared state and may run on any number of threads at once.
//! [`FilterPipeline::commit`] is the only step touching the seen-set, and it
//! inserts a key only when the graph is accepted, so every graph either
//! commits completely or leaves no trace.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use log::{debug, info};
use rayon::prelude::*;

use crate::canon::{CanonicalKey, Canonicalizer};
use crate::enumerate::{build_candidate, EdgeUniverse, SubsetEnumerator};
use crate::error::{Error, Result, SourceId};
use crate::graph::Graph;
use crate::graph6;
use crate::oracle::StructuralPredicate;
use crate::output::GraphSink;
use crate::stats::{progress_bar, RunSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  /// Carries the output representation.
  Accepted(String),
  Rejected,
  DuplicateSkipped,
}

/// Canonical keys of every graph accepted so far in one run.
#[derive(Debug, Default)]
pub struct SeenSet {
  keys: Mutex<HashSet<CanonicalKey>>,
}

impl SeenSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `key`; `false` when it was already present.
  pub fn insert_if_absent(&self, key: CanonicalKey) -> bool {
    self.keys.lock().unwrap_or_else(PoisonError::into_inner).insert(key)
  }

  pub fn contains(&self, key: &CanonicalKey) -> bool {
    self.keys.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
  }

  pub fn len(&self) -> usize {
    self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Outcome of the side-effect free half of processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
  Rejected,
  Passed { representation: String, key: Option<CanonicalKey> },
}

pub struct FilterPipeline {
  predicate: Box<dyn StructuralPredicate>,
  canonicalizer: Option<Box<dyn Canonicalizer>>,
  seen: SeenSet,
  keep_tag: bool,
}

impl FilterPipeline {
  pub fn new(predicate: impl StructuralPredicate + 'static) -> Self {
    FilterPipeline { predicate: Box::new(predicate), canonicalizer: None, seen: SeenSet::new(), keep_tag: false }
  }

  /// Enables deduplication by canonical key.
  pub fn with_dedup(mut self, canonicalizer: impl Canonicalizer + 'static) -> Self {
    self.canonicalizer = Some(Box::new(canonicalizer));
    self
  }

  /// Emit an input's graph6 tag verbatim instead of re-encoding the parsed
  /// graph. Ignored while deduplicating.
  pub fn keep_tag(mut self, keep: bool) -> Self {
    self.keep_tag = keep;
    self
  }

  pub fn dedup_enabled(&self) -> bool {
    self.canonicalizer.is_some()
  }

  pub fn seen(&self) -> &SeenSet {
    &self.seen
  }

  pub fn evaluate(&self, graph: &Graph, source_id: SourceId, tag: Option<&str>) -> Result<Evaluation> {
    let accepted = self
      .predicate
      .accepts(graph)
      .map_err(|error| Error::Pipeline { source_id, error })?;
    if !accepted {
      return Ok(Evaluation::Rejected);
    }

    let key = match &self.canonicalizer {
      Some(canonicalizer) => Some(
        canonicalizer
          .canonical_form(graph)
          .map_err(|error| Error::Pipeline { source_id, error })?,
      ),
      None => None,
    };

    let representation = match tag {
      Some(tag) if self.keep_tag && key.is_none() => tag.to_owned(),
      _ => graph6::encode(graph),
    };
    Ok(Evaluation::Passed { representation, key })
  }

  pub fn commit(&self, evaluation: Evaluation) -> Decision {
    match evaluation {
      Evaluation::Rejected => Decision::Rejected,
      Evaluation::Passed { representation, key: None } => Decision::Accepted(representation),
      Evaluation::Passed { representation, key: Some(key) } => {
        if self.seen.insert_if_absent(key) {
          Decision::Accepted(representation)
        } else {
          Decision::DuplicateSkipped
        }
      }
    }
  }

  pub fn process(&self, graph: &Graph, source_id: SourceId, tag: Option<&str>) -> Result<Decision> {
    let evaluation = self.evaluate(graph, source_id, tag)?;
    Ok(self.commit(evaluation))
  }
}

/// Records `decision` and forwards accepted graphs to the sink.
pub(crate) fn emit(graph: &Graph, decision: &Decision, sink: &mut dyn GraphSink, summary: &mut RunSummary) -> Result<()> {
  summary.record(decision);
  if let Decision::Accepted(representation) = decision {
    sink.accept(graph, representation)?;
  }
  Ok(())
}

/// =============== Brute force over all subgraphs of K_n ===============

#[derive(Debug, Clone)]
pub struct EnumerationOptions {
  /// First mask to process; earlier masks are skipped.
  pub resume_from: u64,
  /// Evaluate chunks of masks on the rayon pool.
  pub parallel: bool,
  pub chunk_size: usize,
  pub progress: bool,
}

impl Default for EnumerationOptions {
  fn default() -> Self {
    EnumerationOptions { resume_from: 0, parallel: false, chunk_size: 1 << 14, progress: false }
  }
}

/// Runs every edge subset of `K_n` through `pipeline`, in ascending mask
/// order. The parallel mode commits each evaluated chunk in mask order, so
/// its decisions and output match the sequential run exactly.
pub fn enumerate_subgraphs(
  pipeline: &FilterPipeline,
  n: usize,
  options: &EnumerationOptions,
  sink: &mut dyn GraphSink,
) -> Result<RunSummary> {
  let universe = EdgeUniverse::new(n);
  let masks = SubsetEnumerator::starting_at(universe.len(), options.resume_from)?;
  info!(
    "Enumerating {} of {} edge subsets of K_{} from mask {}",
    masks.remaining(),
    masks.total(),
    n,
    masks.position()
  );

  let pb = progress_bar(masks.remaining(), "masks", options.progress);
  let mut summary = RunSummary::default();

  if options.parallel {
    let chunk = options.chunk_size.max(1) as u64;
    let (mut start, end) = (masks.position(), masks.total());
    while start < end {
      let stop = end.min(start + chunk);
      let evaluated: Vec<Result<(Graph, Evaluation)>> = (0..(stop - start) as usize)
        .into_par_iter()
        .map(|offset| -> Result<(Graph, Evaluation)> {
          let mask = start + offset as u64;
          let graph = build_candidate(&universe, mask);
          let evaluation = pipeline.evaluate(&graph, SourceId::Mask(mask), None)?;
          Ok((graph, evaluation))
        })
        .collect();
      // commit up to the first failing mask, as the sequential run would
      for result in evaluated {
        let (graph, evaluation) = result?;
        let decision = pipeline.commit(evaluation);
        emit(&graph, &decision, sink, &mut summary)?;
      }
      pb.inc(stop - start);
      debug!("committed masks {start}..{stop}");
      start = stop;
    }
  } else {
    for mask in masks {
      let graph = build_candidate(&universe, mask);
      let decision = pipeline.process(&graph, SourceId::Mask(mask), None)?;
      emit(&graph, &decision, sink, &mut summary)?;
      pb.inc(1);
    }
  }

  pb.finish_and_clear();
  Ok(summary)
}
