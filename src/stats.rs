use std::collections::HashMap;
use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use log::info;

use crate::graph::Graph;
use crate::pipeline::Decision;

/// Per-run counters, reported once at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub candidates: u64,
  pub accepted: u64,
  pub rejected: u64,
  pub duplicates: u64,
  pub skipped_blocks: u64,
  pub truncated_blocks: u64,
}

impl RunSummary {
  pub fn record(&mut self, decision: &Decision) {
    self.candidates += 1;
    match decision {
      Decision::Accepted(_) => self.accepted += 1,
      Decision::Rejected => self.rejected += 1,
      Decision::DuplicateSkipped => self.duplicates += 1,
    }
  }
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} candidates: {} accepted, {} rejected, {} duplicates, {} skipped, {} truncated",
      self.candidates, self.accepted, self.rejected, self.duplicates, self.skipped_blocks, self.truncated_blocks
    )
  }
}

/// Sorted `(degree, number of vertices)` pairs of a graph.
pub type DegreePattern = Vec<(usize, usize)>;

pub fn degree_pattern(graph: &Graph) -> DegreePattern {
  graph.degrees().into_iter().counts().into_iter().sorted().collect()
}

/// Histogram of degree patterns over accepted graphs.
#[derive(Debug, Clone, Default)]
pub struct DegreePatternCounter {
  counts: HashMap<DegreePattern, u64>,
}

impl DegreePatternCounter {
  pub fn add(&mut self, graph: &Graph) {
    *self.counts.entry(degree_pattern(graph)).or_default() += 1;
  }

  pub fn total(&self) -> u64 {
    self.counts.values().sum()
  }

  /// Most frequent first; ties by pattern.
  pub fn most_common(&self) -> Vec<(&DegreePattern, u64)> {
    self
      .counts
      .iter()
      .map(|(pattern, &count)| (pattern, count))
      .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
      .collect()
  }

  pub fn log_summary(&self) {
    info!("{} degree patterns over {} graphs", self.counts.len(), self.total());
    for (pattern, count) in self.most_common() {
      let text = pattern.iter().map(|(d, c)| format!("{d}^{c}")).join(" ");
      info!("  {count:>8}  {text}");
    }
  }
}

/// Bar over `len` steps, or a hidden one when progress is switched off.
pub fn progress_bar(len: u64, label: &str, visible: bool) -> ProgressBar {
  if !visible {
    return ProgressBar::hidden();
  }
  let pb = ProgressBar::new(len);
  let template = format!("[{label}] [{{elapsed_precise}}] {{wide_bar:.green/white}} {{pos}}/{{len}}");
  let style = ProgressStyle::with_template(&template).unwrap_or_else(|_| ProgressStyle::default_bar());
  pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
  pb
}

/// Spinner for inputs of unknown length.
pub fn progress_spinner(label: &str, visible: bool) -> ProgressBar {
  if !visible {
    return ProgressBar::hidden();
  }
  let pb = ProgressBar::new_spinner();
  let template = format!("[{label}] {{spinner}} {{pos}} lines {{elapsed_precise}}");
  pb.set_style(ProgressStyle::with_template(&template).unwrap_or_else(|_| ProgressStyle::default_spinner()));
  pb
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_counts_decisions() {
    let mut summary = RunSummary::default();
    summary.record(&Decision::Accepted("Bw".into()));
    summary.record(&Decision::Rejected);
    summary.record(&Decision::DuplicateSkipped);
    summary.record(&Decision::Accepted("A_".into()));
    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(
      summary.to_string(),
      "4 candidates: 2 accepted, 1 rejected, 1 duplicates, 0 skipped, 0 truncated"
    );
  }

  #[test]
  fn degree_patterns_are_sorted_pairs() {
    let star = Graph::from_edges(4, [(0, 1), (0, 2), (0, 3)]).unwrap();
    assert_eq!(degree_pattern(&star), vec![(1, 3), (3, 1)]);
  }

  #[test]
  fn counter_orders_by_frequency() {
    let mut counter = DegreePatternCounter::default();
    let path = Graph::from_edges(3, [(0, 1), (1, 2)]).unwrap();
    let other_path = Graph::from_edges(3, [(0, 2), (2, 1)]).unwrap();
    let triangle = Graph::from_edges(3, [(0, 1), (1, 2), (0, 2)]).unwrap();
    counter.add(&triangle);
    counter.add(&path);
    counter.add(&other_path);
    assert_eq!(counter.total(), 3);
    let common = counter.most_common();
    assert_eq!(common[0], (&vec![(1, 2), (2, 1)], 2));
    assert_eq!(common[1], (&vec![(2, 3)], 1));
  }

  #[test]
  fn hidden_bars_when_quiet() {
    assert!(progress_bar(10, "masks", false).is_hidden());
    assert!(progress_spinner("lines", false).is_hidden());
  }
}
