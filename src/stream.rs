//! Streaming inputs: blocks of edge lines, plain graph6 lines, and single
//! edge-list files.
//!
//! A block looks like
//!
//! ```text
//! # 4 3
//! Cr
//! 0 1
//! 1 2
//! 2 3
//!
//! ```
//!
//! a `# n m` header, an optional graph6 tag, one `u v` line per edge and a
//! blank line that ends the block.

use std::io::BufRead;

use log::warn;

use crate::edge_list::{parse_edge_line, parse_header, read_edge_list, EdgeListGraph};
use crate::error::{FormatError, Result, SourceId};
use crate::graph::Graph;
use crate::graph6::{self, is_graph6_token, GRAPH6_HEADER};
use crate::output::GraphSink;
use crate::pipeline::{emit, FilterPipeline};
use crate::stats::{progress_spinner, RunSummary};

/// Lines accumulated for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphBlock {
  pub declared_vertices: Option<usize>,
  pub declared_edges: Option<usize>,
  pub edges: Vec<(usize, usize)>,
  pub tag: Option<String>,
  /// Line number of the first line of the block.
  pub first_line: usize,
  /// First syntax error seen since the last header, with its line number.
  pub error: Option<(usize, FormatError)>,
}

impl GraphBlock {
  fn starting_at(line: usize) -> Self {
    GraphBlock { first_line: line, ..GraphBlock::default() }
  }

  /// Validates the block against its header and builds the graph.
  pub fn to_graph(&self) -> Result<Graph, FormatError> {
    let n = self.declared_vertices.ok_or(FormatError::MissingHeader)?;
    match self.declared_edges {
      Some(declared) if declared != self.edges.len() => {
        return Err(FormatError::EdgeCountMismatch { declared, found: self.edges.len() });
      }
      _ => {}
    }
    EdgeListGraph::new(n, self.edges.clone()).to_graph()
  }

  fn absorb(&mut self, line: usize, kind: LineKind<'_>) {
    match kind {
      LineKind::Blank => {}
      LineKind::Header(text) => {
        // a header restarts the edge list
        self.edges.clear();
        self.error = None;
        match parse_header(text) {
          Ok((n, m)) => {
            self.declared_vertices = Some(n);
            self.declared_edges = Some(m);
          }
          Err(error) => self.error = Some((line, error)),
        }
      }
      LineKind::Tag(text) => self.tag = Some(text.to_owned()),
      LineKind::Edge(text) => match parse_edge_line(text) {
        Ok(edge) => self.edges.push(edge),
        Err(error) => {
          self.error.get_or_insert((line, error));
        }
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
  Blank,
  Header(&'a str),
  Tag(&'a str),
  Edge(&'a str),
}

pub fn classify(line: &str) -> LineKind<'_> {
  let text = line.trim();
  if text.is_empty() {
    LineKind::Blank
  } else if text.starts_with('#') {
    LineKind::Header(text)
  } else if is_graph6_token(text) {
    LineKind::Tag(text)
  } else {
    LineKind::Edge(text)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
  AwaitingHeaderOrEdge,
  AccumulatingBlock(GraphBlock),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
  /// A complete block, terminated by the blank line at `line`.
  Dispatch { line: usize, block: GraphBlock },
  /// A block with a syntax error; `line` is where the error occurred.
  Malformed { line: usize, error: FormatError },
  /// Input ended inside the block starting at `first_line`.
  Truncated { first_line: usize },
}

/// One step of the reader: the next state and the event the line produced.
pub fn transition(state: ReaderState, line: usize, kind: LineKind<'_>) -> (ReaderState, Option<StreamEvent>) {
  match (state, kind) {
    (ReaderState::AwaitingHeaderOrEdge, LineKind::Blank) => (ReaderState::AwaitingHeaderOrEdge, None),
    (ReaderState::AwaitingHeaderOrEdge, kind) => {
      let mut block = GraphBlock::starting_at(line);
      block.absorb(line, kind);
      (ReaderState::AccumulatingBlock(block), None)
    }
    (ReaderState::AccumulatingBlock(block), LineKind::Blank) => {
      let event = match block.error {
        Some((line, error)) => StreamEvent::Malformed { line, error },
        None => StreamEvent::Dispatch { line, block },
      };
      (ReaderState::AwaitingHeaderOrEdge, Some(event))
    }
    (ReaderState::AccumulatingBlock(mut block), kind) => {
      block.absorb(line, kind);
      (ReaderState::AccumulatingBlock(block), None)
    }
  }
}

/// Line-at-a-time block reader. Line numbers start at 1.
#[derive(Debug, Clone)]
pub struct StreamGraphBatchReader {
  state: ReaderState,
  line: usize,
}

impl Default for StreamGraphBatchReader {
  fn default() -> Self {
    Self::new()
  }
}

impl StreamGraphBatchReader {
  pub fn new() -> Self {
    StreamGraphBatchReader { state: ReaderState::AwaitingHeaderOrEdge, line: 0 }
  }

  pub fn state(&self) -> &ReaderState {
    &self.state
  }

  pub fn feed(&mut self, line: &str) -> Option<StreamEvent> {
    self.line += 1;
    let state = std::mem::replace(&mut self.state, ReaderState::AwaitingHeaderOrEdge);
    let (next, event) = transition(state, self.line, classify(line));
    self.state = next;
    event
  }

  /// End of input. A block still being accumulated is discarded.
  pub fn finish(&mut self) -> Option<StreamEvent> {
    match std::mem::replace(&mut self.state, ReaderState::AwaitingHeaderOrEdge) {
      ReaderState::AwaitingHeaderOrEdge => None,
      ReaderState::AccumulatingBlock(block) => Some(StreamEvent::Truncated { first_line: block.first_line }),
    }
  }
}

/// =============== Drivers ===============

/// graph6 strings longer than this are written, but with a warning.
pub const LARGE_GRAPH6_BYTES: usize = 1 << 26;

fn warn_if_large(graph: &Graph, line: usize) {
  let len = graph6::encoded_len(graph.node_count());
  if len > LARGE_GRAPH6_BYTES {
    warn!("Graph at line {line} has {} vertices; its graph6 form takes {len} bytes", graph.node_count());
  }
}

/// Filters a stream of blocks. Malformed blocks are skipped and truncated
/// ones discarded, both with a warning; pipeline errors end the run.
pub fn run_blocks<R: BufRead>(
  reader: R,
  pipeline: &FilterPipeline,
  sink: &mut dyn GraphSink,
  progress: bool,
) -> Result<RunSummary> {
  let pb = progress_spinner("lines", progress);
  let mut blocks = StreamGraphBatchReader::new();
  let mut summary = RunSummary::default();
  for line in reader.lines() {
    let line = line?;
    if let Some(event) = blocks.feed(&line) {
      handle_event(event, pipeline, sink, &mut summary)?;
    }
    pb.inc(1);
  }
  if let Some(event) = blocks.finish() {
    handle_event(event, pipeline, sink, &mut summary)?;
  }
  pb.finish_and_clear();
  Ok(summary)
}

fn handle_event(
  event: StreamEvent,
  pipeline: &FilterPipeline,
  sink: &mut dyn GraphSink,
  summary: &mut RunSummary,
) -> Result<()> {
  match event {
    StreamEvent::Dispatch { line, block } => match block.to_graph() {
      Ok(graph) => {
        warn_if_large(&graph, line);
        let decision = pipeline.process(&graph, SourceId::Line(line), block.tag.as_deref())?;
        emit(&graph, &decision, sink, summary)?;
      }
      Err(error) => {
        warn!("Skipping block ending at line {line}: {error}");
        summary.skipped_blocks += 1;
      }
    },
    StreamEvent::Malformed { line, error } => {
      warn!("Skipping malformed block (line {line}): {error}");
      summary.skipped_blocks += 1;
    }
    StreamEvent::Truncated { first_line } => {
      warn!("Input ended inside the block starting at line {first_line}; block discarded");
      summary.truncated_blocks += 1;
    }
  }
  Ok(())
}

/// Filters one graph6 string per line, as written by geng. Blank lines and
/// lines starting with `#` or `>>` are ignored, and a leading `>>graph6<<`
/// is stripped. Undecodable lines are skipped with a warning.
pub fn run_graph6_lines<R: BufRead>(
  reader: R,
  pipeline: &FilterPipeline,
  sink: &mut dyn GraphSink,
  progress: bool,
) -> Result<RunSummary> {
  let pb = progress_spinner("graph6", progress);
  let mut summary = RunSummary::default();
  for (index, line) in reader.lines().enumerate() {
    let line = line?;
    pb.inc(1);
    let text = line.trim();
    let text = text.strip_prefix(GRAPH6_HEADER).unwrap_or(text);
    if text.is_empty() || text.starts_with('#') || text.starts_with(">>") {
      continue;
    }
    let line_no = index + 1;
    match graph6::decode(text) {
      Ok(graph) => {
        let decision = pipeline.process(&graph, SourceId::Line(line_no), Some(text))?;
        emit(&graph, &decision, sink, &mut summary)?;
      }
      Err(error) => {
        warn!("Skipping line {line_no}: {error}");
        summary.skipped_blocks += 1;
      }
    }
  }
  pb.finish_and_clear();
  Ok(summary)
}

/// Filters the single graph of an edge-list file. Any format error is fatal.
pub fn run_edge_list<R: BufRead>(reader: R, pipeline: &FilterPipeline, sink: &mut dyn GraphSink) -> Result<RunSummary> {
  let graph = read_edge_list(reader)?.to_graph()?;
  warn_if_large(&graph, 0);
  let mut summary = RunSummary::default();
  let decision = pipeline.process(&graph, SourceId::Line(0), None)?;
  emit(&graph, &decision, sink, &mut summary)?;
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::oracle::{AllOf, Planar};

  fn feed_all(reader: &mut StreamGraphBatchReader, text: &str) -> Vec<StreamEvent> {
    text.lines().filter_map(|line| reader.feed(line)).collect()
  }

  #[test]
  fn classifies_lines() {
    assert_eq!(classify(""), LineKind::Blank);
    assert_eq!(classify("   "), LineKind::Blank);
    assert_eq!(classify("# 3 2"), LineKind::Header("# 3 2"));
    assert_eq!(classify("Bw"), LineKind::Tag("Bw"));
    assert_eq!(classify("0 1"), LineKind::Edge("0 1"));
  }

  #[test]
  fn complete_block_is_dispatched_and_reader_resets() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "# 3 2\n0 1\n1 2\n\n");
    assert_eq!(events.len(), 1);
    let StreamEvent::Dispatch { line, block } = &events[0] else {
      panic!("expected a dispatched block, got {:?}", events[0]);
    };
    assert_eq!(*line, 4);
    assert_eq!(block.declared_vertices, Some(3));
    assert_eq!(block.declared_edges, Some(2));
    assert_eq!(block.edges, vec![(0, 1), (1, 2)]);
    assert_eq!(block.tag, None);
    assert_eq!(reader.state(), &ReaderState::AwaitingHeaderOrEdge);
    assert_eq!(reader.finish(), None);
  }

  #[test]
  fn missing_terminator_truncates_the_block() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "# 3 2\n0 1\n1 2\n");
    assert!(events.is_empty());
    assert_eq!(reader.finish(), Some(StreamEvent::Truncated { first_line: 1 }));
  }

  #[test]
  fn tag_is_stored_not_parsed_as_an_edge() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "# 3 3\nBw\n0 1\n0 2\n1 2\n\n");
    let StreamEvent::Dispatch { block, .. } = &events[0] else {
      panic!("expected a dispatched block");
    };
    assert_eq!(block.tag.as_deref(), Some("Bw"));
    assert_eq!(block.edges.len(), 3);
  }

  #[test]
  fn header_resets_the_edge_list() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "# 5 1\n3 4\n# 3 1\n0 2\n\n");
    let StreamEvent::Dispatch { block, .. } = &events[0] else {
      panic!("expected a dispatched block");
    };
    assert_eq!(block.declared_vertices, Some(3));
    assert_eq!(block.edges, vec![(0, 2)]);
    assert_eq!(block.first_line, 1);
  }

  #[test]
  fn blank_lines_between_blocks_are_ignored() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "\n\n# 2 1\n0 1\n\n\n\n# 2 0\n\n");
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, StreamEvent::Dispatch { .. })));
  }

  #[test]
  fn syntax_errors_mark_the_block_malformed() {
    let mut reader = StreamGraphBatchReader::new();
    let events = feed_all(&mut reader, "# 3 1\n0 x\n\n# 3 1\n0 1\n\n");
    assert_eq!(events[0], StreamEvent::Malformed { line: 2, error: FormatError::MalformedEdge("0 x".into()) });
    assert!(matches!(events[1], StreamEvent::Dispatch { line: 6, .. }));
  }

  #[test]
  fn block_validation() {
    let block = GraphBlock { declared_vertices: Some(3), declared_edges: Some(2), edges: vec![(0, 1)], ..GraphBlock::default() };
    assert_eq!(block.to_graph(), Err(FormatError::EdgeCountMismatch { declared: 2, found: 1 }));
    let headless = GraphBlock { edges: vec![(0, 1)], ..GraphBlock::default() };
    assert_eq!(headless.to_graph(), Err(FormatError::MissingHeader));
    let out_of_range = GraphBlock { declared_vertices: Some(2), declared_edges: Some(1), edges: vec![(0, 5)], ..GraphBlock::default() };
    assert!(out_of_range.to_graph().is_err());
  }

  #[test]
  fn block_driver_filters_and_counts() {
    let k5: String = crate::enumerate::EdgeUniverse::new(5)
      .edges()
      .iter()
      .map(|(u, v)| format!("{u} {v}\n"))
      .collect();
    let input = format!("# 3 2\n0 1\n1 2\n\n# 5 10\n{k5}\n0 1\n\n# 3 5\n0 1\n\n# 4 1\n0 1\n");
    let pipeline = FilterPipeline::new(Planar);
    let mut out: Vec<String> = Vec::new();
    let summary = run_blocks(input.as_bytes(), &pipeline, &mut out, false).unwrap();
    assert_eq!(out, vec!["Bg".to_owned()]);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 1);
    // the headless block and the edge-count mismatch
    assert_eq!(summary.skipped_blocks, 2);
    assert_eq!(summary.truncated_blocks, 1);
  }

  #[test]
  fn graph6_driver_skips_headers_and_bad_lines() {
    let input = ">>graph6<<Bw\n# comment\n\nC~\nD\nDQc\n";
    let pipeline = FilterPipeline::new(AllOf(Vec::new())).keep_tag(true);
    let mut out: Vec<String> = Vec::new();
    let summary = run_graph6_lines(input.as_bytes(), &pipeline, &mut out, false).unwrap();
    assert_eq!(out, vec!["Bw", "C~", "DQc"]);
    assert_eq!(summary.skipped_blocks, 1);
  }

  #[test]
  fn edge_list_errors_are_fatal() {
    let pipeline = FilterPipeline::new(Planar);
    let mut out: Vec<String> = Vec::new();
    let summary = run_edge_list("0 1\n1 2\n2 0\n".as_bytes(), &pipeline, &mut out).unwrap();
    assert_eq!(summary.accepted, 1);
    assert_eq!(out, vec!["Bw".to_owned()]);
    assert!(matches!(
      run_edge_list("0 0\n".as_bytes(), &pipeline, &mut out),
      Err(Error::Format { error: FormatError::SelfLoop(0), .. })
    ));
  }
}
