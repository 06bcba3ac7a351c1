use std::fmt;

use thiserror::Error;

/// =============== Format errors (graph6 text, block headers, edge lines) ===============

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
  #[error("empty graph6 string")]
  EmptyGraph6,
  #[error("invalid graph6 byte {byte:#04x} at offset {offset}")]
  InvalidGraph6Byte { byte: u8, offset: usize },
  #[error("graph6 vertex count {n} exceeds the supported maximum {max}")]
  TooManyVertices { n: u64, max: u64 },
  #[error("graph6 header encodes n = {0} in the long form")]
  NonCanonicalHeader(u64),
  #[error("truncated graph6 data: expected {expected} bytes, got {got}")]
  TruncatedGraph6 { expected: usize, got: usize },
  #[error("graph6 string has {extra} trailing bytes")]
  TrailingGraph6Bytes { extra: usize },
  #[error("graph6 padding bits are not zero")]
  NonZeroPadding,
  #[error("malformed block header: {0:?}")]
  MalformedHeader(String),
  #[error("malformed edge line: {0:?}")]
  MalformedEdge(String),
  #[error("self-loop at vertex {0}")]
  SelfLoop(usize),
  #[error("edge ({u}, {v}) out of range for {n} vertices")]
  VertexOutOfRange { u: usize, v: usize, n: usize },
  #[error("block declares {declared} edges but lists {found}")]
  EdgeCountMismatch { declared: usize, found: usize },
  #[error("edge lines before any block header")]
  MissingHeader,
  #[error("relabeling of length {len} is not a permutation of {n} vertices")]
  InvalidPermutation { len: usize, n: usize },
}

/// Failure raised by a structural predicate or a canonicalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
  #[error("{oracle}: unsupported input ({reason})")]
  Unsupported { oracle: String, reason: String },
}

/// Identity of the candidate a pipeline step was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
  Mask(u64),
  Line(usize),
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SourceId::Mask(mask) => write!(f, "mask {mask}"),
      SourceId::Line(line) => write!(f, "line {line}"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("edge universe of {edges} edges exceeds the {max}-bit mask capacity")]
  CapacityExceeded { edges: usize, max: usize },
  #[error("format error{}: {error}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
  Format { line: Option<usize>, error: FormatError },
  #[error("pipeline error on {source_id}: {error}")]
  Pipeline { source_id: SourceId, error: OracleError },
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl From<FormatError> for Error {
  fn from(error: FormatError) -> Self {
    Error::Format { line: None, error }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pipeline_error_names_the_candidate() {
    let err = Error::Pipeline {
      source_id: SourceId::Mask(42),
      error: OracleError::Unsupported { oracle: "planar".into(), reason: "boom".into() },
    };
    assert_eq!(err.to_string(), "pipeline error on mask 42: planar: unsupported input (boom)");
  }

  #[test]
  fn format_error_mentions_line_when_known() {
    let err = Error::Format { line: Some(7), error: FormatError::MissingHeader };
    assert_eq!(err.to_string(), "format error at line 7: edge lines before any block header");
    let err: Error = FormatError::EmptyGraph6.into();
    assert_eq!(err.to_string(), "format error: empty graph6 string");
  }
}
