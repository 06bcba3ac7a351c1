//! graph6 text codec.
//!
//! A graph6 string is `N(n)` followed by the upper triangle of the adjacency
//! matrix, read column by column (`(0,1), (0,2), (1,2), (0,3), ...`), packed
//! six bits per byte, most significant bit first, each byte offset by 63.
//! `N(n)` is one byte for `n <= 62` and `126` plus three bytes otherwise.

use crate::error::FormatError;
use crate::graph::{Graph, MAX_ORDER};

const OFFSET: u8 = 63;
const LONG_FORM: u8 = 126;
const SHORT_MAX: usize = 62;

/// Optional file header written by nauty tools.
pub const GRAPH6_HEADER: &str = ">>graph6<<";

/// True when `line` starts with a byte from the graph6 printable range.
pub fn is_graph6_token(line: &str) -> bool {
  line.as_bytes().first().is_some_and(|&b| (OFFSET..=LONG_FORM).contains(&b))
}

/// Length of the graph6 string of any `n`-vertex graph: about `n² / 12`
/// bytes, so roughly 5.5 GB at [`MAX_ORDER`].
pub fn encoded_len(n: usize) -> usize {
  let header = if n <= SHORT_MAX { 1 } else { 4 };
  header + data_len(n)
}

pub fn encode(graph: &Graph) -> String {
  let n = graph.node_count();
  let mut out = Vec::with_capacity(encoded_len(n));
  if n <= SHORT_MAX {
    out.push(n as u8 + OFFSET);
  } else {
    out.push(LONG_FORM);
    for shift in [12, 6, 0] {
      out.push(((n >> shift) & 0x3f) as u8 + OFFSET);
    }
  }

  let mut groups = vec![0u8; data_len(n)];
  for &(i, j) in graph.edges() {
    let k = j * (j - 1) / 2 + i;
    groups[k / 6] |= 1 << (5 - k % 6);
  }
  out.extend(groups.into_iter().map(|g| g + OFFSET));

  // every byte is within 63..=126
  out.into_iter().map(char::from).collect()
}

pub fn decode(text: &str) -> Result<Graph, FormatError> {
  let bytes = text.as_bytes();
  if bytes.is_empty() {
    return Err(FormatError::EmptyGraph6);
  }
  if let Some((offset, &byte)) = bytes
    .iter()
    .enumerate()
    .find(|&(_, &b)| !(OFFSET..=LONG_FORM).contains(&b))
  {
    return Err(FormatError::InvalidGraph6Byte { byte, offset });
  }

  let (n, header_len) = decode_order(bytes)?;
  let expected = data_len(n);
  let data = &bytes[header_len..];
  if data.len() < expected {
    return Err(FormatError::TruncatedGraph6 { expected: header_len + expected, got: bytes.len() });
  }
  if data.len() > expected {
    return Err(FormatError::TrailingGraph6Bytes { extra: data.len() - expected });
  }

  let bit = |k: usize| (data[k / 6] - OFFSET) >> (5 - k % 6) & 1 == 1;
  let num_bits = n * n.saturating_sub(1) / 2;
  if (num_bits..expected * 6).any(bit) {
    return Err(FormatError::NonZeroPadding);
  }

  let mut edges = Vec::new();
  let mut k = 0;
  for j in 1..n {
    for i in 0..j {
      if bit(k) {
        edges.push((i, j));
      }
      k += 1;
    }
  }
  edges.sort_unstable();
  Ok(Graph::from_normalized(n, edges))
}

fn decode_order(bytes: &[u8]) -> Result<(usize, usize), FormatError> {
  let value = |digits: &[u8]| digits.iter().fold(0u64, |acc, &b| (acc << 6) | u64::from(b - OFFSET));

  if bytes[0] != LONG_FORM {
    return Ok((usize::from(bytes[0] - OFFSET), 1));
  }
  if bytes.get(1) == Some(&LONG_FORM) {
    // 8-byte form, only used beyond MAX_ORDER
    if bytes.len() < 8 {
      return Err(FormatError::TruncatedGraph6 { expected: 8, got: bytes.len() });
    }
    return Err(FormatError::TooManyVertices { n: value(&bytes[2..8]), max: MAX_ORDER as u64 });
  }
  if bytes.len() < 4 {
    return Err(FormatError::TruncatedGraph6 { expected: 4, got: bytes.len() });
  }
  let n = value(&bytes[1..4]);
  if n <= SHORT_MAX as u64 {
    return Err(FormatError::NonCanonicalHeader(n));
  }
  // 18 bits never exceed MAX_ORDER
  Ok((n as usize, 4))
}

/// Number of data bytes for an `n`-vertex graph.
fn data_len(n: usize) -> usize {
  (n * n.saturating_sub(1) / 2).div_ceil(6)
}
