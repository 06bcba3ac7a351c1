use std::io::BufRead;

use crate::error::{Error, FormatError, Result};
use crate::graph::{Graph, MAX_ORDER};

/// A graph given as an explicit `(u, v)` list, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeListGraph {
  node_count: usize,
  edges: Vec<(usize, usize)>,
}

impl EdgeListGraph {
  pub fn new(node_count: usize, edges: Vec<(usize, usize)>) -> Self {
    EdgeListGraph { node_count, edges }
  }

  /// Vertex count is one past the largest endpoint.
  pub fn from_pairs(edges: Vec<(usize, usize)>) -> Self {
    let node_count = edges.iter().map(|&(u, v)| u.max(v).saturating_add(1)).max().unwrap_or(0);
    EdgeListGraph { node_count, edges }
  }

  pub fn node_count(&self) -> usize {
    self.node_count
  }

  pub fn edges(&self) -> &[(usize, usize)] {
    &self.edges
  }

  pub fn to_graph(&self) -> Result<Graph, FormatError> {
    Graph::from_edges(self.node_count, self.edges.iter().copied())
  }
}

fn parse_pair(line: &str) -> Option<(usize, usize)> {
  let mut fields = line.split_whitespace();
  let u = fields.next()?.parse().ok()?;
  let v = fields.next()?.parse().ok()?;
  fields.next().is_none().then_some((u, v))
}

/// Parses `u v`. Endpoints must be below [`MAX_ORDER`].
pub fn parse_edge_line(line: &str) -> Result<(usize, usize), FormatError> {
  let (u, v) = parse_pair(line).ok_or_else(|| FormatError::MalformedEdge(line.to_owned()))?;
  if u >= MAX_ORDER || v >= MAX_ORDER {
    return Err(FormatError::VertexOutOfRange { u, v, n: MAX_ORDER });
  }
  Ok((u, v))
}

/// Parses a `# n m` block header into `(n, m)`.
pub fn parse_header(line: &str) -> Result<(usize, usize), FormatError> {
  line
    .trim()
    .strip_prefix('#')
    .and_then(parse_pair)
    .ok_or_else(|| FormatError::MalformedHeader(line.to_owned()))
}

/// Reads a single graph, one `u v` pair per line. Lines starting with `#`
/// are comments, except a leading `# n m` line which fixes the vertex count
/// and the number of edge lines to expect.
pub fn read_edge_list<R: BufRead>(reader: R) -> Result<EdgeListGraph> {
  let mut declared = None;
  let mut edges = Vec::new();
  for (index, line) in reader.lines().enumerate() {
    let line = line?;
    let text = line.trim();
    if text.is_empty() {
      continue;
    }
    if text.starts_with('#') {
      if declared.is_none() && edges.is_empty() {
        declared = parse_header(text).ok();
      }
      continue;
    }
    let edge = parse_edge_line(text).map_err(|error| Error::Format { line: Some(index + 1), error })?;
    edges.push(edge);
  }

  match declared {
    Some((n, m)) => {
      if m != edges.len() {
        return Err(FormatError::EdgeCountMismatch { declared: m, found: edges.len() }.into());
      }
      Ok(EdgeListGraph::new(n, edges))
    }
    None => Ok(EdgeListGraph::from_pairs(edges)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_edges_and_headers() {
    assert_eq!(parse_edge_line("3 4"), Ok((3, 4)));
    assert_eq!(parse_edge_line("  0\t12 "), Ok((0, 12)));
    assert_eq!(parse_edge_line("0"), Err(FormatError::MalformedEdge("0".into())));
    assert_eq!(parse_edge_line("0 1 2"), Err(FormatError::MalformedEdge("0 1 2".into())));
    assert_eq!(parse_edge_line("a b"), Err(FormatError::MalformedEdge("a b".into())));
    assert_eq!(parse_header("# 5 7"), Ok((5, 7)));
    assert_eq!(parse_header("#5 7"), Ok((5, 7)));
    assert_eq!(parse_header("# five"), Err(FormatError::MalformedHeader("# five".into())));
    // edge counts are not vertex ids
    assert_eq!(parse_header("# 1000 499500"), Ok((1000, 499_500)));
  }

  #[test]
  fn huge_vertex_ids_are_format_errors() {
    let max = usize::MAX;
    assert_eq!(
      parse_edge_line(&format!("0 {max}")),
      Err(FormatError::VertexOutOfRange { u: 0, v: max, n: MAX_ORDER })
    );
    assert!(parse_edge_line(&format!("{} 0", MAX_ORDER - 1)).is_ok());
    let err = read_edge_list(format!("0 1\n0 {max}\n").as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Format { line: Some(2), error: FormatError::VertexOutOfRange { .. } }));
    assert_eq!(EdgeListGraph::from_pairs(vec![(0, max)]).node_count(), max);
    assert!(EdgeListGraph::from_pairs(vec![(0, max)]).to_graph().is_err());
  }

  #[test]
  fn infers_vertex_count_from_pairs() {
    let g = EdgeListGraph::from_pairs(vec![(0, 3), (1, 2)]);
    assert_eq!(g.node_count(), 4);
    assert_eq!(EdgeListGraph::from_pairs(Vec::new()).node_count(), 0);
  }

  #[test]
  fn conversion_validates_edges() {
    let g = EdgeListGraph::new(3, vec![(2, 1), (0, 1)]).to_graph().unwrap();
    assert_eq!(g.edges(), &[(0, 1), (1, 2)]);
    assert_eq!(EdgeListGraph::new(3, vec![(1, 1)]).to_graph(), Err(FormatError::SelfLoop(1)));
    assert!(EdgeListGraph::new(2, vec![(0, 2)]).to_graph().is_err());
  }

  #[test]
  fn reads_edge_list_files() {
    let text = "# 6 2\n0 1\n# a comment\n4 2\n";
    let g = read_edge_list(text.as_bytes()).unwrap();
    assert_eq!(g.node_count(), 6);
    assert_eq!(g.edges(), &[(0, 1), (4, 2)]);

    let g = read_edge_list("0 1\n1 2\n\n2 0\n".as_bytes()).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.edges().len(), 3);
  }

  #[test]
  fn reports_the_failing_line() {
    let err = read_edge_list("0 1\n1 x\n".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Format { line: Some(2), error: FormatError::MalformedEdge(_) }));
    let err = read_edge_list("# 3 3\n0 1\n".as_bytes()).unwrap_err();
    assert!(matches!(
      err,
      Error::Format { error: FormatError::EdgeCountMismatch { declared: 3, found: 1 }, .. }
    ));
  }
}
