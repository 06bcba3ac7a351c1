//! Destinations for accepted graphs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::graph::{Graph, SerializableGraph};
use crate::stats::DegreePatternCounter;

pub trait GraphSink {
  /// Called once per accepted graph with its output representation.
  fn accept(&mut self, graph: &Graph, representation: &str) -> io::Result<()>;

  fn finish(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl GraphSink for Vec<String> {
  fn accept(&mut self, _graph: &Graph, representation: &str) -> io::Result<()> {
    self.push(representation.to_owned());
    Ok(())
  }
}

impl GraphSink for DegreePatternCounter {
  fn accept(&mut self, graph: &Graph, _representation: &str) -> io::Result<()> {
    self.add(graph);
    Ok(())
  }
}

/// One representation per line.
pub struct LineWriter<W: Write> {
  out: W,
}

impl<W: Write> LineWriter<W> {
  pub fn new(out: W) -> Self {
    LineWriter { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> GraphSink for LineWriter<W> {
  fn accept(&mut self, _graph: &Graph, representation: &str) -> io::Result<()> {
    writeln!(self.out, "{representation}")
  }

  fn finish(&mut self) -> io::Result<()> {
    self.out.flush()
  }
}

/// Collects accepted graphs and writes them as one pretty-printed JSON array
/// of `{ "node_count", "edges" }` objects on `finish`.
pub struct JsonExport {
  path: PathBuf,
  graphs: Vec<SerializableGraph>,
}

impl JsonExport {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    JsonExport { path: path.into(), graphs: Vec::new() }
  }

  pub fn graphs(&self) -> &[SerializableGraph] {
    &self.graphs
  }
}

impl GraphSink for JsonExport {
  fn accept(&mut self, graph: &Graph, _representation: &str) -> io::Result<()> {
    self.graphs.push(SerializableGraph::from(graph));
    Ok(())
  }

  fn finish(&mut self) -> io::Result<()> {
    save_graphs(&self.path, &self.graphs)
  }
}

pub fn save_graphs(path: &Path, graphs: &[SerializableGraph]) -> io::Result<()> {
  info!("Saving {} graphs to {}", graphs.len(), path.display());
  let mut writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(&mut writer, graphs)?;
  writer.flush()
}

/// The sinks a command-line run writes to: accepted lines always, JSON export
/// and degree-pattern statistics when requested.
pub struct OutputSinks {
  pub lines: LineWriter<Box<dyn Write>>,
  pub json: Option<JsonExport>,
  pub degrees: Option<DegreePatternCounter>,
}

impl GraphSink for OutputSinks {
  fn accept(&mut self, graph: &Graph, representation: &str) -> io::Result<()> {
    self.lines.accept(graph, representation)?;
    if let Some(json) = &mut self.json {
      json.accept(graph, representation)?;
    }
    if let Some(degrees) = &mut self.degrees {
      degrees.accept(graph, representation)?;
    }
    Ok(())
  }

  fn finish(&mut self) -> io::Result<()> {
    self.lines.finish()?;
    if let Some(json) = &mut self.json {
      json.finish()?;
    }
    Ok(())
  }
}
