//! Command-line surface and the run configuration built from it.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::canon::RefinementCanonicalizer;
use crate::oracle::{AllOf, Connected, DegreeConstraints, MinDegree, Planar, StructuralPredicate, Triconnected};
use crate::pipeline::{EnumerationOptions, FilterPipeline};

const BUF_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
  Blocks,
  Graph6,
  Edges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
  Planar,
  Connected,
  Triconnected,
  /// No structural restriction.
  All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  /// Filter graphs read from `input` (stdin when `None`).
  Stream { input: Option<PathBuf>, format: InputFormat },
  /// Every subgraph of `K_vertices`.
  BruteForce { vertices: usize, resume_from: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
  pub mode: Mode,
  pub filters: Vec<Filter>,
  pub min_degree: Option<usize>,
  pub degree_constraints: Vec<(usize, usize)>,
  pub dedup: bool,
  pub keep_tag: bool,
  /// Worker threads for brute force; 0 runs sequentially.
  pub threads: usize,
  pub json: Option<PathBuf>,
  pub degree_patterns: bool,
  pub output: Option<PathBuf>,
  pub progress: bool,
}

pub fn command() -> Command {
  Command::new("planar-enumeration")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Enumerates or filters graphs by structural properties and writes the survivors in graph6.")
    .after_help(
      "EXAMPLES:\n    planar-enumeration --vertices 6 --dedup\n    geng -c 8 | planar-enumeration --format graph6 --filter triconnected\n    planar-enumeration blocks.txt.zst --keep-tag",
    )
    .arg(
      Arg::new("input")
        .help("Input file (`.zst` is decompressed); stdin when absent or `-`")
        .value_parser(clap::value_parser!(PathBuf))
        .index(1),
    )
    .arg(
      Arg::new("vertices")
        .short('n')
        .long("vertices")
        .help("Enumerate every subgraph of the complete graph on N vertices")
        .value_name("N")
        .value_parser(clap::value_parser!(usize))
        .conflicts_with("input"),
    )
    .arg(
      Arg::new("format")
        .long("format")
        .help("Input format")
        .value_parser(["blocks", "graph6", "edges"])
        .default_value("blocks"),
    )
    .arg(
      Arg::new("filter")
        .short('f')
        .long("filter")
        .help("Structural filter; repeat to require several")
        .value_parser(["planar", "connected", "triconnected", "all"])
        .action(ArgAction::Append)
        .default_value("planar"),
    )
    .arg(
      Arg::new("min_degree")
        .long("min-degree")
        .help("Require every vertex to have at least K neighbors")
        .value_name("K")
        .value_parser(clap::value_parser!(usize)),
    )
    .arg(
      Arg::new("degree")
        .long("degree")
        .help("Require exactly C vertices of degree D")
        .value_name("D:C")
        .value_parser(parse_degree_constraint)
        .action(ArgAction::Append),
    )
    .arg(
      Arg::new("dedup")
        .long("dedup")
        .help("Emit one graph per isomorphism class")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("keep_tag")
        .long("keep-tag")
        .help("Emit the input's graph6 tag verbatim instead of re-encoding (ignored with --dedup)")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("resume_from")
        .long("resume-from")
        .help("Brute force: start at this mask")
        .value_name("MASK")
        .value_parser(clap::value_parser!(u64))
        .default_value("0"),
    )
    .arg(
      Arg::new("threads")
        .short('t')
        .long("threads")
        .help("Worker threads for brute force (0 = sequential)")
        .value_name("NUM")
        .value_parser(clap::value_parser!(usize))
        .default_value("0"),
    )
    .arg(
      Arg::new("json")
        .long("json")
        .help("Also export accepted graphs as JSON")
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("degree_patterns")
        .long("degree-patterns")
        .help("Log the degree-pattern histogram of accepted graphs")
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("output")
        .short('o')
        .long("output")
        .help("Write accepted graphs to PATH instead of stdout")
        .value_name("PATH")
        .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
      Arg::new("quiet")
        .short('q')
        .long("quiet")
        .help("Hide progress bars")
        .action(ArgAction::SetTrue),
    )
}

fn parse_degree_constraint(text: &str) -> Result<(usize, usize), String> {
  let (degree, count) = text.split_once(':').ok_or_else(|| format!("expected D:C, got {text:?}"))?;
  let degree = degree.trim().parse::<usize>().map_err(|e| format!("bad degree {degree:?}: {e}"))?;
  let count = count.trim().parse::<usize>().map_err(|e| format!("bad count {count:?}: {e}"))?;
  Ok((degree, count))
}

impl RunConfig {
  pub fn from_matches(matches: &ArgMatches) -> Self {
    let format = match matches.get_one::<String>("format").map(String::as_str) {
      Some("graph6") => InputFormat::Graph6,
      Some("edges") => InputFormat::Edges,
      _ => InputFormat::Blocks,
    };
    let mode = match matches.get_one::<usize>("vertices") {
      Some(&vertices) => Mode::BruteForce {
        vertices,
        resume_from: matches.get_one::<u64>("resume_from").copied().unwrap_or(0),
      },
      None => Mode::Stream {
        input: matches.get_one::<PathBuf>("input").filter(|p| p.as_os_str() != "-").cloned(),
        format,
      },
    };
    let filters = matches
      .get_many::<String>("filter")
      .into_iter()
      .flatten()
      .map(|name| match name.as_str() {
        "connected" => Filter::Connected,
        "triconnected" => Filter::Triconnected,
        "all" => Filter::All,
        _ => Filter::Planar,
      })
      .collect();

    RunConfig {
      mode,
      filters,
      min_degree: matches.get_one::<usize>("min_degree").copied(),
      degree_constraints: matches.get_many::<(usize, usize)>("degree").into_iter().flatten().copied().collect(),
      dedup: matches.get_flag("dedup"),
      keep_tag: matches.get_flag("keep_tag"),
      threads: matches.get_one::<usize>("threads").copied().unwrap_or(0),
      json: matches.get_one::<PathBuf>("json").cloned(),
      degree_patterns: matches.get_flag("degree_patterns"),
      output: matches.get_one::<PathBuf>("output").cloned(),
      progress: !matches.get_flag("quiet"),
    }
  }

  /// The requested filters as one conjunction, in command-line order, then
  /// the degree requirements.
  pub fn predicate(&self) -> AllOf {
    let mut predicates: Vec<Box<dyn StructuralPredicate>> = Vec::new();
    for filter in &self.filters {
      match filter {
        Filter::Planar => predicates.push(Box::new(Planar)),
        Filter::Connected => predicates.push(Box::new(Connected)),
        Filter::Triconnected => predicates.push(Box::new(Triconnected)),
        Filter::All => {}
      }
    }
    if let Some(k) = self.min_degree {
      predicates.push(Box::new(MinDegree(k)));
    }
    if !self.degree_constraints.is_empty() {
      predicates.push(Box::new(DegreeConstraints(self.degree_constraints.clone())));
    }
    AllOf(predicates)
  }

  pub fn build_pipeline(&self) -> FilterPipeline {
    let pipeline = FilterPipeline::new(self.predicate()).keep_tag(self.keep_tag);
    if self.dedup { pipeline.with_dedup(RefinementCanonicalizer) } else { pipeline }
  }

  pub fn enumeration_options(&self) -> EnumerationOptions {
    let resume_from = match self.mode {
      Mode::BruteForce { resume_from, .. } => resume_from,
      Mode::Stream { .. } => 0,
    };
    EnumerationOptions { resume_from, parallel: self.threads > 0, progress: self.progress, ..EnumerationOptions::default() }
  }
}

/// Opens `path` for line reading, or stdin for `None`. Files ending in
/// `.zst` are decompressed on the fly.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
  let Some(path) = path else {
    return Ok(Box::new(BufReader::with_capacity(BUF_SIZE, io::stdin())));
  };
  let file = File::open(path)?;
  if path.extension().is_some_and(|ext| ext == "zst") {
    let decoder = zstd::stream::read::Decoder::new(file)?;
    Ok(Box::new(BufReader::with_capacity(BUF_SIZE, decoder)))
  } else {
    Ok(Box::new(BufReader::with_capacity(BUF_SIZE, file)))
  }
}
