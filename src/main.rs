use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use log::info;

use planar_enumeration::config::{self, InputFormat, Mode, RunConfig};
use planar_enumeration::output::{GraphSink, JsonExport, LineWriter, OutputSinks};
use planar_enumeration::pipeline::enumerate_subgraphs;
use planar_enumeration::stats::DegreePatternCounter;
use planar_enumeration::stream::{run_blocks, run_edge_list, run_graph6_lines};

fn main() -> anyhow::Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let matches = config::command().get_matches();
  let config = RunConfig::from_matches(&matches);

  if config.threads > 0 {
    rayon::ThreadPoolBuilder::new()
      .num_threads(config.threads)
      .build_global()
      .context("failed to create thread pool")?;
  }

  let out: Box<dyn Write> = match &config.output {
    Some(path) => Box::new(BufWriter::new(
      File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
    )),
    None => Box::new(BufWriter::new(io::stdout().lock())),
  };
  let mut sinks = OutputSinks {
    lines: LineWriter::new(out),
    json: config.json.as_ref().map(JsonExport::new),
    degrees: config.degree_patterns.then(DegreePatternCounter::default),
  };

  let pipeline = config.build_pipeline();
  info!(
    "Filters: {:?}{}",
    config.filters,
    if pipeline.dedup_enabled() { ", deduplicating" } else { "" }
  );

  let summary = match &config.mode {
    Mode::BruteForce { vertices, .. } => {
      enumerate_subgraphs(&pipeline, *vertices, &config.enumeration_options(), &mut sinks)?
    }
    Mode::Stream { input, format } => {
      let reader = config::open_input(input.as_deref())
        .with_context(|| format!("cannot open {}", input.as_deref().map_or("stdin".into(), |p| p.display().to_string())))?;
      match format {
        InputFormat::Blocks => run_blocks(reader, &pipeline, &mut sinks, config.progress)?,
        InputFormat::Graph6 => run_graph6_lines(reader, &pipeline, &mut sinks, config.progress)?,
        InputFormat::Edges => run_edge_list(reader, &pipeline, &mut sinks)?,
      }
    }
  };

  sinks.finish().context("failed to write output")?;
  if let Some(degrees) = &sinks.degrees {
    degrees.log_summary();
  }
  info!("{summary}");
  Ok(())
}
