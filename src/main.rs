use anyhow::{bail, Context, Result};
use clap::Parser;
use poly_simplify::batch::BatchSimplifier;
use poly_simplify::geom;
use poly_simplify::reader::{self, ReadOptions};
use poly_simplify::statistics::SimplifyStats;
use poly_simplify::writer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

#[derive(Debug, Parser)]
#[clap(
  name = "poly_simplify",
  about = "Reduce the point count of .poly boundary files with Douglas-Peucker",
  version
)]
struct Cli {
  /// Input .poly file, plain or gzip-compressed
  #[clap(value_parser)]
  input: PathBuf,

  /// Tolerance in degrees
  #[clap(value_parser, allow_hyphen_values = true)]
  tolerance: f64,

  /// Output file [default: <input>-simplify.poly next to the input]
  #[clap(short, long, value_parser)]
  output: Option<PathBuf>,

  /// Worker threads, 0 picks a count from the number of CPUs
  #[clap(short = 'j', long, value_parser, default_value_t = 0)]
  workers: usize,

  /// Close unclosed rings instead of dropping them
  #[clap(long, action)]
  close_rings: bool,

  /// Print the report as JSON
  #[clap(long, action)]
  json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
  name: &'a str,
  input: String,
  output: String,
  tolerance: f64,
  outer_rings: usize,
  inner_rings: usize,
  points_before: usize,
  points_after: usize,
  retained_fraction: Option<f64>,
}

fn init_logging() {
  let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  Registry::default()
    .with(filter_layer)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

// foo.poly -> foo-simplify.poly, foo.poly.gz -> foo-simplify.poly.gz
fn default_output_path(input: &Path) -> PathBuf {
  let gzipped = input.extension().map_or(false, |ext| ext == "gz");
  let base = if gzipped {
    input.with_extension("")
  } else {
    input.to_path_buf()
  };
  let stem = base
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| "output".to_string());
  let file_name = if gzipped {
    format!("{}-simplify.poly.gz", stem)
  } else {
    format!("{}-simplify.poly", stem)
  };
  input.with_file_name(file_name)
}

fn print_report(
  cli: &Cli,
  output: &Path,
  name: &str,
  counts: (usize, usize),
  stats: SimplifyStats,
) -> Result<()> {
  if cli.json {
    let report = Report {
      name,
      input: cli.input.display().to_string(),
      output: output.display().to_string(),
      tolerance: cli.tolerance,
      outer_rings: counts.0,
      inner_rings: counts.1,
      points_before: stats.points_before,
      points_after: stats.points_after,
      retained_fraction: stats.retained_fraction(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    println!("{}", stats);
  }
  Ok(())
}

fn run(cli: Cli) -> Result<()> {
  // fail if input file does not exist
  if !cli.input.exists() {
    bail!("File {} not found.", cli.input.display());
  }
  let tolerance = geom::scale_tolerance(cli.tolerance)?;
  let output = cli
    .output
    .clone()
    .unwrap_or_else(|| default_output_path(&cli.input));

  let options = ReadOptions {
    close_rings: cli.close_rings,
  };
  let poly = reader::open_poly(&cli.input, &options)
    .with_context(|| format!("failed to read {}", cli.input.display()))?;

  let (simplified, stats) = BatchSimplifier::new(tolerance)
    .with_workers(cli.workers)
    .run(poly)?;

  writer::save_poly(&simplified, &output)
    .with_context(|| format!("failed to write {}", output.display()))?;

  print_report(
    &cli,
    &output,
    &simplified.name,
    (simplified.outer.len(), simplified.inner.len()),
    stats,
  )
}

fn main() {
  init_logging();
  if let Err(err) = run(Cli::parse()) {
    eprintln!("Error: {:#}", err);
    std::process::exit(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_output_path() {
    assert_eq!(
      default_output_path(Path::new("borders/germany.poly")),
      PathBuf::from("borders/germany-simplify.poly")
    );
    assert_eq!(
      default_output_path(Path::new("germany.poly.gz")),
      PathBuf::from("germany-simplify.poly.gz")
    );
    assert_eq!(
      default_output_path(Path::new("noext")),
      PathBuf::from("noext-simplify.poly")
    );
  }

  #[test]
  fn test_cli_parse() {
    let cli = Cli::parse_from(["poly_simplify", "in.poly", "0.01", "-j", "3", "--json"]);
    assert_eq!(cli.input, PathBuf::from("in.poly"));
    assert_eq!(cli.tolerance, 0.01);
    assert_eq!(cli.workers, 3);
    assert!(cli.json);
    assert!(!cli.close_rings);
    assert!(cli.output.is_none());

    assert!(Cli::try_parse_from(["poly_simplify", "in.poly", "abc"]).is_err());
  }

  #[test]
  fn test_run_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("square.poly");
    std::fs::write(
      &input,
      "square\n1\n   0 0\n   0.5 0.0000001\n   1 0\n   1 1\n   0 1\n   0 0\nEND\nEND\n",
    )
    .unwrap();

    let cli = Cli::parse_from(["poly_simplify", input.to_str().unwrap(), "0.001", "-j", "1"]);
    run(cli).unwrap();

    let output = dir.path().join("square-simplify.poly");
    let simplified = reader::open_poly(&output, &ReadOptions::default()).unwrap();
    assert_eq!(simplified.outer[0].len(), 5);

    let cli = Cli::parse_from(["poly_simplify", input.to_str().unwrap(), "-1"]);
    assert_eq!(cli.tolerance, -1.0);
    assert!(run(cli).is_err());

    let missing = dir.path().join("missing.poly");
    let cli = Cli::parse_from(["poly_simplify", missing.to_str().unwrap(), "1"]);
    assert!(run(cli).is_err());
  }
}
