//! Slice stack to STL converter.
//!
//! Reads an ordered stack of greyscale slices (a directory of image files or
//! a TOML index manifest), extracts the isosurface at the requested level
//! with Marching Cubes and writes it as a text or binary STL mesh.
//!
//! While meshing, typing `q` (or ESC) followed by Enter stops after the
//! layers already in flight; the partial mesh is still a valid file.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::{parse_level, Config};
use slice_mesh::pipeline::split_hms;
use slice_mesh::source::list_series;
use slice_mesh::{
	estimate_processing_time, run_pipeline, CancelToken, ImageSlices, LogSink, PipelineSettings, Selection,
	SliceSource, SourceError, StlFormat, VolumeGeometry,
};

const DEFAULT_EXTENSION: &str = "png";

/// Converts a stack of image slices into an STL isosurface mesh.
#[derive(Parser, Debug)]
#[command(name = "slices_to_stl")]
#[command(about = "Extracts an isosurface from a slice stack and writes it as STL")]
struct Args {
	/// Slice directory, or a `.toml` index manifest.
	input: PathBuf,

	/// Directory the mesh is written to (created if missing).
	#[arg(required_unless_present = "list_series")]
	output_dir: Option<PathBuf>,

	/// Isolevel separating inside (below) from outside samples [default: 0].
	#[arg(short, long, allow_negative_numbers = true)]
	isolevel: Option<i32>,

	/// Write binary STL instead of text.
	#[arg(short, long)]
	binary: bool,

	/// Study to mesh when the manifest holds several.
	#[arg(long)]
	study: Option<String>,

	/// Series to mesh when the manifest holds several.
	#[arg(long)]
	series: Option<String>,

	/// Slice file extension for directory input [default: png].
	#[arg(long)]
	extension: Option<String>,

	/// Worker threads for cell building [default: all cores].
	#[arg(long)]
	threads: Option<usize>,

	/// Path to a TOML configuration file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Ask for confirmation after the time estimate.
	#[arg(long)]
	confirm: bool,

	/// Print the studies and series of a manifest and exit.
	#[arg(long)]
	list_series: bool,

	/// More output (-v debug, -vv trace).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Log level: error, warn, info, debug, trace or off.
	#[arg(long)]
	log_level: Option<String>,
}

/// Exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
	Written,
	Declined,
	Cancelled,
}

impl Outcome {
	fn exit_code(self) -> ExitCode {
		match self {
			Outcome::Written => ExitCode::SUCCESS,
			Outcome::Declined => ExitCode::from(2),
			Outcome::Cancelled => ExitCode::from(130),
		}
	}
}

fn main() -> ExitCode {
	let args = Args::parse();

	match run(args) {
		Ok(outcome) => outcome.exit_code(),
		Err(err) => {
			log::error!("{:#}", err);
			eprintln!("Error: {:#}", err);
			if is_empty_input(&err) {
				ExitCode::from(3)
			} else {
				ExitCode::FAILURE
			}
		}
	}
}

fn is_empty_input(err: &anyhow::Error) -> bool {
	matches!(
		err.downcast_ref::<SourceError>(),
		Some(SourceError::NoSlices(_) | SourceError::NoDecodableSlice(_))
	)
}

fn run(args: Args) -> Result<Outcome> {
	let config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};
	init_logging(&args, &config)?;

	if args.list_series {
		print_series(&args.input)?;
		return Ok(Outcome::Written);
	}
	let output_dir = args
		.output_dir
		.clone()
		.context("Output directory is required")?;

	let settings = PipelineSettings {
		isolevel: args.isolevel.or(config.isolevel).unwrap_or(0),
		format: if args.binary || config.binary.unwrap_or(false) {
			StlFormat::Binary
		} else {
			StlFormat::Text
		},
		cell_threads: match args.threads {
			Some(0) => anyhow::bail!("--threads must be at least 1"),
			Some(n) => Some(n),
			None => config.threads,
		},
	};
	let extension = args
		.extension
		.clone()
		.or_else(|| config.extension.clone())
		.unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
	let confirm = args.confirm || config.confirm.unwrap_or(false);

	// Resolve slices
	let selection = Selection::new(args.study.clone(), args.series.clone());
	let source = SliceSource::detect(&args.input, &extension, selection);
	println!("Reading slices from: {}", source.location().display());
	let volume = source
		.resolve(&ImageSlices)
		.with_context(|| format!("Failed to resolve slices in {}", source.location().display()))?;
	println!(
		"{} slices of {}x{} samples, spacing {:?}",
		volume.slices.len(),
		volume.dx,
		volume.dy,
		volume.spacing.to_array()
	);

	std::fs::create_dir_all(&output_dir)
		.with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;
	let output = output_path(&output_dir, &volume);

	let sink = LogSink::start().context("Failed to start log sink")?;

	// Estimate
	let probe = output_dir.join(".slices_to_stl.probe.stl");
	let estimate = estimate_processing_time(&volume, &ImageSlices, &settings, &probe, &sink.handle())
		.context("Time estimation failed")?;
	let (h, m, s) = split_hms(estimate);
	println!("Estimated processing time: {} hours, {} minutes, {} seconds", h, m, s);

	if confirm && !ask("Proceed?")? {
		sink.shutdown();
		return Ok(Outcome::Declined);
	}

	// Mesh
	let cancel = CancelToken::new();
	spawn_cancel_watcher(cancel.clone());
	println!("Writing {} (q + Enter to stop early)", output.display());

	let report = run_pipeline(&volume, &ImageSlices, &cancel, &settings, &output, &sink.handle());
	sink.shutdown();
	let report = report.with_context(|| format!("Meshing failed: {}", output.display()))?;

	println!(
		"\nDone! {} triangles from {} layers ({} skipped) in {:.1?}",
		report.triangles, report.layers_built, report.layers_skipped, report.elapsed
	);
	println!("Output written to: {}", output.display());

	if report.cancelled {
		println!("Stopped early on request; the mesh is partial.");
		Ok(Outcome::Cancelled)
	} else {
		Ok(Outcome::Written)
	}
}

/// `-v` beats `--log-level`, which beats the config file. `RUST_LOG` only
/// applies when none of them is given.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
	let explicit = match args.verbose {
		0 => None,
		1 => Some(LevelFilter::Debug),
		_ => Some(LevelFilter::Trace),
	};
	let explicit = match (explicit, &args.log_level) {
		(Some(level), _) => Some(level),
		(None, Some(level)) => Some(parse_level(level)?),
		(None, None) => config.level(),
	};

	let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
	if let Some(level) = explicit {
		builder.filter_level(level);
	}
	builder.init();
	Ok(())
}

/// `<output_dir>/<stem of the first slice>.stl`
fn output_path(output_dir: &Path, volume: &VolumeGeometry) -> PathBuf {
	let stem = volume
		.slices
		.first()
		.and_then(|s| s.file.file_stem())
		.and_then(|s| s.to_str())
		.unwrap_or("mesh");
	output_dir.join(format!("{}.stl", stem))
}

fn print_series(manifest: &Path) -> Result<()> {
	let series = list_series(manifest).with_context(|| format!("Failed to read manifest: {}", manifest.display()))?;
	if series.is_empty() {
		println!("No series in {}", manifest.display());
	}
	for info in series {
		println!(
			"{}  study={}  series={}  ({} slices)",
			info.patient, info.study, info.series, info.slices
		);
	}
	Ok(())
}

fn ask(question: &str) -> Result<bool> {
	print!("{} [y/n] ", question);
	std::io::stdout().flush()?;

	let mut answer = String::new();
	std::io::stdin()
		.read_line(&mut answer)
		.context("Failed to read answer")?;
	Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Cancel on a line containing `q` or ESC. The thread is left detached;
/// it ends with the process.
fn spawn_cancel_watcher(cancel: CancelToken) {
	let spawned = std::thread::Builder::new()
		.name("cancel-watcher".into())
		.spawn(move || {
			for line in std::io::stdin().lock().lines() {
				let Ok(line) = line else {
					break;
				};
				let line = line.trim();
				if line == "q" || line.contains('\u{1b}') {
					log::warn!("Cancellation requested");
					cancel.cancel();
					break;
				}
			}
		});
	if let Err(err) = spawned {
		log::warn!("Interactive cancellation unavailable: {}", err);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use slice_mesh::{SliceDescriptor, Vec3};

	#[test]
	fn test_output_named_after_first_slice() {
		let volume = VolumeGeometry {
			dx: 2,
			dy: 2,
			spacing: Vec3::ONE,
			slices: vec![
				SliceDescriptor::new("scan/IM_0001.png", Vec3::ZERO),
				SliceDescriptor::new("scan/IM_0002.png", Vec3::Z),
			],
		};

		assert_eq!(output_path(Path::new("out"), &volume), Path::new("out/IM_0001.stl"));
	}

	#[test]
	fn test_output_name_without_slices() {
		let volume = VolumeGeometry {
			dx: 2,
			dy: 2,
			spacing: Vec3::ONE,
			slices: Vec::new(),
		};

		assert_eq!(output_path(Path::new("out"), &volume), Path::new("out/mesh.stl"));
	}

	#[test]
	fn test_args_parse() {
		let args = Args::try_parse_from(["slices_to_stl", "in", "out", "-i", "-200", "-b", "-vv"]).unwrap();

		assert_eq!(args.isolevel, Some(-200));
		assert!(args.binary);
		assert_eq!(args.verbose, 2);
		assert_eq!(args.output_dir.as_deref(), Some(Path::new("out")));
	}

	#[test]
	fn test_output_dir_optional_when_listing() {
		assert!(Args::try_parse_from(["slices_to_stl", "index.toml", "--list-series"]).is_ok());
		assert!(Args::try_parse_from(["slices_to_stl", "dir"]).is_err());
	}

	#[test]
	fn test_empty_input_exit_code() {
		let err = anyhow::Error::new(SourceError::NoSlices(PathBuf::from("empty"))).context("resolving");
		assert!(is_empty_input(&err));
		assert!(!is_empty_input(&anyhow::anyhow!("other")));
	}
}
