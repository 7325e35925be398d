//! Classify lines by the raster they cross.
//!
//! Reads GeoJSON (multi)linestrings and a single-band integer GeoTIFF in the same
//! CRS, resamples each line every `--step-length` units, classifies every sample
//! through the class table, smooths short class runs away and writes one GeoJSON
//! LineString per contiguous class run.
//!
//! With `--get-classes` only a frequency table of the raw raster values seen
//! along the lines is printed.
mod config;
mod geojson;
mod geotiff;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use linefilter_core::{
    classify_all, survey_all, ClassCounts, ClassTable, ClassifyError, ClassifyParams, Polyline,
    SmoothingStrategy,
};

use geojson::{LineRecord, OutFeature};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rasterlinefilter", about = "Classify lines by rasters")]
struct Args {
    /// How much line to skip before adding a node, if needed
    #[arg(long, default_value = "10.0")]
    step_length: f64,

    /// Stretch final step this much to get to next vertex
    #[arg(long, default_value = "1.0")]
    stretch: f64,

    /// How many step-length steps in a class are needed to switch to that class,
    /// setting for all classes
    #[arg(long, default_value = "1")]
    min_steps: usize,

    /// Per-class step threshold, one per --class in the same order
    #[arg(long)]
    class_steps: Vec<usize>,

    /// Name of an output classification class (repeatable)
    #[arg(long = "class", value_name = "NAME")]
    classes: Vec<String>,

    /// Raster values for the matching --class, space or comma separated.
    /// `NoData` for no data, `*` for all remaining values
    #[arg(long, allow_hyphen_values = true)]
    values: Vec<String>,

    /// JSON class table, used instead of --class / --values / --class-steps
    #[arg(long = "classes", value_name = "FILE", conflicts_with_all = ["classes", "values", "class_steps"])]
    class_file: Option<PathBuf>,

    /// Field names, space or comma separated, to copy from `lines` to output
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    fields: Vec<String>,

    /// Raster band (sample index within a pixel) to use
    #[arg(long, default_value = "0")]
    band: usize,

    /// Smoothing policy for short class runs
    #[arg(long, value_enum, default_value_t = Strategy::SeedPropagate)]
    strategy: Strategy,

    /// What to do when a line cannot be classified
    #[arg(long, value_enum, default_value_t = OnError::Halt)]
    on_error: OnError,

    /// Output attribute holding the class name
    #[arg(long, default_value = "lineclass")]
    label_field: String,

    /// Just display a frequency table of raster values seen
    #[arg(long)]
    get_classes: bool,

    /// GeoJSON FeatureCollection containing lines
    lines: PathBuf,

    /// GeoTIFF grid used for classification
    grid: PathBuf,

    /// Output GeoJSON path (unused with --get-classes)
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    SeedPropagate,
    ForwardRun,
}

impl From<Strategy> for SmoothingStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::SeedPropagate => SmoothingStrategy::SeedPropagate,
            Strategy::ForwardRun => SmoothingStrategy::ForwardRun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnError {
    /// Stop the run at the first failing line, writing nothing
    Halt,
    /// Log the failing line and continue
    Skip,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Apply the error policy to one line's failure.
fn handle_failure(policy: OnError, record: &LineRecord, err: &ClassifyError) -> Result<()> {
    match policy {
        OnError::Halt => bail!("feature {}: {}", record.feature, err),
        OnError::Skip => {
            log::warn!("feature {}: {} (skipped)", record.feature, err);
            Ok(())
        }
    }
}

fn build_table(args: &Args) -> Result<ClassTable> {
    let table = match &args.class_file {
        Some(path) => config::table_from_file(path, args.min_steps)?,
        None => config::table_from_args(&args.classes, &args.values, &args.class_steps, args.min_steps)?,
    };
    for line in config::describe(&table) {
        println!("{line}");
    }
    Ok(table)
}

fn print_counts(counts: &ClassCounts) {
    for (raw, n) in counts.iter() {
        println!("{raw} {n}");
    }
}

// ── Modes ────────────────────────────────────────────────────────────────────

fn run_survey(args: &Args, records: &[LineRecord], lines: &[Polyline], params: &ClassifyParams) -> Result<()> {
    let grid = geotiff::read_grid(&args.grid, args.band)?;
    let mut total = ClassCounts::new();
    for (record, result) in records.iter().zip(survey_all(lines, &grid, params)) {
        match result {
            Ok(counts) => total.merge(&counts),
            Err(e) => handle_failure(args.on_error, record, &e)?,
        }
    }
    print_counts(&total);
    Ok(())
}

fn run_classify(args: &Args, records: &[LineRecord], lines: &[Polyline], params: &ClassifyParams) -> Result<()> {
    let Some(output) = &args.output else {
        bail!("An output path is required unless --get-classes is given");
    };
    let table = build_table(args)?;
    let grid = geotiff::read_grid(&args.grid, args.band)?;

    let results = classify_all(lines, &grid, &table, params);
    let mut features = Vec::new();
    let mut failed = 0usize;
    for (record, result) in records.iter().zip(&results) {
        match result {
            Ok(c) => {
                for seg in &c.segments {
                    features.push(OutFeature::segment(
                        &seg.points,
                        &record.attrs,
                        &args.label_field,
                        table.name(seg.class),
                    ));
                }
            }
            Err(e) => {
                handle_failure(args.on_error, record, e)?;
                failed += 1;
            }
        }
    }

    geojson::write_segments(output, &features)?;
    log::info!(
        "{} lines -> {} segments written to {} ({} skipped)",
        lines.len(),
        features.len(),
        output.display(),
        failed
    );
    log::debug!("raw value counts: {:?}", linefilter_core::total_counts(&results));
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = ClassifyParams {
        step_length: args.step_length,
        stretch: args.stretch,
        strategy: args.strategy.into(),
    };
    params.validate()?;

    let records = geojson::read_lines(&args.lines, &args.fields)?;
    let lines: Vec<Polyline> = records.iter().map(|r| r.line.clone()).collect();
    log::info!("{} lines read from {}", lines.len(), args.lines.display());

    if args.get_classes {
        run_survey(&args, &records, &lines, &params)
    } else {
        run_classify(&args, &records, &lines, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_accepts_repeated_class_options() {
        let args = Args::try_parse_from([
            "rasterlinefilter",
            "--class", "water", "--values", "1, 2",
            "--class", "other", "--values", "*",
            "--class-steps", "3", "--class-steps", "1",
            "--fields", "name,id",
            "--strategy", "forward-run",
            "--on-error", "skip",
            "lines.geojson", "grid.tif", "out.geojson",
        ])
        .unwrap();
        assert_eq!(args.classes, vec!["water", "other"]);
        assert_eq!(args.values, vec!["1, 2", "*"]);
        assert_eq!(args.class_steps, vec![3, 1]);
        assert_eq!(args.fields, vec!["name", "id"]);
        assert_eq!(args.strategy, Strategy::ForwardRun);
        assert_eq!(args.on_error, OnError::Skip);
        assert_eq!(args.output, Some(PathBuf::from("out.geojson")));
        assert_eq!(args.step_length, 10.0);
    }

    #[test]
    fn class_file_conflicts_with_inline_classes() {
        let res = Args::try_parse_from([
            "rasterlinefilter", "--classes", "t.json", "--class", "a",
            "l.geojson", "g.tif", "o.geojson",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn skip_policy_continues_and_halt_stops() {
        let record = LineRecord {
            feature: 4,
            attrs: Default::default(),
            line: Polyline::default(),
        };
        let err = ClassifyError::UnknownClass(9);
        assert!(handle_failure(OnError::Skip, &record, &err).is_ok());
        let halted = handle_failure(OnError::Halt, &record, &err).unwrap_err();
        assert!(halted.to_string().contains("feature 4"));
    }
}
