//! blobline-bench: CLI tool for detector parameter experimentation and
//! diagnostics.
//!
//! Loads an image, treats its normalized grayscale intensities as a
//! per-pixel foreground probability map, thresholds it into a binary
//! mask, runs the detection pipeline, and prints per-stage counts and
//! timings. Useful for:
//!
//! - Tuning the threshold, resampling interval, and simplification
//!   tolerance on representative data
//! - Measuring per-stage durations to identify bottlenecks
//! - Dumping detected regions as JSON for downstream tooling
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin blobline-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use blobline_pipeline::diagnostics::StageMetrics;
use blobline_pipeline::{
    BinaryMask, Detection, DetectorConfig, Point, Polyline, ProbabilityMap, Region,
};
use clap::Parser;
use serde::Serialize;

/// Detector parameter experimentation and diagnostics for blobline.
///
/// Runs the detection pipeline on a thresholded image with configurable
/// parameters and prints detailed per-stage timing and count
/// diagnostics.
#[derive(Parser)]
#[command(name = "blobline-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP). Grayscale
    /// intensities are normalized to [0, 1] and used as probabilities.
    image_path: PathBuf,

    /// Probability threshold for binarization (strictly greater-than).
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,

    /// Resampling interval in pixels (non-positive skips resampling).
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_RESAMPLE_INTERVAL)]
    resample_interval: f64,

    /// Simplification tolerance in pixels.
    #[arg(long, default_value_t = DetectorConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Physical size of one pixel along x.
    #[arg(long, default_value_t = 1.0)]
    calibration_x: f64,

    /// Physical size of one pixel along y.
    #[arg(long, default_value_t = 1.0)]
    calibration_y: f64,

    /// Crop origin along x, in pixels.
    #[arg(long, default_value_t = 0)]
    origin_x: i64,

    /// Crop origin along y, in pixels.
    #[arg(long, default_value_t = 0)]
    origin_y: i64,

    /// Frame index to tag detected regions with.
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Write detected regions as JSON to this file (first run only).
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Full detector config as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored. The
    /// JSON must be a valid `DetectorConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`DetectorConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<DetectorConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }
    Ok(DetectorConfig {
        resample_interval: cli.resample_interval,
        epsilon: cli.epsilon,
        calibration: [cli.calibration_x, cli.calibration_y],
        origin: [cli.origin_x, cli.origin_y],
    })
}

/// Timing and metrics for one pipeline stage.
#[derive(Serialize)]
struct StageReport {
    name: &'static str,
    seconds: f64,
    metrics: StageMetrics,
}

/// Full diagnostics for one detection run.
#[derive(Serialize)]
struct BenchReport {
    width: u32,
    height: u32,
    foreground_pixels: usize,
    threshold: f32,
    stages: Vec<StageReport>,
    total_seconds: f64,
    region_count: usize,
}

impl BenchReport {
    fn print_human(&self) {
        println!(
            "mask       {}x{}, {} foreground pixels (threshold {})",
            self.width, self.height, self.foreground_pixels, self.threshold,
        );
        for stage in &self.stages {
            println!(
                "{:<10} {:>9.3} ms   {}",
                stage.name,
                stage.seconds * 1e3,
                describe(&stage.metrics),
            );
        }
        println!("total      {:>9.3} ms", self.total_seconds * 1e3);
    }
}

/// One-line human-readable summary of a stage's metrics.
fn describe(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Trace {
            polygon_count,
            vertex_count,
            min_vertices,
            max_vertices,
            mean_vertices,
        } => format!(
            "{polygon_count} contours, {vertex_count} vertices (min {min_vertices}, max {max_vertices}, mean {mean_vertices:.1})",
        ),
        StageMetrics::Simplify {
            points_before,
            points_after,
            reduction_ratio,
            ..
        } => format!(
            "{points_before} -> {points_after} points ({:.1}% reduction)",
            reduction_ratio * 100.0,
        ),
        StageMetrics::Calibrate {
            region_count,
            frame,
        } => format!("{region_count} regions (frame {frame})"),
    }
}

/// Maximum probability over the pixels inside a pixel-space contour.
///
/// The usual quality oracle for probability-map detections: the contour
/// interior is scanned over its bounding box with an even-odd (ray
/// crossing) test. Degenerate contours with fewer than 3 vertices fall
/// back to sampling the probability at their vertices.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_probability_within(proba: &ProbabilityMap, contour: &Polyline) -> f64 {
    let points = contour.points();
    if points.len() < 3 {
        return points
            .iter()
            .filter_map(|p| {
                let x = p.x.floor();
                let y = p.y.floor();
                (x >= 0.0 && y >= 0.0 && (x as u32) < proba.width() && (y as u32) < proba.height())
                    .then(|| f64::from(proba.get_pixel(x as u32, y as u32).0[0]))
            })
            .fold(0.0, f64::max);
    }

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
    let max_x = (points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max).ceil() as u32)
        .min(proba.width().saturating_sub(1));
    let max_y = (points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil() as u32)
        .min(proba.height().saturating_sub(1));

    let mut max = 0.0_f64;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            // Test the pixel center.
            let cx = f64::from(x) + 0.5;
            let cy = f64::from(y) + 0.5;
            if contains(points, cx, cy) {
                max = max.max(f64::from(proba.get_pixel(x, y).0[0]));
            }
        }
    }
    max
}

/// Even-odd point-in-polygon test against a closed contour.
fn contains(points: &[Point], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (a.y > y) != (b.y > y) {
            let t = (y - a.y) / (b.y - a.y);
            if x < t.mul_add(b.x - a.x, a.x) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Run the pipeline once with per-stage timing.
fn run_once(
    mask: &BinaryMask,
    proba: &ProbabilityMap,
    config: &DetectorConfig,
    frame: usize,
    threshold: f32,
) -> Result<(BenchReport, Vec<Region>), blobline_pipeline::DetectError> {
    let total_start = Instant::now();

    let start = Instant::now();
    let traced = Detection::new(mask.clone(), config.clone()).trace()?;
    let trace_time = start.elapsed();
    let trace_metrics = traced.metrics();

    let start = Instant::now();
    let simplified = traced.simplify();
    let simplify_time = start.elapsed();
    let simplify_metrics = simplified.metrics();

    let start = Instant::now();
    let calibrated = simplified.calibrate(frame, |contour| max_probability_within(proba, contour));
    let calibrate_time = start.elapsed();
    let calibrate_metrics = calibrated.metrics();

    let total = total_start.elapsed();
    let staged = calibrated.into_result();

    let report = BenchReport {
        width: mask.width(),
        height: mask.height(),
        foreground_pixels: mask.count_foreground(),
        threshold,
        stages: vec![
            StageReport {
                name: "trace",
                seconds: trace_time.as_secs_f64(),
                metrics: trace_metrics,
            },
            StageReport {
                name: "simplify",
                seconds: simplify_time.as_secs_f64(),
                metrics: simplify_metrics,
            },
            StageReport {
                name: "calibrate",
                seconds: calibrate_time.as_secs_f64(),
                metrics: calibrate_metrics,
            },
        ],
        total_seconds: total.as_secs_f64(),
        region_count: staged.regions.len(),
    };
    Ok((report, staged.regions))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match image::open(&cli.image_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let proba: ProbabilityMap = image.to_luma32f();
    let mask = BinaryMask::from_threshold(&proba, cli.threshold);

    eprintln!(
        "Image: {} ({}x{})",
        cli.image_path.display(),
        proba.width(),
        proba.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut totals: Vec<Duration> = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match run_once(&mask, &proba, &config, cli.frame, cli.threshold) {
            Ok((report, regions)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing report: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    report.print_human();
                }
                totals.push(Duration::from_secs_f64(report.total_seconds));

                // Write regions on the first run only.
                if run == 0
                    && let Some(ref regions_path) = cli.regions
                {
                    match serde_json::to_string_pretty(&regions) {
                        Ok(json) => match std::fs::write(regions_path, &json) {
                            Ok(()) => eprintln!(
                                "Regions written to {} ({} bytes)",
                                regions_path.display(),
                                json.len(),
                            ),
                            Err(e) => {
                                eprintln!(
                                    "Error writing regions to {}: {e}",
                                    regions_path.display(),
                                );
                            }
                        },
                        Err(e) => {
                            eprintln!("Error serializing regions: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("Detection error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        let sum: Duration = totals.iter().sum();
        let min = totals.iter().min().copied().unwrap_or_default();
        let max = totals.iter().max().copied().unwrap_or_default();
        #[allow(clippy::cast_possible_truncation)]
        let mean = sum / totals.len() as u32;
        eprintln!(
            "Summary over {} runs: mean {:.3} ms, min {:.3} ms, max {:.3} ms",
            totals.len(),
            mean.as_secs_f64() * 1e3,
            min.as_secs_f64() * 1e3,
            max.as_secs_f64() * 1e3,
        );
    }

    ExitCode::SUCCESS
}
