//! `pano normalize`: one image through the full pipeline.

use std::path::PathBuf;

use clap::Args;
use pano_pipeline::diagnostics::NormalizeDiagnostics;
use pano_pipeline::{NormalizedMeta, SceneViewConfig};
use pano_tour::{Scene, SceneSpec};
use serde::Serialize;

use super::{CliError, StdClock, extension_for, read_input, sibling_path, write_output};
use crate::args::ConfigArgs;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Path to the input image (PNG, JPEG, BMP, WebP, GIF).
    pub image_path: PathBuf,

    /// Where to write the normalized image. Defaults to
    /// `<stem>-pano.<ext>` next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of diagnostic runs for averaging. Diagnostics are always
    /// measured inline.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub runs: usize,

    /// Print a JSON report instead of the human-readable one.
    #[arg(long)]
    pub json: bool,

    /// Print the viewer scene descriptor for the output as JSON.
    #[arg(long)]
    pub scene: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    strategy: String,
    output: String,
    normalized: &'a NormalizedMeta,
    view: SceneViewConfig,
    diagnostics: &'a [NormalizeDiagnostics],
}

pub fn run(args: &NormalizeArgs) -> Result<(), CliError> {
    let config = args.config.to_config()?;
    let bytes = read_input(&args.image_path)?;

    eprintln!(
        "Image: {} ({} bytes)",
        args.image_path.display(),
        bytes.len()
    );
    eprintln!("Config: {config:#?}");

    let normalizer = args.config.strategy().build(&config)?;
    let strategy = normalizer.kind();
    let normalized = normalizer.normalize(bytes.clone(), &config)?;
    drop(normalizer);

    let mut all_diagnostics = Vec::with_capacity(args.runs);
    for run in 0..args.runs {
        if args.runs > 1 && !args.json {
            eprintln!("--- Run {}/{} ---", run + 1, args.runs);
        }
        let (_, diagnostics) =
            pano_pipeline::normalize_with_diagnostics(&bytes, &config, &StdClock)?;
        if !args.json {
            println!("{}", diagnostics.report());
        }
        all_diagnostics.push(diagnostics);
    }

    let output = args.output.clone().unwrap_or_else(|| {
        sibling_path(
            &args.image_path,
            "pano",
            extension_for(&normalized.image.media_type),
        )
    });
    write_output(&output, &normalized.image.bytes)?;

    let view = pano_pipeline::view_config(&normalized);
    let scene = args.scene.then(|| {
        let title = args
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene");
        Scene::from_normalized(
            SceneSpec::new(title, title, output.display().to_string()),
            &normalized,
        )
    });
    let (_, meta) = normalized.into_parts();

    if args.json {
        let report = Report {
            strategy: strategy.to_string(),
            output: output.display().to_string(),
            normalized: &meta,
            view,
            diagnostics: &all_diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(strategy, &meta, &view);
        if args.runs > 1 {
            print_multi_run_summary(&all_diagnostics);
        }
    }

    if let Some(scene) = scene {
        println!("{}", serde_json::to_string_pretty(&scene)?);
    }
    Ok(())
}

fn print_summary(strategy: pano_pipeline::StrategyKind, meta: &NormalizedMeta, view: &SceneViewConfig) {
    let analysis = &meta.analysis;
    let geometry = &meta.geometry;
    println!("Strategy:   {strategy}");
    println!(
        "Source:     {}x{} (aspect {:.4}, {})",
        analysis.width,
        analysis.height,
        analysis.aspect_ratio,
        if analysis.is_panorama {
            "panorama"
        } else {
            "non-panorama"
        },
    );
    println!(
        "Canvas:     {}x{}{}",
        geometry.pano_width,
        geometry.pano_height,
        if meta.stretched { "" } else { " (source passed through)" },
    );
    println!(
        "Output:     {}x{} {}",
        meta.width, meta.height, meta.media_type
    );
    println!(
        "View:       haov={:.2} vaov={:.2} hfov={:.2} vOffset={:.2}",
        view.haov, view.vaov, view.hfov, view.v_offset
    );
    if let Some(bounds) = &view.bounds {
        println!(
            "Limits:     yaw [{:.2}, {:.2}]  pitch [{:.2}, {:.2}]  hfov [{:.2}, {:.2}]",
            bounds.min_yaw,
            bounds.max_yaw,
            bounds.min_pitch,
            bounds.max_pitch,
            bounds.min_hfov,
            bounds.max_hfov
        );
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&NormalizeDiagnostics) -> Option<std::time::Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[NormalizeDiagnostics]) {
    if all_diagnostics.is_empty() {
        return;
    }

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();
    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| Some(d.decode.duration)),
        ("Analyze", |d| Some(d.analyze.duration)),
        ("Stretch", |d| d.stretch.as_ref().map(|s| s.duration)),
        ("Encode", |d| d.encode.as_ref().map(|s| s.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();
        if stage_durations.is_empty() {
            continue;
        }
        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
