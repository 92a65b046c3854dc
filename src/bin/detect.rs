//! detect - run object detection on one image
//!
//! Loads the first available model from the configured candidates, runs it on
//! the given image, prints per-class statistics and optionally saves the
//! annotated result and a display-sized preview.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use object_detector::imaging;
use object_detector::report;
use object_detector::ui::{Ui, UiMode};
use object_detector::{
    CandidateLoader, ClassSummary, Detection, DetectionSession, DetectionStats, DetectorConfig,
    ModelLoadError,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image to run detection on (jpg, jpeg, png, bmp, gif).
    image: Option<PathBuf>,
    /// Confidence threshold; snapped onto the configured range and step.
    #[arg(short, long)]
    confidence: Option<f32>,
    /// Config file (.toml or .json). Defaults to $DETECTOR_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model candidate, highest priority first. Repeat to give several.
    #[arg(short, long = "model")]
    models: Vec<String>,
    /// Save the full-resolution annotated image here.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Save the display-sized preview here.
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Print statistics as JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Print the classes the loaded model can detect.
    #[arg(long)]
    list_classes: bool,
    /// Progress display.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    model: &'a str,
    image: &'a Path,
    confidence: f32,
    stats: &'a DetectionStats,
    summaries: Vec<ClassSummary>,
    detections: &'a [Detection],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => DetectorConfig::from_path(path)?,
        None => DetectorConfig::load()?,
    };
    if !args.models.is_empty() {
        config.model.candidates = args.models.clone();
    }
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());

    let mut loader = CandidateLoader::new(&config.model);
    let mut session = DetectionSession::new(config);

    let loaded = ui.run("load model", || session.initialize(&mut loader));
    eprintln!("{}", session.status());
    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            if let Some(load_err) = e.downcast_ref::<ModelLoadError>() {
                for attempt in &load_err.attempts {
                    eprintln!("  {}: {}", attempt.candidate, attempt.error);
                }
                eprintln!("\nTo fix:\n{}", load_err.remediation());
            }
            return Err(e);
        }
    };

    let Some(image_path) = args.image.as_deref() else {
        if !args.list_classes {
            eprintln!("{}\n", report::NO_IMAGE_MESSAGE);
        }
        print!("{}", session.class_list());
        return Ok(());
    };
    if args.list_classes {
        print!("{}", session.class_list());
    }
    if !imaging::is_supported_image(image_path) {
        log::warn!(
            "{} does not have a recognised image extension ({})",
            image_path.display(),
            imaging::IMAGE_EXTENSIONS.join(", ")
        );
    }

    let confidence = args
        .confidence
        .unwrap_or(session.config().confidence.default);
    let outcome = ui.run("detect objects", || session.process_image(image_path, confidence));
    if outcome.is_err() {
        eprintln!("{}", session.status());
    }
    let outcome = outcome?;

    if args.json {
        let json = JsonReport {
            model: &loaded.candidate,
            image: image_path,
            confidence: outcome.confidence,
            stats: &outcome.stats,
            summaries: outcome.stats.summaries(),
            detections: &outcome.detections,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", outcome.report);
    }
    eprintln!("{}", session.status());

    if let Some(out) = args.out.as_deref() {
        session.save_result(out)?;
        eprintln!("{}", session.status());
    }
    if let Some(preview) = args.preview.as_deref() {
        let written = imaging::save_image(&outcome.display, preview)?;
        eprintln!(
            "preview ({}x{}) saved to {}",
            outcome.display.width(),
            outcome.display.height(),
            written.display()
        );
    }
    Ok(())
}
