//! The load → detect → analyze → format → display workflow a front end drives.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use crate::config::DetectorConfig;
use crate::detect::{Detection, LoadReport, ModelLoader, ModelManager, ModelNotReady};
use crate::imaging;
use crate::report;
use crate::stats::{self, DetectionStats};

/// `save_result` was called before any detection produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NothingToSave;

impl fmt::Display for NothingToSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOTHING_TO_SAVE: no detection result to save")
    }
}
impl std::error::Error for NothingToSave {}

/// Everything a front end shows after one detection run.
#[derive(Clone, Debug)]
pub struct DetectionOutcome {
    pub detections: Vec<Detection>,
    pub stats: DetectionStats,
    /// Text for the info panel.
    pub report: String,
    /// One-line status.
    pub status: String,
    /// Threshold actually applied.
    pub confidence: f32,
    /// Annotated image scaled to the display bounds.
    pub display: RgbImage,
}

pub struct DetectionSession {
    config: DetectorConfig,
    models: ModelManager,
    current_image: Option<PathBuf>,
    result_image: Option<RgbImage>,
    status: String,
}

impl DetectionSession {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            models: ModelManager::new(),
            current_image: None,
            result_image: None,
            status: String::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    /// Status line left by the last action; empty before the first one.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Acquire a model from the configured candidates.
    pub fn initialize(&mut self, loader: &mut dyn ModelLoader) -> Result<LoadReport> {
        let result = self
            .models
            .load_model(&self.config.model.candidates, loader);
        self.status = match &result {
            Ok(loaded) => {
                log::debug!(
                    "{} candidate(s) failed before {}",
                    loaded.failed.len(),
                    loaded.candidate
                );
                report::status_model_loaded(&loaded.candidate)
            }
            Err(_) => report::status_model_failed(),
        };
        result
    }

    /// Class list text for the info panel.
    pub fn class_list(&self) -> String {
        report::format_class_list(&self.models.class_names())
    }

    /// Run detection on the image at `path`.
    ///
    /// Fails with `ModelNotReady` before any image is read when no model is
    /// loaded. The threshold is snapped onto the configured slider range.
    pub fn process_image(&mut self, path: &Path, confidence: f32) -> Result<DetectionOutcome> {
        let result = self.run_detection(path, confidence);
        self.status = match &result {
            Ok(outcome) => outcome.status.clone(),
            Err(_) => report::status_detection_failed(),
        };
        result
    }

    fn run_detection(&mut self, path: &Path, confidence: f32) -> Result<DetectionOutcome> {
        if !self.models.is_loaded() {
            return Err(ModelNotReady.into());
        }
        let confidence = self.config.confidence.snap(confidence)?;
        self.current_image = Some(path.to_path_buf());

        let image = imaging::load_image(path)?;
        log::info!(
            "processing {} ({}x{}) at confidence {:.2}",
            path.display(),
            image.width(),
            image.height(),
            confidence
        );
        let detections = self
            .models
            .detect(&image, confidence)
            .with_context(|| format!("detection failed for {}", path.display()))?;

        let annotated = imaging::annotate(&image, &detections);
        let stats = stats::analyze(&detections, &self.models.class_names());
        let display = imaging::resize_for_display(
            &annotated,
            self.config.display.max_width,
            self.config.display.max_height,
        )
        .into_owned();
        self.result_image = Some(annotated);

        Ok(DetectionOutcome {
            report: report::format_statistics(&stats),
            status: report::status_detected(stats.count, confidence),
            detections,
            stats,
            confidence,
            display,
        })
    }

    pub fn current_image(&self) -> Option<&Path> {
        self.current_image.as_deref()
    }

    /// Full-resolution annotated image from the last run.
    pub fn result_image(&self) -> Option<&RgbImage> {
        self.result_image.as_ref()
    }

    /// Save the last annotated result; returns the path written.
    pub fn save_result(&mut self, path: &Path) -> Result<PathBuf> {
        let image = self.result_image.as_ref().ok_or(NothingToSave)?;
        let written = imaging::save_image(image, path)?;
        self.status = report::status_saved(&written);
        Ok(written)
    }

    /// Drop the current image and result; the model stays loaded.
    /// Returns the class list text to show again.
    pub fn reset(&mut self) -> String {
        self.current_image = None;
        self.result_image = None;
        self.status = report::status_reset();
        self.class_list()
    }
}
