use std::fmt;

use anyhow::{anyhow, Result};
use image::RgbImage;

use super::backend::{DetectorBackend, ModelLoader};
use super::result::{ClassNames, Detection};

/// Remediation shown when no candidate could be loaded.
pub const REMEDIATION: &str = "\
1. check your internet connection if the weights are fetched on demand
2. download the weights manually from https://github.com/ultralytics/assets/releases
   and export them to ONNX
3. place yolov8n.onnx in the same folder as the program";

/// Detection was requested before any model was loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelNotReady;

impl fmt::Display for ModelNotReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MODEL_NOT_READY: no detection model is loaded")
    }
}
impl std::error::Error for ModelNotReady {}

/// One failed candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadAttempt {
    pub candidate: String,
    pub error: String,
}

/// Every candidate failed to load.
#[derive(Clone, Debug)]
pub struct ModelLoadError {
    pub attempts: Vec<LoadAttempt>,
}

impl ModelLoadError {
    pub fn last_error(&self) -> Option<&str> {
        self.attempts.last().map(|attempt| attempt.error.as_str())
    }

    pub fn remediation(&self) -> &'static str {
        REMEDIATION
    }
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_error() {
            Some(last) => write!(
                f,
                "failed to load a model ({} candidates tried, last error: {})",
                self.attempts.len(),
                last
            ),
            None => write!(f, "failed to load a model (no candidates configured)"),
        }
    }
}
impl std::error::Error for ModelLoadError {}

/// Result of a successful acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Candidate that became the active model.
    pub candidate: String,
    /// Candidates that failed before it, in order.
    pub failed: Vec<LoadAttempt>,
}

/// Holds the single active model.
///
/// The model is set by `load_model` and read by `detect`; there is no other
/// mutable state.
#[derive(Default)]
pub struct ModelManager {
    model: Option<Box<dyn DetectorBackend>>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self { model: None }
    }

    /// Try `candidates` in order and keep the first one that loads.
    ///
    /// Later candidates are not attempted after a success. When every
    /// candidate fails, any previously loaded model stays active and the
    /// returned error is a `ModelLoadError`.
    pub fn load_model<S: AsRef<str>>(
        &mut self,
        candidates: &[S],
        loader: &mut dyn ModelLoader,
    ) -> Result<LoadReport> {
        let mut failed = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            log::info!("attempting to load model: {}", candidate);
            let loaded = loader
                .load(candidate)
                .and_then(|mut backend| backend.warm_up().map(|_| backend));
            match loaded {
                Ok(backend) => {
                    log::info!(
                        "loaded {} ({} classes)",
                        candidate,
                        backend.class_names().len()
                    );
                    self.model = Some(backend);
                    return Ok(LoadReport {
                        candidate: candidate.to_string(),
                        failed,
                    });
                }
                Err(e) => {
                    log::error!("failed to load {}: {:#}", candidate, e);
                    failed.push(LoadAttempt {
                        candidate: candidate.to_string(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }
        Err(ModelLoadError { attempts: failed }.into())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Name of the active model, if any.
    pub fn active_model(&self) -> Option<&str> {
        self.model.as_deref().map(|model| model.name())
    }

    /// Class names of the active model; empty when nothing is loaded.
    pub fn class_names(&self) -> ClassNames {
        self.model
            .as_deref()
            .map(|model| model.class_names().clone())
            .unwrap_or_default()
    }

    /// Run the active model with `confidence` as the cutoff.
    ///
    /// Fails with `ModelNotReady` when no model is loaded.
    pub fn detect(&mut self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>> {
        let model = self.model.as_deref_mut().ok_or(ModelNotReady)?;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(anyhow!(
                "confidence threshold must be in (0, 1), got {}",
                confidence
            ));
        }
        model.detect(image, confidence)
    }
}
