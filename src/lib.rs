//! Object Detector
//!
//! Single-image object detection on top of a pretrained YOLOv8 model.
//!
//! # Workflow
//!
//! 1. **Model acquisition**: candidate weight files are tried in priority
//!    order; the first that loads becomes the active model.
//! 2. **Detection**: the active model runs on one decoded image with a
//!    confidence threshold. Running without a model fails with
//!    [`ModelNotReady`].
//! 3. **Statistics**: boxes are grouped by class name into counts and
//!    per-class confidence lists.
//! 4. **Display**: the annotated image is scaled down (never up) to fit the
//!    display bounds.
//!
//! # Module Structure
//!
//! - `config`: file + env configuration
//! - `detect`: backends, model manager, YOLO decoding
//! - `stats` / `report`: aggregation and text rendering
//! - `imaging`: image I/O, annotation, display scaling
//! - `session`: the workflow a front end drives
//! - `ui`: terminal stage spinners

pub mod config;
pub mod detect;
pub mod imaging;
pub mod report;
pub mod session;
pub mod stats;
pub mod ui;

pub use config::{ConfidenceSettings, DetectorConfig, DisplaySettings, ModelSettings};
pub use detect::{
    BoundingBox, CandidateLoader, ClassNames, Detection, DetectorBackend, LoadReport,
    ModelLoadError, ModelLoader, ModelManager, ModelNotReady, StubBackend,
};
pub use session::{DetectionOutcome, DetectionSession, NothingToSave};
pub use stats::{analyze, ClassSummary, DetectionStats};
