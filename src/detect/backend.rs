use anyhow::Result;
use image::RgbImage;

use super::result::{ClassNames, Detection};

/// Detector backend trait.
///
/// A backend owns one loaded model. `detect` runs synchronously on the
/// caller's thread and must only return boxes whose confidence is at or
/// above `confidence`.
pub trait DetectorBackend: Send {
    /// Identifier of the loaded model (usually the candidate it came from).
    fn name(&self) -> &str;

    /// Class-id to name mapping for this model.
    fn class_names(&self) -> &ClassNames;

    /// Run detection on a decoded RGB image.
    fn detect(&mut self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Turns a candidate weight identifier into a ready backend.
pub trait ModelLoader {
    fn load(&mut self, candidate: &str) -> Result<Box<dyn DetectorBackend>>;
}

impl<F> ModelLoader for F
where
    F: FnMut(&str) -> Result<Box<dyn DetectorBackend>>,
{
    fn load(&mut self, candidate: &str) -> Result<Box<dyn DetectorBackend>> {
        self(candidate)
    }
}
