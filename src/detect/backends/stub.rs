use anyhow::Result;
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, ClassNames, Detection};

/// Stub backend for dry runs and tests.
///
/// Returns a fixed set of detections, dropping those below the requested
/// threshold the way a real model's post-processing would.
pub struct StubBackend {
    name: String,
    class_names: ClassNames,
    detections: Vec<Detection>,
}

impl StubBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class_names: ClassNames::coco(),
            detections: Vec::new(),
        }
    }

    pub fn with_detection(mut self, class_id: usize, confidence: f32, bbox: BoundingBox) -> Self {
        self.detections
            .push(Detection::new(class_id, confidence, bbox));
        self
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn detect(&mut self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        Ok(self
            .detections
            .iter()
            .filter(|detection| detection.confidence >= confidence)
            .map(|detection| Detection {
                bbox: detection.bbox.clamped(width, height),
                ..detection.clone()
            })
            .collect())
    }
}
