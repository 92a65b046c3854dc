#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{ClassNames, Detection};
use crate::detect::yolo;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// The model is loaded from a local file with a fixed `1x3xNxN` input.
/// Inference runs on the calling thread.
pub struct TractBackend {
    name: String,
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    iou_threshold: f32,
    class_names: ClassNames,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            name: model_path.display().to_string(),
            model,
            input_size,
            iou_threshold: 0.45,
            class_names: ClassNames::coco(),
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    fn run(&self, data: Vec<f32>) -> Result<(Vec<usize>, Vec<f32>)> {
        let size = self.input_size as usize;
        let input: Tensor = tract_ndarray::Array4::from_shape_vec((1, 3, size, size), data)
            .context("input tensor shape mismatch")?
            .into_tensor();
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok((view.shape().to_vec(), view.iter().copied().collect()))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn detect(&mut self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>> {
        let mut letterbox = yolo::letterbox(image, self.input_size)?;
        let (shape, data) = self.run(std::mem::take(&mut letterbox.data))?;
        let detections = yolo::decode_output(
            &data,
            &shape,
            Some(self.class_names.len()),
            &letterbox,
            confidence,
            self.iou_threshold,
        )?;
        log::debug!(
            "{}: {} detections at confidence {:.2}",
            self.name,
            detections.len(),
            confidence
        );
        Ok(detections)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size as usize;
        self.run(vec![0.0; 3 * size * size])
            .map(|_| ())
            .context("warm-up inference failed")
    }
}
