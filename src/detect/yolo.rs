//! YOLOv8 pre- and post-processing shared by inference backends.
//!
//! Kept free of any runtime types so it can be exercised with plain slices.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::result::{BoundingBox, Detection};

const PAD_VALUE: u8 = 114;

/// A square model input and the transform that produced it.
#[derive(Clone, Debug)]
pub struct Letterbox {
    /// CHW, normalized to 0..1.
    pub data: Vec<f32>,
    pub size: u32,
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    /// Map a box from model input space back to source pixels.
    pub fn unmap(&self, bbox: BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: (bbox.x1 - self.pad_x) / self.scale,
            y1: (bbox.y1 - self.pad_y) / self.scale,
            x2: (bbox.x2 - self.pad_x) / self.scale,
            y2: (bbox.y2 - self.pad_y) / self.scale,
        }
        .clamped(self.source_width, self.source_height)
    }
}

/// Resize `image` into a `size` x `size` canvas keeping aspect ratio, padding
/// the remainder with gray.
pub fn letterbox(image: &RgbImage, size: u32) -> Result<Letterbox> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("cannot letterbox an empty {}x{} image", width, height));
    }
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    let plane = (size * size) as usize;
    let mut data = vec![0f32; plane * 3];
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let idx = (y * size + x) as usize;
        for channel in 0..3 {
            data[channel * plane + idx] = pixel[channel] as f32 / 255.0;
        }
    }

    Ok(Letterbox {
        data,
        size,
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        source_width: width,
        source_height: height,
    })
}

/// Decode a YOLOv8 detection head.
///
/// Accepts `[1, 4 + classes, boxes]` (the ultralytics export layout) and its
/// transpose `[1, boxes, 4 + classes]`. Rows are `cx, cy, w, h` followed by
/// per-class scores. Boxes below `confidence` are dropped before NMS.
///
/// With `num_classes` known the layout is picked by the axis holding
/// `4 + num_classes` attributes; otherwise the shorter axis is taken as the
/// attribute axis.
pub fn decode_output(
    data: &[f32],
    shape: &[usize],
    num_classes: Option<usize>,
    letterbox: &Letterbox,
    confidence: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>> {
    let (rows, cols) = match shape {
        [1, a, b] | [a, b] => (*a, *b),
        _ => return Err(anyhow!("expected a [1, C, N] output tensor, got {:?}", shape)),
    };
    if data.len() != rows * cols {
        return Err(anyhow!(
            "output tensor has {} values, shape {:?} needs {}",
            data.len(),
            shape,
            rows * cols
        ));
    }
    let transposed = match num_classes.map(|n| n + 4) {
        Some(attrs) if rows == attrs => false,
        Some(attrs) if cols == attrs => true,
        _ => rows > cols,
    };
    let (attrs, boxes) = if transposed { (cols, rows) } else { (rows, cols) };
    if attrs <= 4 {
        return Err(anyhow!("output has {} attributes, need at least 5", attrs));
    }
    let at = |attr: usize, idx: usize| -> f32 {
        if transposed {
            data[idx * attrs + attr]
        } else {
            data[attr * boxes + idx]
        }
    };

    let mut detections = Vec::new();
    for idx in 0..boxes {
        let (class_id, score) = (4..attrs)
            .map(|attr| (attr - 4, at(attr, idx)))
            .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
        if !score.is_finite() || score < confidence {
            continue;
        }
        let bbox = BoundingBox::from_center(at(0, idx), at(1, idx), at(2, idx), at(3, idx));
        detections.push(Detection::new(class_id, score, letterbox.unmap(bbox)));
    }

    let mut kept = nms(detections, iou_threshold);
    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(kept)
}

/// Per-class non-maximum suppression.
pub fn nms(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut by_class: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    for detection in detections {
        by_class
            .entry(detection.class_id)
            .or_default()
            .push(detection);
    }

    let mut kept = Vec::new();
    for (_, mut group) in by_class {
        group.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut suppressed = vec![false; group.len()];
        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            for j in (i + 1)..group.len() {
                if !suppressed[j] && group[i].bbox.iou(&group[j].bbox) > iou_threshold {
                    suppressed[j] = true;
                }
            }
            kept.push(group[i].clone());
        }
    }
    kept
}
