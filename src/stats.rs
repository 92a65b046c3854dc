//! Statistics aggregation over raw detections.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detect::{ClassNames, Detection};

/// Detections grouped by class name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionStats {
    /// Total number of boxes.
    pub count: usize,
    /// Confidences per class name, in detection order.
    pub objects: BTreeMap<String, Vec<f32>>,
    /// Number of distinct class names.
    pub unique_types: usize,
}

/// Derived figures for one class.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub count: usize,
    pub average: f32,
    pub maximum: f32,
}

/// Group `detections` by class name.
pub fn analyze(detections: &[Detection], class_names: &ClassNames) -> DetectionStats {
    let mut objects: BTreeMap<String, Vec<f32>> = BTreeMap::new();
    for detection in detections {
        objects
            .entry(class_names.name_for(detection.class_id))
            .or_default()
            .push(detection.confidence);
    }
    DetectionStats {
        count: detections.len(),
        unique_types: objects.len(),
        objects,
    }
}

impl DetectionStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Per-class count, mean and max, ordered by class name.
    pub fn summaries(&self) -> Vec<ClassSummary> {
        self.objects
            .iter()
            .filter_map(|(name, confidences)| summarize(name, confidences))
            .collect()
    }
}

fn summarize(name: &str, confidences: &[f32]) -> Option<ClassSummary> {
    if confidences.is_empty() {
        return None;
    }
    let sum: f32 = confidences.iter().sum();
    let maximum = confidences
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    Some(ClassSummary {
        name: name.to_string(),
        count: confidences.len(),
        average: sum / confidences.len() as f32,
        maximum,
    })
}
