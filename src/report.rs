//! Human-readable text for the info panel and status line.

use crate::detect::ClassNames;
use crate::stats::DetectionStats;

const RULE_WIDTH: usize = 40;
const CLASSES_PER_ROW: usize = 4;

pub const NO_IMAGE_MESSAGE: &str = "No image selected yet.\n\nChoose an image to start.";

/// Render detection statistics.
///
/// Zero detections produce a "no objects found" block with tips rather than
/// an empty table.
pub fn format_statistics(stats: &DetectionStats) -> String {
    if stats.is_empty() {
        return "No objects found\n\n\
                Tips:\n\
                • lower the confidence threshold\n\
                • try a clearer image\n\
                • check the object is in the supported class list\n"
            .to_string();
    }

    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let mut info = format!(
        "Detected {} objects\n{}\n\nStatistics:\n{}\n",
        stats.count, rule, thin
    );
    for (idx, summary) in stats.summaries().iter().enumerate() {
        info.push_str(&format!(
            "{}. {}\n   count: {}\n   average confidence: {}\n   max confidence: {}\n\n",
            idx + 1,
            summary.name.to_uppercase(),
            summary.count,
            percent(summary.average),
            percent(summary.maximum)
        ));
    }
    info.push_str(&format!(
        "{}\nTotal objects: {}\nDistinct types: {}\n",
        rule, stats.count, stats.unique_types
    ));
    info
}

/// Render the classes a model can detect, four per row.
pub fn format_class_list(class_names: &ClassNames) -> String {
    let names: Vec<&str> = class_names.names().collect();
    let mut info = format!("Available classes ({}):\n\n", names.len());
    for row in names.chunks(CLASSES_PER_ROW) {
        info.push_str(&format!("  •  {}\n", row.join("  •  ")));
    }
    info
}

pub fn status_model_loaded(candidate: &str) -> String {
    format!("✓ loaded {}", candidate)
}

pub fn status_model_failed() -> String {
    "✗ failed to load a model".to_string()
}

pub fn status_detected(count: usize, confidence: f32) -> String {
    format!(
        "✓ detected {} objects in the image (confidence: {:.2})",
        count, confidence
    )
}

pub fn status_detection_failed() -> String {
    "✗ detection failed".to_string()
}

pub fn status_saved(path: &std::path::Path) -> String {
    format!("✓ result saved to {}", path.display())
}

pub fn status_reset() -> String {
    "✓ reset - ready".to_string()
}

fn percent(value: f32) -> String {
    format!("{:.2}%", value * 100.0)
}
