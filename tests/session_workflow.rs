//! End-to-end session tests with scripted backends.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use object_detector::{
    BoundingBox, CandidateLoader, DetectionSession, DetectorBackend, DetectorConfig,
    ModelLoadError, ModelNotReady, NothingToSave, StubBackend,
};

fn config_with(candidates: &[&str]) -> DetectorConfig {
    let mut cfg = DetectorConfig::default();
    cfg.model.candidates = candidates.iter().map(|c| c.to_string()).collect();
    cfg.display.max_width = 100;
    cfg.display.max_height = 50;
    cfg
}

fn street_scene(candidate: &str) -> Box<dyn DetectorBackend> {
    Box::new(
        StubBackend::new(candidate)
            .with_detection(0, 0.91, BoundingBox::new(10.0, 10.0, 60.0, 150.0))
            .with_detection(0, 0.47, BoundingBox::new(80.0, 20.0, 120.0, 140.0))
            .with_detection(2, 0.66, BoundingBox::new(150.0, 60.0, 300.0, 140.0))
            .with_detection(16, 0.12, BoundingBox::new(5.0, 100.0, 30.0, 150.0)),
    )
}

fn write_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(width, height, Rgb([200, 200, 200]))
        .save(&path)
        .expect("write test image");
    path
}

fn loaded_session(candidates: &[&str], loadable: &'static str) -> DetectionSession {
    let mut session = DetectionSession::new(config_with(candidates));
    let mut loader = |candidate: &str| -> Result<Box<dyn DetectorBackend>> {
        if candidate == loadable {
            Ok(street_scene(candidate))
        } else {
            Err(anyhow!("{} not available", candidate))
        }
    };
    session.initialize(&mut loader).expect("initialize");
    session
}

#[test]
fn detects_aggregates_and_scales_for_display() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "street.png", 400, 160);
    let mut session = loaded_session(&["yolov8n.onnx", "stub://street"], "stub://street");
    assert_eq!(session.models().active_model(), Some("stub://street"));

    let outcome = session.process_image(&image, 0.25).unwrap();

    assert_eq!(outcome.confidence, 0.25);
    assert_eq!(outcome.stats.count, 3);
    assert_eq!(outcome.stats.unique_types, 2);
    assert_eq!(outcome.stats.objects["person"], vec![0.91, 0.47]);
    assert_eq!(outcome.stats.objects["car"], vec![0.66]);
    assert!(outcome.report.contains("1. CAR"));
    assert!(outcome.report.contains("2. PERSON"));
    assert_eq!(
        outcome.status,
        "✓ detected 3 objects in the image (confidence: 0.25)"
    );

    // 400x160 into 100x50: width-limited
    assert_eq!(outcome.display.dimensions(), (100, 40));
    assert_eq!(session.result_image().unwrap().dimensions(), (400, 160));
    assert_eq!(session.current_image(), Some(image.as_path()));
}

#[test]
fn threshold_is_snapped_before_detection() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "street.png", 320, 160);
    let mut session = loaded_session(&["stub://street"], "stub://street");

    // 0.62 snaps to 0.6; the 0.66 car survives, the 0.47 person does not
    let outcome = session.process_image(&image, 0.62).unwrap();
    assert!((outcome.confidence - 0.6).abs() < 1e-6);
    assert_eq!(outcome.stats.count, 2);

    // below the slider range clamps to 0.1 and keeps the 0.12 dog
    let outcome = session.process_image(&image, 0.01).unwrap();
    assert_eq!(outcome.stats.count, 4);

    assert!(session.process_image(&image, 1.5).is_err());
}

#[test]
fn zero_detections_render_no_objects_found() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "empty.png", 48, 40);
    let mut session = DetectionSession::new(config_with(&["stub://empty"]));
    let mut loader = CandidateLoader::new(&session.config().model);
    session.initialize(&mut loader).unwrap();

    let outcome = session.process_image(&image, 0.25).unwrap();
    assert_eq!(outcome.stats.count, 0);
    assert_eq!(outcome.stats.unique_types, 0);
    assert!(outcome.stats.objects.is_empty());
    assert!(outcome.report.starts_with("No objects found"));
    // already within bounds, shown at native size
    assert_eq!(outcome.display.dimensions(), (48, 40));
}

#[test]
fn processing_without_a_model_is_model_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "street.png", 32, 32);
    let mut session = DetectionSession::new(config_with(&["missing.onnx"]));

    let err = session.process_image(&image, 0.25).unwrap_err();
    assert!(err.downcast_ref::<ModelNotReady>().is_some());
    assert!(session.current_image().is_none());
}

#[test]
fn failed_acquisition_surfaces_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_with(&["yolov8n.pt", "absent.onnx"]);
    cfg.model.search_dirs = vec![dir.path().to_path_buf()];
    let mut loader = CandidateLoader::new(&cfg.model);
    let mut session = DetectionSession::new(cfg);

    let err = session.initialize(&mut loader).unwrap_err();
    let load_err = err.downcast_ref::<ModelLoadError>().expect("ModelLoadError");
    assert_eq!(load_err.attempts.len(), 2);
    assert_eq!(load_err.attempts[0].candidate, "yolov8n.pt");
    assert!(load_err.last_error().unwrap().contains("absent.onnx not found"));
    assert!(!session.models().is_loaded());
    assert!(session.class_list().starts_with("Available classes (0)"));
}

#[test]
fn save_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "street.png", 320, 160);
    let mut session = loaded_session(&["stub://street"], "stub://street");

    let err = session.save_result(&dir.path().join("early.png")).unwrap_err();
    assert!(err.downcast_ref::<NothingToSave>().is_some());

    session.process_image(&image, 0.25).unwrap();
    let written = session.save_result(&dir.path().join("annotated")).unwrap();
    assert_eq!(written, dir.path().join("annotated.jpg"));
    assert!(Path::new(&written).is_file());

    let classes = session.reset();
    assert!(classes.starts_with("Available classes (80)"));
    assert!(session.result_image().is_none());
    assert!(session.current_image().is_none());
    assert!(session.models().is_loaded());
    assert!(session
        .save_result(&dir.path().join("after_reset.png"))
        .is_err());
}

#[test]
fn unreadable_image_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.jpg");
    std::fs::write(&path, b"\xff\xd8 truncated").unwrap();
    let mut session = loaded_session(&["stub://street"], "stub://street");

    let err = session.process_image(&path, 0.25).unwrap_err();
    assert!(format!("{:#}", err).contains("corrupt.jpg"));
    assert!(session.result_image().is_none());
}

#[test]
fn status_line_follows_the_last_action() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "street.png", 320, 160);

    let mut failing = DetectionSession::new(config_with(&["missing.onnx"]));
    let mut nothing = |candidate: &str| -> Result<Box<dyn DetectorBackend>> {
        Err(anyhow!("{} not available", candidate))
    };
    assert_eq!(failing.status(), "");
    assert!(failing.initialize(&mut nothing).is_err());
    assert_eq!(failing.status(), "✗ failed to load a model");
    assert!(failing.process_image(&image, 0.25).is_err());
    assert_eq!(failing.status(), "✗ detection failed");

    let mut session = loaded_session(&["yolov8n.onnx", "stub://street"], "stub://street");
    assert_eq!(session.status(), "✓ loaded stub://street");

    session.process_image(&image, 0.5).unwrap();
    assert_eq!(
        session.status(),
        "✓ detected 2 objects in the image (confidence: 0.50)"
    );

    let written = session.save_result(&dir.path().join("out.png")).unwrap();
    assert_eq!(
        session.status(),
        format!("✓ result saved to {}", written.display())
    );

    session.reset();
    assert_eq!(session.status(), "✓ reset - ready");
}
