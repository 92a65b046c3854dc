use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use object_detector::config::DetectorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DETECTOR_CONFIG",
        "DETECTOR_MODELS",
        "DETECTOR_MODEL_DIRS",
        "DETECTOR_CONFIDENCE",
        "DETECTOR_MAX_DISPLAY",
    ] {
        std::env::remove_var(key);
    }
}

fn temp_config(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(body.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_toml_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".toml",
        r#"
[model]
candidates = ["custom.onnx", "yolov8n.onnx"]
search_dirs = ["/opt/models"]
input_size = 320
iou_threshold = 0.5

[confidence]
default = 0.4
step = 0.1

[display]
max_width = 1024
max_height = 768
"#,
    );

    std::env::set_var("DETECTOR_CONFIG", file.path());
    std::env::set_var("DETECTOR_CONFIDENCE", "0.3");
    std::env::set_var("DETECTOR_MAX_DISPLAY", "640x480");

    let cfg = DetectorConfig::load().expect("load config");

    assert_eq!(cfg.model.candidates, vec!["custom.onnx", "yolov8n.onnx"]);
    assert_eq!(cfg.model.search_dirs, vec![PathBuf::from("/opt/models")]);
    assert_eq!(cfg.model.input_size, 320);
    assert_eq!(cfg.model.iou_threshold, 0.5);
    assert_eq!(cfg.confidence.default, 0.3);
    assert_eq!(cfg.confidence.step, 0.1);
    assert_eq!(cfg.confidence.min, 0.1);
    assert_eq!(cfg.confidence.max, 0.9);
    assert_eq!(cfg.display.max_width, 640);
    assert_eq!(cfg.display.max_height, 480);

    clear_env();
}

#[test]
fn loads_json_file_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".json",
        r#"{ "model": { "candidates": ["a.onnx"] }, "display": { "max_width": 300 } }"#,
    );
    std::env::set_var("DETECTOR_MODELS", "b.onnx, c.onnx");
    std::env::set_var("DETECTOR_MODEL_DIRS", "weights");

    let cfg = DetectorConfig::from_path(file.path()).expect("load config");
    assert_eq!(cfg.model.candidates, vec!["b.onnx", "c.onnx"]);
    assert_eq!(cfg.model.search_dirs, vec![PathBuf::from("weights")]);
    assert_eq!(cfg.display.max_width, 300);
    assert_eq!(cfg.display.max_height, 550);

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = DetectorConfig::load().expect("load config");
    assert_eq!(cfg.model.candidates.len(), 3);
    assert_eq!(cfg.model.candidates[0], "yolov8n.onnx");
    assert_eq!(cfg.confidence.default, 0.25);
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECTOR_CONFIDENCE", "high");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("DETECTOR_CONFIDENCE", "0.95");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    std::env::set_var("DETECTOR_MAX_DISPLAY", "wide");
    assert!(DetectorConfig::load().is_err());
    clear_env();

    let file = temp_config(".toml", "[model]\ncandidates = []\n");
    assert!(DetectorConfig::from_path(file.path()).is_err());

    let file = temp_config(".toml", "[model\n");
    let err = DetectorConfig::from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}
