use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL_CANDIDATES: [&str; 3] = ["yolov8n.onnx", "yolov8s.onnx", "yolov8m.onnx"];
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_CONFIDENCE_MIN: f32 = 0.1;
const DEFAULT_CONFIDENCE_MAX: f32 = 0.9;
const DEFAULT_CONFIDENCE_STEP: f32 = 0.05;
const DEFAULT_MAX_DISPLAY_WIDTH: u32 = 700;
const DEFAULT_MAX_DISPLAY_HEIGHT: u32 = 550;

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    model: Option<ModelConfigFile>,
    confidence: Option<ConfidenceConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    candidates: Option<Vec<String>>,
    search_dirs: Option<Vec<PathBuf>>,
    input_size: Option<u32>,
    iou_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfidenceConfigFile {
    default: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
    step: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    max_width: Option<u32>,
    max_height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model: ModelSettings,
    pub confidence: ConfidenceSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Candidate weight files, highest priority first.
    pub candidates: Vec<String>,
    pub search_dirs: Vec<PathBuf>,
    pub input_size: u32,
    pub iou_threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSettings {
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::from_file(DetectorConfigFile::default())
    }
}

impl DetectorConfig {
    /// Load from `DETECTOR_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DETECTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => read_config_file(Path::new(path))?,
            _ => DetectorConfigFile::default(),
        };
        Self::finish(file_cfg)
    }

    /// Load from an explicit file, then apply env overrides.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::finish(read_config_file(path)?)
    }

    fn finish(file: DetectorConfigFile) -> Result<Self> {
        let mut cfg = Self::from_file(file);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Self {
        let model = file.model.unwrap_or_default();
        let confidence = file.confidence.unwrap_or_default();
        let display = file.display.unwrap_or_default();
        Self {
            model: ModelSettings {
                candidates: model.candidates.unwrap_or_else(|| {
                    DEFAULT_MODEL_CANDIDATES
                        .iter()
                        .map(|name| name.to_string())
                        .collect()
                }),
                search_dirs: model.search_dirs.unwrap_or_else(default_search_dirs),
                input_size: model.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
                iou_threshold: model.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
            },
            confidence: ConfidenceSettings {
                default: confidence.default.unwrap_or(DEFAULT_CONFIDENCE),
                min: confidence.min.unwrap_or(DEFAULT_CONFIDENCE_MIN),
                max: confidence.max.unwrap_or(DEFAULT_CONFIDENCE_MAX),
                step: confidence.step.unwrap_or(DEFAULT_CONFIDENCE_STEP),
            },
            display: DisplaySettings {
                max_width: display.max_width.unwrap_or(DEFAULT_MAX_DISPLAY_WIDTH),
                max_height: display.max_height.unwrap_or(DEFAULT_MAX_DISPLAY_HEIGHT),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(models) = std::env::var("DETECTOR_MODELS") {
            let parsed = split_csv(&models);
            if !parsed.is_empty() {
                self.model.candidates = parsed;
            }
        }
        if let Ok(dirs) = std::env::var("DETECTOR_MODEL_DIRS") {
            let parsed = split_csv(&dirs);
            if !parsed.is_empty() {
                self.model.search_dirs = parsed.into_iter().map(PathBuf::from).collect();
            }
        }
        if let Ok(confidence) = std::env::var("DETECTOR_CONFIDENCE") {
            self.confidence.default = confidence.trim().parse().map_err(|_| {
                anyhow!("DETECTOR_CONFIDENCE must be a number between 0 and 1")
            })?;
        }
        if let Ok(bounds) = std::env::var("DETECTOR_MAX_DISPLAY") {
            let (width, height) = parse_dimensions(&bounds)
                .context("DETECTOR_MAX_DISPLAY must look like 700x550")?;
            self.display.max_width = width;
            self.display.max_height = height;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.model.candidates.retain(|name| !name.trim().is_empty());
        if self.model.candidates.is_empty() {
            return Err(anyhow!("at least one model candidate is required"));
        }
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(anyhow!(
                "model input size must be a positive multiple of 32, got {}",
                self.model.input_size
            ));
        }
        if !(self.model.iou_threshold > 0.0 && self.model.iou_threshold <= 1.0) {
            return Err(anyhow!("iou threshold must be in (0, 1]"));
        }
        self.confidence.validate()?;
        if self.display.max_width == 0 || self.display.max_height == 0 {
            return Err(anyhow!("display bounds must be greater than zero"));
        }
        Ok(())
    }
}

impl ConfidenceSettings {
    fn validate(&self) -> Result<()> {
        let ConfidenceSettings {
            default,
            min,
            max,
            step,
        } = *self;
        if !(min > 0.0 && max < 1.0 && min <= max) {
            return Err(anyhow!(
                "confidence range must satisfy 0 < min <= max < 1, got [{}, {}]",
                min,
                max
            ));
        }
        if !(default >= min && default <= max) {
            return Err(anyhow!(
                "default confidence {} is outside [{}, {}]",
                default,
                min,
                max
            ));
        }
        if !(step > 0.0 && step.is_finite()) {
            return Err(anyhow!("confidence step must be positive"));
        }
        Ok(())
    }

    /// Map a requested threshold onto the slider: clamp into `[min, max]`
    /// and round to the nearest step above `min`.
    ///
    /// Values outside the open interval (0, 1) are rejected.
    pub fn snap(&self, value: f32) -> Result<f32> {
        if !(value > 0.0 && value < 1.0) {
            return Err(anyhow!(
                "confidence threshold must be in (0, 1), got {}",
                value
            ));
        }
        let clamped = value.clamp(self.min, self.max);
        if clamped != value {
            log::warn!(
                "confidence {:.2} clamped to {:.2} (allowed range {:.2}-{:.2})",
                value,
                clamped,
                self.min,
                self.max
            );
        }
        let steps = ((clamped - self.min) / self.step).round();
        let snapped = (self.min + steps * self.step).clamp(self.min, self.max);
        // strip float noise so 0.1 + 3 * 0.05 prints as 0.25
        Ok((snapped * 1e4).round() / 1e4)
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("."), PathBuf::from(DEFAULT_MODEL_DIR)];
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }
    dirs
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cfg: DetectorConfigFile = if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_dimensions(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {:?}", value))?;
    let width: u32 = width.trim().parse()?;
    let height: u32 = height.trim().parse()?;
    if width == 0 || height == 0 {
        return Err(anyhow!("dimensions must be greater than zero"));
    }
    Ok((width, height))
}
