pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::StubBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::backend::{DetectorBackend, ModelLoader};
use super::result::ClassNames;
use crate::config::ModelSettings;

/// Resolves candidate identifiers to model files and loads them.
///
/// - `stub://<name>` yields an empty `StubBackend`
/// - relative names are looked up in each search dir in order
/// - a sibling `<stem>.names` file overrides the default COCO labels
pub struct CandidateLoader {
    search_dirs: Vec<PathBuf>,
    input_size: u32,
    iou_threshold: f32,
}

impl CandidateLoader {
    pub fn new(settings: &ModelSettings) -> Self {
        Self {
            search_dirs: settings.search_dirs.clone(),
            input_size: settings.input_size,
            iou_threshold: settings.iou_threshold,
        }
    }

    /// Locate `candidate` on disk.
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf> {
        let direct = Path::new(candidate);
        if direct.is_absolute() {
            if direct.is_file() {
                return Ok(direct.to_path_buf());
            }
            return Err(anyhow!("model file {} does not exist", direct.display()));
        }
        let searched: Vec<PathBuf> = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(candidate))
            .collect();
        if let Some(found) = searched.iter().find(|path| path.is_file()) {
            return Ok(found.clone());
        }
        Err(anyhow!(
            "model file {} not found (searched: {})",
            candidate,
            searched
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn labels_for(path: &Path) -> Result<Option<ClassNames>> {
        let labels = path.with_extension("names");
        if !labels.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&labels)
            .with_context(|| format!("failed to read labels file {}", labels.display()))?;
        let names = ClassNames::parse_labels(&text)
            .with_context(|| format!("invalid labels file {}", labels.display()))?;
        log::info!("using {} class names from {}", names.len(), labels.display());
        Ok(Some(names))
    }

    #[cfg(feature = "backend-tract")]
    fn load_onnx(&self, candidate: &str, path: &Path) -> Result<Box<dyn DetectorBackend>> {
        let mut backend = TractBackend::new(path, self.input_size)?
            .with_name(candidate)
            .with_iou_threshold(self.iou_threshold);
        if let Some(names) = Self::labels_for(path)? {
            backend = backend.with_class_names(names);
        }
        Ok(Box::new(backend))
    }

    #[cfg(not(feature = "backend-tract"))]
    fn load_onnx(&self, candidate: &str, _path: &Path) -> Result<Box<dyn DetectorBackend>> {
        Err(anyhow!(
            "loading {} requires the backend-tract feature",
            candidate
        ))
    }
}

impl ModelLoader for CandidateLoader {
    fn load(&mut self, candidate: &str) -> Result<Box<dyn DetectorBackend>> {
        if candidate.trim().is_empty() {
            return Err(anyhow!("empty model candidate"));
        }
        if candidate.starts_with("stub://") {
            return Ok(Box::new(StubBackend::new(candidate)));
        }
        if candidate.ends_with(".pt") {
            return Err(anyhow!(
                "{} is a PyTorch checkpoint; export it to ONNX (yolo export format=onnx)",
                candidate
            ));
        }
        let path = self.resolve(candidate)?;
        log::debug!("resolved {} to {}", candidate, path.display());
        self.load_onnx(candidate, &path)
    }
}
