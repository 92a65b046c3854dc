//! Model acquisition and detection invocation.

mod backend;
pub mod backends;
mod manager;
mod result;
pub mod yolo;

pub use backend::{DetectorBackend, ModelLoader};
pub use backends::{CandidateLoader, StubBackend};
pub use manager::{
    LoadAttempt, LoadReport, ModelLoadError, ModelManager, ModelNotReady, REMEDIATION,
};
pub use result::{BoundingBox, ClassNames, Detection};

#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
