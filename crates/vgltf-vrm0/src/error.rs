//! Error types for the VRM extension.

use thiserror::Error;
use vgltf::{BoxError, VgltfError};

/// Result type for VRM operations.
pub type Result<T> = std::result::Result<T, VrmError>;

/// Errors raised while reading, validating or writing the `VRM` extension.
#[derive(Debug, Error)]
pub enum VrmError {
    /// The extension object does not match the VRM 0.x schema.
    #[error("malformed VRM extension: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An index inside the extension points outside the document.
    #[error("VRM reference at {path}: index {index} out of bounds ({target} has {len})")]
    Reference {
        path: String,
        index: usize,
        target: &'static str,
        len: usize,
    },

    /// A humanoid bone is mapped more than once.
    #[error("humanoid bone {0:?} is mapped more than once")]
    DuplicateBone(String),

    /// The document has no `VRM` extension but one was required.
    #[error("document has no VRM extension")]
    Missing,

    /// The engine-side bridge failed.
    #[error("VRM bridge failed: {0}")]
    Bridge(#[source] BoxError),
}

impl From<VrmError> for VgltfError {
    fn from(err: VrmError) -> Self {
        VgltfError::hook(crate::EXTENSION_NAME, err)
    }
}

pub(crate) fn check_index(path: impl Into<String>, index: usize, len: usize, target: &'static str) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(VrmError::Reference {
            path: path.into(),
            index,
            target,
            len,
        })
    }
}
