//! Error types for vgltf.

use crate::cache::ResourceKind;
use thiserror::Error;

/// Result type for vgltf operations.
pub type Result<T> = std::result::Result<T, VgltfError>;

/// Boxed error returned by collaborator constructors and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while decoding, encoding, importing or exporting.
#[derive(Debug, Error)]
pub enum VgltfError {
    /// The JSON document breaks a schema constraint.
    #[error("schema violation at {path}: {message}")]
    SchemaViolation {
        /// Field path, e.g. `meshes[0].primitives`.
        path: String,
        /// What is wrong with the field.
        message: String,
    },

    /// Malformed GLB framing.
    #[error("container format error: {0}")]
    ContainerFormat(String),

    /// An index reference is out of bounds or a required reference is absent.
    #[error("reference error at {path}: {message}")]
    Reference {
        /// Field path of the reference.
        path: String,
        /// What the reference failed to resolve to.
        message: String,
    },

    /// A collaborator-supplied resource constructor failed.
    #[error("failed to construct {kind} {index}: {source}")]
    ConstructorFailure {
        /// Kind of the resource being constructed.
        kind: ResourceKind,
        /// glTF array index of the resource.
        index: usize,
        /// The collaborator's error.
        #[source]
        source: BoxError,
    },

    /// A post-export or post-import hook failed.
    #[error("hook '{name}' failed: {source}")]
    Hook {
        /// Hook name.
        name: String,
        /// The hook's error.
        #[source]
        source: BoxError,
    },

    /// Unsupported feature.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A session was driven out of order.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl VgltfError {
    /// Create a schema violation for a field path.
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a reference error for a field path.
    pub fn reference(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reference {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a container format error.
    pub fn container(message: impl Into<String>) -> Self {
        Self::ContainerFormat(message.into())
    }

    /// Wrap a hook failure.
    pub fn hook(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Hook {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Map a serde failure while reading a document into a schema violation.
    ///
    /// Serde names the offending field and position in its message, so the
    /// path is the document root.
    pub(crate) fn from_deserialize(err: serde_json::Error) -> Self {
        Self::schema("$", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_path() {
        let err = VgltfError::schema("meshes[0].primitives", "expected at least 1 item");
        assert_eq!(
            err.to_string(),
            "schema violation at meshes[0].primitives: expected at least 1 item"
        );

        let err = VgltfError::reference("bufferViews[0]", "range 10..18 exceeds buffer 0 (12 bytes)");
        assert!(err.to_string().starts_with("reference error at bufferViews[0]"));
    }

    #[test]
    fn test_constructor_failure_keeps_source() {
        let err = VgltfError::ConstructorFailure {
            kind: ResourceKind::Texture,
            index: 3,
            source: "decoder exploded".into(),
        };
        assert_eq!(err.to_string(), "failed to construct texture 3: decoder exploded");
        assert!(std::error::Error::source(&err).is_some());
    }
}
