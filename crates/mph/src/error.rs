//! Error kinds surfaced by the model tree interface.

use mph_node_path::NodePathError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure reported by the engine bridge itself.
///
/// These are passed through to the caller unmodified, since only the
/// engine knows the precise cause.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no feature with tag \"{0}\"")]
    NoSuchTag(String),
    #[error("feature tag \"{0}\" is already in use")]
    DuplicateTag(String),
    #[error("no property \"{0}\"")]
    NoSuchProperty(String),
    #[error("operation \"{0}\" is not supported by this object")]
    Unsupported(&'static str),
    #[error("{0}")]
    Call(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// A path segment or named entity was not found.
    #[error("{0}")]
    Lookup(String),
    /// The operation is structurally forbidden on this node.
    #[error("{0}")]
    Permission(String),
    /// A host value or engine type tag could not be converted.
    #[error("{0}")]
    TypeConversion(String),
    #[error("engine call failed: {0}")]
    Engine(#[from] EngineError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Runtime(String),
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the one kind that `exists()` converts into `false`.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Error::Lookup(_))
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Error::Permission(_))
    }

    pub fn is_type_conversion(&self) -> bool {
        matches!(self, Error::TypeConversion(_))
    }
}

impl From<NodePathError> for Error {
    fn from(err: NodePathError) -> Self {
        match err {
            NodePathError::UnknownGroup(_) => Error::Lookup(err.to_string()),
            NodePathError::NoParent => Error::Permission(err.to_string()),
            _ => Error::InvalidArgument(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_kinds() {
        let err: Error = NodePathError::UnknownGroup("foo".into()).into();
        assert!(err.is_lookup());
        assert_eq!(err.to_string(), "\"foo\" is not a built-in group");

        let err: Error = NodePathError::NoParent.into();
        assert!(err.is_permission());

        let err: Error = NodePathError::EmptySegment.into();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_engine_error_is_wrapped_verbatim() {
        let err: Error = EngineError::Call("invalid property value".into()).into();
        assert_eq!(err.to_string(), "engine call failed: invalid property value");
        assert!(matches!(err, Error::Engine(EngineError::Call(_))));
        assert!(!err.is_lookup());
    }
}
