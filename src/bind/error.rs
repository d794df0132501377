use thiserror::Error;

use crate::source::SourceError;

/// Failure to resolve a `${...}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PlaceholderError {
    #[error("circular placeholder reference involving '{0}'")]
    CircularReference(String),

    #[error("referenced property not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid placeholder key: {0:?}")]
    InvalidReferencePath(String),

    #[error("cannot reference non-scalar value: {0}")]
    NonScalarReference(String),

    #[error("unclosed placeholder (missing '}}')")]
    UnclosedReference,
}

/// Why a property value could not be assigned to its field.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversionCause {
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    #[error("expected a property group, found {0}")]
    ExpectedGroup(&'static str),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("invalid binding prefix: {0:?}")]
    InvalidPrefix(String),

    #[error("failed to load property sources: {0}")]
    Source(#[from] SourceError),

    #[error("failed to convert property '{key}': {source}")]
    Conversion {
        key: String,
        source: ConversionCause,
    },

    #[error("required property '{key}' is not set")]
    UnboundField { key: String },

    #[error("unknown properties under '{prefix}': {}", keys.join(", "))]
    UnknownProperties { prefix: String, keys: Vec<String> },
}

impl BindError {
    /// The property key the error is about, when there is exactly one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Conversion { key, .. } | Self::UnboundField { key } => Some(key.as_str()),
            _ => None,
        }
    }
}
