use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a property source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("required property file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read property file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse property file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
