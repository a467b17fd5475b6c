//! Error types for scene configuration and construction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading scene configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors raised by scene operations.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("no entity constructor named `{0}`")]
    UnknownConstructor(String),

    #[error("no entity with index {0}")]
    UnknownEntity(usize),

    #[error("shot direction must be non-zero, got {0:?}")]
    InvalidDirection([f32; 3]),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
