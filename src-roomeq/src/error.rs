//! Error types shared by every pipeline stage

use std::path::PathBuf;

/// Errors raised while designing correction filters
///
/// `Configuration` errors are reported before any transform runs.
/// `Geometry` and `Numerical` errors abort the current run; they carry the
/// stage name so the failing step can be identified from the message alone.
#[derive(Debug, thiserror::Error)]
pub enum DrcError {
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("geometry error in {stage}: {message}")]
    Geometry { stage: &'static str, message: String },

    #[error("numerical error in {stage}: {message}")]
    Numerical { stage: &'static str, message: String },

    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DrcError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DrcError::Configuration {
            message: message.into(),
        }
    }

    pub fn geometry(stage: &'static str, message: impl Into<String>) -> Self {
        DrcError::Geometry {
            stage,
            message: message.into(),
        }
    }

    pub fn numerical(stage: &'static str, message: impl Into<String>) -> Self {
        DrcError::Numerical {
            stage,
            message: message.into(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DrcError>;
