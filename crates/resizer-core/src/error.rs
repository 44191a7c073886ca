//! Error types for the resizer pipeline.
//!
//! Errors are organized by concern so that the CLI can print a single message
//! naming the failing file and the stage (collect, resize, save) it failed in.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Stage;

/// Top-level error type for resizer operations.
#[derive(Error, Debug)]
pub enum ResizerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-specific errors. Raised before any pipeline work begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration or option values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Filesystem access failed (listing, open, create, mkdir)
    #[error("IO error in {stage} stage for {path}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// The scale factor truncated a dimension to zero
    #[error("Scale produces an empty image for {path} ({width}x{height})")]
    EmptyTarget {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    /// Two inputs resolved to the same output file within one run
    #[error("Output collision: {path} would be written more than once")]
    OutputCollision { path: PathBuf },

    /// The stage stopped because the other stage failed
    #[error("{stage} stage cancelled")]
    Cancelled { stage: Stage },

    /// A worker task panicked or was aborted
    #[error("{stage} worker failed: {message}")]
    TaskFailed { stage: Stage, message: String },
}

impl PipelineError {
    /// Wrap an I/O error with the stage and path it occurred on.
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// True for the secondary error a stage returns after the other one failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Convenience type alias for resizer results.
pub type Result<T> = std::result::Result<T, ResizerError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
