//! Core data types flowing through the resize pipeline.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::pipeline::format::ImageFormat;

/// Pipeline stage, used to attribute errors and cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Collect,
    Resize,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Collect => write!(f, "collect"),
            Stage::Resize => write!(f, "resize"),
            Stage::Save => write!(f, "save"),
        }
    }
}

/// A candidate image discovered on disk.
///
/// Only constructed for files whose extension maps to a supported format,
/// so every `ImagePath` reaching the resize stage has a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    path: PathBuf,
    format: ImageFormat,
}

impl ImagePath {
    /// Build from a path, returning `None` for unsupported extensions.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let format = ImageFormat::from_path(&path)?;
        Some(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// A resampled image handed from the resize stage to the save stage.
///
/// Owned by exactly one stage at a time; never mutated after creation.
#[derive(Debug)]
pub struct ResizedImage {
    /// Position of the source in collection order
    pub index: usize,
    /// Path of the source file
    pub source: PathBuf,
    /// Container format, mirrored on output
    pub format: ImageFormat,
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Resampled pixel buffer
    pub image: DynamicImage,
}

impl ResizedImage {
    /// Final path segment of the source, extension included.
    pub fn base_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// One file written by the save stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedImage {
    /// Source file the output was derived from
    pub source: PathBuf,
    /// Written output file
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Terminal outcome of a successful pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Paths produced by discovery
    pub collected: usize,
    /// Images resampled by the resize stage
    pub resized: usize,
    /// Images written by the save stage
    pub saved: usize,
    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
    /// Every file written, in save order
    pub outputs: Vec<SavedImage>,
}

impl PipelineReport {
    /// Images per second over the whole run.
    pub fn rate(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.saved as f64 / (self.elapsed_ms as f64 / 1000.0)
    }
}
