//! Image resize pipeline components.
//!
//! This module contains all the stages of the resize pipeline:
//! - **discovery**: Find image files in a directory tree
//! - **scale**: Scale-factor arithmetic for target dimensions
//! - **format**: Extension to decoder/encoder dispatch
//! - **resize**: Decode and resample (producer)
//! - **save**: Name, encode and write (consumer)
//! - **channel**: Bounded handoff channel and cancellation
//! - **processor**: Orchestrates the full pipeline

pub mod channel;
pub mod discovery;
pub mod format;
pub mod processor;
pub mod resize;
pub mod save;
pub mod scale;

// Re-exports for convenient access
pub use channel::{bounded_channel, CancelToken};
pub use discovery::FileDiscovery;
pub use format::{EncodeOptions, ImageFormat};
pub use processor::{Pipeline, ResizeOptions, RunPlan};
pub use resize::{ResizeWorker, WorkQueue};
pub use save::{output_file_name, ImageSaver, SaveCallback, SaveWorker};
pub use scale::{new_dimension, target_dimensions, ScaleFactor};
