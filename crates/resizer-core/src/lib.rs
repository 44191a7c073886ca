//! Resizer Core - batch image scaling library.
//!
//! Resizer walks a directory for JPEG and PNG files, scales each one by an
//! integer factor while keeping its aspect ratio, and writes the results as
//! `<width>x<height>_<name>` into a destination directory.
//!
//! # Architecture
//!
//! Decoding/resampling and encoding/writing run as two concurrent stages
//! joined by a bounded channel:
//!
//! ```text
//! Discover → [Resize workers] ──bounded channel──▶ [Save worker] → files
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use resizer_core::{Config, Pipeline, ResizeOptions};
//!
//! #[tokio::main]
//! async fn main() -> resizer_core::Result<()> {
//!     let options = ResizeOptions {
//!         source_dir: "./photos".into(),
//!         dest_dir: Some("./small".into()),
//!         scale: -2,
//!         recursive: true,
//!     };
//!     let report = Pipeline::new(Config::load()?).run(&options).await?;
//!     println!("Resized {} image(s)", report.saved);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, ResizerError, Result};
pub use pipeline::{ImageFormat, Pipeline, ResizeOptions, RunPlan, ScaleFactor};
pub use types::{ImagePath, PipelineReport, ResizedImage, SavedImage, Stage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
