//! Pipeline orchestration - wires discovery, the resize stage and the save stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{ConfigError, PipelineError, PipelineResult, Result};
use crate::types::{ImagePath, PipelineReport, SavedImage, Stage};

use super::channel::{bounded_channel, CancelToken};
use super::discovery::FileDiscovery;
use super::format::EncodeOptions;
use super::resize::{ResizeWorker, WorkQueue};
use super::save::{ImageSaver, SaveCallback, SaveWorker};
use super::scale::ScaleFactor;

/// What to resize and where to put it.
#[derive(Debug, Clone)]
pub struct ResizeOptions {
    /// Directory to read images from
    pub source_dir: PathBuf,
    /// Directory to write into (defaults to `source_dir`)
    pub dest_dir: Option<PathBuf>,
    /// Raw scale factor; must be non-zero
    pub scale: i32,
    /// Descend into subdirectories
    pub recursive: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            dest_dir: None,
            scale: 1,
            recursive: false,
        }
    }
}

impl ResizeOptions {
    /// Destination directory, falling back to the source directory.
    pub fn destination(&self) -> &Path {
        self.dest_dir.as_deref().unwrap_or(&self.source_dir)
    }

    /// Check the options before any file I/O.
    pub fn validate(&self) -> std::result::Result<ScaleFactor, ConfigError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "a source directory is required".into(),
            ));
        }
        ScaleFactor::new(self.scale)
    }
}

/// A validated run: the discovered files plus resolved settings.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub files: Vec<ImagePath>,
    pub scale: ScaleFactor,
    pub destination: PathBuf,
}

/// Coordinates a resize run.
pub struct Pipeline {
    config: Config,
    on_saved: Option<SaveCallback>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            on_saved: None,
        }
    }

    /// Call `callback` after each image is written (e.g. to drive a progress bar).
    pub fn on_saved<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SavedImage) + Send + Sync + 'static,
    {
        self.on_saved = Some(Arc::new(callback));
        self
    }

    /// Validate options and config, then collect the input paths.
    ///
    /// Everything that can fail fatally before work starts fails here.
    pub fn plan(&self, options: &ResizeOptions) -> Result<RunPlan> {
        let scale = options.validate()?;
        self.config.validate()?;

        let files = FileDiscovery::new(options.recursive).collect(&options.source_dir)?;

        Ok(RunPlan {
            files,
            scale,
            destination: options.destination().to_path_buf(),
        })
    }

    /// Plan and execute in one call.
    pub async fn run(&self, options: &ResizeOptions) -> Result<PipelineReport> {
        let plan = self.plan(options)?;
        self.execute(plan).await
    }

    /// Run the resize and save stages concurrently until both finish.
    ///
    /// Resize workers are the only senders on the handoff channel; the save
    /// worker is the only receiver. When an item fails, both sides stop at
    /// the next item collected after it. The failure of the earliest
    /// collected item is returned, whatever the worker count.
    pub async fn execute(&self, plan: RunPlan) -> Result<PipelineReport> {
        let start = Instant::now();
        let collected = plan.files.len();
        let workers = self.config.pipeline.resize_workers.clamp(1, collected.max(1));

        tracing::info!(
            "Resizing {} image(s) with scale {} into {:?}",
            collected,
            plan.scale,
            plan.destination
        );

        let cancel = CancelToken::new();
        let (tx, rx) = bounded_channel(&self.config.pipeline);
        let sources: Vec<_> = plan.files.iter().map(|f| f.path().to_path_buf()).collect();
        let queue = Arc::new(WorkQueue::new(plan.files));
        let resizer = ResizeWorker::new(plan.scale, &self.config.limits);

        let producers: Vec<_> = (0..workers)
            .map(|_| {
                let worker = resizer.clone();
                let queue = queue.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { settle(worker.run(queue, tx, cancel).await) })
            })
            .collect();
        drop(tx);

        let saver = ImageSaver::new(
            plan.destination,
            EncodeOptions {
                jpeg_quality: self.config.output.jpeg_quality,
            },
        );
        let consumer = {
            let worker = SaveWorker::new(saver)
                .with_sources(sources)
                .with_callback(self.on_saved.clone());
            tokio::spawn(worker.run(rx, cancel.clone()))
        };

        let mut resized = 0usize;
        for handle in producers {
            match handle.await {
                Ok(count) => resized += count,
                Err(e) => {
                    cancel.fail(0, PipelineError::TaskFailed {
                        stage: Stage::Resize,
                        message: e.to_string(),
                    });
                }
            }
        }
        let outputs = match consumer.await {
            Ok(outputs) => outputs,
            Err(e) => {
                cancel.fail(0, PipelineError::TaskFailed {
                    stage: Stage::Save,
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        if let Some(error) = cancel.take_error() {
            tracing::error!("Pipeline failed: {error}");
            return Err(error.into());
        }

        let report = PipelineReport {
            collected,
            resized,
            saved: outputs.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            outputs,
        };
        tracing::info!(
            "Resized {} image(s) in {}ms",
            report.saved,
            report.elapsed_ms
        );
        Ok(report)
    }
}

/// A resize worker only returns `Cancelled` itself; item failures are
/// already on the token.
fn settle(result: PipelineResult<usize>) -> usize {
    result.unwrap_or_else(|error| {
        tracing::trace!("Resize worker stopped: {error}");
        0
    })
}
