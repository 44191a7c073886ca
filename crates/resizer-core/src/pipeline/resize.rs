//! Resize stage: decode, compute target size, resample, hand off.

use image::imageops::FilterType;
use image::{GenericImageView, Limits};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImagePath, ResizedImage, Stage};

use super::channel::CancelToken;
use super::scale::ScaleFactor;

/// Paths waiting to be resized, shared by every resize worker of a run.
///
/// Each path is numbered with its collection index as it enters the queue.
#[derive(Debug, Default)]
pub struct WorkQueue {
    paths: Mutex<VecDeque<(usize, ImagePath)>>,
}

impl WorkQueue {
    pub fn new(paths: Vec<ImagePath>) -> Self {
        Self {
            paths: Mutex::new(paths.into_iter().enumerate().collect()),
        }
    }

    /// Pop the next path and its index, in collection order.
    pub fn next(&self) -> Option<(usize, ImagePath)> {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

/// Decodes and resamples images, then sends them to the save stage.
#[derive(Debug, Clone)]
pub struct ResizeWorker {
    scale: ScaleFactor,
    limits: Limits,
    filter: FilterType,
}

impl ResizeWorker {
    /// Create a worker using a Lanczos3 filter.
    pub fn new(scale: ScaleFactor, limits: &LimitsConfig) -> Self {
        Self {
            scale,
            limits: limits.decoder_limits(),
            filter: FilterType::Lanczos3,
        }
    }

    /// Decode and resample a single file. Blocking.
    ///
    /// The input file handle is dropped as soon as decoding finishes,
    /// before resampling starts.
    pub fn resize_file(&self, index: usize, input: &ImagePath) -> PipelineResult<ResizedImage> {
        let path = input.path();
        let start = std::time::Instant::now();

        let source = {
            let file = File::open(path).map_err(|e| PipelineError::io(Stage::Resize, path, e))?;
            input
                .format()
                .decode(BufReader::new(file), self.limits.clone())
                .map_err(|e| PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
        };
        tracing::trace!("  Decode {:?}: {:?}", path, start.elapsed());

        let (orig_width, orig_height) = source.dimensions();
        let (width, height) = self.scale.apply_dimensions(orig_width, orig_height);
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyTarget {
                path: path.to_path_buf(),
                width,
                height,
            });
        }

        let resample_start = std::time::Instant::now();
        let image = source.resize_exact(width, height, self.filter);
        tracing::trace!("  Resample {:?}: {:?}", path, resample_start.elapsed());

        tracing::debug!(
            "Resized {:?} ({}) {}x{} -> {}x{}",
            path,
            input.format(),
            orig_width,
            orig_height,
            width,
            height
        );

        Ok(ResizedImage {
            index,
            source: path.to_path_buf(),
            format: input.format(),
            width,
            height,
            image,
        })
    }

    /// Drain `queue`, sending one record per path until it is empty.
    ///
    /// A path that fails is recorded on `cancel` and the worker moves on; it
    /// stops once it pops a path collected after the earliest failure, or
    /// when the save stage has gone away. The sender is dropped on return,
    /// which is what closes the channel once every resize worker has finished.
    pub async fn run(
        self,
        queue: Arc<WorkQueue>,
        tx: mpsc::Sender<ResizedImage>,
        cancel: CancelToken,
    ) -> PipelineResult<usize> {
        let mut sent = 0usize;

        while let Some((index, input)) = queue.next() {
            cancel.check(Stage::Resize, index)?;

            let worker = self.clone();
            let record = tokio::task::spawn_blocking(move || worker.resize_file(index, &input))
                .await
                .map_err(|e| PipelineError::TaskFailed {
                    stage: Stage::Resize,
                    message: e.to_string(),
                })
                .and_then(|result| result);

            let record = match record {
                Ok(record) => record,
                Err(error) => {
                    cancel.fail(index, error);
                    continue;
                }
            };

            if tx.send(record).await.is_err() {
                // Receiver dropped: the save stage stopped
                return Err(PipelineError::Cancelled {
                    stage: Stage::Resize,
                });
            }
            sent += 1;
        }

        Ok(sent)
    }
}
