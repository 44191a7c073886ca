//! Bounded handoff channel and shared cancellation for the two pipeline stages.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::Stage;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, the sender waits, providing backpressure so a
/// slow save stage caps how many decoded images are held in memory.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// Cancellation shared by every worker of one run.
///
/// Failures are ranked by the collection index of the item that failed and
/// the lowest one is kept, so fan-out runs report the same error every time.
/// Items ranked below the current failure are still processed in full; items
/// ranked above it are cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    failed_at: AtomicUsize,
    first_error: Mutex<Option<(usize, PipelineError)>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `Cancelled` for `stage` if an item collected before `index`
    /// has already failed.
    pub fn check(&self, stage: Stage, index: usize) -> PipelineResult<()> {
        if self.inner.cancelled.load(Ordering::Acquire)
            && self.inner.failed_at.load(Ordering::Acquire) < index
        {
            Err(PipelineError::Cancelled { stage })
        } else {
            Ok(())
        }
    }

    /// Record the failure of the item at collection `index`.
    ///
    /// Returns `true` if it is now the earliest failure. `Cancelled` errors
    /// are consequences of another failure and are ignored.
    pub fn fail(&self, index: usize, error: PipelineError) -> bool {
        if error.is_cancelled() {
            return false;
        }
        let mut slot = self
            .inner
            .first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match slot.as_ref() {
            Some((at, _)) if *at <= index => {
                tracing::warn!("Additional pipeline failure after cancellation: {error}");
                return false;
            }
            Some((_, later)) => {
                tracing::warn!("Additional pipeline failure after cancellation: {later}");
            }
            None => tracing::debug!("Cancelling pipeline: {error}"),
        }

        self.inner.failed_at.store(index, Ordering::Release);
        self.inner.cancelled.store(true, Ordering::Release);
        *slot = Some((index, error));
        true
    }

    /// Take the earliest recorded failure, if any.
    pub fn take_error(&self) -> Option<PipelineError> {
        self.inner
            .first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .map(|(_, error)| error)
    }
}
