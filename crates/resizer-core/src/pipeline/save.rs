//! Save stage: name, encode and write resized images.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ResizedImage, SavedImage, Stage};

use super::channel::CancelToken;
use super::format::EncodeOptions;

/// Callback invoked after each file is written.
pub type SaveCallback = Arc<dyn Fn(&SavedImage) + Send + Sync>;

/// Output file name: `<width>x<height>_<basename>`.
pub fn output_file_name(width: u32, height: u32, base_name: &str) -> String {
    format!("{width}x{height}_{base_name}")
}

/// Writes resized images into a destination directory.
#[derive(Debug, Clone)]
pub struct ImageSaver {
    destination: PathBuf,
    options: EncodeOptions,
}

impl ImageSaver {
    pub fn new(destination: impl Into<PathBuf>, options: EncodeOptions) -> Self {
        Self {
            destination: destination.into(),
            options,
        }
    }

    /// Where `image` will be written.
    pub fn output_path(&self, image: &ResizedImage) -> PathBuf {
        self.destination
            .join(output_file_name(image.width, image.height, &image.base_name()))
    }

    /// Create the destination directory and any missing parents.
    pub async fn ensure_destination(&self) -> PipelineResult<()> {
        tokio::fs::create_dir_all(&self.destination)
            .await
            .map_err(|e| PipelineError::io(Stage::Save, &self.destination, e))
    }

    /// Encode and write `image` to `output`. Blocking.
    ///
    /// The output handle is flushed and closed before returning; a file left
    /// half-written by a failed encode is removed.
    pub fn write(&self, image: &ResizedImage, output: &Path) -> PipelineResult<()> {
        let file = File::create(output).map_err(|e| PipelineError::io(Stage::Save, output, e))?;
        let mut writer = BufWriter::new(file);

        let encoded = image
            .format
            .encode(&image.image, &mut writer, &self.options)
            .map_err(|e| PipelineError::Encode {
                path: output.to_path_buf(),
                message: e.to_string(),
            })
            .and_then(|()| {
                writer
                    .flush()
                    .map_err(|e| PipelineError::io(Stage::Save, output, e))
            });

        if encoded.is_err() {
            drop(writer);
            if let Err(e) = fs::remove_file(output) {
                tracing::debug!("Could not remove partial output {:?}: {e}", output);
            }
        }
        encoded
    }
}

/// Consumes resized images until the channel closes.
pub struct SaveWorker {
    saver: ImageSaver,
    sources: HashSet<PathBuf>,
    on_saved: Option<SaveCallback>,
}

impl SaveWorker {
    pub fn new(saver: ImageSaver) -> Self {
        Self {
            saver,
            sources: HashSet::new(),
            on_saved: None,
        }
    }

    /// Input files of the run. An output that would land on one of them is
    /// refused, so no source is overwritten before it is read.
    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Invoke `callback` after every successful write.
    pub fn with_callback(mut self, callback: Option<SaveCallback>) -> Self {
        self.on_saved = callback;
        self
    }

    /// Receive and write records until every sender is dropped.
    ///
    /// The destination directory is created on the first record, so an
    /// empty run creates nothing. A record that fails is recorded on
    /// `cancel`; records collected after the earliest failure are dropped
    /// unwritten. The channel is always drained, so no resize worker is left
    /// blocked on a send.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<ResizedImage>,
        cancel: CancelToken,
    ) -> Vec<SavedImage> {
        let saver = Arc::new(self.saver);
        // Output path -> index of the record that claimed it
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let mut saved = Vec::new();
        let mut destination_ready = false;

        while let Some(image) = rx.recv().await {
            let index = image.index;
            if let Err(e) = cancel.check(Stage::Save, index) {
                tracing::trace!("Skipping {:?}: {e}", image.source);
                continue;
            }

            let output = saver.output_path(&image);
            if self.sources.contains(&output) {
                cancel.fail(index, PipelineError::OutputCollision { path: output });
                continue;
            }
            if let Some(&other) = claimed.get(&output) {
                // Blame the later-collected of the two so the result does
                // not depend on arrival order.
                cancel.fail(index.max(other), PipelineError::OutputCollision { path: output });
                continue;
            }

            if !destination_ready {
                if let Err(e) = saver.ensure_destination().await {
                    cancel.fail(index, e);
                    continue;
                }
                destination_ready = true;
            }
            claimed.insert(output.clone(), index);

            let record = SavedImage {
                source: image.source.clone(),
                output: output.clone(),
                width: image.width,
                height: image.height,
            };

            let task_saver = saver.clone();
            let written = tokio::task::spawn_blocking(move || task_saver.write(&image, &output))
                .await
                .map_err(|e| PipelineError::TaskFailed {
                    stage: Stage::Save,
                    message: e.to_string(),
                })
                .and_then(|result| result);
            if let Err(e) = written {
                cancel.fail(index, e);
                continue;
            }

            tracing::debug!("Saved {:?}", record.output);
            if let Some(callback) = &self.on_saved {
                callback(&record);
            }
            saved.push(record);
        }

        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::format::ImageFormat;
    use image::DynamicImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resized(source: &str, format: ImageFormat, width: u32, height: u32) -> ResizedImage {
        ResizedImage {
            index: 0,
            source: PathBuf::from(source),
            format,
            width,
            height,
            image: DynamicImage::new_rgb8(width, height),
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(1200, 900, "photo.jpg"), "1200x900_photo.jpg");
        assert_eq!(output_file_name(50, 50, "icon.png"), "50x50_icon.png");
    }

    #[test]
    fn test_output_path_uses_base_name_only() {
        let saver = ImageSaver::new("/out", EncodeOptions::default());
        let img = resized("/in/deep/dir/photo.jpeg", ImageFormat::Jpeg, 4, 3);
        assert_eq!(saver.output_path(&img), PathBuf::from("/out/4x3_photo.jpeg"));
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let saver = ImageSaver::new(dir.path(), EncodeOptions::default());
        let img = resized("icon.png", ImageFormat::Png, 6, 4);
        let output = saver.output_path(&img);

        saver.write(&img, &output).unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (6, 4));
    }

    #[test]
    fn test_write_into_missing_directory_fails_with_io() {
        let dir = tempfile::tempdir().unwrap();
        let saver = ImageSaver::new(dir.path().join("absent"), EncodeOptions::default());
        let img = resized("a.png", ImageFormat::Png, 2, 2);
        let output = saver.output_path(&img);

        let err = saver.write(&img, &output).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Io {
                stage: Stage::Save,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_run_creates_nested_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b/c");
        let worker = SaveWorker::new(ImageSaver::new(&dest, EncodeOptions::default()));

        let (tx, rx) = mpsc::channel(4);
        tx.send(resized("/src/photo.jpg", ImageFormat::Jpeg, 12, 9))
            .await
            .unwrap();
        tx.send(resized("/src/icon.png", ImageFormat::Png, 5, 5))
            .await
            .unwrap();
        drop(tx);

        let saved = worker.run(rx, CancelToken::new()).await;
        assert_eq!(saved.len(), 2);
        assert!(dest.join("12x9_photo.jpg").is_file());
        assert!(dest.join("5x5_icon.png").is_file());
    }

    #[tokio::test]
    async fn test_run_without_records_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("never");
        let worker = SaveWorker::new(ImageSaver::new(&dest, EncodeOptions::default()));

        let (tx, rx) = mpsc::channel::<ResizedImage>(1);
        drop(tx);

        let saved = worker.run(rx, CancelToken::new()).await;
        assert!(saved.is_empty());
        assert!(!dest.exists());
    }

    fn at(index: usize, mut image: ResizedImage) -> ResizedImage {
        image.index = index;
        image
    }

    #[tokio::test]
    async fn test_run_rejects_colliding_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let worker = SaveWorker::new(ImageSaver::new(dir.path(), EncodeOptions::default()));
        let cancel = CancelToken::new();

        let (tx, rx) = mpsc::channel(4);
        tx.send(at(1, resized("/src/b/same.png", ImageFormat::Png, 3, 3)))
            .await
            .unwrap();
        tx.send(at(0, resized("/src/a/same.png", ImageFormat::Png, 3, 3)))
            .await
            .unwrap();
        drop(tx);

        let saved = worker.run(rx, cancel.clone()).await;
        assert_eq!(saved.len(), 1);
        assert!(matches!(
            cancel.take_error(),
            Some(PipelineError::OutputCollision { .. })
        ));
        // The later-collected record is blamed, so earlier items still run.
        assert!(cancel.check(Stage::Save, 1).is_ok());
        assert!(cancel.check(Stage::Save, 2).is_err());
    }

    #[tokio::test]
    async fn test_run_refuses_to_overwrite_a_source() {
        let dir = tempfile::tempdir().unwrap();
        let pending = dir.path().join("2x2_a.png");
        std::fs::write(&pending, b"original bytes").unwrap();

        let worker = SaveWorker::new(ImageSaver::new(dir.path(), EncodeOptions::default()))
            .with_sources(vec![dir.path().join("a.png"), pending.clone()]);
        let cancel = CancelToken::new();

        let (tx, rx) = mpsc::channel(1);
        let source = dir.path().join("a.png");
        tx.send(resized(source.to_str().unwrap(), ImageFormat::Png, 2, 2))
            .await
            .unwrap();
        drop(tx);

        let saved = worker.run(rx, cancel.clone()).await;
        assert!(saved.is_empty());
        match cancel.take_error() {
            Some(PipelineError::OutputCollision { path }) => assert_eq!(path, pending),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read(&pending).unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_run_drops_records_after_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let worker = SaveWorker::new(ImageSaver::new(dir.path(), EncodeOptions::default()));
        let cancel = CancelToken::new();
        cancel.fail(
            1,
            PipelineError::Decode {
                path: "bad.jpg".into(),
                message: "corrupt".into(),
            },
        );

        let (tx, rx) = mpsc::channel(2);
        tx.send(at(2, resized("late.png", ImageFormat::Png, 2, 2)))
            .await
            .unwrap();
        tx.send(at(0, resized("early.png", ImageFormat::Png, 2, 2)))
            .await
            .unwrap();
        drop(tx);

        let saved = worker.run(rx, cancel).await;
        assert_eq!(saved.len(), 1);
        assert!(dir.path().join("2x2_early.png").exists());
        assert!(!dir.path().join("2x2_late.png").exists());
    }

    #[tokio::test]
    async fn test_run_keeps_draining_after_its_own_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let worker = SaveWorker::new(ImageSaver::new(blocker.join("sub"), EncodeOptions::default()));
        let cancel = CancelToken::new();

        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(async move {
            for i in 0..5 {
                let name = format!("/src/{i}.png");
                tx.send(at(i, resized(&name, ImageFormat::Png, 2, 2)))
                    .await
                    .unwrap();
            }
        });

        let saved = worker.run(rx, cancel.clone()).await;
        producer.await.unwrap();
        assert!(saved.is_empty());
        assert!(matches!(
            cancel.take_error(),
            Some(PipelineError::Io {
                stage: Stage::Save,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_callback_sees_every_save() {
        let dir = tempfile::tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: SaveCallback = Arc::new(move |_saved: &SavedImage| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let worker = SaveWorker::new(ImageSaver::new(dir.path(), EncodeOptions::default()))
            .with_callback(Some(callback));

        let (tx, rx) = mpsc::channel(2);
        for name in ["/x/1.png", "/x/2.png", "/x/3.png"] {
            let tx = tx.clone();
            let img = resized(name, ImageFormat::Png, 2, 2);
            tokio::spawn(async move { tx.send(img).await.unwrap() });
        }
        drop(tx);

        let saved = worker.run(rx, CancelToken::new()).await;
        assert_eq!(saved.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
