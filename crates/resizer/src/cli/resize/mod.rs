//! The resize command: argument surface and run orchestration.

mod setup;
mod summary;

use clap::Args;
use resizer_core::{Config, Pipeline};
use std::path::PathBuf;

use setup::{apply_overrides, resize_options};
use summary::{create_progress_bar, print_summary};

/// Arguments for a resize run.
#[derive(Args, Debug)]
pub struct ResizeArgs {
    /// Directory containing the images to resize
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: PathBuf,

    /// Directory to write resized images into (defaults to --dir)
    #[arg(short = 'p', long = "save-dir", value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Also resize images in subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Scale factor: n > 0 grows each side by 1/n, n < 0 shrinks it to 1/|n|
    #[arg(
        short = 's',
        long = "scale",
        visible_alias = "sc",
        value_name = "INT",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub scale: i32,

    /// Number of concurrent resize workers
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Resized images held between the resize and save stages
    #[arg(long, value_name = "N")]
    pub buffer: Option<usize>,

    /// JPEG output quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Print the run report as JSON on stdout instead of the summary
    #[arg(long)]
    pub json: bool,
}

/// Values match the clap defaults above.
impl Default for ResizeArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            save_dir: None,
            recursive: false,
            scale: 1,
            workers: None,
            buffer: None,
            quality: None,
            json: false,
        }
    }
}

/// Run one resize pass over `args.dir`.
pub async fn execute(args: ResizeArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);
    let options = resize_options(&args);

    let pipeline = Pipeline::new(config);
    let plan = pipeline.plan(&options)?;
    if plan.files.is_empty() {
        tracing::warn!("No JPEG or PNG files found in {:?}", options.source_dir);
    } else {
        tracing::info!("Found {} image(s) to resize", plan.files.len());
    }

    let progress = create_progress_bar(plan.files.len() as u64, args.json)?;
    let bar = progress.clone();
    let started = std::time::Instant::now();
    let pipeline = pipeline.on_saved(move |_saved| {
        bar.inc(1);
        let elapsed = started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            bar.set_message(format!("{:.1} img/sec", bar.position() as f64 / elapsed));
        }
    });

    let report = match pipeline.execute(plan).await {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };
    progress.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    #[test]
    fn resize_args_default_scale_is_one() {
        let args = ResizeArgs::default();
        assert_eq!(args.scale, 1);
    }

    #[test]
    fn resize_args_default_overrides_unset() {
        let args = ResizeArgs::default();
        assert!(args.workers.is_none());
        assert!(args.buffer.is_none());
        assert!(args.quality.is_none());
        assert!(!args.recursive);
        assert!(!args.json);
    }

    #[tokio::test]
    async fn execute_writes_resized_files() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        DynamicImage::new_rgb8(40, 30)
            .save(src.path().join("a.png"))
            .unwrap();

        let args = ResizeArgs {
            dir: src.path().to_path_buf(),
            save_dir: Some(out.path().to_path_buf()),
            scale: -2,
            json: true,
            ..Default::default()
        };
        execute(args, Config::default()).await.unwrap();

        assert!(out.path().join("20x15_a.png").is_file());
    }

    #[tokio::test]
    async fn execute_rejects_zero_scale() {
        let args = ResizeArgs {
            dir: PathBuf::from("/no/such/dir"),
            scale: 0,
            ..Default::default()
        };
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[tokio::test]
    async fn execute_rejects_zero_workers() {
        let src = tempfile::tempdir().unwrap();
        let args = ResizeArgs {
            dir: src.path().to_path_buf(),
            workers: Some(0),
            ..Default::default()
        };
        assert!(execute(args, Config::default()).await.is_err());
    }
}
