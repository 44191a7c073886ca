//! Turn parsed arguments into config overrides and pipeline options.

use resizer_core::{Config, ResizeOptions};

use super::ResizeArgs;

/// Apply CLI overrides on top of the loaded config.
///
/// Values are not checked here; `Pipeline::plan` validates the merged config.
pub fn apply_overrides(args: &ResizeArgs, config: &mut Config) {
    if let Some(workers) = args.workers {
        config.pipeline.resize_workers = workers;
    }
    if let Some(buffer) = args.buffer {
        config.pipeline.buffer_size = buffer;
    }
    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
}

pub fn resize_options(args: &ResizeArgs) -> ResizeOptions {
    ResizeOptions {
        source_dir: resizer_core::config::expand_path(&args.dir),
        dest_dir: args
            .save_dir
            .as_deref()
            .map(resizer_core::config::expand_path),
        scale: args.scale,
        recursive: args.recursive,
    }
}
