//! Resizer CLI - batch-scale JPEG and PNG images by an integer factor.
//!
//! Every image in a directory is resized and written next to the others as
//! `<width>x<height>_<name>`, keeping its format.
//!
//! # Usage
//!
//! ```bash
//! # Grow every image by half (800x600 -> 1200x900)
//! resizer -d ./photos -s 2
//!
//! # Halve every image, walking subdirectories, into another folder
//! resizer -d ./photos -p ./small -r -s -2
//!
//! # Machine-readable report
//! resizer -d ./photos -s -3 --json
//! ```

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

mod cli;
mod logging;

/// Resizer - batch-scale JPEG and PNG images.
#[derive(Parser, Debug)]
#[command(name = "resizer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    resize: cli::resize::ResizeArgs,

    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,
}

/// Rewrite the single-dash `-sc` spelling to `--sc` so clap does not read it
/// as `-s` with the value `c`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-sc") => OsString::from("--sc"),
            Some(s) if s.starts_with("-sc=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn load_config(cli: &Cli) -> anyhow::Result<resizer_core::Config> {
    if let Some(path) = &cli.config {
        return resizer_core::Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {:?}: {e}", path));
    }

    // Logging isn't initialized yet, so warnings go straight to stderr.
    match resizer_core::Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config from {:?}: {e}\n  \
                 Using default configuration.",
                resizer_core::Config::default_path()
            );
            Ok(resizer_core::Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let config = load_config(&cli)?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Resizer v{}", resizer_core::VERSION);

    cli::resize::execute(cli.resize, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dir_is_required() {
        assert!(parse(&["resizer"]).is_err());
        assert!(parse(&["resizer", "-s", "2"]).is_err());
    }

    #[test]
    fn defaults_without_flags() {
        let cli = parse(&["resizer", "-d", "photos"]).unwrap();
        assert_eq!(cli.resize.dir, PathBuf::from("photos"));
        assert_eq!(cli.resize.scale, 1);
        assert!(cli.resize.save_dir.is_none());
        assert!(!cli.resize.recursive);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn short_flags() {
        let cli = parse(&["resizer", "-d", "in", "-p", "out", "-r", "-s", "3"]).unwrap();
        assert_eq!(cli.resize.save_dir, Some(PathBuf::from("out")));
        assert!(cli.resize.recursive);
        assert_eq!(cli.resize.scale, 3);
    }

    #[test]
    fn negative_scale_is_a_value() {
        let cli = parse(&["resizer", "-d", "in", "-s", "-2"]).unwrap();
        assert_eq!(cli.resize.scale, -2);

        let cli = parse(&["resizer", "-d", "in", "--scale=-4"]).unwrap();
        assert_eq!(cli.resize.scale, -4);
    }

    #[test]
    fn legacy_sc_spelling() {
        let cli = parse(&["resizer", "-d", "in", "-sc", "-2"]).unwrap();
        assert_eq!(cli.resize.scale, -2);

        let cli = parse(&["resizer", "-d", "in", "-sc=5"]).unwrap();
        assert_eq!(cli.resize.scale, 5);

        let cli = parse(&["resizer", "-d", "in", "--sc", "7"]).unwrap();
        assert_eq!(cli.resize.scale, 7);
    }

    #[test]
    fn normalize_leaves_other_args_alone() {
        let args: Vec<OsString> = ["resizer", "-s", "-sc.png", "--scale"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(normalize_args(args.clone()), args);
    }

    #[test]
    fn quality_is_range_checked() {
        assert!(parse(&["resizer", "-d", "in", "--quality", "0"]).is_err());
        assert!(parse(&["resizer", "-d", "in", "--quality", "101"]).is_err());
        let cli = parse(&["resizer", "-d", "in", "--quality", "90"]).unwrap();
        assert_eq!(cli.resize.quality, Some(90));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let cli = parse(&["resizer", "-d", "in", "--config", "/no/such/resizer.toml"]).unwrap();
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resizer.toml");
        std::fs::write(&path, "[pipeline]\nbuffer_size = 4\n").unwrap();

        let arg = path.to_string_lossy().into_owned();
        let cli = parse(&["resizer", "-d", "in", "--config", &arg]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.pipeline.buffer_size, 4);
        assert_eq!(config.pipeline.resize_workers, 1);
    }
}
