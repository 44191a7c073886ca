//! Logging initialization.
//!
//! Log output always goes to stderr; stdout is reserved for the `--json`
//! report. `RUST_LOG` takes precedence over both the config and `-v`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pick the default filter directive.
///
/// `-v` forces at least `debug`; otherwise the configured level is used,
/// falling back to `info` when it is not a recognised level.
fn default_directive(level: &str, verbose: bool) -> &'static str {
    match (level.to_ascii_lowercase().as_str(), verbose) {
        ("trace", _) => "trace",
        (_, true) | ("debug", _) => "debug",
        ("warn", _) => "warn",
        ("error", _) => "error",
        _ => "info",
    }
}

/// Install the global subscriber.
pub fn init(directive: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section plus CLI overrides.
pub fn init_from_config(
    config: &resizer_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let directive = default_directive(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(directive, json_format);
}
