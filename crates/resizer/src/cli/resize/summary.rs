//! Progress reporting and the end-of-run summary.

use indicatif::{ProgressBar, ProgressStyle};
use resizer_core::PipelineReport;

/// Progress bar advanced once per saved image. Hidden when `quiet`.
pub fn create_progress_bar(total: u64, quiet: bool) -> anyhow::Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

pub fn summary_line(report: &PipelineReport) -> String {
    format!("Resized {} image(s)", report.saved)
}

/// Print the summary line and a small table to stderr.
pub fn print_summary(report: &PipelineReport) {
    eprintln!("{}", summary_line(report));
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Found:        {:>8}", report.collected);
    eprintln!("    Saved:        {:>8}", report.saved);
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", report.elapsed_ms as f64 / 1000.0);
    eprintln!("    Rate:         {:>7.1} img/sec", report.rate());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_counts_saved() {
        let report = PipelineReport {
            collected: 3,
            saved: 2,
            ..Default::default()
        };
        assert_eq!(summary_line(&report), "Resized 2 image(s)");
    }

    #[test]
    fn quiet_progress_is_hidden() {
        let pb = create_progress_bar(10, true).unwrap();
        assert!(pb.is_hidden());
    }

    #[test]
    fn progress_tracks_total() {
        let pb = create_progress_bar(5, false).unwrap();
        assert_eq!(pb.length(), Some(5));
        pb.inc(2);
        assert_eq!(pb.position(), 2);
    }
}
