//! Progress rendering and output formatting for the geoport CLI.

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const PREFIX_WIDTH: usize = 24;

/// Creates the progress bar container, hidden in quiet mode.
pub(crate) fn multi_progress(quiet: bool) -> MultiProgress {
    if quiet {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    } else {
        MultiProgress::new()
    }
}

/// Adds a 0-100 progress bar for one export job.
pub(crate) fn job_bar(multi: &MultiProgress, layer: &str) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(100));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:30.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix(layer));
    pb.set_message("Queued");
    Ok(pb)
}

/// Pads or shortens a layer name to a fixed-width column.
fn prefix(layer: &str) -> String {
    let count = layer.chars().count();
    if count <= PREFIX_WIDTH {
        format!("{layer:>PREFIX_WIDTH$}")
    } else {
        let tail: String = layer.chars().skip(count - (PREFIX_WIDTH - 3)).collect();
        format!("...{tail}")
    }
}

/// Formats a byte count in human-readable form (e.g., "1.50 MB").
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
