//! Progress bar and status line.
//!
//! The pipeline owns the counters; this type only renders them.

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::MigrationStats;

/// Renders migration progress on stderr.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Creates a visible progress bar. The length is set once the catalog
    /// has been counted.
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Creates a progress bar that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Sets the number of files expected.
    pub fn set_total(&self, files: u64) {
        self.bar.set_length(files);
    }

    /// Updates position and counters from `stats`.
    pub fn update(&self, stats: &MigrationStats) {
        self.bar.set_position(stats.files);
        self.bar.set_message(status_line(stats));
    }

    /// Marks the bar complete.
    pub fn finish(&self, stats: &MigrationStats) {
        self.bar.finish_with_message(status_line(stats));
    }

    /// Leaves the bar as is, for interrupted or failed runs.
    pub fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

/// One-line summary of the counters shown next to the bar.
pub fn status_line(stats: &MigrationStats) -> String {
    format!(
        "repos {}/{} | uploaded {} | duplicates {} | skipped {} | failed {}",
        stats.repositories,
        stats.repositories_total,
        stats.uploaded,
        stats.duplicates,
        stats.skipped(),
        stats.failed
    )
}
