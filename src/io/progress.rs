//! Stage-by-stage progress bars for tile placement and frame processing

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix:>10}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates one progress bar per processing stage
///
/// Each stage (tiles, extraction, rendering, saving) gets its own bar stacked
/// below the previous ones. A hidden manager hands out bars that draw nothing,
/// so callers never need to branch on quiet mode.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    stages: Vec<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Manager drawing to the terminal
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            stages: Vec::new(),
        }
    }

    /// Manager whose bars are never drawn
    pub fn hidden() -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            stages: Vec::new(),
        }
    }

    /// Add a bar for a stage of `total` units labelled `label`
    pub fn start_stage(&mut self, label: &str, total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(label.to_string());
        let bar = self.multi_progress.add(bar);
        self.stages.push(bar.clone());
        bar
    }

    /// Number of stages started so far
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Mark every stage as finished and clear the display
    pub fn finish(&self) {
        for bar in &self.stages {
            bar.finish_with_message("✓");
        }
        let _ = self.multi_progress.clear();
    }
}
