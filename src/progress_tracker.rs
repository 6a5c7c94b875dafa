use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress over the anatomical image list.
pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(len: usize) -> Self {
        let progress_bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);

        Self { progress_bar }
    }

    /// Tracker that never draws, for tests and non-interactive runs.
    pub fn hidden(len: usize) -> Self {
        let tracker = Self::new(len);
        tracker
            .progress_bar
            .set_draw_target(ProgressDrawTarget::hidden());
        tracker
    }

    pub fn start(&self, image: &str) {
        self.progress_bar.set_message(image.to_string());
    }

    pub fn advance(&self) {
        self.progress_bar.inc(1);
    }

    /// Runs `f` with the bar cleared so log lines do not tear it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }
}
