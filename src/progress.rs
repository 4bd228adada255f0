//! Terminal progress bar for the picon batch.

use indicatif::{ProgressBar as IndicatifProgressBar, ProgressStyle};

pub struct ProgressBar {
    bar: IndicatifProgressBar,
}

impl ProgressBar {
    pub fn new(message: &str, max_value: u64) -> Self {
        let bar = IndicatifProgressBar::new(max_value);
        let style = ProgressStyle::with_template("{msg} {pos}/{len} {percent}% {wide_bar} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        bar.set_message(message.to_string());
        ProgressBar { bar }
    }

    pub fn inc(&self, value: u64) {
        self.bar.inc(value);
    }

    /// Run `f` with the bar hidden so log output is not mangled.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}
