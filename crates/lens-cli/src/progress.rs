use std::sync::OnceLock;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Optional progress bar; a no-op handle when quiet mode is on.
#[derive(Clone)]
pub struct Progress {
    bar: Option<ProgressBar>,
}

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

impl Progress {
    #[must_use]
    pub fn bar(total: u64, message: &str, quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    #[must_use]
    pub const fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}
