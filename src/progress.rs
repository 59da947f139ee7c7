//! Progress indicators for the guardrails CLI.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while waiting on AWS
pub struct Spinner {
    bar: ProgressBar,
    quiet: bool,
}

/// Start a spinner. Nothing is drawn or printed in quiet mode.
pub fn spinner(msg: &str, quiet: bool) -> Spinner {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    };
    bar.set_message(msg.to_string());
    Spinner { bar, quiet }
}

impl Spinner {
    pub fn finish_success(&self, msg: &str) {
        self.bar.finish_and_clear();
        if !self.quiet {
            println!("{} {}", "✓".green(), msg);
        }
    }

    /// Errors are reported by the caller, so only the spinner is cleared
    pub fn finish_error(&self) {
        self.bar.finish_and_clear();
    }
}
