// src/system/progress.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Creates the spinner shown while a command's output is being buffered.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Shortens an output line so the spinner stays on a single terminal row.
pub fn spinner_line(label: &str, latest: &str) -> String {
    const MAX_CHARS: usize = 72;
    let latest = latest.trim();
    if latest.chars().count() <= MAX_CHARS {
        return format!("{} {}", label, latest);
    }
    let tail: String = latest
        .chars()
        .rev()
        .take(MAX_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{} ...{}", label, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_are_kept() {
        assert_eq!(spinner_line("pip", "  Collecting build "), "pip Collecting build");
    }

    #[test]
    fn long_lines_keep_their_tail() {
        let long = "x".repeat(100) + "END";
        let line = spinner_line("pip", &long);
        assert!(line.starts_with("pip ..."));
        assert!(line.ends_with("END"));
        assert_eq!(line.chars().count(), "pip ...".len() + 72);
    }
}
