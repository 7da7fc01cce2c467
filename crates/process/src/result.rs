//! Outcome of a queued command

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub label: String,
    /// `None` when the process never started or was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started: bool,
    pub cancelled: bool,
    pub started_at: Option<Instant>,
    pub duration: Duration,
}

impl ProcessResult {
    /// Result of a command discarded before it ever ran
    #[must_use]
    pub fn discarded(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cancelled: true,
            ..Self::default()
        }
    }

    /// Exit code 0 and not cancelled
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.cancelled
    }

    /// Last non-empty stderr lines, falling back to stdout, for error reports
    #[must_use]
    pub fn diagnostics(&self, max_lines: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join("\n")
    }
}
