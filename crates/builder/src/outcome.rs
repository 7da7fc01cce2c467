use std::time::Duration;
use wbx_errors::Error;
use wbx_types::BuildStage;

/// Terminal result of one build request
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Succeeded {
        duration: Duration,
        /// Labels of the phases that found nothing to do
        skipped: Vec<String>,
    },
    Failed(Error),
    Aborted,
    /// Another build was in flight; nothing ran
    AlreadyRunning,
}

impl BuildOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Result of a single phase
#[derive(Debug, Clone)]
pub enum PhaseOutcome {
    Succeeded,
    Skipped(String),
    Failed(Error),
    Aborted,
}

/// Observable state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running(BuildStage),
    Succeeded,
    Failed,
    Aborted,
}

impl ControllerState {
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running(_))
    }
}
