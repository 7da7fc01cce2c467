//! External process execution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ProcessError {
    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("failed to collect output of {program}: {message}")]
    OutputFailed { program: String, message: String },

    #[error("queue {queue} was cancelled")]
    QueueCancelled { queue: String },
}

impl UserFacingError for ProcessError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandNotFound { .. } | Self::SpawnFailed { .. } => Some(
                "Install the tool or point the matching [tools] entry in wbx.toml at its path.",
            ),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::SpawnFailed { .. } => "process.spawn_failed",
            Self::CommandNotFound { .. } => "process.command_not_found",
            Self::OutputFailed { .. } => "process.output_failed",
            Self::QueueCancelled { .. } => "process.queue_cancelled",
        };
        Some(code)
    }
}
