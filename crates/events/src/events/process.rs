use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External process queue events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessEvent {
    CommandQueued {
        queue: String,
        label: String,
        pending: usize,
    },

    CommandStarted {
        queue: String,
        label: String,
        program: String,
        args: Vec<String>,
        working_dir: Option<PathBuf>,
    },

    CommandCompleted {
        queue: String,
        label: String,
        exit_code: Option<i32>,
        duration: Duration,
    },

    /// A command was terminated or discarded by a queue cancellation
    CommandCancelled {
        queue: String,
        label: String,
        started: bool,
    },

    QueueCancelled { queue: String, discarded: usize },
}
