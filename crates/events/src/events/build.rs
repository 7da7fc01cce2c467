use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wbx_types::{BuildStage, BuildVariant, PhaseKind};

use super::FailureContext;

/// Build pipeline events for the event system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Build session started
    Started {
        session_id: String,
        variant: BuildVariant,
        target: Option<String>,
        force: bool,
    },

    /// A build request arrived while another one was in flight
    Rejected { reason: String },

    /// The running build moved to another stage
    StageChanged {
        session_id: String,
        stage: BuildStage,
    },

    PhaseStarted {
        session_id: String,
        phase: PhaseKind,
        label: String,
    },

    /// The incremental gate found the phase's output up to date
    PhaseSkipped {
        session_id: String,
        phase: PhaseKind,
        label: String,
        reason: String,
    },

    PhaseCompleted {
        session_id: String,
        phase: PhaseKind,
        label: String,
        duration: Duration,
    },

    PhaseFailed {
        session_id: String,
        phase: PhaseKind,
        label: String,
        failure: FailureContext,
    },

    PhaseAborted {
        session_id: String,
        phase: PhaseKind,
        label: String,
    },

    /// A flaky step is being attempted again
    Retrying {
        session_id: String,
        step: String,
        attempt: usize,
        max_attempts: usize,
        reason: String,
    },

    /// A compressed sibling of an output asset was produced
    AssetCompressed {
        session_id: String,
        path: PathBuf,
        format: String,
        original_bytes: u64,
        compressed_bytes: u64,
    },

    /// Build completed successfully
    Completed {
        session_id: String,
        variant: BuildVariant,
        output_dir: PathBuf,
        duration: Duration,
        skipped: Vec<String>,
    },

    /// Build failed
    Failed {
        session_id: String,
        failure: FailureContext,
        phase: Option<PhaseKind>,
    },

    /// Build stopped by an abort request
    Aborted { session_id: String },

    /// Cached state removed by `clean`
    Cleaned { paths: Vec<PathBuf> },
}
