//! Structured logging integration for events
//!
//! Domain events arriving on the event channel are turned into tracing
//! records with structured fields, so `--json` and `--debug` logs carry the
//! same data as the terminal output.

use wbx_events::{
    AppEvent, BuildEvent, DocumentEvent, EventMessage, GeneralEvent, ProcessEvent,
};
use tracing::{debug, error, info, trace, warn};

/// Log an event using the tracing infrastructure with structured fields
#[allow(clippy::too_many_lines)]
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let source = meta.source.as_str();
    let session = meta.session_id.as_deref().unwrap_or("-");

    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                warn!(source, session, context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source, session, details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message } => debug!(source, session, "{message}"),
        },

        AppEvent::Build(event) => match event {
            BuildEvent::Started {
                session_id,
                variant,
                target,
                force,
            } => {
                info!(
                    source,
                    session = %session_id,
                    variant = %variant,
                    target = ?target,
                    force,
                    "Build started"
                );
            }
            BuildEvent::Rejected { reason } => warn!(source, "Build rejected: {reason}"),
            BuildEvent::StageChanged { session_id, stage } => {
                debug!(source, session = %session_id, stage = ?stage, "Stage changed");
            }
            BuildEvent::PhaseStarted {
                session_id,
                phase,
                label,
            } => {
                debug!(source, session = %session_id, phase = %phase, label = %label, "Phase started");
            }
            BuildEvent::PhaseSkipped {
                session_id,
                phase,
                label,
                reason,
            } => {
                info!(
                    source,
                    session = %session_id,
                    phase = %phase,
                    label = %label,
                    reason = %reason,
                    "Phase skipped"
                );
            }
            BuildEvent::PhaseCompleted {
                session_id,
                phase,
                label,
                duration,
            } => {
                info!(
                    source,
                    session = %session_id,
                    phase = %phase,
                    label = %label,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    "Phase completed"
                );
            }
            BuildEvent::PhaseFailed {
                session_id,
                phase,
                label,
                failure,
            } => {
                error!(
                    source,
                    session = %session_id,
                    phase = %phase,
                    label = %label,
                    code = ?failure.code,
                    retryable = failure.retryable,
                    hint = ?failure.hint,
                    "Phase failed: {}",
                    failure.message
                );
            }
            BuildEvent::PhaseAborted {
                session_id,
                phase,
                label,
            } => {
                info!(source, session = %session_id, phase = %phase, label = %label, "Phase aborted");
            }
            BuildEvent::Retrying {
                session_id,
                step,
                attempt,
                max_attempts,
                reason,
            } => {
                warn!(
                    source,
                    session = %session_id,
                    step = %step,
                    attempt,
                    max_attempts,
                    "Retrying: {reason}"
                );
            }
            BuildEvent::AssetCompressed {
                session_id,
                path,
                format,
                original_bytes,
                compressed_bytes,
            } => {
                debug!(
                    source,
                    session = %session_id,
                    path = %path.display(),
                    format = %format,
                    original_bytes,
                    compressed_bytes,
                    "Asset compressed"
                );
            }
            BuildEvent::Completed {
                session_id,
                variant,
                output_dir,
                duration,
                skipped,
            } => {
                info!(
                    source,
                    session = %session_id,
                    variant = %variant,
                    output = %output_dir.display(),
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    skipped = skipped.len(),
                    "Build succeeded"
                );
            }
            BuildEvent::Failed {
                session_id,
                failure,
                phase,
            } => {
                error!(
                    source,
                    session = %session_id,
                    phase = ?phase,
                    code = ?failure.code,
                    retryable = failure.retryable,
                    "Build failed: {}",
                    failure.message
                );
            }
            BuildEvent::Aborted { session_id } => {
                warn!(source, session = %session_id, "Build aborted");
            }
            BuildEvent::Cleaned { paths } => {
                info!(source, removed = paths.len(), "Cleaned build state");
            }
        },

        AppEvent::Process(event) => match event {
            ProcessEvent::CommandQueued {
                queue,
                label,
                pending,
            } => {
                trace!(source, session, queue = %queue, label = %label, pending, "Command queued");
            }
            ProcessEvent::CommandStarted {
                queue,
                label,
                program,
                args,
                working_dir,
            } => {
                debug!(
                    source,
                    session,
                    queue = %queue,
                    label = %label,
                    program = %program,
                    args = ?args,
                    cwd = ?working_dir,
                    "Command started"
                );
            }
            ProcessEvent::CommandCompleted {
                queue,
                label,
                exit_code,
                duration,
            } => {
                debug!(
                    source,
                    session,
                    queue = %queue,
                    label = %label,
                    exit_code = ?exit_code,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    "Command completed"
                );
            }
            ProcessEvent::CommandCancelled {
                queue,
                label,
                started,
            } => {
                info!(source, session, queue = %queue, label = %label, started, "Command cancelled");
            }
            ProcessEvent::QueueCancelled { queue, discarded } => {
                debug!(source, session, queue = %queue, discarded, "Queue cancelled");
            }
        },

        AppEvent::Document(event) => match event {
            DocumentEvent::Generated { path } => {
                info!(source, session, path = %path.display(), "Entry document generated");
            }
            DocumentEvent::Merged {
                path,
                replaced,
                inserted,
                dropped,
                written,
            } => {
                info!(
                    source,
                    session,
                    path = %path.display(),
                    replaced,
                    inserted,
                    dropped,
                    written,
                    "Entry document merged"
                );
            }
            DocumentEvent::VariantResolved {
                source: from,
                destination,
            } => {
                debug!(
                    source,
                    session,
                    from = %from.display(),
                    to = %destination.display(),
                    "Document published"
                );
            }
        },
    }
}
