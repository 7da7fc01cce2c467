use async_trait::async_trait;
use std::time::Instant;
use wbx_errors::Error;
use wbx_events::{BuildEvent, FailureContext};
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::outcome::PhaseOutcome;

/// How a phase that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseStatus {
    Completed,
    /// Nothing to do; carries the reason
    Skipped(String),
}

/// One named unit of pipeline work with a single outcome
#[async_trait]
pub trait Phase: Send + Sync {
    fn kind(&self) -> PhaseKind;

    /// Human-readable label, unique within a run
    fn label(&self) -> String;

    /// Run the phase to completion.
    ///
    /// Implementations check [`PhaseContext::ensure_active`] after their own
    /// suspension points and stop writing output once the build is aborted.
    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error>;
}

/// Run one phase, reporting its lifecycle through build events. The abort
/// flag is checked before the phase starts; errors raised after an abort
/// count as an abort rather than a failure.
pub(crate) async fn run_phase(ctx: &PhaseContext, phase: &dyn Phase) -> PhaseOutcome {
    let kind = phase.kind();
    let label = phase.label();
    let session_id = ctx.session_id().to_string();

    if ctx.abort().is_aborted() {
        ctx.emit_build(BuildEvent::PhaseAborted {
            session_id,
            phase: kind,
            label,
        });
        return PhaseOutcome::Aborted;
    }

    ctx.emit_build(BuildEvent::PhaseStarted {
        session_id: session_id.clone(),
        phase: kind,
        label: label.clone(),
    });
    let started = Instant::now();

    match phase.run(ctx).await {
        Ok(_) if ctx.abort().is_aborted() => {
            ctx.emit_build(BuildEvent::PhaseAborted {
                session_id,
                phase: kind,
                label,
            });
            PhaseOutcome::Aborted
        }
        Ok(PhaseStatus::Completed) => {
            ctx.emit_build(BuildEvent::PhaseCompleted {
                session_id,
                phase: kind,
                label,
                duration: started.elapsed(),
            });
            PhaseOutcome::Succeeded
        }
        Ok(PhaseStatus::Skipped(reason)) => {
            ctx.mark_skipped(&label);
            ctx.emit_build(BuildEvent::PhaseSkipped {
                session_id,
                phase: kind,
                label,
                reason: reason.clone(),
            });
            PhaseOutcome::Skipped(reason)
        }
        Err(e) if e.is_cancelled() || ctx.abort().is_aborted() => {
            ctx.emit_build(BuildEvent::PhaseAborted {
                session_id,
                phase: kind,
                label,
            });
            PhaseOutcome::Aborted
        }
        Err(e) => {
            ctx.emit_build(BuildEvent::PhaseFailed {
                session_id,
                phase: kind,
                label,
                failure: FailureContext::from_error(&e),
            });
            PhaseOutcome::Failed(e)
        }
    }
}
