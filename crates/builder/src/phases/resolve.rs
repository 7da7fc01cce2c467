use async_trait::async_trait;
use std::sync::Arc;
use wbx_errors::{BuildError, Error};
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Resolves package dependencies and fails when a required one is missing
pub(crate) struct ResolvePhase;

#[async_trait]
impl Phase for ResolvePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Resolve
    }

    fn label(&self) -> String {
        "resolve dependencies".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let resolver = Arc::clone(&ctx.collaborators().resolver);
        let report = resolver.resolve(ctx, ctx.variant()).await?;
        ctx.ensure_active()?;

        if report.missing.is_empty() {
            Ok(PhaseStatus::Completed)
        } else {
            Err(BuildError::MissingDependencies {
                names: report.missing,
            }
            .into())
        }
    }
}
