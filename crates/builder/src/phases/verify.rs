use async_trait::async_trait;
use std::sync::Arc;
use wbx_config::ProjectConfig;
use wbx_errors::{BuildError, Error};
use wbx_types::{PhaseKind, TargetSet};

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Loads the project's targets and checks the ones the build depends on
pub(crate) struct VerifyTargetsPhase;

#[async_trait]
impl Phase for VerifyTargetsPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::VerifyTargets
    }

    fn label(&self) -> String {
        "verify targets".to_string()
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let provider = Arc::clone(&ctx.collaborators().targets);
        let targets = provider.targets(ctx).await?;
        ctx.ensure_active()?;

        verify(&targets, &ctx.config().project, ctx.request().target.as_deref())?;
        ctx.set_targets(targets);
        Ok(PhaseStatus::Completed)
    }
}

fn verify(
    targets: &TargetSet,
    project: &ProjectConfig,
    requested: Option<&str>,
) -> Result<(), BuildError> {
    let missing = |name: &str| BuildError::MissingTarget {
        name: name.to_string(),
    };

    if targets.is_empty() {
        return Err(BuildError::NoTargets);
    }
    if !targets.has_executable(&project.app_target) {
        return Err(missing(&project.app_target));
    }
    // A project with service workers is a PWA and needs the configured one
    if !targets.service_workers.is_empty()
        && !targets.has_executable(&project.service_worker_target)
    {
        return Err(missing(&project.service_worker_target));
    }
    match requested {
        Some(name) if !targets.has_executable(name) => Err(missing(name)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(executables: &[&str], service_workers: &[&str]) -> TargetSet {
        TargetSet {
            executables: executables.iter().map(ToString::to_string).collect(),
            service_workers: service_workers.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn app_target_is_required() {
        let project = ProjectConfig::default();
        assert!(matches!(
            verify(&TargetSet::default(), &project, None),
            Err(BuildError::NoTargets)
        ));
        assert!(matches!(
            verify(&set(&["Other"], &[]), &project, None),
            Err(BuildError::MissingTarget { name }) if name == "App"
        ));
        assert!(verify(&set(&["App"], &[]), &project, None).is_ok());
    }

    #[test]
    fn pwa_needs_the_configured_service_worker() {
        let project = ProjectConfig::default();
        assert!(matches!(
            verify(&set(&["App", "Worker"], &["Worker"]), &project, None),
            Err(BuildError::MissingTarget { name }) if name == "Service"
        ));
        assert!(verify(&set(&["App", "Service"], &["Service"]), &project, None).is_ok());
    }

    #[test]
    fn requested_target_must_exist() {
        let project = ProjectConfig::default();
        let targets = set(&["App"], &[]);
        assert!(verify(&targets, &project, Some("App")).is_ok());
        assert!(matches!(
            verify(&targets, &project, Some("Admin")),
            Err(BuildError::MissingTarget { name }) if name == "Admin"
        ));
    }
}
