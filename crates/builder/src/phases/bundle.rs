use async_trait::async_trait;
use wbx_errors::Error;
use wbx_process::QueuedCommand;
use wbx_types::PhaseKind;

use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Bundles the JS layer of one target into the output folder.
///
/// Always runs: the bundler keeps its own cache and the output folder may
/// have been cleaned since the last build.
pub(crate) struct BundlePhase {
    target: String,
}

impl BundlePhase {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    fn command(&self, ctx: &PhaseContext) -> Result<QueuedCommand, Error> {
        let mode = ctx.variant().bundler_mode();
        let is_service_worker = ctx.targets()?.has_service_worker(&self.target);

        let mut command = QueuedCommand::new(&ctx.config().tools.bundler)
            .args(["build", "--define-process-env-node-env", mode, "--env", mode])
            .arg("--env")
            .arg(format!("app.target={}", self.target))
            .arg("--env")
            .arg(format!(
                "app.absoluteOutputPath={}",
                ctx.output_dir().display()
            ));
        if is_service_worker {
            command = command.args(["--env", "app.isServiceWorker=true"]);
        }
        Ok(command
            .current_dir(&ctx.paths().web_sources)
            .label(self.label()))
    }
}

#[async_trait]
impl Phase for BundlePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Bundle
    }

    fn label(&self) -> String {
        format!("bundle {}", self.target)
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let command = self.command(ctx)?;
        ctx.queues().bundler.run_checked(command).await?;
        ctx.ensure_active()?;
        Ok(PhaseStatus::Completed)
    }
}
