use async_trait::async_trait;
use wbx_errors::{BuildError, Error};
use wbx_gate::{ArtifactKind, GateRule, SignalSource};
use wbx_process::QueuedCommand;
use wbx_types::PhaseKind;

use super::exists;
use crate::context::PhaseContext;
use crate::phase::{Phase, PhaseStatus};

/// Compiles one executable target to a WebAssembly module
pub(crate) struct CompilePhase {
    target: String,
}

impl CompilePhase {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl Phase for CompilePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Compile
    }

    fn label(&self) -> String {
        format!("compile {}", self.target)
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<PhaseStatus, Error> {
        let config = ctx.config();
        let paths = ctx.paths();
        let module = ctx.compiled_dir().join(format!("{}.wasm", self.target));

        let kind = ArtifactKind::compiled(&self.target, ctx.variant());
        ctx.gate().track(
            kind.clone(),
            GateRule::new(
                SignalSource::Tree {
                    root: paths.sources.clone(),
                    extensions: vec!["swift".to_string()],
                },
                &module,
            ),
        );
        if ctx.gate().should_skip(&kind, ctx.force()).await? {
            return Ok(PhaseStatus::Skipped("sources unchanged".to_string()));
        }

        let command = QueuedCommand::new(&config.toolchain.compiler)
            .args(["build", "-c", ctx.variant().as_str(), "--product", self.target.as_str()])
            .arg("--build-path")
            .arg(paths.build_root.to_string_lossy())
            .args(["--triple", config.toolchain.triple.as_str()])
            .args(&config.toolchain.extra_args)
            .current_dir(&paths.root)
            .label(self.label());
        ctx.queues().compiler.run_checked(command).await?;
        ctx.ensure_active()?;

        if !exists(&module).await {
            return Err(BuildError::OutputMissing {
                path: module.display().to_string(),
                reason: "the compiler finished without writing the module".to_string(),
            }
            .into());
        }
        ctx.gate().record_success(&kind).await?;
        Ok(PhaseStatus::Completed)
    }
}
