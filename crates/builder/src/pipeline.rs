//! The build controller: one build at a time, phases in order, then a
//! concurrent post-processing fan-out

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use uuid::Uuid;
use wbx_config::{Config, ProjectPaths};
use wbx_errors::{BuildError, Error};
use wbx_events::{AppEvent, BuildEvent, EventEmitter, EventSender, FailureContext};
use wbx_gate::RebuildGate;
use wbx_process::EnvSnapshot;
use wbx_types::{BuildRequest, BuildStage, CleanScope, PhaseKind};

use crate::clean::{clean_targets, remove_all};
use crate::collaborators::{Collaborators, DependencyResolver, ManifestSource, TargetProvider};
use crate::context::PhaseContext;
use crate::outcome::{BuildOutcome, ControllerState, PhaseOutcome};
use crate::phase::{run_phase, Phase};
use crate::phases::{
    BundlePhase, CompilePhase, CompressionPhase, DocumentPhase, ManifestPhase, ResolvePhase,
    ResourcesPhase, RuntimePackagePhase, StylesheetPhase, VerifyTargetsPhase,
};
use crate::queues::ToolQueues;

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Full,
    /// Target verification and the document phase only
    DocumentOnly,
}

/// Why a run stopped early
enum Halt {
    Failed {
        error: Error,
        phase: Option<PhaseKind>,
    },
    Aborted,
}

/// Drives build requests through the phase pipeline.
///
/// At most one build runs at a time; a request arriving while another is in
/// flight returns [`BuildOutcome::AlreadyRunning`] without touching any
/// state. Each run gets its own tool queues, which an abort cancels.
pub struct BuildController {
    config: Arc<Config>,
    paths: Arc<ProjectPaths>,
    gate: Arc<RebuildGate>,
    env: Arc<EnvSnapshot>,
    events: Option<EventSender>,
    collaborators: Collaborators,
    running: AtomicBool,
    state: Mutex<ControllerState>,
}

impl BuildController {
    /// Create a controller for the project at `project_root`
    #[must_use]
    pub fn new(config: Config, project_root: &Path) -> Self {
        let paths = config.paths(project_root);
        Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            gate: Arc::new(RebuildGate::with_global_record()),
            env: EnvSnapshot::global(),
            events: None,
            collaborators: Collaborators::default(),
            running: AtomicBool::new(false),
            state: Mutex::new(ControllerState::Idle),
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Use a separate rebuild gate instead of the process-wide one
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<RebuildGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Inherited environment for every tool invocation
    #[must_use]
    pub fn with_env(mut self, env: Arc<EnvSnapshot>) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.collaborators.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_target_provider(mut self, provider: Arc<dyn TargetProvider>) -> Self {
        self.collaborators.targets = provider;
        self
    }

    #[must_use]
    pub fn with_manifest_source(mut self, source: Arc<dyn ManifestSource>) -> Self {
        self.collaborators.manifest = source;
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<RebuildGate> {
        &self.gate
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run a full build
    pub async fn start(&self, request: BuildRequest) -> BuildOutcome {
        self.execute(request, Plan::Full).await
    }

    /// Merge the managed regions into the entry document and publish the web
    /// documents, without compiling
    pub async fn merge(&self, request: BuildRequest) -> BuildOutcome {
        self.execute(request, Plan::DocumentOnly).await
    }

    /// Remove cached build state and outputs.
    ///
    /// Clearing the build folder also drops every rebuild record.
    ///
    /// # Errors
    ///
    /// Returns an error if a build is running or a folder cannot be removed.
    pub async fn clean(&self, scope: CleanScope) -> Result<Vec<PathBuf>, Error> {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            let reason = "cannot clean while a build is running".to_string();
            self.emit(AppEvent::Build(BuildEvent::Rejected {
                reason: reason.clone(),
            }));
            return Err(BuildError::Failed { message: reason }.into());
        };

        if matches!(scope, CleanScope::Build | CleanScope::All) {
            self.gate.clear();
        }
        let removed = remove_all(clean_targets(&self.paths, scope)).await?;
        self.emit(AppEvent::Build(BuildEvent::Cleaned {
            paths: removed.clone(),
        }));
        Ok(removed)
    }

    async fn execute(&self, request: BuildRequest, plan: Plan) -> BuildOutcome {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            self.emit(AppEvent::Build(BuildEvent::Rejected {
                reason: "a build is already running".to_string(),
            }));
            return BuildOutcome::AlreadyRunning;
        };

        let session_id = Uuid::new_v4().to_string();
        let queues = ToolQueues::new(&self.env, self.events.as_ref());
        let cancel = queues.clone();
        request.abort.on_abort(move || cancel.cancel_all());

        let ctx = PhaseContext::new(
            session_id.clone(),
            request,
            Arc::clone(&self.config),
            Arc::clone(&self.paths),
            queues,
            Arc::clone(&self.gate),
            self.events.clone(),
            self.collaborators.clone(),
        );
        ctx.emit_build(BuildEvent::Started {
            session_id: session_id.clone(),
            variant: ctx.variant(),
            target: ctx.request().target.clone(),
            force: ctx.force(),
        });
        let started = Instant::now();

        let halted = self.drive(&ctx, plan).await;
        let aborted = ctx.abort().is_aborted();
        match halted {
            Ok(()) if !aborted => {
                let duration = started.elapsed();
                let skipped = ctx.skipped();
                self.set_state(ControllerState::Succeeded);
                ctx.emit_build(BuildEvent::Completed {
                    session_id,
                    variant: ctx.variant(),
                    output_dir: ctx.output_dir().to_path_buf(),
                    duration,
                    skipped: skipped.clone(),
                });
                BuildOutcome::Succeeded { duration, skipped }
            }
            Err(Halt::Failed { error, phase }) if !aborted => {
                self.set_state(ControllerState::Failed);
                ctx.emit_build(BuildEvent::Failed {
                    session_id,
                    failure: FailureContext::from_error(&error),
                    phase,
                });
                BuildOutcome::Failed(error)
            }
            _ => {
                self.set_state(ControllerState::Aborted);
                ctx.emit_build(BuildEvent::Aborted { session_id });
                BuildOutcome::Aborted
            }
        }
    }

    async fn drive(&self, ctx: &PhaseContext, plan: Plan) -> Result<(), Halt> {
        self.enter_stage(ctx, BuildStage::Resolving);
        if plan == Plan::Full {
            sequential(ctx, &ResolvePhase).await?;
        }
        sequential(ctx, &VerifyTargetsPhase).await?;

        if plan == Plan::DocumentOnly {
            self.enter_stage(ctx, BuildStage::PostProcessing);
            return sequential(ctx, &DocumentPhase).await;
        }

        let targets = ctx.selected_targets().map_err(|error| Halt::Failed {
            error,
            phase: Some(PhaseKind::VerifyTargets),
        })?;

        self.enter_stage(ctx, BuildStage::Compiling);
        for target in &targets {
            sequential(ctx, &CompilePhase::new(target.as_str())).await?;
        }
        sequential(ctx, &RuntimePackagePhase).await?;

        self.enter_stage(ctx, BuildStage::PostProcessing);
        let mut post: Vec<Box<dyn Phase>> = targets
            .iter()
            .map(|target| Box::new(BundlePhase::new(target.as_str())) as Box<dyn Phase>)
            .collect();
        post.push(Box::new(ResourcesPhase));
        post.push(Box::new(ManifestPhase));
        post.push(Box::new(DocumentPhase));
        post.push(Box::new(StylesheetPhase));
        concurrent(ctx, &post).await?;

        if ctx.variant().is_release() || self.config.compression.debug {
            sequential(ctx, &CompressionPhase).await?;
        }
        Ok(())
    }

    fn enter_stage(&self, ctx: &PhaseContext, stage: BuildStage) {
        self.set_state(ControllerState::Running(stage));
        ctx.emit_build(BuildEvent::StageChanged {
            session_id: ctx.session_id().to_string(),
            stage,
        });
    }

    fn set_state(&self, state: ControllerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl EventEmitter for BuildController {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl std::fmt::Debug for BuildController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildController")
            .field("root", &self.paths.root)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn sequential(ctx: &PhaseContext, phase: &dyn Phase) -> Result<(), Halt> {
    match run_phase(ctx, phase).await {
        PhaseOutcome::Succeeded | PhaseOutcome::Skipped(_) => Ok(()),
        PhaseOutcome::Failed(error) => Err(Halt::Failed {
            error,
            phase: Some(phase.kind()),
        }),
        PhaseOutcome::Aborted => Err(Halt::Aborted),
    }
}

/// Run every phase to completion. The first failure is the run's failure;
/// later ones are reported as warnings.
async fn concurrent(ctx: &PhaseContext, phases: &[Box<dyn Phase>]) -> Result<(), Halt> {
    let mut running: FuturesUnordered<_> = phases
        .iter()
        .map(|phase| async move {
            let outcome = run_phase(ctx, phase.as_ref()).await;
            (phase.kind(), phase.label(), outcome)
        })
        .collect();

    let mut halt = None;
    while let Some((kind, label, outcome)) = running.next().await {
        match outcome {
            PhaseOutcome::Failed(error) if halt.is_none() => {
                halt = Some(Halt::Failed {
                    error,
                    phase: Some(kind),
                });
            }
            PhaseOutcome::Failed(error) => {
                ctx.emit_warning_with_context(format!("{label} also failed"), error.to_string());
            }
            PhaseOutcome::Aborted if halt.is_none() => halt = Some(Halt::Aborted),
            _ => {}
        }
    }
    halt.map_or(Ok(()), Err)
}

/// Holds the single-build flag for the lifetime of a run
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
