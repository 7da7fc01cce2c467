//! Per-run state shared by every phase

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use wbx_config::constants::MANIFEST_EXTENSION;
use wbx_config::{Config, ProjectPaths};
use wbx_errors::{BuildError, Error};
use wbx_events::{AppEvent, BuildEvent, EventEmitter, EventMeta, EventSender};
use wbx_gate::RebuildGate;
use wbx_types::{AbortHandler, BuildRequest, BuildVariant, TargetSet};

use crate::collaborators::Collaborators;
use crate::queues::ToolQueues;

/// Everything a phase needs for one build: the immutable request, the
/// project configuration, this run's tool queues and the rebuild gate.
#[derive(Debug)]
pub struct PhaseContext {
    session_id: String,
    request: BuildRequest,
    config: Arc<Config>,
    paths: Arc<ProjectPaths>,
    queues: ToolQueues,
    gate: Arc<RebuildGate>,
    events: Option<EventSender>,
    collaborators: Collaborators,
    targets: OnceLock<TargetSet>,
    skipped: Mutex<Vec<String>>,
}

impl PhaseContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        session_id: String,
        request: BuildRequest,
        config: Arc<Config>,
        paths: Arc<ProjectPaths>,
        queues: ToolQueues,
        gate: Arc<RebuildGate>,
        events: Option<EventSender>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            session_id,
            request,
            config,
            paths,
            queues,
            gate,
            events,
            collaborators,
            targets: OnceLock::new(),
            skipped: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    #[must_use]
    pub fn variant(&self) -> BuildVariant {
        self.request.variant
    }

    #[must_use]
    pub fn force(&self) -> bool {
        self.request.force
    }

    #[must_use]
    pub fn abort(&self) -> &AbortHandler {
        &self.request.abort
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
    pub fn queues(&self) -> &ToolQueues {
        &self.queues
    }

    #[must_use]
    pub fn gate(&self) -> &RebuildGate {
        &self.gate
    }

    pub(crate) fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Output folder of the requested variant
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.paths.output(self.variant())
    }

    /// Compiler output folder of the requested variant
    #[must_use]
    pub fn compiled_dir(&self) -> PathBuf {
        self.paths.compiled(self.variant())
    }

    /// Fail with [`Error::Cancelled`] once the build was aborted
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the abort handler was signalled.
    pub fn ensure_active(&self) -> Result<(), Error> {
        if self.request.abort.is_aborted() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Targets found during verification
    ///
    /// # Errors
    ///
    /// Returns an error if targets have not been verified in this run.
    pub fn targets(&self) -> Result<&TargetSet, Error> {
        self.targets
            .get()
            .ok_or_else(|| Error::internal("targets requested before verification"))
    }

    pub(crate) fn set_targets(&self, targets: TargetSet) {
        let _ = self.targets.set(targets);
    }

    /// The project ships a service worker, so it gets a web manifest
    #[must_use]
    pub fn is_pwa(&self) -> bool {
        self.targets
            .get()
            .is_some_and(|targets| !targets.service_workers.is_empty())
    }

    /// Executable targets this run compiles and bundles
    ///
    /// # Errors
    ///
    /// Returns an error if targets are not verified yet or the requested
    /// target does not exist.
    pub fn selected_targets(&self) -> Result<Vec<String>, Error> {
        let targets = self.targets()?;
        match &self.request.target {
            Some(name) if targets.has_executable(name) => Ok(vec![name.clone()]),
            Some(name) => Err(BuildError::MissingTarget { name: name.clone() }.into()),
            None => Ok(targets.executables.clone()),
        }
    }

    /// File name of the web manifest in the output folder
    #[must_use]
    pub fn manifest_file_name(&self) -> String {
        format!("{}.{MANIFEST_EXTENSION}", self.config.manifest.file_name)
    }

    pub(crate) fn mark_skipped(&self, label: &str) {
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push(label.to_string());
        }
    }

    pub(crate) fn skipped(&self) -> Vec<String> {
        self.skipped
            .lock()
            .map(|skipped| skipped.clone())
            .unwrap_or_default()
    }

    pub(crate) fn emit_build(&self, event: BuildEvent) {
        self.emit(AppEvent::Build(event));
    }
}

impl EventEmitter for PhaseContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.session_id = Some(self.session_id.clone());
    }
}
