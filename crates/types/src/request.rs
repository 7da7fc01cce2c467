//! Build request definition

use crate::{AbortHandler, BuildVariant};

/// Immutable description of one build run
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Restrict compilation and bundling to this executable target
    pub target: Option<String>,
    pub variant: BuildVariant,
    /// Bypass the incremental rebuild gate
    pub force: bool,
    pub abort: AbortHandler,
}

impl BuildRequest {
    #[must_use]
    pub fn new(variant: BuildVariant) -> Self {
        Self {
            target: None,
            variant,
            force: false,
            abort: AbortHandler::new(),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_abort(mut self, abort: AbortHandler) -> Self {
        self.abort = abort;
        self
    }
}
