#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build orchestration for wbx projects
//!
//! The [`BuildController`] drives one build at a time through dependency
//! resolution, target verification, sequential compilation and a concurrent
//! post-processing fan-out. External tools run through per-tool process
//! queues, incremental skips go through the rebuild gate, and an abort
//! request stops new work and kills running tools.

mod clean;
mod collaborators;
mod context;
mod outcome;
mod phase;
mod phases;
mod pipeline;
mod queues;
mod walk;

pub use collaborators::{
    parse_dump_package, CommandManifestSource, DependencyResolver, ManifestSource,
    ResolveReport, TargetProvider, ToolchainResolver, ToolchainTargets,
};
pub use context::PhaseContext;
pub use outcome::{BuildOutcome, ControllerState, PhaseOutcome};
pub use phase::{Phase, PhaseStatus};
pub use pipeline::BuildController;
pub use queues::ToolQueues;
