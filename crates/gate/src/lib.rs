#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Incremental rebuild decisions
//!
//! The gate answers one question per artifact kind: can the work producing
//! this artifact be skipped? It can when the modification signal of the
//! governing input equals the one recorded at the last successful build of
//! that kind and the artifact is still on disk. Records are only written
//! after success and live for the lifetime of the process.

mod gate;
mod kind;
mod record;
mod signal;

pub use gate::{GateRule, RebuildGate};
pub use kind::ArtifactKind;
pub use record::ModificationRecord;
pub use signal::{matches_extension, newest_modification, ModificationSignal, SignalSource};
