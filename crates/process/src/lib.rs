#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cancellable FIFO queues for external tool invocations
//!
//! Every tool family (compiler, npm, bundler, compressors) gets its own
//! [`ProcessQueue`]. Commands in one queue run strictly one after another in
//! enqueue order; a failing command never stalls the queue. Cancelling a
//! queue kills the running process and resolves every pending command with
//! an unsuccessful, never-started [`ProcessResult`].

mod command;
mod env;
mod queue;
mod result;

pub use command::QueuedCommand;
pub use env::{parse_profile_exports, EnvSnapshot};
pub use queue::ProcessQueue;
pub use result::ProcessResult;
