#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Managed-region merging of the entry HTML document
//!
//! Generated lines carry a marker attribute. Merging replaces marked lines
//! with fresh fragments, one family at a time, and leaves every other line
//! where the author put it. Merging a document twice with the same fragments
//! yields the same bytes.

mod file;
mod fragments;
mod line;
mod merge;
mod variant;

pub use file::{merge_document, publish_document};
pub use fragments::{Fragments, DEFAULT_SPLASH_STYLE};
pub use merge::{merge, MergeOutcome, MergeReport};
pub use variant::{resolve_variant_attributes, strip_managed};
