#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the wbx build engine
//!
//! This crate provides the small vocabulary shared by every other crate:
//! build variants, requests, the abort handle, target sets, phase kinds
//! and the description of the managed entry document.

pub mod abort;
pub mod document;
pub mod phase;
pub mod request;
pub mod targets;

pub use abort::AbortHandler;
pub use document::{AttrValue, Attributes, DocumentSpec, SplashSpec};
pub use phase::{BuildStage, PhaseKind};
pub use request::BuildRequest;
pub use targets::TargetSet;

use serde::{Deserialize, Serialize};

/// Compilation variant of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    #[default]
    Debug,
    Release,
}

impl BuildVariant {
    /// Name passed to the compiler's `-c` flag and used for build sub-folders
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    /// Mode understood by the bundler
    #[must_use]
    pub fn bundler_mode(self) -> &'static str {
        match self {
            Self::Debug => "development",
            Self::Release => "production",
        }
    }

    /// Suffix of the variant-specific attributes in web documents (`srcDev`, `hrefProd`)
    #[must_use]
    pub fn attribute_suffix(self) -> &'static str {
        match self {
            Self::Debug => "Dev",
            Self::Release => "Prod",
        }
    }

    #[must_use]
    pub fn is_release(self) -> bool {
        matches!(self, Self::Release)
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debug => Self::Release,
            Self::Release => Self::Debug,
        }
    }
}

impl std::fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `wbx clean` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CleanScope {
    /// Compiler build folder
    Build,
    /// Public output folders
    Output,
    #[default]
    All,
}

impl clap::ValueEnum for CleanScope {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Build, Self::Output, Self::All]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Build => clap::builder::PossibleValue::new("build"),
            Self::Output => clap::builder::PossibleValue::new("output"),
            Self::All => clap::builder::PossibleValue::new("all"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names() {
        assert_eq!(BuildVariant::Debug.to_string(), "debug");
        assert_eq!(BuildVariant::Release.bundler_mode(), "production");
        assert_eq!(BuildVariant::Release.attribute_suffix(), "Prod");
        let parsed: BuildVariant = serde_json::from_str("\"release\"").unwrap();
        assert!(parsed.is_release());
    }
}
