//! Phase and stage identifiers shared by the pipeline and its events

use serde::{Deserialize, Serialize};

/// Reported sub-state of a running build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Resolving,
    Compiling,
    PostProcessing,
}

/// Kind of a pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Resolve,
    VerifyTargets,
    Compile,
    RuntimePackage,
    Bundle,
    Resources,
    Manifest,
    Document,
    Stylesheet,
    Compression,
}

impl PhaseKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::VerifyTargets => "verify_targets",
            Self::Compile => "compile",
            Self::RuntimePackage => "runtime_package",
            Self::Bundle => "bundle",
            Self::Resources => "resources",
            Self::Manifest => "manifest",
            Self::Document => "document",
            Self::Stylesheet => "stylesheet",
            Self::Compression => "compression",
        }
    }

    #[must_use]
    pub fn stage(self) -> BuildStage {
        match self {
            Self::Resolve | Self::VerifyTargets => BuildStage::Resolving,
            Self::Compile | Self::RuntimePackage => BuildStage::Compiling,
            _ => BuildStage::PostProcessing,
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
