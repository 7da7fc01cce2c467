//! Build pipeline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed: {message}")]
    Failed { message: String },

    #[error("missing dependencies: {}", names.join(", "))]
    MissingDependencies { names: Vec<String> },

    #[error("dependency resolution failed: {message}")]
    ResolveFailed { message: String },

    #[error("missing required target: {name}")]
    MissingTarget { name: String },

    #[error("no executable targets found")]
    NoTargets,

    #[error("{tool} exited with {}: {stderr}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("expected output missing at {path}: {reason}")]
    OutputMissing { path: String, reason: String },

    #[error("version mismatch for {package}: expected {expected}, found {actual}")]
    VersionMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("invalid target description: {message}")]
    InvalidTargetDescription { message: String },

    #[error("manifest generation failed: {message}")]
    ManifestFailed { message: String },

    #[error("compression failed for {path}: {message}")]
    CompressionFailed { path: String, message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingDependencies { .. } | Self::ResolveFailed { .. } => {
                Some("Check network access and the package manifest, then run the build again.")
            }
            Self::MissingTarget { .. } | Self::NoTargets => {
                Some("Declare the target in the package manifest or fix [project] in wbx.toml.")
            }
            Self::OutputMissing { .. } => {
                Some("Run `wbx build --force` to regenerate the missing output.")
            }
            Self::VersionMismatch { .. } => Some(
                "Update the runtime dependency in the web sources' package.json to match the toolchain package.",
            ),
            Self::ToolFailed { .. } => Some("Inspect the tool output above and fix the reported problem."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingDependencies { .. } | Self::ResolveFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "build.failed",
            Self::MissingDependencies { .. } => "build.missing_dependencies",
            Self::ResolveFailed { .. } => "build.resolve_failed",
            Self::MissingTarget { .. } => "build.missing_target",
            Self::NoTargets => "build.no_targets",
            Self::ToolFailed { .. } => "build.tool_failed",
            Self::OutputMissing { .. } => "build.output_missing",
            Self::VersionMismatch { .. } => "build.version_mismatch",
            Self::InvalidTargetDescription { .. } => "build.invalid_target_description",
            Self::ManifestFailed { .. } => "build.manifest_failed",
            Self::CompressionFailed { .. } => "build.compression_failed",
        };
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_renders_exit_code() {
        let err = BuildError::ToolFailed {
            tool: "webpack-cli".into(),
            code: Some(2),
            stderr: "boom".into(),
        };
        assert_eq!(err.to_string(), "webpack-cli exited with code 2: boom");

        let killed = BuildError::ToolFailed {
            tool: "swift".into(),
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("a signal"));
    }

    #[test]
    fn missing_dependencies_are_retryable() {
        let err = BuildError::MissingDependencies {
            names: vec!["JavaScriptKit".into(), "Web".into()],
        };
        assert!(err.is_retryable());
        assert_eq!(err.user_code(), Some("build.missing_dependencies"));
        assert!(err.to_string().ends_with("JavaScriptKit, Web"));
        assert!(!BuildError::NoTargets.is_retryable());
    }
}
