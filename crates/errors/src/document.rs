//! Managed document error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("failed to read document {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("failed to write document {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("document {path} is not valid UTF-8")]
    InvalidEncoding { path: String },

    #[error("invalid splash configuration: {message}")]
    InvalidSplash { message: String },
}

impl UserFacingError for DocumentError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEncoding { .. } => Some("Save the document as UTF-8 and rebuild."),
            Self::InvalidSplash { .. } => {
                Some("Set either `path` or `body` in the [document.splash] section.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ReadFailed { .. } => "document.read_failed",
            Self::WriteFailed { .. } => "document.write_failed",
            Self::InvalidEncoding { .. } => "document.invalid_encoding",
            Self::InvalidSplash { .. } => "document.invalid_splash",
        };
        Some(code)
    }
}
