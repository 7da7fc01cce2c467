//! Reading, merging and publishing documents on disk

use std::io::ErrorKind;
use std::path::Path;
use wbx_errors::DocumentError;
use wbx_types::BuildVariant;

use crate::{merge, resolve_variant_attributes, strip_managed, Fragments, MergeReport};

/// Merge `fragments` into the document at `path`, generating it when absent.
/// The file is written only when the merged text differs.
///
/// # Errors
///
/// Returns a [`DocumentError`] if the document cannot be read, is not UTF-8,
/// or cannot be written.
pub async fn merge_document(
    path: &Path,
    fragments: &Fragments,
) -> Result<MergeReport, DocumentError> {
    let existing = read_optional(path).await?;
    let outcome = merge(existing.as_deref(), fragments);
    if outcome.report.changed {
        write(path, &outcome.text).await?;
    }
    Ok(outcome.report)
}

/// Copy a web document into the output folder with variant attributes
/// resolved. `entry` marks the managed entry document, whose copy also loses
/// its marker attributes.
///
/// # Errors
///
/// Returns a [`DocumentError`] if the source cannot be read or the copy
/// cannot be written.
pub async fn publish_document(
    source: &Path,
    destination: &Path,
    variant: BuildVariant,
    marker: &str,
    entry: bool,
) -> Result<(), DocumentError> {
    let Some(text) = read_optional(source).await? else {
        return Err(DocumentError::ReadFailed {
            path: source.display().to_string(),
            message: "file not found".to_string(),
        });
    };
    let mut resolved = resolve_variant_attributes(&text, variant, marker);
    if entry {
        resolved = strip_managed(&resolved, marker);
    }
    write(destination, &resolved).await
}

async fn read_optional(path: &Path) -> Result<Option<String>, DocumentError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| DocumentError::InvalidEncoding {
                path: path.display().to_string(),
            }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DocumentError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

async fn write(path: &Path, text: &str) -> Result<(), DocumentError> {
    let failed = |e: std::io::Error| DocumentError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(failed)?;
    }
    tokio::fs::write(path, text).await.map_err(failed)
}
