//! Modification signals and where they are read from

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use wbx_errors::Error;
use wbx_hash::Hash;

/// Observed state of an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationSignal {
    Timestamp(SystemTime),
    ContentVersion(String),
}

impl ModificationSignal {
    #[must_use]
    pub fn timestamp(&self) -> Option<SystemTime> {
        match self {
            Self::Timestamp(time) => Some(*time),
            Self::ContentVersion(_) => None,
        }
    }
}

/// Governing input of an artifact kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalSource {
    /// Modification time of one file
    File(PathBuf),
    /// Newest modification time of files under `root` with one of `extensions`
    /// (all files when empty)
    Tree {
        root: PathBuf,
        extensions: Vec<String>,
    },
    /// BLAKE3 digest over the listed files
    Content(Vec<PathBuf>),
    /// Version string supplied by the caller
    Version(String),
}

impl SignalSource {
    /// Read the current signal. `None` means the input cannot be observed
    /// (missing file, empty tree), in which case the gate never skips.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing input cannot be read.
    pub async fn observe(&self) -> Result<Option<ModificationSignal>, Error> {
        match self {
            Self::File(path) => Ok(modified(path).await.map(ModificationSignal::Timestamp)),
            Self::Tree { root, extensions } => Ok(newest_modification(root, extensions)
                .await?
                .map(ModificationSignal::Timestamp)),
            Self::Content(paths) => {
                let hash = Hash::hash_files(paths).await?;
                Ok(Some(ModificationSignal::ContentVersion(hash.short())))
            }
            Self::Version(version) => Ok(Some(ModificationSignal::ContentVersion(version.clone()))),
        }
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Newest modification time of matching files below `root`.
///
/// Hidden files and dependency folders are walked too, except `node_modules`.
///
/// # Errors
///
/// Returns an error if the blocking walk task fails.
pub async fn newest_modification(
    root: &Path,
    extensions: &[String],
) -> Result<Option<SystemTime>, Error> {
    let root = root.to_path_buf();
    let extensions = extensions.to_vec();
    tokio::task::spawn_blocking(move || {
        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .build();

        walker
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| matches_extension(entry.path(), &extensions))
            .filter_map(|entry| entry.metadata().ok()?.modified().ok())
            .max()
    })
    .await
    .map_err(|e| Error::internal(format!("modification scan failed: {e}")))
}

/// Whether `path` has one of `extensions`, compared case-insensitively.
/// An empty list matches every path.
#[must_use]
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    extensions.is_empty()
        || path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}
