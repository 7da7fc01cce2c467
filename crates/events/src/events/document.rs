use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Managed document events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentEvent {
    /// The entry document did not exist and was generated from scratch
    Generated { path: PathBuf },

    /// Managed regions were merged into an existing document
    Merged {
        path: PathBuf,
        replaced: usize,
        inserted: usize,
        dropped: usize,
        written: bool,
    },

    /// A web document was copied into the output with variant attributes resolved
    VariantResolved {
        source: PathBuf,
        destination: PathBuf,
    },
}
