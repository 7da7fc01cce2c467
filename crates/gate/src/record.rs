use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

use crate::{ArtifactKind, ModificationSignal};

static GLOBAL: OnceLock<Arc<ModificationRecord>> = OnceLock::new();

/// Signals recorded at the last successful build of each artifact kind
#[derive(Debug, Default)]
pub struct ModificationRecord {
    entries: DashMap<ArtifactKind, ModificationSignal>,
}

impl ModificationRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record shared by every gate in this process
    pub fn global() -> Arc<Self> {
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    #[must_use]
    pub fn get(&self, kind: &ArtifactKind) -> Option<ModificationSignal> {
        self.entries.get(kind).map(|entry| entry.value().clone())
    }

    pub fn set(&self, kind: ArtifactKind, signal: ModificationSignal) {
        self.entries.insert(kind, signal);
    }

    pub fn remove(&self, kind: &ArtifactKind) {
        self.entries.remove(kind);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
