//! Executable targets reported by the package description

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet {
    pub executables: Vec<String>,
    pub service_workers: Vec<String>,
}

impl TargetSet {
    #[must_use]
    pub fn has_executable(&self, name: &str) -> bool {
        self.executables.iter().any(|t| t == name)
    }

    #[must_use]
    pub fn has_service_worker(&self, name: &str) -> bool {
        self.service_workers.iter().any(|t| t == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executables.is_empty() && self.service_workers.is_empty()
    }
}
