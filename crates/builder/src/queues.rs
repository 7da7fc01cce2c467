use std::sync::Arc;
use wbx_events::EventSender;
use wbx_process::{EnvSnapshot, ProcessQueue};

/// One serial process queue per external tool family
#[derive(Debug, Clone)]
pub struct ToolQueues {
    pub compiler: ProcessQueue,
    pub npm: ProcessQueue,
    pub bundler: ProcessQueue,
    pub sass: ProcessQueue,
    pub gzip: ProcessQueue,
    pub brotli: ProcessQueue,
    pub manifest: ProcessQueue,
}

impl ToolQueues {
    #[must_use]
    pub fn new(env: &Arc<EnvSnapshot>, events: Option<&EventSender>) -> Self {
        let queue = |name: &str| ProcessQueue::new(name, Arc::clone(env), events.cloned());
        Self {
            compiler: queue("compiler"),
            npm: queue("npm"),
            bundler: queue("bundler"),
            sass: queue("sass"),
            gzip: queue("gzip"),
            brotli: queue("brotli"),
            manifest: queue("manifest"),
        }
    }

    fn all(&self) -> [&ProcessQueue; 7] {
        [
            &self.compiler,
            &self.npm,
            &self.bundler,
            &self.sass,
            &self.gzip,
            &self.brotli,
            &self.manifest,
        ]
    }

    /// Cancel every queue, killing running tools and discarding pending ones
    pub fn cancel_all(&self) {
        for queue in self.all() {
            queue.cancel();
        }
    }
}
