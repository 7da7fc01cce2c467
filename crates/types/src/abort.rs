//! Shared cancellation handle for a build request

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

type AbortCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable abort flag with cleanup callbacks.
///
/// Signalling is terminal. Every registered callback runs exactly once, and a
/// callback registered after the signal runs immediately on the registering
/// thread.
#[derive(Clone)]
pub struct AbortHandler {
    inner: Arc<Inner>,
}

struct Inner {
    signal: watch::Sender<bool>,
    callbacks: Mutex<Vec<AbortCallback>>,
}

impl AbortHandler {
    #[must_use]
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                signal,
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Signal the abort. Calling this more than once has no further effect.
    pub fn abort(&self) {
        let first = self.inner.signal.send_if_modified(|aborted| {
            if *aborted {
                false
            } else {
                *aborted = true;
                true
            }
        });
        if !first {
            return;
        }

        let callbacks = std::mem::take(&mut *self.callbacks());
        for callback in callbacks {
            callback();
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.inner.signal.borrow()
    }

    /// Resolves once the abort has been signalled
    pub async fn aborted(&self) {
        let mut rx = self.inner.signal.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|aborted| *aborted).await;
    }

    /// Register a cleanup callback
    pub fn on_abort<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callbacks = self.callbacks();
        if self.is_aborted() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(Box::new(callback));
        }
    }

    fn callbacks(&self) -> MutexGuard<'_, Vec<AbortCallback>> {
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AbortHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AbortHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortHandler")
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}
