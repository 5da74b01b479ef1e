use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::TodoController;

pub const QUERY_DEBOUNCE: Duration = Duration::from_millis(500);

/// A single cancellable scheduled task. Scheduling again aborts whatever is
/// still pending.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        });
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Search box input: text is committed to the controller only after it has
/// stopped changing for the debounce delay.
pub struct QueryDebouncer {
    controller: Arc<TodoController>,
    debouncer: Debouncer,
}

impl QueryDebouncer {
    pub fn new(controller: Arc<TodoController>) -> Self {
        Self::with_delay(controller, QUERY_DEBOUNCE)
    }

    pub fn with_delay(controller: Arc<TodoController>, delay: Duration) -> Self {
        Self {
            controller,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn input(&self, text: impl Into<String>) {
        let text = text.into();
        let controller = Arc::clone(&self.controller);
        self.debouncer.schedule(async move {
            debug!(query = %text, "debounce: committing query");
            controller.set_query_string(text);
        });
    }

    /// Drops any pending input and commits an empty query right away.
    pub fn clear(&self) {
        self.debouncer.cancel();
        self.controller.set_query_string("");
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
