//! Single-slot cancellable timer.
//!
//! Scheduling replaces whatever was armed before: the previous task is
//! aborted, so at most one action of a given kind is ever pending.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct SingleSlotTimer {
    runtime: Handle,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl SingleSlotTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            slot: Mutex::new(None),
        }
    }

    /// Run `action` after `delay`, cancelling any previously armed action.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel the armed action. Returns whether one was still pending.
    pub fn cancel(&self) -> bool {
        let armed = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match armed {
            Some(task) => {
                let pending = !task.is_finished();
                task.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SingleSlotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
