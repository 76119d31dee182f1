// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-category listener lists with isolated invocation.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use vb_core::{InterruptNotice, StatusUpdate, Transcript};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Ordered list of callbacks for one event category.
///
/// Dispatch works on a snapshot taken under the read lock, so listeners may
/// register further listeners without deadlocking. A panicking listener is
/// logged and skipped; the rest still run.
pub struct ListenerList<E> {
    category: &'static str,
    listeners: RwLock<Vec<Listener<E>>>,
}

impl<E> ListenerList<E> {
    pub fn new(category: &'static str) -> Self {
        ListenerList {
            category,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, listener: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Invokes every listener in registration order.
    ///
    /// Returns how many listeners panicked.
    pub fn dispatch(&self, event: &E) -> usize {
        let snapshot: Vec<Listener<E>> = self.listeners.read().clone();
        let mut failed = 0;
        for (index, listener) in snapshot.iter().enumerate() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                failed += 1;
                tracing::warn!(
                    category = self.category,
                    index,
                    panic = panic_message(payload.as_ref()),
                    "listener panicked"
                );
            }
        }
        failed
    }
}

impl<E> std::fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("category", &self.category)
            .field("len", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// The application-facing listener categories.
#[derive(Debug)]
pub struct ListenerRegistry {
    pub transcript: ListenerList<Transcript>,
    pub interrupt: ListenerList<InterruptNotice>,
    pub status: ListenerList<StatusUpdate>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry {
            transcript: ListenerList::new("transcript"),
            interrupt: ListenerList::new("interrupt"),
            status: ListenerList::new("status"),
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
