//! Completion barrier for a batch of lifecycles.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::Notify;

struct CountdownInner {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CountdownInner {
    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }
}

/// Counts outstanding [`CompletionSignal`]s and releases waiters when none are left.
///
/// Signals may fire before anyone waits; the count is what matters, not the wakeup.
#[derive(Clone)]
pub struct Countdown {
    inner: Arc<CountdownInner>,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CountdownInner {
                remaining: AtomicUsize::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// Adds one outstanding unit and returns the signal that retires it.
    pub fn register(&self) -> CompletionSignal {
        self.inner.remaining.fetch_add(1, Ordering::AcqRel);
        CompletionSignal {
            inner: Some(Arc::clone(&self.inner)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// Resolves once every registered signal has fired.
    pub async fn wait(&self) {
        loop {
            // Create the waiter before checking so a concurrent last arrival cannot be missed.
            let notified = self.inner.notify.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot completion notice for a single lifecycle.
///
/// Fires exactly once: explicitly through [`CompletionSignal::fire`], or on drop if the owner
/// exits early or panics.
pub struct CompletionSignal {
    inner: Option<Arc<CountdownInner>>,
}

impl CompletionSignal {
    pub fn fire(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.arrive();
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.release();
    }
}
