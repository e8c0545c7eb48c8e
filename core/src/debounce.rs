//! Debounced invocation.
//!
//! Used by callers for search-as-you-type (refetch once the user pauses)
//! and to absorb double-fired submit events. Trailing-edge by default,
//! with an optional leading-edge call at the start of a burst.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Edge selection for [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    pub leading: bool,
    pub trailing: bool,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
        }
    }
}

/// Collapses a burst of calls into at most one leading and one trailing
/// invocation per quiet period.
pub struct Debouncer {
    delay: Duration,
    options: DebounceOptions,
    callback: Arc<dyn Fn() + Send + Sync>,
    leading_fired: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self::with_options(delay, DebounceOptions::default(), callback)
    }

    pub fn with_options(
        delay: Duration,
        options: DebounceOptions,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            delay,
            options,
            callback: Arc::new(callback),
            leading_fired: Arc::new(AtomicBool::new(false)),
            timer: None,
        }
    }

    /// Register a call. Restarts the quiet-period timer; the trailing
    /// invocation runs once the timer survives untouched.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&mut self) {
        if self.options.leading && !self.leading_fired.swap(true, Ordering::SeqCst) {
            (self.callback)();
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let delay = self.delay;
        let trailing = self.options.trailing;
        let callback = Arc::clone(&self.callback);
        let leading_fired = Arc::clone(&self.leading_fired);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            leading_fired.store(false, Ordering::SeqCst);
            if trailing {
                callback();
            }
        }));
    }

    /// Drop the pending invocation, if any, and forget the burst.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.leading_fired.store(false, Ordering::SeqCst);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
