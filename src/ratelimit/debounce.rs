use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::Instrument;

/// Trailing-edge debounce of a single-argument callback
///
/// Every [call](Debounce::call) aborts the pending scheduled call (if any)
/// and schedules a new one `delay` later with the latest argument. The
/// scheduled call runs in the caller's tracing span.
/// Dropping the debounce cancels the pending call.
pub struct Debounce<A> {
    callback: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<A: Send + 'static> Debounce<A> {
    /// Wraps `callback`, scheduling on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_runtime(Handle::current(), delay, callback)
    }

    /// Wraps `callback`, scheduling on the given runtime
    pub fn with_runtime<F>(runtime: Handle, delay: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            delay,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `arg` to be passed to the callback once the delay elapses
    /// without another call
    pub fn call(&self, arg: A) {
        // deadline is fixed here, not when the task is first polled
        let deadline = Instant::now() + self.delay;
        let callback = Arc::clone(&self.callback);
        let mut pending = self.pending.lock();
        if let Some(task) = pending.take() {
            task.abort();
        }
        let task = async move {
            sleep_until(deadline).await;
            callback(arg);
        };
        *pending = Some(self.runtime.spawn(task.in_current_span()));
    }
}

impl<A> Debounce<A> {
    /// Drops the pending call
    ///
    /// Returns true if a call was still waiting to fire
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(task) => {
                let waiting = !task.is_finished();
                task.abort();
                waiting
            }
            None => false,
        }
    }

    /// Returns true while a scheduled call has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }
}

impl<A> Drop for Debounce<A> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.get_mut().take() {
            task.abort();
        }
    }
}
