use parking_lot::RwLock;
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::error;

/// A channel listener
///
/// Invoked with the payload and the `from_remote` flag: false for posts
/// made through the local channel handle, true for messages received
/// from the transport.
///
/// Identity is the callback allocation: clones of one listener are the
/// same listener, two listeners built from equal closures are not.
pub struct Listener<T> {
    callback: Arc<dyn Fn(&T, bool) + Send + Sync>,
}

impl<T> Listener<T> {
    /// Wraps `callback`
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T, bool) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Returns true if both are clones of the same listener
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.callback) as *const () == Arc::as_ptr(&other.callback) as *const ()
    }

    /// Invokes the callback
    pub fn call(&self, payload: &T, from_remote: bool) {
        (self.callback)(payload, from_remote)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.callback) as *const ())
    }
}

/// Listener set of one channel, shared with the transport hook
pub(crate) struct Listeners<T> {
    channel: String,
    list: RwLock<Vec<Listener<T>>>,
}

impl<T> Listeners<T> {
    pub(crate) fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_owned(),
            list: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Listener<T>) {
        self.list.write().push(listener);
    }

    pub(crate) fn remove(&self, listener: &Listener<T>) {
        let mut list = self.list.write();
        if let Some(index) = list.iter().position(|l| l.ptr_eq(listener)) {
            list.remove(index);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.list.read().len()
    }

    /// Invokes every listener, isolating panics
    ///
    /// The list is snapshotted first, so listeners may add, remove or
    /// post while the dispatch runs. Returns the number of listeners that
    /// panicked.
    pub(crate) fn dispatch(&self, payload: &T, from_remote: bool) -> usize {
        let snapshot = self.list.read().clone();
        let mut failed = 0;
        for listener in &snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.call(payload, from_remote)));
            if result.is_err() {
                failed += 1;
                error!(channel = %self.channel, from_remote, ?listener, "listener panicked during dispatch");
            }
        }
        failed
    }
}
