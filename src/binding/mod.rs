//! # Reactive bindings
//!
//! A [Binding] layers a local value on top of a [Channel]: read it with
//! [value](Binding::value), update it with [set](Binding::set). Local and
//! remote updates both flow through one internal listener, so an
//! optional observer sees every change tagged with `from_remote`.

use crate::{
    channel::{Channel, Listener, Registry},
    error::{Result, SyncError},
    options::SyncOptions,
};
use parking_lot::RwLock;
use std::{fmt, sync::Arc};


/// Change observer: `(value, from_remote)`
pub type Observer<T> = Arc<dyn Fn(&T, bool) + Send + Sync>;

/// Options of a [Binding]
pub struct BindOptions<T> {
    /// Rate limiting of the underlying channel
    pub sync: SyncOptions,
    /// Called on every local or remote change
    pub on_change: Option<Observer<T>>,
}

impl<T> BindOptions<T> {
    /// No rate limiting, no observer
    pub fn new() -> Self {
        Self {
            sync: SyncOptions::default(),
            on_change: None,
        }
    }

    /// Debounces outbound sends
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.sync.debounce_ms = Some(ms);
        self
    }

    /// Throttles outbound sends
    pub fn throttle_ms(mut self, ms: u64) -> Self {
        self.sync.throttle_ms = Some(ms);
        self
    }

    /// Sets the change observer
    pub fn on_change<F>(mut self, observer: F) -> Self
    where
        F: Fn(&T, bool) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(observer));
        self
    }
}

impl<T> Default for BindOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BindOptions<T> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync,
            on_change: self.on_change.clone(),
        }
    }
}

impl<T> From<SyncOptions> for BindOptions<T> {
    fn from(sync: SyncOptions) -> Self {
        Self {
            sync,
            on_change: None,
        }
    }
}

/// Value-plus-setter view of a channel
///
/// A binding owns its channel like an [acquire](Registry::acquire) does.
/// Dropping the binding removes its listener and releases the channel;
/// if that was the last owner, the channel is closed, discarding a
/// pending debounced send.
pub struct Binding<T> {
    registry: Registry<T>,
    options: BindOptions<T>,
    name: String,
    value: Arc<RwLock<T>>,
    attachment: Option<Attachment<T>>,
}

struct Attachment<T> {
    channel: Channel<T>,
    listener: Listener<T>,
}

impl<T: Clone + Send + Sync + 'static> Binding<T> {
    /// Acquires `name` from `registry` and starts tracking it from `default`
    pub fn bind(
        registry: &Registry<T>,
        name: &str,
        default: T,
        options: impl Into<BindOptions<T>>,
    ) -> Result<Self> {
        let options = options.into();
        let value = Arc::new(RwLock::new(default));
        let attachment = attach(registry, name, &value, &options)?;
        Ok(Self {
            registry: registry.clone(),
            options,
            name: name.to_owned(),
            value,
            attachment: Some(attachment),
        })
    }

    /// Current value
    pub fn value(&self) -> T {
        self.value.read().clone()
    }

    /// Stores `value` locally, then posts it on the channel
    ///
    /// The local value is updated even when posting fails.
    pub fn set(&self, value: T) -> Result<()> {
        *self.value.write() = value.clone();
        match &self.attachment {
            Some(attachment) => attachment.channel.post(value),
            None => Err(SyncError::closed(&self.name)),
        }
    }

    /// Moves the binding to channel `name`, keeping the current value
    ///
    /// The old channel is released first. A pending debounced send belongs
    /// to the channel, not to the binding that posted it: it is discarded
    /// only when the old channel closes, and is still sent while other
    /// owners keep the old channel open.
    ///
    /// On failure the binding stays
    /// detached and [set](Binding::set) reports [SyncError::Closed] until a
    /// later rebind succeeds.
    pub fn rebind(&mut self, name: &str) -> Result<()> {
        if self.name == name && self.attachment.is_some() {
            return Ok(());
        }
        self.detach();
        self.name = name.to_owned();
        self.attachment = Some(attach(&self.registry, name, &self.value, &self.options)?);
        Ok(())
    }
}

impl<T> Binding<T> {
    /// Runs `f` on the current value without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Name of the bound channel
    pub fn channel_name(&self) -> &str {
        &self.name
    }

    /// The bound channel, None while detached
    pub fn channel(&self) -> Option<&Channel<T>> {
        self.attachment.as_ref().map(|a| &a.channel)
    }

    /// Explicit teardown, same as dropping the binding
    pub fn unbind(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        let Some(Attachment { channel, listener }) = self.attachment.take() else {
            return;
        };
        channel.remove_listener(&listener);
        channel.release();
    }
}

fn attach<T: Clone + Send + Sync + 'static>(
    registry: &Registry<T>,
    name: &str,
    value: &Arc<RwLock<T>>,
    options: &BindOptions<T>,
) -> Result<Attachment<T>> {
    let channel = registry.acquire(name, options.sync)?;
    let value = Arc::clone(value);
    let observer = options.on_change.clone();
    let listener = Listener::new(move |payload: &T, from_remote| {
        *value.write() = payload.clone();
        if let Some(observer) = &observer {
            observer(payload, from_remote);
        }
    });
    channel.add_listener(listener.clone());
    Ok(Attachment { channel, listener })
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("value", &*self.value.read())
            .field("attached", &self.attachment.is_some())
            .finish()
    }
}
