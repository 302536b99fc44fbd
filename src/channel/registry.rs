use super::Channel;
use crate::{error::Result, options::SyncOptions, transport::Transport};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, trace};

/// Channel registry of one execution context
///
/// Keeps at most one open [Channel] per name. Registries sharing a
/// transport (e.g. clones of one [BroadcastBus](crate::transport::BroadcastBus))
/// behave like separate contexts: posts made in one reach listeners in
/// the others with `from_remote = true`.
///
/// Clones refer to the same registry.
pub struct Registry<T> {
    inner: Arc<RegistryInner<T>>,
}

pub(crate) struct RegistryInner<T> {
    transport: Arc<dyn Transport<T>>,
    channels: RwLock<HashMap<String, Channel<T>>>,
}

impl<T: Send + Sync + 'static> Registry<T> {
    /// Creates an empty registry opening ports on `transport`
    pub fn new(transport: impl Transport<T> + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Creates an empty registry over a shared transport
    pub fn with_transport(transport: Arc<dyn Transport<T>>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                transport,
                channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Returns the open channel named `name`, opening it if needed
    ///
    /// Each call takes one ownership of the channel, given back with
    /// [release](Channel::release).
    ///
    /// `options` only apply when the channel is opened by this call;
    /// an already open channel keeps its policy.
    ///
    /// Fails with [SyncError::TransportUnavailable](crate::SyncError::TransportUnavailable)
    /// when the transport cannot open a port. Nothing is retried.
    pub fn acquire(&self, name: &str, options: SyncOptions) -> Result<Channel<T>> {
        // fast get with shared access
        if let Some(channel) = self.inner.channels.read().get(name) {
            channel.retain();
            return Ok(channel.clone());
        }

        // slow get with unique access
        let mut channels = self.inner.channels.write();
        if let Some(channel) = channels.get(name) {
            channel.retain();
            return Ok(channel.clone());
        }

        // create & store
        let policy = options.policy();
        let channel = Channel::open(
            name,
            policy,
            self.inner.transport.as_ref(),
            Arc::downgrade(&self.inner),
        )?;
        channel.retain();
        channels.insert(name.to_owned(), channel.clone());
        debug!(channel = %name, ?policy, "channel opened");
        Ok(channel)
    }
}

impl<T> Registry<T> {
    /// Returns true if an open channel is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.inner.channels.read().contains_key(name)
    }

    /// Number of open channels
    pub fn len(&self) -> usize {
        self.inner.channels.read().len()
    }

    /// Returns true if no channel is open
    pub fn is_empty(&self) -> bool {
        self.inner.channels.read().is_empty()
    }

    /// Names of the open channels, in no particular order
    pub fn names(&self) -> Vec<String> {
        self.inner.channels.read().keys().cloned().collect()
    }

    /// Closes every open channel
    pub fn close_all(&self) {
        let channels: Vec<_> = self.inner.channels.write().drain().map(|(_, c)| c).collect();
        for channel in channels {
            channel.close();
        }
    }
}

impl<T> RegistryInner<T> {
    /// Removes `channel` if it is still the one registered under its name
    pub(crate) fn evict(&self, channel: &Channel<T>) {
        let mut channels = self.channels.write();
        if channels
            .get(channel.name())
            .map_or(false, |registered| registered.ptr_eq(channel))
        {
            channels.remove(channel.name());
            trace!(channel = %channel.name(), "channel evicted");
        }
    }
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
