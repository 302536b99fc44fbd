//! # Channels
//!
//! A [Channel] is the per-name synchronization point of one execution
//! context. It multiplexes a single transport port across any number of
//! [Listener]s:
//!
//! - [post](Channel::post) notifies every local listener with
//!   `from_remote = false` before returning, then hands the payload to
//!   the rate-limited poster
//! - messages arriving from the transport reach every listener with
//!   `from_remote = true`, never rate-limited
//!
//! Channels are obtained from a [Registry], which keeps at most one open
//! channel per name.

use crate::{
    error::{Result, SyncError},
    ratelimit::RateLimitPolicy,
    transport::{InboundHook, Transport, TransportError},
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
};
use tokio::runtime::Handle;
use tracing::{debug, trace};

mod listener;
mod poster;
mod registry;
mod topic;


pub use listener::Listener;
pub use registry::Registry;
pub use topic::Topic;

use listener::Listeners;
use poster::{Outbound, Poster};
use registry::RegistryInner;

/// Handle to an open (or closed) channel
///
/// Clones refer to the same channel instance.
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

struct ChannelInner<T> {
    name: String,
    listeners: Arc<Listeners<T>>,
    poster: Poster<T>,
    owners: AtomicUsize,
    registry: Weak<RegistryInner<T>>,
}

impl<T: Send + Sync + 'static> Channel<T> {
    pub(crate) fn open(
        name: &str,
        policy: RateLimitPolicy,
        transport: &dyn Transport<T>,
        registry: Weak<RegistryInner<T>>,
    ) -> Result<Self> {
        let unavailable = |source| SyncError::TransportUnavailable {
            channel: name.to_owned(),
            source,
        };
        // deferred sends must have a runtime before the port exists
        let runtime = if policy.is_deferred() {
            Some(Handle::try_current().map_err(|_| unavailable(TransportError::NoRuntime))?)
        } else {
            None
        };

        let listeners = Arc::new(Listeners::new(name));
        let inbound = Arc::clone(&listeners);
        let hook: InboundHook<T> = Box::new(move |payload| {
            inbound.dispatch(&payload, true);
        });
        let port = transport.open(name, hook).map_err(unavailable)?;

        Ok(Self {
            inner: Arc::new(ChannelInner {
                name: name.to_owned(),
                listeners,
                poster: Poster::new(Outbound::new(name, port), policy, runtime),
                owners: AtomicUsize::new(0),
                registry,
            }),
        })
    }

    /// Notifies every local listener with `(payload, false)`, then sends
    /// `payload` to other contexts subject to the rate-limit policy
    ///
    /// Local listeners have been invoked when this returns, whatever the
    /// policy. A panicking listener is logged and skipped.
    ///
    /// Fails with [SyncError::Closed] after [close](Channel::close), and
    /// with [SyncError::Transport] when an immediate send fails.
    pub fn post(&self, payload: T) -> Result<()> {
        if self.is_closed() {
            return Err(SyncError::closed(&self.inner.name));
        }
        self.inner.listeners.dispatch(&payload, false);
        self.inner.poster.post(payload)
    }
}

impl<T> Channel<T> {
    /// Registers a listener
    ///
    /// Registering the same listener twice makes it fire twice.
    pub fn add_listener(&self, listener: Listener<T>) -> &Self {
        self.inner.listeners.add(listener);
        self
    }

    /// Removes one registration of `listener`, if any
    pub fn remove_listener(&self, listener: &Listener<T>) -> &Self {
        self.inner.listeners.remove(listener);
        self
    }

    /// Closes the transport port, discards a pending debounced send and
    /// evicts the channel from its registry, whatever the owner count
    ///
    /// The next [acquire](Registry::acquire) of the same name builds a new
    /// channel. Closing twice is a no-op.
    pub fn close(&self) {
        if !self.inner.poster.close() {
            return;
        }
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.evict(self);
        }
        debug!(channel = %self.inner.name, "channel closed");
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Rate-limit policy chosen when the channel was opened
    pub fn policy(&self) -> RateLimitPolicy {
        self.inner.poster.policy()
    }

    /// Returns true once [close](Channel::close) was called
    pub fn is_closed(&self) -> bool {
        self.inner.poster.is_closed()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Returns true if both handles refer to the same channel instance
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of owners that have not released the channel yet
    ///
    /// Every [acquire](Registry::acquire) and every [Binding](crate::Binding)
    /// counts as one owner.
    pub fn owner_count(&self) -> usize {
        self.inner.owners.load(Ordering::Acquire)
    }

    /// Gives up one ownership taken by [acquire](Registry::acquire)
    ///
    /// The channel is closed when its last owner releases it. Returns true
    /// if this call closed the channel. Releasing more often than acquiring
    /// is a no-op.
    pub fn release(&self) -> bool {
        let released = self
            .inner
            .owners
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |owners| owners.checked_sub(1));
        match released {
            Ok(1) => {
                trace!(channel = %self.inner.name, "last owner released");
                self.close();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn retain(&self) {
        self.inner.owners.fetch_add(1, Ordering::AcqRel);
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("policy", &self.policy())
            .field("closed", &self.is_closed())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
