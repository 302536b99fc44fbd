use crate::{
    error::{Result, SyncError},
    ratelimit::{Debounce, RateLimitPolicy, ThrottleGate},
    transport::Port,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

/// Raw send path of a channel: the transport port and the closed flag
pub(crate) struct Outbound<T> {
    channel: String,
    port: Box<dyn Port<T>>,
    closed: AtomicBool,
}

impl<T> Outbound<T> {
    pub(crate) fn new(channel: &str, port: Box<dyn Port<T>>) -> Self {
        Self {
            channel: channel.to_owned(),
            port,
            closed: AtomicBool::new(false),
        }
    }

    fn send(&self, payload: T) -> Result<()> {
        if self.is_closed() {
            return Err(SyncError::closed(&self.channel));
        }
        self.port
            .post_message(payload)
            .map_err(|source| SyncError::Transport {
                channel: self.channel.clone(),
                source,
            })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns false if already closed
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.port.close();
        true
    }
}

enum Limiter<T> {
    Immediate,
    Debounce(Debounce<T>),
    Throttle(ThrottleGate),
}

/// Rate-limited poster wrapping the outbound send
pub(crate) struct Poster<T> {
    outbound: Arc<Outbound<T>>,
    limiter: Limiter<T>,
    policy: RateLimitPolicy,
}

impl<T: Send + Sync + 'static> Poster<T> {
    /// `runtime` is required for [RateLimitPolicy::Debounce]
    pub(crate) fn new(outbound: Outbound<T>, policy: RateLimitPolicy, runtime: Option<Handle>) -> Self {
        let outbound = Arc::new(outbound);
        let limiter = match (policy, runtime) {
            (RateLimitPolicy::Debounce(delay), Some(runtime)) => {
                let deferred = Arc::clone(&outbound);
                Limiter::Debounce(Debounce::with_runtime(runtime, delay, move |payload| {
                    match deferred.send(payload) {
                        Ok(()) => trace!(channel = %deferred.channel, "debounced send"),
                        Err(SyncError::Closed { .. }) => {
                            debug!(channel = %deferred.channel, "debounced send dropped, channel closed")
                        }
                        Err(e) => warn!(channel = %deferred.channel, error = %e, "debounced send failed"),
                    }
                }))
            }
            (RateLimitPolicy::Throttle(interval), _) => Limiter::Throttle(ThrottleGate::new(interval)),
            _ => Limiter::Immediate,
        };
        Self {
            outbound,
            limiter,
            policy,
        }
    }

    pub(crate) fn post(&self, payload: T) -> Result<()> {
        match &self.limiter {
            Limiter::Immediate => self.outbound.send(payload),
            Limiter::Debounce(debounce) => {
                debounce.call(payload);
                Ok(())
            }
            Limiter::Throttle(gate) => {
                if gate.try_fire() {
                    self.outbound.send(payload)
                } else {
                    trace!(channel = %self.outbound.channel, "throttled send dropped");
                    Ok(())
                }
            }
        }
    }
}

impl<T> Poster<T> {
    pub(crate) fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Closes the port and discards a pending debounced send
    ///
    /// Returns false if already closed
    pub(crate) fn close(&self) -> bool {
        if !self.outbound.close() {
            return false;
        }
        if let Limiter::Debounce(debounce) = &self.limiter {
            if debounce.cancel() {
                debug!(channel = %self.outbound.channel, "pending debounced send discarded");
            }
        }
        true
    }
}
