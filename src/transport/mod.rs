//! # Transports
//!
//! A transport is the one-to-many broadcast primitive that carries
//! channel messages between execution contexts. The channel layer treats
//! it as an opaque capability: open a port by name, post through it,
//! receive through the hook given at open time, close it.
//!
//! [BroadcastBus] is the in-process implementation, [Unsupported] stands
//! for an environment without any broadcast facility.

use thiserror::Error;

mod bus;

#[cfg(test)]
pub(crate) mod recording;
#[cfg(test)]
mod test;

pub use bus::*;

/// Callback receiving every message other ports post on the same name
pub type InboundHook<T> = Box<dyn Fn(T) + Send + Sync>;

/// Failures reported by a transport
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The environment has no broadcast facility
    #[error("broadcast transport is not supported in this environment")]
    Unsupported,
    /// Inbound delivery or deferred sends need an async runtime
    #[error("no async runtime available")]
    NoRuntime,
    /// The port was closed or lost its peers
    #[error("port is disconnected")]
    Disconnected,
    /// The transport refused the message
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// A broadcast facility opening named ports
pub trait Transport<T>: Send + Sync {
    /// Opens a port on `name`
    ///
    /// `on_message` must be invoked for messages posted by other ports on
    /// the same name, never for the port's own messages, and never
    /// synchronously from within [Port::post_message].
    fn open(&self, name: &str, on_message: InboundHook<T>) -> Result<Box<dyn Port<T>>, TransportError>;
}

/// An open endpoint of a named broadcast
pub trait Port<T>: Send + Sync {
    /// Sends `payload` to every other port open on the same name
    fn post_message(&self, payload: T) -> Result<(), TransportError>;

    /// Stops inbound delivery and releases the port
    ///
    /// Closing twice is a no-op
    fn close(&self);
}

/// Transport of an environment without a broadcast facility
///
/// Every [open](Transport::open) fails with [TransportError::Unsupported],
/// leaving the fallback decision to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl<T> Transport<T> for Unsupported {
    fn open(&self, _name: &str, _on_message: InboundHook<T>) -> Result<Box<dyn Port<T>>, TransportError> {
        Err(TransportError::Unsupported)
    }
}
