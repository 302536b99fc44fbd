use crate::transport::TransportError;
use thiserror::Error;

/// This enumeration is the list of the possible error outcomes
/// for channel and binding operations
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The hosting environment cannot open a transport port for the channel
    #[error("transport unavailable for channel `{channel}`")]
    TransportUnavailable {
        /// Channel name
        channel: String,
        /// Why the transport refused
        #[source]
        source: TransportError,
    },

    /// The transport accepted the port but failed to send a message
    #[error("transport send failed on channel `{channel}`")]
    Transport {
        /// Channel name
        channel: String,
        /// Why the send failed
        #[source]
        source: TransportError,
    },

    /// The channel handle has been closed
    #[error("channel `{channel}` is closed")]
    Closed {
        /// Channel name
        channel: String,
    },
}

impl SyncError {
    pub(crate) fn closed(channel: &str) -> Self {
        SyncError::Closed {
            channel: channel.to_owned(),
        }
    }

    /// Name of the channel the error belongs to
    pub fn channel(&self) -> &str {
        match self {
            SyncError::TransportUnavailable { channel, .. }
            | SyncError::Transport { channel, .. }
            | SyncError::Closed { channel } => channel,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
