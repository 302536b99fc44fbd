use super::{Channel, Registry};
use crate::{error::Result, options::SyncOptions};

/// A channel name bound to its payload type
///
/// Usually declared with [declare!](crate::declare)
pub trait Topic: Sized + 'static {
    /// Channel name
    const NAME: &'static str;

    /// Rate limiting applied when the channel is opened
    const OPTIONS: SyncOptions;

    /// Payload data type posted on this channel
    type Payload: Send + Sync + 'static;
}

impl<T: Send + Sync + 'static> Registry<T> {
    /// Acquires the channel of topic `Tp` with its declared options
    pub fn topic<Tp: Topic<Payload = T>>(&self) -> Result<Channel<T>> {
        self.acquire(Tp::NAME, Tp::OPTIONS)
    }
}
