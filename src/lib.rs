#![warn(missing_docs)]
#![warn(clippy::missing_panics_doc)]

//! Cross-context state synchronization over named broadcast channels
//!
//! A value posted on a channel in one execution context reaches every
//! other context that opened the same channel name, with optional
//! debounce or throttle of outbound sends. Every listener learns whether
//! an update was made locally or received from another context.
//!
//! ```rust
//! use intersync::{transport::BroadcastBus, Listener, Registry, SyncOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> intersync::Result<()> {
//! let bus = BroadcastBus::new();
//! let tab = Registry::new(bus.clone());
//! let theme = tab.acquire("theme", SyncOptions::throttle(100))?;
//! theme.add_listener(Listener::new(|value: &String, from_remote| {
//!     println!("theme is now {} (remote: {})", value, from_remote);
//! }));
//! theme.post("dark".to_owned())?;
//! theme.close();
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod channel;
pub mod ratelimit;
pub mod transport;

mod error;
mod options;

pub use binding::{BindOptions, Binding};
pub use channel::{Channel, Listener, Registry, Topic};
pub use error::{Result, SyncError};
pub use options::SyncOptions;

/// Declare [Topic](crate::Topic) types
///
/// ## Syntax
///
/// `<visibility>? channel[<options>]? <name>(<payload type>) = <channel name>;`
///
/// `<options>` is optional and is either `debounce = <ms>` or
/// `throttle = <ms>`
///
/// ## Example
///
/// ```rust
/// intersync::declare! {
///    /// Color theme shared by every window
///    pub channel[throttle = 100] Theme(String) = "theme";
///    /// Draft text, sent once typing pauses
///    pub(crate) channel[debounce = 300] Draft(String) = "draft";
///    /// Signed-in user id
///    channel User(Option<u64>) = "user";
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = intersync::Registry::new(intersync::transport::BroadcastBus::new());
/// let theme = Theme::acquire(&registry).unwrap();
/// assert_eq!(theme.name(), "theme");
/// # }
/// ```
#[macro_export]
macro_rules! declare {
    () => {};

    (
        $(#[$attr:meta])*
        $v:vis channel $([$policy:ident = $ms:expr])? $name:ident ($payload:ty) = $channel:expr;
        $($next:tt)*
    ) => {
        $(#[$attr])*
        $v struct $name;

        impl $crate::Topic for $name {
            type Payload = $payload;
            const NAME: &'static str = $channel;
            const OPTIONS: $crate::SyncOptions = $crate::declare!(@options $($policy = $ms)?);
        }

        impl $name {
            #[doc = concat!("Acquires the `", $channel, "` channel")]
            #[allow(dead_code)]
            $v fn acquire(
                registry: &$crate::Registry<$payload>,
            ) -> $crate::Result<$crate::Channel<$payload>> {
                registry.topic::<$name>()
            }
        }

        $crate::declare!($($next)*);
    };

    (@options) => { $crate::SyncOptions::immediate() };
    (@options debounce = $ms:expr) => { $crate::SyncOptions::debounce($ms) };
    (@options throttle = $ms:expr) => { $crate::SyncOptions::throttle($ms) };
}
