//! # Rate limiting
//!
//! Two independent timing policies wrapping a single-argument callback:
//!
//! - [Debounce]: coalesce a burst, fire the latest argument after a quiet period
//! - [Throttle]: fire immediately, then drop calls until the interval elapses
//!
//! Both read time from [tokio::time], so a paused test clock drives them.

use std::time::Duration;

mod debounce;
mod throttle;


pub use debounce::*;
pub use throttle::*;

/// How a channel rate-limits outbound sends
///
/// Selected once when the channel is built, never re-evaluated per post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateLimitPolicy {
    /// Every post is sent immediately
    #[default]
    None,
    /// Only the latest post of a burst is sent, after the given quiet period
    Debounce(Duration),
    /// Leading-edge throttle: at most one send per interval, no trailing send
    Throttle(Duration),
}

impl RateLimitPolicy {
    /// Returns true if sends may be deferred past the post call
    pub fn is_deferred(&self) -> bool {
        matches!(self, RateLimitPolicy::Debounce(_))
    }
}
