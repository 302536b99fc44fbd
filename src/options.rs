use crate::ratelimit::RateLimitPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound rate limiting for a channel
///
/// Embeddable in a host application's config:
///
/// ```rust
/// # use intersync::SyncOptions;
/// let options: SyncOptions = serde_json::from_str(r#"{ "debounce_ms": 250 }"#).unwrap();
/// assert_eq!(options, SyncOptions::debounce(250));
/// ```
///
/// When both intervals are set debounce wins.
/// A zero interval is treated as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncOptions {
    /// Quiet period before the latest post is sent
    pub debounce_ms: Option<u64>,
    /// Minimum interval between two sends
    pub throttle_ms: Option<u64>,
}

impl SyncOptions {
    /// No rate limiting, every post is sent immediately
    pub const fn immediate() -> Self {
        Self {
            debounce_ms: None,
            throttle_ms: None,
        }
    }

    /// Debounce outbound posts by `ms` milliseconds
    pub const fn debounce(ms: u64) -> Self {
        Self {
            debounce_ms: Some(ms),
            throttle_ms: None,
        }
    }

    /// Throttle outbound posts to one per `ms` milliseconds
    pub const fn throttle(ms: u64) -> Self {
        Self {
            debounce_ms: None,
            throttle_ms: Some(ms),
        }
    }

    /// Resolves the options into the policy used by the channel
    pub fn policy(&self) -> RateLimitPolicy {
        match (nonzero(self.debounce_ms), nonzero(self.throttle_ms)) {
            (Some(ms), _) => RateLimitPolicy::Debounce(Duration::from_millis(ms)),
            (None, Some(ms)) => RateLimitPolicy::Throttle(Duration::from_millis(ms)),
            (None, None) => RateLimitPolicy::None,
        }
    }
}

fn nonzero(ms: Option<u64>) -> Option<u64> {
    ms.filter(|ms| *ms > 0)
}
