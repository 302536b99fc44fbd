use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Timing state of a leading-edge throttle
///
/// Kept separate from [Throttle] for callers that own the fired action
/// themselves and only need the admission decision.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    last_fire: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    /// Creates a gate admitting one call per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: Mutex::new(None),
        }
    }

    /// Admits the call and records the fire instant, or rejects it
    /// when the previous fire is less than one interval ago
    pub fn try_fire(&self) -> bool {
        let now = Instant::now();
        let mut last_fire = self.last_fire.lock();
        if let Some(last) = *last_fire {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        *last_fire = Some(now);
        true
    }
}

/// Leading-edge throttle of a single-argument callback
///
/// Calls inside the interval are dropped and never replayed.
pub struct Throttle<A, R = ()> {
    gate: ThrottleGate,
    callback: Box<dyn Fn(A) -> R + Send + Sync>,
}

impl<A, R> Throttle<A, R> {
    /// Wraps `callback`
    pub fn new<F>(interval: Duration, callback: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            gate: ThrottleGate::new(interval),
            callback: Box::new(callback),
        }
    }

    /// Invokes the callback if the gate admits the call
    ///
    /// Returns the callback result, or None when the call was dropped
    pub fn call(&self, arg: A) -> Option<R> {
        if self.gate.try_fire() {
            Some((self.callback)(arg))
        } else {
            None
        }
    }
}
