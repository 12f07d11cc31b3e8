//! # Relay configuration.
//!
//! Provides [`Config`] centralized settings for an [`EventChannel`](crate::EventChannel)
//! and the [`Service`](crate::Service) that owns it.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1 (a listener always gets a queue)
//! - [`Listen::queue_capacity`](crate::Listen::queue_capacity) `= 0` → use the channel default

/// Configuration for the channel and its producer.
///
/// ## Field semantics
/// - `queue_capacity`: default per-listener queue size (min 1)
/// - `report_faults`: re-publish listener faults as `Error` events
/// - `strict_transitions`: reject redundant `start()` / `stop()` calls
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Default capacity of each listener's delivery queue.
    ///
    /// When a listener's queue is full the event is dropped **for that listener
    /// only**. Listeners can override this with their own capacity.
    pub queue_capacity: usize,

    /// Publish a listener fault to the remaining listeners as an `Error` event.
    ///
    /// Faults are always logged; this only controls whether they also travel
    /// through the channel.
    pub report_faults: bool,

    /// Treat `start()` while running and `stop()` while stopped as errors.
    ///
    /// - `false` = redundant transitions are silent no-ops
    /// - `true` = they return `ServiceError::InvalidStateTransition`
    ///
    /// State is never changed by a rejected transition.
    pub strict_transitions: bool,
}

impl Config {
    /// Returns the default queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Resolves the queue capacity for a listener that asked for `requested`.
    ///
    /// - `0` → channel default
    /// - `n > 0` → `n`
    #[inline]
    pub fn queue_capacity_for(&self, requested: usize) -> usize {
        if requested == 0 {
            self.queue_capacity_clamped()
        } else {
            requested
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `queue_capacity = 1024`
    /// - `report_faults = false`
    /// - `strict_transitions = false` (double start/stop tolerated)
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            report_faults: false,
            strict_transitions: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            queue_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity_clamped(), 1);
        assert_eq!(cfg.queue_capacity_for(0), 1);
    }

    #[test]
    fn listener_capacity_overrides_default() {
        let cfg = Config::default();
        assert_eq!(cfg.queue_capacity_for(0), 1024);
        assert_eq!(cfg.queue_capacity_for(8), 8);
    }
}
