//! Fault tracking with consecutive-rejection hysteresis
//!
//! The link is reported disconnected only after several rejections in a
//! row. The tracker never logs; callers read `consecutive_rejections` to
//! decide how loudly to report.

use crate::Timestamp;

/// Rejections in a row before the link is reported disconnected
pub const DISCONNECT_THRESHOLD: u32 = 3;

/// Rolling fault state for one acquisition target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultState {
    pub consecutive_rejections: u32,
    pub last_error_time: Option<Timestamp>,
    pub connected: bool,
}

impl Default for FaultState {
    fn default() -> Self {
        FaultState {
            consecutive_rejections: 0,
            last_error_time: None,
            connected: true,
        }
    }
}

/// Consecutive-rejection counter deriving a connected flag
#[derive(Clone, Debug)]
pub struct FaultTracker {
    state: FaultState,
    threshold: u32,
}

impl FaultTracker {
    pub fn new() -> Self {
        Self::with_threshold(DISCONNECT_THRESHOLD)
    }

    /// Tracker with a custom disconnect threshold (minimum 1)
    pub fn with_threshold(threshold: u32) -> Self {
        FaultTracker {
            state: FaultState::default(),
            threshold: threshold.max(1),
        }
    }

    /// A cycle produced a valid value
    pub fn on_success(&mut self) {
        self.state.consecutive_rejections = 0;
        self.state.connected = true;
    }

    /// A cycle was rejected at `now`
    pub fn on_rejection(&mut self, now: Timestamp) {
        self.state.consecutive_rejections = self.state.consecutive_rejections.saturating_add(1);
        self.state.last_error_time = Some(now);
        self.state.connected = self.state.consecutive_rejections < self.threshold;
    }

    #[inline]
    pub fn consecutive_rejections(&self) -> u32 {
        self.state.consecutive_rejections
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    #[inline]
    pub fn last_error_time(&self) -> Option<Timestamp> {
        self.state.last_error_time
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Copy of the current state
    pub fn state(&self) -> FaultState {
        self.state
    }
}

impl Default for FaultTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_three_strikes() {
        let mut tracker = FaultTracker::new();
        assert!(tracker.is_connected());

        tracker.on_rejection(Timestamp::from_millis(1));
        assert!(tracker.is_connected());
        tracker.on_rejection(Timestamp::from_millis(2));
        assert!(tracker.is_connected());
        tracker.on_rejection(Timestamp::from_millis(3));
        assert!(!tracker.is_connected());

        assert_eq!(tracker.consecutive_rejections(), 3);
        assert_eq!(tracker.last_error_time(), Some(Timestamp::from_millis(3)));
    }

    #[test]
    fn test_success_resets() {
        let mut tracker = FaultTracker::new();
        for i in 0..5 {
            tracker.on_rejection(Timestamp::from_millis(i));
        }
        assert!(!tracker.is_connected());

        tracker.on_success();
        assert!(tracker.is_connected());
        assert_eq!(tracker.consecutive_rejections(), 0);
        // Last error time is history, not state
        assert_eq!(tracker.last_error_time(), Some(Timestamp::from_millis(4)));
    }

    #[test]
    fn test_repeated_success_is_idempotent() {
        let mut tracker = FaultTracker::new();
        for _ in 0..10 {
            tracker.on_success();
            assert_eq!(tracker.consecutive_rejections(), 0);
            assert!(tracker.is_connected());
        }
    }

    #[test]
    fn test_custom_threshold_floor() {
        let mut tracker = FaultTracker::with_threshold(0);
        assert_eq!(tracker.threshold(), 1);
        tracker.on_rejection(Timestamp::ZERO);
        assert!(!tracker.is_connected());
    }

    proptest! {
        #[test]
        fn prop_connected_tracks_trailing_rejections(outcomes in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut tracker = FaultTracker::new();
            let mut streak = 0u32;
            for (i, ok) in outcomes.iter().enumerate() {
                if *ok {
                    tracker.on_success();
                    streak = 0;
                } else {
                    tracker.on_rejection(Timestamp::from_millis(i as u64));
                    streak += 1;
                }
                prop_assert_eq!(tracker.consecutive_rejections(), streak);
                prop_assert_eq!(tracker.is_connected(), streak < DISCONNECT_THRESHOLD);
            }
        }
    }
}
