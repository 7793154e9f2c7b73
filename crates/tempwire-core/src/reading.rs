//! Reading Store - the last known measurement and its metadata

use std::fmt::{Debug, Display, Formatter};

use crate::Timestamp;

/// Temperature in tenths of a degree Celsius
///
/// Deci-degrees are the canonical unit end to end; `as_celsius` exists for
/// display and must not feed back into storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeciCelsius(pub i16);

impl DeciCelsius {
    pub const ZERO: DeciCelsius = DeciCelsius(0);

    #[inline]
    pub const fn new(deci: i16) -> Self {
        DeciCelsius(deci)
    }

    /// Raw deci-degree value
    #[inline]
    pub const fn get(self) -> i16 {
        self.0
    }

    /// Degrees Celsius, for display only
    #[inline]
    pub fn as_celsius(self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl From<DeciCelsius> for i16 {
    fn from(value: DeciCelsius) -> Self {
        value.0
    }
}

impl Debug for DeciCelsius {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d°C", self.0)
    }
}

impl Display for DeciCelsius {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let deci = self.0 as i32;
        let sign = if deci < 0 { "-" } else { "" };
        let abs = deci.abs();
        write!(f, "{}{}.{}°C", sign, abs / 10, abs % 10)
    }
}

/// Snapshot of the most recent acquisition
///
/// When `valid` is false, `value` still holds the last validated
/// temperature. A failed read never resets it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Last validated temperature
    pub value: DeciCelsius,
    /// When `value` was validated
    pub timestamp: Timestamp,
    /// Whether the most recent cycle produced `value`
    pub valid: bool,
    /// Reason the most recent cycle failed, if it did
    pub error: Option<String>,
}

impl Reading {
    /// Initial store contents: invalid, zero, no error
    pub fn new() -> Self {
        Reading {
            value: DeciCelsius::ZERO,
            timestamp: Timestamp::ZERO,
            valid: false,
            error: None,
        }
    }

    /// Commit a validated value
    pub fn accept(&mut self, value: DeciCelsius, now: Timestamp) {
        self.value = value;
        self.timestamp = now;
        self.valid = true;
        self.error = None;
    }

    /// Mark the reading invalid, keeping the last good value and timestamp
    pub fn invalidate(&mut self, reason: impl Into<String>) {
        self.valid = false;
        self.error = Some(reason.into());
    }

    /// Age of the stored value
    pub fn age(&self, now: Timestamp) -> std::time::Duration {
        now - self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_positive() {
        assert_eq!(DeciCelsius(264).to_string(), "26.4°C");
        assert_eq!(DeciCelsius(1250).to_string(), "125.0°C");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(DeciCelsius(-150).to_string(), "-15.0°C");
        assert_eq!(DeciCelsius(-5).to_string(), "-0.5°C");
        assert_eq!(DeciCelsius(-400).to_string(), "-40.0°C");
    }

    #[test]
    fn test_as_celsius() {
        assert!((DeciCelsius(261).as_celsius() - 26.1).abs() < 0.01);
        assert!((DeciCelsius(-150).as_celsius() + 15.0).abs() < 0.01);
    }

    #[test]
    fn test_new_reading_is_invalid_zero() {
        let reading = Reading::new();
        assert_eq!(reading.value, DeciCelsius::ZERO);
        assert!(!reading.valid);
        assert!(reading.error.is_none());
        assert_eq!(reading.timestamp, Timestamp::ZERO);
    }

    #[test]
    fn test_invalidate_keeps_value() {
        let mut reading = Reading::new();
        reading.accept(DeciCelsius(100), Timestamp::from_millis(10));
        reading.invalidate("Timeout");

        assert_eq!(reading.value, DeciCelsius(100));
        assert_eq!(reading.timestamp, Timestamp::from_millis(10));
        assert!(!reading.valid);
        assert_eq!(reading.error.as_deref(), Some("Timeout"));
    }

    #[test]
    fn test_accept_clears_error() {
        let mut reading = Reading::new();
        reading.invalidate("CRC error");
        reading.accept(DeciCelsius(-150), Timestamp::from_millis(5));

        assert!(reading.valid);
        assert!(reading.error.is_none());
        assert_eq!(reading.age(Timestamp::from_millis(25)).as_millis(), 20);
    }
}
