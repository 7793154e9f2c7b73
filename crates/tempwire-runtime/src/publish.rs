//! Publish bindings - push the latest value/validity pair to observers
//!
//! Sinks are evaluated synchronously at the end of every cycle. The
//! engine never owns the memory behind a slot; callers hand it shared
//! atomics and keep their own handles.

use std::sync::atomic::{AtomicBool, AtomicI16, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use tempwire_core::DeciCelsius;

/// Caller-owned temperature cell, deci-degrees
pub type ValueSlot = Arc<AtomicI16>;

/// Caller-owned validity cell
pub type ValidSlot = Arc<AtomicBool>;

/// Observer of committed cycle results
///
/// `value` is the last validated temperature. When `valid` is false it is
/// stale and sinks that mirror a value cell must leave that cell alone.
pub trait PublishSink: Send + Sync {
    fn publish(&self, value: DeciCelsius, valid: bool);
}

impl<F> PublishSink for F
where
    F: Fn(DeciCelsius, bool) + Send + Sync,
{
    fn publish(&self, value: DeciCelsius, valid: bool) {
        self(value, valid)
    }
}

/// Direct-write adapter over a pair of caller-owned cells
#[derive(Clone, Debug, Default)]
pub struct SlotBinding {
    value: Option<ValueSlot>,
    valid: Option<ValidSlot>,
}

impl SlotBinding {
    pub fn new(value: Option<ValueSlot>, valid: Option<ValidSlot>) -> Self {
        SlotBinding { value, valid }
    }

    /// Exactly one of the two slots is set
    pub fn is_partial(&self) -> bool {
        self.value.is_some() != self.valid.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.valid.is_none()
    }
}

impl PublishSink for SlotBinding {
    fn publish(&self, value: DeciCelsius, valid: bool) {
        // Value first, so a reader that sees `valid` also sees the value
        if valid {
            if let Some(slot) = &self.value {
                slot.store(value.get(), Ordering::Release);
            }
        }
        if let Some(slot) = &self.valid {
            slot.store(valid, Ordering::Release);
        }
    }
}

/// One published update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Published {
    pub value: DeciCelsius,
    pub valid: bool,
}

/// Queue adapter: every update is sent over an unbounded channel
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Published>,
}

impl ChannelSink {
    /// Sink plus the receiving end for the observer
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Published>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl PublishSink for ChannelSink {
    fn publish(&self, value: DeciCelsius, valid: bool) {
        if self.tx.send(Published { value, valid }).is_err() {
            tracing::trace!("publish receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_binding_valid_writes_both() {
        let value = Arc::new(AtomicI16::new(0));
        let valid = Arc::new(AtomicBool::new(false));
        let binding = SlotBinding::new(Some(value.clone()), Some(valid.clone()));

        binding.publish(DeciCelsius(264), true);
        assert_eq!(value.load(Ordering::Acquire), 264);
        assert!(valid.load(Ordering::Acquire));
    }

    #[test]
    fn test_slot_binding_invalid_keeps_value() {
        let value = Arc::new(AtomicI16::new(0));
        let valid = Arc::new(AtomicBool::new(false));
        let binding = SlotBinding::new(Some(value.clone()), Some(valid.clone()));

        binding.publish(DeciCelsius(100), true);
        binding.publish(DeciCelsius(-999), false);
        assert_eq!(value.load(Ordering::Acquire), 100);
        assert!(!valid.load(Ordering::Acquire));
    }

    #[test]
    fn test_partial_binding_writes_what_it_has() {
        let valid = Arc::new(AtomicBool::new(true));
        let binding = SlotBinding::new(None, Some(valid.clone()));
        assert!(binding.is_partial());

        binding.publish(DeciCelsius(5), false);
        assert!(!valid.load(Ordering::Acquire));
        assert!(SlotBinding::default().is_empty());
    }

    #[test]
    fn test_channel_sink_queues_updates() {
        let (sink, mut rx) = ChannelSink::new();
        sink.publish(DeciCelsius(250), true);
        sink.publish(DeciCelsius(250), false);

        assert_eq!(
            rx.try_recv().unwrap(),
            Published {
                value: DeciCelsius(250),
                valid: true
            }
        );
        assert!(!rx.try_recv().unwrap().valid);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.publish(DeciCelsius(1), true);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(AtomicI16::new(0));
        let seen_in = seen.clone();
        let sink = move |value: DeciCelsius, _valid: bool| {
            seen_in.store(value.get(), Ordering::Relaxed);
        };
        sink.publish(DeciCelsius(42), true);
        assert_eq!(seen.load(Ordering::Relaxed), 42);
    }
}
