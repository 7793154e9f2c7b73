//! Acquisition Engine - one register read, classified, tracked and published

use std::sync::atomic::{AtomicBool, AtomicI16};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use tempwire_core::{
    classify, DeciCelsius, FaultState, FaultTracker, Reading, SensorConfig, TempwireResult,
    Timestamp,
};
use tempwire_time::{Clock, MonotonicClock};
use tempwire_transport::{ReadRequest, RegisterTransport};

use crate::cycle::PhaseCell;
use crate::{CycleFailure, CycleOutcome, CyclePhase, PublishSink, SlotBinding, ValidSlot, ValueSlot};

/// Counters over the engine's lifetime
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub cycles: u64,
    pub accepted: u64,
    pub transport_failures: u64,
    pub empty_replies: u64,
    pub sensor_faults: u64,
    pub range_violations: u64,
    /// Async cycles that exceeded the timeout
    pub abandoned: u64,
    /// Late results of abandoned cycles, discarded
    pub discarded: u64,
    /// Async cycles that found the bus held by an abandoned read
    pub bus_busy: u64,
}

/// Reading store and fault tracker, committed together
#[derive(Debug)]
struct Store {
    reading: Reading,
    tracker: FaultTracker,
}

/// Bookkeeping for the async facade; phase changes happen under its lock
#[derive(Debug, Default)]
struct AsyncSlot {
    /// Bumped on every async request and every abandonment
    generation: u64,
    started_at: Timestamp,
    /// Success of the completed cycle, until fetched
    outcome: Option<bool>,
}

/// Polled temperature acquisition for one device
///
/// All operations take `&self`; the engine can be shared across threads
/// (one polling, others reading status) when the transport is `Send`.
pub struct AcquisitionEngine<T, C = MonotonicClock> {
    /// Held for a whole cycle, so cycles never interleave
    transport: Mutex<T>,
    clock: C,
    config: RwLock<SensorConfig>,
    store: RwLock<Store>,
    phase: PhaseCell,
    async_slot: Mutex<AsyncSlot>,
    binding: RwLock<Option<Arc<dyn PublishSink>>>,
    stats: Mutex<EngineStats>,
}

impl<T: RegisterTransport> AcquisitionEngine<T, MonotonicClock> {
    /// Engine on the system monotonic clock
    pub fn new(transport: T, config: SensorConfig) -> TempwireResult<Self> {
        Self::with_clock(transport, MonotonicClock::new(), config)
    }
}

impl<T: RegisterTransport, C: Clock> AcquisitionEngine<T, C> {
    /// Engine with an injected clock
    pub fn with_clock(transport: T, clock: C, config: SensorConfig) -> TempwireResult<Self> {
        config.validate()?;
        debug!(
            "engine created for device {} (timeout {:?}, retries {})",
            config.address, config.timeout, config.retries
        );

        Ok(AcquisitionEngine {
            transport: Mutex::new(transport),
            clock,
            config: RwLock::new(config),
            store: RwLock::new(Store {
                reading: Reading::new(),
                tracker: FaultTracker::new(),
            }),
            phase: PhaseCell::new(),
            async_slot: Mutex::new(AsyncSlot::default()),
            binding: RwLock::new(None),
            stats: Mutex::new(EngineStats::default()),
        })
    }

    /// Replace the configuration; invalid configs leave the old one in place
    pub fn configure(&self, config: SensorConfig) -> TempwireResult<()> {
        config.validate()?;
        *self.config.write() = config;
        debug!("device {} reconfigured", config.address);
        Ok(())
    }

    pub fn config(&self) -> SensorConfig {
        *self.config.read()
    }

    pub fn device_address(&self) -> u8 {
        self.config.read().address
    }

    /// Run one full cycle; true iff the device returned a valid value
    pub fn read_synchronous(&self) -> bool {
        let mut transport = self.transport.lock();
        let outcome = self.acquire(&mut transport);
        self.commit(&outcome, self.clock.now())
    }

    /// Begin a cycle unless one is already in flight and not yet stale
    ///
    /// A stale in-flight cycle is abandoned first. The new cycle never
    /// waits for the bus: if the abandoned read still holds it, the cycle
    /// fails at once with "Bus busy".
    pub fn request_async(&self) -> bool {
        self.expire_in_flight(self.clock.now());

        let generation = {
            let mut slot = self.async_slot.lock();
            let observed = self.phase.load();
            if observed == CyclePhase::InFlight {
                return false;
            }
            if !self.phase.transition(observed, CyclePhase::InFlight) {
                return false;
            }
            slot.generation = slot.generation.wrapping_add(1);
            slot.started_at = self.clock.now();
            slot.outcome = None;
            slot.generation
        };

        self.run_async_cycle(generation);
        true
    }

    /// False only while an async cycle is in flight and within its timeout
    pub fn is_complete(&self) -> bool {
        let slot = self.async_slot.lock();
        match self.phase.load() {
            CyclePhase::InFlight => self.clock.now() - slot.started_at > self.config().timeout,
            CyclePhase::Idle | CyclePhase::Complete => true,
        }
    }

    /// Result of the last async cycle
    ///
    /// - Complete: the cycle's reading and success, phase back to Idle
    /// - Idle: the last reading and its validity
    /// - In flight past the timeout: abandoned, reported as "Timeout"
    /// - In flight within the timeout: the last reading, `false`
    pub fn fetch_result(&self) -> (Reading, bool) {
        let mut slot = self.async_slot.lock();
        match self.phase.load() {
            CyclePhase::Complete => {
                let success = slot.outcome.take().unwrap_or(false);
                self.phase.store(CyclePhase::Idle);
                drop(slot);
                (self.last_reading(), success)
            }
            CyclePhase::Idle => {
                drop(slot);
                let reading = self.last_reading();
                let valid = reading.valid;
                (reading, valid)
            }
            CyclePhase::InFlight => {
                drop(slot);
                self.expire_in_flight(self.clock.now());
                (self.last_reading(), false)
            }
        }
    }

    /// Current async phase
    pub fn phase(&self) -> CyclePhase {
        self.phase.load()
    }

    /// Committed reading; never a partially applied cycle
    pub fn last_reading(&self) -> Reading {
        self.store.read().reading.clone()
    }

    /// Last validated temperature, stale or not
    pub fn last_value(&self) -> DeciCelsius {
        self.store.read().reading.value
    }

    pub fn is_connected(&self) -> bool {
        self.store.read().tracker.is_connected()
    }

    pub fn fault_state(&self) -> FaultState {
        self.store.read().tracker.state()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats.lock().clone()
    }

    /// Bind caller-owned cells, replacing any previous binding
    ///
    /// Binding only one of the two cells is accepted but almost certainly
    /// a mistake, so it is logged.
    pub fn bind(&self, value_slot: Option<ValueSlot>, valid_slot: Option<ValidSlot>) {
        let address = self.device_address();
        let (value_bound, valid_bound) = (value_slot.is_some(), valid_slot.is_some());
        let binding = SlotBinding::new(value_slot, valid_slot);

        if binding.is_empty() {
            debug!("device {}: temperature slots unbound", address);
            *self.binding.write() = None;
            return;
        }
        if binding.is_partial() {
            warn!(
                "device {}: partial binding (value slot bound: {}, valid slot bound: {})",
                address, value_bound, valid_bound
            );
        } else {
            debug!("device {}: temperature slots bound", address);
        }
        *self.binding.write() = Some(Arc::new(binding));
    }

    /// Install any publish sink, replacing the current one
    pub fn bind_sink(&self, sink: Arc<dyn PublishSink>) {
        *self.binding.write() = Some(sink);
    }

    pub fn unbind(&self) {
        self.bind(None, None);
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    /// Read and classify the temperature register
    fn acquire(&self, transport: &mut T) -> CycleOutcome {
        let address = self.device_address();
        let request = ReadRequest::temperature(address);

        match transport.read_registers(&request) {
            Err(e) => Err(CycleFailure::Transport(e)),
            Ok(registers) => match registers.first() {
                None => Err(CycleFailure::NoData),
                Some(&raw) => {
                    let class = classify(raw);
                    debug!(
                        "device {}: raw 0x{:04X} ({}) -> {:?}",
                        address, raw, raw as i16, class
                    );
                    class.into_result().map_err(CycleFailure::Rejected)
                }
            },
        }
    }

    /// Async cycle body. The generation check, the store update and the
    /// move to Complete happen under the async slot lock, so an abandoned
    /// cycle can never commit.
    fn run_async_cycle(&self, generation: u64) -> bool {
        let mut transport = self.transport.try_lock();
        let outcome = match transport.as_deref_mut() {
            Some(transport) => self.acquire(transport),
            None => {
                warn!(
                    "device {}: bus still held by an abandoned read",
                    self.device_address()
                );
                Err(CycleFailure::BusBusy)
            }
        };
        let now = self.clock.now();

        let mut slot = self.async_slot.lock();
        if slot.generation != generation {
            drop(slot);
            debug!(
                "device {}: discarding result of abandoned cycle",
                self.device_address()
            );
            self.stats.lock().discarded += 1;
            return false;
        }
        let (value, valid) = self.apply(&outcome, now);
        slot.outcome = Some(valid);
        self.phase.store(CyclePhase::Complete);
        drop(slot);
        drop(transport);

        self.record(&outcome);
        self.publish(value, valid);
        valid
    }

    /// Abandon the in-flight async cycle if it is older than the timeout
    fn expire_in_flight(&self, now: Timestamp) -> bool {
        let timeout = self.config().timeout;
        let mut slot = self.async_slot.lock();
        if self.phase.load() != CyclePhase::InFlight || now - slot.started_at <= timeout {
            return false;
        }

        warn!(
            "device {}: async cycle exceeded {:?}, abandoning",
            self.device_address(),
            timeout
        );
        slot.generation = slot.generation.wrapping_add(1);
        slot.outcome = None;
        self.phase.store(CyclePhase::Idle);
        let (value, valid) = self.apply(&Err(CycleFailure::Abandoned), now);
        drop(slot);

        self.stats.lock().abandoned += 1;
        self.publish(value, valid);
        true
    }

    /// Apply, record and publish an outcome
    fn commit(&self, outcome: &CycleOutcome, now: Timestamp) -> bool {
        let (value, valid) = self.apply(outcome, now);
        self.record(outcome);
        self.publish(value, valid);
        valid
    }

    /// Update store and tracker in one write; returns what to publish
    fn apply(&self, outcome: &CycleOutcome, now: Timestamp) -> (DeciCelsius, bool) {
        let address = self.device_address();
        let mut store = self.store.write();
        let was_connected = store.tracker.is_connected();

        match outcome {
            Ok(value) => {
                store.reading.accept(*value, now);
                store.tracker.on_success();
                if !was_connected {
                    info!("device {}: reconnected at {}", address, value);
                }
                (*value, true)
            }
            Err(failure) => {
                store.tracker.on_rejection(now);
                store.reading.invalidate(failure.to_string());
                Self::log_failure(address, failure, &store.tracker, was_connected);
                (store.reading.value, false)
            }
        }
    }

    fn log_failure(address: u8, failure: &CycleFailure, tracker: &FaultTracker, was_connected: bool) {
        let streak = tracker.consecutive_rejections();
        match failure {
            CycleFailure::Transport(e) => {
                warn!("device {}: transport failure: {}", address, e);
            }
            _ if streak <= 1 => {
                debug!("device {}: {} (first rejection)", address, failure);
            }
            _ => {
                warn!("device {}: {} ({} in a row)", address, failure, streak);
            }
        }
        if was_connected && !tracker.is_connected() {
            error!(
                "device {}: disconnected after {} consecutive failures",
                address, streak
            );
        }
    }

    fn record(&self, outcome: &CycleOutcome) {
        let mut stats = self.stats.lock();
        match outcome {
            Ok(_) => stats.accepted += 1,
            Err(CycleFailure::Transport(_)) => stats.transport_failures += 1,
            Err(CycleFailure::NoData) => stats.empty_replies += 1,
            Err(CycleFailure::Rejected(r)) if r.is_sensor_fault() => stats.sensor_faults += 1,
            Err(CycleFailure::Rejected(_)) => stats.range_violations += 1,
            // No bus cycle ran for these
            Err(CycleFailure::Abandoned) => return,
            Err(CycleFailure::BusBusy) => {
                stats.bus_busy += 1;
                return;
            }
        }
        stats.cycles += 1;
    }

    fn publish(&self, value: DeciCelsius, valid: bool) {
        let sink = self.binding.read().clone();
        if let Some(sink) = sink {
            sink.publish(value, valid);
        }
    }
}

/// Fresh value/valid cells, ready for `bind`
pub fn slot_pair() -> (ValueSlot, ValidSlot) {
    (Arc::new(AtomicI16::new(0)), Arc::new(AtomicBool::new(false)))
}
