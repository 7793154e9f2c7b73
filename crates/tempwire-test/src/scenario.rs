//! Scenario runner - drives an engine over a chaos transport on a manual
//! clock and checks the store, tracker and bindings after every cycle

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use tempwire_core::{
    DeciCelsius, Reading, SensorConfig, TempwireError, DISCONNECT_THRESHOLD, TEMP_MAX, TEMP_MIN,
};
use tempwire_runtime::{
    slot_pair, AcquisitionEngine, ChannelSink, EngineStats, PublishSink, Published, SlotBinding,
    ValidSlot, ValueSlot,
};
use tempwire_time::{Clock, ManualClock};

use crate::chaos::{ChaosConfig, ChaosStats, ChaosTransport};

/// A scenario failed to build or an invariant broke
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] TempwireError),

    #[error("cycle {cycle}: {detail}")]
    Invariant { cycle: u32, detail: String },
}

pub type ScenarioResult<T> = std::result::Result<T, ScenarioError>;

/// Which facade the runner polls through
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollMode {
    Synchronous,
    /// `request_async` followed by `fetch_result`
    Asynchronous,
}

/// Scenario builder
pub struct ScenarioBuilder {
    chaos: ChaosConfig,
    sensor: SensorConfig,
    seed: u64,
    cycles: u32,
    poll_interval: Duration,
    mode: PollMode,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        ScenarioBuilder {
            chaos: ChaosConfig::default(),
            sensor: SensorConfig::default(),
            seed: 0,
            cycles: 1000,
            poll_interval: Duration::from_millis(500),
            mode: PollMode::Synchronous,
        }
    }

    /// Set bus and sensor conditions
    pub fn with_chaos(mut self, chaos: ChaosConfig) -> Self {
        self.chaos = chaos;
        self
    }

    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(self) -> ScenarioResult<Scenario> {
        let transport = ChaosTransport::new(self.chaos, self.seed);
        let clock = ManualClock::new();
        let engine = AcquisitionEngine::with_clock(transport.clone(), clock.clone(), self.sensor)?;

        let (value, valid) = slot_pair();
        let (channel, updates) = ChannelSink::new();
        let slots: Arc<dyn PublishSink> =
            Arc::new(SlotBinding::new(Some(value.clone()), Some(valid.clone())));
        let channel: Arc<dyn PublishSink> = Arc::new(channel);
        engine.bind_sink(Arc::new(Fanout(vec![slots, channel])));

        Ok(Scenario {
            engine,
            transport,
            clock,
            value,
            valid,
            updates,
            cycles: self.cycles,
            poll_interval: self.poll_interval,
            mode: self.mode,
        })
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes to every inner sink in order
struct Fanout(Vec<Arc<dyn PublishSink>>);

impl PublishSink for Fanout {
    fn publish(&self, value: DeciCelsius, valid: bool) {
        for sink in &self.0 {
            sink.publish(value, valid);
        }
    }
}

/// Summary of a finished run
#[derive(Clone, Debug)]
pub struct ScenarioReport {
    pub cycles: u32,
    pub accepted: u32,
    pub failed: u32,
    /// Transitions from connected to disconnected
    pub disconnects: u32,
    pub longest_failure_streak: u32,
    pub engine: EngineStats,
    pub chaos: ChaosStats,
    pub elapsed: Duration,
}

impl ScenarioReport {
    /// Share of cycles that produced a valid reading
    pub fn availability(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.accepted as f64 / self.cycles as f64
        }
    }
}

/// A built scenario, ready to run
pub struct Scenario {
    engine: AcquisitionEngine<ChaosTransport, ManualClock>,
    transport: ChaosTransport,
    clock: ManualClock,
    value: ValueSlot,
    valid: ValidSlot,
    updates: UnboundedReceiver<Published>,
    cycles: u32,
    poll_interval: Duration,
    mode: PollMode,
}

impl Scenario {
    pub fn engine(&self) -> &AcquisitionEngine<ChaosTransport, ManualClock> {
        &self.engine
    }

    pub fn transport(&self) -> &ChaosTransport {
        &self.transport
    }

    /// Run every cycle, stopping at the first broken invariant
    pub fn run(&mut self) -> ScenarioResult<ScenarioReport> {
        let mut accepted = 0;
        let mut disconnects = 0;
        let mut streak = 0;
        let mut longest_failure_streak = 0;

        for cycle in 0..self.cycles {
            let before = self.engine.last_reading();
            let was_connected = self.engine.is_connected();
            self.clock.advance(self.poll_interval);

            let ok = self.poll();
            let after = self.engine.last_reading();
            self.check(cycle, ok, &before, &after)?;

            if ok {
                accepted += 1;
                streak = 0;
            } else {
                streak += 1;
                longest_failure_streak = longest_failure_streak.max(streak);
            }
            if was_connected && !self.engine.is_connected() {
                disconnects += 1;
            }
        }

        Ok(ScenarioReport {
            cycles: self.cycles,
            accepted,
            failed: self.cycles - accepted,
            disconnects,
            longest_failure_streak,
            engine: self.engine.stats(),
            chaos: self.transport.stats(),
            elapsed: Duration::from_micros(self.clock.now().as_micros()),
        })
    }

    fn poll(&self) -> bool {
        match self.mode {
            PollMode::Synchronous => self.engine.read_synchronous(),
            PollMode::Asynchronous => {
                if !self.engine.request_async() {
                    return false;
                }
                let (_, ok) = self.engine.fetch_result();
                ok
            }
        }
    }

    fn check(&mut self, cycle: u32, ok: bool, before: &Reading, after: &Reading) -> ScenarioResult<()> {
        let fail = |detail: String| Err(ScenarioError::Invariant { cycle, detail });

        if ok != after.valid {
            return fail(format!("cycle reported {} but store valid={}", ok, after.valid));
        }
        if ok {
            if after.error.is_some() {
                return fail(format!("valid reading carries error {:?}", after.error));
            }
            if !(TEMP_MIN..=TEMP_MAX).contains(&after.value.get()) {
                return fail(format!("accepted {} outside range", after.value));
            }
            if after.timestamp != self.clock.now() {
                return fail("accepted value not stamped with cycle time".into());
            }
        } else {
            if after.value != before.value || after.timestamp != before.timestamp {
                return fail(format!(
                    "failed cycle moved value {} -> {}",
                    before.value, after.value
                ));
            }
            if after.error.is_none() {
                return fail("failed cycle left no error".into());
            }
        }

        let state = self.engine.fault_state();
        if state.connected != (state.consecutive_rejections < DISCONNECT_THRESHOLD) {
            return fail(format!(
                "connected={} with {} consecutive rejections",
                state.connected, state.consecutive_rejections
            ));
        }

        if self.valid.load(Ordering::Acquire) != after.valid
            || self.value.load(Ordering::Acquire) != after.value.get()
        {
            return fail("bound slots diverge from the store".into());
        }

        let published = match self.updates.try_recv() {
            Ok(p) => p,
            Err(_) => return fail("cycle published nothing".into()),
        };
        if published.valid != after.valid || published.value != after.value {
            return fail(format!("published {:?} for {:?}", published, after));
        }
        if self.updates.try_recv().is_ok() {
            return fail("cycle published twice".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_good_conditions() {
        let report = ScenarioBuilder::new()
            .with_chaos(ChaosConfig::good())
            .with_seed(1)
            .with_cycles(2000)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.cycles, 2000);
        assert!(report.availability() > 0.99, "{:?}", report);
        assert_eq!(report.engine.cycles, 2000);
        assert_eq!(report.accepted as u64, report.engine.accepted);
    }

    #[test]
    fn test_hostile_conditions_hold_invariants() {
        let mut scenario = ScenarioBuilder::new()
            .with_chaos(ChaosConfig::hostile())
            .with_seed(12345)
            .with_cycles(3000)
            .build()
            .unwrap();
        let report = scenario.run().unwrap();

        println!("Report: {:?}", report);
        assert!(report.disconnects > 0);
        assert!(report.longest_failure_streak >= DISCONNECT_THRESHOLD);
        assert!(report.accepted > 0);
        assert_eq!(
            report.engine.sensor_faults,
            report.chaos.zero_values + report.chaos.all_ones
        );
        assert_eq!(report.engine.range_violations, report.chaos.out_of_range);
    }

    #[test]
    fn test_async_mode_matches_sync() {
        let run = |mode| {
            ScenarioBuilder::new()
                .with_chaos(ChaosConfig::poor())
                .with_seed(77)
                .with_cycles(1000)
                .with_mode(mode)
                .build()
                .unwrap()
                .run()
                .unwrap()
        };
        let sync = run(PollMode::Synchronous);
        let asynchronous = run(PollMode::Asynchronous);

        assert_eq!(sync.accepted, asynchronous.accepted);
        assert_eq!(sync.disconnects, asynchronous.disconnects);
        assert_eq!(asynchronous.engine.abandoned, 0);
    }

    #[test]
    fn test_invalid_sensor_config() {
        let result = ScenarioBuilder::new()
            .with_sensor(SensorConfig::default().with_address(0))
            .build();
        assert!(matches!(
            result,
            Err(ScenarioError::Config(TempwireError::InvalidAddress(0)))
        ));
    }

    #[test]
    fn test_report_elapsed_follows_interval() {
        let report = ScenarioBuilder::new()
            .with_chaos(ChaosConfig::perfect())
            .with_cycles(10)
            .with_poll_interval(Duration::from_secs(2))
            .build()
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.elapsed, Duration::from_secs(20));
        assert_eq!(report.availability(), 1.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_invariants_hold_for_any_seed(seed in any::<u64>(), hostile in any::<bool>()) {
            let chaos = if hostile { ChaosConfig::hostile() } else { ChaosConfig::poor() };
            let report = ScenarioBuilder::new()
                .with_chaos(chaos)
                .with_seed(seed)
                .with_cycles(300)
                .build()
                .unwrap()
                .run();
            prop_assert!(report.is_ok(), "{:?}", report.err());
        }
    }
}
