//! Chaos testing for the acquisition engine
//!
//! Simulates a misbehaving sensor and bus:
//! - Bus timeouts and CRC errors
//! - Device exceptions and empty replies
//! - Sensor sentinels (0x0000, 0xFFFF)
//! - Out-of-range values
//! - Bursts of faults, as from a loose sensor lead

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tempwire_core::{SENTINEL_ALL_ONES, SENTINEL_ZERO, TEMP_MAX, TEMP_MIN};
use tempwire_transport::{ReadRequest, RegisterTransport, TransportError, TransportResult};

/// Fault injection rates, each in 0.0 - 1.0 per read
#[derive(Clone, Debug)]
pub struct ChaosConfig {
    pub timeout_rate: f64,
    pub crc_rate: f64,
    /// Device answers with a Modbus exception
    pub exception_rate: f64,
    pub empty_rate: f64,
    pub zero_rate: f64,
    pub all_ones_rate: f64,
    pub out_of_range_rate: f64,
    /// Chance that a read starts a burst of sensor faults
    pub burst_fault_prob: f64,
    /// Burst length range, in reads
    pub burst_length: (u32, u32),
    /// Largest step of the simulated temperature per read, deci-degrees
    pub drift: i16,
    /// Simulated temperature at start, deci-degrees
    pub initial: i16,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        ChaosConfig {
            timeout_rate: 0.02,
            crc_rate: 0.01,
            exception_rate: 0.005,
            empty_rate: 0.005,
            zero_rate: 0.01,
            all_ones_rate: 0.01,
            out_of_range_rate: 0.01,
            burst_fault_prob: 0.01,
            burst_length: (2, 4),
            drift: 3,
            initial: 215,
        }
    }
}

impl ChaosConfig {
    /// Healthy sensor on a clean bus
    pub fn good() -> Self {
        ChaosConfig {
            timeout_rate: 0.001,
            crc_rate: 0.001,
            exception_rate: 0.0,
            empty_rate: 0.0,
            zero_rate: 0.001,
            all_ones_rate: 0.001,
            out_of_range_rate: 0.0,
            burst_fault_prob: 0.0,
            burst_length: (1, 1),
            ..Default::default()
        }
    }

    /// Long cable, noisy environment
    pub fn poor() -> Self {
        ChaosConfig {
            timeout_rate: 0.05,
            crc_rate: 0.05,
            exception_rate: 0.01,
            empty_rate: 0.01,
            zero_rate: 0.03,
            all_ones_rate: 0.03,
            out_of_range_rate: 0.02,
            burst_fault_prob: 0.05,
            burst_length: (3, 6),
            drift: 5,
            ..Default::default()
        }
    }

    /// Failing sensor; disconnects are expected
    pub fn hostile() -> Self {
        ChaosConfig {
            timeout_rate: 0.15,
            crc_rate: 0.1,
            exception_rate: 0.05,
            empty_rate: 0.05,
            zero_rate: 0.1,
            all_ones_rate: 0.1,
            out_of_range_rate: 0.05,
            burst_fault_prob: 0.15,
            burst_length: (3, 12),
            drift: 10,
            ..Default::default()
        }
    }

    /// No faults at all
    pub fn perfect() -> Self {
        ChaosConfig {
            timeout_rate: 0.0,
            crc_rate: 0.0,
            exception_rate: 0.0,
            empty_rate: 0.0,
            zero_rate: 0.0,
            all_ones_rate: 0.0,
            out_of_range_rate: 0.0,
            burst_fault_prob: 0.0,
            burst_length: (1, 1),
            ..Default::default()
        }
    }
}

/// What the chaos transport answered
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChaosStats {
    pub reads: u64,
    pub delivered: u64,
    pub timeouts: u64,
    pub crc_errors: u64,
    pub exceptions: u64,
    pub empty: u64,
    pub zero_values: u64,
    pub all_ones: u64,
    pub out_of_range: u64,
    pub bursts: u64,
}

impl ChaosStats {
    /// Reads that did not deliver a usable temperature
    pub fn faults(&self) -> u64 {
        self.reads - self.delivered
    }

    pub fn fault_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.faults() as f64 / self.reads as f64
        }
    }
}

struct ChaosState {
    config: ChaosConfig,
    rng: StdRng,
    /// Simulated true temperature
    temperature: i16,
    burst_remaining: u32,
    stats: ChaosStats,
}

/// Transport backed by a seeded random sensor model
///
/// Clones share the model, so a test can inspect it while the engine owns
/// another handle.
#[derive(Clone)]
pub struct ChaosTransport {
    state: Arc<Mutex<ChaosState>>,
}

impl ChaosTransport {
    pub fn new(config: ChaosConfig, seed: u64) -> Self {
        let temperature = config.initial.clamp(TEMP_MIN, TEMP_MAX);
        ChaosTransport {
            state: Arc::new(Mutex::new(ChaosState {
                config,
                rng: StdRng::seed_from_u64(seed),
                temperature,
                burst_remaining: 0,
                stats: ChaosStats::default(),
            })),
        }
    }

    pub fn good(seed: u64) -> Self {
        Self::new(ChaosConfig::good(), seed)
    }

    pub fn poor(seed: u64) -> Self {
        Self::new(ChaosConfig::poor(), seed)
    }

    pub fn hostile(seed: u64) -> Self {
        Self::new(ChaosConfig::hostile(), seed)
    }

    pub fn stats(&self) -> ChaosStats {
        self.state.lock().stats.clone()
    }

    /// Current simulated temperature, deci-degrees
    pub fn temperature(&self) -> i16 {
        self.state.lock().temperature
    }
}

impl ChaosState {
    fn read(&mut self) -> TransportResult<Vec<u16>> {
        self.stats.reads += 1;

        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            self.stats.all_ones += 1;
            return Ok(vec![SENTINEL_ALL_ONES]);
        }
        if self.rng.gen_bool(self.config.burst_fault_prob) {
            let (min, max) = self.config.burst_length;
            self.burst_remaining = self.rng.gen_range(min..=max.max(min)).saturating_sub(1);
            self.stats.bursts += 1;
            self.stats.all_ones += 1;
            return Ok(vec![SENTINEL_ALL_ONES]);
        }

        let roll: f64 = self.rng.gen();
        let mut edge = 0.0;
        let c = &self.config;

        edge += c.timeout_rate;
        if roll < edge {
            self.stats.timeouts += 1;
            return Err(TransportError::Timeout);
        }
        edge += c.crc_rate;
        if roll < edge {
            self.stats.crc_errors += 1;
            return Err(TransportError::CrcError);
        }
        edge += c.exception_rate;
        if roll < edge {
            self.stats.exceptions += 1;
            let code = self.rng.gen_range(1..=4u8);
            return Err(TransportError::from_exception_code(code)
                .unwrap_or(TransportError::SlaveDeviceFailure));
        }
        edge += c.empty_rate;
        if roll < edge {
            self.stats.empty += 1;
            return Ok(Vec::new());
        }
        edge += c.zero_rate;
        if roll < edge {
            self.stats.zero_values += 1;
            return Ok(vec![SENTINEL_ZERO]);
        }
        edge += c.all_ones_rate;
        if roll < edge {
            self.stats.all_ones += 1;
            return Ok(vec![SENTINEL_ALL_ONES]);
        }
        edge += c.out_of_range_rate;
        if roll < edge {
            self.stats.out_of_range += 1;
            let raw = if self.rng.gen_bool(0.5) {
                self.rng.gen_range(TEMP_MAX + 1..=i16::MAX)
            } else {
                self.rng.gen_range(i16::MIN..TEMP_MIN)
            };
            return Ok(vec![raw as u16]);
        }

        let step = self.rng.gen_range(-c.drift..=c.drift);
        let mut next = self.temperature.saturating_add(step).clamp(TEMP_MIN, TEMP_MAX);
        // 0x0000 and 0xFFFF are sentinels on the wire; a real sensor skips them
        if next == 0 || next == -1 {
            next = if step >= 0 { 1 } else { -2 };
        }
        self.temperature = next;
        self.stats.delivered += 1;
        Ok(vec![next as u16])
    }
}

impl RegisterTransport for ChaosTransport {
    fn read_registers(&mut self, _request: &ReadRequest) -> TransportResult<Vec<u16>> {
        self.state.lock().read()
    }
}
