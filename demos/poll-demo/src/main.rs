//! Tempwire Poll Demo
//!
//! Polls a simulated sensor through the acquisition engine and prints every
//! cycle. Options:
//!   --async              poll through request_async / fetch_result
//!   --json               one JSON object per cycle on stdout
//!   --profile <name>     good | poor | hostile (default poor)
//!   --seed <n>           chaos seed (default 1)
//!   --cycles <n>         stop after n cycles (default 40)
//!   --interval-ms <n>    poll interval (default 250)
//!   --address <n>        device address (default 3)
//!
//! Log level follows RUST_LOG, e.g. `RUST_LOG=tempwire_runtime=debug`.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tempwire_core::{Reading, SensorConfig};
use tempwire_runtime::{AcquisitionEngine, ChannelSink};
use tempwire_test::{ChaosConfig, ChaosTransport};

struct Options {
    async_mode: bool,
    json: bool,
    profile: String,
    seed: u64,
    cycles: u32,
    interval: Duration,
    address: u8,
}

impl Options {
    fn parse() -> Result<Self, Box<dyn Error>> {
        let mut options = Options {
            async_mode: false,
            json: false,
            profile: "poor".to_string(),
            seed: 1,
            cycles: 40,
            interval: Duration::from_millis(250),
            address: 3,
        };

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("{} needs a value", arg));
            match arg.as_str() {
                "--async" => options.async_mode = true,
                "--json" => options.json = true,
                "--profile" => options.profile = value()?,
                "--seed" => options.seed = value()?.parse()?,
                "--cycles" => options.cycles = value()?.parse()?,
                "--interval-ms" => options.interval = Duration::from_millis(value()?.parse()?),
                "--address" => options.address = value()?.parse()?,
                other => return Err(format!("unknown option {}", other).into()),
            }
        }
        Ok(options)
    }

    fn chaos(&self) -> Result<ChaosConfig, Box<dyn Error>> {
        match self.profile.as_str() {
            "good" => Ok(ChaosConfig::good()),
            "poor" => Ok(ChaosConfig::poor()),
            "hostile" => Ok(ChaosConfig::hostile()),
            other => Err(format!("unknown profile {}", other).into()),
        }
    }
}

#[derive(Serialize)]
struct CycleLine<'a> {
    cycle: u32,
    ok: bool,
    connected: bool,
    consecutive_rejections: u32,
    reading: &'a Reading,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = Options::parse()?;
    let config = SensorConfig::new(options.address)?;
    let transport = ChaosTransport::new(options.chaos()?, options.seed);
    let engine = Arc::new(AcquisitionEngine::new(transport.clone(), config)?);

    let (sink, mut updates) = ChannelSink::new();
    engine.bind_sink(Arc::new(sink));
    let observer = tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(update) = updates.recv().await {
            count += 1;
            debug!("published {} (valid: {})", update.value, update.valid);
        }
        count
    });

    info!(
        "polling device {} every {:?} ({} mode, {} bus)",
        options.address,
        options.interval,
        if options.async_mode { "async" } else { "sync" },
        options.profile
    );

    let mut ticker = tokio::time::interval(options.interval);
    for cycle in 0..options.cycles {
        ticker.tick().await;

        let polled = engine.clone();
        let async_mode = options.async_mode;
        let ok = tokio::task::spawn_blocking(move || {
            if async_mode {
                if !polled.request_async() {
                    return false;
                }
                while !polled.is_complete() {
                    std::thread::yield_now();
                }
                polled.fetch_result().1
            } else {
                polled.read_synchronous()
            }
        })
        .await?;

        let reading = engine.last_reading();
        let fault = engine.fault_state();
        if options.json {
            let line = CycleLine {
                cycle,
                ok,
                connected: fault.connected,
                consecutive_rejections: fault.consecutive_rejections,
                reading: &reading,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else if ok {
            println!("#{:<4} {}", cycle, reading.value);
        } else {
            println!(
                "#{:<4} {} (stale: {}){}",
                cycle,
                reading.value,
                reading.error.as_deref().unwrap_or("no reading yet"),
                if fault.connected { "" } else { " [disconnected]" }
            );
        }
    }

    engine.unbind();
    let published = observer.await?;

    let stats = engine.stats();
    info!(
        "done: {} cycles, {} accepted, {} published, bus fault rate {:.1}%",
        stats.cycles,
        stats.accepted,
        published,
        transport.stats().fault_rate() * 100.0
    );
    Ok(())
}
