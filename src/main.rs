//! bpmon: Blood Pressure Service client, host entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │   BleTransport (GattTransport + SettleTimer, btleplug)   │
//! │   LogEventSink (EventSink)                               │
//! │                                                          │
//! │   ─────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │   ┌──────────────────────────────────────────────────┐   │
//! │   │            BpsService (pure logic)               │   │
//! │   │   Orchestrator · Decoders                        │   │
//! │   └──────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use log::info;

use bpmon::adapters::ble_transport;
use bpmon::config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "bpmon", about = "Blood Pressure Service (0x1810) client")]
struct Cli {
    /// JSON configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connect to the first peripheral whose name or address contains this.
    #[arg(short, long)]
    device: Option<String>,

    /// Scan window in seconds.
    #[arg(long)]
    scan_secs: Option<u32>,

    /// Delay between the Measurement and RACP subscriptions, in ms.
    #[arg(long)]
    settle_ms: Option<u32>,

    /// Only subscribe to live measurements; skip stored records.
    #[arg(long)]
    no_records: bool,

    /// Decode measurements embedded in single-segment records.
    #[arg(long)]
    decode_embedded: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn into_config(self) -> Result<(ClientConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                ClientConfig::from_json(&json)?
            }
            None => ClientConfig::default(),
        };
        if self.device.is_some() {
            config.device_filter = self.device;
        }
        if let Some(secs) = self.scan_secs {
            config.scan_duration_secs = secs;
        }
        if let Some(ms) = self.settle_ms {
            config.session.settle_delay_ms = ms;
        }
        if self.no_records {
            config.session.enable_record_flow = false;
        }
        if self.decode_embedded {
            config.session.decode_embedded_measurements = true;
        }
        config.validate()?;
        Ok((config, self.print_config))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, print_only) = Cli::parse().into_config()?;
    if print_only {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    info!(
        "bpmon starting (settle {}ms, records {})",
        config.session.settle_delay_ms,
        if config.session.enable_record_flow { "on" } else { "off" }
    );
    ble_transport::run(&config).await
}
