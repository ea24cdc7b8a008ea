//! # rctclient
//!
//! Client for RCT Power inverters, which speak a binary frame protocol over
//! TCP (port 8899 by default). This library provides the frame codec, the
//! registry of known object IDs, value decoding and a device simulator.
//!
//! ## Features
//!
//! - Incremental frame parsing with escaping and CRC checks
//! - Typed decoding of scalar values, strings, time series and event tables
//! - Blocking client with timeouts
//! - Multi-client simulator for testing without hardware
//!
//! ## Example
//!
//! ```no_run
//! use rctclient::core::{RctClient, REGISTRY};
//! use std::time::Duration;
//!
//! let info = REGISTRY.get_by_name("battery.soc")?;
//! let mut client = RctClient::connect("192.168.0.10", 8899, Duration::from_secs(2))?;
//! println!("{}: {}", info.name, client.read_value(info)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging on stderr with appropriate verbosity
pub fn setup_logging(debug: bool, verbose: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
