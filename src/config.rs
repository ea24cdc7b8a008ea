//! Configuration management for the RCT client
//!
//! Centralizes configuration options and provides validation.

use crate::{
    cli::{Args, Command},
    error::RctError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port RCT devices listen on
pub const DEFAULT_PORT: u16 = 8899;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Enable informational logging and detailed output
    pub verbose: bool,
    /// Device connection configuration
    pub client: ClientConfig,
    /// Simulator configuration
    pub simulator: SimulatorConfig,
}

/// Device connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host name or IP address of the device
    pub host: String,
    /// TCP port of the device
    pub port: u16,
    /// Seconds to wait for a response
    pub timeout_secs: u64,
}

/// Simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to, 0 picks a free port
    pub port: u16,
    /// Clients served at the same time
    pub max_clients: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: false,
            client: ClientConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            timeout_secs: 2,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            max_clients: 5,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, RctError> {
        let mut config = Self {
            debug: args.debug,
            ..Self::default()
        };

        // Override with command-specific options
        match &args.command {
            Command::ReadValue(read) => {
                if read.id.is_some() == read.name.is_some() {
                    return Err(RctError::validation("Please specify either --id or --name"));
                }
                config.verbose = read.verbose;
                config.client.host.clone_from(&read.host);
                config.client.port = read.port;
                config.client.timeout_secs = read.timeout;
            }
            Command::Simulator(sim) => {
                config.verbose = sim.verbose;
                config.simulator.host.clone_from(&sim.host);
                config.simulator.port = sim.port;
            }
            Command::Completions { .. } => {}
        }

        config.validate(&args.command)?;
        Ok(config)
    }

    /// Validate configuration for the given command
    pub fn validate(&self, command: &Command) -> Result<(), RctError> {
        if let Command::ReadValue(_) = command {
            if self.client.host.trim().is_empty() {
                return Err(RctError::config("Device host must not be empty"));
            }
            if self.client.port == 0 {
                return Err(RctError::config("Device port must not be 0"));
            }
            if self.client.timeout_secs == 0 {
                return Err(RctError::config("Timeout must be at least one second"));
            }
        }

        if let Command::Simulator(_) = command {
            if self.simulator.max_clients == 0 {
                return Err(RctError::config("Simulator must accept at least one client"));
            }
        }

        Ok(())
    }
}
