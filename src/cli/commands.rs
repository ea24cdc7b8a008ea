//! Command implementations for the CLI

use crate::{
    cli::{Args, Command, ReadValueArgs},
    config::Config,
    core::{
        client::RctClient,
        registry::{ObjectInfo, REGISTRY},
        simulator::Simulator,
        value::Value,
    },
    error::{RctError, Result},
};
use anyhow::Context;
use clap::CommandFactory;
use clap_complete::Shell;
use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};
use tracing::{debug, info, instrument};

/// Execute the appropriate command based on CLI arguments
#[instrument(skip(config))]
pub fn execute_command(config: &Config, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::ReadValue(args) => execute_read_value_command(config, args),
        Command::Simulator(_) => execute_simulator_command(config),
        Command::Completions { shell, output } => {
            execute_completions_command(*shell, output.as_deref())
        }
    }
}

/// Execute the read-value command
#[instrument(skip(config, args))]
fn execute_read_value_command(config: &Config, args: &ReadValueArgs) -> anyhow::Result<()> {
    let info = resolve_object(args.id, args.name.as_deref())
        .context("Could not find requested id or name")?;
    debug!("Object info: {:?}", info);

    debug!("Connecting to host");
    let mut client = RctClient::connect(
        &config.client.host,
        config.client.port,
        config.client.timeout(),
    )
    .context("Could not connect to host")?;

    let value = client
        .read_value(info)
        .with_context(|| format!("Failed to read {}", info.name))?;

    let line = if config.verbose {
        format_verbose(info, &value, REGISTRY.name_max_length())
    } else {
        value.to_string()
    };
    writeln!(io::stdout().lock(), "{line}").context("Failed to write to stdout")?;
    Ok(())
}

/// Execute the simulator command
#[instrument(skip(config))]
fn execute_simulator_command(config: &Config) -> anyhow::Result<()> {
    let simulator = Simulator::bind(&config.simulator).context("Failed to start simulator")?;
    info!(
        "Simulator accepting up to {} clients",
        config.simulator.max_clients
    );
    simulator.serve().context("Simulator stopped")
}

/// Execute the completions command
#[instrument]
fn execute_completions_command(shell: Shell, output: Option<&Path>) -> anyhow::Result<()> {
    let mut command = Args::command();
    let name = command.get_name().to_string();

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            clap_complete::generate(shell, &mut command, name, &mut file);
            info!("Completion script written to {}", path.display());
        }
        None => clap_complete::generate(shell, &mut command, name, &mut io::stdout()),
    }
    Ok(())
}

/// Find the object selected by `--id` or `--name`
pub fn resolve_object(id: Option<u32>, name: Option<&str>) -> Result<&'static ObjectInfo> {
    match (id, name) {
        (Some(id), None) => {
            debug!("Parsed ID: 0x{:X}", id);
            REGISTRY.get_by_id(id)
        }
        (None, Some(name)) => REGISTRY.get_by_name(name),
        _ => Err(RctError::validation("Please specify either --id or --name")),
    }
}

/// One-line summary of an object and its value
#[must_use]
pub fn format_verbose(info: &ObjectInfo, value: &Value, name_width: usize) -> String {
    let line = format!(
        "#{:>3} 0x{:>8X} {:<name_width$} {:<75} {} {}",
        info.index,
        info.object_id,
        info.name,
        info.description.unwrap_or_default(),
        value,
        info.unit.unwrap_or_default(),
    );
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_object() {
        let by_id = resolve_object(Some(0x90B53336), None).unwrap();
        assert_eq!(by_id.name, "temperature.sink_temp_power_reduction");

        let by_name = resolve_object(None, Some("battery.soc")).unwrap();
        assert_eq!(by_name.object_id, 0x959930BF);

        assert!(matches!(
            resolve_object(None, Some("battery.nope")),
            Err(RctError::UnknownObject { .. })
        ));
        assert!(matches!(
            resolve_object(None, None),
            Err(RctError::Validation { .. })
        ));
    }

    #[test]
    fn test_format_verbose() {
        let info = REGISTRY.get_by_name("grid_pll[0].f").unwrap();
        let line = format_verbose(info, &Value::Float(50.0), 20);

        let expected = format!(
            "#{:>3} 0x1C4A665F grid_pll[0].f        {:<75} 50 Hz",
            info.index, "Grid frequency"
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn test_format_verbose_without_unit() {
        let info = REGISTRY.get_by_name("inverter_sn").unwrap();
        let line = format_verbose(info, &Value::String("123".into()), 11);
        assert!(line.starts_with(&format!("#{:>3} 0x7924ABD9 inverter_sn ", info.index)));
        assert!(line.ends_with(" 123"));
    }
}
