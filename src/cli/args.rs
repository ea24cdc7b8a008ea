//! Command-line argument parsing and validation

use crate::{
    config::DEFAULT_PORT,
    core::registry::REGISTRY,
    error::RctError,
};
use clap::{ArgAction, Parser, Subcommand};
use clap_complete::{
    Shell,
    engine::{ArgValueCandidates, CompletionCandidate},
};
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock};

static OBJECT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX])?([0-9a-fA-F]{1,8})$").expect("Invalid object ID regex")
});

/// rctclient toolbox. Please help yourself with the subcommands.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "rctclient")]
pub struct Args {
    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sends a read request to a device and prints the value.
    ///
    /// The request is sent to <host> on <port>, the value is printed on
    /// standard output. With --verbose, the index, ID, name, description and
    /// unit of the object are printed along with the value.
    ///
    /// Specify either <ID> or <name>. The ID is hexadecimal such as
    /// 0x90B53336, the name must exactly match a known object including the
    /// group prefix. <name> supports shell completion.
    ///
    /// Log output goes to standard error, so the value can be read from
    /// standard output while catching everything else on standard error.
    ///
    /// Examples:
    ///
    ///   rctclient read-value -h 192.168.0.1 --name temperature.sink_temp_power_reduction
    ///   rctclient read-value -h 192.168.0.1 --id 0x90B53336
    #[command(disable_help_flag = true, verbatim_doc_comment)]
    ReadValue(ReadValueArgs),

    /// Starts the simulator.
    ///
    /// The simulator answers queries with valid but useless values. It binds
    /// to <host> (default: localhost) and <port> (default: 8899) and serves up
    /// to five clients at the same time.
    ///
    /// Read requests are answered with the value last written by a client,
    /// else the simulated value stored for the object, else a default for its
    /// data type (0, false or a dummy string).
    #[command(disable_help_flag = true)]
    Simulator(SimulatorArgs),

    /// Print a shell completion script
    Completions {
        /// Shell to generate completions for
        shell: Shell,

        /// Write the script to a file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Arguments of `read-value`
#[derive(clap::Args, Debug)]
pub struct ReadValueArgs {
    /// Port at which the device listens
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_name = "port")]
    pub port: u16,

    /// Host address or IP of the device
    #[arg(short, long, value_name = "host")]
    pub host: String,

    /// Object ID to query, of the form 0xXXXX
    #[arg(short, long, value_name = "ID", value_parser = parse_object_id)]
    pub id: Option<u32>,

    /// Object name to query
    #[arg(
        short,
        long,
        value_name = "name",
        add = ArgValueCandidates::new(object_name_candidates)
    )]
    pub name: Option<String>,

    /// Seconds to wait for the response
    #[arg(long, default_value_t = 2, value_name = "seconds")]
    pub timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Arguments of `simulator`
#[derive(clap::Args, Debug)]
pub struct SimulatorArgs {
    /// Port to bind the simulator to
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_name = "port")]
    pub port: u16,

    /// IP to bind the simulator to
    #[arg(short, long, default_value = "localhost", value_name = "host")]
    pub host: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Parse an object ID such as `0x959930BF`
pub fn parse_object_id(input: &str) -> Result<u32, RctError> {
    OBJECT_ID_REGEX
        .captures(input.trim())
        .and_then(|caps| u32::from_str_radix(&caps[1], 16).ok())
        .ok_or_else(|| RctError::InvalidObjectId {
            input: input.to_string(),
        })
}

fn object_name_candidates() -> Vec<CompletionCandidate> {
    REGISTRY
        .prefix_complete_name("")
        .into_iter()
        .map(|name| {
            let help = REGISTRY
                .get_by_name(name)
                .ok()
                .and_then(|info| info.description)
                .map(Into::into);
            CompletionCandidate::new(name).help(help)
        })
        .collect()
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_value() {
        let args = Args::try_parse_from([
            "rctclient",
            "read-value",
            "-h",
            "192.168.0.1",
            "--id",
            "0x90B53336",
            "-v",
        ])
        .unwrap();
        assert!(!args.debug);
        match args.command {
            Command::ReadValue(read) => {
                assert_eq!(read.host, "192.168.0.1");
                assert_eq!(read.port, 8899);
                assert_eq!(read.id, Some(0x90B53336));
                assert!(read.name.is_none());
                assert!(read.verbose);
            }
            other => panic!("Expected ReadValue command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_debug_flag_after_subcommand() {
        let args =
            Args::try_parse_from(["rctclient", "simulator", "--debug", "-p", "9000"]).unwrap();
        assert!(args.debug);
        match args.command {
            Command::Simulator(sim) => {
                assert_eq!(sim.port, 9000);
                assert_eq!(sim.host, "localhost");
            }
            other => panic!("Expected Simulator command, got {other:?}"),
        }
    }

    #[test]
    fn test_read_value_requires_host() {
        assert!(Args::try_parse_from(["rctclient", "read-value", "-n", "battery.soc"]).is_err());
    }

    #[test]
    fn test_parse_object_id() {
        assert_eq!(parse_object_id("0x959930BF").unwrap(), 0x959930BF);
        assert_eq!(parse_object_id("0X959930bf").unwrap(), 0x959930BF);
        assert_eq!(parse_object_id("1C4A665F").unwrap(), 0x1C4A665F);
        assert_eq!(parse_object_id("0xAB").unwrap(), 0xAB);
        assert!(parse_object_id("0x").is_err());
        assert!(parse_object_id("0x123456789").is_err());
        assert!(parse_object_id("battery.soc").is_err());
    }

    #[test]
    fn test_invalid_id_rejected_by_parser() {
        let err = Args::try_parse_from(["rctclient", "read-value", "-h", "x", "-i", "0xZZ"])
            .unwrap_err();
        assert!(err.to_string().contains("0xZZ"));
    }

    #[test]
    fn test_name_candidates_cover_registry() {
        assert_eq!(object_name_candidates().len(), REGISTRY.len());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
