use anyhow::Result;
use rctclient::{cli, config::Config, setup_logging};

fn main() -> Result<()> {
    // Answer shell completion requests before anything else
    cli::complete_from_env();

    // Parse command line arguments
    let args = cli::parse_args();

    // Initialize configuration
    let config = Config::from_args(&args)?;

    // Setup logging based on debug and verbose flags
    setup_logging(config.debug, config.verbose)?;
    tracing::info!("rctclient CLI starting");

    // Execute the appropriate command
    cli::execute_command(&config, &args.command)
}
