// Relay agent loop
// Main entry point for the relay binary

use clap::Parser;
use relay_engine::cli::{Cli, Command};
use relay_engine::config::Config;
use relay_engine::handlers::{handle_run, handle_secret, handle_tools, OutputFormat, RunOverrides};
use relay_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    if let Some(level) = &cli.log {
        config.core.log_level = level.clone();
        config.validate_and_process()?;
    }

    // RUST_LOG still takes precedence over the configured level
    init_telemetry_with_level(&config.core.log_level);

    tracing::info!("Relay v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run {
            task,
            max_iterations,
            timeout,
            reprompt,
        } => {
            RunOverrides {
                max_iterations,
                timeout_secs: timeout,
                reprompt,
            }
            .apply(&mut config)?;
            handle_run(task, &config, format).await
        }

        Command::Tools => handle_tools(&config, format).await,

        Command::Secret { action } => handle_secret(action, format),
    }
}
