//! Heart disease prediction service CLI
//!
//! # Usage
//!
//! ```bash
//! # Serve the prediction endpoint
//! hdp serve --config hdp.toml --port 5000
//!
//! # Validate a record against the built-in field rules
//! hdp validate --record patient.json --format json
//!
//! # Run a record through the model offline
//! hdp predict --record patient.json --model models/hdp_model.json
//!
//! # Print the active field rules
//! hdp schema
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Record failed validation
//! - 3: Invalid input, arguments or files
//! - 10: Internal error

use clap::Parser;
use hdp_service::{run_cli, HdpCli, HdpCommands};

#[tokio::main]
async fn main() {
    let cli = HdpCli::parse();

    // `serve` installs its own subscriber from the configuration file
    if !matches!(cli.command, HdpCommands::Serve { .. }) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::WARN.into()),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
