//! Tally CLI - Main entry point

use clap::Parser;
use std::process;
use tally_cli::{Cli, Commands, Config};
use tally_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    // Load .env before clap reads `env =` defaults
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Verbose mode: debug to console; otherwise only warnings and errors
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("tally-cli")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring invalid logging environment: {}", e);
            log_config
        },
    };

    // The CLI works without logging
    let _ = init_logging(&log_config);

    // Execute command
    let result = execute_command(&cli).await;

    // Handle result
    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> tally_cli::Result<()> {
    let config = Config::from_env()?.with_cli(cli);

    match &cli.command {
        Commands::Parse { file, json } => tally_cli::commands::parse::run(file, *json, &config).await,

        Commands::Submit {
            file,
            job_type,
            name,
            no_watch,
        } => {
            tally_cli::commands::submit::run(file, *job_type, name.clone(), !*no_watch, &config)
                .await
        },

        Commands::Status { job_id } => tally_cli::commands::status::run(job_id, &config).await,

        Commands::Cancel { job_id } => tally_cli::commands::cancel::run(job_id, &config).await,
    }
}
