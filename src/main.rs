// ABOUTME: Entry point for the aksdeploy CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use aksdeploy::config::{self, ProjectConfig};
use aksdeploy::error::Result;
use aksdeploy::output::Output;
use clap::Parser;
use cli::{Cli, Commands, EnvAction};
use std::env;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    if let Err(e) = run(cli, output.clone(), cancel).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output, cancel: CancellationToken) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init {
            project,
            service,
            force,
        } => {
            config::init_config(&cwd, project.as_deref(), service.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            service,
            environment,
            image,
        } => {
            let project = ProjectConfig::discover(&cwd)?;
            commands::deploy(
                &project,
                &service,
                &environment,
                image.as_deref(),
                output,
                cancel,
            )
            .await
        }
        Commands::Env {
            environment,
            action,
        } => {
            let project = ProjectConfig::discover(&cwd)?;
            match action {
                EnvAction::Set { key, value } => {
                    commands::env_set(&project.path, &environment, &key, &value, &output)
                }
                EnvAction::Get { key } => commands::env_get(&project.path, &environment, &key),
                EnvAction::List => commands::env_list(&project.path, &environment, &output),
            }
        }
    }
}
