// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use aksdeploy::output::OutputMode;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aksdeploy")]
#[command(about = "Publish a container image and roll it out to Azure Kubernetes Service")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputMode::Normal, global = true)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new aksdeploy.yml configuration file
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        project: Option<String>,

        /// Name of the first service
        #[arg(long)]
        service: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Push a locally built image and deploy the service to AKS
    Deploy {
        /// Service to deploy (defined in config)
        service: String,

        /// Environment whose settings are used
        #[arg(short, long, env = "AKSDEPLOY_ENV", default_value = "default")]
        environment: String,

        /// Local image to publish (defaults to <service>:latest)
        #[arg(long)]
        image: Option<String>,
    },

    /// Inspect or edit environment settings
    Env {
        /// Environment to operate on
        #[arg(short, long, env = "AKSDEPLOY_ENV", default_value = "default", global = true)]
        environment: String,

        #[command(subcommand)]
        action: EnvAction,
    },
}

#[derive(Subcommand)]
pub enum EnvAction {
    /// Set a value
    Set { key: String, value: String },

    /// Print a single value
    Get { key: String },

    /// Print every value
    List,
}
