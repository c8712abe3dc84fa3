// ABOUTME: Command module aggregator for the aksdeploy CLI.
// ABOUTME: Re-exports deploy and environment command handlers.

mod deploy;
mod env;

pub use deploy::deploy;
pub use env::{env_get, env_list, env_set};
