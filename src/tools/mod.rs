// ABOUTME: Typed wrappers over the docker and kubectl command-line tools.
// ABOUTME: Both drive an injected CommandRunner and never spawn processes themselves.

mod docker;
pub mod kubectl;

pub use docker::Docker;
pub use kubectl::Kubectl;

use crate::exec::{CommandError, CommandRunner, RunArgs, RunResult};
use tokio_util::sync::CancellationToken;

/// Errors from docker/kubectl invocations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid kubeconfig: {0}")]
    Kubeconfig(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolError::Command(e) if e.is_cancelled())
    }

    /// Stderr of the failed command, if the failure came from a command.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::Command(e) => e.stderr(),
            _ => None,
        }
    }
}

/// Run `args` and fail on a non-zero exit.
async fn run_checked(
    runner: &dyn CommandRunner,
    args: RunArgs,
    cancel: &CancellationToken,
) -> Result<RunResult, ToolError> {
    tracing::debug!("running {}", args.command_line());
    let result = runner.run(args.clone(), cancel).await?;
    Ok(result.into_checked(&args)?)
}
