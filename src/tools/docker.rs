// ABOUTME: Registry login, tag and push through the docker CLI.
// ABOUTME: Passwords travel on stdin and are masked in every error message.

use super::{ToolError, run_checked};
use crate::exec::{CommandRunner, RunArgs};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct Docker {
    runner: Arc<dyn CommandRunner>,
}

impl Docker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let args = RunArgs::new(
            "docker",
            ["login", "--username", username, "--password-stdin", registry],
        )
        .with_stdin(password)
        .redact(password);
        run_checked(self.runner.as_ref(), args, cancel).await?;
        Ok(())
    }

    pub async fn tag(
        &self,
        source: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let args = RunArgs::new("docker", ["tag", source, target]);
        run_checked(self.runner.as_ref(), args, cancel).await?;
        Ok(())
    }

    pub async fn push(&self, image: &str, cancel: &CancellationToken) -> Result<(), ToolError> {
        let args = RunArgs::new("docker", ["push", image]);
        run_checked(self.runner.as_ref(), args, cancel).await?;
        Ok(())
    }
}
