// ABOUTME: CommandRunner implementation that spawns local processes with tokio.
// ABOUTME: Captures stdout/stderr, feeds stdin and kills the child on cancellation.

use super::{CommandError, CommandRunner, RunArgs, RunResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        args: RunArgs,
        cancel: &CancellationToken,
    ) -> Result<RunResult, CommandError> {
        let command = args.command_line();

        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .envs(args.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if args.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &args.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(%command, "running command");

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Write stdin from a separate task so a chatty child can't deadlock on a full pipe.
        let writer = match (args.stdin, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => Some(tokio::spawn(async move {
                let result = stdin.write_all(input.as_bytes()).await;
                drop(stdin);
                result
            })),
            _ => None,
        };

        let output = tokio::select! {
            () = cancel.cancelled() => {
                tracing::warn!(%command, "command cancelled");
                return Err(CommandError::Cancelled { command });
            }
            output = child.wait_with_output() => {
                output.map_err(|source| CommandError::Spawn { command: command.clone(), source })?
            }
        };

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(%command, "stdin write failed: {}", e),
                Err(e) => tracing::debug!(%command, "stdin writer panicked: {}", e),
            }
        }

        let result = RunResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        tracing::debug!(%command, exit_code = result.exit_code, "command finished");
        Ok(result)
    }
}
