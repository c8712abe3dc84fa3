// ABOUTME: Command execution abstraction used to drive docker and kubectl.
// ABOUTME: Defines RunArgs/RunResult and the CommandRunner capability trait.

mod process;

pub use process::ProcessRunner;

use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const REDACTED: &str = "***";

/// Runs external programs on behalf of the deployment pipeline.
///
/// A non-zero exit is not an error at this level: implementations return the
/// captured [`RunResult`] and callers decide via [`RunResult::into_checked`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, aborting it if `cancel` fires.
    async fn run(&self, args: RunArgs, cancel: &CancellationToken)
    -> Result<RunResult, CommandError>;
}

/// A single command invocation.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
    pub cwd: Option<PathBuf>,
    sensitive: Vec<String>,
}

impl RunArgs {
    pub fn new<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Feed `input` to the process on standard input.
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Mark a value that must never show up in logs or error messages.
    pub fn redact(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.sensitive.push(value);
        }
        self
    }

    /// Printable command line with sensitive values masked.
    pub fn command_line(&self) -> String {
        let mut line = self.cmd.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&self.mask(arg));
        }
        line
    }

    fn mask(&self, text: &str) -> String {
        self.sensitive
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret, REDACTED))
    }
}

/// Captured outcome of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`CommandError::Failed`].
    pub fn into_checked(self, args: &RunArgs) -> Result<RunResult, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommandError::Failed {
                command: args.command_line(),
                exit_code: self.exit_code,
                stdout: args.mask(&self.stdout),
                stderr: args.mask(&self.stderr),
            })
        }
    }
}

/// Errors from running external commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {exit_code}: {}", summarize(.stdout, .stderr))]
    Failed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` was cancelled")]
    Cancelled { command: String },
}

impl CommandError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommandError::Cancelled { .. })
    }

    /// Captured stderr of a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CommandError::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn summarize(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = stdout.trim();
    if stdout.is_empty() {
        "no output".to_string()
    } else {
        stdout.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_masks_redacted_values() {
        let args = RunArgs::new("kubectl", ["create", "secret", "--from-literal=password=hunter2"])
            .redact("hunter2");
        assert_eq!(
            args.command_line(),
            "kubectl create secret --from-literal=password=***"
        );
    }

    #[test]
    fn into_checked_keeps_successful_result() {
        let args = RunArgs::new("docker", ["push", "app"]);
        let result = RunResult::new(0, "pushed", "").into_checked(&args).unwrap();
        assert_eq!(result.stdout, "pushed");
    }

    #[test]
    fn failed_command_reports_command_and_stderr() {
        let args = RunArgs::new("docker", ["push", "app"]);
        let err = RunResult::new(1, "", "denied: access forbidden\n")
            .into_checked(&args)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`docker push app`"));
        assert!(message.contains("exited with code 1"));
        assert!(message.contains("denied: access forbidden"));
        assert_eq!(err.stderr(), Some("denied: access forbidden\n"));
    }

    #[test]
    fn failed_command_falls_back_to_stdout() {
        let args = RunArgs::new("kubectl", ["apply", "-f", "-"]);
        let err = RunResult::new(2, "error: no objects passed", "")
            .into_checked(&args)
            .unwrap_err();
        assert!(err.to_string().contains("no objects passed"));
    }

    #[test]
    fn empty_redaction_is_ignored() {
        let args = RunArgs::new("docker", ["login"]).redact("");
        assert_eq!(args.command_line(), "docker login");
    }
}
