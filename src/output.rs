// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::deploy::{DeploymentResult, ProgressEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
#[derive(Debug, Clone)]
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print one deployment progress event.
    pub fn progress_event(&self, event: &ProgressEvent) {
        match self.mode {
            OutputMode::Normal => println!("  → {}", event.message),
            OutputMode::Quiet => {}
            OutputMode::Json => print_json(&JsonEvent {
                event: "progress",
                message: &event.message,
                stage: Some(event.stage.to_string()),
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => print_json(&JsonEvent {
                event: "success",
                message,
                stage: None,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print the outcome of a finished deployment.
    pub fn deployment_result(&self, result: &DeploymentResult) {
        match self.mode {
            OutputMode::Normal => {
                self.success(&format!(
                    "  ✓ Deployed {} ({} replicas)",
                    result.details.name(),
                    result.details.status.replicas
                ));
                println!("  Image: {}", result.image);
                for endpoint in &result.endpoints {
                    println!("  Endpoint: {endpoint}");
                }
            }
            OutputMode::Quiet => {
                for endpoint in &result.endpoints {
                    println!("{endpoint}");
                }
            }
            OutputMode::Json => print_json(&JsonResult {
                event: "result",
                result,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print environment values as `KEY=value` lines or one JSON object.
    pub fn values(&self, values: &BTreeMap<String, String>) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                for (key, value) in values {
                    println!("{key}={value}");
                }
            }
            OutputMode::Json => print_json(values),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    stage: None,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    event: &'a str,
    result: &'a DeploymentResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
