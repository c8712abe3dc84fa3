// ABOUTME: Terminal values of a deployment: the success record and the two-way outcome.
// ABOUTME: DeploymentResult is what callers print or serialize.

use serde::Serialize;

use crate::config::HostKind;
use crate::tools::kubectl;

use super::error::{DeployError, DeployStage};

/// What a finished deployment produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    pub kind: HostKind,
    /// The pushed image reference.
    pub image: String,
    pub details: kubectl::Deployment,
    pub endpoints: Vec<String>,
}

/// Terminal state of a deployment run.
#[derive(Debug)]
pub enum DeployOutcome {
    Done(DeploymentResult),
    Failed {
        stage: DeployStage,
        error: DeployError,
    },
}

impl DeployOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, DeployOutcome::Done(_))
    }

    pub fn into_result(self) -> Result<DeploymentResult, DeployError> {
        match self {
            DeployOutcome::Done(result) => Ok(result),
            DeployOutcome::Failed { error, .. } => Err(error),
        }
    }
}
