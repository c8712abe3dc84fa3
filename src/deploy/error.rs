// ABOUTME: Error taxonomy for AKS deployments and the stage they failed in.
// ABOUTME: DeployErrorKind gives callers a stable value to branch on.

use std::fmt;
use std::time::Duration;

use crate::azure::AzureError;
use crate::tools::ToolError;
use crate::types::ParseImageRefError;

use super::manifests::ManifestError;

/// Pipeline stage, used to tag progress and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Initialize,
    ResolveCredentials,
    ResolveRegistry,
    PublishImage,
    ApplyManifests,
    AwaitRollout,
    CollectEndpoints,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStage::Initialize => "initialize",
            DeployStage::ResolveCredentials => "resolve cluster credentials",
            DeployStage::ResolveRegistry => "resolve container registry",
            DeployStage::PublishImage => "publish image",
            DeployStage::ApplyManifests => "apply manifests",
            DeployStage::AwaitRollout => "await rollout",
            DeployStage::CollectEndpoints => "collect endpoints",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while deploying a service to AKS.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A required environment key is unset.
    #[error("could not determine {what}, ensure '{key}' is set in the environment")]
    MissingConfiguration {
        what: &'static str,
        key: &'static str,
    },

    #[error("invalid deployment target: {0}")]
    InvalidTarget(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(#[from] ParseImageRefError),

    #[error("failed retrieving cluster admin credentials for '{cluster}': {source}")]
    CredentialRetrieval {
        cluster: String,
        #[source]
        source: AzureError,
    },

    #[error("failed retrieving container registry credentials for '{registry}': {source}")]
    Registry {
        registry: String,
        #[source]
        source: AzureError,
    },

    #[error("failed to {action}: {source}")]
    CommandExecution {
        action: String,
        #[source]
        source: ToolError,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("no deployment matching '{service}' found in namespace '{namespace}'")]
    DeploymentNotFound { service: String, namespace: String },

    /// The rolled-out deployment was missing when endpoints were collected.
    #[error("deployment '{deployment}' disappeared from namespace '{namespace}' after rollout")]
    DeploymentGone {
        deployment: String,
        namespace: String,
    },

    #[error("deployment '{deployment}' did not finish rolling out within {}s: {reason}", .timeout.as_secs())]
    RolloutTimeout {
        deployment: String,
        timeout: Duration,
        reason: String,
    },

    #[error("deployment cancelled during {stage}")]
    Cancelled { stage: DeployStage },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    MissingConfiguration,
    InvalidTarget,
    InvalidImage,
    CredentialRetrieval,
    Registry,
    CommandExecution,
    Manifest,
    DeploymentNotFound,
    RolloutTimeout,
    Cancelled,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::MissingConfiguration { .. } => DeployErrorKind::MissingConfiguration,
            DeployError::InvalidTarget(_) => DeployErrorKind::InvalidTarget,
            DeployError::InvalidImage(_) => DeployErrorKind::InvalidImage,
            DeployError::CredentialRetrieval { .. } => DeployErrorKind::CredentialRetrieval,
            DeployError::Registry { .. } => DeployErrorKind::Registry,
            DeployError::CommandExecution { .. } => DeployErrorKind::CommandExecution,
            DeployError::Manifest(_) => DeployErrorKind::Manifest,
            DeployError::DeploymentNotFound { .. } | DeployError::DeploymentGone { .. } => {
                DeployErrorKind::DeploymentNotFound
            }
            DeployError::RolloutTimeout { .. } => DeployErrorKind::RolloutTimeout,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
        }
    }

    /// Wrap a tool failure, turning cancellation into [`DeployError::Cancelled`].
    pub(crate) fn command(stage: DeployStage, action: impl Into<String>, source: ToolError) -> Self {
        if source.is_cancelled() {
            DeployError::Cancelled { stage }
        } else {
            DeployError::CommandExecution {
                action: action.into(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AKS_CLUSTER_NAME;

    #[test]
    fn missing_cluster_message() {
        let err = DeployError::MissingConfiguration {
            what: "AKS cluster",
            key: AKS_CLUSTER_NAME,
        };
        assert_eq!(
            err.to_string(),
            "could not determine AKS cluster, ensure 'AZURE_AKS_CLUSTER_NAME' is set in the environment"
        );
        assert_eq!(err.kind(), DeployErrorKind::MissingConfiguration);
    }

    #[test]
    fn rollout_timeout_reports_seconds() {
        let err = DeployError::RolloutTimeout {
            deployment: "api".to_string(),
            timeout: Duration::from_secs(90),
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("within 90s"));
    }

    #[test]
    fn cancelled_command_becomes_cancelled_error() {
        let source = ToolError::Command(crate::exec::CommandError::Cancelled {
            command: "docker push".to_string(),
        });
        let err = DeployError::command(DeployStage::PublishImage, "push image", source);
        assert_eq!(err.kind(), DeployErrorKind::Cancelled);
        assert_eq!(err.to_string(), "deployment cancelled during publish image");
    }
}
