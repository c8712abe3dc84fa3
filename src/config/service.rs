// ABOUTME: Per-service deployment configuration.
// ABOUTME: Identifies the deployable unit and its Kubernetes options.

use super::environment::service_property_key;
use crate::types::{ResourceName, ResourceNameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where a service gets deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    #[default]
    Aks,
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKind::Aks => write!(f, "aks"),
        }
    }
}

/// The project a service belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub name: String,
    pub path: PathBuf,
}

/// One deployable unit. Read-only for the duration of a deployment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub project: ProjectRef,
    pub name: ResourceName,
    /// Source directory, relative to the project root.
    pub relative_path: PathBuf,
    pub host: HostKind,
    pub language: String,
    pub k8s: K8sOptions,
}

impl ServiceConfig {
    /// Directory the Kubernetes manifests are read from.
    pub fn manifest_dir(&self) -> PathBuf {
        self.project
            .path
            .join(&self.relative_path)
            .join(&self.k8s.deployment_path)
    }

    /// Target namespace: configured, or derived from the project name.
    pub fn namespace(&self) -> Result<ResourceName, ResourceNameError> {
        match &self.k8s.namespace {
            Some(ns) => Ok(ns.clone()),
            None => ResourceName::sanitized(&self.project.name),
        }
    }

    /// Environment key that receives the pushed image reference.
    pub fn image_env_key(&self) -> String {
        service_property_key(self.name.as_str(), "IMAGE_NAME")
    }

    /// Name of the generic secret that holds registry credentials.
    pub fn pull_secret_name(&self) -> Result<ResourceName, ResourceNameError> {
        match &self.k8s.image_pull_secret {
            Some(name) => Ok(name.clone()),
            None => ResourceName::sanitized(&format!("{}-registry", self.name)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct K8sOptions {
    #[serde(default)]
    pub namespace: Option<ResourceName>,

    #[serde(default = "default_deployment_path")]
    pub deployment_path: PathBuf,

    #[serde(default)]
    pub deployment: DeploymentOptions,

    #[serde(default)]
    pub image_pull_secret: Option<ResourceName>,

    #[serde(default = "default_true")]
    pub create_image_pull_secret: bool,

    #[serde(default = "default_rollout_timeout", with = "humantime_serde")]
    pub rollout_timeout: Duration,
}

impl Default for K8sOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            deployment_path: default_deployment_path(),
            deployment: DeploymentOptions::default(),
            image_pull_secret: None,
            create_image_pull_secret: true,
            rollout_timeout: default_rollout_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentOptions {
    /// Deployment to watch. Discovered by service name when unset.
    #[serde(default)]
    pub name: Option<ResourceName>,
}

fn default_deployment_path() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_true() -> bool {
    true
}

fn default_rollout_timeout() -> Duration {
    Duration::from_secs(300)
}
