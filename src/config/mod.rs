// ABOUTME: Project configuration types and parsing for aksdeploy.yml.
// ABOUTME: Handles discovery, per-service lookup and template generation.

mod environment;
mod service;
mod target;

pub use environment::{
    AKS_CLUSTER_NAME, CONTAINER_REGISTRY_ENDPOINT, Environment, LOCATION, RESOURCE_GROUP,
    SUBSCRIPTION_ID, TENANT_ID, service_property_key,
};
pub use service::{DeploymentOptions, HostKind, K8sOptions, ProjectRef, ServiceConfig};
pub use target::{MANAGED_CLUSTER_RESOURCE_TYPE, TargetResource};

use crate::error::{Error, Result};
use crate::types::ResourceName;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "aksdeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "aksdeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".aksdeploy/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    /// Directory the config was loaded from. Service paths are relative to it.
    #[serde(skip)]
    pub path: PathBuf,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
}

/// One entry under `services:` before it is bound to its project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    #[serde(default = "default_service_path")]
    pub project: PathBuf,

    #[serde(default)]
    pub host: HostKind,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub k8s: K8sOptions,
}

fn default_service_path() -> PathBuf {
    PathBuf::from(".")
}

impl ProjectConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.path = project_root(path);
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading project config from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolve a named service into a deployable [`ServiceConfig`].
    pub fn service(&self, name: &str) -> Result<ServiceConfig> {
        let entry = self
            .services
            .get(name)
            .ok_or_else(|| Error::UnknownService(name.to_string()))?;

        let service_name =
            ResourceName::new(name).map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(ServiceConfig {
            project: ProjectRef {
                name: self.name.clone(),
                path: self.path.clone(),
            },
            name: service_name,
            relative_path: entry.project.clone(),
            host: entry.host,
            language: entry.language.clone(),
            k8s: entry.k8s.clone(),
        })
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

/// `.aksdeploy/config.yml` lives one level below the project root.
fn project_root(config_path: &Path) -> PathBuf {
    let parent = config_path.parent().unwrap_or_else(|| Path::new("."));
    if parent.file_name().is_some_and(|n| n == ".aksdeploy") {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

pub fn init_config(
    dir: &Path,
    project: Option<&str>,
    service: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let project = match project {
        Some(p) => p.to_string(),
        None => dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| ResourceName::sanitized(n).ok())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "my-project".to_string()),
    };
    let service = service.unwrap_or("api");
    ResourceName::new(service).map_err(|e| Error::InvalidConfig(e.to_string()))?;

    std::fs::write(&config_path, template_yaml(&project, service))?;
    Ok(())
}

fn template_yaml(project: &str, service: &str) -> String {
    format!(
        r#"name: {project}
services:
  {service}:
    project: ./src/{service}
    host: aks
    language: js
    k8s:
      deploymentPath: manifests
      rolloutTimeout: 5m
"#
    )
}
