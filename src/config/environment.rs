// ABOUTME: Deployment-scoped key/value settings (cluster, registry, subscription ids).
// ABOUTME: Loaded from .aksdeploy/<env>/env.yml with process environment as fallback.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const AKS_CLUSTER_NAME: &str = "AZURE_AKS_CLUSTER_NAME";
pub const CONTAINER_REGISTRY_ENDPOINT: &str = "AZURE_CONTAINER_REGISTRY_ENDPOINT";
pub const SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const TENANT_ID: &str = "AZURE_TENANT_ID";
pub const LOCATION: &str = "AZURE_LOCATION";
pub const RESOURCE_GROUP: &str = "AZURE_RESOURCE_GROUP";

/// Keys picked up from the process environment when the file doesn't set them.
const WELL_KNOWN_KEYS: [&str; 6] = [
    AKS_CLUSTER_NAME,
    CONTAINER_REGISTRY_ENDPOINT,
    SUBSCRIPTION_ID,
    TENANT_ID,
    LOCATION,
    RESOURCE_GROUP,
];

const ENV_DIR: &str = ".aksdeploy";
const ENV_FILENAME: &str = "env.yml";

/// Mutable settings for one named environment.
///
/// Not synchronised: a deployment borrows it mutably for its whole run, so two
/// deployments can't share one instance concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    name: String,
    values: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl Environment {
    /// An in-memory environment with no backing file.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            path: None,
        }
    }

    pub fn with_values<I, K, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = Self::new(name);
        env.values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        env
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value for `key`. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn file_path(project_root: &Path, name: &str) -> PathBuf {
        project_root.join(ENV_DIR).join(name).join(ENV_FILENAME)
    }

    /// Load `name` from the project, creating an empty environment if no file exists yet.
    pub fn load(project_root: &Path, name: &str) -> Result<Self> {
        validate_name(name)?;
        let path = Self::file_path(project_root, name);

        let mut values: BTreeMap<String, String> = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&content)?
            }
        } else {
            tracing::debug!("environment file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        for key in WELL_KNOWN_KEYS {
            if values.get(key).is_none_or(|v| v.is_empty())
                && let Ok(value) = std::env::var(key)
            {
                values.insert(key.to_string(), value);
            }
        }

        Ok(Self {
            name: name.to_string(),
            values,
            path: Some(path),
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            Error::InvalidConfig(format!("environment '{}' has no backing file", self.name))
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(&self.values)?)?;
        Ok(())
    }
}

/// Key for a per-service property, e.g. (`my-api`, `IMAGE_NAME`) -> `SERVICE_MY_API_IMAGE_NAME`.
pub fn service_property_key(service: &str, property: &str) -> String {
    let service: String = service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SERVICE_{service}_{property}")
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "invalid environment name '{name}'"
        )))
    }
}
