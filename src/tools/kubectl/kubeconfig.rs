// ABOUTME: Kubeconfig document model and its short-lived on-disk copy.
// ABOUTME: The file holds admin credentials and is deleted when KubeConfigFile drops.

use super::super::ToolError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    /// The document this config was parsed from. The typed fields cover only
    /// what deployment inspects, so this text is what kubectl gets.
    #[serde(skip)]
    pub source: Option<String>,
}

impl KubeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.source = Some(yaml.to_string());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// The original document when parsed from text, otherwise the typed fields rendered.
    pub fn document(&self) -> Result<Cow<'_, str>, serde_yaml::Error> {
        match &self.source {
            Some(source) => Ok(Cow::Borrowed(source)),
            None => self.to_yaml().map(Cow::Owned),
        }
    }

    pub fn context(&self, name: &str) -> Option<&ContextDetails> {
        self.contexts
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.context)
    }

    /// Whether `current-context` names one of the listed contexts.
    pub fn has_current_context(&self) -> bool {
        !self.current_context.is_empty() && self.context(&self.current_context).is_some()
    }
}

// Credentials inside; only names are printed.
impl fmt::Debug for KubeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeConfig")
            .field("current_context", &self.current_context)
            .field(
                "clusters",
                &self.clusters.iter().map(|c| &c.name).collect::<Vec<_>>(),
            )
            .field(
                "contexts",
                &self.contexts.iter().map(|c| &c.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterDetails,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterDetails {
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: UserDetails,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextDetails,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDetails {
    pub cluster: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A kubeconfig written to a private temp file for the duration of a deployment.
#[derive(Debug)]
pub struct KubeConfigFile {
    file: NamedTempFile,
    current_context: String,
}

impl KubeConfigFile {
    pub fn write(config: &KubeConfig) -> Result<Self, ToolError> {
        let mut file = tempfile::Builder::new()
            .prefix("aksdeploy-kubeconfig-")
            .suffix(".yaml")
            .tempfile()?;
        file.write_all(config.document()?.as_bytes())?;
        file.flush()?;
        Ok(Self {
            file,
            current_context: config.current_context.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn current_context(&self) -> &str {
        &self.current_context
    }
}
