// ABOUTME: Managed cluster (AKS) control-plane calls.
// ABOUTME: Retrieves and decodes the cluster admin kubeconfig.

use super::arm::{ArmClient, segment};
use super::error::AzureError;
use crate::http::Method;
use crate::tools::kubectl::KubeConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const API_VERSION: &str = "2023-08-01";
const OPERATION: &str = "listClusterAdminCredential";

#[derive(Debug, Deserialize)]
struct CredentialResults {
    #[serde(default)]
    kubeconfigs: Vec<CredentialResult>,
}

#[derive(Debug, Deserialize)]
struct CredentialResult {
    #[serde(default)]
    name: String,
    /// Base64-encoded kubeconfig YAML.
    value: String,
}

#[derive(Clone)]
pub struct ManagedClustersService {
    arm: ArmClient,
}

impl ManagedClustersService {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// Admin kubeconfig for `cluster`. The first returned kubeconfig is used.
    pub async fn admin_kubeconfig(
        &self,
        subscription_id: &str,
        resource_group: &str,
        cluster: &str,
        cancel: &CancellationToken,
    ) -> Result<KubeConfig, AzureError> {
        let path = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}/{OPERATION}",
            segment(subscription_id),
            segment(resource_group),
            segment(cluster),
        );
        let url = self.arm.url(&path, API_VERSION);
        let response = self.arm.send(OPERATION, Method::Post, &url, cancel).await?;
        let results: CredentialResults = ArmClient::decode(OPERATION, &response)?;

        let first = results
            .kubeconfigs
            .into_iter()
            .next()
            .ok_or_else(|| AzureError::Kubeconfig {
                message: "response contained no kubeconfigs".to_string(),
            })?;
        tracing::debug!("using kubeconfig '{}' for cluster {cluster}", first.name);

        decode_kubeconfig(&first.value)
    }
}

fn decode_kubeconfig(encoded: &str) -> Result<KubeConfig, AzureError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AzureError::Kubeconfig {
            message: format!("value is not valid base64: {e}"),
        })?;
    let yaml = String::from_utf8(bytes).map_err(|e| AzureError::Kubeconfig {
        message: format!("value is not UTF-8: {e}"),
    })?;
    let config = KubeConfig::from_yaml(&yaml).map_err(|e| AzureError::Kubeconfig {
        message: e.to_string(),
    })?;

    if !config.has_current_context() {
        return Err(AzureError::Kubeconfig {
            message: format!(
                "current-context '{}' does not name a context",
                config.current_context
            ),
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(yaml: &str) -> String {
        STANDARD.encode(yaml)
    }

    #[test]
    fn decodes_kubeconfig_with_valid_context() {
        let yaml = "current-context: admin\ncontexts:\n  - name: admin\n    context:\n      cluster: c\n      user: u\n";
        let config = decode_kubeconfig(&encode(yaml)).unwrap();
        assert_eq!(config.current_context, "admin");
    }

    #[test]
    fn keeps_decoded_document_text() {
        let yaml = "current-context: admin\ncontexts:\n  - name: admin\n    context:\n      cluster: c\n      user: u\nusers:\n  - name: u\n    user:\n      exec:\n        command: kubelogin\n";
        let config = decode_kubeconfig(&encode(yaml)).unwrap();
        assert_eq!(config.document().unwrap(), yaml);
    }

    #[test]
    fn rejects_dangling_current_context() {
        let yaml = "current-context: missing\ncontexts: []\n";
        let err = decode_kubeconfig(&encode(yaml)).unwrap_err();
        assert!(err.to_string().contains("does not name a context"));
    }

    #[test]
    fn rejects_non_base64_value() {
        let err = decode_kubeconfig("not base64!").unwrap_err();
        assert!(err.to_string().contains("base64"));
    }
}
