// ABOUTME: Container registry control-plane calls.
// ABOUTME: Finds the registry by login server and reads its admin credentials.

use super::arm::{ArmClient, segment};
use super::error::{AzureError, PaginationSnafu};
use crate::http::Method;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use tokio_util::sync::CancellationToken;

const API_VERSION: &str = "2023-07-01";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryListResult {
    #[serde(default)]
    value: Vec<Registry>,
    #[serde(default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Registry {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    properties: RegistryProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryProperties {
    #[serde(default)]
    login_server: String,
}

#[derive(Deserialize)]
struct ListCredentialsResult {
    #[serde(default)]
    username: String,
    #[serde(default)]
    passwords: Vec<RegistryPassword>,
}

#[derive(Deserialize)]
struct RegistryPassword {
    #[serde(default)]
    value: String,
}

/// Admin credentials for one registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub login_server: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("login_server", &self.login_server)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct ContainerRegistryService {
    arm: ArmClient,
}

impl ContainerRegistryService {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    pub async fn credentials(
        &self,
        subscription_id: &str,
        login_server: &str,
        cancel: &CancellationToken,
    ) -> Result<RegistryCredentials, AzureError> {
        let registry_id = self
            .find_registry(subscription_id, login_server, cancel)
            .await?;

        let url = self
            .arm
            .url(&format!("{registry_id}/listCredentials"), API_VERSION);
        let response = self
            .arm
            .send("listCredentials", Method::Post, &url, cancel)
            .await?;
        let result: ListCredentialsResult = ArmClient::decode("listCredentials", &response)?;

        let password = result
            .passwords
            .into_iter()
            .map(|p| p.value)
            .find(|v| !v.is_empty())
            .ok_or_else(|| AzureError::NoRegistryPassword {
                login_server: login_server.to_string(),
            })?;

        Ok(RegistryCredentials {
            login_server: login_server.to_string(),
            username: result.username,
            password,
        })
    }

    /// Resource id of the registry whose login server matches, following pagination.
    async fn find_registry(
        &self,
        subscription_id: &str,
        login_server: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AzureError> {
        let mut next = Some(self.arm.url(
            &format!(
                "/subscriptions/{}/providers/Microsoft.ContainerRegistry/registries",
                segment(subscription_id)
            ),
            API_VERSION,
        ));

        let mut visited = HashSet::new();
        while let Some(url) = next {
            if !self.arm.owns(&url) {
                return PaginationSnafu {
                    operation: "listRegistries",
                    message: "nextLink points outside the management endpoint",
                }
                .fail();
            }
            if !visited.insert(url.clone()) {
                return PaginationSnafu {
                    operation: "listRegistries",
                    message: "nextLink repeats an earlier page",
                }
                .fail();
            }

            let response = self
                .arm
                .send("listRegistries", Method::Get, &url, cancel)
                .await?;
            let page: RegistryListResult = ArmClient::decode("listRegistries", &response)?;

            if let Some(registry) = page
                .value
                .into_iter()
                .find(|r| r.properties.login_server.eq_ignore_ascii_case(login_server))
            {
                tracing::debug!("found container registry {} for {login_server}", registry.name);
                return Ok(registry.id);
            }
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Err(AzureError::RegistryNotFound {
            login_server: login_server.to_string(),
            subscription_id: subscription_id.to_string(),
        })
    }
}
