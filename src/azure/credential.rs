// ABOUTME: Bearer token sources for Azure Resource Manager requests.
// ABOUTME: A fixed token (tests, CI) or one fetched through the Azure CLI.

use crate::exec::{CommandError, CommandRunner, RunArgs};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// A bearer token for the management endpoint, without the `Bearer ` prefix.
    async fn token(&self, cancel: &CancellationToken) -> Result<String, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no access token available: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `var`, if set and non-empty.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _cancel: &CancellationToken) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }
}

/// Token from `az account get-access-token` for the signed-in CLI user.
#[derive(Clone)]
pub struct AzureCliCredential {
    runner: Arc<dyn CommandRunner>,
}

impl AzureCliCredential {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn token(&self, cancel: &CancellationToken) -> Result<String, CredentialError> {
        let args = RunArgs::new(
            "az",
            [
                "account",
                "get-access-token",
                "--resource",
                MANAGEMENT_RESOURCE,
                "--query",
                "accessToken",
                "--output",
                "tsv",
            ],
        );
        let result = self
            .runner
            .run(args.clone(), cancel)
            .await?
            .into_checked(&args)?;

        let token = result.stdout.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(CredentialError::Unavailable(
                "`az account get-access-token` returned no token; run `az login`".to_string(),
            ));
        }
        Ok(token.to_string())
    }
}
