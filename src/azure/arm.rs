// ABOUTME: Authenticated Azure Resource Manager request helper.
// ABOUTME: Adds the bearer token, honours cancellation and rejects non-2xx replies.

use super::credential::TokenCredential;
use super::error::{AzureError, CancelledSnafu, DecodeSnafu, StatusSnafu, TokenSnafu, TransportSnafu};
use crate::http::{HttpClient, HttpRequest, HttpResponse, Method};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Longest error body kept in a status error.
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct ArmClient {
    http: Arc<dyn HttpClient>,
    credential: Arc<dyn TokenCredential>,
    endpoint: String,
}

impl ArmClient {
    pub fn new(http: Arc<dyn HttpClient>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http,
            credential,
            endpoint: MANAGEMENT_ENDPOINT.to_string(),
        }
    }

    /// Point at a different management endpoint (sovereign clouds, test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}{}?api-version={}", self.endpoint, path, api_version)
    }

    /// Whether `url` points at this client's management endpoint.
    pub(crate) fn owns(&self, url: &str) -> bool {
        url.strip_prefix(self.endpoint.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub(crate) async fn send(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, AzureError> {
        if cancel.is_cancelled() {
            return CancelledSnafu { operation }.fail();
        }

        let token = self.credential.token(cancel).await.context(TokenSnafu)?;

        let mut request = HttpRequest::new(method, url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/json");
        if method == Method::Post {
            request = request
                .header("Content-Type", "application/json")
                .body("{}");
        }

        tracing::debug!("{operation}: {method} {}", request.path());
        let response = tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu { operation }.fail(),
            response = self.http.send(request) => response.context(TransportSnafu { operation })?,
        };

        if !response.is_success() {
            let mut body = response.text();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return StatusSnafu {
                operation,
                status: response.status,
                body,
            }
            .fail();
        }

        Ok(response)
    }

    pub(crate) fn decode<T: DeserializeOwned>(
        operation: &str,
        response: &HttpResponse,
    ) -> Result<T, AzureError> {
        serde_json::from_slice(&response.body).context(DecodeSnafu { operation })
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
