// ABOUTME: Control-plane error type with SNAFU context selectors.
// ABOUTME: Keeps the failing operation name and HTTP status for classification.

use super::credential::CredentialError;
use crate::http::HttpError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AzureError {
    #[snafu(display("failed to acquire access token: {source}"))]
    Token { source: CredentialError },

    #[snafu(display("{operation} request failed: {source}"))]
    Transport { operation: String, source: HttpError },

    #[snafu(display("{operation} returned status {status}: {body}"))]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[snafu(display("failed to decode {operation} response: {source}"))]
    Decode {
        operation: String,
        source: serde_json::Error,
    },

    #[snafu(display(
        "container registry '{login_server}' not found in subscription '{subscription_id}'"
    ))]
    RegistryNotFound {
        login_server: String,
        subscription_id: String,
    },

    #[snafu(display("container registry '{login_server}' returned no admin password"))]
    NoRegistryPassword { login_server: String },

    #[snafu(display("{operation} pagination stopped: {message}"))]
    Pagination { operation: String, message: String },

    #[snafu(display("invalid kubeconfig: {message}"))]
    Kubeconfig { message: String },

    #[snafu(display("{operation} was cancelled"))]
    Cancelled { operation: String },
}

impl AzureError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            AzureError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            AzureError::Cancelled { .. } => true,
            AzureError::Token {
                source: CredentialError::Command(e),
            } => e.is_cancelled(),
            _ => false,
        }
    }
}
