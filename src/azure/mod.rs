// ABOUTME: Azure Resource Manager calls needed to deploy to AKS.
// ABOUTME: Cluster admin credentials and container registry admin credentials.

mod arm;
mod container_registry;
mod credential;
mod error;
mod managed_clusters;

pub use arm::{ArmClient, MANAGEMENT_ENDPOINT};
pub use container_registry::{ContainerRegistryService, RegistryCredentials};
pub use credential::{AzureCliCredential, CredentialError, StaticTokenCredential, TokenCredential};
pub use error::AzureError;
pub use managed_clusters::ManagedClustersService;
