// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::config::{
    AKS_CLUSTER_NAME, CONTAINER_REGISTRY_ENDPOINT, Environment, ServiceConfig, TargetResource,
};

use super::error::{DeployError, DeployStage};
use super::state::{Initialized, Stage};

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (kubeconfig,
/// registry credentials, pushed image) so later transitions cannot run
/// without what earlier ones produced.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) service: ServiceConfig,
    pub(crate) subscription_id: String,
    pub(crate) resource_group: String,
    pub(crate) cluster_name: String,
    pub(crate) registry_endpoint: String,
    pub(crate) environment_name: String,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    /// Validate required settings. Nothing external is contacted.
    ///
    /// The cluster name is checked before the registry endpoint.
    pub fn new(
        service: &ServiceConfig,
        target: &TargetResource,
        env: &Environment,
    ) -> Result<Self, DeployError> {
        if !target.is_managed_cluster() {
            return Err(DeployError::InvalidTarget(format!(
                "resource type '{}' is not a managed cluster",
                target.resource_type()
            )));
        }

        let cluster_name = cluster_name(env)?;
        let registry_endpoint = registry_endpoint(env)?;

        Ok(Deployment {
            service: service.clone(),
            subscription_id: target.subscription_id().to_string(),
            resource_group: target.resource_group().to_string(),
            cluster_name: cluster_name.to_string(),
            registry_endpoint: registry_endpoint.to_string(),
            environment_name: env.name().to_string(),
            state: Initialized,
        })
    }
}

/// The AKS cluster name configured for `env`.
pub fn cluster_name(env: &Environment) -> Result<&str, DeployError> {
    env.get(AKS_CLUSTER_NAME)
        .ok_or(DeployError::MissingConfiguration {
            what: "AKS cluster",
            key: AKS_CLUSTER_NAME,
        })
}

/// Fails with the first missing key in the order a deployment checks them.
pub fn check_environment(env: &Environment) -> Result<(), DeployError> {
    cluster_name(env)?;
    registry_endpoint(env)?;
    Ok(())
}

/// The container registry login server configured for `env`.
pub fn registry_endpoint(env: &Environment) -> Result<&str, DeployError> {
    env.get(CONTAINER_REGISTRY_ENDPOINT)
        .ok_or(DeployError::MissingConfiguration {
            what: "container registry endpoint",
            key: CONTAINER_REGISTRY_ENDPOINT,
        })
}

impl<S> Deployment<S> {
    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn registry_endpoint(&self) -> &str {
        &self.registry_endpoint
    }

    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }
}

impl<S: Stage> Deployment<S> {
    /// Stage that runs next from this state.
    pub fn stage(&self) -> DeployStage {
        S::STAGE
    }
}

// State-specific accessors
impl Deployment<super::state::ImagePublished> {
    /// Fully qualified reference of the pushed image.
    pub fn image(&self) -> &str {
        &self.state.image
    }
}

impl Deployment<super::state::RolloutConfirmed> {
    pub fn deployment_name(&self) -> &str {
        &self.state.deployment_name
    }
}

impl Deployment<super::state::EndpointsCollected> {
    pub fn endpoints(&self) -> &[String] {
        &self.state.endpoints
    }
}
