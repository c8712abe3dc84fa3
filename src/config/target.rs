// ABOUTME: Identifies the Azure resource a service deploys into.
// ABOUTME: Built by the caller before deploying; never mutated afterwards.

use super::environment::{AKS_CLUSTER_NAME, Environment, RESOURCE_GROUP, SUBSCRIPTION_ID};
use crate::error::{Error, Result};

pub const MANAGED_CLUSTER_RESOURCE_TYPE: &str = "Microsoft.ContainerService/managedClusters";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResource {
    subscription_id: String,
    resource_group: String,
    resource_name: String,
    resource_type: String,
}

impl TargetResource {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        resource_name: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
        }
    }

    /// Managed cluster scope from the environment's subscription and resource group.
    ///
    /// The cluster name may be missing here; the deployment reports that itself.
    pub fn managed_cluster_from_env(env: &Environment) -> Result<Self> {
        let subscription = env
            .get(SUBSCRIPTION_ID)
            .ok_or_else(|| Error::MissingEnvVar(SUBSCRIPTION_ID.to_string()))?;
        let resource_group = env
            .get(RESOURCE_GROUP)
            .ok_or_else(|| Error::MissingEnvVar(RESOURCE_GROUP.to_string()))?;
        Ok(Self::new(
            subscription,
            resource_group,
            env.get(AKS_CLUSTER_NAME).unwrap_or_default(),
            MANAGED_CLUSTER_RESOURCE_TYPE,
        ))
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn is_managed_cluster(&self) -> bool {
        self.resource_type
            .eq_ignore_ascii_case(MANAGED_CLUSTER_RESOURCE_TYPE)
    }
}
