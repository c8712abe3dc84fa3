// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries exactly the data the following transitions need.

use crate::azure::RegistryCredentials;
use crate::tools::kubectl::{self, KubeConfig, KubeConfigFile};
use crate::types::ResourceName;

use super::error::DeployStage;

/// Maps a state to the stage that moves a deployment out of it.
pub trait Stage {
    const STAGE: DeployStage;
}

/// Initial state: required settings validated, nothing contacted yet.
/// Available actions: `resolve_credentials()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Cluster admin kubeconfig retrieved.
/// Available actions: `resolve_registry()`
#[derive(Debug)]
pub struct CredentialsResolved {
    pub(crate) kubeconfig: KubeConfig,
}

/// Registry admin credentials retrieved.
/// Available actions: `publish_image()`
#[derive(Debug)]
pub struct RegistryResolved {
    pub(crate) kubeconfig: KubeConfig,
    pub(crate) registry: RegistryCredentials,
}

/// Image tagged and pushed to the registry.
/// Available actions: `apply_manifests()`
#[derive(Debug)]
pub struct ImagePublished {
    pub(crate) kubeconfig: KubeConfig,
    pub(crate) registry: RegistryCredentials,
    pub(crate) image: String,
}

/// Manifests applied to the cluster.
/// Available actions: `await_rollout()`
#[derive(Debug)]
pub struct ManifestsApplied {
    pub(crate) session: KubeConfigFile,
    pub(crate) namespace: ResourceName,
    pub(crate) image: String,
}

/// Deployment rolled out successfully.
/// Available actions: `collect_endpoints()`
#[derive(Debug)]
pub struct RolloutConfirmed {
    pub(crate) session: KubeConfigFile,
    pub(crate) namespace: ResourceName,
    pub(crate) image: String,
    pub(crate) deployment_name: String,
}

/// Endpoints gathered; the kubeconfig file is gone.
/// Available actions: `finish()`
#[derive(Debug)]
pub struct EndpointsCollected {
    pub(crate) image: String,
    pub(crate) deployment: kubectl::Deployment,
    pub(crate) endpoints: Vec<String>,
}

impl Stage for Initialized {
    const STAGE: DeployStage = DeployStage::ResolveCredentials;
}

impl Stage for CredentialsResolved {
    const STAGE: DeployStage = DeployStage::ResolveRegistry;
}

impl Stage for RegistryResolved {
    const STAGE: DeployStage = DeployStage::PublishImage;
}

impl Stage for ImagePublished {
    const STAGE: DeployStage = DeployStage::ApplyManifests;
}

impl Stage for ManifestsApplied {
    const STAGE: DeployStage = DeployStage::AwaitRollout;
}

impl Stage for RolloutConfirmed {
    const STAGE: DeployStage = DeployStage::CollectEndpoints;
}

impl Stage for EndpointsCollected {
    const STAGE: DeployStage = DeployStage::CollectEndpoints;
}
