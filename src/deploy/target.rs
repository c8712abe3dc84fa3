// ABOUTME: AKS service target: wires collaborators and drives the deployment state machine.
// ABOUTME: Produces a DeploymentResult or a DeployError tagged with the failing stage.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::azure::{ContainerRegistryService, ManagedClustersService};
use crate::clock::Clock;
use crate::config::{Environment, ServiceConfig, TargetResource};
use crate::tools::{Docker, Kubectl};

use super::Deployment;
use super::error::{DeployError, DeployStage};
use super::progress::ProgressReporter;
use super::result::{DeployOutcome, DeploymentResult};

/// Deploys one service to one AKS cluster.
pub struct AksTarget {
    service: ServiceConfig,
    target: TargetResource,
    clusters: ManagedClustersService,
    registries: ContainerRegistryService,
    kubectl: Kubectl,
    docker: Docker,
    clock: Arc<dyn Clock>,
}

impl AksTarget {
    /// # Errors
    ///
    /// Returns `DeployError::InvalidTarget` unless `target` is a managed cluster.
    pub fn new(
        service: ServiceConfig,
        target: TargetResource,
        clusters: ManagedClustersService,
        registries: ContainerRegistryService,
        kubectl: Kubectl,
        docker: Docker,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DeployError> {
        if !target.is_managed_cluster() {
            return Err(DeployError::InvalidTarget(format!(
                "resource type '{}' is not a managed cluster",
                target.resource_type()
            )));
        }
        Ok(Self {
            service,
            target,
            clusters,
            registries,
            kubectl,
            docker,
            clock,
        })
    }

    /// External tools this target shells out to.
    pub fn required_tools(&self) -> [&'static str; 2] {
        ["docker", "kubectl"]
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    /// Publish `local_image` and roll it out.
    ///
    /// `progress` is consumed and dropped when this returns, which ends any
    /// consumer draining the other side.
    pub async fn deploy(
        &self,
        env: &mut Environment,
        local_image: &str,
        progress: ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<DeploymentResult, DeployError> {
        self.run(env, local_image, progress, cancel)
            .await
            .into_result()
    }

    /// Like [`AksTarget::deploy`] but reports the stage a failure happened in.
    pub async fn run(
        &self,
        env: &mut Environment,
        local_image: &str,
        progress: ProgressReporter,
        cancel: &CancellationToken,
    ) -> DeployOutcome {
        let mut stage = DeployStage::Initialize;
        let outcome = self
            .drive(env, local_image, &progress, cancel, &mut stage)
            .await;
        drop(progress);

        match outcome {
            Ok(result) => {
                tracing::info!(
                    service = %self.service.name,
                    endpoints = result.endpoints.len(),
                    "deployment finished"
                );
                DeployOutcome::Done(result)
            }
            Err(error) => {
                tracing::warn!(service = %self.service.name, %stage, "deployment failed: {error}");
                DeployOutcome::Failed { stage, error }
            }
        }
    }

    async fn drive(
        &self,
        env: &mut Environment,
        local_image: &str,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
        stage: &mut DeployStage,
    ) -> Result<DeploymentResult, DeployError> {
        let deployment = Deployment::new(&self.service, &self.target, env)?;
        tracing::info!(
            service = %self.service.name,
            cluster = deployment.cluster_name(),
            environment = deployment.environment_name(),
            "starting deployment"
        );

        *stage = deployment.stage();
        let deployment = deployment
            .resolve_credentials(&self.clusters, progress, cancel)
            .await?;

        *stage = deployment.stage();
        let deployment = deployment
            .resolve_registry(&self.registries, progress, cancel)
            .await?;

        *stage = deployment.stage();
        let deployment = deployment
            .publish_image(
                &self.docker,
                env,
                local_image,
                self.clock.as_ref(),
                progress,
                cancel,
            )
            .await?;

        *stage = deployment.stage();
        let deployment = deployment
            .apply_manifests(&self.kubectl, progress, cancel)
            .await?;

        *stage = deployment.stage();
        let deployment = deployment
            .await_rollout(&self.kubectl, progress, cancel)
            .await?;

        *stage = deployment.stage();
        let deployment = deployment
            .collect_endpoints(&self.kubectl, progress, cancel)
            .await?;

        Ok(deployment.finish())
    }
}
