// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::azure::{AzureError, ContainerRegistryService, ManagedClustersService};
use crate::clock::Clock;
use crate::config::Environment;
use crate::tools::kubectl::{self, KubeConfigFile, Kubectl, ResourceType};
use crate::tools::{Docker, ToolError};
use crate::types::{ImageRef, ResourceName};

use super::Deployment;
use super::endpoints::{ingress_endpoints, service_endpoints};
use super::error::{DeployError, DeployStage};
use super::manifests::ManifestSet;
use super::progress::ProgressReporter;
use super::result::DeploymentResult;
use super::state::{
    CredentialsResolved, EndpointsCollected, ImagePublished, Initialized, ManifestsApplied,
    RegistryResolved, RolloutConfirmed, Stage,
};

/// Extra time given to `kubectl rollout status` to report its own timeout.
const ROLLOUT_GRACE: Duration = Duration::from_secs(10);

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S: Stage> Deployment<S> {
    /// Internal helper to move to the next state, keeping shared fields.
    fn map_state<T>(self, f: impl FnOnce(S) -> T) -> Deployment<T> {
        Deployment {
            service: self.service,
            subscription_id: self.subscription_id,
            resource_group: self.resource_group,
            cluster_name: self.cluster_name,
            registry_endpoint: self.registry_endpoint,
            environment_name: self.environment_name,
            state: f(self.state),
        }
    }

    fn ensure_not_cancelled(&self, cancel: &CancellationToken) -> Result<(), DeployError> {
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled { stage: S::STAGE });
        }
        Ok(())
    }

    fn tool_error(&self, action: &str, source: ToolError) -> DeployError {
        DeployError::command(S::STAGE, action, source)
    }

    fn namespace(&self) -> Result<ResourceName, DeployError> {
        self.service
            .namespace()
            .map_err(|e| DeployError::InvalidTarget(format!("namespace: {e}")))
    }
}

fn cancelled_or(
    stage: DeployStage,
    err: AzureError,
    wrap: impl FnOnce(AzureError) -> DeployError,
) -> DeployError {
    if err.is_cancelled() {
        DeployError::Cancelled { stage }
    } else {
        wrap(err)
    }
}

// =============================================================================
// Initialized -> CredentialsResolved
// =============================================================================

impl Deployment<Initialized> {
    /// Fetch the cluster admin kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::CredentialRetrieval` if the control plane rejects
    /// the request or returns an unusable kubeconfig.
    pub async fn resolve_credentials(
        self,
        clusters: &ManagedClustersService,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<CredentialsResolved>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        progress.report(Initialized::STAGE, "Retrieving AKS cluster admin credentials");
        tracing::info!(cluster = %self.cluster_name, "retrieving cluster admin credentials");

        let kubeconfig = clusters
            .admin_kubeconfig(
                &self.subscription_id,
                &self.resource_group,
                &self.cluster_name,
                cancel,
            )
            .await
            .map_err(|source| {
                cancelled_or(Initialized::STAGE, source, |source| {
                    DeployError::CredentialRetrieval {
                        cluster: self.cluster_name.clone(),
                        source,
                    }
                })
            })?;

        Ok(self.map_state(|_| CredentialsResolved { kubeconfig }))
    }
}

// =============================================================================
// CredentialsResolved -> RegistryResolved
// =============================================================================

impl Deployment<CredentialsResolved> {
    /// Look up admin credentials for the configured container registry.
    pub async fn resolve_registry(
        self,
        registries: &ContainerRegistryService,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<RegistryResolved>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        progress.report(CredentialsResolved::STAGE, "Retrieving container registry credentials");

        let registry = registries
            .credentials(&self.subscription_id, &self.registry_endpoint, cancel)
            .await
            .map_err(|source| {
                cancelled_or(CredentialsResolved::STAGE, source, |source| {
                    DeployError::Registry {
                        registry: self.registry_endpoint.clone(),
                        source,
                    }
                })
            })?;

        Ok(self.map_state(|CredentialsResolved { kubeconfig }| RegistryResolved {
            kubeconfig,
            registry,
        }))
    }
}

// =============================================================================
// RegistryResolved -> ImagePublished
// =============================================================================

impl Deployment<RegistryResolved> {
    /// Remote reference: `{registry}/{project}/{service}-{env}:aksdeploy-{unix}`.
    fn remote_image(&self, clock: &dyn Clock) -> Result<ImageRef, DeployError> {
        let project = ResourceName::sanitized(&self.service.project.name)
            .map_err(|e| DeployError::InvalidTarget(format!("project name: {e}")))?;
        let env = ResourceName::sanitized(&self.environment_name)
            .map_err(|e| DeployError::InvalidTarget(format!("environment name: {e}")))?;
        let repository = format!("{project}/{}-{env}", self.service.name);
        let tag = format!("aksdeploy-{}", clock.now().timestamp());
        Ok(ImageRef::for_registry(&self.registry_endpoint, &repository, &tag)?)
    }

    /// Log in, tag `local_image` for the registry, record it in `env`, and push.
    ///
    /// The environment is updated before the push, so a failed push still
    /// leaves the attempted reference recorded.
    pub async fn publish_image(
        self,
        docker: &Docker,
        env: &mut Environment,
        local_image: &str,
        clock: &dyn Clock,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<ImagePublished>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        progress.report(RegistryResolved::STAGE, "Pushing container image");

        let local = ImageRef::parse(local_image)?;
        let remote = self.remote_image(clock)?.to_string();
        let registry = &self.state.registry;

        docker
            .login(
                &registry.login_server,
                &registry.username,
                &registry.password,
                cancel,
            )
            .await
            .map_err(|e| self.tool_error("log in to container registry", e))?;

        docker
            .tag(&local.to_string(), &remote, cancel)
            .await
            .map_err(|e| self.tool_error("tag container image", e))?;

        env.set(self.service.image_env_key(), remote.clone());

        tracing::info!(image = %remote, "pushing container image");
        docker
            .push(&remote, cancel)
            .await
            .map_err(|e| self.tool_error("push container image", e))?;

        Ok(self.map_state(|RegistryResolved { kubeconfig, registry }| ImagePublished {
            kubeconfig,
            registry,
            image: remote,
        }))
    }
}

// =============================================================================
// ImagePublished -> ManifestsApplied
// =============================================================================

impl Deployment<ImagePublished> {
    /// Render manifests with the pushed image and apply them.
    ///
    /// Manifests are read and substituted before the cluster is touched.
    pub async fn apply_manifests(
        self,
        kubectl: &Kubectl,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<ManifestsApplied>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        progress.report(ImagePublished::STAGE, "Applying Kubernetes manifests");

        let namespace = self.namespace()?;
        let manifests = ManifestSet::load(&self.service.manifest_dir())?
            .substitute(&self.service.image_env_key(), &self.state.image)?;

        let session = KubeConfigFile::write(&self.state.kubeconfig)
            .map_err(|e| self.tool_error("write kubeconfig", e))?;
        let kubectl = kubectl.with_kubeconfig(session.path());

        kubectl
            .config_view(cancel)
            .await
            .map_err(|e| self.tool_error("validate kubeconfig", e))?;
        kubectl
            .use_context(session.current_context(), cancel)
            .await
            .map_err(|e| self.tool_error("select kubectl context", e))?;
        kubectl
            .create_namespace(namespace.as_str(), cancel)
            .await
            .map_err(|e| self.tool_error("create namespace", e))?;

        if self.service.k8s.create_image_pull_secret {
            let secret = self
                .service
                .pull_secret_name()
                .map_err(|e| DeployError::InvalidTarget(format!("image pull secret: {e}")))?;
            let registry = &self.state.registry;
            kubectl
                .create_secret_generic(
                    namespace.as_str(),
                    secret.as_str(),
                    &[
                        ("server", registry.login_server.as_str()),
                        ("username", registry.username.as_str()),
                        ("password", registry.password.as_str()),
                    ],
                    cancel,
                )
                .await
                .map_err(|e| self.tool_error("create image pull secret", e))?;
        }

        tracing::info!(
            namespace = %namespace,
            files = manifests.files().len(),
            "applying manifests"
        );
        kubectl
            .apply_pipe(&manifests.render(), Some(namespace.as_str()), cancel)
            .await
            .map_err(|e| self.tool_error("apply manifests", e))?;

        Ok(self.map_state(|ImagePublished { image, .. }| ManifestsApplied {
            session,
            namespace,
            image,
        }))
    }
}

// =============================================================================
// ManifestsApplied -> RolloutConfirmed
// =============================================================================

impl Deployment<ManifestsApplied> {
    /// Configured deployment name, or the first deployment whose name contains the service name.
    async fn find_deployment_name(
        &self,
        kubectl: &Kubectl,
        cancel: &CancellationToken,
    ) -> Result<String, DeployError> {
        if let Some(name) = &self.service.k8s.deployment.name {
            return Ok(name.to_string());
        }

        let service_name = self.service.name.as_str();
        let deployments: kubectl::List<kubectl::Deployment> = kubectl
            .get_resources(ResourceType::Deployment, self.state.namespace.as_str(), cancel)
            .await
            .map_err(|e| self.tool_error("list deployments", e))?;

        deployments
            .items
            .iter()
            .map(kubectl::Deployment::name)
            .find(|name| name.contains(service_name))
            .map(str::to_string)
            .ok_or_else(|| DeployError::DeploymentNotFound {
                service: service_name.to_string(),
                namespace: self.state.namespace.to_string(),
            })
    }

    /// Wait for the service's deployment to finish rolling out.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::RolloutTimeout` if kubectl reports failure or the
    /// configured timeout elapses.
    pub async fn await_rollout(
        self,
        kubectl: &Kubectl,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<RolloutConfirmed>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        let kubectl = kubectl.with_kubeconfig(self.state.session.path());
        let deployment_name = self.find_deployment_name(&kubectl, cancel).await?;
        progress.report(
            ManifestsApplied::STAGE,
            format!("Waiting for deployment '{deployment_name}' to roll out"),
        );

        let timeout = self.service.k8s.rollout_timeout;
        let status = tokio::time::timeout(
            timeout + ROLLOUT_GRACE,
            kubectl.rollout_status(self.state.namespace.as_str(), &deployment_name, timeout, cancel),
        )
        .await;

        match status {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_cancelled() => {
                return Err(DeployError::Cancelled {
                    stage: ManifestsApplied::STAGE,
                });
            }
            Ok(Err(e)) => {
                return Err(DeployError::RolloutTimeout {
                    deployment: deployment_name,
                    timeout,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(DeployError::RolloutTimeout {
                    deployment: deployment_name,
                    timeout,
                    reason: "timed out waiting for rollout status".to_string(),
                });
            }
        }

        tracing::info!(deployment = %deployment_name, "rollout complete");
        Ok(self.map_state(|ManifestsApplied {
            session,
            namespace,
            image,
        }| RolloutConfirmed {
            session,
            namespace,
            image,
            deployment_name,
        }))
    }
}

// =============================================================================
// RolloutConfirmed -> EndpointsCollected
// =============================================================================

impl Deployment<RolloutConfirmed> {
    /// Re-read the deployment and derive endpoints from services and ingresses.
    pub async fn collect_endpoints(
        self,
        kubectl: &Kubectl,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<Deployment<EndpointsCollected>, DeployError> {
        self.ensure_not_cancelled(cancel)?;
        progress.report(RolloutConfirmed::STAGE, "Fetching endpoints");

        let kubectl = kubectl.with_kubeconfig(self.state.session.path());
        let namespace = self.state.namespace.as_str();

        let deployments: kubectl::List<kubectl::Deployment> = kubectl
            .get_resources(ResourceType::Deployment, namespace, cancel)
            .await
            .map_err(|e| self.tool_error("get deployment", e))?;
        let deployment = deployments
            .items
            .into_iter()
            .find(|d| d.name() == self.state.deployment_name)
            .ok_or_else(|| DeployError::DeploymentGone {
                deployment: self.state.deployment_name.clone(),
                namespace: namespace.to_string(),
            })?;

        let services: kubectl::List<kubectl::Service> = kubectl
            .get_resources(ResourceType::Service, namespace, cancel)
            .await
            .map_err(|e| self.tool_error("get services", e))?;
        let ingresses: kubectl::List<kubectl::Ingress> = kubectl
            .get_resources(ResourceType::Ingress, namespace, cancel)
            .await
            .map_err(|e| self.tool_error("get ingresses", e))?;

        let mut endpoints = service_endpoints(&services.items);
        endpoints.extend(ingress_endpoints(&ingresses.items));
        tracing::debug!("discovered {} endpoints", endpoints.len());

        // Dropping the session removes the kubeconfig file.
        Ok(self.map_state(|RolloutConfirmed { image, .. }| EndpointsCollected {
            image,
            deployment,
            endpoints,
        }))
    }
}

// =============================================================================
// EndpointsCollected -> done
// =============================================================================

impl Deployment<EndpointsCollected> {
    pub fn finish(self) -> DeploymentResult {
        DeploymentResult {
            kind: self.service.host,
            image: self.state.image,
            details: self.state.deployment,
            endpoints: self.state.endpoints,
        }
    }
}
