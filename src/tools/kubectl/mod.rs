// ABOUTME: kubectl wrapper for context selection, idempotent creates, apply and queries.
// ABOUTME: Every call carries KUBECONFIG when a deployment-scoped kubeconfig is set.

mod kubeconfig;
mod types;

pub use kubeconfig::{
    ClusterDetails, ContextDetails, KubeConfig, KubeConfigFile, NamedCluster, NamedContext,
    NamedUser, UserDetails,
};
pub use types::{
    Deployment, DeploymentSpec, DeploymentStatus, Ingress, IngressPath, IngressRule,
    IngressRuleHttp, IngressSpec, IngressStatus, IngressTls, IntOrString, List, LoadBalancer,
    LoadBalancerIngress, Port, Resource, ResourceMetadata, Service, ServiceSpec, ServiceStatus,
    ServiceType,
};

use super::{ToolError, run_checked};
use crate::exec::{CommandRunner, RunArgs};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ALREADY_EXISTS: &str = "AlreadyExists";

/// Resource kinds queried with `kubectl get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Deployment,
    Service,
    Ingress,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Deployment => "deployment",
            ResourceType::Service => "svc",
            ResourceType::Ingress => "ing",
        }
    }
}

#[derive(Clone)]
pub struct Kubectl {
    runner: Arc<dyn CommandRunner>,
    kubeconfig: Option<PathBuf>,
}

impl Kubectl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            kubeconfig: None,
        }
    }

    /// A copy of this client that targets the given kubeconfig file.
    pub fn with_kubeconfig(&self, path: &Path) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            kubeconfig: Some(path.to_path_buf()),
        }
    }

    fn command<I, S>(&self, args: I) -> RunArgs
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let run_args = RunArgs::new("kubectl", args);
        match &self.kubeconfig {
            Some(path) => run_args.with_env("KUBECONFIG", path.display().to_string()),
            None => run_args,
        }
    }

    async fn exec(&self, args: RunArgs, cancel: &CancellationToken) -> Result<String, ToolError> {
        Ok(run_checked(self.runner.as_ref(), args, cancel).await?.stdout)
    }

    /// Validate the kubeconfig by rendering it.
    pub async fn config_view(&self, cancel: &CancellationToken) -> Result<String, ToolError> {
        self.exec(self.command(["config", "view"]), cancel).await
    }

    pub async fn use_context(
        &self,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        self.exec(self.command(["config", "use-context", context]), cancel)
            .await?;
        Ok(())
    }

    /// Create `namespace` unless it already exists.
    pub async fn create_namespace(
        &self,
        namespace: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let rendered = self
            .exec(
                self.command([
                    "create",
                    "namespace",
                    namespace,
                    "--dry-run=client",
                    "-o",
                    "yaml",
                ]),
                cancel,
            )
            .await;
        let applied = match rendered {
            Ok(manifest) => self.apply_pipe(&manifest, None, cancel).await,
            Err(e) => Err(e),
        };

        match applied {
            Err(e) if e.stderr().is_some_and(|s| s.contains(ALREADY_EXISTS)) => {
                tracing::debug!("namespace {namespace} already exists");
                Ok(())
            }
            other => other,
        }
    }

    /// Create or overwrite a generic secret from literal values.
    ///
    /// All literal values are masked in logs and errors.
    pub async fn create_secret_generic(
        &self,
        namespace: &str,
        name: &str,
        literals: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let mut args = self.command(["create", "secret", "generic", name]);
        for (key, value) in literals {
            args = args.arg(format!("--from-literal={key}={value}")).redact(*value);
        }
        let args = args
            .arg("-n")
            .arg(namespace)
            .arg("--dry-run=client")
            .arg("-o")
            .arg("yaml");

        let manifest = self.exec(args, cancel).await?;
        self.apply_pipe(&manifest, Some(namespace), cancel).await
    }

    /// `kubectl apply -f -` with `input` on stdin.
    pub async fn apply_pipe(
        &self,
        input: &str,
        namespace: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let mut args = self.command(["apply", "-f", "-"]);
        if let Some(ns) = namespace {
            args = args.arg("-n").arg(ns);
        }
        self.exec(args.with_stdin(input), cancel).await?;
        Ok(())
    }

    pub async fn rollout_status(
        &self,
        namespace: &str,
        deployment: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), ToolError> {
        let args = self.command([
            "rollout".to_string(),
            "status".to_string(),
            format!("deployment/{deployment}"),
            "-n".to_string(),
            namespace.to_string(),
            format!("--timeout={}s", timeout.as_secs()),
        ]);
        self.exec(args, cancel).await?;
        Ok(())
    }

    pub async fn get_resources<T: DeserializeOwned>(
        &self,
        resource_type: ResourceType,
        namespace: &str,
        cancel: &CancellationToken,
    ) -> Result<List<T>, ToolError> {
        let stdout = self
            .exec(
                self.command(["get", resource_type.as_str(), "-n", namespace, "-o", "json"]),
                cancel,
            )
            .await?;
        serde_json::from_str(&stdout).map_err(|source| ToolError::Decode {
            what: format!("{} list", resource_type.as_str()),
            source,
        })
    }
}
