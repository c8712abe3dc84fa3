// ABOUTME: Deploy command implementation.
// ABOUTME: Wires production collaborators into an AksTarget and reports the outcome.

use aksdeploy::azure::{
    ArmClient, AzureCliCredential, ContainerRegistryService, ManagedClustersService,
    StaticTokenCredential, TokenCredential,
};
use aksdeploy::clock::SystemClock;
use aksdeploy::config::{Environment, ProjectConfig, TargetResource};
use aksdeploy::deploy::{
    AksTarget, DeployOutcome, check_environment, progress_channel, spawn_progress_consumer,
};
use aksdeploy::error::Result;
use aksdeploy::exec::{CommandRunner, ProcessRunner};
use aksdeploy::http::{HttpClient, ReqwestHttpClient};
use aksdeploy::output::Output;
use aksdeploy::tools::{Docker, Kubectl};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Pre-acquired management token; the Azure CLI is used when unset.
const ACCESS_TOKEN_VAR: &str = "AZURE_ACCESS_TOKEN";

pub async fn deploy(
    project: &ProjectConfig,
    service: &str,
    environment: &str,
    image: Option<&str>,
    mut output: Output,
    cancel: CancellationToken,
) -> Result<()> {
    let service = project.service(service)?;
    let mut env = Environment::load(&project.path, environment)?;
    check_environment(&env)?;
    let target = TargetResource::managed_cluster_from_env(&env)?;

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    let credential: Arc<dyn TokenCredential> =
        match StaticTokenCredential::from_env(ACCESS_TOKEN_VAR) {
            Some(credential) => Arc::new(credential),
            None => Arc::new(AzureCliCredential::new(Arc::clone(&runner))),
        };
    let arm = ArmClient::new(http, credential);

    let aks = AksTarget::new(
        service,
        target,
        ManagedClustersService::new(arm.clone()),
        ContainerRegistryService::new(arm),
        Kubectl::new(Arc::clone(&runner)),
        Docker::new(runner),
        Arc::new(SystemClock),
    )?;

    let local_image = image
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:latest", aks.service().name));

    output.start_timer();
    output.progress(&format!(
        "Deploying {} ({}) to environment '{}'",
        aks.service().name,
        local_image,
        env.name()
    ));

    let (reporter, rx) = progress_channel();
    let consumer = {
        let output = output.clone();
        spawn_progress_consumer(rx, move |event| output.progress_event(event))
    };

    let outcome = aks.run(&mut env, &local_image, reporter, &cancel).await;
    if let Err(e) = consumer.await {
        tracing::warn!("progress consumer ended abnormally: {e}");
    }

    match outcome {
        DeployOutcome::Done(result) => {
            env.save()?;
            output.deployment_result(&result);
            Ok(())
        }
        DeployOutcome::Failed { stage, error } => {
            // Keep whatever the run recorded (e.g. the pushed image) even on failure.
            if let Err(e) = env.save() {
                tracing::warn!("failed to save environment '{}': {e}", env.name());
            }
            tracing::debug!(%stage, kind = ?error.kind(), "deployment failed");
            Err(error.into())
        }
    }
}
