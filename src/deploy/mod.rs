// ABOUTME: AKS deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct and the AksTarget driver.

mod deployment;
mod endpoints;
mod error;
mod manifests;
mod progress;
mod result;
mod state;
mod target;
mod transitions;

pub use deployment::{Deployment, check_environment, cluster_name, registry_endpoint};
pub use endpoints::{ingress_endpoints, service_endpoints};
pub use error::{DeployError, DeployErrorKind, DeployStage};
pub use manifests::{ManifestError, ManifestFile, ManifestSet};
pub use progress::{
    ProgressEvent, ProgressReporter, progress_channel, spawn_progress_consumer,
    spawn_progress_logger,
};
pub use result::{DeployOutcome, DeploymentResult};
pub use state::{
    CredentialsResolved, EndpointsCollected, ImagePublished, Initialized, ManifestsApplied,
    RegistryResolved, RolloutConfirmed, Stage,
};
pub use target::AksTarget;
