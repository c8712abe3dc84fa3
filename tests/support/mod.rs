// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, mock wiring and fixtures for deployment tests.

use std::path::Path;
use std::sync::{Arc, Once};

use aksdeploy::azure::{
    ArmClient, ContainerRegistryService, ManagedClustersService, StaticTokenCredential,
};
use aksdeploy::clock::FixedClock;
use aksdeploy::config::{
    AKS_CLUSTER_NAME, CONTAINER_REGISTRY_ENDPOINT, Environment, HostKind, K8sOptions, LOCATION,
    MANAGED_CLUSTER_RESOURCE_TYPE, ProjectRef, RESOURCE_GROUP, SUBSCRIPTION_ID, ServiceConfig,
    TENANT_ID, TargetResource,
};
use aksdeploy::deploy::AksTarget;
use aksdeploy::exec::RunResult;
use aksdeploy::http::{HttpResponse, Method};
use aksdeploy::mocks::{MockCommandRunner, MockHttpClient};
use aksdeploy::tools::kubectl::{
    ClusterDetails, ContextDetails, Deployment, DeploymentSpec, DeploymentStatus, Ingress,
    IngressPath, IngressRule, IngressRuleHttp, IngressSpec, IngressStatus, IntOrString,
    KubeConfig, List, LoadBalancer, LoadBalancerIngress, NamedCluster, NamedContext, NamedUser,
    Port, Resource, ResourceMetadata, Service, ServiceSpec, ServiceType, UserDetails,
};
use aksdeploy::tools::{Docker, Kubectl};
use aksdeploy::types::ResourceName;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

static TRACING_INIT: Once = Once::new();

/// Unix time the test clock is pinned to.
#[allow(dead_code)]
pub const FIXED_UNIX: i64 = 1_700_000_000;

/// Remote image produced for the `svc` service in the `test` environment.
#[allow(dead_code)]
pub const EXPECTED_IMAGE: &str = "REGISTRY.azurecr.io/project/svc-test:aksdeploy-1700000000";

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("aksdeploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Mock collaborators shared by a single test.
#[allow(dead_code)]
pub struct MockContext {
    pub runner: Arc<MockCommandRunner>,
    pub http: Arc<MockHttpClient>,
}

#[allow(dead_code)]
impl MockContext {
    pub fn new() -> Self {
        Self {
            runner: Arc::new(MockCommandRunner::new()),
            http: Arc::new(MockHttpClient::new()),
        }
    }

    pub fn arm(&self) -> ArmClient {
        ArmClient::new(
            self.http.clone(),
            Arc::new(StaticTokenCredential::new("test-token")),
        )
    }

    pub fn kubectl(&self) -> Kubectl {
        Kubectl::new(self.runner.clone())
    }

    pub fn docker(&self) -> Docker {
        Docker::new(self.runner.clone())
    }

    pub fn aks_target(&self, service: ServiceConfig) -> AksTarget {
        AksTarget::new(
            service,
            managed_cluster_target(),
            ManagedClustersService::new(self.arm()),
            ContainerRegistryService::new(self.arm()),
            self.kubectl(),
            self.docker(),
            Arc::new(FixedClock::from_unix(FIXED_UNIX)),
        )
        .expect("managed cluster target is valid")
    }
}

#[allow(dead_code)]
pub fn managed_cluster_target() -> TargetResource {
    TargetResource::new(
        "SUB_ID",
        "RG_ID",
        "CLUSTER_NAME",
        MANAGED_CLUSTER_RESOURCE_TYPE,
    )
}

#[allow(dead_code)]
pub fn create_env() -> Environment {
    Environment::with_values(
        "test",
        [
            (TENANT_ID, "TENANT_ID"),
            (SUBSCRIPTION_ID, "SUBSCRIPTION_ID"),
            (LOCATION, "LOCATION"),
            (RESOURCE_GROUP, "RESOURCE_GROUP"),
            (AKS_CLUSTER_NAME, "AKS_CLUSTER"),
            (CONTAINER_REGISTRY_ENDPOINT, "REGISTRY.azurecr.io"),
        ],
    )
}

#[allow(dead_code)]
pub fn create_service_config(project_dir: &Path) -> ServiceConfig {
    ServiceConfig {
        project: ProjectRef {
            name: "project".to_string(),
            path: project_dir.to_path_buf(),
        },
        name: ResourceName::new("svc").unwrap(),
        relative_path: "./src".into(),
        host: HostKind::Aks,
        language: "js".to_string(),
        k8s: K8sOptions::default(),
    }
}

#[allow(dead_code)]
pub const DEPLOYMENT_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: svc-deployment
spec:
  replicas: 2
  template:
    spec:
      containers:
        - name: svc
          image: ${SERVICE_SVC_IMAGE_NAME}
"#;

/// Write deployment, service and ingress manifests for `service`.
#[allow(dead_code)]
pub fn setup_k8s_manifests(service: &ServiceConfig) {
    let dir = service.manifest_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("deployment.yaml"), DEPLOYMENT_MANIFEST).unwrap();
    std::fs::write(
        dir.join("service.yaml"),
        "apiVersion: v1\nkind: Service\nmetadata:\n  name: svc-service\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("ingress.yaml"),
        "apiVersion: networking.k8s.io/v1\nkind: Ingress\nmetadata:\n  name: svc-ingress\n",
    )
    .unwrap();
}

#[allow(dead_code)]
pub fn create_test_kubeconfig(cluster: &str, user: &str) -> KubeConfig {
    let user_name = format!("{cluster}_{user}");
    KubeConfig {
        api_version: "v1".to_string(),
        kind: "Config".to_string(),
        current_context: cluster.to_string(),
        clusters: vec![NamedCluster {
            name: cluster.to_string(),
            cluster: ClusterDetails {
                server: format!("https://{cluster}.eastus2.azmk8s.io:443"),
                certificate_authority_data: None,
            },
        }],
        users: vec![NamedUser {
            name: user_name.clone(),
            user: UserDetails::default(),
        }],
        contexts: vec![NamedContext {
            name: cluster.to_string(),
            context: ContextDetails {
                cluster: cluster.to_string(),
                user: user_name,
                namespace: None,
            },
        }],
        source: None,
    }
}

/// Register the listClusterAdminCredential response with `status`.
#[allow(dead_code)]
pub fn setup_admin_credentials_mock(ctx: &MockContext, status: u16) {
    let kubeconfig = create_test_kubeconfig("cluster1", "user1");
    let encoded = STANDARD.encode(kubeconfig.to_yaml().unwrap());
    let response = if status == 200 {
        HttpResponse::json(
            status,
            &json!({"kubeconfigs": [{"name": "context", "value": encoded}]}),
        )
    } else {
        HttpResponse::empty(status)
    };

    ctx.http
        .when(|r| r.method == Method::Post && r.path().contains("listClusterAdminCredential"))
        .respond(response);
}

fn list_json<T: serde::Serialize>(item: T) -> String {
    let mut list = List::new(vec![item]);
    list.resource.metadata = ResourceMetadata {
        name: "list".to_string(),
        namespace: "namespace".to_string(),
        ..Default::default()
    };
    serde_json::to_string(&list).unwrap()
}

#[allow(dead_code)]
pub fn svc_deployment() -> Deployment {
    Deployment {
        resource: Resource {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            metadata: ResourceMetadata {
                name: "svc-deployment".to_string(),
                namespace: "svc-namespace".to_string(),
                ..Default::default()
            },
        },
        spec: DeploymentSpec { replicas: 2 },
        status: DeploymentStatus {
            available_replicas: 2,
            ready_replicas: 2,
            replicas: 2,
            updated_replicas: 2,
        },
    }
}

#[allow(dead_code)]
pub fn svc_service() -> Service {
    Service {
        resource: Resource {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata: ResourceMetadata {
                name: "svc-service".to_string(),
                namespace: "svc-namespace".to_string(),
                ..Default::default()
            },
        },
        spec: ServiceSpec {
            service_type: ServiceType::ClusterIP,
            cluster_ip: None,
            cluster_ips: vec!["10.10.10.10".to_string()],
            ports: vec![Port {
                port: 80,
                target_port: Some(IntOrString::Int(3000)),
                protocol: "http".to_string(),
            }],
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn svc_ingress() -> Ingress {
    Ingress {
        resource: Resource {
            api_version: "networking.k8s.io/v1".to_string(),
            kind: "Ingress".to_string(),
            metadata: ResourceMetadata {
                name: "svc-ingress".to_string(),
                namespace: "svc-namespace".to_string(),
                ..Default::default()
            },
        },
        spec: IngressSpec {
            ingress_class_name: Some("webapprouting.kubernetes.azure.com".to_string()),
            tls: Vec::new(),
            rules: vec![IngressRule {
                host: None,
                http: IngressRuleHttp {
                    paths: vec![IngressPath {
                        path: "/".to_string(),
                        path_type: "Prefix".to_string(),
                    }],
                },
            }],
        },
        status: IngressStatus {
            load_balancer: LoadBalancer {
                ingress: vec![LoadBalancerIngress {
                    ip: Some("1.1.1.1".to_string()),
                    hostname: None,
                }],
            },
        },
    }
}

/// Register every response a successful deployment needs.
#[allow(dead_code)]
pub fn setup_mocks(ctx: &MockContext) {
    setup_admin_credentials_mock(ctx, 200);

    let ok = RunResult::new(0, "", "");
    for command in [
        "kubectl config view",
        "kubectl config use-context",
        "kubectl create namespace",
        "kubectl apply -f -",
        "kubectl create secret generic",
        "docker login",
        "docker tag",
        "docker push",
        "kubectl rollout status",
    ] {
        ctx.runner.when_contains(command).respond(ok.clone());
    }

    ctx.http
        .when(|r| {
            r.method == Method::Get && r.path().contains("Microsoft.ContainerRegistry/registries")
        })
        .respond(HttpResponse::json(
            200,
            &json!({
                "value": [{
                    "id": "/subscriptions/SUBSCRIPTION_ID/resourceGroups/RESOURCE_GROUP/providers/Microsoft.ContainerRegistry/registries/REGISTRY",
                    "location": "eastus2",
                    "name": "REGISTRY",
                    "properties": {"loginServer": "REGISTRY.azurecr.io"}
                }],
                "nextLink": null
            }),
        ));

    ctx.http
        .when(|r| r.method == Method::Post && r.path().contains("listCredentials"))
        .respond(HttpResponse::json(
            200,
            &json!({
                "username": "admin",
                "passwords": [{"name": "admin", "value": "password"}]
            }),
        ));

    ctx.runner
        .when_contains("kubectl get deployment")
        .respond(RunResult::new(0, list_json(svc_deployment()), ""));
    ctx.runner
        .when_contains("kubectl get svc")
        .respond(RunResult::new(0, list_json(svc_service()), ""));
    ctx.runner
        .when_contains("kubectl get ing")
        .respond(RunResult::new(0, list_json(svc_ingress()), ""));
}
