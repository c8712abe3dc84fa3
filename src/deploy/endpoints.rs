// ABOUTME: Derives reachable URLs from Services and Ingresses.
// ABOUTME: Services come first, then ingresses, each in the order kubectl returned them.

use crate::tools::kubectl::{Ingress, Service, ServiceType};

fn scheme_for_port(port: i32) -> &'static str {
    if port == 443 { "https" } else { "http" }
}

/// URLs exposed by `services`.
///
/// Load balancers omit the default port for their scheme. Cluster IPs always
/// carry the port. Other service types expose nothing here.
pub fn service_endpoints(services: &[Service]) -> Vec<String> {
    let mut endpoints = Vec::new();
    for service in services {
        match service.spec.service_type {
            ServiceType::LoadBalancer => {
                for address in service.status.load_balancer.addresses() {
                    for port in &service.spec.ports {
                        let scheme = scheme_for_port(port.port);
                        if port.port == 80 || port.port == 443 {
                            endpoints.push(format!("{scheme}://{address}"));
                        } else {
                            endpoints.push(format!("{scheme}://{address}:{}", port.port));
                        }
                    }
                }
            }
            ServiceType::ClusterIP => {
                for ip in service.spec.cluster_addresses() {
                    for port in &service.spec.ports {
                        let scheme = scheme_for_port(port.port);
                        endpoints.push(format!("{scheme}://{ip}:{}", port.port));
                    }
                }
            }
            ServiceType::NodePort | ServiceType::ExternalName | ServiceType::Unknown => {
                tracing::debug!(
                    "skipping service {} of type {:?}",
                    service.resource.metadata.name,
                    service.spec.service_type
                );
            }
        }
    }
    endpoints
}

/// URLs exposed by `ingresses`. Ingresses without an assigned address are skipped.
pub fn ingress_endpoints(ingresses: &[Ingress]) -> Vec<String> {
    let mut endpoints = Vec::new();
    for ingress in ingresses {
        let addresses = ingress.status.load_balancer.addresses();
        if addresses.is_empty() {
            tracing::debug!(
                "ingress {} has no address yet",
                ingress.resource.metadata.name
            );
            continue;
        }

        for rule in &ingress.spec.rules {
            let hosts: Vec<&str> = match rule.host.as_deref().filter(|h| !h.is_empty()) {
                Some(host) => vec![host],
                None => addresses.clone(),
            };
            for host in hosts {
                let scheme = if ingress.spec.is_tls_host(host) {
                    "https"
                } else {
                    "http"
                };
                for path in &rule.http.paths {
                    endpoints.push(format!("{scheme}://{host}{}", path.path));
                }
            }
        }
    }
    endpoints
}
