/// Resource specifications passed to the cluster resource API
///
/// Each spec knows how to render itself as the typed k8s-openapi object.

use crate::workflow::types::{IngressPath, WorkflowCreateInput};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, HTTPGetAction, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements, Service, ServicePort, ServiceSpec as KubeServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec as KubeIngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Workload controller (Deployment) to create
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub container_port: i32,
    pub health_check: bool,
    pub health_path: Option<String>,
}

/// Network service to create
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub namespace: String,
    /// Kubernetes Service type ("ClusterIP" or "NodePort")
    pub service_type: String,
    pub container_port: i32,
    pub port: i32,
    pub node_port: Option<i32>,
    pub labels: BTreeMap<String, String>,
}

/// Ingress rule set to create
#[derive(Debug, Clone, PartialEq)]
pub struct IngressSpec {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub hosts: BTreeMap<String, Vec<IngressPath>>,
}

/// Labels every workflow resource carries, `app=<name>` plus the user's own
fn workload_labels(name: &str, labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged = labels.clone();
    merged.entry("app".to_string()).or_insert_with(|| name.to_string());
    merged
}

fn metadata(name: &str, namespace: &str, labels: BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}

impl WorkloadSpec {
    pub fn from_input(input: &WorkflowCreateInput) -> Self {
        Self {
            name: input.name.clone(),
            namespace: input.namespace.clone(),
            replicas: input.replicas,
            image: input.image.clone(),
            labels: workload_labels(&input.name, &input.labels),
            cpu: input.cpu.clone(),
            memory: input.memory.clone(),
            container_port: input.container_port,
            health_check: input.health_check,
            health_path: input.health_path.clone(),
        }
    }

    fn resources(&self) -> Option<ResourceRequirements> {
        let mut quantities = BTreeMap::new();
        if let Some(cpu) = &self.cpu {
            quantities.insert("cpu".to_string(), Quantity(cpu.clone()));
        }
        if let Some(memory) = &self.memory {
            quantities.insert("memory".to_string(), Quantity(memory.clone()));
        }
        if quantities.is_empty() {
            return None;
        }
        Some(ResourceRequirements {
            limits: Some(quantities.clone()),
            requests: Some(quantities),
            ..Default::default()
        })
    }

    fn probe(&self, initial_delay_seconds: i32) -> Option<Probe> {
        if !self.health_check {
            return None;
        }
        Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some(self.health_path.clone().unwrap_or_else(|| "/".to_string())),
                port: IntOrString::Int(self.container_port),
                ..Default::default()
            }),
            initial_delay_seconds: Some(initial_delay_seconds),
            timeout_seconds: Some(5),
            period_seconds: Some(5),
            ..Default::default()
        })
    }

    pub fn to_deployment(&self) -> Deployment {
        let container = Container {
            name: self.name.clone(),
            image: Some(self.image.clone()),
            ports: Some(vec![ContainerPort {
                name: Some("http".to_string()),
                container_port: self.container_port,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            resources: self.resources(),
            readiness_probe: self.probe(5),
            liveness_probe: self.probe(15),
            ..Default::default()
        };

        Deployment {
            metadata: metadata(&self.name, &self.namespace, self.labels.clone()),
            spec: Some(DeploymentSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_labels: Some(self.labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(self.labels.clone()),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![container],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl ServiceSpec {
    pub fn to_service(&self) -> Service {
        let node_port = if self.service_type == "NodePort" { self.node_port } else { None };

        Service {
            metadata: metadata(&self.name, &self.namespace, self.labels.clone()),
            spec: Some(KubeServiceSpec {
                type_: Some(self.service_type.clone()),
                selector: Some(self.labels.clone()),
                ports: Some(vec![ServicePort {
                    name: Some("http".to_string()),
                    port: self.port,
                    target_port: Some(IntOrString::Int(self.container_port)),
                    node_port,
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl IngressSpec {
    pub fn to_ingress(&self) -> Ingress {
        let rules = self
            .hosts
            .iter()
            .map(|(host, paths)| IngressRule {
                host: Some(host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: paths
                        .iter()
                        .map(|p| HTTPIngressPath {
                            path: Some(p.path.clone()),
                            path_type: p.path_type.clone(),
                            backend: IngressBackend {
                                service: Some(IngressServiceBackend {
                                    name: p.service_name.clone(),
                                    port: Some(ServiceBackendPort {
                                        number: Some(p.service_port),
                                        ..Default::default()
                                    }),
                                }),
                                ..Default::default()
                            },
                        })
                        .collect(),
                }),
            })
            .collect();

        Ingress {
            metadata: metadata(&self.name, &self.namespace, self.labels.clone()),
            spec: Some(KubeIngressSpec {
                rules: Some(rules),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
