/// Core workflow type definitions
///
/// A workflow bundles a Deployment, a Service and (for the Ingress type) an
/// Ingress into one record. Only the identity, replica count and service type
/// are stored; every derived resource name is recomputed from the workflow name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Suffix appended to a workflow name to form its Service name
pub const SERVICE_SUFFIX: &str = "-svc";
/// Suffix appended to a workflow name to form its Ingress name
pub const INGRESS_SUFFIX: &str = "-ing";

/// Service name for a workflow: `<name>-svc`
pub fn service_name(workflow_name: &str) -> String {
    format!("{}{}", workflow_name, SERVICE_SUFFIX)
}

/// Ingress name for a workflow: `<name>-ing`
pub fn ingress_name(workflow_name: &str) -> String {
    format!("{}{}", workflow_name, INGRESS_SUFFIX)
}

/// How a workflow is exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    ClusterIP,
    NodePort,
    /// ClusterIP service fronted by an Ingress rule
    Ingress,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::Ingress => "Ingress",
        }
    }

    /// The Kubernetes Service type backing this logical type.
    /// Ingress terminates at a ClusterIP service.
    pub fn kube_service_type(&self) -> &'static str {
        match self {
            ServiceType::Ingress => "ClusterIP",
            other => other.as_str(),
        }
    }

    pub fn is_ingress(&self) -> bool {
        matches!(self, ServiceType::Ingress)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ClusterIP" => Ok(ServiceType::ClusterIP),
            "NodePort" => Ok(ServiceType::NodePort),
            "Ingress" => Ok(ServiceType::Ingress),
            other => Err(anyhow::anyhow!("Unknown service type: {}", other)),
        }
    }
}

/// A persisted workflow record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Storage identifier (0 until persisted)
    pub id: i64,
    /// Workflow name, unique within its namespace
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub service_type: ServiceType,
}

impl Workflow {
    /// Deployment name, always equal to the workflow name
    pub fn deployment_name(&self) -> &str {
        &self.name
    }

    pub fn service_name(&self) -> String {
        service_name(&self.name)
    }

    /// Ingress name, present only for the Ingress service type
    pub fn ingress_name(&self) -> Option<String> {
        self.service_type.is_ingress().then(|| ingress_name(&self.name))
    }
}

/// Serialized view of a workflow including its derived resource names
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    pub id: i64,
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub deployment: String,
    pub service: String,
    /// Empty string when the workflow has no ingress
    pub ingress: String,
    pub service_type: ServiceType,
}

impl From<&Workflow> for WorkflowView {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.name.clone(),
            namespace: workflow.namespace.clone(),
            replicas: workflow.replicas,
            deployment: workflow.deployment_name().to_string(),
            service: workflow.service_name(),
            ingress: workflow.ingress_name().unwrap_or_default(),
            service_type: workflow.service_type,
        }
    }
}

/// One HTTP path routed by an ingress host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPath {
    pub path: String,
    /// Kubernetes pathType: Prefix, Exact or ImplementationSpecific
    #[serde(default = "default_path_type")]
    pub path_type: String,
    pub service_name: String,
    pub service_port: i32,
}

fn default_path_type() -> String {
    "Prefix".to_string()
}

/// Request body for creating a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCreateInput {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub image: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// CPU quantity, e.g. "500m"
    #[serde(default)]
    pub cpu: Option<String>,
    /// Memory quantity, e.g. "256Mi"
    #[serde(default)]
    pub memory: Option<String>,
    pub container_port: i32,
    #[serde(default)]
    pub health_check: bool,
    #[serde(default)]
    pub health_path: Option<String>,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    /// Service port
    pub port: i32,
    /// Node port, used only for NodePort services
    #[serde(default)]
    pub node_port: Option<i32>,
    /// Ingress hosts, keyed by host name
    #[serde(default)]
    pub hosts: BTreeMap<String, Vec<IngressPath>>,
}

impl WorkflowCreateInput {
    /// Reject malformed input before any resource is touched
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("workflow name is required");
        }
        if self.namespace.trim().is_empty() {
            anyhow::bail!("workflow namespace is required");
        }
        if self.replicas < 0 {
            anyhow::bail!("replicas must not be negative");
        }
        if self.service_type.is_ingress() && self.hosts.is_empty() {
            anyhow::bail!("ingress workflows need at least one host");
        }
        Ok(())
    }
}

/// Query parameters for listing workflows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowListInput {
    /// Substring match against the workflow name
    #[serde(default)]
    pub filter_name: String,
    /// 1-based page number
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

impl WorkflowListInput {
    pub const DEFAULT_LIMIT: u32 = 10;

    /// (offset, limit) with page and limit clamped to sane minimums
    pub fn offset_limit(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let limit = if self.limit == 0 { Self::DEFAULT_LIMIT } else { self.limit } as i64;
        ((page - 1) * limit, limit)
    }
}

/// A page of workflows plus the unpaginated total
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowPage {
    pub items: Vec<WorkflowView>,
    pub total: i64,
}

/// Returned when a workflow id has no stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowNotFound(pub i64);

impl fmt::Display for WorkflowNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workflow not found: {}", self.0)
    }
}

impl std::error::Error for WorkflowNotFound {}

/// Returned when a workflow name is already taken in its namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowExists {
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for WorkflowExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workflow {}/{} already exists", self.namespace, self.name)
    }
}

impl std::error::Error for WorkflowExists {}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(name: &str, service_type: ServiceType) -> Workflow {
        Workflow {
            id: 1,
            name: name.to_string(),
            namespace: "default".to_string(),
            replicas: 1,
            service_type,
        }
    }

    #[test]
    fn derived_names_follow_workflow_name() {
        for name in ["web", "api-gateway", "a"] {
            let wf = workflow(name, ServiceType::Ingress);
            assert_eq!(wf.service_name(), format!("{}-svc", name));
            assert_eq!(wf.ingress_name(), Some(format!("{}-ing", name)));
            assert_eq!(wf.deployment_name(), name);
            // recomputed on every call
            assert_eq!(wf.service_name(), wf.service_name());
        }
    }

    #[test]
    fn only_ingress_workflows_have_an_ingress_name() {
        assert_eq!(workflow("web", ServiceType::ClusterIP).ingress_name(), None);
        assert_eq!(workflow("web", ServiceType::NodePort).ingress_name(), None);

        let view = WorkflowView::from(&workflow("web", ServiceType::NodePort));
        assert_eq!(view.ingress, "");
        assert_eq!(view.service, "web-svc");
    }

    #[test]
    fn ingress_is_backed_by_cluster_ip() {
        assert_eq!(ServiceType::Ingress.kube_service_type(), "ClusterIP");
        assert_eq!(ServiceType::NodePort.kube_service_type(), "NodePort");
        assert_eq!(ServiceType::ClusterIP.kube_service_type(), "ClusterIP");
    }

    #[test]
    fn service_type_parses_its_own_display() {
        for ty in [ServiceType::ClusterIP, ServiceType::NodePort, ServiceType::Ingress] {
            assert_eq!(ty.to_string().parse::<ServiceType>().unwrap(), ty);
        }
        assert!("LoadBalancer".parse::<ServiceType>().is_err());
    }

    #[test]
    fn create_input_deserializes_type_field() {
        let input: WorkflowCreateInput = serde_json::from_value(serde_json::json!({
            "name": "web",
            "namespace": "default",
            "replicas": 2,
            "image": "nginx:1.27",
            "container_port": 80,
            "type": "Ingress",
            "port": 80,
            "hosts": { "web.example.com": [
                { "path": "/", "service_name": "web-svc", "service_port": 80 }
            ]}
        }))
        .unwrap();

        assert_eq!(input.service_type, ServiceType::Ingress);
        assert_eq!(input.hosts["web.example.com"][0].path_type, "Prefix");
        input.validate().unwrap();
    }

    #[test]
    fn validation_rejects_ingress_without_hosts() {
        let input = WorkflowCreateInput {
            name: "web".to_string(),
            namespace: "default".to_string(),
            replicas: 1,
            image: "nginx".to_string(),
            labels: BTreeMap::new(),
            cpu: None,
            memory: None,
            container_port: 80,
            health_check: false,
            health_path: None,
            service_type: ServiceType::Ingress,
            port: 80,
            node_port: None,
            hosts: BTreeMap::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn list_input_clamps_page_and_limit() {
        assert_eq!(WorkflowListInput::default().offset_limit(), (0, 10));
        let input = WorkflowListInput { filter_name: String::new(), page: 3, limit: 5 };
        assert_eq!(input.offset_limit(), (10, 5));
    }
}
