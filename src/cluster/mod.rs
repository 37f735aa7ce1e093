/// Cluster Resource Layer
///
/// Typed resource specs for the objects a workflow is composed of, and the
/// resource API used to create and delete them on a Kubernetes cluster.

// Deployment / Service / Ingress specs and their k8s-openapi rendering
pub mod specs;

// ResourceApi contract and its kube-rs implementation
pub mod resources;

pub use resources::{DisabledResourceApi, KubeResourceApi, ResourceApi};
pub use specs::{IngressSpec, ServiceSpec, WorkloadSpec};
