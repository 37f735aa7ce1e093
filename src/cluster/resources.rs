/// Cluster resource API
///
/// `ResourceApi` is the contract the workflow orchestrator composes against.
/// `KubeResourceApi` talks to a real cluster through kube-rs; deleting an
/// object that is already gone counts as success so repeated deletes are safe.

use crate::cluster::specs::{IngressSpec, ServiceSpec, WorkloadSpec};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Error as KubeError;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Create/delete operations on the cluster objects a workflow is made of
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<()>;
    async fn delete_workload(&self, name: &str, namespace: &str) -> Result<()>;
    async fn create_service(&self, spec: &ServiceSpec) -> Result<()>;
    async fn delete_service(&self, name: &str, namespace: &str) -> Result<()>;
    async fn create_ingress(&self, spec: &IngressSpec) -> Result<()>;
    async fn delete_ingress(&self, name: &str, namespace: &str) -> Result<()>;
}

/// kube-rs backed resource API
#[derive(Clone)]
pub struct KubeResourceApi {
    client: kube::Client,
}

impl KubeResourceApi {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account
    pub async fn try_default() -> Result<Self> {
        let client = kube::Client::try_default().await?;
        Ok(Self::new(client))
    }

    async fn delete<K>(&self, kind: &str, name: &str, namespace: &str) -> Result<()>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                tracing::info!("🗑️ Deleted {} {}/{}", kind, namespace, name);
                Ok(())
            }
            Err(KubeError::Api(ae)) if ae.code == 404 => {
                tracing::warn!("⚠️ {} {}/{} already absent, treating delete as done", kind, namespace, name);
                Ok(())
            }
            Err(e) => Err(anyhow!("Failed to delete {} {}/{}: {}", kind, namespace, name, e)),
        }
    }
}

#[async_trait]
impl ResourceApi for KubeResourceApi {
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &spec.namespace);
        api.create(&PostParams::default(), &spec.to_deployment())
            .await
            .map_err(|e| anyhow!("Failed to create Deployment {}/{}: {}", spec.namespace, spec.name, e))?;
        tracing::info!("🚀 Created Deployment {}/{}", spec.namespace, spec.name);
        Ok(())
    }

    async fn delete_workload(&self, name: &str, namespace: &str) -> Result<()> {
        self.delete::<Deployment>("Deployment", name, namespace).await
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<()> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &spec.namespace);
        api.create(&PostParams::default(), &spec.to_service())
            .await
            .map_err(|e| anyhow!("Failed to create Service {}/{}: {}", spec.namespace, spec.name, e))?;
        tracing::info!("🔗 Created {} Service {}/{}", spec.service_type, spec.namespace, spec.name);
        Ok(())
    }

    async fn delete_service(&self, name: &str, namespace: &str) -> Result<()> {
        self.delete::<Service>("Service", name, namespace).await
    }

    async fn create_ingress(&self, spec: &IngressSpec) -> Result<()> {
        let api: Api<Ingress> = Api::namespaced(self.client.clone(), &spec.namespace);
        api.create(&PostParams::default(), &spec.to_ingress())
            .await
            .map_err(|e| anyhow!("Failed to create Ingress {}/{}: {}", spec.namespace, spec.name, e))?;
        tracing::info!("🌐 Created Ingress {}/{} for {} host(s)", spec.namespace, spec.name, spec.hosts.len());
        Ok(())
    }

    async fn delete_ingress(&self, name: &str, namespace: &str) -> Result<()> {
        self.delete::<Ingress>("Ingress", name, namespace).await
    }
}

/// Stand-in used when no cluster is configured; every call fails
#[derive(Debug, Clone, Default)]
pub struct DisabledResourceApi;

impl DisabledResourceApi {
    fn unavailable<T>(op: &str) -> Result<T> {
        Err(anyhow!("Kubernetes is disabled, cannot {}", op))
    }
}

#[async_trait]
impl ResourceApi for DisabledResourceApi {
    async fn create_workload(&self, _spec: &WorkloadSpec) -> Result<()> {
        Self::unavailable("create workload")
    }

    async fn delete_workload(&self, _name: &str, _namespace: &str) -> Result<()> {
        Self::unavailable("delete workload")
    }

    async fn create_service(&self, _spec: &ServiceSpec) -> Result<()> {
        Self::unavailable("create service")
    }

    async fn delete_service(&self, _name: &str, _namespace: &str) -> Result<()> {
        Self::unavailable("delete service")
    }

    async fn create_ingress(&self, _spec: &IngressSpec) -> Result<()> {
        Self::unavailable("create ingress")
    }

    async fn delete_ingress(&self, _name: &str, _namespace: &str) -> Result<()> {
        Self::unavailable("delete ingress")
    }
}
