/// Ordered multi-step resource operations with optional compensation
///
/// A saga runs its steps in order and stops at the first failure. Create steps
/// carry a compensating delete; delete steps have none. Whether completed
/// steps are compensated on failure is decided by the caller.

use crate::cluster::{IngressSpec, ResourceApi, ServiceSpec, WorkloadSpec};
use anyhow::Result;

/// One call against the cluster resource API
#[derive(Debug, Clone, PartialEq)]
pub enum SagaStep {
    CreateWorkload(WorkloadSpec),
    CreateService(ServiceSpec),
    CreateIngress(IngressSpec),
    DeleteWorkload { name: String, namespace: String },
    DeleteService { name: String, namespace: String },
    DeleteIngress { name: String, namespace: String },
}

impl SagaStep {
    pub fn describe(&self) -> String {
        match self {
            SagaStep::CreateWorkload(s) => format!("create workload {}/{}", s.namespace, s.name),
            SagaStep::CreateService(s) => format!("create service {}/{}", s.namespace, s.name),
            SagaStep::CreateIngress(s) => format!("create ingress {}/{}", s.namespace, s.name),
            SagaStep::DeleteWorkload { name, namespace } => format!("delete workload {}/{}", namespace, name),
            SagaStep::DeleteService { name, namespace } => format!("delete service {}/{}", namespace, name),
            SagaStep::DeleteIngress { name, namespace } => format!("delete ingress {}/{}", namespace, name),
        }
    }

    /// The step that undoes this one, if any
    pub fn compensation(&self) -> Option<SagaStep> {
        match self {
            SagaStep::CreateWorkload(s) => Some(SagaStep::DeleteWorkload {
                name: s.name.clone(),
                namespace: s.namespace.clone(),
            }),
            SagaStep::CreateService(s) => Some(SagaStep::DeleteService {
                name: s.name.clone(),
                namespace: s.namespace.clone(),
            }),
            SagaStep::CreateIngress(s) => Some(SagaStep::DeleteIngress {
                name: s.name.clone(),
                namespace: s.namespace.clone(),
            }),
            SagaStep::DeleteWorkload { .. }
            | SagaStep::DeleteService { .. }
            | SagaStep::DeleteIngress { .. } => None,
        }
    }

    async fn apply(&self, api: &dyn ResourceApi) -> Result<()> {
        match self {
            SagaStep::CreateWorkload(spec) => api.create_workload(spec).await,
            SagaStep::CreateService(spec) => api.create_service(spec).await,
            SagaStep::CreateIngress(spec) => api.create_ingress(spec).await,
            SagaStep::DeleteWorkload { name, namespace } => api.delete_workload(name, namespace).await,
            SagaStep::DeleteService { name, namespace } => api.delete_service(name, namespace).await,
            SagaStep::DeleteIngress { name, namespace } => api.delete_ingress(name, namespace).await,
        }
    }
}

/// An ordered list of steps executed as one logical operation
#[derive(Debug, Clone)]
pub struct Saga {
    name: String,
    steps: Vec<SagaStep>,
}

impl Saga {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    pub fn step(mut self, step: SagaStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Run every step in order.
    ///
    /// On failure the remaining steps are skipped and the step's error is
    /// returned unchanged. With `rollback` set, completed steps are compensated
    /// in reverse order first; otherwise they are only reported as orphaned.
    pub async fn execute(&self, api: &dyn ResourceApi, rollback: bool) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::debug!("📍 {} step {}/{}: {}", self.name, index + 1, self.steps.len(), step.describe());

            if let Err(err) = step.apply(api).await {
                tracing::error!("❌ {} failed at '{}': {}", self.name, step.describe(), err);
                let completed = &self.steps[..index];
                if rollback {
                    self.compensate(api, completed).await;
                } else {
                    for orphan in completed.iter().filter(|s| s.compensation().is_some()) {
                        tracing::warn!("⚠️ {} left in place after failure: {}", self.name, orphan.describe());
                    }
                }
                return Err(err);
            }
        }

        tracing::debug!("✅ {} completed {} step(s)", self.name, self.steps.len());
        Ok(())
    }

    /// Undo every step of an already completed saga, last step first
    pub async fn compensate_all(&self, api: &dyn ResourceApi) {
        self.compensate(api, &self.steps).await;
    }

    async fn compensate(&self, api: &dyn ResourceApi, completed: &[SagaStep]) {
        for step in completed.iter().rev() {
            let Some(undo) = step.compensation() else { continue };
            match undo.apply(api).await {
                Ok(()) => tracing::info!("↩️ {} compensated: {}", self.name, undo.describe()),
                Err(e) => tracing::error!("❌ {} compensation '{}' failed: {}", self.name, undo.describe(), e),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingResourceApi;
    use super::*;

    fn delete(kind: &str, name: &str) -> SagaStep {
        let (name, namespace) = (name.to_string(), "default".to_string());
        match kind {
            "workload" => SagaStep::DeleteWorkload { name, namespace },
            "service" => SagaStep::DeleteService { name, namespace },
            _ => SagaStep::DeleteIngress { name, namespace },
        }
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let api = RecordingResourceApi::failing_on("delete_service");
        let saga = Saga::new("teardown")
            .step(delete("workload", "web"))
            .step(delete("service", "web-svc"))
            .step(delete("ingress", "web-ing"));

        let err = saga.execute(&api, true).await.unwrap_err();
        assert!(err.to_string().contains("delete_service refused"));
        assert_eq!(api.ops(), vec!["delete_workload", "delete_service"]);
    }

    #[test]
    fn only_create_steps_have_compensations() {
        assert!(delete("workload", "web").compensation().is_none());

        let create = SagaStep::CreateService(ServiceSpec {
            name: "web-svc".to_string(),
            namespace: "default".to_string(),
            service_type: "ClusterIP".to_string(),
            container_port: 80,
            port: 80,
            node_port: None,
            labels: Default::default(),
        });
        assert_eq!(create.compensation(), Some(delete("service", "web-svc")));
    }

    #[tokio::test]
    async fn empty_saga_succeeds() {
        let api = RecordingResourceApi::default();
        Saga::new("noop").execute(&api, false).await.unwrap();
        assert!(api.calls().is_empty());
    }
}
