/// Workflow orchestrator
///
/// Composes a workflow's Deployment, Service and optional Ingress on save and
/// tears them down on delete. Every operation runs in the caller's task as a
/// strict sequence: resource steps first, then the database record.

use crate::cluster::{IngressSpec, ResourceApi, ServiceSpec, WorkloadSpec};
use crate::workflow::saga::{Saga, SagaStep};
use crate::workflow::storage::WorkflowStore;
use crate::workflow::types::{
    ingress_name, service_name, Workflow, WorkflowCreateInput, WorkflowExists, WorkflowListInput,
    WorkflowNotFound, WorkflowPage, WorkflowView,
};
use anyhow::Result;
use std::sync::Arc;

/// Save / Delete / Find / FindList over workflows
#[derive(Clone)]
pub struct WorkflowService {
    resources: Arc<dyn ResourceApi>,
    store: Arc<dyn WorkflowStore>,
    /// Compensate completed resource steps when a later step fails
    rollback_on_failure: bool,
}

impl WorkflowService {
    pub fn new(
        resources: Arc<dyn ResourceApi>,
        store: Arc<dyn WorkflowStore>,
        rollback_on_failure: bool,
    ) -> Self {
        Self { resources, store, rollback_on_failure }
    }

    /// Create the workflow's cluster resources, then persist its record.
    ///
    /// A failed resource step aborts the save and no record is written. Unless
    /// rollback is enabled, resources created before the failure stay behind.
    ///
    /// The name check runs before any resource call, but two concurrent saves
    /// of the same name can both pass it. The loser then fails at the insert
    /// with `WorkflowExists`; its resource calls already hit the same objects
    /// as the winner's, so nothing is rolled back for it.
    pub async fn save(&self, input: &WorkflowCreateInput) -> Result<Workflow> {
        input.validate()?;

        if self.store.find_workflow_by_name(&input.name, &input.namespace).await?.is_some() {
            return Err(WorkflowExists {
                name: input.name.clone(),
                namespace: input.namespace.clone(),
            }
            .into());
        }

        tracing::info!("🏗️ Composing workflow {}/{} ({})", input.namespace, input.name, input.service_type);

        let saga = compose_saga(input);
        saga.execute(self.resources.as_ref(), self.rollback_on_failure).await?;

        let mut workflow = Workflow {
            id: 0,
            name: input.name.clone(),
            namespace: input.namespace.clone(),
            replicas: input.replicas,
            service_type: input.service_type,
        };

        match self.store.save_workflow(&workflow).await {
            Ok(id) => workflow.id = id,
            // The resources share their names with the winning save, so they
            // are never compensated here.
            Err(e) if e.downcast_ref::<WorkflowExists>().is_some() => {
                tracing::warn!(
                    "⚠️ Workflow {}/{} was saved concurrently, keeping its resources",
                    input.namespace,
                    input.name
                );
                return Err(e);
            }
            Err(e) => {
                if self.rollback_on_failure {
                    saga.compensate_all(self.resources.as_ref()).await;
                }
                return Err(e);
            }
        }

        tracing::info!("✅ Saved workflow {} ({}/{})", workflow.id, workflow.namespace, workflow.name);
        Ok(workflow)
    }

    /// Delete the workflow's cluster resources, then its record.
    ///
    /// Any failed step aborts the rest, leaving the record in place so the
    /// delete can be retried.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let workflow = self.store.find_workflow(id).await?.ok_or(WorkflowNotFound(id))?;

        tracing::info!("🗑️ Decomposing workflow {} ({}/{})", id, workflow.namespace, workflow.name);

        decompose_saga(&workflow)
            .execute(self.resources.as_ref(), false)
            .await?;

        self.store.delete_workflow(id).await?;

        tracing::info!("✅ Deleted workflow {} ({}/{})", id, workflow.namespace, workflow.name);
        Ok(())
    }

    pub async fn find(&self, id: i64) -> Result<Option<Workflow>> {
        self.store.find_workflow(id).await
    }

    pub async fn find_list(&self, filter: &WorkflowListInput) -> Result<WorkflowPage> {
        let (workflows, total) = self.store.page_workflows(filter).await?;
        Ok(WorkflowPage {
            items: workflows.iter().map(WorkflowView::from).collect(),
            total,
        })
    }
}

/// Deployment, then Service, then (Ingress type only) Ingress
pub(crate) fn compose_saga(input: &WorkflowCreateInput) -> Saga {
    let workload = WorkloadSpec::from_input(input);

    let service = ServiceSpec {
        name: service_name(&input.name),
        namespace: input.namespace.clone(),
        service_type: input.service_type.kube_service_type().to_string(),
        container_port: input.container_port,
        port: input.port,
        node_port: input.node_port,
        // selector must match the pod labels
        labels: workload.labels.clone(),
    };

    let mut saga = Saga::new(format!("save workflow {}", input.name))
        .step(SagaStep::CreateWorkload(workload.clone()))
        .step(SagaStep::CreateService(service));

    if input.service_type.is_ingress() {
        saga = saga.step(SagaStep::CreateIngress(IngressSpec {
            name: ingress_name(&input.name),
            namespace: input.namespace.clone(),
            labels: workload.labels,
            hosts: input.hosts.clone(),
        }));
    }

    saga
}

/// Deployment, then Service, then (Ingress type only) Ingress; names re-derived
pub(crate) fn decompose_saga(workflow: &Workflow) -> Saga {
    let mut saga = Saga::new(format!("delete workflow {}", workflow.name))
        .step(SagaStep::DeleteWorkload {
            name: workflow.deployment_name().to_string(),
            namespace: workflow.namespace.clone(),
        })
        .step(SagaStep::DeleteService {
            name: workflow.service_name(),
            namespace: workflow.namespace.clone(),
        });

    if let Some(ingress) = workflow.ingress_name() {
        saga = saga.step(SagaStep::DeleteIngress {
            name: ingress,
            namespace: workflow.namespace.clone(),
        });
    }

    saga
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::workflow::saga::testing::RecordingResourceApi;
    use crate::workflow::storage::SqliteWorkflowStore;
    use crate::workflow::types::{IngressPath, ServiceType};
    use std::collections::BTreeMap;

    fn input(name: &str, service_type: ServiceType) -> WorkflowCreateInput {
        let mut hosts = BTreeMap::new();
        if service_type.is_ingress() {
            hosts.insert(
                "web.example.com".to_string(),
                vec![IngressPath {
                    path: "/".to_string(),
                    path_type: "Prefix".to_string(),
                    service_name: service_name(name),
                    service_port: 80,
                }],
            );
        }
        WorkflowCreateInput {
            name: name.to_string(),
            namespace: "default".to_string(),
            replicas: 2,
            image: "nginx:1.27".to_string(),
            labels: BTreeMap::new(),
            cpu: None,
            memory: None,
            container_port: 8080,
            health_check: false,
            health_path: None,
            service_type,
            port: 80,
            node_port: Some(30080),
            hosts,
        }
    }

    async fn service(api: Arc<RecordingResourceApi>, rollback: bool) -> (WorkflowService, Arc<SqliteWorkflowStore>) {
        let db = DatabaseManager::in_memory().await.unwrap();
        let store = Arc::new(SqliteWorkflowStore::new(db.pool()));
        (WorkflowService::new(api, store.clone(), rollback), store)
    }

    #[tokio::test]
    async fn save_without_ingress_never_creates_one() {
        for ty in [ServiceType::ClusterIP, ServiceType::NodePort] {
            let api = Arc::new(RecordingResourceApi::default());
            let (svc, _) = service(api.clone(), false).await;

            let saved = svc.save(&input("web", ty)).await.unwrap();
            assert_eq!(api.ops(), vec!["create_workload", "create_service"]);
            assert_eq!(
                api.calls(),
                vec!["create_workload default/web", "create_service default/web-svc"]
            );

            let stored = svc.find(saved.id).await.unwrap().unwrap();
            assert_eq!(stored.ingress_name(), None);
            assert_eq!(WorkflowView::from(&stored).ingress, "");
        }
    }

    #[tokio::test]
    async fn save_ingress_creates_all_three_in_order() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api.clone(), false).await;

        let saved = svc.save(&input("web", ServiceType::Ingress)).await.unwrap();
        assert_eq!(
            api.calls(),
            vec![
                "create_workload default/web",
                "create_service default/web-svc",
                "create_ingress default/web-ing",
            ]
        );
        assert_eq!(saved.ingress_name().as_deref(), Some("web-ing"));
    }

    #[test]
    fn ingress_workflows_get_a_cluster_ip_service() {
        let saga = compose_saga(&input("web", ServiceType::Ingress));
        let service = saga
            .steps()
            .iter()
            .find_map(|s| match s {
                SagaStep::CreateService(spec) => Some(spec.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(service.service_type, "ClusterIP");
        assert_eq!(service.name, "web-svc");

        let saga = compose_saga(&input("web", ServiceType::NodePort));
        assert!(matches!(&saga.steps()[1], SagaStep::CreateService(s) if s.service_type == "NodePort"));
    }

    #[tokio::test]
    async fn failed_ingress_creation_leaves_resources_and_no_record() {
        let api = Arc::new(RecordingResourceApi::failing_on("create_ingress"));
        let (svc, store) = service(api.clone(), false).await;

        let err = svc.save(&input("web", ServiceType::Ingress)).await.unwrap_err();
        assert!(err.to_string().contains("create_ingress refused"));
        assert_eq!(api.ops(), vec!["create_workload", "create_service", "create_ingress"]);

        let (items, total) = store.page_workflows(&WorkflowListInput::default()).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn rollback_compensates_in_reverse_order() {
        let api = Arc::new(RecordingResourceApi::failing_on("create_ingress"));
        let (svc, store) = service(api.clone(), true).await;

        assert!(svc.save(&input("web", ServiceType::Ingress)).await.is_err());
        assert_eq!(
            api.calls(),
            vec![
                "create_workload default/web",
                "create_service default/web-svc",
                "create_ingress default/web-ing",
                "delete_service default/web-svc",
                "delete_workload default/web",
            ]
        );
        assert!(store.find_workflow_by_name("web", "default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected_before_touching_the_cluster() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api.clone(), false).await;
        svc.save(&input("web", ServiceType::ClusterIP)).await.unwrap();

        let err = svc.save(&input("web", ServiceType::ClusterIP)).await.unwrap_err();
        assert!(err.downcast_ref::<WorkflowExists>().is_some());
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn invalid_input_has_no_side_effects() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api.clone(), false).await;

        let mut bad = input("web", ServiceType::ClusterIP);
        bad.namespace = String::new();
        assert!(svc.save(&bad).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_non_ingress_skips_ingress_delete() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, store) = service(api.clone(), false).await;
        let saved = svc.save(&input("web", ServiceType::NodePort)).await.unwrap();

        svc.delete(saved.id).await.unwrap();
        assert_eq!(
            api.calls()[2..],
            ["delete_workload default/web", "delete_service default/web-svc"]
        );
        assert!(store.find_workflow(saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_ingress_workflow_removes_all_three() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api.clone(), false).await;
        let saved = svc.save(&input("web", ServiceType::Ingress)).await.unwrap();

        svc.delete(saved.id).await.unwrap();
        assert_eq!(api.ops()[3..], ["delete_workload", "delete_service", "delete_ingress"]);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api.clone(), false).await;

        let err = svc.delete(42).await.unwrap_err();
        assert_eq!(err.downcast_ref::<WorkflowNotFound>(), Some(&WorkflowNotFound(42)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_record() {
        let api = Arc::new(RecordingResourceApi::failing_on("delete_service"));
        let (svc, store) = service(api.clone(), false).await;
        let saved = svc.save(&input("web", ServiceType::Ingress)).await.unwrap();

        assert!(svc.delete(saved.id).await.is_err());
        assert_eq!(api.ops()[3..], ["delete_workload", "delete_service"]);
        assert!(store.find_workflow(saved.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_list_returns_views_and_total() {
        let api = Arc::new(RecordingResourceApi::default());
        let (svc, _) = service(api, false).await;
        svc.save(&input("web", ServiceType::Ingress)).await.unwrap();
        svc.save(&input("worker", ServiceType::ClusterIP)).await.unwrap();

        let page = svc
            .find_list(&WorkflowListInput { filter_name: "web".to_string(), page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].service, "web-svc");
        assert_eq!(page.items[0].ingress, "web-ing");
    }

    /// Sqlite store that never reports an existing name, as seen by a save
    /// racing another save of the same workflow
    struct RacingStore(SqliteWorkflowStore);

    #[async_trait::async_trait]
    impl WorkflowStore for RacingStore {
        async fn save_workflow(&self, workflow: &Workflow) -> Result<i64> {
            self.0.save_workflow(workflow).await
        }

        async fn find_workflow(&self, id: i64) -> Result<Option<Workflow>> {
            self.0.find_workflow(id).await
        }

        async fn find_workflow_by_name(&self, _name: &str, _namespace: &str) -> Result<Option<Workflow>> {
            Ok(None)
        }

        async fn delete_workflow(&self, id: i64) -> Result<bool> {
            self.0.delete_workflow(id).await
        }

        async fn page_workflows(&self, filter: &WorkflowListInput) -> Result<(Vec<Workflow>, i64)> {
            self.0.page_workflows(filter).await
        }
    }

    #[tokio::test]
    async fn concurrent_duplicate_fails_at_insert_without_rollback() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let api = Arc::new(RecordingResourceApi::default());
        let store = Arc::new(RacingStore(SqliteWorkflowStore::new(db.pool())));
        let svc = WorkflowService::new(api.clone(), store, true);

        svc.save(&input("web", ServiceType::ClusterIP)).await.unwrap();
        let err = svc.save(&input("web", ServiceType::ClusterIP)).await.unwrap_err();

        assert!(err.downcast_ref::<WorkflowExists>().is_some());
        assert_eq!(
            api.ops(),
            vec![
                "create_workload",
                "create_service",
                "create_workload",
                "create_service",
            ]
        );
        assert_eq!(svc.find_list(&WorkflowListInput::default()).await.unwrap().total, 1);
    }
}
