//! Service-level regression tests.
//!
//! Drives the full router the way a client would: placement request in,
//! deployment + install execution out, with the orchestrator scripted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use placer_api::{ApiState, build_router};
use placer_client::{
    ClientResult, DeploymentInstance, OrchestratorApi, UnitTemplate, WorkflowExecution,
    WorkflowInputs, WorkflowStatus,
};
use placer_core::{DeployOutcome, PlacementRequest};
use placer_engine::Engine;
use placer_observe::{EventLog, ServiceStats};
use placer_resolver::{FixedUnitRule, PlacementRule, Resolution, ResolverResult};

/// Orchestrator whose instantiation workflow reports a fixed status.
struct ScriptedOrchestrator {
    status: WorkflowStatus,
    calls: AtomicU32,
    list_calls: AtomicU32,
}

impl ScriptedOrchestrator {
    fn new(status: WorkflowStatus) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl OrchestratorApi for ScriptedOrchestrator {
    async fn get_template(&self, id: &str) -> ClientResult<Option<UnitTemplate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(UnitTemplate {
            id: id.to_string(),
            description: None,
        }))
    }

    async fn create_deployment(
        &self,
        template_id: &str,
        deployment_id: &str,
        _inputs: Option<&WorkflowInputs>,
    ) -> ClientResult<DeploymentInstance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DeploymentInstance {
            id: deployment_id.to_string(),
            unit_id: template_id.to_string(),
        })
    }

    async fn list_executions(&self, deployment_id: &str) -> ClientResult<Vec<WorkflowExecution>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![WorkflowExecution {
            id: "exe-1".to_string(),
            deployment_id: deployment_id.to_string(),
            status: self.status,
            workflow_id: Some("create".to_string()),
        }])
    }

    async fn start_execution(
        &self,
        deployment_id: &str,
        workflow: &str,
    ) -> ClientResult<WorkflowExecution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(WorkflowExecution {
            id: "install-exe-1".to_string(),
            deployment_id: deployment_id.to_string(),
            status: WorkflowStatus::Pending,
            workflow_id: Some(workflow.to_string()),
        })
    }
}

fn test_state(client: Arc<ScriptedOrchestrator>) -> ApiState {
    state_with_rule(client, Arc::new(FixedUnitRule::default()))
}

fn state_with_rule(
    client: Arc<ScriptedOrchestrator>,
    rule: Arc<dyn PlacementRule>,
) -> ApiState {
    let engine = Engine::new(client, rule, EventLog::in_memory());
    ApiState {
        engine: Arc::new(engine),
        stats: Arc::new(ServiceStats::new()),
        log: EventLog::in_memory(),
    }
}

fn post_deployments(body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/deployments")
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn deployment_succeeds_end_to_end() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let state = test_state(Arc::clone(&client));
    let router = build_router(state.clone());

    let resp = router
        .oneshot(post_deployments(Body::from(r#"{"region": "eu-1"}"#)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let outcome: DeployOutcome = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outcome.execution_id, "install-exe-1");
    assert!(outcome.deployment_id.starts_with("b1_"));

    assert_eq!(state.stats.error_count(), 0);
    assert_eq!(state.stats.snapshot().actions.len(), 1);
}

#[tokio::test]
async fn missing_body_yields_400_and_no_orchestrator_calls() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let router = build_router(test_state(Arc::clone(&client)));

    let resp = router
        .oneshot(post_deployments(Body::empty()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "no POST body");
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_yields_400_and_no_orchestrator_calls() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let router = build_router(test_state(Arc::clone(&client)));

    let resp = router
        .oneshot(post_deployments(Body::from("{not json")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_object_body_is_rejected() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let router = build_router(test_state(Arc::clone(&client)));

    let resp = router
        .oneshot(post_deployments(Body::from("{}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolved_placement_yields_400_without_deployment() {
    struct NoMatchRule;
    impl PlacementRule for NoMatchRule {
        fn resolve(&self, _: &PlacementRequest) -> ResolverResult<Option<Resolution>> {
            Ok(None)
        }
    }

    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let state = state_with_rule(Arc::clone(&client), Arc::new(NoMatchRule));
    let router = build_router(state.clone());

    let resp = router
        .oneshot(post_deployments(Body::from(r#"{"region": "eu-1"}"#)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(
        body["message"].as_str().unwrap().contains("no deployable unit"),
        "got: {body}"
    );
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.stats.error_count(), 1);
}

#[tokio::test]
async fn failed_instantiation_yields_500_with_message_body() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Failed);
    let router = build_router(test_state(Arc::clone(&client)));

    let resp = router
        .oneshot(post_deployments(Body::from(r#"{"region": "eu-1"}"#)))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert!(
        body["message"].as_str().unwrap().contains("failed"),
        "got: {body}"
    );
    // Polling stopped at the first failed attempt.
    assert_eq!(client.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn index_serves_route_documentation() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let router = build_router(test_state(client));

    let resp = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("/deployments"));
    assert!(page.contains("/stats"));
}

#[tokio::test]
async fn stats_reflect_handled_requests() {
    let client = ScriptedOrchestrator::new(WorkflowStatus::Terminated);
    let state = test_state(client);
    let router = build_router(state);

    // One success, one failure.
    let resp = router
        .clone()
        .oneshot(post_deployments(Body::from(r#"{"region": "eu-1"}"#)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .clone()
        .oneshot(post_deployments(Body::empty()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = router
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let stats = body_json(resp).await;
    assert_eq!(stats["error_count"], 1);
    assert_eq!(stats["actions"].as_array().unwrap().len(), 2);
}
