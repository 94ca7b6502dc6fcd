//! The operation contract the engine consumes.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::types::{DeploymentInstance, UnitTemplate, WorkflowExecution, WorkflowInputs};

/// Operations against the orchestration control plane.
///
/// This is the seam between the engine and the remote API: production code
/// uses [`crate::HttpOrchestrator`]; tests substitute scripted
/// implementations.
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    /// Look up a deployable-unit template. `Ok(None)` means the template
    /// does not exist; `Err` means the lookup itself failed.
    async fn get_template(&self, id: &str) -> ClientResult<Option<UnitTemplate>>;

    /// Create a new deployment instance from a template.
    async fn create_deployment(
        &self,
        template_id: &str,
        deployment_id: &str,
        inputs: Option<&WorkflowInputs>,
    ) -> ClientResult<DeploymentInstance>;

    /// List workflow executions attached to a deployment.
    async fn list_executions(&self, deployment_id: &str) -> ClientResult<Vec<WorkflowExecution>>;

    /// Start a named workflow against a deployment.
    async fn start_execution(
        &self,
        deployment_id: &str,
        workflow: &str,
    ) -> ClientResult<WorkflowExecution>;
}
