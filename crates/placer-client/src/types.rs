//! Wire types for the orchestration control plane.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs passed to a deployment at creation, an arbitrary JSON object.
pub type WorkflowInputs = serde_json::Map<String, serde_json::Value>;

/// A deployable-unit template registered with the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitTemplate {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A concrete deployment instantiated from a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentInstance {
    pub id: String,
    pub unit_id: String,
}

/// An asynchronous workflow execution tracked by the control plane.
/// The engine only ever observes these by polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowExecution {
    pub id: String,
    pub deployment_id: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

/// Lifecycle status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Started,
    Terminated,
    Cancelled,
    Cancelling,
    ForceCancelling,
    Failed,
}

impl WorkflowStatus {
    /// Successful terminal state.
    pub fn is_terminated(self) -> bool {
        self == WorkflowStatus::Terminated
    }

    /// States that mean the execution will never terminate successfully.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Cancelled
                | WorkflowStatus::Cancelling
                | WorkflowStatus::ForceCancelling
                | WorkflowStatus::Failed
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Started => "started",
            WorkflowStatus::Terminated => "terminated",
            WorkflowStatus::Cancelled => "cancelled",
            WorkflowStatus::Cancelling => "cancelling",
            WorkflowStatus::ForceCancelling => "force_cancelling",
            WorkflowStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
