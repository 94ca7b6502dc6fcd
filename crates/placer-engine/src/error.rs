//! Engine error types.

use placer_client::{ClientError, WorkflowStatus};
use placer_resolver::ResolverError;
use thiserror::Error;

/// Failure exits of the deployment state machine, one per phase.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("placement criteria matched no deployable unit")]
    Unresolved,

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("deployment creation failed: {0}")]
    CreateFailed(ClientError),

    #[error("instantiation timed out for deployment {0}")]
    PollTimeout(String),

    #[error("instantiation workflow for deployment {deployment_id} ended as {status}")]
    ExecutionFailed {
        deployment_id: String,
        status: WorkflowStatus,
    },

    #[error("placement rule error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("orchestrator error: {0}")]
    Client(#[from] ClientError),
}

impl DeployError {
    /// True for failures caused by the caller's request (bad-request class);
    /// everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DeployError::Unresolved | DeployError::TemplateNotFound(_)
        )
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
