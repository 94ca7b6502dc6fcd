//! API error rendering.
//!
//! Every failure — client-input or server-side — renders as
//! `{"message": "<description>"}`; only the status code differs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use placer_engine::DeployError;

/// An error ready to render as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "message": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placer_client::{ClientError, WorkflowStatus};

    #[test]
    fn client_errors_map_to_400() {
        let err: ApiError = DeployError::Unresolved.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = DeployError::TemplateNotFound("b1".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_errors_map_to_500() {
        let err: ApiError = DeployError::PollTimeout("d1".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = DeployError::ExecutionFailed {
            deployment_id: "d1".to_string(),
            status: WorkflowStatus::Failed,
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = DeployError::CreateFailed(ClientError::Api {
            status: 502,
            message: "boom".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
