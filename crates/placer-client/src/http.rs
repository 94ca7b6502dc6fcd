//! HTTP implementation of the orchestrator contract.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::OrchestratorApi;
use crate::error::{ClientError, ClientResult};
use crate::types::{DeploymentInstance, UnitTemplate, WorkflowExecution, WorkflowInputs};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// reqwest-backed client for the orchestration control plane.
///
/// Authenticates with basic auth and scopes every call to a tenant via the
/// `x-tenant` header.
pub struct HttpOrchestrator {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    tenant: String,
}

impl HttpOrchestrator {
    pub fn new(
        endpoint: &str,
        username: &str,
        password: &str,
        tenant: &str,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            tenant: tenant.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .header("x-tenant", &self.tenant)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let message = resp.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl OrchestratorApi for HttpOrchestrator {
    async fn get_template(&self, id: &str) -> ClientResult<Option<UnitTemplate>> {
        debug!(template = id, "fetching template");
        let req = self.request(Method::GET, &format!("/api/v1/templates/{id}"));
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp.json().await?)),
            status => {
                let message = resp.text().await.unwrap_or_default();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn create_deployment(
        &self,
        template_id: &str,
        deployment_id: &str,
        inputs: Option<&WorkflowInputs>,
    ) -> ClientResult<DeploymentInstance> {
        debug!(template = template_id, deployment = deployment_id, "creating deployment");
        let body = serde_json::json!({
            "template_id": template_id,
            "deployment_id": deployment_id,
            "inputs": inputs,
        });
        self.send(self.request(Method::POST, "/api/v1/deployments").json(&body))
            .await
    }

    async fn list_executions(&self, deployment_id: &str) -> ClientResult<Vec<WorkflowExecution>> {
        let req = self
            .request(Method::GET, "/api/v1/executions")
            .query(&[("deployment_id", deployment_id)]);
        self.send(req).await
    }

    async fn start_execution(
        &self,
        deployment_id: &str,
        workflow: &str,
    ) -> ClientResult<WorkflowExecution> {
        debug!(deployment = deployment_id, workflow, "starting execution");
        let body = serde_json::json!({
            "deployment_id": deployment_id,
            "workflow_id": workflow,
        });
        self.send(self.request(Method::POST, "/api/v1/executions").json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = HttpOrchestrator::new("http://cp:8100/", "u", "p", "t").unwrap();
        assert_eq!(client.base_url, "http://cp:8100");

        let client = HttpOrchestrator::new("http://cp:8100", "u", "p", "t").unwrap();
        assert_eq!(client.base_url, "http://cp:8100");
    }
}
