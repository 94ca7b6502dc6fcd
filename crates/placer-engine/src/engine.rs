//! The deployment state machine.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use placer_client::OrchestratorApi;
use placer_core::{DeployOutcome, PlacementRequest};
use placer_observe::{EventLog, Level};
use placer_resolver::PlacementRule;

use crate::error::{DeployError, DeployResult};

/// Phases a deployment request moves through. Linear on the success path;
/// every phase has a failure exit in [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Resolved,
    TemplateFound,
    DeploymentCreated,
    Polling,
    Instantiated,
    InstallStarted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Received => "received",
            Phase::Resolved => "resolved",
            Phase::TemplateFound => "template_found",
            Phase::DeploymentCreated => "deployment_created",
            Phase::Polling => "polling",
            Phase::Instantiated => "instantiated",
            Phase::InstallStarted => "install_started",
        };
        f.write_str(s)
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of execution-list polls per deployment.
    pub poll_attempts: u32,
    /// Delay between consecutive polls.
    pub poll_interval: Duration,
    /// Workflow started once instantiation terminates.
    pub install_workflow: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 30,
            poll_interval: Duration::from_secs(1),
            install_workflow: "install".to_string(),
        }
    }
}

/// Drives a single deployment request from placement criteria to a started
/// install workflow.
pub struct Engine {
    client: Arc<dyn OrchestratorApi>,
    rule: Arc<dyn PlacementRule>,
    log: EventLog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        client: Arc<dyn OrchestratorApi>,
        rule: Arc<dyn PlacementRule>,
        log: EventLog,
    ) -> Self {
        Self::with_config(client, rule, log, EngineConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn OrchestratorApi>,
        rule: Arc<dyn PlacementRule>,
        log: EventLog,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            rule,
            log,
            config,
        }
    }

    /// Run the full sequence: resolve → fetch template → create deployment
    /// → poll instantiation → start install.
    pub async fn deploy(&self, request: &PlacementRequest) -> DeployResult<DeployOutcome> {
        let mut phase = Phase::Received;
        debug!(%phase, "deployment request accepted");
        self.log.append(
            Level::Debug,
            &format!("got body = {}", serde_json::Value::Object(request.clone())),
        );

        let resolution = self
            .rule
            .resolve(request)?
            .ok_or(DeployError::Unresolved)?;
        phase = Phase::Resolved;
        self.log.append(
            Level::Info,
            &format!("criteria resolved to unit {}", resolution.unit_id),
        );
        debug!(%phase, unit = %resolution.unit_id, "placement resolved");

        let template = self
            .client
            .get_template(&resolution.unit_id)
            .await?
            .ok_or_else(|| {
                self.log.append(
                    Level::Error,
                    &format!("template {} not found", resolution.unit_id),
                );
                DeployError::TemplateNotFound(resolution.unit_id.clone())
            })?;
        phase = Phase::TemplateFound;
        debug!(%phase, template = %template.id, "template fetched");

        let deployment_id = gen_deployment_id(&template.id);
        let deployment = self
            .client
            .create_deployment(&template.id, &deployment_id, resolution.inputs.as_ref())
            .await
            .map_err(DeployError::CreateFailed)?;
        phase = Phase::DeploymentCreated;
        self.log
            .append(Level::Debug, &format!("deployment created: {}", deployment.id));
        info!(%phase, deployment = %deployment.id, "deployment created");

        phase = Phase::Polling;
        debug!(%phase, deployment = %deployment.id, "watching instantiation workflow");
        self.wait_for_instantiation(&deployment.id).await?;
        phase = Phase::Instantiated;
        debug!(%phase, deployment = %deployment.id, "instantiation terminated");

        self.log.append(Level::Info, "starting install");
        let execution = self
            .client
            .start_execution(&deployment.id, &self.config.install_workflow)
            .await?;
        phase = Phase::InstallStarted;
        info!(%phase, execution = %execution.id, deployment = %deployment.id, "install started");

        Ok(DeployOutcome {
            execution_id: execution.id,
            deployment_id: deployment.id,
        })
    }

    /// Poll the deployment's executions until the instantiation workflow
    /// terminates, fails, or the attempt budget runs out.
    ///
    /// Exactly one execution is expected per deployment. Observing zero or
    /// more than one is indistinguishable from "still starting" here and
    /// counts against the budget; a duplicate execution therefore polls to
    /// timeout instead of surfacing as an inconsistency.
    async fn wait_for_instantiation(&self, deployment_id: &str) -> DeployResult<()> {
        for attempt in 1..=self.config.poll_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.poll_interval).await;
            }

            self.log
                .append(Level::Info, "waiting for instantiation workflow");
            let executions = self.client.list_executions(deployment_id).await?;
            self.log
                .append(Level::Debug, &format!("observed {} executions", executions.len()));

            if let [execution] = executions.as_slice() {
                self.log.append(
                    Level::Debug,
                    &format!("execution status = {}", execution.status),
                );
                if execution.status.is_terminated() {
                    debug!(deployment = deployment_id, attempt, "instantiation complete");
                    return Ok(());
                }
                if execution.status.is_failure() {
                    self.log.append(
                        Level::Error,
                        &format!(
                            "instantiation workflow ended as {} for deployment {deployment_id}",
                            execution.status
                        ),
                    );
                    error!(
                        deployment = deployment_id,
                        status = %execution.status,
                        "instantiation failed"
                    );
                    return Err(DeployError::ExecutionFailed {
                        deployment_id: deployment_id.to_string(),
                        status: execution.status,
                    });
                }
            }
        }

        self.log.append(
            Level::Error,
            &format!("instantiation timed out for deployment {deployment_id}"),
        );
        warn!(
            deployment = deployment_id,
            attempts = self.config.poll_attempts,
            "instantiation poll budget exhausted"
        );
        Err(DeployError::PollTimeout(deployment_id.to_string()))
    }
}

/// Generate a deployment id: the template id plus an 8-character uppercase
/// hex suffix. Collisions are not checked; the 32-bit suffix is treated as
/// collision-resistant within a process lifetime.
pub fn gen_deployment_id(base: &str) -> String {
    format!("{base}_{:08X}", rand::random::<u32>())
}
