//! placer-engine — drives one deployment request end to end.
//!
//! The engine owns the request state machine:
//!
//! ```text
//! Received → Resolved → TemplateFound → DeploymentCreated
//!          → Polling → Instantiated → InstallStarted
//! ```
//!
//! Each phase returns a `Result` and failures propagate by early return;
//! the HTTP layer converts a [`DeployError`] to a response exactly once.

pub mod engine;
pub mod error;

pub use engine::{Engine, EngineConfig, Phase, gen_deployment_id};
pub use error::{DeployError, DeployResult};
