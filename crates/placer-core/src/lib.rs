pub mod config;
pub mod types;

pub use config::{CredentialMode, OrchestratorConfig, PlacementConfig, PollConfig, ServiceConfig};
pub use types::*;
