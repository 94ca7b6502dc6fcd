//! Domain types shared across the placement service.

use serde::{Deserialize, Serialize};

/// Inbound placement criteria — an arbitrary JSON object supplied by the
/// HTTP caller. Interpreted only by the placement rule; opaque everywhere
/// else.
pub type PlacementRequest = serde_json::Map<String, serde_json::Value>;

/// The result of a completed deployment request: the install workflow
/// execution that was started and the deployment it runs against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployOutcome {
    pub execution_id: String,
    pub deployment_id: String,
}
