//! placer-client — adapter for the orchestration control plane.
//!
//! The control plane owns deployable-unit templates, deployment instances,
//! and workflow executions; this crate exposes the four operations the
//! engine consumes through the [`OrchestratorApi`] trait and implements
//! them over HTTP in [`HttpOrchestrator`].
//!
//! No retry policy lives here — a failed call surfaces immediately and the
//! engine's polling loop decides what bounded waiting looks like.

pub mod api;
pub mod error;
pub mod http;
pub mod types;

pub use api::OrchestratorApi;
pub use error::{ClientError, ClientResult};
pub use http::HttpOrchestrator;
pub use types::*;
