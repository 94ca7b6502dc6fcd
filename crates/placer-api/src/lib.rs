//! placer-api — REST API for the placement service.
//!
//! Routes are declared in one explicit table ([`ROUTES`]); the router and
//! the index documentation page are both generated from it, so the docs
//! cannot drift from what is actually served.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | HTML documentation of the route table |
//! | POST | `/deployments` | Resolve placement, create a deployment, start install |
//! | GET | `/stats` | In-process request statistics |

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{MethodRouter, get, post};

use placer_engine::Engine;
use placer_observe::{EventLog, ServiceStats};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
    pub stats: Arc<ServiceStats>,
    pub log: EventLog,
}

/// One row of the route table.
pub struct RouteSpec {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
}

/// Every route the service exposes.
pub const ROUTES: &[RouteSpec] = &[
    RouteSpec {
        method: "GET",
        path: "/",
        summary: "API documentation (this page)",
    },
    RouteSpec {
        method: "POST",
        path: "/deployments",
        summary: "Resolve placement criteria, create a deployment, and start its install workflow",
    },
    RouteSpec {
        method: "GET",
        path: "/stats",
        summary: "In-process request statistics",
    },
];

/// Build the API router from the route table.
pub fn build_router(state: ApiState) -> Router {
    let mut router = Router::new();
    for spec in ROUTES {
        router = router.route(spec.path, method_router(spec));
    }
    router.with_state(state)
}

fn method_router(spec: &RouteSpec) -> MethodRouter<ApiState> {
    match (spec.method, spec.path) {
        ("GET", "/") => get(handlers::index),
        ("POST", "/deployments") => post(handlers::create_deployment),
        ("GET", "/stats") => get(handlers::stats),
        (method, path) => unreachable!("route table entry {method} {path} has no handler"),
    }
}
