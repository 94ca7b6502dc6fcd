//! Resolver error types.

use thiserror::Error;

/// Errors raised while evaluating a placement rule. Distinct from the
/// "unresolved" outcome, which is not an error.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("rule evaluation failed: {0}")]
    Rule(String),
}

pub type ResolverResult<T> = Result<T, ResolverError>;
