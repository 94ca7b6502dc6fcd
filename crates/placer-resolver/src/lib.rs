//! placer-resolver — maps inbound placement criteria to a deployable unit.
//!
//! The rule is a pure function of the request: no remote calls, no state.
//! "No rule matched" (`Ok(None)`) is a valid outcome the caller must treat
//! as a bad request, distinct from a rule evaluation error.

pub mod error;
pub mod rule;

pub use error::{ResolverError, ResolverResult};
pub use rule::{FixedUnitRule, PlacementRule, Resolution};
