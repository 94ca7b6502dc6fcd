//! Placement rules.

use placer_core::PlacementRequest;
use tracing::info;

use crate::error::ResolverResult;

/// A resolved placement: the deployable unit to instantiate and the inputs
/// to instantiate it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub unit_id: String,
    pub inputs: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A placement rule. Must be side-effect-free: resolving the same request
/// twice yields the same outcome and changes nothing.
pub trait PlacementRule: Send + Sync {
    /// `Ok(Some(_))` — a unit was selected. `Ok(None)` — no rule matched
    /// (a valid outcome). `Err(_)` — the rule itself failed.
    fn resolve(&self, request: &PlacementRequest) -> ResolverResult<Option<Resolution>>;
}

/// Stub rule: every request resolves to one configured unit with no inputs.
/// Stands in until a real bidding rule exists.
pub struct FixedUnitRule {
    unit_id: String,
}

impl FixedUnitRule {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
        }
    }
}

impl Default for FixedUnitRule {
    fn default() -> Self {
        Self::new("b1")
    }
}

impl PlacementRule for FixedUnitRule {
    fn resolve(&self, request: &PlacementRequest) -> ResolverResult<Option<Resolution>> {
        info!(
            criteria = %serde_json::Value::Object(request.clone()),
            unit = %self.unit_id,
            "placement criteria received"
        );
        Ok(Some(Resolution {
            unit_id: self.unit_id.clone(),
            inputs: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, &str)]) -> PlacementRequest {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn fixed_rule_resolves_every_request() {
        let rule = FixedUnitRule::default();
        let resolution = rule
            .resolve(&request(&[("region", "eu-1"), ("tier", "gold")]))
            .unwrap()
            .expect("should resolve");
        assert_eq!(resolution.unit_id, "b1");
        assert_eq!(resolution.inputs, None);
    }

    #[test]
    fn fixed_rule_honors_configured_unit() {
        let rule = FixedUnitRule::new("edge-cache");
        let resolution = rule.resolve(&request(&[])).unwrap().unwrap();
        assert_eq!(resolution.unit_id, "edge-cache");
    }

    #[test]
    fn resolving_twice_is_stable() {
        let rule = FixedUnitRule::default();
        let req = request(&[("zone", "a")]);
        assert_eq!(rule.resolve(&req).unwrap(), rule.resolve(&req).unwrap());
    }

    #[test]
    fn unresolved_is_not_an_error() {
        struct NoMatchRule;
        impl PlacementRule for NoMatchRule {
            fn resolve(&self, _: &PlacementRequest) -> ResolverResult<Option<Resolution>> {
                Ok(None)
            }
        }

        let outcome = NoMatchRule.resolve(&request(&[])).unwrap();
        assert!(outcome.is_none());
    }
}
