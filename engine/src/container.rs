//! The executable rule runtime.
//!
//! A [`RuleContainer`] holds a module's compiled rules; sessions own the
//! mutable working memory. Facts inserted into a session persist until
//! replaced, so consecutive scenario steps share state; outcome bindings are
//! recomputed on every fire so each step observes the rule outcome for its
//! own inputs, not a stale one.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::compile::{Clause, Comparison, CompiledRule};

/// Executable runtime for one built module.
#[derive(Debug)]
pub struct RuleContainer {
    rules: Vec<CompiledRule>,
}

impl RuleContainer {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    /// Open a fresh evaluation session with empty working memory.
    pub fn session(&self) -> RuleSession<'_> {
        RuleSession {
            rules: &self.rules,
            facts: BTreeMap::new(),
        }
    }
}

/// Working memory bound to one scenario run.
#[derive(Debug)]
pub struct RuleSession<'a> {
    rules: &'a [CompiledRule],
    facts: BTreeMap<String, Value>,
}

impl RuleSession<'_> {
    /// Insert a fact, replacing any previous instance of the same type.
    pub fn insert(&mut self, fact: &str, value: Value) {
        self.facts.insert(fact.to_string(), value);
    }

    pub fn fact(&self, name: &str) -> Option<&Value> {
        self.facts.get(name)
    }

    /// Evaluate every rule in declaration order against current working
    /// memory and return the merged outcome bindings. Later rules override
    /// earlier bindings of the same name.
    pub fn fire(&self) -> BTreeMap<String, Value> {
        let mut bindings = BTreeMap::new();
        for rule in self.rules {
            if rule_matches(rule, &self.facts) {
                debug!(rule = %rule.name, "rule matched");
                for (binding, value) in &rule.bindings {
                    bindings.insert(binding.clone(), value.clone());
                }
            }
        }
        bindings
    }
}

fn rule_matches(rule: &CompiledRule, facts: &BTreeMap<String, Value>) -> bool {
    rule.clauses.iter().all(|clause| clause_holds(clause, facts))
}

fn clause_holds(clause: &Clause, facts: &BTreeMap<String, Value>) -> bool {
    let Some(Value::Object(fields)) = facts.get(&clause.fact) else {
        return false;
    };
    let Some(actual) = fields.get(&clause.field) else {
        return false;
    };
    compare(clause.comparison, actual, &clause.literal)
}

/// Scalar comparison. Numbers compare numerically (so `500` and `500.0`
/// agree); ordering on non-numbers is false rather than an error.
fn compare(comparison: Comparison, actual: &Value, expected: &Value) -> bool {
    match comparison {
        Comparison::Eq => scalar_eq(actual, expected),
        Comparison::Ne => !scalar_eq(actual, expected),
        Comparison::Lt => numeric(actual, expected).is_some_and(|(a, b)| a < b),
        Comparison::Le => numeric(actual, expected).is_some_and(|(a, b)| a <= b),
        Comparison::Gt => numeric(actual, expected).is_some_and(|(a, b)| a > b),
        Comparison::Ge => numeric(actual, expected).is_some_and(|(a, b)| a >= b),
    }
}

fn scalar_eq(actual: &Value, expected: &Value) -> bool {
    if let Some((a, b)) = numeric(actual, expected) {
        return a == b;
    }
    actual == expected
}

fn numeric(actual: &Value, expected: &Value) -> Option<(f64, f64)> {
    Some((actual.as_f64()?, expected.as_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_rules;
    use crate::manifest::ModuleManifest;
    use crate::registry::FactRegistry;
    use serde_json::json;

    fn container() -> RuleContainer {
        let manifest = ModuleManifest::parse_str(
            r#"
[module]
name = "claims"
package = "acme.claims"

[[facts]]
name = "claim"
fields = ["amount", "region"]

[[rules]]
name = "baseline"
when = "claim.amount >= 0"
then = { verdict = "review", tier = "basic" }

[[rules]]
name = "approve_small"
when = "claim.amount < 500 && claim.region == 'EU'"
then = { verdict = "approve" }
"#,
        )
        .expect("manifest parses");
        let registry = FactRegistry::from_manifest(&manifest);
        let rules = compile_rules(&registry, &manifest.rules).expect("rules compile");
        RuleContainer::new(rules)
    }

    #[test]
    fn later_rule_overrides_binding() {
        let container = container();
        let mut session = container.session();
        session.insert("claim", json!({"amount": 100, "region": "EU"}));

        let bindings = session.fire();
        assert_eq!(bindings.get("verdict"), Some(&json!("approve")));
        assert_eq!(bindings.get("tier"), Some(&json!("basic")));
    }

    #[test]
    fn non_matching_rule_leaves_binding() {
        let container = container();
        let mut session = container.session();
        session.insert("claim", json!({"amount": 900, "region": "EU"}));

        let bindings = session.fire();
        assert_eq!(bindings.get("verdict"), Some(&json!("review")));
    }

    #[test]
    fn facts_persist_and_replace_across_fires() {
        let container = container();
        let mut session = container.session();
        session.insert("claim", json!({"amount": 100, "region": "EU"}));
        assert_eq!(session.fire().get("verdict"), Some(&json!("approve")));

        session.insert("claim", json!({"amount": 100, "region": "US"}));
        assert_eq!(session.fire().get("verdict"), Some(&json!("review")));
        assert!(session.fact("claim").is_some());
    }

    #[test]
    fn missing_fact_matches_nothing() {
        let container = container();
        let session = container.session();
        assert!(session.fire().is_empty());
    }

    #[test]
    fn integer_and_float_compare_numerically() {
        assert!(compare(Comparison::Eq, &json!(500), &json!(500.0)));
        assert!(compare(Comparison::Lt, &json!(499.5), &json!(500)));
        assert!(!compare(Comparison::Lt, &json!("abc"), &json!(500)));
        assert!(compare(Comparison::Ne, &json!("abc"), &json!("abd")));
    }
}
