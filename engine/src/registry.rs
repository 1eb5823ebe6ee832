//! The module-private fact-type catalog.
//!
//! Each built module gets its own registry, and a session only accepts facts
//! the registry declares. That keeps one module's types isolated from every
//! other loaded module: the same fact name can mean different shapes in two
//! modules without either observing the other.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::manifest::ModuleManifest;

/// Catalog of the fact types one module accepts.
#[derive(Debug)]
pub struct FactRegistry {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl FactRegistry {
    /// Build the registry from a validated manifest. Cannot fail: duplicate
    /// or malformed declarations are rejected at manifest validation.
    pub fn from_manifest(manifest: &ModuleManifest) -> Self {
        let types = manifest
            .facts
            .iter()
            .map(|fact| {
                let fields: BTreeSet<String> = fact.fields.iter().cloned().collect();
                (fact.name.clone(), fields)
            })
            .collect();
        Self { types }
    }

    pub fn has_type(&self, fact: &str) -> bool {
        self.types.contains_key(fact)
    }

    pub fn has_field(&self, fact: &str, field: &str) -> bool {
        self.types
            .get(fact)
            .is_some_and(|fields| fields.contains(field))
    }

    /// Check an inserted fact value against the declarations.
    ///
    /// Returns the reason the fact is rejected, or `None` when it conforms.
    pub fn reject_reason(&self, fact: &str, value: &Value) -> Option<String> {
        let Some(fields) = self.types.get(fact) else {
            return Some(format!("unknown fact type {fact}"));
        };
        let Value::Object(map) = value else {
            return Some(format!("fact {fact} must be a table of fields"));
        };
        for key in map.keys() {
            if !fields.contains(key) {
                return Some(format!("unknown field {fact}.{key}"));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> FactRegistry {
        let manifest = ModuleManifest::parse_str(
            r#"
[module]
name = "claims"
package = "acme.claims"

[[facts]]
name = "claim"
fields = ["amount", "region"]
"#,
        )
        .expect("manifest parses");
        FactRegistry::from_manifest(&manifest)
    }

    #[test]
    fn accepts_declared_fact() {
        let registry = registry();
        assert!(registry.has_type("claim"));
        assert!(registry.has_field("claim", "amount"));
        assert_eq!(
            registry.reject_reason("claim", &json!({"amount": 10, "region": "EU"})),
            None
        );
    }

    #[test]
    fn rejects_unknown_type_and_field() {
        let registry = registry();
        assert!(
            registry
                .reject_reason("policy", &json!({}))
                .expect("unknown type")
                .contains("unknown fact type")
        );
        assert!(
            registry
                .reject_reason("claim", &json!({"owner": "x"}))
                .expect("unknown field")
                .contains("claim.owner")
        );
    }

    #[test]
    fn rejects_non_table_fact() {
        let registry = registry();
        assert!(
            registry
                .reject_reason("claim", &json!(42))
                .expect("non-table")
                .contains("table of fields")
        );
    }
}
