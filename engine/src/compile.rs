//! Rule condition compilation.
//!
//! Conditions are conjunctions of field comparisons:
//! `claim.amount < 500 && claim.region == 'EU'`. Compilation parses each
//! clause and checks the referenced fact types and fields against the
//! module's registry. Errors do not stop at the first rule: every diagnostic
//! is collected so a failed build reports the full picture at once.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::manifest::RuleDecl;
use crate::registry::FactRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One parsed comparison: `fact.field OP literal`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub fact: String,
    pub field: String,
    pub comparison: Comparison,
    pub literal: Value,
}

/// A rule ready for evaluation: parsed clauses plus its outcome bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub name: String,
    pub clauses: Vec<Clause>,
    pub bindings: BTreeMap<String, Value>,
}

/// One compile diagnostic, tied to the rule that produced it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("rule {rule}: {message}")]
pub struct CompileError {
    pub rule: String,
    pub message: String,
}

/// Compile every rule, collecting all diagnostics. All-or-nothing: a module
/// with any bad rule gets no container.
pub fn compile_rules(
    registry: &FactRegistry,
    rules: &[RuleDecl],
) -> Result<Vec<CompiledRule>, Vec<CompileError>> {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut errors = Vec::new();

    for rule in rules {
        match compile_rule(registry, rule) {
            Ok(rule) => compiled.push(rule),
            Err(mut rule_errors) => errors.append(&mut rule_errors),
        }
    }

    if errors.is_empty() { Ok(compiled) } else { Err(errors) }
}

fn compile_rule(registry: &FactRegistry, rule: &RuleDecl) -> Result<CompiledRule, Vec<CompileError>> {
    let mut clauses = Vec::new();
    let mut errors = Vec::new();

    for source in rule.when.split("&&") {
        match parse_clause(source) {
            Ok(clause) => {
                if !registry.has_type(&clause.fact) {
                    errors.push(diagnostic(rule, format!("unknown fact type {}", clause.fact)));
                } else if !registry.has_field(&clause.fact, &clause.field) {
                    errors.push(diagnostic(
                        rule,
                        format!("unknown field {}.{}", clause.fact, clause.field),
                    ));
                } else {
                    clauses.push(clause);
                }
            }
            Err(message) => errors.push(diagnostic(rule, message)),
        }
    }

    if errors.is_empty() {
        Ok(CompiledRule {
            name: rule.name.clone(),
            clauses,
            bindings: rule.then.clone(),
        })
    } else {
        Err(errors)
    }
}

fn diagnostic(rule: &RuleDecl, message: String) -> CompileError {
    CompileError {
        rule: rule.name.clone(),
        message,
    }
}

fn parse_clause(source: &str) -> Result<Clause, String> {
    let source = source.trim();
    if source.is_empty() {
        return Err("empty clause".to_string());
    }
    let (lhs, comparison, rhs) = split_comparison(source)
        .ok_or_else(|| format!("no comparison operator in {source:?}"))?;

    let lhs = lhs.trim();
    let (fact, field) = lhs
        .split_once('.')
        .ok_or_else(|| format!("left side of {source:?} must be fact.field"))?;
    if fact.is_empty() || field.is_empty() || field.contains('.') {
        return Err(format!("left side of {source:?} must be fact.field"));
    }

    let literal = parse_literal(rhs.trim())?;
    Ok(Clause {
        fact: fact.to_string(),
        field: field.to_string(),
        comparison,
        literal,
    })
}

/// Find the comparison operator outside of string literals. Two-character
/// operators are tried first so `<=` never parses as `<`.
fn split_comparison(source: &str) -> Option<(&str, Comparison, &str)> {
    const OPERATORS: [(&str, Comparison); 6] = [
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    let mut in_string = false;
    for (index, ch) in source.char_indices() {
        if ch == '\'' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        for (token, comparison) in OPERATORS {
            if source[index..].starts_with(token) {
                return Some((&source[..index], comparison, &source[index + token.len()..]));
            }
        }
    }
    None
}

fn parse_literal(text: &str) -> Result<Value, String> {
    if text.is_empty() {
        return Err("missing literal".to_string());
    }
    if let Some(inner) = text.strip_prefix('\'') {
        let inner = inner
            .strip_suffix('\'')
            .ok_or_else(|| format!("unterminated string literal {text:?}"))?;
        if inner.contains('\'') {
            return Err(format!("bad string literal {text:?}"));
        }
        return Ok(Value::String(inner.to_string()));
    }
    if text == "true" {
        return Ok(Value::Bool(true));
    }
    if text == "false" {
        return Ok(Value::Bool(false));
    }
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::from(int));
    }
    if let Ok(float) = text.parse::<f64>() {
        return serde_json::Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(|| format!("bad numeric literal {text:?}"));
    }
    Err(format!("bad literal {text:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleManifest;

    fn registry() -> FactRegistry {
        let manifest = ModuleManifest::parse_str(
            r#"
[module]
name = "claims"
package = "acme.claims"

[[facts]]
name = "claim"
fields = ["amount", "region", "flagged"]
"#,
        )
        .expect("manifest parses");
        FactRegistry::from_manifest(&manifest)
    }

    fn rule(name: &str, when: &str) -> RuleDecl {
        RuleDecl {
            name: name.to_string(),
            when: when.to_string(),
            then: [("verdict".to_string(), Value::from("approve"))].into(),
        }
    }

    #[test]
    fn compiles_conjunction() {
        let rules = [rule(
            "approve_small",
            "claim.amount <= 500 && claim.region == 'EU' && claim.flagged != true",
        )];
        let compiled = compile_rules(&registry(), &rules).expect("compiles");
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].clauses.len(), 3);
        assert_eq!(compiled[0].clauses[0].comparison, Comparison::Le);
        assert_eq!(compiled[0].clauses[1].literal, Value::from("EU"));
        assert_eq!(compiled[0].clauses[2].literal, Value::Bool(true));
    }

    #[test]
    fn operator_inside_string_is_not_split() {
        let rules = [rule("odd", "claim.region == 'a<b'")];
        let compiled = compile_rules(&registry(), &rules).expect("compiles");
        assert_eq!(compiled[0].clauses[0].literal, Value::from("a<b"));
    }

    #[test]
    fn unknown_field_is_a_diagnostic() {
        let rules = [rule("bad", "claim.owner == 'x'")];
        let errors = compile_rules(&registry(), &rules).expect_err("diagnostic");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("claim.owner"));
    }

    #[test]
    fn collects_diagnostics_across_rules() {
        let rules = [
            rule("bad_syntax", "claim.amount ~ 5"),
            rule("fine", "claim.amount > 5"),
            rule("bad_type", "policy.kind == 'gold'"),
        ];
        let errors = compile_rules(&registry(), &rules).expect_err("diagnostics");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].rule, "bad_syntax");
        assert_eq!(errors[1].rule, "bad_type");
    }

    #[test]
    fn parses_numeric_literals() {
        assert_eq!(parse_literal("42").expect("int"), Value::from(42));
        assert_eq!(parse_literal("2.5").expect("float"), Value::from(2.5));
        assert!(parse_literal("'open").is_err());
        assert!(parse_literal("maybe").is_err());
    }
}
