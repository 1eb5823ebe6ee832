//! Scenario file parsing and validation.
//!
//! Scenarios are TOML files defining an ordered sequence of steps, each
//! giving facts to the rule session and asserting the expected outcome
//! bindings. The model is opaque to the cache and adapter; only the runner
//! interprets it. See `demos/claims/` for examples.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use engine::manifest::is_scalar;

/// A parsed scenario: name plus ordered steps.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioFile {
    pub scenario: ScenarioMeta,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioMeta {
    pub name: String,
}

/// One step: insert the given facts, fire the rules, assert the outcome.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Step {
    pub description: String,
    /// Fact type → field table inserted before firing.
    #[serde(default)]
    pub given: BTreeMap<String, Value>,
    /// Outcome binding → expected scalar, checked after firing.
    pub expect: BTreeMap<String, Value>,
}

impl ScenarioFile {
    /// Load and validate a scenario file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read scenario {}", path.display()))?;
        let scenario: ScenarioFile = toml::from_str(&contents)
            .with_context(|| format!("parse scenario {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("validate scenario {}", path.display()))?;
        Ok(scenario)
    }

    #[cfg(test)]
    pub fn parse_str(contents: &str) -> Result<Self> {
        let scenario: ScenarioFile = toml::from_str(contents).context("parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scenario.name.trim().is_empty() {
            bail!("scenario.name must be non-empty");
        }
        if self.steps.is_empty() {
            bail!("steps must be a non-empty array");
        }
        for (index, step) in self.steps.iter().enumerate() {
            step.validate()
                .with_context(|| format!("steps[{index}] invalid"))?;
        }
        Ok(())
    }
}

impl Step {
    fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            bail!("description must be non-empty");
        }
        if self.expect.is_empty() {
            bail!("expect must bind at least one outcome");
        }
        for (fact, value) in &self.given {
            if !value.is_object() {
                bail!("given.{fact} must be a table of fields");
            }
        }
        for (binding, value) in &self.expect {
            if !is_scalar(value) {
                bail!("expect.{binding} must be a scalar value");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_valid_scenario() {
        let input = r#"
[scenario]
name = "small claims approve"

[[steps]]
description = "EU claim under threshold"
[steps.given]
claim = { amount = 120, region = "EU" }
[steps.expect]
verdict = "approve"

[[steps]]
description = "same session, larger claim"
[steps.given]
claim = { amount = 900, region = "EU" }
[steps.expect]
verdict = "reject"
"#;
        let scenario = ScenarioFile::parse_str(input).expect("scenario parses");
        assert_eq!(scenario.scenario.name, "small claims approve");
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(
            scenario.steps[0].given.get("claim"),
            Some(&json!({"amount": 120, "region": "EU"}))
        );
    }

    #[test]
    fn rejects_missing_steps() {
        let input = "[scenario]\nname = \"empty\"\n";
        let err = ScenarioFile::parse_str(input).expect_err("no steps");
        assert!(err.to_string().contains("steps"));
    }

    #[test]
    fn rejects_step_without_expectation() {
        let input = r#"
[scenario]
name = "no expect"

[[steps]]
description = "gives but never asserts"
[steps.given]
claim = { amount = 1 }
[steps.expect]
"#;
        let err = ScenarioFile::parse_str(input).expect_err("no expectation");
        assert!(err.to_string().contains("steps[0]"));
    }

    #[test]
    fn rejects_non_table_given() {
        let input = r#"
[scenario]
name = "bad given"

[[steps]]
description = "fact is not a table"
[steps.given]
claim = 7
[steps.expect]
verdict = "approve"
"#;
        let err = ScenarioFile::parse_str(input).expect_err("bad given");
        assert!(err.to_string().contains("table of fields"));
    }
}
