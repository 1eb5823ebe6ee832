//! Scenario execution: the runner contract, its default rule-backed
//! implementation, and the construction strategy.
//!
//! A runner executes every step of one scenario in declared order against a
//! single shared session — steps may depend on facts inserted by earlier
//! steps, so there is no reordering and no parallelism within a scenario.
//! Mismatches are recorded and execution continues; a runner never aborts on
//! a failed assertion.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use engine::container::{RuleContainer, RuleSession};
use engine::registry::FactRegistry;

use crate::report::Failure;
use crate::scenario::{ScenarioFile, Step};

/// Executable test unit for one scenario.
///
/// The registry must be set before `run`: it is module-specific and keeps
/// the scenario's facts isolated to the module under test.
pub trait ScenarioRunner {
    fn set_registry(&mut self, registry: Arc<FactRegistry>);
    /// Execute every step in declared order, collecting failures.
    fn run(&mut self) -> Vec<Failure>;
}

/// Strategy for constructing runners. The default binds scenarios to live
/// rule evaluation; tests swap in scripted implementations without touching
/// the cache or the adapter.
pub trait RunnerFactory: Send + Sync {
    fn create(&self, container: Arc<RuleContainer>, scenario: &ScenarioFile)
    -> Box<dyn ScenarioRunner>;
}

/// Default strategy: rule-backed execution inside the module's container.
#[derive(Debug, Default)]
pub struct RuleRunnerFactory;

impl RunnerFactory for RuleRunnerFactory {
    fn create(
        &self,
        container: Arc<RuleContainer>,
        scenario: &ScenarioFile,
    ) -> Box<dyn ScenarioRunner> {
        Box::new(RuleScenarioRunner::new(container, scenario.clone()))
    }
}

/// Runner evaluating scenario steps against a module's compiled rules.
pub struct RuleScenarioRunner {
    container: Arc<RuleContainer>,
    scenario: ScenarioFile,
    registry: Option<Arc<FactRegistry>>,
}

impl RuleScenarioRunner {
    pub fn new(container: Arc<RuleContainer>, scenario: ScenarioFile) -> Self {
        Self {
            container,
            scenario,
            registry: None,
        }
    }
}

impl ScenarioRunner for RuleScenarioRunner {
    fn set_registry(&mut self, registry: Arc<FactRegistry>) {
        self.registry = Some(registry);
    }

    fn run(&mut self) -> Vec<Failure> {
        let Some(registry) = self.registry.clone() else {
            return vec![Failure {
                description: "no fact registry bound before run".to_string(),
                detail: json!({"scenario": &self.scenario.scenario.name}).to_string(),
            }];
        };

        let mut failures = Vec::new();
        let mut session = self.container.session();
        for (index, step) in self.scenario.steps.iter().enumerate() {
            run_step(index, step, &registry, &mut session, &mut failures);
        }
        debug!(
            scenario = %self.scenario.scenario.name,
            steps = self.scenario.steps.len(),
            failures = failures.len(),
            "scenario steps executed"
        );
        failures
    }
}

fn run_step(
    index: usize,
    step: &Step,
    registry: &FactRegistry,
    session: &mut RuleSession<'_>,
    failures: &mut Vec<Failure>,
) {
    for (fact, value) in &step.given {
        if let Some(reason) = registry.reject_reason(fact, value) {
            failures.push(rejected_fact_failure(index, step, fact, &reason));
            continue;
        }
        session.insert(fact, value.clone());
    }

    let actual = session.fire();
    for (binding, expected) in &step.expect {
        let got = actual.get(binding);
        if got != Some(expected) {
            failures.push(mismatch_failure(index, step, binding, expected, got));
        }
    }
}

fn rejected_fact_failure(index: usize, step: &Step, fact: &str, reason: &str) -> Failure {
    Failure {
        description: format!("step {} '{}': {reason}", index + 1, step.description),
        detail: json!({
            "step": index + 1,
            "fact": fact,
            "reason": reason,
            "given": &step.given,
        })
        .to_string(),
    }
}

fn mismatch_failure(
    index: usize,
    step: &Step,
    binding: &str,
    expected: &Value,
    actual: Option<&Value>,
) -> Failure {
    let got = actual.map_or_else(|| "(unset)".to_string(), ToString::to_string);
    Failure {
        description: format!(
            "step {} '{}': expected {binding}={expected}, got {got}",
            index + 1,
            step.description
        ),
        detail: json!({
            "step": index + 1,
            "binding": binding,
            "expected": expected,
            "actual": actual,
            "given": &step.given,
        })
        .to_string(),
    }
}
