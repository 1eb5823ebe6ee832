//! Test-only helpers: module fixtures, recording listeners, scripted
//! runners.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use engine::container::RuleContainer;
use engine::registry::FactRegistry;

use crate::report::{Failure, ResultListener, TestResultMessage};
use crate::runner::{RunnerFactory, ScenarioRunner};
use crate::scenario::{ScenarioFile, ScenarioMeta, Step};

/// Claims module used by most fixtures: one fact type, two rules.
pub const CLAIMS_MODULE: &str = r#"
[module]
name = "claims"
package = "acme.claims"

[[facts]]
name = "claim"
fields = ["amount", "region"]

[[rules]]
name = "approve_small"
when = "claim.amount < 500"
then = { verdict = "approve" }

[[rules]]
name = "reject_large"
when = "claim.amount >= 500"
then = { verdict = "reject" }
"#;

/// Same module with a condition that does not compile.
pub const BROKEN_MODULE: &str = r#"
[module]
name = "claims"
package = "acme.claims"

[[facts]]
name = "claim"
fields = ["amount", "region"]

[[rules]]
name = "approve_small"
when = "claim.amount ~ 500"
then = { verdict = "approve" }
"#;

/// On-disk module fixture owning its temporary directory.
pub struct TestModule {
    dir: tempfile::TempDir,
}

impl TestModule {
    pub fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("module.toml"), manifest).expect("write manifest");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Rewrite the manifest in place (rebuild-after-invalidation tests).
    pub fn rewrite(&self, manifest: &str) {
        fs::write(self.dir.path().join("module.toml"), manifest).expect("write manifest");
    }

    /// Path of a scenario resource inside the module tree; the file itself
    /// need not exist (delete events arrive after removal).
    pub fn scenario_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.scenario.toml"))
    }
}

/// Build a step from literal given/expect pairs.
pub fn step(
    description: &str,
    given: &[(&str, Value)],
    expect: &[(&str, Value)],
) -> Step {
    Step {
        description: description.to_string(),
        given: to_map(given),
        expect: to_map(expect),
    }
}

/// Build a scenario from ordered steps.
pub fn scenario(name: &str, steps: Vec<Step>) -> ScenarioFile {
    ScenarioFile {
        scenario: ScenarioMeta {
            name: name.to_string(),
        },
        steps,
    }
}

fn to_map(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

/// Listener recording every published message for assertions.
#[derive(Debug, Default)]
pub struct RecordingListener {
    messages: Mutex<Vec<TestResultMessage>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<TestResultMessage> {
        self.messages.lock().expect("listener lock").clone()
    }
}

impl ResultListener for RecordingListener {
    fn on_result(&self, message: TestResultMessage) {
        self.messages.lock().expect("listener lock").push(message);
    }
}

/// Factory producing runners that return scripted failures without touching
/// the container.
pub struct ScriptedRunnerFactory {
    failures: Vec<Failure>,
}

impl ScriptedRunnerFactory {
    pub fn new(failures: Vec<Failure>) -> Self {
        Self { failures }
    }
}

impl RunnerFactory for ScriptedRunnerFactory {
    fn create(
        &self,
        _container: Arc<RuleContainer>,
        _scenario: &ScenarioFile,
    ) -> Box<dyn ScenarioRunner> {
        Box::new(ScriptedRunner {
            failures: self.failures.clone(),
            registry_bound: false,
        })
    }
}

struct ScriptedRunner {
    failures: Vec<Failure>,
    registry_bound: bool,
}

impl ScenarioRunner for ScriptedRunner {
    fn set_registry(&mut self, _registry: Arc<FactRegistry>) {
        self.registry_bound = true;
    }

    fn run(&mut self) -> Vec<Failure> {
        assert!(self.registry_bound, "registry must be bound before run");
        self.failures.clone()
    }
}
