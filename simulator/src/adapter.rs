//! Bridges a scenario runner into the uniform result contract.
//!
//! Whatever the runner does internally, the report carries a run count, the
//! measured elapsed time, and the collected failures — so the reporting
//! format never depends on the execution mechanism. The module-wide path
//! does not come through here; it synthesizes its fixed result directly.

use std::time::Instant;

use tracing::debug;

use crate::report::Failure;
use crate::runner::ScenarioRunner;

/// Uniform outcome of one runner execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Test units executed: one per scenario run.
    pub run_count: u32,
    /// Measured elapsed wall time.
    pub run_time_ms: u64,
    pub failures: Vec<Failure>,
}

/// Run the scenario runner to completion and collect the uniform report.
/// The runner records assertion failures itself; nothing here short-circuits.
pub fn execute(runner: &mut dyn ScenarioRunner) -> ExecutionReport {
    let started = Instant::now();
    let failures = runner.run();
    let run_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(run_time_ms, failures = failures.len(), "scenario execution finished");
    ExecutionReport {
        run_count: 1,
        run_time_ms,
        failures,
    }
}
