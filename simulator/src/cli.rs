//! CLI command implementations.
//!
//! The composition root lives here: the CLI builds the service graph once
//! per invocation and passes references explicitly.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use engine::resolve::FsModuleResolver;

use crate::cache::BuildCache;
use crate::report::PrintListener;
use crate::scenario::ScenarioFile;
use crate::service::ScenarioService;

fn compose() -> ScenarioService {
    ScenarioService::new(
        Arc::new(FsModuleResolver),
        Arc::new(BuildCache::new()),
        Arc::new(PrintListener),
    )
}

/// Run one scenario file against the module at `module_dir`.
pub fn run_scenario(module_dir: &Path, scenario_path: &Path) -> Result<()> {
    let scenario = ScenarioFile::load(scenario_path).context("load scenario")?;
    debug!(
        scenario = %scenario.scenario.name,
        steps = scenario.steps.len(),
        "scenario loaded"
    );

    let service = compose();
    let identifier = scenario.scenario.name.clone();
    service
        .run_test(&identifier, module_dir, &scenario)
        .with_context(|| format!("run scenario {identifier}"))?;
    Ok(())
}

/// Publish the module-wide result for the module at `module_dir`.
pub fn run_all(module_dir: &Path) -> Result<()> {
    let service = compose();
    let identifier = module_dir.display().to_string();
    service.run_all_tests(&identifier, module_dir);
    Ok(())
}

/// Load and validate a scenario file, reporting problems.
pub fn validate_scenario(scenario_path: &Path) -> Result<()> {
    let scenario = ScenarioFile::load(scenario_path)?;
    println!(
        "ok: scenario={} steps={}",
        scenario.scenario.name,
        scenario.steps.len()
    );
    Ok(())
}
