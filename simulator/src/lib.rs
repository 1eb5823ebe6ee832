//! Scenario-simulation service for business-rule modules.
//!
//! This crate implements the workbench-facing side of scenario testing: it
//! resolves a rule module, builds (or reuses) its compiled artifacts, runs a
//! scenario inside the module's isolated runtime, and publishes a structured
//! result to a listener. The architecture enforces a strict separation:
//!
//! - **[`cache`]**: the one shared mutable resource — per-module build
//!   artifacts, built once per key and dropped only by invalidation.
//! - **[`runner`] / [`adapter`]**: scenario execution behind a pluggable
//!   construction strategy, bridged into a uniform result contract.
//! - **[`report`]**: the result message and the listener channel it is
//!   published on.
//! - **[`service`]**: the facade the workbench layer calls; collaborators
//!   are constructor-injected.
//! - **[`invalidate`]**: the generic delete-event hook that drops cached
//!   artifacts for a package.

pub mod adapter;
pub mod cache;
pub mod cli;
pub mod invalidate;
pub mod logging;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
