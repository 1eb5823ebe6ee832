//! Rule-module engine: manifests, compilation, and the evaluation runtime.
//!
//! This crate implements the module side of the scenario workbench. The
//! layering is strict:
//!
//! - **[`manifest`]**: declaration parsing and validation. No evaluation.
//! - **[`resolve`]**: path → [`resolve::ModuleRef`] resolution, the only I/O
//!   in the crate.
//! - **[`registry`]**: the module-private fact-type catalog isolating one
//!   module's types from every other loaded module.
//! - **[`compile`]**: condition compilation against a registry, collecting
//!   diagnostics instead of stopping at the first error.
//! - **[`container`]**: the executable runtime and its sessions.
//!
//! Build orchestration (caching, invalidation, result reporting) lives in
//! the `simulator` crate; this crate stays deterministic given a manifest.

pub mod compile;
pub mod container;
pub mod manifest;
pub mod registry;
pub mod resolve;
