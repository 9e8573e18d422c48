//! modhost — host-side plugin loader
//!
//! Discovers installable modules, resolves declared inter-module
//! dependencies, and drives each module through a fixed lifecycle
//! (load → mount → initialize → verify) while allowing isolated unload
//! later.
//!
//! ## Design principles
//!
//! 1. **Explicit registration**: modules declare identity and dependencies
//!    in static `module.toml` manifests; a factory registry maps ids to
//!    constructors, so no runtime type introspection is involved
//! 2. **Graceful degradation**: every container, dependency, mount, and
//!    verification failure is terminal for that module only, never for the
//!    batch
//! 3. **Sequential phases**: all modules mount before any initializes, all
//!    initialize before any verifies; a module never observes a sibling at
//!    a later lifecycle stage than its own

pub mod config;
pub mod demo;
pub mod module;
pub mod utils;

pub use config::HostConfig;
pub use module::{
    DependencyGraph, FactoryRegistry, LifecycleEvent, LifecycleState, Module, ModuleError,
    ModuleId, ModuleIdentity, ModuleManager, MountContext,
};
