//! Plugin module system
//!
//! Discovers module containers, models declared inter-module dependencies
//! as a graph, and drives each module through a fixed lifecycle
//! (load → mount → initialize → verify) with isolated unload at teardown.
//!
//! ## Architecture
//!
//! - **Explicit descriptors**: identity and dependencies come from static
//!   `module.toml` manifests, never runtime type introspection
//! - **Failure containment**: one module failing to load, mount, or verify
//!   never aborts the batch
//! - **Sequential phases**: all modules mount before any initializes, and
//!   all initialize before any verifies

pub mod container;
pub mod events;
pub mod identity;
pub mod manager;
pub mod registry;
pub mod traits;

pub use container::{FactoryRegistry, ManifestContainer, ModuleContainer};
pub use events::{EventListeners, LifecycleEvent, LifecycleListener};
pub use identity::{ModuleId, ModuleIdentity};
pub use manager::{ModuleManager, RegisteredModule};
pub use registry::{ContainerDiscovery, DependencyGraph, ModuleManifest};
pub use traits::{LifecycleState, Module, ModuleError, MountContext};
