//! Module registry: discovery, manifests, and the dependency graph.

pub mod discovery;
pub mod graph;
pub mod manifest;

pub use discovery::{ContainerDiscovery, DiscoveredContainer};
pub use graph::{DependencyGraph, ModuleNode};
pub use manifest::ModuleManifest;
