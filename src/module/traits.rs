//! Module system traits and interfaces
//!
//! Defines the lifecycle contract modules implement and the error taxonomy
//! the orchestrator reports through.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::module::identity::ModuleId;

/// Module lifecycle state.
///
/// Expected progression is `Unknown → Loaded → Mounted → Initialized`, with
/// terminal `Shutdown`/`Unloaded` at teardown. `Error` is absorbing: it is
/// reachable from any state and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Observed only as a dependency reference, no backing container yet
    Unknown,
    /// Backing container present
    Loaded,
    /// Mount hook succeeded
    Mounted,
    /// Initialize hook completed
    Initialized,
    /// Unmounted during teardown
    Shutdown,
    /// Container released
    Unloaded,
    /// Terminal failure; the module is excluded from the batch
    Error,
}

impl LifecycleState {
    /// Whether a dependency in this state allows its dependants to mount.
    pub fn satisfies_dependants(self) -> bool {
        matches!(
            self,
            LifecycleState::Loaded | LifecycleState::Mounted | LifecycleState::Initialized
        )
    }

    /// States the mount phase skips outright.
    pub fn excluded_from_mount(self) -> bool {
        matches!(
            self,
            LifecycleState::Unknown
                | LifecycleState::Unloaded
                | LifecycleState::Shutdown
                | LifecycleState::Error
        )
    }
}

/// Context handed to a module for the duration of its mount call.
///
/// Carries the module's flattened configuration and collects informal
/// mount-time requirement declarations.
pub struct MountContext {
    module_id: ModuleId,
    config: HashMap<String, String>,
    required: Vec<ModuleId>,
}

impl MountContext {
    pub(crate) fn new(module_id: ModuleId, config: HashMap<String, String>) -> Self {
        Self {
            module_id,
            config,
            required: Vec::new(),
        }
    }

    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    /// Get a configuration value.
    pub fn config(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Get a configuration value with default.
    pub fn config_or(&self, key: &str, default: &str) -> String {
        self.config
            .get(key)
            .map(String::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Declare an informal requirement on another module by id.
    ///
    /// Never blocks the current mount call. If the target is already mounted
    /// the declaring module's [`Module::requirement_satisfied`] hook fires
    /// right after this mount completes; otherwise it fires once, later,
    /// when/if the target reaches `Mounted`.
    pub fn require(&mut self, id: impl Into<ModuleId>) {
        self.required.push(id.into());
    }

    pub(crate) fn into_required(self) -> Vec<ModuleId> {
        self.required
    }
}

/// Lifecycle contract every module implementation provides.
///
/// Hooks are invoked synchronously by the orchestrator, strictly in phase
/// order: all modules mount before any module initializes, and all
/// initialize before any module verifies.
pub trait Module: Send {
    /// Mount hook. Returning `false` is terminal for this module within the
    /// batch: it is not registered, not initialized, and its node moves to
    /// `Error`.
    fn mount(&mut self, ctx: &mut MountContext) -> bool;

    /// Initialize hook. Runs for every module whose mount succeeded; it has
    /// no success/failure contract, so faults inside it are the module's own
    /// responsibility to report via logging.
    fn initialize(&mut self);

    /// Post-initialization self-check. A `false` result flips the
    /// host-visible ready flag but does not unmount the module.
    fn verify(&self) -> bool {
        true
    }

    /// Unmount hook, called at teardown in reverse registration order.
    fn unmount(&mut self) -> bool {
        true
    }

    /// Final teardown hook, after unmount.
    fn deinitialize(&mut self) {}

    /// One-shot notification that an informal requirement declared through
    /// [`MountContext::require`] has been satisfied.
    fn requirement_satisfied(&mut self, id: &ModuleId) {
        let _ = id;
    }
}

/// Module system errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("container load failed: {0}")]
    ContainerLoadFailure(String),

    #[error("invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("unresolvable dependency for module {module}: {detail}")]
    UnresolvableDependency { module: ModuleId, detail: String },

    #[error("duplicate module declaration: {0}")]
    DuplicateDeclaration(ModuleId),

    #[error("no factory registered for module {0}")]
    InstantiationFailure(ModuleId),

    #[error("mount failed for module {0}")]
    MountFailure(ModuleId),

    #[error("initialization fault in module {module}: {detail}")]
    InitializationFault { module: ModuleId, detail: String },

    #[error("verification failed for module {0}")]
    VerificationFailure(ModuleId),

    #[error("module not found: {0}")]
    ModuleNotFound(String),
}
