//! Module manager orchestrating the plugin lifecycle
//!
//! Owns the dependency graph, the loaded containers, and the registered
//! module instances, and drives discovery → graph construction → mount →
//! initialize → verify as a single sequential pipeline. All per-module
//! failures become a log line plus node state; `load_all` never propagates
//! a fatal error for one module to the batch.

use std::collections::HashMap;
use std::panic;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::module::container::{FactoryRegistry, ManifestContainer, ModuleContainer};
use crate::module::events::{EventListeners, LifecycleEvent, LifecycleListener};
use crate::module::identity::{ModuleId, ModuleIdentity};
use crate::module::registry::discovery::ContainerDiscovery;
use crate::module::registry::graph::DependencyGraph;
use crate::module::traits::{LifecycleState, ModuleError, Module, MountContext};

/// An instantiated module paired with its identity descriptor and readiness
/// flag. Created at mount time, owned exclusively by the manager.
pub struct RegisteredModule {
    identity: ModuleIdentity,
    id: ModuleId,
    instance: Box<dyn Module>,
    /// True once the initialize hook completed without faulting.
    initialized: bool,
    ready: bool,
}

impl RegisteredModule {
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    /// True only after the module passed verification.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Unmet informal requirement: the modules blocked on one target id.
/// Discarded the moment the target mounts, after notifying each dependant
/// exactly once.
struct PendingRequirement {
    dependants: Vec<ModuleId>,
}

/// Module manager: drives the full module lifecycle for a plugin directory.
pub struct ModuleManager {
    factories: Arc<FactoryRegistry>,
    graph: DependencyGraph,
    containers: Vec<Box<dyn ModuleContainer>>,
    /// Which container declared each module id (index into `containers`)
    owners: HashMap<ModuleId, usize>,
    registered: Vec<RegisteredModule>,
    pending: HashMap<ModuleId, PendingRequirement>,
    /// Informal requirements declared so far, keyed by the declaring module
    declared_requirements: HashMap<ModuleId, Vec<ModuleId>>,
    /// Host-supplied per-module config overrides, merged over container config
    config_overrides: HashMap<ModuleId, HashMap<String, String>>,
    listeners: EventListeners,
    disposed: bool,
}

impl ModuleManager {
    pub fn new(factories: Arc<FactoryRegistry>) -> Self {
        Self {
            factories,
            graph: DependencyGraph::new(),
            containers: Vec::new(),
            owners: HashMap::new(),
            registered: Vec::new(),
            pending: HashMap::new(),
            declared_requirements: HashMap::new(),
            config_overrides: HashMap::new(),
            listeners: EventListeners::new(),
            disposed: false,
        }
    }

    /// Subscribe to lifecycle events; listeners run synchronously in
    /// registration order.
    pub fn subscribe(&mut self, listener: LifecycleListener) {
        self.listeners.subscribe(listener);
    }

    /// Install host-level per-module config overrides, keyed by module id.
    pub fn set_config_overrides(&mut self, overrides: HashMap<String, HashMap<String, String>>) {
        self.config_overrides = overrides
            .into_iter()
            .map(|(id, config)| (ModuleId::parse(&id), config))
            .collect();
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Registered modules in registration (mount) order.
    pub fn modules(&self) -> impl Iterator<Item = &RegisteredModule> {
        self.registered.iter()
    }

    pub fn state(&self, id: &ModuleId) -> Option<LifecycleState> {
        self.graph.state(id)
    }

    /// Readiness flag for a registered module; `None` if it never mounted.
    pub fn is_ready(&self, id: &ModuleId) -> Option<bool> {
        self.registered
            .iter()
            .find(|module| module.id == *id)
            .map(|module| module.ready)
    }

    /// Load every module container under `dir` and drive the full lifecycle:
    /// discover → rebuild graph → mark loaded → readiness gate → mount →
    /// initialize → verify.
    ///
    /// Returns `false` only when the plugin directory itself cannot be
    /// scanned. All per-module failures are logged, marked `Error` on the
    /// graph, and excluded from the batch without aborting it.
    pub fn load_all<P: AsRef<Path>>(&mut self, dir: P) -> bool {
        let dir = dir.as_ref();
        info!("Loading modules from {:?}", dir);
        self.disposed = false;

        // Per-batch bookkeeping starts clean.
        self.pending.clear();
        self.declared_requirements.clear();

        let discovered = match ContainerDiscovery::new(dir).discover() {
            Ok(discovered) => discovered,
            Err(e) => {
                error!("Module discovery failed: {}", e);
                return false;
            }
        };

        // Load containers; a failure aborts only that container.
        for disc in &discovered {
            if self
                .containers
                .iter()
                .any(|container| container.path() == disc.directory)
            {
                debug!("Container {:?} already loaded, skipping", disc.directory);
                continue;
            }
            match ManifestContainer::load(disc, Arc::clone(&self.factories)) {
                Ok(container) => {
                    self.containers.push(Box::new(container));
                }
                Err(e) => warn!("Skipping container {:?}: {}", disc.directory, e),
            }
        }

        // Rebuild the graph from scratch from every loaded container.
        self.graph.clear();
        self.owners.clear();
        for (index, container) in self.containers.iter().enumerate() {
            for identity in container.identities() {
                let id = identity.id();
                let deps = container
                    .dependencies_of(&id)
                    .map(<[ModuleId]>::to_vec)
                    .unwrap_or_default();
                self.graph.add_or_update(id.clone(), &deps);
                self.owners.insert(id, index);
            }
        }

        // Every container-backed node enters the batch as Loaded.
        let backed: Vec<ModuleId> = self.owners.keys().cloned().collect();
        for id in &backed {
            self.graph.set_state(id, LifecycleState::Loaded);
        }
        // Modules registered by a previous batch already completed their
        // lifecycle; restore their outcome so they are not mounted twice. A
        // module whose initialize hook faulted stays terminal across batches.
        let carried: Vec<(ModuleId, bool)> = self
            .registered
            .iter()
            .map(|m| (m.id.clone(), m.initialized))
            .collect();
        for (id, initialized) in &carried {
            let state = if *initialized {
                LifecycleState::Initialized
            } else {
                LifecycleState::Error
            };
            self.graph.set_state(id, state);
        }

        // Global readiness gate: nodes never backed by a loaded container
        // are permanently excluded from this batch.
        if !self.graph.is_graph_ready() {
            warn!("Dependency graph is not ready; excluding unsatisfiable nodes");
            for id in self.graph.ids() {
                match self.graph.state(&id) {
                    Some(LifecycleState::Loaded) | Some(LifecycleState::Initialized) => {}
                    _ => self.graph.set_state(&id, LifecycleState::Error),
                }
            }
        }

        // Modules registered by earlier batches keep their lifecycle outcome;
        // only this batch's registrations initialize and verify.
        let batch_start = self.registered.len();
        self.mount_phase();
        self.initialize_phase(batch_start);
        self.verify_phase(batch_start);

        info!(
            "Load batch complete: {}/{} registered modules ready",
            self.registered.iter().filter(|m| m.ready).count(),
            self.registered.len()
        );
        true
    }

    /// Mount phase: walk the graph in enumeration order and mount every
    /// eligible node. Completes fully before any module initializes.
    fn mount_phase(&mut self) {
        for id in self.graph.ids() {
            let Some(state) = self.graph.state(&id) else {
                continue;
            };
            if state.excluded_from_mount() {
                debug!("Skipping module {} in state {:?}", id, state);
                continue;
            }
            if self.registered.iter().any(|module| module.id == id) {
                debug!("Module {} already registered, skipping", id);
                continue;
            }
            // Snapshot re-check: a sibling that errored during this phase
            // can disqualify a dependency satisfied at the readiness gate.
            if !self.graph.is_dependency_satisfied(&id) {
                let err = ModuleError::UnresolvableDependency {
                    module: id.clone(),
                    detail: "direct dependency missing or disqualified".to_string(),
                };
                error!("{}", err);
                self.graph.set_state(&id, LifecycleState::Error);
                continue;
            }
            self.mount_module(&id);
        }
    }

    fn mount_module(&mut self, id: &ModuleId) {
        let Some(&owner) = self.owners.get(id) else {
            warn!("No container owns module {}, skipping", id);
            self.graph.set_state(id, LifecycleState::Error);
            return;
        };

        let container = &self.containers[owner];
        let Some(identity) = container
            .identities()
            .iter()
            .find(|identity| identity.id() == *id)
            .cloned()
        else {
            warn!("Container {:?} does not declare module {}", container.path(), id);
            self.graph.set_state(id, LifecycleState::Error);
            return;
        };

        let mut instance = match container.instantiate(id) {
            Ok(instance) => instance,
            Err(e) => {
                error!("Failed to instantiate module {}: {}", id, e);
                self.graph.set_state(id, LifecycleState::Error);
                return;
            }
        };

        let mut config = container.module_config(id);
        if let Some(overrides) = self.config_overrides.get(id) {
            config.extend(overrides.clone());
        }

        let mut ctx = MountContext::new(id.clone(), config);
        if !instance.mount(&mut ctx) {
            error!("{}", ModuleError::MountFailure(id.clone()));
            self.graph.set_state(id, LifecycleState::Error);
            return;
        }
        let required = ctx.into_required();

        self.registered.push(RegisteredModule {
            identity,
            id: id.clone(),
            instance,
            initialized: false,
            ready: false,
        });
        self.graph.set_state(id, LifecycleState::Mounted);
        info!("Module {} mounted", id);
        self.listeners.emit(&LifecycleEvent::Mounted(id.clone()));

        self.process_requirements(id, required);
        self.resolve_pending(id);
    }

    /// Handle informal requirements declared during `requirer`'s mount call.
    fn process_requirements(&mut self, requirer: &ModuleId, required: Vec<ModuleId>) {
        for target in required {
            debug!(
                "Module {} requires {} (mount-time declaration)",
                requirer, target
            );
            self.declared_requirements
                .entry(requirer.clone())
                .or_default()
                .push(target.clone());

            if self.is_mounted(&target) {
                self.notify_requirement(requirer, &target);
            } else {
                let requirement = self
                    .pending
                    .entry(target)
                    .or_insert_with(|| PendingRequirement {
                        dependants: Vec::new(),
                    });
                if !requirement.dependants.contains(requirer) {
                    requirement.dependants.push(requirer.clone());
                }
            }
        }
    }

    fn is_mounted(&self, id: &ModuleId) -> bool {
        matches!(
            self.graph.state(id),
            Some(LifecycleState::Mounted) | Some(LifecycleState::Initialized)
        )
    }

    /// Notify every dependant waiting on `id` exactly once, then discard the
    /// requirement; dependants declared after this point are satisfied
    /// immediately instead.
    fn resolve_pending(&mut self, id: &ModuleId) {
        let Some(requirement) = self.pending.remove(id) else {
            return;
        };
        for dependant in requirement.dependants {
            self.notify_requirement(&dependant, id);
        }
    }

    /// One-shot delivery of a satisfied informal requirement.
    fn notify_requirement(&mut self, dependant: &ModuleId, target: &ModuleId) {
        // Observational cycle check only: nothing is prevented or unwound.
        let cyclic = self
            .declared_requirements
            .get(target)
            .map(|targets| targets.contains(dependant))
            .unwrap_or(false);
        if cyclic {
            warn!(
                "Cyclic dependency observed between modules {} and {}",
                dependant, target
            );
        }

        match self
            .registered
            .iter_mut()
            .find(|module| module.id == *dependant)
        {
            Some(module) => {
                debug!("Requirement {} satisfied for module {}", target, dependant);
                module.instance.requirement_satisfied(target);
            }
            None => debug!(
                "Dependant {} not registered, dropping notification for {}",
                dependant, target
            ),
        }
    }

    /// Initialize phase: never skipped once mount succeeded, no boolean
    /// failure contract. Runs exactly once per mount, so modules carried
    /// over from an earlier batch are outside the range regardless of their
    /// readiness. A panicking hook is contained here rather than unwinding
    /// out of `load_all`.
    fn initialize_phase(&mut self, batch_start: usize) {
        for index in batch_start..self.registered.len() {
            let id = self.registered[index].id.clone();
            let hook = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                self.registered[index].instance.initialize();
            }));
            if hook.is_err() {
                let err = ModuleError::InitializationFault {
                    module: id.clone(),
                    detail: "initialize hook panicked".to_string(),
                };
                error!("{}", err);
                self.graph.set_state(&id, LifecycleState::Error);
                continue;
            }
            self.registered[index].initialized = true;
            self.registered[index].ready = true;
            self.graph.set_state(&id, LifecycleState::Initialized);
            info!("Module {} initialized", id);
            self.listeners.emit(&LifecycleEvent::Initialized(id));
        }
    }

    /// Verify phase: a failed check flips the readiness flag only; the graph
    /// state stays `Initialized` and the module stays mounted. A module that
    /// failed verification in an earlier batch is never re-checked.
    fn verify_phase(&mut self, batch_start: usize) {
        for module in &mut self.registered[batch_start..] {
            if !module.initialized {
                // Initialization faulted; the module is terminal and its
                // check never runs.
                continue;
            }
            if !module.instance.verify() {
                module.ready = false;
                error!("{}", ModuleError::VerificationFailure(module.id.clone()));
            }
        }
    }

    /// Unmount and deinitialize every registered module in reverse
    /// registration order, then release all containers. Safe to call
    /// multiple times.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        info!("Disposing module manager");

        let registered: Vec<RegisteredModule> = self.registered.drain(..).collect();
        for mut module in registered.into_iter().rev() {
            if !module.instance.unmount() {
                warn!("Module {} reported unmount failure", module.id);
            }
            self.graph.set_state(&module.id, LifecycleState::Shutdown);
            self.listeners
                .emit(&LifecycleEvent::Unmounted(module.id.clone()));

            module.instance.deinitialize();
            self.graph.set_state(&module.id, LifecycleState::Unloaded);
            self.listeners
                .emit(&LifecycleEvent::Deinitialized(module.id.clone()));
        }

        for container in &mut self.containers {
            if let Err(e) = container.unload() {
                warn!("Failed to unload container {:?}: {}", container.path(), e);
            }
        }
        self.containers.clear();
        self.owners.clear();
        self.pending.clear();
        self.declared_requirements.clear();

        info!("Module manager disposed");
    }
}
