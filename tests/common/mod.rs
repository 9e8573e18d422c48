//! Test utilities for the module system
//!
//! Provides a tempdir-backed host fixture, a recording test module, and a
//! shared journal of lifecycle hook invocations.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use modhost::module::container::FactoryRegistry;
use modhost::module::identity::ModuleId;
use modhost::module::manager::ModuleManager;
use modhost::module::traits::{Module, MountContext};

/// Shared journal of lifecycle hook invocations, in call order.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn new_journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Configurable recording module used by lifecycle tests.
#[derive(Clone)]
pub struct TestModule {
    id: String,
    journal: Journal,
    mount_ok: bool,
    verify_ok: bool,
    initialize_panics: bool,
    requires: Vec<String>,
}

impl TestModule {
    pub fn new(id: &str, journal: Journal) -> Self {
        Self {
            id: id.to_string(),
            journal,
            mount_ok: true,
            verify_ok: true,
            initialize_panics: false,
            requires: Vec::new(),
        }
    }

    pub fn failing_mount(mut self) -> Self {
        self.mount_ok = false;
        self
    }

    pub fn failing_verify(mut self) -> Self {
        self.verify_ok = false;
        self
    }

    pub fn panicking_initialize(mut self) -> Self {
        self.initialize_panics = true;
        self
    }

    /// Add an informal mount-time requirement on another module id.
    pub fn requiring(mut self, id: &str) -> Self {
        self.requires.push(id.to_string());
        self
    }

    fn record(&self, hook: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", hook, self.id));
    }
}

impl Module for TestModule {
    fn mount(&mut self, ctx: &mut MountContext) -> bool {
        self.record("mount");
        if let Some(greeting) = ctx.config("greeting") {
            self.journal
                .lock()
                .unwrap()
                .push(format!("config:{}:{}", self.id, greeting));
        }
        for id in &self.requires {
            ctx.require(id.as_str());
        }
        self.mount_ok
    }

    fn initialize(&mut self) {
        self.record("initialize");
        if self.initialize_panics {
            panic!("initialize hook failed for {}", self.id);
        }
    }

    fn verify(&self) -> bool {
        self.record("verify");
        self.verify_ok
    }

    fn unmount(&mut self) -> bool {
        self.record("unmount");
        true
    }

    fn deinitialize(&mut self) {
        self.record("deinitialize");
    }

    fn requirement_satisfied(&mut self, id: &ModuleId) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("satisfied:{}:{}", self.id, id));
    }
}

/// Test fixture owning a temp plugin directory and a factory registry.
pub struct HostFixture {
    pub temp_dir: TempDir,
    pub modules_dir: PathBuf,
    pub factories: FactoryRegistry,
    pub journal: Journal,
}

impl HostFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let modules_dir = temp_dir.path().join("modules");
        std::fs::create_dir_all(&modules_dir).expect("failed to create modules dir");

        Self {
            temp_dir,
            modules_dir,
            factories: FactoryRegistry::new(),
            journal: new_journal(),
        }
    }

    /// Write a module.toml for `name` under the "test" namespace.
    pub fn write_manifest(&self, name: &str, dependencies: &[&str]) {
        self.write_manifest_in(name, name, dependencies);
    }

    /// Write a manifest into an explicitly named container directory.
    pub fn write_manifest_in(&self, dir_name: &str, name: &str, dependencies: &[&str]) {
        let dir = self.modules_dir.join(dir_name);
        std::fs::create_dir_all(&dir).expect("failed to create module dir");

        let deps = dependencies
            .iter()
            .map(|dep| format!("{:?}", dep))
            .collect::<Vec<_>>()
            .join(", ");
        let manifest = format!(
            "namespace = \"test\"\nname = \"{}\"\nversion = \"1.0.0\"\nauthors = [\"tests\"]\ndependencies = [{}]\n",
            name, deps
        );
        std::fs::write(dir.join("module.toml"), manifest).expect("failed to write manifest");
    }

    /// Write a per-module config.toml into a container directory.
    pub fn write_config(&self, dir_name: &str, contents: &str) {
        let dir = self.modules_dir.join(dir_name);
        std::fs::create_dir_all(&dir).expect("failed to create module dir");
        std::fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    /// Register a factory producing clones of the given blueprint module.
    pub fn register(&mut self, name: &str, template: TestModule) {
        let id = ModuleId::derive("test", name);
        self.factories
            .register(id, move || Box::new(template.clone()) as Box<dyn Module>);
    }

    /// Consume the registered factories into a manager.
    pub fn build_manager(&mut self) -> ModuleManager {
        ModuleManager::new(std::sync::Arc::new(std::mem::take(&mut self.factories)))
    }
}

/// Derive the id a test module manifest produces.
pub fn tid(name: &str) -> ModuleId {
    ModuleId::derive("test", name)
}
