//! Module containers and instantiation
//!
//! A container is the isolated, unloadable unit module instances come from.
//! The implementation here reads a static manifest descriptor and
//! instantiates through a host-registered factory table, so no runtime type
//! introspection or dynamic symbol resolution is involved; a dynamic-library
//! backend would slot in behind the same trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::module::identity::{ModuleId, ModuleIdentity};
use crate::module::registry::discovery::DiscoveredContainer;
use crate::module::traits::{Module, ModuleError};

/// Factory function producing a fresh module instance.
pub type ModuleFactory = Box<dyn Fn() -> Box<dyn Module> + Send + Sync>;

/// Maps module ids to factory functions supplied by the host.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<ModuleId, ModuleFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a module id. Replacing an existing entry is
    /// logged as a warning.
    pub fn register<F>(&mut self, id: impl Into<ModuleId>, factory: F)
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.factories.insert(id.clone(), Box::new(factory)).is_some() {
            warn!("Replaced existing factory for module {}", id);
        }
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.factories.contains_key(id)
    }

    /// Produce a fresh instance of the module with the given id.
    pub fn instantiate(&self, id: &ModuleId) -> Result<Box<dyn Module>, ModuleError> {
        match self.factories.get(id) {
            Some(factory) => Ok(factory()),
            None => Err(ModuleError::InstantiationFailure(id.clone())),
        }
    }
}

/// Isolated, unloadable source of module instances.
pub trait ModuleContainer: Send {
    /// Filesystem location this container was loaded from.
    fn path(&self) -> &Path;

    /// Identity descriptors declared by this container.
    fn identities(&self) -> &[ModuleIdentity];

    /// Declared dependency ids for one of this container's modules, or
    /// `None` if the id is not declared here.
    fn dependencies_of(&self, id: &ModuleId) -> Option<&[ModuleId]>;

    /// Instantiate the module with the given id.
    fn instantiate(&self, id: &ModuleId) -> Result<Box<dyn Module>, ModuleError>;

    /// Flattened per-module configuration surfaced on the mount context.
    fn module_config(&self, id: &ModuleId) -> HashMap<String, String> {
        let _ = id;
        HashMap::new()
    }

    /// Best-effort release of the container's backing resources.
    fn unload(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Container backed by a manifest directory and the host's factory registry.
pub struct ManifestContainer {
    directory: PathBuf,
    identities: Vec<ModuleIdentity>,
    dependencies: HashMap<ModuleId, Vec<ModuleId>>,
    config: HashMap<String, String>,
    registry: Arc<FactoryRegistry>,
    unloaded: bool,
}

impl ManifestContainer {
    /// Load a container from a discovered manifest directory.
    ///
    /// Fails when the declared module has no registered factory; a manifest
    /// without an implementation cannot back a loadable container.
    pub fn load(
        discovered: &DiscoveredContainer,
        registry: Arc<FactoryRegistry>,
    ) -> Result<Self, ModuleError> {
        let identity = discovered.manifest.to_identity()?;
        let id = identity.id();

        if !registry.contains(&id) {
            return Err(ModuleError::ContainerLoadFailure(format!(
                "no factory registered for module {} declared in {:?}",
                id, discovered.directory
            )));
        }

        let config = load_module_config(&discovered.directory.join("config.toml"));
        let mut dependencies = HashMap::new();
        dependencies.insert(id, discovered.manifest.dependency_ids());

        Ok(Self {
            directory: discovered.directory.clone(),
            identities: vec![identity],
            dependencies,
            config,
            registry,
            unloaded: false,
        })
    }
}

impl ModuleContainer for ManifestContainer {
    fn path(&self) -> &Path {
        &self.directory
    }

    fn identities(&self) -> &[ModuleIdentity] {
        &self.identities
    }

    fn dependencies_of(&self, id: &ModuleId) -> Option<&[ModuleId]> {
        self.dependencies.get(id).map(Vec::as_slice)
    }

    fn instantiate(&self, id: &ModuleId) -> Result<Box<dyn Module>, ModuleError> {
        if self.unloaded {
            return Err(ModuleError::ContainerLoadFailure(format!(
                "container {:?} already unloaded",
                self.directory
            )));
        }
        if !self.dependencies.contains_key(id) {
            return Err(ModuleError::ModuleNotFound(id.to_string()));
        }
        self.registry.instantiate(id)
    }

    fn module_config(&self, id: &ModuleId) -> HashMap<String, String> {
        if self.dependencies.contains_key(id) {
            self.config.clone()
        } else {
            HashMap::new()
        }
    }

    fn unload(&mut self) -> Result<(), ModuleError> {
        if !self.unloaded {
            debug!("Unloading container {:?}", self.directory);
            self.unloaded = true;
        }
        Ok(())
    }
}

/// Load a per-module `config.toml` into flat string key/value pairs. A
/// missing or unparseable file yields an empty config.
pub fn load_module_config(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return HashMap::new();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read config file {:?}: {}", path, e);
            return HashMap::new();
        }
    };

    match toml::from_str::<toml::Table>(&contents) {
        Ok(table) => {
            let mut flat = HashMap::new();
            for (key, value) in table {
                flatten_toml_value(key, &value, &mut flat);
            }
            flat
        }
        Err(e) => {
            warn!("Failed to parse config file {:?}: {}", path, e);
            HashMap::new()
        }
    }
}

/// Flatten a TOML value into dot-notation string keys.
fn flatten_toml_value(prefix: String, value: &toml::Value, out: &mut HashMap<String, String>) {
    use toml::Value;

    match value {
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Integer(i) => {
            out.insert(prefix, i.to_string());
        }
        Value::Float(f) => {
            out.insert(prefix, f.to_string());
        }
        Value::Boolean(b) => {
            out.insert(prefix, b.to_string());
        }
        Value::Datetime(dt) => {
            out.insert(prefix, dt.to_string());
        }
        Value::Array(arr) => {
            let values: Vec<String> = arr
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            out.insert(prefix, values.join(","));
        }
        Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(format!("{}.{}", prefix, key), val, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_handles_nested_tables_and_arrays() {
        let table: toml::Table = toml::from_str(
            r#"
            greeting = "hello"
            retries = 3
            verbose = true

            [limits]
            max = 10
            tags = ["a", "b"]
            "#,
        )
        .unwrap();

        let mut flat = HashMap::new();
        for (key, value) in table {
            flatten_toml_value(key, &value, &mut flat);
        }

        assert_eq!(flat.get("greeting").map(String::as_str), Some("hello"));
        assert_eq!(flat.get("retries").map(String::as_str), Some("3"));
        assert_eq!(flat.get("verbose").map(String::as_str), Some("true"));
        assert_eq!(flat.get("limits.max").map(String::as_str), Some("10"));
        assert_eq!(flat.get("limits.tags").map(String::as_str), Some("a,b"));
    }

    #[test]
    fn missing_config_file_yields_empty_map() {
        let config = load_module_config(Path::new("/nonexistent/config.toml"));
        assert!(config.is_empty());
    }
}
