//! Module manifest parsing and validation
//!
//! Handles parsing `module.toml` descriptors and converting them into
//! identity descriptors. The manifest is the explicit, static replacement
//! for runtime type introspection: everything the orchestrator needs to
//! know about a module before instantiating it lives here.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::identity::{ModuleId, ModuleIdentity};
use crate::module::traits::ModuleError;

/// Module manifest (`module.toml` structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Namespace path the module id is derived from
    pub namespace: String,
    /// Module display name
    pub name: String,
    /// Module version (semantic versioning)
    pub version: String,
    /// Module authors
    #[serde(default)]
    pub authors: Vec<String>,
    /// Ids of modules that must be available before this one mounts
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Human-readable description
    pub description: Option<String>,
}

impl ModuleManifest {
    /// Load and validate a manifest from file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!("failed to read manifest file: {}", e))
        })?;

        let manifest: ModuleManifest = toml::from_str(&contents).map_err(|e| {
            ModuleError::InvalidManifest(format!("failed to parse manifest TOML: {}", e))
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate required fields without touching the filesystem.
    pub fn validate(&self) -> Result<(), ModuleError> {
        if self.namespace.trim().is_empty() {
            return Err(ModuleError::InvalidManifest(
                "module namespace cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ModuleError::InvalidManifest(
                "module name cannot be empty".to_string(),
            ));
        }
        Version::parse(&self.version).map_err(|e| {
            ModuleError::InvalidManifest(format!(
                "invalid version {:?} (expected semantic versioning): {}",
                self.version, e
            ))
        })?;
        for dep in &self.dependencies {
            if dep.trim().is_empty() {
                return Err(ModuleError::InvalidManifest(
                    "dependency id cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Derive the id this manifest declares.
    pub fn module_id(&self) -> ModuleId {
        ModuleId::derive(&self.namespace, &self.name)
    }

    /// Declared dependency ids, normalized.
    pub fn dependency_ids(&self) -> Vec<ModuleId> {
        self.dependencies
            .iter()
            .map(|dep| ModuleId::parse(dep))
            .collect()
    }

    /// Convert to an identity descriptor.
    pub fn to_identity(&self) -> Result<ModuleIdentity, ModuleError> {
        let version = Version::parse(&self.version).map_err(|e| {
            ModuleError::InvalidManifest(format!("invalid version {:?}: {}", self.version, e))
        })?;
        Ok(ModuleIdentity::new(
            self.namespace.clone(),
            self.name.clone(),
            self.authors.clone(),
            version,
        ))
    }
}
