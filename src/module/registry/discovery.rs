//! Module discovery
//!
//! Scans a plugin directory for module containers: one subdirectory per
//! container, each carrying a `module.toml` manifest.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::ModuleError;

/// A directory that carries a parseable module manifest.
#[derive(Debug, Clone)]
pub struct DiscoveredContainer {
    /// Container directory path
    pub directory: PathBuf,
    /// Parsed module manifest
    pub manifest: ModuleManifest,
}

/// Plugin directory scanner.
pub struct ContainerDiscovery {
    modules_dir: PathBuf,
}

impl ContainerDiscovery {
    pub fn new<P: AsRef<Path>>(modules_dir: P) -> Self {
        Self {
            modules_dir: modules_dir.as_ref().to_path_buf(),
        }
    }

    /// Discover all containers in the plugin directory.
    ///
    /// A subdirectory whose manifest fails to parse is logged and skipped;
    /// only an unreadable plugin directory itself is an error.
    pub fn discover(&self) -> Result<Vec<DiscoveredContainer>, ModuleError> {
        info!("Discovering modules in {:?}", self.modules_dir);

        if !self.modules_dir.exists() {
            debug!(
                "Modules directory does not exist, creating: {:?}",
                self.modules_dir
            );
            fs::create_dir_all(&self.modules_dir).map_err(|e| {
                ModuleError::ContainerLoadFailure(format!(
                    "failed to create modules directory: {}",
                    e
                ))
            })?;
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.modules_dir).map_err(|e| {
            ModuleError::ContainerLoadFailure(format!("failed to read modules directory: {}", e))
        })?;

        let mut containers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ModuleError::ContainerLoadFailure(format!("failed to read directory entry: {}", e))
            })?;

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let manifest_path = path.join("module.toml");
            if !manifest_path.exists() {
                debug!("No module.toml found in {:?}, skipping", path);
                continue;
            }

            match ModuleManifest::from_file(&manifest_path) {
                Ok(manifest) => {
                    debug!("Discovered module {} in {:?}", manifest.module_id(), path);
                    containers.push(DiscoveredContainer {
                        directory: path,
                        manifest,
                    });
                }
                Err(e) => {
                    warn!("Failed to load manifest in {:?}: {}", path, e);
                    continue;
                }
            }
        }

        info!("Discovered {} module containers", containers.len());
        Ok(containers)
    }
}
