//! Module identity
//!
//! A module id is the canonical `namespace.name` key every subsystem agrees
//! on. Derivation is case-insensitive and whitespace-insensitive, so two
//! descriptors naming the same module in different casing collapse to one
//! graph node instead of silently forking the dependency tree.

use std::fmt;

use semver::Version;

/// Canonical module identifier, `namespace.name` in normalized form.
///
/// Construction always normalizes, so two `ModuleId` values compare equal
/// exactly when they name the same module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Derive the canonical id from a namespace and a name.
    ///
    /// Each component is lowercased and internal whitespace runs become a
    /// single underscore, so `("The Path", "My Plugin")` derives
    /// `the_path.my_plugin`.
    pub fn derive(namespace: &str, name: &str) -> Self {
        Self(format!("{}.{}", normalize(namespace), normalize(name)))
    }

    /// Parse an id from raw text, applying the same normalization as
    /// [`ModuleId::derive`]. Dots are preserved as component separators.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('.')
                .map(normalize)
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace component, everything before the first dot.
    pub fn namespace(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(ns, _)| ns)
    }

    /// Name component, everything after the first dot.
    pub fn name(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, name)| name)
    }
}

fn normalize(component: &str) -> String {
    component
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for ModuleId {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// Full identity descriptor for one module, as declared by its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIdentity {
    pub namespace: String,
    pub name: String,
    pub authors: Vec<String>,
    pub version: Version,
}

impl ModuleIdentity {
    pub fn new(namespace: String, name: String, authors: Vec<String>, version: Version) -> Self {
        Self {
            namespace,
            name,
            authors,
            version,
        }
    }

    /// Canonical id derived from the declared namespace and name.
    pub fn id(&self) -> ModuleId {
        ModuleId::derive(&self.namespace, &self.name)
    }
}
