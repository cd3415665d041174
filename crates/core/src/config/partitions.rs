//! Versioned cache partition names.
//!
//! Partitions are configured as `{logical, version}` pairs and resolved into
//! concrete names of the form `<logical>-<version>`. The resolved set is the
//! known-name set: anything else found in the store at activation is stale.

use serde::{Deserialize, Serialize};

use super::validation::ConfigError;

/// Logical role of a cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// App shell documents and assets, seeded at install.
    Static,
    /// API responses, populated lazily.
    Dynamic,
    /// Images, populated lazily.
    #[serde(rename = "images")]
    Image,
    /// Hand-authored fallback documents, seeded at install.
    Offline,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 4] =
        [PartitionKind::Static, PartitionKind::Dynamic, PartitionKind::Image, PartitionKind::Offline];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
            PartitionKind::Image => "images",
            PartitionKind::Offline => "offline",
        }
    }
}

/// One configured partition: its logical role and current version tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    pub logical: PartitionKind,
    pub version: String,
}

impl PartitionSpec {
    /// Concrete partition name, e.g. `static-v1.0.0`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.logical.as_str(), self.version)
    }
}

/// The four resolved partition names for the running version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    static_shell: String,
    dynamic: String,
    image: String,
    offline: String,
}

impl PartitionSet {
    /// Resolve configured pairs into names, requiring each kind exactly once.
    pub fn resolve(specs: &[PartitionSpec]) -> Result<Self, ConfigError> {
        let mut resolved: [Option<String>; 4] = Default::default();

        for spec in specs {
            if spec.version.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "partitions".into(),
                    reason: format!("version for '{}' must not be empty", spec.logical.as_str()),
                });
            }

            let slot = &mut resolved[Self::index(spec.logical)];
            if slot.is_some() {
                return Err(ConfigError::Invalid {
                    field: "partitions".into(),
                    reason: format!("'{}' is configured more than once", spec.logical.as_str()),
                });
            }
            *slot = Some(spec.name());
        }

        let [static_shell, dynamic, image, offline] = resolved;
        let missing = |kind: PartitionKind| ConfigError::Missing {
            field: format!("partitions.{}", kind.as_str()),
            hint: "every partition kind needs a version tag".into(),
        };

        Ok(Self {
            static_shell: static_shell.ok_or_else(|| missing(PartitionKind::Static))?,
            dynamic: dynamic.ok_or_else(|| missing(PartitionKind::Dynamic))?,
            image: image.ok_or_else(|| missing(PartitionKind::Image))?,
            offline: offline.ok_or_else(|| missing(PartitionKind::Offline))?,
        })
    }

    fn index(kind: PartitionKind) -> usize {
        match kind {
            PartitionKind::Static => 0,
            PartitionKind::Dynamic => 1,
            PartitionKind::Image => 2,
            PartitionKind::Offline => 3,
        }
    }

    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_shell,
            PartitionKind::Dynamic => &self.dynamic,
            PartitionKind::Image => &self.image,
            PartitionKind::Offline => &self.offline,
        }
    }

    /// All current names, in `PartitionKind::ALL` order.
    pub fn names(&self) -> Vec<String> {
        PartitionKind::ALL.iter().map(|kind| self.name(*kind).to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        PartitionKind::ALL.iter().any(|kind| self.name(*kind) == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: PartitionKind, version: &str) -> PartitionSpec {
        PartitionSpec { logical: kind, version: version.into() }
    }

    fn full(version: &str) -> Vec<PartitionSpec> {
        PartitionKind::ALL.iter().map(|kind| spec(*kind, version)).collect()
    }

    #[test]
    fn test_resolve_names() {
        let set = PartitionSet::resolve(&full("v3")).unwrap();
        assert_eq!(set.names(), vec!["static-v3", "dynamic-v3", "images-v3", "offline-v3"]);
        assert!(set.contains("images-v3"));
        assert!(!set.contains("images-v2"));
    }

    #[test]
    fn test_resolve_missing_kind() {
        let mut specs = full("v1");
        specs.retain(|s| s.logical != PartitionKind::Offline);
        let result = PartitionSet::resolve(&specs);
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "partitions.offline"));
    }

    #[test]
    fn test_resolve_duplicate_kind() {
        let mut specs = full("v1");
        specs.push(spec(PartitionKind::Dynamic, "v2"));
        let result = PartitionSet::resolve(&specs);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "partitions"));
    }

    #[test]
    fn test_resolve_empty_version() {
        let mut specs = full("v1");
        specs[0].version = "  ".into();
        assert!(PartitionSet::resolve(&specs).is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&PartitionKind::Image).unwrap();
        assert_eq!(json, "\"images\"");
        let kind: PartitionKind = serde_json::from_str("\"static\"").unwrap();
        assert_eq!(kind, PartitionKind::Static);
    }
}
