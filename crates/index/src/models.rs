//! Index data models

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use slowrepo_errors::{Error, IndexError};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Repository index document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub api_version: String,
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
    pub generated: DateTime<Utc>,
}

/// Chart metadata carried by every version entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub api_version: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One published version of a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartVersion {
    #[serde(flatten)]
    pub metadata: ChartMetadata,
    #[serde(default)]
    pub urls: Vec<String>,
    pub created: DateTime<Utc>,
    pub digest: String,
}

impl Default for IndexFile {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFile {
    /// Create a new empty index
    #[must_use]
    pub fn new() -> Self {
        Self::generated_at(Utc::now())
    }

    /// Create a new empty index stamped with `generated`
    #[must_use]
    pub fn generated_at(generated: DateTime<Utc>) -> Self {
        Self {
            api_version: crate::INDEX_API_VERSION.to_string(),
            entries: BTreeMap::new(),
            generated,
        }
    }

    /// Parse index from YAML bytes
    ///
    /// # Errors
    ///
    /// Returns `DeserializationFailed` if the bytes are not UTF-8 or not a
    /// valid index document.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(bytes).map_err(|e| IndexError::DeserializationFailed {
            message: e.to_string(),
        })?;
        serde_yml::from_str(text).map_err(|e| {
            IndexError::DeserializationFailed {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize index to YAML
    ///
    /// # Errors
    ///
    /// Returns `SerializationFailed` if the document cannot be encoded.
    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yml::to_string(self).map_err(|e| {
            IndexError::SerializationFailed {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Get a specific chart version
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no entry matches both name and version.
    pub fn get(&self, name: &str, version: &str) -> Result<&ChartVersion, Error> {
        self.entries
            .get(name)
            .and_then(|versions| versions.iter().find(|v| v.metadata.version == version))
            .ok_or_else(|| {
                IndexError::NotFound {
                    name: name.to_string(),
                    version: version.to_string(),
                }
                .into()
            })
    }

    /// Whether the index lists this exact name and version
    #[must_use]
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.get(name, version).is_ok()
    }

    /// Iterate every version entry, grouped by chart name
    #[must_use]
    pub fn versions(&self) -> impl Iterator<Item = &ChartVersion> {
        self.entries.values().flatten()
    }

    /// Get total chart count
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.entries.len()
    }

    /// Get total version count
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Sort every chart's versions newest first
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_versions(&b.metadata.version, &a.metadata.version));
        }
    }
}

// Unparseable versions sort below every valid one.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(name: &str, version: &str) -> ChartVersion {
        ChartVersion {
            metadata: ChartMetadata {
                api_version: crate::CHART_API_VERSION.to_string(),
                name: name.to_string(),
                version: version.to_string(),
                app_version: None,
                description: None,
            },
            urls: vec![format!("charts/{name}-{version}.tgz")],
            created: Utc::now(),
            digest: "ab".to_string(),
        }
    }

    #[test]
    fn test_get_exact_version() {
        let mut index = IndexFile::new();
        index.entries.insert(
            "nginx".to_string(),
            vec![version("nginx", "1.2.0"), version("nginx", "1.10.0")],
        );

        assert!(index.get("nginx", "1.10.0").is_ok());
        assert!(index.contains("nginx", "1.2.0"));
        assert!(!index.contains("nginx", "1.3.0"));
        assert!(matches!(
            index.get("redis", "1.0.0"),
            Err(Error::Index(IndexError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_sort_entries_newest_first() {
        let mut index = IndexFile::new();
        index.entries.insert(
            "nginx".to_string(),
            vec![
                version("nginx", "1.2.0"),
                version("nginx", "not-semver"),
                version("nginx", "1.10.0"),
                version("nginx", "1.10.0-rc.1"),
            ],
        );

        index.sort_entries();

        let order: Vec<&str> = index.entries["nginx"]
            .iter()
            .map(|v| v.metadata.version.as_str())
            .collect();
        assert_eq!(order, vec!["1.10.0", "1.10.0-rc.1", "1.2.0", "not-semver"]);
        assert_eq!(index.chart_count(), 1);
        assert_eq!(index.version_count(), 4);
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        let result = IndexFile::from_yaml(b"entries: [unterminated");
        assert!(matches!(
            result,
            Err(Error::Index(IndexError::DeserializationFailed { .. }))
        ));

        let result = IndexFile::from_yaml(&[0xff, 0xfe]);
        assert!(matches!(
            result,
            Err(Error::Index(IndexError::DeserializationFailed { .. }))
        ));
    }

    #[test]
    fn test_yaml_uses_chart_repository_keys() {
        let mut index = IndexFile::new();
        index
            .entries
            .insert("nginx".to_string(), vec![version("nginx", "1.2.0")]);

        let yaml = index.to_yaml().unwrap();
        assert!(yaml.contains("apiVersion: v1"));
        assert!(yaml.contains("apiVersion: v2"));
        assert!(yaml.contains("generated:"));
        assert!(yaml.contains("urls:"));
        assert!(!yaml.contains("appVersion"));
    }
}
