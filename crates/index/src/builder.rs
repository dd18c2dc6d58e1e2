//! Index assembly from catalog entries

use crate::models::{ChartMetadata, ChartVersion, IndexFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slowrepo_errors::{Error, IndexError};
use std::collections::HashSet;

/// A chart archive published by the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub version: String,
    pub archive_path: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogEntry {
    /// Create an entry without optional metadata
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        archive_path: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            archive_path: archive_path.into(),
            digest: digest.into(),
            app_version: None,
            description: None,
        }
    }

    /// Set the application version reported alongside the chart version
    #[must_use]
    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = Some(app_version.into());
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(IndexError::InvalidEntry {
                name: self.name.clone(),
                message: "empty chart name".to_string(),
            }
            .into());
        }

        semver::Version::parse(&self.version).map_err(|e| IndexError::InvalidVersion {
            name: self.name.clone(),
            version: self.version.clone(),
            message: e.to_string(),
        })?;

        if self.archive_path.is_empty() {
            return Err(IndexError::InvalidEntry {
                name: self.name.clone(),
                message: format!("missing archive path for {}-{}", self.name, self.version),
            }
            .into());
        }

        if self.digest.is_empty() {
            return Err(IndexError::InvalidEntry {
                name: self.name.clone(),
                message: format!("missing digest for {}-{}", self.name, self.version),
            }
            .into());
        }
        hex::decode(&self.digest).map_err(|e| IndexError::InvalidEntry {
            name: self.name.clone(),
            message: format!("digest is not hex: {e}"),
        })?;

        Ok(())
    }
}

/// Single-use builder for an [`IndexFile`]
///
/// Entries are validated as they are added and a repeated (name, version)
/// pair is refused rather than overwritten. [`IndexBuilder::build`]
/// consumes the builder, so a finished index cannot be mutated through it.
#[derive(Debug)]
pub struct IndexBuilder {
    base_url: Option<String>,
    created: DateTime<Utc>,
    seen: HashSet<(String, String)>,
    index: IndexFile,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    /// Create an empty builder stamped with the current time
    #[must_use]
    pub fn new() -> Self {
        let created = Utc::now();
        Self {
            base_url: None,
            created,
            seen: HashSet::new(),
            index: IndexFile::generated_at(created),
        }
    }

    /// Prefix every archive path with `base_url` when rendering URLs
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = (!base_url.is_empty()).then_some(base_url);
        self
    }

    /// Add one catalog entry
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` if the name and version were already added,
    /// or `InvalidEntry`/`InvalidVersion` if the entry fails validation.
    pub fn add(&mut self, entry: CatalogEntry) -> Result<&mut Self, Error> {
        entry.validate()?;

        let key = (entry.name.clone(), entry.version.clone());
        if self.seen.contains(&key) {
            return Err(IndexError::DuplicateEntry {
                name: entry.name,
                version: entry.version,
            }
            .into());
        }

        let url = self.url_for(&entry.archive_path);
        let version = ChartVersion {
            metadata: ChartMetadata {
                api_version: crate::CHART_API_VERSION.to_string(),
                name: entry.name.clone(),
                version: entry.version,
                app_version: entry.app_version,
                description: entry.description,
            },
            urls: vec![url],
            created: self.created,
            digest: entry.digest,
        };

        self.index
            .entries
            .entry(entry.name)
            .or_default()
            .push(version);
        self.seen.insert(key);
        Ok(self)
    }

    /// Add every entry, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`IndexBuilder::add`].
    pub fn extend<I>(&mut self, entries: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        for entry in entries {
            self.add(entry)?;
        }
        Ok(self)
    }

    /// Finish the index with versions sorted newest first
    #[must_use]
    pub fn build(mut self) -> IndexFile {
        self.index.sort_entries();
        self.index
    }

    fn url_for(&self, archive_path: &str) -> String {
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                archive_path.trim_start_matches('/')
            ),
            None => archive_path.to_string(),
        }
    }
}
