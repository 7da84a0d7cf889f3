//! Record sources feeding the catalog on (re)load

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::models::HotfixRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

/// Supplier of the complete record set for a catalog load
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read every record; a failure aborts the reload as a whole
    async fn load(&self) -> CatalogResult<Vec<HotfixRecord>>;

    /// Human-readable origin used in logs and generation stats
    fn describe(&self) -> String;
}

/// Encoding of a record file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> CatalogResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CatalogError::UnsupportedFormat(format!("{} has no extension", path.display())))?;

        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(SourceFormat::Json),
            "yaml" | "yml" => Ok(SourceFormat::Yaml),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Decode a full record list
    pub fn decode(&self, bytes: &[u8], origin: &str) -> CatalogResult<Vec<HotfixRecord>> {
        let parsed = match self {
            SourceFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            SourceFormat::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| CatalogError::Parse {
            origin: origin.to_string(),
            message,
        })
    }
}

/// Exported hotfix sheet stored as a JSON array or YAML sequence
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
    format: Option<SourceFormat>,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Force a format instead of inferring it from the extension
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn load(&self) -> CatalogResult<Vec<HotfixRecord>> {
        let format = match self.format {
            Some(format) => format,
            None => SourceFormat::from_path(&self.path)?,
        };

        let bytes = tokio::fs::read(&self.path).await.map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;

        let records = format.decode(&bytes, &self.describe())?;
        tracing::debug!(path = ?self.path, %format, records = records.len(), "Read record source");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory record list
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    records: Vec<HotfixRecord>,
}

impl StaticRecordSource {
    pub fn new(records: Vec<HotfixRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn load(&self) -> CatalogResult<Vec<HotfixRecord>> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} records)", self.records.len())
    }
}
