use crate::error::{AppError, Result};
use crate::models::UsageLogEntry;
use crate::usage::UsageLogStore;
use async_trait::async_trait;
use sled::Db;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Sled-backed usage log, persisted across restarts
pub struct SledUsageLog {
    #[allow(dead_code)]
    db: Arc<Db>,
    entries_tree: sled::Tree,
}

impl SledUsageLog {
    /// Create a new Sled usage log at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            AppError::UsageLog(format!("Failed to open Sled database: {}", e))
        })?;

        let entries_tree = db.open_tree("usage_log").map_err(|e| {
            AppError::UsageLog(format!("Failed to open usage_log tree: {}", e))
        })?;

        tracing::info!("Initialized Sled usage log at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            entries_tree,
        })
    }

    fn serialize_entry(entry: &UsageLogEntry) -> Result<Vec<u8>> {
        bincode::serialize(entry).map_err(|e| {
            AppError::UsageLog(format!("Failed to serialize usage entry: {}", e))
        })
    }

    fn deserialize_entry(bytes: &[u8]) -> Result<UsageLogEntry> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::UsageLog(format!("Failed to deserialize usage entry: {}", e))
        })
    }

    /// Big-endian timestamp followed by the entry id, so keys iterate in time order.
    ///
    /// The sign bit is flipped so pre-epoch timestamps still sort first.
    fn entry_key(entry: &UsageLogEntry) -> Vec<u8> {
        let micros = (entry.date.timestamp_micros() as u64) ^ (1 << 63);
        let mut key = Vec::with_capacity(24);
        key.extend_from_slice(&micros.to_be_bytes());
        key.extend_from_slice(entry.id.as_bytes());
        key
    }

    fn entries_newest_first(&self) -> impl Iterator<Item = Result<UsageLogEntry>> + '_ {
        self.entries_tree.iter().rev().map(|item| {
            let (_, value) = item.map_err(|e| {
                AppError::UsageLog(format!("Failed to read usage log: {}", e))
            })?;
            Self::deserialize_entry(&value)
        })
    }
}

#[async_trait]
impl UsageLogStore for SledUsageLog {
    async fn record(&self, entry: &UsageLogEntry) -> Result<()> {
        let key = Self::entry_key(entry);
        let value = Self::serialize_entry(entry)?;

        self.entries_tree.insert(key, value).map_err(|e| {
            AppError::UsageLog(format!("Failed to save usage entry: {}", e))
        })?;

        tracing::debug!(entry_id = %entry.id, path = %entry.request_path, "Usage entry recorded");
        Ok(())
    }

    async fn list(&self, host: Option<&str>) -> Result<Vec<UsageLogEntry>> {
        let mut entries = Vec::new();
        for entry in self.entries_newest_first() {
            let entry = entry?;
            if host.map_or(true, |h| entry.matches_host(h)) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries_tree.len() as u64)
    }

    async fn distinct_hosts(&self) -> Result<usize> {
        let mut hosts = HashSet::new();
        for entry in self.entries_newest_first() {
            hosts.insert(entry?.hostname);
        }
        Ok(hosts.len())
    }

    fn backend(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CallerIdentity;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_store() -> (SledUsageLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SledUsageLog::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn entry_at(minutes_ago: i64, hostname: &str) -> UsageLogEntry {
        let mut entry = UsageLogEntry::new(
            "/getAllResults",
            CallerIdentity {
                hostname: hostname.to_string(),
                ..CallerIdentity::default()
            },
            vec!["Hotfix No: ECP-1".to_string()],
        );
        entry.date = Utc::now() - Duration::minutes(minutes_ago);
        entry
    }

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let (store, _temp_dir) = create_test_store();

        let oldest = entry_at(30, "alpha");
        let newest = entry_at(1, "beta");
        let middle = entry_at(10, "alpha");

        store.record(&oldest).await.unwrap();
        store.record(&newest).await.unwrap();
        store.record(&middle).await.unwrap();

        let listed = store.list(None).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
        assert_eq!(listed[0].search_input, vec!["Hotfix No: ECP-1".to_string()]);
    }

    #[tokio::test]
    async fn test_host_filter_and_counts() {
        let (store, _temp_dir) = create_test_store();

        store.record(&entry_at(3, "alpha")).await.unwrap();
        store.record(&entry_at(2, "beta")).await.unwrap();
        store.record(&entry_at(1, "alpha")).await.unwrap();

        assert_eq!(store.list(Some("alpha")).await.unwrap().len(), 2);
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.distinct_hosts().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let entry = entry_at(5, "alpha");

        {
            let store = SledUsageLog::new(temp_dir.path()).unwrap();
            store.record(&entry).await.unwrap();
        }

        let store = SledUsageLog::new(temp_dir.path()).unwrap();
        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], entry);
    }
}
