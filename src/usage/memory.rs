use crate::error::Result;
use crate::models::UsageLogEntry;
use crate::usage::UsageLogStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory usage log (default backend and tests)
#[derive(Clone)]
pub struct InMemoryUsageLog {
    entries: Arc<DashMap<u64, UsageLogEntry>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryUsageLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for InMemoryUsageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsageLogStore for InMemoryUsageLog {
    async fn record(&self, entry: &UsageLogEntry) -> Result<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(seq, entry.clone());

        tracing::debug!(entry_id = %entry.id, path = %entry.request_path, "Usage entry recorded");
        Ok(())
    }

    async fn list(&self, host: Option<&str>) -> Result<Vec<UsageLogEntry>> {
        let mut entries: Vec<(u64, UsageLogEntry)> = self
            .entries
            .iter()
            .filter(|entry| host.map_or(true, |h| entry.value().matches_host(h)))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        // Newest first; sequence breaks timestamp ties
        entries.sort_by(|(a_seq, a), (b_seq, b)| b.date.cmp(&a.date).then(b_seq.cmp(a_seq)));

        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.len() as u64)
    }

    async fn distinct_hosts(&self) -> Result<usize> {
        let hosts: HashSet<String> = self
            .entries
            .iter()
            .map(|entry| entry.value().hostname.clone())
            .collect();
        Ok(hosts.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
