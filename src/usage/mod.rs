//! Usage audit log: who searched for what, and when

pub mod factory;
pub mod memory;
pub mod sled_store;

pub use factory::{create_in_memory_usage_store, create_usage_store};
pub use memory::InMemoryUsageLog;
pub use sled_store::SledUsageLog;

use crate::error::Result;
use crate::models::UsageLogEntry;
use async_trait::async_trait;

/// Host filter value meaning "every host"
pub const ALL_HOSTS: &str = "--";

/// Trait for usage log storage operations
#[async_trait]
pub trait UsageLogStore: Send + Sync {
    /// Append an entry
    async fn record(&self, entry: &UsageLogEntry) -> Result<()>;

    /// Entries newest first, optionally restricted to one hostname or address
    async fn list(&self, host: Option<&str>) -> Result<Vec<UsageLogEntry>>;

    /// Total number of entries
    async fn count(&self) -> Result<u64>;

    /// Number of distinct caller hostnames
    async fn distinct_hosts(&self) -> Result<usize>;

    /// Backend name used in logs and metrics
    fn backend(&self) -> &'static str;
}

/// Normalize the `host` request parameter; blank and `--` select every host
pub fn host_filter(host: Option<&str>) -> Option<&str> {
    host.map(str::trim)
        .filter(|h| !h.is_empty() && *h != ALL_HOSTS)
}
