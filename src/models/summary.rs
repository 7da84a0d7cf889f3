use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog and usage statistics served by the summary endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotfixSummary {
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub total_hotfixes: usize,
    /// Records that cannot be evaluated and are excluded from every search
    pub faulty_records: usize,
    pub distinct_versions: usize,
    pub distinct_modules: usize,
    pub hotfixes_per_version: BTreeMap<String, usize>,
    pub hotfixes_per_module: BTreeMap<String, usize>,
    pub total_searches: u64,
    pub distinct_hosts: usize,
}
