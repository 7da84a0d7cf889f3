use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::index::DistinctValueIndex;
use crate::catalog::source::RecordSource;
use crate::metrics::{CATALOG_RECORDS, CATALOG_RELOADS_TOTAL, CATALOG_RELOAD_DURATION_SECONDS};
use crate::models::HotfixRecord;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use validator::Validate;

/// One immutable snapshot of the record store and its distinct-value index
#[derive(Debug)]
pub struct Generation {
    number: u64,
    loaded_at: DateTime<Utc>,
    origin: String,
    /// Records in canonical order; ties keep load order
    records: Vec<HotfixRecord>,
    by_key: HashMap<String, usize>,
    index: DistinctValueIndex,
    duplicate_keys: usize,
    faulty_records: usize,
}

impl Generation {
    /// Sort, key and index a freshly loaded record set
    pub fn build(number: u64, origin: impl Into<String>, mut records: Vec<HotfixRecord>) -> Self {
        records.sort_by(HotfixRecord::canonical_cmp);

        let mut by_key = HashMap::with_capacity(records.len());
        let mut duplicate_keys = 0;
        for (position, record) in records.iter().enumerate() {
            if record.validate().is_err() {
                continue;
            }
            if by_key.contains_key(&record.ecp_number) {
                duplicate_keys += 1;
                tracing::warn!(
                    generation = number,
                    ecp_number = %record.ecp_number,
                    position,
                    "Duplicate hotfix number, lookups resolve to the first occurrence"
                );
            } else {
                by_key.insert(record.ecp_number.clone(), position);
            }
        }

        let faulty_records = records.iter().filter(|r| r.validate().is_err()).count();
        let index = DistinctValueIndex::rebuild(&records);

        Self {
            number,
            loaded_at: Utc::now(),
            origin: origin.into(),
            records,
            by_key,
            index,
            duplicate_keys,
            faulty_records,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in canonical order
    pub fn records(&self) -> &[HotfixRecord] {
        &self.records
    }

    pub fn index(&self) -> &DistinctValueIndex {
        &self.index
    }

    /// Exact-key lookup by hotfix number
    pub fn get(&self, ecp_number: &str) -> Option<&HotfixRecord> {
        self.by_key.get(ecp_number).map(|&i| &self.records[i])
    }

    /// Records whose successor is exactly `latest_ecp`, in canonical order
    pub fn superseded_by<'a>(&'a self, latest_ecp: &'a str) -> impl Iterator<Item = &'a HotfixRecord> + 'a {
        self.records.iter().filter(move |r| r.latest_ecp == latest_ecp)
    }

    /// Records that fail validation and are skipped by every query
    pub fn faulty_records(&self) -> usize {
        self.faulty_records
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.number,
            loaded_at: self.loaded_at,
            origin: self.origin.clone(),
            records: self.records.len(),
            distinct_versions: self.index.versions().len(),
            distinct_modules: self.index.modules().len(),
            duplicate_keys: self.duplicate_keys,
            faulty_records: self.faulty_records,
        }
    }
}

/// Summary of a published generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    pub origin: String,
    pub records: usize,
    pub distinct_versions: usize,
    pub distinct_modules: usize,
    pub duplicate_keys: usize,
    pub faulty_records: usize,
}

/// Holder of the currently published generation.
///
/// Readers clone the `Arc` under a short read lock and keep working on that
/// snapshot; a reload builds the next generation off to the side and swaps the
/// pointer, so no reader ever sees a partially loaded store.
pub struct Catalog {
    current: RwLock<Option<Arc<Generation>>>,
    /// Serializes reloads; guards the last generation number handed out
    reload_lock: Mutex<u64>,
}

impl Catalog {
    /// Create an empty catalog; queries fail until the first reload
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            reload_lock: Mutex::new(0),
        }
    }

    /// Snapshot of the current generation, if one has been published
    pub fn current(&self) -> Option<Arc<Generation>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the store contents with a fresh load from `source`.
    ///
    /// At most one reload runs at a time; concurrent callers wait their turn.
    /// On failure the previously published generation stays in place.
    pub async fn reload(&self, source: &dyn RecordSource) -> CatalogResult<GenerationStats> {
        let mut last_number = self.reload_lock.lock().await;
        let started = Instant::now();
        let origin = source.describe();

        tracing::info!(origin = %origin, "Reloading hotfix catalog");

        let records = match source.load().await {
            Ok(records) => records,
            Err(e) => {
                CATALOG_RELOADS_TOTAL.with_label_values(&["failure"]).inc();
                tracing::error!(origin = %origin, error = %e, "Catalog reload failed, keeping previous generation");
                return Err(e);
            }
        };

        let number = *last_number + 1;
        let generation = tokio::task::spawn_blocking(move || Generation::build(number, origin, records))
            .await
            .map_err(|e| {
                CATALOG_RELOADS_TOTAL.with_label_values(&["failure"]).inc();
                CatalogError::Build(e.to_string())
            })?;

        let stats = generation.stats();
        *self.current.write() = Some(Arc::new(generation));
        *last_number = number;

        let elapsed = started.elapsed();
        CATALOG_RELOADS_TOTAL.with_label_values(&["success"]).inc();
        CATALOG_RELOAD_DURATION_SECONDS.observe(elapsed.as_secs_f64());
        CATALOG_RECORDS.set(stats.records as f64);

        tracing::info!(
            generation = stats.generation,
            records = stats.records,
            distinct_versions = stats.distinct_versions,
            distinct_modules = stats.distinct_modules,
            duplicate_keys = stats.duplicate_keys,
            faulty_records = stats.faulty_records,
            elapsed_ms = elapsed.as_millis() as u64,
            "Hotfix catalog published"
        );

        Ok(stats)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
