//! Request-level operations shared by the REST handlers

use crate::catalog::{Catalog, CatalogResult, Generation, GenerationStats, RecordSource};
use crate::error::Result;
use crate::metrics::{USAGE_LOG_ENTRIES_TOTAL, USAGE_LOG_FAILURES_TOTAL};
use crate::models::{CallerIdentity, HotfixRecord, HotfixSummary, SequenceRank, UsageLogEntry};
use crate::query::{current_generation, HotfixFilter, QueryEngine, QueryError, QueryResult};
use crate::usage::{host_filter, UsageLogStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

/// One hotfix rolled into a later one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderlyingHotfix {
    /// Parsed sequence; `-1` when the sheet value is not numeric
    pub sequence: i64,
    pub ecp_no: String,
}

/// Hotfix search service.
///
/// Thin orchestration over the catalog, the query engine and the usage log.
/// Holds no per-request state.
pub struct HotfixService {
    catalog: Arc<Catalog>,
    engine: QueryEngine,
    source: Arc<dyn RecordSource>,
    usage: Option<Arc<dyn UsageLogStore>>,
}

impl HotfixService {
    pub fn new(
        catalog: Arc<Catalog>,
        source: Arc<dyn RecordSource>,
        usage: Option<Arc<dyn UsageLogStore>>,
    ) -> Self {
        Self {
            engine: QueryEngine::new(catalog.clone()),
            catalog,
            source,
            usage,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// All matching hotfixes in canonical order
    pub fn search_all(&self, filter: &HotfixFilter) -> QueryResult<Vec<HotfixRecord>> {
        self.engine.query_all(filter)
    }

    /// One page of matching hotfixes in canonical order
    pub fn search_page(
        &self,
        filter: &HotfixFilter,
        page_no: i64,
        page_size: i64,
    ) -> QueryResult<Vec<HotfixRecord>> {
        self.engine.query_page(filter, page_no, page_size)
    }

    /// Number of matching hotfixes
    pub fn count(&self, filter: &HotfixFilter) -> QueryResult<u64> {
        self.engine.query_count(filter)
    }

    /// Every known version, in natural order
    pub fn distinct_versions(&self) -> QueryResult<Vec<String>> {
        Ok(self.indexed_generation()?.index().sorted_versions())
    }

    /// Every known module, in natural order
    pub fn distinct_modules(&self) -> QueryResult<Vec<String>> {
        Ok(self.indexed_generation()?.index().sorted_modules())
    }

    /// Hotfixes superseded by `latest_ecp`, highest sequence first.
    ///
    /// Unranked sequences come last; ties keep canonical order.
    pub fn underlying_hotfixes(&self, latest_ecp: &str) -> QueryResult<Vec<UnderlyingHotfix>> {
        let generation = current_generation(&self.catalog)?;

        let mut hits: Vec<(SequenceRank, &HotfixRecord)> = generation
            .superseded_by(latest_ecp)
            .filter(|record| record.validate().is_ok())
            .map(|record| (record.sequence_rank(), record))
            .collect();

        // Stable sort: records arrive in canonical order
        hits.sort_by(|(a, _), (b, _)| b.cmp(a));

        Ok(hits
            .into_iter()
            .map(|(rank, record)| UnderlyingHotfix {
                sequence: rank.value(),
                ecp_no: record.ecp_number.clone(),
            })
            .collect())
    }

    /// Exact-key lookup by hotfix number
    pub fn get_hotfix(&self, ecp_no: &str) -> QueryResult<Option<HotfixRecord>> {
        let generation = current_generation(&self.catalog)?;
        Ok(generation.get(ecp_no).cloned())
    }

    /// Catalog and usage statistics for the current generation
    pub async fn summary(&self) -> Result<HotfixSummary> {
        let generation = self.indexed_generation()?;

        let mut hotfixes_per_version = BTreeMap::new();
        let mut hotfixes_per_module = BTreeMap::new();
        for record in generation.records() {
            *hotfixes_per_version
                .entry(record.cramer_version.clone())
                .or_insert(0) += 1;
            *hotfixes_per_module.entry(record.module.clone()).or_insert(0) += 1;
        }

        let (total_searches, distinct_hosts) = match &self.usage {
            Some(usage) => (usage.count().await?, usage.distinct_hosts().await?),
            None => (0, 0),
        };

        Ok(HotfixSummary {
            generation: generation.number(),
            loaded_at: generation.loaded_at(),
            total_hotfixes: generation.len(),
            faulty_records: generation.faulty_records(),
            distinct_versions: generation.index().versions().len(),
            distinct_modules: generation.index().modules().len(),
            hotfixes_per_version,
            hotfixes_per_module,
            total_searches,
            distinct_hosts,
        })
    }

    /// Usage entries newest first; `None`, blank or `--` selects every host
    pub async fn usage_entries(&self, host: Option<&str>) -> Result<Vec<UsageLogEntry>> {
        match &self.usage {
            Some(usage) => usage.list(host_filter(host)).await,
            None => Ok(Vec::new()),
        }
    }

    /// Record a search request in the usage log.
    ///
    /// Never fails: a usage-log error is logged and counted, and the search
    /// proceeds.
    pub async fn record_usage(
        &self,
        request_path: &str,
        caller: CallerIdentity,
        search_input: Vec<String>,
    ) {
        let Some(usage) = &self.usage else {
            return;
        };

        let entry = UsageLogEntry::new(request_path, caller, search_input);
        match usage.record(&entry).await {
            Ok(()) => {
                USAGE_LOG_ENTRIES_TOTAL
                    .with_label_values(&[usage.backend()])
                    .inc();
            }
            Err(e) => {
                USAGE_LOG_FAILURES_TOTAL
                    .with_label_values(&[usage.backend()])
                    .inc();
                tracing::warn!(
                    backend = usage.backend(),
                    path = %request_path,
                    error = %e,
                    "Failed to record usage entry"
                );
            }
        }
    }

    /// Reload the catalog from the configured record source
    pub async fn reload(&self) -> CatalogResult<GenerationStats> {
        self.catalog.reload(self.source.as_ref()).await
    }

    /// Stats of the published generation, if any
    pub fn generation_stats(&self) -> Option<GenerationStats> {
        self.catalog.current().map(|generation| generation.stats())
    }

    fn indexed_generation(&self) -> QueryResult<Arc<Generation>> {
        self.catalog.current().ok_or(QueryError::IndexNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticRecordSource;
    use crate::error::AppError;
    use crate::usage::InMemoryUsageLog;

    fn records() -> Vec<HotfixRecord> {
        vec![
            HotfixRecord::new("ECP-100", "v1", "core").with_latest_ecp("ECP-300").with_sequence("2"),
            HotfixRecord::new("ECP-101", "v1", "core").with_latest_ecp("ECP-300").with_sequence("n/a"),
            HotfixRecord::new("ECP-102", "v1", "ui").with_latest_ecp("ECP-300").with_sequence("7"),
            HotfixRecord::new("ECP-103", "v1", "ui").with_latest_ecp("ECP-300").with_sequence("2"),
            HotfixRecord::new("ECP-200", "v2", "ui"),
            HotfixRecord::new("ECP-300", "v2", "core"),
        ]
    }

    async fn loaded_service(usage: Option<Arc<dyn UsageLogStore>>) -> HotfixService {
        let service = HotfixService::new(
            Arc::new(Catalog::new()),
            Arc::new(StaticRecordSource::new(records())),
            usage,
        );
        service.reload().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_underlying_hotfixes_keep_shared_sequences() {
        let service = loaded_service(None).await;

        let underlying = service.underlying_hotfixes("ECP-300").unwrap();
        let pairs: Vec<(i64, &str)> = underlying
            .iter()
            .map(|u| (u.sequence, u.ecp_no.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![(7, "ECP-102"), (2, "ECP-100"), (2, "ECP-103"), (-1, "ECP-101")]
        );
        assert!(service.underlying_hotfixes("ECP-999").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookups_before_load() {
        let service = HotfixService::new(
            Arc::new(Catalog::new()),
            Arc::new(StaticRecordSource::default()),
            None,
        );

        assert!(matches!(service.distinct_versions(), Err(QueryError::IndexNotReady)));
        assert!(matches!(
            service.get_hotfix("ECP-1"),
            Err(QueryError::StoreUnavailable(_))
        ));
        assert!(matches!(service.summary().await, Err(AppError::IndexNotReady)));
        assert!(service.generation_stats().is_none());
    }

    #[tokio::test]
    async fn test_distinct_values_and_lookup() {
        let service = loaded_service(None).await;

        assert_eq!(service.distinct_versions().unwrap(), vec!["v1", "v2"]);
        assert_eq!(service.distinct_modules().unwrap(), vec!["core", "ui"]);
        assert_eq!(service.get_hotfix("ECP-200").unwrap().unwrap().module, "ui");
        assert!(service.get_hotfix("ECP-999").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_counts_catalog_and_usage() {
        let usage: Arc<dyn UsageLogStore> = Arc::new(InMemoryUsageLog::new());
        let service = loaded_service(Some(usage)).await;

        let alpha = CallerIdentity {
            hostname: "alpha".to_string(),
            ..CallerIdentity::default()
        };
        service.record_usage("/getAllResults", alpha.clone(), vec![]).await;
        service.record_usage("/getAllResults", alpha, vec![]).await;
        service
            .record_usage("/getAllResults", CallerIdentity::default(), vec![])
            .await;

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.total_hotfixes, 6);
        assert_eq!(summary.hotfixes_per_version.get("v1"), Some(&4));
        assert_eq!(summary.hotfixes_per_module.get("ui"), Some(&3));
        assert_eq!(summary.total_searches, 3);
        assert_eq!(summary.distinct_hosts, 2);

        assert_eq!(service.usage_entries(Some("alpha")).await.unwrap().len(), 2);
        assert_eq!(service.usage_entries(Some("--")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_usage_disabled_is_silent() {
        let service = loaded_service(None).await;

        service
            .record_usage("/getAllResults", CallerIdentity::default(), vec![])
            .await;
        assert!(service.usage_entries(None).await.unwrap().is_empty());
        assert_eq!(service.summary().await.unwrap().total_searches, 0);
    }
}
