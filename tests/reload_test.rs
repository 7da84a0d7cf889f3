//! Catalog reload: atomic generation swaps under concurrent readers and
//! failure handling for file-backed sources

mod common;

use async_trait::async_trait;
use common::sample_records;
use hotfix_viewer::catalog::{
    Catalog, CatalogError, CatalogResult, FileRecordSource, RecordSource,
};
use hotfix_viewer::models::HotfixRecord;
use hotfix_viewer::query::{HotfixFilter, QueryEngine};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const RECORDS_PER_LOAD: usize = 200;

/// Every load yields a full record set tagged with a fresh version label
struct RotatingSource {
    loads: AtomicU64,
}

#[async_trait]
impl RecordSource for RotatingSource {
    async fn load(&self) -> CatalogResult<Vec<HotfixRecord>> {
        let load = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        let version = format!("load-{}", load);
        tokio::task::yield_now().await;

        Ok((0..RECORDS_PER_LOAD)
            .map(|i| HotfixRecord::new(format!("ECP-{}", i), version.clone(), "core"))
            .collect())
    }

    fn describe(&self) -> String {
        "rotating".to_string()
    }
}

struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    async fn load(&self) -> CatalogResult<Vec<HotfixRecord>> {
        Err(CatalogError::Parse {
            origin: "failing".to_string(),
            message: "truncated sheet".to_string(),
        })
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_never_observe_mixed_generations() {
    let catalog = Arc::new(Catalog::new());
    let source = Arc::new(RotatingSource {
        loads: AtomicU64::new(0),
    });
    catalog.reload(source.as_ref()).await.unwrap();

    let writer = {
        let catalog = catalog.clone();
        let source = source.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                catalog.reload(source.as_ref()).await.unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let engine = QueryEngine::new(catalog.clone());
            tokio::spawn(async move {
                for _ in 0..50 {
                    let records = engine.query_all(&HotfixFilter::new()).unwrap();
                    assert_eq!(records.len(), RECORDS_PER_LOAD);

                    let versions: HashSet<&str> =
                        records.iter().map(|r| r.cramer_version.as_str()).collect();
                    assert_eq!(versions.len(), 1, "query mixed generations: {:?}", versions);

                    let count = engine.query_count(&HotfixFilter::new()).unwrap();
                    assert_eq!(count, RECORDS_PER_LOAD as u64);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for result in futures::future::join_all(readers).await {
        result.unwrap();
    }

    let current = catalog.current().unwrap();
    assert_eq!(current.number(), 21);
    assert_eq!(current.records()[0].cramer_version, "load-21");
}

#[tokio::test]
async fn test_concurrent_reloads_are_serialized() {
    let catalog = Arc::new(Catalog::new());
    let source = Arc::new(RotatingSource {
        loads: AtomicU64::new(0),
    });

    let reloads: Vec<_> = (0..10)
        .map(|_| {
            let catalog = catalog.clone();
            let source = source.clone();
            tokio::spawn(async move { catalog.reload(source.as_ref()).await.unwrap().generation })
        })
        .collect();

    let mut generations: Vec<u64> = futures::future::join_all(reloads)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    generations.sort_unstable();

    assert_eq!(generations, (1..=10).collect::<Vec<u64>>());
    assert_eq!(catalog.current().unwrap().number(), 10);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_generation() {
    let catalog = Catalog::new();
    catalog
        .reload(&hotfix_viewer::catalog::StaticRecordSource::new(sample_records()))
        .await
        .unwrap();

    let err = catalog.reload(&FailingSource).await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse { .. }));

    let current = catalog.current().unwrap();
    assert_eq!(current.number(), 1);
    assert_eq!(current.len(), 6);

    // The next successful load continues the numbering
    let stats = catalog
        .reload(&hotfix_viewer::catalog::StaticRecordSource::new(Vec::new()))
        .await
        .unwrap();
    assert_eq!(stats.generation, 2);
    assert_eq!(stats.records, 0);
}

#[tokio::test]
async fn test_file_source_reload_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hotfixes.json");
    let source = FileRecordSource::new(&path);
    let catalog = Arc::new(Catalog::new());

    // Missing file: nothing published
    assert!(matches!(
        catalog.reload(&source).await,
        Err(CatalogError::Io { .. })
    ));
    assert!(!catalog.is_loaded());

    std::fs::write(
        &path,
        r#"[
            {"ecpNo": "ECP-7", "cramerVersion": "v1", "module": "core", "description": "First"},
            {"ECP No": "ECP-8", "Cramer Version": "v2", "Module": "ui", "Sequence": "4"}
        ]"#,
    )
    .unwrap();
    let stats = catalog.reload(&source).await.unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.distinct_versions, 2);

    let engine = QueryEngine::new(catalog.clone());
    let hits = engine
        .query_all(&HotfixFilter::new().with_modules(vec!["ui"]))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].ecp_number, "ECP-8");
    assert_eq!(hits[0].sequence, "4");

    // Corrupt rewrite: the loaded generation keeps serving
    std::fs::write(&path, "[{\"ecpNo\": ").unwrap();
    assert!(matches!(
        catalog.reload(&source).await,
        Err(CatalogError::Parse { .. })
    ));
    assert_eq!(catalog.current().unwrap().number(), 1);
    assert_eq!(engine.query_count(&HotfixFilter::new()).unwrap(), 2);
}

#[tokio::test]
async fn test_yaml_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hotfixes.yaml");
    std::fs::write(
        &path,
        "- ecpNo: ECP-1\n  cramerVersion: v1\n  module: db\n  latestEcp: ECP-2\n- ecpNo: ECP-2\n  cramerVersion: v1\n  module: db\n",
    )
    .unwrap();

    let catalog = Catalog::new();
    let stats = catalog.reload(&FileRecordSource::new(&path)).await.unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(catalog.current().unwrap().superseded_by("ECP-2").count(), 1);
}
