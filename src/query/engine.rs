//! Query execution against a catalog generation

use crate::catalog::{Catalog, Generation};
use crate::metrics::{QUERIES_TOTAL, QUERY_DURATION_SECONDS, RECORD_FAULTS_TOTAL};
use crate::models::HotfixRecord;
use crate::query::error::{QueryError, QueryResult};
use crate::query::filter::{compose, HotfixFilter, Predicate};
use std::sync::Arc;
use std::time::Instant;
use strum::Display;
use validator::Validate;

/// Validated offset/limit window over a sorted result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: usize,
    size: usize,
}

impl PageRequest {
    /// Reject negative page indexes and non-positive page sizes
    pub fn new(page_index: i64, page_size: i64) -> QueryResult<Self> {
        if page_index < 0 {
            return Err(QueryError::InvalidInput(format!(
                "page index must be non-negative, got {}",
                page_index
            )));
        }
        if page_size <= 0 {
            return Err(QueryError::InvalidInput(format!(
                "page size must be positive, got {}",
                page_size
            )));
        }

        Ok(Self {
            index: usize::try_from(page_index).unwrap_or(usize::MAX),
            size: usize::try_from(page_size).unwrap_or(usize::MAX),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Position of the first record on this page
    pub fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }
}

/// Query operation label used in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum QueryOperation {
    All,
    Page,
    Count,
}

/// Stateless executor over the currently published catalog generation.
///
/// Each call pins one generation, composes the filter against that
/// generation's index and evaluates it against the same generation's records,
/// so a concurrent reload can never mix old and new data into one result.
#[derive(Clone)]
pub struct QueryEngine {
    catalog: Arc<Catalog>,
}

impl QueryEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Every matching record in canonical order
    pub fn query_all(&self, filter: &HotfixFilter) -> QueryResult<Vec<HotfixRecord>> {
        self.instrumented(QueryOperation::All, filter, |generation, predicate| {
            query_all_in(generation, predicate)
        })
    }

    /// One page of the matching records in canonical order
    pub fn query_page(
        &self,
        filter: &HotfixFilter,
        page_index: i64,
        page_size: i64,
    ) -> QueryResult<Vec<HotfixRecord>> {
        let page = match PageRequest::new(page_index, page_size) {
            Ok(page) => page,
            Err(e) => {
                QUERIES_TOTAL
                    .with_label_values(&[&QueryOperation::Page.to_string(), "rejected"])
                    .inc();
                return Err(e);
            }
        };

        self.instrumented(QueryOperation::Page, filter, |generation, predicate| {
            query_page_in(generation, predicate, page)
        })
    }

    /// Number of matching records
    pub fn query_count(&self, filter: &HotfixFilter) -> QueryResult<u64> {
        self.instrumented(QueryOperation::Count, filter, |generation, predicate| {
            query_count_in(generation, predicate)
        })
    }

    fn instrumented<T>(
        &self,
        operation: QueryOperation,
        filter: &HotfixFilter,
        run: impl FnOnce(&Generation, &Predicate) -> T,
    ) -> QueryResult<T> {
        let started = Instant::now();
        let label = operation.to_string();

        let result = pin_generation(&self.catalog, filter).map(|generation| {
            let predicate = compose(filter, generation.index());
            run(&generation, &predicate)
        });

        let outcome = if result.is_ok() { "success" } else { "failure" };
        QUERIES_TOTAL.with_label_values(&[&label, outcome]).inc();
        QUERY_DURATION_SECONDS
            .with_label_values(&[&label])
            .observe(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(operation = %label, error = %e, "Hotfix query failed");
        }

        result
    }
}

/// Snapshot the published generation or report the store as unavailable
pub fn current_generation(catalog: &Catalog) -> QueryResult<Arc<Generation>> {
    catalog
        .current()
        .ok_or_else(|| QueryError::StoreUnavailable("hotfix catalog has not been loaded".to_string()))
}

/// Snapshot the generation a query for `filter` runs against.
///
/// Before the first load a filter that relies on list-field defaulting reports
/// [`QueryError::IndexNotReady`]; any other filter reports the store as unavailable.
pub fn pin_generation(catalog: &Catalog, filter: &HotfixFilter) -> QueryResult<Arc<Generation>> {
    match catalog.current() {
        Some(generation) => Ok(generation),
        None if filter.requires_index() => Err(QueryError::IndexNotReady),
        None => current_generation(catalog),
    }
}

/// Every record of `generation` matching `predicate`, in canonical order
pub fn query_all_in(generation: &Generation, predicate: &Predicate) -> Vec<HotfixRecord> {
    sorted_matches(generation, predicate)
        .into_iter()
        .cloned()
        .collect()
}

/// The requested page of [`query_all_in`]; out-of-range pages are empty
pub fn query_page_in(generation: &Generation, predicate: &Predicate, page: PageRequest) -> Vec<HotfixRecord> {
    sorted_matches(generation, predicate)
        .into_iter()
        .skip(page.offset())
        .take(page.size())
        .cloned()
        .collect()
}

/// Count of [`query_all_in`] without materializing or sorting it
pub fn query_count_in(generation: &Generation, predicate: &Predicate) -> u64 {
    matching(generation, predicate).count() as u64
}

fn sorted_matches<'a>(generation: &'a Generation, predicate: &'a Predicate) -> Vec<&'a HotfixRecord> {
    let mut hits: Vec<&HotfixRecord> = matching(generation, predicate).collect();
    // Generations are stored in canonical order, so this is a linear pass
    hits.sort_by(|a, b| a.canonical_cmp(b));
    hits
}

fn matching<'a>(
    generation: &'a Generation,
    predicate: &'a Predicate,
) -> impl Iterator<Item = &'a HotfixRecord> + 'a {
    let number = generation.number();
    generation
        .records()
        .iter()
        .enumerate()
        .filter_map(move |(position, record)| match evaluate(position, record, predicate) {
            Ok(true) => Some(record),
            Ok(false) => None,
            Err(fault) => {
                RECORD_FAULTS_TOTAL.inc();
                tracing::warn!(generation = number, error = %fault, "Excluding record from results");
                None
            }
        })
}

fn evaluate(position: usize, record: &HotfixRecord, predicate: &Predicate) -> QueryResult<bool> {
    record.validate().map_err(|e| QueryError::RecordFault {
        position,
        key: record.ecp_number.clone(),
        reason: e.to_string(),
    })?;

    Ok(predicate.matches(record))
}
