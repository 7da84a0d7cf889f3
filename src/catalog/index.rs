//! Distinct-value index over the enumerable record fields

use crate::models::HotfixRecord;
use std::collections::HashSet;
use std::sync::Arc;

/// Distinct `cramerVersion` and `module` values of one store generation.
///
/// Built in a single pass and never mutated afterwards; the sets are shared by
/// reference with every predicate composed against this index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctValueIndex {
    versions: Arc<HashSet<String>>,
    modules: Arc<HashSet<String>>,
}

impl DistinctValueIndex {
    /// Scan every record once and collect the distinct values
    pub fn rebuild<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a HotfixRecord>,
    {
        let mut versions = HashSet::new();
        let mut modules = HashSet::new();

        for record in records {
            if !versions.contains(&record.cramer_version) {
                versions.insert(record.cramer_version.clone());
            }
            if !modules.contains(&record.module) {
                modules.insert(record.module.clone());
            }
        }

        Self {
            versions: Arc::new(versions),
            modules: Arc::new(modules),
        }
    }

    pub fn versions(&self) -> &Arc<HashSet<String>> {
        &self.versions
    }

    pub fn modules(&self) -> &Arc<HashSet<String>> {
        &self.modules
    }

    /// Versions in display order
    pub fn sorted_versions(&self) -> Vec<String> {
        sorted(&self.versions)
    }

    /// Modules in display order
    pub fn sorted_modules(&self) -> Vec<String> {
        sorted(&self.modules)
    }
}

fn sorted(values: &HashSet<String>) -> Vec<String> {
    let mut values: Vec<String> = values.iter().cloned().collect();
    values.sort_by(|a, b| crate::models::natural_cmp(a, b).then_with(|| a.cmp(b)));
    values
}
