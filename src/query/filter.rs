//! Twelve-field hotfix filter and the predicate composed from it

use crate::catalog::DistinctValueIndex;
use crate::models::HotfixRecord;
use crate::query::pattern::MatchPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Caller-supplied search criteria.
///
/// Every field is optional: blank text and empty lists mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotfixFilter {
    pub ecp_no: String,
    pub description: String,
    /// Exact versions; empty means every known version
    pub cramer_version: Vec<String>,
    pub latest_ecp: String,
    pub requestor: String,
    pub fixed_by: String,
    /// Exact modules; empty means every known module
    pub module: Vec<String>,
    pub case_or_cr_no: String,
    pub files_modified_in_perforce: String,
    pub files_released_to_customer: String,
    pub rolled_into_version: String,
    #[serde(alias = "specificFunc")]
    pub specific_function: String,
}

impl HotfixFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a free-text field
    pub fn with_text(mut self, field: TextField, value: impl Into<String>) -> Self {
        *self.text_mut(field) = value.into();
        self
    }

    pub fn with_ecp_no(self, value: impl Into<String>) -> Self {
        self.with_text(TextField::EcpNo, value)
    }

    pub fn with_description(self, value: impl Into<String>) -> Self {
        self.with_text(TextField::Description, value)
    }

    pub fn with_versions(mut self, versions: Vec<impl Into<String>>) -> Self {
        self.cramer_version = versions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_modules(mut self, modules: Vec<impl Into<String>>) -> Self {
        self.module = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Raw value of a free-text field
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::EcpNo => &self.ecp_no,
            TextField::Description => &self.description,
            TextField::LatestEcp => &self.latest_ecp,
            TextField::Requestor => &self.requestor,
            TextField::FixedBy => &self.fixed_by,
            TextField::CaseOrCrNo => &self.case_or_cr_no,
            TextField::FilesModifiedInPerforce => &self.files_modified_in_perforce,
            TextField::FilesReleasedToCustomer => &self.files_released_to_customer,
            TextField::RolledIntoVersion => &self.rolled_into_version,
            TextField::SpecificFunction => &self.specific_function,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::EcpNo => &mut self.ecp_no,
            TextField::Description => &mut self.description,
            TextField::LatestEcp => &mut self.latest_ecp,
            TextField::Requestor => &mut self.requestor,
            TextField::FixedBy => &mut self.fixed_by,
            TextField::CaseOrCrNo => &mut self.case_or_cr_no,
            TextField::FilesModifiedInPerforce => &mut self.files_modified_in_perforce,
            TextField::FilesReleasedToCustomer => &mut self.files_released_to_customer,
            TextField::RolledIntoVersion => &mut self.rolled_into_version,
            TextField::SpecificFunction => &mut self.specific_function,
        }
    }

    /// Whether composing this filter needs the distinct-value index
    pub fn requires_index(&self) -> bool {
        self.cramer_version.is_empty() || self.module.is_empty()
    }

    /// Human-readable list of the constraints actually supplied, for audit logs
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for field in TextField::iter() {
            let value = self.text(field);
            if !value.is_empty() {
                lines.push(format!("{}: {}", field.label(), value));
            }
        }
        if !self.cramer_version.is_empty() {
            lines.push(format!("Versions: {:?}", self.cramer_version));
        }
        if !self.module.is_empty() {
            lines.push(format!("Modules: {:?}", self.module));
        }

        lines
    }
}

/// The ten pattern-matched record attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum TextField {
    EcpNo,
    Description,
    LatestEcp,
    Requestor,
    FixedBy,
    CaseOrCrNo,
    FilesModifiedInPerforce,
    FilesReleasedToCustomer,
    RolledIntoVersion,
    SpecificFunction,
}

impl TextField {
    /// Attribute of `record` this field filters on
    pub fn value<'a>(&self, record: &'a HotfixRecord) -> &'a str {
        match self {
            TextField::EcpNo => &record.ecp_number,
            TextField::Description => &record.description,
            TextField::LatestEcp => &record.latest_ecp,
            TextField::Requestor => &record.requestor,
            TextField::FixedBy => &record.fixed_by,
            TextField::CaseOrCrNo => &record.case_or_cr_no,
            TextField::FilesModifiedInPerforce => &record.files_modified_in_perforce,
            TextField::FilesReleasedToCustomer => &record.files_released_to_customer,
            TextField::RolledIntoVersion => &record.rolled_into_version,
            TextField::SpecificFunction => &record.specific_function,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TextField::EcpNo => "Hotfix No",
            TextField::Description => "Description",
            TextField::LatestEcp => "Latest Hotfix",
            TextField::Requestor => "Requested by",
            TextField::FixedBy => "Fixed by",
            TextField::CaseOrCrNo => "Case or CR No",
            TextField::FilesModifiedInPerforce => "Files modified",
            TextField::FilesReleasedToCustomer => "Files released",
            TextField::RolledIntoVersion => "Rolled into version",
            TextField::SpecificFunction => "Specific function",
        }
    }
}

/// Exact set-membership constraint for a list field
#[derive(Debug, Clone)]
pub struct MembershipFilter {
    values: Arc<HashSet<String>>,
    defaulted: bool,
}

impl MembershipFilter {
    /// Caller-supplied values
    pub fn explicit(values: &[String]) -> Self {
        Self {
            values: Arc::new(values.iter().cloned().collect()),
            defaulted: false,
        }
    }

    /// Every value currently known to the index
    pub fn known(values: &Arc<HashSet<String>>) -> Self {
        Self {
            values: Arc::clone(values),
            defaulted: true,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// True when the list was left empty and expanded from the index
    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }

    pub fn values(&self) -> &HashSet<String> {
        &self.values
    }
}

/// Conjunction of all twelve per-field constraints
#[derive(Debug, Clone)]
pub struct Predicate {
    patterns: Vec<(TextField, MatchPattern)>,
    versions: MembershipFilter,
    modules: MembershipFilter,
}

impl Predicate {
    /// Whether `record` satisfies every dimension
    pub fn matches(&self, record: &HotfixRecord) -> bool {
        self.versions.contains(&record.cramer_version)
            && self.modules.contains(&record.module)
            && self
                .patterns
                .iter()
                .all(|(field, pattern)| pattern.is_match(field.value(record)))
    }

    pub fn versions(&self) -> &MembershipFilter {
        &self.versions
    }

    pub fn modules(&self) -> &MembershipFilter {
        &self.modules
    }

    /// Compiled pattern for one text field
    pub fn pattern(&self, field: TextField) -> Option<&MatchPattern> {
        self.patterns.iter().find(|(f, _)| *f == field).map(|(_, p)| p)
    }
}

/// Build the combined predicate for `filter`.
///
/// Empty list fields are replaced with the full corresponding set from `index`,
/// so they constrain records to values the index knows about.
pub fn compose(filter: &HotfixFilter, index: &DistinctValueIndex) -> Predicate {
    let patterns = TextField::iter()
        .map(|field| (field, MatchPattern::compile(filter.text(field))))
        .collect();

    let versions = if filter.cramer_version.is_empty() {
        MembershipFilter::known(index.versions())
    } else {
        MembershipFilter::explicit(&filter.cramer_version)
    };

    let modules = if filter.module.is_empty() {
        MembershipFilter::known(index.modules())
    } else {
        MembershipFilter::explicit(&filter.module)
    };

    Predicate {
        patterns,
        versions,
        modules,
    }
}
