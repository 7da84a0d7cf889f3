use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use validator::Validate;

/// A single hotfix (ECP) record as loaded from the catalog source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct HotfixRecord {
    /// Hotfix number, unique within a load generation
    #[serde(rename = "ecpNo", alias = "ecpNumber", alias = "ECP No")]
    #[validate(length(min = 1))]
    pub ecp_number: String,

    #[serde(alias = "Description")]
    pub description: String,

    /// Product version the hotfix applies to
    #[serde(alias = "Cramer Version")]
    pub cramer_version: String,

    /// Successor hotfix, if superseded
    #[serde(alias = "Latest ECP")]
    pub latest_ecp: String,

    #[serde(alias = "Requestor")]
    pub requestor: String,

    #[serde(alias = "Fixed By")]
    pub fixed_by: String,

    /// Subsystem the hotfix touches
    #[serde(alias = "Module")]
    pub module: String,

    #[serde(alias = "Case or CR No")]
    pub case_or_cr_no: String,

    #[serde(alias = "Files Modified in Perforce")]
    pub files_modified_in_perforce: String,

    #[serde(alias = "Files Released to Customer")]
    pub files_released_to_customer: String,

    #[serde(alias = "Rolled into Version")]
    pub rolled_into_version: String,

    #[serde(rename = "specificFunc", alias = "specificFunction", alias = "Specific Function")]
    pub specific_function: String,

    /// Ordering token, usually numeric
    #[serde(alias = "Sequence")]
    pub sequence: String,
}

impl HotfixRecord {
    /// Create a record with the identifying fields set; everything else is blank
    pub fn new(
        ecp_number: impl Into<String>,
        cramer_version: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            ecp_number: ecp_number.into(),
            cramer_version: cramer_version.into(),
            module: module.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_latest_ecp(mut self, latest_ecp: impl Into<String>) -> Self {
        self.latest_ecp = latest_ecp.into();
        self
    }

    pub fn with_requestor(mut self, requestor: impl Into<String>) -> Self {
        self.requestor = requestor.into();
        self
    }

    pub fn with_fixed_by(mut self, fixed_by: impl Into<String>) -> Self {
        self.fixed_by = fixed_by.into();
        self
    }

    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = sequence.into();
        self
    }

    pub fn with_specific_function(mut self, specific_function: impl Into<String>) -> Self {
        self.specific_function = specific_function.into();
        self
    }

    /// Rank derived from the sequence token
    pub fn sequence_rank(&self) -> SequenceRank {
        SequenceRank::parse(&self.sequence)
    }

    /// Canonical total order over records of one generation.
    ///
    /// Hotfix numbers compare naturally (digit runs by numeric value), then by raw
    /// text, then by sequence rank. Callers that need a strict total order over
    /// duplicates break remaining ties by load position.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.ecp_number, &other.ecp_number)
            .then_with(|| self.ecp_number.cmp(&other.ecp_number))
            .then_with(|| self.sequence_rank().cmp(&other.sequence_rank()))
    }
}

/// Sort rank of a sequence token.
///
/// Non-numeric tokens are `Unranked` and order below every numeric rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SequenceRank {
    Unranked,
    Ranked(i64),
}

impl SequenceRank {
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<i64>()
            .map(SequenceRank::Ranked)
            .unwrap_or(SequenceRank::Unranked)
    }

    /// Numeric value, with unranked tokens reported as -1
    pub fn value(&self) -> i64 {
        match self {
            SequenceRank::Ranked(n) => *n,
            SequenceRank::Unranked => -1,
        }
    }
}

impl fmt::Display for SequenceRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceRank::Ranked(n) => write!(f, "{}", n),
            SequenceRank::Unranked => f.write_str("unranked"),
        }
    }
}

/// Natural string comparison: runs of ASCII digits compare by numeric value,
/// everything else compares case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digit_runs(x, y),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                    (Chunk::Text(x), Chunk::Text(y)) => x
                        .chars()
                        .flat_map(char::to_lowercase)
                        .cmp(y.chars().flat_map(char::to_lowercase)),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}
