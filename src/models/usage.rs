use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record of a single search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogEntry {
    pub id: Uuid,

    /// When the request was received
    pub date: DateTime<Utc>,

    /// Endpoint path, e.g. `/getAllResults`
    pub request_path: String,

    /// Human-readable list of the filters the caller supplied
    pub search_input: Vec<String>,

    pub hostname: String,

    pub hostaddress: String,

    pub ntnet: String,
}

impl UsageLogEntry {
    pub fn new(request_path: impl Into<String>, caller: CallerIdentity, search_input: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            request_path: request_path.into(),
            search_input,
            hostname: caller.hostname,
            hostaddress: caller.host_address,
            ntnet: caller.ntnet,
        }
    }

    /// Whether this entry was issued by `host` (hostname or address)
    pub fn matches_host(&self, host: &str) -> bool {
        self.hostname == host || self.hostaddress == host
    }
}

/// Caller identity as reported by the client headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub hostname: String,
    pub host_address: String,
    pub ntnet: String,
}

impl CallerIdentity {
    pub const UNKNOWN: &'static str = "disabled";
}

impl Default for CallerIdentity {
    fn default() -> Self {
        Self {
            hostname: Self::UNKNOWN.to_string(),
            host_address: Self::UNKNOWN.to_string(),
            ntnet: Self::UNKNOWN.to_string(),
        }
    }
}
