//! Binding of raw query strings and headers into typed request inputs

use crate::error::{AppError, Result};
use crate::models::CallerIdentity;
use crate::query::{HotfixFilter, TextField};
use axum::http::HeaderMap;
use strum::IntoEnumIterator;

pub const PAGE_NO: &str = "page_no";
pub const PAGE_SIZE: &str = "page_size";

const HOSTNAME_HEADER: &str = "hostname";
const HOST_ADDRESS_HEADER: &str = "hostaddress";
const NTNET_HEADER: &str = "ntnet";

/// Search filters plus the optional paging parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub filter: HotfixFilter,
    pub page_no: Option<String>,
    pub page_size: Option<String>,
}

impl SearchParams {
    /// Bind query-string pairs.
    ///
    /// List fields accept repeated keys and comma-separated values; blank list
    /// entries are dropped. A repeated text field keeps its last value. Unknown
    /// keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = SearchParams::default();

        for (key, value) in pairs {
            match key.as_str() {
                "cramerVersion" => push_list(&mut params.filter.cramer_version, value),
                "module" => push_list(&mut params.filter.module, value),
                PAGE_NO => params.page_no = Some(value.clone()),
                PAGE_SIZE => params.page_size = Some(value.clone()),
                other => {
                    if let Some(field) = text_field(other) {
                        *params.filter.text_mut(field) = value.clone();
                    }
                }
            }
        }

        params
    }

    /// Both paging parameters, which the pageable endpoint requires
    pub fn paging(&self) -> Result<(i64, i64)> {
        Ok((
            required_int(PAGE_NO, self.page_no.as_deref())?,
            required_int(PAGE_SIZE, self.page_size.as_deref())?,
        ))
    }
}

fn text_field(key: &str) -> Option<TextField> {
    if key == "specificFunc" {
        return Some(TextField::SpecificFunction);
    }
    TextField::iter().find(|field| field.to_string() == key)
}

fn push_list(target: &mut Vec<String>, raw: &str) {
    target.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    );
}

fn required_int(name: &str, raw: Option<&str>) -> Result<i64> {
    let raw = raw.ok_or_else(|| {
        AppError::InvalidInput(format!("missing required parameter '{}'", name))
    })?;

    raw.trim().parse().map_err(|_| {
        AppError::InvalidInput(format!("parameter '{}' must be an integer, got {:?}", name, raw))
    })
}

/// Caller identity from the `Hostname`, `HostAddress` and `NTNET` headers
pub fn caller_identity(headers: &HeaderMap) -> CallerIdentity {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(CallerIdentity::UNKNOWN)
            .to_string()
    };

    CallerIdentity {
        hostname: read(HOSTNAME_HEADER),
        host_address: read(HOST_ADDRESS_HEADER),
        ntnet: read(NTNET_HEADER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_binds_text_and_list_fields() {
        let params = SearchParams::from_pairs(&pairs(&[
            ("ecpNo", "ECP 1"),
            ("cramerVersion", "v1,v2"),
            ("cramerVersion", "v3"),
            ("module", " , core ,"),
            ("specificFunc", "rollup"),
            ("caseOrCrNo", "CR-9"),
            ("unknown", "ignored"),
        ]));

        assert_eq!(params.filter.ecp_no, "ECP 1");
        assert_eq!(params.filter.cramer_version, vec!["v1", "v2", "v3"]);
        assert_eq!(params.filter.module, vec!["core"]);
        assert_eq!(params.filter.specific_function, "rollup");
        assert_eq!(params.filter.case_or_cr_no, "CR-9");
        assert!(params.page_no.is_none());
    }

    #[test]
    fn test_empty_list_value_stays_defaulted() {
        let params = SearchParams::from_pairs(&pairs(&[("module", "")]));
        assert!(params.filter.module.is_empty());
    }

    #[test]
    fn test_paging_is_required_and_numeric() {
        let params = SearchParams::from_pairs(&pairs(&[("page_no", "2"), ("page_size", "25")]));
        assert_eq!(params.paging().unwrap(), (2, 25));

        let missing = SearchParams::from_pairs(&pairs(&[("page_no", "2")]));
        assert!(matches!(missing.paging(), Err(AppError::InvalidInput(_))));

        let garbage = SearchParams::from_pairs(&pairs(&[("page_no", "two"), ("page_size", "25")]));
        assert!(matches!(garbage.paging(), Err(AppError::InvalidInput(_))));

        // Negative values bind; range checks belong to the query engine
        let negative = SearchParams::from_pairs(&pairs(&[("page_no", "-1"), ("page_size", "5")]));
        assert_eq!(negative.paging().unwrap(), (-1, 5));
    }

    #[test]
    fn test_caller_identity_defaults_to_disabled() {
        let mut headers = HeaderMap::new();
        headers.insert("hostname", HeaderValue::from_static("build-01"));
        headers.insert("ntnet", HeaderValue::from_static("  "));

        let caller = caller_identity(&headers);
        assert_eq!(caller.hostname, "build-01");
        assert_eq!(caller.host_address, "disabled");
        assert_eq!(caller.ntnet, "disabled");
    }
}
