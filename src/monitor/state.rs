//! Lifecycle states and the endpoint each one maps to.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{PulseError, Result};

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
/// Used for both path segments and query components, so spaces become `%20`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query value sent with `failed` when no message is available.
const FAILED_SENTINEL: &str = "true";

/// One of the three states a job reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Job started.
    Run,
    /// Job finished successfully.
    Complete,
    /// Job raised an error.
    Failed,
}

impl LifecycleState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run" => Ok(Self::Run),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            other => Err(PulseError::InvalidState(other.to_string())),
        }
    }
}

/// A single ping, before it is bound to a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub state: LifecycleState,
    /// Only meaningful for [`LifecycleState::Failed`].
    pub message: Option<String>,
}

impl PingRequest {
    pub fn new(state: LifecycleState, message: Option<&str>) -> Self {
        Self {
            state,
            message: message.map(str::to_string),
        }
    }

    /// Endpoint path for `job_key`. `failed` shares the `complete` path.
    pub fn path(&self, job_key: &str) -> String {
        let action = match self.state {
            LifecycleState::Run => "run",
            LifecycleState::Complete | LifecycleState::Failed => "complete",
        };
        format!("/api/{}/{}", action, encode_component(job_key))
    }

    /// Query parameters in send order. Empty except for `failed`.
    pub fn query(&self) -> Vec<(String, String)> {
        match self.state {
            LifecycleState::Run | LifecycleState::Complete => Vec::new(),
            LifecycleState::Failed => {
                let value = self
                    .message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(FAILED_SENTINEL);
                vec![("failed".to_string(), value.to_string())]
            }
        }
    }
}

/// Percent-encode a single path segment or query component.
pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Serialize pairs into `k=v&k=v`, keeping the given order.
pub(crate) fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_states() {
        assert_eq!("run".parse::<LifecycleState>().unwrap(), LifecycleState::Run);
        assert_eq!(
            "complete".parse::<LifecycleState>().unwrap(),
            LifecycleState::Complete
        );
        assert_eq!(
            "failed".parse::<LifecycleState>().unwrap(),
            LifecycleState::Failed
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_case_variants() {
        for raw in ["", "Run", "started", "complete ", "fail"] {
            let err = raw.parse::<LifecycleState>().unwrap_err();
            assert!(matches!(err, PulseError::InvalidState(ref s) if s == raw));
        }
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(LifecycleState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_run_path_no_query() {
        let req = PingRequest::new(LifecycleState::Run, None);
        assert_eq!(req.path("nightly-backup"), "/api/run/nightly-backup");
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_complete_path_no_query() {
        let req = PingRequest::new(LifecycleState::Complete, None);
        assert_eq!(req.path("nightly-backup"), "/api/complete/nightly-backup");
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_complete_ignores_message() {
        let req = PingRequest::new(LifecycleState::Complete, Some("ignored"));
        assert!(req.query().is_empty());
    }

    #[test]
    fn test_failed_shares_complete_path() {
        let failed = PingRequest::new(LifecycleState::Failed, Some("x"));
        let complete = PingRequest::new(LifecycleState::Complete, None);
        assert_eq!(failed.path("job"), complete.path("job"));
    }

    #[test]
    fn test_failed_with_message() {
        let req = PingRequest::new(LifecycleState::Failed, Some("disk full"));
        assert_eq!(
            req.query(),
            vec![("failed".to_string(), "disk full".to_string())]
        );
    }

    #[test]
    fn test_failed_empty_or_missing_message_uses_sentinel() {
        for message in [None, Some("")] {
            let req = PingRequest::new(LifecycleState::Failed, message);
            assert_eq!(req.query(), vec![("failed".to_string(), "true".to_string())]);
        }
    }

    #[test]
    fn test_job_key_is_escaped_as_one_segment() {
        let req = PingRequest::new(LifecycleState::Run, None);
        assert_eq!(req.path("a/b c"), "/api/run/a%2Fb%20c");
    }

    #[test]
    fn test_encode_query_spaces_and_reserved() {
        let params = vec![
            ("failed".to_string(), "disk full".to_string()),
            ("note".to_string(), "a&b=c".to_string()),
        ];
        assert_eq!(encode_query(&params), "failed=disk%20full&note=a%26b%3Dc");
    }

    #[test]
    fn test_encode_query_keeps_order_and_unreserved() {
        let params = vec![
            ("z".to_string(), "1".to_string()),
            ("a".to_string(), "x-y_z.~".to_string()),
        ];
        assert_eq!(encode_query(&params), "z=1&a=x-y_z.~");
    }

    #[test]
    fn test_encode_query_empty() {
        assert_eq!(encode_query(&[]), "");
    }
}
