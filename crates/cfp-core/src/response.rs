//! Custom-handler response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::classify::Classification;
use crate::envelope::attempt_for;
use crate::error::Result;

/// Timestamp layout used in timer log lines.
pub const TIMER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape the host expects back from every non-HTTP-output invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "Outputs")]
    pub outputs: Map<String, Value>,
    #[serde(rename = "Logs")]
    pub logs: Vec<String>,
    #[serde(rename = "ReturnValue")]
    pub return_value: Value,
}

impl InvocationResponse {
    /// Response for a processed change-feed batch.
    pub fn change_feed(classification: &Classification, retry_count: i64) -> Self {
        let attempt = attempt_for(retry_count);
        let count = classification.len();

        let mut logs = Vec::with_capacity(count + 1);
        logs.push(format!("processed {count} docs attempt={attempt}"));
        logs.extend(classification.summaries());

        Self {
            outputs: Map::new(),
            logs,
            return_value: json!({
                "documentCount": count,
                "attempt": attempt,
                "retryCount": retry_count,
            }),
        }
    }

    /// Response for a timer tick; `executed_at` is already formatted.
    pub fn timer(executed_at: &str) -> Self {
        Self {
            outputs: Map::new(),
            logs: vec![format!("Timer executed at {executed_at}")],
            return_value: Value::Null,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// How the invocation ended, as seen by the host's retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    /// At least one document failed; the host should redeliver the batch.
    Retry,
}

impl Disposition {
    pub fn from_failing(failing: bool) -> Self {
        if failing { Disposition::Retry } else { Disposition::Success }
    }

    pub fn status_code(self) -> u16 {
        match self {
            Disposition::Success => 200,
            Disposition::Retry => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Success => "success",
            Disposition::Retry => "failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Outcome, Verdict};

    fn verdict(id: &str, txn: &str) -> Verdict {
        Verdict {
            id: id.into(),
            outcome: Outcome::from_transaction(txn),
        }
    }

    #[test]
    fn test_change_feed_response() {
        let mut c = Classification::default();
        c.push(verdict("1", "fail"));
        c.push(verdict("2", "pass"));

        let resp = InvocationResponse::change_feed(&c, 2);
        assert!(resp.outputs.is_empty());
        assert_eq!(
            resp.logs,
            vec!["processed 2 docs attempt=3", "id=1 transaction=fail", "id=2 transaction=pass"]
        );
        assert_eq!(resp.return_value["documentCount"], 2);
        assert_eq!(resp.return_value["attempt"], 3);
        assert_eq!(resp.return_value["retryCount"], 2);
    }

    #[test]
    fn test_empty_batch_response() {
        let resp = InvocationResponse::change_feed(&Classification::default(), 0);
        assert_eq!(resp.logs, vec!["processed 0 docs attempt=1"]);
        assert_eq!(resp.return_value["documentCount"], 0);
        assert_eq!(resp.return_value["attempt"], 1);
    }

    #[test]
    fn test_max_retry_count_does_not_overflow() {
        let resp = InvocationResponse::change_feed(&Classification::default(), i64::MAX);
        assert_eq!(resp.return_value["retryCount"], i64::MAX);
        assert_eq!(resp.return_value["attempt"], i64::MIN);
        assert_eq!(resp.logs, vec![format!("processed 0 docs attempt={}", i64::MIN)]);
    }

    #[test]
    fn test_wire_shape() {
        let resp = InvocationResponse::timer("2026-01-02 03:04:05");
        let v: Value = serde_json::from_slice(&resp.to_json().unwrap()).unwrap();
        assert_eq!(v["Outputs"], json!({}));
        assert_eq!(v["Logs"], json!(["Timer executed at 2026-01-02 03:04:05"]));
        assert!(v["ReturnValue"].is_null());
        assert_eq!(v.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_disposition() {
        assert_eq!(Disposition::from_failing(false).status_code(), 200);
        assert_eq!(Disposition::from_failing(true).status_code(), 500);
        assert_eq!(Disposition::Retry.as_str(), "failure");
    }
}
