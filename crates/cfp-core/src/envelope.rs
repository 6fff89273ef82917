//! Change-feed envelope decoding.
//!
//! The host delivers the changed documents as a JSON array serialized into the
//! `Data.inputDocuments` string, sometimes quoted and escaped once more. Decoding
//! never fails outright: every problem degrades to "no documents" and is reported
//! on the [`DecodedBatch`] for logging.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;

use crate::error::Result;

/// A changed document. Open-ended; `id`, `transaction`, `account` and `amount`
/// are the keys this handler looks at.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Outer envelope, only the fields used for logging and retry behavior.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeFeedEnvelope {
    #[serde(rename = "Data", alias = "data", default, deserialize_with = "lenient")]
    pub data: EnvelopeData,
    #[serde(rename = "Metadata", alias = "metadata", default, deserialize_with = "lenient")]
    pub metadata: EnvelopeMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnvelopeData {
    #[serde(
        rename = "inputDocuments",
        alias = "InputDocuments",
        default,
        deserialize_with = "lenient"
    )]
    pub input_documents: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnvelopeMetadata {
    #[serde(rename = "RetryContext", alias = "retryContext", default, deserialize_with = "lenient")]
    pub retry_context: RetryContext,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetryContext {
    #[serde(rename = "RetryCount", alias = "retryCount", default, deserialize_with = "lenient")]
    pub retry_count: i64,
}

/// A field of the wrong shape falls back to its default instead of rejecting
/// the whole envelope.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Result of decoding one invocation body.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub documents: Vec<Document>,
    pub retry_count: i64,
    /// Set when the body was not a JSON envelope at all.
    pub envelope_error: Option<String>,
    /// Set when `inputDocuments` could not be read as a document array.
    pub documents_error: Option<String>,
}

impl DecodedBatch {
    /// 1-based attempt number for this delivery of the batch.
    pub fn attempt(&self) -> i64 {
        attempt_for(self.retry_count)
    }
}

/// `retry_count + 1`, wrapping at `i64::MAX` instead of panicking.
pub fn attempt_for(retry_count: i64) -> i64 {
    retry_count.wrapping_add(1)
}

/// Decode a raw invocation body.
pub fn decode(body: &[u8]) -> DecodedBatch {
    let (envelope, envelope_error) = match serde_json::from_slice::<ChangeFeedEnvelope>(body) {
        Ok(env) => (env, None),
        Err(e) => (ChangeFeedEnvelope::default(), Some(e.to_string())),
    };

    let (documents, documents_error) = match unescape_documents(&envelope.data.input_documents) {
        Ok(docs) => (docs, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    DecodedBatch {
        documents,
        retry_count: envelope.metadata.retry_context.retry_count,
        envelope_error,
        documents_error,
    }
}

/// Parse the embedded document array.
///
/// A quote-delimited value is unquoted one level first; if that fails the raw
/// text is parsed as-is. `null` and `null` elements are treated as empty.
pub fn unescape_documents(raw: &str) -> Result<Vec<Document>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let text: Cow<'_, str> = if raw.starts_with('"') && raw.ends_with('"') {
        match serde_json::from_str::<String>(raw) {
            Ok(unquoted) => Cow::Owned(unquoted),
            Err(_) => Cow::Borrowed(raw),
        }
    } else {
        Cow::Borrowed(raw)
    };

    let docs: Option<Vec<Option<Document>>> = serde_json::from_str(&text)?;
    Ok(docs
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(input_documents: &str, retry_count: i64) -> Vec<u8> {
        json!({
            "Data": { "inputDocuments": input_documents },
            "Metadata": { "RetryContext": { "RetryCount": retry_count } }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_decode_raw_array() {
        let batch = decode(&body(
            r#"[{"id":"1","transaction":"fail"},{"id":"2","transaction":"pass"}]"#,
            2,
        ));
        assert_eq!(batch.documents.len(), 2);
        assert_eq!(batch.documents[0]["id"], "1");
        assert_eq!(batch.documents[1]["transaction"], "pass");
        assert_eq!(batch.retry_count, 2);
        assert_eq!(batch.attempt(), 3);
        assert!(batch.envelope_error.is_none());
        assert!(batch.documents_error.is_none());
    }

    #[test]
    fn test_decode_quoted_array() {
        let inner = r#"[{"id":"a","amount":12.5}]"#;
        let quoted = serde_json::to_string(inner).unwrap();
        assert!(quoted.starts_with('"'));

        let batch = decode(&body(&quoted, 0));
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0]["id"], "a");
        assert_eq!(batch.documents[0]["amount"], 12.5);
    }

    #[test]
    fn test_unquoting_does_not_touch_raw_text() {
        let raw = r#"[{"id":"x","note":"say \"hi\""}]"#;
        let docs = unescape_documents(raw).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["note"], "say \"hi\"");
    }

    #[test]
    fn test_bad_quoting_falls_back_to_raw() {
        // Quote-delimited but not a valid string literal, and not JSON either.
        let err = unescape_documents(r#""[{\q}]""#).unwrap_err();
        assert!(matches!(err, crate::error::CfpError::Json(_)));
        // A lone quote is both prefix and suffix.
        assert!(unescape_documents("\"").is_err());
    }

    #[test]
    fn test_empty_and_null_documents() {
        assert!(unescape_documents("").unwrap().is_empty());
        assert!(unescape_documents("null").unwrap().is_empty());
        assert!(unescape_documents("[]").unwrap().is_empty());

        let docs = unescape_documents(r#"[null,{"id":"1"}]"#).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].is_empty());
    }

    #[test]
    fn test_malformed_documents_degrade() {
        let batch = decode(&body("[{not json", 1));
        assert!(batch.documents.is_empty());
        assert!(batch.documents_error.is_some());
        assert_eq!(batch.retry_count, 1);
        assert!(batch.envelope_error.is_none());
    }

    #[test]
    fn test_malformed_envelope_degrades() {
        let batch = decode(b"this is not json");
        assert!(batch.documents.is_empty());
        assert_eq!(batch.retry_count, 0);
        assert_eq!(batch.attempt(), 1);
        assert!(batch.envelope_error.is_some());
        assert!(batch.documents_error.is_none());
    }

    #[test]
    fn test_attempt_wraps_at_max_retry_count() {
        let raw = json!({
            "Data": { "inputDocuments": "[]" },
            "Metadata": { "RetryContext": { "RetryCount": i64::MAX } }
        });
        let batch = decode(raw.to_string().as_bytes());
        assert_eq!(batch.retry_count, i64::MAX);
        assert_eq!(batch.attempt(), i64::MIN);
        assert_eq!(attempt_for(-1), 0);
    }

    #[test]
    fn test_empty_body() {
        let batch = decode(b"");
        assert!(batch.documents.is_empty());
        assert!(batch.envelope_error.is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let batch = decode(b"{}");
        assert!(batch.documents.is_empty());
        assert_eq!(batch.retry_count, 0);
        assert!(batch.envelope_error.is_none());

        let batch = decode(br#"{"Data":{"inputDocuments":"[{\"id\":\"7\"}]"}}"#);
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.attempt(), 1);
    }

    #[test]
    fn test_wrong_field_types_only_default_that_field() {
        let raw = json!({
            "Data": { "inputDocuments": r#"[{"id":"1"}]"# },
            "Metadata": { "RetryContext": { "RetryCount": "three" } }
        });
        let batch = decode(raw.to_string().as_bytes());
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.retry_count, 0);

        let raw = json!({
            "Data": { "inputDocuments": [{ "id": "1" }] },
            "Metadata": { "RetryContext": { "RetryCount": 4 } }
        });
        let batch = decode(raw.to_string().as_bytes());
        assert!(batch.documents.is_empty());
        assert_eq!(batch.retry_count, 4);

        let batch = decode(br#"{"Data":null,"Metadata":{"RetryContext":{"RetryCount":1}}}"#);
        assert!(batch.documents.is_empty());
        assert_eq!(batch.attempt(), 2);
    }
}
