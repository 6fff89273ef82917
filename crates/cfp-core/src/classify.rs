//! Per-document pass/fail classification.

use crate::envelope::Document;

/// What a document's `transaction` field asks the handler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    /// Fails the whole invocation so the host redelivers the batch.
    Fail,
    /// Any other value, including a missing or non-string field.
    Neutral(String),
}

impl Outcome {
    pub fn from_transaction(transaction: &str) -> Self {
        match transaction {
            "fail" => Outcome::Fail,
            "pass" => Outcome::Pass,
            other => Outcome::Neutral(other.to_string()),
        }
    }

    pub fn transaction(&self) -> &str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Neutral(value) => value,
        }
    }
}

/// Classification of a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub id: String,
    pub outcome: Outcome,
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Fail
    }

    /// Line echoed back to the host in `Logs`.
    pub fn summary(&self) -> String {
        format!("id={} transaction={}", self.id, self.outcome.transaction())
    }
}

/// Read a string field; absent or non-string values read as empty.
pub fn string_field<'a>(doc: &'a Document, key: &str) -> &'a str {
    doc.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// Classify one document and log its status.
pub fn classify(doc: &Document) -> Verdict {
    let verdict = Verdict {
        id: string_field(doc, "id").to_string(),
        outcome: Outcome::from_transaction(string_field(doc, "transaction")),
    };

    match &verdict.outcome {
        Outcome::Fail => tracing::warn!(
            "cosmos doc_status id={} transaction=fail action=will_fail_invocation",
            verdict.id
        ),
        Outcome::Pass => tracing::info!("cosmos doc_status id={} transaction=pass", verdict.id),
        Outcome::Neutral(txn) => tracing::info!(
            "cosmos doc_status id={} transaction={} (no special action)",
            verdict.id,
            txn
        ),
    }

    verdict
}

/// Verdicts for a whole batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub verdicts: Vec<Verdict>,
}

impl Classification {
    pub fn push(&mut self, verdict: Verdict) {
        self.verdicts.push(verdict);
    }

    /// True when any document asked for the invocation to fail.
    pub fn failing(&self) -> bool {
        self.verdicts.iter().any(Verdict::is_failure)
    }

    pub fn summaries(&self) -> impl Iterator<Item = String> + '_ {
        self.verdicts.iter().map(Verdict::summary)
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}
