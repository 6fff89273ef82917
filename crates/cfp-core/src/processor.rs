//! One change-feed invocation: decode → classify → relay → respond.

use std::sync::Arc;
use std::time::Instant;

use crate::classify::{Classification, classify};
use crate::envelope;
use crate::relay::VisualizationSink;
use crate::response::{Disposition, InvocationResponse};

/// Outcome of processing one invocation body.
#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub response: InvocationResponse,
    pub disposition: Disposition,
}

/// Stateless between invocations; share freely across requests.
#[derive(Clone)]
pub struct ChangeFeedProcessor {
    sink: Arc<dyn VisualizationSink>,
    verbose: bool,
}

impl ChangeFeedProcessor {
    pub fn new(sink: Arc<dyn VisualizationSink>, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    pub async fn process(&self, body: &[u8], invocation_id: Option<&str>) -> ProcessedBatch {
        let start = Instant::now();

        if let Some(id) = invocation_id.filter(|id| !id.is_empty()) {
            tracing::info!("cosmos meta=invocation id={id}");
        }
        if self.verbose {
            tracing::info!(
                "cosmos stage=received raw_bytes={} payload={}",
                body.len(),
                String::from_utf8_lossy(body)
            );
        } else {
            tracing::info!("cosmos stage=received raw_bytes={}", body.len());
        }

        let batch = envelope::decode(body);
        if let Some(err) = &batch.envelope_error {
            tracing::warn!("cosmos error=envelope_unmarshal err={err}");
        }
        if let Some(err) = &batch.documents_error {
            tracing::warn!("cosmos error=input_docs_parse err={err}");
        }

        let retry_count = batch.retry_count;
        let attempt = batch.attempt();
        let mut classification = Classification::default();

        // Every document is classified and relayed, even after a failure.
        for doc in &batch.documents {
            let verdict = classify(doc);
            tracing::info!(
                "cosmos doc_attempt id={} attempt={attempt} retryCount={retry_count}",
                verdict.id
            );
            classification.push(verdict);
            self.sink.notify(doc).await;
        }

        let disposition = Disposition::from_failing(classification.failing());
        tracing::info!(
            "cosmos final status={} docs={} duration_ms={}",
            disposition.as_str(),
            classification.len(),
            start.elapsed().as_millis()
        );

        ProcessedBatch {
            response: InvocationResponse::change_feed(&classification, retry_count),
            disposition,
        }
    }
}
