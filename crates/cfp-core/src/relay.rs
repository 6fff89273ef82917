//! Visualization relay. Forwards a small projection of each document to an
//! external dashboard. Best-effort: failures are logged and never reach the caller.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::VisualizerConfig;
use crate::envelope::Document;
use crate::error::{CfpError, Result};

/// Receives every classified document.
#[async_trait]
pub trait VisualizationSink: Send + Sync {
    async fn notify(&self, doc: &Document);
}

/// Payload posted to the dashboard. A field is present only if the source
/// document had it; values are copied as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualizationEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
}

impl VisualizationEvent {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.get("id").cloned(),
            transaction: doc.get("transaction").cloned(),
            account: doc.get("account").cloned(),
            amount: doc.get("amount").cloned(),
        }
    }

    /// `id` for log lines.
    pub fn display_id(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<none>".into(),
        }
    }
}

/// POSTs events to the configured endpoint with a per-request timeout.
pub struct HttpVisualizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVisualizer {
    pub fn new(config: &VisualizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cfp-handler/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CfpError::Relay(format!("Client error: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one event, returning the HTTP status. The response body is drained.
    async fn post(&self, event: &VisualizationEvent) -> Result<reqwest::StatusCode> {
        let body = serde_json::to_vec(event)?;
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| CfpError::Relay(format!("post failed: {e}")))?;

        let status = resp.status();
        let _ = resp.bytes().await;
        Ok(status)
    }
}

#[async_trait]
impl VisualizationSink for HttpVisualizer {
    async fn notify(&self, doc: &Document) {
        let event = VisualizationEvent::from_document(doc);
        match self.post(&event).await {
            Ok(status) if status.is_success() => tracing::info!(
                "visualizer status=posted id={} http_status={}",
                event.display_id(),
                status.as_u16()
            ),
            Ok(status) => tracing::warn!(
                "visualizer status=rejected id={} http_status={}",
                event.display_id(),
                status.as_u16()
            ),
            Err(e) => tracing::warn!("visualizer error id={} err={e}", event.display_id()),
        }
    }
}

/// Used when the relay is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisualizer;

#[async_trait]
impl VisualizationSink for NoopVisualizer {
    async fn notify(&self, _doc: &Document) {}
}

/// Build the sink described by `config`. A client that cannot be built
/// disables the relay rather than the handler.
pub fn sink_from_config(config: &VisualizerConfig) -> Arc<dyn VisualizationSink> {
    if !config.enabled {
        tracing::info!("Visualization relay disabled");
        return Arc::new(NoopVisualizer);
    }
    match HttpVisualizer::new(config) {
        Ok(visualizer) => {
            tracing::info!(
                "Visualization relay → {} (timeout {}s)",
                visualizer.endpoint(),
                config.timeout_secs
            );
            Arc::new(visualizer)
        }
        Err(e) => {
            tracing::warn!("Visualization relay not available: {e}");
            Arc::new(NoopVisualizer)
        }
    }
}
