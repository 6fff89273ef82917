//! HTTP server implementation using Axum.

use axum::{Router, routing::any};
use cfp_core::config::HandlerConfig;
use cfp_core::processor::ChangeFeedProcessor;
use cfp_core::relay::{self, VisualizationSink};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::routes;

/// Shared state for the handler server. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub processor: ChangeFeedProcessor,
}

impl AppState {
    pub fn new(config: &HandlerConfig, sink: Arc<dyn VisualizationSink>) -> Self {
        Self {
            processor: ChangeFeedProcessor::new(sink, config.verbose),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let mut router = Router::new().route(routes::SIMPLE_HTTP_PATH, any(routes::simple_http_trigger));

    // The host has used several naming schemes for function paths; register them all.
    for path in routes::CHANGE_FEED_PATHS {
        router = router.route(path, any(routes::cosmos_change_trigger));
    }
    for path in routes::TIMER_PATHS {
        router = router.route(path, any(routes::timer_trigger));
    }

    router
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: HandlerConfig) -> anyhow::Result<()> {
    let addr = config.listen_addr()?;
    tracing::info!("{}: {:?}", cfp_core::config::PORT_ENV, config.port);
    if !config.verbose {
        tracing::info!("🔇 Raw payload logging off");
    }

    let sink = relay::sink_from_config(&config.visualizer);
    let app = build_router(AppState::new(&config, sink));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Custom handler listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
