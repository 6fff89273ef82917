//! # CFP Core
//!
//! Domain logic for the change-feed custom handler.
//!
//! ## Pipeline
//! ```text
//! raw body ──▶ envelope::decode ──▶ [Document]
//!                                      │
//!                        ┌─────────────┴─────────────┐
//!                        ▼                           ▼
//!              classify::classify           relay::VisualizationSink
//!              (pass / fail / neutral)      (best-effort POST)
//!                        │
//!                        ▼
//!              response::InvocationResponse + Disposition
//!              (200 = done, 500 = host retries the batch)
//! ```

pub mod classify;
pub mod config;
pub mod envelope;
pub mod error;
pub mod processor;
pub mod relay;
pub mod response;

pub use classify::{Classification, Outcome, Verdict};
pub use config::{HandlerConfig, VisualizerConfig};
pub use envelope::{DecodedBatch, Document};
pub use error::{CfpError, Result};
pub use processor::{ChangeFeedProcessor, ProcessedBatch};
pub use relay::{HttpVisualizer, NoopVisualizer, VisualizationEvent, VisualizationSink};
pub use response::{Disposition, InvocationResponse};
