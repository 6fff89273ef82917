//! # CFP Gateway
//!
//! HTTP surface of the custom handler. The functions host forwards every trigger
//! invocation as an HTTP request; this crate maps the host's path conventions onto
//! the trigger handlers.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
