//! RoasLens API Server module
//!
//! HTTP REST API over the analysis pipeline.
//! Run with `roaslens-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
