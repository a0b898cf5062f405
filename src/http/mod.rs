//! HTTP API for listeners and the listing UI
//!
//! - GET / - Service status
//! - GET /health - Health check
//! - GET /tracks - All recordings with aggregate degradation
//! - GET /stats/:filename - Per-region play counts
//! - GET /stream/:filename?start=<secs> - Degrading audio stream

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, ServiceInfo};
