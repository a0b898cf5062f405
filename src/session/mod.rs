//! Listener session orchestration
//!
//! This module ties storage, degradation, region locks and the play ledger
//! into one pipeline per listener:
//! - `StreamService` validates requests and opens sessions
//! - `ListenerSession` walks regions, wearing each one as it is delivered
//! - `SessionReport` and the listing/stats types report the results

mod config;
mod service;
mod session;
mod stats;

pub use config::StreamConfig;
pub use service::StreamService;
pub use session::ListenerSession;
pub use stats::{RecordingStats, RecordingSummary, SessionReport, SessionState};
