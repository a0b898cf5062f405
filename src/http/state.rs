use crate::session::StreamService;
use std::sync::Arc;

/// Static facts reported by the status endpoint
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub audio_dir: String,
    pub metadata_dir: String,
    pub decay_rate: f64,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Streaming core (sessions, listing, stats)
    pub service: StreamService,

    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(service: StreamService, info: ServiceInfo) -> Self {
        Self {
            service,
            info: Arc::new(info),
        }
    }
}
