pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod ledger;
pub mod locks;
pub mod session;

pub use audio::{degrade, dropout_fraction, RegionFile, SampleBuffer, SampleLayout, ToneSpec};
pub use catalog::{Library, ScanReport};
pub use config::Config;
pub use error::{LockTimeout, StreamError};
pub use http::{create_router, AppState, ServiceInfo};
pub use ledger::{JsonFileStore, PlayLedger, RecordStore, RecordingRecord};
pub use locks::{RegionGuard, RegionLocks, DEFAULT_LOCK_TIMEOUT};
pub use session::{
    ListenerSession, RecordingStats, RecordingSummary, SessionReport, SessionState, StreamConfig,
    StreamService,
};
