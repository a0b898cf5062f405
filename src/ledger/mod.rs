//! Play ledger
//!
//! Durable per-region play counts and recording-level aggregates:
//! - `RecordingRecord` is the persisted shape (one JSON file per recording)
//! - `RecordStore` abstracts where records live
//! - `PlayLedger` serializes persistence per recording and serves snapshots

mod ledger;
mod record;
mod store;

pub use ledger::PlayLedger;
pub use record::{RecordingRecord, RegionStats};
pub use store::{JsonFileStore, RecordStore};
