//! Per-region mutual exclusion
//!
//! One async mutex per `(recording id, region index)`, created on first use and
//! kept for the life of the service. Regions of different indices or different
//! recordings never share a mutex. A fixed pool of mutexes keyed by a hash of the
//! pair would bound memory at the cost of false contention between unrelated
//! regions; the region count of a library is small enough not to need it.

use crate::error::LockTimeout;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Roughly 50x the expected read-transform-write time of one region
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

type RegionKey = (String, usize);

/// Registry of region locks. Cheap to clone; clones share the same locks.
#[derive(Clone, Default)]
pub struct RegionLocks {
    locks: Arc<Mutex<HashMap<RegionKey, Arc<AsyncMutex<()>>>>>,
}

impl RegionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, recording_id: &str, region_index: usize) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry((recording_id.to_string(), region_index))
            .or_default()
            .clone()
    }

    /// Wait up to `timeout` for exclusive access to one region
    pub async fn acquire(
        &self,
        recording_id: &str,
        region_index: usize,
        timeout: Duration,
    ) -> Result<RegionGuard, LockTimeout> {
        let lock = self.lock_for(recording_id, region_index);

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!("Locked {} region {}", recording_id, region_index);
                Ok(RegionGuard {
                    recording_id: recording_id.to_string(),
                    region_index,
                    _guard: guard,
                })
            }
            Err(_) => Err(LockTimeout {
                recording_id: recording_id.to_string(),
                region_index,
            }),
        }
    }

    /// Whether some holder currently has the region locked
    pub fn is_locked(&self, recording_id: &str, region_index: usize) -> bool {
        let locks = self.locks.lock();
        locks
            .get(&(recording_id.to_string(), region_index))
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Number of regions that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive hold on one region. Dropping it releases the lock.
pub struct RegionGuard {
    recording_id: String,
    region_index: usize,
    _guard: OwnedMutexGuard<()>,
}

impl RegionGuard {
    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn region_index(&self) -> usize {
        self.region_index
    }

    pub fn release(self) {
        debug!("Released {} region {}", self.recording_id, self.region_index);
    }
}

impl std::fmt::Debug for RegionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionGuard")
            .field("recording_id", &self.recording_id)
            .field("region_index", &self.region_index)
            .finish()
    }
}
