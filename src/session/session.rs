use super::config::StreamConfig;
use super::stats::{SessionReport, SessionState};
use crate::audio::{degrade_in_place, RegionFile, SampleBuffer};
use crate::error::StreamError;
use crate::ledger::PlayLedger;
use crate::locks::{RegionGuard, RegionLocks};
use bytes::Bytes;
use futures::Stream;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How a single region was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionPass {
    Degraded,
    Unrecorded,
    PassedThrough,
    Silenced,
}

struct RegionChunk {
    bytes: Bytes,
    pass: RegionPass,
}

/// Result of the read-transform-write step run under a region lock
enum Rewrite {
    Written {
        buffer: SampleBuffer,
        original: SampleBuffer,
        dropped: usize,
    },
    WriteFailed { original: SampleBuffer, error: StreamError },
    ReadFailed(StreamError),
}

/// One listener's pass over a recording, from its start region to the end.
///
/// Pull-driven: every `next_chunk` call performs at most one region's
/// lock → read → transform → write → count cycle, so content is never worn
/// faster than the listener consumes it.
pub struct ListenerSession {
    id: Uuid,
    recording_id: String,
    file: Arc<RegionFile>,
    locks: RegionLocks,
    ledger: Arc<PlayLedger>,
    config: StreamConfig,
    cancel: CancellationToken,
    state: SessionState,
    first_region: usize,
    next_region: usize,
    region_count: usize,
    report: SessionReport,
    started_at: Instant,
}

impl ListenerSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        recording_id: String,
        file: Arc<RegionFile>,
        locks: RegionLocks,
        ledger: Arc<PlayLedger>,
        config: StreamConfig,
        cancel: CancellationToken,
        first_region: usize,
        region_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recording_id,
            file,
            locks,
            ledger,
            config,
            cancel,
            state: SessionState::Start,
            first_region,
            next_region: first_region,
            region_count,
            report: SessionReport::default(),
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn first_region(&self) -> usize {
        self.first_region
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Token that stops this session at its next safe point
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next piece of the byte stream, `None` once completed or aborted.
    ///
    /// The container header comes first, and only for sessions that start at
    /// region 0; every later chunk is exactly one region of PCM payload.
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        match self.state {
            SessionState::Completed | SessionState::Aborted => return None,
            SessionState::Start => {
                self.state = SessionState::Streaming;
                info!(
                    session = %self.id,
                    "Streaming {} from region {} of {}",
                    self.recording_id, self.first_region, self.region_count
                );
                if self.first_region == 0 {
                    let header = self.file.header();
                    self.report.bytes_emitted += header.len() as u64;
                    return Some(header);
                }
            }
            SessionState::Streaming => {}
        }

        if self.cancel.is_cancelled() {
            self.abort("cancelled");
            return None;
        }

        if self.next_region >= self.region_count {
            self.complete();
            return None;
        }

        let index = self.next_region;
        let chunk = match self.stream_region(index).await {
            Some(chunk) => chunk,
            None => {
                self.abort("cancelled while waiting for a region lock");
                return None;
            }
        };

        match chunk.pass {
            RegionPass::Degraded => self.report.regions_degraded += 1,
            RegionPass::Unrecorded => self.report.regions_unrecorded += 1,
            RegionPass::PassedThrough => self.report.regions_passed_through += 1,
            RegionPass::Silenced => self.report.regions_silenced += 1,
        }
        self.report.regions_visited.push(index);
        self.report.bytes_emitted += chunk.bytes.len() as u64;
        self.next_region += 1;

        Some(chunk.bytes)
    }

    /// Drain the whole session, discarding the bytes
    pub async fn run_to_end(mut self) -> SessionReport {
        while self.next_chunk().await.is_some() {}
        self.report.clone()
    }

    /// Adapt the session into a byte stream for an HTTP body.
    ///
    /// Dropping the stream (listener disconnect) aborts the session; a region
    /// already inside its critical section still finishes and unlocks.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        futures::stream::unfold(self, |mut session| async move {
            session
                .next_chunk()
                .await
                .map(|chunk| (Ok(chunk), session))
        })
    }

    /// Produce one region, or `None` if cancelled before its lock was granted
    async fn stream_region(&self, index: usize) -> Option<RegionChunk> {
        let acquired = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            res = self.locks.acquire(&self.recording_id, index, self.config.lock_timeout) => res,
        };

        let chunk = match acquired {
            Ok(guard) => {
                // Owned task: the critical section completes even if this
                // session is dropped while awaiting it
                let task = tokio::spawn(degrade_region(
                    Arc::clone(&self.file),
                    Arc::clone(&self.ledger),
                    self.recording_id.clone(),
                    index,
                    self.config.decay_rate,
                    guard,
                    self.id,
                ));
                match task.await {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!(session = %self.id, "Region {} task failed: {}", index, e);
                        silent_chunk(&self.file, index)
                    }
                }
            }
            Err(timeout) => {
                warn!(session = %self.id, "{}, streaming without degradation", timeout);
                passthrough_region(Arc::clone(&self.file), index, self.id).await
            }
        };

        Some(chunk)
    }

    fn complete(&mut self) {
        self.state = SessionState::Completed;
        info!(
            session = %self.id,
            "Completed {}: {} regions ({} degraded, {} passed through, {} silenced), {} bytes in {:.1}s",
            self.recording_id,
            self.report.regions_visited.len(),
            self.report.regions_degraded,
            self.report.regions_passed_through,
            self.report.regions_silenced,
            self.report.bytes_emitted,
            self.started_at.elapsed().as_secs_f64()
        );
    }

    fn abort(&mut self, reason: &str) {
        self.state = SessionState::Aborted;
        info!(
            session = %self.id,
            "Aborted {} after {} regions: {}",
            self.recording_id,
            self.report.regions_visited.len(),
            reason
        );
    }
}

impl Drop for ListenerSession {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Start | SessionState::Streaming) {
            self.abort("listener disconnected");
        }
    }
}

/// Critical section for one region; `guard` is held until the play is recorded
async fn degrade_region(
    file: Arc<RegionFile>,
    ledger: Arc<PlayLedger>,
    recording_id: String,
    index: usize,
    decay_rate: f64,
    guard: RegionGuard,
    session: Uuid,
) -> RegionChunk {
    // Dropout comes from the count before this pass; a virgin region plays clean
    let play_count = match ledger.play_count(&recording_id, index) {
        Ok(count) => count,
        Err(e) => {
            warn!(%session, "No play count for {} region {}: {}", recording_id, index, e);
            drop(guard);
            return passthrough_region(file, index, session).await;
        }
    };

    let rewrite = {
        let file = Arc::clone(&file);
        tokio::task::spawn_blocking(move || rewrite_region(&file, index, play_count, decay_rate))
            .await
            .unwrap_or_else(|e| Rewrite::ReadFailed(e.into()))
    };

    let chunk = match rewrite {
        Rewrite::Written {
            buffer,
            original,
            dropped,
        } => match ledger.increment_region_play(&recording_id, index).await {
            Ok(count) => {
                debug!(
                    %session,
                    "Region {} of {}: dropped {} of {} frames, play count now {}",
                    index,
                    recording_id,
                    dropped,
                    buffer.frame_count(),
                    count
                );
                RegionChunk {
                    bytes: buffer.into_bytes(),
                    pass: RegionPass::Degraded,
                }
            }
            Err(e) => {
                warn!(%session, "Play of {} region {} not recorded: {}", recording_id, index, e);
                // An unrecorded play must leave no wear behind
                restore_region(&file, index, original, buffer, session).await
            }
        },
        Rewrite::WriteFailed { original, error } => {
            error!(
                %session,
                "Could not write back {} region {}: {}", recording_id, index, error
            );
            RegionChunk {
                bytes: original.into_bytes(),
                pass: RegionPass::PassedThrough,
            }
        }
        Rewrite::ReadFailed(e) => {
            error!(%session, "Could not read {} region {}: {}", recording_id, index, e);
            silent_chunk(&file, index)
        }
    };

    guard.release();
    chunk
}

/// Read, transform in memory, then replace the region with one write
fn rewrite_region(file: &RegionFile, index: usize, play_count: u64, decay_rate: f64) -> Rewrite {
    let original = match file.read_region(index) {
        Ok(buffer) => buffer,
        Err(e) => return Rewrite::ReadFailed(e),
    };

    let mut buffer = original.clone();
    let dropped = degrade_in_place(&mut buffer, play_count, decay_rate, &mut rand::thread_rng());

    match file.write_region(index, &buffer) {
        Ok(()) => Rewrite::Written {
            buffer,
            original,
            dropped,
        },
        Err(error) => Rewrite::WriteFailed { original, error },
    }
}

/// Put a region's pre-pass bytes back after its play could not be recorded.
///
/// Must run under the region's lock. If the restore write fails too, the worn
/// bytes stay on disk and are what the listener hears.
async fn restore_region(
    file: &Arc<RegionFile>,
    index: usize,
    original: SampleBuffer,
    worn: SampleBuffer,
    session: Uuid,
) -> RegionChunk {
    let restored = {
        let file = Arc::clone(file);
        tokio::task::spawn_blocking(move || {
            let result = file.write_region(index, &original);
            (original, result)
        })
        .await
    };

    match restored {
        Ok((original, Ok(()))) => RegionChunk {
            bytes: original.into_bytes(),
            pass: RegionPass::PassedThrough,
        },
        Ok((_, Err(e))) => {
            error!(%session, "Could not restore region {} after unrecorded play: {}", index, e);
            RegionChunk {
                bytes: worn.into_bytes(),
                pass: RegionPass::Unrecorded,
            }
        }
        Err(e) => {
            error!(%session, "Restore of region {} failed: {}", index, e);
            RegionChunk {
                bytes: worn.into_bytes(),
                pass: RegionPass::Unrecorded,
            }
        }
    }
}

/// Current on-disk bytes of a region, untouched and uncounted
async fn passthrough_region(file: Arc<RegionFile>, index: usize, session: Uuid) -> RegionChunk {
    let read = {
        let file = Arc::clone(&file);
        tokio::task::spawn_blocking(move || file.read_region(index)).await
    };

    match read {
        Ok(Ok(buffer)) => RegionChunk {
            bytes: buffer.into_bytes(),
            pass: RegionPass::PassedThrough,
        },
        Ok(Err(e)) => {
            error!(%session, "Could not read region {} for passthrough: {}", index, e);
            silent_chunk(&file, index)
        }
        Err(e) => {
            error!(%session, "Passthrough read of region {} failed: {}", index, e);
            silent_chunk(&file, index)
        }
    }
}

/// Same-length silence, keeping the stream contiguous when a region is unreadable
fn silent_chunk(file: &RegionFile, index: usize) -> RegionChunk {
    let bytes = file
        .silent_region(index)
        .map(SampleBuffer::into_bytes)
        .unwrap_or_default();
    RegionChunk {
        bytes,
        pass: RegionPass::Silenced,
    }
}
