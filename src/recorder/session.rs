//! Capture session
//!
//! The live binding between an acquired capture stream, its encoder, and
//! the chunk sequence for one recording attempt. A session exists from
//! `start` until the recording is discarded (or replaced by a fresh
//! `start`); its tracks are released exactly once, either at finalize or
//! on a mode switch while active.

use crate::capture::{CaptureStream, RgbaFrame};
use crate::encoder::ChunkEncoder;
use crate::recorder::RecordingMode;
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::AbortHandle;

/// Shared, append-only chunk sequence for one session
pub type ChunkSequence = Arc<ParkingMutex<Vec<Vec<u8>>>>;

pub struct CaptureSession {
    mode: RecordingMode,
    stream: CaptureStream,
    encoder: Arc<dyn ChunkEncoder>,
    chunks: ChunkSequence,
    visualizer: Option<AbortHandle>,
    started_at: Instant,
}

impl CaptureSession {
    pub fn new(
        mode: RecordingMode,
        stream: CaptureStream,
        encoder: Arc<dyn ChunkEncoder>,
        chunks: ChunkSequence,
        visualizer: Option<AbortHandle>,
    ) -> Self {
        Self {
            mode,
            stream,
            encoder,
            chunks,
            visualizer,
            started_at: Instant::now(),
        }
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn encoder(&self) -> &Arc<dyn ChunkEncoder> {
        &self.encoder
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.chunks.lock().iter().map(|c| c.len() as u64).sum()
    }

    /// Concatenate all chunks, preserving capture order
    pub fn assemble(&self) -> Vec<u8> {
        let chunks = self.chunks.lock();
        let mut blob = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in chunks.iter() {
            blob.extend_from_slice(chunk);
        }
        blob
    }

    /// Release the stream's tracks (idempotent per track)
    pub fn stop_tracks(&self) {
        self.stream.stop_tracks();
    }

    pub fn tracks_stopped(&self) -> bool {
        self.stream.all_stopped()
    }

    /// Most recent camera frame, if this is a video session
    pub fn latest_frame(&self) -> Option<RgbaFrame> {
        self.stream.latest_frame()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stream.stop_tracks();
        if let Some(visualizer) = self.visualizer.take() {
            visualizer.abort();
        }
    }
}
