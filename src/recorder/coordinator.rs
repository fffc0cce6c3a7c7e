//! Recording coordinator
//!
//! Drives the capture-to-chunk pipeline and its finite state machine:
//!
//! ```text
//! Idle --start--> Recording --pause--> Paused --pause--> Recording
//! Recording|Paused --stop--> Stopped
//! Stopped --start--> Recording (fresh session)
//! Stopped --discard--> Idle
//! Stopped --download--> Stopped --(auto-discard after delay)--> Idle
//! ```
//!
//! Every transition is guarded by the current state; redundant stop and
//! pause calls are no-ops. Mode switches release the held capture stream
//! in any state without moving the state machine.

use crate::capture::{CaptureTrack, MediaSource, RgbaFrame};
use crate::encoder::{
    ChunkCallback, ChunkEncoder, EncoderFactory, EncoderSettings, EncoderState, FfmpegEncoder,
    FinalizeCallback,
};
use crate::recorder::session::{CaptureSession, ChunkSequence};
use crate::recorder::state::{
    format_hms, DownloadedRecording, Notification, RecordingMode, RecordingState,
};
use crate::recorder::{RecorderError, RecorderResult};
use crate::visualizer::{self, SpectrumTap};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex as ParkingMutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// How long after a download the recording is discarded automatically
pub const DOWNLOAD_DISCARD_DELAY: Duration = Duration::from_secs(1);

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Recording started
    Started { mode: RecordingMode },
    /// Recording stopped
    Stopped,
    /// Recording paused
    Paused,
    /// Recording resumed
    Resumed,
    /// User-facing notification
    Notification(Notification),
    /// Elapsed-time tick, formatted `HH:MM:SS`
    Tick { elapsed: String },
    /// One visualizer frame of magnitude bins
    Visualizer { bins: Vec<u8> },
    /// A finalized recording is ready for playback
    PlaybackReady { path: PathBuf },
    /// The playback panel should be cleared
    PlaybackCleared,
}

/// Owns the recording state machine and the current capture session
pub struct RecorderCoordinator {
    /// Current recording state
    state: RecordingState,

    /// Currently selected capture mode
    mode: RecordingMode,

    /// Where capture streams come from
    source: Box<dyn MediaSource>,

    /// Creates an encoder per session
    make_encoder: EncoderFactory,

    /// The active session, if any
    session: Option<CaptureSession>,

    /// Directory for finalized preview files
    preview_dir: PathBuf,

    /// Path of the current preview file
    preview: Arc<ParkingMutex<Option<PathBuf>>>,

    /// Event broadcaster
    events: broadcast::Sender<RecorderEvent>,

    /// Elapsed-time ticker task
    ticker: Option<AbortHandle>,
}

impl RecorderCoordinator {
    /// Create a coordinator with explicit seams (used by tests)
    pub fn new(source: Box<dyn MediaSource>, make_encoder: EncoderFactory, preview_dir: PathBuf) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: RecordingState::Idle,
            mode: RecordingMode::Video,
            source,
            make_encoder,
            session: None,
            preview_dir,
            preview: Arc::new(ParkingMutex::new(None)),
            events,
            ticker: None,
        }
    }

    /// Create a coordinator bound to the real devices and FFmpeg
    pub fn with_devices(preview_dir: PathBuf) -> Self {
        let make_encoder: EncoderFactory = Box::new(|settings, on_chunk, on_finalize| {
            let encoder = FfmpegEncoder::spawn(settings, on_chunk, on_finalize)?;
            Ok(Arc::new(encoder) as Arc<dyn ChunkEncoder>)
        });
        Self::new(Box::new(crate::capture::DeviceMediaSource), make_encoder, preview_dir)
    }

    /// Subscribe to recorder events
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events.subscribe()
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Get the currently selected mode
    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    /// Number of chunks captured by the current session
    pub fn chunk_count(&self) -> usize {
        self.session.as_ref().map(|s| s.chunk_count()).unwrap_or(0)
    }

    /// Elapsed wall-clock time of the active recording
    pub fn elapsed(&self) -> Duration {
        match self.state {
            RecordingState::Recording | RecordingState::Paused => self
                .session
                .as_ref()
                .map(|s| s.started_at().elapsed())
                .unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        }
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(RecorderEvent::Notification(notification));
    }

    /// Start a new recording in the given mode
    ///
    /// Acquires a capture stream, creates an encoder bound to it, resets
    /// the chunk sequence, and begins the elapsed ticker (and, in audio
    /// mode, the visualizer feed). A rejected device acquisition leaves
    /// the state unchanged and surfaces an error notification.
    pub fn start(&mut self, mode: RecordingMode) -> RecorderResult<()> {
        match self.state {
            RecordingState::Idle | RecordingState::Stopped => {}
            _ => return Err(RecorderError::AlreadyRecording),
        }

        // A fresh session replaces any stopped one; its chunks are gone
        self.session = None;
        self.clear_preview();

        let stream = match self.source.open(mode.constraints()) {
            Ok(stream) => stream,
            Err(e) => {
                self.notify(Notification::error(format!(
                    "Error accessing media devices: {}",
                    e
                )));
                return Err(e.into());
            }
        };

        self.mode = mode;

        let (tap, viz) = if mode == RecordingMode::Audio {
            let tap = Arc::new(SpectrumTap::new());
            let handle = visualizer::spawn_feed(tap.clone(), self.events.clone());
            (Some(tap), Some(handle))
        } else {
            (None, None)
        };

        let chunks: ChunkSequence = Arc::new(ParkingMutex::new(Vec::new()));

        let on_chunk: ChunkCallback = {
            let chunks = chunks.clone();
            Box::new(move |data: Vec<u8>| {
                // Zero-length buffers are dropped, not appended
                if !data.is_empty() {
                    chunks.lock().push(data);
                }
            })
        };

        let on_finalize: FinalizeCallback = {
            let chunks = chunks.clone();
            let tracks: Vec<Arc<dyn CaptureTrack>> = stream.tracks().to_vec();
            let viz = viz.clone();
            let events = self.events.clone();
            let preview_dir = self.preview_dir.clone();
            let preview = self.preview.clone();
            Box::new(move || {
                for track in &tracks {
                    track.stop();
                }
                if let Some(handle) = viz {
                    handle.abort();
                }

                let blob = {
                    let chunks = chunks.lock();
                    let mut blob: Vec<u8> = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
                    for chunk in chunks.iter() {
                        blob.extend_from_slice(chunk);
                    }
                    blob
                };

                let path = preview_dir.join(format!("preview-{}.webm", Uuid::new_v4()));
                match std::fs::create_dir_all(&preview_dir)
                    .and_then(|_| std::fs::write(&path, &blob))
                {
                    Ok(()) => {
                        *preview.lock() = Some(path.clone());
                        let _ = events.send(RecorderEvent::PlaybackReady { path });
                    }
                    Err(e) => tracing::warn!("Failed to write preview file: {}", e),
                }

                tracing::info!("Recording finalized: {} bytes", blob.len());
            })
        };

        let settings = EncoderSettings::for_stream(&stream);
        let encoder = match (self.make_encoder)(settings, on_chunk, on_finalize) {
            Ok(encoder) => encoder,
            Err(e) => {
                stream.stop_tracks();
                if let Some(handle) = viz {
                    handle.abort();
                }
                self.notify(Notification::error(format!("Failed to start encoder: {}", e)));
                return Err(e.into());
            }
        };

        stream.attach(&encoder, tap.as_ref());

        self.session = Some(CaptureSession::new(mode, stream, encoder, chunks, viz));
        self.spawn_ticker();
        self.state = RecordingState::Recording;

        let _ = self.events.send(RecorderEvent::Started { mode });
        self.notify(Notification::success("Recording started"));
        tracing::info!("Recording started in {} mode", mode.as_str());
        Ok(())
    }

    /// Stop the active recording
    ///
    /// No-op when the encoder is already inactive. Blocks until the
    /// encoder has finalized, so the chunk sequence is complete on
    /// return.
    pub fn stop(&mut self) -> RecorderResult<()> {
        {
            let Some(session) = self.session.as_ref() else {
                return Ok(());
            };
            if session.encoder().state() == EncoderState::Inactive {
                return Ok(());
            }
            session.encoder().stop()?;
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let _ = self.events.send(RecorderEvent::Tick {
            elapsed: "00:00:00".to_string(),
        });

        self.state = RecordingState::Stopped;
        let _ = self.events.send(RecorderEvent::Stopped);
        self.notify(Notification::info("Recording stopped"));

        if let Some(session) = self.session.as_ref() {
            tracing::info!(
                "Recording stopped: {} chunks, {} bytes",
                session.chunk_count(),
                session.total_bytes()
            );
        }
        Ok(())
    }

    /// Toggle between recording and paused
    ///
    /// No-op in any other state.
    pub fn toggle_pause(&mut self) {
        match self.state {
            RecordingState::Recording => {
                if let Some(session) = self.session.as_ref() {
                    session.encoder().pause();
                }
                self.state = RecordingState::Paused;
                let _ = self.events.send(RecorderEvent::Paused);
                self.notify(Notification::info("Recording paused"));
            }
            RecordingState::Paused => {
                if let Some(session) = self.session.as_ref() {
                    session.encoder().resume();
                }
                self.state = RecordingState::Recording;
                let _ = self.events.send(RecorderEvent::Resumed);
                self.notify(Notification::info("Recording resumed"));
            }
            _ => {}
        }
    }

    /// Assemble the chunk sequence and write it to `dest_dir`
    ///
    /// Returns `Ok(None)` (with a warning notification) when there is
    /// nothing to download.
    pub fn download(&mut self, dest_dir: &Path) -> RecorderResult<Option<DownloadedRecording>> {
        let Some(session) = self.session.as_ref() else {
            self.notify(Notification::warning("No recording to download"));
            return Ok(None);
        };
        if session.chunk_count() == 0 {
            self.notify(Notification::warning("No recording to download"));
            return Ok(None);
        }

        let blob = session.assemble();
        let mode = session.mode();

        std::fs::create_dir_all(dest_dir)?;
        let filename = download_filename(mode, Utc::now());
        let path = dest_dir.join(&filename);
        std::fs::write(&path, &blob)?;

        tracing::info!("Recording saved to {:?} ({} bytes)", path, blob.len());
        self.notify(Notification::success("Recording downloaded successfully!"));

        Ok(Some(DownloadedRecording {
            path,
            size_bytes: blob.len() as u64,
            mode,
        }))
    }

    /// Drop the stopped recording and return to idle
    ///
    /// No-op unless the state is `Stopped`; an in-progress recording is
    /// never discarded.
    pub fn discard(&mut self) {
        if self.state != RecordingState::Stopped {
            return;
        }

        self.session = None;
        self.clear_preview();

        let _ = self.events.send(RecorderEvent::PlaybackCleared);
        self.notify(Notification::info("Recording discarded"));
        self.state = RecordingState::Idle;
    }

    /// Select a capture mode
    ///
    /// If a capture stream is currently held its tracks are stopped
    /// immediately, releasing device access; the recording state itself
    /// does not change.
    pub fn set_mode(&mut self, mode: RecordingMode) {
        self.mode = mode;
        if let Some(session) = self.session.as_ref() {
            session.stop_tracks();
            tracing::info!("Mode switched to {}; released capture devices", mode.as_str());
        }
    }

    /// Most recent camera frame of the active session, if any
    pub fn snapshot(&self) -> Option<RgbaFrame> {
        self.session.as_ref().and_then(|s| s.latest_frame())
    }

    fn spawn_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        let events = self.events.clone();
        let started = Instant::now();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; skip it so ticks land
            // on whole elapsed seconds.
            interval.tick().await;
            loop {
                interval.tick().await;
                let _ = events.send(RecorderEvent::Tick {
                    elapsed: format_hms(started.elapsed()),
                });
            }
        });
        self.ticker = Some(task.abort_handle());
    }

    fn clear_preview(&mut self) {
        if let Some(path) = self.preview.lock().take() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!("Failed to remove preview file {:?}: {}", path, e);
            }
        }
    }
}

impl Drop for RecorderCoordinator {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Build the download filename for a recording
///
/// Colons and periods in the timestamp are replaced with hyphens so the
/// name is valid on every filesystem.
pub fn download_filename(mode: RecordingMode, timestamp: DateTime<Utc>) -> String {
    let sanitized = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("recording_{}_{}.webm", mode.as_str(), sanitized)
}

/// Discard the stopped recording after `delay`
///
/// Re-checks the state before acting so a recording started during the
/// delay is never destroyed.
pub async fn discard_after_delay(
    coordinator: Arc<tokio::sync::Mutex<RecorderCoordinator>>,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;
    let mut guard = coordinator.lock().await;
    if guard.state() == RecordingState::Stopped {
        guard.discard();
    }
}

/// Download the recording, then discard it after `delay`
///
/// The delayed discard is skipped when nothing was downloaded.
pub async fn download_then_discard(
    coordinator: Arc<tokio::sync::Mutex<RecorderCoordinator>>,
    dest_dir: PathBuf,
    delay: Duration,
) -> RecorderResult<Option<DownloadedRecording>> {
    let downloaded = { coordinator.lock().await.download(&dest_dir)? };

    if downloaded.is_some() {
        discard_after_delay(coordinator, delay).await;
    }

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        AudioParams, CaptureError, CaptureResult, CaptureStream, StreamConstraints, TrackKind,
        VideoParams,
    };
    use crate::encoder::EncoderResult;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    struct MockEncoder {
        state: ParkingMutex<EncoderState>,
        on_chunk: ParkingMutex<Option<ChunkCallback>>,
        on_finalize: ParkingMutex<Option<FinalizeCallback>>,
    }

    impl MockEncoder {
        fn emit(&self, data: Vec<u8>) {
            if let Some(on_chunk) = self.on_chunk.lock().as_mut() {
                on_chunk(data);
            }
        }
    }

    impl ChunkEncoder for MockEncoder {
        fn state(&self) -> EncoderState {
            *self.state.lock()
        }

        fn write_audio(&self, _data: &[u8]) -> bool {
            self.state() == EncoderState::Recording
        }

        fn write_video(&self, _data: &[u8]) -> bool {
            self.state() == EncoderState::Recording
        }

        fn pause(&self) {
            let mut state = self.state.lock();
            if *state == EncoderState::Recording {
                *state = EncoderState::Paused;
            }
        }

        fn resume(&self) {
            let mut state = self.state.lock();
            if *state == EncoderState::Paused {
                *state = EncoderState::Recording;
            }
        }

        fn stop(&self) -> EncoderResult<()> {
            {
                let mut state = self.state.lock();
                if *state == EncoderState::Inactive {
                    return Ok(());
                }
                *state = EncoderState::Inactive;
            }
            if let Some(on_finalize) = self.on_finalize.lock().take() {
                on_finalize();
            }
            Ok(())
        }
    }

    struct FakeTrack {
        kind: TrackKind,
        stopped: AtomicBool,
    }

    impl FakeTrack {
        fn new(kind: TrackKind) -> Self {
            Self {
                kind,
                stopped: AtomicBool::new(false),
            }
        }
    }

    impl CaptureTrack for FakeTrack {
        fn kind(&self) -> TrackKind {
            self.kind
        }

        fn label(&self) -> String {
            "fake".to_string()
        }

        fn attach(
            &self,
            _encoder: Arc<dyn ChunkEncoder>,
            _tap: Option<Arc<crate::visualizer::SpectrumTap>>,
        ) {
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }

        fn is_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    struct FakeSource {
        fail: bool,
        tracks: Arc<ParkingMutex<Vec<Arc<FakeTrack>>>>,
    }

    impl MediaSource for FakeSource {
        fn open(&self, constraints: StreamConstraints) -> CaptureResult<CaptureStream> {
            if self.fail {
                return Err(CaptureError::PermissionDenied(
                    "Permission dismissed".to_string(),
                ));
            }

            let mut tracks: Vec<Arc<dyn CaptureTrack>> = Vec::new();
            let mut video_params = None;

            if constraints.video {
                let video = Arc::new(FakeTrack::new(TrackKind::Video));
                self.tracks.lock().push(video.clone());
                tracks.push(video);
                video_params = Some(VideoParams {
                    width: 1280,
                    height: 720,
                    fps: 30,
                });
            }

            let audio = Arc::new(FakeTrack::new(TrackKind::Audio));
            self.tracks.lock().push(audio.clone());
            tracks.push(audio);

            Ok(CaptureStream::new(
                tracks,
                Some(AudioParams {
                    sample_rate: 48000,
                    channels: 1,
                }),
                video_params,
            ))
        }
    }

    type Encoders = Arc<ParkingMutex<Vec<Arc<MockEncoder>>>>;
    type Tracks = Arc<ParkingMutex<Vec<Arc<FakeTrack>>>>;

    fn test_coordinator(fail: bool, preview_dir: &Path) -> (RecorderCoordinator, Encoders, Tracks) {
        let encoders: Encoders = Arc::new(ParkingMutex::new(Vec::new()));
        let tracks: Tracks = Arc::new(ParkingMutex::new(Vec::new()));

        let make_encoder: EncoderFactory = {
            let encoders = encoders.clone();
            Box::new(move |_settings, on_chunk, on_finalize| {
                let encoder = Arc::new(MockEncoder {
                    state: ParkingMutex::new(EncoderState::Recording),
                    on_chunk: ParkingMutex::new(Some(on_chunk)),
                    on_finalize: ParkingMutex::new(Some(on_finalize)),
                });
                encoders.lock().push(encoder.clone());
                Ok(encoder as Arc<dyn ChunkEncoder>)
            })
        };

        let source = FakeSource {
            fail,
            tracks: tracks.clone(),
        };

        (
            RecorderCoordinator::new(Box::new(source), make_encoder, preview_dir.to_path_buf()),
            encoders,
            tracks,
        )
    }

    fn drain_notifications(rx: &mut broadcast::Receiver<RecorderEvent>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RecorderEvent::Notification(n) = event {
                out.push(n);
            }
        }
        out
    }

    fn drain_events(rx: &mut broadcast::Receiver<RecorderEvent>) -> Vec<RecorderEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn chunks_concatenate_in_capture_order() {
        let dir = tempdir().unwrap();
        let (mut coordinator, encoders, _) = test_coordinator(false, &dir.path().join("preview"));

        coordinator.start(RecordingMode::Audio).unwrap();
        let encoder = encoders.lock().last().unwrap().clone();

        encoder.emit(vec![0xAA; 1000]);
        encoder.emit(vec![]);
        encoder.emit(vec![0xBB; 2000]);

        coordinator.stop().unwrap();
        assert_eq!(coordinator.state(), RecordingState::Stopped);

        // The zero-size chunk was dropped, not appended
        assert_eq!(coordinator.chunk_count(), 2);

        let downloads = dir.path().join("downloads");
        let downloaded = coordinator.download(&downloads).unwrap().unwrap();
        assert_eq!(downloaded.size_bytes, 3000);

        let blob = std::fs::read(&downloaded.path).unwrap();
        assert_eq!(blob.len(), 3000);
        assert!(blob[..1000].iter().all(|&b| b == 0xAA));
        assert!(blob[1000..].iter().all(|&b| b == 0xBB));
    }

    #[tokio::test]
    async fn start_while_recording_is_rejected() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, _) = test_coordinator(false, dir.path());

        coordinator.start(RecordingMode::Video).unwrap();
        assert!(matches!(
            coordinator.start(RecordingMode::Video),
            Err(RecorderError::AlreadyRecording)
        ));
    }

    #[tokio::test]
    async fn stop_is_noop_when_already_finalized() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, _) = test_coordinator(false, dir.path());

        // Stop without a session does nothing
        coordinator.stop().unwrap();
        assert_eq!(coordinator.state(), RecordingState::Idle);

        coordinator.start(RecordingMode::Video).unwrap();
        coordinator.stop().unwrap();

        let mut rx = coordinator.subscribe();
        coordinator.stop().unwrap();
        assert_eq!(coordinator.state(), RecordingState::Stopped);
        assert!(drain_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn pause_has_no_effect_outside_recording_or_paused() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, _) = test_coordinator(false, dir.path());

        let mut rx = coordinator.subscribe();
        coordinator.toggle_pause();
        assert_eq!(coordinator.state(), RecordingState::Idle);
        assert!(drain_events(&mut rx).is_empty());

        coordinator.start(RecordingMode::Video).unwrap();
        coordinator.stop().unwrap();

        let mut rx = coordinator.subscribe();
        coordinator.toggle_pause();
        assert_eq!(coordinator.state(), RecordingState::Stopped);
        assert!(drain_notifications(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn pause_toggle_emits_one_notification_per_call() {
        let dir = tempdir().unwrap();
        let (mut coordinator, encoders, _) = test_coordinator(false, dir.path());

        coordinator.start(RecordingMode::Video).unwrap();
        let encoder = encoders.lock().last().unwrap().clone();

        let mut rx = coordinator.subscribe();
        coordinator.toggle_pause();
        assert_eq!(coordinator.state(), RecordingState::Paused);
        assert_eq!(encoder.state(), EncoderState::Paused);
        let notifications = drain_notifications(&mut rx);
        assert_eq!(notifications, vec![Notification::info("Recording paused")]);

        coordinator.toggle_pause();
        assert_eq!(coordinator.state(), RecordingState::Recording);
        assert_eq!(encoder.state(), EncoderState::Recording);
        let notifications = drain_notifications(&mut rx);
        assert_eq!(notifications, vec![Notification::info("Recording resumed")]);

        // Stopping from paused works too
        coordinator.toggle_pause();
        coordinator.stop().unwrap();
        assert_eq!(coordinator.state(), RecordingState::Stopped);
    }

    #[tokio::test]
    async fn finalize_stops_tracks_and_publishes_playback() {
        let dir = tempdir().unwrap();
        let preview_dir = dir.path().join("preview");
        let (mut coordinator, encoders, tracks) = test_coordinator(false, &preview_dir);

        coordinator.start(RecordingMode::Video).unwrap();
        let encoder = encoders.lock().last().unwrap().clone();
        encoder.emit(vec![0x42; 128]);

        let mut rx = coordinator.subscribe();
        coordinator.stop().unwrap();

        assert!(tracks.lock().iter().all(|t| t.is_stopped()));

        let events = drain_events(&mut rx);
        let playback = events.iter().find_map(|e| match e {
            RecorderEvent::PlaybackReady { path } => Some(path.clone()),
            _ => None,
        });
        let path = playback.expect("expected a PlaybackReady event");
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x42; 128]);

        // Elapsed display resets on stop
        assert!(events.iter().any(|e| matches!(
            e,
            RecorderEvent::Tick { elapsed } if elapsed == "00:00:00"
        )));
    }

    #[tokio::test]
    async fn discard_after_stop_clears_everything() {
        let dir = tempdir().unwrap();
        let preview_dir = dir.path().join("preview");
        let (mut coordinator, encoders, _) = test_coordinator(false, &preview_dir);

        coordinator.start(RecordingMode::Audio).unwrap();
        encoders.lock().last().unwrap().emit(vec![1, 2, 3]);
        coordinator.stop().unwrap();

        let mut rx = coordinator.subscribe();
        coordinator.discard();

        assert_eq!(coordinator.state(), RecordingState::Idle);
        assert_eq!(coordinator.chunk_count(), 0);
        let events = drain_events(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, RecorderEvent::PlaybackCleared)));

        // The preview file is gone
        let leftovers: Vec<_> = std::fs::read_dir(&preview_dir)
            .map(|entries| entries.collect())
            .unwrap_or_default();
        assert!(leftovers.is_empty());

        // A new session starts from an empty sequence
        coordinator.start(RecordingMode::Audio).unwrap();
        encoders.lock().last().unwrap().emit(vec![9]);
        assert_eq!(coordinator.chunk_count(), 1);
    }

    #[tokio::test]
    async fn discard_is_noop_while_recording() {
        let dir = tempdir().unwrap();
        let (mut coordinator, encoders, _) = test_coordinator(false, dir.path());

        coordinator.start(RecordingMode::Audio).unwrap();
        encoders.lock().last().unwrap().emit(vec![7; 10]);

        coordinator.discard();
        assert_eq!(coordinator.state(), RecordingState::Recording);
        assert_eq!(coordinator.chunk_count(), 1);
    }

    #[tokio::test]
    async fn download_with_no_chunks_warns_and_skips_auto_discard() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, _) = test_coordinator(false, &dir.path().join("preview"));

        coordinator.start(RecordingMode::Video).unwrap();
        coordinator.stop().unwrap();

        let mut rx = coordinator.subscribe();
        let coordinator = Arc::new(tokio::sync::Mutex::new(coordinator));
        let downloads = dir.path().join("downloads");

        let result =
            download_then_discard(coordinator.clone(), downloads.clone(), Duration::ZERO)
                .await
                .unwrap();
        assert!(result.is_none());

        let notifications = drain_notifications(&mut rx);
        assert_eq!(
            notifications,
            vec![Notification::warning("No recording to download")]
        );

        // No file was written and no auto-discard followed
        assert!(!downloads.exists());
        assert_eq!(coordinator.lock().await.state(), RecordingState::Stopped);
    }

    #[tokio::test]
    async fn download_then_discard_returns_to_idle() {
        let dir = tempdir().unwrap();
        let (mut coordinator, encoders, _) = test_coordinator(false, &dir.path().join("preview"));

        coordinator.start(RecordingMode::Video).unwrap();
        encoders.lock().last().unwrap().emit(vec![5; 512]);
        coordinator.stop().unwrap();

        let coordinator = Arc::new(tokio::sync::Mutex::new(coordinator));
        let downloads = dir.path().join("downloads");

        let downloaded = download_then_discard(
            coordinator.clone(),
            downloads.clone(),
            Duration::from_millis(10),
        )
        .await
        .unwrap()
        .expect("expected a downloaded recording");

        assert!(downloaded.path.exists());
        assert!(downloaded
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("recording_video_"));
        assert_eq!(downloaded.size_bytes, 512);

        let guard = coordinator.lock().await;
        assert_eq!(guard.state(), RecordingState::Idle);
        assert_eq!(guard.chunk_count(), 0);
    }

    #[tokio::test]
    async fn mode_toggle_releases_tracks_without_state_change() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, tracks) = test_coordinator(false, dir.path());

        coordinator.start(RecordingMode::Video).unwrap();
        assert!(tracks.lock().iter().all(|t| !t.is_stopped()));

        coordinator.set_mode(RecordingMode::Audio);

        assert!(tracks.lock().iter().all(|t| t.is_stopped()));
        assert_eq!(coordinator.state(), RecordingState::Recording);
        assert_eq!(coordinator.mode(), RecordingMode::Audio);
    }

    #[tokio::test]
    async fn failed_acquisition_stays_idle_with_error_notification() {
        let dir = tempdir().unwrap();
        let (mut coordinator, _, _) = test_coordinator(true, dir.path());

        let mut rx = coordinator.subscribe();
        let result = coordinator.start(RecordingMode::Audio);

        assert!(matches!(result, Err(RecorderError::Capture(_))));
        assert_eq!(coordinator.state(), RecordingState::Idle);

        let notifications = drain_notifications(&mut rx);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, crate::recorder::Severity::Error);
        assert!(notifications[0].message.contains("Permission dismissed"));
    }

    #[test]
    fn download_filename_sanitizes_timestamp() {
        let timestamp = DateTime::parse_from_rfc3339("2026-08-06T12:30:45.123Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            download_filename(RecordingMode::Video, timestamp),
            "recording_video_2026-08-06T12-30-45-123Z.webm"
        );
        assert_eq!(
            download_filename(RecordingMode::Audio, timestamp),
            "recording_audio_2026-08-06T12-30-45-123Z.webm"
        );
    }
}
