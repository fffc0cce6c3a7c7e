//! FFmpeg-backed chunk encoder
//!
//! Spawns an FFmpeg child process that muxes raw capture input into a
//! streaming WebM container on stdout. A reader thread forwards stdout
//! chunks to the chunk callback and runs the finalize callback once the
//! process exits.
//!
//! Input plumbing: audio-only sessions pipe f32le samples through stdin.
//! Sessions with video pipe raw RGBA frames through stdin and, on Unix,
//! audio through a named pipe; platforms without named pipes record the
//! video track only.

use super::{ChunkCallback, ChunkEncoder, EncoderError, EncoderResult, EncoderSettings, EncoderState, FinalizeCallback};
use parking_lot::Mutex as ParkingMutex;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Size of stdout reads; one read becomes one emitted chunk
const CHUNK_READ_SIZE: usize = 64 * 1024;

/// Check that the ffmpeg binary is reachable
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

enum AudioInput {
    /// Audio bytes go to the child's stdin (audio-only session)
    Stdin,
    /// Audio bytes go to a named pipe (video session, Unix)
    Fifo(File),
    /// No audio path on this platform
    None,
}

pub struct FfmpegEncoder {
    state: ParkingMutex<EncoderState>,
    stdin: ParkingMutex<Option<ChildStdin>>,
    audio: ParkingMutex<AudioInput>,
    reader: ParkingMutex<Option<std::thread::JoinHandle<()>>>,
    chunk_count: Arc<AtomicU64>,
    bytes_out: Arc<AtomicU64>,
    // Keeps the fifo's directory alive for the encoder's lifetime
    _workdir: Option<tempfile::TempDir>,
}

impl FfmpegEncoder {
    /// Spawn FFmpeg for the given session parameters and begin encoding
    pub fn spawn(
        settings: EncoderSettings,
        on_chunk: ChunkCallback,
        on_finalize: FinalizeCallback,
    ) -> EncoderResult<Self> {
        let mut args: Vec<String> = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];

        let mut workdir = None;
        let mut fifo_path: Option<PathBuf> = None;

        match (settings.video, settings.audio) {
            (Some(video), audio) => {
                // Raw video frames on stdin
                args.extend([
                    "-f".to_string(),
                    "rawvideo".to_string(),
                    "-pix_fmt".to_string(),
                    "rgba".to_string(),
                    "-s".to_string(),
                    format!("{}x{}", video.width, video.height),
                    "-r".to_string(),
                    video.fps.to_string(),
                    "-i".to_string(),
                    "pipe:0".to_string(),
                ]);

                if let Some(audio) = audio {
                    #[cfg(unix)]
                    {
                        let dir = tempfile::tempdir()?;
                        let path = create_fifo(dir.path())?;
                        args.extend([
                            "-f".to_string(),
                            "f32le".to_string(),
                            "-ar".to_string(),
                            audio.sample_rate.to_string(),
                            "-ac".to_string(),
                            audio.channels.to_string(),
                            "-i".to_string(),
                            path.to_string_lossy().to_string(),
                        ]);
                        fifo_path = Some(path);
                        workdir = Some(dir);
                    }

                    #[cfg(not(unix))]
                    {
                        let _ = audio;
                        tracing::warn!(
                            "Named pipes unavailable on this platform; recording video only"
                        );
                    }
                }

                args.extend([
                    "-c:v".to_string(),
                    "libvpx-vp9".to_string(),
                    "-deadline".to_string(),
                    "realtime".to_string(),
                    "-cpu-used".to_string(),
                    "8".to_string(),
                    "-b:v".to_string(),
                    "0".to_string(),
                    "-crf".to_string(),
                    "30".to_string(),
                ]);

                if fifo_path.is_some() {
                    args.extend([
                        "-c:a".to_string(),
                        "libopus".to_string(),
                        "-b:a".to_string(),
                        "128k".to_string(),
                    ]);
                }
            }
            (None, Some(audio)) => {
                // Audio-only: samples on stdin, Opus in the same WebM container
                args.extend([
                    "-f".to_string(),
                    "f32le".to_string(),
                    "-ar".to_string(),
                    audio.sample_rate.to_string(),
                    "-ac".to_string(),
                    audio.channels.to_string(),
                    "-i".to_string(),
                    "pipe:0".to_string(),
                    "-c:a".to_string(),
                    "libopus".to_string(),
                    "-b:a".to_string(),
                    "128k".to_string(),
                ]);
            }
            (None, None) => {
                return Err(EncoderError::Spawn(
                    "Encoder needs at least one input track".to_string(),
                ));
            }
        }

        args.extend(["-f".to_string(), "webm".to_string(), "pipe:1".to_string()]);

        tracing::info!("Starting FFmpeg encoder: {:?}", args);

        let mut process = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EncoderError::Spawn(format!("Failed to start FFmpeg: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EncoderError::Pipe("Failed to capture FFmpeg stdin".to_string()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EncoderError::Pipe("Failed to capture FFmpeg stdout".to_string()))?;

        // Opening the fifo for writing blocks until FFmpeg opens the read
        // end, which it does while probing its inputs.
        let audio_input = match &fifo_path {
            Some(path) => AudioInput::Fifo(File::options().write(true).open(path)?),
            None => {
                if settings.video.is_none() {
                    AudioInput::Stdin
                } else {
                    AudioInput::None
                }
            }
        };

        let chunk_count = Arc::new(AtomicU64::new(0));
        let bytes_out = Arc::new(AtomicU64::new(0));

        let reader = spawn_reader(
            process,
            stdout,
            chunk_count.clone(),
            bytes_out.clone(),
            on_chunk,
            on_finalize,
        );

        Ok(Self {
            state: ParkingMutex::new(EncoderState::Recording),
            stdin: ParkingMutex::new(Some(stdin)),
            audio: ParkingMutex::new(audio_input),
            reader: ParkingMutex::new(Some(reader)),
            chunk_count,
            bytes_out,
            _workdir: workdir,
        })
    }

    /// Number of chunks emitted so far
    pub fn chunks_emitted(&self) -> u64 {
        self.chunk_count.load(Ordering::Relaxed)
    }

    /// Total container bytes emitted so far
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_out.load(Ordering::Relaxed)
    }
}

fn spawn_reader(
    mut process: Child,
    mut stdout: std::process::ChildStdout,
    chunk_count: Arc<AtomicU64>,
    bytes_out: Arc<AtomicU64>,
    mut on_chunk: ChunkCallback,
    on_finalize: FinalizeCallback,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buffer = vec![0u8; CHUNK_READ_SIZE];
        loop {
            match stdout.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    chunk_count.fetch_add(1, Ordering::Relaxed);
                    bytes_out.fetch_add(n as u64, Ordering::Relaxed);
                    on_chunk(buffer[..n].to_vec());
                }
                Err(e) => {
                    tracing::error!("Failed to read encoder output: {}", e);
                    break;
                }
            }
        }

        match process.wait() {
            Ok(status) if !status.success() => {
                let mut stderr = String::new();
                if let Some(mut pipe) = process.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                tracing::warn!("FFmpeg exited with {}: {}", status, stderr.trim());
            }
            Ok(_) => {}
            Err(e) => tracing::error!("Failed to wait for FFmpeg: {}", e),
        }

        tracing::info!(
            "FFmpeg encoder finished: {} chunks, {} bytes",
            chunk_count.load(Ordering::Relaxed),
            bytes_out.load(Ordering::Relaxed)
        );

        on_finalize();
    })
}

impl ChunkEncoder for FfmpegEncoder {
    fn state(&self) -> EncoderState {
        *self.state.lock()
    }

    fn write_audio(&self, data: &[u8]) -> bool {
        if self.state() != EncoderState::Recording {
            return false;
        }

        let mut guard = self.audio.lock();
        let result = match &mut *guard {
            AudioInput::Fifo(file) => file.write_all(data),
            AudioInput::Stdin => match &mut *self.stdin.lock() {
                Some(stdin) => stdin.write_all(data),
                None => return false,
            },
            AudioInput::None => return false,
        };

        if let Err(e) = result {
            tracing::warn!("Failed to write audio to encoder: {}", e);
            return false;
        }
        true
    }

    fn write_video(&self, data: &[u8]) -> bool {
        if self.state() != EncoderState::Recording {
            return false;
        }

        match &mut *self.stdin.lock() {
            Some(stdin) => {
                if let Err(e) = stdin.write_all(data) {
                    tracing::warn!("Failed to write frame to encoder: {}", e);
                    false
                } else {
                    true
                }
            }
            None => false,
        }
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

        // Closing the input pipes signals EOF; FFmpeg finalizes the
        // container and the reader thread drains the remaining chunks.
        // Lock order matches write_audio: audio pipe, then stdin.
        *self.audio.lock() = AudioInput::None;
        *self.stdin.lock() = None;

        if let Some(handle) = self.reader.lock().take() {
            handle
                .join()
                .map_err(|_| EncoderError::Pipe("Encoder reader thread panicked".to_string()))?;
        }

        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Failed to stop encoder on drop: {}", e);
        }
    }
}

/// Create the audio side-channel fifo inside `dir`
#[cfg(unix)]
fn create_fifo(dir: &Path) -> EncoderResult<PathBuf> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path = dir.join("audio.pipe");
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| EncoderError::Pipe("Invalid fifo path".to_string()))?;

    // SAFETY: c_path is a valid NUL-terminated path
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        return Err(EncoderError::Io(std::io::Error::last_os_error()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{AudioParams, VideoParams};

    fn settings(audio: bool, video: bool) -> EncoderSettings {
        EncoderSettings {
            audio: audio.then_some(AudioParams {
                sample_rate: 48000,
                channels: 1,
            }),
            video: video.then_some(VideoParams {
                width: 1280,
                height: 720,
                fps: 30,
            }),
        }
    }

    #[test]
    fn rejects_empty_settings() {
        let result = FfmpegEncoder::spawn(
            settings(false, false),
            Box::new(|_| {}),
            Box::new(|| {}),
        );
        assert!(matches!(result, Err(EncoderError::Spawn(_))));
    }
}
