//! Camera capture using nokhwa
//!
//! The camera is opened on a dedicated thread (as with the audio stream)
//! and its negotiated format is reported back before `open` returns.
//! Decoded RGBA frames go to the encoder and into a last-frame slot used
//! by the snapshot command.

use crate::capture::traits::{
    CameraInfo, CaptureError, CaptureResult, CaptureTrack, Resolution, RgbaFrame, TrackKind,
    VideoParams,
};
use crate::encoder::ChunkEncoder;
use crate::visualizer::SpectrumTap;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the camera thread to negotiate a format
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Get list of available cameras
pub fn get_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| {
                let id = match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                };
                let name = info.human_name().to_string();

                // Common resolutions
                let resolutions = vec![
                    Resolution {
                        width: 1920,
                        height: 1080,
                    },
                    Resolution {
                        width: 1280,
                        height: 720,
                    },
                    Resolution {
                        width: 640,
                        height: 480,
                    },
                ];

                CameraInfo {
                    id,
                    name,
                    supported_resolutions: resolutions,
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

fn camera_index(device_id: Option<&str>) -> CameraIndex {
    match device_id {
        Some(id) => {
            if let Ok(idx) = id.parse::<u32>() {
                CameraIndex::Index(idx)
            } else {
                CameraIndex::String(id.to_string())
            }
        }
        None => CameraIndex::Index(0),
    }
}

/// Camera capture track
pub struct VideoCaptureTrack {
    label: String,
    params: VideoParams,
    stopped: Arc<AtomicBool>,
    sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>>,
    last_frame: Arc<ParkingMutex<Option<RgbaFrame>>>,
    thread: ParkingMutex<Option<std::thread::JoinHandle<()>>>,
}

impl VideoCaptureTrack {
    /// Acquire the camera and begin capturing
    ///
    /// Blocks until the capture thread has opened the device and
    /// negotiated a format, so permission and device errors surface here.
    pub fn open(device_id: Option<String>) -> CaptureResult<Arc<Self>> {
        let index = camera_index(device_id.as_deref());
        let stopped = Arc::new(AtomicBool::new(false));
        let sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>> =
            Arc::new(ParkingMutex::new(None));
        let last_frame: Arc<ParkingMutex<Option<RgbaFrame>>> = Arc::new(ParkingMutex::new(None));

        let (format_tx, format_rx) = mpsc::channel::<CaptureResult<VideoParams>>();

        let thread_stopped = stopped.clone();
        let thread_sink = sink.clone();
        let thread_last_frame = last_frame.clone();

        let handle = std::thread::spawn(move || {
            capture_loop(index, format_tx, thread_stopped, thread_sink, thread_last_frame);
        });

        let params = match format_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(params)) => params,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                stopped.store(true, Ordering::SeqCst);
                return Err(CaptureError::Configuration(
                    "Timed out waiting for camera".to_string(),
                ));
            }
        };

        tracing::info!(
            "Camera acquired: {}x{} @ {}fps",
            params.width,
            params.height,
            params.fps
        );

        Ok(Arc::new(Self {
            label: "camera".to_string(),
            params,
            stopped,
            sink,
            last_frame,
            thread: ParkingMutex::new(Some(handle)),
        }))
    }

    pub fn params(&self) -> VideoParams {
        self.params
    }
}

fn capture_loop(
    index: CameraIndex,
    format_tx: mpsc::Sender<CaptureResult<VideoParams>>,
    stopped: Arc<AtomicBool>,
    sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>>,
    last_frame: Arc<ParkingMutex<Option<RgbaFrame>>>,
) {
    let format = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestResolution);

    let mut camera = match Camera::new(index.clone(), format) {
        Ok(c) => c,
        Err(e) => {
            let _ = format_tx.send(Err(CaptureError::DeviceNotFound(format!(
                "Failed to open camera {:?}: {}",
                index, e
            ))));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = format_tx.send(Err(CaptureError::Stream(format!(
            "Failed to open camera stream: {}",
            e
        ))));
        return;
    }

    let camera_format = camera.camera_format();
    let params = VideoParams {
        width: camera_format.resolution().width(),
        height: camera_format.resolution().height(),
        fps: camera_format.frame_rate(),
    };

    if format_tx.send(Ok(params)).is_err() {
        // Caller went away before the camera came up
        let _ = camera.stop_stream();
        return;
    }

    while !stopped.load(Ordering::SeqCst) {
        let frame = match camera.frame() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Camera frame error: {}", e);
                continue;
            }
        };

        let decoded = match frame.decode_image::<RgbAFormat>() {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Failed to decode camera frame: {}", e);
                continue;
            }
        };

        let rgba = RgbaFrame {
            width: decoded.width(),
            height: decoded.height(),
            data: decoded.into_raw(),
        };

        if let Some(encoder) = sink.lock().clone() {
            encoder.write_video(&rgba.data);
        }

        *last_frame.lock() = Some(rgba);
    }

    if let Err(e) = camera.stop_stream() {
        tracing::warn!("Failed to stop camera stream: {}", e);
    }

    tracing::info!("Camera stream stopped");
}

impl CaptureTrack for VideoCaptureTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn attach(&self, encoder: Arc<dyn ChunkEncoder>, _tap: Option<Arc<SpectrumTap>>) {
        *self.sink.lock() = Some(encoder);
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.sink.lock() = None;
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn latest_frame(&self) -> Option<RgbaFrame> {
        self.last_frame.lock().clone()
    }
}

impl Drop for VideoCaptureTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
