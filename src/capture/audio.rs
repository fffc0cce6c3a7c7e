//! Microphone capture using cpal
//!
//! The input stream lives on a dedicated thread because cpal streams are
//! not `Send`. Samples are converted to interleaved f32 little-endian
//! bytes for the encoder and mirrored into the spectrum tap when one is
//! attached.

use crate::capture::traits::{
    AudioDeviceInfo, AudioParams, CaptureError, CaptureResult, CaptureTrack, TrackKind,
};
use crate::encoder::ChunkEncoder;
use crate::visualizer::SpectrumTap;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Get list of available audio input devices (microphones)
pub fn get_audio_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();

    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    match host.input_devices() {
        Ok(devices) => devices
            .filter_map(|device| {
                let name = device.name().ok()?;
                Some(AudioDeviceInfo {
                    id: name.clone(),
                    name: name.clone(),
                    is_input: true,
                    is_default: default_name.as_deref() == Some(name.as_str()),
                })
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate audio input devices: {}", e);
            Vec::new()
        }
    }
}

fn find_input_device(device_id: Option<&str>) -> CaptureResult<Device> {
    let host = cpal::default_host();

    match device_id {
        Some(id) => host
            .input_devices()
            .map_err(|e| CaptureError::Stream(e.to_string()))?
            .find(|d| d.name().map(|n| n == id).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(id.to_string())),
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceNotFound("No default input device".to_string())),
    }
}

/// Microphone capture track
pub struct AudioCaptureTrack {
    label: String,
    device_id: Option<String>,
    params: AudioParams,
    stopped: Arc<AtomicBool>,
    sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>>,
    tap: Arc<ParkingMutex<Option<Arc<SpectrumTap>>>>,
    thread: ParkingMutex<Option<std::thread::JoinHandle<()>>>,
}

impl AudioCaptureTrack {
    /// Acquire the microphone and begin capturing
    ///
    /// The device and its config are probed up front so acquisition errors
    /// surface here; the stream itself is built on the capture thread.
    /// Data flows nowhere until `attach` installs an encoder.
    pub fn open(device_id: Option<String>) -> CaptureResult<Arc<Self>> {
        let device = find_input_device(device_id.as_deref())?;
        let label = device
            .name()
            .unwrap_or_else(|_| "Unknown microphone".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Configuration(format!("Failed to get audio config: {}", e)))?;

        let params = AudioParams {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
        };
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        let track = Arc::new(Self {
            label: label.clone(),
            device_id,
            params,
            stopped: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(ParkingMutex::new(None)),
            tap: Arc::new(ParkingMutex::new(None)),
            thread: ParkingMutex::new(None),
        });

        let stopped = track.stopped.clone();
        let sink = track.sink.clone();
        let tap = track.tap.clone();
        let thread_device_id = track.device_id.clone();

        let handle = std::thread::spawn(move || {
            // Re-resolve the device on this thread; cpal streams must live
            // where they were built.
            let device = match find_input_device(thread_device_id.as_deref()) {
                Ok(d) => d,
                Err(e) => {
                    tracing::error!("Audio capture thread lost its device: {}", e);
                    return;
                }
            };

            let stream = match build_capture_stream(
                &device,
                &config,
                sample_format,
                stopped.clone(),
                sink,
                tap,
            ) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("Failed to build audio input stream: {}", e);
                    return;
                }
            };

            if let Err(e) = stream.play() {
                tracing::error!("Failed to start audio stream: {}", e);
                return;
            }

            tracing::info!("Microphone stream started ({}Hz)", params.sample_rate);

            // Keep the thread (and the stream) alive until the track stops
            while !stopped.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }

            tracing::info!("Microphone stream stopped");
        });

        *track.thread.lock() = Some(handle);

        tracing::info!(
            "Microphone acquired: {} ({}Hz, {}ch)",
            label,
            params.sample_rate,
            params.channels
        );

        Ok(track)
    }

    pub fn params(&self) -> AudioParams {
        self.params
    }
}

fn build_capture_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    stopped: Arc<AtomicBool>,
    sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>>,
    tap: Arc<ParkingMutex<Option<Arc<SpectrumTap>>>>,
) -> CaptureResult<cpal::Stream> {
    match sample_format {
        SampleFormat::F32 => build_typed_stream::<f32>(device, config, stopped, sink, tap),
        SampleFormat::I16 => build_typed_stream::<i16>(device, config, stopped, sink, tap),
        SampleFormat::U16 => build_typed_stream::<u16>(device, config, stopped, sink, tap),
        other => Err(CaptureError::Configuration(format!(
            "Unsupported sample format: {:?}",
            other
        ))),
    }
}

fn build_typed_stream<T>(
    device: &Device,
    config: &StreamConfig,
    stopped: Arc<AtomicBool>,
    sink: Arc<ParkingMutex<Option<Arc<dyn ChunkEncoder>>>>,
    tap: Arc<ParkingMutex<Option<Arc<SpectrumTap>>>>,
) -> CaptureResult<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if stopped.load(Ordering::Relaxed) {
                    return;
                }

                let samples: Vec<f32> = data
                    .iter()
                    .map(|&s| cpal::Sample::from_sample(s))
                    .collect();

                if let Some(encoder) = sink.lock().clone() {
                    let bytes: Vec<u8> = samples
                        .iter()
                        .flat_map(|&sample| sample.to_le_bytes())
                        .collect();
                    encoder.write_audio(&bytes);
                }

                if let Some(tap) = tap.lock().clone() {
                    tap.push(&samples);
                }
            },
            |err| tracing::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::Stream(e.to_string()))
}

impl CaptureTrack for AudioCaptureTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Audio
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn attach(&self, encoder: Arc<dyn ChunkEncoder>, tap: Option<Arc<SpectrumTap>>) {
        *self.sink.lock() = Some(encoder);
        *self.tap.lock() = tap;
    }

    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.sink.lock() = None;
        *self.tap.lock() = None;
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for AudioCaptureTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
