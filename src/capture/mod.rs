//! Device capture
//!
//! Microphone and camera acquisition behind the `MediaSource` seam.

pub mod audio;
pub mod traits;
pub mod video;

pub use traits::{
    AudioDeviceInfo, AudioParams, CameraInfo, CaptureError, CaptureResult, CaptureStream,
    CaptureTrack, MediaSource, Resolution, RgbaFrame, StreamConstraints, TrackKind, VideoParams,
};

use std::sync::Arc;

/// `MediaSource` backed by the real microphone and camera
pub struct DeviceMediaSource;

impl MediaSource for DeviceMediaSource {
    fn open(&self, constraints: StreamConstraints) -> CaptureResult<CaptureStream> {
        let mut tracks: Vec<Arc<dyn CaptureTrack>> = Vec::new();
        let mut audio_params = None;
        let mut video_params = None;

        // Acquire video first so a camera failure doesn't leave a
        // half-acquired microphone behind.
        if constraints.video {
            let video = video::VideoCaptureTrack::open(None)?;
            video_params = Some(video.params());
            tracks.push(video);
        }

        if constraints.audio {
            let audio = match audio::AudioCaptureTrack::open(None) {
                Ok(track) => track,
                Err(e) => {
                    // Release the camera before surfacing the error
                    for track in &tracks {
                        track.stop();
                    }
                    return Err(e);
                }
            };
            audio_params = Some(audio.params());
            tracks.push(audio);
        }

        Ok(CaptureStream::new(tracks, audio_params, video_params))
    }
}
