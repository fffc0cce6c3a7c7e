//! Live frequency-spectrum analysis
//!
//! Converts the most recent microphone samples into the per-frame
//! magnitude bins the visualizer draws: a Hann-windowed 256-point FFT
//! whose half-spectrum is mapped through a decibel range onto 0-255,
//! with exponential smoothing between frames.

use parking_lot::Mutex as ParkingMutex;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

/// FFT window length in samples
pub const FFT_SIZE: usize = 256;

/// Magnitude bins per frame (half spectrum)
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Decibel floor; magnitudes at or below map to 0
const MIN_DECIBELS: f32 = -100.0;

/// Decibel ceiling; magnitudes at or above map to 255
const MAX_DECIBELS: f32 = -30.0;

/// Exponential smoothing factor between successive frames
const SMOOTHING: f32 = 0.8;

/// How many recent samples the tap retains
const TAP_CAPACITY: usize = FFT_SIZE * 4;

/// Bounded ring of the most recent capture samples
///
/// The audio capture thread pushes; the visualizer task reads a window
/// per frame. Only the latest `TAP_CAPACITY` samples are kept.
#[derive(Default)]
pub struct SpectrumTap {
    ring: ParkingMutex<VecDeque<f32>>,
}

impl SpectrumTap {
    pub fn new() -> Self {
        Self {
            ring: ParkingMutex::new(VecDeque::with_capacity(TAP_CAPACITY)),
        }
    }

    /// Append samples, discarding the oldest beyond capacity
    pub fn push(&self, samples: &[f32]) {
        let mut ring = self.ring.lock();
        for &sample in samples {
            if ring.len() == TAP_CAPACITY {
                ring.pop_front();
            }
            ring.push_back(sample);
        }
    }

    /// Latest `FFT_SIZE` samples, zero-padded at the front when short
    pub fn window(&self) -> [f32; FFT_SIZE] {
        let ring = self.ring.lock();
        let mut window = [0.0f32; FFT_SIZE];
        let take = ring.len().min(FFT_SIZE);
        let start = ring.len() - take;
        for (dst, src) in window[FFT_SIZE - take..].iter_mut().zip(ring.range(start..)) {
            *dst = *src;
        }
        window
    }
}

/// Stateful spectrum analyzer producing one byte-bin frame per call
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    smoothed: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        let hann = (0..FFT_SIZE)
            .map(|i| {
                let phase = (i as f32) / (FFT_SIZE as f32 - 1.0);
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * phase).cos())
            })
            .collect();

        Self {
            fft,
            hann,
            smoothed: vec![0.0; BIN_COUNT],
        }
    }

    /// Analyze one window of samples into `BIN_COUNT` magnitude bytes
    pub fn analyze(&mut self, samples: &[f32; FFT_SIZE]) -> Vec<u8> {
        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .zip(&self.hann)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        let mut bins = Vec::with_capacity(BIN_COUNT);
        for (k, value) in buffer.iter().take(BIN_COUNT).enumerate() {
            let magnitude = value.norm() / FFT_SIZE as f32;

            // Smooth on the linear magnitude, then convert to decibels
            let smoothed = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * magnitude;
            self.smoothed[k] = smoothed;

            let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
            let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            bins.push((scaled.clamp(0.0, 1.0) * 255.0).round() as u8);
        }
        bins
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
