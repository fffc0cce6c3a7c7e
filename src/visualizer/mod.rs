//! Live audio visualization
//!
//! Audio-mode recordings run a feed task that turns the spectrum tap's
//! most recent samples into one magnitude frame per tick, published on
//! the recorder event bus for the webview canvas to draw.

pub mod spectrum;

pub use spectrum::{SpectrumAnalyzer, SpectrumTap, BIN_COUNT, FFT_SIZE};

use crate::recorder::RecorderEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Cadence of visualizer frames (roughly 30 per second)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Start the per-frame visualizer feed
///
/// Runs until aborted; the recorder cancels it when the session
/// finalizes.
pub fn spawn_feed(
    tap: Arc<SpectrumTap>,
    events: broadcast::Sender<RecorderEvent>,
) -> tokio::task::AbortHandle {
    let task = tokio::spawn(async move {
        let mut analyzer = SpectrumAnalyzer::new();
        let mut interval = tokio::time::interval(FRAME_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let window = tap.window();
            let bins = analyzer.analyze(&window);
            let _ = events.send(RecorderEvent::Visualizer { bins });
        }
    });

    task.abort_handle()
}
