//! Host-facing notifications and the rendering seam.

use crate::peaks::PeakData;

/// Load lifecycle reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Init,
    Loading,
    Success,
    Error,
}

impl LoadState {
    /// Numeric code the hosting UI layer uses for this state.
    pub fn code(self) -> i8 {
        match self {
            Self::Empty => -1,
            Self::Init => 0,
            Self::Loading => 1,
            Self::Success => 2,
            Self::Error => 3,
        }
    }
}

/// Events delivered to a [`WaveCallback`].
#[derive(Debug, Clone, PartialEq)]
pub enum WaveEvent {
    LoadStateChanged {
        state: LoadState,
        /// Decoded length in seconds, `0` unless `state` is `Success`.
        duration: f64,
    },
    LoadProgress {
        loaded: u64,
        total: Option<u64>,
        /// `loaded / total` as a percent string, empty when `total` is unknown.
        percent: String,
    },
    CurrentTimeChanged(f64),
    PlayEnded,
}

/// Receiver of session notifications.
pub trait WaveCallback {
    fn on_event(&mut self, event: WaveEvent);
}

impl<F> WaveCallback for F
where
    F: FnMut(WaveEvent),
{
    fn on_event(&mut self, event: WaveEvent) {
        self(event)
    }
}

/// Drawing layer fed by the session.
pub trait ProgressRenderer {
    /// Replace the waveform being drawn.
    fn set_peaks(&mut self, peaks: Option<&PeakData>);
    /// Move the progress cursor to a pixel column.
    fn change_offset_pixels(&mut self, pixels: u64);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl ProgressRenderer for NullRenderer {
    fn set_peaks(&mut self, _peaks: Option<&PeakData>) {}

    fn change_offset_pixels(&mut self, _pixels: u64) {}
}
