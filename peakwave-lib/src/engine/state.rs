use crate::error::WaveError;

use super::transport::BackendKind;

/// Lifecycle of an [`AudioEngine`](super::AudioEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Error,
}

/// How a decode started by `load_source` concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Decoded { duration: f64 },
    DecodeFailed(WaveError),
    /// The content had no bytes.
    Empty,
    /// The load was superseded or the engine was destroyed first.
    Cancelled,
}

/// What `seek` does with the transport afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    Resume,
    Pause,
    #[default]
    Unspecified,
}

/// Notification produced while pumping the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Playback reached the end naturally; the engine is back in `Ready`.
    Ended,
}

/// Point-in-time view of the engine for UIs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position: f64,
    pub duration: f64,
    pub volume: f32,
    pub playback_rate: f32,
    pub backend: BackendKind,
}
