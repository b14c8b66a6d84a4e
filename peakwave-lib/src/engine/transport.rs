use std::sync::Arc;

use crate::audio::DecodedAudio;
use crate::context::AudioContext;
use crate::error::Result;

use super::{RateAdjustableBackend, VisualizableBackend};

/// Which playback primitive a [`Transport`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Media-element playback. Supports rate changes.
    RateAdjustable,
    /// One-shot source graphs over the decoded buffer.
    Visualizable,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::RateAdjustable => "rate-adjustable",
            Self::Visualizable => "visualizable",
        }
    }
}

/// Signals raised by a transport between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Playback was halted by `stop`.
    Stopped,
    /// Playback ran to the end of the buffer.
    Ended,
}

/// Common transport contract for both playback backends.
///
/// The engine owns the playback state machine; a transport only moves audio
/// and reports position. `start` resumes from the position left by `stop`,
/// `set_position` or `rewind`.
pub trait Transport {
    fn kind(&self) -> BackendKind;

    /// Bind a freshly decoded buffer, releasing any previous one.
    fn attach(&mut self, audio: Arc<DecodedAudio>) -> Result<()>;

    fn start(&mut self, volume: f32) -> Result<()>;

    /// Halt playback and keep the reached position.
    fn stop(&mut self);

    fn set_position(&mut self, seconds: f64) -> Result<()>;

    /// Playback position in seconds, clamped to the buffer duration.
    fn current_time(&self) -> f64;

    fn set_volume(&mut self, volume: f32);

    /// Returns `false` when the backend cannot change rate.
    fn set_playback_rate(&mut self, rate: f32) -> bool;

    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Return to position `0` after natural completion.
    fn rewind(&mut self);

    /// Drop the buffer and every playback resource.
    fn release(&mut self);
}

/// Pick the backend once, at engine construction.
pub fn select_backend<'ctx>(
    context: &'ctx dyn AudioContext,
    rate_adjustable: bool,
) -> Box<dyn Transport + 'ctx> {
    if rate_adjustable {
        Box::new(RateAdjustableBackend::new(context))
    } else {
        Box::new(VisualizableBackend::new(context))
    }
}
