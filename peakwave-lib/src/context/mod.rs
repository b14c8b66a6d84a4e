//! Audio output abstraction used by the transport backends.
//!
//! An [`AudioContext`] owns a monotonic clock and creates playback graphs.
//! [`DeviceContext`] plays through the default output device;
//! [`ManualContext`] is a clock-driven stand-in for tests and headless use.

mod device;
mod manual;

use std::sync::Arc;

use crate::audio::DecodedAudio;
use crate::error::Result;

pub use device::DeviceContext;
pub use manual::ManualContext;

/// Provider of the shared clock and playback graphs.
pub trait AudioContext {
    /// Seconds elapsed on the context clock. Never decreases.
    fn current_time(&self) -> f64;

    /// Start a one-shot source graph playing `audio` from `offset` seconds.
    ///
    /// The graph plays immediately at `gain` and cannot be restarted once
    /// stopped.
    fn start_source(
        &self,
        audio: Arc<DecodedAudio>,
        offset: f64,
        gain: f32,
    ) -> Result<Box<dyn SourceNode>>;

    /// Create a paused media element over `audio`, positioned at `0`.
    fn create_media(&self, audio: Arc<DecodedAudio>) -> Result<Box<dyn MediaElement>>;
}

/// Handle to a one-shot source graph. Dropping the handle stops playback.
pub trait SourceNode {
    fn set_gain(&mut self, gain: f32);
    fn stop(&mut self);
    /// True once the source has played through to its end.
    fn has_finished(&self) -> bool;
}

/// Media-element-style player that keeps its own position.
pub trait MediaElement {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64) -> Result<()>;
    fn set_volume(&mut self, volume: f32);
    fn set_playback_rate(&mut self, rate: f32);
    /// True when playback has reached the end and stopped there.
    fn has_ended(&self) -> bool;
}
