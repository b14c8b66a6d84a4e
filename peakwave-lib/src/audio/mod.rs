//! Decoded, playable audio held entirely in memory.

mod source;
mod stretch;

use std::time::Duration;

use crate::error::{Result, WaveError};

pub use source::BufferSource;
pub use stretch::{StretchControl, StretchSource};

/// Planar PCM samples for one asset.
///
/// Every channel holds the same number of frames. Immutable once built, so
/// the engine shares it behind an `Arc` between playback graphs.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] for a zero sample rate, no
    /// channels, or channels of unequal length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(WaveError::InvalidParameter(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        let Some(first) = channels.first() else {
            return Err(WaveError::InvalidParameter(
                "decoded audio has no channels".to_string(),
            ));
        };
        let frames = first.len();
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(WaveError::InvalidParameter(
                "decoded channels differ in length".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Frame index for a position, clamped to the buffer.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * f64::from(self.sample_rate)) as usize;
        frame.min(self.frames())
    }

    pub(crate) fn total_duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_buffers() {
        assert!(DecodedAudio::new(0, vec![vec![0.0]]).is_err());
        assert!(DecodedAudio::new(8_000, Vec::new()).is_err());
        assert!(DecodedAudio::new(8_000, vec![vec![0.0; 3], vec![0.0; 2]]).is_err());
    }

    #[test]
    fn duration_and_frame_lookup() {
        let audio = DecodedAudio::new(8_000, vec![vec![0.0; 16_000], vec![0.0; 16_000]]).unwrap();
        assert_eq!(audio.channel_count(), 2);
        assert_eq!(audio.frames(), 16_000);
        assert_eq!(audio.duration(), 2.0);
        assert_eq!(audio.frame_at(0.5), 4_000);
        assert_eq!(audio.frame_at(-1.0), 0);
        assert_eq!(audio.frame_at(10.0), 16_000);
    }
}
