//! # Peakwave Library
//!
//! Waveform peak extraction and synchronized playback for a single audio asset.
//! The crate decodes raw bytes, quantizes min/max peaks per pixel column, and
//! drives playback through one of two transport backends while a polling
//! loop keeps a visual progress cursor in step with the audio clock.

pub mod audio;
pub mod bars;
pub mod context;
pub mod control;
pub mod decode;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod peaks;
pub mod progress;
#[cfg(test)]
mod test_data;
pub mod timefmt;
pub mod transform;
pub mod wave;

pub use error::{Result, WaveError};
