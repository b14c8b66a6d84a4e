//! Conversions between playback time and waveform pixel columns.
//!
//! Forward conversion rounds up, so a cursor never trails the audio it
//! represents. Converting back is therefore not an exact inverse for offsets
//! that do not fall on a column boundary.

use crate::error::{Result, WaveError};

/// Convert a playback position to a pixel offset.
///
/// Computes `ceil(seconds * sample_rate / samples_per_pixel)`. Negative or NaN
/// positions map to column `0`.
///
/// # Arguments
/// * `seconds` - Playback position.
/// * `samples_per_pixel` - Column stride; must be non-zero.
/// * `sample_rate` - Source sample rate in Hz.
pub fn seconds_to_pixels(seconds: f64, samples_per_pixel: u64, sample_rate: u32) -> u64 {
    (seconds * f64::from(sample_rate) / samples_per_pixel as f64).ceil() as u64
}

/// Convert a pixel offset back to a playback position in seconds.
pub fn pixels_to_seconds(pixels: f64, samples_per_pixel: u64, sample_rate: u32) -> f64 {
    pixels * samples_per_pixel as f64 / f64::from(sample_rate)
}

/// Derive the column stride for a display width.
///
/// Returns `floor(total_samples / width)`, raised to `1` when the display is
/// wider than the sample count.
///
/// # Errors
/// Returns [`WaveError::InvalidParameter`] for a zero width.
pub fn samples_per_pixel(total_samples: usize, width: u32) -> Result<u64> {
    if width == 0 {
        return Err(WaveError::InvalidParameter(
            "display width must be greater than zero".to_string(),
        ));
    }
    Ok((total_samples as u64 / u64::from(width)).max(1))
}
