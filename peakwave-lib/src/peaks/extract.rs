use log::debug;

use crate::error::{Result, WaveError};

use super::{Bits, PeakData, Peaks};

/// Scale a float amplitude into the signed range of `bits`.
///
/// Negative values scale by `2^(bits-1)`, non-negative values by
/// `2^(bits-1) - 1`, and the result is clamped to the representable range.
pub fn quantize(value: f32, bits: Bits) -> f64 {
    let max = bits.magnitude();
    let value = f64::from(value);
    let scaled = if value < 0.0 {
        value * max
    } else {
        value * (max - 1.0)
    };
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(-max, max - 1.0)
}

fn find_min_max(window: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &sample in window {
        if sample < min {
            min = sample;
        }
        if sample > max {
            max = sample;
        }
    }
    (min, max)
}

/// Compute interleaved quantized peaks for one channel.
///
/// The channel is split into windows of `samples_per_pixel` samples; the
/// last window is shorter when the length is not a multiple of the stride.
///
/// # Panics
/// Panics if `samples_per_pixel` is zero. [`extract_peaks`] validates this.
pub fn channel_peaks(channel: &[f32], samples_per_pixel: usize, bits: Bits) -> Peaks {
    let columns = channel.len().div_ceil(samples_per_pixel);
    let mut peaks = Peaks::zeroed(bits, columns * 2);

    for (column, window) in channel.chunks(samples_per_pixel).enumerate() {
        let (min, max) = find_min_max(window);
        peaks.store(column * 2, quantize(min, bits));
        peaks.store(column * 2 + 1, quantize(max, bits));
    }

    peaks
}

/// Average quantized peaks of every channel into one channel.
///
/// Works on the quantized integers, not the source floats.
fn downmix(channels: &[Peaks], bits: Bits) -> Peaks {
    let weight = 1.0 / channels.len() as f64;
    let len = channels[0].len();
    let mut mono = Peaks::zeroed(bits, len);

    for index in 0..len {
        let mut value = 0.0;
        for channel in channels {
            value += weight * f64::from(channel.get(index).unwrap_or(0));
        }
        mono.store(index, value);
    }

    mono
}

/// Extract peaks for every channel of a decoded buffer.
///
/// # Arguments
/// * `channels` - Planar sample arrays, nominally in `[-1.0, 1.0]`.
/// * `samples_per_pixel` - Samples summarized by one pixel column.
/// * `bits` - Quantization width; one of 8, 16 or 32.
/// * `mono` - Average all channels into a single output channel.
///
/// # Errors
/// Returns [`WaveError::InvalidParameter`] for an unsupported bit width, a
/// zero stride or an empty channel list. Bit width is checked before any
/// sample is read.
pub fn extract_peaks<C: AsRef<[f32]>>(
    channels: &[C],
    samples_per_pixel: usize,
    bits: u32,
    mono: bool,
) -> Result<PeakData> {
    let bits = Bits::try_from(bits)?;
    if samples_per_pixel == 0 {
        return Err(WaveError::InvalidParameter(
            "samples per pixel must be greater than zero".to_string(),
        ));
    }
    if channels.is_empty() {
        return Err(WaveError::InvalidParameter(
            "at least one channel is required".to_string(),
        ));
    }

    let mut peaks = channels
        .iter()
        .map(|channel| channel_peaks(channel.as_ref(), samples_per_pixel, bits))
        .collect::<Vec<_>>();

    if mono && peaks.len() > 1 {
        debug!("downmixing {} peak channels to mono", peaks.len());
        peaks = vec![downmix(&peaks, bits)];
    }

    let length = peaks[0].len() / 2;
    Ok(PeakData {
        length,
        bits,
        channels: peaks,
    })
}
