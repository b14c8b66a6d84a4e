//! Quantized min/max peak extraction for waveform display.

mod extract;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveError};

pub use extract::{channel_peaks, extract_peaks, quantize};

/// Signed integer width used to store quantized peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Bits {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl Bits {
    /// Number of bits as an integer.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }

    /// `2^(bits-1)`, the magnitude of the most negative representable value.
    pub fn magnitude(self) -> f64 {
        2f64.powi(self.as_u32() as i32 - 1)
    }
}

impl TryFrom<u32> for Bits {
    type Error = WaveError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            32 => Ok(Self::ThirtyTwo),
            other => Err(WaveError::InvalidParameter(format!(
                "invalid number of bits specified for peaks: {}",
                other
            ))),
        }
    }
}

impl From<Bits> for u32 {
    fn from(value: Bits) -> Self {
        value.as_u32()
    }
}

/// Interleaved `(min, max)` pairs for one channel, one pair per pixel column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Peaks {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl Peaks {
    /// Allocate a zero-filled array of `len` values at the given width.
    pub fn zeroed(bits: Bits, len: usize) -> Self {
        match bits {
            Bits::Eight => Self::I8(vec![0; len]),
            Bits::Sixteen => Self::I16(vec![0; len]),
            Bits::ThirtyTwo => Self::I32(vec![0; len]),
        }
    }

    pub fn bits(&self) -> Bits {
        match self {
            Self::I8(_) => Bits::Eight,
            Self::I16(_) => Bits::Sixteen,
            Self::I32(_) => Bits::ThirtyTwo,
        }
    }

    /// Number of stored values (twice the number of columns).
    pub fn len(&self) -> usize {
        match self {
            Self::I8(values) => values.len(),
            Self::I16(values) => values.len(),
            Self::I32(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the value at `index` widened to `i32`.
    pub fn get(&self, index: usize) -> Option<i32> {
        match self {
            Self::I8(values) => values.get(index).map(|&v| i32::from(v)),
            Self::I16(values) => values.get(index).map(|&v| i32::from(v)),
            Self::I32(values) => values.get(index).copied(),
        }
    }

    /// Return the `(min, max)` pair for a pixel column.
    pub fn column(&self, column: usize) -> Option<(i32, i32)> {
        Some((self.get(column * 2)?, self.get(column * 2 + 1)?))
    }

    /// Store `value` at `index` the way a typed integer array does:
    /// truncation toward zero, saturation at the bounds, NaN as zero.
    pub(crate) fn store(&mut self, index: usize, value: f64) {
        match self {
            Self::I8(values) => values[index] = value as i8,
            Self::I16(values) => values[index] = value as i16,
            Self::I32(values) => values[index] = value as i32,
        }
    }

    /// Iterate over all values widened to `i32`.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }
}

/// Peak arrays for every output channel at a single column stride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakData {
    /// Number of pixel columns.
    pub length: usize,
    pub bits: Bits,
    pub channels: Vec<Peaks>,
}

impl PeakData {
    pub fn channel(&self, index: usize) -> Option<&Peaks> {
        self.channels.get(index)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidState`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| WaveError::InvalidState(format!("peak serialization failed: {}", err)))
    }
}
