use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveError};
use crate::peaks::Bits;

/// Session configuration.
///
/// Missing JSON fields fall back to the defaults: visualizable backend,
/// mono peaks at 16 bits, full volume, normal rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    pub rate_adjustable: bool,
    pub mono: bool,
    pub bits: Bits,
    pub volume: f32,
    #[serde(alias = "rate")]
    pub playback_rate: f32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            rate_adjustable: false,
            mono: true,
            bits: Bits::Sixteen,
            volume: 1.0,
            playback_rate: 1.0,
        }
    }
}

impl WaveSettings {
    /// Parse settings from a JSON object.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] for malformed JSON or an
    /// unsupported bit width.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| WaveError::InvalidParameter(format!("invalid settings: {}", err)))
    }

    pub fn set_rate_adjustable(&mut self, rate_adjustable: bool) {
        self.rate_adjustable = rate_adjustable;
    }

    pub fn set_mono(&mut self, mono: bool) {
        self.mono = mono;
    }

    pub fn set_bits(&mut self, bits: Bits) {
        self.bits = bits;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub fn set_playback_rate(&mut self, playback_rate: f32) {
        self.playback_rate = playback_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = WaveSettings::default();
        assert!(!settings.rate_adjustable);
        assert!(settings.mono);
        assert_eq!(settings.bits, Bits::Sixteen);
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.playback_rate, 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = WaveSettings::from_json(r#"{"bits": 8, "rate": 1.25}"#).unwrap();
        assert_eq!(settings.bits, Bits::Eight);
        assert_eq!(settings.playback_rate, 1.25);
        assert!(settings.mono);
    }

    #[test]
    fn unsupported_bits_are_rejected() {
        assert!(WaveSettings::from_json(r#"{"bits": 12}"#).is_err());
    }
}
