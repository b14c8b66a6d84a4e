//! Synthetic WAV assets for unit tests.

use std::io::Cursor;

/// Encode 16-bit PCM frames produced by `sample(frame, channel)`.
pub fn wav_bytes<F>(sample_rate: u32, channels: u16, frames: usize, mut sample: F) -> Vec<u8>
where
    F: FnMut(usize, u16) -> f32,
{
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for frame in 0..frames {
        for channel in 0..channels {
            let value = sample(frame, channel).clamp(-1.0, 1.0);
            writer.write_sample((value * 32_767.0) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

/// Silent mono asset.
pub fn silence(sample_rate: u32, frames: usize) -> Vec<u8> {
    wav_bytes(sample_rate, 1, frames, |_, _| 0.0)
}
