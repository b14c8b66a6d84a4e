use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::source::{SeekError, Source};
use signalsmith_stretch::Stretch;

use super::DecodedAudio;

/// Output frames rendered per stretcher call.
const BLOCK_FRAMES: usize = 1024;

/// Rate and read position shared between a [`StretchSource`] on the audio
/// thread and whoever controls it.
#[derive(Debug)]
pub struct StretchControl {
    rate_bits: AtomicU32,
    position: AtomicU64,
}

impl Default for StretchControl {
    fn default() -> Self {
        Self {
            rate_bits: AtomicU32::new(1.0f32.to_bits()),
            position: AtomicU64::new(0),
        }
    }
}

impl StretchControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes effect from the next rendered block. Non-positive rates are ignored.
    pub fn set_rate(&self, rate: f32) {
        if rate.is_finite() && rate > 0.0 {
            self.rate_bits.store(rate.to_bits(), Ordering::Relaxed);
        }
    }

    pub fn rate(&self) -> f32 {
        f32::from_bits(self.rate_bits.load(Ordering::Relaxed))
    }

    /// Source frame currently being heard.
    pub fn position_frames(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }
}

/// Pitch-preserving variable-rate source over a shared [`DecodedAudio`].
///
/// Each block consumes `rate * BLOCK_FRAMES` source frames and renders
/// `BLOCK_FRAMES` output frames, so tempo follows the rate while pitch stays
/// put. The reported position is in source frames, behind the read head by
/// the stretcher latency and never before the last seek target.
pub struct StretchSource {
    audio: Arc<DecodedAudio>,
    control: Arc<StretchControl>,
    stretcher: Stretch,
    frame: usize,
    start_frame: usize,
    carry: f64,
    input: Vec<f32>,
    output: Vec<f32>,
    cursor: usize,
}

impl StretchSource {
    pub fn new(audio: Arc<DecodedAudio>, control: Arc<StretchControl>) -> Self {
        let stretcher = Stretch::preset_default(audio.channel_count() as u32, audio.sample_rate());
        control.position.store(0, Ordering::Relaxed);
        Self {
            audio,
            control,
            stretcher,
            frame: 0,
            start_frame: 0,
            carry: 0.0,
            input: Vec::new(),
            output: Vec::new(),
            cursor: 0,
        }
    }

    /// Zero frames fed past the end so the stretcher drains its tail.
    pub fn tail_frames(&self) -> usize {
        self.stretcher.input_latency() + self.stretcher.output_latency()
    }

    fn publish_position(&self, rate: f64) {
        let latency = self.stretcher.input_latency()
            + (self.stretcher.output_latency() as f64 * rate) as usize;
        let heard = self
            .frame
            .saturating_sub(latency)
            .max(self.start_frame)
            .min(self.audio.frames());
        self.control.position.store(heard as u64, Ordering::Relaxed);
    }

    fn render_block(&mut self) -> bool {
        if self.frame >= self.audio.frames() + self.tail_frames() {
            return false;
        }
        let rate = f64::from(self.control.rate());
        self.carry += BLOCK_FRAMES as f64 * rate;
        let take = self.carry.floor() as usize;
        self.carry -= take as f64;

        let channels = self.audio.channels();
        self.input.clear();
        for frame in self.frame..self.frame + take {
            for channel in channels {
                self.input.push(channel.get(frame).copied().unwrap_or(0.0));
            }
        }
        self.output.clear();
        self.output.resize(BLOCK_FRAMES * channels.len(), 0.0);
        self.stretcher
            .process(&self.input[..], &mut self.output[..]);

        self.frame += take;
        self.cursor = 0;
        self.publish_position(rate);
        true
    }
}

impl Iterator for StretchSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.output.len() && !self.render_block() {
            return None;
        }
        let sample = self.output[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for StretchSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.audio.channel_count() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.frame = self.audio.frame_at(pos.as_secs_f64());
        self.start_frame = self.frame;
        self.carry = 0.0;
        self.stretcher.reset();
        self.output.clear();
        self.cursor = 0;
        self.control
            .position
            .store(self.frame as u64, Ordering::Relaxed);
        Ok(())
    }
}
