use std::sync::Arc;
use std::time::Duration;

use rodio::source::{SeekError, Source};

use super::DecodedAudio;

/// Interleaving rodio source over a shared [`DecodedAudio`].
#[derive(Clone, Debug)]
pub struct BufferSource {
    audio: Arc<DecodedAudio>,
    frame: usize,
    channel: usize,
}

impl BufferSource {
    pub fn new(audio: Arc<DecodedAudio>) -> Self {
        Self {
            audio,
            frame: 0,
            channel: 0,
        }
    }

    /// Start playback `offset` seconds into the buffer.
    pub fn starting_at(audio: Arc<DecodedAudio>, offset: f64) -> Self {
        let frame = audio.frame_at(offset);
        Self {
            audio,
            frame,
            channel: 0,
        }
    }

    /// Current read position in seconds.
    pub fn position(&self) -> f64 {
        self.frame as f64 / f64::from(self.audio.sample_rate())
    }
}

impl Iterator for BufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = *self.audio.channels().get(self.channel)?.get(self.frame)?;
        self.channel += 1;
        if self.channel == self.audio.channel_count() {
            self.channel = 0;
            self.frame += 1;
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let frames_left = self.audio.frames().saturating_sub(self.frame);
        let len = (frames_left * self.audio.channel_count()).saturating_sub(self.channel);
        (len, Some(len))
    }
}

impl Source for BufferSource {
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
        Some(self.audio.total_duration())
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.frame = self.audio.frame_at(pos.as_secs_f64());
        self.channel = 0;
        Ok(())
    }
}
