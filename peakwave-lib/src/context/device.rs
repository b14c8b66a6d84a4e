use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::audio::{BufferSource, DecodedAudio, StretchControl, StretchSource};
use crate::error::{Result, WaveError};

use super::{AudioContext, MediaElement, SourceNode};

const OUTPUT_STREAM_OPEN_RETRIES: usize = 20;
const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;

/// Playback through the default output device.
///
/// Each graph gets its own [`Sink`] on the shared stream mixer.
pub struct DeviceContext {
    stream: OutputStream,
    epoch: Instant,
}

impl DeviceContext {
    /// Open the default output device, retrying while it is busy.
    ///
    /// # Errors
    /// Returns [`WaveError::Transport`] if the device stays unavailable.
    pub fn open_default() -> Result<Self> {
        for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
            match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => {
                    return Ok(Self {
                        stream,
                        epoch: Instant::now(),
                    })
                }
                Err(err) => {
                    if attempt == OUTPUT_STREAM_OPEN_RETRIES {
                        error!(
                            "failed to open default output stream after {} attempts: {}",
                            OUTPUT_STREAM_OPEN_RETRIES, err
                        );
                        return Err(WaveError::Transport(err.to_string()));
                    }
                    warn!(
                        "open_default_stream attempt {}/{} failed: {}",
                        attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                    );
                    thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
                }
            }
        }
        Err(WaveError::Transport(
            "no output stream open attempts were made".to_string(),
        ))
    }

    fn new_sink(&self) -> Sink {
        Sink::connect_new(self.stream.mixer())
    }
}

impl AudioContext for DeviceContext {
    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start_source(
        &self,
        audio: Arc<DecodedAudio>,
        offset: f64,
        gain: f32,
    ) -> Result<Box<dyn SourceNode>> {
        let sink = self.new_sink();
        sink.set_volume(gain);
        sink.append(BufferSource::starting_at(audio, offset));
        sink.play();
        Ok(Box::new(DeviceSource { sink }))
    }

    fn create_media(&self, audio: Arc<DecodedAudio>) -> Result<Box<dyn MediaElement>> {
        let sink = self.new_sink();
        sink.pause();
        let control = Arc::new(StretchControl::new());
        sink.append(StretchSource::new(audio.clone(), Arc::clone(&control)));
        Ok(Box::new(DeviceMedia {
            sink,
            audio,
            control,
        }))
    }
}

struct DeviceSource {
    sink: Sink,
}

impl SourceNode for DeviceSource {
    fn set_gain(&mut self, gain: f32) {
        self.sink.set_volume(gain);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn has_finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

/// Media element on a time-stretched sink. Rate changes keep the pitch.
struct DeviceMedia {
    sink: Sink,
    audio: Arc<DecodedAudio>,
    control: Arc<StretchControl>,
}

impl DeviceMedia {
    /// A sink that played to the end drops its source; queue a fresh one.
    fn ensure_source(&self) {
        if self.sink.empty() {
            self.sink
                .append(StretchSource::new(self.audio.clone(), Arc::clone(&self.control)));
        }
    }
}

impl MediaElement for DeviceMedia {
    fn play(&mut self) -> Result<()> {
        self.ensure_source();
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn current_time(&self) -> f64 {
        if self.sink.empty() {
            return self.audio.duration();
        }
        let seconds =
            self.control.position_frames() as f64 / f64::from(self.audio.sample_rate());
        seconds.min(self.audio.duration())
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<()> {
        self.ensure_source();
        let target = seconds.clamp(0.0, self.audio.duration());
        self.sink
            .try_seek(Duration::from_secs_f64(target))
            .map_err(|err| WaveError::Transport(format!("seek failed: {}", err)))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.control.set_rate(rate);
    }

    fn has_ended(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for DeviceMedia {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
