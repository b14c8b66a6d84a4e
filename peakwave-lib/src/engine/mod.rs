//! Playback engine: decoded buffer, transport backend and timing state.

mod rate_adjustable;
mod state;
mod transport;
mod visualizable;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::audio::DecodedAudio;
use crate::context::AudioContext;
use crate::decode::{spawn_decode, DecodeReport, PendingLoad};
use crate::error::{Result, WaveError};
use crate::peaks::{extract_peaks, Bits, PeakData};
use crate::transform;

pub use rate_adjustable::RateAdjustableBackend;
pub use state::{EngineEvent, LoadOutcome, PlaybackSnapshot, PlaybackState, ResumeMode};
pub use transport::{select_backend, BackendKind, Transport, TransportEvent};
pub use visualizable::VisualizableBackend;

/// Column stride used before the first layout pass.
pub const DEFAULT_SAMPLES_PER_PIXEL: u64 = 1000;

/// Owns one asset's decoded audio and drives it through a [`Transport`].
///
/// The engine borrows its [`AudioContext`] and cannot outlive it. Once
/// [`destroy`](Self::destroy) has run, every transport call fails with
/// [`WaveError::InvalidState`]; a new engine is needed to play again.
pub struct AudioEngine<'ctx> {
    backend: Box<dyn Transport + 'ctx>,
    state: PlaybackState,
    audio: Option<Arc<DecodedAudio>>,
    samples_per_pixel: u64,
    volume: f32,
    playback_rate: f32,
    last_offset_pixels: u64,
    ended_armed: bool,
    load_generation: u64,
    last_error: Option<WaveError>,
    destroyed: bool,
}

impl<'ctx> AudioEngine<'ctx> {
    /// Create an engine, selecting the backend once.
    ///
    /// # Arguments
    /// * `context` - Clock and output graph shared by the engine's backend.
    /// * `rate_adjustable` - Use the media backend instead of source graphs.
    pub fn new(context: &'ctx dyn AudioContext, rate_adjustable: bool) -> Self {
        Self::with_backend(select_backend(context, rate_adjustable))
    }

    pub fn with_backend(backend: Box<dyn Transport + 'ctx>) -> Self {
        Self {
            backend,
            state: PlaybackState::Idle,
            audio: None,
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            volume: 1.0,
            playback_rate: 1.0,
            last_offset_pixels: 0,
            ended_armed: false,
            load_generation: 0,
            last_error: None,
            destroyed: false,
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            return Err(WaveError::InvalidState("engine has been destroyed".to_string()));
        }
        Ok(())
    }

    /// Start decoding `bytes` in the background.
    ///
    /// Any loaded buffer is released and the engine enters `Loading`. Feed
    /// the returned handle to [`poll_load`](Self::poll_load) or
    /// [`wait_load`](Self::wait_load); transport calls must wait for it.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidState`] after `destroy`.
    pub fn load_source(&mut self, bytes: Vec<u8>) -> Result<PendingLoad> {
        self.ensure_alive()?;
        self.backend.release();
        self.audio = None;
        self.ended_armed = false;
        self.last_offset_pixels = 0;
        self.last_error = None;
        self.load_generation += 1;
        self.state = PlaybackState::Loading;
        info!("decoding {} bytes", bytes.len());
        Ok(spawn_decode(bytes, self.load_generation))
    }

    /// Apply the decode result if it has arrived.
    pub fn poll_load(&mut self, pending: &mut PendingLoad) -> Option<LoadOutcome> {
        if self.is_stale(pending) {
            return Some(LoadOutcome::Cancelled);
        }
        let report = pending.try_report()?;
        Some(self.apply_report(pending.generation(), report))
    }

    /// Block until the decode result arrives and apply it.
    pub fn wait_load(&mut self, mut pending: PendingLoad) -> LoadOutcome {
        if self.is_stale(&pending) {
            return LoadOutcome::Cancelled;
        }
        let report = pending.wait_report();
        self.apply_report(pending.generation(), report)
    }

    fn is_stale(&self, pending: &PendingLoad) -> bool {
        self.destroyed || pending.generation() != self.load_generation
    }

    fn apply_report(&mut self, generation: u64, report: DecodeReport) -> LoadOutcome {
        if self.destroyed || generation != self.load_generation {
            debug!("ignoring decode result for stale load {}", generation);
            return LoadOutcome::Cancelled;
        }

        match report {
            DecodeReport::Decoded(audio) => {
                let audio = Arc::new(audio);
                if let Err(err) = self.backend.attach(audio.clone()) {
                    return self.fail_load(err);
                }
                self.backend.set_volume(self.volume);
                self.backend.set_playback_rate(self.playback_rate);
                let duration = audio.duration();
                self.audio = Some(audio);
                self.state = PlaybackState::Ready;
                info!(
                    "loaded {:.3}s of audio on the {} backend",
                    duration,
                    self.backend.kind().label()
                );
                LoadOutcome::Decoded { duration }
            }
            DecodeReport::Failed(err) => self.fail_load(err),
            DecodeReport::Empty => {
                info!("source was empty");
                self.state = PlaybackState::Idle;
                LoadOutcome::Empty
            }
        }
    }

    fn fail_load(&mut self, err: WaveError) -> LoadOutcome {
        warn!("failed to load source: {}", err);
        self.state = PlaybackState::Error;
        self.last_error = Some(err.clone());
        LoadOutcome::DecodeFailed(err)
    }

    /// Start or resume playback from the paused position.
    ///
    /// Has no effect while already playing.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidState`] when nothing is loaded, and
    /// [`WaveError::Transport`] if the backend fails to start.
    pub fn play(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.state {
            PlaybackState::Playing => {
                debug!("play ignored: already playing");
                Ok(())
            }
            PlaybackState::Ready | PlaybackState::Paused => {
                self.backend.start(self.volume)?;
                self.state = PlaybackState::Playing;
                self.ended_armed = true;
                info!("playing from {:.3}s", self.backend.current_time());
                Ok(())
            }
            state => Err(WaveError::InvalidState(format!(
                "cannot play while {:?}",
                state
            ))),
        }
    }

    /// Pause playback. Does nothing unless playing.
    pub fn pause(&mut self) {
        if self.destroyed || self.state != PlaybackState::Playing {
            debug!("pause ignored in state {:?}", self.state);
            return;
        }
        self.backend.stop();
        self.state = PlaybackState::Paused;
        info!("paused at {:.3}s", self.backend.current_time());
    }

    /// Handle natural completion: rewind to `0` and return to `Ready`.
    pub fn ended(&mut self) {
        if self.destroyed {
            return;
        }
        self.backend.rewind();
        self.last_offset_pixels = 0;
        self.ended_armed = false;
        if self.audio.is_some() {
            self.state = PlaybackState::Ready;
        }
        info!("playback ended");
    }

    /// Move the playback position.
    ///
    /// `target` is clamped to `[0, duration]`. While playing, the visualizable
    /// backend fully stops the current source graph before starting a new
    /// one; the media backend repositions in place unless pausing.
    ///
    /// # Arguments
    /// * `target` - Position in seconds.
    /// * `mode` - Whether playback continues afterwards.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] for a non-finite target and
    /// [`WaveError::InvalidState`] when nothing is loaded.
    pub fn seek(&mut self, target: f64, mode: ResumeMode) -> Result<()> {
        self.ensure_alive()?;
        if !target.is_finite() {
            return Err(WaveError::InvalidParameter(format!(
                "seek target must be finite: {}",
                target
            )));
        }
        let duration = self.loaded_audio()?.duration();
        let target = target.clamp(0.0, duration);
        debug!("seek to {:.3}s ({:?}) while {:?}", target, mode, self.state);

        match self.state {
            PlaybackState::Playing => match self.backend.kind() {
                BackendKind::RateAdjustable => {
                    self.backend.set_position(target)?;
                    if mode == ResumeMode::Pause {
                        self.backend.stop();
                        self.state = PlaybackState::Paused;
                    }
                }
                BackendKind::Visualizable => {
                    self.backend.stop();
                    self.backend.set_position(target)?;
                    if mode == ResumeMode::Pause {
                        self.state = PlaybackState::Paused;
                    } else {
                        self.backend.start(self.volume)?;
                    }
                }
            },
            PlaybackState::Paused | PlaybackState::Ready => {
                self.backend.set_position(target)?;
                if mode == ResumeMode::Resume {
                    self.play()?;
                }
            }
            state => {
                return Err(WaveError::InvalidState(format!(
                    "cannot seek while {:?}",
                    state
                )))
            }
        }
        Ok(())
    }

    fn loaded_audio(&self) -> Result<&Arc<DecodedAudio>> {
        self.audio
            .as_ref()
            .ok_or_else(|| WaveError::InvalidState("no source loaded".to_string()))
    }

    /// Playback position in seconds; the paused position when not playing.
    pub fn current_offset_time(&self) -> f64 {
        if self.destroyed || self.audio.is_none() {
            return 0.0;
        }
        self.backend.current_time()
    }

    /// Pixel offset of the playback position.
    ///
    /// Returns `None` when the offset equals the one last reported.
    pub fn current_offset_pixels(&mut self) -> Option<u64> {
        let time = self.current_offset_time();
        self.current_offset_pixels_at(time)
    }

    /// Like [`current_offset_pixels`](Self::current_offset_pixels) for a
    /// position already read from the clock.
    pub fn current_offset_pixels_at(&mut self, time: f64) -> Option<u64> {
        let sample_rate = self.audio.as_ref()?.sample_rate();
        let pixels = transform::seconds_to_pixels(time, self.samples_per_pixel, sample_rate);
        if pixels == self.last_offset_pixels {
            return None;
        }
        self.last_offset_pixels = pixels;
        Some(pixels)
    }

    /// Map a pixel column to seconds at the current stride.
    pub fn pixels_to_seconds(&self, pixels: f64) -> f64 {
        match self.audio.as_ref() {
            Some(audio) => {
                transform::pixels_to_seconds(pixels, self.samples_per_pixel, audio.sample_rate())
            }
            None => 0.0,
        }
    }

    /// Set the output volume, clamped to `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] for a non-finite volume.
    pub fn change_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_alive()?;
        if !volume.is_finite() {
            return Err(WaveError::InvalidParameter(format!(
                "volume must be finite: {}",
                volume
            )));
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
        Ok(())
    }

    /// Set the playback rate.
    ///
    /// The visualizable backend ignores the request and the reported rate
    /// stays `1.0`.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] unless `rate` is finite and
    /// positive.
    pub fn change_playback_rate(&mut self, rate: f32) -> Result<()> {
        self.ensure_alive()?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(WaveError::InvalidParameter(format!(
                "playback rate must be positive: {}",
                rate
            )));
        }
        if self.backend.set_playback_rate(rate) {
            self.playback_rate = rate;
        } else {
            debug!(
                "playback rate {} ignored by the {} backend",
                rate,
                self.backend.kind().label()
            );
        }
        Ok(())
    }

    pub fn supports_playback_rate(&self) -> bool {
        self.backend.kind() == BackendKind::RateAdjustable
    }

    /// Extract peaks for a display `width` pixels wide.
    ///
    /// The derived stride is kept for later pixel conversions.
    ///
    /// # Errors
    /// Returns [`WaveError::InvalidParameter`] for unsupported `bits` (checked
    /// first) or a zero width, and [`WaveError::InvalidState`] when nothing
    /// is loaded.
    pub fn compute_peaks(&mut self, width: u32, mono: bool, bits: u32) -> Result<PeakData> {
        self.ensure_alive()?;
        let bits = Bits::try_from(bits)?;
        let audio = self.loaded_audio()?.clone();
        let samples_per_pixel = transform::samples_per_pixel(audio.frames(), width)?;
        self.samples_per_pixel = samples_per_pixel;
        debug!(
            "computing peaks for width {} at {} samples per pixel",
            width, samples_per_pixel
        );
        extract_peaks(
            audio.channels(),
            samples_per_pixel as usize,
            bits.as_u32(),
            mono,
        )
    }

    /// Pump transport signals.
    ///
    /// A natural end while playing runs [`ended`](Self::ended) and yields
    /// [`EngineEvent::Ended`]; manual stops are consumed silently.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.destroyed {
            return events;
        }
        while let Some(event) = self.backend.poll_event() {
            match event {
                TransportEvent::Stopped => debug!("transport stopped"),
                TransportEvent::Ended => {
                    if self.ended_armed && self.state == PlaybackState::Playing {
                        self.ended();
                        events.push(EngineEvent::Ended);
                    } else {
                        debug!("end of stream ignored in state {:?}", self.state);
                    }
                }
            }
        }
        events
    }

    /// Tear the engine down. Safe in any state, including mid-decode.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.state == PlaybackState::Playing {
            self.pause();
        }
        self.backend.release();
        self.audio = None;
        self.ended_armed = false;
        self.load_generation += 1;
        self.state = PlaybackState::Idle;
        self.destroyed = true;
        info!("engine destroyed");
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Position playback resumes from. Meaningful when not playing.
    pub fn paused_at_seconds(&self) -> f64 {
        self.current_offset_time()
    }

    /// Duration of the loaded audio, `0` when nothing is loaded.
    pub fn duration(&self) -> f64 {
        self.audio.as_ref().map_or(0.0, |audio| audio.duration())
    }

    pub fn audio(&self) -> Option<&DecodedAudio> {
        self.audio.as_deref()
    }

    pub fn samples_per_pixel(&self) -> u64 {
        self.samples_per_pixel
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    pub fn last_error(&self) -> Option<&WaveError> {
        self.last_error.as_ref()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            position: self.current_offset_time(),
            duration: self.duration(),
            volume: self.volume,
            playback_rate: self.playback_rate,
            backend: self.backend.kind(),
        }
    }
}
