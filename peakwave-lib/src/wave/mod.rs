//! Waveform session: one asset's load, layout, playback and progress.
//!
//! [`WaveSession`] ties the engine, the progress loop and the control bus to
//! a host that supplies bytes, a layout width and a per-frame redraw signal.

mod callback;
mod settings;

use log::{debug, warn};

use crate::context::AudioContext;
use crate::control::{Command, CommandReceiver, ControlBus};
use crate::decode::PendingLoad;
use crate::engine::{AudioEngine, EngineEvent, LoadOutcome, ResumeMode};
use crate::error::{Result, WaveError};
use crate::fetch::FetchEvent;
use crate::peaks::PeakData;
use crate::progress::{refresh, FrameQueue, ProgressLoop};
use crate::timefmt::format_percent;

pub use callback::{LoadState, NullRenderer, ProgressRenderer, WaveCallback, WaveEvent};
pub use settings::WaveSettings;

struct Binding {
    bus: ControlBus,
    receiver: CommandReceiver,
}

pub struct WaveSession<'ctx> {
    engine: AudioEngine<'ctx>,
    settings: WaveSettings,
    renderer: Box<dyn ProgressRenderer + 'ctx>,
    callback: Box<dyn WaveCallback + 'ctx>,
    progress: ProgressLoop,
    frames: FrameQueue,
    pending: Option<PendingLoad>,
    binding: Option<Binding>,
    load_state: LoadState,
    load_error: Option<WaveError>,
    peaks: Option<PeakData>,
    width: u32,
}

impl<'ctx> WaveSession<'ctx> {
    pub fn new(
        context: &'ctx dyn AudioContext,
        settings: WaveSettings,
        renderer: Box<dyn ProgressRenderer + 'ctx>,
        callback: Box<dyn WaveCallback + 'ctx>,
    ) -> Self {
        let mut engine = AudioEngine::new(context, settings.rate_adjustable);
        if let Err(err) = engine.change_volume(settings.volume) {
            warn!("ignoring configured volume: {}", err);
        }
        if let Err(err) = engine.change_playback_rate(settings.playback_rate) {
            warn!("ignoring configured playback rate: {}", err);
        }
        Self {
            engine,
            settings,
            renderer,
            callback,
            progress: ProgressLoop::new(),
            frames: FrameQueue::new(),
            pending: None,
            binding: None,
            load_state: LoadState::Init,
            load_error: None,
            peaks: None,
            width: 0,
        }
    }

    fn emit_load_state(&mut self, state: LoadState, duration: f64) {
        self.load_state = state;
        self.callback
            .on_event(WaveEvent::LoadStateChanged { state, duration });
    }

    /// Announce that bytes are being fetched.
    pub fn begin_loading(&mut self) {
        self.load_error = None;
        self.emit_load_state(LoadState::Loading, 0.0);
    }

    /// Feed one event from [`crate::fetch`].
    pub fn handle_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Progress { loaded, total } => {
                let percent = match total {
                    Some(total) if total > 0 => format_percent(loaded as f64 / total as f64, 2),
                    _ => String::new(),
                };
                self.callback.on_event(WaveEvent::LoadProgress {
                    loaded,
                    total,
                    percent,
                });
            }
            FetchEvent::Success(bytes) => self.load_bytes(bytes),
            FetchEvent::Error(message) => self.report_error(WaveError::Io(message)),
        }
    }

    /// Start decoding fetched bytes. Empty content is reported immediately.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) {
        if bytes.is_empty() {
            debug!("fetched content was empty");
            self.pending = None;
            self.emit_load_state(LoadState::Empty, 0.0);
            return;
        }
        if self.load_state != LoadState::Loading {
            self.begin_loading();
        }
        self.clear_peaks();
        match self.engine.load_source(bytes) {
            Ok(pending) => self.pending = Some(pending),
            Err(err) => self.report_error(err),
        }
    }

    /// Apply the decode result if it has arrived.
    pub fn poll_load(&mut self) -> Option<LoadOutcome> {
        let mut pending = self.pending.take()?;
        match self.engine.poll_load(&mut pending) {
            Some(outcome) => {
                self.apply_outcome(outcome.clone());
                Some(outcome)
            }
            None => {
                self.pending = Some(pending);
                None
            }
        }
    }

    /// Block until the in-flight decode finishes.
    pub fn wait_load(&mut self) -> Option<LoadOutcome> {
        let pending = self.pending.take()?;
        let outcome = self.engine.wait_load(pending);
        self.apply_outcome(outcome.clone());
        Some(outcome)
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Decoded { duration } => {
                self.emit_load_state(LoadState::Success, duration);
                self.recompute_peaks();
            }
            LoadOutcome::DecodeFailed(err) => self.report_error(err),
            LoadOutcome::Empty => self.emit_load_state(LoadState::Empty, 0.0),
            LoadOutcome::Cancelled => debug!("load cancelled"),
        }
    }

    fn report_error(&mut self, err: WaveError) {
        warn!("load failed: {}", err);
        self.load_error = Some(err);
        self.emit_load_state(LoadState::Error, 0.0);
    }

    /// Layout change. A zero width clears the waveform.
    pub fn resize(&mut self, width: u32) {
        self.width = width;
        self.recompute_peaks();
    }

    fn recompute_peaks(&mut self) {
        if self.width == 0 {
            self.clear_peaks();
            return;
        }
        if self.load_state != LoadState::Success {
            return;
        }
        let bits = self.settings.bits.as_u32();
        match self
            .engine
            .compute_peaks(self.width, self.settings.mono, bits)
        {
            Ok(peaks) => {
                self.renderer.set_peaks(Some(&peaks));
                self.peaks = Some(peaks);
                refresh(
                    &mut self.engine,
                    self.renderer.as_mut(),
                    self.callback.as_mut(),
                );
            }
            Err(err) => warn!("failed to compute peaks: {}", err),
        }
    }

    fn clear_peaks(&mut self) {
        if self.peaks.take().is_some() {
            self.renderer.set_peaks(None);
        }
    }

    pub fn play(&mut self) -> Result<()> {
        self.engine.play()?;
        self.progress.start(
            &mut self.engine,
            &mut self.frames,
            self.renderer.as_mut(),
            self.callback.as_mut(),
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.progress.cancel(&mut self.frames);
    }

    /// Seek and bring the cursor up to date.
    pub fn seek_to(&mut self, seconds: f64, mode: ResumeMode) -> Result<()> {
        self.engine.seek(seconds, mode)?;
        if self.engine.is_playing() {
            if !self.progress.is_running() {
                self.progress.start(
                    &mut self.engine,
                    &mut self.frames,
                    self.renderer.as_mut(),
                    self.callback.as_mut(),
                );
            }
        } else {
            self.progress.cancel(&mut self.frames);
            refresh(
                &mut self.engine,
                self.renderer.as_mut(),
                self.callback.as_mut(),
            );
        }
        Ok(())
    }

    /// Seek to the time under pixel column `x`.
    pub fn seek_to_pixel(&mut self, x: f64) -> Result<()> {
        let seconds = self.hover_time(x);
        self.seek_to(seconds, ResumeMode::Unspecified)
    }

    /// Time under pixel column `x`, never negative.
    pub fn hover_time(&self, x: f64) -> f64 {
        self.engine.pixels_to_seconds(x).max(0.0)
    }

    pub fn change_volume(&mut self, volume: f32) -> Result<()> {
        self.engine.change_volume(volume)?;
        self.settings.volume = self.engine.volume();
        Ok(())
    }

    pub fn change_playback_rate(&mut self, rate: f32) -> Result<()> {
        self.engine.change_playback_rate(rate)?;
        self.settings.playback_rate = self.engine.playback_rate();
        Ok(())
    }

    /// Tear everything down. The session cannot play afterwards.
    pub fn destroy(&mut self) {
        self.pause();
        self.engine.destroy();
        self.pending = None;
        self.unbind();
        self.clear_peaks();
        self.emit_load_state(LoadState::Init, 0.0);
    }

    /// Route commands published on `bus` to this session.
    pub fn bind(&mut self, bus: &ControlBus) {
        self.unbind();
        self.binding = Some(Binding {
            bus: bus.clone(),
            receiver: bus.subscribe(),
        });
    }

    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.bus.release(&binding.receiver);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        debug!("command {:?}", command);
        match command {
            Command::Play => self.play(),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Volume(volume) => self.change_volume(volume),
            Command::PlaybackRate(rate) => self.change_playback_rate(rate),
            Command::SeekTo { seconds, mode } => self.seek_to(seconds, mode),
            Command::Destroy => {
                self.destroy();
                Ok(())
            }
        }
    }

    /// The host's per-frame redraw hook.
    ///
    /// Pumps the load and the engine, applies queued commands, then runs the
    /// progress tick if one is due. Engine events are applied before
    /// commands. Returns whether the session still needs frames.
    pub fn on_frame(&mut self) -> bool {
        self.poll_load();

        for event in self.engine.poll_events() {
            match event {
                EngineEvent::Ended => {
                    self.renderer.change_offset_pixels(0);
                    self.callback.on_event(WaveEvent::PlayEnded);
                    self.callback.on_event(WaveEvent::CurrentTimeChanged(0.0));
                    self.progress.cancel(&mut self.frames);
                }
            }
        }

        let commands = match self.binding.as_ref() {
            Some(binding) => binding.receiver.drain(),
            None => Vec::new(),
        };
        for command in commands {
            if let Err(err) = self.handle_command(command) {
                warn!("command {:?} failed: {}", command, err);
            }
        }

        if let Some(id) = self.frames.take_due() {
            self.progress.on_frame(
                id,
                &mut self.engine,
                &mut self.frames,
                self.renderer.as_mut(),
                self.callback.as_mut(),
            );
        }

        self.pending.is_some() || self.progress.is_running()
    }

    pub fn engine(&self) -> &AudioEngine<'ctx> {
        &self.engine
    }

    pub fn settings(&self) -> &WaveSettings {
        &self.settings
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Why the last load failed, while the session is in `LoadState::Error`.
    pub fn load_error(&self) -> Option<&WaveError> {
        self.load_error.as_ref()
    }

    pub fn error_text(&self) -> Option<String> {
        self.load_error.as_ref().map(WaveError::to_string)
    }

    pub fn peaks(&self) -> Option<&PeakData> {
        self.peaks.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for WaveSession<'_> {
    fn drop(&mut self) {
        self.unbind();
    }
}
