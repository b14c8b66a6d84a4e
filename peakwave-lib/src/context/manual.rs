use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::audio::DecodedAudio;
use crate::error::Result;

use super::{AudioContext, MediaElement, SourceNode};

#[derive(Debug, Default)]
struct SourceLog {
    started: usize,
    live: usize,
    last_gain: Option<f32>,
    media_volume: Option<f32>,
}

/// Context whose clock only moves when told to.
///
/// No samples are rendered. Sources and media elements derive their
/// position from the clock, which makes transport behavior reproducible.
#[derive(Debug, Default)]
pub struct ManualContext {
    clock: Rc<Cell<f64>>,
    log: Rc<RefCell<SourceLog>>,
}

impl ManualContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `seconds`. Negative steps are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.clock.set(self.clock.get() + seconds);
        }
    }

    /// Jump the clock to `seconds` if that is not in the past.
    pub fn set_time(&self, seconds: f64) {
        if seconds > self.clock.get() {
            self.clock.set(seconds);
        }
    }

    /// Source graphs started and not yet stopped.
    pub fn live_sources(&self) -> usize {
        self.log.borrow().live
    }

    /// Source graphs started over the context's lifetime.
    pub fn sources_started(&self) -> usize {
        self.log.borrow().started
    }

    /// Gain most recently applied to any source graph.
    pub fn last_source_gain(&self) -> Option<f32> {
        self.log.borrow().last_gain
    }

    /// Volume most recently applied to any media element.
    pub fn last_media_volume(&self) -> Option<f32> {
        self.log.borrow().media_volume
    }
}

impl AudioContext for ManualContext {
    fn current_time(&self) -> f64 {
        self.clock.get()
    }

    fn start_source(
        &self,
        audio: Arc<DecodedAudio>,
        offset: f64,
        gain: f32,
    ) -> Result<Box<dyn SourceNode>> {
        {
            let mut log = self.log.borrow_mut();
            log.started += 1;
            log.live += 1;
            log.last_gain = Some(gain);
        }
        Ok(Box::new(ManualSource {
            clock: Rc::clone(&self.clock),
            log: Rc::clone(&self.log),
            started_at: self.clock.get(),
            offset,
            duration: audio.duration(),
            stopped: false,
        }))
    }

    fn create_media(&self, audio: Arc<DecodedAudio>) -> Result<Box<dyn MediaElement>> {
        Ok(Box::new(ManualMedia {
            clock: Rc::clone(&self.clock),
            log: Rc::clone(&self.log),
            duration: audio.duration(),
            base: 0.0,
            started_at: None,
            rate: 1.0,
        }))
    }
}

struct ManualSource {
    clock: Rc<Cell<f64>>,
    log: Rc<RefCell<SourceLog>>,
    started_at: f64,
    offset: f64,
    duration: f64,
    stopped: bool,
}

impl SourceNode for ManualSource {
    fn set_gain(&mut self, gain: f32) {
        self.log.borrow_mut().last_gain = Some(gain);
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            let mut log = self.log.borrow_mut();
            log.live = log.live.saturating_sub(1);
        }
    }

    fn has_finished(&self) -> bool {
        !self.stopped && self.clock.get() - self.started_at + self.offset >= self.duration
    }
}

impl Drop for ManualSource {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ManualMedia {
    clock: Rc<Cell<f64>>,
    log: Rc<RefCell<SourceLog>>,
    duration: f64,
    base: f64,
    started_at: Option<f64>,
    rate: f64,
}

impl ManualMedia {
    fn position(&self) -> f64 {
        let elapsed = match self.started_at {
            Some(started_at) => (self.clock.get() - started_at) * self.rate,
            None => 0.0,
        };
        (self.base + elapsed).min(self.duration)
    }
}

impl MediaElement for ManualMedia {
    fn play(&mut self) -> Result<()> {
        if self.started_at.is_some() {
            return Ok(());
        }
        if self.base >= self.duration {
            self.base = 0.0;
        }
        self.started_at = Some(self.clock.get());
        Ok(())
    }

    fn pause(&mut self) {
        self.base = self.position();
        self.started_at = None;
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<()> {
        self.base = seconds.clamp(0.0, self.duration);
        if self.started_at.is_some() {
            self.started_at = Some(self.clock.get());
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().media_volume = Some(volume);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.base = self.position();
        if self.started_at.is_some() {
            self.started_at = Some(self.clock.get());
        }
        self.rate = f64::from(rate);
    }

    fn has_ended(&self) -> bool {
        self.started_at.is_some() && self.position() >= self.duration
    }
}
