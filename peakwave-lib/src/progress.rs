//! Frame-driven loop that keeps the progress cursor in step with playback.
//!
//! The host supplies frames through a [`FrameScheduler`]. Each tick reads the
//! engine clock, forwards changed pixel offsets to the renderer and the
//! current time to the host callback, then asks for the next frame. The loop
//! ends itself on the first tick that finds the engine not playing.

use log::debug;

use crate::engine::AudioEngine;
use crate::wave::{ProgressRenderer, WaveCallback, WaveEvent};

pub type FrameId = u64;

/// One-shot redraw registration, fired by the host.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

/// Scheduler holding at most one pending frame, fired by the host's redraw.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: FrameId,
    pending: Option<FrameId>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending frame, if any, so it can be run.
    pub fn take_due(&mut self) -> Option<FrameId> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameId {
        self.next_id += 1;
        self.pending = Some(self.next_id);
        self.next_id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

/// Push the engine position to the renderer and the host callback.
///
/// The clock is read once per call. Pixels are only forwarded when they
/// changed since the last report.
pub fn refresh(
    engine: &mut AudioEngine<'_>,
    renderer: &mut dyn ProgressRenderer,
    callback: &mut dyn WaveCallback,
) {
    let time = engine.current_offset_time();
    if let Some(pixels) = engine.current_offset_pixels_at(time) {
        renderer.change_offset_pixels(pixels);
    }
    callback.on_event(WaveEvent::CurrentTimeChanged(time));
}

#[derive(Debug, Default)]
pub struct ProgressLoop {
    pending: Option<FrameId>,
}

impl ProgressLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Begin the loop, replacing any pending registration, and tick once now.
    pub fn start(
        &mut self,
        engine: &mut AudioEngine<'_>,
        scheduler: &mut dyn FrameScheduler,
        renderer: &mut dyn ProgressRenderer,
        callback: &mut dyn WaveCallback,
    ) -> bool {
        self.cancel(scheduler);
        self.tick(engine, scheduler, renderer, callback)
    }

    /// Run the frame `id` if it is the one this loop registered.
    pub fn on_frame(
        &mut self,
        id: FrameId,
        engine: &mut AudioEngine<'_>,
        scheduler: &mut dyn FrameScheduler,
        renderer: &mut dyn ProgressRenderer,
        callback: &mut dyn WaveCallback,
    ) -> bool {
        if self.pending != Some(id) {
            debug!("ignoring stale frame {}", id);
            return false;
        }
        self.pending = None;
        self.tick(engine, scheduler, renderer, callback)
    }

    /// One loop iteration. Returns whether another frame was requested.
    pub fn tick(
        &mut self,
        engine: &mut AudioEngine<'_>,
        scheduler: &mut dyn FrameScheduler,
        renderer: &mut dyn ProgressRenderer,
        callback: &mut dyn WaveCallback,
    ) -> bool {
        if !engine.is_playing() {
            self.cancel(scheduler);
            return false;
        }
        refresh(engine, renderer, callback);
        if let Some(id) = self.pending.take() {
            scheduler.cancel_frame(id);
        }
        self.pending = Some(scheduler.request_frame());
        true
    }

    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel_frame(id);
        }
    }
}
