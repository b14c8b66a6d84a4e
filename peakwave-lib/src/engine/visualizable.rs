use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;

use crate::audio::DecodedAudio;
use crate::context::{AudioContext, SourceNode};
use crate::error::{Result, WaveError};

use super::transport::{BackendKind, Transport, TransportEvent};

/// Transport built from one-shot source graphs.
///
/// A started source cannot be repositioned or restarted, so every `start`
/// creates a new graph and every `stop` tears the current one down.
/// Elapsed time is `clock - start_reference + paused_at`.
pub struct VisualizableBackend<'ctx> {
    context: &'ctx dyn AudioContext,
    audio: Option<Arc<DecodedAudio>>,
    node: Option<Box<dyn SourceNode>>,
    start_reference: f64,
    paused_at: f64,
    volume: f32,
    events: VecDeque<TransportEvent>,
    finish_reported: bool,
}

impl<'ctx> VisualizableBackend<'ctx> {
    pub fn new(context: &'ctx dyn AudioContext) -> Self {
        Self {
            context,
            audio: None,
            node: None,
            start_reference: 0.0,
            paused_at: 0.0,
            volume: 1.0,
            events: VecDeque::new(),
            finish_reported: false,
        }
    }

    fn duration(&self) -> f64 {
        self.audio.as_ref().map_or(0.0, |audio| audio.duration())
    }

    fn teardown(&mut self) {
        if let Some(mut node) = self.node.take() {
            node.stop();
        }
    }
}

impl Transport for VisualizableBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Visualizable
    }

    fn attach(&mut self, audio: Arc<DecodedAudio>) -> Result<()> {
        self.release();
        self.audio = Some(audio);
        Ok(())
    }

    fn start(&mut self, volume: f32) -> Result<()> {
        if self.node.is_some() {
            return Ok(());
        }
        let audio = self
            .audio
            .clone()
            .ok_or_else(|| WaveError::InvalidState("no buffer attached".to_string()))?;
        self.volume = volume;
        let node = self.context.start_source(audio, self.paused_at, volume)?;
        self.start_reference = self.context.current_time();
        self.node = Some(node);
        self.finish_reported = false;
        Ok(())
    }

    fn stop(&mut self) {
        if self.node.is_none() {
            return;
        }
        self.paused_at = self.current_time();
        self.teardown();
        self.events.push_back(TransportEvent::Stopped);
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        if self.node.is_some() {
            return Err(WaveError::InvalidState(
                "cannot reposition a started source".to_string(),
            ));
        }
        self.paused_at = seconds.clamp(0.0, self.duration());
        Ok(())
    }

    fn current_time(&self) -> f64 {
        match self.node {
            Some(_) => {
                let elapsed = self.context.current_time() - self.start_reference;
                (elapsed + self.paused_at).min(self.duration())
            }
            None => self.paused_at,
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(node) = self.node.as_mut() {
            node.set_gain(volume);
        }
    }

    fn set_playback_rate(&mut self, _rate: f32) -> bool {
        false
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        let finished = self.node.as_ref().is_some_and(|node| node.has_finished());
        if finished && !self.finish_reported {
            self.finish_reported = true;
            return Some(TransportEvent::Ended);
        }
        None
    }

    fn rewind(&mut self) {
        self.teardown();
        self.paused_at = 0.0;
        self.events.clear();
        self.finish_reported = false;
    }

    fn release(&mut self) {
        self.rewind();
        if self.audio.take().is_some() {
            debug!("released visualizable buffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ManualContext;

    fn audio() -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio::new(100, vec![vec![0.0; 1_000]]).unwrap())
    }

    #[test]
    fn elapsed_time_accumulates_across_restarts() {
        let context = ManualContext::new();
        let mut backend = VisualizableBackend::new(&context);
        backend.attach(audio()).unwrap();

        backend.start(1.0).unwrap();
        context.advance(2.0);
        assert_eq!(backend.current_time(), 2.0);
        backend.stop();
        assert_eq!(backend.poll_event(), Some(TransportEvent::Stopped));
        assert_eq!(context.live_sources(), 0);

        context.advance(3.0);
        assert_eq!(backend.current_time(), 2.0);
        backend.start(1.0).unwrap();
        context.advance(1.5);
        assert_eq!(backend.current_time(), 3.5);
        assert_eq!(context.sources_started(), 2);
    }

    #[test]
    fn started_source_cannot_be_repositioned() {
        let context = ManualContext::new();
        let mut backend = VisualizableBackend::new(&context);
        backend.attach(audio()).unwrap();
        backend.start(1.0).unwrap();
        assert!(backend.set_position(4.0).is_err());
        backend.stop();
        backend.set_position(40.0).unwrap();
        assert_eq!(backend.current_time(), 10.0);
    }

    #[test]
    fn natural_end_is_reported_once() {
        let context = ManualContext::new();
        let mut backend = VisualizableBackend::new(&context);
        backend.attach(audio()).unwrap();
        backend.start(1.0).unwrap();
        context.advance(11.0);
        assert_eq!(backend.current_time(), 10.0);
        assert_eq!(backend.poll_event(), Some(TransportEvent::Ended));
        assert_eq!(backend.poll_event(), None);
    }

    #[test]
    fn rate_changes_are_unsupported() {
        let context = ManualContext::new();
        let mut backend = VisualizableBackend::new(&context);
        assert!(!backend.set_playback_rate(2.0));
        assert!(backend.start(1.0).is_err());
    }
}
