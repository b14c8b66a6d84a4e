use std::collections::VecDeque;
use std::sync::Arc;

use log::warn;

use crate::audio::DecodedAudio;
use crate::context::{AudioContext, MediaElement};
use crate::error::{Result, WaveError};

use super::transport::{BackendKind, Transport, TransportEvent};

/// Transport over a media element that keeps its own position.
pub struct RateAdjustableBackend<'ctx> {
    context: &'ctx dyn AudioContext,
    media: Option<Box<dyn MediaElement>>,
    playing: bool,
    events: VecDeque<TransportEvent>,
    end_reported: bool,
}

impl<'ctx> RateAdjustableBackend<'ctx> {
    pub fn new(context: &'ctx dyn AudioContext) -> Self {
        Self {
            context,
            media: None,
            playing: false,
            events: VecDeque::new(),
            end_reported: false,
        }
    }

    fn media_mut(&mut self) -> Result<&mut Box<dyn MediaElement>> {
        self.media
            .as_mut()
            .ok_or_else(|| WaveError::InvalidState("no media attached".to_string()))
    }
}

impl Transport for RateAdjustableBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::RateAdjustable
    }

    fn attach(&mut self, audio: Arc<DecodedAudio>) -> Result<()> {
        self.release();
        self.media = Some(self.context.create_media(audio)?);
        Ok(())
    }

    fn start(&mut self, volume: f32) -> Result<()> {
        let media = self.media_mut()?;
        media.set_volume(volume);
        media.play()?;
        self.playing = true;
        self.end_reported = false;
        Ok(())
    }

    fn stop(&mut self) {
        if !self.playing {
            return;
        }
        if let Some(media) = self.media.as_mut() {
            media.pause();
        }
        self.playing = false;
        self.events.push_back(TransportEvent::Stopped);
    }

    fn set_position(&mut self, seconds: f64) -> Result<()> {
        self.media_mut()?.set_current_time(seconds)
    }

    fn current_time(&self) -> f64 {
        self.media.as_ref().map_or(0.0, |media| media.current_time())
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(media) = self.media.as_mut() {
            media.set_volume(volume);
        }
    }

    fn set_playback_rate(&mut self, rate: f32) -> bool {
        if let Some(media) = self.media.as_mut() {
            media.set_playback_rate(rate);
        }
        true
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        let ended = self.media.as_ref().is_some_and(|media| media.has_ended());
        if self.playing && ended && !self.end_reported {
            self.end_reported = true;
            return Some(TransportEvent::Ended);
        }
        None
    }

    fn rewind(&mut self) {
        if let Some(media) = self.media.as_mut() {
            media.pause();
            if let Err(err) = media.set_current_time(0.0) {
                warn!("failed to rewind media: {}", err);
            }
        }
        self.playing = false;
        self.events.clear();
        self.end_reported = false;
    }

    fn release(&mut self) {
        self.rewind();
        self.media = None;
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
    fn repositions_in_place_while_playing() {
        let context = ManualContext::new();
        let mut backend = RateAdjustableBackend::new(&context);
        backend.attach(audio()).unwrap();
        backend.start(0.5).unwrap();
        assert_eq!(context.last_media_volume(), Some(0.5));

        context.advance(1.0);
        backend.set_position(6.0).unwrap();
        context.advance(1.0);
        assert_eq!(backend.current_time(), 7.0);
        assert_eq!(backend.poll_event(), None);
    }

    #[test]
    fn rate_scales_elapsed_time() {
        let context = ManualContext::new();
        let mut backend = RateAdjustableBackend::new(&context);
        backend.attach(audio()).unwrap();
        assert!(backend.set_playback_rate(2.0));
        backend.start(1.0).unwrap();
        context.advance(2.0);
        assert_eq!(backend.current_time(), 4.0);
    }

    #[test]
    fn end_then_rewind() {
        let context = ManualContext::new();
        let mut backend = RateAdjustableBackend::new(&context);
        backend.attach(audio()).unwrap();
        backend.start(1.0).unwrap();
        context.advance(12.0);
        assert_eq!(backend.poll_event(), Some(TransportEvent::Ended));
        assert_eq!(backend.poll_event(), None);

        backend.rewind();
        assert_eq!(backend.current_time(), 0.0);
    }

    #[test]
    fn requires_attached_media() {
        let context = ManualContext::new();
        let mut backend = RateAdjustableBackend::new(&context);
        assert!(matches!(backend.start(1.0), Err(WaveError::InvalidState(_))));
        assert!(backend.set_position(1.0).is_err());
    }
}
