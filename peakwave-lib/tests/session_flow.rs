mod common;

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use peakwave_lib::bars::{layout_bars, BarStyle};
use peakwave_lib::context::ManualContext;
use peakwave_lib::control::{Command, ControlBus};
use peakwave_lib::engine::{PlaybackState, ResumeMode};
use peakwave_lib::fetch::read_source;
use peakwave_lib::peaks::PeakData;
use peakwave_lib::wave::{LoadState, ProgressRenderer, WaveEvent, WaveSession, WaveSettings};

#[derive(Default)]
struct Canvas {
    peaks: Option<PeakData>,
    offsets: Vec<u64>,
}

struct SharedCanvas(Rc<RefCell<Canvas>>);

impl ProgressRenderer for SharedCanvas {
    fn set_peaks(&mut self, peaks: Option<&PeakData>) {
        self.0.borrow_mut().peaks = peaks.cloned();
    }

    fn change_offset_pixels(&mut self, pixels: u64) {
        self.0.borrow_mut().offsets.push(pixels);
    }
}

fn session<'a>(
    context: &'a ManualContext,
    settings: WaveSettings,
) -> (WaveSession<'a>, Rc<RefCell<Canvas>>, Rc<RefCell<Vec<WaveEvent>>>) {
    let canvas = Rc::new(RefCell::new(Canvas::default()));
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let session = WaveSession::new(
        context,
        settings,
        Box::new(SharedCanvas(Rc::clone(&canvas))),
        Box::new(move |event: WaveEvent| sink.borrow_mut().push(event)),
    );
    (session, canvas, events)
}

#[test]
fn fetched_bytes_become_a_drawn_waveform() {
    let context = ManualContext::new();
    let (mut session, canvas, events) = session(&context, WaveSettings::default());
    session.resize(40);

    let bytes = common::sine(4_000, 2, 100.0);
    let total = bytes.len() as u64;
    session.begin_loading();
    read_source(Cursor::new(bytes), Some(total), 4_096, |event| {
        session.handle_fetch_event(event)
    });
    session.wait_load();

    assert_eq!(session.load_state(), LoadState::Success);
    let canvas = canvas.borrow();
    let peaks = canvas.peaks.as_ref().unwrap();
    assert_eq!(peaks.length, 40);

    let bars = layout_bars(&peaks.channels[0], 40, 64.0, BarStyle::default(), 0);
    assert_eq!(bars.len(), 40);
    assert!(bars.iter().all(|bar| bar.y >= 0.0 && bar.y + bar.height <= 64.0));

    let progress: Vec<String> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            WaveEvent::LoadProgress { percent, .. } => Some(percent.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(progress.last().map(String::as_str), Some("100%"));
}

#[test]
fn frames_follow_playback_until_the_end() {
    let context = ManualContext::new();
    let (mut session, canvas, events) = session(&context, WaveSettings::default());
    session.load_bytes(common::sine(1_000, 2, 50.0));
    session.wait_load();
    session.resize(20);

    session.play().unwrap();
    for _ in 0..4 {
        context.advance(0.25);
        assert!(session.on_frame());
    }
    assert_eq!(canvas.borrow().offsets, vec![3, 5, 8, 10]);

    context.advance(1.5);
    assert!(!session.on_frame());
    assert_eq!(session.engine().state(), PlaybackState::Ready);
    assert_eq!(canvas.borrow().offsets.last(), Some(&0));
    assert!(events.borrow().contains(&WaveEvent::PlayEnded));

    // The loop is gone; further frames do nothing.
    let before = events.borrow().len();
    context.advance(1.0);
    session.on_frame();
    assert_eq!(events.borrow().len(), before);
}

#[test]
fn paused_seek_refreshes_the_cursor() {
    let context = ManualContext::new();
    let (mut session, canvas, events) = session(&context, WaveSettings::default());
    session.load_bytes(common::sine(1_000, 4, 50.0));
    session.wait_load();
    session.resize(40);

    session.seek_to(2.0, ResumeMode::Pause).unwrap();
    assert_eq!(canvas.borrow().offsets.last(), Some(&20));
    assert_eq!(
        events.borrow().last(),
        Some(&WaveEvent::CurrentTimeChanged(2.0))
    );
}

#[test]
fn rebinding_moves_control_to_the_new_session() {
    let context = ManualContext::new();
    let bus = ControlBus::new();
    let (mut first, _, _) = session(&context, WaveSettings::default());
    let (mut second, _, _) = session(&context, WaveSettings::default());
    for session in [&mut first, &mut second] {
        session.load_bytes(common::sine(1_000, 1, 50.0));
        session.wait_load();
    }

    first.bind(&bus);
    second.bind(&bus);
    let publisher = bus.clone();
    std::thread::spawn(move || publisher.publish(Command::Play))
        .join()
        .unwrap();
    first.on_frame();
    second.on_frame();

    assert_eq!(first.engine().state(), PlaybackState::Ready);
    assert!(second.engine().is_playing());

    second.destroy();
    assert!(!bus.publish(Command::Pause));
}

#[test]
fn rate_adjustable_session_applies_configured_rate() {
    let context = ManualContext::new();
    let mut settings = WaveSettings::default();
    settings.set_rate_adjustable(true);
    settings.set_playback_rate(1.5);
    let (mut session, _, _) = session(&context, settings);
    session.load_bytes(common::sine(1_000, 4, 50.0));
    session.wait_load();

    session.play().unwrap();
    context.advance(2.0);
    assert_eq!(session.engine().current_offset_time(), 3.0);
}
