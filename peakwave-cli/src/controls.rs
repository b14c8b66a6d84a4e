use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use peakwave_lib::control::Command;
use peakwave_lib::engine::{BackendKind, PlaybackSnapshot, PlaybackState, ResumeMode};
use peakwave_lib::timefmt::{format_percent, format_time, TimeFormat};
use peakwave_lib::wave::LoadState;

const SEEK_STEP: f64 = 5.0;
const VOLUME_STEP: f32 = 0.05;
const RATE_STEP: f32 = 0.25;
const MIN_RATE: f32 = 0.25;
const MAX_RATE: f32 = 4.0;

pub const HELP: &str =
    "space=play/pause  ←/→=seek 5s  -/= volume  [/] rate  home=restart  q=quit";

/// What the input loop should do after one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Idle,
    Quit,
    Resize(u16),
    Publish(Command),
}

pub fn status_text(snapshot: &PlaybackSnapshot, load_state: LoadState) -> String {
    let state = match snapshot.state {
        PlaybackState::Playing => "▶ Playing",
        PlaybackState::Paused => "⏸ Paused",
        PlaybackState::Ready => "■ Ready",
        PlaybackState::Loading => "… Loading",
        PlaybackState::Idle => "Idle",
        PlaybackState::Error => "✖ Error",
    };
    let percent = if snapshot.duration > 0.0 {
        format_percent((snapshot.position / snapshot.duration).min(1.0), 1)
    } else {
        String::new()
    };
    let rate = match snapshot.backend {
        BackendKind::RateAdjustable => format!("{}x", snapshot.playback_rate),
        BackendKind::Visualizable => "n/a".to_string(),
    };
    format!(
        "{}   {} / {}   {}\nvolume: {}  rate: {}  backend: {}  load: {:?}",
        state,
        format_time(snapshot.position, TimeFormat::ClockTenths),
        format_time(snapshot.duration, TimeFormat::ClockTenths),
        percent,
        format_percent(f64::from(snapshot.volume), 0),
        rate,
        snapshot.backend.label(),
        load_state,
    )
}

/// Map a key press to a transport command.
pub fn action_for_key(code: KeyCode, snapshot: &PlaybackSnapshot) -> KeyAction {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') => {
            if snapshot.state == PlaybackState::Playing {
                KeyAction::Publish(Command::Pause)
            } else {
                KeyAction::Publish(Command::Play)
            }
        }
        KeyCode::Left => KeyAction::Publish(Command::SeekTo {
            seconds: (snapshot.position - SEEK_STEP).max(0.0),
            mode: ResumeMode::Unspecified,
        }),
        KeyCode::Right => KeyAction::Publish(Command::SeekTo {
            seconds: (snapshot.position + SEEK_STEP).min(snapshot.duration),
            mode: ResumeMode::Unspecified,
        }),
        KeyCode::Home => KeyAction::Publish(Command::SeekTo {
            seconds: 0.0,
            mode: ResumeMode::Unspecified,
        }),
        KeyCode::Char('-') => {
            KeyAction::Publish(Command::Volume((snapshot.volume - VOLUME_STEP).max(0.0)))
        }
        KeyCode::Char('=') | KeyCode::Char('+') => {
            KeyAction::Publish(Command::Volume((snapshot.volume + VOLUME_STEP).min(1.0)))
        }
        KeyCode::Char('[') | KeyCode::Char(']')
            if snapshot.backend != BackendKind::RateAdjustable =>
        {
            KeyAction::Idle
        }
        KeyCode::Char('[') => KeyAction::Publish(Command::PlaybackRate(
            (snapshot.playback_rate - RATE_STEP).max(MIN_RATE),
        )),
        KeyCode::Char(']') => KeyAction::Publish(Command::PlaybackRate(
            (snapshot.playback_rate + RATE_STEP).min(MAX_RATE),
        )),
        _ => KeyAction::Idle,
    }
}

/// Wait up to `timeout` for terminal input.
pub fn poll_input(snapshot: &PlaybackSnapshot, timeout: Duration) -> KeyAction {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return KeyAction::Idle,
        // No terminal attached; keep the frame pacing anyway.
        Err(_) => {
            std::thread::sleep(timeout);
            return KeyAction::Idle;
        }
    }
    match event::read() {
        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            action_for_key(key.code, snapshot)
        }
        Ok(Event::Resize(columns, _)) => KeyAction::Resize(columns),
        _ => KeyAction::Idle,
    }
}
