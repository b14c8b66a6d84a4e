use std::{cell::Cell, fs, io, rc::Rc, time::Duration};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info, warn};
use peakwave_lib::context::{DeviceContext, ManualContext};
use peakwave_lib::control::ControlBus;
use peakwave_lib::engine::ResumeMode;
use peakwave_lib::fetch;
use peakwave_lib::peaks::Bits;
use peakwave_lib::wave::{LoadState, NullRenderer, WaveEvent, WaveSession, WaveSettings};
use peakwave_lib::{Result, WaveError};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::controls::{self, KeyAction};
use crate::logging::{self, LogBuffer};
use crate::ui;
use crate::view::TerminalRenderer;

const FRAME_INTERVAL: Duration = Duration::from_millis(30);
const QUIET_WIDTH: u32 = 80;

pub fn run(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32> {
    info!("Starting Peakwave CLI");
    match args.subcommand() {
        Some(("peaks", sub)) => run_peaks(sub),
        Some(("play", sub)) => run_play(sub, log_buffer),
        _ => Ok(2),
    }
}

/// Settings from `--settings`, overridden by explicit flags.
fn load_settings(args: &ArgMatches) -> Result<WaveSettings> {
    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => WaveSettings::from_json(&fs::read_to_string(path)?)?,
        None => WaveSettings::default(),
    };
    if let Some(bits) = args.get_one::<String>("bits") {
        let bits = bits
            .parse::<u32>()
            .map_err(|err| WaveError::InvalidParameter(format!("bits: {}", err)))?;
        settings.set_bits(Bits::try_from(bits)?);
    }
    if args.get_flag("stereo") {
        settings.set_mono(false);
    }
    if args.try_get_one::<bool>("rate-adjustable").ok().flatten() == Some(&true) {
        settings.set_rate_adjustable(true);
    }
    if let Some(gain) = args.try_get_one::<f32>("GAIN").ok().flatten() {
        settings.set_volume(gain / 100.0);
    }
    if let Some(rate) = args.try_get_one::<f32>("rate").ok().flatten() {
        settings.set_playback_rate(*rate);
    }
    Ok(settings)
}

/// Fetch `path` into `session` and wait for the decode.
fn load_file(session: &mut WaveSession<'_>, path: &str) -> Result<()> {
    session.begin_loading();
    fetch::read_file(path, |event| session.handle_fetch_event(event));
    session.wait_load();
    match session.load_state() {
        LoadState::Success => Ok(()),
        LoadState::Empty => Err(WaveError::Decode(format!("{}: no audio content", path))),
        _ => Err(session
            .load_error()
            .cloned()
            .unwrap_or_else(|| WaveError::InvalidState("load did not complete".to_string()))),
    }
}

fn run_peaks(args: &ArgMatches) -> Result<i32> {
    let path = input_path(args)?;
    let settings = load_settings(args)?;
    let width = args.get_one::<u32>("width").copied().unwrap_or(800);

    // Peaks only need decoded audio, not an output device.
    let context = ManualContext::new();
    let mut session = WaveSession::new(
        &context,
        settings,
        Box::new(NullRenderer),
        Box::new(|_event: WaveEvent| {}),
    );
    session.resize(width);
    load_file(&mut session, &path)?;

    let peaks = session
        .peaks()
        .ok_or_else(|| WaveError::InvalidState("no peaks were computed".to_string()))?;
    println!("{}", peaks.to_json()?);
    Ok(0)
}

fn input_path(args: &ArgMatches) -> Result<String> {
    args.get_one::<String>("INPUT")
        .cloned()
        .ok_or_else(|| WaveError::InvalidParameter("missing input path".to_string()))
}

fn run_play(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32> {
    let path = input_path(args)?;
    let settings = load_settings(args)?;
    let quiet = args.get_flag("quiet");
    let seek = args.get_one::<f64>("seek").copied();

    let context = DeviceContext::open_default()?;
    let renderer = TerminalRenderer::new();
    let view = renderer.view();
    let ended = Rc::new(Cell::new(false));
    let ended_flag = Rc::clone(&ended);
    let callback = move |event: WaveEvent| match event {
        WaveEvent::LoadStateChanged { state, duration } => {
            info!("load state {:?} ({:.2}s)", state, duration)
        }
        WaveEvent::LoadProgress { percent, .. } if !percent.is_empty() => {
            debug!("loaded {}", percent)
        }
        WaveEvent::PlayEnded => ended_flag.set(true),
        _ => {}
    };

    let mut session = WaveSession::new(&context, settings, Box::new(renderer), Box::new(callback));
    let bus = ControlBus::new();
    session.bind(&bus);

    let columns = terminal::size().map(|(columns, _)| columns).ok();
    let width = match columns {
        Some(columns) if !quiet => ui::waveform_width(columns),
        _ => QUIET_WIDTH,
    };
    session.resize(width);
    load_file(&mut session, &path)?;
    info!(
        "playing {} on the {} backend",
        path,
        session.engine().backend_kind().label()
    );

    if let Some(seconds) = seek {
        session.seek_to(seconds, ResumeMode::Pause)?;
    }
    session.play()?;

    let _raw_mode = RawModeGuard::enable().ok();
    let mut terminal = if !quiet {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    } else {
        None
    };

    // UI / input loop.
    while !ended.get() && !session.engine().is_destroyed() {
        session.on_frame();
        let snapshot = session.engine().snapshot();

        if let Some(term) = terminal.as_mut() {
            let status = controls::status_text(&snapshot, session.load_state());
            let log_lines = logging::snapshot(&log_buffer);
            ui::draw(term, &status, &view.borrow(), &log_lines);
        }

        match controls::poll_input(&snapshot, FRAME_INTERVAL) {
            KeyAction::Idle => {}
            KeyAction::Quit => session.destroy(),
            KeyAction::Resize(columns) => session.resize(ui::waveform_width(columns)),
            KeyAction::Publish(command) => {
                if !bus.publish(command) {
                    warn!("{:?} was not delivered", command);
                }
            }
        }
    }

    if let Some(err) = session.engine().last_error() {
        error!("playback stopped: {}", err);
    }

    // Restore the terminal state before exiting.
    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }

    Ok(0)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::build_cli;
    use std::io::Write;

    fn sub_matches(argv: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn flags_override_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mono": true, "bits": 8, "rate": 1.25}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = sub_matches(&[
            "peakwave", "play", "a.wav", "--settings", &path, "--stereo", "-g", "50",
        ]);
        let settings = load_settings(&args).unwrap();
        assert!(!settings.mono);
        assert_eq!(settings.bits, Bits::Eight);
        assert_eq!(settings.volume, 0.5);
        assert_eq!(settings.playback_rate, 1.25);
        assert!(!settings.rate_adjustable);
    }

    #[test]
    fn peaks_subcommand_has_no_transport_flags() {
        let args = sub_matches(&["peakwave", "peaks", "a.wav", "--bits", "32"]);
        let settings = load_settings(&args).unwrap();
        assert_eq!(settings.bits, Bits::ThirtyTwo);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn malformed_settings_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let args = sub_matches(&["peakwave", "peaks", "a.wav", "--settings", &path]);
        assert!(matches!(
            load_settings(&args),
            Err(WaveError::InvalidParameter(_))
        ));
    }
}
