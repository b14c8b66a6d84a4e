mod common;

use peakwave_lib::context::ManualContext;
use peakwave_lib::engine::{AudioEngine, EngineEvent, LoadOutcome, PlaybackState, ResumeMode};
use peakwave_lib::WaveError;

fn loaded(context: &ManualContext, rate_adjustable: bool) -> AudioEngine<'_> {
    let mut engine = AudioEngine::new(context, rate_adjustable);
    let pending = engine.load_source(common::sine(8_000, 10, 220.0)).unwrap();
    assert_eq!(engine.state(), PlaybackState::Loading);
    assert_eq!(
        engine.wait_load(pending),
        LoadOutcome::Decoded { duration: 10.0 }
    );
    assert_eq!(engine.state(), PlaybackState::Ready);
    engine
}

#[test]
fn ten_second_source_at_500_pixels() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, false);
    let peaks = engine.compute_peaks(500, true, 16).unwrap();

    assert_eq!(engine.samples_per_pixel(), 160);
    assert_eq!(peaks.length, 500);
    assert_eq!(peaks.channels.len(), 1);
    assert_eq!(peaks.channels[0].len(), 1_000);
    assert!(peaks.channels[0]
        .values()
        .all(|value| (-32_768..=32_767).contains(&value)));
}

#[test]
fn play_then_pause_seek_on_buffer_backend() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, false);
    engine.play().unwrap();
    context.advance(1.25);
    engine.seek(5.0, ResumeMode::Pause).unwrap();

    assert_eq!(engine.paused_at_seconds(), 5.0);
    assert_eq!(engine.state(), PlaybackState::Paused);
    assert_eq!(context.live_sources(), 0);
}

#[test]
fn seek_while_playing_never_overlaps_graphs() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, false);
    engine.play().unwrap();
    context.advance(1.0);
    engine.seek(7.5, ResumeMode::Resume).unwrap();

    assert!(engine.is_playing());
    assert_eq!(context.live_sources(), 1);
    assert_eq!(context.sources_started(), 2);
    context.advance(0.5);
    assert_eq!(engine.current_offset_time(), 8.0);
}

#[test]
fn repeated_play_reports_a_single_end() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, false);
    engine.play().unwrap();
    engine.play().unwrap();
    assert_eq!(context.sources_started(), 1);

    context.advance(4.0);
    engine.pause();
    engine.play().unwrap();
    context.advance(7.0);

    let mut ended = 0;
    for _ in 0..3 {
        ended += engine
            .poll_events()
            .into_iter()
            .filter(|event| *event == EngineEvent::Ended)
            .count();
    }
    assert_eq!(ended, 1);
    assert_eq!(engine.state(), PlaybackState::Ready);
}

#[test]
fn pause_before_play_leaves_position_alone() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, false);
    engine.pause();
    assert_eq!(engine.state(), PlaybackState::Ready);
    assert_eq!(engine.paused_at_seconds(), 0.0);
}

#[test]
fn play_after_end_restarts_from_zero() {
    for rate_adjustable in [false, true] {
        let context = ManualContext::new();
        let mut engine = loaded(&context, rate_adjustable);
        engine.seek(6.0, ResumeMode::Resume).unwrap();
        context.advance(2.0);
        engine.ended();
        assert_eq!(engine.paused_at_seconds(), 0.0);

        engine.play().unwrap();
        context.advance(1.0);
        assert_eq!(engine.current_offset_time(), 1.0, "{}", rate_adjustable);
    }
}

#[test]
fn rate_adjustable_backend_seeks_in_place() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, true);
    assert!(engine.supports_playback_rate());
    engine.change_playback_rate(2.0).unwrap();
    engine.play().unwrap();
    context.advance(1.0);
    assert_eq!(engine.current_offset_time(), 2.0);

    engine.seek(3.0, ResumeMode::Unspecified).unwrap();
    assert!(engine.is_playing());
    context.advance(0.5);
    assert_eq!(engine.current_offset_time(), 4.0);

    engine.seek(9.0, ResumeMode::Pause).unwrap();
    assert_eq!(engine.state(), PlaybackState::Paused);
    context.advance(3.0);
    assert_eq!(engine.paused_at_seconds(), 9.0);
}

#[test]
fn natural_end_on_media_backend() {
    let context = ManualContext::new();
    let mut engine = loaded(&context, true);
    engine.play().unwrap();
    context.advance(10.5);
    assert_eq!(engine.poll_events(), vec![EngineEvent::Ended]);
    assert_eq!(engine.current_offset_time(), 0.0);
    assert!(engine.poll_events().is_empty());
}

#[test]
fn destroy_mid_decode_cancels_the_load() {
    let context = ManualContext::new();
    let mut engine = AudioEngine::new(&context, false);
    let pending = engine.load_source(common::sine(8_000, 2, 440.0)).unwrap();
    engine.destroy();

    assert_eq!(engine.wait_load(pending), LoadOutcome::Cancelled);
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(engine.audio().is_none());
}

#[test]
fn newer_load_supersedes_older_one() {
    let context = ManualContext::new();
    let mut engine = AudioEngine::new(&context, false);
    let first = engine.load_source(common::sine(8_000, 1, 440.0)).unwrap();
    let second = engine.load_source(common::sine(8_000, 3, 440.0)).unwrap();

    assert_eq!(engine.wait_load(first), LoadOutcome::Cancelled);
    assert_eq!(
        engine.wait_load(second),
        LoadOutcome::Decoded { duration: 3.0 }
    );
}

#[test]
fn failed_decode_can_be_retried() {
    let context = ManualContext::new();
    let mut engine = AudioEngine::new(&context, false);
    let pending = engine.load_source(vec![0x5a; 4_096]).unwrap();
    match engine.wait_load(pending) {
        LoadOutcome::DecodeFailed(WaveError::Decode(_)) => {}
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(engine.state(), PlaybackState::Error);
    assert!(engine.last_error().is_some());
    assert!(engine.play().is_err());

    let pending = engine.load_source(common::sine(8_000, 1, 440.0)).unwrap();
    assert_eq!(
        engine.wait_load(pending),
        LoadOutcome::Decoded { duration: 1.0 }
    );
    assert!(engine.last_error().is_none());
}

#[test]
fn empty_bytes_return_to_idle() {
    let context = ManualContext::new();
    let mut engine = AudioEngine::new(&context, false);
    let mut pending = engine.load_source(Vec::new()).unwrap();
    assert_eq!(engine.poll_load(&mut pending), Some(LoadOutcome::Empty));
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn stereo_peaks_keep_both_channels() {
    let context = ManualContext::new();
    let mut engine = AudioEngine::new(&context, false);
    let bytes = common::wav_bytes(4_000, 2, 4_000, |frame, channel| {
        let value = if frame % 2 == 0 { 0.5 } else { -0.5 };
        if channel == 0 {
            value
        } else {
            value / 2.0
        }
    });
    let pending = engine.load_source(bytes).unwrap();
    engine.wait_load(pending);

    let split = engine.compute_peaks(100, false, 8).unwrap();
    assert_eq!(split.channels.len(), 2);
    assert_eq!(split.channels[0].column(0), Some((-63, 63)));
    assert_eq!(split.channels[1].column(0), Some((-31, 31)));

    let mono = engine.compute_peaks(100, true, 8).unwrap();
    assert_eq!(mono.channels.len(), 1);
    assert_eq!(mono.channels[0].column(0), Some((-47, 47)));
}
