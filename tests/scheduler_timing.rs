//! Tick-level timing of the scheduler against a manual clock.

use gradus::dsl::NoteDuration;
use gradus::event::{ManualClock, Pitch, PitchEvent, PlayState, Replay, Scheduler};
use gradus::instrument::{InstrumentRouter, RecordingInstrument, TriggerLog};

fn d(s: &str) -> NoteDuration {
    s.parse().unwrap()
}

fn note(dur: &str, p: i32) -> PitchEvent {
    PitchEvent::note(d(dur), Pitch(p))
}

fn arpeggio(dur: &str, pitches: &[i32]) -> PitchEvent {
    PitchEvent::Arpeggio {
        duration: d(dur),
        children: pitches.iter().map(|&p| note(dur, p)).collect(),
    }
}

/// 60 bpm: a quarter note lasts one second.
fn scheduler(interval: f64) -> (Scheduler, TriggerLog) {
    let inst = RecordingInstrument::new("rec");
    let log = inst.log();
    let router = InstrumentRouter::new().with_fallback(Box::new(inst));
    (Scheduler::new(Box::new(ManualClock::new(60.0)), router, interval), log)
}

#[test]
fn whole_note_sustains_for_three_ticks() {
    let (mut s, log) = scheduler(1.0);
    s.add_stream(0, vec![note("1n", 60), note("4n", 62)], false);
    s.start();

    s.tick();
    assert_eq!(log.len(), 1);
    for _ in 0..3 {
        s.tick();
        assert_eq!(log.len(), 1);
    }
    s.tick();
    assert_eq!(log.pitches(), vec![vec![60], vec![62]]);
}

#[test]
fn unbounded_stream_rewinds_instead_of_finishing() {
    let (mut s, _) = scheduler(1.0);
    s.add_stream(0, vec![note("4n", 60), note("4n", 62)], true);
    s.start();
    s.tick();
    s.tick();
    assert_eq!(s.streams()[0].index(), 2);
    s.tick();
    let stream = &s.streams()[0];
    assert_eq!(stream.index(), 1);
    assert_eq!(stream.loops(), 1);
    assert!(!stream.is_finished());
}

#[test]
fn rests_take_time_but_trigger_nothing() {
    let (mut s, log) = scheduler(1.0);
    s.add_stream(0, vec![PitchEvent::rest(d("2n")), note("4n", 60)], false);
    s.start();
    s.tick();
    s.tick();
    assert!(log.is_empty());
    s.tick();
    assert_eq!(log.pitches(), vec![vec![60]]);
}

#[test]
fn arpeggio_members_fire_on_sub_turns() {
    let (mut s, log) = scheduler(0.25);
    s.add_stream(0, vec![arpeggio("4n", &[60, 64])], false);
    s.start();
    // Four ticks per quarter, two members: one member every second tick.
    let mut counts = Vec::new();
    for _ in 0..4 {
        s.tick();
        counts.push(log.len());
    }
    assert_eq!(counts, vec![1, 1, 2, 2]);
    assert_eq!(log.pitches(), vec![vec![60], vec![64]]);
}

#[test]
fn short_arpeggio_collapses_into_one_trigger() {
    let (mut s, log) = scheduler(1.0);
    s.add_stream(0, vec![arpeggio("4n", &[60, 64, 67])], false);
    s.start();
    s.tick();
    assert_eq!(log.pitches(), vec![vec![60, 64, 67]]);
}

#[test]
fn playback_stops_once_every_stream_finishes() {
    let (mut s, log) = scheduler(1.0);
    s.add_stream(0, vec![note("4n", 60)], false);
    s.start();
    let ran = s.run(Some(100), &mut Replay);
    assert_eq!(ran, 2);
    assert_eq!(s.state(), PlayState::Stopped);
    assert_eq!(log.releases(), 1);
}
