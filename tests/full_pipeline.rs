//! Full pipeline integration tests — program text → compile → flatten →
//! scheduler → recorded triggers.
//!
//! Everything runs on a ManualClock, so no real time passes.

use gradus::arpeggio::{arpeggiate, PlayMode};
use gradus::dsl::{parse_notation, parse_program, ErrorKind};
use gradus::event::{GradeEvent, Grade, ManualClock, PitchEvent, PlayState, Scheduler};
use gradus::instrument::{InstrumentRouter, RecordingInstrument, TriggerLog};
use gradus::{EngineConfig, Performance};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SEED: u64 = 42;

/// Helper: compile a program and wire it to a recording instrument.
/// At 60 bpm with a one-second tick every quarter note takes one tick.
fn build_pipeline(src: &str) -> (Performance, TriggerLog) {
    let song = parse_program(src).expect("compile failed");
    let inst = RecordingInstrument::new("rec");
    let log = inst.log();
    let router = InstrumentRouter::new().with_fallback(Box::new(inst));
    let scheduler = Scheduler::new(Box::new(ManualClock::new(60.0)), router, 1.0);
    (Performance::new(song, scheduler, SEED, 5), log)
}

fn pitches_of(events: &[PitchEvent]) -> Vec<i32> {
    events.iter().flat_map(PitchEvent::pitch_numbers).collect()
}

#[test]
fn group_requires_duration() {
    let err = parse_notation("(1 2 3)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);

    let events = parse_notation("4n:(1 2 3)").unwrap();
    assert_eq!(events.len(), 3);
    for (event, grade) in events.iter().zip(1..) {
        assert_eq!(event.duration().to_string(), "4n");
        assert_eq!(event.values(), vec![Grade(grade)]);
    }
}

#[test]
fn bare_notes_take_default_then_explicit_durations() {
    let events = parse_notation("1 4n:2 8n:3").unwrap();
    let durations: Vec<String> = events.iter().map(|e| e.duration().to_string()).collect();
    assert_eq!(durations, vec!["4n", "4n", "8n"]);
    let grades: Vec<Grade> = events.iter().flat_map(GradeEvent::values).collect();
    assert_eq!(grades, vec![Grade(1), Grade(2), Grade(3)]);
}

#[test]
fn arpeggiate_identity_and_reverse() {
    let p = vec![60, 64, 67, 71];
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    assert_eq!(arpeggiate(&p, PlayMode::Chord, &mut rng), p);
    let mut reversed = p.clone();
    reversed.reverse();
    assert_eq!(arpeggiate(&p, PlayMode::Descending, &mut rng), reversed);
}

#[test]
fn nested_repeats_flatten_in_order() {
    let (perf, _) = build_pipeline(
        "part p { block outer repeat 2 { 0 block inner repeat 3 { 4 } } }",
    );
    let flat = perf.preview_part("p").unwrap();
    assert_eq!(pitches_of(&flat.events), vec![60, 67, 67, 67, 60, 67, 67, 67]);
}

#[test]
fn several_top_level_blocks_play_in_sequence() {
    let (mut perf, log) = build_pipeline(
        "part p { block intro { 0 1 } block verse repeat 2 { scale MINOR 2 } }",
    );
    perf.run_ticks(Some(50));
    assert_eq!(log.pitches().concat(), vec![60, 62, 63, 63]);
    assert_eq!(perf.state(), PlayState::Stopped);
}

#[test]
fn chords_and_arpeggios_reach_the_instrument() {
    let (mut perf, log) = build_pipeline(
        r#"
        part keys {
            block b {
                width 2
                0
                mode ASCENDING
                1n:0
            }
        }
        "#,
    );
    perf.run_ticks(Some(50));
    let groups = log.pitches();
    // The chord sounds together, the whole-note arpeggio one member at a time.
    assert_eq!(groups[0], vec![60, 64, 67]);
    assert_eq!(&groups[1..], &[vec![60], vec![64], vec![67]]);
}

#[test]
fn explicit_chord_and_tonality() {
    let (perf, _) = build_pipeline("part p { block b { key 3 2n:[0 2 4] } }");
    let flat = perf.preview_part("p").unwrap();
    assert!(matches!(flat.events[0], PitchEvent::Chord { .. }));
    assert_eq!(pitches_of(&flat.events), vec![63, 67, 70]);
}

#[test]
fn pattern_mode_decorates_from_a_variable() {
    let (perf, _) = build_pipeline(
        r#"
        vars { $pat = "8n:(0 1)" }
        part p { block b { width 1 mode PATTERN pattern $pat 0 } }
        "#,
    );
    let flat = perf.preview_part("p").unwrap();
    assert_eq!(flat.events.len(), 4);
    assert!(flat.events.iter().all(|e| e.duration().to_string() == "8n"));
    assert_eq!(pitches_of(&flat.events), vec![60, 64, 64, 67]);
}

#[test]
fn random_arpeggios_repeat_under_the_same_seed() {
    let src = "part p { block b repeat 4 { width 3 mode RANDOM 0 } }";
    let (a, _) = build_pipeline(src);
    let (b, _) = build_pipeline(src);
    assert_eq!(a.preview_part("p"), b.preview_part("p"));
}

#[test]
fn invalid_runtime_values_fall_back() {
    let (perf, _) = build_pipeline(
        r#"
        vars { $s = NOT_A_SCALE }
        part p { block b { scale $s mode SIDEWAYS octave $missing 1 } }
        "#,
    );
    let flat = perf.preview_part("p").unwrap();
    // MAJOR, CHORD and the default octave.
    assert_eq!(pitches_of(&flat.events), vec![62]);
}

#[test]
fn out_of_range_numbers_are_clamped() {
    let (perf, _) = build_pipeline("part p { block b { octave 2000000000 0 } }");
    let flat = perf.preview_part("p").unwrap();
    assert_eq!(pitches_of(&flat.events), vec![120]);

    let (perf, _) = build_pipeline(
        r#"
        vars { $w = 9223372036854775807 }
        part p { block b { $w += 1 width $w inversion $w key -2000000000 0 } }
        "#,
    );
    let flat = perf.preview_part("p").unwrap();
    assert_eq!(flat.events.len(), 1);
    assert_eq!(flat.events[0].pitch_numbers().len(), 17);
}

#[test]
fn extreme_pattern_offsets_do_not_overflow() {
    let (perf, _) = build_pipeline(
        r#"
        vars { $pat = "8n:(2000000000 -2000000000)" }
        part p { block b { gap 2000000000 mode PATTERN pattern $pat 0 } }
        "#,
    );
    let flat = perf.preview_part("p").unwrap();
    assert_eq!(flat.events.len(), 2);
}

#[test]
fn looping_block_after_an_intro_keeps_looping() {
    let (mut perf, log) = build_pipeline("part p { block intro { 0 } block chorus loop { 2 } }");
    let ticks = perf.run_ticks(Some(6));
    assert_eq!(ticks, 6);
    assert_eq!(log.pitches().concat(), vec![60, 64, 64, 64, 64, 64]);
}

#[test]
fn looping_chorus_picks_up_variable_changes() {
    let (mut perf, log) = build_pipeline(
        "vars { $k = 0 } part p { block intro repeat 2 { 0 } block chorus loop { key $k 4 } }",
    );
    perf.start();
    perf.tick();
    perf.tick();
    perf.tick();
    perf.set_variable("k", 1);
    perf.tick();
    perf.tick();
    assert_eq!(log.pitches().concat(), vec![60, 60, 67, 68, 68]);
}

#[test]
fn compile_errors_are_all_or_nothing() {
    let err = parse_program("part p { block b { 0 1 } block c repeat 0 { 2 } }").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SemanticError);
    assert!(err.input.is_some());
}

#[test]
fn config_drives_tick_interval_and_seed() {
    let config = EngineConfig {
        bpm: 60.0,
        tick_interval_secs: Some(0.5),
        ..EngineConfig::default()
    };
    let song = parse_program("part p { block b { 0 1 } }").unwrap();
    let inst = RecordingInstrument::new("rec");
    let log = inst.log();
    let router = InstrumentRouter::new().with_fallback(Box::new(inst));
    let mut perf = Performance::from_config(song, &config, Box::new(ManualClock::new(config.bpm)), router);
    let ticks = perf.run_ticks(None);
    // Two quarter notes of two ticks each, plus the tick that notices the end.
    assert_eq!(ticks, 5);
    assert_eq!(log.len(), 2);
}
