//! Per-part playback cursor over a flattened event list.

use tracing::{debug, warn};

use crate::dsl::duration::NoteDuration;

use super::types::{NoteEvent, PitchEvent};

/// Pitches to sound on this tick, with how long they last.
#[derive(Debug, Clone, PartialEq)]
pub struct Fire {
    pub pitches: Vec<i32>,
    pub duration_secs: f64,
}

/// Arpeggio members still waiting for their sub-turn.
#[derive(Debug, Clone, PartialEq)]
struct ArpeggioTurns {
    members: Vec<Vec<i32>>,
    next: usize,
    sub_ticks: u64,
    elapsed: u64,
    member_secs: f64,
}

/// Whole ticks covered by `seconds`, tolerating float error just below an
/// exact multiple.
pub fn ticks_for(seconds: f64, tick_interval: f64) -> u64 {
    if tick_interval <= 0.0 || seconds <= 0.0 {
        return 0;
    }
    (seconds / tick_interval + 1e-9).floor() as u64
}

/// One part's events plus the cursor that walks them tick by tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStream {
    part: usize,
    events: Vec<PitchEvent>,
    index: usize,
    pending_ticks: u64,
    unbounded: bool,
    loop_start: usize,
    finished: bool,
    loops: u64,
    arpeggio: Option<ArpeggioTurns>,
}

impl ScheduledStream {
    pub fn new(part: usize, events: Vec<PitchEvent>, unbounded: bool) -> Self {
        Self {
            part,
            events,
            index: 0,
            pending_ticks: 0,
            unbounded,
            loop_start: 0,
            finished: false,
            loops: 0,
            arpeggio: None,
        }
    }

    /// Rewind to the first event and clear any pending sustain.
    pub fn reset(&mut self) {
        self.index = 0;
        self.pending_ticks = 0;
        self.finished = false;
        self.loops = 0;
        self.arpeggio = None;
    }

    /// Wrap to `start` instead of the first event; earlier events play only
    /// on the first pass.
    pub fn with_loop_start(mut self, start: usize) -> Self {
        self.loop_start = start;
        self
    }

    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    /// Swap in a fresh looping section without touching the cursor. Events
    /// before the loop start are kept.
    pub fn replace_events(&mut self, events: Vec<PitchEvent>) {
        self.events.truncate(self.loop_start);
        self.events.extend(events);
    }

    pub fn part(&self) -> usize {
        self.part
    }

    pub fn events(&self) -> &[PitchEvent] {
        &self.events
    }

    /// Index of the next event to trigger.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pending_ticks(&self) -> u64 {
        self.pending_ticks
    }

    pub fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Completed passes of a looping stream.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    /// True when the next tick will restart a looping stream.
    pub fn is_about_to_wrap(&self) -> bool {
        self.unbounded
            && !self.finished
            && self.pending_ticks <= 1
            && self.index >= self.events.len()
    }

    /// Advance one tick. `seconds` converts a note duration at the current
    /// tempo.
    pub fn tick<F>(&mut self, tick_interval: f64, seconds: F) -> Vec<Fire>
    where
        F: Fn(NoteDuration) -> f64,
    {
        if self.finished {
            return Vec::new();
        }

        if self.pending_ticks > 1 {
            self.pending_ticks -= 1;
            return self.arpeggio_turn().into_iter().collect();
        }
        self.arpeggio = None;

        if self.index >= self.events.len() {
            if self.unbounded && self.events.len() > self.loop_start {
                self.index = self.loop_start;
                self.loops += 1;
                debug!(part = self.part, loops = self.loops, "stream wrapped");
            } else {
                if self.unbounded {
                    warn!(part = self.part, "looping stream has no events; finishing");
                }
                self.finished = true;
                self.pending_ticks = 0;
                return Vec::new();
            }
        }

        let event = &self.events[self.index];
        self.index += 1;

        let secs = seconds(event.duration());
        let ticks = ticks_for(secs, tick_interval);
        self.pending_ticks = ticks;

        match event {
            NoteEvent::Rest { .. } => Vec::new(),
            NoteEvent::Note { .. } | NoteEvent::Chord { .. } => vec![Fire {
                pitches: event.pitch_numbers(),
                duration_secs: secs,
            }],
            NoteEvent::Arpeggio { children, .. } => {
                let members: Vec<Vec<i32>> = children.iter().map(PitchEvent::pitch_numbers).collect();
                if members.is_empty() {
                    return Vec::new();
                }
                let sub_ticks = ticks / members.len() as u64;
                if sub_ticks == 0 {
                    return vec![Fire {
                        pitches: members.concat(),
                        duration_secs: secs,
                    }];
                }
                let member_secs = sub_ticks as f64 * tick_interval;
                let first = Fire {
                    pitches: members[0].clone(),
                    duration_secs: member_secs,
                };
                self.arpeggio = Some(ArpeggioTurns {
                    members,
                    next: 1,
                    sub_ticks,
                    elapsed: 0,
                    member_secs,
                });
                vec![first]
            }
        }
    }

    fn arpeggio_turn(&mut self) -> Option<Fire> {
        let turns = self.arpeggio.as_mut()?;
        turns.elapsed += 1;
        if turns.next >= turns.members.len() || turns.elapsed != turns.next as u64 * turns.sub_ticks {
            return None;
        }
        let pitches = turns.members[turns.next].clone();
        turns.next += 1;
        Some(Fire {
            pitches,
            duration_secs: turns.member_secs,
        })
    }
}
