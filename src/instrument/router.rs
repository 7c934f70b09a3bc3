//! Instrument router — dispatches triggers to the instrument of each part.

use std::collections::HashMap;

use tracing::debug;

use crate::block::{Part, Song};

use super::{Instrument, LogInstrument};

/// Routes triggers to instruments by part index, with an optional fallback
/// for parts that have no route of their own.
#[derive(Default)]
pub struct InstrumentRouter {
    routes: HashMap<usize, usize>,
    instruments: Vec<Box<dyn Instrument>>,
    fallback: Option<Box<dyn Instrument>>,
}

impl InstrumentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route from a part index to an instrument.
    pub fn add_route(&mut self, part: usize, instrument: Box<dyn Instrument>) {
        let idx = self.instruments.len();
        self.instruments.push(instrument);
        self.routes.insert(part, idx);
    }

    /// Instrument used for parts without a route.
    pub fn set_fallback(&mut self, instrument: Box<dyn Instrument>) {
        self.fallback = Some(instrument);
    }

    pub fn with_fallback(mut self, instrument: Box<dyn Instrument>) -> Self {
        self.set_fallback(instrument);
        self
    }

    /// Send a trigger for `part`. Unrouted parts without a fallback are
    /// silent.
    pub fn trigger(&mut self, part: usize, pitches: &[i32], duration_secs: f64, at_time: f64) {
        if pitches.is_empty() {
            return;
        }
        match self.instrument_mut(part) {
            Some(inst) => inst.trigger_pitches(pitches, duration_secs, at_time),
            None => debug!(part, "no instrument routed; trigger dropped"),
        }
    }

    /// Release every instrument, fallback included.
    pub fn release_all(&mut self) {
        for inst in &mut self.instruments {
            inst.release_all();
        }
        if let Some(fallback) = &mut self.fallback {
            fallback.release_all();
        }
    }

    pub fn has_route(&self, part: usize) -> bool {
        self.routes.contains_key(&part)
    }

    fn instrument_mut(&mut self, part: usize) -> Option<&mut Box<dyn Instrument>> {
        match self.routes.get(&part) {
            Some(&idx) => self.instruments.get_mut(idx),
            None => self.fallback.as_mut(),
        }
    }

    /// Build a router from a song's parts, one instrument per part.
    pub fn from_song<F>(song: &Song, mut make: F) -> Self
    where
        F: FnMut(&Part) -> Box<dyn Instrument>,
    {
        let mut router = Self::new();
        for (idx, part) in song.parts.iter().enumerate() {
            router.add_route(idx, make(part));
        }
        router
    }

    /// A router that prints every part's triggers, labelled with the part's
    /// instrument name (or the part name).
    pub fn logging(song: &Song) -> Self {
        Self::from_song(song, |part| {
            let label = part.instrument.as_deref().unwrap_or(&part.name);
            Box::new(LogInstrument::new(format!("{label}#{}", part.channel))) as Box<dyn Instrument>
        })
    }
}

impl std::fmt::Debug for InstrumentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.instruments.iter().map(|i| i.name()).collect();
        f.debug_struct("InstrumentRouter")
            .field("routes", &self.routes)
            .field("instruments", &names)
            .field("fallback", &self.fallback.as_ref().map(|i| i.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_program;
    use crate::instrument::RecordingInstrument;

    #[test]
    fn routes_to_correct_instrument() {
        let a = RecordingInstrument::new("a");
        let b = RecordingInstrument::new("b");
        let (log_a, log_b) = (a.log(), b.log());

        let mut router = InstrumentRouter::new();
        router.add_route(0, Box::new(a));
        router.add_route(1, Box::new(b));

        router.trigger(0, &[60], 0.5, 0.0);
        router.trigger(1, &[48, 55], 0.5, 0.0);

        assert_eq!(log_a.pitches(), vec![vec![60]]);
        assert_eq!(log_b.pitches(), vec![vec![48, 55]]);
    }

    #[test]
    fn unrouted_part_uses_fallback() {
        let fallback = RecordingInstrument::new("fallback");
        let log = fallback.log();
        let mut router = InstrumentRouter::new().with_fallback(Box::new(fallback));
        router.trigger(7, &[72], 0.25, 1.5);
        assert_eq!(log.len(), 1);
        assert!(!router.has_route(7));
    }

    #[test]
    fn unrouted_part_without_fallback_is_silent() {
        let mut router = InstrumentRouter::new();
        router.trigger(3, &[60], 0.5, 0.0);
    }

    #[test]
    fn empty_triggers_are_skipped() {
        let inst = RecordingInstrument::new("a");
        let log = inst.log();
        let mut router = InstrumentRouter::new();
        router.add_route(0, Box::new(inst));
        router.trigger(0, &[], 0.5, 0.0);
        assert!(log.is_empty());
    }

    #[test]
    fn release_all_reaches_every_instrument() {
        let a = RecordingInstrument::new("a");
        let f = RecordingInstrument::new("f");
        let (log_a, log_f) = (a.log(), f.log());
        let mut router = InstrumentRouter::new().with_fallback(Box::new(f));
        router.add_route(0, Box::new(a));
        router.release_all();
        assert_eq!(log_a.releases(), 1);
        assert_eq!(log_f.releases(), 1);
    }

    #[test]
    fn from_song_routes_each_part() {
        let song = parse_program("part a { block x { 0 } } part b { block y { 1 } }").unwrap();
        let router = InstrumentRouter::from_song(&song, |p| {
            Box::new(RecordingInstrument::new(p.name.clone())) as Box<dyn Instrument>
        });
        assert!(router.has_route(0));
        assert!(router.has_route(1));
        assert!(!router.has_route(2));
    }
}
