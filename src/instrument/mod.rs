//! Instruments — the playback boundary that receives resolved pitches.
//!
//! The engine never produces sound itself. Every trigger carries only pitch
//! numbers, a duration in seconds and a clock timestamp.

pub mod router;

pub use router::InstrumentRouter;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

/// Anything that can play resolved pitches.
pub trait Instrument {
    /// Sound `pitches` together for `duration_secs`, starting at `at_time`
    /// seconds on the driving clock.
    fn trigger_pitches(&mut self, pitches: &[i32], duration_secs: f64, at_time: f64);

    /// Silence everything still sounding.
    fn release_all(&mut self);

    /// Human-readable name for this instrument.
    fn name(&self) -> &str;
}

/// One recorded call to [`Instrument::trigger_pitches`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub pitches: Vec<i32>,
    pub duration_secs: f64,
    pub at_time: f64,
}

/// Shared view of a [`RecordingInstrument`]'s history.
#[derive(Debug, Clone, Default)]
pub struct TriggerLog {
    inner: Rc<RefCell<LogState>>,
}

#[derive(Debug, Default)]
struct LogState {
    triggers: Vec<Trigger>,
    releases: usize,
}

impl TriggerLog {
    pub fn triggers(&self) -> Vec<Trigger> {
        self.inner.borrow().triggers.clone()
    }

    /// Every triggered pitch group, in order.
    pub fn pitches(&self) -> Vec<Vec<i32>> {
        self.inner
            .borrow()
            .triggers
            .iter()
            .map(|t| t.pitches.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `release_all` was called.
    pub fn releases(&self) -> usize {
        self.inner.borrow().releases
    }

    pub fn clear(&self) {
        let mut state = self.inner.borrow_mut();
        state.triggers.clear();
        state.releases = 0;
    }
}

/// Collects triggers in memory. Used for tests and offline rendering.
#[derive(Debug, Clone)]
pub struct RecordingInstrument {
    name: String,
    log: TriggerLog,
}

impl RecordingInstrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: TriggerLog::default(),
        }
    }

    /// A handle that keeps observing this instrument after it is boxed.
    pub fn log(&self) -> TriggerLog {
        self.log.clone()
    }
}

impl Instrument for RecordingInstrument {
    fn trigger_pitches(&mut self, pitches: &[i32], duration_secs: f64, at_time: f64) {
        self.log.inner.borrow_mut().triggers.push(Trigger {
            pitches: pitches.to_vec(),
            duration_secs,
            at_time,
        });
    }

    fn release_all(&mut self) {
        self.log.inner.borrow_mut().releases += 1;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Prints each trigger to stdout and the `tracing` log.
#[derive(Debug, Clone)]
pub struct LogInstrument {
    name: String,
}

impl LogInstrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Instrument for LogInstrument {
    fn trigger_pitches(&mut self, pitches: &[i32], duration_secs: f64, at_time: f64) {
        info!(instrument = %self.name, ?pitches, duration_secs, at_time, "trigger");
        println!(
            "{at_time:>9.3}s  {:<12} {:?} for {duration_secs:.3}s",
            self.name, pitches
        );
    }

    fn release_all(&mut self) {
        info!(instrument = %self.name, "release all");
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_instrument_shares_its_log() {
        let mut inst = RecordingInstrument::new("lead");
        let log = inst.log();
        inst.trigger_pitches(&[60, 64], 0.5, 1.0);
        inst.release_all();

        assert_eq!(log.len(), 1);
        assert_eq!(log.pitches(), vec![vec![60, 64]]);
        assert_eq!(log.triggers()[0].at_time, 1.0);
        assert_eq!(log.releases(), 1);
        assert_eq!(inst.name(), "lead");

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn boxed_recording_instrument_is_still_observable() {
        let inst = RecordingInstrument::new("x");
        let log = inst.log();
        let mut boxed: Box<dyn Instrument> = Box::new(inst);
        boxed.trigger_pitches(&[48], 0.25, 0.0);
        assert_eq!(log.pitches(), vec![vec![48]]);
    }
}
