//! Transport state — play/stop control and the scheduler tick counter.

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}

/// Play state plus how many ticks have run since the last reset.
#[derive(Debug, Clone)]
pub struct Transport {
    tick_interval: f64,
    state: PlayState,
    ticks: u64,
}

impl Transport {
    /// Create a stopped transport ticking every `tick_interval` seconds.
    pub fn new(tick_interval: f64) -> Self {
        Self {
            tick_interval,
            state: PlayState::Stopped,
            ticks: 0,
        }
    }

    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    /// Zero the tick counter without changing play state.
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Scheduler ticks elapsed since the last reset.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Seconds between two scheduler ticks.
    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    /// Count one tick. Ignored while stopped.
    pub fn advance_tick(&mut self) {
        if self.state == PlayState::Playing {
            self.ticks += 1;
        }
    }
}
