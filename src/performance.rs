//! Performance session — a compiled song being played.
//!
//! Owns the song, the shared variable store, one performer per part, the
//! scheduler and the seeded RNG used by RANDOM arpeggios. Looping parts are
//! re-flattened every time their stream wraps, so variable changes made
//! during a pass are heard on the next one. A part's intro plays once.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::block::{flatten_loop_pass, flatten_part, Flattened, Song};
use crate::command::{Value, VariableStore};
use crate::config::EngineConfig;
use crate::event::{Clock, PitchEvent, PlayState, ScheduledStream, Scheduler, StreamSource};
use crate::instrument::InstrumentRouter;
use crate::performer::PerformerState;

pub struct Performance {
    song: Song,
    store: VariableStore,
    performers: Vec<PerformerState>,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
    seed: u64,
}

/// Re-flattens a looping part from the live session state.
struct Refill<'a> {
    song: &'a Song,
    store: &'a mut VariableStore,
    performers: &'a mut [PerformerState],
    rng: &'a mut ChaCha8Rng,
}

impl StreamSource for Refill<'_> {
    fn refill(&mut self, part: usize) -> Option<Vec<PitchEvent>> {
        let def = self.song.parts.get(part)?;
        let performer = self.performers.get_mut(part)?;
        let events = flatten_loop_pass(&self.song.blocks, def, performer, self.store, self.rng);
        debug!(part = %def.name, events = events.len(), "refilled looping part");
        Some(events)
    }
}

impl Performance {
    pub fn new(song: Song, scheduler: Scheduler, seed: u64, default_octave: i32) -> Self {
        let store = song.variable_store();
        let performers = song
            .parts
            .iter()
            .map(|_| PerformerState::with_octave(default_octave))
            .collect();
        Self {
            song,
            store,
            performers,
            scheduler,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Build a session whose tempo, tick rate and seed come from `config`.
    pub fn from_config(
        song: Song,
        config: &EngineConfig,
        clock: Box<dyn Clock>,
        instruments: InstrumentRouter,
    ) -> Self {
        let scheduler = Scheduler::new(clock, instruments, config.tick_interval());
        Self::new(song, scheduler, config.seed, config.default_octave)
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// The live store; subscriptions and edits here affect playback.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) {
        self.store.set(name, value.into());
    }

    pub fn performer(&self, part: usize) -> Option<&PerformerState> {
        self.performers.get(part)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn state(&self) -> PlayState {
        self.scheduler.state()
    }

    /// Flatten every part from scratch and start playing.
    ///
    /// Performers and the RNG are reset; the variable store keeps its
    /// current values.
    pub fn start(&mut self) -> PlayState {
        self.scheduler.clear_streams();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);

        for (idx, part) in self.song.parts.iter().enumerate() {
            let performer = &mut self.performers[idx];
            performer.reset();
            let flat = flatten_part(&self.song.blocks, part, performer, &mut self.store, &mut self.rng);
            self.scheduler.push_stream(
                ScheduledStream::new(idx, flat.events, flat.unbounded).with_loop_start(flat.loop_start),
            );
        }

        info!(parts = self.song.parts.len(), "performance starting");
        self.scheduler.start()
    }

    /// Advance one tick.
    pub fn tick(&mut self) -> PlayState {
        let mut source = Refill {
            song: &self.song,
            store: &mut self.store,
            performers: &mut self.performers,
            rng: &mut self.rng,
        };
        self.scheduler.tick_with(&mut source)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Run on the scheduler's clock until playback stops or `max_ticks`
    /// ticks have run. Starts playback first if needed.
    pub fn run_ticks(&mut self, max_ticks: Option<u64>) -> u64 {
        if !self.scheduler.is_playing() && self.start() == PlayState::Stopped {
            return 0;
        }
        let mut source = Refill {
            song: &self.song,
            store: &mut self.store,
            performers: &mut self.performers,
            rng: &mut self.rng,
        };
        self.scheduler.run(max_ticks, &mut source)
    }

    /// Flatten one part against a copy of the current variables and a fresh
    /// performer, leaving the session untouched.
    pub fn preview_part(&self, name: &str) -> Option<Flattened> {
        let part = self.song.part(name)?;
        let idx = self.song.parts.iter().position(|p| p.name == name)?;
        let octave = self
            .performers
            .get(idx)
            .map(PerformerState::default_octave)
            .unwrap_or(crate::performer::DEFAULT_OCTAVE);
        let mut performer = PerformerState::with_octave(octave);
        let mut store = self.store.snapshot();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Some(flatten_part(&self.song.blocks, part, &mut performer, &mut store, &mut rng))
    }
}

impl std::fmt::Debug for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Performance")
            .field("parts", &self.song.parts.len())
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
