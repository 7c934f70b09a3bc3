//! Event stream engine — note events, tick-driven scheduler, clocks.
//!
//! The [`Scheduler`] walks one [`ScheduledStream`] per part against a shared
//! tick. It counts ticks via [`Transport`], takes timestamps from a
//! [`Clock`], and hands resolved pitches to an [`InstrumentRouter`].
//!
//! The scheduler does not produce sound and never blocks inside `tick`;
//! pacing belongs to the clock, so all scheduling logic is testable with a
//! [`ManualClock`].

pub mod beat;
pub mod clock;
pub mod stream;
pub mod transport;
pub mod types;

pub use beat::{Beat, DEFAULT_BEATS_PER_BAR, TICKS_PER_BEAT};
pub use clock::{Clock, ManualClock, TickHandle, WallClock};
pub use stream::{Fire, ScheduledStream};
pub use transport::{PlayState, Transport};
pub use types::{Grade, GradeEvent, NoteEvent, Pitch, PitchEvent};

use tracing::{debug, info, warn};

use crate::instrument::InstrumentRouter;

/// Supplies a fresh event list when a looping stream wraps.
pub trait StreamSource {
    /// New events for `part`, or `None` to replay the current list.
    fn refill(&mut self, part: usize) -> Option<Vec<PitchEvent>>;
}

/// A source that never refills.
#[derive(Debug, Default, Clone, Copy)]
pub struct Replay;

impl StreamSource for Replay {
    fn refill(&mut self, _part: usize) -> Option<Vec<PitchEvent>> {
        None
    }
}

/// The scheduler: advances every part's stream on each tick.
pub struct Scheduler {
    clock: Box<dyn Clock>,
    instruments: InstrumentRouter,
    transport: Transport,
    streams: Vec<ScheduledStream>,
    handle: Option<TickHandle>,
}

impl Scheduler {
    /// Create a stopped scheduler ticking every `tick_interval` seconds.
    pub fn new(clock: Box<dyn Clock>, instruments: InstrumentRouter, tick_interval: f64) -> Self {
        let transport = Transport::new(tick_interval);
        Self {
            clock,
            instruments,
            transport,
            streams: Vec::new(),
            handle: None,
        }
    }

    /// Add a stream for `part`. Streams advance in the order they are added.
    pub fn add_stream(&mut self, part: usize, events: Vec<PitchEvent>, unbounded: bool) {
        self.push_stream(ScheduledStream::new(part, events, unbounded));
    }

    /// Add a prepared stream, e.g. one with an intro before its loop start.
    pub fn push_stream(&mut self, stream: ScheduledStream) {
        self.streams.push(stream);
    }

    /// Drop every stream. Stops playback first.
    pub fn clear_streams(&mut self) {
        self.stop();
        self.streams.clear();
    }

    pub fn streams(&self) -> &[ScheduledStream] {
        &self.streams
    }

    pub fn state(&self) -> PlayState {
        self.transport.state()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn tick_interval(&self) -> f64 {
        self.transport.tick_interval()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        self.clock.as_mut()
    }

    pub fn instruments_mut(&mut self) -> &mut InstrumentRouter {
        &mut self.instruments
    }

    /// Rewind all streams, register the tick and start playing.
    ///
    /// With no streams there is nothing to play and the scheduler stays
    /// stopped.
    pub fn start(&mut self) -> PlayState {
        if self.handle.is_some() {
            self.stop();
        }
        if self.streams.is_empty() {
            warn!("no streams to play; staying stopped");
            return self.state();
        }

        for stream in &mut self.streams {
            stream.reset();
        }
        self.transport.reset();
        self.clock.start();
        self.handle = Some(self.clock.schedule_tick(self.transport.tick_interval()));
        self.transport.play();
        info!(
            streams = self.streams.len(),
            tick_interval = self.transport.tick_interval(),
            "playback started"
        );
        self.state()
    }

    /// Stop playback, cancel the tick and release all instruments.
    /// Calling it again has no further effect.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            self.transport.stop();
            return;
        };
        self.clock.cancel(handle);
        self.clock.stop();
        for stream in &mut self.streams {
            stream.reset();
        }
        self.instruments.release_all();
        self.transport.stop();
        info!(ticks = self.transport.tick_count(), "playback stopped");
    }

    /// One tick with no refilling of looping streams.
    pub fn tick(&mut self) -> PlayState {
        self.tick_with(&mut Replay)
    }

    /// One tick. Looping streams about to wrap ask `source` for new events
    /// first.
    pub fn tick_with(&mut self, source: &mut dyn StreamSource) -> PlayState {
        if !self.transport.is_playing() {
            return PlayState::Stopped;
        }

        let at_time = self.clock.now();
        let tick = self.transport.tick_count();
        let interval = self.transport.tick_interval();
        let clock = self.clock.as_ref();

        for stream in &mut self.streams {
            if stream.is_about_to_wrap() {
                if let Some(events) = source.refill(stream.part()) {
                    stream.replace_events(events);
                }
            }
            let fires = stream.tick(interval, |d| clock.duration_in_seconds(&d));
            for fire in fires {
                debug!(part = stream.part(), pitches = ?fire.pitches, tick, at_time, "trigger");
                self.instruments
                    .trigger(stream.part(), &fire.pitches, fire.duration_secs, at_time);
            }
        }
        self.transport.advance_tick();

        if self.streams.iter().all(ScheduledStream::is_finished) {
            info!("all streams finished");
            self.stop();
        }
        self.state()
    }

    /// Drive playback with the clock until it stops, every stream finishes,
    /// or `max_ticks` ticks have run. Returns the number of ticks run.
    pub fn run(&mut self, max_ticks: Option<u64>, source: &mut dyn StreamSource) -> u64 {
        let mut ran = 0;
        while self.is_playing() {
            if max_ticks.is_some_and(|max| ran >= max) {
                info!(max_ticks = ran, "tick limit reached");
                self.stop();
                break;
            }
            self.tick_with(source);
            ran += 1;
            if !self.is_playing() {
                break;
            }
            let Some(handle) = self.handle else { break };
            if !self.clock.wait_for_tick(handle) {
                self.stop();
            }
        }
        ran
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("transport", &self.transport)
            .field("streams", &self.streams.len())
            .field("handle", &self.handle)
            .finish()
    }
}
