//! Clocks — the driver boundary that paces scheduler ticks.
//!
//! A clock never calls into the scheduler. The driver asks it to wait for
//! the next tick and then calls `tick` itself, so every tick runs to
//! completion on the driver's thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::dsl::duration::NoteDuration;

/// Registration of a periodic tick on a [`Clock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// A source of time and tick pacing.
pub trait Clock {
    fn start(&mut self);

    fn stop(&mut self);

    /// Register a tick every `interval` seconds.
    fn schedule_tick(&mut self, interval: f64) -> TickHandle;

    /// Drop a registration. Unknown handles are ignored.
    fn cancel(&mut self, handle: TickHandle);

    /// Tempo used to convert note durations.
    fn bpm(&self) -> f64;

    fn duration_in_seconds(&self, duration: &NoteDuration) -> f64 {
        duration.seconds(self.bpm())
    }

    /// Seconds since `start`.
    fn now(&self) -> f64;

    /// Wait until `handle`'s next tick is due. Returns `false` once the
    /// handle is cancelled or the clock is stopped.
    fn wait_for_tick(&mut self, handle: TickHandle) -> bool;
}

#[derive(Debug, Default)]
struct Registrations {
    next_id: u64,
    active: Vec<(TickHandle, f64)>,
}

impl Registrations {
    fn add(&mut self, interval: f64) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.active.push((handle, interval));
        handle
    }

    fn remove(&mut self, handle: TickHandle) {
        self.active.retain(|(h, _)| *h != handle);
    }

    fn interval(&self, handle: TickHandle) -> Option<f64> {
        self.active
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, i)| *i)
    }
}

/// Logical clock: time only moves when a tick is waited for or
/// [`ManualClock::advance`] is called.
#[derive(Debug)]
pub struct ManualClock {
    bpm: f64,
    now: f64,
    running: bool,
    registrations: Registrations,
}

impl ManualClock {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            now: 0.0,
            running: false,
            registrations: Registrations::default(),
        }
    }

    /// Move time forward by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of live tick registrations.
    pub fn registrations(&self) -> usize {
        self.registrations.active.len()
    }
}

impl Clock for ManualClock {
    fn start(&mut self) {
        self.running = true;
        self.now = 0.0;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn schedule_tick(&mut self, interval: f64) -> TickHandle {
        self.registrations.add(interval)
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.registrations.remove(handle);
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn wait_for_tick(&mut self, handle: TickHandle) -> bool {
        match self.registrations.interval(handle) {
            Some(interval) if self.running => {
                self.now += interval;
                true
            }
            _ => false,
        }
    }
}

/// Real-time clock that sleeps between ticks.
///
/// Deadlines are computed from the start instant rather than from the
/// previous wake-up, so sleep overshoot does not accumulate.
#[derive(Debug)]
pub struct WallClock {
    bpm: f64,
    origin: Option<Instant>,
    ticks_waited: u64,
    stop_flag: Arc<AtomicBool>,
    registrations: Registrations,
}

impl WallClock {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            origin: None,
            ticks_waited: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            registrations: Registrations::default(),
        }
    }

    /// A flag another thread (e.g. a Ctrl-C handler) can set to end waiting.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }
}

impl Clock for WallClock {
    fn start(&mut self) {
        self.origin = Some(Instant::now());
        self.ticks_waited = 0;
        self.stop_flag.store(false, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    fn schedule_tick(&mut self, interval: f64) -> TickHandle {
        self.registrations.add(interval)
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.registrations.remove(handle);
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }

    fn now(&self) -> f64 {
        self.origin
            .map(|o| o.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn wait_for_tick(&mut self, handle: TickHandle) -> bool {
        let (Some(interval), Some(origin)) = (self.registrations.interval(handle), self.origin) else {
            return false;
        };
        if self.stop_flag.load(Ordering::SeqCst) {
            return false;
        }

        self.ticks_waited += 1;
        let deadline = Duration::try_from_secs_f64(interval * self.ticks_waited as f64)
            .ok()
            .and_then(|offset| origin.checked_add(offset));
        let Some(deadline) = deadline else {
            warn!(interval, "tick interval is not a usable duration; stopping");
            return false;
        };
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        } else {
            debug!(late_ms = (now - deadline).as_secs_f64() * 1000.0, "tick is late");
        }
        !self.stop_flag.load(Ordering::SeqCst)
    }
}
