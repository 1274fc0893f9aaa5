//! Tick timing.
//!
//! Tick deadlines are absolute: tick `n` is due at `anchor + n * duration`,
//! so time spent processing a tick never accumulates into drift. The tick
//! duration is recomputed every tick; when it changes the clock re-anchors
//! at the last deadline.

use std::time::{Duration, Instant};

const MICROS_PER_MINUTE: f64 = 60_000_000.0;
const MIN_BPM: f64 = 1.0;

/// Duration of one tick in microseconds: `60_000_000 / (bpm * ppq)`.
///
/// Non-positive bpm and zero ppq are clamped to the smallest valid values.
pub fn tick_duration_us(bpm: f32, ppq: u16) -> f64 {
    let bpm = (bpm as f64).max(MIN_BPM);
    let ppq = ppq.max(1) as f64;
    MICROS_PER_MINUTE / (bpm * ppq)
}

/// Absolute deadline of tick `tick` for a clock started at `start`.
pub fn tick_deadline(start: Instant, tick: u64, tick_us: f64) -> Instant {
    let nanos = (tick as f64 * tick_us * 1000.0).round();
    start + Duration::from_nanos(nanos as u64)
}

/// Absolute tick schedule for one playback run.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    anchor: Instant,
    /// Ticks elapsed since `anchor`
    ticks: u64,
    tick_us: f64,
}

impl TickClock {
    pub fn start(now: Instant, tick_us: f64) -> Self {
        Self {
            anchor: now,
            ticks: 0,
            tick_us,
        }
    }

    pub fn tick_us(&self) -> f64 {
        self.tick_us
    }

    /// When the next tick is due.
    pub fn next_deadline(&self) -> Instant {
        tick_deadline(self.anchor, self.ticks + 1, self.tick_us)
    }

    /// Record that the next tick has been processed, then apply the
    /// duration that should govern the following one.
    pub fn advance(&mut self, tick_us: f64) {
        self.ticks += 1;
        if (tick_us - self.tick_us).abs() > f64::EPSILON {
            self.anchor = tick_deadline(self.anchor, self.ticks, self.tick_us);
            self.ticks = 0;
            self.tick_us = tick_us;
        }
    }
}
