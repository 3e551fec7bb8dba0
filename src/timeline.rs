//! The running clock that observations are stamped from.

use hifitime::{Duration, Epoch};
use log::debug;

use crate::{constants::CLOCK_SWITCH_PENALTY_SECONDS, tags::Clock};

/// Hands out start times to observations in sequence.
///
/// Only observations that are actually planned should go through here; a
/// skipped template entry neither takes time nor counts as the previous
/// clock.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    cursor: Epoch,
    gap: Duration,
    previous_clock: Option<Clock>,
}

impl TimelineBuilder {
    pub fn new(start: Epoch, gap: Duration) -> TimelineBuilder {
        TimelineBuilder {
            cursor: start,
            gap,
            previous_clock: None,
        }
    }

    /// When the next observation would start if it used the same clock as
    /// the last.
    pub fn cursor(&self) -> Epoch {
        self.cursor
    }

    /// The start time of the next observation, which runs with `clock`.
    /// Changing clocks costs a fixed retuning penalty.
    pub fn stamp(&mut self, clock: Clock) -> Epoch {
        if let Some(previous) = self.previous_clock {
            if previous != clock {
                debug!("Clock change {previous} -> {clock} MHz; adding {CLOCK_SWITCH_PENALTY_SECONDS} s");
                self.cursor = self.cursor + Duration::from_seconds(CLOCK_SWITCH_PENALTY_SECONDS);
            }
        }
        self.previous_clock = Some(clock);
        self.cursor
    }

    /// Move past an observation that ran for `duration`, and the gap after
    /// it.
    pub fn advance(&mut self, duration: Duration) {
        self.cursor = self.cursor + duration + self.gap;
    }
}

/// A single representative time for the whole plan, used to pick sources:
/// halfway through `num_observations` nominal observations.
pub fn mean_timestamp(
    start: Epoch,
    num_observations: usize,
    duration: Duration,
    gap: Duration,
) -> Epoch {
    let span = (duration + gap).to_seconds() * num_observations as f64;
    start + Duration::from_seconds(0.5 * span)
}
