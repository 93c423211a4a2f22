//! Simulated clock with a major and a minor step

use chrono::{Duration, NaiveDateTime};

/// Game clock that stamps memories. Each turn advances it by the major step;
/// the minor step is the granularity of a single observation.
#[derive(Debug, Clone)]
pub struct GameClock {
    now: NaiveDateTime,
    major_step: Duration,
    minor_step: Duration,
}

impl GameClock {
    pub fn new(start: NaiveDateTime, major_step: Duration, minor_step: Duration) -> Self {
        Self {
            now: start,
            major_step,
            minor_step,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn set(&mut self, time: NaiveDateTime) {
        self.now = time;
    }

    /// Move forward by one major step
    pub fn advance(&mut self) {
        self.now += self.major_step;
    }

    /// Move forward by one minor step
    pub fn tick(&mut self) {
        self.now += self.minor_step;
    }

    pub fn step_size(&self) -> Duration {
        self.major_step
    }
}
