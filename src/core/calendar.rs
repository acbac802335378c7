//! Game clock with day/hour/minute granularity
//!
//! Time only moves through `survival::tick`, which carries whole hours out
//! of the minute field one at a time so every hour boundary applies its own
//! decay effects.

use serde::{Deserialize, Serialize};

/// Coarse time-of-day buckets used by event filters and spawn scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Day,
    Dusk,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        if (6..19).contains(&hour) {
            TimeOfDay::Day
        } else if (19..21).contains(&hour) {
            TimeOfDay::Dusk
        } else {
            TimeOfDay::Night
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Clock {
    pub fn new(day: u32, hour: u32, minute: u32) -> Self {
        Self { day, hour, minute }
    }

    /// Absolute minute counter since day 0, used for event throttling
    pub fn absolute_minutes(&self) -> u64 {
        self.day as u64 * 1440 + self.hour as u64 * 60 + self.minute as u64
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour)
    }

    pub fn is_night(&self) -> bool {
        self.hour >= 21 || self.hour < 6
    }

    pub fn is_dusk(&self) -> bool {
        (19..21).contains(&self.hour)
    }

    /// Encounter frequency scaling: the streets are worse after dark
    pub fn spawn_multiplier(&self) -> f64 {
        if self.is_night() {
            2.0
        } else if self.is_dusk() {
            1.5
        } else {
            1.0
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        // Campaigns start on day 1 at dawn
        Self::new(1, 6, 0)
    }
}
