use crate::{
    error::{SimError, SimResult},
    Degrees, Hours,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The in-game time of day. Time is kept as one ever-increasing number of
/// in-game hours (the *continuous* time); the familiar 0-24 clock reading is
/// derived from it on demand.
///
/// Time is stored as an `f64`. At the default speed of one day per two real
/// minutes, the wrapped time stays accurate to well under a millisecond of
/// game time for the first billion in-game hours.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolarClock {
    continuous_time: Hours,
}

impl SolarClock {
    /// Sunrise/sunset hours. Anything in `[NIGHT_START, 24)` or
    /// `[0, DAY_START)` is night.
    pub const DAY_START: Hours = Hours(6.0);
    pub const NIGHT_START: Hours = Hours(18.0);

    /// Start a clock at the given time, in hours. Times past 24 are allowed
    /// (they just mean we start on a later day), but negative or non-finite
    /// times are not.
    pub fn new(initial_time: f64) -> SimResult<Self> {
        if initial_time.is_finite() && initial_time >= 0.0 {
            Ok(Self {
                continuous_time: Hours(initial_time),
            })
        } else {
            Err(SimError::invalid_field("initial_time", "range"))
        }
    }

    /// Move the clock forward by some amount of real time. A full day passes
    /// every `day_seconds`. This is the only way to change the clock, and it
    /// can only move forward: a negative delta is rejected, as is a
    /// non-positive day length. So is any combination that would push the
    /// clock past what an `f64` can hold. On error the clock doesn't move.
    pub fn advance(
        &mut self,
        delta_seconds: f64,
        day_seconds: f64,
    ) -> SimResult<()> {
        if !(day_seconds.is_finite() && day_seconds > 0.0) {
            return Err(SimError::invalid_field("day_seconds", "positive"));
        }
        if !(delta_seconds.is_finite() && delta_seconds >= 0.0) {
            return Err(SimError::invalid_field("delta_seconds", "range"));
        }

        let next = self.continuous_time.0
            + delta_seconds * (Hours::DAY.0 / day_seconds);
        if !next.is_finite() {
            return Err(SimError::invalid_field("delta_seconds", "overflow"));
        }

        let previous_day = self.day_number();
        self.continuous_time = Hours(next);
        if self.day_number() != previous_day {
            debug!("Day {} begins", self.day_number());
        }
        Ok(())
    }

    /// Total in-game hours since hour zero of day zero. Never decreases.
    pub fn continuous_time(&self) -> Hours {
        self.continuous_time
    }

    /// The time of day, in `[0, 24)`.
    pub fn wrapped_time(&self) -> Hours {
        let wrapped = self.continuous_time.0.rem_euclid(Hours::DAY.0);
        // rem_euclid can round up to exactly 24 for values just under a
        // multiple of 24
        if wrapped >= Hours::DAY.0 {
            Hours(0.0)
        } else {
            Hours(wrapped)
        }
    }

    /// Time of day as a fraction of a full day: 0 is midnight, 0.5 is noon.
    pub fn normalized_time(&self) -> f64 {
        self.wrapped_time().0 / Hours::DAY.0
    }

    /// Pitch of the sun. -90° at midnight, 0° at sunrise, 90° at noon. This
    /// uses continuous time and is never wrapped, so the sun keeps turning
    /// the same way instead of jumping back at midnight.
    pub fn sun_angle_degrees(&self) -> Degrees {
        Degrees(self.continuous_time.0 / Hours::DAY.0 * 360.0 - 90.0)
    }

    pub fn is_night(&self) -> bool {
        let time = self.wrapped_time();
        time >= Self::NIGHT_START || time < Self::DAY_START
    }

    /// Break the continuous time down into weeks, days, hours, minutes and
    /// seconds, for display.
    pub fn calendar(&self) -> Calendar {
        Calendar::from_hours(self.continuous_time)
    }

    fn day_number(&self) -> u64 {
        (self.continuous_time.0 / Hours::DAY.0).floor() as u64
    }
}

/// Continuous time broken down into calendar units, with 7-day weeks. Only
/// whole elapsed seconds are counted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub weeks: u64,
    pub days: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Calendar {
    const DAYS_PER_WEEK: u64 = 7;

    fn from_hours(hours: Hours) -> Self {
        let total_seconds = (hours.0 * 3600.0).floor() as u64;
        let total_minutes = total_seconds / 60;
        let total_hours = total_minutes / 60;
        let total_days = total_hours / 24;
        Self {
            weeks: total_days / Self::DAYS_PER_WEEK,
            days: (total_days % Self::DAYS_PER_WEEK) as u8,
            hours: (total_hours % 24) as u8,
            minutes: (total_minutes % 60) as u8,
            seconds: (total_seconds % 60) as u8,
        }
    }
}

impl Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} weeks, {} days, {:02}:{:02}:{:02}",
            self.weeks, self.days, self.hours, self.minutes, self.seconds
        )
    }
}
