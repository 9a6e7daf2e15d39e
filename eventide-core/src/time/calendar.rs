//! Calendar-based simulation time.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::SimTime;

/// Calendar simulation time.
///
/// The absolute coordinate is a UTC instant and the relative type is a
/// [`chrono::TimeDelta`], so the absolute and relative representations
/// differ. Useful for models whose inputs are expressed against real
/// dates (timetables, opening hours) rather than an abstract origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeCalendar(DateTime<Utc>);

impl TimeCalendar {
    /// Creates a time value from a UTC instant.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Returns the underlying instant.
    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for TimeCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl SimTime for TimeCalendar {
    type Delta = TimeDelta;

    /// The origin is the Unix epoch.
    fn zero() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }

    fn add(&self, delta: &TimeDelta) -> Self {
        Self(self.0 + *delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_origin() {
        assert_eq!(TimeCalendar::zero().value(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn add_shifts_the_instant() {
        let start = TimeCalendar::zero();
        let later = start.add(&TimeDelta::hours(2));
        assert_eq!(later.value() - start.value(), TimeDelta::hours(2));
        assert!(later > start);
    }

    #[test]
    fn negative_delta_moves_backwards() {
        let start = TimeCalendar::zero().add(&TimeDelta::days(1));
        let earlier = start.add(&TimeDelta::hours(-1));
        assert!(earlier < start);
    }
}
