//! Simulation time representations.
//!
//! A simulator is generic over the value type it uses for its clock. All
//! representations share the [`SimTime`] contract: a totally ordered
//! absolute coordinate with an associated relative duration type and a
//! well-defined origin. Discrete-event loops only ever move the clock
//! forward, so adding a non-negative delta must never decrease the
//! ordering.

use std::fmt;

mod calendar;
mod numeric;

pub use calendar::TimeCalendar;
pub use numeric::{TimeF32, TimeF64, TimeSpan, TimeTicks};

/// Contract for simulation time value types.
///
/// An implementation wraps an absolute time coordinate (a float, a tick
/// count, a duration offset, a calendar instant) and names the relative
/// duration type used to shift it. The absolute and relative types may
/// differ, as they do for calendar time.
///
/// # Invariants
///
/// - The order is total: any two values compare.
/// - [`SimTime::add`] with a non-negative delta never produces a value
///   that compares below the input.
/// - [`SimTime::zero`] is the additive identity for the origin.
/// - Values are plain data; `Clone` produces an independent copy.
pub trait SimTime:
    Clone + PartialEq + Eq + PartialOrd + Ord + fmt::Debug + fmt::Display + Send + 'static
{
    /// Relative duration type accepted by [`SimTime::add`].
    type Delta: Clone + fmt::Debug + Send + 'static;

    /// Returns the origin value of this time representation.
    fn zero() -> Self;

    /// Returns a new value shifted by the given relative duration.
    fn add(&self, delta: &Self::Delta) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance_is_monotonic<T: SimTime>(start: T, delta: T::Delta) {
        let later = start.add(&delta);
        assert!(later >= start);
    }

    #[test]
    fn all_representations_are_monotonic_under_addition() {
        advance_is_monotonic(TimeF64::zero(), 2.5);
        advance_is_monotonic(TimeF32::zero(), 0.25);
        advance_is_monotonic(TimeTicks::zero(), 17);
        advance_is_monotonic(TimeSpan::zero(), std::time::Duration::from_millis(250));
        advance_is_monotonic(TimeCalendar::zero(), chrono::TimeDelta::seconds(60));
    }

    #[test]
    fn zero_is_additive_identity() {
        assert_eq!(TimeF64::zero().add(&0.0), TimeF64::zero());
        assert_eq!(TimeTicks::zero().add(&0), TimeTicks::zero());
        assert_eq!(
            TimeSpan::zero().add(&std::time::Duration::ZERO),
            TimeSpan::zero()
        );
    }
}
