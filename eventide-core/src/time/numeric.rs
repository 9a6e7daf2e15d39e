//! Numeric simulation time representations.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::SimTime;

/// Double-precision floating-point simulation time.
///
/// Absolute and relative values share the `f64` representation. The
/// ordering is the IEEE total order, so equal bit patterns compare
/// equal; NaN values are rejected at construction because they would
/// poison the event-list ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeF64(f64);

impl TimeF64 {
    /// Creates a time value from a raw coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `value` is NaN.
    pub fn new(value: f64) -> Self {
        assert!(!value.is_nan(), "simulation time cannot be NaN");
        Self(value)
    }

    /// Returns the underlying coordinate.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for TimeF64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for TimeF64 {}

impl PartialOrd for TimeF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for TimeF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SimTime for TimeF64 {
    type Delta = f64;

    fn zero() -> Self {
        Self(0.0)
    }

    fn add(&self, delta: &f64) -> Self {
        debug_assert!(!delta.is_nan(), "simulation delta cannot be NaN");
        Self(self.0 + delta)
    }
}

/// Single-precision floating-point simulation time.
///
/// Same rules as [`TimeF64`] with `f32` precision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeF32(f32);

impl TimeF32 {
    /// Creates a time value from a raw coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `value` is NaN.
    pub fn new(value: f32) -> Self {
        assert!(!value.is_nan(), "simulation time cannot be NaN");
        Self(value)
    }

    /// Returns the underlying coordinate.
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl PartialEq for TimeF32 {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for TimeF32 {}

impl PartialOrd for TimeF32 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for TimeF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SimTime for TimeF32 {
    type Delta = f32;

    fn zero() -> Self {
        Self(0.0)
    }

    fn add(&self, delta: &f32) -> Self {
        debug_assert!(!delta.is_nan(), "simulation delta cannot be NaN");
        Self(self.0 + delta)
    }
}

/// Integer tick-count simulation time.
///
/// The unit a tick represents is up to the model; the engine only
/// requires the total order and overflow-checked addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeTicks(i64);

impl TimeTicks {
    /// Creates a time value from a raw tick count.
    pub fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Returns the underlying tick count.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TimeTicks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SimTime for TimeTicks {
    type Delta = i64;

    fn zero() -> Self {
        Self(0)
    }

    /// # Panics
    ///
    /// Panics if the tick count overflows `i64`.
    fn add(&self, delta: &i64) -> Self {
        Self(self.0.checked_add(*delta).expect("tick count overflow"))
    }
}

/// Duration-based simulation time.
///
/// The absolute coordinate is an offset from the simulation origin
/// expressed as a [`std::time::Duration`], which keeps unit conversions
/// (`from_millis`, `from_secs_f64`, ...) in the standard library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSpan(Duration);

impl TimeSpan {
    /// Creates a time value from an offset since the origin.
    pub fn new(offset: Duration) -> Self {
        Self(offset)
    }

    /// Returns the underlying offset.
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl SimTime for TimeSpan {
    type Delta = Duration;

    fn zero() -> Self {
        Self(Duration::ZERO)
    }

    fn add(&self, delta: &Duration) -> Self {
        Self(self.0 + *delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_total_order_handles_negative_zero() {
        // total_cmp puts -0.0 below +0.0, which is fine: the order stays
        // total and addition of a non-negative delta never goes backwards.
        assert!(TimeF64::new(-0.0) <= TimeF64::new(0.0));
    }

    #[test]
    #[should_panic(expected = "simulation time cannot be NaN")]
    fn f64_rejects_nan() {
        TimeF64::new(f64::NAN);
    }

    #[test]
    fn f64_addition_preserves_precision() {
        let t = TimeF64::new(1e9).add(&1e-6);
        assert_eq!(t.value(), 1e9 + 1e-6);
    }

    #[test]
    fn ticks_add_and_compare() {
        let t = TimeTicks::new(10).add(&5);
        assert_eq!(t, TimeTicks::new(15));
        assert!(t > TimeTicks::new(10));
    }

    #[test]
    #[should_panic(expected = "tick count overflow")]
    fn ticks_overflow_is_detected() {
        TimeTicks::new(i64::MAX).add(&1);
    }

    #[test]
    fn span_add() {
        let t = TimeSpan::new(Duration::from_secs(1)).add(&Duration::from_millis(500));
        assert_eq!(t.value(), Duration::from_millis(1500));
    }
}
