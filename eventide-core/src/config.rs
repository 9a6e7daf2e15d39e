//! Centralized configuration for Eventide.
//!
//! All tunable engine parameters are defined here to avoid hard-coded
//! values scattered throughout the codebase.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Central configuration for a simulator instance.
///
/// Groups related settings into logical sections with documented
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub scheduler: SchedulerConfig,
    pub animation: AnimationConfig,
}

/// Event scheduling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of events that may be pending at once. Scheduling
    /// past this limit fails rather than growing without bound; a model
    /// that hits it is almost certainly scheduling in an unbounded loop.
    pub max_scheduled_events: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_scheduled_events: 100_000,
        }
    }
}

/// Wall-clock throttling for the animated driver loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Sleep between successive event batches in the throttled loop.
    /// Bounds the redraw rate of passive observers independently of
    /// event density.
    pub frame_delay: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(40), // 25 frames per second
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SimulatorConfig::default();
        assert!(config.scheduler.max_scheduled_events > 0);
        assert!(config.animation.frame_delay > Duration::ZERO);
    }
}
