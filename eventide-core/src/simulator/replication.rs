//! Replication configuration.

use super::error::SimulatorError;
use crate::time::SimTime;

/// One execution run of a model: a start time, an end time, and an
/// optional warmup point after which observations count as
/// statistically valid.
///
/// Also carries the seed for the replication's deterministic random
/// stream, so a run is reproducible from its configuration alone.
#[derive(Debug, Clone)]
pub struct Replication<T: SimTime> {
    start_time: T,
    end_time: T,
    warmup_time: T,
    seed: u64,
}

impl<T: SimTime> Replication<T> {
    /// Creates a replication with no warmup (warmup equals the start).
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InvalidReplication` - `end < start`
    pub fn new(start_time: T, end_time: T) -> Result<Self, SimulatorError> {
        let warmup_time = start_time.clone();
        Self::with_warmup(start_time, warmup_time, end_time)
    }

    /// Creates a replication with an explicit warmup point.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InvalidReplication` - unless
    ///   `start <= warmup <= end`
    pub fn with_warmup(
        start_time: T,
        warmup_time: T,
        end_time: T,
    ) -> Result<Self, SimulatorError> {
        if warmup_time < start_time {
            return Err(SimulatorError::InvalidReplication {
                reason: format!(
                    "warmup time {warmup_time} is before start time {start_time}"
                ),
            });
        }
        if end_time < warmup_time {
            return Err(SimulatorError::InvalidReplication {
                reason: format!("end time {end_time} is before warmup time {warmup_time}"),
            });
        }
        Ok(Self {
            start_time,
            end_time,
            warmup_time,
            seed: 0,
        })
    }

    /// Sets the seed for the replication's random stream.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn start_time(&self) -> &T {
        &self.start_time
    }

    pub fn end_time(&self) -> &T {
        &self.end_time
    }

    pub fn warmup_time(&self) -> &T {
        &self.warmup_time
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
