// Minimum-jerk trajectory under direct position control

use std::time::Duration;

use tracing::debug;

use super::Step;
use crate::messages::MoveOutcome;
use crate::motor::{Actuator, ActuatorError};

/// Normalized quintic minimum-jerk profile `10r^3 - 15r^4 + 6r^5`.
///
/// Goes from 0 at `r = 0` to 1 at `r = 1` with zero velocity and
/// acceleration at both ends. `r` is not clamped.
pub fn minimum_jerk(r: f64) -> f64 {
    let r3 = r * r * r;
    let r4 = r3 * r;
    let r5 = r4 * r;
    10.0 * r3 - 15.0 * r4 + 6.0 * r5
}

#[derive(Debug, Clone)]
pub struct MinimumJerk {
    start: f64,
    target: f64,
    duration: Duration,
}

impl MinimumJerk {
    /// Trajectory from `start` (position at arm time) to `target` over `duration`
    pub fn new(start: f64, target: f64, duration: Duration) -> Self {
        Self {
            start,
            target,
            duration,
        }
    }

    /// Setpoint `elapsed` after arming.
    ///
    /// Past the duration the polynomial keeps going, so the last sample
    /// before completion lands slightly off `target`.
    pub fn reference(&self, elapsed: Duration) -> f64 {
        let total = self.duration.as_secs_f64();
        let r = if total > 0.0 {
            elapsed.as_secs_f64() / total
        } else {
            1.0
        };
        self.start + (self.target - self.start) * minimum_jerk(r)
    }

    pub fn step(
        &mut self,
        actuator: &mut dyn Actuator,
        elapsed: Duration,
    ) -> Result<Step, ActuatorError> {
        let reference = self.reference(elapsed);
        debug!("Minimum-jerk setpoint: {:.3} deg", reference);
        actuator.set_position_direct(reference)?;

        if elapsed > self.duration {
            Ok(Step::Done(MoveOutcome::Completed))
        } else {
            Ok(Step::Continue)
        }
    }
}
