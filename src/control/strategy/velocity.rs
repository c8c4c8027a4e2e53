// Proportional velocity control with convergence detection

use std::time::Duration;

use tracing::{debug, warn};

use super::Step;
use crate::messages::MoveOutcome;
use crate::motor::{Actuator, ActuatorError};

#[derive(Debug, Clone)]
pub struct ProportionalVelocity {
    target: f64,
    kp: f64,
    tolerance: f64,
    timeout: Option<Duration>,
}

impl ProportionalVelocity {
    pub fn new(target: f64, kp: f64, tolerance: f64, timeout: Option<Duration>) -> Self {
        Self {
            target,
            kp,
            tolerance,
            timeout,
        }
    }

    /// Command `kp * error`; once `|error| < tolerance` command zero and finish.
    pub fn step(
        &mut self,
        actuator: &mut dyn Actuator,
        elapsed: Duration,
    ) -> Result<Step, ActuatorError> {
        let position = actuator.position()?;
        let error = self.target - position;
        let command = self.kp * error;
        debug!("P-control: error={:.3} deg, command={:.3} deg/s", error, command);
        actuator.set_velocity(command)?;

        if error.abs() < self.tolerance {
            actuator.set_velocity(0.0)?;
            return Ok(Step::Done(MoveOutcome::Completed));
        }

        if let Some(timeout) = self.timeout {
            if elapsed >= timeout {
                warn!(
                    "No convergence after {:?}, {:.3} deg from target",
                    timeout, error
                );
                actuator.set_velocity(0.0)?;
                return Ok(Step::Done(MoveOutcome::TimedOut));
            }
        }

        Ok(Step::Continue)
    }
}
