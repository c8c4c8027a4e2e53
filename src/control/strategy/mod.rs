// Control strategies
//
// `Strategy` is picked by configuration; `go` dispatches on it once. The
// periodic ones are armed as a `PeriodicMove` and stepped by `tick`.

mod minimum_jerk;
pub mod position;
mod velocity;

pub use minimum_jerk::{MinimumJerk, minimum_jerk};
pub use velocity::ProportionalVelocity;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::messages::MoveOutcome;
use crate::motor::{Actuator, ActuatorError, ControlMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Positional move, polled until done or timed out
    #[value(alias = "position")]
    PositionPolling,
    /// Minimum-jerk trajectory streamed as direct position setpoints
    #[value(alias = "positiondirect")]
    MinimumJerkDirect,
    /// Proportional velocity control until within tolerance
    #[value(alias = "velocity")]
    VelocityProportional,
}

impl Strategy {
    /// Hardware mode the strategy drives the joint in
    pub fn control_mode(self) -> ControlMode {
        match self {
            Strategy::PositionPolling => ControlMode::Position,
            Strategy::MinimumJerkDirect => ControlMode::PositionDirect,
            Strategy::VelocityProportional => ControlMode::Velocity,
        }
    }
}

/// Result of one control tick
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    Done(MoveOutcome),
}

/// An armed move advanced once per tick
#[derive(Debug, Clone)]
pub enum PeriodicMove {
    MinimumJerk(MinimumJerk),
    Velocity(ProportionalVelocity),
}

impl PeriodicMove {
    /// Issue the next setpoint for `elapsed` time since arming
    pub fn step(
        &mut self,
        actuator: &mut dyn Actuator,
        elapsed: Duration,
    ) -> Result<Step, ActuatorError> {
        match self {
            PeriodicMove::MinimumJerk(m) => m.step(actuator, elapsed),
            PeriodicMove::Velocity(v) => v.step(actuator, elapsed),
        }
    }

    /// Best-effort stop after a failed tick
    pub fn halt(&self, actuator: &mut dyn Actuator) -> Result<(), ActuatorError> {
        match self {
            PeriodicMove::MinimumJerk(_) => Ok(()),
            PeriodicMove::Velocity(_) => actuator.set_velocity(0.0),
        }
    }
}
