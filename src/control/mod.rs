// Periodic control core for a single joint
//
// - Target selection inside the joint limits
// - Three interchangeable strategies (positional move with polling,
//   minimum-jerk trajectory on direct position, velocity P-control)
// - The controller that arms a move from the command side and finishes
//   it from the periodic loop

mod controller;
pub mod strategy;
pub mod target;

pub use controller::AxisController;
pub use strategy::Strategy;
pub use target::select_target;

use crate::motor::ActuatorError;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("A move is already in progress")]
    Busy,

    #[error("Controller is shutting down")]
    ShuttingDown,

    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("Invalid joint limits: min={min}, max={max}")]
    InvalidLimits { min: f64, max: f64 },
}
