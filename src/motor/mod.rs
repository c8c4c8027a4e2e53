// Motor control module for the single-joint controller
//
// Provides:
// - The actuator interface consumed by the control core
// - Feetech STS3215 serial protocol implementation
// - A servo-backed driver and a simulated axis behind that interface

mod actuator;
mod driver;
pub mod feetech;
pub mod sim;
pub mod units;

pub use actuator::{Actuator, ActuatorError, ControlMode};
pub use driver::MotorDriver;
pub use feetech::{FeetechBus, FeetechError};
pub use sim::SimAxis;
