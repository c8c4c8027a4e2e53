// Actuator boundary consumed by the control core

use super::feetech::FeetechError;

/// Hardware control mode selected before a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Fire-and-forget positional move with an internal profile
    Position,
    /// Raw position setpoint streamed every tick
    PositionDirect,
    /// Velocity setpoint streamed every tick
    Velocity,
}

#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    #[error("Motor bus error: {0}")]
    Bus(#[from] FeetechError),

    #[error("Operation {op} not supported in {mode:?} mode")]
    WrongMode { op: &'static str, mode: ControlMode },

    #[error("Invalid joint limits: min={min}, max={max}")]
    InvalidLimits { min: f64, max: f64 },

    #[error("Actuator unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ActuatorError>;

/// A single controlled joint. Positions in degrees, speeds in deg/s.
///
/// Implemented by [`MotorDriver`](super::MotorDriver) for real servos and by
/// [`SimAxis`](super::SimAxis) for simulation and tests.
pub trait Actuator: Send {
    /// Lower and upper position limit
    fn limits(&mut self) -> Result<(f64, f64)>;

    fn position(&mut self) -> Result<f64>;

    fn set_control_mode(&mut self, mode: ControlMode) -> Result<()>;

    /// Cruise speed for positional moves
    fn set_ref_speed(&mut self, deg_s: f64) -> Result<()>;

    /// Acceleration for positional moves
    fn set_ref_acceleration(&mut self, deg_s2: f64) -> Result<()>;

    /// Start a positional move and return immediately
    fn position_move(&mut self, target: f64) -> Result<()>;

    fn is_motion_done(&mut self) -> Result<bool>;

    fn set_position_direct(&mut self, position: f64) -> Result<()>;

    fn set_velocity(&mut self, deg_s: f64) -> Result<()>;

    /// Drop any acceleration slewing on velocity commands. Optional.
    fn remove_acceleration_limit(&mut self) -> Result<()> {
        Ok(())
    }
}
