// Servo-backed joint driver
//
// Wraps one STS3215 on a Feetech bus behind the `Actuator` interface,
// converting between joint degrees and raw register values.

use tracing::{debug, info, warn};

use super::actuator::{Actuator, ActuatorError, ControlMode, Result};
use super::feetech::{FeetechBus, FeetechError, OperatingMode};
use super::units::{
    deg_s2_to_raw_accel, deg_to_raw_position, degps_to_raw, raw_position_to_deg,
};

pub struct MotorDriver {
    bus: FeetechBus,
    motor_id: u8,
    mode: Option<ControlMode>,
}

impl MotorDriver {
    /// Connect to the servo `motor_id` on the given serial port and check it answers
    pub fn new(port: &str, motor_id: u8) -> Result<Self> {
        info!("Opening motor bus on {}", port);
        let bus = FeetechBus::open(port)?;
        let mut driver = Self {
            bus,
            motor_id,
            mode: None,
        };

        if !driver.bus.ping(motor_id)? {
            warn!("Motor {} not responding to ping", motor_id);
            return Err(FeetechError::Timeout { id: motor_id }.into());
        }
        debug!("Motor {} responding", motor_id);
        Ok(driver)
    }

    fn require_mode(&self, op: &'static str, allowed: &[ControlMode]) -> Result<()> {
        match self.mode {
            Some(mode) if allowed.contains(&mode) => Ok(()),
            Some(mode) => Err(ActuatorError::WrongMode { op, mode }),
            None => Err(ActuatorError::Unavailable(format!(
                "{} issued before a control mode was selected",
                op
            ))),
        }
    }

    /// Stop the joint where it is
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping motor {}", self.motor_id);
        match self.mode {
            Some(ControlMode::Velocity) => self.bus.set_velocity(self.motor_id, 0)?,
            Some(_) => {
                let raw = self.bus.get_position(self.motor_id)?;
                self.bus.set_goal_position(self.motor_id, raw)?;
            }
            None => {}
        }
        Ok(())
    }
}

impl Actuator for MotorDriver {
    fn limits(&mut self) -> Result<(f64, f64)> {
        let (min, max) = self.bus.get_position_limits(self.motor_id)?;
        let (min, max) = (raw_position_to_deg(min), raw_position_to_deg(max));
        if min > max {
            return Err(ActuatorError::InvalidLimits { min, max });
        }
        Ok((min, max))
    }

    fn position(&mut self) -> Result<f64> {
        Ok(raw_position_to_deg(self.bus.get_position(self.motor_id)?))
    }

    /// Disables torque, switches the operating mode, and re-enables torque.
    /// Both position modes use the servo's position loop.
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<()> {
        let operating = match mode {
            ControlMode::Position | ControlMode::PositionDirect => OperatingMode::Position,
            ControlMode::Velocity => OperatingMode::Velocity,
        };
        info!("Motor {}: {:?} mode", self.motor_id, mode);

        self.bus.disable_torque(self.motor_id)?;
        self.bus.set_operating_mode(self.motor_id, operating)?;
        if mode == ControlMode::PositionDirect {
            // Track each setpoint as fast as possible
            self.bus.set_acceleration(self.motor_id, 0)?;
            self.bus.set_goal_speed(self.motor_id, 0)?;
        }
        self.bus.enable_torque(self.motor_id)?;

        self.mode = Some(mode);
        Ok(())
    }

    fn set_ref_speed(&mut self, deg_s: f64) -> Result<()> {
        self.require_mode("set_ref_speed", &[ControlMode::Position])?;
        let raw = degps_to_raw(deg_s.abs()).unsigned_abs();
        self.bus.set_goal_speed(self.motor_id, raw)?;
        Ok(())
    }

    fn set_ref_acceleration(&mut self, deg_s2: f64) -> Result<()> {
        self.require_mode("set_ref_acceleration", &[ControlMode::Position])?;
        self.bus
            .set_acceleration(self.motor_id, deg_s2_to_raw_accel(deg_s2))?;
        Ok(())
    }

    fn position_move(&mut self, target: f64) -> Result<()> {
        self.require_mode("position_move", &[ControlMode::Position])?;
        self.bus
            .set_goal_position(self.motor_id, deg_to_raw_position(target))?;
        Ok(())
    }

    fn is_motion_done(&mut self) -> Result<bool> {
        Ok(!self.bus.is_moving(self.motor_id)?)
    }

    fn set_position_direct(&mut self, position: f64) -> Result<()> {
        self.require_mode("set_position_direct", &[ControlMode::PositionDirect])?;
        self.bus
            .set_goal_position(self.motor_id, deg_to_raw_position(position))?;
        Ok(())
    }

    fn set_velocity(&mut self, deg_s: f64) -> Result<()> {
        self.require_mode("set_velocity", &[ControlMode::Velocity])?;
        self.bus.set_velocity(self.motor_id, degps_to_raw(deg_s))?;
        Ok(())
    }

    fn remove_acceleration_limit(&mut self) -> Result<()> {
        self.bus.set_acceleration(self.motor_id, 0)?;
        Ok(())
    }
}

impl Drop for MotorDriver {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop motor on drop: {}", e);
        }
    }
}
