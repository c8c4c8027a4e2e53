// Simulated joint for `--sim` runs and tests
//
// Time only moves when `advance` is called, so tests can step the plant
// deterministically. Clones share the same joint.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::actuator::{Actuator, ActuatorError, ControlMode, Result};

/// Most recent setpoints kept per history; older ones are dropped
pub const HISTORY_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
struct SimState {
    min: f64,
    max: f64,
    position: f64,
    mode: Option<ControlMode>,
    ref_speed: f64,
    ref_accel: f64,
    // Positional move in progress and current profile speed
    goal: Option<f64>,
    speed: f64,
    direct_setpoint: Option<f64>,
    velocity: f64,
    accel_limited: bool,
    faulted: bool,
    direct_history: VecDeque<f64>,
    velocity_history: VecDeque<f64>,
}

#[derive(Debug, Clone)]
pub struct SimAxis {
    state: Arc<Mutex<SimState>>,
}

impl SimAxis {
    /// A joint with limits `[min, max]` resting at `position`
    pub fn new(min: f64, max: f64, position: f64) -> Self {
        let state = SimState {
            min,
            max,
            position: position.clamp(min.min(max), max.max(min)),
            mode: None,
            ref_speed: 0.0,
            ref_accel: 0.0,
            goal: None,
            speed: 0.0,
            direct_setpoint: None,
            velocity: 0.0,
            accel_limited: true,
            faulted: false,
            direct_history: VecDeque::new(),
            velocity_history: VecDeque::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Integrate the plant over `dt`
    pub fn advance(&self, dt: Duration) {
        let mut s = self.state.lock();
        let dt = dt.as_secs_f64();

        match s.mode {
            Some(ControlMode::Position) => {
                if let Some(goal) = s.goal {
                    let dist = goal - s.position;
                    // Trapezoidal profile: ramp up, cruise, brake to stop at goal
                    let braking = (2.0 * s.ref_accel * dist.abs()).sqrt();
                    let speed = (s.speed + s.ref_accel * dt).min(s.ref_speed).min(braking);
                    let step = speed * dt;
                    if step >= dist.abs() || dist == 0.0 {
                        s.position = goal;
                        s.goal = None;
                        s.speed = 0.0;
                    } else {
                        s.position += step * dist.signum();
                        s.speed = speed;
                    }
                }
            }
            Some(ControlMode::PositionDirect) => {
                if let Some(setpoint) = s.direct_setpoint {
                    s.position = setpoint;
                }
            }
            Some(ControlMode::Velocity) => {
                s.position += s.velocity * dt;
            }
            None => {}
        }

        let (lo, hi) = (s.min.min(s.max), s.max.max(s.min));
        s.position = s.position.clamp(lo, hi);
    }

    /// Make every following actuator call fail until cleared
    pub fn set_faulted(&self, faulted: bool) {
        self.state.lock().faulted = faulted;
    }

    /// Move the joint by hand, as an external disturbance would
    pub fn force_position(&self, position: f64) {
        self.state.lock().position = position;
    }

    pub fn current_position(&self) -> f64 {
        self.state.lock().position
    }

    pub fn mode(&self) -> Option<ControlMode> {
        self.state.lock().mode
    }

    pub fn commanded_velocity(&self) -> f64 {
        self.state.lock().velocity
    }

    pub fn is_acceleration_limited(&self) -> bool {
        self.state.lock().accel_limited
    }

    /// Latest setpoints sent through `set_position_direct`, oldest first
    pub fn direct_setpoints(&self) -> Vec<f64> {
        self.state.lock().direct_history.iter().copied().collect()
    }

    /// Latest commands sent through `set_velocity`, oldest first
    pub fn velocity_commands(&self) -> Vec<f64> {
        self.state.lock().velocity_history.iter().copied().collect()
    }

    fn with_state<T>(&mut self, f: impl FnOnce(&mut SimState) -> Result<T>) -> Result<T> {
        let mut s = self.state.lock();
        if s.faulted {
            return Err(ActuatorError::Unavailable("simulated fault".to_string()));
        }
        f(&mut *s)
    }
}

fn record(history: &mut VecDeque<f64>, value: f64) {
    if history.len() == HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(value);
}

fn require_mode(s: &SimState, op: &'static str, wanted: ControlMode) -> Result<()> {
    match s.mode {
        Some(mode) if mode == wanted => Ok(()),
        Some(mode) => Err(ActuatorError::WrongMode { op, mode }),
        None => Err(ActuatorError::Unavailable(format!(
            "{} issued before a control mode was selected",
            op
        ))),
    }
}

impl Actuator for SimAxis {
    fn limits(&mut self) -> Result<(f64, f64)> {
        self.with_state(|s| {
            if s.min > s.max {
                return Err(ActuatorError::InvalidLimits {
                    min: s.min,
                    max: s.max,
                });
            }
            Ok((s.min, s.max))
        })
    }

    fn position(&mut self) -> Result<f64> {
        self.with_state(|s| Ok(s.position))
    }

    fn set_control_mode(&mut self, mode: ControlMode) -> Result<()> {
        self.with_state(|s| {
            s.mode = Some(mode);
            s.goal = None;
            s.speed = 0.0;
            s.direct_setpoint = None;
            s.velocity = 0.0;
            Ok(())
        })
    }

    fn set_ref_speed(&mut self, deg_s: f64) -> Result<()> {
        self.with_state(|s| {
            require_mode(s, "set_ref_speed", ControlMode::Position)?;
            s.ref_speed = deg_s.abs();
            Ok(())
        })
    }

    fn set_ref_acceleration(&mut self, deg_s2: f64) -> Result<()> {
        self.with_state(|s| {
            require_mode(s, "set_ref_acceleration", ControlMode::Position)?;
            s.ref_accel = deg_s2.abs();
            Ok(())
        })
    }

    fn position_move(&mut self, target: f64) -> Result<()> {
        self.with_state(|s| {
            require_mode(s, "position_move", ControlMode::Position)?;
            s.goal = Some(target.clamp(s.min.min(s.max), s.max.max(s.min)));
            Ok(())
        })
    }

    fn is_motion_done(&mut self) -> Result<bool> {
        self.with_state(|s| Ok(s.goal.is_none()))
    }

    fn set_position_direct(&mut self, position: f64) -> Result<()> {
        self.with_state(|s| {
            require_mode(s, "set_position_direct", ControlMode::PositionDirect)?;
            s.direct_setpoint = Some(position);
            record(&mut s.direct_history, position);
            Ok(())
        })
    }

    fn set_velocity(&mut self, deg_s: f64) -> Result<()> {
        self.with_state(|s| {
            require_mode(s, "set_velocity", ControlMode::Velocity)?;
            s.velocity = deg_s;
            record(&mut s.velocity_history, deg_s);
            Ok(())
        })
    }

    fn remove_acceleration_limit(&mut self) -> Result<()> {
        self.with_state(|s| {
            s.accel_limited = false;
            Ok(())
        })
    }
}
