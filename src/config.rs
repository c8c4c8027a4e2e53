// Loop rate, key expressions, motor configuration and strategy tuning
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::Strategy;

// Control loop frequency (20 ms period)
pub const LOOP_HZ: u64 = 50;
pub const CONTROL_PERIOD: Duration = Duration::from_millis(1000 / LOOP_HZ);

// Zenoh key expressions
pub const KEY_RPC: &str = "axis/rpc"; // go / enc requests
pub const TOPIC_STATUS: &str = "axis/state/motion"; // motion telemetry

// Motor configuration
// Serial port for the Feetech servo bus
pub const MOTOR_PORT: &str = "/dev/ttyACM0";
// Servo driving the controlled joint
pub const MOTOR_ID: u8 = 3;

// Position-with-polling tuning
pub const REF_SPEED_DEG_S: f64 = 30.0;
pub const REF_ACCEL_DEG_S2: f64 = 100.0;
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(10);

// Minimum-jerk trajectory duration
pub const JERK_DURATION: Duration = Duration::from_secs(5);

// Velocity P-control
pub const KP: f64 = 2.0;
pub const CONVERGENCE_TOLERANCE_DEG: f64 = 1.0;
pub const VELOCITY_TIMEOUT: Duration = Duration::from_secs(30);

// Fraction of the joint range kept clear of the far bound when picking a target
pub const TARGET_MARGIN: f64 = 0.1;

/// Tunables for one axis controller.
///
/// `Default` yields the constants above; tests shrink the durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub strategy: Strategy,
    pub ref_speed_deg_s: f64,
    pub ref_accel_deg_s2: f64,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub jerk_duration: Duration,
    pub kp: f64,
    pub convergence_tolerance_deg: f64,
    /// `None` waits for convergence forever.
    pub velocity_timeout: Option<Duration>,
    /// Issue `remove_acceleration_limit` before arming the velocity strategy.
    pub unlimited_acceleration: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::MinimumJerkDirect,
            ref_speed_deg_s: REF_SPEED_DEG_S,
            ref_accel_deg_s2: REF_ACCEL_DEG_S2,
            poll_interval: POLL_INTERVAL,
            poll_timeout: POLL_TIMEOUT,
            jerk_duration: JERK_DURATION,
            kp: KP,
            convergence_tolerance_deg: CONVERGENCE_TOLERANCE_DEG,
            velocity_timeout: Some(VELOCITY_TIMEOUT),
            unlimited_acceleration: true,
        }
    }
}

impl ControlConfig {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

// Joint limits of the simulated axis (`--sim`)
pub const SIM_MIN_DEG: f64 = 15.0;
pub const SIM_MAX_DEG: f64 = 105.0;
