// Positional move polled from the calling thread
//
// No periodic loop is involved: the caller blocks here until the joint
// reports done or the poll timeout runs out.

use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::ControlConfig;
use crate::messages::MoveOutcome;
use crate::motor::{Actuator, ActuatorError};

/// Start a positional move to `target` and wait for it.
///
/// The joint must already be in position mode. The actuator lock is only
/// held for each individual call, never across the sleeps. `cancelled` is
/// checked after every poll; once it returns true the move is abandoned.
pub fn run<A: Actuator>(
    actuator: &Mutex<A>,
    target: f64,
    config: &ControlConfig,
    cancelled: impl Fn() -> bool,
) -> Result<MoveOutcome, ActuatorError> {
    {
        let mut actuator = actuator.lock();
        actuator.set_ref_speed(config.ref_speed_deg_s)?;
        actuator.set_ref_acceleration(config.ref_accel_deg_s2)?;
        actuator.position_move(target)?;
    }

    let started = Instant::now();
    while started.elapsed() < config.poll_timeout {
        debug!("Waiting...");
        thread::sleep(config.poll_interval);
        if actuator.lock().is_motion_done()? {
            return Ok(MoveOutcome::Completed);
        }
        if cancelled() {
            return Ok(MoveOutcome::Aborted);
        }
    }
    Ok(MoveOutcome::TimedOut)
}
