// Single-joint controller shared by the command handler and the periodic loop
//
// `go` runs on the command side: it picks a target, then either polls a
// positional move itself or arms a periodic move and sleeps on the
// completion condvar. `tick` runs on the loop side: it steps the armed
// move and, once finished, disarms it and wakes the waiter.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use super::ControlError;
use super::strategy::{
    MinimumJerk, PeriodicMove, ProportionalVelocity, Step, Strategy, position,
};
use super::target::select_target;
use crate::config::ControlConfig;
use crate::messages::{Command, MotionPhase, MotionStatus, MoveOutcome, Reply};
use crate::motor::Actuator;

struct ActiveMove {
    id: u64,
    armed_at: Instant,
    strategy: PeriodicMove,
}

#[derive(Default)]
struct MotionState {
    // A `go` is in flight, from target selection until its reply
    busy: bool,
    target: Option<f64>,
    started: Option<Instant>,
    // Armed iff `Some`; set only by `go`, cleared only by `tick`
    active: Option<ActiveMove>,
    next_id: u64,
    // Outcome of the last move finished by `tick` or `shutdown`, keyed by move id
    finished: Option<(u64, MoveOutcome)>,
    // Set once by `shutdown`; no move is armed afterwards
    shutdown: bool,
}

/// Clears the busy flag when a `go` returns, whichever way it returns
struct BusyGuard<'a> {
    state: &'a Mutex<MotionState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.busy = false;
        state.target = None;
        state.started = None;
    }
}

pub struct AxisController<A: Actuator> {
    config: ControlConfig,
    actuator: Mutex<A>,
    state: Mutex<MotionState>,
    done: Condvar,
}

impl<A: Actuator> AxisController<A> {
    pub fn new(actuator: A, config: ControlConfig) -> Self {
        Self {
            config,
            actuator: Mutex::new(actuator),
            state: Mutex::new(MotionState::default()),
            done: Condvar::new(),
        }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Serve one request. Every request gets exactly one reply.
    pub fn handle(&self, command: &Command) -> Reply {
        match command {
            Command::Go => match self.go() {
                Ok(outcome) => {
                    match &outcome {
                        MoveOutcome::Completed => info!("Movement completed"),
                        MoveOutcome::TimedOut => warn!("Timeout expired"),
                        MoveOutcome::Faulted(reason) => warn!("Movement aborted: {}", reason),
                        MoveOutcome::Aborted => warn!("Movement aborted by shutdown"),
                    }
                    outcome.reply()
                }
                Err(e) => {
                    warn!("Cannot start movement: {}", e);
                    Reply::Nack
                }
            },
            Command::Enc => match self.enc() {
                Ok(position) => Reply::ack_with_position(position),
                Err(e) => {
                    warn!("Cannot read joint position: {}", e);
                    Reply::Nack
                }
            },
            Command::Unknown(name) => {
                warn!("Unknown command: {:?}", name);
                Reply::Nack
            }
        }
    }

    /// Current joint position. Never waits on a move.
    pub fn enc(&self) -> Result<f64, ControlError> {
        Ok(self.actuator.lock().position()?)
    }

    /// Run one move to completion with the configured strategy.
    ///
    /// Fails with `Busy` if another move is in flight.
    pub fn go(&self) -> Result<MoveOutcome, ControlError> {
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return Err(ControlError::ShuttingDown);
            }
            if state.busy {
                return Err(ControlError::Busy);
            }
            state.busy = true;
            state.started = Some(Instant::now());
        }
        let _guard = BusyGuard { state: &self.state };

        let strategy = self.config.strategy;
        let (target, start) = {
            let mut actuator = self.actuator.lock();
            let (min, max) = actuator.limits()?;
            if min.is_nan() || max.is_nan() || min > max {
                return Err(ControlError::InvalidLimits { min, max });
            }
            let current = actuator.position()?;
            let target = select_target(current, min, max);
            actuator.set_control_mode(strategy.control_mode())?;
            (target, current)
        };
        self.state.lock().target = Some(target);
        info!("Yielding new target: {:.3} [deg] ({:?})", target, strategy);

        let periodic = match strategy {
            Strategy::PositionPolling => {
                let cancelled = || self.state.lock().shutdown;
                return Ok(position::run(&self.actuator, target, &self.config, cancelled)?);
            }
            Strategy::MinimumJerkDirect => PeriodicMove::MinimumJerk(MinimumJerk::new(
                start,
                target,
                self.config.jerk_duration,
            )),
            Strategy::VelocityProportional => {
                if self.config.unlimited_acceleration {
                    self.actuator.lock().remove_acceleration_limit()?;
                }
                PeriodicMove::Velocity(ProportionalVelocity::new(
                    target,
                    self.config.kp,
                    self.config.convergence_tolerance_deg,
                    self.config.velocity_timeout,
                ))
            }
        };

        Ok(self.arm_and_wait(periodic))
    }

    fn arm_and_wait(&self, strategy: PeriodicMove) -> MoveOutcome {
        let mut state = self.state.lock();
        if state.shutdown {
            return MoveOutcome::Aborted;
        }
        state.next_id += 1;
        let id = state.next_id;
        state.active = Some(ActiveMove {
            id,
            armed_at: Instant::now(),
            strategy,
        });
        debug!("Move {} armed", id);

        // The condvar releases the lock while sleeping; only our own id ends the wait
        loop {
            match state.finished.take() {
                Some((finished, outcome)) if finished == id => return outcome,
                other => state.finished = other,
            }
            self.done.wait(&mut state);
        }
    }

    /// One period of the control loop
    pub fn tick(&self) -> Option<MoveOutcome> {
        self.tick_at(Instant::now())
    }

    /// Step the armed move as of `now`.
    ///
    /// Returns the outcome when this tick finished the move.
    pub fn tick_at(&self, now: Instant) -> Option<MoveOutcome> {
        let mut state = self.state.lock();
        let active = state.active.as_mut()?;
        let elapsed = now.saturating_duration_since(active.armed_at);

        let outcome = {
            let mut actuator = self.actuator.lock();
            match active.strategy.step(&mut *actuator, elapsed) {
                Ok(Step::Continue) => return None,
                Ok(Step::Done(outcome)) => outcome,
                Err(e) => {
                    warn!("Control tick failed, aborting move: {}", e);
                    if let Err(halt) = active.strategy.halt(&mut *actuator) {
                        warn!("Failed to stop joint: {}", halt);
                    }
                    MoveOutcome::Faulted(e.to_string())
                }
            }
        };

        let id = active.id;
        state.active = None;
        state.finished = Some((id, outcome.clone()));
        drop(state);

        debug!("Move {} finished: {:?}", id, outcome);
        self.done.notify_all();
        Some(outcome)
    }

    /// Stop serving moves: abort the armed one, wake its waiter, and make
    /// every later `go` fail. A polled positional move is abandoned at its
    /// next poll.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        if let Some(active) = state.active.take() {
            if let Err(e) = active.strategy.halt(&mut *self.actuator.lock()) {
                warn!("Failed to stop joint: {}", e);
            }
            info!("Move {} aborted", active.id);
            state.finished = Some((active.id, MoveOutcome::Aborted));
        }
        drop(state);
        self.done.notify_all();
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().active.is_some()
    }

    pub fn status(&self) -> MotionStatus {
        let state = self.state.lock();
        let phase = if state.active.is_some() {
            MotionPhase::Armed
        } else if state.busy {
            MotionPhase::Busy
        } else {
            MotionPhase::Idle
        };
        MotionStatus {
            phase,
            strategy: self.config.strategy,
            target: state.target,
            elapsed_s: state.started.map(|t| t.elapsed().as_secs_f64()),
        }
    }
}
