// Command handler vs. control loop, driven from separate threads on a simulated joint

use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use axis_zenoh_runtime::config::ControlConfig;
use axis_zenoh_runtime::control::{AxisController, ControlError, Strategy};
use axis_zenoh_runtime::messages::{Command, MoveOutcome, Reply};
use axis_zenoh_runtime::motor::SimAxis;

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::yield_now();
    }
}

/// Run `cycles` go requests on one thread while another ticks as fast as it can.
/// Returns the replies and how many ticks finished a move.
fn arm_complete_cycles(
    controller: Arc<AxisController<SimAxis>>,
    cycles: usize,
) -> (Vec<Reply>, usize) {
    let handler = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            (0..cycles)
                .map(|_| controller.handle(&Command::Go))
                .collect::<Vec<_>>()
        })
    };

    let mut completions = 0;
    while !handler.is_finished() {
        if controller.tick().is_some() {
            completions += 1;
        }
        thread::yield_now();
    }
    // A finished handler leaves nothing armed for a late tick
    assert_eq!(controller.tick(), None);

    (handler.join().unwrap(), completions)
}

#[test]
fn stress_velocity_wakes_exactly_once_per_move() {
    let axis = SimAxis::new(0.0, 100.0, 10.0);
    let config = ControlConfig {
        // Converges on the first tick
        convergence_tolerance_deg: 1_000.0,
        ..ControlConfig::with_strategy(Strategy::VelocityProportional)
    };
    let controller = Arc::new(AxisController::new(axis, config));

    let (replies, completions) = arm_complete_cycles(controller, 1000);
    assert_eq!(replies.len(), 1000);
    assert!(replies.iter().all(|r| *r == Reply::ack()));
    assert_eq!(completions, 1000);
}

#[test]
fn stress_minimum_jerk_wakes_exactly_once_per_move() {
    let axis = SimAxis::new(0.0, 100.0, 10.0);
    let config = ControlConfig {
        jerk_duration: Duration::ZERO,
        ..ControlConfig::with_strategy(Strategy::MinimumJerkDirect)
    };
    let controller = Arc::new(AxisController::new(axis.clone(), config));

    let (replies, completions) = arm_complete_cycles(controller, 1000);
    assert!(replies.iter().all(|r| *r == Reply::ack()));
    assert_eq!(completions, 1000);
    // A zero-length trajectory jumps straight to the target
    assert!(axis.direct_setpoints().iter().all(|&p| p == 90.0));
}

#[test]
fn concurrent_go_accepts_one_move() {
    const CALLERS: usize = 8;
    let axis = SimAxis::new(0.0, 100.0, 10.0);
    let controller = Arc::new(AxisController::new(
        axis,
        ControlConfig::with_strategy(Strategy::MinimumJerkDirect),
    ));

    let barrier = Arc::new(Barrier::new(CALLERS));
    let callers: Vec<_> = (0..CALLERS)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.go()
            })
        })
        .collect();

    // Everyone but the accepted caller returns right away
    wait_until("rejected callers", || {
        controller.is_armed() && callers.iter().filter(|c| c.is_finished()).count() == CALLERS - 1
    });
    controller.tick_at(Instant::now() + Duration::from_secs(10));

    let results: Vec<_> = callers.into_iter().map(|c| c.join().unwrap()).collect();
    let accepted = results
        .iter()
        .filter(|r| matches!(r, Ok(MoveOutcome::Completed)))
        .count();
    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(ControlError::Busy)))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(busy, CALLERS - 1);
}

#[test]
fn degenerate_range_finishes() {
    for strategy in [Strategy::MinimumJerkDirect, Strategy::VelocityProportional] {
        let axis = SimAxis::new(30.0, 30.0, 30.0);
        let config = ControlConfig {
            jerk_duration: Duration::from_millis(20),
            ..ControlConfig::with_strategy(strategy)
        };
        let controller = Arc::new(AxisController::new(axis.clone(), config));

        let (replies, completions) = arm_complete_cycles(Arc::clone(&controller), 1);
        assert_eq!(replies, vec![Reply::ack()], "{:?}", strategy);
        assert_eq!(completions, 1);
        assert_eq!(axis.current_position(), 30.0);
        assert!(axis.direct_setpoints().iter().all(|&p| p == 30.0));
        assert!(axis.velocity_commands().iter().all(|&v| v == 0.0));
    }
}

#[test]
fn enc_is_idempotent_and_never_blocks() {
    let axis = SimAxis::new(0.0, 100.0, 10.0);
    let controller = Arc::new(AxisController::new(
        axis,
        ControlConfig::with_strategy(Strategy::MinimumJerkDirect),
    ));

    let first = controller.handle(&Command::Enc);
    assert_eq!(first, Reply::ack_with_position(10.0));
    for _ in 0..100 {
        assert_eq!(controller.handle(&Command::Enc), first);
    }

    // Still answers while a go is parked waiting on the loop
    let handler = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || controller.handle(&Command::Go))
    };
    wait_until("armed move", || controller.is_armed());

    let started = Instant::now();
    assert_eq!(controller.handle(&Command::Enc), first);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!handler.is_finished());

    controller.tick_at(Instant::now() + Duration::from_secs(10));
    assert_eq!(handler.join().unwrap(), Reply::ack());
}

#[test]
fn polling_move_completes_with_running_plant() {
    let axis = SimAxis::new(0.0, 100.0, 88.0);
    let config = ControlConfig {
        poll_interval: Duration::from_millis(1),
        poll_timeout: Duration::from_secs(5),
        ..ControlConfig::with_strategy(Strategy::PositionPolling)
    };
    let controller = Arc::new(AxisController::new(axis.clone(), config));

    let handler = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || controller.go())
    };
    // Plant time runs at 20x wall-clock so the 78 deg move takes well under the timeout
    while !handler.is_finished() {
        axis.advance(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(handler.join().unwrap().unwrap(), MoveOutcome::Completed);
    assert_eq!(axis.current_position(), 10.0);
    assert!(!controller.is_armed());
}

#[test]
fn shutdown_releases_go_parked_on_blocking_pool() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let controller = Arc::new(AxisController::new(
        SimAxis::new(0.0, 100.0, 10.0),
        ControlConfig::with_strategy(Strategy::MinimumJerkDirect),
    ));

    let (reply_tx, reply_rx) = mpsc::channel();
    {
        let controller = Arc::clone(&controller);
        rt.spawn_blocking(move || {
            let _ = reply_tx.send(controller.handle(&Command::Go));
        });
    }
    wait_until("armed move", || controller.is_armed());

    // The tick loop is gone; only shutdown can wake the parked request
    controller.shutdown();

    let (dropped_tx, dropped_rx) = mpsc::channel();
    thread::spawn(move || {
        drop(rt);
        let _ = dropped_tx.send(());
    });
    assert!(
        dropped_rx.recv_timeout(Duration::from_secs(3)).is_ok(),
        "runtime did not drop after shutdown"
    );
    assert_eq!(reply_rx.recv_timeout(Duration::from_secs(1)), Ok(Reply::Nack));
    assert_eq!(Arc::strong_count(&controller), 1);
}

#[test]
fn velocity_move_recovers_from_disturbance() {
    let axis = SimAxis::new(0.0, 100.0, 10.0);
    let controller = Arc::new(AxisController::new(
        axis.clone(),
        ControlConfig::with_strategy(Strategy::VelocityProportional),
    ));

    let handler = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || controller.handle(&Command::Go))
    };
    wait_until("armed move", || controller.is_armed());

    let mut ticks = 0;
    let mut disturbed = false;
    while controller.tick().is_none() {
        axis.advance(Duration::from_millis(20));
        ticks += 1;
        // Knock the joint back once it is halfway there
        if !disturbed && axis.current_position() > 50.0 {
            axis.force_position(20.0);
            disturbed = true;
        }
        assert!(ticks < 5_000, "velocity move never converged");
    }

    assert!(disturbed);
    assert_eq!(handler.join().unwrap(), Reply::ack());
    assert!((axis.current_position() - 90.0).abs() < 1.0);
}
