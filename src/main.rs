use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use axis_zenoh_runtime::config::{
    ControlConfig, KEY_RPC, MOTOR_ID, MOTOR_PORT, SIM_MAX_DEG, SIM_MIN_DEG, TOPIC_STATUS,
};
use axis_zenoh_runtime::control::{AxisController, Strategy};
use axis_zenoh_runtime::motor::{MotorDriver, SimAxis};
use axis_zenoh_runtime::runtime::{self, RuntimeOptions};

/// Single-joint motion controller served over zenoh
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Control strategy used for every move
    #[arg(long, value_enum, default_value_t = Strategy::MinimumJerkDirect)]
    strategy: Strategy,

    /// Serial port of the Feetech bus
    #[arg(long, default_value = MOTOR_PORT)]
    port: String,

    /// Servo ID of the controlled joint
    #[arg(long, default_value_t = MOTOR_ID)]
    motor_id: u8,

    /// Drive a simulated joint instead of hardware
    #[arg(long)]
    sim: bool,

    /// Key expression serving go/enc requests
    #[arg(long, default_value = KEY_RPC)]
    rpc_key: String,

    /// Topic for motion status
    #[arg(long, default_value = TOPIC_STATUS)]
    status_topic: String,

    /// Seconds before an unconverged velocity move gives up (0 waits forever) [default: 30]
    #[arg(long, value_parser = parse_timeout)]
    velocity_timeout: Option<Duration>,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("expected a finite, non-negative number of seconds, got {}", s))
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let mut config = ControlConfig::with_strategy(args.strategy);
    if let Some(timeout) = args.velocity_timeout {
        config.velocity_timeout = (!timeout.is_zero()).then_some(timeout);
    }
    let options = RuntimeOptions {
        rpc_key: args.rpc_key,
        status_topic: args.status_topic,
        ..RuntimeOptions::default()
    };

    let result = if args.sim {
        let axis = SimAxis::new(SIM_MIN_DEG, SIM_MAX_DEG, SIM_MIN_DEG);
        let controller = AxisController::new(axis.clone(), config);
        runtime::run(controller, Some(axis), options).await
    } else {
        match MotorDriver::new(&args.port, args.motor_id) {
            Ok(driver) => runtime::run(AxisController::new(driver, config), None, options).await,
            Err(e) => Err(e.into()),
        }
    };

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("12.5"), Ok(Duration::from_millis(12_500)));
        assert_eq!(parse_timeout("0"), Ok(Duration::ZERO));
        for bad in ["-1", "NaN", "inf", "soon"] {
            assert!(parse_timeout(bad).is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_velocity_timeout_flag() {
        let args = Args::try_parse_from(["axis", "--sim", "--velocity-timeout", "0"]).unwrap();
        assert_eq!(args.velocity_timeout, Some(Duration::ZERO));
        assert!(Args::try_parse_from(["axis", "--velocity-timeout", "-3"]).is_err());
        let args = Args::try_parse_from(["axis"]).unwrap();
        assert_eq!(args.velocity_timeout, None);
    }
}
