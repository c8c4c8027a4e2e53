// Joint diagnostic: READ-ONLY check of the servo driving the controlled joint
//
// This tool does NOT write anything to the motor - it's completely safe.
// Use it before starting the runtime on hardware.
//
// Usage: cargo run --example axis_diagnostic -- [port] [motor_id]

use axis_zenoh_runtime::config::{MOTOR_ID, MOTOR_PORT};
use axis_zenoh_runtime::control::select_target;
use axis_zenoh_runtime::motor::feetech::{FeetechBus, Register};
use axis_zenoh_runtime::motor::units::{STEPS_PER_DEG, raw_position_to_deg};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| MOTOR_PORT.to_string());
    let id: u8 = match args.next() {
        Some(id) => id.parse()?,
        None => MOTOR_ID,
    };

    println!("Joint diagnostic (read-only)");
    println!("Serial port: {}, motor ID: {}", port, id);
    println!();

    println!("Step 1: Opening serial port...");
    let mut bus = match FeetechBus::open(&port) {
        Ok(bus) => {
            println!("  ✓ Serial port opened");
            bus
        }
        Err(e) => {
            println!("  ✗ Failed to open serial port: {}", e);
            println!("  - Check the port path and the USB cable");
            return Err(e.into());
        }
    };

    println!("Step 2: Pinging motor...");
    if !bus.ping(id)? {
        println!("  ✗ NO RESPONSE - check power, wiring and the motor ID");
        return Ok(());
    }
    println!("  ✓ RESPONDING");
    println!();

    println!("Step 3: Reading registers...");
    match bus.read_u8(id, Register::OperatingMode) {
        Ok(mode) => {
            let mode_str = match mode {
                0 => "Position",
                1 => "Velocity",
                2 => "PWM",
                3 => "Step",
                _ => "Unknown",
            };
            println!("    Operating Mode:   {} ({})", mode, mode_str);
        }
        Err(e) => println!("    Operating Mode:   ERROR - {}", e),
    }

    match bus.read_u8(id, Register::TorqueEnable) {
        Ok(val) => println!("    Torque Enable:    {}", val),
        Err(e) => println!("    Torque Enable:    ERROR - {}", e),
    }

    match bus.read_u8(id, Register::Acceleration) {
        Ok(0) => println!("    Acceleration:     0 (unlimited)"),
        Ok(val) => println!("    Acceleration:     {} (x100 steps/s^2)", val),
        Err(e) => println!("    Acceleration:     ERROR - {}", e),
    }

    let limits = bus.get_position_limits(id);
    match &limits {
        Ok((min, max)) => println!(
            "    Position Limits:  {}..{} ({:.1}° .. {:.1}°)",
            min,
            max,
            raw_position_to_deg(*min),
            raw_position_to_deg(*max)
        ),
        Err(e) => println!("    Position Limits:  ERROR - {}", e),
    }

    let position = bus.get_position(id);
    match &position {
        Ok(pos) => println!(
            "    Present Position: {} ({:.1}°)",
            pos,
            raw_position_to_deg(*pos)
        ),
        Err(e) => println!("    Present Position: ERROR - {}", e),
    }

    match bus.get_velocity(id) {
        Ok(vel) => println!(
            "    Present Velocity: {} ({:.1}°/s)",
            vel,
            vel as f64 / STEPS_PER_DEG
        ),
        Err(e) => println!("    Present Velocity: ERROR - {}", e),
    }

    match bus.is_moving(id) {
        Ok(moving) => println!("    Moving:           {}", moving),
        Err(e) => println!("    Moving:           ERROR - {}", e),
    }
    println!();

    if let (Ok((min, max)), Ok(pos)) = (limits, position) {
        let target = select_target(
            raw_position_to_deg(pos),
            raw_position_to_deg(min),
            raw_position_to_deg(max),
        );
        println!("A 'go' from here would target {:.1}°", target);
    }

    Ok(())
}
