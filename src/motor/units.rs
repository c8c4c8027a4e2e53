// Conversions between joint units (degrees) and STS3215 raw register values

/// Motor resolution: 4096 steps per revolution
pub const STEPS_PER_REVOLUTION: f64 = 4096.0;
pub const STEPS_PER_DEG: f64 = STEPS_PER_REVOLUTION / 360.0;

/// Raw position reported at 0 degrees
pub const CENTER_STEP: f64 = 2048.0;
const MAX_POSITION_STEP: f64 = STEPS_PER_REVOLUTION - 1.0;

/// Maximum raw velocity command (safety limit)
pub const MAX_RAW_SPEED: i16 = 3000;

/// One acceleration register unit is 100 steps/s^2
const ACCEL_STEPS_PER_UNIT: f64 = 100.0;

/// Convert a joint angle to a raw goal position, saturating at the encoder range
pub fn deg_to_raw_position(deg: f64) -> u16 {
    let steps = (deg * STEPS_PER_DEG + CENTER_STEP).round();
    steps.clamp(0.0, MAX_POSITION_STEP) as u16
}

pub fn raw_position_to_deg(raw: u16) -> f64 {
    (raw as f64 - CENTER_STEP) / STEPS_PER_DEG
}

/// Convert degrees per second to raw motor steps/s, clamped to `MAX_RAW_SPEED`
pub fn degps_to_raw(degps: f64) -> i16 {
    let steps = (degps * STEPS_PER_DEG).round();
    let max = MAX_RAW_SPEED as f64;
    steps.clamp(-max, max) as i16
}

/// Convert deg/s^2 to the acceleration register value.
///
/// Zero means "no limit" on the servo, so any positive request maps to at least 1.
pub fn deg_s2_to_raw_accel(deg_s2: f64) -> u8 {
    if deg_s2 <= 0.0 {
        return 0;
    }
    let units = (deg_s2 * STEPS_PER_DEG / ACCEL_STEPS_PER_UNIT).round();
    units.clamp(1.0, 254.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_center_and_range() {
        assert_eq!(deg_to_raw_position(0.0), 2048);
        assert_eq!(deg_to_raw_position(90.0), 3072);
        assert_eq!(deg_to_raw_position(-90.0), 1024);
        // Saturates instead of wrapping
        assert_eq!(deg_to_raw_position(1000.0), 4095);
        assert_eq!(deg_to_raw_position(-1000.0), 0);
    }

    #[test]
    fn test_position_back_to_degrees() {
        assert_eq!(raw_position_to_deg(2048), 0.0);
        assert!((raw_position_to_deg(3072) - 90.0).abs() < 1e-9);
        let deg = raw_position_to_deg(deg_to_raw_position(37.3));
        assert!((deg - 37.3).abs() < 360.0 / 4096.0);
    }

    #[test]
    fn test_degps_to_raw_limits() {
        assert_eq!(degps_to_raw(0.0), 0);
        assert_eq!(degps_to_raw(30.0), 341);
        assert_eq!(degps_to_raw(-30.0), -341);
        assert_eq!(degps_to_raw(100000.0), MAX_RAW_SPEED);
        assert_eq!(degps_to_raw(-100000.0), -MAX_RAW_SPEED);
    }

    #[test]
    fn test_accel_register() {
        assert_eq!(deg_s2_to_raw_accel(0.0), 0);
        assert_eq!(deg_s2_to_raw_accel(100.0), 11);
        // Tiny but positive accelerations must not become "unlimited"
        assert_eq!(deg_s2_to_raw_accel(0.5), 1);
        assert_eq!(deg_s2_to_raw_accel(1.0e6), 254);
    }
}
