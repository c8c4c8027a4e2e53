// Pick the next target from the joint limits

use crate::config::TARGET_MARGIN;

/// Choose a target away from the bound the joint is currently nearer to.
///
/// A joint closer to `min` is sent to `max - 10% of range`, otherwise to
/// `min + 10% of range`. With `min == max` the target is that single point.
pub fn select_target(current: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if (current - min).abs() < (current - max).abs() {
        max - TARGET_MARGIN * range
    } else {
        min + TARGET_MARGIN * range
    }
}
