//! Discrete volume levels and the gain curve they map through.

/// Highest selectable level.
pub const MAX_LEVEL: i32 = 9;

/// Gain applied at the top of the curve. Backends accept gains in `[0, 1]`.
pub const MAX_VOLUME_GAIN: f32 = 1.0;

/// Non-linear curve from level to relative gain.
pub const VOLUME_CURVE: [f32; 10] = [
    0.0000000, 0.1099999, 0.2199999, 0.3300000, 0.4399999, 0.5500000, 0.6600000, 0.7699999,
    0.8799999, 0.9700000,
];

/// Clamp a level into `0..=MAX_LEVEL`.
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(0, MAX_LEVEL)
}

/// Gain for a level; out-of-range levels are clamped first.
pub fn level_to_gain(level: i32) -> f32 {
    VOLUME_CURVE[clamp_level(level) as usize] * MAX_VOLUME_GAIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_matches_curve() {
        for level in 0..=MAX_LEVEL {
            let expected = VOLUME_CURVE[level as usize] * MAX_VOLUME_GAIN;
            assert_eq!(level_to_gain(level), expected);
        }
    }

    #[test]
    fn gain_is_monotonic() {
        for level in 1..=MAX_LEVEL {
            assert!(level_to_gain(level) >= level_to_gain(level - 1));
        }
    }

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(level_to_gain(-4), 0.0);
        assert_eq!(level_to_gain(42), level_to_gain(MAX_LEVEL));
    }

    #[test]
    fn gains_stay_in_unit_range() {
        for level in 0..=MAX_LEVEL {
            let gain = level_to_gain(level);
            assert!((0.0..=1.0).contains(&gain));
        }
    }
}
