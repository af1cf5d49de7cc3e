//! Normalization Utilities
//!
//! Fixed-breakpoint tiering shared by the amplifiers and the integrator.
//! Breakpoint tables are ordered from the highest threshold down; the first
//! threshold the value clears decides the tier.

/// Clamp a score to [0, 1]; NaN maps to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// First output whose threshold is strictly exceeded, else `otherwise`
pub fn tier_above(value: f64, breakpoints: &[(f64, f64)], otherwise: f64) -> f64 {
    breakpoints
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map_or(otherwise, |&(_, out)| out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLE: [(f64, f64); 3] = [(0.8, 2.0), (0.6, 1.5), (0.4, 1.2)];

    #[test]
    fn test_tier_above_is_strict() {
        assert_relative_eq!(tier_above(0.81, &TABLE, 1.0), 2.0);
        assert_relative_eq!(tier_above(0.8, &TABLE, 1.0), 1.5);
        assert_relative_eq!(tier_above(0.1, &TABLE, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_unit() {
        assert_relative_eq!(clamp_unit(1.7), 1.0);
        assert_relative_eq!(clamp_unit(-0.2), 0.0);
        assert_relative_eq!(clamp_unit(f64::NAN), 0.0);
        assert_relative_eq!(clamp_unit(0.42), 0.42);
    }
}
