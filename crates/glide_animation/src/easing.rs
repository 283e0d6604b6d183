//! Easing functions for animations

use std::f64::consts::PI;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Bounce,
    Elastic,
    Back,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0).
    ///
    /// Every curve maps 0 to 0 and 1 to 1, but intermediate output is not
    /// constrained to [0, 1]: `Elastic` and `Back` overshoot the range and
    /// downstream interpolation keeps the overshoot.
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => 0.5 * (((t - 0.5) * PI).sin() + 1.0),
            Easing::Bounce => bounce(t),
            Easing::Elastic => (13.0 * PI / 2.0 * t).sin() * 2.0_f64.powf(10.0 * (t - 1.0)),
            Easing::Back => {
                let s = 1.70158;
                t * t * ((s + 1.0) * t - s)
            }
        }
    }
}

/// Piecewise bounce curve with breakpoints at 1/2.75, 2/2.75 and 2.5/2.75.
fn bounce(t: f64) -> f64 {
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        let u = t - 1.5 / 2.75;
        7.5625 * u * u + 0.75
    } else if t < 2.5 / 2.75 {
        let u = t - 2.25 / 2.75;
        7.5625 * u * u + 0.9375
    } else {
        let u = t - 2.625 / 2.75;
        7.5625 * u * u + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Bounce,
        Easing::Elastic,
        Easing::Back,
    ];

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in ALL {
            assert!(
                easing.apply(0.0).abs() < 1e-9,
                "{easing:?} must map 0 to 0"
            );
            assert!(
                (easing.apply(1.0) - 1.0).abs() < 1e-9,
                "{easing:?} must map 1 to 1"
            );
        }
    }

    #[test]
    fn test_linear_is_identity() {
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            assert!((Easing::Linear.apply(t) - t).abs() < 1e-12);
        }
    }

    #[test]
    fn test_quadratic_pair() {
        assert!((Easing::EaseIn.apply(0.5) - 0.25).abs() < 1e-9);
        assert!((Easing::EaseOut.apply(0.5) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_ease_in_out_midpoint() {
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bounce_segment_values() {
        // Second bounce segment: u = 0.5 - 1.5/2.75
        let u: f64 = 0.5 - 1.5 / 2.75;
        let expected = 7.5625 * u * u + 0.75;
        assert!((Easing::Bounce.apply(0.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_elastic_oscillates_below_zero() {
        // sin(5.2π) is negative, so the curve dips out of [0, 1]
        assert!(Easing::Elastic.apply(0.8) < 0.0);
    }

    #[test]
    fn test_back_undershoots() {
        assert!(Easing::Back.apply(0.3) < 0.0);
    }
}
