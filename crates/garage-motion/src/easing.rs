//! Easing curves for tween timing.
//!
//! Curves are identified by short ids so they can be named in configuration:
//! - `linear`
//! - `ease-in-sine`, `ease-out-sine`
//! - `ease-in-quadratic`, `ease-out-quadratic`
//! - `ease-in-cubic`, `ease-out-cubic`
//! - `back-out(s)` (overshoot, `s` defaults to 1.70158)
//! - `cubic-bezier(x1, y1, x2, y2)`
//!
//! # Usage
//!
//! ```
//! use garage_motion::easing::EasingFunction;
//!
//! let ease: EasingFunction = "ease-out-quadratic".parse().unwrap();
//! let progress = ease.evaluate(0.5); // 0.75
//! assert!((progress - 0.75).abs() < 1e-6);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Overshoot used by `back-out` when no amount is given.
pub const DEFAULT_OVERSHOOT: f32 = 1.70158;

/// Easing function for tween timing.
///
/// Maps linear progress (0.0 to 1.0) to eased progress. Every curve maps
/// 0.0 to exactly 0.0 and 1.0 to exactly 1.0, so a finished tween always lands
/// on its end values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingFunction {
    /// Constant rate.
    Linear,
    /// Gentle acceleration.
    EaseInSine,
    /// Gentle deceleration.
    EaseOutSine,
    /// `t²` acceleration.
    EaseInQuadratic,
    /// `1 - (1 - t)²` deceleration.
    EaseOutQuadratic,
    /// `t³` acceleration.
    EaseInCubic,
    /// `1 - (1 - t)³` deceleration.
    EaseOutCubic,
    /// Deceleration that overshoots the end value before settling.
    BackOut { overshoot: f32 },
    /// Custom cubic bezier curve with control points (x1, y1) and (x2, y2).
    /// x values must be in [0, 1], y values can be any float.
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Default for EasingFunction {
    fn default() -> Self {
        Self::EaseOutQuadratic
    }
}

/// Error returned when an easing id cannot be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown easing curve `{0}`")]
pub struct ParseEasingError(pub String);

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// Input is clamped to [0, 1]. Output may leave [0, 1] for overshooting
    /// curves.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        match self {
            Self::Linear => t,
            Self::EaseInSine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Self::EaseOutSine => (t * std::f32::consts::FRAC_PI_2).sin(),
            Self::EaseInQuadratic => t * t,
            Self::EaseOutQuadratic => {
                let mt = 1.0 - t;
                1.0 - mt * mt
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => {
                let mt = 1.0 - t;
                1.0 - mt * mt * mt
            }
            Self::BackOut { overshoot } => {
                let s = *overshoot;
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Create an overshooting `back-out` curve.
    pub fn back_out(overshoot: f32) -> Self {
        Self::BackOut { overshoot }
    }

    /// Create a custom cubic bezier easing function.
    ///
    /// # Panics
    /// Panics if x1 or x2 are outside [0, 1].
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::EaseInSine => f.write_str("ease-in-sine"),
            Self::EaseOutSine => f.write_str("ease-out-sine"),
            Self::EaseInQuadratic => f.write_str("ease-in-quadratic"),
            Self::EaseOutQuadratic => f.write_str("ease-out-quadratic"),
            Self::EaseInCubic => f.write_str("ease-in-cubic"),
            Self::EaseOutCubic => f.write_str("ease-out-cubic"),
            Self::BackOut { overshoot } => write!(f, "back-out({overshoot})"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }
}

impl FromStr for EasingFunction {
    type Err = ParseEasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        let err = || ParseEasingError(id.to_string());

        match id {
            "linear" => return Ok(Self::Linear),
            "ease-in-sine" => return Ok(Self::EaseInSine),
            "ease-out-sine" => return Ok(Self::EaseOutSine),
            "ease-in-quadratic" => return Ok(Self::EaseInQuadratic),
            "ease-out-quadratic" => return Ok(Self::EaseOutQuadratic),
            "ease-in-cubic" => return Ok(Self::EaseInCubic),
            "ease-out-cubic" => return Ok(Self::EaseOutCubic),
            "back-out" => return Ok(Self::back_out(DEFAULT_OVERSHOOT)),
            _ => {}
        }

        let (name, args) = id
            .strip_suffix(')')
            .and_then(|rest| rest.split_once('('))
            .ok_or_else(err)?;
        let args: Vec<f32> = args
            .split(',')
            .map(|a| a.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|_| err())?;

        match (name.trim(), args.as_slice()) {
            ("back-out", [s]) => Ok(Self::back_out(*s)),
            ("cubic-bezier", [x1, y1, x2, y2])
                if (0.0..=1.0).contains(x1) && (0.0..=1.0).contains(x2) =>
            {
                Ok(Self::CubicBezier {
                    x1: *x1,
                    y1: *y1,
                    x2: *x2,
                    y2: *y2,
                })
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for EasingFunction {
    type Error = ParseEasingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EasingFunction> for String {
    fn from(value: EasingFunction) -> Self {
        value.to_string()
    }
}

/// Evaluate a cubic bezier curve at time t.
///
/// Uses Newton-Raphson iteration to find the curve parameter for the input
/// progress, then evaluates the y coordinate at that parameter.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

fn solve_bezier_x(x1: f32, x2: f32, target_x: f32) -> f32 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < 1e-6 {
            break;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }

        t -= x / dx;
        t = t.clamp(0.0, 1.0);
    }

    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f32, x2: f32, t: f32) -> f32 {
    let t2 = t * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t2 * x2 + t2 * t
}

#[inline]
fn bezier_y(y1: f32, y2: f32, t: f32) -> f32 {
    let t2 = t * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t2 * y2 + t2 * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_endpoints_are_exact() {
        let curves = [
            EasingFunction::Linear,
            EasingFunction::EaseInSine,
            EasingFunction::EaseOutSine,
            EasingFunction::EaseInQuadratic,
            EasingFunction::EaseOutQuadratic,
            EasingFunction::EaseInCubic,
            EasingFunction::EaseOutCubic,
            EasingFunction::back_out(1.4),
            EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0),
        ];
        for curve in curves {
            assert_eq!(curve.evaluate(0.0), 0.0, "{curve}");
            assert_eq!(curve.evaluate(1.0), 1.0, "{curve}");
        }
    }

    #[test]
    fn test_ease_out_quadratic() {
        let ease = EasingFunction::EaseOutQuadratic;
        assert!(approx_eq(ease.evaluate(0.5), 0.75));
        assert!(ease.evaluate(0.25) > 0.25);
    }

    #[test]
    fn test_ease_out_cubic_is_faster_early() {
        let quad = EasingFunction::EaseOutQuadratic.evaluate(0.3);
        let cubic = EasingFunction::EaseOutCubic.evaluate(0.3);
        assert!(cubic > quad);
    }

    #[test]
    fn test_ease_in_is_slow_early() {
        assert!(EasingFunction::EaseInQuadratic.evaluate(0.25) < 0.25);
        assert!(EasingFunction::EaseInCubic.evaluate(0.25) < 0.25);
        assert!(EasingFunction::EaseInSine.evaluate(0.25) < 0.25);
    }

    #[test]
    fn test_back_out_overshoots() {
        let ease = EasingFunction::back_out(1.4);
        let peak = (1..100)
            .map(|i| ease.evaluate(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0, "back-out should overshoot, peak was {peak}");
    }

    #[test]
    fn test_monotonic_decelerating_curves() {
        for curve in [
            EasingFunction::EaseOutQuadratic,
            EasingFunction::EaseOutCubic,
            EasingFunction::EaseOutSine,
        ] {
            let mut last = 0.0;
            for i in 0..=100 {
                let v = curve.evaluate(i as f32 / 100.0);
                assert!(v >= last, "{curve} decreased at step {i}");
                last = v;
            }
        }
    }

    #[test]
    fn test_custom_bezier() {
        let linear_bezier = EasingFunction::CubicBezier {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        assert!(approx_eq(linear_bezier.evaluate(0.5), 0.5));
    }

    #[test]
    fn test_clamping() {
        let ease = EasingFunction::EaseOutCubic;
        assert_eq!(ease.evaluate(-0.5), 0.0);
        assert_eq!(ease.evaluate(1.5), 1.0);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(
            "ease-out-quadratic".parse::<EasingFunction>().unwrap(),
            EasingFunction::EaseOutQuadratic
        );
        assert_eq!(
            " ease-out-cubic ".parse::<EasingFunction>().unwrap(),
            EasingFunction::EaseOutCubic
        );
        assert_eq!(
            "back-out(1.4)".parse::<EasingFunction>().unwrap(),
            EasingFunction::back_out(1.4)
        );
        assert_eq!(
            "back-out".parse::<EasingFunction>().unwrap(),
            EasingFunction::back_out(DEFAULT_OVERSHOOT)
        );
        assert_eq!(
            "cubic-bezier(0.4, 0, 0.2, 1)".parse::<EasingFunction>().unwrap(),
            EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("power2.out".parse::<EasingFunction>().is_err());
        assert!("cubic-bezier(1.5, 0, 0.2, 1)".parse::<EasingFunction>().is_err());
        assert!("back-out(a)".parse::<EasingFunction>().is_err());
        assert!("cubic-bezier(0.1, 0.2)".parse::<EasingFunction>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let ease = EasingFunction::back_out(1.4);
        assert_eq!(ease.to_string().parse::<EasingFunction>().unwrap(), ease);
    }

    #[test]
    fn test_default() {
        assert_eq!(EasingFunction::default(), EasingFunction::EaseOutQuadratic);
    }

    #[test]
    #[should_panic(expected = "Bezier x values must be in [0, 1]")]
    fn test_invalid_bezier_x1() {
        EasingFunction::cubic_bezier(-0.1, 0.0, 0.5, 1.0);
    }
}
