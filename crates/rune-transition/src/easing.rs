//! Easing functions for transition timing.
//!
//! CSS timing functions (`linear`, `ease*`, `cubic-bezier()`, `steps()`)
//! plus the named Sine/Cubic/Circ/Elastic/Back/Bounce families.
//!
//! ```
//! use rune_transition::easing::{EasingFunction, StepPosition};
//!
//! let progress = EasingFunction::Ease.evaluate(0.5);
//! assert!(progress > 0.5);
//!
//! let stepped = EasingFunction::steps(4, StepPosition::End);
//! assert_eq!(stepped.evaluate(0.3), 0.25);
//! ```

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Position for stepped timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval (CSS `jump-start` / `start`).
    Start,
    /// Jump at the end of each interval (CSS `jump-end` / `end`).
    #[default]
    End,
    /// Jump at both start and end (CSS `jump-both`).
    Both,
    /// No jump at start or end (CSS `jump-none`).
    None,
}

/// Easing function for transition timing.
///
/// Maps linear progress in [0, 1] to eased progress. Back and Elastic curves
/// overshoot, so the output may leave [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    Linear,

    /// CSS `ease`, equivalent to `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,
    /// CSS `ease-in`, equivalent to `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// CSS `ease-out`, equivalent to `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// CSS `ease-in-out`, equivalent to `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,

    SineIn,
    SineOut,
    SineInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    CircIn,
    CircOut,
    CircInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,

    /// Custom cubic bezier curve. x values must be in [0, 1].
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },

    /// Stepped timing with `count` intervals (must be >= 1).
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    ///
    /// The input is clamped to [0, 1]. A malformed curve (NaN control
    /// points) yields a non-finite result; callers treat that as "no new
    /// progress".
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),

            Self::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Self::SineOut => (t * PI / 2.0).sin(),
            Self::SineInOut => -((PI * t).cos() - 1.0) / 2.0,

            Self::CubicIn => t * t * t,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }

            Self::CircIn => 1.0 - (1.0 - t * t).sqrt(),
            Self::CircOut => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Self::CircInOut => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }

            Self::ElasticIn => elastic_in(t),
            Self::ElasticOut => elastic_out(t),
            Self::ElasticInOut => elastic_in_out(t),

            Self::BackIn => back_in(t),
            Self::BackOut => 1.0 - back_in(1.0 - t),
            Self::BackInOut => back_in_out(t),

            Self::BounceIn => 1.0 - bounce_out(1.0 - t),
            Self::BounceOut => bounce_out(t),
            Self::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }

            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
        }
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

    /// Create a stepped easing function.
    ///
    /// # Panics
    /// Panics if steps is 0.
    pub fn steps(steps: u32, position: StepPosition) -> Self {
        assert!(steps >= 1, "Steps must be at least 1");
        Self::Steps {
            count: steps,
            position,
        }
    }
}

/// Evaluate a cubic bezier curve at progress `progress`.
///
/// Newton-Raphson finds the curve parameter whose x matches the progress,
/// then the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

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
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t * t * x2 + t * t * t
}

#[inline]
fn bezier_y(y1: f32, y2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t * t * y2 + t * t * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f32) -> f32 {
    if steps == 0 {
        return t;
    }

    let steps_f = steps as f32;

    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
        StepPosition::Both => {
            let total_steps = steps_f + 1.0;
            ((t * steps_f).floor() + 1.0).min(steps_f + 1.0) / total_steps
        }
        StepPosition::None => {
            if steps == 1 {
                0.5
            } else {
                ((t * steps_f).floor().min(steps_f - 1.0)) / (steps_f - 1.0)
            }
        }
    }
}

const BACK_C1: f32 = 1.70158;

fn back_in(t: f32) -> f32 {
    let c3 = BACK_C1 + 1.0;
    c3 * t * t * t - BACK_C1 * t * t
}

fn back_in_out(t: f32) -> f32 {
    let c2 = BACK_C1 * 1.525;
    if t < 0.5 {
        ((2.0 * t).powi(2) * ((c2 + 1.0) * 2.0 * t - c2)) / 2.0
    } else {
        ((2.0 * t - 2.0).powi(2) * ((c2 + 1.0) * (2.0 * t - 2.0) + c2) + 2.0) / 2.0
    }
}

fn elastic_in(t: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let c4 = 2.0 * PI / 3.0;
    -(2.0_f32.powf(10.0 * t - 10.0)) * ((10.0 * t - 10.75) * c4).sin()
}

fn elastic_out(t: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let c4 = 2.0 * PI / 3.0;
    2.0_f32.powf(-10.0 * t) * ((10.0 * t - 0.75) * c4).sin() + 1.0
}

fn elastic_in_out(t: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let c5 = 2.0 * PI / 4.5;
    if t < 0.5 {
        -(2.0_f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
    } else {
        (2.0_f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0 + 1.0
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    const ALL_NAMED: [EasingFunction; 23] = [
        EasingFunction::Linear,
        EasingFunction::Ease,
        EasingFunction::EaseIn,
        EasingFunction::EaseOut,
        EasingFunction::EaseInOut,
        EasingFunction::SineIn,
        EasingFunction::SineOut,
        EasingFunction::SineInOut,
        EasingFunction::CubicIn,
        EasingFunction::CubicOut,
        EasingFunction::CubicInOut,
        EasingFunction::CircIn,
        EasingFunction::CircOut,
        EasingFunction::CircInOut,
        EasingFunction::ElasticIn,
        EasingFunction::ElasticOut,
        EasingFunction::ElasticInOut,
        EasingFunction::BackIn,
        EasingFunction::BackOut,
        EasingFunction::BackInOut,
        EasingFunction::BounceIn,
        EasingFunction::BounceOut,
        EasingFunction::BounceInOut,
    ];

    #[test]
    fn test_linear() {
        let ease = EasingFunction::Linear;
        assert!(approx_eq(ease.evaluate(0.0), 0.0));
        assert!(approx_eq(ease.evaluate(0.25), 0.25));
        assert!(approx_eq(ease.evaluate(0.5), 0.5));
        assert!(approx_eq(ease.evaluate(1.0), 1.0));
    }

    #[test]
    fn test_named_curves_hit_endpoints() {
        for ease in ALL_NAMED {
            assert!(approx_eq(ease.evaluate(0.0), 0.0), "{ease:?} at 0");
            assert!(approx_eq(ease.evaluate(1.0), 1.0), "{ease:?} at 1");
        }
    }

    #[test]
    fn test_ease_mid_point() {
        let ease = EasingFunction::Ease;
        let mid = ease.evaluate(0.5);
        assert!(mid > 0.7 && mid < 0.9, "CSS ease mid-point should be ~0.8, got {}", mid);
        assert!(ease.evaluate(0.25) < mid);
        assert!(mid < ease.evaluate(0.75));
    }

    #[test]
    fn test_in_out_symmetry() {
        for ease in [
            EasingFunction::EaseInOut,
            EasingFunction::SineInOut,
            EasingFunction::CubicInOut,
            EasingFunction::CircInOut,
        ] {
            assert!(approx_eq(ease.evaluate(0.5), 0.5), "{ease:?}");
            assert!(approx_eq(ease.evaluate(0.25) + ease.evaluate(0.75), 1.0), "{ease:?}");
        }
    }

    #[test]
    fn test_back_overshoots() {
        assert!(EasingFunction::BackIn.evaluate(0.2) < 0.0);
        assert!(EasingFunction::BackOut.evaluate(0.8) > 1.0);
    }

    #[test]
    fn test_bounce_out_stays_in_range() {
        for i in 0..=100 {
            let v = EasingFunction::BounceOut.evaluate(i as f32 / 100.0);
            assert!((0.0..=1.0 + EPSILON).contains(&v), "bounce out left range: {v}");
        }
    }

    #[test]
    fn test_custom_bezier() {
        let ease = EasingFunction::cubic_bezier(0.4, 0.0, 0.2, 1.0);
        assert!(approx_eq(ease.evaluate(0.0), 0.0));
        assert!(approx_eq(ease.evaluate(1.0), 1.0));

        let linear_bezier = EasingFunction::CubicBezier {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        assert!(approx_eq(linear_bezier.evaluate(0.5), 0.5));
    }

    #[test]
    fn test_nan_bezier_is_not_finite() {
        let broken = EasingFunction::CubicBezier {
            x1: 0.3,
            y1: f32::NAN,
            x2: 0.6,
            y2: 1.0,
        };
        assert!(!broken.evaluate(0.5).is_finite());
    }

    #[test]
    fn test_steps_end() {
        let ease = EasingFunction::steps(4, StepPosition::End);
        assert!(approx_eq(ease.evaluate(0.0), 0.0));
        assert!(approx_eq(ease.evaluate(0.24), 0.0));
        assert!(approx_eq(ease.evaluate(0.25), 0.25));
        assert!(approx_eq(ease.evaluate(0.74), 0.5));
        assert!(approx_eq(ease.evaluate(0.99), 0.75));
        assert!(approx_eq(ease.evaluate(1.0), 1.0));
    }

    #[test]
    fn test_steps_start() {
        let ease = EasingFunction::steps(4, StepPosition::Start);
        assert!(approx_eq(ease.evaluate(0.0), 0.0));
        assert!(approx_eq(ease.evaluate(0.01), 0.25));
        assert!(approx_eq(ease.evaluate(0.26), 0.5));
        assert!(approx_eq(ease.evaluate(0.76), 1.0));
    }

    #[test]
    fn test_steps_both_and_none() {
        let both = EasingFunction::steps(3, StepPosition::Both);
        assert!(approx_eq(both.evaluate(0.0), 0.25));
        assert!(approx_eq(both.evaluate(0.5), 0.5));
        assert!(approx_eq(both.evaluate(1.0), 1.0));

        let none = EasingFunction::steps(3, StepPosition::None);
        assert!(approx_eq(none.evaluate(0.0), 0.0));
        assert!(approx_eq(none.evaluate(0.5), 0.5));
        assert!(approx_eq(none.evaluate(1.0), 1.0));
    }

    #[test]
    fn test_clamping() {
        let ease = EasingFunction::Ease;
        assert!(approx_eq(ease.evaluate(-0.5), 0.0));
        assert!(approx_eq(ease.evaluate(1.5), 1.0));
    }

    #[test]
    fn test_default() {
        assert_eq!(EasingFunction::default(), EasingFunction::Ease);
        assert_eq!(StepPosition::default(), StepPosition::End);
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&EasingFunction::steps(2, StepPosition::Start)).unwrap();
        assert_eq!(json, r#"{"type":"steps","count":2,"position":"start"}"#);
        let parsed: EasingFunction = serde_json::from_str(r#"{"type":"back_out"}"#).unwrap();
        assert_eq!(parsed, EasingFunction::BackOut);
    }

    #[test]
    #[should_panic(expected = "Bezier x values must be in [0, 1]")]
    fn test_invalid_bezier_x1() {
        EasingFunction::cubic_bezier(-0.1, 0.0, 0.5, 1.0);
    }

    #[test]
    #[should_panic(expected = "Steps must be at least 1")]
    fn test_invalid_steps() {
        EasingFunction::steps(0, StepPosition::End);
    }
}
