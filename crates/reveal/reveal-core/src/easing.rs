//! Easing curves for counter tweens and motion transitions.
//!
//! Named curves follow the CSS / motion-library definitions. Cubic-bezier
//! timing is solved on x (Newton with a bisection fallback), then evaluated
//! on y.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseOutCubic,
    EaseOutExpo,
    /// Control points (x1, y1, x2, y2).
    CubicBezier([f32; 4]),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseOut
    }
}

const EASE_IN: [f64; 4] = [0.42, 0.0, 1.0, 1.0];
const EASE_OUT: [f64; 4] = [0.0, 0.0, 0.58, 1.0];
const EASE_IN_OUT: [f64; 4] = [0.42, 0.0, 0.58, 1.0];

const SOLVE_EPSILON: f64 = 1e-9;

impl Easing {
    /// Look up a curve by the names used in motion configs ("easeOut", "ease-out",
    /// "linear", ...). Unknown names return None.
    pub fn from_name(name: &str) -> Option<Easing> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "linear" => Some(Easing::Linear),
            "easein" => Some(Easing::EaseIn),
            "easeout" => Some(Easing::EaseOut),
            "easeinout" => Some(Easing::EaseInOut),
            "easeoutcubic" => Some(Easing::EaseOutCubic),
            "easeoutexpo" => Some(Easing::EaseOutExpo),
            _ => None,
        }
    }

    /// Map normalized progress to eased progress. `t` is clamped to [0, 1]; the
    /// endpoints map to exactly 0 and 1.
    pub fn apply(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::EaseIn => cubic_bezier_ease(t, EASE_IN),
            Easing::EaseOut => cubic_bezier_ease(t, EASE_OUT),
            Easing::EaseInOut => cubic_bezier_ease(t, EASE_IN_OUT),
            Easing::EaseOutCubic => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
            Easing::CubicBezier(c) => cubic_bezier_ease(
                t,
                [c[0] as f64, c[1] as f64, c[2] as f64, c[3] as f64],
            ),
        }
    }
}

/// Cubic Bezier basis with p0 = 0 and p3 = 1.
#[inline]
fn bezier(p1: f64, p2: f64, s: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

#[inline]
fn bezier_slope(p1: f64, p2: f64, s: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * p1 + 6.0 * u * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

fn cubic_bezier_ease(t: f64, ctrl: [f64; 4]) -> f64 {
    // x control points outside [0,1] would make x(s) non-monotonic.
    let x1 = ctrl[0].clamp(0.0, 1.0);
    let x2 = ctrl[2].clamp(0.0, 1.0);
    let (y1, y2) = (ctrl[1], ctrl[3]);
    if x1 == y1 && x2 == y2 {
        return t;
    }

    let mut s = t;
    for _ in 0..8 {
        let err = bezier(x1, x2, s) - t;
        if err.abs() < SOLVE_EPSILON {
            return bezier(y1, y2, s);
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < 1e-7 {
            break;
        }
        s = (s - err / slope).clamp(0.0, 1.0);
    }

    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    s = t;
    for _ in 0..64 {
        let x = bezier(x1, x2, s);
        if (x - t).abs() < SOLVE_EPSILON {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    bezier(y1, y2, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseOutCubic,
        Easing::EaseOutExpo,
        Easing::CubicBezier([0.22, 1.0, 0.36, 1.0]),
    ];

    #[test]
    fn endpoints_are_exact() {
        for e in ALL {
            assert_eq!(e.apply(0.0), 0.0, "{e:?}");
            assert_eq!(e.apply(1.0), 1.0, "{e:?}");
            assert_eq!(e.apply(-3.0), 0.0, "{e:?}");
            assert_eq!(e.apply(7.0), 1.0, "{e:?}");
        }
    }

    #[test]
    fn named_curves_are_monotone() {
        for e in ALL {
            let mut last = 0.0;
            for i in 0..=200 {
                let v = e.apply(i as f64 / 200.0);
                assert!(v + 1e-9 >= last, "{e:?} dipped at step {i}: {v} < {last}");
                last = v;
            }
        }
    }

    #[test]
    fn ease_out_is_front_loaded() {
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        let mid = Easing::EaseInOut.apply(0.5);
        assert!((mid - 0.5).abs() < 1e-6, "mid={mid}");
    }

    #[test]
    fn linear_bezier_is_identity() {
        let e = Easing::CubicBezier([0.25, 0.25, 0.75, 0.75]);
        assert_eq!(e.apply(0.3), 0.3);
    }

    #[test]
    fn names_parse_in_several_spellings() {
        assert_eq!(Easing::from_name("easeOut"), Some(Easing::EaseOut));
        assert_eq!(Easing::from_name("ease-in-out"), Some(Easing::EaseInOut));
        assert_eq!(Easing::from_name("LINEAR"), Some(Easing::Linear));
        assert_eq!(Easing::from_name("wobble"), None);
    }
}
