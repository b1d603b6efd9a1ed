//! Rectangles, root margins, and intersection ratios.
//!
//! This is what a browser's intersection primitive computes; the
//! [`ViewportPlatform`](crate::observer::ViewportPlatform) uses it to stand in
//! for one on hosts that have no such primitive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection of two rects. Edge-adjacent rects intersect with zero area;
    /// disjoint rects return None.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// One side of a root margin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    fn parse(token: &str, input: &str) -> Result<Length, MotionError> {
        let bad = |reason: &str| MotionError::InvalidRootMargin {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (num, percent) = if let Some(n) = token.strip_suffix("px") {
            (n, false)
        } else if let Some(n) = token.strip_suffix('%') {
            (n, true)
        } else if token.parse::<f32>().map(|v| v == 0.0).unwrap_or(false) {
            // Unitless zero is the only unitless length CSS allows.
            (token, false)
        } else {
            return Err(bad(&format!("'{token}' must end in px or %")));
        };
        let value: f32 = num
            .parse()
            .map_err(|_| bad(&format!("'{token}' is not a number")))?;
        if !value.is_finite() {
            return Err(bad(&format!("'{token}' is not finite")));
        }
        Ok(if percent {
            Length::Percent(value)
        } else {
            Length::Px(value)
        })
    }

    #[inline]
    fn resolve(&self, basis: f32) -> f32 {
        match self {
            Length::Px(v) => *v,
            Length::Percent(p) => basis * *p / 100.0,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{v}px"),
            Length::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// CSS-style margin that grows (or shrinks, when negative) the root bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

/// Four-value CSS form, e.g. "-100px 0px -100px 0px".
impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        let zero = Length::Px(0.0);
        Self {
            top: zero,
            right: zero,
            bottom: zero,
            left: zero,
        }
    }
}

impl RootMargin {
    /// Parse 1 to 4 whitespace-separated lengths in CSS shorthand order.
    pub fn parse(input: &str) -> Result<RootMargin, MotionError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let parsed = tokens
            .iter()
            .map(|t| Length::parse(t, input))
            .collect::<Result<Vec<_>, _>>()?;
        let (top, right, bottom, left) = match parsed.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => {
                return Err(MotionError::InvalidRootMargin {
                    input: input.to_string(),
                    reason: format!("expected 1 to 4 lengths, got {}", tokens.len()),
                })
            }
        };
        Ok(RootMargin {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Grow `root` by this margin. Vertical percentages resolve against the
    /// root height, horizontal ones against its width.
    pub fn apply(&self, root: &Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            (root.width + left + right).max(0.0),
            (root.height + top + bottom).max(0.0),
        )
    }
}

/// Fraction of `target` inside `root`, in [0, 1]. A zero-area target touching
/// the root counts as fully visible.
pub fn intersection_ratio(target: &Rect, root: &Rect) -> f32 {
    match target.intersect(root) {
        None => 0.0,
        Some(hit) => {
            let area = target.area();
            if area <= 0.0 {
                1.0
            } else {
                (hit.area() / area).clamp(0.0, 1.0)
            }
        }
    }
}

/// Whether `target` counts as intersecting `root` for `threshold`.
/// Threshold 0 accepts any contact, including edge adjacency.
pub fn meets_threshold(target: &Rect, root: &Rect, threshold: f32) -> bool {
    if target.intersect(root).is_none() {
        return false;
    }
    if threshold <= 0.0 {
        return true;
    }
    intersection_ratio(target, root) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_css_and_parses_back() {
        let m = RootMargin::parse("-100px 0px").unwrap();
        assert_eq!(m.to_string(), "-100px 0px -100px 0px");
        assert_eq!(RootMargin::parse(&m.to_string()).unwrap(), m);

        let mixed = RootMargin::parse("2.5% -10px 0 5%").unwrap();
        assert_eq!(mixed.to_string(), "2.5% -10px 0px 5%");
        assert_eq!(RootMargin::default().to_string(), "0px 0px 0px 0px");
    }

    #[test]
    fn parse_shorthand_forms() {
        let one = RootMargin::parse("10px").unwrap();
        assert_eq!(one.left, Length::Px(10.0));
        assert_eq!(one.bottom, Length::Px(10.0));

        let two = RootMargin::parse("-100px 5%").unwrap();
        assert_eq!(two.top, Length::Px(-100.0));
        assert_eq!(two.bottom, Length::Px(-100.0));
        assert_eq!(two.left, Length::Percent(5.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.right, Length::Px(2.0));
        assert_eq!(three.left, Length::Px(2.0));
        assert_eq!(three.bottom, Length::Px(3.0));

        let zero = RootMargin::parse("0").unwrap();
        assert_eq!(zero, RootMargin::default());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("10").is_err());
        assert!(RootMargin::parse("abcpx").is_err());
        assert!(RootMargin::parse("1px 2px 3px 4px 5px").is_err());
    }

    #[test]
    fn margin_shrinks_root() {
        let root = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let m = RootMargin::parse("-100px 0px").unwrap();
        assert_eq!(m.apply(&root), Rect::new(0.0, 100.0, 1000.0, 600.0));

        let pct = RootMargin::parse("10%").unwrap();
        assert_eq!(pct.apply(&root), Rect::new(-100.0, -80.0, 1200.0, 960.0));
    }

    #[test]
    fn ratio_and_threshold() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let half = Rect::new(0.0, 50.0, 100.0, 100.0);
        assert_eq!(intersection_ratio(&half, &root), 0.5);
        assert!(meets_threshold(&half, &root, 0.5));
        assert!(!meets_threshold(&half, &root, 0.6));

        let touching = Rect::new(0.0, 100.0, 100.0, 10.0);
        assert!(meets_threshold(&touching, &root, 0.0));
        assert!(!meets_threshold(&touching, &root, 0.1));

        let away = Rect::new(0.0, 300.0, 100.0, 10.0);
        assert!(!meets_threshold(&away, &root, 0.0));

        let point = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(intersection_ratio(&point, &root), 1.0);
    }
}
