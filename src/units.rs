//! CSS-style length resolution.
//!
//! Lengths are converted to absolute pixels. Relative units are resolved
//! against a [`UnitContext`] holding the size of the element the length
//! belongs to, the size of its parent, and the viewport dimensions.
//!
//! Some conversions do not follow CSS exactly:
//! * `em` scales the *parent* size and `rem` the element's own size.
//! * `vw` and `vh` divide the viewport dimension by the value
//!   instead of taking a percentage of it.
//!
//! These are kept for compatibility with existing documents.

use std::{fmt, str::FromStr};

use glam::Vec2;
use smartstring::{LazyCompact, SmartString};

/// Size used when nothing else can be resolved.
pub const DEFAULT_FONT_SIZE: f32 = 16.;
/// Largest font size a style may resolve to, in pixels.
pub const MAX_FONT_SIZE: f32 = 1024.;

/// A length value, either already in pixels or still
/// in its textual form (`"12pt"`, `"1.5em"`, `"x-large"`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    Px(f32),
    Expr(SmartString<LazyCompact>),
}

impl From<f32> for Length {
    fn from(px: f32) -> Self {
        Length::Px(px)
    }
}

impl<'a> From<&'a str> for Length {
    fn from(s: &'a str) -> Self {
        Length::Expr(s.into())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(px) => write!(f, "{}px", px),
            Length::Expr(expr) => f.write_str(expr),
        }
    }
}

/// A length unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    Cm,
    Mm,
    Q,
    In,
    Pc,
    Pt,
    Px,
    Em,
    Rem,
    Vw,
    Vh,
    Percent,
}

impl FromStr for Unit {
    type Err = LengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "q" => Unit::Q,
            "in" => Unit::In,
            "pc" => Unit::Pc,
            "pt" => Unit::Pt,
            "px" | "" => Unit::Px,
            "em" => Unit::Em,
            "rem" => Unit::Rem,
            "vw" => Unit::Vw,
            "vh" => Unit::Vh,
            "%" => Unit::Percent,
            _ => return Err(LengthError::UnknownUnit(s.into())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LengthError {
    #[error("length is empty")]
    Empty,
    #[error("unknown length unit '{0}'")]
    UnknownUnit(String),
    #[error("unknown size keyword '{0}'")]
    UnknownKeyword(String),
    #[error("{0} must not be zero")]
    ZeroViewportDivisor(&'static str),
}

/// Sizes that relative units are resolved against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnitContext {
    /// Size of the element itself. `None` if it is not resolved yet.
    pub tag_size: Option<f32>,
    /// Size of the enclosing element.
    pub parent_size: f32,
    pub viewport: Vec2,
}

impl UnitContext {
    pub fn new(tag_size: Option<f32>, parent_size: f32, viewport: Vec2) -> Self {
        Self {
            tag_size,
            parent_size,
            viewport,
        }
    }

    fn tag_size_or_default(&self) -> f32 {
        self.tag_size.unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// The value used when a length cannot be resolved.
    pub fn fallback(&self) -> f32 {
        self.tag_size_or_default()
    }
}

/// Resolves a length to pixels, falling back to the context's
/// tag size (or [`DEFAULT_FONT_SIZE`]) if the length is malformed.
pub fn resolve(value: &Length, cx: &UnitContext) -> f32 {
    match value {
        Length::Px(px) => *px,
        Length::Expr(expr) => match try_resolve(expr, cx) {
            Ok(px) => px,
            Err(e) => {
                log::debug!("Could not resolve length '{}': {}", expr, e);
                cx.fallback()
            }
        },
    }
}

/// Resolves a textual length to pixels.
pub fn try_resolve(expr: &str, cx: &UnitContext) -> Result<f32, LengthError> {
    let lowered = expr.trim().to_ascii_lowercase();
    // Ignore a trailing descriptor word, e.g. "12px bold".
    let word = lowered.split_whitespace().next().ok_or(LengthError::Empty)?;

    match split_number(word) {
        Some((value, suffix)) => apply_unit(value, suffix.parse()?, cx),
        None => keyword_scale(word)
            .map(|scale| scale * cx.tag_size_or_default())
            .ok_or_else(|| LengthError::UnknownKeyword(word.to_owned())),
    }
}

fn apply_unit(value: f32, unit: Unit, cx: &UnitContext) -> Result<f32, LengthError> {
    Ok(match unit {
        Unit::Cm => value * 37.8,
        Unit::Mm => value * 3.78,
        Unit::Q => value * 0.945,
        Unit::In => value * 96.,
        Unit::Pc => value * 16.,
        Unit::Pt => value * 1.333333,
        Unit::Px => value,
        Unit::Em => value * cx.parent_size,
        Unit::Rem => value * cx.tag_size_or_default(),
        Unit::Vw => {
            if value == 0. {
                return Err(LengthError::ZeroViewportDivisor("vw"));
            }
            cx.viewport.x / value
        }
        Unit::Vh => {
            if value == 0. {
                return Err(LengthError::ZeroViewportDivisor("vh"));
            }
            cx.viewport.y / value
        }
        Unit::Percent => cx.tag_size_or_default() * value / 100.,
    })
}

/// Splits a leading number off `s`. Returns `None` if `s`
/// does not start with a number.
fn split_number(s: &str) -> Option<(f32, &str)> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

/// Absolute-size keywords as multiples of the element's size.
fn keyword_scale(keyword: &str) -> Option<f32> {
    Some(match keyword {
        "xx-small" => 0.5625,
        "x-small" => 0.625,
        "small" => 0.8125,
        "medium" => 1.,
        "large" => 1.125,
        "x-large" => 1.5,
        "xx-large" => 2.,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use glam::vec2;

    use super::*;

    fn cx() -> UnitContext {
        UnitContext::new(Some(20.), 10., vec2(800., 600.))
    }

    fn px(s: &str) -> f32 {
        resolve(&Length::from(s), &cx())
    }

    fn approx(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{} != {}", a, b);
    }

    #[test]
    fn numeric_passthrough() {
        assert_eq!(resolve(&Length::Px(13.5), &cx()), 13.5);
    }

    #[test]
    fn absolute_units() {
        approx(px("2cm"), 75.6);
        approx(px("10mm"), 37.8);
        approx(px("4q"), 3.78);
        approx(px("1in"), 96.);
        approx(px("2pc"), 32.);
        approx(px("12pt"), 15.999996);
        approx(px("7px"), 7.);
    }

    #[test]
    fn relative_units() {
        approx(px("2em"), 20.);
        approx(px("2rem"), 40.);
        approx(px("50%"), 10.);
    }

    #[test]
    fn viewport_units_divide() {
        approx(px("4vw"), 200.);
        approx(px("3vh"), 200.);
        // Division by zero falls back.
        approx(px("0vw"), 20.);
    }

    #[test]
    fn case_whitespace_and_descriptor() {
        approx(px("  12PX  "), 12.);
        approx(px("1.5Em"), 15.);
        approx(px("3px solid"), 3.);
    }

    #[test]
    fn keywords_scale_tag_size() {
        approx(px("medium"), 20.);
        approx(px("xx-small"), 11.25);
        approx(px("x-large"), 30.);
        approx(px("XX-Large"), 40.);
    }

    #[test]
    fn fallbacks() {
        approx(px("huge"), 20.);
        approx(px("12furlongs"), 20.);
        approx(px(""), 20.);

        let unresolved = UnitContext::new(None, 10., vec2(800., 600.));
        approx(resolve(&Length::from("nonsense"), &unresolved), 16.);
        approx(resolve(&Length::from("large"), &unresolved), 18.);
    }

    #[test]
    fn bare_number_is_pixels() {
        approx(px("14"), 14.);
        approx(px("-2.5"), -2.5);
    }

    #[test]
    fn px_and_percent_hold_for_random_inputs() {
        for _ in 0..200 {
            let value = fastrand::u32(0..10_000) as f32 / 10.;
            let tag = fastrand::u32(1..500) as f32;
            let cx = UnitContext::new(Some(tag), 16., vec2(1024., 768.));
            approx(resolve(&Length::from(format!("{}px", value).as_str()), &cx), value);
            approx(
                resolve(&Length::from(format!("{}%", value).as_str()), &cx),
                tag * value / 100.,
            );
        }
    }
}
