//! Color value parsing.
//!
//! Supported syntaxes:
//! * hex: `#rrggbb`. Digits are read two at a time, so short forms are
//!   *not* expanded CSS-style: a trailing lone digit is read on its own
//!   and absent channels are zero (`#FFF` is `(255, 15, 0)`).
//! * `rgb(r, g, b)` and `rgba(r, g, b, a)` (alpha is discarded)
//! * CSS color names (`red`, `rebeccapurple`, ...)

use std::{fmt, num::ParseIntError, str::FromStr};

use palette::Srgb;
use smartstring::{LazyCompact, SmartString};

/// A color as given in a style override: either already RGB
/// or a textual form still to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    Rgb(Srgb<u8>),
    Expr(SmartString<LazyCompact>),
}

impl From<Srgb<u8>> for ColorValue {
    fn from(rgb: Srgb<u8>) -> Self {
        ColorValue::Rgb(rgb)
    }
}

impl From<(u8, u8, u8)> for ColorValue {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        ColorValue::Rgb(Srgb::new(r, g, b))
    }
}

impl<'a> From<&'a str> for ColorValue {
    fn from(s: &'a str) -> Self {
        ColorValue::Expr(s.into())
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorValue::Rgb(c) => write!(f, "#{:02x}{:02x}{:02x}", c.red, c.green, c.blue),
            ColorValue::Expr(expr) => f.write_str(expr),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ColorParseError {
    #[error("expected parenthesis after color type")]
    MissingParenthesis,
    #[error("unknown color '{0}' - expected a hex color, `rgb`, `rgba` or a color name")]
    UnknownColor(String),
    #[error("invalid hex digits in '{0}'")]
    InvalidHex(String),
    #[error(transparent)]
    BadValue(ParseIntError),
    #[error("expected {expected} color components but found {actual}")]
    ComponentMismatch { expected: usize, actual: usize },
}

/// Converts hex strings to RGB. Anything else is returned unchanged.
pub fn resolve(value: &ColorValue) -> Result<ColorValue, ColorParseError> {
    match value {
        ColorValue::Expr(expr) if is_hex(expr) => parse_hex(expr).map(ColorValue::Rgb),
        other => Ok(other.clone()),
    }
}

/// Fully resolves a color value to RGB.
pub fn to_rgb(value: &ColorValue) -> Result<Srgb<u8>, ColorParseError> {
    match resolve(value)? {
        ColorValue::Rgb(rgb) => Ok(rgb),
        ColorValue::Expr(expr) => parse_color(&expr),
    }
}

/// Parses any supported color syntax.
pub fn parse_color(s: &str) -> Result<Srgb<u8>, ColorParseError> {
    let s = s.trim();
    if is_hex(s) {
        return parse_hex(s);
    }

    let lowered = s.to_ascii_lowercase();
    match *lowered.as_bytes() {
        [b'r', b'g', b'b', b'a', b'(', ..] | [b'r', b'g', b'b', b'a', b' ', ..] => {
            parse_rgba(&lowered[4..])
        }
        [b'r', b'g', b'b', b'(', ..] | [b'r', b'g', b'b', b' ', ..] => parse_rgb(&lowered[3..]),
        _ => palette::named::from_str(&lowered)
            .ok_or_else(|| ColorParseError::UnknownColor(s.to_owned())),
    }
}

fn is_hex(s: &str) -> bool {
    s.contains('#')
}

fn parse_hex(s: &str) -> Result<Srgb<u8>, ColorParseError> {
    let digits: String = s.trim().chars().filter(|&c| c != '#').collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorParseError::InvalidHex(s.to_owned()));
    }

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let start = (i * 2).min(digits.len());
        let end = (i * 2 + 2).min(digits.len());
        let group = &digits[start..end];
        if !group.is_empty() {
            *channel = u8::from_str_radix(group, 16).map_err(ColorParseError::BadValue)?;
        }
    }

    let [r, g, b] = channels;
    Ok(Srgb::new(r, g, b))
}

fn parse_rgb(s: &str) -> Result<Srgb<u8>, ColorParseError> {
    let components = parse_components(parenthesized(s)?)?;
    if let [r, g, b] = *components.as_slice() {
        Ok(Srgb::new(r, g, b))
    } else {
        Err(ColorParseError::ComponentMismatch {
            expected: 3,
            actual: components.len(),
        })
    }
}

fn parse_rgba(s: &str) -> Result<Srgb<u8>, ColorParseError> {
    let components = parse_components(parenthesized(s)?)?;
    if let [r, g, b, _a] = *components.as_slice() {
        Ok(Srgb::new(r, g, b))
    } else {
        Err(ColorParseError::ComponentMismatch {
            expected: 4,
            actual: components.len(),
        })
    }
}

fn parenthesized(s: &str) -> Result<&str, ColorParseError> {
    let s = s.trim();
    match (s.chars().next(), s.chars().last()) {
        (Some('('), Some(')')) if s.len() >= 2 => Ok(&s[1..s.len() - 1]),
        _ => Err(ColorParseError::MissingParenthesis),
    }
}

fn parse_components(s: &str) -> Result<Vec<u8>, ColorParseError> {
    let mut result = Vec::new();
    for part in s.split(',') {
        let component = u8::from_str(part.trim()).map_err(ColorParseError::BadValue)?;
        result.push(component);
    }
    Ok(result)
}
