//! Style records and cascading.
//!
//! A [`Style`] holds every attribute needed to render a run of text.
//! Children are created with [`Style::derive`], which copies the parent
//! and applies a list of [`Property`] overrides. Attributes that are not
//! overridden are inherited as-is.

use std::{collections::BTreeMap, fmt, sync::Arc};

use glam::Vec2;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use smartstring::{LazyCompact, SmartString};

use crate::{
    color::{self, ColorValue},
    units::{self, Length, UnitContext, DEFAULT_FONT_SIZE, MAX_FONT_SIZE},
};

type Str = SmartString<LazyCompact>;

/// Padding around the text area in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const ZERO: Padding = Padding::new(0., 0., 0., 0.);

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(px: f32) -> Self {
        Self::new(px, px, px, px)
    }

    /// Parses CSS-style shorthand: one, two or four lengths.
    pub fn parse(s: &str) -> Result<Self, PropertyError> {
        let cx = UnitContext::new(None, DEFAULT_FONT_SIZE, Vec2::ZERO);
        let values = s
            .split_whitespace()
            .map(|part| units::try_resolve(part, &cx))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PropertyError::BadValue {
                key: "padding",
                value: s.to_owned(),
                reason: e.to_string(),
            })?;

        match *values.as_slice() {
            [all] => Ok(Self::uniform(all)),
            [vertical, horizontal] => Ok(Self::new(vertical, horizontal, vertical, horizontal)),
            [top, right, bottom, left] => Ok(Self::new(top, right, bottom, left)),
            _ => Err(PropertyError::BadValue {
                key: "padding",
                value: s.to_owned(),
                reason: format!("expected 1, 2 or 4 lengths, found {}", values.len()),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("invalid value '{value}' for '{key}': {reason}")]
    BadValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A single style override.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Font family name.
    Font(Str),
    FontSize(Length),
    Color(ColorValue),
    BackgroundColor(ColorValue),
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Link(bool),
    Padding(Padding),
    /// A key with no built-in meaning. Stored but not interpreted.
    Other { key: Str, value: Str },
}

impl Property {
    /// Parses a `key: value` pair as found in a `style` attribute.
    pub fn parse(key: &str, value: &str) -> Result<Self, PropertyError> {
        let value = value.trim();
        Ok(match key.trim() {
            "font" => Property::Font(value.into()),
            "font-size" => Property::FontSize(Length::from(value)),
            "color" => Property::Color(ColorValue::from(value)),
            "background-color" => Property::BackgroundColor(ColorValue::from(value)),
            "bold" => Property::Bold(parse_bool("bold", value)?),
            "italic" => Property::Italic(parse_bool("italic", value)?),
            "underline" => Property::Underline(parse_bool("underline", value)?),
            "link" => Property::Link(parse_bool("link", value)?),
            "padding" => Property::Padding(Padding::parse(value)?),
            other => Property::Other {
                key: other.into(),
                value: value.into(),
            },
        })
    }

    pub fn key(&self) -> &str {
        match self {
            Property::Font(_) => "font",
            Property::FontSize(_) => "font-size",
            Property::Color(_) => "color",
            Property::BackgroundColor(_) => "background-color",
            Property::Bold(_) => "bold",
            Property::Italic(_) => "italic",
            Property::Underline(_) => "underline",
            Property::Link(_) => "link",
            Property::Padding(_) => "padding",
            Property::Other { key, .. } => key.as_str(),
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, PropertyError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PropertyError::BadValue {
            key,
            value: value.to_owned(),
            reason: "expected a boolean".to_owned(),
        }),
    }
}

/// An ordered list of style overrides.
///
/// Later entries win over earlier ones for the same key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleOverrides {
    properties: Vec<Property>,
}

impl StyleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds overrides from string pairs. Pairs that fail to parse
    /// are skipped with a warning.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut overrides = Self::new();
        for (key, value) in pairs {
            match Property::parse(key, value) {
                Ok(property) => overrides.push(property),
                Err(e) => log::warn!("Ignoring style override: {}", e),
            }
        }
        overrides
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn with(mut self, property: Property) -> Self {
        self.push(property);
        self
    }

    pub fn font(self, family: &str) -> Self {
        self.with(Property::Font(family.into()))
    }

    pub fn font_size(self, size: impl Into<Length>) -> Self {
        self.with(Property::FontSize(size.into()))
    }

    pub fn color(self, color: impl Into<ColorValue>) -> Self {
        self.with(Property::Color(color.into()))
    }

    pub fn background_color(self, color: impl Into<ColorValue>) -> Self {
        self.with(Property::BackgroundColor(color.into()))
    }

    pub fn bold(self, bold: bool) -> Self {
        self.with(Property::Bold(bold))
    }

    pub fn italic(self, italic: bool) -> Self {
        self.with(Property::Italic(italic))
    }

    pub fn underline(self, underline: bool) -> Self {
        self.with(Property::Underline(underline))
    }

    pub fn link(self, link: bool) -> Self {
        self.with(Property::Link(link))
    }

    pub fn padding(self, padding: Padding) -> Self {
        self.with(Property::Padding(padding))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }
}

/// A fully specified text style.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Font family name.
    pub font: Str,
    /// Font size in whole pixels.
    pub font_size: f32,
    pub color: Srgb<u8>,
    pub background_color: Srgb<u8>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub link: bool,
    pub padding: Padding,
    /// Uninterpreted keys. Shared between derived styles until written to.
    extra: Arc<BTreeMap<Str, Str>>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font: "sans-serif".into(),
            font_size: DEFAULT_FONT_SIZE,
            color: Srgb::new(0, 0, 0),
            background_color: Srgb::new(u8::MAX, u8::MAX, u8::MAX),
            bold: false,
            italic: false,
            underline: false,
            link: false,
            padding: Padding::ZERO,
            extra: Arc::default(),
        }
    }
}

impl Style {
    /// Gets the value of a key without built-in meaning.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|v| v.as_str())
    }

    /// Creates a child style: a copy of `self` with `overrides` applied.
    ///
    /// `viewport` is used to resolve viewport-relative font sizes.
    /// Values that fail to resolve leave the inherited value in place.
    pub fn derive(&self, overrides: &StyleOverrides, viewport: Vec2) -> Style {
        let mut child = self.clone();
        for property in overrides.iter() {
            child.apply(property, self, viewport);
        }
        child
    }

    fn apply(&mut self, property: &Property, parent: &Style, viewport: Vec2) {
        match property {
            Property::Font(family) => self.font = family.clone(),
            Property::FontSize(length) => {
                let cx = UnitContext::new(Some(self.font_size), parent.font_size, viewport);
                let size = units::resolve(length, &cx).trunc();
                if size > MAX_FONT_SIZE {
                    log::warn!(
                        "Font size '{}' resolved to {}px; clamping to {}px",
                        length,
                        size,
                        MAX_FONT_SIZE
                    );
                    self.font_size = MAX_FONT_SIZE;
                } else if size.is_finite() && size > 0. {
                    self.font_size = size;
                } else {
                    log::warn!(
                        "Font size '{}' resolved to {}px; keeping {}px",
                        length,
                        size,
                        self.font_size
                    );
                }
            }
            Property::Color(value) => {
                if let Some(rgb) = resolve_color("color", value) {
                    self.color = rgb;
                }
            }
            Property::BackgroundColor(value) => {
                if let Some(rgb) = resolve_color("background-color", value) {
                    self.background_color = rgb;
                }
            }
            Property::Bold(bold) => self.bold = *bold,
            Property::Italic(italic) => self.italic = *italic,
            Property::Underline(underline) => self.underline = *underline,
            Property::Link(link) => self.link = *link,
            Property::Padding(padding) => self.padding = *padding,
            Property::Other { key, value } => {
                Arc::make_mut(&mut self.extra).insert(key.clone(), value.clone());
            }
        }
    }
}

fn resolve_color(key: &str, value: &ColorValue) -> Option<Srgb<u8>> {
    match color::to_rgb(value) {
        Ok(rgb) => Some(rgb),
        Err(e) => {
            log::warn!("Ignoring {} '{}': {}", key, value, e);
            None
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px", self.font, self.font_size)?;
        for (flag, name) in [
            (self.bold, "bold"),
            (self.italic, "italic"),
            (self.underline, "underline"),
        ] {
            if flag {
                write!(f, " {}", name)?;
            }
        }
        Ok(())
    }
}
