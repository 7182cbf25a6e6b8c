//! Font providers.
//!
//! The layout engine never touches font files directly. It asks a
//! [`FontProvider`] for a [`FontHandle`] and then for glyph bitmaps.
//! Two providers are included:
//! * [`SystemFonts`], backed by `fontdb` (font discovery) and `fontdue` (rasterization)
//! * [`FixedFonts`], which draws every glyph as a box with a fixed advance.
//!   Useful for tests and for measuring without any fonts installed.

mod system;

use ahash::AHashMap;
use image::{Rgb, RgbImage};
use palette::Srgb;
use smartstring::{LazyCompact, SmartString};

pub use system::SystemFonts;

/// Unique ID of a font family within a provider.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FontId(u32);

impl FontId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// A font at a given pixel size, with bold and italic toggles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontHandle {
    id: FontId,
    family: SmartString<LazyCompact>,
    size: u32,
    bold: bool,
    italic: bool,
}

impl FontHandle {
    pub fn new(id: FontId, family: &str, size: u32) -> Self {
        Self {
            id,
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }

    pub fn id(&self) -> FontId {
        self.id
    }

    /// The family this handle resolved to.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Size in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.bold = bold;
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
    }
}

/// How to paint a glyph bitmap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlyphPaint {
    pub anti_alias: bool,
    pub foreground: Srgb<u8>,
    pub background: Srgb<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    #[error("glyph for {0:?} cannot be rendered")]
    Unrenderable(char),
    #[error("no font matched the family '{0}'")]
    MissingFont(String),
    #[error("failed to parse font '{family}': {reason}")]
    MalformedFont { family: String, reason: &'static str },
}

/// Resolves fonts and renders glyphs for the layout engine.
pub trait FontProvider {
    /// Gets a handle for `family` at `size` pixels.
    ///
    /// Repeated calls with the same arguments return equal handles.
    /// Unknown families resolve to a default family.
    fn get_font(&mut self, family: &str, size: u32) -> FontHandle;

    /// Renders a single character to an opaque bitmap whose width is
    /// the glyph advance and whose height is the line height of the font.
    ///
    /// Fails for characters the font cannot render; callers should skip them.
    fn render_glyph(
        &mut self,
        font: &FontHandle,
        c: char,
        paint: &GlyphPaint,
    ) -> Result<RgbImage, GlyphError>;
}

impl<P: FontProvider + ?Sized> FontProvider for &mut P {
    fn get_font(&mut self, family: &str, size: u32) -> FontHandle {
        (**self).get_font(family, size)
    }

    fn render_glyph(
        &mut self,
        font: &FontHandle,
        c: char,
        paint: &GlyphPaint,
    ) -> Result<RgbImage, GlyphError> {
        (**self).render_glyph(font, c, paint)
    }
}

pub(crate) fn to_pixel(color: Srgb<u8>) -> Rgb<u8> {
    Rgb([color.red, color.green, color.blue])
}

/// A font provider with fixed glyph metrics.
///
/// Each glyph is `ceil(size / 2)` pixels wide (one more when bold) and
/// `size` pixels tall. Visible characters are drawn as a filled box in the
/// lower three quarters of the cell, whitespace as background only.
/// Control characters are reported as unrenderable.
#[derive(Debug, Default)]
pub struct FixedFonts {
    families: AHashMap<SmartString<LazyCompact>, FontId>,
}

impl FixedFonts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of a glyph in `font` without rendering it.
    pub fn glyph_width(font: &FontHandle) -> u32 {
        let width = ((font.size() + 1) / 2).max(1);
        if font.is_bold() {
            width + 1
        } else {
            width
        }
    }
}

impl FontProvider for FixedFonts {
    fn get_font(&mut self, family: &str, size: u32) -> FontHandle {
        let next = FontId(self.families.len() as u32);
        let id = *self.families.entry(family.into()).or_insert(next);
        FontHandle::new(id, family, size)
    }

    fn render_glyph(
        &mut self,
        font: &FontHandle,
        c: char,
        paint: &GlyphPaint,
    ) -> Result<RgbImage, GlyphError> {
        if c.is_control() {
            return Err(GlyphError::Unrenderable(c));
        }

        let width = Self::glyph_width(font);
        let height = font.size().max(1);
        let mut bitmap = RgbImage::from_pixel(width, height, to_pixel(paint.background));
        if !c.is_whitespace() {
            let fg = to_pixel(paint.foreground);
            for y in height / 4..height {
                for x in 0..width.saturating_sub(1).max(1) {
                    bitmap.put_pixel(x, y, fg);
                }
            }
        }
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint() -> GlyphPaint {
        GlyphPaint {
            anti_alias: true,
            foreground: Srgb::new(0, 0, 0),
            background: Srgb::new(255, 255, 255),
        }
    }

    #[test]
    fn handles_are_idempotent() {
        let mut fonts = FixedFonts::new();
        let a = fonts.get_font("Serif", 12);
        let b = fonts.get_font("Serif", 12);
        let c = fonts.get_font("Mono", 12);
        assert_eq!(a, b);
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn fixed_metrics() {
        let mut fonts = FixedFonts::new();
        let mut font = fonts.get_font("Serif", 16);
        let glyph = fonts.render_glyph(&font, 'a', &paint()).unwrap();
        assert_eq!(glyph.dimensions(), (8, 16));
        assert_eq!(glyph.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(glyph.get_pixel(0, 15), &Rgb([0, 0, 0]));

        font.set_bold(true);
        let glyph = fonts.render_glyph(&font, 'a', &paint()).unwrap();
        assert_eq!(glyph.dimensions(), (9, 16));
    }

    #[test]
    fn whitespace_is_blank_and_controls_fail() {
        let mut fonts = FixedFonts::new();
        let font = fonts.get_font("Serif", 16);
        let space = fonts.render_glyph(&font, ' ', &paint()).unwrap();
        assert!(space.pixels().all(|p| *p == Rgb([255, 255, 255])));
        assert!(matches!(
            fonts.render_glyph(&font, '\u{7}', &paint()),
            Err(GlyphError::Unrenderable('\u{7}'))
        ));
    }
}
