//! Pen position and line feeds.

use glam::{vec2, Vec2};

use crate::style::Padding;

/// Horizontal gap between consecutive glyphs, in pixels.
pub const GLYPH_GAP: f32 = 1.;

/// Moves the pen to the start of the next line.
///
/// The line advances by the tallest glyph seen on it, or by
/// `default_height` if no glyph was placed, plus the top padding.
pub fn feed_line(pos: Vec2, largest_height: f32, default_height: f32, padding: &Padding) -> Vec2 {
    let height = if largest_height == 0. {
        default_height
    } else {
        largest_height
    };
    vec2(padding.left, pos.y + height + padding.top)
}

/// Indent applied to a line started by a break tag or a wrap.
///
/// 15px at the default 16px size, scaled with the font.
pub fn paragraph_indent(font_size: f32) -> f32 {
    15. * (font_size / 16.)
}

/// The page that document-space row `y` falls on.
pub fn page_of(y: f32, page_height: f32) -> usize {
    (y / page_height).floor().max(0.) as usize
}

/// Pages holding the top and the bottom row of something `height`
/// pixels tall whose top is at `y`.
pub fn page_span(y: f32, height: f32, page_height: f32) -> (usize, usize) {
    let bottom_row = y + (height - 1.).max(0.);
    (page_of(y, page_height), page_of(bottom_row, page_height))
}

/// The layout pen. Positions are in document space: in paginated
/// mode `y` keeps increasing across pages.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cursor {
    pub pos: Vec2,
    /// Height of the tallest glyph since the last line feed.
    pub line_height: f32,
    pub page: usize,
}

impl Cursor {
    pub fn new(padding: &Padding) -> Self {
        Self {
            pos: vec2(padding.left, padding.top),
            line_height: 0.,
            page: 0,
        }
    }

    pub fn line_feed(&mut self, default_height: f32, padding: &Padding) {
        self.pos = feed_line(self.pos, self.line_height, default_height, padding);
        self.line_height = 0.;
    }

    /// Whether a glyph `width` pixels wide ends at or before `right_edge`.
    pub fn fits(&self, width: f32, right_edge: f32) -> bool {
        self.pos.x + width <= right_edge
    }

    /// Moves past a placed glyph.
    pub fn advance(&mut self, glyph_size: Vec2) {
        self.pos.x += glyph_size.x + GLYPH_GAP;
        self.line_height = self.line_height.max(glyph_size.y);
    }
}
