//! The styled-text engine.
//!
//! [`StyledText`] owns a [`Canvas`] and a [`Cursor`] and lays glyphs
//! out left to right, wrapping at the right padding edge. Appends are
//! incremental: the cursor carries over from one call to the next until
//! the engine is cleared.
//!
//! Positions handed out by the engine (the cursor and [`SpanBounds`]) are
//! in document space. In paginated mode page `n` covers the rows
//! `n * height..(n + 1) * height`; use [`StyledText::page_local`] to map a
//! position onto its page.

use glam::{vec2, Vec2};
use image::RgbImage;
use palette::Srgb;

use crate::{
    canvas::{Canvas, CanvasMode},
    font::{FontProvider, GlyphPaint},
    layout::{page_of, page_span, paragraph_indent, Cursor},
    markup::{self, Item, TagEvent},
    rect::Rect,
    settings::Settings,
    style::{Padding, Style, StyleOverrides},
};

/// Area covered by an appended span.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct SpanBounds {
    /// Smallest rectangle containing every glyph placed by the call.
    pub bounds: Rect,
    /// Free space to the right of the last glyph, up to the right padding edge.
    pub trailing: Rect,
}

impl SpanBounds {
    /// Whether the call placed no glyph at all.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

/// A glyph on the line being laid out. Kept so the line can be moved
/// to the next page when a taller glyph would cross the page boundary.
#[derive(Debug)]
struct LineGlyph {
    bitmap: RgbImage,
    x: f32,
    underline: Option<Srgb<u8>>,
    /// Index into the placements of the current call.
    placement: Option<usize>,
}

impl LineGlyph {
    fn extent(&self) -> Vec2 {
        let underline = if self.underline.is_some() { 1. } else { 0. };
        vec2(
            self.bitmap.width() as f32,
            self.bitmap.height() as f32 + underline,
        )
    }
}

/// Renders styled text and markup onto pages.
pub struct StyledText<F> {
    fonts: F,
    settings: Settings,
    base_style: Style,
    canvas: Canvas,
    cursor: Cursor,
    line: Vec<LineGlyph>,
}

impl<F: FontProvider> StyledText<F> {
    pub fn new(fonts: F, settings: Settings) -> Self {
        let base_style = settings.base_style();
        let canvas = Canvas::new(
            settings.mode,
            settings.width,
            settings.height,
            settings.background_color,
        );
        let mut engine = Self {
            fonts,
            base_style,
            canvas,
            cursor: Cursor::new(&settings.padding),
            settings,
            line: Vec::new(),
        };
        engine.clear();
        engine
    }

    /// Clears the canvas and renders `markup` with the base style.
    pub fn render(&mut self, markup: &str) -> &Canvas {
        self.clear();
        let style = self.base_style.clone();
        self.append(markup::tokenize(markup), style);
        &self.canvas
    }

    /// Appends plain text. Angle brackets are drawn literally.
    pub fn render_styled_text(&mut self, text: &str, overrides: &StyleOverrides) -> SpanBounds {
        let style = self.derive_style(overrides);
        self.append(text.chars().map(Item::Char), style)
    }

    /// Appends markup. `overrides` apply on top of the base style for
    /// the whole span; tags toggle attributes within it.
    pub fn render_html_text(&mut self, markup: &str, overrides: &StyleOverrides) -> SpanBounds {
        let style = self.derive_style(overrides);
        self.append(markup::tokenize(markup), style)
    }

    /// Resets the cursor and starts over with a single blank page.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.line.clear();
        self.cursor = Cursor::new(&self.base_style.padding);
        if self.settings.seed_newline {
            let height = self.base_style.font_size;
            let padding = self.base_style.padding;
            self.line_feed(height, &padding, 0.);
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn pages(&self) -> &[RgbImage] {
        self.canvas.pages()
    }

    pub fn page_count(&self) -> usize {
        self.canvas.page_count()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn base_style(&self) -> &Style {
        &self.base_style
    }

    pub fn fonts_mut(&mut self) -> &mut F {
        &mut self.fonts
    }

    /// Maps a document-space position to its page and the position on that page.
    pub fn page_local(&self, pos: Vec2) -> (usize, Vec2) {
        match self.settings.mode {
            CanvasMode::AutoGrow => (0, pos),
            CanvasMode::Paginate => {
                let page_height = self.page_height();
                let page = page_of(pos.y, page_height);
                (page, vec2(pos.x, pos.y - page as f32 * page_height))
            }
        }
    }

    fn page_height(&self) -> f32 {
        self.canvas.page_size().1 as f32
    }

    fn viewport(&self) -> Vec2 {
        let (width, height) = self.canvas.page_size();
        vec2(width as f32, height as f32)
    }

    fn derive_style(&self, overrides: &StyleOverrides) -> Style {
        self.base_style.derive(overrides, self.viewport())
    }

    fn append(&mut self, items: impl Iterator<Item = Item>, mut style: Style) -> SpanBounds {
        // Glyphs left over from earlier calls do not belong to this span.
        for glyph in &mut self.line {
            glyph.placement = None;
        }

        let mut placements = Vec::new();
        for item in items {
            match item {
                Item::Tag(event) => self.apply_tag(event, &mut style),
                Item::Char('\n') => self.line_feed(style.font_size, &style.padding, 0.),
                Item::Char(c) => self.place_glyph(c, &style, &mut placements),
            }
        }

        self.span_bounds(&placements, &style)
    }

    fn apply_tag(&mut self, event: TagEvent, style: &mut Style) {
        match event {
            TagEvent::OpenBold => style.bold = true,
            TagEvent::CloseBold => style.bold = false,
            TagEvent::OpenItalic => style.italic = true,
            TagEvent::CloseItalic => style.italic = false,
            TagEvent::OpenUnderline => style.underline = true,
            TagEvent::CloseUnderline => style.underline = false,
            TagEvent::LineBreak => {
                let indent = paragraph_indent(style.font_size);
                self.line_feed(style.font_size, &style.padding, indent);
            }
            TagEvent::None => {}
        }
    }

    fn line_feed(&mut self, default_height: f32, padding: &Padding, indent: f32) {
        self.cursor.line_feed(default_height, padding);
        self.cursor.pos.x += indent;
        self.line.clear();
        if self.settings.mode == CanvasMode::Paginate {
            self.cursor.page = page_of(self.cursor.pos.y, self.page_height());
        }
    }

    fn place_glyph(&mut self, c: char, style: &Style, placements: &mut Vec<Rect>) {
        let mut font = self.fonts.get_font(&style.font, style.font_size as u32);
        font.set_bold(style.bold);
        font.set_italic(style.italic);
        let paint = GlyphPaint {
            anti_alias: self.settings.anti_alias,
            foreground: style.color,
            background: style.background_color,
        };
        let bitmap = match self.fonts.render_glyph(&font, c, &paint) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                log::warn!("Skipping character {:?} in {}: {}", c, style, e);
                return;
            }
        };
        let size = vec2(bitmap.width() as f32, bitmap.height() as f32);

        let right_edge = self.settings.width as f32 - style.padding.right;
        if self.settings.wrap_lines
            && !self.line.is_empty()
            && !self.cursor.fits(size.x, right_edge)
        {
            self.line_feed(size.y, &style.padding, paragraph_indent(style.font_size));
        }

        let underline = if style.underline { 1. } else { 0. };
        match self.settings.mode {
            CanvasMode::Paginate => {
                let (top, bottom) =
                    page_span(self.cursor.pos.y, size.y + underline, self.page_height());
                if top != bottom {
                    self.push_line_to_next_page(size.y, &style.padding, placements);
                }
                self.cursor.page = page_of(self.cursor.pos.y, self.page_height());
                self.canvas.ensure_page(self.cursor.page);
            }
            CanvasMode::AutoGrow => {
                self.canvas
                    .grow_to_fit(self.cursor.pos + size + vec2(0., underline));
            }
        }

        let (page, local) = self.page_local(self.cursor.pos);
        self.canvas.blit(page, local, &bitmap);
        if style.underline {
            self.canvas.fill_rect(
                page,
                Rect::new(local + vec2(0., size.y), vec2(size.x, 1.)),
                style.color,
            );
        }

        placements.push(Rect::new(self.cursor.pos, size));
        self.line.push(LineGlyph {
            bitmap,
            x: self.cursor.pos.x,
            underline: if style.underline {
                Some(style.color)
            } else {
                None
            },
            placement: Some(placements.len() - 1),
        });
        self.cursor.advance(size);
    }

    /// Moves the current line to the top of the next page, redrawing the
    /// glyphs already placed on it.
    fn push_line_to_next_page(
        &mut self,
        glyph_height: f32,
        padding: &Padding,
        placements: &mut [Rect],
    ) {
        let page_height = self.page_height();
        let line_y = self.cursor.pos.y;
        let page = page_of(line_y, page_height);
        let page_top = page as f32 * page_height;

        if line_y - page_top <= padding.top {
            log::warn!(
                "Glyph of height {}px does not fit on a {}px page; clipping",
                glyph_height,
                page_height
            );
            return;
        }

        let new_y = page_top + page_height + padding.top;
        self.canvas.ensure_page(page + 1);

        for glyph in &self.line {
            self.canvas.erase(
                page,
                Rect::new(vec2(glyph.x, line_y - page_top), glyph.extent()),
            );
        }
        for glyph in &self.line {
            let pos = vec2(glyph.x, padding.top);
            self.canvas.blit(page + 1, pos, &glyph.bitmap);
            if let Some(color) = glyph.underline {
                let size = glyph.extent();
                self.canvas.fill_rect(
                    page + 1,
                    Rect::new(pos + vec2(0., size.y - 1.), vec2(size.x, 1.)),
                    color,
                );
            }
            if let Some(index) = glyph.placement {
                placements[index].pos.y = new_y;
            }
        }

        log::debug!("Moved line at y={} to page {}", line_y, page + 1);
        self.cursor.pos.y = new_y;
    }

    fn span_bounds(&self, placements: &[Rect], style: &Style) -> SpanBounds {
        let (first, last) = match (placements.first(), placements.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                log::warn!("Append placed no glyphs");
                return SpanBounds::default();
            }
        };

        let bounds = placements[1..]
            .iter()
            .fold(first, |bounds, rect| bounds.union(*rect));

        let x = last.max().x + 1.;
        let available = self.settings.width as f32 - style.padding.right;
        let height = if self.cursor.pos.y == last.pos.y {
            last.size.y.max(self.cursor.line_height)
        } else {
            last.size.y
        };
        let trailing = Rect::from_xywh(x, last.pos.y, (available - x).max(0.), height);

        SpanBounds { bounds, trailing }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::font::FixedFonts;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn engine(settings: Settings) -> StyledText<FixedFonts> {
        StyledText::new(FixedFonts::new(), settings)
    }

    fn none() -> StyleOverrides {
        StyleOverrides::new()
    }

    #[test]
    fn bold_span_bounds() {
        let mut text = engine(Settings::default());
        let span = text.render_html_text("<b>hi</b> there", &none());
        // Two bold glyphs 9px wide, six regular 8px wide, seven 1px gaps.
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 73., 16.));
        assert_eq!(span.trailing, Rect::from_xywh(74., 0., 726., 16.));
        assert_eq!(text.cursor().pos, vec2(74., 0.));
    }

    #[test]
    fn glyph_that_exactly_fits_stays() {
        let settings = Settings::default()
            .size(99, 600)
            .padding(Padding::new(0., 10., 0., 0.));

        // The tenth glyph ends exactly at the right padding edge.
        let mut text = engine(settings.clone());
        let span = text.render_styled_text("aaaaaaaaaa", &none());
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 89., 16.));
        assert_eq!(span.trailing.size.x, 0.);

        let mut text = engine(settings);
        let span = text.render_styled_text("aaaaaaaaaaa", &none());
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 89., 32.));
        assert_eq!(text.cursor().pos, vec2(15. + 9., 16.));
    }

    #[test]
    fn wrap_can_be_disabled() {
        let settings = Settings::default().size(20, 600).wrap_lines(false);
        let mut text = engine(settings);
        text.render_styled_text("abcd", &none());
        assert_eq!(text.cursor().pos, vec2(36., 0.));
    }

    #[test]
    fn line_crossing_page_moves_whole_line() {
        let mut text = engine(Settings::default().size(100, 40));
        text.render_styled_text("\n\n", &none());
        assert_eq!(text.cursor().pos.y, 32.);

        let small = none().font_size(8.);
        let span = text.render_styled_text("ab", &small);
        assert_eq!(span.bounds, Rect::from_xywh(0., 32., 9., 8.));
        assert_eq!(text.page_count(), 1);
        assert_eq!(text.pages()[0].get_pixel(0, 39), &BLACK);

        let span = text.render_styled_text("c", &none());
        assert_eq!(span.bounds, Rect::from_xywh(10., 40., 8., 16.));
        assert_eq!(text.cursor().page, 1);
        assert_eq!(text.page_count(), 2);

        // Nothing of the line is left on the first page.
        let first = &text.pages()[0];
        assert!((32..40).all(|y| (0..100).all(|x| first.get_pixel(x, y) == &WHITE)));

        let second = &text.pages()[1];
        assert_eq!(second.get_pixel(0, 7), &BLACK);
        assert_eq!(second.get_pixel(5, 7), &BLACK);
        assert_eq!(second.get_pixel(10, 15), &BLACK);
        assert_eq!(second.get_pixel(0, 8), &WHITE);
    }

    #[test]
    fn underline_row_counts_toward_page_crossing() {
        let mut text = engine(Settings::default().size(100, 40));
        text.render_styled_text("\n\n", &none());

        // The glyph itself ends on the last row of the page, its underline does not.
        let span = text.render_html_text("<u>a</u>", &none().font_size(8.));
        assert_eq!(span.bounds, Rect::from_xywh(0., 40., 4., 8.));
        assert_eq!(text.page_count(), 2);

        let first = &text.pages()[0];
        assert!((32..40).all(|y| (0..100).all(|x| first.get_pixel(x, y) == &WHITE)));
        let second = &text.pages()[1];
        assert_eq!(second.get_pixel(0, 7), &BLACK);
        assert_eq!(second.get_pixel(3, 8), &BLACK);
        assert_eq!(second.get_pixel(4, 8), &WHITE);
    }

    #[test]
    fn moved_line_keeps_underlines() {
        let mut text = engine(Settings::default().size(100, 40));
        text.render_styled_text("\n\n", &none());
        text.render_html_text("<u>ab</u>", &none().font_size(7.));
        assert_eq!(text.page_count(), 1);
        assert_eq!(text.pages()[0].get_pixel(3, 39), &BLACK);

        text.render_styled_text("c", &none());
        assert_eq!(text.page_count(), 2);

        let first = &text.pages()[0];
        assert!((32..40).all(|y| (0..100).all(|x| first.get_pixel(x, y) == &WHITE)));
        let second = &text.pages()[1];
        assert_eq!(second.get_pixel(3, 7), &BLACK);
        assert_eq!(second.get_pixel(4, 7), &WHITE);
        assert_eq!(second.get_pixel(8, 7), &BLACK);
        assert_eq!(second.get_pixel(3, 8), &WHITE);
    }

    #[test]
    fn borrowed_provider() {
        let mut fonts = FixedFonts::new();
        let mut text = StyledText::new(&mut fonts, Settings::default());
        let span = text.render_styled_text("ab", &none());
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 17., 16.));
    }

    #[test]
    fn glyph_on_fresh_line_starts_next_page() {
        let mut text = engine(Settings::default().size(100, 40));
        let span = text.render_styled_text("a\n\nb", &none());
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 8., 56.));
        assert_eq!(text.page_local(vec2(0., 40.)), (1, vec2(0., 0.)));
        assert_eq!(text.pages()[1].get_pixel(0, 15), &BLACK);
    }

    #[test]
    fn line_break_alone() {
        let mut text = engine(Settings::default());
        let span = text.render_html_text("<br/>", &none());
        assert!(span.is_empty());
        assert_eq!(span, SpanBounds::default());
        assert_eq!(text.cursor().pos, vec2(15., 16.));
    }

    #[test]
    fn empty_append() {
        let mut text = engine(Settings::default());
        let before = text.canvas().clone();
        assert_eq!(text.render_styled_text("", &none()), SpanBounds::default());
        assert_eq!(text.canvas(), &before);
        assert_eq!(text.cursor().pos, Vec2::ZERO);
    }

    #[test]
    fn clear_is_idempotent() {
        let settings = Settings::default()
            .size(50, 20)
            .seed_newline(true)
            .padding(Padding::uniform(2.));
        let mut text = engine(settings);
        text.render_styled_text("lots of text to wrap over pages", &none());
        assert!(text.page_count() > 1);

        text.clear();
        let canvas = text.canvas().clone();
        let cursor = *text.cursor();
        text.clear();
        assert_eq!(text.canvas(), &canvas);
        assert_eq!(text.cursor(), &cursor);
        assert_eq!(text.page_count(), 1);
        assert_eq!(cursor.pos, vec2(2., 20.));
    }

    #[test]
    fn render_starts_over() {
        let mut text = engine(Settings::default());
        text.render_styled_text("abc", &none());
        let canvas = text.render("x").clone();
        assert_eq!(text.cursor().pos, vec2(9., 0.));
        assert_eq!(canvas.pages()[0].get_pixel(9, 15), &WHITE);
    }

    #[test]
    fn auto_grow_keeps_content() {
        let settings = Settings::default()
            .size(20, 10)
            .mode(CanvasMode::AutoGrow)
            .wrap_lines(false);
        let mut text = engine(settings);
        text.render_styled_text("abc", &none());
        assert_eq!(text.page_count(), 1);
        assert_eq!(text.canvas().size(), (40, 20));

        let page = &text.pages()[0];
        assert_eq!(page.get_pixel(0, 15), &BLACK);
        assert_eq!(page.get_pixel(18, 15), &BLACK);
        assert_eq!(page.get_pixel(39, 19), &WHITE);
    }

    #[test]
    fn unrenderable_glyphs_are_skipped() {
        let mut text = engine(Settings::default());
        let span = text.render_styled_text("a\u{7}b", &none());
        assert_eq!(span.bounds, Rect::from_xywh(0., 0., 17., 16.));
    }

    // The 15/16 indent only applies to break tags and wraps, not to '\n'.
    #[test]
    fn break_indent_scales_with_font() {
        let mut text = engine(Settings::default());
        text.render_html_text("a<br/>b", &none().font_size(32.));
        assert_eq!(text.cursor().pos, vec2(30. + 17., 32.));

        text.clear();
        text.render_html_text("a\nb", &none().font_size(32.));
        assert_eq!(text.cursor().pos, vec2(17., 32.));
    }

    #[test]
    fn underline_and_colors() {
        let mut text = engine(Settings::default());
        let red = none().color("#FF0000").background_color("#0000FF");
        text.render_html_text("<u>a</u>b", &red);
        let page = &text.pages()[0];
        assert_eq!(page.get_pixel(0, 16), &Rgb([255, 0, 0]));
        assert_eq!(page.get_pixel(9, 16), &WHITE);
        assert_eq!(page.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn cursor_persists_across_appends() {
        let mut text = engine(Settings::default());
        text.render_styled_text("ab", &none());
        let span = text.render_html_text("<i>c</i>", &none());
        assert_eq!(span.bounds, Rect::from_xywh(18., 0., 8., 16.));
    }

    #[test]
    fn trailing_height_covers_line() {
        let mut text = engine(Settings::default());
        text.render_styled_text("A", &none().font_size(32.));
        let span = text.render_styled_text("b", &none());
        assert_eq!(span.trailing, Rect::from_xywh(17. + 9., 0., 800. - 26., 32.));
    }
}
