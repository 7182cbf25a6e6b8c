//! A styled-text layout engine. Renders a small
//! HTML-like markup (bold, italic, underline and line
//! breaks) onto paginated or growing RGB canvases.

mod canvas;
pub mod color;
mod engine;
pub mod font;
mod layout;
pub mod markup;
mod rect;
mod settings;
mod style;
pub mod units;

pub use canvas::{Canvas, CanvasMode};
pub use color::{parse_color, ColorParseError, ColorValue};
pub use engine::{SpanBounds, StyledText};
pub use font::{
    FixedFonts, FontHandle, FontId, FontProvider, GlyphError, GlyphPaint, SystemFonts,
};
pub use layout::{feed_line, paragraph_indent, Cursor};
pub use rect::Rect;
pub use settings::Settings;
pub use style::{Padding, Property, PropertyError, Style, StyleOverrides};
pub use units::{Length, LengthError};
