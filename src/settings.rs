use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::{
    canvas::CanvasMode,
    style::{Padding, Style},
    units::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE},
};

/// Engine configuration.
///
/// Every field has a default, so a partial TOML or JSON document
/// deserializes into a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Canvas width in pixels. Lines wrap at `width - padding.right`.
    pub width: u32,
    /// Page height, or the vertical growth increment in auto-grow mode.
    pub height: u32,
    pub mode: CanvasMode,
    /// Whether lines wrap at the right edge.
    pub wrap_lines: bool,
    pub anti_alias: bool,
    /// Starts every cleared canvas with a line feed.
    pub seed_newline: bool,

    /// Root font family.
    pub font: String,
    /// Root font size in pixels.
    pub font_size: f32,
    pub color: Srgb<u8>,
    pub background_color: Srgb<u8>,
    pub padding: Padding,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            mode: CanvasMode::Paginate,
            wrap_lines: true,
            anti_alias: true,
            seed_newline: false,
            font: "sans-serif".to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            color: Srgb::new(0, 0, 0),
            background_color: Srgb::new(u8::MAX, u8::MAX, u8::MAX),
            padding: Padding::ZERO,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn mode(mut self, mode: CanvasMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn wrap_lines(mut self, wrap_lines: bool) -> Self {
        self.wrap_lines = wrap_lines;
        self
    }

    pub fn anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    pub fn seed_newline(mut self, seed_newline: bool) -> Self {
        self.seed_newline = seed_newline;
        self
    }

    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.font = family.into();
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn color(mut self, color: Srgb<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn background_color(mut self, color: Srgb<u8>) -> Self {
        self.background_color = color;
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// The style every render starts from.
    pub fn base_style(&self) -> Style {
        let mut style = Style::default();
        style.font = self.font.as_str().into();
        style.font_size = self.font_size.trunc().max(1.).min(MAX_FONT_SIZE);
        style.color = self.color;
        style.background_color = self.background_color;
        style.padding = self.padding;
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let settings = Settings::new()
            .size(320, 240)
            .mode(CanvasMode::AutoGrow)
            .font("Serif")
            .font_size(12.5)
            .padding(Padding::uniform(4.));
        assert_eq!(settings.width, 320);
        assert_eq!(settings.height, 240);
        assert!(settings.wrap_lines);

        let style = settings.base_style();
        assert_eq!(style.font.as_str(), "Serif");
        assert_eq!(style.font_size, 12.);
        assert_eq!(style.padding, Padding::uniform(4.));
        assert!(!style.bold);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "width": 320, "mode": "auto_grow", "padding": { "left": 4 } }"#)
                .unwrap();
        assert_eq!(
            settings,
            Settings::default()
                .size(320, 600)
                .mode(CanvasMode::AutoGrow)
                .padding(Padding::new(0., 0., 0., 4.))
        );

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(serde_json::from_str::<Settings>(&json).unwrap(), settings);
    }

    #[test]
    fn huge_font_size_is_clamped() {
        let style = Settings::default().font_size(1e12).base_style();
        assert_eq!(style.font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn default_base_style() {
        assert_eq!(Settings::default().base_style(), Style::default());
    }
}
