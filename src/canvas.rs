//! Raster surfaces that rendered text is drawn to.

use glam::Vec2;
use image::{imageops, RgbImage};
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::{font::to_pixel, rect::Rect};

/// How the canvas makes room for text that does not fit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasMode {
    /// Fixed-size pages. Text continues on a new page once one is full.
    Paginate,
    /// A single surface that grows by one page size in each direction as needed.
    AutoGrow,
}

impl Default for CanvasMode {
    fn default() -> Self {
        CanvasMode::Paginate
    }
}

/// A sequence of RGB pages.
///
/// In [`CanvasMode::AutoGrow`] there is always exactly one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    mode: CanvasMode,
    /// Page size, or the growth increment in auto-grow mode.
    page_width: u32,
    page_height: u32,
    background: Srgb<u8>,
    pages: Vec<RgbImage>,
}

impl Canvas {
    pub fn new(mode: CanvasMode, page_width: u32, page_height: u32, background: Srgb<u8>) -> Self {
        let mut canvas = Self {
            mode,
            page_width: page_width.max(1),
            page_height: page_height.max(1),
            background,
            pages: Vec::new(),
        };
        canvas.clear();
        canvas
    }

    /// Discards all pages and starts over with a single blank page.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.pages.push(self.blank_page());
    }

    fn blank_page(&self) -> RgbImage {
        RgbImage::from_pixel(self.page_width, self.page_height, to_pixel(self.background))
    }

    /// The configured page size (the growth increment in auto-grow mode).
    pub fn page_size(&self) -> (u32, u32) {
        (self.page_width, self.page_height)
    }

    /// Size of the first surface. Differs from [`page_size`](Self::page_size)
    /// only after an auto-grow canvas has grown.
    pub fn size(&self) -> (u32, u32) {
        self.pages[0].dimensions()
    }

    pub fn pages(&self) -> &[RgbImage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Makes sure the page at `index` exists, appending blank pages.
    /// An auto-grow canvas keeps its single page.
    pub(crate) fn ensure_page(&mut self, index: usize) {
        if self.mode == CanvasMode::AutoGrow {
            return;
        }
        while self.pages.len() <= index {
            log::info!("Allocating page {}", self.pages.len());
            let page = self.blank_page();
            self.pages.push(page);
        }
    }

    /// Grows the single auto-grow surface in page-size steps until it
    /// contains `extent`. Existing content stays at the top-left.
    /// Pages of a paginated canvas never grow.
    pub(crate) fn grow_to_fit(&mut self, extent: Vec2) {
        if self.mode == CanvasMode::Paginate {
            return;
        }
        let (old_width, old_height) = self.size();
        let mut width = old_width;
        let mut height = old_height;
        while (width as f32) < extent.x {
            width += self.page_width;
        }
        while (height as f32) < extent.y {
            height += self.page_height;
        }
        if (width, height) == (old_width, old_height) {
            return;
        }

        log::info!("Canvas growing to {}x{}", width, height);
        let mut grown = RgbImage::from_pixel(width, height, to_pixel(self.background));
        imageops::replace(&mut grown, &self.pages[0], 0, 0);
        self.pages[0] = grown;
    }

    /// Copies `bitmap` onto a page with its top-left corner at `pos`.
    /// Parts outside the page are clipped.
    pub(crate) fn blit(&mut self, page: usize, pos: Vec2, bitmap: &RgbImage) {
        let target = &mut self.pages[page];
        let (x, y) = (pos.x.max(0.) as u32, pos.y.max(0.) as u32);
        if x < target.width() && y < target.height() {
            imageops::replace(target, bitmap, x, y);
        }
    }

    /// Fills a rectangle on a page. Parts outside the page are clipped.
    pub(crate) fn fill_rect(&mut self, page: usize, rect: Rect, color: Srgb<u8>) {
        let target = &mut self.pages[page];
        let min = rect.pos.max(Vec2::ZERO);
        let max = rect.max();
        let x_end = (max.x.max(0.) as u32).min(target.width());
        let y_end = (max.y.max(0.) as u32).min(target.height());
        let pixel = to_pixel(color);
        for y in min.y as u32..y_end {
            for x in min.x as u32..x_end {
                target.put_pixel(x, y, pixel);
            }
        }
    }

    /// Resets a rectangle on a page to the background color.
    pub(crate) fn erase(&mut self, page: usize, rect: Rect) {
        let background = self.background;
        self.fill_rect(page, rect, background);
    }

    /// Writes every page to `dir` as `page-{n}.png`.
    #[cfg(feature = "png")]
    pub fn save_pages(
        &self,
        dir: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<Vec<std::path::PathBuf>> {
        use anyhow::Context as _;

        let dir = dir.as_ref();
        let mut paths = Vec::with_capacity(self.pages.len());
        for (i, page) in self.pages.iter().enumerate() {
            let path = dir.join(format!("page-{}.png", i));
            page.save(&path)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            paths.push(path);
        }
        Ok(paths)
    }
}
