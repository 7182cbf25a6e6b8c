use std::{collections::hash_map::Entry, path::Path};

use ahash::AHashMap;
use anyhow::Context as _;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use image::{Rgb, RgbImage};
use lru::LruCache;
use smartstring::{LazyCompact, SmartString};

use super::{to_pixel, FontHandle, FontId, FontProvider, GlyphError, GlyphPaint};

const GLYPH_CACHE_CAPACITY: usize = 4096;
/// Horizontal shift per pixel of height for synthesized italics.
const ITALIC_SLANT: f32 = 0.2;

type Str = SmartString<LazyCompact>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct GlyphKey {
    face: fontdb::ID,
    c: char,
    size: u32,
    synthetic_bold: bool,
    synthetic_italic: bool,
    anti_alias: bool,
    foreground: [u8; 3],
    background: [u8; 3],
}

/// A face selected for a handle, plus the styles the face
/// lacks and that have to be synthesized.
#[derive(Copy, Clone, Debug)]
struct FaceMatch {
    id: fontdb::ID,
    synthetic_bold: bool,
    synthetic_italic: bool,
}

/// Fonts discovered through `fontdb` and rasterized with `fontdue`.
///
/// Handles, face lookups, parsed faces and rendered glyphs are all cached.
pub struct SystemFonts {
    db: Database,
    default_family: Str,

    ids: AHashMap<Str, FontId>,
    handles: AHashMap<(Str, u32), FontHandle>,
    faces: AHashMap<(Str, bool, bool), FaceMatch>,
    rasterizers: AHashMap<fontdb::ID, fontdue::Font>,
    glyphs: LruCache<GlyphKey, RgbImage, ahash::RandomState>,
}

impl SystemFonts {
    /// Creates a provider with all fonts installed on the system.
    pub fn new() -> Self {
        let mut fonts = Self::empty();
        fonts.db.load_system_fonts();
        log::info!("Loaded {} system font faces", fonts.db.len());
        fonts
    }

    /// Creates a provider without any fonts.
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            default_family: "sans-serif".into(),
            ids: AHashMap::new(),
            handles: AHashMap::new(),
            faces: AHashMap::new(),
            rasterizers: AHashMap::new(),
            glyphs: LruCache::with_hasher(GLYPH_CACHE_CAPACITY, ahash::RandomState::new()),
        }
    }

    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
        self.invalidate();
    }

    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.db
            .load_font_file(path)
            .with_context(|| format!("failed to load font file '{}'", path.display()))?;
        log::info!("Loaded font file '{}'", path.display());
        self.invalidate();
        Ok(())
    }

    /// Sets the family used for unknown family names.
    pub fn set_default_family(&mut self, family: impl Into<String>) {
        self.default_family = Str::from(family.into());
        self.invalidate();
    }

    // New faces may change which family a name resolves to.
    fn invalidate(&mut self) {
        self.handles.clear();
        self.faces.clear();
    }

    fn resolve_family(&self, family: &str) -> Str {
        let families = [family_of(family)];
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        if self.db.query(&query).is_some() {
            family.into()
        } else {
            log::debug!(
                "No font family '{}'; using '{}'",
                family,
                self.default_family
            );
            self.default_family.clone()
        }
    }

    fn face_for(&mut self, font: &FontHandle) -> Result<FaceMatch, GlyphError> {
        let key = (Str::from(font.family()), font.is_bold(), font.is_italic());
        match self.faces.entry(key) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let families = [family_of(font.family()), Family::SansSerif];
                let query = Query {
                    families: &families,
                    weight: if font.is_bold() {
                        Weight::BOLD
                    } else {
                        Weight::NORMAL
                    },
                    stretch: Stretch::Normal,
                    style: if font.is_italic() {
                        Style::Italic
                    } else {
                        Style::Normal
                    },
                };
                let id = self
                    .db
                    .query(&query)
                    .ok_or_else(|| GlyphError::MissingFont(font.family().to_owned()))?;
                let info = self
                    .db
                    .face(id)
                    .ok_or_else(|| GlyphError::MissingFont(font.family().to_owned()))?;

                let face = FaceMatch {
                    id,
                    synthetic_bold: font.is_bold() && info.weight.0 < Weight::SEMIBOLD.0,
                    synthetic_italic: font.is_italic() && info.style == Style::Normal,
                };
                Ok(*entry.insert(face))
            }
        }
    }
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::new()
    }
}

impl FontProvider for SystemFonts {
    fn get_font(&mut self, family: &str, size: u32) -> FontHandle {
        let resolved = self.resolve_family(family);
        let next_id = FontId::new(self.ids.len() as u32);
        let id = *self.ids.entry(resolved.clone()).or_insert(next_id);
        self.handles
            .entry((resolved.clone(), size))
            .or_insert_with(|| FontHandle::new(id, &resolved, size))
            .clone()
    }

    fn render_glyph(
        &mut self,
        font: &FontHandle,
        c: char,
        paint: &GlyphPaint,
    ) -> Result<RgbImage, GlyphError> {
        let face = self.face_for(font)?;
        let key = GlyphKey {
            face: face.id,
            c,
            size: font.size(),
            synthetic_bold: face.synthetic_bold,
            synthetic_italic: face.synthetic_italic,
            anti_alias: paint.anti_alias,
            foreground: to_pixel(paint.foreground).0,
            background: to_pixel(paint.background).0,
        };
        if let Some(glyph) = self.glyphs.get(&key) {
            return Ok(glyph.clone());
        }

        let rasterizer = rasterizer(&mut self.rasterizers, &self.db, face.id, font.family())?;
        if !c.is_whitespace() && rasterizer.lookup_glyph_index(c) == 0 {
            return Err(GlyphError::Unrenderable(c));
        }
        let glyph = rasterize(rasterizer, c, font.size() as f32, face, paint);

        self.glyphs.put(key, glyph.clone());
        Ok(glyph)
    }
}

fn family_of(name: &str) -> Family {
    match name.to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

fn rasterizer<'a>(
    rasterizers: &'a mut AHashMap<fontdb::ID, fontdue::Font>,
    db: &Database,
    id: fontdb::ID,
    family: &str,
) -> Result<&'a fontdue::Font, GlyphError> {
    match rasterizers.entry(id) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let font = db
                .with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data.to_vec(),
                        fontdue::FontSettings {
                            collection_index: index,
                            ..Default::default()
                        },
                    )
                })
                .ok_or_else(|| GlyphError::MissingFont(family.to_owned()))?
                .map_err(|reason| GlyphError::MalformedFont {
                    family: family.to_owned(),
                    reason,
                })?;
            log::info!("Loaded font '{}'", family);
            Ok(entry.insert(font))
        }
    }
}

/// Draws `c` into a cell as wide as its advance and as tall as the font's line.
fn rasterize(
    font: &fontdue::Font,
    c: char,
    size: f32,
    face: FaceMatch,
    paint: &GlyphPaint,
) -> RgbImage {
    let (ascent, descent) = font
        .horizontal_line_metrics(size)
        .map(|line| (line.ascent, line.descent))
        .unwrap_or((size, 0.));
    let (metrics, coverage) = font.rasterize(c, size);

    let height = (ascent - descent).ceil().max(1.) as u32;
    let embolden = u32::from(face.synthetic_bold);
    let slant = if face.synthetic_italic {
        (height as f32 * ITALIC_SLANT).ceil() as u32
    } else {
        0
    };
    let advance = (metrics.advance_width.ceil() as u32).max(metrics.width as u32);
    let width = (advance + embolden + slant).max(1);

    let mut bitmap = RgbImage::from_pixel(width, height, to_pixel(paint.background));
    let fg = to_pixel(paint.foreground);

    let baseline = ascent.round() as i32;
    let top = baseline - metrics.ymin - metrics.height as i32;
    for gy in 0..metrics.height {
        let y = top + gy as i32;
        if y < 0 || y >= height as i32 {
            continue;
        }
        let shear = if face.synthetic_italic {
            ((height as i32 - y) as f32 * ITALIC_SLANT) as i32
        } else {
            0
        };
        for gx in 0..metrics.width {
            let mut alpha = coverage[gy * metrics.width + gx];
            if !paint.anti_alias {
                alpha = if alpha >= 128 { u8::MAX } else { 0 };
            }
            if alpha == 0 {
                continue;
            }
            for dx in 0..=embolden as i32 {
                let x = metrics.xmin + gx as i32 + shear + dx;
                if x >= 0 && x < width as i32 {
                    let pixel = bitmap.get_pixel_mut(x as u32, y as u32);
                    *pixel = blend(*pixel, fg, alpha);
                }
            }
        }
    }

    bitmap
}

fn blend(under: Rgb<u8>, over: Rgb<u8>, alpha: u8) -> Rgb<u8> {
    let a = alpha as u32;
    let mix = |u: u8, o: u8| ((u as u32 * (255 - a) + o as u32 * a + 127) / 255) as u8;
    Rgb([
        mix(under[0], over[0]),
        mix(under[1], over[1]),
        mix(under[2], over[2]),
    ])
}
