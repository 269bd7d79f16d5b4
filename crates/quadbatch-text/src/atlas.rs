//! The immutable glyph atlas.

use std::collections::HashMap;

use quadbatch::{Rect, Texture};

use crate::error::AtlasError;
use crate::glyph::{Glyph, GlyphMetrics};
use crate::kerning::{Kerning, NoKerning};
use crate::layout::{layout_text, LayoutOptions, TextLayout};

/// Printable ASCII, space through tilde.
pub const CHARSET_ASCII: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Row packing parameters of the vector-font path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Characters per atlas row used to size the texture.
    pub chars_per_line: usize,
    /// Pixels of empty space between glyphs and rows.
    pub padding: u32,
    /// Which vertical metrics packed glyphs carry.
    pub metrics: MetricsMode,
}

impl AtlasConfig {
    pub fn with_metrics(mut self, metrics: MetricsMode) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            chars_per_line: 20,
            padding: 5,
            metrics: MetricsMode::default(),
        }
    }
}

/// Selects the [`GlyphMetrics`] variant the builder records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MetricsMode {
    /// Ascent and descent only. Glyphs sit on their descent.
    #[default]
    Vertical,
    /// The rounded ink box. Glyphs sit at `max.y - rect height`.
    Bounds,
}

/// Cell layout of a monospaced bitmap font texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapGrid {
    /// Cell width and height in pixels.
    pub cell: [u32; 2],
    pub chars_per_line: u32,
}

impl BitmapGrid {
    pub const fn new(cell_width: u32, cell_height: u32, chars_per_line: u32) -> Self {
        Self {
            cell: [cell_width, cell_height],
            chars_per_line,
        }
    }
}

/// A character set packed into one texture, with per-glyph metrics and the
/// kerning source of its font. Read-only once built.
pub struct GlyphAtlas {
    charset: String,
    glyphs: HashMap<char, Glyph>,
    texture: Texture,
    kerning: Box<dyn Kerning>,
}

impl GlyphAtlas {
    pub fn new(
        charset: impl Into<String>,
        glyphs: HashMap<char, Glyph>,
        texture: Texture,
        kerning: Box<dyn Kerning>,
    ) -> Self {
        Self {
            charset: charset.into(),
            glyphs,
            texture,
            kerning,
        }
    }

    /// Atlas over a texture that already holds a grid of equally sized cells,
    /// one per character in `charset` order, left to right then top to bottom.
    pub fn from_bitmap(
        texture: Texture,
        charset: &str,
        grid: BitmapGrid,
    ) -> Result<Self, AtlasError> {
        let [cell_width, cell_height] = grid.cell;
        let count = charset.chars().count() as u32;

        if count == 0 {
            return Err(AtlasError::EmptyCharset);
        }
        if cell_width == 0 || cell_height == 0 {
            return Err(AtlasError::EmptyCell {
                width: cell_width,
                height: cell_height,
            });
        }
        if grid.chars_per_line == 0 {
            return Err(AtlasError::ZeroCharsPerLine);
        }

        let columns = count.min(grid.chars_per_line);
        let rows = count.div_ceil(grid.chars_per_line);
        if columns * cell_width > texture.width || rows * cell_height > texture.height {
            return Err(AtlasError::GridExceedsTexture {
                columns,
                rows,
                cell_width,
                cell_height,
                texture_width: texture.width,
                texture_height: texture.height,
            });
        }

        let glyphs = charset
            .chars()
            .enumerate()
            .map(|(index, ch)| {
                let index = index as u32;
                let x = (index % grid.chars_per_line) * cell_width;
                let y = (index / grid.chars_per_line) * cell_height;
                let rect = Rect::from_xywh(
                    x as f32,
                    y as f32,
                    cell_width as f32,
                    cell_height as f32,
                );
                let glyph = Glyph::new(rect, cell_width as f32, GlyphMetrics::default());
                (ch, glyph)
            })
            .collect();

        Ok(Self::new(charset, glyphs, texture, Box::new(NoKerning)))
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn texture(&self) -> Texture {
        self.texture
    }

    /// The glyph of `ch`, or the empty default glyph if the atlas lacks it.
    pub fn glyph(&self, ch: char) -> Glyph {
        self.glyphs.get(&ch).copied().unwrap_or_default()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    pub fn glyphs(&self) -> &HashMap<char, Glyph> {
        &self.glyphs
    }

    pub fn kern(&self, left: char, right: char) -> f32 {
        self.kerning.kern(left, right)
    }

    /// Lay out `message` with this atlas. See [`layout_text`].
    pub fn layout(&self, message: &str, options: &LayoutOptions) -> TextLayout {
        layout_text(self, message, options)
    }
}

impl std::fmt::Debug for GlyphAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphAtlas")
            .field("charset", &self.charset)
            .field("glyphs", &self.glyphs.len())
            .field("texture", &self.texture)
            .finish_non_exhaustive()
    }
}
