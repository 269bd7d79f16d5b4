//! `cosmic-text` implementation of [`GlyphRasterizer`].
//!
//! Glyphs are shaped one at a time, rasterized through swash and blended into
//! the atlas canvas as white coverage. Pair kerning is measured by shaping every
//! character pair of the atlas and comparing against the single advances.

use std::collections::HashMap;

use cosmic_text::{
    Attrs, Buffer, Family, FontSystem, LayoutGlyph, Metrics, Shaping, SwashCache, SwashContent,
    SwashImage,
};
use glam::Vec2;
use image::{Pixel, Rgba, RgbaImage};

use crate::builder::{GlyphBounds, GlyphRasterizer, LineMetrics};
use crate::kerning::{Kerning, KerningTable};

/// Line height over font size when the font does not say otherwise.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

pub struct CosmicRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
    metrics: Metrics,
}

impl CosmicRasterizer {
    /// Rasterize with whatever fonts `font_system` knows, at `font_px` pixels.
    pub fn new(font_system: FontSystem, font_px: f32) -> Self {
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            family: None,
            metrics: Metrics::new(font_px, font_px * LINE_HEIGHT_FACTOR),
        }
    }

    /// Use the fonts installed on the system.
    pub fn with_system_fonts(font_px: f32) -> Self {
        Self::new(FontSystem::new(), font_px)
    }

    /// Load one font file (TTF/OTF bytes) and prefer its family.
    pub fn from_font_data(data: Vec<u8>, font_px: f32) -> Self {
        let mut font_system = FontSystem::new();
        font_system.db_mut().load_font_data(data);

        let family = font_system
            .db()
            .faces()
            .last()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone());

        let mut rasterizer = Self::new(font_system, font_px);
        rasterizer.family = family;
        rasterizer
    }

    /// Prefer the font family called `name`.
    pub fn with_family(mut self, name: impl Into<String>) -> Self {
        self.family = Some(name.into());
        self
    }

    pub fn font_system_mut(&mut self) -> &mut FontSystem {
        &mut self.font_system
    }

    fn shape(&mut self, text: &str) -> Buffer {
        let mut buffer = Buffer::new(&mut self.font_system, self.metrics);
        buffer.set_size(
            &mut self.font_system,
            Some(f32::MAX),
            Some(self.metrics.line_height),
        );

        let attrs = match &self.family {
            Some(name) => Attrs::new().family(Family::Name(name)),
            None => Attrs::new(),
        };
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// The single shaped glyph for `ch`, `None` if the font maps it to notdef.
    fn layout_glyph(&mut self, ch: char) -> Option<LayoutGlyph> {
        let buffer = self.shape(&ch.to_string());
        let glyph = buffer.layout_runs().next()?.glyphs.first()?.clone();
        (glyph.glyph_id != 0).then_some(glyph)
    }

    /// Swash image of a glyph and the integer offset of its bitmap box from
    /// the baseline origin.
    fn glyph_image(&mut self, glyph: &LayoutGlyph) -> Option<(SwashImage, [i32; 2])> {
        let physical = glyph.physical((0.0, 0.0), 1.0);
        let image = self
            .swash_cache
            .get_image(&mut self.font_system, physical.cache_key)
            .clone()?;

        let origin = [
            physical.x + image.placement.left,
            physical.y - image.placement.top,
        ];
        Some((image, origin))
    }
}

impl GlyphRasterizer for CosmicRasterizer {
    fn line_metrics(&mut self) -> LineMetrics {
        let buffer = self.shape("Ag");
        match buffer.layout_runs().next() {
            Some(run) => LineMetrics {
                ascent: run.line_y - run.line_top,
                line_height: run.line_height,
            },
            None => LineMetrics {
                ascent: self.metrics.font_size,
                line_height: self.metrics.line_height,
            },
        }
    }

    fn measure(&mut self, text: &str) -> f32 {
        let buffer = self.shape(text);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }

    fn glyph_bounds(&mut self, ch: char) -> Option<GlyphBounds> {
        let glyph = self.layout_glyph(ch)?;
        let advance = glyph.w;

        let (min, max) = match self.glyph_image(&glyph) {
            Some((image, [x, y])) => {
                let min = Vec2::new(x as f32, y as f32);
                let size = Vec2::new(image.placement.width as f32, image.placement.height as f32);
                (min, min + size)
            }
            // Whitespace has an advance but no ink.
            None => (Vec2::ZERO, Vec2::ZERO),
        };

        Some(GlyphBounds { min, max, advance })
    }

    fn rasterize(&mut self, ch: char, dot: Vec2, canvas: &mut RgbaImage) {
        let Some(glyph) = self.layout_glyph(ch) else {
            return;
        };
        let Some((image, [x, y])) = self.glyph_image(&glyph) else {
            return;
        };

        let origin_x = dot.x.floor() as i32 + x;
        let origin_y = dot.y.floor() as i32 + y;
        let width = image.placement.width as usize;

        let mut blend = |off_x: usize, off_y: usize, color: Rgba<u8>| {
            let px = origin_x + off_x as i32;
            let py = origin_y + off_y as i32;
            if px < 0 || py < 0 || px as u32 >= canvas.width() || py as u32 >= canvas.height() {
                return;
            }
            canvas.get_pixel_mut(px as u32, py as u32).blend(&color);
        };

        match image.content {
            SwashContent::Mask => {
                for (i, &alpha) in image.data.iter().enumerate() {
                    blend(i % width, i / width, Rgba([255, 255, 255, alpha]));
                }
            }
            SwashContent::Color => {
                for (i, pixel) in image.data.chunks_exact(4).enumerate() {
                    let &[r, g, b, a] = pixel else {
                        continue;
                    };
                    blend(i % width, i / width, Rgba([r, g, b, a]));
                }
            }
            SwashContent::SubpixelMask => {
                log::debug!("Subpixel mask for {ch:?} is not supported, glyph left blank");
            }
        }
    }

    fn kerning(&mut self, charset: &str) -> Box<dyn Kerning> {
        let chars: Vec<char> = charset.chars().collect();
        let advances: HashMap<char, f32> = chars
            .iter()
            .map(|&ch| (ch, self.measure(&ch.to_string())))
            .collect();

        let mut table = KerningTable::new();
        for &left in &chars {
            for &right in &chars {
                let pair: String = [left, right].iter().collect();
                let kern = (self.measure(&pair) - advances[&left] - advances[&right]).round();
                if kern != 0.0 {
                    table.insert(left, right, kern);
                }
            }
        }

        log::debug!("Measured {} kerning pairs", table.len());
        Box::new(table)
    }
}
