//! Streaming row packer for vector fonts.
//!
//! Glyphs are placed left to right in character set order and wrap to a new
//! row when the next one would cross the right edge. All glyphs of a font share
//! one row height, so this is enough; there is no general 2D bin packing.

use std::collections::HashMap;

use glam::Vec2;
use image::RgbaImage;
use quadbatch::{GpuBackend, GpuContext, Rect, Texture};

use crate::atlas::{AtlasConfig, GlyphAtlas, MetricsMode};
use crate::error::AtlasError;
use crate::glyph::{Glyph, GlyphMetrics};
use crate::kerning::Kerning;

/// Font-wide vertical metrics in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    /// Baseline distance from the top of a line.
    pub ascent: f32,
    /// Distance between consecutive baselines.
    pub line_height: f32,
}

/// Ink box and advance of one glyph, relative to its baseline origin (y down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphBounds {
    pub min: Vec2,
    pub max: Vec2,
    pub advance: f32,
}

/// What the packer needs from a font.
pub trait GlyphRasterizer {
    fn line_metrics(&mut self) -> LineMetrics;

    /// Pixel width of `text` set on one line.
    fn measure(&mut self, text: &str) -> f32;

    /// `None` if the font cannot produce `ch`. Such characters are left out of
    /// the atlas.
    fn glyph_bounds(&mut self, ch: char) -> Option<GlyphBounds>;

    /// Draw `ch` with its baseline origin at `dot` into `canvas`.
    fn rasterize(&mut self, ch: char, dot: Vec2, canvas: &mut RgbaImage);

    /// Pair kerning for the characters of `charset`.
    fn kerning(&mut self, charset: &str) -> Box<dyn Kerning>;
}

/// Packed glyphs and their pixels, before the texture upload.
pub struct PackedAtlas {
    pub charset: String,
    pub glyphs: HashMap<char, Glyph>,
    pub image: RgbaImage,
    pub kerning: Box<dyn Kerning>,
}

impl PackedAtlas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Upload the canvas as the atlas texture.
    pub fn upload<B: GpuBackend>(self, ctx: &GpuContext<B>) -> Result<GlyphAtlas, AtlasError> {
        let (width, height) = self.image.dimensions();
        let texture = Texture::upload(ctx, width, height, self.image.as_raw())?;
        Ok(GlyphAtlas::new(self.charset, self.glyphs, texture, self.kerning))
    }
}

/// The pen walking across the atlas rows.
#[derive(Clone, Copy, Debug)]
struct Pen {
    dot: Vec2,
    width: f32,
    line_height: f32,
    padding: f32,
}

impl Pen {
    /// Wrap to the next row if `advance` no longer fits on this one.
    fn wrap_if_needed(&mut self, advance: f32) -> bool {
        if self.dot.x.ceil() + advance.ceil() > self.width {
            self.dot = Vec2::new(0.0, self.dot.y.ceil() + self.line_height + self.padding);
            return true;
        }
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphAtlasBuilder {
    config: AtlasConfig,
}

impl GlyphAtlasBuilder {
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Rasterize and pack every character of `charset`.
    pub fn pack(
        &self,
        rasterizer: &mut impl GlyphRasterizer,
        charset: &str,
    ) -> Result<PackedAtlas, AtlasError> {
        let chars: Vec<char> = charset.chars().collect();
        if chars.is_empty() {
            return Err(AtlasError::EmptyCharset);
        }
        let per_line = self.config.chars_per_line;
        if per_line == 0 {
            return Err(AtlasError::ZeroCharsPerLine);
        }

        let padding = self.config.padding;
        let metrics = rasterizer.line_metrics();
        let line_height = metrics.line_height.ceil();
        let ascent = metrics.ascent.round();
        let (width, height) = self.atlas_size(rasterizer, &chars, metrics);

        log::debug!("Packing {} glyphs into a {width}x{height} atlas", chars.len());

        let mut canvas = RgbaImage::new(width, height);
        let mut glyphs = HashMap::with_capacity(chars.len());
        let mut pen = Pen {
            dot: Vec2::new(0.0, ascent),
            width: width as f32,
            line_height,
            padding: padding as f32,
        };

        for &ch in &chars {
            pen.dot.x += padding as f32;

            let bounds = rasterizer.glyph_bounds(ch);
            let advance = bounds.map_or(0.0, |b| b.advance);
            let mut rect = match bounds {
                Some(b) => ink_rect(pen.dot, b),
                None => Rect::from_min_size(pen.dot.round().into(), [0.0, 0.0]),
            };

            if pen.wrap_if_needed(advance) {
                rect = rect.with_min([0.0, rect.y() + line_height + padding as f32]);
            }

            let Some(bounds) = bounds else {
                log::debug!("Skipping unsupported glyph {ch:?}");
                continue;
            };

            let glyph_metrics = match self.config.metrics {
                MetricsMode::Vertical => GlyphMetrics::Vertical {
                    ascent: bounds.min.y.round(),
                    descent: bounds.max.y.round(),
                },
                MetricsMode::Bounds => GlyphMetrics::Bounds {
                    min: bounds.min.round(),
                    max: bounds.max.round(),
                },
            };
            glyphs.insert(ch, Glyph::new(rect, bounds.advance.round(), glyph_metrics));

            rasterizer.rasterize(ch, pen.dot, &mut canvas);
            pen.dot.x += advance;
        }

        Ok(PackedAtlas {
            charset: charset.to_owned(),
            glyphs,
            image: canvas,
            kerning: rasterizer.kerning(charset),
        })
    }

    /// [`Self::pack`] followed by [`PackedAtlas::upload`].
    pub fn build<B: GpuBackend>(
        &self,
        ctx: &GpuContext<B>,
        rasterizer: &mut impl GlyphRasterizer,
        charset: &str,
    ) -> Result<GlyphAtlas, AtlasError> {
        self.pack(rasterizer, charset)?.upload(ctx)
    }

    /// Width from the widest full row plus per-glyph padding, height from the
    /// row count.
    fn atlas_size(
        &self,
        rasterizer: &mut impl GlyphRasterizer,
        chars: &[char],
        metrics: LineMetrics,
    ) -> (u32, u32) {
        let per_line = self.config.chars_per_line;
        let padding = self.config.padding;
        let lines = chars.len().div_ceil(per_line) as u32;

        let first: String = chars[..per_line.min(chars.len())].iter().collect();
        let mut width = rasterizer.measure(&first).ceil() as u32 + padding * per_line as u32;
        let height = lines * metrics.line_height.ceil() as u32
            + metrics.ascent.round() as u32
            + padding * lines
            + padding;

        // The last row is usually partial, it never sets the width.
        for row in chars.chunks(per_line).take(lines as usize - 1) {
            let text: String = row.iter().collect();
            let row_width = rasterizer.measure(&text).ceil() as u32;
            width = width.max(row_width);
        }

        (width.max(1), height.max(1))
    }
}

fn ink_rect(dot: Vec2, bounds: GlyphBounds) -> Rect {
    let min = (dot + bounds.min).round();
    let max = (dot + bounds.max).round();
    Rect::new(min.into(), max.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kerning::KerningTable;
    use quadbatch::RecordingBackend;

    /// Every glyph is an 8x10 box with a fixed advance.
    struct BoxFont {
        advance: f32,
        missing: Vec<char>,
    }

    impl BoxFont {
        fn new(advance: f32) -> Self {
            Self {
                advance,
                missing: Vec::new(),
            }
        }
    }

    impl GlyphRasterizer for BoxFont {
        fn line_metrics(&mut self) -> LineMetrics {
            LineMetrics {
                ascent: 10.0,
                line_height: 12.0,
            }
        }

        fn measure(&mut self, text: &str) -> f32 {
            text.chars().count() as f32 * self.advance
        }

        fn glyph_bounds(&mut self, ch: char) -> Option<GlyphBounds> {
            if self.missing.contains(&ch) {
                return None;
            }
            Some(GlyphBounds {
                min: Vec2::new(0.0, -8.0),
                max: Vec2::new(8.0, 2.0),
                advance: self.advance,
            })
        }

        fn rasterize(&mut self, _ch: char, dot: Vec2, canvas: &mut RgbaImage) {
            let x0 = dot.x as u32;
            let y0 = (dot.y - 8.0) as u32;
            for y in y0..(y0 + 10).min(canvas.height()) {
                for x in x0..(x0 + 8).min(canvas.width()) {
                    canvas.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
                }
            }
        }

        fn kerning(&mut self, _charset: &str) -> Box<dyn Kerning> {
            Box::new(KerningTable::new().with_pair('A', 'B', -2.0))
        }
    }

    fn charset(count: usize) -> String {
        ('A'..).take(count).collect()
    }

    #[test]
    fn test_atlas_size() {
        let packed = GlyphAtlasBuilder::default()
            .pack(&mut BoxFont::new(10.0), &charset(25))
            .unwrap();

        // 20 glyphs of 10px plus 5px padding each.
        assert_eq!(packed.width(), 300);
        // Two rows of 12px, ascent 10, padding per row and once more.
        assert_eq!(packed.height(), 2 * 12 + 10 + 2 * 5 + 5);
    }

    #[test]
    fn test_row_wrap() {
        let chars = charset(25);
        let packed = GlyphAtlasBuilder::default()
            .pack(&mut BoxFont::new(10.0), &chars)
            .unwrap();

        let glyph = |i: usize| packed.glyphs[&chars.chars().nth(i).unwrap()];
        let (first, wrapped) = (glyph(0), glyph(20));

        assert_eq!(wrapped.rect.y(), first.rect.y() + 12.0 + 5.0);
        assert_eq!(wrapped.rect.x(), 0.0);
        assert_eq!(wrapped.rect.size(), first.rect.size());

        // Glyphs on the first row are spaced by advance plus padding.
        assert_eq!(glyph(1).rect.x() - first.rect.x(), 15.0);
        assert_eq!(glyph(19).rect.y(), first.rect.y());
    }

    #[test]
    fn test_glyph_metrics_are_recorded() {
        let packed = GlyphAtlasBuilder::default()
            .pack(&mut BoxFont::new(10.0), "AB")
            .unwrap();

        let a = packed.glyphs[&'A'];
        assert_eq!(a.rect, Rect::new([5.0, 2.0], [13.0, 12.0]));
        assert_eq!(a.advance, 10.0);
        assert_eq!(
            a.metrics,
            GlyphMetrics::Vertical {
                ascent: -8.0,
                descent: 2.0
            }
        );
        assert_eq!(packed.kerning.kern('A', 'B'), -2.0);
    }

    #[test]
    fn test_bounds_metrics_are_recorded() {
        let config = AtlasConfig::default().with_metrics(MetricsMode::Bounds);
        let packed = GlyphAtlasBuilder::new(config)
            .pack(&mut BoxFont::new(10.0), "AB")
            .unwrap();

        let a = packed.glyphs[&'A'];
        assert_eq!(
            a.metrics,
            GlyphMetrics::Bounds {
                min: Vec2::new(0.0, -8.0),
                max: Vec2::new(8.0, 2.0)
            }
        );
        // Ink box is 10px tall and reaches 2px below the baseline.
        assert_eq!(a.vertical_offset(), -10.0 + 2.0);
    }

    #[test]
    fn test_bounds_metrics_offset_layout() {
        let ctx = GpuContext::new(RecordingBackend::new());
        let config = AtlasConfig::default().with_metrics(MetricsMode::Bounds);
        let atlas = GlyphAtlasBuilder::new(config)
            .build(&ctx, &mut BoxFont::new(10.0), "AB")
            .unwrap();

        let layout = atlas.layout("AB", &Default::default());
        assert_eq!(layout.positions[0], Vec2::new(0.0, -8.0));
        assert_eq!(layout.positions[1], Vec2::new(8.0, -8.0));

        let vertical = GlyphAtlasBuilder::default()
            .build(&ctx, &mut BoxFont::new(10.0), "AB")
            .unwrap();
        assert_eq!(vertical.layout("AB", &Default::default()).positions[0].y, 2.0);
    }

    #[test]
    fn test_unsupported_glyphs_are_skipped() {
        let mut font = BoxFont::new(10.0);
        font.missing.push('B');

        let packed = GlyphAtlasBuilder::default().pack(&mut font, "ABC").unwrap();
        assert!(packed.glyphs.contains_key(&'A'));
        assert!(!packed.glyphs.contains_key(&'B'));

        // The skipped glyph only consumed its padding.
        assert_eq!(packed.glyphs[&'C'].rect.x() - packed.glyphs[&'A'].rect.x(), 20.0);
    }

    #[test]
    fn test_rasterized_pixels_land_in_canvas() {
        let packed = GlyphAtlasBuilder::default()
            .pack(&mut BoxFont::new(10.0), "A")
            .unwrap();
        let rect = packed.glyphs[&'A'].rect;

        let inside = packed.image.get_pixel(rect.x() as u32, rect.y() as u32);
        assert_eq!(inside.0, [255, 255, 255, 255]);
        assert_eq!(packed.image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_charset_is_rejected() {
        let result = GlyphAtlasBuilder::default().pack(&mut BoxFont::new(10.0), "");
        assert!(matches!(result, Err(AtlasError::EmptyCharset)));
    }

    #[test]
    fn test_build_uploads_texture() {
        let ctx = GpuContext::new(RecordingBackend::new());
        let atlas = GlyphAtlasBuilder::default()
            .build(&ctx, &mut BoxFont::new(10.0), "AB")
            .unwrap();

        assert_eq!(atlas.texture().width, 2 * 10 + 5 * 20);
        assert_eq!(atlas.charset(), "AB");
        assert_eq!(atlas.kern('A', 'B'), -2.0);
    }
}
