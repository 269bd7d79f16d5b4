//! Turning strings into glyph placements.

use glam::Vec2;
use quadbatch::{Color, GpuBackend, Rect, Sprite, SpriteBatch, Texture, Transform2D};

use crate::atlas::GlyphAtlas;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Extra pixels added after every glyph.
    pub letter_spacing: f32,
    pub kerning: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            letter_spacing: 0.0,
            kerning: true,
        }
    }
}

impl LayoutOptions {
    pub fn with_letter_spacing(mut self, spacing: f32) -> Self {
        self.letter_spacing = spacing;
        self
    }

    pub fn with_kerning(mut self, kerning: bool) -> Self {
        self.kerning = kerning;
        self
    }
}

/// Placed glyphs of one string.
///
/// Positions are relative to the layout origin and mark the bottom-left corner
/// of each glyph's quad.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub positions: Vec<Vec2>,
    /// Atlas pixel region of each glyph.
    pub regions: Vec<Rect>,
    /// Tallest glyph region in the string.
    pub line_height: f32,
    /// Pen position after the last glyph.
    pub cursor: Vec2,
    pub texture: Texture,
}

impl TextLayout {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn glyphs(&self) -> impl Iterator<Item = (Vec2, Rect)> + '_ {
        self.positions.iter().copied().zip(self.regions.iter().copied())
    }

    /// Draw every glyph as a sprite, scaled uniformly by `scale` and moved to
    /// `position`.
    pub fn draw_sprites<B: GpuBackend>(
        &self,
        batch: &mut SpriteBatch<B>,
        position: Vec2,
        scale: f32,
        color: Color,
    ) {
        let bottom_left = Vec2::new(0.0, 1.0);
        for (offset, region) in self.glyphs() {
            let transform = Transform2D::new(offset * scale + position, 0.0, Vec2::splat(scale));
            let sprite = Sprite::new(self.texture, region);
            batch.draw_color(&sprite, bottom_left, &transform, color);
        }
    }
}

/// Lay out `message` on one line, left to right from the origin.
///
/// Kerning shifts a glyph and everything after it: the pair offset is added
/// both to the glyph's position and to the pen advance.
pub fn layout_text(atlas: &GlyphAtlas, message: &str, options: &LayoutOptions) -> TextLayout {
    let count = message.chars().count();
    let mut positions = Vec::with_capacity(count);
    let mut regions = Vec::with_capacity(count);
    let mut line_height = 0.0f32;
    let mut cursor = Vec2::ZERO;
    let mut previous: Option<char> = None;

    for ch in message.chars() {
        let glyph = atlas.glyph(ch);

        let offset_x = match previous {
            Some(prev) if options.kerning => atlas.kern(prev, ch),
            _ => 0.0,
        };
        let offset_y = glyph.vertical_offset();

        positions.push(cursor + Vec2::new(offset_x, offset_y));
        regions.push(glyph.rect);
        line_height = line_height.max(glyph.rect.height());

        cursor.x += glyph.advance + offset_x + options.letter_spacing;
        previous = Some(ch);
    }

    TextLayout {
        positions,
        regions,
        line_height,
        cursor,
        texture: atlas.texture(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::glyph::{Glyph, GlyphMetrics};
    use crate::kerning::KerningTable;
    use quadbatch::{BatchConfig, GpuContext, RecordingBackend, TextureHandle};

    fn glyph(x: f32, width: f32, height: f32, advance: f32, descent: f32) -> Glyph {
        Glyph::new(
            Rect::from_xywh(x, 0.0, width, height),
            advance,
            GlyphMetrics::Vertical {
                ascent: -height,
                descent,
            },
        )
    }

    fn atlas() -> GlyphAtlas {
        let glyphs = HashMap::from([
            ('A', glyph(0.0, 9.0, 12.0, 10.0, 0.0)),
            ('B', glyph(16.0, 7.0, 14.0, 8.0, 2.0)),
        ]);
        let kerning = KerningTable::new().with_pair('A', 'B', -2.0);
        GlyphAtlas::new(
            "AB",
            glyphs,
            Texture::new(TextureHandle(9), 64, 16),
            Box::new(kerning),
        )
    }

    #[test]
    fn test_kerned_pair() {
        let layout = atlas().layout("AB", &LayoutOptions::default());

        assert_eq!(layout.positions[0].x, 0.0);
        assert_eq!(layout.positions[1].x, 8.0);
        // Advance of A (10) and B (8), plus the pair offset on the way in.
        assert_eq!(layout.cursor.x, 16.0);
    }

    #[test]
    fn test_kerning_can_be_disabled() {
        let options = LayoutOptions::default().with_kerning(false);
        let layout = atlas().layout("AB", &options);

        assert_eq!(layout.positions[1].x, 10.0);
        assert_eq!(layout.cursor.x, 18.0);
    }

    #[test]
    fn test_letter_spacing_and_vertical_offset() {
        let options = LayoutOptions::default().with_letter_spacing(3.0);
        let layout = atlas().layout("BA", &options);

        assert_eq!(layout.positions[0], Vec2::new(0.0, 2.0));
        assert_eq!(layout.positions[1], Vec2::new(11.0, 0.0));
        assert_eq!(layout.line_height, 14.0);
        assert_eq!(layout.regions[0], Rect::from_xywh(16.0, 0.0, 7.0, 14.0));
    }

    #[test]
    fn test_unknown_characters_take_no_space() {
        let layout = atlas().layout("A?A", &LayoutOptions::default());

        assert_eq!(layout.len(), 3);
        assert!(layout.regions[1].is_empty());
        assert_eq!(layout.positions[2].x, 10.0);
    }

    #[test]
    fn test_empty_message() {
        let layout = atlas().layout("", &LayoutOptions::default());
        assert!(layout.is_empty());
        assert_eq!(layout.line_height, 0.0);
        assert_eq!(layout.texture.handle, TextureHandle(9));
    }

    #[test]
    fn test_draw_sprites_one_quad_per_glyph() {
        let ctx = GpuContext::new(RecordingBackend::new());
        let mut batch = SpriteBatch::new(ctx.clone(), &BatchConfig::default()).unwrap();
        let layout = atlas().layout("ABBA", &LayoutOptions::default());

        batch.begin();
        layout.draw_sprites(&mut batch, Vec2::new(100.0, 100.0), 2.0, Color::WHITE);
        batch.end();

        let backend = ctx.borrow();
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.draws()[0].index_count, 4 * 6);
        assert_eq!(backend.draws()[0].texture, Some(TextureHandle(9)));
    }
}
