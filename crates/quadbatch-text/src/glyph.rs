use glam::Vec2;
use quadbatch::Rect;

/// Vertical placement data of a glyph. Which variant a glyph carries depends on
/// the source that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlyphMetrics {
    /// Ink extent above and below the baseline, y down (ascent is usually negative).
    Vertical { ascent: f32, descent: f32 },
    /// Ink bounding box relative to the baseline origin, y down.
    Bounds { min: Vec2, max: Vec2 },
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self::Vertical {
            ascent: 0.0,
            descent: 0.0,
        }
    }
}

/// One character's region in the atlas plus its placement metrics.
///
/// The default glyph has an empty rectangle and zero advance. It is what a
/// lookup of a character missing from the atlas returns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    /// Pixel rectangle of the glyph inside the atlas texture.
    pub rect: Rect,
    /// Horizontal distance to the next glyph's origin.
    pub advance: f32,
    pub metrics: GlyphMetrics,
}

impl Glyph {
    pub fn new(rect: Rect, advance: f32, metrics: GlyphMetrics) -> Self {
        Self {
            rect,
            advance,
            metrics,
        }
    }

    /// Offset from the pen position to the bottom edge of the glyph's quad.
    pub fn vertical_offset(&self) -> f32 {
        match self.metrics {
            GlyphMetrics::Vertical { descent, .. } => descent,
            GlyphMetrics::Bounds { max, .. } => -self.rect.height() + max.y,
        }
    }
}
