//! Nine-slice sprites and the UV remap their shader performs.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;

use crate::backend::{uniforms, GpuBackend};
use crate::batch::BatchResource;
use crate::error::Error;
use crate::primitives::UvRect;
use crate::texture::{Sprite, Texture, TextureSlice};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A sprite whose border stays unscaled while its center and edges stretch.
///
/// Clones share the identity of the original, so they batch together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NineSliceSprite {
    id: u64,
    sprite: Sprite,
    border_px: Vec2,
    relative_border: Vec2,
}

impl NineSliceSprite {
    /// `border_px` is the border width (x) and height (y) in pixels of the source.
    ///
    /// The sprite region must have a positive width and height.
    pub fn new(sprite: Sprite, border_px: Vec2) -> Result<Self, Error> {
        let size = sprite.region.size();
        if sprite.region.is_empty() {
            return Err(Error::EmptyRegion {
                width: size.x,
                height: size.y,
            });
        }
        Ok(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            sprite,
            border_px,
            relative_border: border_px / size,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn border_px(&self) -> Vec2 {
        self.border_px
    }

    /// Border over source size. Fixed for the sprite's lifetime.
    pub fn relative_border(&self) -> Vec2 {
        self.relative_border
    }

    /// Border over the size it is rendered at. Changes with every draw size.
    pub fn dimension(&self, target_size: Vec2) -> Vec2 {
        self.border_px / target_size
    }
}

impl TextureSlice for NineSliceSprite {
    fn texture(&self) -> Texture {
        self.sprite.texture
    }

    fn width(&self) -> f32 {
        self.sprite.width()
    }

    fn height(&self) -> f32 {
        self.sprite.height()
    }

    fn uv_slice(&self) -> UvRect {
        self.sprite.uv_slice()
    }
}

impl BatchResource for NineSliceSprite {
    fn same_resource(&self, other: &Self) -> bool {
        self.id == other.id
    }

    fn bind<B: GpuBackend>(&self, gpu: &mut B) {
        gpu.bind_texture(self.sprite.texture.handle);
        gpu.set_uniform_vec2(uniforms::BORDER, self.relative_border.into());
    }
}

/// Remap one local coordinate `c` in `[0, 1]` of a stretched quad to the
/// matching coordinate of its source.
///
/// `texture_border` is the border as a fraction of the source, `target_border`
/// the border as a fraction of the rendered quad.
pub fn process_axis(c: f32, texture_border: f32, target_border: f32) -> f32 {
    let (tb, wb) = (texture_border, target_border);

    if c < wb {
        map(c, 0.0, wb, 0.0, tb)
    } else if c < 1.0 - wb {
        map(c, wb, 1.0 - wb, tb, 1.0 - tb)
    } else {
        map(c, 1.0 - wb, 1.0, 1.0 - tb, 1.0)
    }
}

fn map(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

/// Per-axis [`process_axis`], then placed inside the sprite's UV rectangle.
pub fn remap_uv(local: Vec2, uv_rect: UvRect, relative_border: Vec2, dimension: Vec2) -> Vec2 {
    let slice = Vec2::new(
        process_axis(local.x, relative_border.x, dimension.x),
        process_axis(local.y, relative_border.y, dimension.y),
    );
    let min = Vec2::from(uv_rect.min);
    let max = Vec2::from(uv_rect.max);
    min + (max - min) * slice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureHandle;
    use crate::primitives::Rect;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn panel() -> NineSliceSprite {
        let texture = Texture::new(TextureHandle(1), 64, 64);
        NineSliceSprite::new(Sprite::full(texture), Vec2::new(8.0, 16.0)).unwrap()
    }

    #[test]
    fn test_process_axis() {
        assert!(close(process_axis(0.1, 0.1, 0.2), 0.05));
        assert!(close(process_axis(0.5, 0.1, 0.2), 0.5));
        // [0.8, 1] maps onto [0.9, 1].
        assert!(close(process_axis(0.95, 0.1, 0.2), 0.975));
    }

    #[test]
    fn test_process_axis_endpoints() {
        for (tb, wb) in [(0.1, 0.2), (0.25, 0.05), (0.3, 0.3)] {
            assert!(close(process_axis(0.0, tb, wb), 0.0));
            assert!(close(process_axis(1.0, tb, wb), 1.0));
            assert!(close(process_axis(wb, tb, wb), tb));
        }
    }

    #[test]
    fn test_remap_uv_inside_sub_rect() {
        let uv = UvRect::new([0.5, 0.0], [1.0, 0.5]);
        let remapped = remap_uv(Vec2::new(0.5, 1.0), uv, Vec2::splat(0.1), Vec2::splat(0.2));
        assert!(close(remapped.x, 0.75));
        assert!(close(remapped.y, 0.5));
    }

    #[test]
    fn test_relative_border_and_dimension() {
        let sprite = panel();
        assert_eq!(sprite.relative_border(), Vec2::new(0.125, 0.25));
        assert_eq!(sprite.dimension(Vec2::new(80.0, 32.0)), Vec2::new(0.1, 0.5));
    }

    #[test]
    fn test_relative_border_uses_region_size() {
        let texture = Texture::new(TextureHandle(1), 128, 128);
        let sprite = texture.sprite(Rect::from_xywh(64.0, 0.0, 32.0, 32.0));
        let panel = NineSliceSprite::new(sprite, Vec2::splat(4.0)).unwrap();
        assert_eq!(panel.relative_border(), Vec2::splat(0.125));
    }

    #[test]
    fn test_empty_region_is_rejected() {
        let texture = Texture::new(TextureHandle(1), 64, 64);
        let flat = texture.sprite(Rect::from_xywh(0.0, 0.0, 16.0, 0.0));

        let result = NineSliceSprite::new(flat, Vec2::splat(4.0));
        assert_eq!(
            result,
            Err(Error::EmptyRegion {
                width: 16.0,
                height: 0.0
            })
        );
    }

    #[test]
    fn test_identity() {
        let a = panel();
        let b = panel();
        let a2 = a;

        assert!(a.same_resource(&a2));
        assert!(!a.same_resource(&b));
        assert_ne!(a.id(), b.id());
    }
}
