//! Drawable texture regions.

use crate::backend::{GpuBackend, GpuContext, TextureHandle};
use crate::error::Error;
use crate::primitives::{Rect, UvRect};

/// Anything a batch can draw: a texture plus the region of it to sample.
pub trait TextureSlice {
    /// The texture sampled; its handle is the batching identity.
    fn texture(&self) -> Texture;

    /// Width of the source region in pixels.
    fn width(&self) -> f32;

    /// Height of the source region in pixels.
    fn height(&self) -> f32;

    /// Normalized UV extremes of the source region.
    fn uv_slice(&self) -> UvRect;
}

/// A GPU-resident image and its pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub const fn new(handle: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    /// Upload RGBA8 pixels through the back-end and wrap the result.
    pub fn upload<B: GpuBackend>(
        ctx: &GpuContext<B>,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Self, Error> {
        let handle = ctx.with(|gpu| gpu.create_texture(width, height, rgba))?;
        Ok(Self::new(handle, width, height))
    }

    /// A sprite covering `region` (pixels) of this texture.
    pub fn sprite(self, region: Rect) -> Sprite {
        Sprite::new(self, region)
    }
}

impl TextureSlice for Texture {
    fn texture(&self) -> Texture {
        *self
    }

    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn uv_slice(&self) -> UvRect {
        UvRect::FULL
    }
}

/// A single texture with a pixel rectangle slice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub texture: Texture,
    pub region: Rect,
}

impl Sprite {
    pub const fn new(texture: Texture, region: Rect) -> Self {
        Self { texture, region }
    }

    /// A sprite covering the whole texture.
    pub fn full(texture: Texture) -> Self {
        Self::new(
            texture,
            Rect::from_xywh(0.0, 0.0, texture.width as f32, texture.height as f32),
        )
    }
}

impl TextureSlice for Sprite {
    fn texture(&self) -> Texture {
        self.texture
    }

    fn width(&self) -> f32 {
        self.region.width()
    }

    fn height(&self) -> f32 {
        self.region.height()
    }

    fn uv_slice(&self) -> UvRect {
        let inv_w = 1.0 / self.texture.width as f32;
        let inv_h = 1.0 / self.texture.height as f32;

        UvRect::new(
            [self.region.min[0] * inv_w, self.region.min[1] * inv_h],
            [self.region.max[0] * inv_w, self.region.max[1] * inv_h],
        )
    }
}

impl<T: TextureSlice + ?Sized> TextureSlice for &T {
    fn texture(&self) -> Texture {
        (**self).texture()
    }

    fn width(&self) -> f32 {
        (**self).width()
    }

    fn height(&self) -> f32 {
        (**self).height()
    }

    fn uv_slice(&self) -> UvRect {
        (**self).uv_slice()
    }
}
