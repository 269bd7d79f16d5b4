//! Textured, rotatable quads.

use glam::Vec2;

use crate::backend::{BlendFactor, BlendFunc, GpuBackend, GpuContext, ProgramKind};
use crate::batch::{BatchResource, BatchStats, QuadBatch};
use crate::color::{pack_tint, Color};
use crate::config::BatchConfig;
use crate::corners::quad_corners;
use crate::error::Error;
use crate::primitives::Transform2D;
use crate::texture::{Texture, TextureSlice};
use crate::vertex::SpriteVertex;

/// Blend equation of the sprite program.
pub const SPRITE_BLEND: BlendFunc =
    BlendFunc::new(BlendFactor::SrcColor, BlendFactor::OneMinusSrcAlpha);

impl BatchResource for Texture {
    fn same_resource(&self, other: &Self) -> bool {
        self.handle == other.handle
    }

    fn bind<B: GpuBackend>(&self, gpu: &mut B) {
        gpu.bind_texture(self.handle);
    }
}

/// Batches sprites drawn from any [`TextureSlice`], breaking on texture changes.
pub struct SpriteBatch<B> {
    quads: QuadBatch<SpriteVertex, Texture, B>,
}

impl<B: GpuBackend> SpriteBatch<B> {
    pub fn new(ctx: GpuContext<B>, config: &BatchConfig) -> Result<Self, Error> {
        let mut quads = QuadBatch::new(ctx, ProgramKind::Sprite, SPRITE_BLEND, config)?;
        quads.set_projection(sprite_projection(config.viewport));
        Ok(Self { quads })
    }

    /// Track a resized render target.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.quads.set_projection(sprite_projection([width, height]));
    }

    pub fn begin(&mut self) {
        self.quads.begin();
    }

    pub fn end(&mut self) {
        self.quads.end();
    }

    /// Draw `tile` with its `origin` (fractions of its size) placed at
    /// `transform.position`, tinted by a `0xRRGGBB` color and `alpha`.
    pub fn draw(
        &mut self,
        tile: &impl TextureSlice,
        origin: Vec2,
        transform: &Transform2D,
        tint: u32,
        alpha: f32,
    ) {
        let texture = tile.texture();
        let size = Vec2::new(tile.width(), tile.height());
        let uv = tile.uv_slice();
        let tint = pack_tint(tint, alpha);

        let [p1, p4, p3, p2] = quad_corners(size, origin, transform).emission_order();
        let (u, v) = (uv.min[0], uv.min[1]);
        let (u2, v2) = (uv.max[0], uv.max[1]);

        let quad = [
            SpriteVertex::new(p1.into(), [u, v], tint),
            SpriteVertex::new(p4.into(), [u2, v], tint),
            SpriteVertex::new(p3.into(), [u2, v2], tint),
            SpriteVertex::new(p2.into(), [u, v2], tint),
        ];
        self.quads.append(quad, &texture);
    }

    /// [`Self::draw`] with a [`Color`] tint.
    pub fn draw_color(
        &mut self,
        tile: &impl TextureSlice,
        origin: Vec2,
        transform: &Transform2D,
        color: Color,
    ) {
        self.draw(tile, origin, transform, color.to_hex(), color.a);
    }

    pub fn is_drawing(&self) -> bool {
        self.quads.is_drawing()
    }

    pub fn stats(&self) -> BatchStats {
        self.quads.stats()
    }
}

fn sprite_projection(viewport: [f32; 2]) -> [f32; 2] {
    [viewport[0] / 2.0, viewport[1] / 2.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{uniforms, TextureHandle};
    use crate::color::unpack_tint;
    use crate::primitives::Rect;
    use crate::recording::{GpuCommand, RecordingBackend};
    use crate::vertex::QuadVertex;

    fn setup() -> (SpriteBatch<RecordingBackend>, GpuContext<RecordingBackend>) {
        let ctx = GpuContext::new(RecordingBackend::new());
        let config = BatchConfig::default().with_viewport(800.0, 600.0);
        let batch = SpriteBatch::new(ctx.clone(), &config).unwrap();
        ctx.borrow_mut().clear();
        (batch, ctx)
    }

    fn vertices(bytes: &[u8], count: usize) -> Vec<SpriteVertex> {
        (0..count)
            .map(|i| {
                let stride = SpriteVertex::STRIDE;
                bytemuck::pod_read_unaligned(&bytes[i * stride..(i + 1) * stride])
            })
            .collect()
    }

    #[test]
    fn test_begin_uses_sprite_blend_and_half_viewport() {
        let (mut batch, ctx) = setup();
        batch.begin();

        let commands = ctx.borrow().commands().to_vec();
        assert!(commands.contains(&GpuCommand::BlendFunc(BlendFunc::new(
            BlendFactor::SrcColor,
            BlendFactor::OneMinusSrcAlpha
        ))));
        assert!(commands.contains(&GpuCommand::UniformVec2(
            uniforms::PROJECTION.to_owned(),
            [400.0, 300.0]
        )));
    }

    #[test]
    fn test_draw_emits_vertices_in_corner_order() {
        let (mut batch, ctx) = setup();
        let texture = Texture::new(TextureHandle(3), 64, 64);
        let sprite = texture.sprite(Rect::from_xywh(0.0, 0.0, 32.0, 16.0));

        batch.begin();
        batch.draw(
            &sprite,
            Vec2::ZERO,
            &Transform2D::from_position(Vec2::new(10.0, 20.0)),
            0x112233,
            0.5,
        );
        batch.end();

        let backend = ctx.borrow();
        let draw = &backend.draws()[0];
        assert_eq!(draw.texture, Some(TextureHandle(3)));

        let quad = vertices(&draw.vertex_bytes, 4);
        let positions: Vec<_> = quad.iter().map(|v| v.pos).collect();
        let uvs: Vec<_> = quad.iter().map(|v| v.uv).collect();

        assert_eq!(
            positions,
            vec![[10.0, 20.0], [42.0, 20.0], [42.0, 36.0], [10.0, 36.0]]
        );
        assert_eq!(uvs, vec![[0.0, 0.0], [0.5, 0.0], [0.5, 0.25], [0.0, 0.25]]);

        let [r, g, b, a] = unpack_tint(quad[0].tint);
        assert_eq!((r, g, b), (0x11, 0x22, 0x33));
        assert!((a as f32 / 255.0 - 0.5).abs() <= 1.0 / 255.0);
    }

    #[test]
    fn test_texture_changes_break_batch() {
        let (mut batch, ctx) = setup();
        let a = Texture::new(TextureHandle(1), 8, 8);
        let b = Texture::new(TextureHandle(2), 8, 8);
        let at = Transform2D::default();
        let corner = a.sprite(Rect::from_xywh(0.0, 0.0, 4.0, 4.0));

        batch.begin();
        batch.draw(&a, Vec2::ZERO, &at, 0xFFFFFF, 1.0);
        batch.draw(&corner, Vec2::ZERO, &at, 0xFFFFFF, 1.0);
        batch.draw(&b, Vec2::ZERO, &at, 0xFFFFFF, 1.0);
        batch.end();

        let runs: Vec<_> = ctx
            .borrow()
            .draws()
            .iter()
            .map(|d| (d.texture, d.index_count))
            .collect();
        assert_eq!(
            runs,
            vec![(Some(TextureHandle(1)), 12), (Some(TextureHandle(2)), 6)]
        );
        assert_eq!(batch.stats(), BatchStats { draw_calls: 2, quads: 3 });
    }

    #[test]
    fn test_set_viewport_updates_projection() {
        let (mut batch, ctx) = setup();
        batch.set_viewport(1024.0, 768.0);
        batch.begin();

        assert!(ctx.borrow().commands().contains(&GpuCommand::UniformVec2(
            uniforms::PROJECTION.to_owned(),
            [512.0, 384.0]
        )));
    }

    #[test]
    fn test_draw_color_matches_draw() {
        let (mut batch, ctx) = setup();
        let texture = Texture::new(TextureHandle(1), 4, 4);
        let at = Transform2D::default();

        batch.begin();
        batch.draw_color(&texture, Vec2::ZERO, &at, Color::from_hex(0x336699, 0.25));
        batch.draw(&texture, Vec2::ZERO, &at, 0x336699, 0.25);
        batch.end();

        let backend = ctx.borrow();
        let quad = vertices(&backend.draws()[0].vertex_bytes, 8);
        assert_eq!(quad[0].tint.to_bits(), quad[4].tint.to_bits());
    }

    #[test]
    #[should_panic(expected = "Begin must be called first")]
    fn test_draw_before_begin_panics() {
        let (mut batch, _ctx) = setup();
        let texture = Texture::new(TextureHandle(1), 4, 4);
        batch.draw(&texture, Vec2::ZERO, &Transform2D::default(), 0xFFFFFF, 1.0);
    }
}
