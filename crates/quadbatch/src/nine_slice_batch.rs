//! Stretchable UI panels.

use glam::Vec2;

use crate::backend::{BlendFactor, BlendFunc, GpuBackend, GpuContext, ProgramKind};
use crate::batch::{BatchStats, QuadBatch};
use crate::color::Color;
use crate::config::BatchConfig;
use crate::corners::quad_corners;
use crate::error::Error;
use crate::nine_slice::NineSliceSprite;
use crate::primitives::{Rect, Transform2D};
use crate::texture::TextureSlice;
use crate::vertex::NineSliceVertex;

/// Blend equation of the nine-slice program (premultiplied alpha).
pub const NINE_SLICE_BLEND: BlendFunc =
    BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha);

/// Slice flags of the four emitted vertices.
const SLICE_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Batches axis-aligned nine-slice panels in zoomed UI space.
///
/// Draw calls break whenever the sprite changes, even between sprites that
/// share a texture, because the relative border is a per-draw uniform.
pub struct NineSliceBatch<B> {
    quads: QuadBatch<NineSliceVertex, NineSliceSprite, B>,
    viewport: [f32; 2],
    ui_zoom: f32,
}

impl<B: GpuBackend> NineSliceBatch<B> {
    pub fn new(ctx: GpuContext<B>, config: &BatchConfig) -> Result<Self, Error> {
        let quads = QuadBatch::new(ctx, ProgramKind::NineSlice, NINE_SLICE_BLEND, config)?;

        let mut batch = Self {
            quads,
            viewport: config.viewport,
            ui_zoom: config.ui_zoom,
        };
        batch.update_projection();
        Ok(batch)
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = [width, height];
        self.update_projection();
    }

    pub fn set_ui_zoom(&mut self, zoom: f32) {
        self.ui_zoom = zoom;
        self.update_projection();
    }

    pub fn ui_zoom(&self) -> f32 {
        self.ui_zoom
    }

    fn update_projection(&mut self) {
        let [width, height] = self.viewport;
        self.quads
            .set_projection([width / self.ui_zoom, height / self.ui_zoom]);
    }

    /// Convert a window pixel position into UI space.
    pub fn screen_to_ui(&self, screen: Vec2) -> Vec2 {
        screen * 2.0 / self.ui_zoom
    }

    /// Size of the window in UI units.
    pub fn ui_size(&self) -> Vec2 {
        self.screen_to_ui(Vec2::from(self.viewport))
    }

    /// Open the bracket. The sprite must be set again before the first draw.
    pub fn begin(&mut self) {
        self.quads.begin();
    }

    pub fn end(&mut self) {
        self.quads.end();
    }

    /// Use `sprite` for the following draws.
    pub fn set_sprite(&mut self, sprite: &NineSliceSprite) {
        self.quads.rebind(sprite);
    }

    /// Draw the current sprite stretched over `rect` (UI units).
    pub fn draw(&mut self, rect: Rect, color: Color) {
        assert!(self.quads.is_drawing(), "Begin must be called first");
        let Some(sprite) = self.quads.bound().copied() else {
            panic!("set_sprite must be called before draw");
        };
        if rect.is_empty() {
            log::trace!("Skipping empty nine-slice rect {rect:?}");
            return;
        }

        let size = rect.size();
        let transform = Transform2D::from_position(Vec2::from(rect.min));
        let corners = quad_corners(size, Vec2::ZERO, &transform).emission_order();

        let uv = sprite.uv_slice();
        let uv_rect = [uv.min[0], uv.min[1], uv.max[0], uv.max[1]];
        let dimension = sprite.dimension(size).into();
        let tint = color.to_tint();

        let quad = std::array::from_fn(|i| NineSliceVertex {
            pos: corners[i].into(),
            uv_rect,
            slice: SLICE_CORNERS[i],
            dimension,
            tint,
        });
        self.quads.push(quad);
    }

    pub fn is_drawing(&self) -> bool {
        self.quads.is_drawing()
    }

    pub fn stats(&self) -> BatchStats {
        self.quads.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{uniforms, TextureHandle};
    use crate::recording::{GpuCommand, RecordingBackend};
    use crate::texture::{Sprite, Texture};
    use crate::vertex::QuadVertex;

    fn setup() -> (NineSliceBatch<RecordingBackend>, GpuContext<RecordingBackend>) {
        let ctx = GpuContext::new(RecordingBackend::new());
        let config = BatchConfig::default()
            .with_viewport(800.0, 600.0)
            .with_ui_zoom(2.0);
        let batch = NineSliceBatch::new(ctx.clone(), &config).unwrap();
        ctx.borrow_mut().clear();
        (batch, ctx)
    }

    fn panel(texture: u32) -> NineSliceSprite {
        let texture = Texture::new(TextureHandle(texture), 32, 32);
        NineSliceSprite::new(Sprite::full(texture), Vec2::splat(8.0)).unwrap()
    }

    fn vertices(bytes: &[u8], count: usize) -> Vec<NineSliceVertex> {
        let stride = NineSliceVertex::STRIDE;
        (0..count)
            .map(|i| bytemuck::pod_read_unaligned(&bytes[i * stride..(i + 1) * stride]))
            .collect()
    }

    #[test]
    fn test_begin_uses_premultiplied_blend_and_zoomed_projection() {
        let (mut batch, ctx) = setup();
        batch.begin();

        let commands = ctx.borrow().commands().to_vec();
        assert!(commands.contains(&GpuCommand::BlendFunc(NINE_SLICE_BLEND)));
        assert!(commands.contains(&GpuCommand::UniformVec2(
            uniforms::PROJECTION.to_owned(),
            [400.0, 300.0]
        )));
    }

    #[test]
    fn test_draw_writes_slice_vertices() {
        let (mut batch, ctx) = setup();
        let sprite = panel(1);

        batch.begin();
        batch.set_sprite(&sprite);
        batch.draw(Rect::from_xywh(10.0, 20.0, 80.0, 40.0), Color::WHITE);
        batch.end();

        let backend = ctx.borrow();
        let quad = vertices(&backend.draws()[0].vertex_bytes, 4);

        let positions: Vec<_> = quad.iter().map(|v| v.pos).collect();
        assert_eq!(
            positions,
            vec![[10.0, 20.0], [90.0, 20.0], [90.0, 60.0], [10.0, 60.0]]
        );

        let slices: Vec<_> = quad.iter().map(|v| v.slice).collect();
        assert_eq!(slices, SLICE_CORNERS.to_vec());

        for vertex in &quad {
            assert_eq!(vertex.uv_rect, [0.0, 0.0, 1.0, 1.0]);
            assert_eq!(vertex.dimension, [0.1, 0.2]);
            assert_eq!(vertex.tint.to_bits(), Color::WHITE.to_tint().to_bits());
        }
    }

    #[test]
    fn test_flush_binds_texture_and_border() {
        let (mut batch, ctx) = setup();
        let sprite = panel(4);

        batch.begin();
        batch.set_sprite(&sprite);
        batch.draw(Rect::from_xywh(0.0, 0.0, 64.0, 64.0), Color::WHITE);
        batch.end();

        let commands = ctx.borrow().commands().to_vec();
        let bind = commands
            .iter()
            .position(|c| *c == GpuCommand::BindTexture(TextureHandle(4)))
            .expect("texture bound");
        assert_eq!(
            commands[bind + 1],
            GpuCommand::UniformVec2(uniforms::BORDER.to_owned(), [0.25, 0.25])
        );
    }

    #[test]
    fn test_sprite_change_breaks_batch_even_on_same_texture() {
        let (mut batch, ctx) = setup();
        let a = panel(1);
        let b = panel(1);
        let rect = Rect::from_xywh(0.0, 0.0, 50.0, 50.0);

        batch.begin();
        batch.set_sprite(&a);
        batch.draw(rect, Color::WHITE);
        batch.draw(rect, Color::WHITE);
        batch.set_sprite(&a);
        batch.draw(rect, Color::WHITE);
        batch.set_sprite(&b);
        batch.draw(rect, Color::WHITE);
        batch.end();

        let counts: Vec<_> = ctx.borrow().draws().iter().map(|d| d.index_count).collect();
        assert_eq!(counts, vec![18, 6]);
        assert_eq!(batch.stats(), BatchStats { draw_calls: 2, quads: 4 });
    }

    #[test]
    fn test_empty_rects_are_skipped() {
        let (mut batch, ctx) = setup();
        batch.begin();
        batch.set_sprite(&panel(1));
        batch.draw(Rect::from_xywh(10.0, 10.0, 0.0, 40.0), Color::WHITE);
        batch.draw(Rect::from_xywh(10.0, 10.0, 40.0, 0.0), Color::WHITE);
        batch.draw(Rect::new([20.0, 20.0], [10.0, 30.0]), Color::WHITE);
        batch.draw(Rect::from_xywh(0.0, 0.0, 50.0, 50.0), Color::WHITE);
        batch.end();

        let counts: Vec<_> = ctx.borrow().draws().iter().map(|d| d.index_count).collect();
        assert_eq!(counts, vec![6]);
        assert_eq!(batch.stats(), BatchStats { draw_calls: 1, quads: 1 });
    }

    #[test]
    fn test_screen_to_ui() {
        let (mut batch, _ctx) = setup();
        assert_eq!(batch.screen_to_ui(Vec2::new(100.0, 50.0)), Vec2::new(100.0, 50.0));
        assert_eq!(batch.ui_size(), Vec2::new(800.0, 600.0));

        batch.set_ui_zoom(4.0);
        assert_eq!(batch.screen_to_ui(Vec2::new(100.0, 50.0)), Vec2::new(50.0, 25.0));
    }

    #[test]
    #[should_panic(expected = "set_sprite must be called before draw")]
    fn test_draw_without_sprite_panics() {
        let (mut batch, _ctx) = setup();
        batch.begin();
        batch.draw(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), Color::WHITE);
    }

    #[test]
    #[should_panic(expected = "set_sprite must be called before draw")]
    fn test_begin_forgets_previous_sprite() {
        let (mut batch, _ctx) = setup();
        let sprite = panel(1);

        batch.begin();
        batch.set_sprite(&sprite);
        batch.end();

        batch.begin();
        batch.draw(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), Color::WHITE);
    }

    #[test]
    #[should_panic(expected = "Begin must be called first")]
    fn test_draw_after_end_panics() {
        let (mut batch, _ctx) = setup();
        batch.draw(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), Color::WHITE);
    }
}
