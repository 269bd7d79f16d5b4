//! The capacity-bounded quad arena shared by every batch.
//!
//! A [`QuadBatch`] owns one dynamic vertex buffer, one static index buffer and a
//! CPU-side scratch copy of the vertices. Quads are appended between
//! [`QuadBatch::begin`] and [`QuadBatch::end`]; accumulated quads are drawn with
//! a single indexed draw call whenever the bound resource changes, the scratch
//! buffer fills up, or the bracket ends.

use bytemuck::Zeroable;

use crate::backend::{
    uniforms, BlendFunc, BufferHandle, BufferKind, BufferUsage, GpuBackend, GpuContext,
    IndexType, Primitive, ProgramHandle, ProgramKind,
};
use crate::config::BatchConfig;
use crate::error::Error;
use crate::vertex::QuadVertex;

/// Index pattern of one quad, offset by `4 * quad_index`.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Number of vertices written per quad.
pub const VERTICES_PER_QUAD: usize = 4;

/// Build the index list for `capacity` quads.
pub fn quad_indices(capacity: usize) -> Vec<u16> {
    (0..capacity)
        .flat_map(|quad| {
            let base = (quad * VERTICES_PER_QUAD) as u16;
            QUAD_INDICES.map(|index| base + index)
        })
        .collect()
}

/// Whatever a run of quads is drawn with: a texture, or a texture plus uniforms.
///
/// A change of resource between two appended quads splits the batch.
pub trait BatchResource: Clone {
    /// Whether `other` can share a draw call with `self`.
    fn same_resource(&self, other: &Self) -> bool;

    /// Make the resource current on the back-end, right before a draw.
    fn bind<B: GpuBackend>(&self, gpu: &mut B);
}

/// Per-frame counters, reset by `begin`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub draw_calls: usize,
    pub quads: usize,
}

pub struct QuadBatch<V, R, B> {
    ctx: GpuContext<B>,
    program: ProgramHandle,
    blend: BlendFunc,
    projection: [f32; 2],

    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    vertices: Vec<V>,

    capacity: usize,
    fill: usize,
    bound: Option<R>,
    drawing: bool,
    stats: BatchStats,
}

impl<V: QuadVertex, R: BatchResource, B: GpuBackend> QuadBatch<V, R, B> {
    /// Create the program and both buffers. The index pattern is uploaded once
    /// here and never touched again.
    pub fn new(
        ctx: GpuContext<B>,
        kind: ProgramKind,
        blend: BlendFunc,
        config: &BatchConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        let capacity = config.capacity;
        let indices = quad_indices(capacity);
        let vertices = vec![V::zeroed(); capacity * VERTICES_PER_QUAD];

        let (program, vertex_buffer, index_buffer) = ctx.with(|gpu| {
            let program = gpu.create_program(kind);

            let index_buffer = gpu.create_buffer(BufferKind::Index);
            gpu.upload_buffer(
                index_buffer,
                bytemuck::cast_slice(&indices),
                BufferUsage::Static,
            );

            let vertex_buffer = gpu.create_buffer(BufferKind::Vertex);
            gpu.upload_buffer(
                vertex_buffer,
                bytemuck::cast_slice(&vertices),
                BufferUsage::Dynamic,
            );

            (program, vertex_buffer, index_buffer)
        });

        log::debug!(
            "Created {kind:?} batch: {capacity} quads, {} byte vertex store",
            vertices.len() * V::STRIDE
        );

        Ok(Self {
            ctx,
            program,
            blend,
            projection: [1.0, 1.0],
            vertex_buffer,
            index_buffer,
            vertices,
            capacity,
            fill: 0,
            bound: None,
            drawing: false,
            stats: BatchStats::default(),
        })
    }

    /// Start a bracket: activate the program and set its blend and uniforms.
    ///
    /// Brackets of different batches must not interleave, flushes do not
    /// re-activate the program.
    pub fn begin(&mut self) {
        assert!(!self.drawing, "End must be called first");

        self.drawing = true;
        self.bound = None;
        self.stats = BatchStats::default();

        let (program, blend, projection) = (self.program, self.blend, self.projection);
        self.ctx.with(|gpu| {
            gpu.use_program(program);
            gpu.enable_blend();
            gpu.blend_func(blend);
            gpu.set_uniform_vec2(uniforms::PROJECTION, projection);
            gpu.set_uniform_int(uniforms::SAMPLER, 0);
        });
    }

    /// Draw whatever is left and close the bracket.
    pub fn end(&mut self) {
        assert!(self.drawing, "Begin must be called first");

        if self.fill > 0 {
            self.flush();
        }
        self.drawing = false;
    }

    /// Make `resource` the current one, flushing the quads drawn with the
    /// previous resource first.
    pub fn rebind(&mut self, resource: &R) {
        assert!(self.drawing, "Begin must be called first");

        let changed = match &self.bound {
            Some(bound) => !bound.same_resource(resource),
            None => true,
        };
        if !changed {
            return;
        }

        if self.fill > 0 {
            self.flush();
        }
        self.bound = Some(resource.clone());
    }

    /// Append one quad drawn with `resource`.
    pub fn append(&mut self, quad: [V; 4], resource: &R) {
        self.rebind(resource);
        self.push(quad);
    }

    /// Append one quad drawn with the currently bound resource.
    ///
    /// Panics if nothing has been bound since `begin`.
    pub fn push(&mut self, quad: [V; 4]) {
        assert!(self.drawing, "Begin must be called first");
        assert!(
            self.bound.is_some(),
            "a resource must be bound before quads are pushed"
        );

        let start = self.fill * VERTICES_PER_QUAD;
        self.vertices[start..start + VERTICES_PER_QUAD].copy_from_slice(&quad);
        self.fill += 1;
        self.stats.quads += 1;

        if self.fill == self.capacity {
            log::debug!("Batch full at {} quads, flushing early", self.capacity);
            self.flush();
        }
    }

    /// Change the projection uniform (half extents of the target in pixels).
    ///
    /// Quads already buffered are drawn with the old projection.
    pub fn set_projection(&mut self, projection: [f32; 2]) {
        if self.drawing {
            if self.fill > 0 {
                self.flush();
            }
            self.ctx
                .with(|gpu| gpu.set_uniform_vec2(uniforms::PROJECTION, projection));
        }
        self.projection = projection;
    }

    fn flush(&mut self) {
        if self.fill == 0 {
            return;
        }
        let Some(resource) = &self.bound else {
            return;
        };

        let vertex_count = self.fill * VERTICES_PER_QUAD;
        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices[..vertex_count]);
        let index_count = (self.fill * QUAD_INDICES.len()) as u32;

        log::trace!("Flushing {} quads ({index_count} indices)", self.fill);

        let (vertex_buffer, index_buffer) = (self.vertex_buffer, self.index_buffer);
        self.ctx.with(|gpu| {
            resource.bind(gpu);
            gpu.bind_buffer(vertex_buffer);
            gpu.bind_buffer(index_buffer);
            gpu.upload_sub_buffer(vertex_buffer, 0, bytes);
            gpu.draw_indexed(Primitive::Triangles, index_count, IndexType::Uint16, 0);
        });

        self.stats.draw_calls += 1;
        self.fill = 0;
    }

    pub fn fill(&self) -> usize {
        self.fill
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn bound(&self) -> Option<&R> {
        self.bound.as_ref()
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn projection(&self) -> [f32; 2] {
        self.projection
    }

    pub fn context(&self) -> &GpuContext<B> {
        &self.ctx
    }
}
