//! The GPU back-end contract consumed by the batches.
//!
//! Batches never talk to a graphics API directly. They issue the small set of
//! calls below against whatever implements [`GpuBackend`] (see `quadbatch-wgpu`
//! for the real one and [`crate::RecordingBackend`] for a headless one).
//!
//! The contract mirrors a classic bind-then-draw GL style API: uniform setters
//! apply to the program activated by [`GpuBackend::use_program`], and
//! [`GpuBackend::draw_indexed`] draws with whatever buffers, texture and blend
//! function are currently bound.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::error::Error;

/// Opaque buffer object handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Opaque GPU texture handle. Doubles as the texture's identity for batching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque shader program handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times (the quad index pattern).
    Static,
    /// Rewritten every flush (the vertex scratch data).
    Dynamic,
}

/// The shader programs the batches need. Compilation is the back-end's concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Sprite,
    NineSlice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    One,
    SrcColor,
    OneMinusSrcAlpha,
}

/// Source/destination blend factors, applied to color and alpha alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexType {
    Uint16,
}

/// Uniform names shared between the batches and the shaders.
pub mod uniforms {
    /// Half viewport size (`vec2`), maps pixel space straight to clip space.
    pub const PROJECTION: &str = "projection";
    /// Texture unit of the sampled texture (`int`).
    pub const SAMPLER: &str = "sampler";
    /// Nine-slice relative border (`vec2`), fixed per sprite.
    pub const BORDER: &str = "border";
    /// Nine-slice border to target size ratio (`vec2`).
    pub const DIMENSION: &str = "dimension";
}

/// Everything the batches need from a graphics API.
pub trait GpuBackend {
    fn create_buffer(&mut self, kind: BufferKind) -> BufferHandle;

    /// Replace the whole buffer store with `bytes`.
    fn upload_buffer(&mut self, buffer: BufferHandle, bytes: &[u8], usage: BufferUsage);

    /// Overwrite `bytes.len()` bytes of an already allocated store starting at `offset`.
    fn upload_sub_buffer(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]);

    /// Make `buffer` the current vertex or index source (by its kind).
    fn bind_buffer(&mut self, buffer: BufferHandle);

    /// Upload tightly packed RGBA8 pixels as a new texture.
    fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8])
        -> Result<TextureHandle, Error>;

    fn bind_texture(&mut self, texture: TextureHandle);

    fn create_program(&mut self, kind: ProgramKind) -> ProgramHandle;

    fn use_program(&mut self, program: ProgramHandle);

    fn set_uniform_vec2(&mut self, name: &str, value: [f32; 2]);

    fn set_uniform_mat4(&mut self, name: &str, value: [[f32; 4]; 4]);

    fn set_uniform_int(&mut self, name: &str, value: i32);

    fn enable_blend(&mut self);

    fn blend_func(&mut self, func: BlendFunc);

    fn draw_indexed(
        &mut self,
        primitive: Primitive,
        index_count: u32,
        index_type: IndexType,
        offset: u32,
    );
}

/// Shared handle to the back-end, injected into every batch constructor.
///
/// Rendering is single threaded and frame lock-stepped, so a plain
/// `Rc<RefCell<_>>` is all the sharing the batches need.
pub struct GpuContext<B> {
    inner: Rc<RefCell<B>>,
}

impl<B: GpuBackend> GpuContext<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Rc::new(RefCell::new(backend)),
        }
    }

    /// Run `f` with exclusive access to the back-end.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub fn borrow(&self) -> Ref<'_, B> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, B> {
        self.inner.borrow_mut()
    }
}

impl<B> Clone for GpuContext<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
