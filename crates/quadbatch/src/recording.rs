//! A headless back-end that records every call it receives.
//!
//! Useful for tests and for capturing what a frame would submit without a GPU.

use crate::backend::{
    BlendFunc, BufferHandle, BufferKind, BufferUsage, GpuBackend, IndexType, Primitive,
    ProgramHandle, ProgramKind, TextureHandle,
};
use crate::error::{check_texture_data, Error};

/// One recorded back-end call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateBuffer(BufferHandle, BufferKind),
    UploadBuffer {
        buffer: BufferHandle,
        len: usize,
        usage: BufferUsage,
    },
    UploadSubBuffer {
        buffer: BufferHandle,
        offset: usize,
        len: usize,
    },
    BindBuffer(BufferHandle),
    CreateTexture(TextureHandle, u32, u32),
    BindTexture(TextureHandle),
    CreateProgram(ProgramHandle, ProgramKind),
    UseProgram(ProgramHandle),
    UniformVec2(String, [f32; 2]),
    UniformMat4(String, [[f32; 4]; 4]),
    UniformInt(String, i32),
    EnableBlend,
    BlendFunc(BlendFunc),
    DrawIndexed {
        primitive: Primitive,
        index_count: u32,
        index_type: IndexType,
        offset: u32,
    },
}

/// A draw call together with the state it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub texture: Option<TextureHandle>,
    pub program: Option<ProgramHandle>,
    pub index_count: u32,
    /// Bytes most recently uploaded to the vertex buffer being drawn.
    pub vertex_bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<GpuCommand>,
    draws: Vec<RecordedDraw>,

    buffers: Vec<(BufferKind, Vec<u8>)>,
    next_texture: u32,
    next_program: u32,

    bound_vertex: Option<BufferHandle>,
    bound_texture: Option<TextureHandle>,
    program: Option<ProgramHandle>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Current contents of a buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> &[u8] {
        &self.buffers[buffer.0 as usize].1
    }

    /// Forget recorded commands and draws, keep the buffer contents.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.draws.clear();
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self, kind: BufferKind) -> BufferHandle {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push((kind, Vec::new()));
        self.commands.push(GpuCommand::CreateBuffer(handle, kind));
        handle
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, bytes: &[u8], usage: BufferUsage) {
        self.buffers[buffer.0 as usize].1 = bytes.to_vec();
        self.commands.push(GpuCommand::UploadBuffer {
            buffer,
            len: bytes.len(),
            usage,
        });
    }

    fn upload_sub_buffer(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) {
        let store = &mut self.buffers[buffer.0 as usize].1;
        assert!(
            offset + bytes.len() <= store.len(),
            "sub upload of {} bytes at {offset} overruns a {} byte buffer",
            bytes.len(),
            store.len()
        );
        store[offset..offset + bytes.len()].copy_from_slice(bytes);

        self.commands.push(GpuCommand::UploadSubBuffer {
            buffer,
            offset,
            len: bytes.len(),
        });
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers[buffer.0 as usize].0 == BufferKind::Vertex {
            self.bound_vertex = Some(buffer);
        }
        self.commands.push(GpuCommand::BindBuffer(buffer));
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, Error> {
        check_texture_data(width, height, rgba)?;

        self.next_texture += 1;
        let handle = TextureHandle(self.next_texture);
        self.commands
            .push(GpuCommand::CreateTexture(handle, width, height));
        Ok(handle)
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.bound_texture = Some(texture);
        self.commands.push(GpuCommand::BindTexture(texture));
    }

    fn create_program(&mut self, kind: ProgramKind) -> ProgramHandle {
        self.next_program += 1;
        let handle = ProgramHandle(self.next_program);
        self.commands.push(GpuCommand::CreateProgram(handle, kind));
        handle
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.program = Some(program);
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn set_uniform_vec2(&mut self, name: &str, value: [f32; 2]) {
        self.commands
            .push(GpuCommand::UniformVec2(name.to_owned(), value));
    }

    fn set_uniform_mat4(&mut self, name: &str, value: [[f32; 4]; 4]) {
        self.commands
            .push(GpuCommand::UniformMat4(name.to_owned(), value));
    }

    fn set_uniform_int(&mut self, name: &str, value: i32) {
        self.commands
            .push(GpuCommand::UniformInt(name.to_owned(), value));
    }

    fn enable_blend(&mut self) {
        self.commands.push(GpuCommand::EnableBlend);
    }

    fn blend_func(&mut self, func: BlendFunc) {
        self.commands.push(GpuCommand::BlendFunc(func));
    }

    fn draw_indexed(
        &mut self,
        primitive: Primitive,
        index_count: u32,
        index_type: IndexType,
        offset: u32,
    ) {
        let vertex_bytes = self
            .bound_vertex
            .map(|buffer| self.buffers[buffer.0 as usize].1.clone())
            .unwrap_or_default();

        self.draws.push(RecordedDraw {
            texture: self.bound_texture,
            program: self.program,
            index_count,
            vertex_bytes,
        });
        self.commands.push(GpuCommand::DrawIndexed {
            primitive,
            index_count,
            index_type,
            offset,
        });
    }
}
