//! WGPU rendering backend for quadbatch.
//!
//! [`WgpuBackend`] implements the bind-then-draw [`GpuBackend`] contract on top
//! of wgpu. Bound state (buffers, texture, program, blend function) is tracked
//! on the CPU; each `draw_indexed` records one render pass into the current
//! frame target and submits it, so draws land on screen in call order.

mod vertex;

pub use vertex::*;

use std::collections::HashMap;

use quadbatch::{
    check_texture_data, uniforms, BlendFactor, BlendFunc, BufferHandle, BufferKind, BufferUsage,
    Color, GpuBackend, IndexType, Primitive, ProgramHandle, ProgramKind, TextureHandle,
};
use wgpu::util::DeviceExt;

/// CPU copy of the uniform block both shaders declare.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    projection: [f32; 2],
    border: [f32; 2],
}

struct GpuBuffer {
    kind: BufferKind,
    /// Allocated on the first full upload.
    buffer: Option<wgpu::Buffer>,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct Program {
    kind: ProgramKind,
    shader: wgpu::ShaderModule,
    uniforms: Uniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    dirty: bool,
}

type PipelineKey = (ProgramKind, Option<BlendFunc>);

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    buffers: Vec<GpuBuffer>,
    textures: Vec<GpuTexture>,
    programs: Vec<Program>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    texture: Option<TextureHandle>,
    program: Option<ProgramHandle>,
    blend_enabled: bool,
    blend: BlendFunc,

    frame: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("QuadBatch Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("QuadBatch Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("QuadBatch Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("QuadBatch Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            target_format,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            sampler,
            buffers: Vec::new(),
            textures: Vec::new(),
            programs: Vec::new(),
            pipelines: HashMap::new(),
            vertex_buffer: None,
            index_buffer: None,
            texture: None,
            program: None,
            blend_enabled: false,
            blend: BlendFunc::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
            frame: None,
        }
    }

    /// Direct subsequent draws at `view`, usually the current surface texture.
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice, replacing the previous target");
        }
        self.frame = Some(view);
    }

    /// Release the frame target. Draws without a target are dropped.
    pub fn end_frame(&mut self) {
        self.frame = None;
    }

    /// Clear the frame target to `color`.
    pub fn clear(&mut self, color: Color) {
        let Some(view) = &self.frame else {
            log::warn!("clear without a frame target");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("QuadBatch Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("QuadBatch Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn current_program_mut(&mut self) -> Option<&mut Program> {
        let handle = self.program?;
        self.programs.get_mut(handle.0 as usize)
    }

    /// Build the pipeline for a program and blend state on first use.
    fn ensure_pipeline(&mut self, program: usize, blend: Option<BlendFunc>) {
        let kind = self.programs[program].kind;
        if self.pipelines.contains_key(&(kind, blend)) {
            return;
        }

        log::debug!("Creating {kind:?} pipeline with blend {blend:?}");
        let pipeline = self.create_pipeline(&self.programs[program], blend);
        self.pipelines.insert((kind, blend), pipeline);
    }

    fn create_pipeline(&self, program: &Program, blend: Option<BlendFunc>) -> wgpu::RenderPipeline {
        let (attributes, stride) = program_vertex_layout(program.kind);

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("QuadBatch Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: blend.map(blend_state),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

/// Same factors for color and alpha, added.
pub fn blend_state(func: BlendFunc) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(func.src),
        dst_factor: blend_factor(func.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn shader_source(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Sprite => include_str!("shaders/sprite.wgsl"),
        ProgramKind::NineSlice => include_str!("shaders/nine_slice.wgsl"),
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, kind: BufferKind) -> BufferHandle {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer { kind, buffer: None });
        handle
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, bytes: &[u8], usage: BufferUsage) {
        let Some(slot) = self.buffers.get_mut(buffer.0 as usize) else {
            log::warn!("upload to unknown buffer {buffer:?}");
            return;
        };

        let kind_usage = match slot.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let label = match slot.kind {
            BufferKind::Vertex => "QuadBatch Vertex Buffer",
            BufferKind::Index => "QuadBatch Index Buffer",
        };
        log::trace!("Allocating {} bytes for {buffer:?} ({usage:?})", bytes.len());

        slot.buffer = Some(
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytes,
                    usage: kind_usage | wgpu::BufferUsages::COPY_DST,
                }),
        );
    }

    fn upload_sub_buffer(&mut self, buffer: BufferHandle, offset: usize, bytes: &[u8]) {
        match self
            .buffers
            .get(buffer.0 as usize)
            .and_then(|slot| slot.buffer.as_ref())
        {
            Some(gpu_buffer) => {
                self.queue
                    .write_buffer(gpu_buffer, offset as wgpu::BufferAddress, bytes);
            }
            None => log::warn!("sub upload to unallocated buffer {buffer:?}"),
        }
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.get(buffer.0 as usize).map(|slot| slot.kind) {
            Some(BufferKind::Vertex) => self.vertex_buffer = Some(buffer),
            Some(BufferKind::Index) => self.index_buffer = Some(buffer),
            None => log::warn!("bind of unknown buffer {buffer:?}"),
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureHandle, quadbatch::Error> {
        check_texture_data(width, height, rgba)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("QuadBatch Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("QuadBatch Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            _texture: texture,
            bind_group,
        });
        log::debug!("Created {width}x{height} texture {handle:?}");
        Ok(handle)
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }

    fn create_program(&mut self, kind: ProgramKind) -> ProgramHandle {
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match kind {
                    ProgramKind::Sprite => "QuadBatch Sprite Shader",
                    ProgramKind::NineSlice => "QuadBatch Nine-Slice Shader",
                }),
                source: wgpu::ShaderSource::Wgsl(shader_source(kind).into()),
            });

        let uniforms = Uniforms::default();
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("QuadBatch Uniform Buffer"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("QuadBatch Uniform Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let handle = ProgramHandle(self.programs.len() as u32);
        log::info!("✓ {kind:?} program created ({handle:?})");
        self.programs.push(Program {
            kind,
            shader,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            dirty: false,
        });
        handle
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if program.0 as usize >= self.programs.len() {
            log::warn!("use of unknown program {program:?}");
            return;
        }
        self.program = Some(program);
    }

    fn set_uniform_vec2(&mut self, name: &str, value: [f32; 2]) {
        let Some(program) = self.current_program_mut() else {
            log::warn!("uniform {name} set without a program in use");
            return;
        };
        match name {
            uniforms::PROJECTION => program.uniforms.projection = value,
            uniforms::BORDER => program.uniforms.border = value,
            // Carried per vertex by this backend.
            uniforms::DIMENSION => return,
            _ => {
                log::warn!("unknown vec2 uniform {name}");
                return;
            }
        }
        program.dirty = true;
    }

    fn set_uniform_mat4(&mut self, name: &str, _value: [[f32; 4]; 4]) {
        log::warn!("mat4 uniform {name} is not supported by the wgpu backend");
    }

    fn set_uniform_int(&mut self, name: &str, value: i32) {
        // Every texture bind group carries its own sampler on unit 0.
        if name != uniforms::SAMPLER || value != 0 {
            log::warn!("int uniform {name} = {value} ignored");
        }
    }

    fn enable_blend(&mut self) {
        self.blend_enabled = true;
    }

    fn blend_func(&mut self, func: BlendFunc) {
        self.blend = func;
    }

    fn draw_indexed(
        &mut self,
        primitive: Primitive,
        index_count: u32,
        index_type: IndexType,
        offset: u32,
    ) {
        let Primitive::Triangles = primitive;
        let IndexType::Uint16 = index_type;

        if self.frame.is_none() {
            log::warn!("draw of {index_count} indices without a frame target, dropped");
            return;
        }
        let (Some(program), Some(vertex), Some(index), Some(texture)) = (
            self.program,
            self.vertex_buffer,
            self.index_buffer,
            self.texture,
        ) else {
            log::warn!("draw with incomplete bindings, dropped");
            return;
        };
        let program = program.0 as usize;

        {
            let program = &mut self.programs[program];
            if program.dirty {
                self.queue.write_buffer(
                    &program.uniform_buffer,
                    0,
                    bytemuck::bytes_of(&program.uniforms),
                );
                program.dirty = false;
            }
        }

        let blend = self.blend_enabled.then_some(self.blend);
        self.ensure_pipeline(program, blend);

        let (Some(vertex_buffer), Some(index_buffer)) = (
            self.buffers[vertex.0 as usize].buffer.as_ref(),
            self.buffers[index.0 as usize].buffer.as_ref(),
        ) else {
            log::warn!("draw from unallocated buffers, dropped");
            return;
        };
        let Some(texture) = self.textures.get(texture.0 as usize) else {
            log::warn!("draw with unknown texture {texture:?}, dropped");
            return;
        };
        let Some(view) = &self.frame else {
            return;
        };
        let program = &self.programs[program];
        let pipeline = &self.pipelines[&(program.kind, blend)];

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("QuadBatch Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("QuadBatch Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &program.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(offset..offset + index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadbatch::{NINE_SLICE_BLEND, SPRITE_BLEND};

    #[test]
    fn test_sprite_blend_state() {
        let state = blend_state(SPRITE_BLEND);
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::Src);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(state.alpha, state.color);
    }

    #[test]
    fn test_nine_slice_blend_is_premultiplied() {
        assert_eq!(
            blend_state(NINE_SLICE_BLEND),
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING
        );
    }

    #[test]
    fn test_uniform_block_size() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 16);
    }

    #[test]
    fn test_shaders_declare_entry_points() {
        for kind in [ProgramKind::Sprite, ProgramKind::NineSlice] {
            let source = shader_source(kind);
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("projection: vec2<f32>"));
        }
    }
}
