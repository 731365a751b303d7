//! [`SpriteBackend`] implemented on wgpu.
//!
//! Passes are recorded between `begin_frame` and `end_frame` and encoded into
//! a single command buffer when the frame ends. Pipelines are created lazily
//! per `(program, pass state)` and cached.

mod mipmap;
mod pipeline;

use std::ops::Range;
use std::sync::Arc;

use tessera_core::alloc::HashMap;
use tessera_core::profiling::profile_function;
use tessera_test_utils::{
    BackendError, BufferDescriptor, BufferId, CameraUniform, ClearColor, FrameBindings,
    PassState, ProgramId, ProgramSource, ShaderStage, SpriteBackend, TextureArrayDescriptor,
    TextureArrayId,
};

use crate::context::GraphicsContext;
use crate::depth::{DEFAULT_DEPTH_FORMAT, DepthTexture};

pub use mipmap::MipmapGenerator;
pub use pipeline::{blend_state, compare_function};

use pipeline::Program;

/// Pixel format of every sprite texture array.
pub const TEXTURE_ARRAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct GpuTextureArray {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    layers: u32,
    mip_levels: u32,
}

struct RenderTarget {
    view: wgpu::TextureView,
    depth: DepthTexture,
}

#[derive(Debug, Clone)]
enum PassCommand {
    Bind(TextureArrayId),
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
}

#[derive(Debug)]
struct RecordedPass {
    state: PassState,
    commands: Vec<PassCommand>,
}

#[derive(Debug)]
struct RecordedFrame {
    bindings: FrameBindings,
    passes: Vec<RecordedPass>,
    open: bool,
}

/// wgpu implementation of [`SpriteBackend`].
///
/// Renders into the view given to [`set_target`](Self::set_target), with a
/// depth texture kept at the same size.
///
/// ```rust,no_run
/// use tessera_render::{GraphicsContext, WgpuSpriteBackend};
///
/// let context = GraphicsContext::new_owned_sync().expect("no GPU available");
/// let backend = WgpuSpriteBackend::new(context, wgpu::TextureFormat::Bgra8UnormSrgb);
/// ```
pub struct WgpuSpriteBackend {
    context: Arc<GraphicsContext>,
    target_format: wgpu::TextureFormat,
    target: Option<RenderTarget>,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    mipmaps: MipmapGenerator,

    programs: Vec<Program>,
    pipelines: HashMap<(ProgramId, PassState), wgpu::RenderPipeline>,
    buffers: Vec<Option<wgpu::Buffer>>,
    arrays: Vec<GpuTextureArray>,

    frame: Option<RecordedFrame>,
}

impl WgpuSpriteBackend {
    pub fn new(context: Arc<GraphicsContext>, target_format: wgpu::TextureFormat) -> Self {
        profile_function!();
        let device = context.device();

        let camera_layout = pipeline::create_camera_bind_group_layout(device);
        let camera_buffer = pipeline::create_camera_buffer(device);
        context.queue().write_buffer(
            &camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::IDENTITY),
        );
        let camera_bind_group =
            pipeline::create_camera_bind_group(device, &camera_layout, &camera_buffer);

        let texture_layout = pipeline::create_texture_array_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let sampler = pipeline::create_sprite_sampler(device);
        let mipmaps = MipmapGenerator::new(device, TEXTURE_ARRAY_FORMAT);

        Self {
            target_format,
            target: None,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            pipeline_layout,
            sampler,
            mipmaps,
            programs: Vec::new(),
            pipelines: HashMap::new(),
            buffers: Vec::new(),
            arrays: Vec::new(),
            frame: None,
            context,
        }
    }

    /// Set the color view subsequent clears and frames render into.
    ///
    /// The depth texture is recreated when the size changes.
    pub fn set_target(&mut self, view: wgpu::TextureView, width: u32, height: u32) {
        let device = self.context.device();
        match &mut self.target {
            Some(target) => {
                target.view = view;
                target.depth.resize(device, width, height);
            }
            None => {
                self.target = Some(RenderTarget {
                    view,
                    depth: DepthTexture::new(device, width, height, DEFAULT_DEPTH_FORMAT),
                });
            }
        }
    }

    /// Drop the current target. Frames recorded without one are discarded.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    pub fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }

    /// Number of cached `(program, pass state)` pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        if id.is_none() {
            return None;
        }
        self.buffers
            .get(id.raw() as usize - 1)
            .and_then(|buffer| buffer.as_ref())
    }

    fn array(&self, id: TextureArrayId) -> Option<&GpuTextureArray> {
        if id.is_none() {
            return None;
        }
        self.arrays.get(id.raw() as usize - 1)
    }

    fn program(&self, id: ProgramId) -> Option<&Program> {
        if id.is_none() {
            return None;
        }
        self.programs.get(id.raw() as usize - 1)
    }

    fn compile_stage(
        &self,
        label: Option<&str>,
        stage: ShaderStage,
        source: &str,
    ) -> Result<wgpu::ShaderModule, BackendError> {
        let device = self.context.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(BackendError::Compile {
                stage,
                message: err.to_string(),
            }),
            None => Ok(module),
        }
    }

    fn ensure_pipeline(&mut self, program: ProgramId, state: &PassState) {
        if self.pipelines.contains_key(&(program, *state)) {
            return;
        }
        let Some(source) = self.program(program) else {
            tracing::warn!("Pass begun with unknown program {:?}", program);
            return;
        };
        let pipeline = pipeline::create_sprite_pipeline(
            self.context.device(),
            source,
            &self.pipeline_layout,
            self.target_format,
            state,
        );
        tracing::debug!("Created sprite pipeline for {:?}", state);
        self.pipelines.insert((program, *state), pipeline);
    }

    fn check_limit(resource: &'static str, requested: u64, limit: u64) -> Result<(), BackendError> {
        if requested > limit {
            return Err(BackendError::ResourceLimit {
                resource,
                requested,
                limit,
            });
        }
        Ok(())
    }

    fn encode_frame(&self, frame: &RecordedFrame, target: &RenderTarget) {
        profile_function!();
        let (Some(mesh), Some(instances)) = (
            self.buffer(frame.bindings.mesh),
            self.buffer(frame.bindings.instances),
        ) else {
            tracing::warn!("Frame bound an unallocated buffer; skipping");
            return;
        };

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("sprite_frame_encoder"),
                });

        for recorded in &frame.passes {
            let Some(pipeline) = self.pipelines.get(&(frame.bindings.program, recorded.state))
            else {
                continue;
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.slice(..));
            pass.set_vertex_buffer(1, instances.slice(..));

            let mut bound = false;
            for command in &recorded.commands {
                match command {
                    PassCommand::Bind(id) => match self.array(*id) {
                        Some(array) => {
                            pass.set_bind_group(1, &array.bind_group, &[]);
                            bound = true;
                        }
                        None => bound = false,
                    },
                    PassCommand::Draw {
                        vertices,
                        instances,
                    } => {
                        if bound {
                            pass.draw(vertices.clone(), instances.clone());
                        }
                    }
                }
            }
        }

        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));
    }
}

impl SpriteBackend for WgpuSpriteBackend {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, BackendError> {
        profile_function!();
        let vertex = self.compile_stage(source.label, ShaderStage::Vertex, source.vertex)?;
        let fragment = self.compile_stage(source.label, ShaderStage::Fragment, source.fragment)?;
        let program = Program { vertex, fragment };

        // Linking: the stage interfaces are only checked against each other
        // when a pipeline is built.
        let device = self.context.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let opaque = pipeline::create_sprite_pipeline(
            device,
            &program,
            &self.pipeline_layout,
            self.target_format,
            &PassState::OPAQUE,
        );
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(BackendError::Link {
                message: err.to_string(),
            });
        }

        self.programs.push(program);
        let id = ProgramId::from_raw(self.programs.len() as u32);
        self.pipelines.insert((id, PassState::OPAQUE), opaque);
        tracing::debug!("Linked program {:?} ({:?})", source.label, id);
        Ok(id)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> Result<BufferId, BackendError> {
        Self::check_limit("buffer bytes", desc.size, self.context.max_buffer_size())?;

        let buffer = self
            .context
            .device()
            .create_buffer(&wgpu::BufferDescriptor {
                label: desc.label,
                size: desc.size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

        // Reuse a destroyed slot before growing.
        let index = match self.buffers.iter().position(Option::is_none) {
            Some(index) => {
                self.buffers[index] = Some(buffer);
                index
            }
            None => {
                self.buffers.push(Some(buffer));
                self.buffers.len() - 1
            }
        };
        Ok(BufferId::from_raw(index as u32 + 1))
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        match self.buffer(buffer) {
            Some(target) => self.context.queue().write_buffer(target, offset, data),
            None => tracing::warn!("Write to unallocated buffer {:?}", buffer),
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if buffer.is_none() {
            return;
        }
        if let Some(slot) = self.buffers.get_mut(buffer.raw() as usize - 1)
            && let Some(old) = slot.take()
        {
            old.destroy();
        }
    }

    fn create_texture_array(
        &mut self,
        desc: &TextureArrayDescriptor<'_>,
    ) -> Result<TextureArrayId, BackendError> {
        profile_function!();
        let max_dimension = self.context.max_texture_dimension_2d() as u64;
        Self::check_limit("texture width", desc.width as u64, max_dimension)?;
        Self::check_limit("texture height", desc.height as u64, max_dimension)?;
        Self::check_limit(
            "texture array layers",
            desc.layers as u64,
            self.context.max_texture_array_layers() as u64,
        )?;

        let device = self.context.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label,
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.layers,
            },
            mip_level_count: desc.mip_levels.max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_ARRAY_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        // A single-layer texture would default to a D2 view.
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: desc.label,
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: desc.label,
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

        self.arrays.push(GpuTextureArray {
            texture,
            bind_group,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            mip_levels: desc.mip_levels.max(1),
        });
        Ok(TextureArrayId::from_raw(self.arrays.len() as u32))
    }

    fn write_layer(&mut self, array: TextureArrayId, layer: u32, pixels: &[u8]) {
        let Some(target) = self.array(array) else {
            tracing::warn!("Write to unallocated texture array {:?}", array);
            return;
        };
        if layer >= target.layers {
            tracing::warn!(
                "Layer {} out of range for texture array {:?} ({} layers)",
                layer,
                array,
                target.layers
            );
            return;
        }

        self.context.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * target.width),
                rows_per_image: Some(target.height),
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn generate_mipmaps(&mut self, array: TextureArrayId) {
        let Some(target) = self.array(array) else {
            tracing::warn!("Mipmaps requested for unallocated texture array {:?}", array);
            return;
        };
        self.mipmaps.generate(
            self.context.device(),
            self.context.queue(),
            &target.texture,
            target.layers,
            target.mip_levels,
        );
    }

    fn set_camera(&mut self, camera: &CameraUniform) {
        self.context
            .queue()
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    fn clear(&mut self, color: ClearColor) {
        let Some(target) = &self.target else {
            tracing::warn!("Clear without a render target");
            return;
        };

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("sprite_clear_encoder"),
                });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context
            .queue()
            .submit(std::iter::once(encoder.finish()));
    }

    fn begin_frame(&mut self, bindings: &FrameBindings) {
        if self.frame.is_some() {
            tracing::warn!("begin_frame while a frame is recording; discarding it");
        }
        self.frame = Some(RecordedFrame {
            bindings: *bindings,
            passes: Vec::new(),
            open: false,
        });
    }

    fn begin_pass(&mut self, state: &PassState) {
        let program = match &self.frame {
            Some(frame) => frame.bindings.program,
            None => {
                tracing::warn!("begin_pass outside of a frame");
                return;
            }
        };
        self.ensure_pipeline(program, state);

        if let Some(frame) = &mut self.frame {
            frame.passes.push(RecordedPass {
                state: *state,
                commands: Vec::new(),
            });
            frame.open = true;
        }
    }

    fn bind_texture_array(&mut self, array: TextureArrayId) {
        if let Some(pass) = self.open_pass() {
            pass.commands.push(PassCommand::Bind(array));
        }
    }

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        if let Some(pass) = self.open_pass() {
            pass.commands.push(PassCommand::Draw {
                vertices,
                instances,
            });
        }
    }

    fn end_pass(&mut self) {
        if let Some(frame) = &mut self.frame {
            frame.open = false;
        }
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            tracing::warn!("end_frame without begin_frame");
            return;
        };
        match &self.target {
            Some(target) => self.encode_frame(&frame, target),
            None => tracing::warn!(
                "Discarding frame of {} pass(es): no render target",
                frame.passes.len()
            ),
        }
    }
}

impl WgpuSpriteBackend {
    fn open_pass(&mut self) -> Option<&mut RecordedPass> {
        match &mut self.frame {
            Some(frame) if frame.open => frame.passes.last_mut(),
            _ => {
                tracing::warn!("Pass command recorded outside of a pass");
                None
            }
        }
    }
}

impl std::fmt::Debug for WgpuSpriteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuSpriteBackend")
            .field("target_format", &self.target_format)
            .field("has_target", &self.target.is_some())
            .field("programs", &self.programs.len())
            .field("pipelines", &self.pipelines.len())
            .field("buffers", &self.buffers.iter().flatten().count())
            .field("texture_arrays", &self.arrays.len())
            .finish()
    }
}
