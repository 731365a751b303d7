//! The per-frame batch renderer.

use std::ops::Range;

use tessera_core::profiling::{profile_function, profile_scope};
use tessera_test_utils::{
    BackendError, BufferDescriptor, BufferId, FrameBindings, PassState, ProgramId, ProgramSource,
    SpriteBackend, TextureArrayId,
};

use super::plan::FramePlan;
use super::types::{DrawGroup, FrameStats, SpriteInstance};
use crate::atlas::Atlas;
use crate::camera::Camera2D;
use crate::config::{RendererConfig, TextureMode};
use crate::mesh::{QUAD_VERTEX_COUNT, quad_vertices};
use crate::scene::SceneBuffer;

const VERTEX_SHADER: &str = include_str!("../shaders/sprite_vertex.wgsl");
const FRAGMENT_SHADER: &str = include_str!("../shaders/sprite_fragment.wgsl");

/// Ends the pass it began when dropped.
struct PassScope<'a, B: SpriteBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: SpriteBackend + ?Sized> PassScope<'a, B> {
    fn begin(backend: &'a mut B, state: &PassState) -> Self {
        backend.begin_pass(state);
        Self { backend }
    }

    fn bind(&mut self, array: TextureArrayId) {
        self.backend.bind_texture_array(array);
    }

    fn draw(&mut self, instances: Range<u32>) {
        self.backend.draw_instanced(0..QUAD_VERTEX_COUNT, instances);
    }
}

impl<B: SpriteBackend + ?Sized> Drop for PassScope<'_, B> {
    fn drop(&mut self) {
        self.backend.end_pass();
    }
}

/// Drains a [`SceneBuffer`] into at most two passes of instanced draws.
///
/// GPU resources (program, quad mesh, instance buffer) are created once and
/// reused; the instance buffer grows to the next power of two when a frame
/// needs more room.
#[derive(Debug)]
pub struct BatchRenderer {
    textures: TextureMode,
    program: ProgramId,
    mesh: BufferId,
    instances: BufferId,
    capacity: usize,
    plan: FramePlan,
    stats: FrameStats,
}

impl BatchRenderer {
    pub fn new<B: SpriteBackend + ?Sized>(
        backend: &mut B,
        config: &RendererConfig,
    ) -> Result<Self, BackendError> {
        profile_function!();
        let program = backend.create_program(&ProgramSource {
            label: Some("sprite"),
            vertex: VERTEX_SHADER,
            fragment: FRAGMENT_SHADER,
        })?;

        let vertices = quad_vertices(config.mesh);
        let mesh = backend.create_buffer(&BufferDescriptor {
            label: Some("sprite_quad"),
            size: std::mem::size_of_val(vertices) as u64,
        })?;
        backend.write_buffer(mesh, 0, bytemuck::cast_slice(vertices));

        let capacity = config.initial_capacity.max(1);
        let instances = backend.create_buffer(&BufferDescriptor {
            label: Some("sprite_instances"),
            size: capacity as u64 * SpriteInstance::SIZE,
        })?;

        Ok(Self {
            textures: config.textures,
            program,
            mesh,
            instances,
            capacity,
            plan: FramePlan::new(),
            stats: FrameStats::default(),
        })
    }

    /// Draw and clear `scene`.
    ///
    /// An empty scene records nothing. If the instance buffer cannot grow the
    /// frame is dropped with an error log; the scene is cleared either way.
    pub fn draw<B: SpriteBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &mut SceneBuffer,
        camera: &mut Camera2D,
        atlas: &Atlas,
    ) -> FrameStats {
        profile_function!();
        if scene.is_empty() {
            self.stats = FrameStats::default();
            return self.stats;
        }

        if let Some(uniform) = camera.take_uniform() {
            backend.set_camera(&uniform);
        }

        self.plan.build(scene, self.textures);
        scene.clear();

        let mut stats = FrameStats {
            instances: self.plan.instances().len() as u32,
            opaque: self.plan.opaque_count(),
            transparent: self.plan.transparent_count(),
            ..Default::default()
        };

        let required = self.plan.instances().len();
        if let Err(err) = self.ensure_capacity(backend, required) {
            tracing::error!("Dropping frame of {} sprites: {}", stats.instances, err);
            self.stats = FrameStats::default();
            return self.stats;
        }
        self.upload(backend);

        backend.begin_frame(&FrameBindings {
            program: self.program,
            mesh: self.mesh,
            instances: self.instances,
        });
        {
            profile_scope!("opaque_pass");
            run_pass(backend, &PassState::OPAQUE, self.plan.opaque_groups(), atlas, &mut stats);
        }
        {
            profile_scope!("transparent_pass");
            run_pass(
                backend,
                &PassState::TRANSPARENT,
                self.plan.transparent_groups(),
                atlas,
                &mut stats,
            );
        }
        backend.end_frame();

        tracing::trace!(
            "Frame: {} instances ({} opaque, {} transparent), {} pass(es), {} draw(s), {} bind(s)",
            stats.instances,
            stats.opaque,
            stats.transparent,
            stats.passes,
            stats.draw_calls,
            stats.texture_binds
        );

        self.stats = stats;
        stats
    }

    /// Upload planned instances as `[opaque | transparent]`.
    fn upload<B: SpriteBackend + ?Sized>(&self, backend: &mut B) {
        let instances = self.plan.instances();
        let split = self.plan.opaque_count() as usize;
        let (opaque, transparent) = instances.split_at(split);

        if !opaque.is_empty() {
            backend.write_buffer(self.instances, 0, bytemuck::cast_slice(opaque));
        }
        if !transparent.is_empty() {
            let offset = split as u64 * SpriteInstance::SIZE;
            backend.write_buffer(self.instances, offset, bytemuck::cast_slice(transparent));
        }
    }

    /// Ensure the instance buffer has enough capacity.
    fn ensure_capacity<B: SpriteBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        required: usize,
    ) -> Result<(), BackendError> {
        if required <= self.capacity {
            return Ok(());
        }

        let new_capacity = required.next_power_of_two();
        let buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("sprite_instances"),
            size: new_capacity as u64 * SpriteInstance::SIZE,
        })?;
        backend.destroy_buffer(self.instances);

        tracing::debug!(
            "Grew instance buffer from {} to {} instances",
            self.capacity,
            new_capacity
        );
        self.instances = buffer;
        self.capacity = new_capacity;
        Ok(())
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn mesh_buffer(&self) -> BufferId {
        self.mesh
    }

    pub fn instance_buffer(&self) -> BufferId {
        self.instances
    }

    /// Instance buffer capacity in instances.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Statistics of the most recent `draw`.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Record one pass. Skipped entirely when no group has an allocated array.
fn run_pass<B: SpriteBackend + ?Sized>(
    backend: &mut B,
    state: &PassState,
    groups: &[DrawGroup],
    atlas: &Atlas,
    stats: &mut FrameStats,
) {
    let array_of = |group: &DrawGroup| {
        atlas
            .pages()
            .get(group.page as usize)
            .map(|page| page.array())
            .unwrap_or(TextureArrayId::NONE)
    };
    if !groups.iter().any(|group| array_of(group).is_some()) {
        return;
    }

    let mut pass = PassScope::begin(backend, state);
    stats.passes += 1;

    let mut bound = TextureArrayId::NONE;
    for group in groups {
        let array = array_of(group);
        if array.is_none() {
            continue;
        }
        if array != bound {
            pass.bind(array);
            bound = array;
            stats.texture_binds += 1;
        }
        pass.draw(group.start..group.start + group.count);
        stats.draw_calls += 1;
    }
}
