//! The GPU seam used by the sprite batcher.

use std::ops::Range;

use crate::gpu_types::*;

/// GPU operations required to build an atlas and draw batched sprites.
///
/// Resource creation is fallible; per-frame recording is not. A frame is
/// recorded as:
///
/// ```text
/// begin_frame
///   begin_pass(state)  bind_texture_array*  draw_instanced*  end_pass
///   ...
/// end_frame
/// ```
///
/// Every `begin_pass` is matched by exactly one `end_pass` before the next
/// pass begins or the frame ends. Pass state never carries over.
pub trait SpriteBackend {
    /// Compile and link a vertex + fragment program.
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, BackendError>;

    /// Allocate a zero-initialised buffer usable as a vertex or instance stream.
    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> Result<BufferId, BackendError>;

    /// Upload `data` to `buffer` at byte `offset`.
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Release a buffer. Destroying `BufferId::NONE` is a no-op.
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Allocate a layered RGBA8 texture with the given mip depth.
    fn create_texture_array(
        &mut self,
        desc: &TextureArrayDescriptor<'_>,
    ) -> Result<TextureArrayId, BackendError>;

    /// Upload tightly packed RGBA8 pixels into mip level 0 of `layer`.
    fn write_layer(&mut self, array: TextureArrayId, layer: u32, pixels: &[u8]);

    /// Fill mip levels 1.. of every layer from level 0.
    fn generate_mipmaps(&mut self, array: TextureArrayId);

    /// Upload the camera transform shared by every sprite.
    fn set_camera(&mut self, camera: &CameraUniform);

    /// Clear the color and depth targets immediately.
    fn clear(&mut self, color: ClearColor);

    fn begin_frame(&mut self, bindings: &FrameBindings);

    fn begin_pass(&mut self, state: &PassState);

    fn bind_texture_array(&mut self, array: TextureArrayId);

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>);

    fn end_pass(&mut self);

    fn end_frame(&mut self);
}

impl<B: SpriteBackend + ?Sized> SpriteBackend for Box<B> {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, BackendError> {
        (**self).create_program(source)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> Result<BufferId, BackendError> {
        (**self).create_buffer(desc)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        (**self).write_buffer(buffer, offset, data)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        (**self).destroy_buffer(buffer)
    }

    fn create_texture_array(
        &mut self,
        desc: &TextureArrayDescriptor<'_>,
    ) -> Result<TextureArrayId, BackendError> {
        (**self).create_texture_array(desc)
    }

    fn write_layer(&mut self, array: TextureArrayId, layer: u32, pixels: &[u8]) {
        (**self).write_layer(array, layer, pixels)
    }

    fn generate_mipmaps(&mut self, array: TextureArrayId) {
        (**self).generate_mipmaps(array)
    }

    fn set_camera(&mut self, camera: &CameraUniform) {
        (**self).set_camera(camera)
    }

    fn clear(&mut self, color: ClearColor) {
        (**self).clear(color)
    }

    fn begin_frame(&mut self, bindings: &FrameBindings) {
        (**self).begin_frame(bindings)
    }

    fn begin_pass(&mut self, state: &PassState) {
        (**self).begin_pass(state)
    }

    fn bind_texture_array(&mut self, array: TextureArrayId) {
        (**self).bind_texture_array(array)
    }

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        (**self).draw_instanced(vertices, instances)
    }

    fn end_pass(&mut self) {
        (**self).end_pass()
    }

    fn end_frame(&mut self) {
        (**self).end_frame()
    }
}
