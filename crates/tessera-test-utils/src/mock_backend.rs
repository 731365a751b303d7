//! Recording implementation of [`SpriteBackend`] for testing.
//!
//! The mock never touches a GPU. It records every call, keeps the bytes written
//! to each buffer so tests can decode uploaded instances, and validates the
//! pass protocol the way a real device would: drawing outside a pass, nesting
//! passes, binding a null array or writing past the end of a buffer panics.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{backend::SpriteBackend, gpu_types::*};

/// Records a backend call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateProgram {
        label: Option<String>,
    },
    CreateBuffer {
        buffer: BufferId,
        size: u64,
    },
    WriteBuffer {
        buffer: BufferId,
        offset: u64,
        size: usize,
    },
    DestroyBuffer {
        buffer: BufferId,
    },
    CreateTextureArray {
        array: TextureArrayId,
        width: u32,
        height: u32,
        layers: u32,
        mip_levels: u32,
    },
    WriteLayer {
        array: TextureArrayId,
        layer: u32,
        size: usize,
    },
    GenerateMipmaps {
        array: TextureArrayId,
    },
    SetCamera {
        camera: CameraUniform,
    },
    Clear {
        color: ClearColor,
    },
    BeginFrame {
        bindings: FrameBindings,
    },
    BeginPass {
        state: PassState,
    },
    BindTextureArray {
        array: TextureArrayId,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    EndPass,
    EndFrame,
}

/// Snapshot of a mock texture array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTextureArray {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub mip_levels: u32,
    /// Layers that received pixel data.
    pub written_layers: Vec<u32>,
    pub mipmaps_generated: bool,
}

#[derive(Debug)]
struct MockBuffer {
    data: Vec<u8>,
    destroyed: bool,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<BackendCall>,
    buffers: Vec<MockBuffer>,
    arrays: Vec<MockTextureArray>,
    programs: u32,
    open_pass: Option<PassState>,
    in_frame: bool,
}

impl MockState {
    fn buffer_mut(&mut self, buffer: BufferId) -> &mut MockBuffer {
        assert!(buffer.is_some(), "use of null buffer handle");
        let buffer = &mut self.buffers[buffer.raw() as usize - 1];
        assert!(!buffer.destroyed, "use of destroyed buffer");
        buffer
    }

    fn array_mut(&mut self, array: TextureArrayId) -> &mut MockTextureArray {
        assert!(array.is_some(), "use of null texture array handle");
        &mut self.arrays[array.raw() as usize - 1]
    }
}

/// Mock implementation of [`SpriteBackend`] for testing.
///
/// Recorded state lives behind an `Arc<Mutex<..>>` so it can be inspected
/// through a [`MockRecorder`] after the backend has been moved into a context.
///
/// # Example
///
/// ```rust
/// use tessera_test_utils::{MockSpriteBackend, PassState, SpriteBackend};
///
/// let mut mock = MockSpriteBackend::new();
/// let recorder = mock.recorder();
///
/// mock.begin_pass(&PassState::OPAQUE);
/// mock.draw_instanced(0..6, 0..10);
/// mock.end_pass();
///
/// assert_eq!(recorder.count_passes(), 1);
/// assert_eq!(recorder.count_draws(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockSpriteBackend {
    state: Arc<Mutex<MockState>>,
    compile_error: Option<(ShaderStage, String)>,
    link_error: Option<String>,
    max_texture_layers: Option<u32>,
}

impl MockSpriteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `create_program` call with a compile error for `stage`.
    pub fn with_compile_error(mut self, stage: ShaderStage, message: impl Into<String>) -> Self {
        self.compile_error = Some((stage, message.into()));
        self
    }

    /// Fail every `create_program` call with a link error.
    pub fn with_link_error(mut self, message: impl Into<String>) -> Self {
        self.link_error = Some(message.into());
        self
    }

    /// Reject texture arrays with more than `layers` layers.
    pub fn with_max_texture_layers(mut self, layers: u32) -> Self {
        self.max_texture_layers = Some(layers);
        self
    }

    /// Handle for inspecting recorded state.
    pub fn recorder(&self) -> MockRecorder {
        MockRecorder {
            state: Arc::clone(&self.state),
        }
    }
}

impl SpriteBackend for MockSpriteBackend {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, BackendError> {
        if let Some((stage, message)) = &self.compile_error {
            return Err(BackendError::Compile {
                stage: *stage,
                message: message.clone(),
            });
        }
        if let Some(message) = &self.link_error {
            return Err(BackendError::Link {
                message: message.clone(),
            });
        }

        let mut state = self.state.lock();
        state.programs += 1;
        let id = ProgramId::from_raw(state.programs);
        state.calls.push(BackendCall::CreateProgram {
            label: source.label.map(|s| s.to_string()),
        });
        Ok(id)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> Result<BufferId, BackendError> {
        let mut state = self.state.lock();
        state.buffers.push(MockBuffer {
            data: vec![0; desc.size as usize],
            destroyed: false,
        });
        let id = BufferId::from_raw(state.buffers.len() as u32);
        state.calls.push(BackendCall::CreateBuffer {
            buffer: id,
            size: desc.size,
        });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let mut state = self.state.lock();
        let stored = state.buffer_mut(buffer);
        let start = offset as usize;
        let end = start + data.len();
        assert!(
            end <= stored.data.len(),
            "write of {} bytes at offset {} overruns buffer of {} bytes",
            data.len(),
            offset,
            stored.data.len()
        );
        stored.data[start..end].copy_from_slice(data);
        state.calls.push(BackendCall::WriteBuffer {
            buffer,
            offset,
            size: data.len(),
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if buffer.is_none() {
            return;
        }
        let mut state = self.state.lock();
        state.buffer_mut(buffer).destroyed = true;
        state.calls.push(BackendCall::DestroyBuffer { buffer });
    }

    fn create_texture_array(
        &mut self,
        desc: &TextureArrayDescriptor<'_>,
    ) -> Result<TextureArrayId, BackendError> {
        if let Some(limit) = self.max_texture_layers
            && desc.layers > limit
        {
            return Err(BackendError::ResourceLimit {
                resource: "texture array layers",
                requested: desc.layers as u64,
                limit: limit as u64,
            });
        }

        let mut state = self.state.lock();
        state.arrays.push(MockTextureArray {
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            mip_levels: desc.mip_levels,
            written_layers: Vec::new(),
            mipmaps_generated: false,
        });
        let id = TextureArrayId::from_raw(state.arrays.len() as u32);
        state.calls.push(BackendCall::CreateTextureArray {
            array: id,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            mip_levels: desc.mip_levels,
        });
        Ok(id)
    }

    fn write_layer(&mut self, array: TextureArrayId, layer: u32, pixels: &[u8]) {
        let mut state = self.state.lock();
        let stored = state.array_mut(array);
        assert!(layer < stored.layers, "layer {} out of range", layer);
        assert_eq!(
            pixels.len(),
            stored.width as usize * stored.height as usize * 4,
            "layer data does not match array extent"
        );
        stored.written_layers.push(layer);
        state.calls.push(BackendCall::WriteLayer {
            array,
            layer,
            size: pixels.len(),
        });
    }

    fn generate_mipmaps(&mut self, array: TextureArrayId) {
        let mut state = self.state.lock();
        state.array_mut(array).mipmaps_generated = true;
        state.calls.push(BackendCall::GenerateMipmaps { array });
    }

    fn set_camera(&mut self, camera: &CameraUniform) {
        self.state
            .lock()
            .calls
            .push(BackendCall::SetCamera { camera: *camera });
    }

    fn clear(&mut self, color: ClearColor) {
        let mut state = self.state.lock();
        assert!(!state.in_frame, "clear recorded inside a frame");
        state.calls.push(BackendCall::Clear { color });
    }

    fn begin_frame(&mut self, bindings: &FrameBindings) {
        let mut state = self.state.lock();
        assert!(!state.in_frame, "begin_frame while a frame is open");
        state.in_frame = true;
        state.calls.push(BackendCall::BeginFrame {
            bindings: *bindings,
        });
    }

    fn begin_pass(&mut self, pass: &PassState) {
        let mut state = self.state.lock();
        assert!(state.open_pass.is_none(), "begin_pass while a pass is open");
        state.open_pass = Some(*pass);
        state.calls.push(BackendCall::BeginPass { state: *pass });
    }

    fn bind_texture_array(&mut self, array: TextureArrayId) {
        let mut state = self.state.lock();
        assert!(array.is_some(), "bind of unallocated texture array");
        assert!(state.open_pass.is_some(), "bind outside of a pass");
        state.calls.push(BackendCall::BindTextureArray { array });
    }

    fn draw_instanced(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        let mut state = self.state.lock();
        assert!(state.open_pass.is_some(), "draw outside of a pass");
        state.calls.push(BackendCall::Draw {
            vertices,
            instances,
        });
    }

    fn end_pass(&mut self) {
        let mut state = self.state.lock();
        assert!(state.open_pass.take().is_some(), "end_pass without a pass");
        state.calls.push(BackendCall::EndPass);
    }

    fn end_frame(&mut self) {
        let mut state = self.state.lock();
        assert!(state.open_pass.is_none(), "end_frame with an open pass");
        state.in_frame = false;
        state.calls.push(BackendCall::EndFrame);
    }
}

/// Shared view of a [`MockSpriteBackend`]'s recorded state.
#[derive(Debug, Clone)]
pub struct MockRecorder {
    state: Arc<Mutex<MockState>>,
}

impl MockRecorder {
    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Clear recorded calls (useful between test steps). Resource state is kept.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn count_draws(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Draw { .. }))
    }

    pub fn count_texture_binds(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::BindTextureArray { .. }))
    }

    pub fn count_passes(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::BeginPass { .. }))
    }

    pub fn count_pass_ends(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::EndPass))
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::CreateBuffer { .. }))
    }

    pub fn count_buffer_writes(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::WriteBuffer { .. }))
    }

    pub fn count_texture_array_creates(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::CreateTextureArray { .. }))
    }

    pub fn count_camera_uploads(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::SetCamera { .. }))
    }

    pub fn count_clears(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Clear { .. }))
    }

    /// Instance ranges of every recorded draw, in order.
    pub fn draws(&self) -> Vec<Range<u32>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw { instances, .. } => Some(instances.clone()),
                _ => None,
            })
            .collect()
    }

    /// State of every recorded pass, in order.
    pub fn pass_states(&self) -> Vec<PassState> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::BeginPass { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Texture arrays bound, in order.
    pub fn texture_binds(&self) -> Vec<TextureArrayId> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::BindTextureArray { array } => Some(*array),
                _ => None,
            })
            .collect()
    }

    /// Most recently uploaded camera transform.
    pub fn last_camera(&self) -> Option<CameraUniform> {
        self.state.lock().calls.iter().rev().find_map(|c| match c {
            BackendCall::SetCamera { camera } => Some(*camera),
            _ => None,
        })
    }

    /// Bytes currently held by `buffer`. Empty for unknown handles.
    pub fn buffer_contents(&self, buffer: BufferId) -> Vec<u8> {
        if buffer.is_none() {
            return Vec::new();
        }
        self.state
            .lock()
            .buffers
            .get(buffer.raw() as usize - 1)
            .map(|b| b.data.clone())
            .unwrap_or_default()
    }

    pub fn is_buffer_destroyed(&self, buffer: BufferId) -> bool {
        if buffer.is_none() {
            return false;
        }
        self.state
            .lock()
            .buffers
            .get(buffer.raw() as usize - 1)
            .is_some_and(|b| b.destroyed)
    }

    pub fn texture_array(&self, array: TextureArrayId) -> Option<MockTextureArray> {
        if array.is_none() {
            return None;
        }
        self.state
            .lock()
            .arrays
            .get(array.raw() as usize - 1)
            .cloned()
    }

    pub fn is_pass_open(&self) -> bool {
        self.state.lock().open_pass.is_some()
    }
}
