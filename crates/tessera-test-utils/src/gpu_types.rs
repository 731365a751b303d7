//! Backend-neutral GPU handles and descriptors.
//!
//! The batching engine only ever holds these ids; the backend owns the actual
//! GPU objects they refer to.

use std::fmt;

macro_rules! gpu_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u32);

        impl $name {
            /// The null handle. Never refers to a live resource.
            pub const NONE: Self = Self(0);

            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            pub const fn is_some(self) -> bool {
                self.0 != 0
            }
        }
    };
}

gpu_id!(
    /// Handle to a linked vertex + fragment program.
    ProgramId
);
gpu_id!(
    /// Handle to a layered 2D texture (one image per layer).
    TextureArrayId
);
gpu_id!(
    /// Handle to a vertex-rate or instance-rate buffer.
    BufferId
);

/// Shader stage, used to attribute compile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Source text for a vertex + fragment program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: Option<&'a str>,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Descriptor for a layered RGBA8 texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureArrayDescriptor<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub mip_levels: u32,
}

impl TextureArrayDescriptor<'_> {
    /// Byte size of a single tightly packed RGBA8 layer at mip level 0.
    pub fn layer_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Descriptor for a vertex or instance buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor<'a> {
    pub label: Option<&'a str>,
    pub size: u64,
}

/// Depth comparison function used by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    Less,
    LessEqual,
    Always,
}

/// Blend equation applied to fragment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src * srcAlpha + dst * (1 - srcAlpha)`.
    Alpha,
}

/// Fixed-function state for one render pass.
///
/// Replaces global enable/disable toggles: the state a pass needs is handed to
/// [`SpriteBackend::begin_pass`](crate::SpriteBackend::begin_pass) and does not
/// outlive the matching `end_pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassState {
    pub depth_compare: DepthCompare,
    pub depth_write: bool,
    pub blend: Option<BlendMode>,
}

impl PassState {
    /// Depth test `Less`, depth writes on, no blending.
    pub const OPAQUE: Self = Self {
        depth_compare: DepthCompare::Less,
        depth_write: true,
        blend: None,
    };

    /// Depth test `LessEqual`, alpha blending.
    pub const TRANSPARENT: Self = Self {
        depth_compare: DepthCompare::LessEqual,
        depth_write: true,
        blend: Some(BlendMode::Alpha),
    };

    pub fn is_blended(&self) -> bool {
        self.blend.is_some()
    }
}

/// Opaque RGB clear color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Camera uniform block (column-major 4x4).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub const IDENTITY: Self = Self {
        view: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Resources shared by every pass of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBindings {
    pub program: ProgramId,
    pub mesh: BufferId,
    pub instances: BufferId,
}

/// Errors raised by a [`SpriteBackend`](crate::SpriteBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A shader stage failed to compile.
    Compile { stage: ShaderStage, message: String },
    /// Compiled stages failed to link into a program.
    Link { message: String },
    /// A requested resource exceeds a device limit.
    ResourceLimit {
        resource: &'static str,
        requested: u64,
        limit: u64,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Compile { stage, message } => {
                write!(f, "Failed to compile {} shader: {}", stage, message)
            }
            BackendError::Link { message } => write!(f, "Failed to link program: {}", message),
            BackendError::ResourceLimit {
                resource,
                requested,
                limit,
            } => write!(
                f,
                "Requested {} of {} exceeds device limit of {}",
                resource, requested, limit
            ),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handles() {
        assert!(TextureArrayId::NONE.is_none());
        assert!(TextureArrayId::default().is_none());
        assert!(BufferId::from_raw(3).is_some());
        assert_eq!(ProgramId::from_raw(7).raw(), 7);
    }

    #[test]
    fn test_pass_states() {
        assert_eq!(PassState::OPAQUE.depth_compare, DepthCompare::Less);
        assert!(!PassState::OPAQUE.is_blended());
        assert_eq!(PassState::TRANSPARENT.depth_compare, DepthCompare::LessEqual);
        assert_eq!(PassState::TRANSPARENT.blend, Some(BlendMode::Alpha));
    }

    #[test]
    fn test_layer_bytes() {
        let desc = TextureArrayDescriptor {
            label: None,
            width: 64,
            height: 32,
            layers: 3,
            mip_levels: 7,
        };
        assert_eq!(desc.layer_bytes(), 64 * 32 * 4);
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::Compile {
            stage: ShaderStage::Fragment,
            message: "unexpected token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to compile fragment shader: unexpected token"
        );
    }
}
