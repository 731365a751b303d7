//! Error types for atlas construction, submission and setup.

use std::fmt;
use std::path::PathBuf;

pub use tessera_test_utils::BackendError;

/// Invalid camera configuration. Camera state is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    /// Zoom window dimensions must be finite and positive.
    InvalidSize { width: f32, height: f32 },
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidSize { width, height } => write!(
                f,
                "Invalid camera size {}x{}: dimensions must be finite and positive",
                width, height
            ),
        }
    }
}

impl std::error::Error for CameraError {}

/// Errors raised while building or uploading a texture atlas.
#[derive(Debug)]
pub enum AtlasError {
    /// The atlas root (or a directory below it) could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An image could not be decoded. The builder skips these.
    Decode { name: String, message: String },
    /// An image does not match the dimensions of its texture array.
    SizeMismatch {
        name: String,
        expected: (u32, u32),
        found: (u32, u32),
    },
    /// The backend rejected a texture allocation.
    Backend(BackendError),
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Io { path, source } => {
                write!(f, "IO error reading '{}': {}", path.display(), source)
            }
            AtlasError::Decode { name, message } => {
                write!(f, "Failed to decode '{}': {}", name, message)
            }
            AtlasError::SizeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Image '{}' is {}x{} but its texture array is {}x{}",
                name, found.0, found.1, expected.0, expected.1
            ),
            AtlasError::Backend(err) => write!(f, "Atlas upload failed: {}", err),
        }
    }
}

impl std::error::Error for AtlasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AtlasError::Io { source, .. } => Some(source),
            AtlasError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for AtlasError {
    fn from(err: BackendError) -> Self {
        AtlasError::Backend(err)
    }
}

/// Per-call submission errors. The frame continues.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The name or reference does not resolve to a loaded texture.
    UnknownTexture { texture: String },
    /// Depth must be finite and in `[0, 1)`.
    InvalidDepth { depth: f32 },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UnknownTexture { texture } => write!(f, "Unknown texture: {}", texture),
            SubmitError::InvalidDepth { depth } => {
                write!(f, "Invalid sprite depth {}: expected a value in [0, 1)", depth)
            }
        }
    }
}

impl std::error::Error for SubmitError {}

/// Errors raised while initializing a sprite context.
#[derive(Debug)]
pub enum InitError {
    Atlas(AtlasError),
    Backend(BackendError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Atlas(err) => write!(f, "Atlas initialization failed: {}", err),
            InitError::Backend(err) => write!(f, "Renderer initialization failed: {}", err),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Atlas(err) => Some(err),
            InitError::Backend(err) => Some(err),
        }
    }
}

impl From<AtlasError> for InitError {
    fn from(err: AtlasError) -> Self {
        match err {
            AtlasError::Backend(err) => InitError::Backend(err),
            other => InitError::Atlas(other),
        }
    }
}

impl From<BackendError> for InitError {
    fn from(err: BackendError) -> Self {
        InitError::Backend(err)
    }
}

/// Errors raised while creating a headless graphics context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No adapter matched the requested options.
    NoAdapter,
    /// The adapter refused to create a device.
    DeviceCreation(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoAdapter => write!(f, "Failed to find a suitable GPU adapter"),
            GraphicsError::DeviceCreation(message) => {
                write!(f, "Failed to create device: {}", message)
            }
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_test_utils::ShaderStage;

    #[test]
    fn test_backend_errors_surface_as_backend() {
        let compile = BackendError::Compile {
            stage: ShaderStage::Vertex,
            message: "oops".to_string(),
        };
        let init: InitError = AtlasError::from(compile.clone()).into();
        assert!(matches!(init, InitError::Backend(ref e) if *e == compile));
    }

    #[test]
    fn test_size_mismatch_display() {
        let err = AtlasError::SizeMismatch {
            name: "b.png".to_string(),
            expected: (64, 64),
            found: (32, 32),
        };
        assert_eq!(
            err.to_string(),
            "Image 'b.png' is 32x32 but its texture array is 64x64"
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = AtlasError::Io {
            path: PathBuf::from("missing"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.source().is_some());
    }
}
