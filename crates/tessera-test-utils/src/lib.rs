//! Backend abstraction and test utilities for Tessera.
//!
//! This crate defines the seam between the sprite batching engine and the GPU:
//!
//! - [`SpriteBackend`] - Trait covering every GPU operation the batcher issues
//! - GPU handle and descriptor types ([`TextureArrayId`], [`PassState`], ...)
//! - `MockSpriteBackend` - Recording implementation for tests (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use tessera_test_utils::{BufferDescriptor, MockSpriteBackend, SpriteBackend};
//!
//! let mut mock = MockSpriteBackend::new();
//! let recorder = mock.recorder();
//!
//! let buffer = mock
//!     .create_buffer(&BufferDescriptor { label: Some("instances"), size: 1024 })
//!     .unwrap();
//! mock.write_buffer(buffer, 0, &[0u8; 28]);
//!
//! assert_eq!(recorder.count_buffer_writes(), 1);
//! assert_eq!(recorder.buffer_contents(buffer).len(), 1024);
//! # }
//! ```
//!
//! # Design
//!
//! Handles are plain `u32` ids with a reserved null value (`NONE`). The renderer
//! never holds GPU objects directly, so the same engine code drives the real
//! wgpu backend and the mock, and an unallocated texture array is just an id
//! that the renderer refuses to bind.
//!
//! Backend methods take `&mut self`; the mock shares its recorded state through
//! a cloneable [`MockRecorder`] so tests can inspect calls after handing the
//! backend to a context that owns it.

pub mod backend;
pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_backend;

pub use backend::*;
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_backend::*;
