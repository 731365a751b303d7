//! Tessera Render - instanced 2D sprite batching
//!
//! This crate provides:
//! - An image atlas that packs same-sized images into layered texture arrays
//! - A 2D camera (position, size, rotation) uploaded as a single uniform
//! - Per-frame sprite queues split into opaque and transparent passes
//! - A batch renderer issuing one instanced draw per pass
//! - A wgpu implementation of the [`SpriteBackend`] seam
//!
//! # Example
//!
//! ```rust,no_run
//! use glam::Vec2;
//! use tessera_render::*;
//!
//! let context = GraphicsContext::new_owned_sync().expect("no GPU available");
//! let backend = WgpuSpriteBackend::new(context, wgpu::TextureFormat::Bgra8UnormSrgb);
//!
//! let mut sprites = SpriteContext::initialize(backend, "assets/sprites", RendererConfig::default())
//!     .expect("failed to load sprites");
//!
//! sprites.set_camera_size(Vec2::new(16.0, 9.0)).unwrap();
//! sprites.clear_scene();
//! sprites
//!     .submit_named(Sprite::new(Vec2::ZERO, 1.0).with_depth(0.5), "grass.png")
//!     .unwrap();
//! let stats = sprites.draw();
//! assert_eq!(stats.draw_calls, 1);
//! ```

// Scene description
pub mod camera;
pub mod config;
pub mod mesh;
pub mod scene;

// Textures
pub mod atlas;

// Batching
pub mod batched;
mod sprite_context;

// GPU
mod context;
pub mod depth;
pub mod wgpu_backend;

pub mod error;

// Re-exports
pub use atlas::{Atlas, AtlasBuilder, AtlasStats, DirectorySource, ImageSource, MemorySource, TextureRef};
pub use batched::{BatchRenderer, FrameStats, SpriteInstance};
pub use camera::Camera2D;
pub use config::*;
pub use context::*;
pub use error::*;
pub use scene::{Sprite, SpriteSize};
pub use sprite_context::SpriteContext;
pub use wgpu_backend::WgpuSpriteBackend;

pub use tessera_test_utils::{
    BlendMode, BufferId, CameraUniform, ClearColor, DepthCompare, PassState, ProgramId,
    SpriteBackend, TextureArrayId,
};

pub use wgpu;
