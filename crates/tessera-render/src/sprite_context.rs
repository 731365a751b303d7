//! The public sprite rendering surface.

use std::path::Path;

use glam::Vec2;
use tessera_core::profiling::profile_function;
use tessera_test_utils::{ClearColor, SpriteBackend};

use crate::atlas::{Atlas, AtlasBuilder, DirectorySource, ImageSource, TextureRef};
use crate::batched::{BatchRenderer, FrameStats};
use crate::camera::Camera2D;
use crate::config::{RendererConfig, TransparencyMode};
use crate::error::{CameraError, InitError, SubmitError};
use crate::scene::{QueuedSprite, SceneBuffer, Sprite};

/// Atlas, camera, scene queues and batch renderer bound to one backend.
///
/// A frame is: set the camera, clear, submit sprites, draw.
///
/// # Example
///
/// ```rust,no_run
/// use glam::Vec2;
/// use tessera_render::{RendererConfig, Sprite, SpriteContext, SpriteBackend};
///
/// fn frame<B: SpriteBackend>(ctx: &mut SpriteContext<B>, t: f32) {
///     ctx.set_camera_angle(t * 0.1);
///     ctx.clear_scene();
///
///     let tree = ctx.texture_ref("tree.png").expect("tree.png is in the atlas");
///     let sprite = Sprite::new(Vec2::new(0.0, 0.0), 0.25).with_depth(0.5);
///     ctx.submit(sprite, tree).unwrap();
///
///     ctx.draw();
/// }
/// ```
#[derive(Debug)]
pub struct SpriteContext<B: SpriteBackend> {
    backend: B,
    config: RendererConfig,
    atlas: Atlas,
    camera: Camera2D,
    scene: SceneBuffer,
    renderer: BatchRenderer,
}

impl<B: SpriteBackend> SpriteContext<B> {
    /// Create the program and mesh, then load every image below `atlas_path`.
    pub fn initialize(
        backend: B,
        atlas_path: impl AsRef<Path>,
        config: RendererConfig,
    ) -> Result<Self, InitError> {
        let source = DirectorySource::scan(atlas_path, &config.atlas)?;
        Self::from_source(backend, &source, config)
    }

    /// Like [`initialize`](Self::initialize) with an arbitrary image source.
    pub fn from_source<S: ImageSource + ?Sized>(
        mut backend: B,
        source: &S,
        config: RendererConfig,
    ) -> Result<Self, InitError> {
        profile_function!();
        let renderer = BatchRenderer::new(&mut backend, &config)?;

        let mut atlas = AtlasBuilder::from_renderer_config(&config).build(source)?;
        atlas.upload(&mut backend)?;

        tracing::info!(
            "Sprite context ready: {} texture(s), {:?} mesh, {:?} textures, {:?} transparency",
            atlas.len(),
            config.mesh,
            config.textures,
            config.transparency
        );

        Ok(Self {
            scene: SceneBuffer::with_capacity(config.initial_capacity),
            camera: Camera2D::new(),
            backend,
            config,
            atlas,
            renderer,
        })
    }

    pub fn set_camera_position(&mut self, position: Vec2) {
        self.camera.set_position(position);
    }

    pub fn set_camera_size(&mut self, size: Vec2) -> Result<(), CameraError> {
        self.camera.set_size(size)
    }

    pub fn set_camera_angle(&mut self, angle: f32) {
        self.camera.set_angle(angle);
    }

    /// Color used by [`clear_scene`](Self::clear_scene).
    pub fn set_clear_color(&mut self, color: ClearColor) {
        self.config.clear_color = color;
    }

    /// Clear the render target to the clear color and reset depth to 1.0.
    pub fn clear_scene(&mut self) {
        self.backend.clear(self.config.clear_color);
    }

    pub fn texture_ref(&self, name: &str) -> Option<TextureRef> {
        self.atlas.texture_ref(name)
    }

    /// Queue `sprite` for the next [`draw`](Self::draw).
    pub fn submit(&mut self, sprite: Sprite, texture: TextureRef) -> Result<(), SubmitError> {
        if !self.atlas.contains_ref(texture) {
            return Err(SubmitError::UnknownTexture {
                texture: texture.to_string(),
            });
        }
        sprite.validate()?;

        let queued = QueuedSprite { sprite, texture };
        if texture.is_transparent() || self.config.transparency == TransparencyMode::Unified {
            self.scene.push_transparent(queued);
        } else {
            self.scene.push_opaque(queued);
        }
        Ok(())
    }

    /// Resolve `name` and queue `sprite`.
    pub fn submit_named(&mut self, sprite: Sprite, name: &str) -> Result<(), SubmitError> {
        let texture = self
            .texture_ref(name)
            .ok_or_else(|| SubmitError::UnknownTexture {
                texture: name.to_string(),
            })?;
        self.submit(sprite, texture)
    }

    /// Draw every queued sprite and empty the queues.
    pub fn draw(&mut self) -> FrameStats {
        self.renderer.draw(
            &mut self.backend,
            &mut self.scene,
            &mut self.camera,
            &self.atlas,
        )
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    pub fn scene(&self) -> &SceneBuffer {
        &self.scene
    }

    pub fn renderer(&self) -> &BatchRenderer {
        &self.renderer
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
