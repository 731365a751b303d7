//! Per-frame sprite queues.

use tessera_core::math::Vec2;

use crate::atlas::TextureRef;
use crate::error::SubmitError;

/// Sprite size: a single scale (square mesh) or separate width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteSize {
    Uniform(f32),
    Rect(Vec2),
}

impl SpriteSize {
    /// Per-axis scale written to the instance stream.
    pub fn scale(self) -> Vec2 {
        match self {
            SpriteSize::Uniform(size) => Vec2::splat(size),
            SpriteSize::Rect(size) => size,
        }
    }
}

impl From<f32> for SpriteSize {
    fn from(size: f32) -> Self {
        SpriteSize::Uniform(size)
    }
}

impl From<Vec2> for SpriteSize {
    fn from(size: Vec2) -> Self {
        SpriteSize::Rect(size)
    }
}

/// One sprite to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub size: SpriteSize,
    /// Radians, counter-clockwise.
    pub rotation: f32,
    /// Compositing key in `[0, 1)`; smaller is nearer the viewer.
    pub depth: f32,
}

impl Sprite {
    pub fn new(position: Vec2, size: impl Into<SpriteSize>) -> Self {
        Self {
            position,
            size: size.into(),
            rotation: 0.0,
            depth: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SubmitError> {
        if self.depth.is_finite() && (0.0..1.0).contains(&self.depth) {
            Ok(())
        } else {
            Err(SubmitError::InvalidDepth { depth: self.depth })
        }
    }
}

/// A sprite paired with its resolved texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedSprite {
    pub sprite: Sprite,
    pub texture: TextureRef,
}

impl QueuedSprite {
    pub fn depth(&self) -> f32 {
        self.sprite.depth
    }
}

/// Opaque and transparent queues for the current frame.
///
/// Clearing truncates both queues and keeps their capacity.
#[derive(Debug, Clone, Default)]
pub struct SceneBuffer {
    opaque: Vec<QueuedSprite>,
    transparent: Vec<QueuedSprite>,
}

impl SceneBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            opaque: Vec::with_capacity(capacity),
            transparent: Vec::with_capacity(capacity),
        }
    }

    pub fn push_opaque(&mut self, sprite: QueuedSprite) {
        self.opaque.push(sprite);
    }

    pub fn push_transparent(&mut self, sprite: QueuedSprite) {
        self.transparent.push(sprite);
    }

    pub fn opaque(&self) -> &[QueuedSprite] {
        &self.opaque
    }

    pub fn transparent(&self) -> &[QueuedSprite] {
        &self.transparent
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    pub fn capacity(&self) -> (usize, usize) {
        (self.opaque.capacity(), self.transparent.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasBuilder, MemorySource};

    fn texture() -> TextureRef {
        let source = MemorySource::new().with_solid("t.png", 1, 1, [0, 0, 0, 255]);
        AtlasBuilder::default()
            .build(&source)
            .unwrap()
            .texture_ref("t.png")
            .unwrap()
    }

    #[test]
    fn test_depth_validation() {
        let sprite = Sprite::new(Vec2::ZERO, 1.0);
        assert!(sprite.with_depth(0.0).validate().is_ok());
        assert!(sprite.with_depth(0.999).validate().is_ok());
        for bad in [1.0, -0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                sprite.with_depth(bad).validate(),
                Err(SubmitError::InvalidDepth { .. })
            ));
        }
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let texture = texture();
        let mut scene = SceneBuffer::with_capacity(4);
        for i in 0..100 {
            let sprite = Sprite::new(Vec2::new(i as f32, 0.0), 1.0);
            scene.push_opaque(QueuedSprite { sprite, texture });
            scene.push_transparent(QueuedSprite { sprite, texture });
        }
        assert_eq!(scene.len(), 200);

        let (opaque, transparent) = scene.capacity();
        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.capacity(), (opaque, transparent));
        assert!(opaque >= 100);
    }

    #[test]
    fn test_sprite_size_scale() {
        assert_eq!(SpriteSize::from(2.0).scale(), Vec2::new(2.0, 2.0));
        assert_eq!(
            SpriteSize::from(Vec2::new(3.0, 1.0)).scale(),
            Vec2::new(3.0, 1.0)
        );
    }
}
