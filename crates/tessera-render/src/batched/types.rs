//! Core types for the batch renderer.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::scene::QueuedSprite;

/// Per-instance data streamed to the GPU.
///
/// 28 bytes, tightly packed, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World-space center.
    pub world_pos: [f32; 2],
    /// Mesh scale per axis. Equal components for the square mesh.
    pub scale: [f32; 2],
    /// Rotation in radians.
    pub angle: f32,
    /// Normalised depth, written straight to clip-space Z.
    pub depth: f32,
    /// Layer within the bound texture array.
    pub layer: u32,
}

const_assert_eq!(std::mem::size_of::<SpriteInstance>(), 28);

impl SpriteInstance {
    /// Size of the instance in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_queued(queued: &QueuedSprite) -> Self {
        let sprite = &queued.sprite;
        Self {
            world_pos: sprite.position.to_array(),
            scale: sprite.size.scale().to_array(),
            angle: sprite.rotation,
            depth: sprite.depth,
            layer: queued.texture.layer(),
        }
    }

    /// Returns the wgpu vertex buffer layout for instanced rendering.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            // location 2: world_pos (vec2)
            2 => Float32x2,
            // location 3: scale (vec2)
            3 => Float32x2,
            // location 4: angle (f32)
            4 => Float32,
            // location 5: depth (f32)
            5 => Float32,
            // location 6: layer (u32)
            6 => Uint32,
        ];

        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: ATTRS,
        }
    }
}

/// A contiguous run of instances drawn from one atlas page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawGroup {
    /// Atlas page index.
    pub page: u32,
    /// Start index in the instance buffer.
    pub start: u32,
    /// Number of instances in this group.
    pub count: u32,
}

/// Rendering statistics for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Total number of instances rendered.
    pub instances: u32,
    /// Number of opaque instances.
    pub opaque: u32,
    /// Number of transparent instances.
    pub transparent: u32,
    /// Passes begun.
    pub passes: u32,
    /// Number of GPU draw calls issued.
    pub draw_calls: u32,
    /// Number of texture array binds.
    pub texture_binds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasBuilder, MemorySource};
    use crate::scene::Sprite;
    use glam::Vec2;

    #[test]
    fn test_instance_size() {
        assert_eq!(SpriteInstance::SIZE, 28);
        assert_eq!(std::mem::align_of::<SpriteInstance>(), 4);
    }

    #[test]
    fn test_instance_field_order() {
        let source = MemorySource::new()
            .with_solid("a.png", 1, 1, [0, 0, 0, 255])
            .with_solid("b.png", 1, 1, [0, 0, 0, 255]);
        let atlas = AtlasBuilder::default().build(&source).unwrap();
        let queued = QueuedSprite {
            sprite: Sprite::new(Vec2::new(1.0, 2.0), 3.0)
                .with_rotation(4.0)
                .with_depth(0.5),
            texture: atlas.texture_ref("b.png").unwrap(),
        };

        let instance = SpriteInstance::from_queued(&queued);
        let bytes = bytemuck::bytes_of(&instance);
        let floats: &[f32] = bytemuck::cast_slice(&bytes[..24]);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 3.0, 4.0, 0.5]);
        assert_eq!(u32::from_ne_bytes(bytes[24..28].try_into().unwrap()), 1);
    }
}
