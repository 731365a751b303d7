//! The shared quad mesh.

use bytemuck::{Pod, Zeroable};

use crate::config::MeshShape;

/// Quad vertex with position and tex_coords.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            tex_coords: [u, v],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            0 => Float32x2,  // position
            1 => Float32x2,  // tex_coords
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

/// Vertices per quad (two triangles).
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Square quad spanning `[-1, 1]`. Texture row 0 is at the top.
pub const SQUARE_VERTICES: [QuadVertex; 6] = [
    QuadVertex::new(-1.0, 1.0, 0.0, 0.0),
    QuadVertex::new(1.0, 1.0, 1.0, 0.0),
    QuadVertex::new(-1.0, -1.0, 0.0, 1.0),
    QuadVertex::new(-1.0, -1.0, 0.0, 1.0),
    QuadVertex::new(1.0, 1.0, 1.0, 0.0),
    QuadVertex::new(1.0, -1.0, 1.0, 1.0),
];

/// Unit quad spanning `[-0.5, 0.5]`.
pub const RECT_VERTICES: [QuadVertex; 6] = [
    QuadVertex::new(-0.5, 0.5, 0.0, 0.0),
    QuadVertex::new(0.5, 0.5, 1.0, 0.0),
    QuadVertex::new(-0.5, -0.5, 0.0, 1.0),
    QuadVertex::new(-0.5, -0.5, 0.0, 1.0),
    QuadVertex::new(0.5, 0.5, 1.0, 0.0),
    QuadVertex::new(0.5, -0.5, 1.0, 1.0),
];

pub fn quad_vertices(shape: MeshShape) -> &'static [QuadVertex; 6] {
    match shape {
        MeshShape::Square => &SQUARE_VERTICES,
        MeshShape::Rect => &RECT_VERTICES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
    }

    #[test]
    fn test_extents() {
        for (shape, half) in [(MeshShape::Square, 1.0), (MeshShape::Rect, 0.5)] {
            let vertices = quad_vertices(shape);
            assert_eq!(vertices.len() as u32, QUAD_VERTEX_COUNT);
            for vertex in vertices {
                assert_eq!(vertex.position[0].abs(), half);
                assert_eq!(vertex.position[1].abs(), half);
            }
        }
    }

    #[test]
    fn test_tex_coords_follow_position() {
        for vertex in SQUARE_VERTICES {
            let u = (vertex.position[0] + 1.0) / 2.0;
            let v = (1.0 - vertex.position[1]) / 2.0;
            assert_eq!(vertex.tex_coords, [u, v]);
        }
    }
}
