use glam::Vec3;
use wgpu::util::DeviceExt;

/// Corner `i` has x from bit 0, y from bit 1, z from bit 2 (set = +half).
#[must_use]
pub fn box_corners(size: Vec3) -> [[f32; 3]; 8] {
    let h = size * 0.5;
    std::array::from_fn(|i| {
        let pick = |bit: usize, v: f32| if i & (1 << bit) != 0 { v } else { -v };
        [pick(0, h.x), pick(1, h.y), pick(2, h.z)]
    })
}

/// Triangles of the box, counter-clockwise seen from outside.
pub const BOX_INDICES: [u16; 36] = [
    0, 4, 6, 0, 6, 2, // -x
    1, 3, 7, 1, 7, 5, // +x
    0, 1, 5, 0, 5, 4, // -y
    2, 6, 7, 2, 7, 3, // +y
    0, 2, 3, 0, 3, 1, // -z
    4, 5, 7, 4, 7, 6, // +z
];

/// GPU vertex and index buffers of the bounding box.
pub struct BoxMesh {
    /// `Float32x3` positions.
    pub vertex_buffer: wgpu::Buffer,
    /// `Uint16` indices.
    pub index_buffer: wgpu::Buffer,
    size: Vec3,
}

impl BoxMesh {
    /// Origin-centered box with extents `size`.
    #[must_use]
    pub fn new(device: &wgpu::Device, size: Vec3) -> Self {
        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("SDF Box Vertices"),
                contents: bytemuck::cast_slice(&box_corners(size)),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("SDF Box Indices"),
                contents: bytemuck::cast_slice(&BOX_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            vertex_buffer,
            index_buffer,
            size,
        }
    }

    /// Extents the buffers were built for.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Number of indices to draw.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        BOX_INDICES.len() as u32
    }

    /// Vertex layout of [`vertex_buffer`](Self::vertex_buffer).
    #[must_use]
    pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] =
            wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_span_size() {
        let corners = box_corners(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(corners[0], [-1.0, -2.0, -3.0]);
        assert_eq!(corners[7], [1.0, 2.0, 3.0]);
        assert_eq!(corners[5], [1.0, -2.0, 3.0]);
    }

    #[test]
    fn triangles_face_outward() {
        let corners = box_corners(Vec3::ONE).map(Vec3::from);
        for tri in BOX_INDICES.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| corners[tri[i] as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {tri:?}");
        }
    }
}
