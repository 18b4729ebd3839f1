// Procedural geometry for the drawables

use std::f32::consts::{PI, TAU};

/// Vertex layout shared by every mesh: position and colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side vertex and index data for one mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Two-triangle square spanning [-1, 1] in the XY plane, facing +Z.
pub fn quad(color: [f32; 3]) -> MeshData {
    let corners = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
    let vertices = corners
        .iter()
        .map(|&[x, y]| Vertex {
            position: [x, y, 0.0],
            color,
        })
        .collect();

    // Both windings so the quad stays visible from either side.
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 2, 3, 0,
        0, 2, 1, 2, 0, 3,
    ];

    MeshData { vertices, indices }
}

/// Upper bound for `uv_sphere` stacks and slices: 256 x 256 vertices fill
/// the `u16` index range exactly.
pub const MAX_SPHERE_SEGMENTS: u16 = 255;

/// Unit-radius UV sphere.
///
/// Vertices facing +Z within `pupil_angle` radians of the pole are painted
/// with `pupil` instead of `color`, which is what turns a plain sphere into
/// the eyeball. Pass `0.0` for a uniformly coloured sphere.
pub fn uv_sphere(stacks: u16, slices: u16, color: [f32; 3], pupil: [f32; 3], pupil_angle: f32) -> MeshData {
    // (stacks + 1) * (slices + 1) vertices must stay addressable by u16
    let stacks = stacks.clamp(2, MAX_SPHERE_SEGMENTS);
    let slices = slices.clamp(3, MAX_SPHERE_SEGMENTS);
    let row = usize::from(slices) + 1;
    let mut vertices = Vec::with_capacity((usize::from(stacks) + 1) * row);

    for i in 0..=stacks {
        let phi = PI * f32::from(i) / f32::from(stacks);
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..=slices {
            let theta = TAU * f32::from(j) / f32::from(slices);
            let (sin_theta, cos_theta) = theta.sin_cos();
            let position = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            // angle between this vertex and the +Z axis
            let from_front = position[2].clamp(-1.0, 1.0).acos();
            let color = if from_front < pupil_angle { pupil } else { color };
            vertices.push(Vertex { position, color });
        }
    }

    let mut indices = Vec::with_capacity(usize::from(stacks) * usize::from(slices) * 6);
    for i in 0..usize::from(stacks) {
        for j in 0..usize::from(slices) {
            let a = i * row + j;
            let b = a + row;
            indices.extend([a, a + 1, b, b, a + 1, b + 1].map(|index| index as u16));
        }
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quad_has_four_corners_in_xy_plane() {
        let mesh = quad([0.0, 1.0, 0.0]);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.index_count(), 12);
        assert!(mesh.vertices.iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn sphere_vertices_lie_on_unit_radius() {
        let mesh = uv_sphere(8, 12, [1.0; 3], [0.0; 3], 0.0);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            assert_relative_eq!((x * x + y * y + z * z).sqrt(), 1.0, epsilon = 1e-5);
        }
        let max = mesh.vertices.len() as u16;
        assert!(mesh.indices.iter().all(|&i| i < max));
        assert_eq!(mesh.indices.len(), 8 * 12 * 6);
    }

    #[test]
    fn pupil_only_on_front_cap() {
        let pupil = [0.0, 0.0, 0.0];
        let mesh = uv_sphere(16, 16, [1.0; 3], pupil, 0.4);
        assert!(mesh.vertices.iter().any(|v| v.color == pupil));
        for v in mesh.vertices.iter().filter(|v| v.color == pupil) {
            assert!(v.position[2] > 0.0);
        }
    }

    #[test]
    fn oversized_sphere_is_clamped_to_u16_indices() {
        let mesh = uv_sphere(300, 1000, [1.0; 3], [0.0; 3], 0.0);
        let side = usize::from(MAX_SPHERE_SEGMENTS);
        assert_eq!(mesh.vertices.len(), (side + 1) * (side + 1));
        assert!(mesh.vertices.len() <= usize::from(u16::MAX) + 1);
        assert!(mesh.indices.iter().all(|&i| usize::from(i) < mesh.vertices.len()));
        assert_eq!(mesh.indices.len(), side * side * 6);
        assert_eq!(mesh.indices.last().copied(), Some(u16::MAX));
    }
}
