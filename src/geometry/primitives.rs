//! Procedural mesh primitives used by the sandbox scene and the geometry
//! tests.

use glam::{Vec2, Vec3, Vec4};

use super::mesh::MeshData;
use super::vertex::Vertex;

/// Axis-aligned unit cube centered at the origin (8 vertices, 12 triangles,
/// outward CCW winding).
pub fn unit_cube() -> MeshData {
    let h = 0.5f32;
    let corners = [
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];
    let vertices = corners.iter().map(|&p| Vertex::at(p)).collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1,  0, 3, 2, // bottom (-Z)
        4, 5, 6,  4, 6, 7, // top (+Z)
        0, 1, 5,  0, 5, 4, // front (-Y)
        2, 3, 7,  2, 7, 6, // back (+Y)
        3, 0, 4,  3, 4, 7, // left (-X)
        1, 2, 6,  1, 6, 5, // right (+X)
    ];

    MeshData::new(vertices, indices)
}

/// Single quad of the given side length in the XY plane, centered at the
/// origin, facing +Z.
pub fn plane(size: f32) -> MeshData {
    let h = size * 0.5;
    let v = |x: f32, y: f32, u: f32, w: f32| {
        Vertex::new(
            Vec3::new(x, y, 0.0),
            Vec3::Z,
            Vec2::new(u, w),
            Vec4::ONE,
        )
    };
    MeshData::new(
        vec![
            v(-h, -h, 0.0, 0.0),
            v(h, -h, 1.0, 0.0),
            v(h, h, 1.0, 1.0),
            v(-h, h, 0.0, 1.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Triangle-fan disc of the given radius in the XY plane, facing +Z.
/// Used as the sandbox floor.
pub fn circle(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(segments as usize + 1);
    vertices.push(Vertex::new(
        Vec3::ZERO,
        Vec3::Z,
        Vec2::splat(0.5),
        Vec4::ONE,
    ));

    for i in 0..segments {
        let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        vertices.push(Vertex::new(
            Vec3::new(cos * radius, sin * radius, 0.0),
            Vec3::Z,
            Vec2::new(cos * 0.5 + 0.5, sin * 0.5 + 0.5),
            Vec4::ONE,
        ));
    }

    let mut indices = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        let next = (i + 1) % segments;
        indices.extend_from_slice(&[0, i + 1, next + 1]);
    }

    MeshData::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_satisfy_index_invariant() {
        assert!(unit_cube().validate().is_ok());
        assert!(plane(2.0).validate().is_ok());
        assert!(circle(30.0, 100).validate().is_ok());
    }

    #[test]
    fn test_circle_counts() {
        let disc = circle(1.0, 16);
        assert_eq!(disc.vertices.len(), 17);
        assert_eq!(disc.triangle_count(), 16);
    }
}
