//! Geometry-processing algorithms over [`MeshData`].
//!
//! All algorithms are pure CPU and operate on the authoritative vertex/index
//! arrays; the [`Mesh`] wrappers mark the GPU mirror dirty. Degenerate input
//! (zero-area triangles, zero-length normals) is substituted with a zero
//! contribution and counted, never propagated as a hard failure; real meshes
//! routinely contain a few degenerate faces.

use std::collections::HashMap;

use glam::{Mat3, Mat4, Vec3};

use super::mesh::{Mesh, MeshData};
use super::vertex::Vertex;

/// Bit-exact key over a position, for positional adjacency.
#[derive(Hash, PartialEq, Eq, Clone, Copy)]
struct PositionKey([u32; 3]);

impl PositionKey {
    fn of(p: [f32; 3]) -> Self {
        Self([p[0].to_bits(), p[1].to_bits(), p[2].to_bits()])
    }
}

/// Bit-exact key over all vertex attributes, for exact-duplicate dedup.
#[derive(Hash, PartialEq, Eq, Clone, Copy)]
struct VertexKey([u32; 12]);

impl VertexKey {
    fn of(v: &Vertex) -> Self {
        let mut bits = [0u32; 12];
        for (i, f) in v
            .position
            .iter()
            .chain(v.normal.iter())
            .chain(v.uv.iter())
            .chain(v.color.iter())
            .enumerate()
        {
            bits[i] = f.to_bits();
        }
        Self(bits)
    }
}

impl MeshData {
    /// Accumulate area-weighted face normals into each incident vertex and
    /// normalize the sums. Zero-area triangles contribute nothing; a vertex
    /// touched only by degenerate faces keeps a zero normal rather than NaN.
    ///
    /// Returns the number of degenerate triangles encountered.
    pub fn compute_normals(&mut self) -> usize {
        for v in &mut self.vertices {
            v.set_normal(Vec3::ZERO);
        }

        let mut degenerate = 0usize;
        let triangles: Vec<[u32; 3]> = self.triangles().collect();
        for [i0, i1, i2] in triangles {
            let p0 = self.vertices[i0 as usize].position();
            let p1 = self.vertices[i1 as usize].position();
            let p2 = self.vertices[i2 as usize].position();

            // Cross product length is twice the triangle area, so summing the
            // raw cross products area-weights the per-vertex average.
            let face = (p1 - p0).cross(p2 - p0);
            if face.length_squared() == 0.0 {
                degenerate += 1;
                continue;
            }

            for &i in &[i0, i1, i2] {
                let v = &mut self.vertices[i as usize];
                v.set_normal(v.normal() + face);
            }
        }

        for v in &mut self.vertices {
            v.set_normal(v.normal().normalize_or_zero());
        }

        if degenerate > 0 {
            log::debug!("compute_normals: skipped {degenerate} degenerate triangles");
        }
        degenerate
    }

    /// Re-average normals across shared vertex *positions*, not just shared
    /// indices: vertices duplicated at the same position (seams, per-face
    /// attributes) converge to one smoothed normal.
    pub fn smooth_normals(&mut self) {
        let mut sums: HashMap<PositionKey, Vec3> = HashMap::with_capacity(self.vertices.len());
        for v in &self.vertices {
            *sums.entry(PositionKey::of(v.position)).or_insert(Vec3::ZERO) += v.normal();
        }
        for v in &mut self.vertices {
            let sum = sums[&PositionKey::of(v.position)];
            v.set_normal(sum.normalize_or_zero());
        }
    }

    /// Negate every stored normal. Pairs with [`flip_faces`](Self::flip_faces)
    /// to correct inside-out geometry.
    pub fn swap_normals(&mut self) {
        for v in &mut self.vertices {
            v.set_normal(-v.normal());
        }
    }

    /// Reverse triangle winding by swapping the second and third corner of
    /// every triangle (index list if present, otherwise the vertices).
    pub fn flip_faces(&mut self) {
        if self.has_indices() {
            for tri in self.indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        } else {
            for tri in self.vertices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
    }

    /// Deduplicate exactly identical vertices (bit-exact match over
    /// position+normal+uv+color) and emit an index list over the reduced set.
    /// No-op if the mesh already has indices.
    pub fn calculate_indices(&mut self) {
        if self.has_indices() {
            return;
        }

        let mut remap: HashMap<VertexKey, u32> = HashMap::with_capacity(self.vertices.len());
        let mut unique: Vec<Vertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::with_capacity(self.vertices.len());

        for v in &self.vertices {
            let index = *remap.entry(VertexKey::of(v)).or_insert_with(|| {
                unique.push(*v);
                (unique.len() - 1) as u32
            });
            indices.push(index);
        }

        log::debug!(
            "calculate_indices: {} vertices -> {} unique",
            self.vertices.len(),
            unique.len()
        );
        self.vertices = unique;
        self.indices = indices;
    }

    /// Drop vertices never referenced by an index and remap the remaining
    /// indices contiguously. Idempotent. Postcondition: every index < the new
    /// vertex count. No-op for unindexed meshes.
    pub fn remove_unused_vertices(&mut self) {
        if !self.has_indices() {
            return;
        }

        let mut remap: Vec<Option<u32>> = vec![None; self.vertices.len()];
        let mut kept: Vec<Vertex> = Vec::new();

        for index in &mut self.indices {
            let slot = &mut remap[*index as usize];
            let new_index = match slot {
                Some(n) => *n,
                None => {
                    kept.push(self.vertices[*index as usize]);
                    let n = (kept.len() - 1) as u32;
                    *slot = Some(n);
                    n
                }
            };
            *index = new_index;
        }

        self.vertices = kept;
        debug_assert!(self.validate().is_ok());
    }

    /// Bake a transform into positions and normals. Normals use the
    /// inverse-transpose of the upper 3x3 and are renormalized.
    pub fn transform(&mut self, matrix: Mat4) {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        for v in &mut self.vertices {
            v.set_position(matrix.transform_point3(v.position()));
            v.set_normal((normal_matrix * v.normal()).normalize_or_zero());
        }
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.set_position(v.position() + offset);
        }
    }
}

// Mutating wrappers: run the MeshData algorithm, then dirty the mirror.
impl Mesh {
    pub fn compute_normals(&mut self) -> usize {
        self.data_mut().compute_normals()
    }

    pub fn smooth_normals(&mut self) {
        self.data_mut().smooth_normals();
    }

    pub fn swap_normals(&mut self) {
        self.data_mut().swap_normals();
    }

    pub fn flip_faces(&mut self) {
        self.data_mut().flip_faces();
    }

    pub fn calculate_indices(&mut self) {
        self.data_mut().calculate_indices();
    }

    pub fn remove_unused_vertices(&mut self) {
        self.data_mut().remove_unused_vertices();
    }

    /// Bake the current model transform into the vertex data and reset the
    /// transform to identity, so later geometry algorithms all operate in the
    /// same local frame.
    pub fn apply_transform(&mut self) {
        let matrix = self.transform();
        self.data_mut().transform(matrix);
        self.set_transform(Mat4::IDENTITY);
    }

    /// Translate the geometry so the bounding-box center sits at the origin.
    /// (Bounding-box center rather than centroid: cheap and independent of
    /// triangulation density.)
    pub fn center_origin(&mut self) {
        let center = self.bounding_box_or_compute().center();
        self.data_mut().translate(-center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::DrawMode;
    use glam::{Vec2, Vec4};

    fn quad_unindexed() -> MeshData {
        // Flat quad in the XY plane, z = 0, as two CCW triangles with
        // duplicated shared corners
        let p = |x: f32, y: f32| Vec3::new(x, y, 0.0);
        let v = |pos: Vec3| Vertex::new(pos, Vec3::ZERO, Vec2::ZERO, Vec4::ONE);
        MeshData::new(
            vec![
                v(p(0.0, 0.0)),
                v(p(1.0, 0.0)),
                v(p(1.0, 1.0)),
                v(p(0.0, 0.0)),
                v(p(1.0, 1.0)),
                v(p(0.0, 1.0)),
            ],
            vec![],
        )
    }

    #[test]
    fn test_flat_quad_normals_all_equal_face_normal() {
        let mut quad = quad_unindexed();
        let degenerate = quad.compute_normals();
        assert_eq!(degenerate, 0);

        for v in &quad.vertices {
            let n = v.normal();
            assert!((n - Vec3::Z).length() < 1e-6, "normal {n} should be +Z");
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_triangle_yields_zero_normal_not_nan() {
        let v = Vertex::at(Vec3::ONE);
        let mut data = MeshData::new(vec![v, v, v], vec![]);
        let degenerate = data.compute_normals();

        assert_eq!(degenerate, 1);
        for v in &data.vertices {
            assert_eq!(v.normal(), Vec3::ZERO);
            assert!(!v.normal().is_nan());
        }
    }

    #[test]
    fn test_smooth_normals_converges_coincident_positions() {
        // Two triangles sharing an edge positionally but with independent
        // vertices; fold them so face normals differ
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(0.5, 1.0, 0.0);
        let d = Vec3::new(0.5, -1.0, 0.5);
        let v = Vertex::at;
        let mut data = MeshData::new(vec![v(a), v(b), v(c), v(b), v(a), v(d)], vec![]);

        data.compute_normals();
        data.smooth_normals();

        // Vertex 0 and vertex 4 are both at `a` and must agree after smoothing
        assert_eq!(data.vertices[0].normal, data.vertices[4].normal);
        assert_eq!(data.vertices[1].normal, data.vertices[3].normal);
    }

    #[test]
    fn test_swap_normals_and_flip_faces_invert_orientation() {
        let mut quad = quad_unindexed();
        quad.compute_normals();
        quad.flip_faces();
        quad.swap_normals();
        quad.compute_normals();

        // After flipping the winding, recomputed normals face -Z
        for v in &quad.vertices {
            assert!((v.normal() - Vec3::NEG_Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_calculate_indices_roundtrip() {
        let mut quad = quad_unindexed();
        let original = quad.vertices.clone();

        quad.calculate_indices();
        assert_eq!(quad.vertices.len(), 4); // two duplicated corners removed
        assert_eq!(quad.indices.len(), 6);
        assert!(quad.validate().is_ok());

        // Expanding back through the indices reproduces the original list
        let expanded: Vec<Vertex> = quad
            .indices
            .iter()
            .map(|&i| quad.vertices[i as usize])
            .collect();
        assert_eq!(expanded, original);
    }

    #[test]
    fn test_remove_unused_vertices_idempotent() {
        let v = Vertex::at;
        let mut data = MeshData::new(
            vec![
                v(Vec3::ZERO),
                v(Vec3::splat(9.0)), // unused
                v(Vec3::X),
                v(Vec3::Y),
                v(Vec3::splat(8.0)), // unused
            ],
            vec![0, 2, 3],
        );

        data.remove_unused_vertices();
        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.indices, vec![0, 1, 2]);
        assert!(data.indices.iter().all(|&i| (i as usize) < data.vertices.len()));

        let after_once = (data.vertices.clone(), data.indices.clone());
        data.remove_unused_vertices();
        assert_eq!((data.vertices.clone(), data.indices.clone()), after_once);
    }

    #[test]
    fn test_apply_transform_bakes_and_resets() {
        let quad = quad_unindexed();
        let mut mesh = Mesh::new("quad", quad.vertices, quad.indices, DrawMode::TriangleList);
        mesh.compute_normals();
        mesh.set_transform(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));

        mesh.apply_transform();
        assert_eq!(mesh.transform(), Mat4::IDENTITY);
        assert_eq!(mesh.data().vertices[0].position(), Vec3::new(2.0, 0.0, 0.0));
        // Pure translation leaves normals untouched
        assert!((mesh.data().vertices[0].normal() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_center_origin_moves_bbox_center_to_origin() {
        let quad = quad_unindexed();
        let mut mesh = Mesh::new("quad", quad.vertices, quad.indices, DrawMode::TriangleList);
        mesh.center_origin();

        let bb = mesh.bounding_box_or_compute();
        assert!(bb.center().length() < 1e-6);
    }
}
