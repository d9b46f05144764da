//! Voxelization and signed-distance-field evaluation.
//!
//! The voxel grid is bounded by the mesh bounding box with
//! `ceil(extent / cell_size)` cells per axis, stored as parallel arrays:
//! occupancy, cell-center position, and (once computed) one SDF sample per
//! cell.
//!
//! ## Sign convention
//!
//! Signed distance is **positive outside, negative inside**, for both the
//! point query [`MeshData::sdf`] and the precomputed grid samples; the sample
//! gradient (xyz) points in the direction of increasing signed distance. The
//! two paths share one implementation, so they cannot disagree.

use std::num::NonZeroUsize;

use glam::{UVec3, Vec3, Vec4};

use super::mesh::{GeometryError, Mesh, MeshData};

/// Regular voxel grid produced by [`Mesh::voxelize`] /
/// [`Mesh::voxelize_surface`]; read-only thereafter until regenerated.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    pub cell_size: f32,
    /// World position of the grid's min corner (bounding-box min).
    pub origin: Vec3,
    pub dims: UVec3,
    /// 1 = occupied, 0 = empty, per cell.
    pub occupancy: Vec<i32>,
    /// Cell center positions, parallel to `occupancy`.
    pub centers: Vec<Vec3>,
    /// SDF sample per cell (xyz gradient, w signed distance); empty until
    /// [`Mesh::compute_sdf`] runs.
    pub sdf: Vec<Vec4>,
}

impl VoxelGrid {
    pub fn cell_count(&self) -> usize {
        (self.dims.x * self.dims.y * self.dims.z) as usize
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&o| o != 0).count()
    }

    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (x + y * self.dims.x + z * self.dims.x * self.dims.y) as usize
    }
}

/// Closest point to `p` on triangle `(a, b, c)` (Ericson, Real-Time
/// Collision Detection §5.1.5).
fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Möller–Trumbore ray/triangle intersection; returns the ray parameter `t`
/// for hits with `t > eps`.
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-7;

    let ab = b - a;
    let ac = c - a;
    let pvec = dir.cross(ac);
    let det = ab.dot(pvec);
    if det.abs() < EPS {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(ab);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = ac.dot(qvec) * inv_det;
    (t > EPS).then_some(t)
}

impl MeshData {
    /// Triangle corner positions, resolved through the index list.
    fn triangle_positions(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles().map(|[i0, i1, i2]| {
            [
                self.vertices[i0 as usize].position(),
                self.vertices[i1 as usize].position(),
                self.vertices[i2 as usize].position(),
            ]
        })
    }

    /// Ray parameters where `origin + t * dir` crosses the surface, sorted
    /// ascending. A ray through an edge shared by two triangles hits both at
    /// the same `t`; the merge keeps one crossing so parity stays correct.
    fn ray_crossings(&self, origin: Vec3, dir: Vec3) -> Vec<f32> {
        let mut ts: Vec<f32> = self
            .triangle_positions()
            .filter_map(|[a, b, c]| ray_triangle(origin, dir, a, b, c))
            .collect();
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() <= 1e-5 * b.abs().max(1.0));
        ts
    }

    /// Parity test: casts a ray along +X and counts crossings. Odd = inside.
    /// Approximate for points exactly on edges, like any parity test.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.ray_crossings(p, Vec3::X).len() % 2 == 1
    }

    /// Evaluate the signed distance field at an arbitrary point.
    ///
    /// Returns xyz = gradient (direction of increasing signed distance,
    /// zero exactly on the surface) and w = signed distance (positive
    /// outside). Well-defined arbitrarily far from the mesh: distance grows
    /// as the Euclidean distance to the nearest surface point, sign stays
    /// positive.
    pub fn sdf(&self, p: Vec3) -> Vec4 {
        let mut best_dist_sq = f32::INFINITY;
        let mut best_point = p;

        for [a, b, c] in self.triangle_positions() {
            let q = closest_point_on_triangle(p, a, b, c);
            let d = (p - q).length_squared();
            if d < best_dist_sq {
                best_dist_sq = d;
                best_point = q;
            }
        }

        let distance = best_dist_sq.sqrt();
        let sign = if self.contains_point(p) { -1.0 } else { 1.0 };
        // Outside, signed distance increases away from the surface; inside,
        // it increases (toward zero) in the direction of the surface.
        let gradient = ((p - best_point) * sign).normalize_or_zero();
        gradient.extend(sign * distance)
    }

    /// Unsigned distance from `p` to the surface.
    pub fn surface_distance(&self, p: Vec3) -> f32 {
        let mut best = f32::INFINITY;
        for [a, b, c] in self.triangle_positions() {
            let q = closest_point_on_triangle(p, a, b, c);
            best = best.min((p - q).length_squared());
        }
        best.sqrt()
    }
}

/// Bounding-box-derived grid shell: dims, origin, and cell centers.
fn grid_shell(mesh: &mut Mesh, cell_size: f32) -> Result<VoxelGrid, GeometryError> {
    if !(cell_size > 0.0) {
        return Err(GeometryError::InvalidCellSize(cell_size));
    }
    if mesh.data().vertices.is_empty() {
        return Err(GeometryError::EmptyMesh);
    }

    let bb = mesh.bounding_box_or_compute();
    let extent = bb.extent();
    let dims = UVec3::new(
        (extent.x / cell_size).ceil().max(1.0) as u32,
        (extent.y / cell_size).ceil().max(1.0) as u32,
        (extent.z / cell_size).ceil().max(1.0) as u32,
    );

    let cell_count = (dims.x * dims.y * dims.z) as usize;
    let mut centers = Vec::with_capacity(cell_count);
    for z in 0..dims.z {
        for y in 0..dims.y {
            for x in 0..dims.x {
                centers.push(
                    bb.min
                        + Vec3::new(
                            (x as f32 + 0.5) * cell_size,
                            (y as f32 + 0.5) * cell_size,
                            (z as f32 + 0.5) * cell_size,
                        ),
                );
            }
        }
    }

    Ok(VoxelGrid {
        cell_size,
        origin: bb.min,
        dims,
        occupancy: vec![0; cell_count],
        centers,
        sdf: Vec::new(),
    })
}

impl Mesh {
    /// Rasterize the enclosed volume into a regular grid of `cell_size`,
    /// bounded by the bounding box (computed first if absent). Interior fill
    /// uses X-ray crossing parity per (y,z) column. With `with_sdf`, also
    /// precomputes one SDF sample per cell on a single worker.
    pub fn voxelize(&mut self, cell_size: f32, with_sdf: bool) -> Result<(), GeometryError> {
        let mut grid = grid_shell(self, cell_size)?;
        let data = self.data();

        // One ray per column: collect the x positions where the column's
        // center line crosses the surface, then fill cells by parity.
        for z in 0..grid.dims.z {
            for y in 0..grid.dims.y {
                let center = grid.centers[grid.index(0, y, z)];
                let ray_origin = Vec3::new(grid.origin.x - grid.cell_size, center.y, center.z);

                let crossings: Vec<f32> = data
                    .ray_crossings(ray_origin, Vec3::X)
                    .iter()
                    .map(|t| ray_origin.x + t)
                    .collect();

                for x in 0..grid.dims.x {
                    let index = grid.index(x, y, z);
                    let cx = grid.centers[index].x;
                    let below = crossings.partition_point(|&c| c < cx);
                    if below % 2 == 1 {
                        grid.occupancy[index] = 1;
                    }
                }
            }
        }

        let occupied = grid.occupied_count();
        log::debug!(
            "voxelize '{}': {}x{}x{} cells, {} occupied",
            self.name(),
            grid.dims.x,
            grid.dims.y,
            grid.dims.z,
            occupied
        );

        self.set_voxels(grid);
        if with_sdf {
            self.compute_sdf(NonZeroUsize::MIN)?;
        }
        Ok(())
    }

    /// Rasterize only a shell of the given thickness around the surface: a
    /// cell is occupied iff its center lies within `thickness` of the
    /// surface. Interior cells beyond the shell stay empty, unlike
    /// [`voxelize`](Self::voxelize).
    pub fn voxelize_surface(
        &mut self,
        cell_size: f32,
        thickness: f32,
    ) -> Result<(), GeometryError> {
        let mut grid = grid_shell(self, cell_size)?;
        let data = self.data();

        for (index, &center) in grid.centers.iter().enumerate() {
            if data.surface_distance(center) <= thickness {
                grid.occupancy[index] = 1;
            }
        }

        self.set_voxels(grid);
        Ok(())
    }

    /// Precompute the SDF over the voxel grid, partitioning the cell set
    /// across `threads` workers. Each cell's sample depends only on the
    /// read-only mesh geometry and writes a disjoint output slot, so the
    /// workers need no synchronization beyond the final join (provided by
    /// `std::thread::scope`).
    pub fn compute_sdf(&mut self, threads: NonZeroUsize) -> Result<(), GeometryError> {
        let Some(grid) = self.voxels() else {
            return Err(GeometryError::NoVoxelGrid);
        };

        let centers = grid.centers.clone();
        let mut samples = vec![Vec4::ZERO; centers.len()];
        let data = self.data();

        let chunk = centers.len().div_ceil(threads.get()).max(1);
        std::thread::scope(|scope| {
            for (center_chunk, sample_chunk) in
                centers.chunks(chunk).zip(samples.chunks_mut(chunk))
            {
                scope.spawn(move || {
                    for (center, sample) in center_chunk.iter().zip(sample_chunk.iter_mut()) {
                        *sample = data.sdf(*center);
                    }
                });
            }
        });

        // voxels() returned Some above
        if let Some(grid) = self.voxels_mut() {
            grid.sdf = samples;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::DrawMode;
    use crate::geometry::primitives;

    fn cube_mesh() -> Mesh {
        let data = primitives::unit_cube();
        Mesh::new("cube", data.vertices, data.indices, DrawMode::TriangleList)
    }

    #[test]
    fn test_voxelize_single_cell_when_cell_equals_extent() {
        let mut cube = cube_mesh();
        cube.voxelize(1.0, false).unwrap();

        let grid = cube.voxels().unwrap();
        assert_eq!(grid.dims, UVec3::ONE);
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.centers[0], Vec3::ZERO);
    }

    #[test]
    fn test_voxelize_fills_interior() {
        let mut cube = cube_mesh();
        cube.voxelize(0.25, false).unwrap();

        let grid = cube.voxels().unwrap();
        assert_eq!(grid.dims, UVec3::splat(4));
        // Every cell center of the 4^3 grid lies inside the cube
        assert_eq!(grid.occupied_count(), 64);
    }

    #[test]
    fn test_voxelize_surface_leaves_interior_empty() {
        let mut cube = cube_mesh();
        // 8^3 grid, shell thickness of one cell: the 6^3 core block of cells
        // (centers > 0.125 from every face) stays empty
        cube.voxelize_surface(0.125, 0.1).unwrap();

        let shell = cube.voxels().unwrap().occupied_count();
        assert_eq!(shell, 8 * 8 * 8 - 6 * 6 * 6);

        cube.voxelize(0.125, false).unwrap();
        assert_eq!(cube.voxels().unwrap().occupied_count(), 8 * 8 * 8);
    }

    #[test]
    fn test_sdf_far_point_is_positive_euclidean() {
        let cube = primitives::unit_cube();

        // Directly off the +X face: nearest surface point is (0.5, 0, 0)
        let sample = cube.sdf(Vec3::new(10.0, 0.0, 0.0));
        assert!((sample.w - 9.5).abs() < 1e-4);
        assert!((sample.truncate() - Vec3::X).length() < 1e-4);

        // Off a corner
        let p = Vec3::splat(2.0);
        let sample = cube.sdf(p);
        let expected = (p - Vec3::splat(0.5)).length();
        assert!((sample.w - expected).abs() < 1e-4);
        assert!(sample.w > 0.0);
    }

    #[test]
    fn test_sdf_inside_is_negative() {
        let cube = primitives::unit_cube();

        let sample = cube.sdf(Vec3::new(0.2, 0.0, 0.0));
        // Nearest face is +X at distance 0.3
        assert!((sample.w + 0.3).abs() < 1e-4);
        // Gradient points toward increasing distance: +X
        assert!((sample.truncate() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_contains_point_parity() {
        let cube = primitives::unit_cube();
        assert!(cube.contains_point(Vec3::new(0.1, 0.2, -0.3)));
        assert!(!cube.contains_point(Vec3::new(0.7, 0.0, 0.0)));
        assert!(!cube.contains_point(Vec3::new(100.0, 3.0, -2.0)));
    }

    #[test]
    fn test_parity_counts_shared_edge_crossing_once() {
        let cube = primitives::unit_cube();
        // A +X ray with y == z crosses the +X face exactly on the diagonal
        // shared by its two triangles; that crossing must count once.
        assert!(cube.contains_point(Vec3::new(0.2, 0.0, 0.0)));
        assert!(cube.contains_point(Vec3::new(-0.3, 0.25, 0.25)));
        assert!(!cube.contains_point(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(cube.ray_crossings(Vec3::new(-1.5, 0.0, 0.0), Vec3::X).len(), 2);
    }

    #[test]
    fn test_compute_sdf_multithreaded_matches_point_query() {
        let mut cube = cube_mesh();
        cube.voxelize(0.5, false).unwrap();
        cube.compute_sdf(NonZeroUsize::new(4).unwrap()).unwrap();

        let data = cube.data().clone();
        let grid = cube.voxels().unwrap();
        assert_eq!(grid.sdf.len(), grid.cell_count());
        for (center, sample) in grid.centers.iter().zip(grid.sdf.iter()) {
            assert_eq!(*sample, data.sdf(*center));
        }
        // 2^3 grid of a unit cube: every center is inside
        assert!(grid.sdf.iter().all(|s| s.w < 0.0));
    }

    #[test]
    fn test_compute_sdf_without_grid_fails() {
        let mut cube = cube_mesh();
        assert!(matches!(
            cube.compute_sdf(NonZeroUsize::MIN),
            Err(GeometryError::NoVoxelGrid)
        ));
    }
}
