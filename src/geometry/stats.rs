//! Derived mesh statistics: counts, bounds, area, signed volume, centroid,
//! mass, compactness, and a closedness heuristic.

use std::collections::HashMap;

use glam::{DVec3, Vec3};

use super::mesh::MeshData;

/// Summary statistics for a triangle mesh, in millimeters.
///
/// Pure function of the vertex/index data plus a unit scale and density;
/// computing it never mutates the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStats {
    pub num_vertices: usize,
    pub num_triangles: usize,

    pub bb_min_mm: Vec3,
    pub bb_max_mm: Vec3,
    pub size_mm: Vec3,

    /// Surface area in mm^2.
    pub surface_area_mm2: f64,
    /// Signed volume in mm^3: negative means inverted winding, a diagnostic,
    /// not an error.
    pub volume_mm3: f64,
    /// Volume-weighted centroid in mm.
    pub centroid_mm: DVec3,

    /// `|volume| * density` when a density was supplied, otherwise 0.
    pub mass_g: f64,
    /// `36*pi*V^2 / A^3`; 1.0 for a sphere, < 1.0 for everything else.
    pub compactness: f64,
    /// Heuristic: every undirected edge shared by exactly two triangles.
    /// Approximate, not a formal watertightness proof.
    pub seems_closed: bool,
}

impl MeshData {
    /// Compute [`MeshStats`].
    ///
    /// `unit_to_mm` scales model units to millimeters;
    /// `density_g_per_cm3` > 0 additionally yields a mass.
    ///
    /// Signed volume sums signed tetrahedra from the origin to each triangle,
    /// so a consistently outward-wound closed mesh yields a positive value.
    pub fn compute_mesh_stats(&self, unit_to_mm: f32, density_g_per_cm3: f64) -> MeshStats {
        let scale = unit_to_mm as f64;

        let mut bb_min = Vec3::splat(f32::INFINITY);
        let mut bb_max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            bb_min = bb_min.min(v.position());
            bb_max = bb_max.max(v.position());
        }
        if self.vertices.is_empty() {
            bb_min = Vec3::ZERO;
            bb_max = Vec3::ZERO;
        }

        let mut area = 0.0f64;
        let mut volume = 0.0f64;
        let mut centroid_accum = DVec3::ZERO;
        let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

        for [i0, i1, i2] in self.triangles() {
            let p0 = self.vertices[i0 as usize].position().as_dvec3() * scale;
            let p1 = self.vertices[i1 as usize].position().as_dvec3() * scale;
            let p2 = self.vertices[i2 as usize].position().as_dvec3() * scale;

            area += 0.5 * (p1 - p0).cross(p2 - p0).length();

            // Signed tetrahedron from the origin; its centroid is the average
            // of its four corners, one of which is the origin.
            let tet_volume = p0.dot(p1.cross(p2)) / 6.0;
            volume += tet_volume;
            centroid_accum += tet_volume * (p0 + p1 + p2) / 4.0;

            for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
                let edge = if a < b { (a, b) } else { (b, a) };
                *edge_counts.entry(edge).or_insert(0) += 1;
            }
        }

        let centroid_mm = if volume.abs() > f64::EPSILON {
            centroid_accum / volume
        } else {
            DVec3::ZERO
        };

        let compactness = if area > 0.0 {
            36.0 * std::f64::consts::PI * volume * volume / (area * area * area)
        } else {
            0.0
        };

        let mass_g = if density_g_per_cm3 > 0.0 {
            // mm^3 -> cm^3
            volume.abs() / 1000.0 * density_g_per_cm3
        } else {
            0.0
        };

        let seems_closed =
            !edge_counts.is_empty() && edge_counts.values().all(|&count| count == 2);

        MeshStats {
            num_vertices: self.vertices.len(),
            num_triangles: self.triangle_count(),
            bb_min_mm: bb_min * unit_to_mm,
            bb_max_mm: bb_max * unit_to_mm,
            size_mm: (bb_max - bb_min).max(Vec3::ZERO) * unit_to_mm,
            surface_area_mm2: area,
            volume_mm3: volume,
            centroid_mm,
            mass_g,
            compactness,
            seems_closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives;

    #[test]
    fn test_unit_cube_stats() {
        let cube = primitives::unit_cube();
        let stats = cube.compute_mesh_stats(1.0, 0.0);

        assert_eq!(stats.num_vertices, 8);
        assert_eq!(stats.num_triangles, 12);
        assert!((stats.surface_area_mm2 - 6.0).abs() < 1e-9);
        assert!((stats.volume_mm3.abs() - 1.0).abs() < 1e-9);
        // Cube compactness is pi/6
        assert!((stats.compactness.abs() - std::f64::consts::PI / 6.0).abs() < 1e-9);
        assert!(stats.compactness.abs() < 1.0);
        assert!(stats.seems_closed);
        assert_eq!(stats.size_mm, Vec3::ONE);
    }

    #[test]
    fn test_unit_cube_centroid_and_mass() {
        let mut cube = primitives::unit_cube();
        cube.translate(Vec3::splat(0.5)); // corners at 0..1
        let stats = cube.compute_mesh_stats(10.0, 2.0);

        // 10 mm cube: volume 1000 mm^3 = 1 cm^3, mass = 2 g
        assert!((stats.volume_mm3.abs() - 1000.0).abs() < 1e-6);
        assert!((stats.mass_g - 2.0).abs() < 1e-9);
        assert!((stats.centroid_mm - DVec3::splat(5.0)).length() < 1e-6);
    }

    #[test]
    fn test_open_mesh_is_not_closed() {
        let quad = primitives::plane(1.0);
        let stats = quad.compute_mesh_stats(1.0, 0.0);

        assert!(!stats.seems_closed);
        assert!((stats.surface_area_mm2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_scale_with_unit() {
        let cube = primitives::unit_cube();
        let stats = cube.compute_mesh_stats(2.0, 0.0);

        assert!((stats.surface_area_mm2 - 24.0).abs() < 1e-9);
        assert!((stats.volume_mm3.abs() - 8.0).abs() < 1e-9);
        // Compactness is scale invariant
        assert!((stats.compactness.abs() - std::f64::consts::PI / 6.0).abs() < 1e-9);
    }
}
