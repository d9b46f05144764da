//! Mesh: CPU-authoritative geometry plus its GPU mirror.
//!
//! `MeshData` owns the vertex/index arrays every geometry algorithm operates
//! on. `Mesh` wraps it with a name, draw mode, model transform, cached
//! bounding box, optional voxel grid, material slot, and the GPU-side mirror
//! (vertex/index buffers bound by the mesh render pipeline).
//!
//! ## Mirror freshness
//!
//! The mirror follows a two-state machine: `Clean` (mirror matches CPU data)
//! and `Dirty` (CPU data mutated since the last upload). Every mutating
//! operation transitions to `Dirty`; [`Mesh::update_mirror`] transitions back
//! to `Clean`. Drawing while `Dirty` is a contract violation; the policy here
//! is to log a warning and render the stale mirror rather than assert, so a
//! missed upload degrades visibly instead of aborting the frame loop.

use std::sync::Arc;

use glam::Mat4;

use super::bounding_box::BoundingBox;
use super::vertex::Vertex;
use super::voxel::VoxelGrid;
use crate::rendering::mesh_renderer::Material;

/// Geometry invariant violations. These indicate a bug in whatever produced
/// the data (a loader or a geometry algorithm) and must fail loudly.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("index count {0} is not a multiple of 3 for a triangle-list mesh")]
    PartialTriangle(usize),

    #[error("voxel cell size must be positive (got {0})")]
    InvalidCellSize(f32),

    #[error("operation requires a non-empty mesh")]
    EmptyMesh,

    #[error("no voxel grid: voxelize before computing the SDF")]
    NoVoxelGrid,
}

/// Primitive assembly mode for draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    TriangleList,
    LineList,
    PointList,
}

impl DrawMode {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            DrawMode::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            DrawMode::LineList => wgpu::PrimitiveTopology::LineList,
            DrawMode::PointList => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// GPU mirror freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    /// Mirror matches the CPU-side arrays.
    Clean,
    /// CPU-side arrays mutated since the last upload.
    Dirty,
}

/// Material reference: by handle or by name, mutually exclusive.
/// Setting a name drops any held handle; `Default` always resolves.
#[derive(Clone, Default)]
pub enum MaterialSlot {
    #[default]
    Default,
    Named(String),
    Handle(Arc<Material>),
}

/// CPU-authoritative vertex/index arrays.
///
/// An empty index list means the mesh is unindexed: every three consecutive
/// vertices form a triangle. When indices are present, every index must be
/// less than the vertex count.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of triangles under triangle-list assembly.
    pub fn triangle_count(&self) -> usize {
        if self.has_indices() {
            self.indices.len() / 3
        } else {
            self.vertices.len() / 3
        }
    }

    /// Vertex indices of each triangle, indexed or consecutive.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let indexed = self.has_indices();
        let count = self.triangle_count();
        (0..count).map(move |t| {
            if indexed {
                [
                    self.indices[t * 3],
                    self.indices[t * 3 + 1],
                    self.indices[t * 3 + 2],
                ]
            } else {
                [(t * 3) as u32, (t * 3 + 1) as u32, (t * 3 + 2) as u32]
            }
        })
    }

    /// Check the index-in-range invariant. Run after any mutating algorithm;
    /// a violation is a bug in the algorithm, not bad input.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.has_indices() && self.indices.len() % 3 != 0 {
            return Err(GeometryError::PartialTriangle(self.indices.len()));
        }
        for &index in &self.indices {
            if index as usize >= self.vertices.len() {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    vertex_count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }
}

/// GPU-side mirror of a mesh: vertex/index buffers plus element counts.
pub struct GpuMirror {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// A named, drawable mesh.
pub struct Mesh {
    name: String,
    data: MeshData,
    draw_mode: DrawMode,
    transform: Mat4,
    material: MaterialSlot,
    /// None = never computed. Invalidated (not recomputed) on mutation.
    bounds: Option<BoundingBox>,
    /// Populated by voxelize/voxelize_surface, read-only until regenerated.
    voxels: Option<VoxelGrid>,
    mirror: Option<GpuMirror>,
    mirror_state: MirrorState,
}

impl Mesh {
    /// CPU-authoritative construction. Starts `Dirty`: the mirror does not
    /// exist until [`update_mirror`](Self::update_mirror) runs.
    pub fn new(name: &str, vertices: Vec<Vertex>, indices: Vec<u32>, mode: DrawMode) -> Self {
        Self {
            name: name.to_string(),
            data: MeshData::new(vertices, indices),
            draw_mode: mode,
            transform: Mat4::IDENTITY,
            material: MaterialSlot::Default,
            bounds: None,
            voxels: None,
            mirror: None,
            mirror_state: MirrorState::Dirty,
        }
    }

    /// Zero-copy wrap of an externally produced GPU vertex buffer. The CPU
    /// side is empty, so geometry algorithms are unavailable; the mirror is
    /// `Clean` by definition.
    pub fn from_gpu_buffer(
        name: &str,
        vertex_count: u32,
        vertex_buffer: wgpu::Buffer,
        mode: DrawMode,
    ) -> Self {
        Self {
            name: name.to_string(),
            data: MeshData::default(),
            draw_mode: mode,
            transform: Mat4::IDENTITY,
            material: MaterialSlot::Default,
            bounds: None,
            voxels: None,
            mirror: Some(GpuMirror {
                vertex_buffer,
                index_buffer: None,
                vertex_count,
                index_count: 0,
            }),
            mirror_state: MirrorState::Clean,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    /// Mutable access to the CPU arrays. Marks the mirror dirty and drops the
    /// cached bounding box, since the caller may change anything.
    pub fn data_mut(&mut self) -> &mut MeshData {
        self.mark_dirty();
        &mut self.data
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    pub fn material(&self) -> &MaterialSlot {
        &self.material
    }

    /// Reference a material from the renderer's table by name.
    /// Clears any directly held handle.
    pub fn set_material_name(&mut self, name: &str) {
        self.material = MaterialSlot::Named(name.to_string());
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = MaterialSlot::Handle(material);
    }

    pub fn mirror_state(&self) -> MirrorState {
        self.mirror_state
    }

    pub fn mirror(&self) -> Option<&GpuMirror> {
        self.mirror.as_ref()
    }

    /// Cached bounding box; `None` until [`compute_bounding_box`]
    /// (Self::compute_bounding_box) has run (and again after any mutation).
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn voxels(&self) -> Option<&VoxelGrid> {
        self.voxels.as_ref()
    }

    pub(super) fn set_voxels(&mut self, grid: VoxelGrid) {
        self.voxels = Some(grid);
    }

    pub(super) fn voxels_mut(&mut self) -> Option<&mut VoxelGrid> {
        self.voxels.as_mut()
    }

    /// Recompute the min/max corners over all vertex positions. O(n).
    pub fn compute_bounding_box(&mut self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for v in &self.data.vertices {
            bb.grow(v.position());
        }
        self.bounds = Some(bb);
        bb
    }

    /// Cached box if fresh, otherwise recompute.
    pub fn bounding_box_or_compute(&mut self) -> BoundingBox {
        match self.bounds {
            Some(bb) => bb,
            None => self.compute_bounding_box(),
        }
    }

    /// Transition to `Dirty` and invalidate derived caches. Every mutating
    /// geometry operation funnels through here.
    pub(super) fn mark_dirty(&mut self) {
        self.mirror_state = MirrorState::Dirty;
        self.bounds = None;
    }

    /// Push the CPU vertex/index arrays to the GPU mirror. Must be called
    /// after any mutating operation before the next draw.
    pub fn update_mirror(&mut self, device: &wgpu::Device) {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", self.name)),
            contents: bytemuck::cast_slice(&self.data.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = if self.data.has_indices() {
            Some(
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} indices", self.name)),
                    contents: bytemuck::cast_slice(&self.data.indices),
                    usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                }),
            )
        } else {
            None
        };

        self.mirror = Some(GpuMirror {
            vertex_buffer,
            index_buffer,
            vertex_count: self.data.vertices.len() as u32,
            index_count: self.data.indices.len() as u32,
        });
        self.mirror_state = MirrorState::Clean;
    }

    /// Issue one draw call. See the module docs for the stale-mirror policy.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.draw_instanced(pass, 1);
    }

    /// Issue an instanced draw over the current mirror.
    pub fn draw_instanced(&self, pass: &mut wgpu::RenderPass<'_>, instances: u32) {
        let Some(mirror) = &self.mirror else {
            log::error!("mesh '{}': draw with no GPU mirror, skipping", self.name);
            return;
        };
        if self.mirror_state == MirrorState::Dirty {
            log::warn!(
                "mesh '{}': drawing a stale mirror (update_mirror not called after mutation)",
                self.name
            );
        }

        pass.set_vertex_buffer(0, mirror.vertex_buffer.slice(..));
        match &mirror.index_buffer {
            Some(ib) => {
                pass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mirror.index_count, 0, 0..instances);
            }
            None => {
                pass.draw(0..mirror.vertex_count, 0..instances);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn tri_data() -> MeshData {
        MeshData::new(
            vec![
                Vertex::at(Vec3::ZERO),
                Vertex::at(Vec3::X),
                Vertex::at(Vec3::Y),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_validate_catches_out_of_range_index() {
        let mut data = tri_data();
        assert!(data.validate().is_ok());

        data.indices[2] = 7;
        match data.validate() {
            Err(GeometryError::IndexOutOfRange { index: 7, .. }) => {}
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_catches_partial_triangle() {
        let mut data = tri_data();
        data.indices.push(1);
        assert!(matches!(
            data.validate(),
            Err(GeometryError::PartialTriangle(4))
        ));
    }

    #[test]
    fn test_triangles_indexed_and_unindexed() {
        let data = tri_data();
        assert_eq!(data.triangles().collect::<Vec<_>>(), vec![[0, 1, 2]]);

        let flat = MeshData::new(
            vec![
                Vertex::at(Vec3::ZERO),
                Vertex::at(Vec3::X),
                Vertex::at(Vec3::Y),
                Vertex::at(Vec3::Z),
                Vertex::at(Vec3::ONE),
                Vertex::at(Vec3::NEG_ONE),
            ],
            vec![],
        );
        assert_eq!(
            flat.triangles().collect::<Vec<_>>(),
            vec![[0, 1, 2], [3, 4, 5]]
        );
    }

    #[test]
    fn test_new_mesh_starts_dirty_and_mutation_dirties_again() {
        let data = tri_data();
        let mut mesh = Mesh::new("tri", data.vertices, data.indices, DrawMode::TriangleList);
        assert_eq!(mesh.mirror_state(), MirrorState::Dirty);

        // Bounding box cache is populated and then invalidated by mutation
        mesh.compute_bounding_box();
        assert!(mesh.bounding_box().is_some());

        mesh.data_mut().vertices[0] = Vertex::at(Vec3::splat(5.0));
        assert_eq!(mesh.mirror_state(), MirrorState::Dirty);
        assert!(mesh.bounding_box().is_none());
    }

    #[test]
    fn test_material_name_clears_handle() {
        let data = tri_data();
        let mut mesh = Mesh::new("tri", data.vertices, data.indices, DrawMode::TriangleList);

        mesh.set_material(Arc::new(Material::default()));
        assert!(matches!(mesh.material(), MaterialSlot::Handle(_)));

        mesh.set_material_name("gray plastic");
        assert!(matches!(mesh.material(), MaterialSlot::Named(_)));
    }
}
