//! Mesh geometry: CPU-authoritative vertex data, its GPU mirror, and the
//! geometry-processing algorithms (bounds, normals, dedup, voxelization, SDF,
//! stats) that operate on it.

pub mod bounding_box;
pub mod mesh;
pub mod primitives;
pub mod processing;
pub mod stats;
pub mod vertex;
pub mod voxel;

pub use bounding_box::BoundingBox;
pub use mesh::{DrawMode, GeometryError, MaterialSlot, Mesh, MeshData, MirrorState};
pub use stats::MeshStats;
pub use vertex::Vertex;
pub use voxel::VoxelGrid;
