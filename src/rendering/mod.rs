//! Rendering collaborators: camera, mesh pipeline with the default material
//! set, and the instanced particle renderer.

pub mod camera;
pub mod mesh_renderer;
pub mod particles;

pub use camera::{CameraController, CameraUniform, ViewPreset};
pub use mesh_renderer::{Material, MeshRenderer};
pub use particles::ParticleRenderer;
