//! Scene tree and the sandbox scene.
//!
//! The node tree carries named drawable objects by composition; the sandbox
//! scene wires the floor mesh, the particle system, the buffer registry, and
//! the solver together.

pub mod node;
pub mod particle_system;
pub mod sandbox;

pub use node::{NodeIter, Scene, SceneNode};
pub use particle_system::{ParticleDisplayMode, ParticleSystem};
pub use sandbox::SandboxScene;
