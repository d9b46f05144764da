//! # Particle Lab: GPU Compute Particle Sandbox
//!
//! Particle Lab is a real-time particle sandbox that runs its physics in GPU
//! compute shaders and renders the result with instanced point sprites. Around
//! that core it carries a small mesh toolkit: CPU-authoritative geometry with
//! a lazily synchronized GPU mirror, plus processing passes for normals,
//! deduplication, voxelization, and signed distance fields.
//!
//! ## Architecture Overview
//!
//! ### 1. GPU Resource Layer ([`gpu`])
//!
//! - [`gpu::BufferRegistry`] - named storage buffers shared between the
//!   solver and the renderers, bound by key into a single bind group
//! - [`gpu::ComputeDispatcher`] - ceil-divided workgroup layout plus a
//!   queued dispatch/barrier schedule encoded as compute passes
//!
//! ### 2. Geometry ([`geometry`])
//!
//! - [`geometry::Mesh`] - CPU vertex/index data with a dirty-tracked GPU
//!   mirror and a material slot
//! - [`geometry::processing`] - normals, smoothing, dedup, transforms
//! - [`geometry::voxel`] - X-ray parity voxelization and SDF sampling
//! - [`geometry::stats`] - surface area, signed volume, mass, closedness
//!
//! ### 3. Simulation ([`simulation`])
//!
//! - [`simulation::ParticleSolver`] - substepped gravity/floor-bounce
//!   integration dispatched through the registry's buffers
//!
//! ### 4. Rendering and Scene ([`rendering`], [`scene`], [`ui`])
//!
//! - [`rendering::MeshRenderer`] - per-draw uniform arena over one pipeline
//!   per primitive topology
//! - [`rendering::ParticleRenderer`] - camera-facing quads shaded as sphere
//!   impostors, instanced straight from the registry's position buffer
//! - [`scene::SandboxScene`] - wires registry, solver, floor mesh, particle
//!   system, and camera together
//! - [`ui::UiSystem`] - egui inspector overlay
//!
//! World space is Z-up. All physics state lives on the GPU; the CPU only
//! writes the initial grid and the per-tick parameter uniform.

pub mod app;
pub mod config;
pub mod geometry;
pub mod gpu;
pub mod rendering;
pub mod scene;
pub mod simulation;
pub mod ui;
