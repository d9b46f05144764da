//! GPU particle solver.
//!
//! Advances the particle state entirely on the GPU: positions and velocities
//! live in registry buffers, and each tick issues `substeps_per_tick`
//! dispatch+barrier pairs of the solver compute shader. The barrier between
//! sub-steps is mandatory: sub-step N+1 reads the positions sub-step N
//! wrote, and without it the read/write ordering is undefined (silently wrong
//! results, not a crash).

use bytemuck::{Pod, Zeroable};

use crate::config::PhysicsConfig;
use crate::gpu::{BarrierScope, BufferRegistry, ComputeDispatcher, DispatchError, RegistryError,
    WORKGROUP_SIZE};

/// Registry key of the particle position buffer (vec4 per particle).
pub const POSITION_BUFFER: &str = "particle_positions";
/// Registry key of the particle velocity buffer (vec4 per particle).
pub const VELOCITY_BUFFER: &str = "particle_velocities";

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Solver parameters uniform (must match Params in solver.wgsl).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SolverParams {
    particle_count: u32,
    dt: f32,
    gravity: f32,
    floor_radius: f32,
    restitution: f32,
    particle_radius: f32,
    time: f32,
    _padding: f32,
}

pub struct ParticleSolver {
    dispatcher: ComputeDispatcher,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    particle_count: u32,
    config: PhysicsConfig,
    time: f32,
}

impl ParticleSolver {
    pub fn new(
        device: &wgpu::Device,
        particle_count: u32,
        config: PhysicsConfig,
    ) -> Result<Self, SolverError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Solver Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/solver.wgsl").into()),
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Solver Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    storage_entry(1), // positions
                    storage_entry(2), // velocities
                ],
            });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Solver Params"),
            size: std::mem::size_of::<SolverParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut dispatcher =
            ComputeDispatcher::new(device, "solver", &shader, "main", &bind_group_layout);
        dispatcher.configure(particle_count, WORKGROUP_SIZE)?;

        log::info!(
            "solver: {} particles, {} workgroups of {}",
            particle_count,
            dispatcher.workgroup_count(),
            WORKGROUP_SIZE
        );

        Ok(Self {
            dispatcher,
            bind_group_layout,
            params_buffer,
            particle_count,
            config,
            time: 0.0,
        })
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Advance the simulation by one tick: rebind the registry buffers, then
    /// queue `substeps_per_tick` dispatch+barrier pairs onto the encoder.
    pub fn step(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        registry: &mut BufferRegistry,
    ) -> Result<(), SolverError> {
        let substeps = self.config.substeps_per_tick.max(1);
        self.time += self.config.fixed_timestep;

        let params = SolverParams {
            particle_count: self.particle_count,
            dt: self.config.fixed_timestep / substeps as f32,
            gravity: self.config.gravity,
            floor_radius: self.config.floor_radius,
            restitution: self.config.restitution,
            particle_radius: self.config.particle_radius,
            time: self.time,
            _padding: 0.0,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        registry.reset_bindings();
        registry.bind(POSITION_BUFFER, 1)?;
        registry.bind(VELOCITY_BUFFER, 2)?;
        let bind_group = registry.create_bind_group(
            device,
            &self.bind_group_layout,
            "Solver Bind Group",
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: self.params_buffer.as_entire_binding(),
            }],
        );

        for _ in 0..substeps {
            self.dispatcher.dispatch();
            self.dispatcher.barrier(BarrierScope::Storage);
        }
        self.dispatcher.encode(encoder, &bind_group);
        Ok(())
    }
}
