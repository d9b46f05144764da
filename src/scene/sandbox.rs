//! The sandbox scene: circle floor, GPU particle system, solver wiring.

use glam::Vec3;

use crate::config::AppConfig;
use crate::geometry::mesh::DrawMode;
use crate::geometry::primitives;
use crate::geometry::{GeometryError, Mesh};
use crate::gpu::{BufferRegistry, RegistryError};
use crate::rendering::{CameraController, MeshRenderer, ParticleRenderer};
use crate::scene::node::{NodeKind, Scene, SceneNode};
use crate::scene::particle_system::{ParticleDisplayMode, ParticleSystem};
use crate::simulation::{ParticleSolver, SolverError, POSITION_BUFFER, VELOCITY_BUFFER};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct SandboxScene {
    pub camera: CameraController,
    config: AppConfig,

    registry: BufferRegistry,
    solver: ParticleSolver,
    particles: ParticleSystem,
    floor: Mesh,
    tree: Scene,

    mesh_renderer: MeshRenderer,
    particle_renderer: ParticleRenderer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,

    paused: bool,
    current_time: f32,
}

impl SandboxScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_config: &wgpu::SurfaceConfiguration,
        config: AppConfig,
    ) -> Result<Self, SceneError> {
        let mut camera =
            CameraController::new(surface_config.width as f32 / surface_config.height as f32);
        camera.set_position(Vec3::new(0.7, -35.0, 7.4));

        let mesh_renderer = MeshRenderer::new(device, surface_config.format, DEPTH_FORMAT);
        let particle_renderer = ParticleRenderer::new(
            device,
            surface_config.format,
            DEPTH_FORMAT,
            mesh_renderer.camera_bind_group_layout(),
        );

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform"),
            size: std::mem::size_of::<crate::rendering::CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: mesh_renderer.camera_bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let depth_view =
            create_depth_view(device, surface_config.width, surface_config.height);

        // Scene content: the floor disc
        let floor_data = primitives::circle(config.physics.floor_radius, 100);
        let mut floor = Mesh::new(
            "floor",
            floor_data.vertices,
            floor_data.indices,
            DrawMode::TriangleList,
        );
        floor.set_material_name("gray plastic");
        floor.update_mirror(device);

        // Physics: seed the particle grid, create the GPU buffers
        let mut registry = BufferRegistry::new();
        let positions = spawn_positions(&config);
        let count = positions.len();

        registry.create_buffer::<[f32; 4]>(device, POSITION_BUFFER, count)?;
        registry.create_buffer::<[f32; 4]>(device, VELOCITY_BUFFER, count)?;
        registry.write_buffer(queue, POSITION_BUFFER, &positions)?;
        registry.clear_buffer(queue, VELOCITY_BUFFER)?;

        let mut particles = ParticleSystem::new("Particles", count as u32);
        particles.set_position_buffer(POSITION_BUFFER);
        particles.set_display_mode(ParticleDisplayMode::PointSpriteShaded);
        particles.radius = config.physics.particle_radius;

        let solver = ParticleSolver::new(device, count as u32, config.physics.clone())?;

        let mut tree = Scene::new();
        tree.add(SceneNode::new("floor", NodeKind::Mesh));
        tree.add(SceneNode::new("Particles", NodeKind::ParticleSystem));

        log::info!("sandbox scene ready: {count} particles");

        Ok(Self {
            camera,
            config,
            registry,
            solver,
            particles,
            floor,
            tree,
            mesh_renderer,
            particle_renderer,
            camera_buffer,
            camera_bind_group,
            depth_view,
            paused: false,
            current_time: 0.0,
        })
    }

    pub fn tree(&self) -> &Scene {
        &self.tree
    }

    pub fn registry(&self) -> &BufferRegistry {
        &self.registry
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.count()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn solver_mut(&mut self) -> &mut ParticleSolver {
        &mut self.solver
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.depth_view = create_depth_view(device, width, height);
    }

    pub fn update(&mut self, _dt: f32) {
        if !self.paused {
            self.current_time += self.config.physics.fixed_timestep;
        }
    }

    /// Encode and submit one frame: physics tick, then the render passes.
    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sandbox Frame"),
        });

        if !self.paused {
            if let Err(err) = self.solver.step(device, queue, &mut encoder, &mut self.registry) {
                log::error!("physics step failed: {err}");
            }
        }

        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera.uniform()),
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sandbox Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.903,
                            g: 0.803,
                            b: 0.703,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.mesh_renderer.begin_frame();
            self.mesh_renderer
                .draw(queue, &mut pass, &self.camera_bind_group, &self.floor, 1);

            match self
                .particles
                .position_buffer()
                .map(|key| self.registry.get_buffer(key))
            {
                Some(Ok(buffer)) => {
                    self.particle_renderer.render(
                        queue,
                        &mut pass,
                        &self.camera_bind_group,
                        buffer.buffer(),
                        self.particles.count(),
                        self.particles.radius,
                        self.particles.display_mode(),
                    );
                }
                Some(Err(err)) => log::error!("particle position buffer missing: {err}"),
                None => {}
            }
        }

        queue.submit(Some(encoder.finish()));
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Regular XY grid with a linear height ramp, the sandbox's initial particle
/// cloud.
fn spawn_positions(config: &AppConfig) -> Vec<[f32; 4]> {
    let spawn = &config.spawn;
    let mut positions = Vec::new();
    let mut y = spawn.min_xy;
    while y < spawn.max_xy {
        let mut x = spawn.min_xy;
        while x < spawn.max_xy {
            let z = (spawn.ramp_slope * (x + y) + spawn.ramp_offset) / spawn.ramp_scale;
            positions.push([x, y, z, 1.0]);
            x += spawn.spacing;
        }
        y += spawn.spacing;
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_grid_is_square_and_ramped() {
        let config = AppConfig::default();
        let positions = spawn_positions(&config);

        let per_axis = ((config.spawn.max_xy - config.spawn.min_xy) / config.spawn.spacing)
            .ceil() as usize;
        assert_eq!(positions.len(), per_axis * per_axis);

        // Height grows along x + y
        let first = positions.first().unwrap();
        let last = positions.last().unwrap();
        assert!(last[2] > first[2]);
        assert!(positions.iter().all(|p| p[3] == 1.0));
    }
}
