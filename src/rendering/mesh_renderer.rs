//! Mesh render pipeline and material resolution.
//!
//! Every mesh draw goes through here: the renderer owns one pipeline per
//! primitive topology (same shader), a small dynamic-offset uniform arena for
//! per-draw model/material data, and the named material table. A mesh whose
//! material slot is unset or names an unknown entry renders with the default
//! material; a missing material is never an undefined draw.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::geometry::mesh::{DrawMode, MaterialSlot, Mesh};

/// Uniform-buffer slot alignment required for dynamic offsets.
const DRAW_SLOT_SIZE: u64 = 256;
/// Per-frame draw capacity of the uniform arena.
const MAX_DRAWS: u64 = 256;

/// Surface appearance of a mesh.
#[derive(Debug, Clone)]
pub struct Material {
    pub base_color: [f32; 4],
    /// 0 = mirror-smooth, 1 = fully diffuse.
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            roughness: 0.9,
        }
    }
}

/// Per-draw uniform (must match DrawData in mesh.wgsl).
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    base_color: [f32; 4],
    /// x = roughness, yzw reserved.
    params: [f32; 4],
}

pub struct MeshRenderer {
    pipelines: HashMap<DrawMode, wgpu::RenderPipeline>,
    camera_bind_group_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    materials: HashMap<String, Arc<Material>>,
    default_material: Arc<Material>,
    /// Next free slot in the per-frame uniform arena.
    cursor: u64,
}

impl MeshRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/mesh.wgsl").into()),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let draw_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Draw Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<DrawUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Draw Uniform Arena"),
            size: DRAW_SLOT_SIZE * MAX_DRAWS,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Draw Bind Group"),
            layout: &draw_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &draw_bind_group_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for mode in [DrawMode::TriangleList, DrawMode::LineList, DrawMode::PointList] {
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Mesh Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[crate::geometry::Vertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: mode.topology(),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            pipelines.insert(mode, pipeline);
        }

        let mut materials: HashMap<String, Arc<Material>> = HashMap::new();
        materials.insert(
            "gray plastic".to_string(),
            Arc::new(Material {
                base_color: [0.55, 0.55, 0.58, 1.0],
                roughness: 0.7,
            }),
        );

        Self {
            pipelines,
            camera_bind_group_layout,
            draw_buffer,
            draw_bind_group,
            materials,
            default_material: Arc::new(Material::default()),
            cursor: 0,
        }
    }

    pub fn camera_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_bind_group_layout
    }

    pub fn register_material(&mut self, name: &str, material: Material) {
        self.materials.insert(name.to_string(), Arc::new(material));
    }

    /// Resolve a mesh's material slot, falling back to the default for unset
    /// slots and unknown names.
    pub fn resolve_material(&self, slot: &MaterialSlot) -> Arc<Material> {
        match slot {
            MaterialSlot::Default => self.default_material.clone(),
            MaterialSlot::Handle(handle) => handle.clone(),
            MaterialSlot::Named(name) => match self.materials.get(name) {
                Some(material) => material.clone(),
                None => {
                    log::warn!("unknown material '{name}', using default");
                    self.default_material.clone()
                }
            },
        }
    }

    /// Reset the per-frame uniform arena. Call once per frame before drawing.
    pub fn begin_frame(&mut self) {
        self.cursor = 0;
    }

    /// Draw one mesh (optionally instanced) into an open render pass.
    pub fn draw(
        &mut self,
        queue: &wgpu::Queue,
        pass: &mut wgpu::RenderPass<'_>,
        camera_bind_group: &wgpu::BindGroup,
        mesh: &Mesh,
        instances: u32,
    ) {
        if self.cursor >= MAX_DRAWS {
            log::warn!("mesh draw arena exhausted ({MAX_DRAWS} draws), skipping '{}'", mesh.name());
            return;
        }

        let material = self.resolve_material(mesh.material());
        let uniform = DrawUniform {
            model: mesh.transform().to_cols_array_2d(),
            base_color: material.base_color,
            params: [material.roughness, 0.0, 0.0, 0.0],
        };
        let offset = self.cursor * DRAW_SLOT_SIZE;
        queue.write_buffer(&self.draw_buffer, offset, bytemuck::bytes_of(&uniform));
        self.cursor += 1;

        // Pipelines exist for every DrawMode variant
        pass.set_pipeline(&self.pipelines[&mesh.draw_mode()]);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, &self.draw_bind_group, &[offset as u32]);
        mesh.draw_instanced(pass, instances);
    }
}
