use std::{mem::size_of, num::NonZeroU32};

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::{
    frame_buffers::DepthBuffer,
    mesh::{Geometry, Mesh, Vertex},
};
use crate::{
    assets::EnvironmentMap,
    entity::{Camera, Globe, Scene},
};

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct MeshUniforms {
    view_proj: Mat4,
    model: Mat4,
    color: Vec4,
    camera_position: Vec4,
}

impl MeshUniforms {
    fn new(camera: &Camera, model: Mat4, color: Vec3, alpha: f32) -> Self {
        Self {
            view_proj: camera.view_projection_matrix(),
            model,
            color: color.extend(alpha),
            camera_position: camera.position.extend(1.),
        }
    }
}

struct MeshObject {
    mesh: Mesh,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl MeshObject {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        geometry: &Geometry,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_of::<MeshUniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            mesh: Mesh::new(device, label, geometry),
            uniform_buffer,
            bind_group,
        }
    }

    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        self.mesh.draw(render_pass);
    }
}

pub struct ScenePass {
    solid_pipeline: wgpu::RenderPipeline,
    glass_pipeline: wgpu::RenderPipeline,
    props: Vec<MeshObject>,
    shell: MeshObject,
    environment_layout: wgpu::BindGroupLayout,
    environment_sampler: wgpu::Sampler,
    environment_bind_group: wgpu::BindGroup,
    _environment_texture: wgpu::Texture,
}

impl ScenePass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        globe: &Globe,
        environment: &EnvironmentMap,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size_of::<MeshUniforms>() as _),
                },
                count: None,
            }],
        });

        let environment_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Environment Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let environment_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("scene.wgsl"));

        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Solid Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let glass_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glass Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout, &environment_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str,
                             layout: &wgpu::PipelineLayout,
                             fragment: &str,
                             blend: Option<wgpu::BlendState>,
                             depth_write_enabled: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader_module,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader_module,
                    entry_point: fragment,
                    targets: &[wgpu::ColorTargetState {
                        format: color_format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    }],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let solid_pipeline = make_pipeline("Solid Pipeline", &solid_layout, "fs_solid", None, true);
        let glass_pipeline = make_pipeline(
            "Glass Pipeline",
            &glass_layout,
            "fs_glass",
            Some(wgpu::BlendState::ALPHA_BLENDING),
            false,
        );

        let props = globe
            .props
            .iter()
            .map(|prop| {
                MeshObject::new(
                    device,
                    &bind_group_layout,
                    prop.name,
                    &Geometry::from_shape(prop.shape),
                )
            })
            .collect();

        let shell = MeshObject::new(
            device,
            &bind_group_layout,
            "glass shell",
            &Geometry::sphere(globe.shell_radius, 64, 64),
        );

        let (environment_texture, environment_bind_group) = Self::make_environment(
            device,
            queue,
            &environment_layout,
            &environment_sampler,
            environment,
        );

        Self {
            solid_pipeline,
            glass_pipeline,
            props,
            shell,
            environment_layout,
            environment_sampler,
            environment_bind_group,
            _environment_texture: environment_texture,
        }
    }

    fn make_environment(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        environment: &EnvironmentMap,
    ) -> (wgpu::Texture, wgpu::BindGroup) {
        let size = environment.size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Environment Texture"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });

        for (layer, face) in environment.faces.iter().enumerate() {
            if face.len() != (size * size * 4) as usize {
                continue;
            }
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                face,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: NonZeroU32::new(4 * size),
                    rows_per_image: NonZeroU32::new(size),
                },
                wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Environment Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Environment Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        (texture, bind_group)
    }

    pub fn set_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: &EnvironmentMap,
    ) {
        let (texture, bind_group) = Self::make_environment(
            device,
            queue,
            &self.environment_layout,
            &self.environment_sampler,
            environment,
        );
        self._environment_texture = texture;
        self.environment_bind_group = bind_group;
    }

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        let Scene { camera, globe, .. } = scene;

        for (object, prop) in self.props.iter().zip(&globe.props) {
            let uniforms = MeshUniforms::new(camera, prop.transform.matrix(), prop.color, 1.);
            queue.write_buffer(&object.uniform_buffer, 0, bytes_of(&uniforms));
        }

        let uniforms = MeshUniforms::new(
            camera,
            Mat4::IDENTITY,
            globe.shell_tint,
            globe.shell_opacity,
        );
        queue.write_buffer(&self.shell.uniform_buffer, 0, bytes_of(&uniforms));
    }

    pub fn draw_solid<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.solid_pipeline);
        for object in &self.props {
            object.draw(render_pass);
        }
    }

    pub fn draw_glass<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.glass_pipeline);
        render_pass.set_bind_group(1, &self.environment_bind_group, &[]);
        self.shell.draw(render_pass);
    }
}
