use std::{mem::size_of, num::NonZeroU32};

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::{const_vec3, Mat4, Vec3};
use log::debug;
use wgpu::util::DeviceExt;

use super::frame_buffers::DepthBuffer;
use crate::{assets::FlakeSprite, entity::Camera, simulation::Particle};

const QUAD_VERTICES: [Vec3; 4] = [
    const_vec3!([-0.5, -0.5, 0.]),
    const_vec3!([-0.5, 0.5, 0.]),
    const_vec3!([0.5, -0.5, 0.]),
    const_vec3!([0.5, 0.5, 0.]),
];
const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct SnowUniforms {
    view_proj: Mat4,
    opacity: f32,
    _pad0: [f32; 3],
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct FlakeInstance {
    position: Vec3,
    size: f32,
    rotation: [f32; 4],
}

impl From<&Particle> for FlakeInstance {
    fn from(particle: &Particle) -> Self {
        let rotation = particle.orientation.rotation();
        Self {
            position: particle.position,
            size: particle.flake.size,
            rotation: [rotation.x, rotation.y, rotation.z, rotation.w],
        }
    }
}

pub struct SnowPass {
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    _sprite_texture: wgpu::Texture,
    render_pipeline: wgpu::RenderPipeline,
    capacity: usize,
    instance_count: u32,
    instances: Vec<FlakeInstance>,
}

impl SnowPass {
    pub const OPACITY: f32 = 0.96;

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        capacity: usize,
        sprite: &FlakeSprite,
    ) -> Self {
        let capacity = capacity.max(1);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snow Uniform Buffer"),
            size: size_of::<SnowUniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snow Instance Buffer"),
            size: (capacity * size_of::<FlakeInstance>()) as _,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Vertex Buffer"),
            contents: bytes_of(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Snow Index Buffer"),
            contents: bytes_of(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bilinear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Snow Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<SnowUniforms>() as _),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<FlakeInstance>() as _),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("snow.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Snow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<Vec3>() as _,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                }],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 0,
                    slope_scale: 0.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let (sprite_texture, bind_group) = Self::make_bind_group(
            device,
            queue,
            &bind_group_layout,
            &uniform_buffer,
            &instance_buffer,
            &sampler,
            sprite,
        );

        Self {
            uniform_buffer,
            instance_buffer,
            vertex_buffer,
            index_buffer,
            bind_group_layout,
            bind_group,
            sampler,
            _sprite_texture: sprite_texture,
            render_pipeline,
            capacity,
            instance_count: 0,
            instances: Vec::with_capacity(capacity),
        }
    }

    fn make_sprite_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sprite: &FlakeSprite,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: sprite.width,
            height: sprite.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Flake Sprite Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &sprite.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * sprite.width),
                rows_per_image: NonZeroU32::new(sprite.height),
            },
            size,
        );
        texture
    }

    fn make_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        instance_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        sprite: &FlakeSprite,
    ) -> (wgpu::Texture, wgpu::BindGroup) {
        let sprite_texture = Self::make_sprite_texture(device, queue, sprite);
        let sprite_view = sprite_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Snow Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&sprite_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        (sprite_texture, bind_group)
    }

    pub fn set_sprite(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, sprite: &FlakeSprite) {
        let (sprite_texture, bind_group) = Self::make_bind_group(
            device,
            queue,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.instance_buffer,
            &self.sampler,
            sprite,
        );
        self._sprite_texture = sprite_texture;
        self.bind_group = bind_group;
    }

    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera, particles: &[Particle]) {
        let uniforms = SnowUniforms {
            view_proj: camera.view_projection_matrix(),
            opacity: Self::OPACITY,
            ..Default::default()
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&uniforms));

        if particles.len() > self.capacity {
            debug!(
                "Drawing {} of {} flakes, instance buffer is full",
                self.capacity,
                particles.len()
            );
        }

        self.instances.clear();
        self.instances
            .extend(particles.iter().take(self.capacity).map(FlakeInstance::from));
        self.instance_count = self.instances.len() as _;

        if !self.instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, cast_slice(&self.instances));
        }
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..(QUAD_INDICES.len() as _), 0, 0..self.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3, Quat};

    use super::*;
    use crate::simulation::{Flake, Orientation};

    #[test]
    fn instances_match_the_shader_layout() {
        assert_eq!(size_of::<FlakeInstance>(), 32);
        assert_eq!(size_of::<SnowUniforms>(), 80);
    }

    #[test]
    fn instance_carries_pose_and_size() {
        let rotation = Quat::from_rotation_y(0.5);
        let particle = Particle {
            position: vec3(1., 2., 3.),
            velocity: Vec3::ZERO,
            orientation: Orientation::Billboard {
                rotation,
                spin: 0.,
                spin_rate: 2.,
            },
            flake: Flake { size: 7. },
        };

        let instance = FlakeInstance::from(&particle);

        assert_eq!(instance.position, vec3(1., 2., 3.));
        assert_eq!(instance.size, 7.);
        assert_eq!(instance.rotation, [rotation.x, rotation.y, rotation.z, rotation.w]);
    }
}
