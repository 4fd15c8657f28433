use std::f32::consts::{PI, TAU};

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{vec3, Vec3};
use wgpu::util::DeviceExt;

use crate::entity::Shape;

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as _,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn from_shape(shape: Shape) -> Self {
        match shape {
            Shape::Sphere { radius } => Self::sphere(radius, 48, 32),
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => Self::cylinder(radius_top, radius_bottom, height, 64),
            Shape::Torus { radius, tube } => Self::torus(radius, tube, 16, 100),
            Shape::Cone { radius, height } => Self::cylinder(0., radius, height, 16),
        }
    }

    fn grid_indices(&mut self, rows: u32, columns: u32, first: u32) {
        let stride = columns + 1;
        for row in 0..rows {
            for column in 0..columns {
                let a = first + row * stride + column;
                let b = a + stride;
                self.indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }
    }

    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut geometry = Self::default();
        for ring in 0..=rings {
            let theta = ring as f32 / rings as f32 * PI;
            for segment in 0..=segments {
                let phi = segment as f32 / segments as f32 * TAU;
                let normal = vec3(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
                geometry.vertices.push(Vertex {
                    position: normal * radius,
                    normal,
                });
            }
        }
        geometry.grid_indices(rings, segments, 0);
        geometry
    }

    /// Open-ended side plus flat caps. A zero top radius makes a cone.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        let mut geometry = Self::default();
        let half = height * 0.5;
        let slope = (radius_bottom - radius_top) / height;

        for (y, radius) in [(half, radius_top), (-half, radius_bottom)] {
            for segment in 0..=segments {
                let angle = segment as f32 / segments as f32 * TAU;
                let (sin, cos) = angle.sin_cos();
                geometry.vertices.push(Vertex {
                    position: vec3(radius * sin, y, radius * cos),
                    normal: vec3(sin, slope, cos).normalize(),
                });
            }
        }
        geometry.grid_indices(1, segments, 0);

        for (y, radius, up) in [(half, radius_top, 1f32), (-half, radius_bottom, -1.)] {
            if radius <= 0. {
                continue;
            }
            let center = geometry.vertices.len() as u32;
            let normal = vec3(0., up, 0.);
            geometry.vertices.push(Vertex {
                position: vec3(0., y, 0.),
                normal,
            });
            for segment in 0..=segments {
                let angle = segment as f32 / segments as f32 * TAU;
                geometry.vertices.push(Vertex {
                    position: vec3(radius * angle.sin(), y, radius * angle.cos()),
                    normal,
                });
            }
            for segment in 0..segments {
                let a = center + 1 + segment;
                if up > 0. {
                    geometry.indices.extend_from_slice(&[center, a, a + 1]);
                } else {
                    geometry.indices.extend_from_slice(&[center, a + 1, a]);
                }
            }
        }
        geometry
    }

    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let mut geometry = Self::default();
        for radial in 0..=radial_segments {
            let v = radial as f32 / radial_segments as f32 * TAU;
            for tubular in 0..=tubular_segments {
                let u = tubular as f32 / tubular_segments as f32 * TAU;
                let center = vec3(radius * u.cos(), radius * u.sin(), 0.);
                let position = vec3(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                geometry.vertices.push(Vertex {
                    position,
                    normal: (position - center).normalize(),
                });
            }
        }
        geometry.grid_indices(radial_segments, tubular_segments, 0);
        geometry
    }
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as _,
        }
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
