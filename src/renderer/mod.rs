mod frame_buffers;
mod mesh;
mod scene_pass;
mod snow_pass;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    assets::{EnvironmentMap, FlakeSprite},
    entity::Scene,
    simulation::Particle,
    window::{HasSize, Size},
};

use frame_buffers::DepthBuffer;
use scene_pass::ScenePass;
use snow_pass::SnowPass;

pub struct Renderer {
    surface: wgpu::Surface,
    surface_format: wgpu::TextureFormat,
    size: Size,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_buffer: DepthBuffer,
    scene_pass: ScenePass,
    snow_pass: SnowPass,
}

impl Renderer {
    pub async fn new(
        window: &winit::window::Window,
        scene: &Scene,
        flake_capacity: usize,
        sprite: &FlakeSprite,
        environment: &EnvironmentMap,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;
        info!("Using adapter {:?}", adapter.get_info());

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .context("No device found")?;

        let size = window.size();
        Self::configure_surface(&surface, &device, surface_format, size);

        let depth_buffer = DepthBuffer::new(&device, size);
        let scene_pass = ScenePass::new(&device, &queue, surface_format, &scene.globe, environment);
        let snow_pass = SnowPass::new(&device, &queue, surface_format, flake_capacity, sprite);

        Ok(Self {
            surface,
            surface_format,
            size,
            device,
            queue,
            depth_buffer,
            scene_pass,
            snow_pass,
        })
    }

    fn configure_surface(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size,
    ) {
        if size.is_empty() {
            return;
        }
        surface.configure(
            device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width,
                height: size.height,
                present_mode: wgpu::PresentMode::Fifo,
            },
        )
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        Self::configure_surface(&self.surface, &self.device, self.surface_format, size);
        self.depth_buffer = DepthBuffer::new(&self.device, size);
    }

    pub fn set_flake_sprite(&mut self, sprite: &FlakeSprite) {
        self.snow_pass.set_sprite(&self.device, &self.queue, sprite);
    }

    pub fn set_environment(&mut self, environment: &EnvironmentMap) {
        self.scene_pass
            .set_environment(&self.device, &self.queue, environment);
    }

    pub fn render(&mut self, scene: &Scene, particles: &[Particle]) -> Result<()> {
        if self.size.is_empty() {
            return Ok(());
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.resize(self.size);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to get next surface texture"),
        };
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene_pass.update(&self.queue, scene);
        self.snow_pass.update(&self.queue, &scene.camera, particles);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        {
            let background = scene.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &frame_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.x as f64,
                            g: background.y as f64,
                            b: background.z as f64,
                            a: 1.0,
                        }),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_buffer.texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            self.scene_pass.draw_solid(&mut render_pass);
            self.snow_pass.draw(&mut render_pass);
            self.scene_pass.draw_glass(&mut render_pass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();

        Ok(())
    }
}
