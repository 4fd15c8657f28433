use std::time::Instant;

use anyhow::Result;
use log::{debug, error, info, trace, warn};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta},
    window::Window,
};

use crate::{
    assets::{EnvironmentMap, FlakeAsset, LoadStatus, Loader},
    entity::Scene,
    orbit::OrbitControls,
    renderer::Renderer,
    settings::Settings,
    simulation::{Simulation, SnowParams},
    window::{HasSize, Size},
};

pub struct App {
    window: Window,
    scene: Scene,
    simulation: Simulation<Pcg64Mcg>,
    controls: OrbitControls,
    renderer: Renderer,
    flake_loader: Option<Loader<FlakeAsset>>,
    environment_loader: Option<Loader<EnvironmentMap>>,
    last_frame: Instant,
    dragging: bool,
}

impl App {
    pub async fn new(window: Window, settings: Settings) -> Result<Self> {
        info!("{:#?}", &settings);

        let scene = Scene::new(window.size().aspect_ratio());
        info!("{:#?}", &scene);

        let controls = OrbitControls::new(scene.camera.position, scene.camera.target);

        let seed = settings.seed_or_clock();
        info!("Seeded RNG with {}", seed);
        let rng = Pcg64Mcg::seed_from_u64(seed);
        let params = SnowParams::for_globe(&scene.globe);
        let mut simulation = Simulation::new(params, rng, controls.azimuth());

        let style = settings.flakes;
        let builtin = FlakeAsset::builtin(style);
        let renderer = Renderer::new(
            &window,
            &scene,
            simulation.params().flake_count,
            &builtin.sprite,
            &EnvironmentMap::procedural(EnvironmentMap::PROCEDURAL_SIZE),
        )
        .await?;

        let flake_loader = match settings.flake_texture {
            Some(path) => Some(Loader::spawn(path, move |path| FlakeAsset::load(path, style))),
            None => {
                simulation.spawn_snow(Some(&builtin.template));
                None
            }
        };
        let environment_loader = settings
            .environment
            .map(|dir| Loader::spawn(dir, EnvironmentMap::open));

        Ok(Self {
            window,
            scene,
            simulation,
            controls,
            renderer,
            flake_loader,
            environment_loader,
            last_frame: Instant::now(),
            dragging: false,
        })
    }

    pub fn on_resize(&mut self, size: PhysicalSize<u32>) {
        let size = Size::from(size);
        if size.is_empty() {
            debug!("Ignoring resize to {:?}", size);
        } else {
            self.scene.camera.aspect_ratio = size.aspect_ratio();
        }
        self.renderer.resize(size);
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    pub fn on_mouse_move(&mut self, (x, y): (f64, f64)) {
        if !self.dragging {
            return;
        }
        let viewport_height = self.window.size().height as f32;
        self.controls.drag((x as f32, y as f32), viewport_height);
    }

    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32 / 60.,
        };
        self.controls.zoom(steps);
    }

    fn poll_loaders(&mut self) {
        if let Some(status) = self.flake_loader.as_ref().map(Loader::poll) {
            match status {
                LoadStatus::Pending => (),
                LoadStatus::Loaded(asset) => {
                    self.renderer.set_flake_sprite(&asset.sprite);
                    self.simulation.spawn_snow(Some(&asset.template));
                    self.flake_loader = None;
                }
                LoadStatus::Failed => {
                    if !self.simulation.field().is_spawned() {
                        warn!("No flake template, the globe stays empty");
                    }
                    self.flake_loader = None;
                }
            }
        }

        if let Some(status) = self.environment_loader.as_ref().map(Loader::poll) {
            match status {
                LoadStatus::Pending => (),
                LoadStatus::Loaded(environment) => {
                    self.renderer.set_environment(&environment);
                    self.environment_loader = None;
                }
                // The procedural sky stays in place.
                LoadStatus::Failed => self.environment_loader = None,
            }
        }
    }

    pub fn render(&mut self) {
        self.poll_loaders();

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.simulation.step(delta, self.scene.camera.position);
        let field = self.simulation.field();
        if !field.is_empty() {
            let clock = self.simulation.clock();
            trace!(
                "Frame {} at {:.2}s: {} of {} flakes resting",
                clock.frames(),
                clock.elapsed(),
                self.simulation.resting_count(),
                field.len()
            );
        }

        if self.controls.update() {
            if let Some(strength) = self.simulation.on_orbit_change(self.controls.azimuth()) {
                debug!("Globe shaken with strength {}", strength);
            }
        }
        self.scene.camera.position = self.controls.eye();

        if let Err(e) = self
            .renderer
            .render(&self.scene, self.simulation.field().particles())
        {
            error!("{:?}", e);
        }
    }
}
