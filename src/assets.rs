use std::{
    f32::consts::TAU,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::{vec3, Vec3};
use log::{error, info};
use smol::channel::{self, Receiver};

use crate::{
    entity::hex,
    simulation::{FlakeStyle, FlakeTemplate},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlakeSprite {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FlakeSprite {
    pub fn procedural(size: u32) -> Self {
        let size = size.max(2);
        let half = size as f32 * 0.5;
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5 - half) / half;
                let dy = (y as f32 + 0.5 - half) / half;
                let radius = (dx * dx + dy * dy).sqrt();

                // Distance from the nearest of the six arms, measured across the arm.
                let sector = dy.atan2(dx).rem_euclid(TAU / 6.);
                let across = radius * sector.min(TAU / 6. - sector).sin();
                let arm = (1. - across / 0.09).clamp(0., 1.) * (1. - radius).clamp(0., 1.);
                let core = (1. - radius / 0.25).clamp(0., 1.);

                let alpha = arm.max(core);
                pixels.extend_from_slice(&[255, 255, 255, (alpha * 255.).round() as u8]);
            }
        }

        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to decode flake sprite {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlakeAsset {
    pub template: FlakeTemplate,
    pub sprite: FlakeSprite,
}

impl FlakeAsset {
    pub const PROCEDURAL_SPRITE_SIZE: u32 = 64;

    pub fn builtin(style: FlakeStyle) -> Self {
        Self {
            template: FlakeTemplate::builtin(style),
            sprite: FlakeSprite::procedural(Self::PROCEDURAL_SPRITE_SIZE),
        }
    }

    pub fn load(path: &Path, style: FlakeStyle) -> Result<Self> {
        let sprite = FlakeSprite::open(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            template: FlakeTemplate {
                name,
                ..FlakeTemplate::builtin(style)
            },
            sprite,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMap {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

impl EnvironmentMap {
    pub const FACE_NAMES: [&'static str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];
    pub const PROCEDURAL_SIZE: u32 = 32;

    pub fn procedural(size: u32) -> Self {
        let size = size.max(1);
        let horizon = hex(0xfff8e8);
        let zenith = hex(0x9cc4e4);
        let floor = hex(0x8a8478);

        let faces = [0, 1, 2, 3, 4, 5].map(|face| {
            let mut pixels = Vec::with_capacity((size * size * 4) as usize);
            for y in 0..size {
                for x in 0..size {
                    let t = face_direction(face, size, x, y).y;
                    let color = if t >= 0. {
                        horizon.lerp(zenith, t)
                    } else {
                        horizon.lerp(floor, -t)
                    };
                    let [r, g, b] = (color * 255.).round().to_array();
                    pixels.extend_from_slice(&[r as u8, g as u8, b as u8, 255]);
                }
            }
            pixels
        });

        Self { size, faces }
    }

    /// Reads `px.png`, `nx.png`, `py.png`, `ny.png`, `pz.png` and `nz.png` from `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut size = None;
        let mut faces: [Vec<u8>; 6] = Default::default();

        for (face, name) in faces.iter_mut().zip(Self::FACE_NAMES) {
            let path = dir.join(format!("{}.png", name));
            let image = image::open(&path)
                .with_context(|| format!("Failed to decode environment face {}", path.display()))?
                .to_rgba8();

            let (width, height) = image.dimensions();
            if width != height {
                bail!("Environment face {} is {}x{}, not square", path.display(), width, height);
            }
            match size {
                None => size = Some(width),
                Some(size) if size != width => bail!(
                    "Environment face {} is {} pixels wide, expected {}",
                    path.display(),
                    width,
                    size
                ),
                Some(_) => (),
            }
            *face = image.into_raw();
        }

        Ok(Self {
            size: size.unwrap_or_default(),
            faces,
        })
    }
}

fn face_direction(face: usize, size: u32, x: u32, y: u32) -> Vec3 {
    let u = (x as f32 + 0.5) / size as f32 * 2. - 1.;
    let v = (y as f32 + 0.5) / size as f32 * 2. - 1.;
    let direction = match face {
        0 => vec3(1., -v, -u),
        1 => vec3(-1., -v, u),
        2 => vec3(u, 1., v),
        3 => vec3(u, -1., -v),
        4 => vec3(u, -v, 1.),
        _ => vec3(-u, -v, -1.),
    };
    direction.normalize()
}

#[derive(Debug)]
pub enum LoadStatus<T> {
    Pending,
    Loaded(T),
    Failed,
}

pub struct Loader<T> {
    path: PathBuf,
    receiver: Receiver<Result<T>>,
}

impl<T: Send + 'static> Loader<T> {
    pub fn spawn<F>(path: PathBuf, load: F) -> Self
    where
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        info!("Loading {}", path.display());
        let (sender, receiver) = channel::bounded(1);

        let task_path = path.clone();
        smol::spawn(async move {
            let result = smol::unblock(move || load(&task_path)).await;
            // The receiver is gone once the app has shut down.
            let _ = sender.send(result).await;
        })
        .detach();

        Self { path, receiver }
    }

    /// Failures are logged here; the caller only learns that the load is over.
    pub fn poll(&self) -> LoadStatus<T> {
        match self.receiver.try_recv() {
            Ok(Ok(asset)) => {
                info!("Loaded {}", self.path.display());
                LoadStatus::Loaded(asset)
            }
            Ok(Err(e)) => {
                error!("{:?}", e);
                LoadStatus::Failed
            }
            Err(channel::TryRecvError::Empty) => LoadStatus::Pending,
            Err(channel::TryRecvError::Closed) => {
                error!("Loader for {} went away", self.path.display());
                LoadStatus::Failed
            }
        }
    }

    #[cfg(test)]
    pub async fn finished(self) -> Result<T> {
        self.receiver.recv().await.context("Loader went away")?
    }
}
