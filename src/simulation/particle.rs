use std::{f32::consts::TAU, str::FromStr};

use anyhow::bail;
use glam::{vec3, EulerRot, Mat3, Quat, Vec3};
use rand::prelude::*;

use super::params::SnowParams;

/// How a flake is oriented each frame. Visual only, never fed back into the physics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FlakeStyle {
    Billboard,
    Tumble,
}

impl Default for FlakeStyle {
    fn default() -> Self {
        Self::Billboard
    }
}

impl FromStr for FlakeStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billboard" | "flat" => Ok(Self::Billboard),
            "tumble" | "volumetric" => Ok(Self::Tumble),
            other => bail!("Unknown flake style {:?}, expected billboard or tumble", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlakeTemplate {
    pub name: String,
    pub style: FlakeStyle,
    pub min_size: f32,
    pub max_size: f32,
}

impl FlakeTemplate {
    pub fn builtin(style: FlakeStyle) -> Self {
        Self {
            name: "builtin".into(),
            style,
            min_size: 5.,
            max_size: 10.,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Orientation {
    Billboard {
        rotation: Quat,
        spin: f32,
        spin_rate: f32,
    },
    Tumble {
        angles: Vec3,
        rates: Vec3,
    },
}

impl Orientation {
    const TUMBLE_JITTER: f32 = 0.02;

    fn spawn<R: Rng>(style: FlakeStyle, rng: &mut R) -> Self {
        match style {
            FlakeStyle::Billboard => {
                let spin = rng.gen_range(0.0..TAU);
                Self::Billboard {
                    rotation: Quat::from_rotation_z(spin),
                    spin,
                    spin_rate: 2. + rng.gen_range(0.0..1.0),
                }
            }
            FlakeStyle::Tumble => Self::Tumble {
                angles: vec3(
                    rng.gen_range(0.0..TAU),
                    rng.gen_range(0.0..TAU),
                    rng.gen_range(0.0..TAU),
                ),
                rates: vec3(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ),
            },
        }
    }

    pub fn rotation(&self) -> Quat {
        match *self {
            Self::Billboard { rotation, .. } => rotation,
            Self::Tumble { angles, .. } => Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z),
        }
    }

    pub fn update<R: Rng>(&mut self, position: Vec3, camera_position: Vec3, delta: f32, rng: &mut R) {
        match self {
            Self::Billboard {
                rotation,
                spin,
                spin_rate,
            } => {
                *spin = (*spin + *spin_rate * delta) % TAU;
                *rotation = facing(camera_position - position) * Quat::from_rotation_z(*spin);
            }
            Self::Tumble { angles, rates } => {
                let jitter = vec3(
                    rng.gen::<f32>() - 0.5,
                    rng.gen::<f32>() - 0.5,
                    rng.gen::<f32>() - 0.5,
                ) * Self::TUMBLE_JITTER;
                *angles += *rates * delta + jitter;
            }
        }
    }
}

fn facing(direction: Vec3) -> Quat {
    let z = direction.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let up = if z.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let x = up.cross(z).normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Flake {
    pub size: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Orientation,
    pub flake: Flake,
}

impl Particle {
    pub fn spawn<R: Rng>(template: &FlakeTemplate, params: &SnowParams, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen::<f32>() * params.spawn_radius;
        let height = rng.gen::<f32>() * params.pile_height;

        let size = if template.max_size > template.min_size {
            rng.gen_range(template.min_size..template.max_size)
        } else {
            template.min_size
        };

        Self {
            position: vec3(
                angle.cos() * radius,
                params.ground_y + height,
                angle.sin() * radius,
            ),
            velocity: Vec3::ZERO,
            orientation: Orientation::spawn(template.style, rng),
            flake: Flake { size },
        }
    }

    pub fn is_resting(&self) -> bool {
        self.velocity == Vec3::ZERO
    }
}
