use glam::vec3;
use log::debug;
use rand::Rng;

use super::{field::ParticleField, params::SnowParams};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShakeSensor {
    last_azimuth: f32,
}

impl ShakeSensor {
    pub fn new(azimuth: f32) -> Self {
        Self {
            last_azimuth: azimuth,
        }
    }

    #[cfg(test)]
    pub fn last_azimuth(&self) -> f32 {
        self.last_azimuth
    }

    pub fn strength(delta: f32, params: &SnowParams) -> Option<f32> {
        if delta > params.shake_threshold {
            Some((delta * params.shake_gain).min(params.shake_max))
        } else {
            None
        }
    }

    pub fn on_orbit_change<R: Rng>(
        &mut self,
        azimuth: f32,
        field: &mut ParticleField,
        params: &SnowParams,
        rng: &mut R,
    ) -> Option<f32> {
        let delta = (azimuth - self.last_azimuth).abs();
        self.last_azimuth = azimuth;

        let strength = Self::strength(delta, params)?;
        debug!("Shake: delta {:.4} rad, strength {:.2}", delta, strength);

        for particle in field.particles_mut() {
            particle.velocity += vec3(
                (rng.gen::<f32>() - 0.5) * strength,
                rng.gen::<f32>() * strength * params.shake_lift,
                (rng.gen::<f32>() - 0.5) * strength,
            );
        }
        Some(strength)
    }
}
