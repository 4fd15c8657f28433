use glam::{const_vec3, Vec3};

use crate::entity::Globe;

/// Drag and wobble are applied once per step regardless of `delta`, so the look of the
/// snow depends on the refresh rate of the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SnowParams {
    pub flake_count: usize,
    pub ground_y: f32,
    pub wall_radius: f32,
    pub wall_push: f32,

    pub spawn_radius: f32,
    pub pile_height: f32,

    pub swirl_strength: f32,
    pub swirl_speed: f32,
    pub swirl_scale: f32,
    pub wave_strength: f32,
    pub wave_speed: f32,
    pub wave_scale: f32,

    pub wobble_chance: f32,
    pub wobble_amplitude: Vec3,

    pub drag: f32,
    pub gravity: f32,
    pub reference_rate: f32,

    pub bounce: f32,
    pub ground_friction: f32,
    pub settle_speed: f32,

    pub shake_threshold: f32,
    pub shake_gain: f32,
    pub shake_max: f32,
    pub shake_lift: f32,
}

impl SnowParams {
    pub const WOBBLE_AMPLITUDE: Vec3 = const_vec3!([3.0, 2.0, 3.0]);

    pub fn for_globe(globe: &Globe) -> Self {
        Self {
            ground_y: globe.ground_y(),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn calm(self) -> Self {
        Self {
            swirl_strength: 0.,
            wave_strength: 0.,
            wobble_chance: 0.,
            ..self
        }
    }
}

impl Default for SnowParams {
    fn default() -> Self {
        Self {
            flake_count: 800,
            ground_y: Globe::SNOW_BASE_Y + Globe::SNOW_BASE_HEIGHT * 0.5,
            wall_radius: 108.,
            wall_push: 8.,

            spawn_radius: 78.,
            pile_height: 16.,

            swirl_strength: 8.,
            swirl_speed: 0.5,
            swirl_scale: 0.02,
            wave_strength: 3.,
            wave_speed: 0.7,
            wave_scale: 0.015,

            wobble_chance: 0.3,
            wobble_amplitude: Self::WOBBLE_AMPLITUDE,

            drag: 0.97,
            gravity: 4.,
            reference_rate: 60.,

            bounce: 0.4,
            ground_friction: 0.75,
            settle_speed: 3.5,

            shake_threshold: 0.008,
            shake_gain: 90.,
            shake_max: 45.,
            shake_lift: 1.2,
        }
    }
}
