use glam::{vec3, Vec3};
use rand::Rng;

use super::{params::SnowParams, particle::Particle};

pub fn swirl(position: Vec3, elapsed: f32, params: &SnowParams) -> Vec3 {
    vec3(
        (elapsed * params.swirl_speed + position.z * params.swirl_scale).sin() * params.swirl_strength,
        (elapsed * params.wave_speed + position.x * params.wave_scale).sin() * params.wave_strength,
        (elapsed * params.swirl_speed + position.x * params.swirl_scale).cos() * params.swirl_strength,
    )
}

/// Per-flake chaos. Applied per step, not scaled by `delta`.
pub fn wobble<R: Rng>(params: &SnowParams, rng: &mut R) -> Option<Vec3> {
    if rng.gen::<f32>() >= params.wobble_chance {
        return None;
    }
    Some(
        vec3(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        ) * params.wobble_amplitude,
    )
}

pub fn collide_ground(particle: &mut Particle, params: &SnowParams) -> bool {
    if particle.position.y >= params.ground_y {
        return false;
    }

    let velocity = &mut particle.velocity;
    particle.position.y = params.ground_y;
    velocity.y = velocity.y.abs() * params.bounce;
    velocity.x *= params.ground_friction;
    velocity.z *= params.ground_friction;

    if velocity.length() < params.settle_speed {
        *velocity = Vec3::ZERO;
    }
    true
}

pub fn contain_in_wall(particle: &mut Particle, params: &SnowParams, delta: f32) -> bool {
    let distance = particle.position.length();
    if distance <= params.wall_radius {
        return false;
    }

    let outward = particle.position / distance;
    particle.velocity += outward * (-params.wall_push * delta);
    particle.position = outward * params.wall_radius;
    true
}

pub fn advance<R: Rng>(
    particle: &mut Particle,
    params: &SnowParams,
    delta: f32,
    elapsed: f32,
    rng: &mut R,
) {
    particle.velocity += swirl(particle.position, elapsed, params) * delta;

    if let Some(kick) = wobble(params, rng) {
        particle.velocity += kick;
    }

    particle.velocity *= params.drag;
    particle.velocity.y -= params.gravity * delta;

    particle.position += particle.velocity * (delta * params.reference_rate);

    collide_ground(particle, params);
    contain_in_wall(particle, params, delta);
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::simulation::particle::{Flake, Orientation};

    fn particle_at(position: Vec3, velocity: Vec3) -> Particle {
        Particle {
            position,
            velocity,
            orientation: Orientation::Tumble {
                angles: Vec3::ZERO,
                rates: Vec3::ZERO,
            },
            flake: Flake { size: 5. },
        }
    }

    #[test]
    fn swirl_matches_the_current_formula() {
        let params = SnowParams::default();
        let position = vec3(10., 0., -20.);
        let swirl = swirl(position, 2., &params);

        assert!((swirl.x - (1.0f32 + -20. * 0.02).sin() * 8.).abs() < 1e-5);
        assert!((swirl.y - (1.4f32 + 10. * 0.015).sin() * 3.).abs() < 1e-5);
        assert!((swirl.z - (1.0f32 + 10. * 0.02).cos() * 8.).abs() < 1e-5);
    }

    #[test]
    fn wobble_stays_in_its_box() {
        let params = SnowParams::default();
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let mut hits = 0;

        for _ in 0..10_000 {
            if let Some(kick) = wobble(&params, &mut rng) {
                hits += 1;
                assert!(kick.x.abs() <= 1.5 && kick.z.abs() <= 1.5);
                assert!(kick.y.abs() <= 1.);
            }
        }

        assert!((2_500..3_500).contains(&hits), "hits = {}", hits);
    }

    #[test]
    fn wobble_never_fires_when_disabled() {
        let params = SnowParams::default().calm();
        let mut rng = Pcg64Mcg::seed_from_u64(12);
        assert!((0..1_000).all(|_| wobble(&params, &mut rng).is_none()));
    }

    #[test]
    fn ground_bounce_loses_energy() {
        let params = SnowParams::default();
        let mut particle = particle_at(vec3(0., -70., 0.), vec3(10., -20., 10.));

        assert!(collide_ground(&mut particle, &params));

        assert_eq!(particle.position.y, -62.);
        assert_eq!(particle.velocity, vec3(7.5, 8., 7.5));
    }

    #[test]
    fn slow_landing_settles() {
        let params = SnowParams::default();
        let mut particle = particle_at(vec3(0., -63., 0.), vec3(1., -2., 1.));

        assert!(collide_ground(&mut particle, &params));

        assert_eq!(particle.velocity, Vec3::ZERO);
    }

    #[test]
    fn above_ground_is_untouched() {
        let params = SnowParams::default();
        let mut particle = particle_at(vec3(0., -62., 0.), vec3(0., -1., 0.));

        assert!(!collide_ground(&mut particle, &params));
        assert_eq!(particle.velocity, vec3(0., -1., 0.));
    }

    #[test]
    fn wall_clamps_and_pushes_inward() {
        let params = SnowParams::default();
        let mut particle = particle_at(vec3(0., 0., 120.), Vec3::ZERO);

        assert!(contain_in_wall(&mut particle, &params, 0.5));

        assert!((particle.position - vec3(0., 0., 108.)).length() < 1e-4);
        assert!((particle.velocity - vec3(0., 0., -4.)).length() < 1e-5);
    }

    #[test]
    fn wall_clamps_even_without_time() {
        let params = SnowParams::default();
        let mut particle = particle_at(vec3(100., 50., 0.), vec3(1., 0., 0.));

        assert!(contain_in_wall(&mut particle, &params, 0.));

        assert!((particle.position.length() - 108.).abs() < 1e-3);
        assert_eq!(particle.velocity, vec3(1., 0., 0.));
    }

    #[test]
    fn free_fall_follows_drag_and_gravity() {
        let params = SnowParams::default().calm();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut particle = particle_at(vec3(0., 0., 0.), vec3(0., 1., 0.));
        let delta = 0.5;

        advance(&mut particle, &params, delta, 0., &mut rng);

        let vy = 1. * 0.97 - 4. * delta;
        assert!((particle.velocity.y - vy).abs() < 1e-5);
        assert!((particle.position.y - vy * delta * 60.).abs() < 1e-4);
    }

    #[test]
    fn zero_delta_keeps_position() {
        let params = SnowParams::default();
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let start = vec3(20., -50., 10.);
        let mut particle = particle_at(start, vec3(3., 1., -2.));

        for _ in 0..50 {
            advance(&mut particle, &params, 0., 10., &mut rng);
        }

        assert_eq!(particle.position, start);
    }

    #[test]
    fn resting_flake_stays_at_rest() {
        let params = SnowParams::default().calm();
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let start = vec3(30., params.ground_y, -12.);
        let mut particle = particle_at(start, Vec3::ZERO);

        for _ in 0..10 {
            advance(&mut particle, &params, 1. / 60., 0., &mut rng);
            assert_eq!(particle.velocity, Vec3::ZERO);
            assert_eq!(particle.position, start);
        }
    }
}
