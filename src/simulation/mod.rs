mod clock;
mod field;
mod kinematics;
mod params;
mod particle;
mod shake;

use glam::Vec3;
use rand::Rng;

pub use clock::Clock;
pub use field::ParticleField;
pub use params::SnowParams;
pub use particle::{FlakeStyle, FlakeTemplate, Particle};
pub use shake::ShakeSensor;

#[cfg(test)]
pub use particle::{Flake, Orientation};

#[derive(Debug, Clone)]
pub struct Simulation<R> {
    params: SnowParams,
    field: ParticleField,
    clock: Clock,
    shake: ShakeSensor,
    rng: R,
}

impl<R: Rng> Simulation<R> {
    pub fn new(params: SnowParams, rng: R, azimuth: f32) -> Self {
        Self {
            params,
            field: ParticleField::new(),
            clock: Clock::new(),
            shake: ShakeSensor::new(azimuth),
            rng,
        }
    }

    pub fn params(&self) -> &SnowParams {
        &self.params
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn spawn_snow(&mut self, template: Option<&FlakeTemplate>) -> bool {
        self.field.spawn(template, &self.params, &mut self.rng)
    }

    pub fn on_orbit_change(&mut self, azimuth: f32) -> Option<f32> {
        self.shake
            .on_orbit_change(azimuth, &mut self.field, &self.params, &mut self.rng)
    }

    pub fn step(&mut self, delta: f32, camera_position: Vec3) {
        let Self {
            params,
            field,
            clock,
            rng,
            ..
        } = self;

        let elapsed = clock.tick(delta);
        for particle in field.particles_mut() {
            kinematics::advance(particle, params, delta, elapsed, rng);
            particle
                .orientation
                .update(particle.position, camera_position, delta, rng);
        }
    }

    pub fn resting_count(&self) -> usize {
        self.field
            .particles()
            .iter()
            .filter(|particle| particle.is_resting())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    const CAMERA: Vec3 = glam::const_vec3!([0., 50., 400.]);
    const EPSILON: f32 = 1e-3;

    fn simulation(seed: u64, params: SnowParams, style: FlakeStyle) -> Simulation<Pcg64Mcg> {
        let mut simulation = Simulation::new(params, Pcg64Mcg::seed_from_u64(seed), 0.);
        assert!(simulation.spawn_snow(Some(&FlakeTemplate::builtin(style))));
        simulation
    }

    fn assert_contained(simulation: &Simulation<Pcg64Mcg>) {
        let params = simulation.params();
        for particle in simulation.field().particles() {
            let p = particle.position;
            assert!(p.y >= params.ground_y - EPSILON, "below ground: {:?}", p);
            assert!(p.length() <= params.wall_radius + EPSILON, "outside glass: {:?}", p);
        }
    }

    #[test]
    fn nothing_moves_before_spawn() {
        let mut simulation = Simulation::new(SnowParams::default(), Pcg64Mcg::seed_from_u64(0), 0.);

        simulation.step(1. / 60., CAMERA);
        assert_eq!(simulation.on_orbit_change(3.), Some(45.));

        assert!(simulation.field().is_empty());
        assert_eq!(simulation.clock().frames(), 1);
    }

    #[test]
    fn spawn_is_skipped_until_a_template_arrives() {
        let mut simulation = Simulation::new(SnowParams::default(), Pcg64Mcg::seed_from_u64(0), 0.);

        assert!(!simulation.spawn_snow(None));
        assert!(!simulation.field().is_spawned());

        assert!(simulation.spawn_snow(Some(&FlakeTemplate::builtin(FlakeStyle::Tumble))));
        assert_eq!(simulation.field().len(), 800);
    }

    #[test]
    fn zero_delta_freezes_positions() {
        let mut simulation = simulation(3, SnowParams::default(), FlakeStyle::Billboard);
        let before: Vec<_> = simulation.field().particles().iter().map(|p| p.position).collect();

        simulation.step(0., CAMERA);

        let after: Vec<_> = simulation.field().particles().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn same_seed_same_snow() {
        let mut a = simulation(99, SnowParams::default(), FlakeStyle::Tumble);
        let mut b = simulation(99, SnowParams::default(), FlakeStyle::Tumble);

        for frame in 0..120 {
            if frame == 30 {
                a.on_orbit_change(0.2);
                b.on_orbit_change(0.2);
            }
            a.step(1. / 60., CAMERA);
            b.step(1. / 60., CAMERA);
        }

        assert_eq!(a.field(), b.field());
    }

    #[test]
    fn calm_pile_settles_on_the_ground() {
        let params = SnowParams::default().calm();
        let mut simulation = simulation(21, params, FlakeStyle::Billboard);

        for _ in 0..600 {
            simulation.step(1. / 60., CAMERA);
            assert_contained(&simulation);
        }

        assert_eq!(simulation.resting_count(), params.flake_count);
        for particle in simulation.field().particles() {
            assert!((particle.position.y - params.ground_y).abs() < EPSILON);
        }
    }

    #[test]
    fn ten_seconds_of_snow_stay_inside_the_globe() {
        let mut simulation = simulation(8, SnowParams::default(), FlakeStyle::Billboard);

        for _ in 0..600 {
            simulation.step(1. / 60., CAMERA);
            assert_contained(&simulation);
        }

        assert_eq!(simulation.clock().frames(), 600);
        assert_eq!(simulation.field().len(), 800);
    }

    #[test]
    fn hard_shake_lifts_the_snow_inside_the_glass() {
        let params = SnowParams::default();
        let mut simulation = simulation(17, params, FlakeStyle::Tumble);

        assert_eq!(simulation.on_orbit_change(1.), Some(45.));
        simulation.step(1. / 60., CAMERA);
        assert_contained(&simulation);

        let lifted = simulation
            .field()
            .particles()
            .iter()
            .filter(|p| p.position.y > params.ground_y + params.pile_height)
            .count();
        assert!(lifted > params.flake_count / 2, "only {} lifted", lifted);

        for _ in 0..1200 {
            simulation.step(1. / 60., CAMERA);
            assert_contained(&simulation);
        }
    }

    #[test]
    fn billboards_face_the_camera_after_a_step() {
        let mut simulation = simulation(5, SnowParams::default(), FlakeStyle::Billboard);
        let camera = vec3(-300., 120., 80.);

        simulation.step(1. / 60., camera);

        for particle in simulation.field().particles() {
            let normal = particle.orientation.rotation() * Vec3::Z;
            let to_camera = (camera - particle.position).normalize();
            assert!(normal.dot(to_camera) > 0.999);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn containment_holds_under_any_frame_pacing(
            seed in any::<u64>(),
            deltas in prop::collection::vec(0.0f32..0.25, 1..90),
            swings in prop::collection::vec(-3.0f32..3.0, 0..8),
        ) {
            let mut simulation = simulation(seed, SnowParams::default(), FlakeStyle::Billboard);
            let mut swings = swings.into_iter();

            for (frame, delta) in deltas.into_iter().enumerate() {
                if frame % 10 == 0 {
                    if let Some(azimuth) = swings.next() {
                        simulation.on_orbit_change(azimuth);
                    }
                }
                simulation.step(delta, CAMERA);

                let params = *simulation.params();
                for particle in simulation.field().particles() {
                    let p = particle.position;
                    prop_assert!(p.y >= params.ground_y - EPSILON);
                    prop_assert!(p.length() <= params.wall_radius + EPSILON);
                }
            }
        }
    }
}
