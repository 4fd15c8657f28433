use std::f32::consts::{PI, TAU};

use glam::{vec3, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    azimuth: f32,
    polar: f32,
    distance: f32,

    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,

    last_eye: Vec3,
}

impl OrbitControls {
    const EPSILON: f32 = 1e-6;
    const POLAR_MARGIN: f32 = 0.01;

    pub fn new(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(Self::EPSILON);

        Self {
            target,
            rotate_speed: 0.6,
            damping: 0.08,
            min_distance: 150.,
            max_distance: 800.,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1., 1.).acos(),
            distance,
            pending_azimuth: 0.,
            pending_polar: 0.,
            pending_zoom: 1.,
            last_eye: eye,
        }
    }

    /// Horizontal orbit angle in radians, in `[-PI, PI]`.
    pub fn azimuth(&self) -> f32 {
        let offset = self.last_eye - self.target;
        offset.x.atan2(offset.z)
    }

    #[cfg(test)]
    pub fn polar(&self) -> f32 {
        self.polar
    }

    #[cfg(test)]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn eye(&self) -> Vec3 {
        self.last_eye
    }

    pub fn drag(&mut self, (dx, dy): (f32, f32), viewport_height: f32) {
        let height = viewport_height.max(1.);
        self.pending_azimuth -= TAU * dx / height * self.rotate_speed;
        self.pending_polar -= TAU * dy / height * self.rotate_speed;
    }

    pub fn zoom(&mut self, steps: f32) {
        self.pending_zoom *= 0.95f32.powf(steps);
    }

    /// Applies the damped motion. Returns whether the eye moved.
    pub fn update(&mut self) -> bool {
        self.azimuth += self.pending_azimuth * self.damping;
        self.polar = (self.polar + self.pending_polar * self.damping)
            .clamp(Self::POLAR_MARGIN, PI - Self::POLAR_MARGIN);
        self.distance = (self.distance * self.pending_zoom).clamp(self.min_distance, self.max_distance);

        self.pending_azimuth *= 1. - self.damping;
        self.pending_polar *= 1. - self.damping;
        self.pending_zoom = 1.;

        let eye = self.target
            + vec3(
                self.polar.sin() * self.azimuth.sin(),
                self.polar.cos(),
                self.polar.sin() * self.azimuth.cos(),
            ) * self.distance;

        let moved = eye.distance_squared(self.last_eye) > Self::EPSILON;
        self.last_eye = eye;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(vec3(0., 50., 400.), Vec3::ZERO)
    }

    #[test]
    fn starts_where_the_camera_is() {
        let mut controls = controls();
        assert_eq!(controls.azimuth(), 0.);
        assert!((controls.distance() - 403.1129).abs() < 1e-3);

        assert!(!controls.update());
        assert!((controls.eye() - vec3(0., 50., 400.)).length() < 1e-2);
    }

    #[test]
    fn drag_orbits_with_damping() {
        let mut controls = controls();
        controls.drag((100., 0.), 720.);

        assert!(controls.update());
        let first = controls.azimuth();
        assert!(first < 0.);

        assert!(controls.update());
        let second = controls.azimuth() - first;
        assert!(second < 0. && second.abs() < first.abs());
    }

    #[test]
    fn motion_dies_out() {
        let mut controls = controls();
        controls.drag((50., 20.), 720.);

        let moving_frames = (0..1000).take_while(|_| controls.update()).count();

        assert!(moving_frames > 10 && moving_frames < 1000);
        assert!(!controls.update());
    }

    #[test]
    fn polar_never_flips_over_the_top() {
        let mut controls = controls();
        for _ in 0..100 {
            controls.drag((0., 5000.), 720.);
            controls.update();
        }
        assert!(controls.polar() >= 0.01 - 1e-6);
        assert!(controls.eye().y > 0.);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controls = controls();
        controls.zoom(100.);
        assert!(controls.update());
        assert_eq!(controls.distance(), 150.);

        controls.zoom(-200.);
        controls.update();
        assert_eq!(controls.distance(), 800.);
    }
}
