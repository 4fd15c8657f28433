use log::{debug, info};
use rand::Rng;

use super::{
    params::SnowParams,
    particle::{FlakeTemplate, Particle},
};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldState {
    AwaitingTemplate,
    Spawned {
        template: FlakeTemplate,
        particles: Vec<Particle>,
    },
}

/// Particles only come into existence through [`ParticleField::spawn`], which replaces the
/// whole field at once. Nothing adds or removes single particles afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    state: FieldState,
}

impl ParticleField {
    pub fn new() -> Self {
        Self {
            state: FieldState::AwaitingTemplate,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn is_spawned(&self) -> bool {
        matches!(self.state, FieldState::Spawned { .. })
    }

    #[cfg(test)]
    pub fn template(&self) -> Option<&FlakeTemplate> {
        match &self.state {
            FieldState::Spawned { template, .. } => Some(template),
            FieldState::AwaitingTemplate => None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        match &self.state {
            FieldState::Spawned { particles, .. } => particles,
            FieldState::AwaitingTemplate => &[],
        }
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        match &mut self.state {
            FieldState::Spawned { particles, .. } => particles,
            FieldState::AwaitingTemplate => &mut [],
        }
    }

    pub fn len(&self) -> usize {
        self.particles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles().is_empty()
    }

    pub fn spawn<R: Rng>(
        &mut self,
        template: Option<&FlakeTemplate>,
        params: &SnowParams,
        rng: &mut R,
    ) -> bool {
        let template = match template {
            Some(template) => template,
            None => {
                debug!("No flake template yet, skipping spawn");
                return false;
            }
        };

        let particles: Vec<_> = (0..params.flake_count)
            .map(|_| Particle::spawn(template, params, rng))
            .collect();
        info!(
            "Spawned {} flakes from template {:?} ({:?})",
            particles.len(),
            template.name,
            template.style
        );

        self.state = FieldState::Spawned {
            template: template.clone(),
            particles,
        };
        true
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::simulation::particle::FlakeStyle;

    #[test]
    fn starts_awaiting_a_template() {
        let field = ParticleField::new();
        assert_eq!(field.state(), &FieldState::AwaitingTemplate);
        assert!(field.is_empty());
        assert!(field.template().is_none());
    }

    #[test]
    fn spawn_without_template_is_skipped() {
        let mut field = ParticleField::new();
        let mut rng = Pcg64Mcg::seed_from_u64(0);

        assert!(!field.spawn(None, &SnowParams::default(), &mut rng));
        assert!(!field.is_spawned());
        assert_eq!(field.len(), 0);
    }

    #[test]
    fn spawn_creates_a_full_pile() {
        let params = SnowParams::default();
        let template = FlakeTemplate::builtin(FlakeStyle::Billboard);
        let mut field = ParticleField::new();
        let mut rng = Pcg64Mcg::seed_from_u64(42);

        assert!(field.spawn(Some(&template), &params, &mut rng));

        assert_eq!(field.len(), 800);
        assert_eq!(field.template(), Some(&template));
        for particle in field.particles() {
            let p = particle.position;
            assert!(vec3(p.x, 0., p.z).length() <= params.spawn_radius + 1e-3);
            assert!(p.y >= params.ground_y && p.y <= params.ground_y + params.pile_height);
            assert!(particle.is_resting());
        }
    }

    #[test]
    fn respawn_replaces_every_particle() {
        let params = SnowParams::default();
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let mut field = ParticleField::new();

        field.spawn(
            Some(&FlakeTemplate::builtin(FlakeStyle::Billboard)),
            &params,
            &mut rng,
        );
        for particle in field.particles_mut() {
            particle.velocity = vec3(1., 2., 3.);
        }

        let tumbling = FlakeTemplate {
            name: "model".into(),
            ..FlakeTemplate::builtin(FlakeStyle::Tumble)
        };
        assert!(field.spawn(Some(&tumbling), &params, &mut rng));

        assert_eq!(field.len(), params.flake_count);
        assert_eq!(field.template().map(|t| t.name.as_str()), Some("model"));
        assert!(field.particles().iter().all(Particle::is_resting));
    }
}
