//! Particle record and initial seeding

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

/// GPU-compatible particle structure
/// Layout matches the WGSL `Particle` struct (two vec2<f32>, 16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position in normalized device coordinates
    pub position: [f32; 2],
    /// Velocity in NDC units per second
    pub velocity: [f32; 2],
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
        }
    }

    /// A particle at rest
    pub fn at_rest(position: Vec2) -> Self {
        Self::new(position, Vec2::ZERO)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    pub fn is_finite(&self) -> bool {
        self.position().is_finite() && self.velocity().is_finite()
    }
}

/// Seed `count` particles uniformly in [-bound, bound]² with zero velocity
pub fn seed_particles<R: Rng + ?Sized>(rng: &mut R, count: usize, bound: f32) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let x = rng.random_range(-bound..=bound);
            let y = rng.random_range(-bound..=bound);
            Particle::at_rest(Vec2::new(x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BOUND, PARTICLE_COUNT};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_particle_is_16_bytes() {
        assert_eq!(std::mem::size_of::<Particle>(), 16);
    }

    #[test]
    fn test_seed_within_bounds_and_at_rest() {
        let mut rng = StdRng::seed_from_u64(7);
        let particles = seed_particles(&mut rng, PARTICLE_COUNT, BOUND);

        assert_eq!(particles.len(), PARTICLE_COUNT);
        for p in &particles {
            assert!(p.position[0].abs() <= BOUND);
            assert!(p.position[1].abs() <= BOUND);
            assert_eq!(p.velocity, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_seed_is_deterministic_for_seeded_rng() {
        let a = seed_particles(&mut StdRng::seed_from_u64(42), 8, BOUND);
        let b = seed_particles(&mut StdRng::seed_from_u64(42), 8, BOUND);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cast_slice_preserves_layout() {
        let particles = [Particle::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0))];
        let floats: &[f32] = bytemuck::cast_slice(&particles);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }
}
