//! CPU reference integrator
//!
//! NOTE: The running simulation integrates on the GPU (`integrate.wgsl`).
//! This module is the reference the shader is checked against and must stay
//! in lockstep with it.

use glam::Vec2;

use crate::constants::{BOUND, R2_MAX, R2_MIN, REFLECT_LOSS};
use crate::particle::Particle;
use crate::ping_pong::{BufferRoles, PingPong};

const X_NORMAL: Vec2 = Vec2::X;
const Y_NORMAL: Vec2 = Vec2::Y;

/// Normalize, mapping the zero vector to zero instead of NaN
pub fn safe_normalize(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > 0.0 {
        v / len
    } else {
        Vec2::ZERO
    }
}

/// Reflect `v` about the plane with unit normal `n` (GLSL/WGSL `reflect`)
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    v - 2.0 * v.dot(n) * n
}

/// Acceleration toward `source`
///
/// `normalize(diff) / clamp(|diff|², R2_MIN, R2_MAX)`. The squared distance in
/// the denominator combined with a unit direction gives an inverse-square
/// magnitude only inside the clamp range.
pub fn attraction(position: Vec2, source: Vec2) -> Vec2 {
    let diff = source - position;
    let r2 = diff.length_squared().clamp(R2_MIN, R2_MAX);
    safe_normalize(diff) / r2
}

/// Advance one particle by `dt`
///
/// Semi-implicit Euler followed by per-axis reflection evaluated against the
/// candidate position. The position itself is never clamped.
pub fn integrate(particle: &Particle, source: Vec2, dt: f32) -> Particle {
    let position = particle.position();
    let velocity = particle.velocity();

    let mut new_vel = velocity + dt * attraction(position, source);
    let new_pos = position + dt * new_vel;

    if new_pos.x < -BOUND || new_pos.x > BOUND {
        new_vel = REFLECT_LOSS * reflect(new_vel, X_NORMAL);
    }
    if new_pos.y < -BOUND || new_pos.y > BOUND {
        new_vel = REFLECT_LOSS * reflect(new_vel, Y_NORMAL);
    }

    Particle::new(new_pos, new_vel)
}

/// Integrate every particle of `current` into `next`
///
/// Both slices must have the same length. Each record depends only on its
/// own input record.
pub fn step_particles(current: &[Particle], next: &mut [Particle], source: Vec2, dt: f32) {
    debug_assert_eq!(current.len(), next.len());
    for (out, p) in next.iter_mut().zip(current) {
        *out = integrate(p, source, dt);
    }
}

/// Double-buffered CPU simulation, same stepping order as the GPU one
pub struct CpuSimulation {
    buffers: PingPong<Vec<Particle>>,
}

impl CpuSimulation {
    pub fn new(particles: &[Particle]) -> Self {
        Self {
            buffers: PingPong::new(particles.to_vec(), vec![Particle::default(); particles.len()]),
        }
    }

    pub fn step(&mut self, source: Vec2, dt: f32) {
        let (current, next) = self.buffers.split();
        step_particles(current, next, source, dt);
        self.buffers.swap();
    }

    /// State that the next step will read
    pub fn particles(&self) -> &[Particle] {
        self.buffers.current()
    }

    pub fn roles(&self) -> BufferRoles {
        self.buffers.roles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPS
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let particles = [
            Particle::new(Vec2::new(0.3, -0.2), Vec2::new(0.5, 0.1)),
            Particle::new(Vec2::new(-0.9, 0.9), Vec2::new(-2.0, 3.0)),
            Particle::at_rest(Vec2::ZERO),
        ];
        let mut next = [Particle::default(); 3];

        step_particles(&particles, &mut next, Vec2::new(0.25, 0.75), 0.0);

        assert_eq!(particles, next);
    }

    #[test]
    fn test_particle_at_source_stays_finite() {
        let p = Particle::new(Vec2::new(0.4, -0.4), Vec2::new(0.2, 0.0));
        let out = integrate(&p, Vec2::new(0.4, -0.4), 0.016);

        assert!(out.is_finite());
        // Zero direction means no force: velocity carries over unchanged
        assert_eq!(out.velocity, p.velocity);
    }

    #[test]
    fn test_safe_normalize_zero() {
        assert_eq!(safe_normalize(Vec2::ZERO), Vec2::ZERO);
        assert!(approx(safe_normalize(Vec2::new(3.0, 4.0)), Vec2::new(0.6, 0.8)));
    }

    #[test]
    fn test_attraction_toward_origin() {
        let dt = 0.1;
        let p = Particle::at_rest(Vec2::new(0.5, 0.5));
        let out = integrate(&p, Vec2::ZERO, dt);

        // |diff|² = 0.5, inside the clamp range
        let expected = dt * Vec2::new(-0.5, -0.5).normalize() / 0.5;
        assert!(approx(out.velocity(), expected));
        assert!(approx(out.position(), Vec2::new(0.5, 0.5) + dt * expected));
    }

    #[test]
    fn test_r2_clamped_at_both_ends() {
        // Very close: r2 floors at R2_MIN
        let near = attraction(Vec2::new(0.01, 0.0), Vec2::ZERO);
        assert!(approx(near, Vec2::new(-1.0 / R2_MIN, 0.0)));

        // Far away: r2 caps at R2_MAX
        let far = attraction(Vec2::new(-1.0, 1.0), Vec2::new(1.0, -1.0));
        let dir = Vec2::new(2.0, -2.0).normalize();
        assert!(approx(far, dir / R2_MAX));
    }

    #[test]
    fn test_x_reflection_at_right_edge() {
        let dt = 0.1;
        let p = Particle::new(Vec2::new(0.99, 0.0), Vec2::new(1.0, 0.0));
        let source = Vec2::ZERO;

        let pre = Vec2::new(1.0, 0.0) + dt * attraction(p.position(), source);
        let candidate_x = 0.99 + dt * pre.x;
        assert!(candidate_x > 1.0);

        let out = integrate(&p, source, dt);

        assert!(approx(out.velocity(), Vec2::new(-0.5 * pre.x, 0.5 * pre.y)));
        // Not clamped back into range
        assert!((out.position[0] - candidate_x).abs() < EPS);
    }

    #[test]
    fn test_boundary_scenario_with_source_at_particle_height() {
        // Source on the same row so the force has no y component
        let dt = 0.1;
        let p = Particle::new(Vec2::new(0.99, 0.0), Vec2::new(1.0, 0.0));
        let source = Vec2::new(2.0, 0.0);

        let out = integrate(&p, source, dt);

        // diff = (1.01, 0), r2 clamped to 1.0
        let pre_x = 1.0 + dt * 1.0;
        assert!((out.position[0] - (0.99 + dt * pre_x)).abs() < EPS);
        assert!((out.velocity[0] + 0.5 * pre_x).abs() < EPS);
        assert_eq!(out.velocity[1], 0.0);
    }

    #[test]
    fn test_both_axes_reflect_independently() {
        let dt = 0.1;
        let p = Particle::new(Vec2::new(0.99, -0.99), Vec2::new(1.0, -1.0));
        let source = Vec2::new(0.99, -0.99);

        let out = integrate(&p, source, dt);

        // Zero force; x bounce halves and flips x, y bounce halves both again
        assert!(approx(out.velocity(), Vec2::new(-0.25, 0.25)));
        assert!(approx(out.position(), Vec2::new(1.09, -1.09)));
    }

    #[test]
    fn test_no_reflection_inside_bounds() {
        let p = Particle::new(Vec2::new(0.0, 0.0), Vec2::new(0.1, 0.1));
        let out = integrate(&p, Vec2::new(0.0, 0.0), 0.1);
        assert!(approx(out.velocity(), Vec2::new(0.1, 0.1)));
    }

    #[test]
    fn test_cpu_simulation_fifty_particles_one_step() {
        let dt = 0.1;
        let seed = vec![Particle::at_rest(Vec2::new(0.5, 0.5)); 50];
        let mut sim = CpuSimulation::new(&seed);

        sim.step(Vec2::ZERO, dt);

        let expected = dt * Vec2::new(-0.5, -0.5).normalize() / 0.5;
        assert_eq!(sim.particles().len(), 50);
        for p in sim.particles() {
            assert!(approx(p.velocity(), expected));
        }
        assert_eq!(sim.roles().current(), 1);
    }

    #[test]
    fn test_cpu_simulation_stays_finite_over_many_steps() {
        let seed = vec![
            Particle::at_rest(Vec2::new(0.1, 0.1)),
            Particle::at_rest(Vec2::new(-0.95, 0.95)),
            Particle::at_rest(Vec2::ZERO),
        ];
        let mut sim = CpuSimulation::new(&seed);

        for _ in 0..1000 {
            sim.step(Vec2::ZERO, 1.0 / 60.0);
        }

        assert!(sim.particles().iter().all(Particle::is_finite));
    }

    #[test]
    fn test_reflect_matches_axis_flip() {
        let v = Vec2::new(2.0, -3.0);
        assert_eq!(reflect(v, Vec2::X), Vec2::new(-2.0, -3.0));
        assert_eq!(reflect(v, Vec2::Y), Vec2::new(2.0, 3.0));
    }
}
