//! Integrator uniform

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use gravity_physics::{BOUND, PARTICLE_COUNT, R2_MAX, R2_MIN, REFLECT_LOSS};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct IntegratorParams {
    // Per-frame inputs
    // x, y: gravity source in NDC
    pub source: [f32; 2],
    pub dt: f32,

    // Force law
    pub reflect_loss: f32,
    pub r2_min: f32,
    pub r2_max: f32,
    pub bound: f32,

    pub particle_count: u32,
}

impl Default for IntegratorParams {
    fn default() -> Self {
        Self {
            source: [0.0, 0.0],
            dt: 0.0,
            reflect_loss: REFLECT_LOSS,
            r2_min: R2_MIN,
            r2_max: R2_MAX,
            bound: BOUND,
            particle_count: PARTICLE_COUNT as u32,
        }
    }
}

impl IntegratorParams {
    pub fn with_frame(self, source: Vec2, dt: f32) -> Self {
        Self {
            source: source.to_array(),
            dt,
            ..self
        }
    }
}
