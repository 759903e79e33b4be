//! Simulation constants
//!
//! The force law is hardcoded; these values are shared by the CPU reference
//! integrator, the GPU uniform defaults and the application.

/// Number of particles in each state buffer
pub const PARTICLE_COUNT: usize = 50;

/// Lower clamp on the squared distance to the source (avoids the singularity)
pub const R2_MIN: f32 = 0.1;

/// Upper clamp on the squared distance to the source (caps long-range falloff)
pub const R2_MAX: f32 = 1.0;

/// Fraction of velocity kept after a boundary bounce
pub const REFLECT_LOSS: f32 = 0.5;

/// Half-extent of the arena in normalized device coordinates
pub const BOUND: f32 = 1.0;

/// Rendered point size in pixels
pub const POINT_SIZE: f32 = 5.0;

/// Window size in physical pixels
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;
