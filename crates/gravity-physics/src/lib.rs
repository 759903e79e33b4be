//! # Gravity Physics
//!
//! Particle state, force-law constants and the CPU reference integrator for
//! the cursor gravity simulation. The GPU integrator mirrors [`integrate`].

pub mod constants;
pub mod integrator;
pub mod particle;
pub mod ping_pong;

pub use constants::*;
pub use integrator::*;
pub use particle::*;
pub use ping_pong::*;
