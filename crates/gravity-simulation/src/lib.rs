//! # Gravity Simulation Engine
//!
//! GPU particle integration with double-buffered state, advanced one step per
//! frame by a compute shader.

pub mod error;
pub mod params;
pub mod simulation;

pub use error::*;
pub use params::*;
pub use simulation::*;
