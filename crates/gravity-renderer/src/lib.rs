//! # Gravity Renderer
//!
//! Point rendering for the particle state buffers, plus the offscreen target and
//! full-screen present pass used by the composited variant.

pub mod offscreen;
pub mod point_renderer;
pub mod present;

pub use offscreen::*;
pub use point_renderer::*;
pub use present::*;

/// Background colour for every frame
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;
