//! Cursor Gravity
//!
//! Particles attracted to the cursor, integrated on the GPU with double-buffered state.
//! The two binaries differ only in [`Variant`].

pub mod app;

pub use app::{cursor_to_ndc, run, Variant};
