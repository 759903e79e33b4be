//! Cursor Gravity
//!
//! Particles drawn straight to the window, attracted to the cursor.

use cursor_gravity::Variant;

fn main() {
    // Initialize logger (RUST_LOG=debug for the per-second frame report)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting cursor gravity simulation...");

    if let Err(e) = cursor_gravity::run(Variant::Direct) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
