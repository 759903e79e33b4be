//! Cursor Gravity, offscreen variant
//!
//! Particles fall toward the origin, drawn into an offscreen target and composited to the
//! window through a textured quad.

use cursor_gravity::Variant;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting cursor gravity simulation (offscreen)...");

    if let Err(e) = cursor_gravity::run(Variant::Offscreen) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
