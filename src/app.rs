//! Window, GPU context and frame loop

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use gravity_physics::{seed_particles, BOUND, PARTICLE_COUNT, WINDOW_HEIGHT, WINDOW_WIDTH};
use gravity_renderer::{OffscreenTarget, PointRenderer, PresentRenderer};
use gravity_simulation::{request_device, GpuError, ParticleSimulation};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    error::EventLoopError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

/// How the frame reaches the screen and where gravity comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Points drawn straight to the surface, source follows the cursor
    Direct,
    /// Points drawn to an offscreen target then composited, source fixed at the origin
    Offscreen,
}

impl Variant {
    pub fn title(self) -> &'static str {
        match self {
            Variant::Direct => "Cursor Gravity",
            Variant::Offscreen => "Cursor Gravity (offscreen)",
        }
    }

    /// Gravity source for this frame given the cursor in NDC
    pub fn gravity_source(self, cursor_ndc: Vec2) -> Vec2 {
        match self {
            Variant::Direct => cursor_ndc,
            Variant::Offscreen => Vec2::ZERO,
        }
    }
}

/// Map a window-space cursor position (pixels, y down) to NDC (y up)
pub fn cursor_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
    let half_w = width.max(1) as f64 / 2.0;
    let half_h = height.max(1) as f64 / 2.0;
    Vec2::new(((x - half_w) / half_w) as f32, ((half_h - y) / half_h) as f32)
}

/// Cursor in NDC; the window centre until the cursor first moves
fn cursor_ndc(cursor: Option<PhysicalPosition<f64>>, size: PhysicalSize<u32>) -> Vec2 {
    cursor
        .map(|p| cursor_to_ndc(p.x, p.y, size.width, size.height))
        .unwrap_or(Vec2::ZERO)
}

/// Fixed-size window in screen coordinates, so HiDPI displays scale it up
fn window_attributes(variant: Variant) -> WindowAttributes {
    Window::default_attributes()
        .with_title(variant.title())
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .with_resizable(false)
}

/// Offscreen target plus the pass that composites it
struct Compositor {
    target: OffscreenTarget,
    present: PresentRenderer,
}

/// Elapsed time between simulation steps
struct FrameClock {
    last_step: Instant,
}

impl FrameClock {
    fn new(now: Instant) -> Self {
        Self { last_step: now }
    }

    /// Seconds since the last frame that took a step
    fn dt(&self, now: Instant) -> f32 {
        (now - self.last_step).as_secs_f32()
    }

    fn stepped(&mut self, now: Instant) {
        self.last_step = now;
    }
}

struct FrameStats {
    frames: u32,
    since: Instant,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
        }
    }

    /// Count a frame; returns frames per second once a second has elapsed
    fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = (now - self.since).as_secs_f32();
        if elapsed < 1.0 {
            return None;
        }
        let fps = self.frames as f32 / elapsed;
        self.frames = 0;
        self.since = now;
        Some(fps)
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    simulation: ParticleSimulation,
    points: PointRenderer,
    compositor: Option<Compositor>,

    stats: FrameStats,
}

impl GpuState {
    async fn new(window: Arc<Window>, variant: Variant) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let particles = seed_particles(&mut rand::rng(), PARTICLE_COUNT, BOUND);
        log::info!("✓ Seeded {} particles", particles.len());

        let simulation = ParticleSimulation::new(device.clone(), queue.clone(), &particles);
        log::info!("✓ Simulation initialized");

        let points = PointRenderer::new(&device, config.format, config.width, config.height);
        log::info!("✓ Point renderer initialized");

        let compositor = match variant {
            Variant::Direct => None,
            Variant::Offscreen => {
                let target = OffscreenTarget::new(&device, config.format, config.width, config.height);
                let present = PresentRenderer::new(&device, config.format, &target);
                log::info!("✓ Offscreen compositor initialized");
                Some(Compositor { target, present })
            }
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            simulation,
            points,
            compositor,
            stats: FrameStats::new(),
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.points.resize(new_size.width, new_size.height);

            if let Some(compositor) = &mut self.compositor {
                compositor
                    .target
                    .resize(&self.device, new_size.width, new_size.height);
                compositor.present.set_source(&self.device, &compositor.target);
            }
        }
    }

    /// One frame: integrate current -> next, draw current, present, swap roles
    fn render(&mut self, source: Vec2, dt: f32) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.simulation.encode_step(&mut encoder, source, dt);

        // Draw from the buffer the step just read, i.e. the pre-update positions
        let point_target = match &self.compositor {
            Some(compositor) => &compositor.target.view,
            None => &surface_view,
        };
        self.points.render(
            &self.device,
            &self.queue,
            &mut encoder,
            point_target,
            self.simulation.current_buffer(),
            self.simulation.particle_count(),
        );

        if let Some(compositor) = &self.compositor {
            compositor.present.render(&mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.simulation.swap_buffers();

        if let Some(fps) = self.stats.tick(Instant::now()) {
            log::debug!("{:.0} FPS, buffer roles {:?}", fps, self.simulation.roles());
            if log::log_enabled!(log::Level::Trace) {
                match self.simulation.read_current() {
                    Ok(state) => log::trace!("first particle: {:?}", state.first()),
                    Err(e) => log::warn!("state readback failed: {}", e),
                }
            }
        }

        Ok(())
    }
}

pub struct App {
    variant: Variant,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    cursor: Option<PhysicalPosition<f64>>,
    clock: FrameClock,
}

impl App {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            window: None,
            gpu_state: None,
            cursor: None,
            clock: FrameClock::new(Instant::now()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes(self.variant)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        window.set_cursor_visible(false);

        match pollster::block_on(GpuState::new(window.clone(), self.variant)) {
            Ok(gpu_state) => self.gpu_state = Some(gpu_state),
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
        self.clock = FrameClock::new(Instant::now());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(position);
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = self.clock.dt(now);

                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    let size = PhysicalSize::new(gpu_state.config.width, gpu_state.config.height);
                    let source = self.variant.gravity_source(cursor_ndc(self.cursor, size));

                    // A failed frame took no step; its time carries into the next one
                    match gpu_state.render(source, dt) {
                        Ok(()) => self.clock.stepped(now),
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            log::warn!("Surface lost, reconfiguring");
                            gpu_state.resize(window.inner_size());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of GPU memory");
                            event_loop.exit();
                        }
                        Err(e) => log::warn!("Render error: {:?}", e),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Open the window and run the frame loop until it is closed
pub fn run(variant: Variant) -> Result<(), EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(variant);
    event_loop.run_app(&mut app)
}
