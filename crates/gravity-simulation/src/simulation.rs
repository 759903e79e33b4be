//! GPU-based particle simulation manager
//!
//! NOTE: Two state buffers ping-pong every frame. Bind group `i` reads buffer `i` and writes
//! buffer `1 - i`, so picking the bind group by `roles.current()` is all it takes to keep the
//! single-writer/single-reader rule. Queue ordering guarantees the write is finished before the
//! next frame reads it.

use std::sync::mpsc;

use glam::Vec2;
use gravity_physics::{BufferRoles, Particle};
use wgpu::util::DeviceExt;

use crate::{GpuError, IntegratorParams};

/// Threads per workgroup, must match `@workgroup_size` in `integrate.wgsl`
const WORKGROUP_SIZE: u32 = 64;

/// Request a device and queue with default limits
pub async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok((device, queue))
}

/// GPU-based cursor gravity simulation
pub struct ParticleSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    // Buffers
    state_buffers: [wgpu::Buffer; 2],
    params_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,

    // Compute pipeline
    integrate_pipeline: wgpu::ComputePipeline,

    // Bind groups, indexed by the buffer being read
    integrate_bind_groups: [wgpu::BindGroup; 2],

    params: IntegratorParams,
    roles: BufferRoles,
    particle_count: u32,
}

impl ParticleSimulation {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, particles: &[Particle]) -> Self {
        log::info!("Initializing ParticleSimulation...");
        let particle_count = particles.len() as u32;
        let state_size = std::mem::size_of_val(particles) as u64;

        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;

        // Buffer 0 carries the seed; buffer 1 is only ever read after the first step writes it
        let seeded_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("State Buffer 0"),
            contents: bytemuck::cast_slice(particles),
            usage,
        });
        let feedback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Buffer 1"),
            size: state_size,
            usage,
            mapped_at_creation: false,
        });
        let state_buffers = [seeded_buffer, feedback_buffer];

        let params = IntegratorParams {
            particle_count,
            ..IntegratorParams::default()
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Integrator Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Staging Buffer"),
            size: state_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Buffers created");

        let integrate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/integrate.wgsl").into()),
        });

        let integrate_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Integration Bind Group Layout"),
                entries: &[
                    // Current state (read)
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Next state (write)
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        log::debug!("Creating integrate pipeline layout...");
        let integrate_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Integration Pipeline Layout"),
                bind_group_layouts: &[&integrate_bind_group_layout],
                push_constant_ranges: &[],
            });

        log::debug!("Creating integrate pipeline...");
        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&integrate_pipeline_layout),
            module: &integrate_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let make_bind_group = |label: &str, read: &wgpu::Buffer, write: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &integrate_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: read.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: write.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let integrate_bind_groups = [
            make_bind_group("Integration Bind Group 0 -> 1", &state_buffers[0], &state_buffers[1]),
            make_bind_group("Integration Bind Group 1 -> 0", &state_buffers[1], &state_buffers[0]),
        ];

        log::info!("Pipelines created");

        Self {
            device,
            queue,
            state_buffers,
            params_buffer,
            staging_buffer,
            integrate_pipeline,
            integrate_bind_groups,
            params,
            roles: BufferRoles::default(),
            particle_count,
        }
    }

    /// Record one integration step (current -> next) into `encoder`
    ///
    /// The uniform upload is queued immediately and lands before `encoder` is submitted.
    pub fn encode_step(&self, encoder: &mut wgpu::CommandEncoder, source: Vec2, dt: f32) {
        let params = self.params.with_frame(source, dt);
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let workgroup_count = self.particle_count.div_ceil(WORKGROUP_SIZE);

        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Integration Compute Pass"),
            timestamp_writes: None,
        });
        compute_pass.set_pipeline(&self.integrate_pipeline);
        compute_pass.set_bind_group(0, &self.integrate_bind_groups[self.roles.current()], &[]);
        compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
    }

    /// Step the simulation forward by one timestep and swap buffer roles
    pub fn step(&mut self, source: Vec2, dt: f32) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Simulation Encoder"),
            });
        self.encode_step(&mut encoder, source, dt);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.swap_buffers();
    }

    /// Make the buffer written by the last step the one read by the next
    pub fn swap_buffers(&mut self) {
        self.roles.swap();
    }

    /// Buffer the next step reads (and the frame draws from)
    pub fn current_buffer(&self) -> &wgpu::Buffer {
        &self.state_buffers[self.roles.current()]
    }

    pub fn roles(&self) -> BufferRoles {
        self.roles
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// Copy the current state back to the host (blocking)
    pub fn read_current(&self) -> Result<Vec<Particle>, GpuError> {
        self.read_state(self.roles.current())
    }

    /// Copy state buffer `index` back to the host (blocking)
    pub fn read_state(&self, index: usize) -> Result<Vec<Particle>, GpuError> {
        let size = self.staging_buffer.size();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("State Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.state_buffers[index], 0, &self.staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging_buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))??;

        let particles = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Particle>(&data).to_vec()
        };
        self.staging_buffer.unmap();

        Ok(particles)
    }
}
