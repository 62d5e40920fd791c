//! wgpu renderer. Owns the GPU state, the orbit camera, and the
//! simulation state; the winit shell borrows the latter two for input.
//!
//! Per frame the draw order follows body registration order: sun first,
//! then each planet's orbit ring and sphere, innermost to outermost. Every
//! object has its own uniform slot (model matrix + color) addressed by
//! dynamic offset, so no transform leaks into subsequent draws.

use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::camera::OrbitCamera;
use crate::geometry::{self, Mesh, SphereOptions};
use crate::planets::{Planet, PLANET_COUNT, SUN_COLOR, SUN_RADIUS};
use crate::sim::{SimClock, SimState};

/// Uniform slots: sun, then planet spheres, then orbit rings.
const SLOT_COUNT: usize = 1 + 2 * PLANET_COUNT;
const SLOT_SUN: usize = 0;

fn sphere_slot(body: usize) -> usize {
    1 + body
}

fn orbit_slot(body: usize) -> usize {
    1 + PLANET_COUNT + body
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalUniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniforms {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
}

impl Vertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        }
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    primitive: wgpu::PrimitiveState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive,
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    sphere_pipeline: wgpu::RenderPipeline,
    orbit_pipeline: wgpu::RenderPipeline,

    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,

    sphere_mesh: GpuMesh,
    orbit_meshes: Vec<GpuMesh>,

    pub camera: OrbitCamera,
    pub sim: SimState,
    pub clock: SimClock,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapters found")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Solar System Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        tracing::info!("Configuring surface: {}x{}", config.width, config.height);
        surface.configure(&device, &config);

        let (depth_texture, depth_view) = create_depth_texture(&device, config.width, config.height);

        // Meshes: one unit sphere shared by every body (scaled per draw)
        // and one orbit ring per planet at its fixed distance.
        let sphere_mesh = GpuMesh::upload(
            &device,
            "Sphere Mesh",
            &geometry::uv_sphere(SphereOptions::default()),
        );

        let orbit_meshes: Vec<GpuMesh> = Planet::all()
            .iter()
            .map(|planet| {
                GpuMesh::upload(
                    &device,
                    "Orbit Mesh",
                    &geometry::orbit_ring(planet.distance() as f32),
                )
            })
            .collect();

        tracing::info!(
            "Scene: sun + {} planets ({} .. {})",
            PLANET_COUNT,
            Planet::all()[0].name(),
            Planet::all()[PLANET_COUNT - 1].name(),
        );

        let camera = OrbitCamera::new();

        let global = GlobalUniforms {
            view_proj: camera
                .view_proj(config.width as f32 / config.height as f32)
                .to_cols_array_2d(),
        };

        let global_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global Uniform Buffer"),
            contents: bytemuck::bytes_of(&global),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // One aligned slot per drawn object, addressed by dynamic offset.
        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = (std::mem::size_of::<ObjectUniforms>() as u64).next_multiple_of(align);

        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Buffer"),
            size: object_stride * SLOT_COUNT as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("BindGroupLayout0 (Globals)"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("BindGroupLayout1 (Objects)"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("BindGroup0"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("BindGroup1"),
            layout: &object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Solar System Pipeline Layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let sphere_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            "Sphere Pipeline",
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
        );

        let orbit_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            "Orbit Pipeline",
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint32),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            depth_view,
            sphere_pipeline,
            orbit_pipeline,
            global_buffer,
            global_bind_group,
            object_buffer,
            object_bind_group,
            object_stride,
            sphere_mesh,
            orbit_meshes,
            camera,
            sim: SimState::new(),
            clock: SimClock::new(),
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        tracing::info!("Resizing to {}x{}", new_size.width, new_size.height);
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        let (depth_texture, depth_view) =
            create_depth_texture(&self.device, self.config.width, self.config.height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Recompute every uniform slot from the camera and simulation state.
    pub fn update(&mut self) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let global = GlobalUniforms {
            view_proj: self.camera.view_proj(aspect).to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&global));

        let elapsed_ms = self.clock.elapsed_ms();
        let stride = self.object_stride as usize;
        let mut slots = vec![0u8; stride * SLOT_COUNT];

        write_slot(
            &mut slots,
            stride,
            SLOT_SUN,
            &ObjectUniforms {
                model: Mat4::from_scale(Vec3::splat(SUN_RADIUS as f32)).to_cols_array_2d(),
                color: rgba(SUN_COLOR),
            },
        );

        for (i, planet) in Planet::all().iter().enumerate() {
            let position = self.sim.body_position(i, elapsed_ms).as_vec3();
            let model = Mat4::from_translation(position)
                * Mat4::from_scale(Vec3::splat(planet.radius() as f32));

            write_slot(
                &mut slots,
                stride,
                sphere_slot(i),
                &ObjectUniforms {
                    model: model.to_cols_array_2d(),
                    color: rgba(planet.color()),
                },
            );

            write_slot(
                &mut slots,
                stride,
                orbit_slot(i),
                &ObjectUniforms {
                    model: Mat4::IDENTITY.to_cols_array_2d(),
                    color: rgba(planet.color()),
                },
            );
        }

        self.queue.write_buffer(&self.object_buffer, 0, &slots);
    }

    pub fn render(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("Surface out of memory");
            }
            Err(e) => {
                return Err(anyhow::anyhow!(e));
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_bind_group(0, &self.global_bind_group, &[]);

            self.draw_sphere(&mut rpass, SLOT_SUN);

            for i in 0..PLANET_COUNT {
                self.draw_orbit(&mut rpass, i);
                self.draw_sphere(&mut rpass, sphere_slot(i));
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn draw_sphere(&self, rpass: &mut wgpu::RenderPass<'_>, slot: usize) {
        rpass.set_pipeline(&self.sphere_pipeline);
        rpass.set_bind_group(1, &self.object_bind_group, &[self.slot_offset(slot)]);
        rpass.set_vertex_buffer(0, self.sphere_mesh.vertices.slice(..));
        rpass.set_index_buffer(self.sphere_mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.sphere_mesh.index_count, 0, 0..1);
    }

    fn draw_orbit(&self, rpass: &mut wgpu::RenderPass<'_>, body: usize) {
        let mesh = &self.orbit_meshes[body];
        rpass.set_pipeline(&self.orbit_pipeline);
        rpass.set_bind_group(1, &self.object_bind_group, &[self.slot_offset(orbit_slot(body))]);
        rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
        rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn slot_offset(&self, slot: usize) -> u32 {
        (slot as u64 * self.object_stride) as u32
    }

    /// One-line status for the window title.
    pub fn info(&self) -> String {
        format!(
            "cam {:.0} | period {:+.1} | drift {:+.0}",
            self.camera.distance,
            self.sim.period_delta(),
            self.sim.velocity_delta(),
        )
    }
}

fn write_slot(slots: &mut [u8], stride: usize, slot: usize, uniforms: &ObjectUniforms) {
    let offset = slot * stride;
    slots[offset..offset + std::mem::size_of::<ObjectUniforms>()]
        .copy_from_slice(bytemuck::bytes_of(uniforms));
}

fn rgba(rgb: [f32; 3]) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], 1.0]
}
