// Renderer and frame loop

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowBuilder},
};

use crate::error::{GameError, Result};
use crate::game::Game;
use crate::input::InputState;
use crate::mesh::Vertex;
use crate::scene::{DrawItem, MeshKind};

/// Fixed frame pace; the countdown is measured in these frames.
pub const FRAME_TIME: Duration = Duration::from_millis(25);

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const FOV_Y_DEG: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 512.0;

// Uniform buffer structure for one draw: MVP matrix and tint colour
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    mvp: [[f32; 4]; 4],
    tint: [f32; 4],
}

impl Uniforms {
    fn new(mvp: Mat4, tint: [f32; 4]) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            tint,
        }
    }
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<Uniforms>() as u64;

/// Rounds `size` up to a multiple of `alignment`.
fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Perspective projection for the given surface size.
pub fn projection(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, Z_NEAR, Z_FAR)
}

/// Model-view-projection for each draw item, in draw order.
pub fn draw_matrices(items: &[DrawItem], view: Mat4, projection: Mat4) -> Vec<Mat4> {
    let view_projection = projection * view;
    items.iter().map(|item| view_projection * item.world).collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

pub struct Renderer {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    window: Arc<Window>,
    pipeline: wgpu::RenderPipeline,
    surface_format: wgpu::TextureFormat,
    depth_view: wgpu::TextureView,
    meshes: HashMap<MeshKind, GpuMesh>,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_slots: usize,
    game: Game,
    input: InputState,
    next_frame: Instant,
}

impl Renderer {
    pub async fn new(event_loop: &EventLoop<()>, game: Game) -> Result<Self> {
        let config = game.config();
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("Eyeball Hunt")
                .with_inner_size(PhysicalSize::new(config.width, config.height))
                .build(event_loop)
                .map_err(|e| GameError::Window(e.to_string()))?,
        );
        grab_cursor(&window);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| GameError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GameError::Adapter)?;
        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Renderer Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits::default(),
                },
                None, // Trace path
            )
            .await
            .map_err(|e| GameError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| GameError::Surface("surface reports no formats".into()))?;

        let size = window.inner_size();
        configure_surface(&surface, &adapter, &device, surface_format, size);
        let depth_view = create_depth_view(&device, size);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        // One uniform slot per draw, selected with a dynamic offset.
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // the sphere is seen from inside when the camera clips it
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let meshes = MeshKind::ALL
            .iter()
            .map(|&kind| (kind, upload_mesh(&device, kind)))
            .collect();

        let uniform_stride = align_to(
            UNIFORM_SIZE,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let uniform_slots = game.scene().draw_list().len().max(1);
        let (uniform_buffer, uniform_bind_group) =
            create_uniforms(&device, &bind_group_layout, uniform_stride, uniform_slots);

        Ok(Self {
            adapter,
            device,
            queue,
            surface,
            window,
            pipeline,
            surface_format,
            depth_view,
            meshes,
            bind_group_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_slots,
            game,
            input: InputState::new(),
            next_frame: Instant::now(),
        })
    }

    pub fn run(mut self, event_loop: EventLoop<()>) -> Result<()> {
        event_loop
            .run(move |event, target| match event {
                Event::WindowEvent { window_id, event } if window_id == self.window.id() => {
                    match event {
                        WindowEvent::CloseRequested => self.input.request_quit(),
                        WindowEvent::Resized(physical_size) => self.resize(physical_size),
                        WindowEvent::RedrawRequested => {
                            self.update_and_render();
                            if self.game.is_finished() {
                                target.exit();
                            }
                        }
                        WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard_input(event),
                        WindowEvent::MouseInput { state, button, .. } => {
                            self.input.on_mouse_button(button, state)
                        }
                        WindowEvent::Focused(true) => grab_cursor(&self.window),
                        _ => {}
                    }
                }
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } => self.input.on_mouse_motion(delta.0, delta.1),
                Event::AboutToWait => {
                    let now = Instant::now();
                    if now >= self.next_frame {
                        self.next_frame = now + FRAME_TIME;
                        self.window.request_redraw();
                    }
                    target.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
                }
                Event::LoopExiting => {
                    log::info!("Game over with score {}", self.game.score());
                    println!("GAME OVER");
                    println!("SCORE: {}", self.game.score());
                }
                _ => {}
            })
            .map_err(|e| GameError::EventLoop(e.to_string()))
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        configure_surface(&self.surface, &self.adapter, &self.device, self.surface_format, new_size);
        self.depth_view = create_depth_view(&self.device, new_size);
    }

    fn handle_keyboard_input(&mut self, event: KeyEvent) {
        if let PhysicalKey::Code(keycode) = event.physical_key {
            if event.repeat && event.state == ElementState::Pressed {
                return;
            }
            self.input.on_key(keycode, event.state);
        }
    }

    fn update_and_render(&mut self) {
        let frame_input = self.input.take_frame();
        self.game.update(&frame_input);

        let size = self.window.inner_size();
        let items = self.game.scene().draw_list();
        let matrices = draw_matrices(
            &items,
            self.game.camera().world_to_view_matrix(),
            projection(size.width, size.height),
        );

        if items.len() > self.uniform_slots {
            self.uniform_slots = items.len();
            let (buffer, bind_group) = create_uniforms(
                &self.device,
                &self.bind_group_layout,
                self.uniform_stride,
                self.uniform_slots,
            );
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
        }

        let stride = self.uniform_stride as usize;
        let mut staging = vec![0u8; stride * items.len()];
        for (i, (item, mvp)) in items.iter().zip(&matrices).enumerate() {
            let uniforms = Uniforms::new(*mvp, item.drawable.tint());
            let offset = i * stride;
            staging[offset..offset + UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !staging.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &staging);
        }

        self.render(&items);
    }

    fn render(&mut self, items: &[DrawItem]) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Dropped frame: {err}");
                self.resize(self.window.inner_size());
                return;
            }
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.45,
                            g: 0.65,
                            b: 0.9,
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
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            for (i, item) in items.iter().enumerate() {
                let Some(mesh) = item.drawable.mesh_kind().and_then(|k| self.meshes.get(&k)) else {
                    continue;
                };
                let offset = (i as u64 * self.uniform_stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        log::warn!("Could not grab the cursor: {err}");
    }
    window.set_cursor_visible(false);
}

fn configure_surface(
    surface: &wgpu::Surface<'static>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
) {
    let surface_caps = surface.get_capabilities(adapter);
    surface.configure(
        device,
        &wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        },
    );
}

fn create_depth_view(device: &wgpu::Device, size: PhysicalSize<u32>) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_mesh(device: &wgpu::Device, kind: MeshKind) -> GpuMesh {
    let data = kind.vertex_data();
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Buffer"),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    // Uint16 index buffers must be padded to a 4-byte multiple
    let mut indices = data.indices.clone();
    if indices.len() % 2 == 1 {
        indices.push(0);
    }
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Index Buffer"),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: data.index_count(),
    }
}

fn create_uniforms(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    slots: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Uniform Buffer"),
        size: stride * slots as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Uniform Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    });

    (buffer, bind_group)
}
