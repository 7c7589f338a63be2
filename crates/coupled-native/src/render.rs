use glam::{DVec2, Mat4};
use wgpu::util::DeviceExt;

use coupled_oscillations::{NormalMode, PickerRect};

use crate::scheduler::FrameSnapshot;

const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
const MAX_INSTANCES: usize = 64;
// Dots drawn along each picker diagonal
const DIAGONAL_DOTS: usize = 11;

// World-space half width visible in the window; height follows the aspect.
pub const VIEW_HALF_WIDTH: f32 = 6.0;

const WALL_COLOR: [f32; 4] = [0.55, 0.55, 0.6, 1.0];
const SPRING_COLOR: [f32; 4] = [0.8, 0.75, 0.3, 1.0];
const MASS_COLORS: [[f32; 4]; 2] = [[0.25, 0.55, 0.95, 1.0], [0.95, 0.5, 0.2, 1.0]];
const PICKER_COLOR: [f32; 4] = [0.12, 0.12, 0.16, 1.0];
const DIAGONAL_COLOR: [f32; 4] = [0.3, 0.3, 0.36, 1.0];
const MARKER_COLOR: [f32; 4] = [0.95, 0.95, 0.95, 1.0];
const COM_COLOR: [f32; 4] = [0.6, 0.9, 0.6, 1.0];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub pos: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
}

impl InstanceData {
    fn quad(pos: [f32; 2], size: [f32; 2], color: [f32; 4]) -> Self {
        Self { pos, size, color }
    }
}

/// Pixel to world conversion for an orthographic, y-up view centered on the
/// origin.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn half_extents(&self) -> (f32, f32) {
        let aspect = self.height.max(1) as f32 / self.width.max(1) as f32;
        (VIEW_HALF_WIDTH, VIEW_HALF_WIDTH * aspect)
    }

    pub fn pixel_to_world(&self, px: f64, py: f64) -> DVec2 {
        let (hw, hh) = self.half_extents();
        let u = px / self.width.max(1) as f64;
        let v = py / self.height.max(1) as f64;
        DVec2::new((2.0 * u - 1.0) * hw as f64, (1.0 - 2.0 * v) * hh as f64)
    }

    pub fn view_proj(&self) -> [[f32; 4]; 4] {
        let (hw, hh) = self.half_extents();
        Mat4::orthographic_rh(-hw, hw, -hh, hh, -1.0, 1.0).to_cols_array_2d()
    }
}

fn spring_thickness(k: f32) -> f32 {
    0.1 * (1.0 + k.max(1.0)).log10()
}

fn picker_tint(frame: &FrameSnapshot) -> [f32; 4] {
    let lit = |mode: NormalMode| {
        frame.found_mode == Some(mode)
            || match mode {
                NormalMode::Symmetric => frame.live_modes.symmetric,
                NormalMode::Antisymmetric => frame.live_modes.antisymmetric,
            }
    };
    if lit(NormalMode::Symmetric) {
        [0.15, 0.35, 0.2, 1.0]
    } else if lit(NormalMode::Antisymmetric) {
        [0.35, 0.2, 0.15, 1.0]
    } else {
        PICKER_COLOR
    }
}

fn picker_instances(rect: &PickerRect, frame: &FrameSnapshot, out: &mut Vec<InstanceData>) {
    let c = rect.center().as_vec2().to_array();
    let s = rect.size().as_vec2().to_array();
    out.push(InstanceData::quad(c, s, picker_tint(frame)));
    // Dotted y = x and y = -x lines, where the two normal modes lie.
    for i in 0..DIAGONAL_DOTS {
        let t = i as f64 / (DIAGONAL_DOTS - 1) as f64;
        for uv in [DVec2::new(t, t), DVec2::new(t, 1.0 - t)] {
            let p = rect.uv_to_surface(uv).as_vec2().to_array();
            out.push(InstanceData::quad(p, [0.04, 0.04], DIAGONAL_COLOR));
        }
    }
    let uv = DVec2::new(frame.marker[0] as f64, frame.marker[1] as f64);
    let m = rect.uv_to_surface(uv.clamp(DVec2::ZERO, DVec2::ONE));
    out.push(InstanceData::quad(
        m.as_vec2().to_array(),
        [0.12, 0.12],
        MARKER_COLOR,
    ));
}

/// Flatten a frame into instanced quads, back to front.
pub fn build_instances(frame: &FrameSnapshot) -> Vec<InstanceData> {
    let mut out = Vec::with_capacity(MAX_INSTANCES);
    let t = frame.wall_thickness;
    for wall in frame.walls {
        out.push(InstanceData::quad([wall, 0.0], [t, 2.0], WALL_COLOR));
    }
    for (i, [l, r]) in frame.springs.iter().enumerate() {
        out.push(InstanceData::quad(
            [0.5 * (l + r), 0.0],
            [(r - l).abs(), spring_thickness(frame.stiffnesses[i])],
            SPRING_COLOR,
        ));
    }
    for i in 0..2 {
        let side = 2.0 * frame.mass_half_extents[i];
        out.push(InstanceData::quad(
            [frame.positions[i], 0.0],
            [side, side],
            MASS_COLORS[i],
        ));
    }
    out.push(InstanceData::quad(
        [frame.center_of_mass, -0.7],
        [0.05, 0.25],
        COM_COLOR,
    ));
    if let Some(rect) = &frame.picker {
        picker_instances(rect, frame, &mut out);
    }
    out.truncate(MAX_INSTANCES);
    out
}

pub struct GpuState<'w> {
    pub window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pub viewport: Viewport,
}

impl<'w> GpuState<'w> {
    pub async fn new(window: &'w winit::window::Window) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Surface has no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Unit quad, two triangles
        let quad_vertices: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_vb"),
            size: (std::mem::size_of::<InstanceData>() * MAX_INSTANCES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bgl"),
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
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: (std::mem::size_of::<f32>() * 2) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 8,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x4,
                        offset: 16,
                        shader_location: 3,
                    },
                ],
            },
        ];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            quad_vb,
            instance_vb,
            bind_group,
            viewport: Viewport {
                width: size.width.max(1),
                height: size.height.max(1),
            },
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.viewport = Viewport {
            width: new_size.width,
            height: new_size.height,
        };
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render(&mut self, frame_state: &FrameSnapshot) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: self.viewport.view_proj(),
            }),
        );
        let instances = build_instances(frame_state);
        self.queue
            .write_buffer(&self.instance_vb, 0, bytemuck::cast_slice(&instances));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
            rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
            rpass.draw(0..6, 0..instances.len() as u32);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_to_world_is_y_up_and_centered() {
        let vp = Viewport {
            width: 1200,
            height: 600,
        };
        assert_eq!(vp.pixel_to_world(600.0, 300.0), DVec2::ZERO);
        assert_eq!(vp.pixel_to_world(0.0, 0.0), DVec2::new(-6.0, 3.0));
        assert_eq!(vp.pixel_to_world(1200.0, 600.0), DVec2::new(6.0, -3.0));
    }

    #[test]
    fn springs_span_their_endpoints() {
        let frame = FrameSnapshot {
            springs: [[-4.75, -2.0], [-2.0, 2.0], [2.0, 4.75]],
            stiffnesses: [1.0, 9.0, 1.0],
            ..Default::default()
        };
        let quads = build_instances(&frame);
        // Two walls come first, then the three springs.
        assert_eq!(quads[2].pos[0], -3.375);
        assert_eq!(quads[2].size[0], 2.75);
        assert_eq!(quads[3].size[0], 4.0);
        assert!(quads[3].size[1] > quads[2].size[1]);
    }

    #[test]
    fn picker_is_drawn_only_when_placed() {
        let mut frame = FrameSnapshot::default();
        let without = build_instances(&frame).len();
        frame.picker = Some(PickerRect::new(DVec2::new(0.0, -2.0), DVec2::splat(2.0)));
        frame.marker = [1.0, 1.0];
        let quads = build_instances(&frame);
        assert_eq!(quads.len(), without + 2 + 2 * DIAGONAL_DOTS);
        let marker = quads[quads.len() - 1];
        assert_eq!(marker.pos, [1.0, -1.0]);
    }

    #[test]
    fn picker_guides_lie_on_the_diagonals() {
        let rect = PickerRect::new(DVec2::new(0.0, -2.0), DVec2::splat(2.0));
        let frame = FrameSnapshot {
            picker: Some(rect),
            ..Default::default()
        };
        let quads = build_instances(&frame);
        let guides: Vec<_> = quads
            .iter()
            .filter(|q| q.color == DIAGONAL_COLOR)
            .collect();
        assert_eq!(guides.len(), 2 * DIAGONAL_DOTS);
        for q in guides {
            let local = [q.pos[0], q.pos[1] + 2.0];
            let on_diag =
                (local[1] - local[0]).abs() < 1e-5 || (local[1] + local[0]).abs() < 1e-5;
            assert!(on_diag, "{:?} is off both diagonals", q.pos);
        }
    }

    #[test]
    fn found_mode_tints_the_picker() {
        let mut frame = FrameSnapshot {
            picker: Some(PickerRect::new(DVec2::ZERO, DVec2::splat(2.0))),
            ..Default::default()
        };
        assert_eq!(picker_tint(&frame), PICKER_COLOR);
        frame.found_mode = Some(NormalMode::Antisymmetric);
        assert_ne!(picker_tint(&frame), PICKER_COLOR);
    }
}
