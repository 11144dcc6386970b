use crate::camera::{OrbitCamera, Projection};
use crate::camera_controller::CameraController;
use crate::scene::{Element, Scene};
use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use std::ops::Range;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::event::WindowEvent;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-point marker placement, in plot coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerInstance {
    offset: [f32; 3],
}

impl MarkerInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MarkerInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    plot_to_display: [[f32; 4]; 4],
}

impl CameraUniform {
    fn new(plot_to_display: Mat4) -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            plot_to_display: plot_to_display.to_cols_array_2d(),
        }
    }

    fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_proj = (projection.build_projection_matrix() * camera.build_view_matrix()).to_cols_array_2d();
    }
}

/// Cube marker around the origin, in display units.
fn marker_geometry(half_size: f32, color: [f32; 3]) -> (Vec<Vertex>, Vec<u16>) {
    let s = half_size;
    let vertices = [
        [-s, -s, s],
        [s, -s, s],
        [s, s, s],
        [-s, s, s],
        [-s, -s, -s],
        [s, -s, -s],
        [s, s, -s],
        [-s, s, -s],
    ]
    .into_iter()
    .map(|position| Vertex { position, color })
    .collect();

    let indices = vec![
        0, 1, 2, 2, 3, 0,
        1, 5, 6, 6, 2, 1,
        5, 4, 7, 7, 6, 5,
        4, 0, 3, 3, 7, 4,
        3, 2, 6, 6, 7, 3,
        4, 5, 1, 1, 0, 4,
    ];
    (vertices, indices)
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// What both pipelines share; they differ in entry point, vertex
/// layouts and topology.
struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineBuilder<'_> {
    fn build(
        &self,
        label: &str,
        entry_point: &str,
        buffers: &[wgpu::VertexBufferLayout<'_>],
        primitive: wgpu::PrimitiveState,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(self.layout),
            vertex: wgpu::VertexState {
                module: self.shader,
                entry_point: Some(entry_point),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
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
}

/// Vertex ranges of the connectors among `changed`, in report order.
fn changed_line_ranges(scene: &Scene, changed: &[Element]) -> Vec<Range<usize>> {
    changed
        .iter()
        .filter_map(|&element| scene.line_range(element))
        .collect()
}

pub struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    marker_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    marker_vertex_buffer: wgpu::Buffer,
    marker_index_buffer: wgpu::Buffer,
    num_marker_indices: u32,
    instance_buffer: wgpu::Buffer,
    instances: Vec<MarkerInstance>,
    line_vertex_buffer: wgpu::Buffer,
    line_index_buffer: wgpu::Buffer,
    num_line_indices: u32,
    line_vertices: Vec<Vertex>,
    frame_vertex_buffer: wgpu::Buffer,
    num_frame_vertices: u32,
    scene: Scene,
    camera: OrbitCamera,
    camera_controller: CameraController,
    projection: Projection,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
}

impl State {
    pub async fn new(window: Arc<Window>, scene: Scene) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor { ..Default::default() });
        let surface = instance.create_surface(window).context("creating window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .context("no suitable GPU adapter")?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                ..Default::default()
            })
            .await
            .context("requesting GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = OrbitCamera::new(Vec3::ZERO);
        let projection = Projection::new(config.width, config.height, 45.0, 0.1, 100.0);
        let mut camera_uniform = CameraUniform::new(scene.bounds().to_display());
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("camera_bind_group_layout"),
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let surface_config = scene.config().clone();

        let (marker_vertices, marker_indices) =
            marker_geometry(surface_config.marker_size, surface_config.point_color);
        let marker_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Marker Vertex Buffer"),
            contents: bytemuck::cast_slice(&marker_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let marker_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Marker Index Buffer"),
            contents: bytemuck::cast_slice(&marker_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instances: Vec<MarkerInstance> = scene
            .points()
            .iter()
            .map(|&offset| MarkerInstance { offset })
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Marker Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let line_vertices: Vec<Vertex> = scene
            .line_vertices()
            .iter()
            .map(|&position| Vertex { position, color: surface_config.line_color })
            .collect();
        let line_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Line Vertex Buffer"),
            contents: bytemuck::cast_slice(&line_vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let line_indices = scene.line_indices();
        let line_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Line Index Buffer"),
            contents: bytemuck::cast_slice(&line_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let frame_vertices: Vec<Vertex> = scene
            .bounds()
            .edges()
            .iter()
            .flatten()
            .map(|corner| Vertex { position: corner.to_array(), color: surface_config.frame_color })
            .collect();
        let frame_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Axes Frame Vertex Buffer"),
            contents: bytemuck::cast_slice(&frame_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = PipelineBuilder {
            device: &device,
            layout: &render_pipeline_layout,
            shader: &shader,
            format: config.format,
        };
        let marker_pipeline = pipelines.build(
            "Marker Pipeline",
            "vs_marker",
            &[Vertex::desc(), MarkerInstance::desc()],
            wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
        );
        let line_pipeline = pipelines.build(
            "Line Pipeline",
            "vs_line",
            &[Vertex::desc()],
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            marker_pipeline,
            line_pipeline,
            marker_vertex_buffer,
            marker_index_buffer,
            num_marker_indices: marker_indices.len() as u32,
            instance_buffer,
            instances,
            line_vertex_buffer,
            line_index_buffer,
            num_line_indices: line_indices.len() as u32,
            line_vertices,
            frame_vertex_buffer,
            num_frame_vertices: frame_vertices.len() as u32,
            scene,
            camera,
            camera_controller: CameraController::new(2.0, 0.3),
            projection,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_view,
        })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.projection.resize(new_size.width, new_size.height);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        self.camera_controller.process_events(event)
    }

    pub fn mouse_motion(&mut self, delta: (f64, f64)) {
        self.camera_controller.process_mouse_motion(delta.0, delta.1);
    }

    pub fn is_camera_moving(&self) -> bool {
        self.camera_controller.is_active()
    }

    /// Moves the surface to `frame` and uploads whatever changed.
    pub fn set_frame(&mut self, frame: u32) {
        let changed = self.scene.update(frame);
        if changed.contains(&Element::Points) {
            for (instance, &offset) in self.instances.iter_mut().zip(self.scene.points()) {
                instance.offset = offset;
            }
            self.queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }

        let line_color = self.scene.config().line_color;
        let stride = std::mem::size_of::<Vertex>() as wgpu::BufferAddress;
        for range in changed_line_ranges(&self.scene, &changed) {
            let positions = &self.scene.line_vertices()[range.clone()];
            for (vertex, &position) in self.line_vertices[range.clone()].iter_mut().zip(positions) {
                *vertex = Vertex { position, color: line_color };
            }
            self.queue.write_buffer(
                &self.line_vertex_buffer,
                range.start as wgpu::BufferAddress * stride,
                bytemuck::cast_slice(&self.line_vertices[range]),
            );
        }
        log::trace!("frame {frame}: center height {:.3}", self.scene.center_z());
    }

    pub fn update_camera(&mut self) {
        self.camera_controller.update_camera(&mut self.camera);
        self.camera_uniform.update_view_proj(&self.camera, &self.projection);
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
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
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, self.frame_vertex_buffer.slice(..));
            render_pass.draw(0..self.num_frame_vertices, 0..1);
            render_pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.line_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.num_line_indices, 0, 0..1);

            render_pass.set_pipeline(&self.marker_pipeline);
            render_pass.set_vertex_buffer(0, self.marker_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.marker_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..self.num_marker_indices, 0, 0..self.instances.len() as u32);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;

    #[test]
    fn only_reported_lines_are_uploaded() {
        let scene = Scene::new(SurfaceConfig::default());
        let ranges = changed_line_ranges(&scene, &[Element::Points, Element::Row(2), Element::Column(0)]);
        assert_eq!(ranges, vec![64..96, 1024..1056]);
    }

    #[test]
    fn full_update_covers_every_line_vertex_once() {
        let mut scene = Scene::new(SurfaceConfig::default());
        let changed = scene.update(10);
        let ranges = changed_line_ranges(&scene, &changed);
        assert_eq!(ranges.len(), 64);
        let mut covered = vec![0u8; scene.line_vertices().len()];
        for range in ranges {
            covered[range].iter_mut().for_each(|c| *c += 1);
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn line_vertex_offsets_stay_copy_aligned() {
        let stride = std::mem::size_of::<Vertex>() as wgpu::BufferAddress;
        assert_eq!(stride % wgpu::COPY_BUFFER_ALIGNMENT, 0);
    }
}
