use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use tileworld_common::Transform2;
use tileworld_render::{Renderer, Scene, SheetId, TextRasterizer};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::hitbox::HitboxPass;
use crate::sprite::{SheetImage, SpritePass};
use crate::terrain::TerrainPass;
use crate::text::TextPass;

/// Background colour, `#7F007F`.
pub const CLEAR_COLOR: [u8; 3] = [0x7F, 0x00, 0x7F];

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// View-projection as three padded columns, matching WGSL `mat3x3<f32>`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    view_proj: [[f32; 4]; 3],
}

impl From<Transform2> for CameraUniform {
    fn from(t: Transform2) -> Self {
        let m = t.matrix();
        let col = |c: glam::Vec3| [c.x, c.y, c.z, 0.0];
        Self {
            view_proj: [col(m.x_axis), col(m.y_axis), col(m.z_axis)],
        }
    }
}

/// Run `build` inside validation and out-of-memory error scopes and turn a
/// captured error into [`RenderError::Gpu`].
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    what: &'static str,
    build: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());
    match validation.or(oom) {
        Some(err) => Err(RenderError::Gpu {
            what,
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

/// Shape of one instanced pipeline. Every pipeline takes the camera at
/// group 0 and generates its vertices from `vertex_index`.
pub(crate) struct PipelineDesc<'a> {
    pub label: &'static str,
    pub shader: &'static str,
    pub instance_layout: wgpu::VertexBufferLayout<'a>,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub topology: wgpu::PrimitiveTopology,
    pub blend: Option<wgpu::BlendState>,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.shader.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[desc.instance_layout],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn clear_color(surface_format: wgpu::TextureFormat) -> wgpu::Color {
    let [r, g, b] = CLEAR_COLOR.map(|c| {
        let c = c as f64 / 255.0;
        if surface_format.is_srgb() {
            srgb_to_linear(c)
        } else {
            c
        }
    });
    wgpu::Color { r, g, b, a: 1.0 }
}

/// wgpu-based tile world renderer.
pub struct WgpuRenderer {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    terrain: TerrainPass,
    sprites: SpritePass,
    text: TextPass,
    hitboxes: HitboxPass,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    viewport: Vec2,
    clear_color: wgpu::Color,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let (camera_buffer, camera_layout, camera_bind_group) = scoped(device, "camera uniform", || {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("camera_buffer"),
                contents: bytemuck::bytes_of(&CameraUniform::from(Transform2::IDENTITY)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
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
                label: Some("camera_bind_group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (buffer, layout, bind_group)
        })?;

        let max_layers = (device.limits().max_texture_array_layers as usize)
            .min(tileworld_render::MAX_CHUNK_LAYERS);
        let terrain = scoped(device, "terrain pipeline", || {
            TerrainPass::new(device, surface_format, &camera_layout, max_layers)
        })?;
        let sprites = scoped(device, "sprite pipeline", || {
            SpritePass::new(device, queue, surface_format, &camera_layout)
        })?;
        let text = scoped(device, "text pipeline", || {
            TextPass::new(device, surface_format, &camera_layout)
        })?;
        let hitboxes = scoped(device, "hitbox pipeline", || {
            HitboxPass::new(device, surface_format, &camera_layout)
        })?;
        let depth_texture = scoped(device, "depth texture", || {
            Self::create_depth_texture(device, width, height)
        })?;

        tracing::info!(?surface_format, max_layers, "wgpu renderer ready");

        Ok(Self {
            camera_buffer,
            camera_bind_group,
            terrain,
            sprites,
            text,
            hitboxes,
            depth_texture,
            surface_format,
            viewport: Vec2::new(width.max(1) as f32, height.max(1) as f32),
            clear_color: clear_color(surface_format),
        })
    }

    /// Replace a placeholder atlas with decoded sheet pixels.
    pub fn set_sheet(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sheet: SheetId,
        image: &SheetImage,
    ) -> Result<(), RenderError> {
        self.sprites.set_sheet(device, queue, sheet, image)
    }

    /// Rasterizer for username labels; cached label textures are rebuilt.
    pub fn set_label_font(&mut self, font: impl TextRasterizer + Send + 'static) {
        self.text.set_rasterizer(Box::new(font));
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene<'_>,
    ) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("render_frame").entered();

        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from(scene.view_projection())),
        );
        let terrain_count = self.terrain.prepare(queue, scene.world);
        self.sprites.prepare(queue, scene.world);
        self.text.prepare(device, queue, &scene.labels());
        let hitbox_count = self.hitboxes.prepare(queue, &scene.hitboxes());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            self.terrain.draw(&mut pass, terrain_count);
            self.sprites.draw(&mut pass);
            self.text.draw(&mut pass);
            self.hitboxes.draw(&mut pass, hitbox_count);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// One frame's worth of GPU handles, so the wgpu backend can sit behind the
/// generic [`Renderer`] interface.
pub struct WgpuFrame<'a> {
    pub renderer: &'a mut WgpuRenderer,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target: &'a wgpu::TextureView,
}

impl Renderer for WgpuFrame<'_> {
    type Output = Result<(), RenderError>;

    fn viewport(&self) -> Vec2 {
        self.renderer.viewport()
    }

    fn render(&mut self, scene: &Scene<'_>) -> Self::Output {
        self.renderer
            .render(self.device, self.queue, self.target, scene)
    }
}
