use bytemuck::{Pod, Zeroable};
use std::ops::Range;
use tileworld_kernel::World;
use tileworld_render::{SheetId, SpriteBatches, SpriteInstance};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::gpu::{PipelineDesc, create_pipeline, scoped};
use crate::shaders;

/// Sprite instance capacity shared by every atlas.
const MAX_SPRITES: usize = 10_000;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct SpriteInstanceRaw {
    position: [f32; 2],
    cell: [f32; 4],
}

impl From<&SpriteInstance> for SpriteInstanceRaw {
    fn from(s: &SpriteInstance) -> Self {
        Self {
            position: s.position.to_array(),
            cell: [s.cell.x as f32, s.cell.y as f32, s.cell.w as f32, s.cell.h as f32],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct SheetUniform {
    grid: [f32; 2],
    _pad: [f32; 2],
}

/// Decoded RGBA8 sprite sheet pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SheetImage {
    /// One opaque pixel per atlas cell, so sprites show up as flat squares
    /// until real sheets are loaded.
    pub fn placeholder(sheet: SheetId) -> Self {
        let grid = sheet.grid();
        let mut rgba = Vec::with_capacity((grid.x * grid.y * 4) as usize);
        for y in 0..grid.y {
            for x in 0..grid.x {
                rgba.extend_from_slice(&[
                    (64 + x * 191 / grid.x.max(1)) as u8,
                    (64 + y * 191 / grid.y.max(1)) as u8,
                    160,
                    255,
                ]);
            }
        }
        Self {
            width: grid.x,
            height: grid.y,
            rgba,
        }
    }

    pub(crate) fn validate(&self, sheet: SheetId) -> Result<(), RenderError> {
        let grid = sheet.grid();
        if self.width == 0
            || self.height == 0
            || self.width % grid.x != 0
            || self.height % grid.y != 0
        {
            return Err(RenderError::SheetGrid {
                sheet,
                width: self.width,
                height: self.height,
                cols: grid.x,
                rows: grid.y,
            });
        }
        let expected = (self.width * self.height * 4) as usize;
        if self.rgba.len() != expected {
            return Err(RenderError::SheetData {
                sheet,
                len: self.rgba.len(),
                expected,
            });
        }
        Ok(())
    }
}

struct SheetBinding {
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// Instanced sprite quads, one draw call per atlas in use.
pub(crate) struct SpritePass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    sheets: Vec<SheetBinding>,
    instance_buffer: wgpu::Buffer,
    batches: SpriteBatches,
    staging: Vec<SpriteInstanceRaw>,
    ranges: Vec<(SheetId, Range<u32>)>,
}

impl SpritePass {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_sheet_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let sampler = pixel_sampler(device, "sprite_sampler");

        let pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "sprite_pipeline",
                shader: shaders::SPRITE_SHADER,
                instance_layout: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SpriteInstanceRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x4,
                    ],
                },
                bind_group_layouts: &[camera_layout, &layout],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite_instances"),
            size: (MAX_SPRITES * std::mem::size_of::<SpriteInstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sheets = SheetId::ALL
            .into_iter()
            .map(|sheet| {
                create_sheet(device, queue, &layout, &sampler, sheet, &SheetImage::placeholder(sheet))
            })
            .collect();

        Self {
            pipeline,
            layout,
            sampler,
            sheets,
            instance_buffer,
            batches: SpriteBatches::default(),
            staging: Vec::new(),
            ranges: Vec::new(),
        }
    }

    pub(crate) fn set_sheet(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sheet: SheetId,
        image: &SheetImage,
    ) -> Result<(), RenderError> {
        image.validate(sheet)?;
        let binding = scoped(device, "sprite sheet", || {
            create_sheet(device, queue, &self.layout, &self.sampler, sheet, image)
        })?;
        self.sheets[sheet.index()] = binding;
        tracing::info!(?sheet, image.width, image.height, "sprite sheet loaded");
        Ok(())
    }

    /// Bucket entities by atlas and upload all buckets into one buffer.
    pub(crate) fn prepare(&mut self, queue: &wgpu::Queue, world: &World) {
        self.batches.rebuild(world);
        self.staging.clear();
        self.ranges.clear();
        for (sheet, instances) in self.batches.non_empty() {
            let room = MAX_SPRITES - self.staging.len();
            if room == 0 {
                break;
            }
            let start = self.staging.len() as u32;
            self.staging
                .extend(instances.iter().take(room).map(SpriteInstanceRaw::from));
            self.ranges.push((sheet, start..self.staging.len() as u32));
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.staging));
        }
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.ranges.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        for (sheet, range) in &self.ranges {
            pass.set_bind_group(1, &self.sheets[sheet.index()].bind_group, &[]);
            pass.draw(0..6, range.clone());
        }
    }
}

pub(crate) fn pixel_sampler(device: &wgpu::Device, label: &'static str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Upload RGBA8 pixels into a new sampled texture.
pub(crate) fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &'static str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );
    texture
}

fn create_sheet(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    sheet: SheetId,
    image: &SheetImage,
) -> SheetBinding {
    let texture = create_rgba_texture(device, queue, "sprite_sheet", image.width, image.height, &image.rgba);
    let view = texture.create_view(&Default::default());
    let grid = sheet.grid();
    let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("sprite_sheet_grid"),
        contents: bytemuck::bytes_of(&SheetUniform {
            grid: [grid.x as f32, grid.y as f32],
            _pad: [0.0; 2],
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sprite_sheet_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
    });
    SheetBinding {
        bind_group,
        _texture: texture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use tileworld_render::SpriteCell;

    #[test]
    fn placeholder_matches_grid() {
        for sheet in SheetId::ALL {
            let img = SheetImage::placeholder(sheet);
            assert!(img.validate(sheet).is_ok());
            assert_eq!(img.width, sheet.grid().x);
        }
    }

    #[test]
    fn sheet_must_divide_into_grid() {
        let img = SheetImage {
            width: 100,
            height: 96,
            rgba: vec![0; 100 * 96 * 4],
        };
        assert!(matches!(
            img.validate(SheetId::Players),
            Err(RenderError::SheetGrid { cols: 8, rows: 12, .. })
        ));
    }

    #[test]
    fn sheet_pixel_count_is_checked() {
        let img = SheetImage {
            width: 128,
            height: 128,
            rgba: vec![0; 10],
        };
        assert!(matches!(
            img.validate(SheetId::Decorations),
            Err(RenderError::SheetData { len: 10, .. })
        ));
    }

    #[test]
    fn instance_conversion_keeps_cell() {
        let raw = SpriteInstanceRaw::from(&SpriteInstance {
            position: Vec2::new(1.0, 2.5),
            cell: SpriteCell::new(3, 0, 1, 2),
        });
        assert_eq!(raw.position, [1.0, 2.5]);
        assert_eq!(raw.cell, [3.0, 0.0, 1.0, 2.0]);
        assert_eq!(std::mem::size_of::<SpriteInstanceRaw>(), 24);
    }
}
