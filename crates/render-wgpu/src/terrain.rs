use bytemuck::{Pod, Zeroable};
use tileworld_kernel::World;
use tileworld_render::{LAYER_SIZE, TILE_COLORS, TerrainBatch};
use wgpu::util::DeviceExt;

use crate::gpu::{PipelineDesc, create_pipeline};
use crate::shaders;

const PALETTE_SLOTS: usize = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct TerrainInstanceRaw {
    origin: [f32; 2],
    layer: u32,
    _pad: u32,
}

/// Tile colours as normalized `vec4`s, padded to the shader's array length.
fn palette() -> [[f32; 4]; PALETTE_SLOTS] {
    let mut out = [[0.0; 4]; PALETTE_SLOTS];
    for (slot, rgb) in out.iter_mut().zip(TILE_COLORS) {
        *slot = [
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
            1.0,
        ];
    }
    out
}

/// Instanced chunk quads over a `R8Uint` texture array, one layer per chunk.
pub(crate) struct TerrainPass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    tiles: wgpu::Texture,
    instance_buffer: wgpu::Buffer,
    max_layers: usize,
    batch: TerrainBatch,
    staging: Vec<u8>,
    instances: Vec<TerrainInstanceRaw>,
}

impl TerrainPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        max_layers: usize,
    ) -> Self {
        let max_layers = max_layers.max(1);
        let tiles = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain_tiles"),
            size: wgpu::Extent3d {
                width: LAYER_SIZE as u32,
                height: LAYER_SIZE as u32,
                depth_or_array_layers: max_layers as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let tiles_view = tiles.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let palette_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_palette"),
            contents: bytemuck::cast_slice(&palette()),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Uint,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&tiles_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: palette_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "terrain_pipeline",
                shader: shaders::TERRAIN_SHADER,
                instance_layout: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TerrainInstanceRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Uint32,
                    ],
                },
                bind_group_layouts: &[camera_layout, &layout],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: Some(wgpu::BlendState::REPLACE),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain_instances"),
            size: (max_layers * std::mem::size_of::<TerrainInstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group,
            tiles,
            instance_buffer,
            max_layers,
            batch: TerrainBatch::default(),
            staging: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Rebuild chunk layers and upload them. Returns the instance count.
    pub(crate) fn prepare(&mut self, queue: &wgpu::Queue, world: &World) -> u32 {
        self.batch.rebuild(world, self.max_layers);
        if self.batch.is_empty() {
            return 0;
        }

        self.staging.clear();
        for layer in &self.batch.layers {
            self.staging.extend_from_slice(layer);
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.tiles,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.staging,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(LAYER_SIZE as u32),
                rows_per_image: Some(LAYER_SIZE as u32),
            },
            wgpu::Extent3d {
                width: LAYER_SIZE as u32,
                height: LAYER_SIZE as u32,
                depth_or_array_layers: self.batch.len() as u32,
            },
        );

        self.instances.clear();
        self.instances
            .extend(self.batch.instances.iter().map(|i| TerrainInstanceRaw {
                origin: i.chunk.origin().to_array(),
                layer: i.layer,
                _pad: 0,
            }));
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        self.instances.len() as u32
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, count: u32) {
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, 0..count);
    }
}
