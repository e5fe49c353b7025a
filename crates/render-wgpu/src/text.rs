use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use tileworld_render::{Label, LabelFont, PIXELS_PER_UNIT, TextCache, TextImage, TextRasterizer};

use crate::error::RenderError;
use crate::gpu::{PipelineDesc, create_pipeline, scoped};
use crate::shaders;
use crate::sprite::{create_rgba_texture, pixel_sampler};

const MAX_LABELS: usize = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct LabelInstanceRaw {
    center: [f32; 2],
    size: [f32; 2],
}

/// A rasterized label on the GPU.
struct LabelTexture {
    bind_group: wgpu::BindGroup,
    /// Size in world units.
    size: Vec2,
    _texture: wgpu::Texture,
}

fn world_size(image: &TextImage) -> Vec2 {
    Vec2::new(image.width as f32, image.height as f32) / PIXELS_PER_UNIT
}

fn rasterize_label(
    rasterizer: &dyn TextRasterizer,
    text: &str,
    max_width: u32,
) -> Result<TextImage, RenderError> {
    let image = rasterizer.rasterize(text, max_width)?;
    tracing::debug!(text, image.width, image.height, "label rasterized");
    Ok(image)
}

/// Label quads, one draw per label with its cached texture.
pub(crate) struct TextPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    rasterizer: Box<dyn TextRasterizer + Send>,
    cache: TextCache<LabelTexture>,
    instance_buffer: wgpu::Buffer,
    drawn: Vec<String>,
}

impl TextPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("label_layout"),
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
            ],
        });
        let sampler = pixel_sampler(device, "label_sampler");

        let pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "label_pipeline",
                shader: shaders::TEXT_SHADER,
                instance_layout: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LabelInstanceRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                    ],
                },
                bind_group_layouts: &[camera_layout, &layout],
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("label_instances"),
            size: (MAX_LABELS * std::mem::size_of::<LabelInstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            layout,
            sampler,
            rasterizer: Box::new(LabelFont::builtin()),
            cache: TextCache::new(),
            instance_buffer,
            drawn: Vec::new(),
        }
    }

    pub(crate) fn set_rasterizer(&mut self, rasterizer: Box<dyn TextRasterizer + Send>) {
        self.rasterizer = rasterizer;
        self.cache.clear();
    }

    /// Rasterize labels not seen before and upload this frame's instances.
    /// A label that cannot be built is skipped; the rest still draw.
    pub(crate) fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, labels: &[Label]) {
        let Self {
            layout,
            sampler,
            rasterizer,
            cache,
            instance_buffer,
            drawn,
            ..
        } = self;

        let max_width = device.limits().max_texture_dimension_2d;
        let ready = cache.prepare(labels, MAX_LABELS, |text| {
            let image = rasterize_label(&**rasterizer, text, max_width)?;
            scoped(device, "label texture", || {
                create_label(device, queue, layout, sampler, &image)
            })
        });

        drawn.clear();
        let mut instances = Vec::with_capacity(ready.len());
        for label in ready {
            if let Some(entry) = cache.get(&label.text) {
                instances.push(LabelInstanceRaw {
                    center: label.position.to_array(),
                    size: entry.size.to_array(),
                });
                drawn.push(label.text.clone());
            }
        }
        if !instances.is_empty() {
            queue.write_buffer(instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.drawn.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        for (i, text) in self.drawn.iter().enumerate() {
            if let Some(label) = self.cache.get(text) {
                pass.set_bind_group(1, &label.bind_group, &[]);
                let i = i as u32;
                pass.draw(0..6, i..i + 1);
            }
        }
    }
}

fn create_label(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &TextImage,
) -> LabelTexture {
    let texture = create_rgba_texture(device, queue, "label_texture", image.width, image.height, &image.pixels);
    let view = texture.create_view(&Default::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("label_bind_group"),
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
        ],
    });
    LabelTexture {
        bind_group,
        size: world_size(image),
        _texture: texture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_render::FontError;

    struct NoFont;

    impl TextRasterizer for NoFont {
        fn rasterize(&self, _text: &str, _max_width: u32) -> Result<TextImage, FontError> {
            Err(FontError::NoFaces)
        }
    }

    fn label(text: &str) -> Label {
        Label {
            text: text.into(),
            position: Vec2::ZERO,
        }
    }

    #[test]
    fn label_world_size_uses_pixels_per_unit() {
        let image = TextImage {
            width: 32,
            height: 14,
            pixels: vec![0; 32 * 14 * 4],
        };
        assert_eq!(world_size(&image), Vec2::new(2.0, 0.875));
    }

    #[test]
    fn oversized_label_is_clamped_to_the_texture_limit() {
        let image = rasterize_label(&LabelFont::builtin(), &"m".repeat(500), 256).unwrap();
        assert_eq!(image.width, 256);
    }

    #[test]
    fn rasterizer_failure_becomes_a_skipped_label() {
        let font = LabelFont::builtin();
        let mut cache: TextCache<Vec2> = TextCache::new();
        let labels = [label("alice"), label("broken"), label("bob")];
        let ready = cache.prepare(&labels, MAX_LABELS, |text| {
            let rasterizer: &dyn TextRasterizer = if text == "broken" { &NoFont } else { &font };
            rasterize_label(rasterizer, text, 4096).map(|image| world_size(&image))
        });
        let texts: Vec<_> = ready.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["alice", "bob"]);
        assert!(cache.is_failed("broken"));
    }
}
