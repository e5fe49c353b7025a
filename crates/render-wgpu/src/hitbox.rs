use bytemuck::{Pod, Zeroable};
use tileworld_render::Hitbox;

use crate::gpu::{PipelineDesc, create_pipeline};
use crate::shaders;

const MAX_HITBOXES: usize = 4096;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct HitboxInstanceRaw {
    center: [f32; 2],
    size: [f32; 2],
}

impl From<&Hitbox> for HitboxInstanceRaw {
    fn from(h: &Hitbox) -> Self {
        Self {
            center: h.center.to_array(),
            size: h.size.to_array(),
        }
    }
}

/// Rectangle outlines drawn on top of everything else.
pub(crate) struct HitboxPass {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    staging: Vec<HitboxInstanceRaw>,
}

impl HitboxPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "hitbox_pipeline",
                shader: shaders::HITBOX_SHADER,
                instance_layout: wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<HitboxInstanceRaw>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                    ],
                },
                bind_group_layouts: &[camera_layout],
                topology: wgpu::PrimitiveTopology::LineStrip,
                blend: Some(wgpu::BlendState::REPLACE),
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Always,
            },
        );
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hitbox_instances"),
            size: (MAX_HITBOXES * std::mem::size_of::<HitboxInstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            instance_buffer,
            staging: Vec::new(),
        }
    }

    pub(crate) fn prepare(&mut self, queue: &wgpu::Queue, hitboxes: &[Hitbox]) -> u32 {
        self.staging.clear();
        self.staging
            .extend(hitboxes.iter().take(MAX_HITBOXES).map(HitboxInstanceRaw::from));
        if !self.staging.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.staging));
        }
        self.staging.len() as u32
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, count: u32) {
        if count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        // each instance is a closed five-vertex strip
        pass.draw(0..5, 0..count);
    }
}
