use anyhow::Context;
use glam::Vec2;
use std::path::Path;
use std::sync::Arc;
use tileworld_render::{LabelFont, Renderer, Scene, SheetId};
use tileworld_render_wgpu::{RenderError, SheetImage, WgpuFrame, WgpuRenderer};
use winit::window::Window;

/// Window surface plus the tile renderer. Rendering leaves the frame
/// unpresented so the HUD can be painted on top.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
}

impl SurfaceRenderer {
    pub fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tileworld_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, &queue, format, config.width, config.height)?;
        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    /// Load `decorations.png`, `players.png` and the label font from `dir`.
    /// A missing or unusable sheet keeps its placeholder; a missing font
    /// leaves the built-in faces.
    pub fn load_assets(&mut self, dir: &Path) {
        self.renderer.set_label_font(LabelFont::load_dir(dir));
        for sheet in SheetId::ALL {
            let path = dir.join(sheet.file_name());
            let image = match image::open(&path) {
                Ok(img) => img.to_rgba8(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "sprite sheet not loaded");
                    continue;
                }
            };
            let image = SheetImage {
                width: image.width(),
                height: image.height(),
                rgba: image.into_raw(),
            };
            if let Err(err) = self
                .renderer
                .set_sheet(&self.device, &self.queue, sheet, &image)
            {
                tracing::warn!(path = %path.display(), error = %err, "sprite sheet rejected");
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }
}

impl Renderer for SurfaceRenderer {
    type Output = Result<Option<wgpu::SurfaceTexture>, RenderError>;

    fn viewport(&self) -> Vec2 {
        self.renderer.viewport()
    }

    fn render(&mut self, scene: &Scene<'_>) -> Self::Output {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(None);
            }
            Err(err) => {
                tracing::warn!(error = %err, "surface unavailable");
                return Ok(None);
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        WgpuFrame {
            renderer: &mut self.renderer,
            device: &self.device,
            queue: &self.queue,
            target: &view,
        }
        .render(scene)?;
        Ok(Some(frame))
    }
}
