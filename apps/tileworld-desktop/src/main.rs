mod hud;
mod net;
mod surface;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tileworld_input::Action;
use tileworld_session::{ClientConfig, FrameDriver, Session};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::hud::{Hud, HudAction, HudView};
use crate::net::WsTransport;
use crate::surface::SurfaceRenderer;

#[derive(Parser)]
#[command(name = "tileworld-desktop", about = "Tile world desktop client")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Game server websocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// JSON client config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    game: Option<String>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    skin: Option<u8>,

    /// Directory holding decorations.png, players.png and label_font.ttf
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(game) = &self.game {
            config.game_name = game.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(skin) = self.skin {
            config.skin = skin;
        }
        config.validate()?;
        Ok(config)
    }
}

type Driver = FrameDriver<WsTransport, SurfaceRenderer>;

fn action_for(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Action::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Action::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Action::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Action::MoveRight),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Action::Run),
        _ => None,
    }
}

fn hud_view(driver: &Driver) -> HudView {
    let session = driver.session();
    HudView {
        fps: driver.timer().fps(),
        position: session.player_position(),
        zoom: session.zoom(),
        show_hitboxes: session.config().show_hitboxes,
        entities: session.world().entity_count(),
        chunks: session.world().chunk_count(),
        state: session.state().clone(),
        chat: session.chat().lines().map(ToString::to_string).collect(),
    }
}

fn apply(driver: &mut Driver, actions: Vec<HudAction>) {
    let session = driver.session_mut();
    for action in actions {
        match action {
            HudAction::SetZoom(zoom) => session.set_zoom(zoom),
            HudAction::ShowHitboxes(show) => session.set_show_hitboxes(show),
            HudAction::SendChat(message) => {
                if let Err(err) = session.send_chat(&message) {
                    tracing::warn!(error = %err, "chat not sent");
                }
            }
        }
    }
}

struct App {
    assets: PathBuf,
    pending: Option<Session<WsTransport>>,
    driver: Option<Driver>,
    window: Option<Arc<Window>>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    hud: Hud,
    last_frame: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(session: Session<WsTransport>, assets: PathBuf) -> Self {
        Self {
            assets,
            pending: Some(session),
            driver: None,
            window: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            hud: Hud::default(),
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("tileworld")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let mut renderer = SurfaceRenderer::new(window.clone())?;
        renderer.load_assets(&self.assets);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(renderer.device(), renderer.format(), None, 1, false);

        let session = self.pending.take().context("session already attached")?;
        self.driver = Some(FrameDriver::new(session, renderer));
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let Some(driver) = &mut self.driver else {
            return;
        };
        let session = driver.session_mut();
        if pressed && key == KeyCode::F3 {
            let show = !session.config().show_hitboxes;
            session.set_show_hitboxes(show);
            return;
        }
        if let Some(action) = action_for(key) {
            let input = session.input_mut();
            if pressed {
                input.press(action);
            } else {
                input.release(action);
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;

        let Self {
            driver: Some(driver),
            window: Some(window),
            egui_ctx,
            egui_winit: Some(egui_winit),
            egui_renderer: Some(egui_renderer),
            hud,
            ..
        } = self
        else {
            return;
        };

        let frame = match driver.frame(elapsed) {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(error = %err, "frame failed");
                return;
            }
        };

        let view = hud_view(driver);
        let raw_input = egui_winit.take_egui_input(window);
        let mut actions = Vec::new();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            actions = hud.draw(ctx, &view);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);
        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let surface = driver.renderer();
        let (device, queue) = (surface.device(), surface.queue());
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: surface.size(),
            pixels_per_point: full_output.pixels_per_point,
        };
        for (id, delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("hud_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen);
        {
            let target = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }
        frame.present();

        apply(driver, actions);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            tracing::error!(error = %err, "startup failed");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            // key releases always reach the game so nothing stays held
            let release = matches!(
                &event,
                WindowEvent::KeyboardInput { event: KeyEvent { state: ElementState::Released, .. }, .. }
            );
            if response.consumed && !release {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(driver) = &mut self.driver {
                    driver.renderer_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(driver) = &mut self.driver {
                    driver.session_mut().input_mut().release_all();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key, state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(driver) = &mut self.driver {
                    let cursor = Vec2::new(position.x as f32, position.y as f32);
                    driver.session_mut().input_mut().set_cursor(Some(cursor));
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(driver) = &mut self.driver {
                    driver.session_mut().input_mut().set_cursor(None);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("tileworld-desktop starting");

    let config = cli.client_config()?;
    let transport = WsTransport::connect(&cli.server)
        .with_context(|| format!("cannot connect to {}", cli.server))?;
    let mut session = Session::new(config, transport);
    session.start()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(session, cli.assets);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_to_the_same_actions() {
        assert_eq!(action_for(KeyCode::KeyW), Some(Action::MoveUp));
        assert_eq!(action_for(KeyCode::ArrowUp), Some(Action::MoveUp));
        assert_eq!(action_for(KeyCode::KeyD), action_for(KeyCode::ArrowRight));
        assert_eq!(action_for(KeyCode::ShiftRight), Some(Action::Run));
        assert_eq!(action_for(KeyCode::KeyQ), None);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["tileworld-desktop", "--username", "bob", "--skin", "2"]);
        let config = cli.client_config().unwrap();
        assert_eq!(config.username, "bob");
        assert_eq!(config.skin, 2);
        assert_eq!(config.zoom, 32.0);
    }

    #[test]
    fn out_of_range_skin_is_rejected() {
        let cli = Cli::parse_from(["tileworld-desktop", "--skin", "9"]);
        assert!(cli.client_config().is_err());
    }
}
