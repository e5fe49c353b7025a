use glam::Vec2;
use tileworld_session::SessionState;

pub const ZOOM_RANGE: std::ops::RangeInclusive<f32> = 4.0..=128.0;

/// Snapshot of what the HUD shows this frame.
pub struct HudView {
    pub fps: f32,
    pub position: Option<Vec2>,
    pub zoom: f32,
    pub show_hitboxes: bool,
    pub entities: usize,
    pub chunks: usize,
    pub state: SessionState,
    pub chat: Vec<String>,
}

/// Changes requested from the HUD, applied after the egui pass.
#[derive(Debug, Clone, PartialEq)]
pub enum HudAction {
    SetZoom(f32),
    ShowHitboxes(bool),
    SendChat(String),
}

#[derive(Default)]
pub struct Hud {
    chat_input: String,
}

impl Hud {
    pub fn draw(&mut self, ctx: &egui::Context, view: &HudView) -> Vec<HudAction> {
        let mut actions = Vec::new();

        egui::Window::new("tileworld")
            .default_pos([8.0, 8.0])
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.0}", view.fps));
                match view.position {
                    Some(p) => ui.label(format!("Position: {}, {}", p.x, p.y)),
                    None => ui.label("Position: -"),
                };
                ui.label(format!("Entities: {}  Chunks: {}", view.entities, view.chunks));

                let mut zoom = view.zoom;
                ui.add(egui::Slider::new(&mut zoom, ZOOM_RANGE).text("zoom"));
                if zoom != view.zoom {
                    actions.push(HudAction::SetZoom(zoom));
                }
                let mut hitboxes = view.show_hitboxes;
                if ui.checkbox(&mut hitboxes, "hitboxes").changed() {
                    actions.push(HudAction::ShowHitboxes(hitboxes));
                }
            });

        if view.state == SessionState::Playing {
            egui::Window::new("chat")
                .default_pos([8.0, 480.0])
                .default_width(320.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical()
                        .max_height(160.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for line in &view.chat {
                                ui.label(line);
                            }
                        });
                    let response = ui.text_edit_singleline(&mut self.chat_input);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        let message = self.chat_input.trim().to_owned();
                        if !message.is_empty() {
                            actions.push(HudAction::SendChat(message));
                        }
                        self.chat_input.clear();
                        response.request_focus();
                    }
                });
        }

        let banner = match &view.state {
            SessionState::Connecting | SessionState::Registering => Some("Joining...".to_owned()),
            SessionState::Rejected(reason) => Some(format!("Registration refused: {reason}")),
            SessionState::Ended(reason) => Some(format!("Disconnected: {reason}")),
            SessionState::Playing => None,
        };
        if let Some(banner) = banner {
            egui::CentralPanel::default()
                .frame(egui::Frame::default())
                .show(ctx, |ui| {
                    ui.centered_and_justified(|ui| ui.heading(banner));
                });
        }

        actions
    }
}
