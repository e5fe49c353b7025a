use glam::Vec2;
use std::time::Duration;
use tileworld_common::EntityId;
use tileworld_input::InputState;
use tileworld_kernel::{Entity, World};
use tileworld_motion::{self as motion, Step};
use tileworld_protocol::{DecodeError, HEARTBEAT, InboundPacket, OutboundPacket, decode};
use tileworld_render::{Camera, Scene, cursor_tile};

use crate::chat::ChatLog;
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::transport::Transport;

/// Lifecycle of one game session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Transport is open; registration has not been sent.
    Connecting,
    /// Waiting for `player_registered`.
    Registering,
    Playing,
    /// The server answered registration with an error.
    Rejected(String),
    /// The transport closed or failed.
    Ended(String),
}

impl SessionState {
    pub fn is_over(&self) -> bool {
        matches!(self, SessionState::Rejected(_) | SessionState::Ended(_))
    }
}

/// One connection's worth of client state.
///
/// Owns the world mirror exclusively. Inbound frames are applied in
/// [`pump`](Self::pump); the local player advances in
/// [`update`](Self::update); renderers borrow the world through
/// [`scene`](Self::scene).
pub struct Session<T> {
    config: ClientConfig,
    transport: T,
    world: World,
    input: InputState,
    camera: Camera,
    chat: ChatLog,
    state: SessionState,
    packets: u64,
    decode_errors: u64,
}

impl<T: Transport> Session<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let camera = Camera::new(Vec2::ZERO, config.zoom);
        let chat = ChatLog::new(config.chat_history);
        Self {
            config,
            transport,
            world: World::new(),
            input: InputState::new(),
            camera,
            chat,
            state: SessionState::Connecting,
            packets: 0,
            decode_errors: 0,
        }
    }

    /// Send `player_register` and wait for the reply.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let register = OutboundPacket::PlayerRegister {
            game_name: self.config.game_name.clone(),
            username: self.config.username.clone(),
            skin: self.config.skin,
        };
        if let Err(err) = self.send(&register) {
            self.end(err.to_string());
            return Err(err);
        }
        tracing::info!(
            game = %self.config.game_name,
            username = %self.config.username,
            "registering"
        );
        self.state = SessionState::Registering;
        Ok(())
    }

    /// Apply every frame waiting on the transport. Returns how many were read.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while !self.state.is_over() {
            match self.transport.poll() {
                Ok(Some(frame)) => {
                    self.handle_frame(&frame);
                    count += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    self.end(err.to_string());
                    break;
                }
            }
        }
        count
    }

    /// Decode and apply one text frame. Undecodable frames are logged and
    /// dropped; they never change state.
    pub fn handle_frame(&mut self, frame: &str) -> bool {
        match decode(frame) {
            Ok(packet) => {
                self.handle(packet);
                true
            }
            Err(DecodeError::UnknownPacketType(kind)) => {
                tracing::warn!(packet_type = %kind, "no handler for packet type");
                self.decode_errors += 1;
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable frame");
                self.decode_errors += 1;
                false
            }
        }
    }

    pub fn handle(&mut self, packet: InboundPacket) {
        self.packets += 1;
        tracing::trace!(packet_type = packet.packet_type(), "inbound");
        match packet {
            InboundPacket::PlayerRegistered { id, position } => self.on_registered(id, position),
            InboundPacket::TerrainChunk(chunk) => {
                tracing::debug!(coord = %chunk.position(), "chunk streamed in");
                self.world.load_chunk(chunk);
            }
            InboundPacket::EntityLoad(entity) => {
                self.world.load_entity(entity);
            }
            // unknown ids are warned about by the store
            InboundPacket::EntityMove { id, new_position } => {
                self.world.move_entity(&id, new_position);
            }
            InboundPacket::EntityDestroyed { id } => {
                self.world.remove_entity(&id);
            }
            InboundPacket::ChatMessage {
                id,
                username,
                message,
            } => self.chat.push_player(id, username, message),
            InboundPacket::SystemMessage { message } => self.chat.push_system(message),
            InboundPacket::ServerError { error } => {
                if self.state == SessionState::Registering {
                    tracing::warn!(%error, "registration rejected");
                    self.state = SessionState::Rejected(error);
                } else {
                    tracing::warn!(%error, "server error");
                    self.chat.push_system(error);
                }
            }
        }
    }

    fn on_registered(&mut self, id: EntityId, position: Option<Vec2>) {
        if self.world.get(&id).is_none() {
            let player = Entity::player(
                id.clone(),
                position.unwrap_or(Vec2::ZERO),
                self.config.username.clone(),
                self.config.skin,
            );
            self.world.load_entity(player);
        }
        tracing::info!(%id, "registered");
        self.world.set_local_player(id);
        self.state = SessionState::Playing;
        self.follow();
    }

    /// Advance the local player by `dt` seconds of held input.
    ///
    /// Out-of-range state is evicted first, then the resolved position is
    /// applied locally and sent as an `entity_move` intent.
    pub fn update(&mut self, dt: f32) -> Option<Step> {
        if self.state != SessionState::Playing {
            return None;
        }
        let id = self.world.local_player_id()?.clone();
        let center = self.world.get(&id)?.position;
        self.world.evict(center, self.config.evict_radius);

        let step = motion::step(&self.world, &id, &self.input, dt, &self.config.movement);
        if let Some(step) = step {
            self.world.move_entity(&id, step.to);
            if let Err(err) = self.send(&OutboundPacket::entity_move(id, step.to)) {
                tracing::warn!(error = %err, "cannot send move");
                self.end(err.to_string());
            }
        }
        self.follow();
        step
    }

    /// One animation tick at session time `clock`.
    pub fn animate(&mut self, clock: Duration) -> usize {
        motion::animate(&mut self.world, clock)
    }

    pub fn heartbeat(&mut self) {
        if self.state.is_over() {
            return;
        }
        if let Err(err) = self.transport.send(HEARTBEAT) {
            self.end(err.to_string());
        }
    }

    pub fn send_chat(&mut self, message: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Playing {
            return Err(SessionError::NotPlaying);
        }
        self.send(&OutboundPacket::ChatMessageSend {
            message: message.to_owned(),
        })
    }

    /// Non-positive or non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.camera.scale = zoom;
        }
    }

    pub fn zoom(&self) -> f32 {
        self.camera.scale
    }

    /// The tile under the cursor, if the cursor is over the window.
    pub fn cursor_tile(&self, viewport: Vec2) -> Option<Vec2> {
        let cursor = self.input.cursor()?;
        self.camera
            .screen_to_world(cursor, viewport)
            .ok()
            .map(cursor_tile)
    }

    pub fn scene(&self, viewport: Vec2) -> Scene<'_> {
        let mut scene = Scene::new(&self.world, self.camera, viewport);
        scene.cursor_tile = self.cursor_tile(viewport);
        scene.show_hitboxes = self.config.show_hitboxes;
        scene.hitbox_size = self.config.movement.entity_size;
        scene
    }

    pub fn set_show_hitboxes(&mut self, show: bool) {
        self.config.show_hitboxes = show;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Packets decoded and applied so far.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }

    /// The local player's position rounded for display.
    pub fn player_position(&self) -> Option<Vec2> {
        self.world.local_player().map(|e| e.position.round())
    }

    fn follow(&mut self) {
        if let Some(player) = self.world.local_player() {
            self.camera.position = player.position;
        }
    }

    fn send(&mut self, packet: &OutboundPacket) -> Result<(), SessionError> {
        let frame = packet.encode()?;
        self.transport.send(&frame)?;
        Ok(())
    }

    fn end(&mut self, reason: String) {
        if !self.state.is_over() {
            tracing::info!(%reason, "session ended");
            self.state = SessionState::Ended(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tileworld_common::{ChunkCoord, Direction};
    use tileworld_input::Action;
    use tileworld_kernel::{DecorationKind, EntityKind, StoreWarning};
    use crate::transport::MemoryTransport;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::SubscriberExt;

    fn session() -> Session<MemoryTransport> {
        let config = ClientConfig {
            game_name: "g".into(),
            username: "alice".into(),
            ..ClientConfig::default()
        };
        Session::new(config, MemoryTransport::new())
    }

    fn playing() -> Session<MemoryTransport> {
        let mut s = session();
        s.start().unwrap();
        s.transport_mut()
            .push_inbound(r#"{"packet_type":"player_registered","id":"p1"}"#);
        s.pump();
        s.transport_mut().take_sent();
        s
    }

    fn sent_json(s: &Session<MemoryTransport>) -> Vec<Value> {
        s.transport()
            .sent()
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    fn chunk_frame(x: i32, y: i32, tile: &str) -> String {
        json!({
            "packet_type": "terrain_chunk",
            "chunk": {"position": {"x": x, "y": y}, "contents": vec![tile; 64]},
        })
        .to_string()
    }

    #[test]
    fn registration_creates_local_player() {
        let mut s = session();
        s.start().unwrap();
        assert_eq!(s.state(), &SessionState::Registering);
        assert_eq!(
            sent_json(&s),
            [json!({"packet_type": "player_register", "game_name": "g", "username": "alice", "skin": 0})]
        );

        s.transport_mut()
            .push_inbound(r#"{"packet_type":"player_registered","id":"p1"}"#);
        assert_eq!(s.pump(), 1);

        assert_eq!(s.state(), &SessionState::Playing);
        let player = s.world().get(&"p1".into()).unwrap();
        let state = player.as_player().unwrap();
        assert_eq!(state.username, "alice");
        assert_eq!(state.direction, Direction::S);
        assert_eq!(state.previous_position, player.position);
        assert_eq!(s.world().local_player_id(), Some(&"p1".into()));
    }

    #[test]
    fn registration_keeps_an_already_loaded_player() {
        let mut s = session();
        s.start().unwrap();
        s.transport_mut().push_inbound(
            r#"{"packet_type":"entity_load","entity":{"id":"p1","position":{"x":5,"y":6},"value":{"player":{"username":"alice","skin":1}}}}"#,
        );
        s.transport_mut().push_inbound(
            r#"{"packet_type":"player_registered","id":"p1","position":{"x":0,"y":0}}"#,
        );
        s.pump();
        let player = s.world().local_player().unwrap();
        assert_eq!(player.position, Vec2::new(5.0, 6.0));
        assert_eq!(s.camera().position, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn decoration_load_has_no_player_state() {
        let mut s = playing();
        s.transport_mut().push_inbound(
            r#"{"packet_type":"entity_load","entity":{"id":"t1","position":{"x":3,"y":4},"value":"forest_tree"}}"#,
        );
        s.pump();
        let tree = s.world().get(&"t1".into()).unwrap();
        assert_eq!(tree.position, Vec2::new(3.0, 4.0));
        assert_eq!(tree.kind, EntityKind::Decoration(DecorationKind::ForestTree));
        assert!(tree.as_player().is_none());
    }

    #[test]
    fn move_for_unknown_entity_only_warns() {
        let mut s = playing();
        s.transport_mut().push_inbound(chunk_frame(0, 0, "Grass"));
        s.transport_mut().push_inbound(
            r#"{"packet_type":"entity_move","id":"ghost","new_position":{"x":1,"y":1}}"#,
        );
        assert_eq!(s.pump(), 2);

        assert_eq!(s.state(), &SessionState::Playing);
        assert_eq!(s.world().chunk_count(), 1);
        assert_eq!(s.world().entity_count(), 1);
        assert!(s.world().get(&"ghost".into()).is_none());
        let warnings: Vec<_> = s.world().warnings().collect();
        assert_eq!(
            warnings,
            [&StoreWarning::UnknownEntity {
                id: "ghost".into(),
                operation: "entity_move"
            }]
        );
    }

    /// Counts WARN events emitted while it is the default subscriber.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn unknown_move_and_destroy_warn_once_each() {
        let mut s = playing();
        s.transport_mut().push_inbound(
            r#"{"packet_type":"entity_move","id":"ghost","new_position":{"x":1,"y":1}}"#,
        );
        s.transport_mut()
            .push_inbound(r#"{"packet_type":"entity_destroyed","id":"ghost"}"#);

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
        tracing::subscriber::with_default(subscriber, || assert_eq!(s.pump(), 2));

        assert_eq!(warnings.load(Ordering::Relaxed), 2);
        assert_eq!(s.world().warnings().count(), 2);
    }

    #[test]
    fn bad_frames_are_dropped() {
        let mut s = playing();
        s.transport_mut().push_inbound(r#"{"packet_type":"teleport","id":"p1"}"#);
        s.transport_mut().push_inbound("not json");
        s.transport_mut()
            .push_inbound(r#"{"packet_type":"system_message","message":"hello"}"#);
        assert_eq!(s.pump(), 3);
        assert_eq!(s.decode_errors(), 2);
        assert_eq!(s.state(), &SessionState::Playing);
        assert_eq!(s.chat().last().unwrap().to_string(), "* hello");
    }

    #[test]
    fn error_reply_rejects_registration() {
        let mut s = session();
        s.start().unwrap();
        s.transport_mut()
            .push_inbound(r#"{"error":"username taken"}"#);
        s.transport_mut()
            .push_inbound(r#"{"packet_type":"player_registered","id":"p1"}"#);
        assert_eq!(s.pump(), 1);
        assert_eq!(s.state(), &SessionState::Rejected("username taken".into()));
        assert_eq!(s.world().entity_count(), 0);
    }

    #[test]
    fn error_while_playing_goes_to_chat() {
        let mut s = playing();
        s.transport_mut().push_inbound(r#"{"error":"slow down"}"#);
        s.pump();
        assert_eq!(s.state(), &SessionState::Playing);
        assert_eq!(s.chat().last().unwrap().text, "slow down");
    }

    #[test]
    fn closed_transport_ends_session() {
        let mut s = playing();
        s.transport_mut().close();
        s.pump();
        assert!(matches!(s.state(), SessionState::Ended(_)));
        assert!(s.update(0.1).is_none());
    }

    #[test]
    fn update_moves_and_sends_intent() {
        let mut s = playing();
        s.input_mut().press(Action::MoveRight);
        let step = s.update(0.1).unwrap();
        assert!((step.to.x - 0.8).abs() < 1e-5);
        assert_eq!(s.world().local_player().unwrap().position, step.to);
        assert_eq!(s.camera().position, step.to);
        let sent = sent_json(&s);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["packet_type"], "entity_move");
        assert_eq!(sent[0]["id"], "p1");
    }

    #[test]
    fn idle_update_sends_nothing() {
        let mut s = playing();
        assert!(s.update(0.1).is_none());
        assert!(s.transport().sent().is_empty());
    }

    #[test]
    fn update_evicts_far_state_but_not_players() {
        let mut s = playing();
        s.world_mut().load_entity(Entity::decoration(
            "far".into(),
            Vec2::new(150.0, 0.0),
            DecorationKind::Stone,
        ));
        s.world_mut().load_entity(Entity::decoration(
            "near".into(),
            Vec2::new(99.0, 0.0),
            DecorationKind::Stone,
        ));
        s.world_mut()
            .load_entity(Entity::player("p2".into(), Vec2::new(500.0, 0.0), "bob", 1));
        s.transport_mut().push_inbound(chunk_frame(20, 0, "Grass"));
        s.pump();

        s.update(0.016);
        assert!(s.world().get(&"far".into()).is_none());
        assert!(s.world().get(&"near".into()).is_some());
        assert!(s.world().get(&"p2".into()).is_some());
        assert!(s.world().chunk(ChunkCoord::new(20, 0)).is_none());
    }

    #[test]
    fn chat_requires_playing() {
        let mut s = session();
        assert!(matches!(s.send_chat("hi"), Err(SessionError::NotPlaying)));
        let mut s = playing();
        s.send_chat("hi").unwrap();
        assert_eq!(
            sent_json(&s),
            [json!({"packet_type": "chat_message_send", "message": "hi"})]
        );
    }

    #[test]
    fn heartbeat_is_an_empty_frame() {
        let mut s = playing();
        s.heartbeat();
        assert_eq!(s.transport().sent(), [""]);
    }

    #[test]
    fn zoom_ignores_nonsense() {
        let mut s = session();
        s.set_zoom(64.0);
        s.set_zoom(0.0);
        s.set_zoom(f32::NAN);
        assert_eq!(s.zoom(), 64.0);
    }

    #[test]
    fn scene_carries_cursor_tile() {
        let mut s = playing();
        let viewport = Vec2::new(800.0, 600.0);
        assert!(s.scene(viewport).cursor_tile.is_none());
        // one tile right of centre at the default zoom of 32 px per unit
        s.input_mut().set_cursor(Some(Vec2::new(432.0, 300.0)));
        assert_eq!(s.scene(viewport).cursor_tile, Some(Vec2::new(1.0, 0.0)));
    }
}
