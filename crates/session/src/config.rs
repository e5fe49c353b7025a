use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tileworld_motion::MovementConfig;
use tileworld_render::sprites::PLAYER_SKINS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Client tunables. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub game_name: String,
    pub username: String,
    pub skin: u8,
    /// Pixels per world unit.
    pub zoom: f32,
    /// Entities and chunks farther than this from the local player are dropped.
    pub evict_radius: f32,
    pub animation_period_ms: u64,
    pub heartbeat_period_ms: u64,
    /// Upper bound on the delta fed to one update.
    pub max_frame_dt_ms: u64,
    pub movement: MovementConfig,
    pub show_hitboxes: bool,
    pub chat_history: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            game_name: "default".to_owned(),
            username: "player".to_owned(),
            skin: 0,
            zoom: 32.0,
            evict_radius: 100.0,
            animation_period_ms: 100,
            heartbeat_period_ms: 20_000,
            max_frame_dt_ms: 100,
            movement: MovementConfig::default(),
            show_hitboxes: false,
            chat_history: 100,
        }
    }
}

impl ClientConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("zoom", self.zoom)?;
        positive("evict_radius", self.evict_radius)?;
        positive("movement.walk_speed", self.movement.walk_speed)?;
        positive("movement.run_speed", self.movement.run_speed)?;
        positive("movement.entity_size", self.movement.entity_size)?;
        positive("movement.collision_radius", self.movement.collision_radius)?;
        if self.max_frame_dt_ms == 0 {
            return Err(ConfigError::Invalid("max_frame_dt_ms must be non-zero".to_owned()));
        }
        if self.animation_period_ms == 0 || self.heartbeat_period_ms == 0 {
            return Err(ConfigError::Invalid("ticker periods must be non-zero".to_owned()));
        }
        if self.skin >= PLAYER_SKINS {
            return Err(ConfigError::Invalid(format!(
                "skin {} out of range 0..{PLAYER_SKINS}",
                self.skin
            )));
        }
        Ok(())
    }

    pub fn animation_period(&self) -> Duration {
        Duration::from_millis(self.animation_period_ms)
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }

    pub fn max_frame_dt(&self) -> Duration {
        Duration::from_millis(self.max_frame_dt_ms)
    }
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.zoom, 32.0);
        assert_eq!(c.evict_radius, 100.0);
        assert_eq!(c.animation_period(), Duration::from_millis(100));
        assert_eq!(c.heartbeat_period(), Duration::from_secs(20));
        assert_eq!(c.max_frame_dt(), Duration::from_millis(100));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = ClientConfig::from_json(
            r#"{"username": "alice", "skin": 2, "movement": {"run_speed": 40.0}}"#,
        )
        .unwrap();
        assert_eq!(c.username, "alice");
        assert_eq!(c.skin, 2);
        assert_eq!(c.movement.run_speed, 40.0);
        assert_eq!(c.movement.walk_speed, 8.0);
        assert_eq!(c.chat_history, 100);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_json(r#"{"zoom": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"skin": 3}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_json(r#"{"heartbeat_period_ms": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_positive_movement_and_frame_limits() {
        for json in [
            r#"{"movement": {"walk_speed": 0}}"#,
            r#"{"movement": {"run_speed": -80}}"#,
            r#"{"movement": {"entity_size": 0}}"#,
            r#"{"movement": {"collision_radius": -1}}"#,
            r#"{"max_frame_dt_ms": 0}"#,
            r#"{"animation_period_ms": 0}"#,
            r#"{"evict_radius": -100}"#,
        ] {
            assert!(
                matches!(ClientConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "{json} accepted"
            );
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/tileworld.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
