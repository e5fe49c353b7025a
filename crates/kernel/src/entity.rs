use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tileworld_common::{Direction, EntityId};

use crate::terrain::KernelError;

/// Animation frame shown while a player stands still.
pub const IDLE_FRAME: u8 = 1;

/// Static world decorations. Each kind is only a sprite lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    ForestTree,
    SpruceTree,
    JungleTree,
    Cactus,
    TreeStump,
    IceSpike,
    Bush,
    Stone,
    BigStone,
    TreeLog,
    TallGrass,
    SeaShell,
}

impl DecorationKind {
    pub const ALL: [DecorationKind; 12] = [
        DecorationKind::ForestTree,
        DecorationKind::SpruceTree,
        DecorationKind::JungleTree,
        DecorationKind::Cactus,
        DecorationKind::TreeStump,
        DecorationKind::IceSpike,
        DecorationKind::Bush,
        DecorationKind::Stone,
        DecorationKind::BigStone,
        DecorationKind::TreeLog,
        DecorationKind::TallGrass,
        DecorationKind::SeaShell,
    ];

    /// Wire name, e.g. `forest_tree`.
    pub fn as_str(self) -> &'static str {
        match self {
            DecorationKind::ForestTree => "forest_tree",
            DecorationKind::SpruceTree => "spruce_tree",
            DecorationKind::JungleTree => "jungle_tree",
            DecorationKind::Cactus => "cactus",
            DecorationKind::TreeStump => "tree_stump",
            DecorationKind::IceSpike => "ice_spike",
            DecorationKind::Bush => "bush",
            DecorationKind::Stone => "stone",
            DecorationKind::BigStone => "big_stone",
            DecorationKind::TreeLog => "tree_log",
            DecorationKind::TallGrass => "tall_grass",
            DecorationKind::SeaShell => "sea_shell",
        }
    }
}

impl fmt::Display for DecorationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecorationKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecorationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| KernelError::UnknownDecoration(s.to_owned()))
    }
}

/// Player-only state. `previous_position` is the sampling point of the last
/// animation tick, not of the last physics step.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub username: String,
    pub skin: u8,
    pub direction: Direction,
    pub animation_frame: u8,
    pub previous_position: Vec2,
}

/// Closed set of entity variants.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Decoration(DecorationKind),
}

/// A mirrored entity: shared base record plus variant payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: Vec2,
    pub kind: EntityKind,
}

impl Entity {
    /// New player facing south, idle, with its animation window starting here.
    pub fn player(id: EntityId, position: Vec2, username: impl Into<String>, skin: u8) -> Self {
        Self {
            id,
            position,
            kind: EntityKind::Player(PlayerState {
                username: username.into(),
                skin,
                direction: Direction::S,
                animation_frame: IDLE_FRAME,
                previous_position: position,
            }),
        }
    }

    pub fn decoration(id: EntityId, position: Vec2, kind: DecorationKind) -> Self {
        Self {
            id,
            position,
            kind: EntityKind::Decoration(kind),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            EntityKind::Decoration(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            EntityKind::Decoration(_) => None,
        }
    }

    /// Variant tag as it appears on the wire.
    pub fn tag(&self) -> &'static str {
        match &self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Decoration(kind) => kind.as_str(),
        }
    }
}
