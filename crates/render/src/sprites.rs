use glam::{UVec2, Vec2};
use tileworld_kernel::{DecorationKind, EntityKind, PlayerState, World};

/// Number of player skins on the player sheet.
pub const PLAYER_SKINS: u8 = 3;

/// Decorations are anchored half a unit below their position.
pub const DECORATION_Y_OFFSET: f32 = -0.5;

/// Sprite atlases, in bind order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetId {
    Decorations,
    Players,
}

impl SheetId {
    pub const ALL: [SheetId; 2] = [SheetId::Decorations, SheetId::Players];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Cells per row and column.
    pub fn grid(self) -> UVec2 {
        match self {
            SheetId::Decorations => UVec2::new(16, 16),
            SheetId::Players => UVec2::new(8, 12),
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            SheetId::Decorations => "decorations.png",
            SheetId::Players => "players.png",
        }
    }
}

/// A rectangle of atlas cells; `(x, y)` is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteCell {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl SpriteCell {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

pub fn decoration_cell(kind: DecorationKind) -> SpriteCell {
    match kind {
        DecorationKind::ForestTree => SpriteCell::new(0, 0, 1, 2),
        DecorationKind::SpruceTree => SpriteCell::new(1, 0, 1, 2),
        DecorationKind::JungleTree => SpriteCell::new(2, 0, 1, 2),
        DecorationKind::Cactus => SpriteCell::new(3, 0, 1, 2),
        DecorationKind::TreeStump => SpriteCell::new(4, 1, 1, 1),
        DecorationKind::IceSpike => SpriteCell::new(5, 0, 1, 2),
        DecorationKind::Bush => SpriteCell::new(6, 1, 1, 1),
        DecorationKind::Stone => SpriteCell::new(7, 1, 1, 1),
        DecorationKind::BigStone => SpriteCell::new(8, 1, 1, 1),
        DecorationKind::TreeLog => SpriteCell::new(9, 1, 1, 1),
        DecorationKind::TallGrass => SpriteCell::new(10, 1, 1, 1),
        DecorationKind::SeaShell => SpriteCell::new(11, 1, 1, 1),
    }
}

/// Column is the facing, row block is the skin (four rows each, the first
/// unused), row within the block is the animation frame.
pub fn player_cell(player: &PlayerState) -> SpriteCell {
    let skin = player.skin.min(PLAYER_SKINS - 1) as u32;
    SpriteCell::new(
        player.direction.index() as u32,
        skin * 4 + 1 + player.animation_frame as u32,
        1,
        1,
    )
}

/// One sprite draw: bottom-centre anchor in world units plus its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub position: Vec2,
    pub cell: SpriteCell,
}

/// Per-frame sprite instances bucketed by atlas. Each bucket is sorted back
/// to front (higher `y` first).
#[derive(Debug, Clone, Default)]
pub struct SpriteBatches {
    batches: [Vec<SpriteInstance>; 2],
}

impl SpriteBatches {
    pub fn build(world: &World) -> Self {
        let mut batches = Self::default();
        batches.rebuild(world);
        batches
    }

    pub fn rebuild(&mut self, world: &World) {
        for batch in &mut self.batches {
            batch.clear();
        }
        for entity in world.entities().values() {
            let (sheet, instance) = match &entity.kind {
                EntityKind::Decoration(kind) => (
                    SheetId::Decorations,
                    SpriteInstance {
                        position: entity.position + Vec2::new(0.0, DECORATION_Y_OFFSET),
                        cell: decoration_cell(*kind),
                    },
                ),
                EntityKind::Player(player) => (
                    SheetId::Players,
                    SpriteInstance {
                        position: entity.position,
                        cell: player_cell(player),
                    },
                ),
            };
            self.batches[sheet.index()].push(instance);
        }
        for batch in &mut self.batches {
            batch.sort_by(|a, b| b.position.y.total_cmp(&a.position.y));
        }
    }

    pub fn get(&self, sheet: SheetId) -> &[SpriteInstance] {
        &self.batches[sheet.index()]
    }

    pub fn total(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Buckets with at least one instance, in sheet order.
    pub fn non_empty(&self) -> impl Iterator<Item = (SheetId, &[SpriteInstance])> {
        SheetId::ALL
            .into_iter()
            .map(|sheet| (sheet, self.get(sheet)))
            .filter(|(_, instances)| !instances.is_empty())
    }
}
