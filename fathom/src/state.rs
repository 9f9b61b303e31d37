use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tide_map::core::{MapGrid, MapRead, MapSize, TileKind};

use crate::geom::{RectF, Vec2};
use crate::lighting::{Lighting, LightingCaps, PositionProvider, RawObject};

/// World-unit span of one map tile.
pub const TILE_SIZE: f32 = 32.0;

pub const OXYGEN_MAX: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum GameMode {
    Boot,
    Diving,
    Pause,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Tile {
    Water,
    Sand,
    Kelp,
    Rock,
    AirPocket,
}

impl Tile {
    pub fn to_tile_kind(self) -> TileKind {
        match self {
            Tile::Water => TileKind::Water,
            Tile::Sand => TileKind::Sand,
            Tile::Kelp => TileKind::Kelp,
            Tile::Rock => TileKind::Rock,
            Tile::AirPocket => TileKind::AirPocket,
        }
    }

    pub fn from_tile_kind(kind: TileKind) -> Self {
        match kind {
            TileKind::Water => Tile::Water,
            TileKind::Sand => Tile::Sand,
            TileKind::Kelp => Tile::Kelp,
            TileKind::Rock => Tile::Rock,
            TileKind::AirPocket => Tile::AirPocket,
            TileKind::Custom(_) => Tile::Water,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapState {
    pub name: String,
    pub width: u16,
    pub height: u16,
    pub tiles: Vec<Tile>,
}

impl MapState {
    pub fn from_grid(grid: MapGrid) -> Self {
        Self {
            name: grid.name,
            width: grid.size.width,
            height: grid.size.height,
            tiles: grid.tiles.into_iter().map(Tile::from_tile_kind).collect(),
        }
    }

    pub fn filled(name: impl Into<String>, size: MapSize, tile: TileKind) -> Self {
        Self::from_grid(MapGrid::filled(name, size, tile))
    }

    pub fn tile(&self, x: u16, y: u16) -> Tile {
        if x >= self.width || y >= self.height {
            return Tile::Rock;
        }
        let idx = self.index(x, y);
        self.tiles.get(idx).copied().unwrap_or(Tile::Rock)
    }

    pub fn is_solid(&self, x: u16, y: u16) -> bool {
        matches!(self.tile(x, y), Tile::Rock)
    }

    /// Solidity at a continuous world position. Anything off the map counts
    /// as rock, so the swim integration cannot escape the level.
    pub fn solid_at_world(&self, point: Vec2) -> bool {
        if point.x < 0.0 || point.y < 0.0 {
            return true;
        }
        let x = (point.x / TILE_SIZE).floor() as u32;
        let y = (point.y / TILE_SIZE).floor() as u32;
        if x >= self.width as u32 || y >= self.height as u32 {
            return true;
        }
        self.is_solid(x as u16, y as u16)
    }

    pub fn world_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn world_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    fn index(&self, x: u16, y: u16) -> usize {
        (y as usize * self.width as usize) + x as usize
    }
}

impl MapRead for MapState {
    fn map_size(&self) -> MapSize {
        MapSize::new(self.width, self.height)
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        self.tile(x, y).to_tile_kind()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub flipped: bool,
    pub oxygen_current: f32,
    pub oxygen_max: f32,
}

impl PlayerState {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            flipped: false,
            oxygen_current: OXYGEN_MAX,
            oxygen_max: OXYGEN_MAX,
        }
    }

    pub fn tile_pos(&self) -> (u16, u16) {
        (
            (self.pos.x / TILE_SIZE).max(0.0) as u16,
            (self.pos.y / TILE_SIZE).max(0.0) as u16,
        )
    }
}

impl PositionProvider for PlayerState {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn flipped(&self) -> bool {
        self.flipped
    }
}

/// A parsed level ready to swap in: the tile map, the diver's spawn, and the
/// raw object layers the lighting core ingests as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoadedLevel {
    pub map: MapState,
    pub spawn: Vec2,
    pub zones: Vec<RawObject>,
    pub lights: Vec<RawObject>,
    pub pockets: Vec<RawObject>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppState {
    pub mode: GameMode,
    pub level_index: u32,
    pub map: MapState,
    pub player: PlayerState,
    pub pockets: Vec<RectF>,
    pub lighting: Lighting,
    pub caps: LightingCaps,
    pub game_time_ms: f64,
    pub debug: bool,
    pub last_status: Option<String>,
}

impl AppState {
    pub fn new(level_index: u32, caps: LightingCaps, debug: bool) -> Self {
        Self {
            mode: GameMode::Boot,
            level_index,
            map: MapState::filled("bootstrap", MapSize::new(3, 3), TileKind::Rock),
            player: PlayerState::at(Vec2::new(TILE_SIZE * 1.5, TILE_SIZE * 1.5)),
            pockets: Vec::new(),
            lighting: Lighting::new(caps),
            caps,
            game_time_ms: 0.0,
            debug,
            last_status: None,
        }
    }

    /// Swaps in a loaded level: fresh lighting, fresh diver at the spawn,
    /// air-pocket regions built from the raw rectangles.
    pub fn apply_loaded_level(&mut self, level: LoadedLevel) {
        self.map = level.map;
        self.player = PlayerState::at(level.spawn);

        self.pockets = level
            .pockets
            .iter()
            .filter(|raw| !raw.is_point())
            .map(|raw| RectF::new(raw.x, raw.y, raw.width, raw.height))
            .collect();

        // Fresh lighting per level; only the viewport record survives, since
        // the terminal will not re-announce its size for a level swap.
        let (cols, rows) = self.lighting.debug_snapshot().viewport;
        self.lighting = Lighting::new(self.caps);
        self.lighting.handle_resize(cols, rows);
        self.lighting.process_zones(&level.zones);
        self.lighting.process_lights(&level.lights);

        self.mode = GameMode::Diving;
        self.last_status = Some(format!(
            "Depth {} — find air, mind the dark.",
            self.level_index + 1
        ));
    }

    pub fn in_air_pocket(&self) -> bool {
        self.pockets.iter().any(|rect| rect.contains(self.player.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_tile_is_rock() {
        let map = MapState::filled("test", MapSize::new(4, 4), TileKind::Water);
        assert_eq!(map.tile(99, 99), Tile::Rock);
        assert!(map.solid_at_world(Vec2::new(-1.0, 10.0)));
        assert!(map.solid_at_world(Vec2::new(10.0, 4.0 * TILE_SIZE + 1.0)));
    }

    #[test]
    fn world_solidity_matches_tiles() {
        let mut map = MapState::filled("test", MapSize::new(4, 4), TileKind::Water);
        let idx = 1usize * 4 + 2;
        map.tiles[idx] = Tile::Rock;
        assert!(map.solid_at_world(Vec2::new(2.5 * TILE_SIZE, 1.5 * TILE_SIZE)));
        assert!(!map.solid_at_world(Vec2::new(0.5 * TILE_SIZE, 0.5 * TILE_SIZE)));
    }

    #[test]
    fn air_pocket_containment_uses_player_position() {
        let mut state = AppState::new(0, LightingCaps::default(), false);
        state.pockets = vec![RectF::new(0.0, 0.0, 64.0, 32.0)];
        state.player.pos = Vec2::new(32.0, 16.0);
        assert!(state.in_air_pocket());
        state.player.pos = Vec2::new(100.0, 16.0);
        assert!(!state.in_air_pocket());
    }
}
