//! Built-in levels: a char grid for the tiles, then object sections for the
//! darkness zones, point lights, air pockets, and the spawn point. The grid
//! is authored in tide-map's legend format; the object layers arrive at the
//! lighting core exactly as parsed, shape plus string properties.

use log::warn;
use thiserror::Error;
use tide_map::core::TileKind;
use tide_map::objects::{parse_object_sections, split_level_text, RawMapObject};
use tide_map::parse::{parse_char_grid, Legend, ParseError, ParseOptions, TrimMode};

use crate::geom::Vec2;
use crate::lighting::RawObject;
use crate::state::{LoadedLevel, MapState, TILE_SIZE};

const LEVEL_1: &str = r##"
############################################
#~~~~~~~~~~~~~~~~~~~~~####~~~~~~~~~~oo~~~~~#
#~~~~~~~~~~~~~~~~~~~~~~##~~~~~~~~~~~oo~~~~~#
#~~~~~"~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~#
#~~~~""~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~#
#~~~~~"~~~~,,~~~~~~~~~~~~~~~~~####~~~~~~~~~#
#~~~~~~~~,,,,,~~~~~~~~~~~~~~######~~~~~~~~~#
#~~~~~~~~~~,,~~~~~~###~~~~~~######~~~~~~~~~#
#~~~,,~~~~~~~~~~~#####~~~~~~~~###~~~~~~~~~~#
#~~,,,,,~~~~~~~~######~~~~~~~~~~~~~~~~~~~~~#
#~~~~,,~~~~~~~~~######~~~~~~~~~~~~~~~~~~~~~#
#~~~~~~~~~~~~~~~~####~~~~~~~~~~~~~"~~~~~~~~#
#~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~""~~~~~~~~#
#~~~~~~~,~~~~~~~~~~~~~~~~~~~~~~~~~"~~~~~~~~#
#~~~~~,,,,~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~#
#~~,,,,,,,,,~~~~~~~~~,,~~~~~~~~~~~~~~~~~~~~#
#,,,,,,,,,,,,,,~~~,,,,,,,,~~~,,,,,,,,,,,,,,#
############################################
[zones]
dusk-shelf: rect 576 0 352 576 type=dim
dark-gallery: rect 928 0 224 576 type=dark
midnight-hollow: rect 1152 96 224 480 type=black
[lights]
wreck-lamp: at 640 192 color=#8FD3FF radius=140 intensity=0.7
angler: at 1248 416 color=#AFE08C radius=90 intensity=0.8
[pockets]
trench-alcove: rect 1152 32 64 64
[spawn]
diver: at 96 128
"##;

const LEVEL_2: &str = r##"
########################################
#~~~~oo~~~~####~~~~~~~~~~~~~~~~~~~~~~~~#
#~~~~oo~~~~~##~~~~~~~~~"~~~~~~~~~~~~~~~#
#~~~~~~~~~~~~~~~~~~~~~""~~~~~~~~~~~~~~~#
#####~~~~~~~~~~~~~~~~~~"~~~~~~~~~~~~####
####~~~~~~~####~~~~~~~~~~~~~~~~~~~~~~~~#
#~~~~~~~~######~~~~~~~~~~~####~~~~~~~~~#
#~~~~~~~~~####~~~~~~~~~~######~~~~oo~~~#
#~~~,~~~~~~~~~~~~~~~~~~~~####~~~~~oo~~~#
#~~,,,~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~#
#~~~~~~~~~~~~~~~,,~~~~~~~~~~~~~~~~~~~~~#
#~~~~~~~~~~~~~,,,,,~~~~~~~~~~~~~~~~~~~~#
#~~~~~~~,,~~~~~~,,~~~~~~~~~~~~~~~~~~~~~#
#~~~,,,,,,,,~~~~~~~~~,,,~~~~~,,,,~~~~~~#
#,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,,#
########################################
[zones]
throat-mouth: rect 0 0 1280 512 type=dim
throat-depths: rect 320 0 960 512 type=dark
black-heart: rect 640 128 480 384 type=black
crevice: rect 480 288 48 224 type=black
[lights]
entry-lamp: at 96 96 color=#FFD9A0 radius=120 intensity=0.6
drowned-beacon: at 700 200 color=#66D9FF radius=100 intensity=0.5
[pockets]
entry-pocket: rect 160 32 64 64
far-pocket: rect 1088 224 64 64
[spawn]
diver: at 96 96
"##;

const LEVELS: &[(&str, &str)] = &[("kelp-shallows", LEVEL_1), ("the-throat", LEVEL_2)];

pub fn level_count() -> u32 {
    LEVELS.len() as u32
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("no level {index}; {count} levels exist")]
    UnknownLevel { index: u32, count: u32 },
    #[error("level grid failed to parse: {0}")]
    Parse(#[from] ParseError),
}

pub fn load_level(index: u32) -> Result<LoadedLevel, LevelError> {
    let (name, text) = LEVELS
        .get(index as usize)
        .copied()
        .ok_or(LevelError::UnknownLevel {
            index,
            count: level_count(),
        })?;

    let (grid_text, section_text) = split_level_text(text);
    let legend = Legend::builder()
        .entry('~', TileKind::Water)
        .entry(',', TileKind::Sand)
        .entry('"', TileKind::Kelp)
        .entry('#', TileKind::Rock)
        .entry('o', TileKind::AirPocket)
        .build()?;
    let grid = parse_char_grid(
        name,
        &grid_text,
        &legend,
        &ParseOptions {
            trim_mode: TrimMode::PreserveRightWhitespace,
            default_char: ' ',
            default_tile: TileKind::Rock,
        },
    )?;
    let map = MapState::from_grid(grid);

    let sheet = parse_object_sections(&section_text);
    let spawn = sheet
        .layer("spawn")
        .first()
        .map(|raw| Vec2::new(raw.x, raw.y))
        .unwrap_or_else(|| {
            warn!("level {name:?} has no spawn point; using first open water");
            fallback_spawn(&map)
        });

    Ok(LoadedLevel {
        map,
        spawn,
        zones: convert(sheet.layer("zones")),
        lights: convert(sheet.layer("lights")),
        pockets: convert(sheet.layer("pockets")),
    })
}

fn convert(raw: &[RawMapObject]) -> Vec<RawObject> {
    raw.iter()
        .map(|object| RawObject {
            name: object.name.clone(),
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            properties: object
                .properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        })
        .collect()
}

fn fallback_spawn(map: &MapState) -> Vec2 {
    for y in 0..map.height {
        for x in 0..map.width {
            if !map.is_solid(x, y) {
                return Vec2::new(
                    (x as f32 + 0.5) * TILE_SIZE,
                    (y as f32 + 0.5) * TILE_SIZE,
                );
            }
        }
    }
    Vec2::new(TILE_SIZE * 1.5, TILE_SIZE * 1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::{LightingCaps, ZoneMap};

    #[test]
    fn every_built_in_level_loads() {
        for index in 0..level_count() {
            let level = load_level(index).expect("level loads");
            assert!(level.map.width > 10);
            assert!(!level.zones.is_empty(), "level {index} has zones");
            assert!(!level.pockets.is_empty(), "level {index} has air");
            assert!(
                !level.map.solid_at_world(level.spawn),
                "level {index} spawn is in open water"
            );
        }
    }

    #[test]
    fn unknown_level_is_an_error() {
        let err = load_level(99).expect_err("should fail");
        assert_eq!(
            err,
            LevelError::UnknownLevel {
                index: 99,
                count: level_count()
            }
        );
    }

    #[test]
    fn level_one_zones_build_cleanly() {
        let level = load_level(0).expect("level");
        let mut faults = Vec::new();
        let zones = ZoneMap::build(&level.zones, &mut faults);
        assert_eq!(zones.len(), 3);
        assert!(faults.is_empty(), "unexpected faults: {faults:?}");
    }

    #[test]
    fn loaded_level_applies_into_app_state() {
        use crate::state::{AppState, GameMode};

        let mut state = AppState::new(0, LightingCaps::default(), false);
        let level = load_level(0).expect("level");
        state.apply_loaded_level(level);

        assert_eq!(state.mode, GameMode::Diving);
        assert_eq!(state.lighting.zones().len(), 3);
        assert_eq!(state.lighting.lights().len(), 2);
        assert_eq!(state.pockets.len(), 1);
        assert!(!state.map.solid_at_world(state.player.pos));
    }
}
