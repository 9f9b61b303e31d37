use std::collections::HashMap;

use thiserror::Error;

use crate::core::{MapGrid, MapSize, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrimMode {
    PreserveRightWhitespace,
    TrimBoth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub trim_mode: TrimMode,
    pub default_char: char,
    pub default_tile: TileKind,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            trim_mode: TrimMode::TrimBoth,
            default_char: ' ',
            default_tile: TileKind::Rock,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Legend {
    map: HashMap<char, TileKind>,
}

impl Legend {
    pub fn builder() -> LegendBuilder {
        LegendBuilder::default()
    }

    pub fn tile_for(&self, ch: char) -> Option<TileKind> {
        self.map.get(&ch).copied()
    }
}

#[derive(Clone, Debug, Default)]
pub struct LegendBuilder {
    entries: HashMap<char, TileKind>,
}

impl LegendBuilder {
    pub fn entry(mut self, ch: char, tile: TileKind) -> Self {
        self.entries.insert(ch, tile);
        self
    }

    pub fn build(self) -> Result<Legend, ParseError> {
        if self.entries.is_empty() {
            return Err(ParseError::EmptyLegend);
        }

        if self.entries.keys().any(|ch| *ch == '\0') {
            return Err(ParseError::InvalidLegendChar);
        }

        Ok(Legend { map: self.entries })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("legend must contain at least one entry")]
    EmptyLegend,
    #[error("legend contains an invalid character")]
    InvalidLegendChar,
    #[error("map contains unknown legend key: {0:?}")]
    UnknownLegendKey(char),
}

pub fn parse_char_grid(
    map_name: &str,
    map_text: &str,
    legend: &Legend,
    options: &ParseOptions,
) -> Result<MapGrid, ParseError> {
    let lines: Vec<String> = map_text
        .lines()
        .map(|line| match options.trim_mode {
            TrimMode::TrimBoth => line.trim().to_string(),
            TrimMode::PreserveRightWhitespace => line.trim_end().to_string(),
        })
        .filter(|line| !line.trim().is_empty())
        .collect();

    let height = lines.len();
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let mut tiles = Vec::with_capacity(width * height);
    for line in &lines {
        let chars: Vec<char> = line.chars().collect();
        for x in 0..width {
            let ch = chars.get(x).copied().unwrap_or(options.default_char);
            let tile = if let Some(tile) = legend.tile_for(ch) {
                tile
            } else if ch == options.default_char {
                options.default_tile
            } else {
                return Err(ParseError::UnknownLegendKey(ch));
            };
            tiles.push(tile);
        }
    }

    let grid = MapGrid::new(
        map_name.to_string(),
        MapSize::new(width as u16, height as u16),
        tiles,
    )
    .expect("parser precomputes exact tile capacity");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_legend() -> Legend {
        Legend::builder()
            .entry('~', TileKind::Water)
            .entry('#', TileKind::Rock)
            .build()
            .expect("legend")
    }

    #[test]
    fn parse_ragged_lines_with_default_fill() {
        let legend = sample_legend();
        let map = parse_char_grid(
            "demo",
            "\n##\n#~\n#\n",
            &legend,
            &ParseOptions {
                trim_mode: TrimMode::TrimBoth,
                default_char: '~',
                default_tile: TileKind::Water,
            },
        )
        .expect("map");

        assert_eq!(map.size, MapSize::new(2, 3));
        assert_eq!(map.tile_kind(1, 2), TileKind::Water);
    }

    #[test]
    fn parse_errors_on_unknown_legend_key() {
        let legend = sample_legend();
        let err = parse_char_grid(
            "demo",
            "~?",
            &legend,
            &ParseOptions {
                trim_mode: TrimMode::TrimBoth,
                default_char: '~',
                default_tile: TileKind::Water,
            },
        )
        .expect_err("should fail");

        assert_eq!(err, ParseError::UnknownLegendKey('?'));
    }

    #[test]
    fn preserve_left_whitespace_keeps_width() {
        let legend = Legend::builder()
            .entry(' ', TileKind::Water)
            .entry('#', TileKind::Rock)
            .build()
            .expect("legend");

        let kept = parse_char_grid(
            "keep",
            "   #   ",
            &legend,
            &ParseOptions {
                trim_mode: TrimMode::PreserveRightWhitespace,
                default_char: ' ',
                default_tile: TileKind::Water,
            },
        )
        .expect("map");

        assert_eq!(kept.size.width, 4);
        assert_eq!(kept.tile_kind(3, 0), TileKind::Rock);
    }

    #[test]
    fn legend_builder_rejects_empty() {
        let err = Legend::builder().build().expect_err("should fail");
        assert_eq!(err, ParseError::EmptyLegend);
    }
}
