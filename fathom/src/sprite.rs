//! Diver glyph art.
//!
//! The art is authored facing right. One glyph cell in the art maps to a
//! fixed span of world units, and the lamp position is marked in the art
//! itself with [`MARKER_GLYPH`] rather than hardcoded: the flashlight scans
//! the art once for the marker and keeps the resulting offset.

use crate::geom::Vec2;

pub const MARKER_GLYPH: char = '+';

#[derive(Clone, Copy, Debug)]
pub struct SpriteArt {
    pub rows: &'static [&'static str],
    pub units_per_col: f32,
    pub units_per_row: f32,
}

pub const DIVER: SpriteArt = SpriteArt {
    rows: &[
        "  o+",
        "<==)",
        "  ` ",
    ],
    units_per_col: 8.0,
    units_per_row: 10.0,
};

impl SpriteArt {
    pub fn cols(&self) -> usize {
        self.rows.iter().map(|row| row.chars().count()).max().unwrap_or(0)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// World-unit offset of the lamp marker from the sprite center, or
    /// `None` when the art carries no marker.
    pub fn marker_offset(&self) -> Option<Vec2> {
        let center_col = self.cols() as f32 / 2.0;
        let center_row = self.row_count() as f32 / 2.0;

        for (row_idx, row) in self.rows.iter().enumerate() {
            for (col_idx, ch) in row.chars().enumerate() {
                if ch == MARKER_GLYPH {
                    let dx = (col_idx as f32 + 0.5) - center_col;
                    let dy = (row_idx as f32 + 0.5) - center_row;
                    return Some(Vec2::new(dx * self.units_per_col, dy * self.units_per_row));
                }
            }
        }
        None
    }

    /// Drawable glyphs: everything except blanks and the lamp marker.
    /// Coordinates are (col, row) in art cells, facing right.
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row_idx, row)| {
            row.chars()
                .enumerate()
                .filter(|(_, ch)| *ch != ' ' && *ch != MARKER_GLYPH)
                .map(move |(col_idx, ch)| (col_idx, row_idx, ch))
        })
    }
}

/// Mirror a glyph for left-facing rendering where a mirrored form exists.
pub fn mirror_glyph(ch: char) -> char {
    match ch {
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        '/' => '\\',
        '\\' => '/',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diver_art_carries_a_lamp_marker() {
        let offset = DIVER.marker_offset().expect("marker present");
        // Lamp sits ahead of and above the sprite center for right-facing art.
        assert!(offset.x > 0.0);
        assert!(offset.y < 0.0);
    }

    #[test]
    fn marker_offset_scales_with_cell_size() {
        let art = SpriteArt {
            rows: &["+  ", "   "],
            units_per_col: 8.0,
            units_per_row: 10.0,
        };
        let offset = art.marker_offset().expect("marker");
        assert_eq!(offset, Vec2::new((0.5 - 1.5) * 8.0, (0.5 - 1.0) * 10.0));
    }

    #[test]
    fn markerless_art_reports_none() {
        let art = SpriteArt {
            rows: &["o", "|"],
            units_per_col: 8.0,
            units_per_row: 10.0,
        };
        assert_eq!(art.marker_offset(), None);
    }

    #[test]
    fn glyphs_skip_blanks_and_marker() {
        let drawn: Vec<char> = DIVER.glyphs().map(|(_, _, ch)| ch).collect();
        assert!(!drawn.contains(&' '));
        assert!(!drawn.contains(&MARKER_GLYPH));
        assert!(drawn.contains(&'o'));
    }

    #[test]
    fn mirroring_flips_directional_glyphs() {
        assert_eq!(mirror_glyph('<'), '>');
        assert_eq!(mirror_glyph(')'), '(');
        assert_eq!(mirror_glyph('o'), 'o');
    }
}
