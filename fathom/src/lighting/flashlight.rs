//! Flashlight beam, projected from the diver's lamp in the facing direction.
//!
//! The beam is a mask over the darkness overlay: where the mask covers a
//! point, that point keeps its light. The default mask is a procedural cone;
//! authored glyph-grid masks can be swapped in by key. Facing is binary
//! (left or right), so the rotation is 0 or π and the mask is mirrored, not
//! freely rotated.

use std::f32::consts::PI;

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::sprite::SpriteArt;

pub const CONE_LENGTH: f32 = 260.0;
pub const CONE_HALF_WIDTH: f32 = 72.0;
// Beam spread at the lamp itself, as a fraction of the full half-width.
const CONE_THROAT: f32 = 0.08;
// Fraction of the beam length over which the far end fades out.
const CONE_FAR_FADE: f32 = 0.3;

/// Lamp offset used when the sprite art carries no marker glyph.
pub const FALLBACK_MARKER_OFFSET: Vec2 = Vec2::new(12.0, -8.0);

/// Pre-authored beam shape. Glyphs encode coverage: `#` full, `+` strong,
/// `.` weak, space none. The grid spans the cone's bounding region.
#[derive(Clone, Copy, Debug)]
pub struct MaskArt {
    pub key: &'static str,
    pub rows: &'static [&'static str],
}

const BEAM_WIDE: MaskArt = MaskArt {
    key: "beam-wide",
    rows: &[
        "      ..++..      ",
        "   ..++####++..   ",
        ".++######^####++. ",
        "   ..++####++..   ",
        "      ..++..      ",
    ],
};

const LANTERN: MaskArt = MaskArt {
    key: "lantern",
    rows: &[
        " .++. ",
        "+####+",
        "+####+",
        " .++. ",
    ],
};

const MASK_ARTS: &[MaskArt] = &[BEAM_WIDE, LANTERN];

pub fn mask_art(key: &str) -> Option<&'static MaskArt> {
    MASK_ARTS.iter().find(|art| art.key == key)
}

pub fn mask_keys() -> impl Iterator<Item = &'static str> {
    MASK_ARTS.iter().map(|art| art.key)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlashlightState {
    pub enabled: bool,
    /// 0 facing right, π facing left.
    pub rotation: f32,
    pub marker_offset: Option<Vec2>,
    pub mask_key: Option<String>,
    origin: Vec2,
}

impl FlashlightState {
    pub fn using_image_mask(&self) -> bool {
        self.mask_key.is_some()
    }

    pub fn beam_origin(&self) -> Vec2 {
        self.origin
    }

    /// Flips the flashlight. On the first enable the lamp offset is resolved
    /// from the sprite art and cached; a missing marker falls back to a
    /// fixed offset and never blocks the toggle.
    pub fn toggle(&mut self, custom_mask: Option<&str>, sprite: &SpriteArt) -> bool {
        if !self.enabled && self.marker_offset.is_none() {
            self.marker_offset = Some(sprite.marker_offset().unwrap_or_else(|| {
                warn!("sprite art has no lamp marker; using fallback offset");
                FALLBACK_MARKER_OFFSET
            }));
        }
        if let Some(key) = custom_mask {
            self.set_mask(key);
        }
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Selects an authored mask by key. Unknown keys keep the current mask.
    pub fn set_mask(&mut self, key: &str) -> bool {
        if mask_art(key).is_some() {
            self.mask_key = Some(key.to_string());
            true
        } else {
            warn!("unknown flashlight mask {key:?}; keeping current mask");
            false
        }
    }

    /// Re-anchors the beam to the entity for this frame.
    pub fn update(&mut self, entity_pos: Vec2, flipped: bool) {
        self.rotation = if flipped { PI } else { 0.0 };
        let offset = self.marker_offset.unwrap_or(FALLBACK_MARKER_OFFSET);
        let mirrored = if flipped {
            Vec2::new(-offset.x, offset.y)
        } else {
            offset
        };
        self.origin = entity_pos + mirrored;
    }

    /// Mask coverage at a world point in [0, 1]. Zero when disabled.
    pub fn lit_fraction(&self, point: Vec2) -> f32 {
        if !self.enabled {
            return 0.0;
        }

        let rel = point - self.origin;
        let direction = if self.rotation == 0.0 { 1.0 } else { -1.0 };
        let along = rel.x * direction;
        if along < 0.0 || along > CONE_LENGTH {
            return 0.0;
        }

        match self.mask_key.as_deref().and_then(mask_art) {
            Some(art) => sample_mask_art(art, along, rel.y),
            None => cone_fraction(along, rel.y),
        }
    }
}

fn cone_fraction(along: f32, lateral: f32) -> f32 {
    let reach = along / CONE_LENGTH;
    let allowed = CONE_HALF_WIDTH * reach.max(CONE_THROAT);
    let lateral = lateral.abs();
    if lateral > allowed {
        return 0.0;
    }

    let edge = lateral / allowed;
    let edge_fade = 1.0 - edge * edge;
    let distance_fade = if reach < 1.0 - CONE_FAR_FADE {
        1.0
    } else {
        (1.0 - reach) / CONE_FAR_FADE
    };
    (edge_fade * distance_fade).clamp(0.0, 1.0)
}

fn sample_mask_art(art: &MaskArt, along: f32, lateral: f32) -> f32 {
    let rows = art.rows.len();
    let cols = art.rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    if rows == 0 || cols == 0 {
        return 0.0;
    }

    let u = (along / CONE_LENGTH).clamp(0.0, 1.0);
    let v = (lateral + CONE_HALF_WIDTH) / (2.0 * CONE_HALF_WIDTH);
    if !(0.0..1.0).contains(&v) {
        return 0.0;
    }

    let col = ((u * cols as f32) as usize).min(cols - 1);
    let row = ((v * rows as f32) as usize).min(rows - 1);
    let glyph = art.rows[row].chars().nth(col).unwrap_or(' ');
    match glyph {
        ' ' => 0.0,
        '.' => 0.33,
        '+' => 0.66,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::DIVER;

    fn markerless() -> SpriteArt {
        SpriteArt {
            rows: &["o", "|"],
            units_per_col: 8.0,
            units_per_row: 10.0,
        }
    }

    #[test]
    fn toggle_pair_restores_prior_state() {
        let mut light = FlashlightState::default();
        let before_enabled = light.enabled;
        let before_mask = light.mask_key.clone();

        light.toggle(None, &DIVER);
        light.toggle(None, &DIVER);

        assert_eq!(light.enabled, before_enabled);
        assert_eq!(light.mask_key, before_mask);
    }

    #[test]
    fn first_enable_resolves_and_caches_marker_offset() {
        let mut light = FlashlightState::default();
        assert_eq!(light.marker_offset, None);
        light.toggle(None, &DIVER);
        let resolved = light.marker_offset.expect("cached");
        assert_eq!(resolved, DIVER.marker_offset().expect("diver marker"));

        // The cache survives later toggles.
        light.toggle(None, &DIVER);
        light.toggle(None, &DIVER);
        assert_eq!(light.marker_offset, Some(resolved));
    }

    #[test]
    fn missing_marker_falls_back_without_blocking() {
        let mut light = FlashlightState::default();
        let enabled = light.toggle(None, &markerless());
        assert!(enabled);
        assert_eq!(light.marker_offset, Some(FALLBACK_MARKER_OFFSET));
    }

    #[test]
    fn disabled_beam_lights_nothing() {
        let mut light = FlashlightState::default();
        light.update(Vec2::new(100.0, 100.0), false);
        assert_eq!(light.lit_fraction(Vec2::new(150.0, 100.0)), 0.0);
    }

    #[test]
    fn cone_covers_ahead_not_behind() {
        let mut light = FlashlightState::default();
        light.toggle(None, &DIVER);
        light.update(Vec2::new(100.0, 100.0), false);
        let origin = light.beam_origin();

        assert!(light.lit_fraction(origin + Vec2::new(80.0, 0.0)) > 0.5);
        assert_eq!(light.lit_fraction(origin + Vec2::new(-20.0, 0.0)), 0.0);
        assert_eq!(light.lit_fraction(origin + Vec2::new(CONE_LENGTH + 10.0, 0.0)), 0.0);
        // Wide of the beam at its own reach.
        assert_eq!(light.lit_fraction(origin + Vec2::new(80.0, 200.0)), 0.0);
    }

    #[test]
    fn facing_left_mirrors_the_beam() {
        let mut light = FlashlightState::default();
        light.toggle(None, &DIVER);
        light.update(Vec2::new(100.0, 100.0), true);
        let origin = light.beam_origin();

        assert!(light.lit_fraction(origin + Vec2::new(-80.0, 0.0)) > 0.5);
        assert_eq!(light.lit_fraction(origin + Vec2::new(80.0, 0.0)), 0.0);
        // Lamp offset mirrored to the left of the diver.
        assert!(origin.x < 100.0);
    }

    #[test]
    fn edge_of_cone_is_dimmer_than_center() {
        let mut light = FlashlightState::default();
        light.toggle(None, &DIVER);
        light.update(Vec2::ZERO, false);
        let origin = light.beam_origin();

        let center = light.lit_fraction(origin + Vec2::new(130.0, 0.0));
        let edge = light.lit_fraction(origin + Vec2::new(130.0, 30.0));
        assert!(center > edge);
        assert!(edge > 0.0);
    }

    #[test]
    fn unknown_mask_key_is_rejected_and_kept_out() {
        let mut light = FlashlightState::default();
        assert!(!light.set_mask("disco-ball"));
        assert_eq!(light.mask_key, None);
        assert!(!light.using_image_mask());

        assert!(light.set_mask("beam-wide"));
        assert!(light.using_image_mask());
        // A later bad key keeps the working mask.
        assert!(!light.set_mask("strobe"));
        assert_eq!(light.mask_key.as_deref(), Some("beam-wide"));
    }

    #[test]
    fn authored_mask_samples_its_glyph_grid() {
        let mut light = FlashlightState::default();
        light.toggle(Some("beam-wide"), &DIVER);
        light.update(Vec2::ZERO, false);
        let origin = light.beam_origin();

        // Mid-beam center row is full coverage in the art.
        let center = light.lit_fraction(origin + Vec2::new(CONE_LENGTH * 0.5, 0.0));
        assert_eq!(center, 1.0);
        // Outside the art's vertical span.
        assert_eq!(light.lit_fraction(origin + Vec2::new(CONE_LENGTH * 0.5, 200.0)), 0.0);
    }

    #[test]
    fn disabling_clears_the_mask_contribution() {
        let mut light = FlashlightState::default();
        light.toggle(None, &DIVER);
        light.update(Vec2::ZERO, false);
        let origin = light.beam_origin();
        let probe = origin + Vec2::new(60.0, 0.0);
        assert!(light.lit_fraction(probe) > 0.0);

        light.toggle(None, &DIVER);
        assert_eq!(light.lit_fraction(probe), 0.0);
    }
}
