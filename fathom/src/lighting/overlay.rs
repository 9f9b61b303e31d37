//! Darkness overlay compositing.
//!
//! The overlay is the one piece of the lighting system that touches the
//! terminal buffer. Everything before it computes plain numbers; this pass
//! takes the interpolated darkness level, carves out the flashlight beam and
//! any point lights, and scales the already-rendered cell colors in place.

use ratatui::{buffer::Buffer, style::Color};
use tide_map::render::MapRenderResult;

use crate::geom::Vec2;
use crate::lighting::flashlight::FlashlightState;
use crate::lighting::zone::PointLight;

// Transfer curve from light factor to color scale, and the floor below
// which a cell is blacked out entirely.
const GAMMA: f32 = 0.85;
const BLACKOUT: f32 = 0.02;
// How strongly a point light tints the cells it reaches.
const LIGHT_TINT: f32 = 0.35;
const LIGHT_FALLOFF: f32 = 1.4;

pub struct OverlayInput<'a> {
    /// Interpolated darkness level, 0 (clear water) to 1 (lightless).
    pub darkness: f32,
    pub flashlight: &'a FlashlightState,
    pub lights: &'a [PointLight],
    /// Point lights need RGB color support in the host terminal; without it
    /// they are skipped and zone darkness still works.
    pub rgb_capable: bool,
}

pub fn composite_darkness(
    buf: &mut Buffer,
    render: &MapRenderResult,
    tile_size: f32,
    input: &OverlayInput<'_>,
) {
    let darkness = input.darkness.clamp(0.0, 1.0);
    if darkness <= 0.0 {
        return;
    }

    let width = render.view_tiles_h * render.cols_per_tile;
    let height = render.view_tiles_v * render.rows_per_tile;

    for dy in 0..height {
        for dx in 0..width {
            let cell_x = render.origin_x + dx;
            let cell_y = render.origin_y + dy;
            let Some((wx, wy)) = render.cell_center_world(cell_x, cell_y, tile_size) else {
                continue;
            };
            let world = Vec2::new(wx, wy);

            let mut lift = input.flashlight.lit_fraction(world);
            let mut tint: Option<(u8, u8, u8)> = None;
            if input.rgb_capable {
                for light in input.lights {
                    let glow = point_light_lift(light, world);
                    if glow > lift {
                        lift = glow;
                        tint = Some(light.color);
                    }
                }
            }

            let effective = darkness * (1.0 - lift.clamp(0.0, 1.0));
            let scale = (1.0 - effective).powf(GAMMA);
            if scale >= 1.0 {
                continue;
            }

            if let Some(cell) = buf.cell_mut((cell_x, cell_y)) {
                if scale <= BLACKOUT {
                    let black = Color::Rgb(0, 0, 0);
                    cell.set_char(' ').set_fg(black).set_bg(black);
                } else {
                    let fg = scale_color(cell.fg, scale);
                    let bg = scale_color(cell.bg, scale);
                    match tint {
                        Some(color) => {
                            cell.set_fg(mix_toward(fg, color, lift * LIGHT_TINT));
                            cell.set_bg(mix_toward(bg, color, lift * LIGHT_TINT));
                        }
                        None => {
                            cell.set_fg(fg);
                            cell.set_bg(bg);
                        }
                    }
                }
            }
        }
    }
}

fn point_light_lift(light: &PointLight, world: Vec2) -> f32 {
    if light.radius <= 0.0 {
        return 0.0;
    }
    let distance = light.position.distance_to(world);
    if distance >= light.radius {
        return 0.0;
    }
    let t = 1.0 - distance / light.radius;
    (light.intensity * t.powf(LIGHT_FALLOFF)).clamp(0.0, 1.0)
}

fn scale_color(color: Color, scale: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let s = scale.clamp(0.0, 1.0);
            Color::Rgb(
                (r as f32 * s).round() as u8,
                (g as f32 * s).round() as u8,
                (b as f32 * s).round() as u8,
            )
        }
        other => other,
    }
}

fn mix_toward(color: Color, target: (u8, u8, u8), amount: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let t = amount.clamp(0.0, 1.0);
            let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * t).round() as u8;
            Color::Rgb(mix(r, target.0), mix(g, target.1), mix(b, target.2))
        }
        other => other,
    }
}
