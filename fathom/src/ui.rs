use std::sync::OnceLock;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tide_map::core::TileKind;
use tide_map::render::{
    Camera, MapRenderResult, MapRenderer, RenderConfig, TextureVariant, TilePalette, TileTheme,
    adjust_color,
};

use crate::lighting::composite_darkness;
use crate::sprite::{DIVER, mirror_glyph};
use crate::state::{AppState, GameMode, PlayerState, TILE_SIZE};

const BG: Color = Color::Rgb(6, 18, 34);
const FG: Color = Color::Rgb(214, 226, 238);
const MUTED: Color = Color::Rgb(128, 142, 158);
const ACCENT: Color = Color::Rgb(120, 214, 255);
const WARNING: Color = Color::Rgb(226, 120, 88);
const DIVER_SUIT: Color = Color::Rgb(238, 206, 92);
const DIVER_GLASS: Color = Color::Rgb(186, 232, 248);
const LAMP_GLOW: Color = Color::Rgb(255, 244, 190);

const CELL_ASPECT: f32 = 2.0;
const MAP_TILES_V: u16 = 10;
// Oxygen gauge width in segments and the ratio where it turns urgent.
const GAUGE_SEGMENTS: usize = 20;
const GAUGE_WARN_RATIO: f32 = 0.25;

static MAP_RENDERER: OnceLock<MapRenderer> = OnceLock::new();

fn map_renderer() -> &'static MapRenderer {
    MAP_RENDERER.get_or_init(|| {
        MapRenderer::builder()
            .config(RenderConfig {
                map_tiles_vertical_hint: MAP_TILES_V,
                cell_aspect: CELL_ASPECT,
            })
            .theme(fathom_map_theme())
            .build()
    })
}

fn fathom_map_theme() -> TileTheme {
    let water_base = Color::Rgb(10, 44, 92);
    let sand_base = Color::Rgb(118, 104, 72);
    let kelp_base = Color::Rgb(30, 92, 58);
    let rock_base = Color::Rgb(26, 28, 34);
    let air_base = Color::Rgb(66, 120, 160);

    let water = TilePalette::new(
        water_base,
        adjust_color(water_base, 5),
        [
            TextureVariant::new('~', adjust_color(water_base, 44), 9),
            TextureVariant::new('-', adjust_color(water_base, 28), 11),
            TextureVariant::new(' ', adjust_color(water_base, 12), 4),
        ],
    );
    let sand = TilePalette::new(
        sand_base,
        adjust_color(sand_base, 7),
        [
            TextureVariant::new('.', adjust_color(sand_base, 40), 8),
            TextureVariant::new(',', adjust_color(sand_base, 26), 9),
            TextureVariant::new('`', adjust_color(sand_base, 14), 11),
        ],
    );
    let kelp = TilePalette::new(
        kelp_base,
        adjust_color(kelp_base, 6),
        [
            TextureVariant::new('"', adjust_color(kelp_base, 52), 6),
            TextureVariant::new(')', adjust_color(kelp_base, 34), 8),
            TextureVariant::new('\'', adjust_color(kelp_base, 18), 10),
        ],
    );
    let rock = TilePalette::new(
        rock_base,
        adjust_color(rock_base, 4),
        [
            TextureVariant::new('#', adjust_color(rock_base, 110), 5),
            TextureVariant::new('%', adjust_color(rock_base, 80), 7),
            TextureVariant::new('.', adjust_color(rock_base, 52), 9),
        ],
    );
    let air = TilePalette::new(
        air_base,
        adjust_color(air_base, 10),
        [
            TextureVariant::new('o', adjust_color(air_base, 72), 4),
            TextureVariant::new('O', adjust_color(air_base, 52), 6),
            TextureVariant::new('.', adjust_color(air_base, 30), 7),
        ],
    );

    TileTheme::builder()
        .fallback(water)
        .tile(TileKind::Water, water)
        .tile(TileKind::Sand, sand)
        .tile(TileKind::Kelp, kelp)
        .tile(TileKind::Rock, rock)
        .tile(TileKind::AirPocket, air)
        .build()
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let footer_height = if state.debug { 5 } else { 4 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(footer_height)])
        .split(area);

    let title = format!("Fathom  Depth {}", state.level_index + 1);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(BG).fg(FG));
    let map_inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);
    render_map(frame, map_inner, state);

    let status = state
        .last_status
        .clone()
        .unwrap_or_else(|| "Stay close to the air pockets.".to_string());

    let oxygen_ratio = if state.player.oxygen_max > 0.0 {
        (state.player.oxygen_current / state.player.oxygen_max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge_color = if oxygen_ratio < GAUGE_WARN_RATIO {
        WARNING
    } else {
        ACCENT
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("Air {} ", oxygen_gauge(oxygen_ratio)),
                Style::default().fg(gauge_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:>3.0}%  ", oxygen_ratio * 100.0),
                Style::default().fg(gauge_color),
            ),
            Span::styled(
                format!(
                    "Pos ({:.0}, {:.0})",
                    state.player.pos.x, state.player.pos.y
                ),
                Style::default().fg(MUTED),
            ),
        ]),
        Line::from(Span::styled(status, Style::default().fg(FG))),
        Line::from(Span::styled(
            controls_line(state.mode),
            Style::default().fg(MUTED),
        )),
    ];
    if state.debug {
        lines.push(Line::from(Span::styled(
            debug_line(state),
            Style::default().fg(MUTED),
        )));
    }

    let footer = Paragraph::new(lines).alignment(Alignment::Left);
    frame.render_widget(footer, chunks[1]);
}

fn controls_line(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Diving => {
            "Swim: WASD/arrows  Boost: Shift+swim  Lamp: F  Mask: M  Pause: Esc  Quit: Q"
        }
        GameMode::Pause => "Paused: Esc to resume  Quit: Q",
        GameMode::GameOver => "The sea keeps its own: R restart  Quit: Q",
        GameMode::Boot => "Flooding the cave...",
    }
}

fn debug_line(state: &AppState) -> String {
    let snapshot = state.lighting.debug_snapshot();
    format!(
        "zone={:?} level={:.3}->{:.3} zones={} lights={} beam={} view={}x{}",
        snapshot.current_zone,
        snapshot.current_level,
        snapshot.target_level,
        snapshot.zone_count,
        snapshot.light_count,
        if snapshot.flashlight_on { "on" } else { "off" },
        snapshot.viewport.0,
        snapshot.viewport.1,
    )
}

fn oxygen_gauge(ratio: f32) -> String {
    let filled = (ratio * GAUGE_SEGMENTS as f32).round() as usize;
    let mut gauge = String::with_capacity(GAUGE_SEGMENTS + 2);
    gauge.push('[');
    for idx in 0..GAUGE_SEGMENTS {
        gauge.push(if idx < filled { '█' } else { '·' });
    }
    gauge.push(']');
    gauge
}

fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    if area.width < 8 || area.height < 4 {
        let warning = Paragraph::new("Resize for the dive view.")
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(warning, area);
        return;
    }

    let (focus_x, focus_y) = state.player.tile_pos();
    let render = map_renderer().render_base(
        frame,
        area,
        &state.map,
        Camera { focus_x, focus_y },
    );

    if render.view_tiles_h == 0 || render.view_tiles_v == 0 {
        return;
    }

    let buf = frame.buffer_mut();
    draw_point_light_markers(buf, render, state);
    draw_diver(buf, render, &state.player);

    // The darkness overlay composites last; everything above is world.
    composite_darkness(buf, &render, TILE_SIZE, &state.lighting.overlay_input());

    // Keep a visible core even in pitch black, so the player never loses
    // the diver entirely.
    if let Some((cx, cy)) = render.world_to_cell(state.player.pos.x, state.player.pos.y, TILE_SIZE)
    {
        if let Some(cell) = buf.cell_mut((cx, cy)) {
            cell.set_char('o').set_fg(DIVER_GLASS);
        }
    }

    if state.lighting.flashlight.enabled {
        let origin = state.lighting.flashlight.beam_origin();
        if let Some((cx, cy)) = render.world_to_cell(origin.x, origin.y, TILE_SIZE) {
            if let Some(cell) = buf.cell_mut((cx, cy)) {
                cell.set_char('•').set_fg(LAMP_GLOW);
            }
        }
    }
}

fn draw_point_light_markers(buf: &mut Buffer, render: MapRenderResult, state: &AppState) {
    for light in state.lighting.lights() {
        let Some((cx, cy)) = render.world_to_cell(light.position.x, light.position.y, TILE_SIZE)
        else {
            continue;
        };
        if let Some(cell) = buf.cell_mut((cx, cy)) {
            let (r, g, b) = light.color;
            cell.set_char('*').set_fg(Color::Rgb(r, g, b));
        }
    }
}

fn draw_diver(buf: &mut Buffer, render: MapRenderResult, player: &PlayerState) {
    let Some((center_x, center_y)) = render.world_to_cell(player.pos.x, player.pos.y, TILE_SIZE)
    else {
        return;
    };

    let cols = DIVER.cols() as i32;
    let rows = DIVER.row_count() as i32;

    for (col, row, glyph) in DIVER.glyphs() {
        let col = if player.flipped {
            cols - 1 - col as i32
        } else {
            col as i32
        };
        let dx = col - cols / 2;
        let dy = row as i32 - rows / 2;

        let x = center_x as i32 + dx;
        let y = center_y as i32 + dy;
        if x < 0 || y < 0 {
            continue;
        }

        let glyph = if player.flipped { mirror_glyph(glyph) } else { glyph };
        let color = if glyph == 'o' { DIVER_GLASS } else { DIVER_SUIT };
        if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
            cell.set_char(glyph).set_fg(color);
        }
    }
}
