use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::geom::Vec2;
use crate::lighting::sampler::BOOST_SPEED;
use crate::lighting::LightingEvent;
use crate::sprite::DIVER;
use crate::state::{AppState, Direction, GameMode};

// Swim/oxygen tunables:
// - SWIM_IMPULSE/BOOST_IMPULSE: velocity kick per stroke, units/s.
// - MAX_SPEED: hard cap on diver speed.
// - DRAG_PER_SECOND: exponential water drag.
// - OXYGEN_DRAIN/OXYGEN_DRAIN_BOOST: air burned per second of swimming.
// - POCKET_REFILL: air recovered per second inside an air pocket.
const SWIM_IMPULSE: f32 = 180.0;
const BOOST_IMPULSE: f32 = 620.0;
const MAX_SPEED: f32 = 800.0;
const DRAG_PER_SECOND: f32 = 2.2;
const OXYGEN_DRAIN: f32 = 1.0;
const OXYGEN_DRAIN_BOOST: f32 = 2.5;
const POCKET_REFILL: f32 = 25.0;
// A hitching frame should not integrate a quarter second of physics at once.
const MAX_TICK_MS: f32 = 250.0;
const FACING_EPSILON: f32 = 5.0;

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init | Action::LoadLevel => {
            state.mode = GameMode::Boot;
            DispatchResult::changed_with(Effect::LoadLevel {
                index: state.level_index,
            })
        }
        Action::LevelLoaded(level) => {
            state.game_time_ms = 0.0;
            state.apply_loaded_level(level);
            DispatchResult::changed()
        }
        Action::Swim(direction, boost) => handle_swim(state, direction, boost),
        Action::Tick { delta_ms } => handle_tick(state, delta_ms),
        Action::ToggleFlashlight => {
            if state.mode != GameMode::Diving {
                return DispatchResult::unchanged();
            }
            let enabled = state.lighting.toggle_flashlight(None, &DIVER);
            state.last_status = Some(if enabled {
                "Lamp on.".to_string()
            } else {
                "Lamp off.".to_string()
            });
            DispatchResult::changed()
        }
        Action::CycleFlashlightMask => {
            if state.mode != GameMode::Diving {
                return DispatchResult::unchanged();
            }
            cycle_mask(state);
            DispatchResult::changed()
        }
        Action::Resize(cols, rows) => {
            state.lighting.handle_resize(cols, rows);
            DispatchResult::changed()
        }
        Action::Restart => {
            state.mode = GameMode::Boot;
            DispatchResult::changed_with(Effect::LoadLevel {
                index: state.level_index,
            })
        }
        Action::GameOver => {
            set_game_over(state, "The dive ends here.");
            DispatchResult::changed()
        }
        Action::PauseOpen => {
            if state.mode == GameMode::Diving {
                state.mode = GameMode::Pause;
                return DispatchResult::changed();
            }
            DispatchResult::unchanged()
        }
        Action::PauseClose => {
            if state.mode == GameMode::Pause {
                state.mode = GameMode::Diving;
                return DispatchResult::changed();
            }
            DispatchResult::unchanged()
        }
        Action::Quit => DispatchResult::unchanged(),
    }
}

fn handle_swim(state: &mut AppState, direction: Direction, boost: bool) -> DispatchResult<Effect> {
    if state.mode != GameMode::Diving {
        return DispatchResult::unchanged();
    }

    let impulse = if boost { BOOST_IMPULSE } else { SWIM_IMPULSE };
    let kick = match direction {
        Direction::Up => Vec2::new(0.0, -impulse),
        Direction::Down => Vec2::new(0.0, impulse),
        Direction::Left => Vec2::new(-impulse, 0.0),
        Direction::Right => Vec2::new(impulse, 0.0),
    };

    let mut vel = state.player.vel + kick;
    let speed = vel.length();
    if speed > MAX_SPEED {
        vel = vel * (MAX_SPEED / speed);
    }
    state.player.vel = vel;

    match direction {
        Direction::Left => state.player.flipped = true,
        Direction::Right => state.player.flipped = false,
        _ => {}
    }

    DispatchResult::changed()
}

fn handle_tick(state: &mut AppState, delta_ms: f32) -> DispatchResult<Effect> {
    if state.mode != GameMode::Diving {
        // Paused (or not yet diving): the clock does not advance, so any
        // running darkness transition freezes with it.
        return DispatchResult::unchanged();
    }

    let delta_ms = delta_ms.clamp(0.0, MAX_TICK_MS);
    let dt = delta_ms / 1000.0;
    state.game_time_ms += delta_ms as f64;

    // Oxygen reads the stroke velocity before drag bleeds it off.
    update_oxygen(state, dt);
    if state.mode == GameMode::GameOver {
        return DispatchResult::changed();
    }
    integrate_motion(state, dt);

    let now = state.game_time_ms;
    let sample = state.player.clone();
    state.lighting.update(&sample, now);
    report_lighting_events(state);

    DispatchResult::changed()
}

/// Axis-separated integration: a blocked axis stops, the other keeps going,
/// so the diver slides along rock faces.
fn integrate_motion(state: &mut AppState, dt: f32) {
    let player = &mut state.player;

    let next_x = Vec2::new(player.pos.x + player.vel.x * dt, player.pos.y);
    if state.map.solid_at_world(next_x) {
        player.vel.x = 0.0;
    } else {
        player.pos.x = next_x.x;
    }

    let next_y = Vec2::new(player.pos.x, player.pos.y + player.vel.y * dt);
    if state.map.solid_at_world(next_y) {
        player.vel.y = 0.0;
    } else {
        player.pos.y = next_y.y;
    }

    let drag = (-DRAG_PER_SECOND * dt).exp();
    player.vel = player.vel * drag;
    if player.vel.length() < 1.0 {
        player.vel = Vec2::ZERO;
    }

    if player.vel.x > FACING_EPSILON {
        player.flipped = false;
    } else if player.vel.x < -FACING_EPSILON {
        player.flipped = true;
    }
}

fn update_oxygen(state: &mut AppState, dt: f32) {
    if state.in_air_pocket() {
        state.player.oxygen_current =
            (state.player.oxygen_current + POCKET_REFILL * dt).min(state.player.oxygen_max);
        return;
    }

    let drain = if state.player.vel.length() > BOOST_SPEED {
        OXYGEN_DRAIN_BOOST
    } else {
        OXYGEN_DRAIN
    };
    state.player.oxygen_current -= drain * dt;

    if state.player.oxygen_current <= 0.0 {
        state.player.oxygen_current = 0.0;
        set_game_over(state, "Out of air.");
    }
}

fn report_lighting_events(state: &mut AppState) {
    for event in state.lighting.take_events() {
        match event {
            LightingEvent::TransitionStarted { from, to, .. } => {
                state.last_status = Some(if to > from {
                    "The water darkens.".to_string()
                } else {
                    "Light filters down from above.".to_string()
                });
            }
            LightingEvent::DataFault { message } if state.debug => {
                state.last_status = Some(message);
            }
            _ => {}
        }
    }
}

fn cycle_mask(state: &mut AppState) {
    use crate::lighting::flashlight::mask_keys;

    let keys: Vec<&str> = mask_keys().collect();
    let next = match state.lighting.flashlight.mask_key.as_deref() {
        None => keys.first().copied(),
        Some(current) => match keys.iter().position(|key| *key == current) {
            Some(idx) if idx + 1 < keys.len() => Some(keys[idx + 1]),
            _ => None,
        },
    };

    match next {
        Some(key) => {
            state.lighting.set_flashlight_mask(key);
            state.last_status = Some(format!("Beam mask: {key}."));
        }
        None => {
            state.lighting.flashlight.mask_key = None;
            state.last_status = Some("Beam mask: cone.".to_string());
        }
    }
}

fn set_game_over(state: &mut AppState, message: &str) {
    state.mode = GameMode::GameOver;
    state.last_status = Some(message.to_string());
}
