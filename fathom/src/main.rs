mod action;
mod effect;
mod geom;
mod level;
mod lighting;
mod reducer;
mod sprite;
mod state;
mod ui;

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tui_dispatch::EffectStore;

use crate::action::Action;
use crate::effect::Effect;
use crate::lighting::LightingCaps;
use crate::state::{AppState, Direction, GameMode};

#[derive(Parser, Debug)]
#[command(name = "fathom")]
#[command(about = "Survival diving in a drowned cave system")]
struct Args {
    /// Level to dive, starting at 1.
    #[arg(long, default_value_t = 1)]
    level: u32,

    /// Show the lighting introspection line in the HUD.
    #[arg(long)]
    debug: bool,

    /// Declare the terminal incapable of RGB color; point lights are
    /// skipped, zone darkness and the lamp still work.
    #[arg(long)]
    no_rgb: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &args);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, args: &Args) -> io::Result<()> {
    let caps = LightingCaps {
        rgb_colors: !args.no_rgb,
    };
    let level_index = args.level.saturating_sub(1);
    let mut store = EffectStore::new(AppState::new(level_index, caps, args.debug), reducer::reducer);
    dispatch_action(&mut store, Action::Init);

    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|frame| ui::render(frame, frame.area(), store.state()))?;

        if event::poll(Duration::from_millis(33))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if handle_key(key.code, key.modifiers, &mut store) {
                        break;
                    }
                }
                Event::Resize(cols, rows) => {
                    dispatch_action(&mut store, Action::Resize(cols, rows));
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let delta_ms = now.duration_since(last_tick).as_secs_f32() * 1000.0;
        last_tick = now;
        dispatch_action(&mut store, Action::Tick { delta_ms });
    }

    Ok(())
}

fn handle_key(
    code: KeyCode,
    modifiers: KeyModifiers,
    store: &mut EffectStore<AppState, Action, Effect>,
) -> bool {
    let mode = store.state().mode;
    let boost = modifiers.contains(KeyModifiers::SHIFT);

    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Esc => {
            if mode == GameMode::Pause {
                dispatch_action(store, Action::PauseClose);
            } else {
                dispatch_action(store, Action::PauseOpen);
            }
            false
        }
        KeyCode::Char('r') | KeyCode::Char('R') if mode == GameMode::GameOver => {
            dispatch_action(store, Action::Restart);
            false
        }
        KeyCode::Char('f') | KeyCode::Char('F') if mode == GameMode::Diving => {
            dispatch_action(store, Action::ToggleFlashlight);
            false
        }
        KeyCode::Char('m') | KeyCode::Char('M') if mode == GameMode::Diving => {
            dispatch_action(store, Action::CycleFlashlightMask);
            false
        }
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') if mode == GameMode::Diving => {
            dispatch_action(store, Action::Swim(Direction::Up, boost));
            false
        }
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') if mode == GameMode::Diving => {
            dispatch_action(store, Action::Swim(Direction::Down, boost));
            false
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') if mode == GameMode::Diving => {
            dispatch_action(store, Action::Swim(Direction::Left, boost));
            false
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') if mode == GameMode::Diving => {
            dispatch_action(store, Action::Swim(Direction::Right, boost));
            false
        }
        _ => false,
    }
}

fn dispatch_action(store: &mut EffectStore<AppState, Action, Effect>, action: Action) {
    let mut queue = VecDeque::from([action]);

    while let Some(next_action) = queue.pop_front() {
        let result = store.dispatch(next_action);
        for effect in result.effects {
            handle_effect(store, effect, &mut queue);
        }
    }
}

fn handle_effect(
    store: &mut EffectStore<AppState, Action, Effect>,
    effect: Effect,
    queue: &mut VecDeque<Action>,
) {
    match effect {
        Effect::LoadLevel { index } => match level::load_level(index) {
            Ok(loaded) => queue.push_back(Action::LevelLoaded(loaded)),
            Err(err) => {
                let state = store.state_mut();
                state.mode = GameMode::GameOver;
                state.last_status = Some(format!("The cave refuses entry: {err}"));
            }
        },
    }
}
