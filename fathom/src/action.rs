use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::{Direction, LoadedLevel};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,
    LoadLevel,
    LevelLoaded(LoadedLevel),

    Swim(Direction, bool),
    Tick { delta_ms: f32 },
    ToggleFlashlight,
    CycleFlashlightMask,
    Resize(u16, u16),
    Restart,
    GameOver,

    PauseOpen,
    PauseClose,

    Quit,
}
