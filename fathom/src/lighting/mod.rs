//! Zone-driven darkness, eased level transitions, and the flashlight beam.
//!
//! The host feeds this module parsed map geometry once per level and a
//! position sample every tick; it keeps every per-frame computation pure and
//! hands the overlay compositor one number plus a mask. Nothing in here
//! subscribes to events or reaches into the scene: the host adapts.

pub mod flashlight;
pub mod overlay;
pub mod sampler;
pub mod transition;
pub mod zone;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::sprite::SpriteArt;

pub use flashlight::FlashlightState;
pub use overlay::{composite_darkness, OverlayInput};
pub use transition::LightingState;
pub use zone::{build_lights, DarknessLevel, PointLight, RawObject, ZoneId, ZoneMap};

/// Read-only position feed the host adapts its entity to. The lighting core
/// never inspects the entity beyond these three values.
pub trait PositionProvider {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn flipped(&self) -> bool;
}

/// Host rendering capabilities, declared once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LightingCaps {
    pub rgb_colors: bool,
}

impl Default for LightingCaps {
    fn default() -> Self {
        Self { rgb_colors: true }
    }
}

/// Structured observations for whoever wants them (debug HUD, logs, tests).
/// The core computes; observers render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum LightingEvent {
    ZoneEntered {
        zone: ZoneId,
        level: DarknessLevel,
    },
    TransitionStarted {
        from: f32,
        to: f32,
        duration_ms: f32,
    },
    FlashlightToggled {
        enabled: bool,
    },
    DataFault {
        message: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LightingDebug {
    pub current_zone: Option<ZoneId>,
    pub current_level: f32,
    pub target_level: f32,
    pub zone_count: usize,
    pub light_count: usize,
    pub flashlight_on: bool,
    pub viewport: (u16, u16),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Lighting {
    zones: ZoneMap,
    lights: Vec<PointLight>,
    pub state: LightingState,
    pub flashlight: FlashlightState,
    caps: LightingCaps,
    viewport: (u16, u16),
    events: Vec<LightingEvent>,
}

impl Lighting {
    pub fn new(caps: LightingCaps) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    /// One-time zone ingestion for a freshly loaded level.
    pub fn process_zones(&mut self, raw: &[RawObject]) {
        let mut faults = Vec::new();
        self.zones = ZoneMap::build(raw, &mut faults);
        self.push_faults(faults);
    }

    /// One-time point-light ingestion for a freshly loaded level.
    pub fn process_lights(&mut self, raw: &[RawObject]) {
        let mut faults = Vec::new();
        self.lights = build_lights(raw, &mut faults);
        self.push_faults(faults);
    }

    /// Advances one frame: sample the path since the previous tick, let the
    /// state machine react, ease the displayed level, re-anchor the beam.
    /// Never panics; a frame that produces nothing new holds previous values.
    pub fn update(&mut self, entity: &impl PositionProvider, now_ms: f64) -> f32 {
        let curr = entity.position();
        let velocity = entity.velocity();
        let prev = self.state.prev_position;

        let outcome = sampler::sample(
            prev,
            curr,
            velocity,
            now_ms,
            self.state.last_check_ms,
            &self.zones,
        );
        if outcome.was_sampled() {
            self.state.last_check_ms = now_ms;
        }

        let ascent = sampler::is_boost_ascent(velocity);
        if let Some(retarget) = self.state.apply_sample(&outcome, ascent, now_ms) {
            self.events.push(LightingEvent::ZoneEntered {
                zone: retarget.zone,
                level: retarget.level,
            });
            self.events.push(LightingEvent::TransitionStarted {
                from: retarget.from,
                to: retarget.to,
                duration_ms: retarget.duration_ms,
            });
        }

        self.state.prev_position = curr;
        let level = self.state.advance(now_ms);
        self.flashlight.update(curr, entity.flipped());
        level
    }

    pub fn toggle_flashlight(&mut self, custom_mask: Option<&str>, sprite: &SpriteArt) -> bool {
        let enabled = self.flashlight.toggle(custom_mask, sprite);
        self.events.push(LightingEvent::FlashlightToggled { enabled });
        enabled
    }

    pub fn set_flashlight_mask(&mut self, key: &str) -> bool {
        let accepted = self.flashlight.set_mask(key);
        if !accepted {
            self.events.push(LightingEvent::DataFault {
                message: format!("unknown flashlight mask {key:?}"),
            });
        }
        accepted
    }

    /// Records the viewport so beam scaling and introspection stay in step
    /// with the terminal size.
    pub fn handle_resize(&mut self, cols: u16, rows: u16) {
        self.viewport = (cols, rows);
    }

    pub fn overlay_input(&self) -> OverlayInput<'_> {
        OverlayInput {
            darkness: self.state.current_level,
            flashlight: &self.flashlight,
            lights: &self.lights,
            rgb_capable: self.caps.rgb_colors,
        }
    }

    pub fn current_level(&self) -> f32 {
        self.state.current_level
    }

    pub fn target_level(&self) -> f32 {
        self.state.target_level
    }

    pub fn current_zone(&self) -> Option<ZoneId> {
        self.state.current_zone
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn debug_snapshot(&self) -> LightingDebug {
        LightingDebug {
            current_zone: self.state.current_zone,
            current_level: self.state.current_level,
            target_level: self.state.target_level,
            zone_count: self.zones.len(),
            light_count: self.lights.len(),
            flashlight_on: self.flashlight.enabled,
            viewport: self.viewport,
        }
    }

    /// Drains queued observations. Observers decide what to do with them.
    pub fn take_events(&mut self) -> Vec<LightingEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_faults(&mut self, faults: Vec<String>) {
        self.events
            .extend(faults.into_iter().map(|message| LightingEvent::DataFault { message }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Probe {
        position: Vec2,
        velocity: Vec2,
        flipped: bool,
    }

    impl PositionProvider for Probe {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn velocity(&self) -> Vec2 {
            self.velocity
        }

        fn flipped(&self) -> bool {
            self.flipped
        }
    }

    fn zone(name: &str, x: f32, y: f32, w: f32, h: f32) -> RawObject {
        RawObject {
            name: name.to_string(),
            x,
            y,
            width: w,
            height: h,
            properties: Vec::new(),
        }
    }

    #[test]
    fn update_flow_enters_zones_and_reports_events() {
        let mut lighting = Lighting::new(LightingCaps::default());
        lighting.process_zones(&[zone("dark", 0.0, 0.0, 100.0, 100.0)]);
        lighting.take_events();

        let probe = Probe {
            position: Vec2::new(50.0, 50.0),
            velocity: Vec2::new(40.0, 0.0),
            flipped: false,
        };
        lighting.update(&probe, 0.0);

        assert_eq!(lighting.current_zone(), Some(0));
        assert_eq!(lighting.target_level(), 0.7);

        let events = lighting.take_events();
        assert!(events.iter().any(|event| matches!(
            event,
            LightingEvent::ZoneEntered {
                level: DarknessLevel::Dark,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|event| matches!(event, LightingEvent::TransitionStarted { .. })));
    }

    #[test]
    fn zone_identity_sticks_after_leaving_the_rectangle() {
        let mut lighting = Lighting::new(LightingCaps::default());
        lighting.process_zones(&[zone("dark", 0.0, 0.0, 100.0, 100.0)]);

        let inside = Probe {
            position: Vec2::new(50.0, 50.0),
            velocity: Vec2::ZERO,
            flipped: false,
        };
        lighting.update(&inside, 0.0);
        assert_eq!(lighting.current_zone(), Some(0));

        let outside = Probe {
            position: Vec2::new(500.0, 500.0),
            velocity: Vec2::new(50.0, 0.0),
            flipped: false,
        };
        for step in 1..30 {
            lighting.update(&outside, step as f64 * 150.0);
        }
        assert_eq!(lighting.current_zone(), Some(0));
        assert_eq!(lighting.target_level(), 0.7);
    }

    #[test]
    fn ingest_faults_become_events() {
        let mut lighting = Lighting::new(LightingCaps::default());
        lighting.process_zones(&[]);
        let events = lighting.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LightingEvent::DataFault { .. }));
    }

    #[test]
    fn resize_is_reflected_in_the_snapshot() {
        let mut lighting = Lighting::new(LightingCaps::default());
        lighting.handle_resize(120, 40);
        let snapshot = lighting.debug_snapshot();
        assert_eq!(snapshot.viewport, (120, 40));
        assert_eq!(snapshot.zone_count, 0);
    }
}
