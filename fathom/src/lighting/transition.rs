//! Darkness state machine and the time-eased transition between levels.
//!
//! Hysteresis is asymmetric on purpose. Losing sight of a zone's rectangle
//! never lightens anything (sticky darkness), so a sampling miss at a zone
//! edge cannot flicker the screen. Going darker is adopted immediately;
//! going lighter needs a confirmed sample inside the lighter zone. Ascending
//! is also half the speed of descending.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::lighting::sampler::SampleOutcome;
use crate::lighting::zone::{DarknessLevel, ZoneId};

// Transition tuneables:
// - DESCEND_RATE_MS/ASCEND_RATE_MS: ms per unit of darkness delta.
// - COMPLETION_EPSILON: close enough to snap to the target exactly.
// - EDGE_RAMP: fraction of progress linearly damped at each end.
pub const DESCEND_RATE_MS: f32 = 5000.0;
pub const ASCEND_RATE_MS: f32 = 10000.0;
const COMPLETION_EPSILON: f32 = 0.001;
const EDGE_RAMP: f32 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LightingState {
    pub current_level: f32,
    pub target_level: f32,
    pub current_zone: Option<ZoneId>,
    transition_start_ms: f64,
    transition_start_value: f32,
    transition_duration_ms: f32,
    transition_active: bool,
    pub prev_position: Vec2,
    pub last_check_ms: f64,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            current_level: 0.0,
            target_level: 0.0,
            current_zone: None,
            transition_start_ms: 0.0,
            transition_start_value: 0.0,
            transition_duration_ms: 0.0,
            transition_active: false,
            prev_position: Vec2::ZERO,
            // Any time comfortably before the first tick, so the first
            // standard-path check is never gated away.
            last_check_ms: -1000.0,
        }
    }
}

/// A target change, reported so the host can observe transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Retarget {
    pub zone: ZoneId,
    pub level: DarknessLevel,
    pub from: f32,
    pub to: f32,
    pub duration_ms: f32,
}

impl LightingState {
    pub fn transition_active(&self) -> bool {
        self.transition_active
    }

    /// Applies one sampler report. Returns the retarget when the sample
    /// changed where the darkness is heading.
    pub fn apply_sample(
        &mut self,
        outcome: &SampleOutcome,
        boost_ascent: bool,
        now_ms: f64,
    ) -> Option<Retarget> {
        // Skipped and Clear both leave the target alone: once a zone has
        // been entered its darkness lingers until another zone is confirmed.
        let SampleOutcome::Hit(hit) = outcome else {
            return None;
        };

        let mut candidate = (hit.zone, hit.level);
        if boost_ascent {
            // A rapid ascent takes the lightest band it touched, so the
            // diver is not left stuck at the deepest level of a column of
            // zones passed through in a few ticks.
            if let Some((zone, level)) = hit.lightest {
                if level.alpha() < self.target_level {
                    candidate = (zone, level);
                }
            }
        }

        let (zone, level) = candidate;
        if self.current_zone == Some(zone) && self.target_level == level.alpha() {
            return None;
        }

        Some(self.set_target(zone, level, now_ms))
    }

    /// Adopts a new zone and starts the eased transition toward its level.
    /// Duration scales with the distance to cover; darkening runs twice as
    /// fast as lightening.
    pub fn set_target(&mut self, zone: ZoneId, level: DarknessLevel, now_ms: f64) -> Retarget {
        let to = level.alpha().clamp(0.0, 1.0);
        let from = self.current_level;
        let rate = if to > from {
            DESCEND_RATE_MS
        } else {
            ASCEND_RATE_MS
        };
        let duration = (to - from).abs() * rate;

        self.current_zone = Some(zone);
        self.target_level = to;
        self.transition_start_ms = now_ms;
        self.transition_start_value = from;
        self.transition_duration_ms = duration;
        self.transition_active = (to - from).abs() >= COMPLETION_EPSILON;
        if !self.transition_active {
            self.current_level = to;
        }

        Retarget {
            zone,
            level,
            from,
            to,
            duration_ms: duration,
        }
    }

    /// Advances the displayed level toward the target. Time-based, so a
    /// frozen clock (pause) freezes the transition without drift.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        if !self.transition_active {
            return self.current_level;
        }

        let duration = self.transition_duration_ms;
        let progress = if duration <= 0.0 {
            1.0
        } else {
            (((now_ms - self.transition_start_ms) as f32) / duration).clamp(0.0, 1.0)
        };

        let eased = ease_smoothed(progress);
        let span = self.target_level - self.transition_start_value;
        let value = round3(self.transition_start_value + span * eased);
        self.current_level = value.clamp(0.0, 1.0);

        if progress >= 1.0 || (self.current_level - self.target_level).abs() < COMPLETION_EPSILON {
            self.current_level = self.target_level;
            self.transition_active = false;
        }

        self.current_level
    }
}

pub fn ease_cubic_in_out(progress: f32) -> f32 {
    if progress < 0.5 {
        4.0 * progress * progress * progress
    } else {
        1.0 - (-2.0 * progress + 2.0).powi(3) / 2.0
    }
}

/// Cubic ease-in-out with an extra linear ramp over the first and last 10%
/// of progress, taking the residual snap out of transition edges.
pub fn ease_smoothed(progress: f32) -> f32 {
    let progress = progress.clamp(0.0, 1.0);
    let eased = ease_cubic_in_out(progress);
    if progress < EDGE_RAMP {
        eased * (progress / EDGE_RAMP)
    } else if progress > 1.0 - EDGE_RAMP {
        let ramp = (1.0 - progress) / EDGE_RAMP;
        eased * ramp + (1.0 - ramp)
    } else {
        eased
    }
}

// Three decimals is below anything the overlay can show; rounding stops
// float noise from shimmering the composited alpha.
fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
