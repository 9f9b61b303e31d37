//! Zone sampling along the diver's path.
//!
//! A fast diver can cross a thin darkness band entirely between two ticks, so
//! single-point containment checks pop zones in and out. While movement is
//! classified as boosting, the segment between the previous and current
//! position is oversampled, with parallel rails offset to either side to
//! catch zones a centerline would shave past.

use crate::geom::Vec2;
use crate::lighting::zone::{DarknessLevel, ZoneId, ZoneMap};

// Sampling tuneables:
// - BOOST_SPEED/AXIS_DOMINANCE: what counts as boosting along one axis.
// - FAST_PATH_DISTANCE: minimum per-tick travel before path sampling pays.
// - SEGMENT_STEP/MIN_SEGMENTS: sample density along the movement segment.
// - LATERAL_OFFSETS: parallel rail distances, perpendicular to travel.
// - CHECK_INTERVAL_MS/MOVE_EPSILON: standard-path gate between full checks.
pub const BOOST_SPEED: f32 = 500.0;
const AXIS_DOMINANCE: f32 = 0.7;
const FAST_PATH_DISTANCE: f32 = 50.0;
const SEGMENT_STEP: f32 = 30.0;
const MIN_SEGMENTS: u32 = 5;
const LATERAL_OFFSETS: [f32; 2] = [40.0, 80.0];
const CHECK_INTERVAL_MS: f64 = 100.0;
const MOVE_EPSILON: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoostAxis {
    Horizontal,
    Vertical,
}

/// Axis of travel when the diver is boosting, `None` otherwise. Boosting
/// means real speed with one axis clearly dominant.
pub fn boost_axis(velocity: Vec2) -> Option<BoostAxis> {
    let speed = velocity.length();
    if speed <= BOOST_SPEED {
        return None;
    }
    if velocity.x.abs() > speed * AXIS_DOMINANCE {
        Some(BoostAxis::Horizontal)
    } else if velocity.y.abs() > speed * AXIS_DOMINANCE {
        Some(BoostAxis::Vertical)
    } else {
        None
    }
}

/// Fast, predominantly upward movement. The state machine lets such motion
/// pass through intermediate bands instead of sticking at the darkest one.
pub fn is_boost_ascent(velocity: Vec2) -> bool {
    boost_axis(velocity) == Some(BoostAxis::Vertical) && velocity.y < 0.0
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleHit {
    pub zone: ZoneId,
    pub level: DarknessLevel,
    /// Lightest zone any sample point touched this tick, for ascent handling.
    pub lightest: Option<(ZoneId, DarknessLevel)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    /// The gate said this tick does not need a check; nothing was sampled.
    Skipped,
    /// Sampled, and no non-Default zone contains any sample point. The
    /// caller must not treat this as an exit to Default.
    Clear,
    Hit(SampleHit),
}

impl SampleOutcome {
    pub fn was_sampled(&self) -> bool {
        !matches!(self, SampleOutcome::Skipped)
    }
}

pub fn sample(
    prev: Vec2,
    curr: Vec2,
    velocity: Vec2,
    now_ms: f64,
    last_check_ms: f64,
    zones: &ZoneMap,
) -> SampleOutcome {
    let distance = prev.distance_to(curr);

    if let Some(axis) = boost_axis(velocity) {
        if distance > FAST_PATH_DISTANCE {
            return sample_path(prev, curr, axis, distance, zones);
        }
    }

    if now_ms - last_check_ms >= CHECK_INTERVAL_MS || distance > MOVE_EPSILON {
        return outcome_from(zones.darkest_at(curr).map(|(zone, level)| SampleHit {
            zone,
            level,
            lightest: Some((zone, level)),
        }));
    }

    SampleOutcome::Skipped
}

fn sample_path(
    prev: Vec2,
    curr: Vec2,
    axis: BoostAxis,
    distance: f32,
    zones: &ZoneMap,
) -> SampleOutcome {
    let segments = ((distance / SEGMENT_STEP).ceil() as u32).max(MIN_SEGMENTS);
    let perpendicular = match axis {
        BoostAxis::Horizontal => Vec2::new(0.0, 1.0),
        BoostAxis::Vertical => Vec2::new(1.0, 0.0),
    };

    let mut darkest: Option<(ZoneId, DarknessLevel)> = None;
    let mut lightest: Option<(ZoneId, DarknessLevel)> = None;

    for step in 0..=segments {
        let t = step as f32 / segments as f32;
        let center = prev.lerp(curr, t);

        for offset in rail_offsets() {
            let point = center + perpendicular * offset;
            let Some((zone, level)) = zones.darkest_at(point) else {
                continue;
            };

            match darkest {
                Some((_, best)) if level <= best => {}
                _ => darkest = Some((zone, level)),
            }
            match lightest {
                Some((_, best)) if level >= best => {}
                _ => lightest = Some((zone, level)),
            }
        }
    }

    outcome_from(darkest.map(|(zone, level)| SampleHit {
        zone,
        level,
        lightest,
    }))
}

fn rail_offsets() -> [f32; 5] {
    [
        0.0,
        LATERAL_OFFSETS[0],
        -LATERAL_OFFSETS[0],
        LATERAL_OFFSETS[1],
        -LATERAL_OFFSETS[1],
    ]
}

fn outcome_from(hit: Option<SampleHit>) -> SampleOutcome {
    match hit {
        Some(hit) => SampleOutcome::Hit(hit),
        None => SampleOutcome::Clear,
    }
}
