use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geom::{RectF, Vec2};

/// Parsed map-object input, as handed over by the level loader. Shape and
/// string properties only; this module decides what they mean.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawObject {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub properties: Vec<(String, String)>,
}

impl RawObject {
    pub fn is_point(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Case-insensitive property lookup, so `airPockets` and `AirPockets`
    /// style drift in authored data resolves the same way.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Ambient darkness bands, ordered from open water down to lightless.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    JsonSchema,
)]
pub enum DarknessLevel {
    #[default]
    Default,
    Dim,
    Dark,
    Black,
}

impl DarknessLevel {
    /// Overlay opacity this band settles at.
    pub fn alpha(self) -> f32 {
        match self {
            DarknessLevel::Default => 0.0,
            DarknessLevel::Dim => 0.4,
            DarknessLevel::Dark => 0.7,
            DarknessLevel::Black => 0.9,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(DarknessLevel::Default),
            "dim" => Some(DarknessLevel::Dim),
            "dark" => Some(DarknessLevel::Dark),
            "black" => Some(DarknessLevel::Black),
            _ => None,
        }
    }
}

pub type ZoneId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DarknessZone {
    pub bounds: RectF,
    pub level: DarknessLevel,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneMap {
    zones: Vec<DarknessZone>,
}

impl ZoneMap {
    /// Builds the zone set from raw rectangle objects. Bad objects are
    /// dropped with a warning; the build itself never fails. An empty input
    /// yields an empty map and the level simply stays bright.
    pub fn build(raw: &[RawObject], faults: &mut Vec<String>) -> ZoneMap {
        let mut zones = Vec::new();

        if raw.is_empty() {
            push_fault(faults, "no darkness zones in level data; water stays bright".to_string());
        }

        for object in raw {
            if object.is_point() || object.width <= 0.0 || object.height <= 0.0 {
                push_fault(
                    faults,
                    format!("zone {:?} has no area; zones must be rectangles", object.name),
                );
                continue;
            }

            let level = resolve_level(object, faults);
            zones.push(DarknessZone {
                bounds: RectF::new(object.x, object.y, object.width, object.height),
                level,
            });
        }

        ZoneMap { zones }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: ZoneId) -> Option<&DarknessZone> {
        self.zones.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &DarknessZone)> {
        self.zones.iter().enumerate()
    }

    /// Darkest non-Default zone containing the point. Equal-darkness overlaps
    /// resolve to the lowest zone id so results stay deterministic.
    pub fn darkest_at(&self, point: Vec2) -> Option<(ZoneId, DarknessLevel)> {
        let mut best: Option<(ZoneId, DarknessLevel)> = None;
        for (id, zone) in self.iter() {
            if zone.level == DarknessLevel::Default || !zone.bounds.contains(point) {
                continue;
            }
            match best {
                Some((_, level)) if zone.level <= level => {}
                _ => best = Some((id, zone.level)),
            }
        }
        best
    }
}

/// Zone kind resolution order: `type` property, then `lightType` property,
/// then the object name. Unknown strings downgrade to Default.
fn resolve_level(object: &RawObject, faults: &mut Vec<String>) -> DarknessLevel {
    let source = object
        .property("type")
        .or_else(|| object.property("lightType"))
        .map(str::to_string)
        .unwrap_or_else(|| object.name.clone());

    match DarknessLevel::from_name(&source) {
        Some(level) => level,
        None => {
            push_fault(
                faults,
                format!("zone {:?}: unknown darkness kind {:?}; using Default", object.name, source),
            );
            DarknessLevel::Default
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PointLight {
    pub position: Vec2,
    pub color: (u8, u8, u8),
    pub radius: f32,
    pub intensity: f32,
}

const LIGHT_DEFAULT_COLOR: (u8, u8, u8) = (255, 255, 255);
const LIGHT_DEFAULT_RADIUS: f32 = 96.0;
const LIGHT_DEFAULT_INTENSITY: f32 = 0.5;

/// Builds static point lights from raw point objects. Unparseable property
/// values fall back to defaults with a warning; rectangles are not lights.
pub fn build_lights(raw: &[RawObject], faults: &mut Vec<String>) -> Vec<PointLight> {
    let mut lights = Vec::new();

    for object in raw {
        if !object.is_point() {
            push_fault(
                faults,
                format!("light {:?} is not a point object; skipped", object.name),
            );
            continue;
        }

        let color = match object.property("color") {
            None => LIGHT_DEFAULT_COLOR,
            Some(text) => parse_color(text).unwrap_or_else(|| {
                push_fault(
                    faults,
                    format!("light {:?}: bad color {:?}; using white", object.name, text),
                );
                LIGHT_DEFAULT_COLOR
            }),
        };
        let radius = parse_light_scalar(object, "radius", LIGHT_DEFAULT_RADIUS, faults);
        let intensity = parse_light_scalar(object, "intensity", LIGHT_DEFAULT_INTENSITY, faults);

        lights.push(PointLight {
            position: Vec2::new(object.x, object.y),
            color,
            radius,
            intensity,
        });
    }

    lights
}

fn parse_light_scalar(
    object: &RawObject,
    key: &str,
    default: f32,
    faults: &mut Vec<String>,
) -> f32 {
    match object.property(key) {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            push_fault(
                faults,
                format!("light {:?}: bad {key} {:?}; using {default}", object.name, text),
            );
            default
        }),
    }
}

fn parse_color(text: &str) -> Option<(u8, u8, u8)> {
    let hex = text.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

fn push_fault(faults: &mut Vec<String>, message: String) {
    warn!("{message}");
    faults.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_object(name: &str, props: &[(&str, &str)]) -> RawObject {
        RawObject {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn levels_are_ordered_and_mapped() {
        assert!(DarknessLevel::Black > DarknessLevel::Dark);
        assert!(DarknessLevel::Dark > DarknessLevel::Dim);
        assert_eq!(DarknessLevel::Default.alpha(), 0.0);
        assert_eq!(DarknessLevel::Dim.alpha(), 0.4);
        assert_eq!(DarknessLevel::Dark.alpha(), 0.7);
        assert_eq!(DarknessLevel::Black.alpha(), 0.9);
    }

    #[test]
    fn type_property_beats_name() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(&[rect_object("dim", &[("type", "black")])], &mut faults);
        assert_eq!(map.get(0).expect("zone").level, DarknessLevel::Black);
        assert!(faults.is_empty());
    }

    #[test]
    fn light_type_property_is_second_priority() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(
            &[rect_object("whatever", &[("lightType", "dark")])],
            &mut faults,
        );
        assert_eq!(map.get(0).expect("zone").level, DarknessLevel::Dark);
    }

    #[test]
    fn name_resolves_level_case_insensitively() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(&[rect_object("BLACK", &[])], &mut faults);
        assert_eq!(map.get(0).expect("zone").level, DarknessLevel::Black);
    }

    #[test]
    fn unknown_kind_downgrades_to_default_with_warning() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(&[rect_object("spooky", &[])], &mut faults);
        assert_eq!(map.get(0).expect("zone").level, DarknessLevel::Default);
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn point_objects_are_rejected_as_zones() {
        let mut faults = Vec::new();
        let point = RawObject {
            name: "dark".to_string(),
            x: 5.0,
            y: 5.0,
            width: 0.0,
            height: 0.0,
            properties: Vec::new(),
        };
        let map = ZoneMap::build(&[point], &mut faults);
        assert!(map.is_empty());
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn empty_input_warns_but_builds() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(&[], &mut faults);
        assert!(map.is_empty());
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn darkest_zone_wins_on_overlap() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(
            &[rect_object("dim", &[]), rect_object("black", &[])],
            &mut faults,
        );
        let (id, level) = map.darkest_at(Vec2::new(50.0, 50.0)).expect("hit");
        assert_eq!(id, 1);
        assert_eq!(level, DarknessLevel::Black);
    }

    #[test]
    fn default_zones_never_match_sampling() {
        let mut faults = Vec::new();
        let map = ZoneMap::build(&[rect_object("default", &[])], &mut faults);
        assert_eq!(map.darkest_at(Vec2::new(50.0, 50.0)), None);
    }

    #[test]
    fn lights_parse_properties_with_fallbacks() {
        let mut faults = Vec::new();
        let lamp = RawObject {
            name: "lamp".to_string(),
            x: 96.0,
            y: 64.0,
            width: 0.0,
            height: 0.0,
            properties: vec![
                ("color".to_string(), "#66D9FF".to_string()),
                ("radius".to_string(), "120".to_string()),
                ("intensity".to_string(), "not-a-number".to_string()),
            ],
        };
        let lights = build_lights(&[lamp], &mut faults);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].color, (0x66, 0xD9, 0xFF));
        assert_eq!(lights[0].radius, 120.0);
        assert_eq!(lights[0].intensity, LIGHT_DEFAULT_INTENSITY);
        assert_eq!(faults.len(), 1);
    }
}
