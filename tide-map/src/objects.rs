//! Object layers attached to a level text.
//!
//! After the char grid, a level may carry `[section]` blocks of named
//! objects, one per line:
//!
//! ```text
//! [zones]
//! shelf: rect 320 0 256 192
//! trench: rect 320 192 256 192 type=black
//! [lights]
//! lamp: at 96 64 color=#66D9FF radius=120 intensity=0.8
//! ```
//!
//! `rect` objects have an area; `at` objects are points (width and height
//! zero). Trailing `key=value` pairs become free-form string properties.
//! The parser records shape and strings only; interpreting a property is the
//! consumer's job. Malformed lines are skipped with a warning so one bad
//! object never sinks a whole level.

use log::warn;

#[derive(Clone, Debug, PartialEq)]
pub struct RawProperty {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawMapObject {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub properties: Vec<RawProperty>,
}

impl RawMapObject {
    pub fn is_point(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Property lookup, case-insensitive on the key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(key))
            .map(|p| p.value.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSheet {
    layers: Vec<(String, Vec<RawMapObject>)>,
}

impl ObjectSheet {
    pub fn layer(&self, name: &str) -> &[RawMapObject] {
        self.layers
            .iter()
            .find(|(layer, _)| layer.eq_ignore_ascii_case(name))
            .map(|(_, objects)| objects.as_slice())
            .unwrap_or(&[])
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }
}

/// Splits a level text into the char-grid part and the object-section part.
/// The grid ends at the first line whose first non-space character is `[`.
pub fn split_level_text(text: &str) -> (String, String) {
    let mut grid = String::new();
    let mut sections = String::new();
    let mut in_sections = false;

    for line in text.lines() {
        if !in_sections && line.trim_start().starts_with('[') {
            in_sections = true;
        }
        let target = if in_sections {
            &mut sections
        } else {
            &mut grid
        };
        target.push_str(line);
        target.push('\n');
    }

    (grid, sections)
}

pub fn parse_object_sections(text: &str) -> ObjectSheet {
    let mut sheet = ObjectSheet::default();
    let mut current: Option<usize> = None;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            sheet.layers.push((section.trim().to_string(), Vec::new()));
            current = Some(sheet.layers.len() - 1);
            continue;
        }

        let Some(layer_idx) = current else {
            warn!("object line {} appears before any [section]; skipped", line_no + 1);
            continue;
        };

        match parse_object_line(line) {
            Some(object) => sheet.layers[layer_idx].1.push(object),
            None => warn!("unparseable object line {}: {:?}; skipped", line_no + 1, line),
        }
    }

    sheet
}

fn parse_object_line(line: &str) -> Option<RawMapObject> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let shape = tokens.next()?;

    let (x, y, width, height) = match shape {
        "rect" => {
            let x = tokens.next()?.parse().ok()?;
            let y = tokens.next()?.parse().ok()?;
            let w = tokens.next()?.parse().ok()?;
            let h = tokens.next()?.parse().ok()?;
            (x, y, w, h)
        }
        "at" => {
            let x = tokens.next()?.parse().ok()?;
            let y = tokens.next()?.parse().ok()?;
            (x, y, 0.0, 0.0)
        }
        _ => return None,
    };

    let mut properties = Vec::new();
    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return None;
        };
        properties.push(RawProperty {
            name: key.to_string(),
            value: value.to_string(),
        });
    }

    Some(RawMapObject {
        name: name.to_string(),
        x,
        y,
        width,
        height,
        properties,
    })
}
