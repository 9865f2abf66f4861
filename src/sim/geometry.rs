//! Symbolic placement of level objects
//!
//! Level files place objects with expressions such as `"center+40"`,
//! `"25%"` or `"right-10"`. These resolve to absolute pixels once per canvas
//! size; nothing here ever fails, malformed input resolves to 0.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::level::LevelObject;

/// One coordinate of a placement: plain pixels or an expression string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PosExpr {
    Pixels(f32),
    Expr(String),
}

impl Default for PosExpr {
    fn default() -> Self {
        PosExpr::Pixels(0.0)
    }
}

impl From<f32> for PosExpr {
    fn from(value: f32) -> Self {
        PosExpr::Pixels(value)
    }
}

impl From<&str> for PosExpr {
    fn from(value: &str) -> Self {
        PosExpr::Expr(value.to_string())
    }
}

/// Where an expression is measured from
#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    Start,
    Center,
    End,
}

/// Resolve one axis. `half_size` is the object's own half extent on this axis.
pub fn resolve_axis(expr: &PosExpr, extent: f32, half_size: f32) -> f32 {
    let value = match expr {
        PosExpr::Pixels(v) => *v,
        PosExpr::Expr(s) => resolve_str(s, extent, half_size),
    };
    if value.is_finite() { value } else { 0.0 }
}

fn resolve_str(raw: &str, extent: f32, half_size: f32) -> f32 {
    let s: String = raw.trim().to_ascii_lowercase().split_whitespace().collect();

    let anchors = [
        ("center", Anchor::Center),
        ("middle", Anchor::Center),
        ("left", Anchor::Start),
        ("top", Anchor::Start),
        ("right", Anchor::End),
        ("bottom", Anchor::End),
    ];

    for (word, anchor) in anchors {
        if let Some(rest) = s.strip_prefix(word) {
            let base = match anchor {
                Anchor::Start => half_size,
                Anchor::Center => extent / 2.0,
                Anchor::End => extent - half_size,
            };
            return base + parse_offset(rest, extent);
        }
    }

    if let Some(pct) = s.strip_suffix('%') {
        return parse_number(pct) / 100.0 * extent;
    }

    parse_number(&s)
}

/// `""`, `"+N"`, `"-N"`, `"+P%"`, `"-P%"`; percent is of the full extent
fn parse_offset(rest: &str, extent: f32) -> f32 {
    if rest.is_empty() {
        return 0.0;
    }
    let (sign, magnitude) = match rest.as_bytes()[0] {
        b'+' => (1.0, &rest[1..]),
        b'-' => (-1.0, &rest[1..]),
        _ => return 0.0,
    };
    let amount = match magnitude.strip_suffix('%') {
        Some(pct) => parse_number(pct) / 100.0 * extent,
        None => parse_number(magnitude),
    };
    sign * amount
}

fn parse_number(s: &str) -> f32 {
    s.parse::<f32>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Resolve an object's center from its x/y expressions
pub fn resolve_level_pos(object: &LevelObject, width: f32, height: f32) -> Vec2 {
    let half = object.shape.half_extents();
    Vec2::new(
        resolve_axis(&object.x, width, half.x),
        resolve_axis(&object.y, height, half.y),
    )
}
