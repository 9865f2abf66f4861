//! Level definitions and their resolved (absolute) form
//!
//! Levels arrive as JSON from the host. Positions are symbolic until
//! `ResolvedLevel::resolve` turns them into pixels for a canvas size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Shape;
use super::geometry::{PosExpr, resolve_level_pos};
use crate::settings::PhysicsOverrides;

/// Game mode carried by a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelType {
    /// Clear every non-player entity into a goal
    GravityGauntlet,
    /// Survive incoming projectiles until the timer runs out
    BulletHell,
    /// Free-form sandbox level with no win condition
    #[default]
    #[serde(other)]
    Custom,
}

/// Collision footprint of a static level object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum StaticShape {
    Circle { radius: f32 },
    Box { width: f32, height: f32 },
}

impl StaticShape {
    /// Half width/height, used to inset edge anchors
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            StaticShape::Circle { radius } => Vec2::splat(radius.max(0.0)),
            StaticShape::Box { width, height } => Vec2::new(width.max(0.0), height.max(0.0)) / 2.0,
        }
    }

    /// Radius of the circle used for circular-only overlap tests
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            StaticShape::Circle { radius } => radius.max(0.0),
            StaticShape::Box { .. } => self.half_extents().length(),
        }
    }
}

/// A hazard, goal, or the body of a powerup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    #[serde(flatten)]
    pub shape: StaticShape,
    #[serde(default)]
    pub x: PosExpr,
    #[serde(default)]
    pub y: PosExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Hazard damage multiplier override (damage = multiplier * 100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<f32>,
}

/// Powerup effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    Shield,
    Speed,
    Shrink,
    Health,
}

/// A consumable pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    #[serde(rename = "type")]
    pub kind: PowerupKind,
    #[serde(flatten)]
    pub object: LevelObject,
}

/// Bullet Hell projectile source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Emitter {
    pub x: PosExpr,
    pub y: PosExpr,
    /// Time between shots
    pub interval_ms: f64,
    /// Projectile speed (pixels per frame)
    pub speed: f32,
    /// Projectile radius
    pub size: f32,
    pub shape: Shape,
    /// Projectiles expire after this long
    pub lifetime_ms: f64,
    /// Most projectiles from this emitter alive at once
    pub max_alive: usize,
    /// Aim at the player; otherwise fire in a random direction
    pub aimed: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            x: PosExpr::Expr("center".to_string()),
            y: PosExpr::Expr("top".to_string()),
            interval_ms: 1200.0,
            speed: 6.0,
            size: 8.0,
            shape: Shape::Circle,
            lifetime_ms: 6000.0,
            max_alive: 12,
            aimed: true,
        }
    }
}

/// A complete level definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub hazards: Vec<LevelObject>,
    pub goals: Vec<LevelObject>,
    pub powerups: Vec<Powerup>,
    pub emitters: Vec<Emitter>,
    /// Bullet Hell survival time
    pub time_limit_sec: Option<f32>,
    pub physics: Option<PhysicsOverrides>,
    /// Bumped whenever the object lists change
    #[serde(skip)]
    revision: u64,
}

impl Level {
    /// Parse a level from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let level: Level = serde_json::from_str(json)?;
        log::info!(
            "Loaded level '{}' ({:?}): {} hazards, {} goals, {} powerups",
            level.name,
            level.level_type,
            level.hazards.len(),
            level.goals.len(),
            level.powerups.len()
        );
        Ok(level)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark the object lists as edited so cached positions are rebuilt
    pub fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Remove a powerup by index (consumed on pickup)
    pub fn take_powerup(&mut self, index: usize) -> Option<Powerup> {
        if index < self.powerups.len() {
            self.touch();
            Some(self.powerups.remove(index))
        } else {
            None
        }
    }
}

/// What a resolved object does on contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticKind {
    Hazard,
    Goal,
    Powerup(PowerupKind),
}

/// A level object at absolute coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObject {
    pub kind: StaticKind,
    pub pos: Vec2,
    pub shape: StaticShape,
    pub color: [f32; 4],
    /// Hazard damage multiplier override
    pub damage: Option<f32>,
    /// Index into the source list
    pub index: usize,
}

/// Absolute positions for a level at one canvas size
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedLevel {
    pub hazards: Vec<ResolvedObject>,
    pub goals: Vec<ResolvedObject>,
    pub powerups: Vec<ResolvedObject>,
    width: f32,
    height: f32,
    revision: u64,
}

impl ResolvedLevel {
    pub fn resolve(level: &Level, width: f32, height: f32) -> Self {
        let resolve = |kind: StaticKind, index: usize, obj: &LevelObject| ResolvedObject {
            kind,
            pos: resolve_level_pos(obj, width, height),
            shape: obj.shape,
            color: obj
                .color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or_else(|| default_color(kind)),
            damage: obj.damage,
            index,
        };

        Self {
            hazards: level
                .hazards
                .iter()
                .enumerate()
                .map(|(i, o)| resolve(StaticKind::Hazard, i, o))
                .collect(),
            goals: level
                .goals
                .iter()
                .enumerate()
                .map(|(i, o)| resolve(StaticKind::Goal, i, o))
                .collect(),
            powerups: level
                .powerups
                .iter()
                .enumerate()
                .map(|(i, p)| resolve(StaticKind::Powerup(p.kind), i, &p.object))
                .collect(),
            width,
            height,
            revision: level.revision,
        }
    }

    /// True when the canvas size or the level's object lists changed
    pub fn is_stale(&self, level: &Level, width: f32, height: f32) -> bool {
        self.width != width || self.height != height || self.revision != level.revision
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
pub fn parse_color(s: &str) -> Option<[f32; 4]> {
    let hex = s.trim().strip_prefix('#')?;
    let channel = |h: &str| u8::from_str_radix(h, 16).ok().map(|v| v as f32 / 255.0);
    match hex.len() {
        3 => {
            let mut rgb = [0.0; 3];
            for (i, c) in hex.char_indices() {
                let digit = c.to_digit(16)? as f32;
                rgb[i] = digit * 17.0 / 255.0;
            }
            Some([rgb[0], rgb[1], rgb[2], 1.0])
        }
        6 | 8 => {
            let r = channel(hex.get(0..2)?)?;
            let g = channel(hex.get(2..4)?)?;
            let b = channel(hex.get(4..6)?)?;
            let a = match hex.get(6..8) {
                Some(a) => channel(a)?,
                None => 1.0,
            };
            Some([r, g, b, a])
        }
        _ => None,
    }
}

fn default_color(kind: StaticKind) -> [f32; 4] {
    use crate::renderer::colors;
    match kind {
        StaticKind::Hazard => colors::HAZARD,
        StaticKind::Goal => colors::GOAL,
        StaticKind::Powerup(PowerupKind::Shield) => colors::POWERUP_SHIELD,
        StaticKind::Powerup(PowerupKind::Speed) => colors::POWERUP_SPEED,
        StaticKind::Powerup(PowerupKind::Shrink) => colors::POWERUP_SHRINK,
        StaticKind::Powerup(PowerupKind::Health) => colors::POWERUP_HEALTH,
    }
}
