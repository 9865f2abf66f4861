//! Gravity Gauntlet - a 2D ball physics sandbox with arcade level modes
//!
//! Core modules:
//! - `sim`: Physics and game-rule engine (entities, collisions, levels, win/lose)
//! - `renderer`: Draw geometry for entities and level objects
//! - `settings`: Engine configuration and per-level physics overrides

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{DeformationSettings, PhysicsConfig, PhysicsOverrides, Settings};

use glam::Vec2;

/// Engine constants
///
/// Velocities are in pixels per frame, timers in simulated milliseconds.
pub mod consts {
    /// Health ceiling for every entity
    pub const MAX_HEALTH: f32 = 100.0;

    /// Default restitution for entity-entity collisions
    pub const DEFAULT_ELASTICITY: f32 = 0.9;
    /// Default collision solver passes per frame
    pub const DEFAULT_ITERATIONS: u32 = 5;
    /// Wall approach speed below which a hit counts as grazing
    pub const DEFAULT_GRAZING_THRESHOLD: f32 = 1.5;
    /// Rebound factor for grazing wall hits
    pub const GRAZING_RESTITUTION: f32 = 0.7;
    /// Rolling friction applied to entities resting on the floor
    pub const FLOOR_FRICTION: f32 = 0.985;

    /// Gap kept between an entity and the canvas edge
    pub const WALL_INSET: f32 = 2.0;
    /// Slack for the grounded test (y + r >= height - tolerance)
    pub const GROUND_TOLERANCE: f32 = 3.0;
    /// Both velocity components below this put a floor-resting entity to sleep
    pub const SLEEP_THRESHOLD: f32 = 0.1;

    /// Extra separation added after a resolved entity-entity collision
    pub const SEPARATION_BUFFER: f32 = 0.5;
    /// Tangential friction factor for resting contacts
    pub const TANGENT_FRICTION: f32 = 0.05;
    /// Cap on the tangential friction correction per pass
    pub const TANGENT_FRICTION_CAP: f32 = 0.5;
    /// Impact speed treated as full intensity for damage and deformation
    pub const IMPACT_REFERENCE_SPEED: f32 = 15.0;

    /// Velocity cap multiplier while the speed powerup is active
    pub const SPEED_BOOST: f32 = 1.6;
    pub const SHIELD_DURATION_MS: f64 = 8000.0;
    pub const SPEED_DURATION_MS: f64 = 6000.0;
    pub const SHRINK_DURATION_MS: f64 = 6000.0;
    /// Size multiplier applied by the shrink powerup
    pub const SHRINK_FACTOR: f32 = 0.6;
    /// Health restored by the health powerup
    pub const HEALTH_RESTORE: f32 = 35.0;

    /// Red flash after a hazard hit
    pub const HAZARD_FLASH_MS: f64 = 250.0;
    /// Pop animation length before removal
    pub const DESPAWN_DURATION_MS: f64 = 350.0;

    /// Jump impulse = clamp(gravity * factor, min, max)
    pub const JUMP_GRAVITY_FACTOR: f32 = 70.0;
    pub const JUMP_MIN_IMPULSE: f32 = 8.0;
    pub const JUMP_MAX_IMPULSE: f32 = 18.0;
    pub const GROUND_JUMP_COOLDOWN_MS: f64 = 280.0;
    pub const AIR_JUMP_COOLDOWN_MS: f64 = 140.0;
    /// Bullet Hell air-jump and slam token pool size
    pub const BULLET_HELL_TOKENS: u8 = 3;

    /// Longest frame delta fed into the simulation
    pub const MAX_FRAME_DELTA_MS: f64 = 100.0;
}

/// Reflect a velocity off a surface with unit normal `normal`
#[inline]
pub fn reflect(vel: Vec2, normal: Vec2) -> Vec2 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Unit vector from `from` toward `to`, falling back to +X when they coincide
#[inline]
pub fn contact_normal(from: Vec2, to: Vec2) -> (Vec2, f32) {
    let delta = to - from;
    let dist = delta.length();
    if dist > 0.0 {
        (delta / dist, dist)
    } else {
        (Vec2::X, 0.0)
    }
}
