//! Engine settings and physics configuration
//!
//! Hosts own one `Settings` value and hand it to every step. Levels may carry
//! `PhysicsOverrides` which are merged in per step, never written back.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Physics constants injected into the collision resolver and entity update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Restitution for entity-entity collisions (0-1)
    pub elasticity: f32,
    /// Collision solver passes per frame
    pub iterations: u32,
    /// Wall approach speed below which the hit is grazing
    pub grazing_threshold: f32,
    /// Rebound factor for grazing hits
    pub grazing_restitution: f32,
    /// Minimum outward wall rebound for the player (0 = off)
    pub min_player_rebound: f32,
    /// Rolling friction for floor-resting entities
    pub floor_friction: f32,
    /// Hazard damage multiplier (damage = multiplier * 100)
    pub hazard_damage: f32,
    /// Collision damage multiplier (damage = intensity * multiplier * 100)
    pub collision_damage: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            elasticity: DEFAULT_ELASTICITY,
            iterations: DEFAULT_ITERATIONS,
            grazing_threshold: DEFAULT_GRAZING_THRESHOLD,
            grazing_restitution: GRAZING_RESTITUTION,
            min_player_rebound: 0.0,
            floor_friction: FLOOR_FRICTION,
            hazard_damage: 0.25,
            collision_damage: 0.1,
        }
    }
}

/// Per-level physics override bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsOverrides {
    pub elasticity: Option<f32>,
    pub iterations: Option<u32>,
    pub grazing_threshold: Option<f32>,
    pub min_player_rebound: Option<f32>,
}

impl PhysicsConfig {
    /// Copy of this config with level overrides applied (and clamped)
    pub fn with_overrides(&self, overrides: Option<&PhysicsOverrides>) -> Self {
        let mut config = self.clone();
        if let Some(o) = overrides {
            if let Some(e) = o.elasticity {
                config.elasticity = e;
            }
            if let Some(n) = o.iterations {
                config.iterations = n;
            }
            if let Some(t) = o.grazing_threshold {
                config.grazing_threshold = t;
            }
            if let Some(r) = o.min_player_rebound {
                config.min_player_rebound = r;
            }
        }
        config.sanitized()
    }

    /// Clamp externally supplied values into usable ranges
    pub fn sanitized(mut self) -> Self {
        self.elasticity = self.elasticity.clamp(0.0, 1.0);
        self.iterations = self.iterations.clamp(1, 50);
        self.grazing_threshold = self.grazing_threshold.max(0.0);
        self.grazing_restitution = self.grazing_restitution.clamp(0.0, 1.0);
        self.min_player_rebound = self.min_player_rebound.max(0.0);
        self.floor_friction = self.floor_friction.clamp(0.0, 1.0);
        self.hazard_damage = self.hazard_damage.max(0.0);
        self.collision_damage = self.collision_damage.max(0.0);
        self
    }
}

/// Squash/stretch tuning for impact deformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeformationSettings {
    pub enabled: bool,
    /// Largest compression along the impact normal (0-0.9)
    pub max_squash: f32,
    /// Timeline length for a barely-noticeable impact
    pub base_duration_ms: f64,
    /// Timeline length for a full-intensity impact
    pub min_duration_ms: f64,
    /// Impacts below this normalised intensity don't deform
    pub min_intensity: f32,
}

impl Default for DeformationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_squash: 0.3,
            base_duration_ms: 320.0,
            min_duration_ms: 140.0,
            min_intensity: 0.05,
        }
    }
}

impl DeformationSettings {
    /// Normalised, capped intensity for an impact speed
    pub fn intensity(&self, impact_speed: f32) -> f32 {
        (impact_speed.abs() / IMPACT_REFERENCE_SPEED).min(1.0)
    }

    /// Total timeline length; harder impacts snap back faster
    pub fn duration_for(&self, intensity: f32) -> f64 {
        let t = intensity.clamp(0.0, 1.0) as f64;
        let min = self.min_duration_ms.min(self.base_duration_ms);
        self.base_duration_ms + (min - self.base_duration_ms) * t
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === World ===
    /// Downward acceleration per frame (<= 0 disables gravity)
    pub gravity: f32,
    /// Per-axis velocity cap per frame
    pub max_velocity: f32,
    pub physics: PhysicsConfig,
    pub deformation: DeformationSettings,

    // === Rules ===
    /// Collisions deal damage and 0 health removes entities
    pub health_enabled: bool,
    /// The player can't die from damage or goals
    pub sandbox: bool,
    /// Play the pop animation before removing entities
    pub despawn_animation: bool,
    /// Tweened timelines available; otherwise deformation is skipped and
    /// despawn falls back to a linear fade
    pub animations: bool,
    /// Speed powerup boosts every entity, not only the player
    pub propagate_speed_powerup: bool,

    // === Frame loop ===
    /// Frame cap (None = one step per display refresh)
    pub max_fps: Option<u32>,
    /// Background color used for the trail fade
    pub background: [f32; 4],
    /// Fade strength per frame (1 = full clear, lower leaves trails)
    pub trail_alpha: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            max_velocity: 15.0,
            physics: PhysicsConfig::default(),
            deformation: DeformationSettings::default(),

            health_enabled: true,
            sandbox: false,
            despawn_animation: true,
            animations: true,
            propagate_speed_powerup: false,

            max_fps: None,
            background: [0.02, 0.02, 0.05, 1.0],
            trail_alpha: 1.0,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        log::info!("Loaded settings (gravity {}, cap {})", settings.gravity, settings.max_velocity);
        Ok(settings)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Sandbox settings: no deaths, no damage
    pub fn sandbox() -> Self {
        Self {
            sandbox: true,
            health_enabled: false,
            ..Self::default()
        }
    }

    /// Trail alpha clamped to [0, 1]
    pub fn effective_trail_alpha(&self) -> f32 {
        self.trail_alpha.clamp(0.0, 1.0)
    }

    /// Velocity cap, never negative
    pub fn effective_max_velocity(&self) -> f32 {
        self.max_velocity.max(0.0)
    }

    /// Whether deformation timelines should run at all
    pub fn deformation_active(&self) -> bool {
        self.animations && self.deformation.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_merge_and_clamp() {
        let base = PhysicsConfig::default();
        let overrides = PhysicsOverrides {
            elasticity: Some(1.4),
            iterations: Some(8),
            grazing_threshold: None,
            min_player_rebound: Some(3.0),
        };
        let merged = base.with_overrides(Some(&overrides));
        assert_eq!(merged.elasticity, 1.0);
        assert_eq!(merged.iterations, 8);
        assert_eq!(merged.grazing_threshold, DEFAULT_GRAZING_THRESHOLD);
        assert_eq!(merged.min_player_rebound, 3.0);

        let untouched = base.with_overrides(None);
        assert_eq!(untouched, base);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"gravity": 0.8, "physics": {"elasticity": 0.5}}"#)
            .expect("valid json");
        assert_eq!(settings.gravity, 0.8);
        assert_eq!(settings.physics.elasticity, 0.5);
        assert_eq!(settings.physics.iterations, DEFAULT_ITERATIONS);
        assert!(settings.animations);
    }

    #[test]
    fn test_deformation_duration_shrinks_with_intensity() {
        let d = DeformationSettings::default();
        assert!(d.duration_for(1.0) < d.duration_for(0.1));
        assert_eq!(d.duration_for(0.0), d.base_duration_ms);
        assert_eq!(d.intensity(100.0), 1.0);
    }
}
