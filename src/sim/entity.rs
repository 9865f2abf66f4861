//! Ball entity: kinematics, wall response, deformation and despawn
//!
//! Every shape is simulated as a circle of radius `size`; the shape only
//! changes how the entity is drawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::anim::{Ease, Keyframe, Pose, Timeline};
use super::jump::JumpState;
use crate::consts::*;
use crate::settings::{DeformationSettings, PhysicsConfig};
use crate::{contact_normal, reflect};

/// Visual shape of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
    Pentagon,
    Hexagon,
    Octagon,
    Star,
}

impl Shape {
    pub const ALL: [Shape; 8] = [
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Diamond,
        Shape::Pentagon,
        Shape::Hexagon,
        Shape::Octagon,
        Shape::Star,
    ];
}

/// Axis-aligned rectangle (min corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width.max(0.0), height.max(0.0)),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }
}

/// Contact between a circle and an axis-aligned box
///
/// Returns the push-out normal and penetration depth when overlapping.
pub fn circle_box_contact(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> Option<(Vec2, f32)> {
    let closest = center.clamp(min, max);
    if closest != center {
        let (normal, dist) = contact_normal(closest, center);
        if dist < radius {
            return Some((normal, radius - dist));
        }
        return None;
    }

    // Center inside the box: leave through the nearest face
    let faces = [
        (center.x - min.x, Vec2::NEG_X),
        (max.x - center.x, Vec2::X),
        (center.y - min.y, Vec2::NEG_Y),
        (max.y - center.y, Vec2::Y),
    ];
    let (depth, normal) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::X));
    Some((normal, depth + radius))
}

/// Player movement tuning, supplied by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTuning {
    pub acceleration: f32,
    pub boosted_acceleration: f32,
    pub max_speed: f32,
    pub boost_multiplier: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            acceleration: 0.5,
            boosted_acceleration: 0.9,
            max_speed: 8.0,
            boost_multiplier: 1.5,
        }
    }
}

/// Per-frame inputs to `Ball::update`
#[derive(Debug, Clone)]
pub struct UpdateParams<'a> {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,
    pub max_velocity: f32,
    pub now: f64,
    pub physics: &'a PhysicsConfig,
    pub deformation: &'a DeformationSettings,
    /// Static rectangle entities bounce off (e.g. a floating UI panel)
    pub exclusion: Option<Rect>,
    /// Deformation timelines may run
    pub animate: bool,
}

/// Emitted by `Ball::animate` when a timeline finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimEvent {
    DeformationComplete,
    DespawnComplete,
}

/// A simulated ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Circumscribing radius used for all collision math
    pub size: f32,
    /// Size to restore when shrink expires
    pub base_size: f32,
    pub shape: Shape,
    pub color: [f32; 4],
    /// Decorative rotation (radians)
    pub rotation: f32,

    // Deformation / animation
    pub scale_x: f32,
    pub scale_y: f32,
    /// Orientation of the squash axis (radians)
    pub deform_angle: f32,
    pub is_animating: bool,
    pub opacity: f32,
    #[serde(skip)]
    deform: Option<Timeline>,
    #[serde(skip)]
    despawn: Option<Timeline>,

    pub health: f32,
    pub is_static: bool,
    pub is_sleeping: bool,
    pub is_player: bool,
    pub is_despawning: bool,
    /// Spawned by a Bullet Hell emitter
    pub is_projectile: bool,
    /// Index of the emitter that fired this projectile
    pub emitter: Option<usize>,
    /// Projectile lifetime end (0 = never expires)
    pub expires_at: f64,
    /// Simulated time the entity was created
    pub spawned_at: f64,

    // Powerup timers (simulated ms, 0 = inactive)
    pub shield_until: f64,
    pub speed_until: f64,
    pub shrink_until: f64,
    /// Red hazard flash
    pub flash_until: f64,

    pub control: Option<ControlTuning>,
    pub jump: JumpState,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, size: f32) -> Self {
        let size = if size > 0.0 { size } else { 1.0 };
        Self {
            id,
            pos,
            vel,
            size,
            base_size: size,
            shape: Shape::Circle,
            color: crate::renderer::colors::BALL,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            deform_angle: 0.0,
            is_animating: false,
            opacity: 1.0,
            deform: None,
            despawn: None,
            health: MAX_HEALTH,
            is_static: false,
            is_sleeping: false,
            is_player: false,
            is_despawning: false,
            is_projectile: false,
            emitter: None,
            expires_at: 0.0,
            spawned_at: 0.0,
            shield_until: 0.0,
            speed_until: 0.0,
            shrink_until: 0.0,
            flash_until: 0.0,
            control: None,
            jump: JumpState::default(),
        }
    }

    /// Collision radius including the current squash/stretch
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        self.size * self.scale_x.max(self.scale_y)
    }

    /// Inverse mass; static entities are immovable
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.is_static { 0.0 } else { 1.0 / self.size }
    }

    pub fn wake(&mut self) {
        if !self.is_despawning {
            self.is_sleeping = false;
        }
    }

    pub fn has_shield(&self, now: f64) -> bool {
        self.shield_until > now
    }

    pub fn has_speed(&self, now: f64) -> bool {
        self.speed_until > now
    }

    pub fn is_flashing(&self, now: f64) -> bool {
        self.flash_until > now
    }

    /// Apply damage; returns true if the entity is now at 0 health
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if amount.is_finite() && amount > 0.0 {
            self.health = (self.health - amount).max(0.0);
        }
        self.is_dead()
    }

    pub fn heal(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.health = (self.health + amount).min(MAX_HEALTH);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Velocity cap for this frame
    pub fn velocity_cap(&self, max_velocity: f32, now: f64) -> f32 {
        let mut cap = max_velocity.max(0.0);
        if let Some(control) = self.control.filter(|_| self.is_player) {
            let tuned = control.max_speed * control.boost_multiplier.max(1.0);
            if tuned > 0.0 {
                cap = cap.min(tuned);
            }
        }
        if self.has_speed(now) {
            cap *= SPEED_BOOST;
        }
        cap
    }

    /// Drop powerup timers that have run out
    pub fn expire_powerups(&mut self, now: f64) {
        if self.shrink_until > 0.0 && now >= self.shrink_until {
            self.size = self.base_size;
            self.shrink_until = 0.0;
            log::debug!("Ball {} shrink expired", self.id);
        }
        if self.speed_until > 0.0 && now >= self.speed_until {
            self.speed_until = 0.0;
        }
        if self.shield_until > 0.0 && now >= self.shield_until {
            self.shield_until = 0.0;
        }
    }

    /// Advance one frame. Returns the number of non-grazing wall hits.
    pub fn update(&mut self, params: &UpdateParams) -> u32 {
        self.expire_powerups(params.now);

        let cap = self.velocity_cap(params.max_velocity, params.now);

        if params.gravity > 0.0 {
            self.vel.y += params.gravity;
        }

        let mut hits = 0;
        if let Some(rect) = params.exclusion {
            if self.bounce_off_rect(&rect, params) {
                hits += 1;
            }
        }

        self.vel = self.vel.clamp(Vec2::splat(-cap), Vec2::splat(cap));

        hits += self.resolve_walls(params, cap);

        self.pos += self.vel;
        self.rotation += self.vel.x / self.size * 0.5;

        self.safety_clamp(params.width, params.height);

        let r = self.effective_radius();
        let on_floor = self.pos.y + r >= params.height - GROUND_TOLERANCE;
        if on_floor && self.vel.x.abs() < SLEEP_THRESHOLD && self.vel.y.abs() < SLEEP_THRESHOLD {
            self.vel = Vec2::ZERO;
            self.is_sleeping = true;
        }

        hits
    }

    fn bounce_off_rect(&mut self, rect: &Rect, params: &UpdateParams) -> bool {
        let r = self.effective_radius();
        let Some((normal, depth)) = circle_box_contact(self.pos, r, rect.min, rect.max()) else {
            return false;
        };
        self.pos += normal * depth;
        let approach = self.vel.dot(normal);
        if approach < 0.0 {
            self.vel = reflect(self.vel, normal);
            if params.animate {
                self.apply_wall_deformation(-approach, normal, params.now, params.deformation);
            }
            return true;
        }
        false
    }

    /// Bounce off the four canvas edges, tested at the predicted position
    fn resolve_walls(&mut self, params: &UpdateParams, cap: f32) -> u32 {
        let r = self.effective_radius();
        let next = self.pos + self.vel;
        let lo = r + WALL_INSET;
        let hi = Vec2::new(params.width - r - WALL_INSET, params.height - r - WALL_INSET);
        let mut hits = 0;

        // (moving into the wall, approach speed, inward normal)
        let walls = [
            (next.x < lo && self.vel.x < 0.0, -self.vel.x, Vec2::X),
            (next.x > hi.x && self.vel.x > 0.0, self.vel.x, Vec2::NEG_X),
            (next.y < lo && self.vel.y < 0.0, -self.vel.y, Vec2::Y),
            (next.y > hi.y && self.vel.y > 0.0, self.vel.y, Vec2::NEG_Y),
        ];

        for (i, (touching, approach, normal)) in walls.into_iter().enumerate() {
            if !touching {
                continue;
            }
            let is_floor = i == 3;
            // Rebound from the speed before this frame's gravity
            let approach = if is_floor {
                (approach - params.gravity.max(0.0)).max(0.0)
            } else {
                approach
            };
            let grazing = approach < params.physics.grazing_threshold;

            let mut rebound = if grazing {
                approach * params.physics.grazing_restitution
            } else {
                approach
            };

            if is_floor {
                // Contact happens at the floor, not wherever the test fired
                self.pos.y = self.pos.y.max(hi.y);
            }

            // Weight alone pressing into the floor: rest instead of bouncing
            if is_floor && approach <= SLEEP_THRESHOLD {
                rebound = 0.0;
                self.vel.x *= params.physics.floor_friction;
            } else if self.is_player && params.physics.min_player_rebound > 0.0 {
                rebound = rebound.max(params.physics.min_player_rebound.min(cap));
            }

            if normal.x != 0.0 {
                self.vel.x = normal.x * rebound;
            } else {
                self.vel.y = normal.y * rebound;
            }

            if !grazing {
                hits += 1;
                if params.animate {
                    self.apply_wall_deformation(approach, normal, params.now, params.deformation);
                }
            }
        }

        hits
    }

    /// Keep the entity inside the canvas even if deformation grew its radius
    fn safety_clamp(&mut self, width: f32, height: f32) {
        let r = self.effective_radius();
        let lo = r + WALL_INSET;
        let hi = Vec2::new(width - r - WALL_INSET, height - r - WALL_INSET);

        if hi.x < lo {
            self.pos.x = width / 2.0;
        } else if self.pos.x < lo {
            self.pos.x = lo;
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x > hi.x {
            self.pos.x = hi.x;
            self.vel.x = -self.vel.x.abs();
        }

        if hi.y < lo {
            self.pos.y = height / 2.0;
        } else if self.pos.y < lo {
            self.pos.y = lo;
            self.vel.y = self.vel.y.abs();
        } else if self.pos.y > hi.y {
            self.pos.y = hi.y;
            self.vel.y = -self.vel.y.abs();
        }
    }

    /// Squash against a wall (or static object) with inward normal `normal`
    pub fn apply_wall_deformation(
        &mut self,
        impact_speed: f32,
        normal: Vec2,
        now: f64,
        settings: &DeformationSettings,
    ) -> bool {
        self.start_deformation(settings.intensity(impact_speed), normal, now, settings)
    }

    /// Squash from an entity-entity hit; softer than a wall hit
    pub fn apply_ball_deformation(
        &mut self,
        relative_speed: f32,
        normal: Vec2,
        now: f64,
        settings: &DeformationSettings,
    ) -> bool {
        self.start_deformation(settings.intensity(relative_speed) * 0.75, normal, now, settings)
    }

    fn start_deformation(
        &mut self,
        intensity: f32,
        normal: Vec2,
        now: f64,
        settings: &DeformationSettings,
    ) -> bool {
        if self.is_animating || self.is_despawning || !settings.enabled {
            return false;
        }
        if intensity < settings.min_intensity {
            return false;
        }

        let squash = (intensity * settings.max_squash).clamp(0.0, 0.9);
        // scale_x runs along the impact normal, scale_y across it
        let compressed = Pose {
            scale_x: 1.0 - squash,
            scale_y: (1.0 / (1.0 - squash)).min(1.0 + settings.max_squash * 1.5),
            opacity: self.opacity,
        };
        let rest = Pose {
            opacity: self.opacity,
            ..Pose::REST
        };

        let total = settings.duration_for(intensity);
        self.deform_angle = normal.y.atan2(normal.x);
        self.deform = Some(Timeline::new(
            self.pose(),
            vec![
                Keyframe::new(compressed, total * 0.3, Ease::QuadOut),
                Keyframe::new(rest, total * 0.7, Ease::ElasticOut),
            ],
            now,
        ));
        self.is_animating = true;
        true
    }

    /// Begin the pop-and-fade removal. Returns false if already despawning.
    ///
    /// With `animated` false the fallback is a plain linear fade.
    pub fn pop_and_despawn(&mut self, now: f64, animated: bool) -> bool {
        if self.is_despawning {
            return false;
        }
        self.is_despawning = true;
        self.vel = Vec2::ZERO;
        self.is_static = true;
        self.is_sleeping = true;

        // Despawn owns the pose from here on
        self.deform = None;
        self.is_animating = false;
        self.scale_x = 1.0;
        self.scale_y = 1.0;

        let keys = if animated {
            let pop = Pose {
                scale_x: 1.3,
                scale_y: 1.3,
                opacity: self.opacity,
            };
            let gone = Pose {
                scale_x: 0.0,
                scale_y: 0.0,
                opacity: 0.0,
            };
            vec![
                Keyframe::new(pop, DESPAWN_DURATION_MS * 0.25, Ease::QuadOut),
                Keyframe::new(gone, DESPAWN_DURATION_MS * 0.75, Ease::QuadIn),
            ]
        } else {
            let faded = Pose {
                opacity: 0.0,
                ..Pose::REST
            };
            vec![Keyframe::new(faded, DESPAWN_DURATION_MS, Ease::Linear)]
        };
        self.despawn = Some(Timeline::new(self.pose(), keys, now));
        log::debug!("Ball {} despawning", self.id);
        true
    }

    fn pose(&self) -> Pose {
        Pose {
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            opacity: self.opacity,
        }
    }

    /// Advance any running timeline to `now`
    pub fn animate(&mut self, now: f64) -> Option<AnimEvent> {
        if let Some(timeline) = &self.despawn {
            let sample = timeline.sample(now);
            self.scale_x = sample.pose.scale_x.max(0.0);
            self.scale_y = sample.pose.scale_y.max(0.0);
            self.opacity = sample.pose.opacity.clamp(0.0, 1.0);
            if sample.finished {
                self.despawn = None;
                return Some(AnimEvent::DespawnComplete);
            }
            return None;
        }

        if let Some(timeline) = &self.deform {
            let sample = timeline.sample(now);
            if sample.finished {
                self.deform = None;
                self.is_animating = false;
                self.scale_x = 1.0;
                self.scale_y = 1.0;
                return Some(AnimEvent::DeformationComplete);
            }
            self.scale_x = sample.pose.scale_x.max(0.05);
            self.scale_y = sample.pose.scale_y.max(0.05);
        }
        None
    }

    /// Projectile outlived its emitter's lifetime
    pub fn is_expired(&self, now: f64) -> bool {
        self.expires_at > 0.0 && now >= self.expires_at
    }
}
