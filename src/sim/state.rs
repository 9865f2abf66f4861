//! Simulation state and the host-facing mutation API
//!
//! Everything a frame reads or writes lives in `GameState`: the entity
//! collection, the active level (with its cached absolute positions), the
//! simulated clock and the win/lose phase.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Ball, ControlTuning, Rect, Shape};
use super::jump::{self, Denied, JumpOutcome};
use super::level::{Level, LevelType, ResolvedLevel};
use crate::consts::*;
use crate::settings::{PhysicsConfig, Settings};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Frames are simulated
    #[default]
    Running,
    /// Terminal until `reset`
    Won,
    /// Terminal until `reset`
    Lost,
}

/// Parameters for seeding the entity collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeedOptions {
    pub count: usize,
    pub base_size: f32,
    /// Initial speed; each entity gets a random direction
    pub base_velocity: f32,
    pub width: f32,
    pub height: f32,
    /// Shape for every entity (None = random per entity)
    pub shape: Option<Shape>,
    /// Size override for the first (player) entity
    pub starting_size: Option<f32>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            count: 10,
            base_size: 15.0,
            base_velocity: 3.0,
            width: 800.0,
            height: 600.0,
            shape: Some(Shape::Circle),
            starting_size: None,
        }
    }
}

/// Parameters for `GameState::add_entity`
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpawn {
    pub size: f32,
    /// Speed; the direction is random
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
    /// Explicit position (None = random inside the canvas)
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub shape: Option<Shape>,
    pub is_static: bool,
}

impl EntitySpawn {
    pub fn new(size: f32, velocity: f32, width: f32, height: f32) -> Self {
        Self {
            size,
            velocity,
            width,
            height,
            x: None,
            y: None,
            shape: None,
            is_static: false,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Whitelisted in-place edits for `GameState::update_entity`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    /// Applied only when the caller authorises position edits
    pub pos: Option<Vec2>,
    pub vel: Option<Vec2>,
    pub color: Option<[f32; 4]>,
    pub size: Option<f32>,
    pub shape: Option<Shape>,
    pub is_static: Option<bool>,
    pub health: Option<f32>,
    pub opacity: Option<f32>,
    pub control: Option<ControlTuning>,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Active entities, in insertion order
    pub entities: Vec<Ball>,
    pub width: f32,
    pub height: f32,
    pub phase: GamePhase,
    /// Goal clears this run
    pub score: u32,
    /// Entities removed through a goal this run
    pub scored: u32,
    /// Resolved entity-entity collisions this run
    pub collision_count: u64,
    pub wall_hits: u64,
    /// Simulated clock; only advanced by steps
    pub now_ms: f64,
    /// Bullet Hell countdown
    pub time_left_sec: Option<f32>,
    /// Entity chosen by the host (takes precedence as the player)
    pub selected: Option<u32>,
    /// Static rectangle entities bounce off
    pub exclusion: Option<Rect>,

    pub(crate) level: Option<Level>,
    /// Pristine copy restored on reset (powerups come back)
    template: Option<Level>,
    pub(crate) resolved: Option<ResolvedLevel>,
    /// Next fire time per emitter
    pub(crate) emitter_due: Vec<f64>,

    pub(crate) rng: Pcg32,
    seed: u64,
    last_seed: Option<SeedOptions>,
    next_id: u32,
}

impl GameState {
    /// Create an empty state with the given RNG seed
    pub fn new(seed: u64) -> Self {
        Self {
            entities: Vec::new(),
            width: 800.0,
            height: 600.0,
            phase: GamePhase::Running,
            score: 0,
            scored: 0,
            collision_count: 0,
            wall_hits: 0,
            now_ms: 0.0,
            time_left_sec: None,
            selected: None,
            exclusion: None,
            level: None,
            template: None,
            resolved: None,
            emitter_due: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            last_seed: None,
            next_id: 1,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Allocate a new entity ID (never reused)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Replace the entity collection with freshly seeded entities
    ///
    /// When a level is active the first entity becomes the player.
    pub fn initialize(&mut self, opts: SeedOptions) {
        self.entities.clear();
        self.selected = None;
        self.set_canvas_size(opts.width, opts.height);

        for i in 0..opts.count {
            let size = match (i, opts.starting_size) {
                (0, Some(size)) if size > 0.0 => size,
                _ => opts.base_size,
            };
            let shape = opts
                .shape
                .unwrap_or_else(|| Shape::ALL[self.rng.random_range(0..Shape::ALL.len())]);
            let spawn = EntitySpawn::new(size, opts.base_velocity, opts.width, opts.height).with_shape(shape);
            self.add_entity(spawn);
        }

        if self.level.is_some() {
            if let Some(first) = self.entities.first_mut() {
                first.is_player = true;
            }
        }

        log::info!("Seeded {} entities on {}x{}", self.entities.len(), opts.width, opts.height);
        self.last_seed = Some(opts);
    }

    /// Restart the run: restore the level, re-seed entities, clear counters
    pub fn reset(&mut self) {
        if let Some(template) = &self.template {
            let mut level = template.clone();
            level.touch();
            self.level = Some(level);
        }
        self.resolved = None;
        self.phase = GamePhase::Running;
        self.score = 0;
        self.scored = 0;
        self.collision_count = 0;
        self.wall_hits = 0;
        self.start_level_timers();

        if let Some(opts) = self.last_seed.clone() {
            self.initialize(opts);
        } else {
            self.entities.clear();
        }
        log::info!("Game reset");
    }

    /// Make `level` the active level; takes effect on the next step
    pub fn load_level(&mut self, level: Level) {
        log::info!("Level '{}' active ({:?})", level.name, level.level_type);
        self.template = Some(level.clone());
        self.level = Some(level);
        self.resolved = None;
        self.start_level_timers();
        if self.player_id().is_none() {
            if let Some(first) = self.entities.first_mut() {
                first.is_player = true;
            }
        }
    }

    /// Back to free-form sandbox play
    pub fn clear_level(&mut self) {
        self.level = None;
        self.template = None;
        self.resolved = None;
        self.emitter_due.clear();
        self.time_left_sec = None;
    }

    fn start_level_timers(&mut self) {
        let Some(level) = &self.level else {
            return;
        };
        self.time_left_sec = match level.level_type {
            LevelType::BulletHell => level.time_limit_sec.map(|t| t.max(0.0)),
            _ => None,
        };
        self.emitter_due = level
            .emitters
            .iter()
            .map(|e| self.now_ms + e.interval_ms.max(1.0))
            .collect();
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    /// Edit the active level; cached positions are rebuilt next step
    pub fn level_mut(&mut self) -> Option<&mut Level> {
        let level = self.level.as_mut()?;
        level.touch();
        Some(level)
    }

    pub fn level_type(&self) -> LevelType {
        self.level.as_ref().map_or(LevelType::Custom, |l| l.level_type)
    }

    /// Rebuild cached level positions if the canvas or object lists changed
    pub fn refresh_resolved(&mut self) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let stale = self
            .resolved
            .as_ref()
            .is_none_or(|r| r.is_stale(level, self.width, self.height));
        if stale {
            log::debug!("Resolving level '{}' for {}x{}", level.name, self.width, self.height);
            self.resolved = Some(ResolvedLevel::resolve(level, self.width, self.height));
        }
    }

    /// Absolute level positions for the current canvas, rebuilt when stale
    pub fn resolved_level(&mut self) -> Option<&ResolvedLevel> {
        self.refresh_resolved();
        self.resolved.as_ref()
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// Physics constants with the level's overrides merged in
    pub fn physics(&self, settings: &Settings) -> PhysicsConfig {
        settings
            .physics
            .with_overrides(self.level.as_ref().and_then(|l| l.physics.as_ref()))
            .sanitized()
    }

    /// The player: the selected entity, else the flagged starting entity
    pub fn player_id(&self) -> Option<u32> {
        self.selected
            .filter(|id| self.entities.iter().any(|b| b.id == *id))
            .or_else(|| self.entities.iter().find(|b| b.is_player).map(|b| b.id))
    }

    pub fn player(&self) -> Option<&Ball> {
        let id = self.player_id()?;
        self.entity(id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Ball> {
        let id = self.player_id()?;
        self.entity_mut(id)
    }

    pub fn entity(&self, id: u32) -> Option<&Ball> {
        self.entities.iter().find(|b| b.id == id)
    }

    pub fn entity_mut(&mut self, id: u32) -> Option<&mut Ball> {
        self.entities.iter_mut().find(|b| b.id == id)
    }

    /// Entities still taking part in the game (not despawning)
    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|b| !b.is_despawning).count()
    }

    /// Add one entity; returns its id
    pub fn add_entity(&mut self, spawn: EntitySpawn) -> u32 {
        let size = if spawn.size.is_finite() && spawn.size > 0.0 {
            spawn.size
        } else {
            1.0
        };
        let x = match spawn.x {
            Some(x) if x.is_finite() => x,
            _ => self.random_coord(spawn.width, size),
        };
        let y = match spawn.y {
            Some(y) if y.is_finite() => y,
            _ => self.random_coord(spawn.height, size),
        };
        let vel = if spawn.is_static {
            Vec2::ZERO
        } else {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            Vec2::from_angle(angle) * spawn.velocity.max(0.0)
        };

        let id = self.next_entity_id();
        let mut ball = Ball::new(id, Vec2::new(x, y), vel, size);
        ball.shape = spawn.shape.unwrap_or_default();
        ball.is_static = spawn.is_static;
        ball.spawned_at = self.now_ms;
        self.entities.push(ball);
        id
    }

    fn random_coord(&mut self, extent: f32, size: f32) -> f32 {
        let lo = size + WALL_INSET;
        let hi = extent - size - WALL_INSET;
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            extent / 2.0
        }
    }

    /// Remove an entity; missing ids are a no-op
    pub fn remove_entity(&mut self, id: u32) -> bool {
        let before = self.entities.len();
        self.entities.retain(|b| b.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.entities.len() != before
    }

    /// Apply whitelisted edits to one entity, clamping every value
    ///
    /// `pos` is ignored unless `allow_position` is set. Returns false for a
    /// missing id.
    pub fn update_entity(&mut self, id: u32, patch: EntityPatch, allow_position: bool) -> bool {
        let Some(ball) = self.entity_mut(id) else {
            return false;
        };

        if allow_position {
            if let Some(pos) = patch.pos.filter(|p| p.is_finite()) {
                ball.pos = pos;
            }
        }
        if let Some(vel) = patch.vel.filter(|v| v.is_finite()) {
            ball.vel = vel;
        }
        if let Some(color) = patch.color {
            ball.color = color.map(|c| c.clamp(0.0, 1.0));
        }
        if let Some(size) = patch.size.filter(|s| s.is_finite() && *s > 0.0) {
            ball.size = size;
            ball.base_size = size;
            ball.shrink_until = 0.0;
        }
        if let Some(shape) = patch.shape {
            ball.shape = shape;
        }
        if let Some(is_static) = patch.is_static {
            ball.is_static = is_static;
            if is_static {
                ball.vel = Vec2::ZERO;
            }
        }
        if let Some(health) = patch.health.filter(|h| h.is_finite()) {
            ball.health = health.clamp(0.0, MAX_HEALTH);
        }
        if let Some(opacity) = patch.opacity.filter(|o| o.is_finite()) {
            ball.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(control) = patch.control {
            ball.control = Some(control);
        }

        ball.wake();
        true
    }

    /// Jump request from the input layer
    pub fn jump(&mut self, settings: &Settings) -> JumpOutcome {
        let (height, mode, now) = (self.height, self.level_type(), self.now_ms);
        match self.player_mut() {
            Some(player) if !player.is_despawning => jump::jump(player, height, settings.gravity, mode, now),
            _ => JumpOutcome::Denied(Denied::NoPlayer),
        }
    }

    /// Slam request from the input layer
    pub fn slam(&mut self, settings: &Settings) -> JumpOutcome {
        let (height, mode) = (self.height, self.level_type());
        match self.player_mut() {
            Some(player) if !player.is_despawning => jump::slam(player, height, settings.gravity, mode),
            _ => JumpOutcome::Denied(Denied::NoPlayer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize) -> GameState {
        let mut state = GameState::new(42);
        state.initialize(SeedOptions {
            count,
            ..SeedOptions::default()
        });
        state
    }

    #[test]
    fn test_initialize_places_inside_canvas() {
        let state = seeded(20);
        assert_eq!(state.entities.len(), 20);
        for ball in &state.entities {
            assert!(ball.pos.x >= ball.size && ball.pos.x <= 800.0 - ball.size);
            assert!(ball.pos.y >= ball.size && ball.pos.y <= 600.0 - ball.size);
            assert!((ball.vel.length() - 3.0).abs() < 1e-3);
            assert!(!ball.is_player);
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = seeded(5);
        let b = seeded(5);
        let pa: Vec<Vec2> = a.entities.iter().map(|e| e.pos).collect();
        let pb: Vec<Vec2> = b.entities.iter().map(|e| e.pos).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_level_flags_first_entity_as_player() {
        let mut state = GameState::new(1);
        state.load_level(Level::default());
        state.initialize(SeedOptions {
            count: 3,
            starting_size: Some(25.0),
            ..SeedOptions::default()
        });
        assert!(state.entities[0].is_player);
        assert_eq!(state.entities[0].size, 25.0);
        assert_eq!(state.player_id(), Some(state.entities[0].id));
    }

    #[test]
    fn test_selected_takes_precedence() {
        let mut state = GameState::new(1);
        state.load_level(Level::default());
        state.initialize(SeedOptions {
            count: 3,
            ..SeedOptions::default()
        });
        let other = state.entities[2].id;
        state.selected = Some(other);
        assert_eq!(state.player_id(), Some(other));

        // A selection that no longer exists falls back to the flag
        state.remove_entity(other);
        assert_eq!(state.player_id(), Some(state.entities[0].id));
    }

    #[test]
    fn test_ids_never_reused() {
        let mut state = seeded(3);
        let last = state.entities[2].id;
        assert!(state.remove_entity(last));
        assert!(!state.remove_entity(last));
        let id = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0));
        assert!(id > last);
        state.reset();
        assert!(state.entities.iter().all(|b| b.id > id));
    }

    #[test]
    fn test_add_static_entity_at_position() {
        let mut state = GameState::new(3);
        let id = state.add_entity(
            EntitySpawn::new(20.0, 5.0, 800.0, 600.0)
                .at(100.0, 200.0)
                .with_shape(Shape::Star)
                .fixed(),
        );
        let ball = state.entity(id).expect("added");
        assert_eq!(ball.pos, Vec2::new(100.0, 200.0));
        assert_eq!(ball.vel, Vec2::ZERO);
        assert_eq!(ball.shape, Shape::Star);
        assert!(ball.is_static);
    }

    #[test]
    fn test_update_entity_whitelist_and_clamps() {
        let mut state = GameState::new(3);
        let id = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(50.0, 50.0));
        state.entity_mut(id).expect("added").is_sleeping = true;

        let patch = EntityPatch {
            pos: Some(Vec2::new(300.0, 300.0)),
            vel: Some(Vec2::new(1.0, 2.0)),
            health: Some(250.0),
            opacity: Some(-1.0),
            size: Some(-4.0),
            ..EntityPatch::default()
        };
        assert!(state.update_entity(id, patch.clone(), false));
        let ball = state.entity(id).expect("present");
        assert_eq!(ball.pos, Vec2::new(50.0, 50.0));
        assert_eq!(ball.vel, Vec2::new(1.0, 2.0));
        assert_eq!(ball.health, MAX_HEALTH);
        assert_eq!(ball.opacity, 0.0);
        assert_eq!(ball.size, 10.0);
        assert!(!ball.is_sleeping);

        assert!(state.update_entity(id, patch, true));
        assert_eq!(state.entity(id).expect("present").pos, Vec2::new(300.0, 300.0));
        assert!(!state.update_entity(9999, EntityPatch::default(), true));
    }

    #[test]
    fn test_reset_restores_powerups_and_phase() {
        let level = Level::from_json(
            r#"{"type": "bulletHell", "timeLimitSec": 30,
                "powerups": [{"type": "health", "shape": "circle", "radius": 10, "x": 100, "y": 100}]}"#,
        )
        .expect("valid level");
        let mut state = GameState::new(9);
        state.load_level(level);
        state.initialize(SeedOptions {
            count: 2,
            ..SeedOptions::default()
        });
        assert_eq!(state.time_left_sec, Some(30.0));

        state.level_mut().expect("level").take_powerup(0);
        state.phase = GamePhase::Lost;
        state.score = 4;
        state.time_left_sec = Some(1.0);

        state.reset();
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_left_sec, Some(30.0));
        assert_eq!(state.level().expect("level").powerups.len(), 1);
        assert_eq!(state.entities.len(), 2);
        assert!(state.entities[0].is_player);
    }

    #[test]
    fn test_resolved_cache_invalidation() {
        let level = Level::from_json(r#"{"goals": [{"shape": "circle", "radius": 20, "x": "center", "y": "center"}]}"#)
            .expect("valid level");
        let mut state = GameState::new(1);
        state.load_level(level);
        state.set_canvas_size(800.0, 600.0);
        assert_eq!(state.resolved_level().expect("resolved").goals[0].pos, Vec2::new(400.0, 300.0));

        state.set_canvas_size(1000.0, 600.0);
        assert_eq!(state.resolved_level().expect("resolved").goals[0].pos, Vec2::new(500.0, 300.0));
    }

    #[test]
    fn test_refresh_resolved_rebuilds_stale_cache() {
        let mut state = GameState::new(1);
        state.refresh_resolved();
        assert!(state.resolved.is_none());

        state.load_level(
            Level::from_json(r#"{"hazards": [{"shape": "circle", "radius": 5, "x": "right-10", "y": 50}]}"#)
                .expect("valid level"),
        );
        state.set_canvas_size(800.0, 600.0);
        state.refresh_resolved();
        assert_eq!(state.resolved.as_ref().expect("resolved").hazards[0].pos, Vec2::new(785.0, 50.0));

        state.set_canvas_size(400.0, 600.0);
        state.refresh_resolved();
        assert_eq!(state.resolved.as_ref().expect("resolved").hazards[0].pos, Vec2::new(385.0, 50.0));
    }

    #[test]
    fn test_jump_without_player_denied() {
        let mut state = seeded(2);
        assert_eq!(state.jump(&Settings::default()), JumpOutcome::Denied(Denied::NoPlayer));
    }
}
