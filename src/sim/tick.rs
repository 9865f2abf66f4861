//! Per-frame orchestration and the win/lose state machine
//!
//! One call to `step` advances the world by one display frame: velocities are
//! pixels per frame, while `dt_ms` only drives the simulated clock (timers,
//! timelines and the Bullet Hell countdown).

use glam::Vec2;
use rand::Rng;

use super::clock::FrameClock;
use super::collision::{CollisionCtx, solve_collisions};
use super::entity::{AnimEvent, UpdateParams};
use super::events::StepHooks;
use super::geometry::resolve_axis;
use super::interact::{HazardOutcome, Rules, apply_powerup_pickups, kill};
use super::jump::refresh_grounded;
use super::level::LevelType;
use super::state::{EntitySpawn, GamePhase, GameState};
use crate::consts::MAX_FRAME_DELTA_MS;
use crate::renderer::{Canvas, colors, shapes};
use crate::settings::Settings;

/// Advance the game by one frame and draw it
///
/// Does nothing once the game has left `Running`. Returns the phase after
/// the frame.
pub fn step(
    state: &mut GameState,
    canvas: &mut dyn Canvas,
    settings: &Settings,
    dt_ms: f64,
    hooks: &mut dyn StepHooks,
) -> GamePhase {
    if !state.is_running() {
        return state.phase;
    }

    let dt_ms = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_DELTA_MS)
    } else {
        0.0
    };
    state.now_ms += dt_ms;
    let now = state.now_ms;
    if state.level_type() == LevelType::BulletHell {
        if let Some(left) = state.time_left_sec.as_mut() {
            *left = (*left - (dt_ms / 1000.0) as f32).max(0.0);
        }
    }

    state.refresh_resolved();
    let physics = state.physics(settings);
    let animate = settings.deformation_active();
    let player = state.player_id();

    canvas.fade(settings.background, settings.effective_trail_alpha());

    spawn_projectiles(state, now);

    // === Update and draw entities ===
    let params = UpdateParams {
        width: state.width,
        height: state.height,
        gravity: settings.gravity,
        max_velocity: settings.effective_max_velocity(),
        now,
        physics: &physics,
        deformation: &settings.deformation,
        exclusion: state.exclusion,
        animate,
    };
    let mut finished = Vec::new();
    for ball in state.entities.iter_mut() {
        if ball.animate(now) == Some(AnimEvent::DespawnComplete) {
            finished.push(ball.id);
            continue;
        }
        ball.expire_powerups(now);
        if !ball.is_sleeping && !ball.is_static {
            let hits = ball.update(&params);
            if hits > 0 {
                state.wall_hits += u64::from(hits);
                hooks.on_wall_hit(ball.id);
            }
        }
        shapes::draw_ball(canvas, ball, now, player == Some(ball.id));
    }

    if let Some(resolved) = &state.resolved {
        for obj in resolved
            .hazards
            .iter()
            .chain(&resolved.goals)
            .chain(&resolved.powerups)
        {
            shapes::draw_static(canvas, obj);
        }
    }

    // === Collisions ===
    let ctx = CollisionCtx {
        physics: &physics,
        deformation: &settings.deformation,
        animate,
        health_enabled: settings.health_enabled,
        now,
    };
    let rules = Rules {
        player,
        sandbox: settings.sandbox,
        despawn_animation: settings.despawn_animation,
        animate: settings.animations,
        now,
    };
    let outcomes = solve_collisions(&mut state.entities, state.resolved.as_ref(), &ctx, &rules, hooks);
    state.collision_count += u64::from(outcomes.collisions);
    state.score += outcomes.scored;
    state.scored += outcomes.scored;
    let mut player_lost = outcomes.player_lost;

    if let (Some(level), Some(resolved)) = (state.level.as_mut(), state.resolved.as_ref()) {
        apply_powerup_pickups(
            &mut state.entities,
            level,
            resolved,
            player,
            now,
            settings.propagate_speed_powerup,
            hooks,
        );
    }

    if let Some(ball) = player.and_then(|id| state.entities.iter_mut().find(|b| b.id == id)) {
        refresh_grounded(ball, state.height);
    }

    // === Sweep ===
    let mut removed = outcomes.removed;
    for ball in state.entities.iter_mut().filter(|b| !b.is_despawning) {
        if settings.health_enabled && ball.is_dead() {
            match kill(ball, &rules) {
                HazardOutcome::RemoveNow => removed.push(ball.id),
                HazardOutcome::PlayerKilled => player_lost = true,
                HazardOutcome::Survived | HazardOutcome::Despawning => {}
            }
        } else if ball.is_projectile && ball.is_expired(now) {
            if !(settings.despawn_animation && ball.pop_and_despawn(now, settings.animations)) {
                removed.push(ball.id);
            }
        }
    }
    removed.extend(finished);
    for id in removed {
        if state.remove_entity(id) {
            hooks.on_removed(id);
        }
    }

    // === Win / lose ===
    if player_lost {
        state.phase = GamePhase::Lost;
        log::info!("Player lost at {:.0}ms", now);
        hooks.on_player_lose();
        return state.phase;
    }

    let won = match state.level_type() {
        // Entities already popping don't hold up the win
        LevelType::GravityGauntlet => {
            player
                .and_then(|id| state.entity(id))
                .is_some_and(|p| !p.is_despawning)
                && state.active_count() == 1
        }
        LevelType::BulletHell => state.time_left_sec.is_some_and(|left| left <= 0.0),
        LevelType::Custom => false,
    };
    if won {
        state.phase = GamePhase::Won;
        log::info!("Level won (score {})", state.score);
        hooks.on_win();
    }

    state.phase
}

/// Drive `step` from a host refresh callback
///
/// Returns true while the host should keep requesting frames: false once the
/// game has ended or the clock is paused.
pub fn run_frame(
    state: &mut GameState,
    clock: &mut FrameClock,
    now_ms: f64,
    canvas: &mut dyn Canvas,
    settings: &Settings,
    hooks: &mut dyn StepHooks,
) -> bool {
    if !state.is_running() || clock.is_paused() {
        return false;
    }
    clock.set_max_fps(settings.max_fps);
    if let Some(dt) = clock.frame(now_ms) {
        step(state, canvas, settings, dt, hooks);
    }
    state.is_running()
}

/// Fire Bullet Hell emitters that are due
fn spawn_projectiles(state: &mut GameState, now: f64) {
    if state.level_type() != LevelType::BulletHell {
        return;
    }
    let Some(emitters) = state.level.as_ref().map(|l| l.emitters.clone()) else {
        return;
    };
    if state.emitter_due.len() != emitters.len() {
        state.emitter_due.resize(emitters.len(), now);
    }
    let target = state.player().map(|p| p.pos);
    let (width, height) = (state.width, state.height);

    for (i, emitter) in emitters.iter().enumerate() {
        if now < state.emitter_due[i] {
            continue;
        }
        state.emitter_due[i] = now + emitter.interval_ms.max(1.0);

        let alive = state
            .entities
            .iter()
            .filter(|b| b.emitter == Some(i) && !b.is_despawning)
            .count();
        if alive >= emitter.max_alive {
            continue;
        }

        let origin = Vec2::new(
            resolve_axis(&emitter.x, width, emitter.size),
            resolve_axis(&emitter.y, height, emitter.size),
        );
        let aim = target
            .filter(|_| emitter.aimed)
            .map(|t| (t - origin).normalize_or_zero())
            .filter(|d| *d != Vec2::ZERO);
        let dir = match aim {
            Some(dir) => dir,
            None => Vec2::from_angle(state.rng.random_range(0.0..std::f32::consts::TAU)),
        };

        let id = state.add_entity(
            EntitySpawn::new(emitter.size, 0.0, width, height)
                .at(origin.x, origin.y)
                .with_shape(emitter.shape),
        );
        if let Some(ball) = state.entity_mut(id) {
            ball.vel = dir * emitter.speed.max(0.0);
            ball.is_projectile = true;
            ball.emitter = Some(i);
            ball.expires_at = now + emitter.lifetime_ms.max(1.0);
            ball.color = colors::PROJECTILE;
        }
        log::debug!("Emitter {} fired projectile {}", i, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DrawList;
    use crate::sim::events::{GameEvent, NoHooks};
    use crate::sim::level::Level;
    use crate::sim::state::SeedOptions;

    const FRAME: f64 = 16.0;

    fn empty_state(level: Option<&str>) -> GameState {
        let mut state = GameState::new(7);
        state.set_canvas_size(800.0, 600.0);
        if let Some(json) = level {
            state.load_level(Level::from_json(json).expect("valid level"));
        }
        state
    }

    fn no_gravity() -> Settings {
        Settings {
            gravity: 0.0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_step_advances_clock_and_draws() {
        let mut state = GameState::new(1);
        state.initialize(SeedOptions {
            count: 4,
            ..SeedOptions::default()
        });
        let mut canvas = DrawList::new();
        step(&mut state, &mut canvas, &Settings::default(), FRAME, &mut NoHooks);
        assert_eq!(state.now_ms, FRAME);
        assert_eq!(canvas.draw_calls, 4);
        assert!(!canvas.vertices.is_empty());
    }

    #[test]
    fn test_gauntlet_win_when_only_player_remains() {
        let mut state = empty_state(Some(
            r#"{"type": "gravityGauntlet", "goals": [{"shape": "circle", "radius": 30, "x": 400, "y": 300}]}"#,
        ));
        let player = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(100.0, 100.0));
        state.entity_mut(player).expect("player").is_player = true;
        state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(410.0, 300.0));

        let mut events: Vec<GameEvent> = Vec::new();
        let phase = step(&mut state, &mut DrawList::new(), &no_gravity(), FRAME, &mut events);
        assert_eq!(phase, GamePhase::Won);
        assert_eq!(state.score, 1);
        assert!(events.contains(&GameEvent::Won));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Removed { .. })));

        // Terminal: further steps change nothing
        let now = state.now_ms;
        step(&mut state, &mut DrawList::new(), &no_gravity(), FRAME, &mut events);
        assert_eq!(state.now_ms, now);
    }

    #[test]
    fn test_gauntlet_win_ignores_despawning_entities() {
        let mut state = empty_state(Some(r#"{"type": "gravityGauntlet"}"#));
        let player = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(100.0, 100.0));
        state.entity_mut(player).expect("player").is_player = true;
        let other = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(500.0, 300.0));
        state.entity_mut(other).expect("other").pop_and_despawn(0.0, true);

        let phase = step(&mut state, &mut DrawList::new(), &no_gravity(), FRAME, &mut NoHooks);
        assert_eq!(phase, GamePhase::Won);
        assert!(state.entity(other).is_some());
    }

    #[test]
    fn test_sleeping_ball_shrink_expires() {
        let mut state = empty_state(None);
        let id = state.add_entity(EntitySpawn::new(20.0, 0.0, 800.0, 600.0).at(400.0, 300.0));
        let ball = state.entity_mut(id).expect("ball");
        crate::sim::interact::apply_powerup(ball, crate::sim::level::PowerupKind::Shrink, 0.0);
        ball.is_sleeping = true;
        assert!((ball.size - 12.0).abs() < 1e-4);

        let settings = no_gravity();
        while state.now_ms <= crate::consts::SHRINK_DURATION_MS {
            step(&mut state, &mut DrawList::new(), &settings, 100.0, &mut NoHooks);
        }
        let ball = state.entity(id).expect("ball");
        assert!(ball.is_sleeping);
        assert_eq!(ball.size, 20.0);
        assert_eq!(ball.shrink_until, 0.0);
    }

    #[test]
    fn test_bullet_hell_timer_win() {
        let mut state = empty_state(Some(r#"{"type": "bulletHell", "timeLimitSec": 0.05}"#));
        let player = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(400.0, 300.0));
        state.entity_mut(player).expect("player").is_player = true;

        let settings = no_gravity();
        let mut events: Vec<GameEvent> = Vec::new();
        assert_eq!(step(&mut state, &mut DrawList::new(), &settings, 20.0, &mut events), GamePhase::Running);
        assert_eq!(step(&mut state, &mut DrawList::new(), &settings, 20.0, &mut events), GamePhase::Running);
        assert_eq!(step(&mut state, &mut DrawList::new(), &settings, 20.0, &mut events), GamePhase::Won);
        assert_eq!(events, vec![GameEvent::Won]);
    }

    #[test]
    fn test_hazard_kill_despawns_then_removes() {
        let mut state = empty_state(Some(
            r#"{"hazards": [{"shape": "circle", "radius": 20, "x": 400, "y": 300, "damage": 1.0}]}"#,
        ));
        let id = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(420.0, 300.0));
        let settings = no_gravity();
        let mut events: Vec<GameEvent> = Vec::new();

        step(&mut state, &mut DrawList::new(), &settings, FRAME, &mut events);
        assert!(state.entity(id).expect("still animating").is_despawning);

        for _ in 0..30 {
            step(&mut state, &mut DrawList::new(), &settings, FRAME, &mut events);
        }
        assert!(state.entity(id).is_none());
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Removed { id }).count(), 1);
    }

    #[test]
    fn test_collision_damage_kill_without_despawn() {
        let mut state = empty_state(None);
        let a = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(390.0, 300.0));
        let b = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(405.0, 300.0));
        state.entity_mut(a).expect("a").health = 0.5;
        state.entity_mut(a).expect("a").vel = Vec2::new(5.0, 0.0);
        state.entity_mut(b).expect("b").vel = Vec2::new(-5.0, 0.0);

        let settings = Settings {
            despawn_animation: false,
            ..no_gravity()
        };
        step(&mut state, &mut DrawList::new(), &settings, FRAME, &mut NoHooks);
        assert!(state.entity(a).is_none());
        assert!(state.entity(b).is_some());
        assert_eq!(state.collision_count, 1);
    }

    #[test]
    fn test_emitters_fire_and_expire() {
        let mut state = empty_state(Some(
            r#"{"type": "bulletHell", "timeLimitSec": 60,
                "emitters": [{"x": "center", "y": "top", "intervalMs": 50, "lifetimeMs": 100, "maxAlive": 2}]}"#,
        ));
        let player = state.add_entity(EntitySpawn::new(10.0, 0.0, 800.0, 600.0).at(400.0, 500.0));
        state.entity_mut(player).expect("player").is_player = true;

        let settings = Settings {
            despawn_animation: false,
            ..no_gravity()
        };
        let projectiles = |s: &GameState| s.entities.iter().filter(|b| b.is_projectile).count();

        for _ in 0..4 {
            step(&mut state, &mut DrawList::new(), &settings, 20.0, &mut NoHooks);
        }
        // First shot at 60ms, aimed down at the player
        assert_eq!(projectiles(&state), 1);
        let shot = state.entities.iter().find(|b| b.is_projectile).expect("projectile");
        assert!(shot.vel.y > 0.0 && shot.vel.x.abs() < 1e-3);

        for _ in 0..10 {
            step(&mut state, &mut DrawList::new(), &settings, 20.0, &mut NoHooks);
            assert!(projectiles(&state) <= 2);
        }
        // Lifetime is 100ms, so the first projectile is gone
        assert!(state.entities.iter().all(|b| !b.is_projectile || state.now_ms - b.spawned_at <= 100.0));
    }

    #[test]
    fn test_run_frame_stops_when_paused_or_over() {
        let mut state = empty_state(None);
        state.add_entity(EntitySpawn::new(10.0, 2.0, 800.0, 600.0));
        let mut clock = FrameClock::new(None);
        let settings = Settings::default();
        let mut canvas = DrawList::new();

        assert!(run_frame(&mut state, &mut clock, 0.0, &mut canvas, &settings, &mut NoHooks));
        assert!(run_frame(&mut state, &mut clock, 16.0, &mut canvas, &settings, &mut NoHooks));
        let t = state.now_ms;

        clock.pause();
        assert!(!run_frame(&mut state, &mut clock, 10_000.0, &mut canvas, &settings, &mut NoHooks));
        assert_eq!(state.now_ms, t);

        clock.resume();
        assert!(run_frame(&mut state, &mut clock, 10_016.0, &mut canvas, &settings, &mut NoHooks));
        assert!(state.now_ms - t < 20.0);

        state.phase = GamePhase::Lost;
        assert!(!run_frame(&mut state, &mut clock, 10_032.0, &mut canvas, &settings, &mut NoHooks));
    }
}
