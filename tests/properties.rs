//! Physical invariants checked over random inputs

use glam::Vec2;
use gravity_gauntlet::sim::interact::{Rules, hit_hazard};
use gravity_gauntlet::sim::{Ball, CollisionCtx, NoHooks, UpdateParams, handle_ball_collision, resolve_pairs};
use gravity_gauntlet::{DeformationSettings, PhysicsConfig};
use proptest::prelude::*;

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 600.0;

fn params<'a>(
    physics: &'a PhysicsConfig,
    deformation: &'a DeformationSettings,
    gravity: f32,
    max_velocity: f32,
) -> UpdateParams<'a> {
    UpdateParams {
        width: WIDTH,
        height: HEIGHT,
        gravity,
        max_velocity,
        now: 0.0,
        physics,
        deformation,
        exclusion: None,
        animate: true,
    }
}

fn kinetic_energy(balls: &[&Ball]) -> f32 {
    balls
        .iter()
        .map(|b| 0.5 * b.size * b.vel.length_squared())
        .sum()
}

proptest! {
    #[test]
    fn prop_velocity_never_exceeds_cap(
        x in 30.0f32..770.0,
        y in 30.0f32..570.0,
        vx in -80.0f32..80.0,
        vy in -80.0f32..80.0,
        size in 2.0f32..25.0,
        gravity in 0.0f32..2.0,
        max_velocity in 1.0f32..30.0,
        boosted in any::<bool>(),
        player in any::<bool>(),
    ) {
        let physics = PhysicsConfig { min_player_rebound: 4.0, ..PhysicsConfig::default() };
        let deformation = DeformationSettings::default();
        let mut ball = Ball::new(1, Vec2::new(x, y), Vec2::new(vx, vy), size);
        ball.is_player = player;
        if boosted {
            ball.speed_until = 1000.0;
        }
        let cap = ball.velocity_cap(max_velocity, 0.0);

        for _ in 0..5 {
            ball.update(&params(&physics, &deformation, gravity, max_velocity));
            prop_assert!(ball.vel.x.abs() <= cap + 1e-4, "vx {} cap {}", ball.vel.x, cap);
            prop_assert!(ball.vel.y.abs() <= cap + 1e-4, "vy {} cap {}", ball.vel.y, cap);
        }
    }

    #[test]
    fn prop_entity_stays_inside_canvas(
        x in 30.0f32..770.0,
        y in 30.0f32..570.0,
        vx in -40.0f32..40.0,
        vy in -40.0f32..40.0,
        size in 2.0f32..25.0,
    ) {
        let physics = PhysicsConfig::default();
        let deformation = DeformationSettings::default();
        let mut ball = Ball::new(1, Vec2::new(x, y), Vec2::new(vx, vy), size);
        for _ in 0..60 {
            ball.update(&params(&physics, &deformation, 0.4, 15.0));
            let r = ball.effective_radius();
            prop_assert!(ball.pos.x >= r && ball.pos.x <= WIDTH - r);
            prop_assert!(ball.pos.y >= r && ball.pos.y <= HEIGHT - r);
        }
    }

    #[test]
    fn prop_health_monotonic_and_non_negative(
        hits in proptest::collection::vec(-1.0f32..1.5, 1..20),
    ) {
        let rules = Rules { player: None, sandbox: false, despawn_animation: true, animate: true, now: 0.0 };
        let mut ball = Ball::new(1, Vec2::ZERO, Vec2::ZERO, 10.0);
        let mut previous = ball.health;
        for multiplier in hits {
            hit_hazard(&mut ball, multiplier, &rules);
            prop_assert!(ball.health <= previous);
            prop_assert!(ball.health >= 0.0);
            previous = ball.health;
        }
    }

    #[test]
    fn prop_no_residual_penetration(
        ax in 100.0f32..700.0,
        ay in 100.0f32..500.0,
        angle in 0.0f32..std::f32::consts::TAU,
        overlap in 0.05f32..0.95,
        ra in 3.0f32..30.0,
        rb in 3.0f32..30.0,
        va in (-10.0f32..10.0, -10.0f32..10.0),
        vb in (-10.0f32..10.0, -10.0f32..10.0),
        b_static in any::<bool>(),
    ) {
        let physics = PhysicsConfig::default();
        let deformation = DeformationSettings::default();
        let ctx = CollisionCtx { physics: &physics, deformation: &deformation, animate: true, health_enabled: true, now: 0.0 };

        let dist = (ra + rb) * (1.0 - overlap);
        let a = Ball::new(1, Vec2::new(ax, ay), Vec2::new(va.0, va.1), ra);
        let mut b = Ball::new(2, Vec2::new(ax, ay) + Vec2::from_angle(angle) * dist, Vec2::new(vb.0, vb.1), rb);
        b.is_static = b_static;
        let mut balls = vec![a, b];

        resolve_pairs(&mut balls, &ctx, &mut NoHooks);

        let separation = balls[0].pos.distance(balls[1].pos);
        prop_assert!(separation >= ra + rb - 1e-3, "separation {} radii {}", separation, ra + rb);
    }

    #[test]
    fn prop_collision_energy_non_increasing(
        ra in 3.0f32..30.0,
        rb in 3.0f32..30.0,
        va in (-10.0f32..10.0, -10.0f32..10.0),
        vb in (-10.0f32..10.0, -10.0f32..10.0),
        elasticity in 0.0f32..1.0,
    ) {
        let physics = PhysicsConfig { elasticity, ..PhysicsConfig::default() };
        let deformation = DeformationSettings::default();
        let ctx = CollisionCtx { physics: &physics, deformation: &deformation, animate: false, health_enabled: false, now: 0.0 };

        let mut a = Ball::new(1, Vec2::new(300.0, 300.0), Vec2::new(va.0, va.1), ra);
        let mut b = Ball::new(2, Vec2::new(300.0 + (ra + rb) * 0.9, 300.0), Vec2::new(vb.0, vb.1), rb);
        let before = kinetic_energy(&[&a, &b]);

        handle_ball_collision(&mut a, &mut b, &ctx);

        let after = kinetic_energy(&[&a, &b]);
        prop_assert!(after <= before * (1.0 + 1e-4) + 1e-3, "before {} after {}", before, after);
    }

    #[test]
    fn prop_wall_bounce_never_gains_speed(
        x in 30.0f32..770.0,
        y in 30.0f32..570.0,
        vx in -15.0f32..15.0,
        vy in -15.0f32..15.0,
        size in 2.0f32..25.0,
    ) {
        let physics = PhysicsConfig::default();
        let deformation = DeformationSettings::default();
        let mut ball = Ball::new(1, Vec2::new(x, y), Vec2::new(vx, vy), size);
        for _ in 0..30 {
            let before = ball.vel.length();
            ball.update(&params(&physics, &deformation, 0.0, 15.0));
            prop_assert!(ball.vel.length() <= before + 1e-4);
        }
    }

    #[test]
    fn prop_dropped_ball_never_climbs_above_drop_height(
        x in 30.0f32..770.0,
        y in 300.0f32..570.0,
        vx in -5.0f32..5.0,
        size in 2.0f32..25.0,
        gravity in 0.05f32..2.5,
    ) {
        let physics = PhysicsConfig::default();
        let deformation = DeformationSettings::default();
        let mut p = params(&physics, &deformation, gravity, 15.0);
        // Squash grows the collision radius; keep the height comparison pure
        p.animate = false;
        let mut ball = Ball::new(1, Vec2::new(x, y), Vec2::new(vx, 0.0), size);
        for _ in 0..400 {
            ball.update(&p);
            prop_assert!(ball.pos.y >= y - gravity - 1e-3, "y {} dropped from {}", ball.pos.y, y);
        }
    }
}
