//! Collision detection and response
//!
//! Entity-entity contacts are solved in several passes per frame so stacks
//! settle; entity-static contacts (hazards, goals) are solved once per frame
//! because they carry game effects.

use glam::Vec2;

use super::entity::{Ball, circle_box_contact};
use super::events::StepHooks;
use super::interact::{GoalOutcome, HazardOutcome, Rules, hit_hazard, reach_goal};
use super::level::{ResolvedLevel, ResolvedObject, StaticKind, StaticShape};
use crate::consts::*;
use crate::settings::{DeformationSettings, PhysicsConfig};
use crate::{contact_normal, reflect};

/// Result of a contact test
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal pointing toward the ball center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    fn hit(normal: Vec2, penetration: f32) -> Self {
        Self {
            hit: true,
            normal,
            penetration,
        }
    }
}

/// Physics inputs shared by every contact this frame
#[derive(Debug, Clone, Copy)]
pub struct CollisionCtx<'a> {
    pub physics: &'a PhysicsConfig,
    pub deformation: &'a DeformationSettings,
    /// Deformation timelines may run
    pub animate: bool,
    /// Entity-entity hits cost health
    pub health_enabled: bool,
    pub now: f64,
}

/// Effects of one frame's collisions, applied by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcomes {
    /// Resolved entity-entity collisions
    pub collisions: u32,
    /// Entities cleared into goals
    pub scored: u32,
    /// Entities to drop from the collection right away
    pub removed: Vec<u32>,
    pub player_lost: bool,
}

/// Circle of radius `radius` at `pos` against a resolved level object
pub fn static_contact(pos: Vec2, radius: f32, obj: &ResolvedObject) -> CollisionResult {
    match obj.shape {
        StaticShape::Circle { radius: obj_radius } => {
            let combined = radius + obj_radius;
            let (normal, dist) = contact_normal(obj.pos, pos);
            if dist < combined {
                CollisionResult::hit(normal, combined - dist)
            } else {
                CollisionResult::miss()
            }
        }
        StaticShape::Box { .. } => {
            let half = obj.shape.half_extents();
            match circle_box_contact(pos, radius, obj.pos - half, obj.pos + half) {
                Some((normal, depth)) => CollisionResult::hit(normal, depth),
                None => CollisionResult::miss(),
            }
        }
    }
}

/// Run every collision pass for one frame
pub fn solve_collisions(
    balls: &mut [Ball],
    level: Option<&ResolvedLevel>,
    ctx: &CollisionCtx,
    rules: &Rules,
    hooks: &mut dyn StepHooks,
) -> Outcomes {
    let mut outcomes = Outcomes::default();
    for _ in 0..ctx.physics.iterations.max(1) {
        outcomes.collisions += resolve_pairs(balls, ctx, hooks);
    }
    if let Some(level) = level {
        resolve_static_contacts(balls, level, ctx, rules, hooks, &mut outcomes);
    }
    outcomes
}

/// One pass over every unordered pair. Returns resolved collisions.
pub fn resolve_pairs(balls: &mut [Ball], ctx: &CollisionCtx, hooks: &mut dyn StepHooks) -> u32 {
    let mut resolved = 0;
    let n = balls.len();

    for j in 1..n {
        let (head, tail) = balls.split_at_mut(j);
        let b = &mut tail[0];
        for a in head.iter_mut() {
            if a.is_despawning || b.is_despawning || (a.is_static && b.is_static) {
                continue;
            }

            let delta = b.pos - a.pos;
            let dist = delta.length();
            let radii = a.effective_radius() + b.effective_radius();
            if dist >= radii || dist <= 0.0 {
                continue;
            }

            let normal = delta / dist;
            separate(a, b, normal, radii - dist);
            a.wake();
            b.wake();

            let approach = (b.vel - a.vel).dot(normal);
            if approach < 0.0 {
                let impact = handle_ball_collision(a, b, ctx);
                resolved += 1;
                hooks.on_score(a.id, b.id, impact);
            } else {
                apply_contact_friction(a, b, normal);
            }
        }
    }

    resolved
}

/// Push two overlapping balls apart along `normal` (from `a` to `b`)
fn separate(a: &mut Ball, b: &mut Ball, normal: Vec2, overlap: f32) {
    match (a.is_static, b.is_static) {
        (true, true) => {}
        (true, false) => b.pos += normal * overlap,
        (false, true) => a.pos -= normal * overlap,
        (false, false) => {
            a.pos -= normal * (overlap / 2.0);
            b.pos += normal * (overlap / 2.0);
        }
    }
}

/// Resolve an approaching pair: buffer separation, mass-weighted restitution,
/// deformation and damage. Returns the normal impact speed.
pub fn handle_ball_collision(a: &mut Ball, b: &mut Ball, ctx: &CollisionCtx) -> f32 {
    let (normal, dist) = contact_normal(a.pos, b.pos);
    let target = a.effective_radius() + b.effective_radius() + SEPARATION_BUFFER;
    if dist < target {
        separate(a, b, normal, target - dist);
    }

    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return 0.0;
    }

    let approach = (b.vel - a.vel).dot(normal);
    if approach >= 0.0 {
        return 0.0;
    }
    let impact = -approach;

    // Impulse form of the 1-D restitution formula with m = size
    let e = ctx.physics.elasticity.clamp(0.0, 1.0);
    let j = (1.0 + e) * impact / inv_sum;
    a.vel -= normal * (j * inv_a);
    b.vel += normal * (j * inv_b);

    if ctx.animate {
        a.apply_ball_deformation(impact, -normal, ctx.now, ctx.deformation);
        b.apply_ball_deformation(impact, normal, ctx.now, ctx.deformation);
    }

    if ctx.health_enabled {
        let intensity = (impact / IMPACT_REFERENCE_SPEED).min(1.0);
        let damage = intensity * ctx.physics.collision_damage * 100.0;
        a.take_damage(damage);
        b.take_damage(damage);
    }

    impact
}

/// Resting contact: damp relative sliding so touching balls stop jittering
fn apply_contact_friction(a: &mut Ball, b: &mut Ball, normal: Vec2) {
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }
    let tangent = normal.perp();
    let slide = (b.vel - a.vel).dot(tangent);
    let correction = (slide * TANGENT_FRICTION).clamp(-TANGENT_FRICTION_CAP, TANGENT_FRICTION_CAP);
    a.vel += tangent * (correction * inv_a / inv_sum);
    b.vel -= tangent * (correction * inv_b / inv_sum);
}

/// Every dynamic ball against every hazard and goal
pub fn resolve_static_contacts(
    balls: &mut [Ball],
    level: &ResolvedLevel,
    ctx: &CollisionCtx,
    rules: &Rules,
    hooks: &mut dyn StepHooks,
    outcomes: &mut Outcomes,
) {
    'balls: for ball in balls.iter_mut() {
        if ball.is_static || ball.is_despawning {
            continue;
        }

        for obj in level.hazards.iter().chain(level.goals.iter()) {
            let contact = static_contact(ball.pos, ball.effective_radius(), obj);
            if !contact.hit {
                continue;
            }
            bounce_off_static(ball, &contact, ctx);

            match obj.kind {
                StaticKind::Hazard => {
                    let multiplier = obj.damage.unwrap_or(ctx.physics.hazard_damage);
                    match hit_hazard(ball, multiplier, rules) {
                        HazardOutcome::Survived => {}
                        HazardOutcome::PlayerKilled => outcomes.player_lost = true,
                        HazardOutcome::Despawning => continue 'balls,
                        HazardOutcome::RemoveNow => {
                            outcomes.removed.push(ball.id);
                            continue 'balls;
                        }
                    }
                }
                StaticKind::Goal => match reach_goal(ball, rules) {
                    GoalOutcome::Scored => {
                        outcomes.scored += 1;
                        outcomes.removed.push(ball.id);
                        hooks.on_scored(ball.id);
                        continue 'balls;
                    }
                    GoalOutcome::ShieldAbsorbed => hooks.on_shield_consumed(ball.id),
                    GoalOutcome::Deflected => {}
                    GoalOutcome::PlayerLost => outcomes.player_lost = true,
                },
                StaticKind::Powerup(_) => {}
            }
        }
    }
}

/// Separate from a static object and reflect the approach velocity
fn bounce_off_static(ball: &mut Ball, contact: &CollisionResult, ctx: &CollisionCtx) {
    ball.pos += contact.normal * contact.penetration;
    ball.wake();
    let approach = ball.vel.dot(contact.normal);
    if approach < 0.0 {
        ball.vel = reflect(ball.vel, contact.normal);
        if ctx.animate {
            ball.apply_wall_deformation(-approach, contact.normal, ctx.now, ctx.deformation);
        }
    }
}
