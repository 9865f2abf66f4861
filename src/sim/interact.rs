//! Level interaction rules: hazards, goals and powerups
//!
//! The collision resolver decides *when* an entity touches a level object;
//! this module decides what that contact does to the entity and the game.

use super::entity::Ball;
use super::events::StepHooks;
use super::level::{Level, PowerupKind, ResolvedLevel, StaticKind};
use crate::consts::*;

/// Rule switches for hazard and goal contacts
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// Id of the entity treated as the player
    pub player: Option<u32>,
    /// The player survives damage and goals
    pub sandbox: bool,
    /// Play the pop animation instead of removing immediately
    pub despawn_animation: bool,
    /// Use tweened timelines (false = linear fade fallback)
    pub animate: bool,
    pub now: f64,
}

impl Rules {
    pub fn is_player(&self, ball: &Ball) -> bool {
        self.player == Some(ball.id)
    }
}

/// What a hazard hit did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardOutcome {
    Survived,
    /// Non-player removed on the spot
    RemoveNow,
    /// Non-player started its despawn animation
    Despawning,
    /// Player killed outside sandbox
    PlayerKilled,
}

/// What a goal contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    /// Non-player cleared: score it and remove it
    Scored,
    /// Player protected by an active shield (now consumed)
    ShieldAbsorbed,
    /// Player protected by sandbox rules
    Deflected,
    PlayerLost,
}

/// Damage an entity that touched a hazard. `multiplier * 100` HP is removed.
pub fn hit_hazard(ball: &mut Ball, multiplier: f32, rules: &Rules) -> HazardOutcome {
    let dead = ball.take_damage(multiplier.max(0.0) * 100.0);
    ball.flash_until = rules.now + HAZARD_FLASH_MS;
    if !dead {
        return HazardOutcome::Survived;
    }
    kill(ball, rules)
}

/// Decide what 0 health means for this entity
pub fn kill(ball: &mut Ball, rules: &Rules) -> HazardOutcome {
    if rules.is_player(ball) {
        if rules.sandbox {
            HazardOutcome::Survived
        } else {
            HazardOutcome::PlayerKilled
        }
    } else if ball.is_despawning {
        HazardOutcome::Despawning
    } else if rules.despawn_animation {
        ball.pop_and_despawn(rules.now, rules.animate);
        HazardOutcome::Despawning
    } else {
        HazardOutcome::RemoveNow
    }
}

/// Resolve an entity reaching a goal
pub fn reach_goal(ball: &mut Ball, rules: &Rules) -> GoalOutcome {
    if !rules.is_player(ball) {
        return GoalOutcome::Scored;
    }
    if ball.has_shield(rules.now) {
        ball.shield_until = 0.0;
        log::debug!("Ball {} shield absorbed a goal", ball.id);
        return GoalOutcome::ShieldAbsorbed;
    }
    if rules.sandbox {
        return GoalOutcome::Deflected;
    }
    GoalOutcome::PlayerLost
}

/// Apply a powerup effect to one entity
pub fn apply_powerup(ball: &mut Ball, kind: PowerupKind, now: f64) {
    match kind {
        PowerupKind::Shield => ball.shield_until = now + SHIELD_DURATION_MS,
        PowerupKind::Speed => ball.speed_until = now + SPEED_DURATION_MS,
        PowerupKind::Shrink => {
            // Re-shrinking only extends the timer
            if ball.shrink_until <= 0.0 {
                ball.base_size = ball.size;
                ball.size = (ball.base_size * SHRINK_FACTOR).max(1.0);
            }
            ball.shrink_until = now + SHRINK_DURATION_MS;
        }
        PowerupKind::Health => ball.heal(HEALTH_RESTORE),
    }
}

/// Pick up every powerup the player overlaps
///
/// Consumed powerups are removed from `level.powerups`; the resolved cache
/// goes stale and is rebuilt on the next step.
pub fn apply_powerup_pickups(
    balls: &mut [Ball],
    level: &mut Level,
    resolved: &ResolvedLevel,
    player: Option<u32>,
    now: f64,
    propagate_speed: bool,
    hooks: &mut dyn StepHooks,
) -> Vec<PowerupKind> {
    let Some(player_idx) = player.and_then(|id| balls.iter().position(|b| b.id == id)) else {
        return Vec::new();
    };
    if balls[player_idx].is_despawning {
        return Vec::new();
    }

    let (pos, radius) = {
        let p = &balls[player_idx];
        (p.pos, p.effective_radius())
    };

    let mut hits: Vec<(usize, PowerupKind)> = resolved
        .powerups
        .iter()
        .filter(|obj| obj.pos.distance(pos) < radius + obj.shape.bounding_radius())
        .filter_map(|obj| match obj.kind {
            StaticKind::Powerup(kind) => Some((obj.index, kind)),
            _ => None,
        })
        .collect();

    // Remove from the back so earlier indices stay valid
    hits.sort_by(|a, b| b.0.cmp(&a.0));

    let mut taken = Vec::with_capacity(hits.len());
    for (index, kind) in hits {
        if level.take_powerup(index).is_none() {
            continue;
        }
        let player_id = balls[player_idx].id;
        if kind == PowerupKind::Speed && propagate_speed {
            for ball in balls.iter_mut().filter(|b| !b.is_despawning) {
                apply_powerup(ball, kind, now);
            }
        } else {
            apply_powerup(&mut balls[player_idx], kind, now);
        }
        log::debug!("Ball {} picked up {:?}", player_id, kind);
        hooks.on_powerup(player_id, kind);
        taken.push(kind);
    }
    taken
}
