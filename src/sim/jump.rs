//! Player jump and slam controller
//!
//! Standard levels give one air jump per landing. Bullet Hell swaps the flag
//! for token pools (air jumps and slams) refilled whenever the player lands.

use serde::{Deserialize, Serialize};

use super::entity::Ball;
use super::level::LevelType;
use crate::consts::*;

/// Jump bookkeeping carried by the player entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    /// Standard mode: one air jump until the next landing
    pub air_jump_available: bool,
    /// Bullet Hell air-jump tokens
    pub air_tokens: u8,
    /// Bullet Hell slam tokens
    pub slam_tokens: u8,
    /// Simulated time of the last successful jump (None = never)
    pub last_jump_at: Option<f64>,
}

impl Default for JumpState {
    fn default() -> Self {
        Self {
            air_jump_available: true,
            air_tokens: BULLET_HELL_TOKENS,
            slam_tokens: BULLET_HELL_TOKENS,
            last_jump_at: None,
        }
    }
}

impl JumpState {
    fn refill(&mut self) {
        self.air_jump_available = true;
        self.air_tokens = BULLET_HELL_TOKENS;
        self.slam_tokens = BULLET_HELL_TOKENS;
    }

    fn cooled_down(&self, now: f64, cooldown_ms: f64) -> bool {
        self.last_jump_at.is_none_or(|t| now - t >= cooldown_ms)
    }
}

/// Why a jump or slam was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    Cooldown,
    NoAirJump,
    NoSlamTokens,
    Grounded,
    /// Slams are disabled in Gravity Gauntlet
    WrongMode,
    /// No player entity
    NoPlayer,
}

/// Result of a jump or slam request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Ground,
    Air,
    Slam,
    Denied(Denied),
}

impl JumpOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, JumpOutcome::Denied(_))
    }
}

/// Touching (or within a few pixels of) the floor
pub fn is_grounded(ball: &Ball, height: f32) -> bool {
    ball.pos.y + ball.effective_radius() >= height - GROUND_TOLERANCE
}

/// Impulse magnitude for jumps and slams
pub fn jump_impulse(gravity: f32) -> f32 {
    (gravity * JUMP_GRAVITY_FACTOR).clamp(JUMP_MIN_IMPULSE, JUMP_MAX_IMPULSE)
}

/// Refill jump resources if the ball is on the floor. Returns grounded.
pub fn refresh_grounded(ball: &mut Ball, height: f32) -> bool {
    let grounded = is_grounded(ball, height);
    if grounded {
        ball.jump.refill();
    }
    grounded
}

/// Jump from the ground, or spend an air jump
pub fn jump(ball: &mut Ball, height: f32, gravity: f32, mode: LevelType, now: f64) -> JumpOutcome {
    let grounded = is_grounded(ball, height);
    let cooldown = if grounded {
        GROUND_JUMP_COOLDOWN_MS
    } else {
        AIR_JUMP_COOLDOWN_MS
    };
    if !ball.jump.cooled_down(now, cooldown) {
        return JumpOutcome::Denied(Denied::Cooldown);
    }

    let outcome = if grounded {
        ball.jump.refill();
        JumpOutcome::Ground
    } else if mode == LevelType::BulletHell {
        if ball.jump.air_tokens == 0 {
            return JumpOutcome::Denied(Denied::NoAirJump);
        }
        ball.jump.air_tokens -= 1;
        JumpOutcome::Air
    } else {
        if !ball.jump.air_jump_available {
            return JumpOutcome::Denied(Denied::NoAirJump);
        }
        ball.jump.air_jump_available = false;
        JumpOutcome::Air
    };

    ball.vel.y = -jump_impulse(gravity);
    ball.jump.last_jump_at = Some(now);
    ball.wake();
    outcome
}

/// Drive the ball toward the floor
pub fn slam(ball: &mut Ball, height: f32, gravity: f32, mode: LevelType) -> JumpOutcome {
    if mode == LevelType::GravityGauntlet {
        return JumpOutcome::Denied(Denied::WrongMode);
    }
    if is_grounded(ball, height) {
        return JumpOutcome::Denied(Denied::Grounded);
    }
    if mode == LevelType::BulletHell {
        if ball.jump.slam_tokens == 0 {
            return JumpOutcome::Denied(Denied::NoSlamTokens);
        }
        ball.jump.slam_tokens -= 1;
    }
    ball.vel.y = jump_impulse(gravity);
    ball.wake();
    JumpOutcome::Slam
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const HEIGHT: f32 = 600.0;

    fn grounded_ball() -> Ball {
        Ball::new(1, Vec2::new(400.0, 588.0), Vec2::ZERO, 10.0)
    }

    #[test]
    fn test_impulse_clamped() {
        assert_eq!(jump_impulse(0.0), JUMP_MIN_IMPULSE);
        assert_eq!(jump_impulse(0.25), 17.5);
        assert_eq!(jump_impulse(5.0), JUMP_MAX_IMPULSE);
    }

    #[test]
    fn test_double_jump_then_denied() {
        let mut ball = grounded_ball();
        assert_eq!(jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 0.0), JumpOutcome::Ground);
        assert_eq!(ball.vel.y, -17.5);

        // Airborne shortly after
        ball.pos.y = 500.0;
        assert_eq!(jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 150.0), JumpOutcome::Air);
        assert_eq!(
            jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 400.0),
            JumpOutcome::Denied(Denied::NoAirJump)
        );
    }

    #[test]
    fn test_cooldowns() {
        let mut ball = grounded_ball();
        assert!(jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 0.0).succeeded());
        // Still on the ground: ground cooldown is 280ms
        assert_eq!(
            jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 200.0),
            JumpOutcome::Denied(Denied::Cooldown)
        );
        ball.pos.y = 500.0;
        assert_eq!(
            jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 100.0),
            JumpOutcome::Denied(Denied::Cooldown)
        );
        assert!(jump(&mut ball, HEIGHT, 0.25, LevelType::Custom, 140.0).succeeded());
    }

    #[test]
    fn test_bullet_hell_tokens_refill_on_landing() {
        let mut ball = grounded_ball();
        ball.pos.y = 300.0;
        let mut t = 0.0;
        for _ in 0..BULLET_HELL_TOKENS {
            assert_eq!(jump(&mut ball, HEIGHT, 0.25, LevelType::BulletHell, t), JumpOutcome::Air);
            t += 200.0;
        }
        assert_eq!(
            jump(&mut ball, HEIGHT, 0.25, LevelType::BulletHell, t),
            JumpOutcome::Denied(Denied::NoAirJump)
        );

        ball.pos.y = 588.0;
        assert!(refresh_grounded(&mut ball, HEIGHT));
        assert_eq!(ball.jump.air_tokens, BULLET_HELL_TOKENS);
    }

    #[test]
    fn test_slam_rules() {
        let mut ball = grounded_ball();
        assert_eq!(
            slam(&mut ball, HEIGHT, 0.25, LevelType::BulletHell),
            JumpOutcome::Denied(Denied::Grounded)
        );
        ball.pos.y = 200.0;
        assert_eq!(
            slam(&mut ball, HEIGHT, 0.25, LevelType::GravityGauntlet),
            JumpOutcome::Denied(Denied::WrongMode)
        );
        assert_eq!(slam(&mut ball, HEIGHT, 0.25, LevelType::Custom), JumpOutcome::Slam);
        assert_eq!(ball.vel.y, 17.5);

        ball.jump.slam_tokens = 1;
        assert_eq!(slam(&mut ball, HEIGHT, 0.25, LevelType::BulletHell), JumpOutcome::Slam);
        assert_eq!(
            slam(&mut ball, HEIGHT, 0.25, LevelType::BulletHell),
            JumpOutcome::Denied(Denied::NoSlamTokens)
        );
    }

    #[test]
    fn test_jump_wakes_sleeping_ball() {
        let mut ball = grounded_ball();
        ball.is_sleeping = true;
        jump(&mut ball, HEIGHT, 0.4, LevelType::Custom, 0.0);
        assert!(!ball.is_sleeping);
    }
}
