//! Fire-and-forget notifications raised during a step
//!
//! Hosts implement `StepHooks` for the callbacks they care about, or pass a
//! `Vec<GameEvent>` and drain it after the step.

use super::level::PowerupKind;

/// Something worth telling the host about (audio, score display, UI)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// Two entities collided hard enough to resolve
    Collision { a: u32, b: u32, impact: f32 },
    /// An entity bounced off a wall
    WallHit { id: u32 },
    /// A non-player entity was cleared into a goal
    Scored { id: u32 },
    /// An entity left the simulation
    Removed { id: u32 },
    Powerup { id: u32, kind: PowerupKind },
    /// The player's shield absorbed a goal
    ShieldConsumed { id: u32 },
    PlayerLost,
    Won,
}

/// Step callbacks; every method defaults to a no-op
pub trait StepHooks {
    /// Once per resolved entity-entity collision
    fn on_score(&mut self, _a: u32, _b: u32, _impact: f32) {}
    fn on_wall_hit(&mut self, _id: u32) {}
    fn on_scored(&mut self, _id: u32) {}
    fn on_removed(&mut self, _id: u32) {}
    fn on_powerup(&mut self, _id: u32, _kind: PowerupKind) {}
    fn on_shield_consumed(&mut self, _id: u32) {}
    fn on_player_lose(&mut self) {}
    fn on_win(&mut self) {}
}

/// Hooks that ignore everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl StepHooks for NoHooks {}

impl StepHooks for Vec<GameEvent> {
    fn on_score(&mut self, a: u32, b: u32, impact: f32) {
        self.push(GameEvent::Collision { a, b, impact });
    }

    fn on_wall_hit(&mut self, id: u32) {
        self.push(GameEvent::WallHit { id });
    }

    fn on_scored(&mut self, id: u32) {
        self.push(GameEvent::Scored { id });
    }

    fn on_removed(&mut self, id: u32) {
        self.push(GameEvent::Removed { id });
    }

    fn on_powerup(&mut self, id: u32, kind: PowerupKind) {
        self.push(GameEvent::Powerup { id, kind });
    }

    fn on_shield_consumed(&mut self, id: u32) {
        self.push(GameEvent::ShieldConsumed { id });
    }

    fn on_player_lose(&mut self) {
        self.push(GameEvent::PlayerLost);
    }

    fn on_win(&mut self) {
        self.push(GameEvent::Won);
    }
}
