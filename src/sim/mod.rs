//! Physics and game-rule engine
//!
//! Everything here is driven by the simulated clock in `GameState` and a
//! seeded RNG; the only outputs are entity mutation, draw calls through
//! `renderer::Canvas` and `StepHooks` notifications.

pub mod anim;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod events;
pub mod geometry;
pub mod interact;
pub mod jump;
pub mod level;
pub mod state;
pub mod tick;

pub use anim::{Ease, Easing, Keyframe, Pose, Timeline};
pub use clock::FrameClock;
pub use collision::{CollisionCtx, CollisionResult, Outcomes, handle_ball_collision, resolve_pairs, solve_collisions};
pub use entity::{AnimEvent, Ball, ControlTuning, Rect, Shape, UpdateParams};
pub use events::{GameEvent, NoHooks, StepHooks};
pub use geometry::{PosExpr, resolve_axis, resolve_level_pos};
pub use interact::{Rules, apply_powerup, apply_powerup_pickups};
pub use jump::{Denied, JumpOutcome, JumpState};
pub use level::{Emitter, Level, LevelObject, LevelType, Powerup, PowerupKind, ResolvedLevel, StaticShape};
pub use state::{EntityPatch, EntitySpawn, GamePhase, GameState, SeedOptions};
pub use tick::{run_frame, step};
