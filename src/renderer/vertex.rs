//! Vertex types for 2D draw geometry

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// Bytes per vertex in an upload buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const BALL: [f32; 4] = [0.4, 0.7, 1.0, 1.0];
    pub const PLAYER: [f32; 4] = [0.2, 0.9, 0.4, 1.0];
    pub const PROJECTILE: [f32; 4] = [1.0, 0.5, 0.2, 1.0];
    /// Hazard hit
    pub const FLASH: [f32; 4] = [1.0, 0.15, 0.15, 1.0];
    pub const SHIELD_RING: [f32; 4] = [0.5, 0.8, 1.0, 0.35];

    pub const HAZARD: [f32; 4] = [0.9, 0.2, 0.25, 1.0];
    pub const GOAL: [f32; 4] = [0.95, 0.85, 0.3, 1.0]; // Gold
    pub const POWERUP_SHIELD: [f32; 4] = [0.3, 0.6, 1.0, 1.0];
    pub const POWERUP_SPEED: [f32; 4] = [1.0, 0.6, 0.1, 1.0];
    pub const POWERUP_SHRINK: [f32; 4] = [0.7, 0.4, 0.9, 1.0];
    pub const POWERUP_HEALTH: [f32; 4] = [0.3, 0.9, 0.4, 1.0];

    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}
