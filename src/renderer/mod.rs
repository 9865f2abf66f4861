//! Draw geometry
//!
//! The simulation draws through the `Canvas` trait. `DrawList` is the
//! built-in canvas: it triangulates everything into `Vertex` lists a GPU or
//! software backend can upload as-is.

pub mod shapes;
pub mod vertex;

pub use vertex::{Vertex, colors};

use glam::Vec2;

/// Drawing surface the frame orchestrator renders into
pub trait Canvas {
    /// Start a frame: blend `color` over the previous frame with `alpha`
    /// (1 clears completely, lower values leave motion trails)
    fn fade(&mut self, color: [f32; 4], alpha: f32);

    /// Fill a convex or star-shaped outline
    fn fill_polygon(&mut self, points: &[Vec2], color: [f32; 4]);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        self.fill_polygon(&shapes::circle_outline(center, radius), color);
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: [f32; 4]) {
        let max = min + size;
        self.fill_polygon(
            &[min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            color,
        );
    }
}

/// Triangle list for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Background of the last fade
    pub background: [f32; 4],
    /// Alpha of the last fade
    pub fade_alpha: f32,
    pub vertices: Vec<Vertex>,
    /// Shapes drawn this frame
    pub draw_calls: usize,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes for a vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Canvas for DrawList {
    fn fade(&mut self, color: [f32; 4], alpha: f32) {
        self.background = color;
        self.fade_alpha = alpha.clamp(0.0, 1.0);
        self.vertices.clear();
        self.draw_calls = 0;
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: [f32; 4]) {
        let triangles = shapes::fan(points, color);
        if !triangles.is_empty() {
            self.vertices.extend(triangles);
            self.draw_calls += 1;
        }
    }
}
