//! Shape generation for entities and level objects

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use super::Canvas;
use super::vertex::{Vertex, colors};
use crate::sim::entity::{Ball, Shape};
use crate::sim::level::{ResolvedObject, StaticShape};

/// Segments used for circles
pub const CIRCLE_SEGMENTS: u32 = 32;

/// Star inner radius as a fraction of the outer radius
const STAR_INNER: f32 = 0.45;

fn regular(center: Vec2, radius: f32, sides: u32, start: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let theta = start + (i as f32 / sides as f32) * 2.0 * PI;
            center + Vec2::from_angle(theta) * radius
        })
        .collect()
}

/// Outline points for a shape inscribed in a circle of `radius`
///
/// `rotation` spins the outline about `center`; every outline vertex lies
/// on or inside the circle so drawing never exceeds the collision radius.
pub fn shape_outline(shape: Shape, center: Vec2, radius: f32, rotation: f32) -> Vec<Vec2> {
    // Screen y points down, so -PI/2 is "up"
    let up = -FRAC_PI_2 + rotation;
    match shape {
        Shape::Circle => regular(center, radius, CIRCLE_SEGMENTS, rotation),
        Shape::Square => regular(center, radius, 4, FRAC_PI_4 + rotation),
        Shape::Triangle => regular(center, radius, 3, up),
        Shape::Diamond => {
            let rot = Vec2::from_angle(rotation);
            [
                Vec2::new(0.0, -radius),
                Vec2::new(radius * 0.7, 0.0),
                Vec2::new(0.0, radius),
                Vec2::new(-radius * 0.7, 0.0),
            ]
            .into_iter()
            .map(|p| center + rot.rotate(p))
            .collect()
        }
        Shape::Pentagon => regular(center, radius, 5, up),
        Shape::Hexagon => regular(center, radius, 6, rotation),
        Shape::Octagon => regular(center, radius, 8, PI / 8.0 + rotation),
        Shape::Star => (0..10)
            .map(|i| {
                let r = if i % 2 == 0 { radius } else { radius * STAR_INNER };
                let theta = up + i as f32 * PI / 5.0;
                center + Vec2::from_angle(theta) * r
            })
            .collect(),
    }
}

/// Squash/stretch points about `center` along the axis at `angle`
pub fn deform(points: &mut [Vec2], center: Vec2, angle: f32, scale_x: f32, scale_y: f32) {
    if scale_x == 1.0 && scale_y == 1.0 {
        return;
    }
    let axis = Vec2::from_angle(angle);
    let inverse = Vec2::new(axis.x, -axis.y);
    for p in points.iter_mut() {
        let local = inverse.rotate(*p - center);
        let scaled = Vec2::new(local.x * scale_x, local.y * scale_y);
        *p = center + axis.rotate(scaled);
    }
}

/// Outline of an entity with its current deformation applied
pub fn ball_outline(ball: &Ball) -> Vec<Vec2> {
    let mut points = shape_outline(ball.shape, ball.pos, ball.size, ball.rotation);
    deform(&mut points, ball.pos, ball.deform_angle, ball.scale_x, ball.scale_y);
    points
}

/// Fill color for an entity this frame
pub fn ball_color(ball: &Ball, now: f64, is_player: bool) -> [f32; 4] {
    let mut color = if ball.is_flashing(now) {
        colors::FLASH
    } else if is_player && ball.color == colors::BALL {
        colors::PLAYER
    } else {
        ball.color
    };
    color[3] *= ball.opacity.clamp(0.0, 1.0);
    color
}

/// Draw one entity (plus its shield ring)
pub fn draw_ball(canvas: &mut dyn Canvas, ball: &Ball, now: f64, is_player: bool) {
    if ball.opacity <= 0.0 {
        return;
    }
    if ball.has_shield(now) {
        let mut ring = colors::SHIELD_RING;
        ring[3] *= ball.opacity;
        canvas.fill_circle(ball.pos, ball.effective_radius() * 1.25, ring);
    }
    canvas.fill_polygon(&ball_outline(ball), ball_color(ball, now, is_player));
}

/// Draw a hazard, goal or powerup
pub fn draw_static(canvas: &mut dyn Canvas, obj: &ResolvedObject) {
    match obj.shape {
        StaticShape::Circle { radius } => canvas.fill_circle(obj.pos, radius, obj.color),
        StaticShape::Box { .. } => {
            let half = obj.shape.half_extents();
            canvas.fill_rect(obj.pos - half, half * 2.0, obj.color);
        }
    }
}

/// Triangulate a convex or star-shaped outline as a fan around its centroid
pub fn fan(points: &[Vec2], color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 3 {
        return Vec::new();
    }
    let center = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    let mut vertices = Vec::with_capacity(points.len() * 3);

    for (i, p1) in points.iter().enumerate() {
        let p2 = points[(i + 1) % points.len()];

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(p1.x, p1.y, color));
        vertices.push(Vertex::new(p2.x, p2.y, color));
    }

    vertices
}

/// Outline of a circle as a `CIRCLE_SEGMENTS`-gon
pub fn circle_outline(center: Vec2, radius: f32) -> Vec<Vec2> {
    regular(center, radius, CIRCLE_SEGMENTS, 0.0)
}
