//! Collision detection and response for balls against rectangles
//!
//! The tricky part of a brick breaker: finding a contact normal between a
//! circle and an axis-aligned rectangle that stays well defined when the
//! circle center sits inside or exactly on the rectangle.

use glam::Vec2;

use super::rect::Rect;
use crate::polar;

/// Rectangle edge, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// Outward axis normal of the edge
    pub fn normal(self) -> Vec2 {
        match self {
            Edge::Left => Vec2::new(-1.0, 0.0),
            Edge::Right => Vec2::new(1.0, 0.0),
            Edge::Top => Vec2::new(0.0, -1.0),
            Edge::Bottom => Vec2::new(0.0, 1.0),
        }
    }
}

/// Edge of `rect` nearest to `p`; ties resolve left, right, top, bottom.
fn nearest_edge(p: Vec2, rect: &Rect) -> Edge {
    let left = p.x - rect.left;
    let right = rect.right - p.x;
    let top = p.y - rect.top;
    let bottom = rect.bottom - p.y;

    let mini = left.min(right).min(top).min(bottom);
    if mini == left {
        Edge::Left
    } else if mini == right {
        Edge::Right
    } else if mini == top {
        Edge::Top
    } else {
        Edge::Bottom
    }
}

/// Contact normal between a circle and a rectangle
///
/// Returns `None` when the circle does not overlap the rectangle (a circle
/// exactly `radius` away is not a contact). Otherwise returns a unit normal
/// pointing out of the rectangle.
pub fn circle_rect_normal(center: Vec2, radius: f32, rect: &Rect) -> Option<Vec2> {
    let mut closest = rect.clamp_point(center);
    let d = center - closest;

    if d.length_squared() >= radius * radius {
        return None;
    }

    if closest != center {
        if let Some(normal) = d.try_normalize() {
            return Some(normal);
        }
    }

    // Center inside the rectangle: push it out through the nearest edge
    let edge = nearest_edge(center, rect);
    match edge {
        Edge::Left => closest.x = rect.left,
        Edge::Right => closest.x = rect.right,
        Edge::Top => closest.y = rect.top,
        Edge::Bottom => closest.y = rect.bottom,
    }

    // Zero when the center lies exactly on the edge
    Some((closest - center).try_normalize().unwrap_or(edge.normal()))
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Response of a moving body to a contact normal
///
/// `None` when the body already moves away from the surface, which keeps a
/// lingering overlap from re-triggering on consecutive frames. Otherwise the
/// velocity after the hit: reflected for solid targets, unchanged for the rest.
pub fn bounce(velocity: Vec2, normal: Vec2, solid: bool) -> Option<Vec2> {
    let along_normal = velocity.dot(normal);
    if along_normal >= 0.0 {
        return None;
    }
    if solid {
        Some(velocity - 2.0 * along_normal * normal)
    } else {
        Some(velocity)
    }
}

/// Bounce angle in degrees for a hit `offset` from the paddle center
///
/// `offset` is in paddle half-widths; it is clamped to `±max_offset` and
/// quantized to `steps` levels per unit (0 disables quantization). A center hit
/// gives 90°, hits toward the right edge give smaller angles.
pub fn bounce_angle(offset: f32, steps: u32, max_offset: f32) -> f32 {
    let mut offset = offset.clamp(-max_offset, max_offset);
    if steps > 0 {
        let n = steps as f32;
        offset = (offset * n).round() / n;
    }
    (1.0 - offset) * 90.0
}

/// Retro paddle bounce: the new direction only depends on where the ball hit
///
/// Returns a unit vector heading up the screen.
pub fn paddle_bounce(ball_center_x: f32, paddle: &Rect, steps: u32, max_offset: f32) -> Vec2 {
    let offset = (ball_center_x - paddle.center().x) / paddle.width() * 2.0;
    polar(1.0, -bounce_angle(offset, steps, max_offset))
}
