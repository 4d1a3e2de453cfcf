//! Collision primitives: tags, hitboxes, precise overlap tests, reflection.
//!
//! The spatial grid only prunes; every candidate pair lands here for an exact
//! shape test. Contact normals always point from the second body toward the
//! first, so pushing the first body out along `normal * penetration`
//! separates the pair.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Closed set of collision types. Routing is a `match` on pairs of these,
/// not runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionTag {
    Player,
    Ball,
    Tile,
    Wall,
    Spring,
    Elevator,
}

impl CollisionTag {
    const fn bit(self) -> u8 {
        match self {
            CollisionTag::Player => 1 << 0,
            CollisionTag::Ball => 1 << 1,
            CollisionTag::Tile => 1 << 2,
            CollisionTag::Wall => 1 << 3,
            CollisionTag::Spring => 1 << 4,
            CollisionTag::Elevator => 1 << 5,
        }
    }
}

/// Set of tags an entity opts in to colliding with. A pair resolves when
/// either side's set contains the other's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSet(u8);

impl TagSet {
    pub const EMPTY: TagSet = TagSet(0);

    /// All tile-shaped surfaces a moving body can land on or bounce off.
    pub const SURFACES: TagSet = TagSet::EMPTY
        .with(CollisionTag::Tile)
        .with(CollisionTag::Wall)
        .with(CollisionTag::Spring)
        .with(CollisionTag::Elevator);

    pub const fn with(self, tag: CollisionTag) -> TagSet {
        TagSet(self.0 | tag.bit())
    }

    pub const fn contains(self, tag: CollisionTag) -> bool {
        self.0 & tag.bit() != 0
    }
}

/// Hitbox shape, centered on the owning entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    Rect { half: Vec2 },
    Circle { radius: f32 },
}

impl Hitbox {
    /// Half extents of the bounding AABB (what the spatial grid indexes).
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Hitbox::Rect { half } => half,
            Hitbox::Circle { radius } => Vec2::splat(radius),
        }
    }
}

/// Result of a precise overlap test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Collision point on the second body's surface.
    pub point: Vec2,
    /// Unit normal pointing from the second body toward the first.
    pub normal: Vec2,
    /// Overlap depth along the normal.
    pub penetration: f32,
}

impl Contact {
    /// Same contact seen from the other body's side.
    pub fn flipped(self) -> Contact {
        Contact {
            point: self.point,
            normal: -self.normal,
            penetration: self.penetration,
        }
    }
}

/// Precise overlap test between two positioned hitboxes.
pub fn overlap(pos_a: Vec2, a: &Hitbox, pos_b: Vec2, b: &Hitbox) -> Option<Contact> {
    match (a, b) {
        (Hitbox::Rect { half: ha }, Hitbox::Rect { half: hb }) => {
            rect_rect(pos_a, *ha, pos_b, *hb)
        }
        (Hitbox::Circle { radius: ra }, Hitbox::Circle { radius: rb }) => {
            circle_circle(pos_a, *ra, pos_b, *rb)
        }
        (Hitbox::Circle { radius }, Hitbox::Rect { half }) => {
            circle_rect(pos_a, *radius, pos_b, *half)
        }
        (Hitbox::Rect { half }, Hitbox::Circle { radius }) => {
            circle_rect(pos_b, *radius, pos_a, *half).map(Contact::flipped)
        }
    }
}

/// AABB vs AABB. Normal is along the axis of least overlap.
pub fn rect_rect(pos_a: Vec2, half_a: Vec2, pos_b: Vec2, half_b: Vec2) -> Option<Contact> {
    let diff = pos_a - pos_b;
    let overlap_x = half_a.x + half_b.x - diff.x.abs();
    let overlap_y = half_a.y + half_b.y - diff.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    if overlap_x < overlap_y {
        let sign = if diff.x >= 0.0 { 1.0 } else { -1.0 };
        Some(Contact {
            point: Vec2::new(pos_b.x + half_b.x * sign, pos_a.y),
            normal: Vec2::new(sign, 0.0),
            penetration: overlap_x,
        })
    } else {
        let sign = if diff.y >= 0.0 { 1.0 } else { -1.0 };
        Some(Contact {
            point: Vec2::new(pos_a.x, pos_b.y + half_b.y * sign),
            normal: Vec2::new(0.0, sign),
            penetration: overlap_y,
        })
    }
}

/// Circle vs AABB. The circle is the first body.
pub fn circle_rect(center: Vec2, radius: f32, rect_pos: Vec2, half: Vec2) -> Option<Contact> {
    let min = rect_pos - half;
    let max = rect_pos + half;
    let closest = center.clamp(min, max);
    let offset = center - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > radius * radius {
        return None;
    }

    if dist_sq > f32::EPSILON {
        let dist = dist_sq.sqrt();
        Some(Contact {
            point: closest,
            normal: offset / dist,
            penetration: radius - dist,
        })
    } else {
        // Center inside the rect: fall back to the axis of least escape.
        let to_center = center - rect_pos;
        let escape_x = half.x - to_center.x.abs();
        let escape_y = half.y - to_center.y.abs();
        if escape_x < escape_y {
            let sign = if to_center.x >= 0.0 { 1.0 } else { -1.0 };
            Some(Contact {
                point: Vec2::new(rect_pos.x + half.x * sign, center.y),
                normal: Vec2::new(sign, 0.0),
                penetration: escape_x + radius,
            })
        } else {
            let sign = if to_center.y >= 0.0 { 1.0 } else { -1.0 };
            Some(Contact {
                point: Vec2::new(center.x, rect_pos.y + half.y * sign),
                normal: Vec2::new(0.0, sign),
                penetration: escape_y + radius,
            })
        }
    }
}

/// Circle vs circle.
pub fn circle_circle(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> Option<Contact> {
    let offset = pos_a - pos_b;
    let dist_sq = offset.length_squared();
    let combined = radius_a + radius_b;
    if dist_sq > combined * combined {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        offset / dist
    } else {
        Vec2::Y
    };
    Some(Contact {
        point: pos_b + normal * radius_b,
        normal,
        penetration: combined - dist,
    })
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n.
///
/// No damping factor. Ricochets keep their speed so players can read them.
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
