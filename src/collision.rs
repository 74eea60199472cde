//! Contact data reported by the physics collaborator.
//!
//! The physics engine reports, once per fixed tick and per touching collider,
//! the surface normals of every contact point between the hitbox and that
//! collider. These arrive as [`HitboxContactEvent`]s and are consumed by the
//! [`ContactTracker`](crate::tracker::ContactTracker).

use std::hash::{Hash, Hasher};

use bevy::prelude::*;

/// Surface normal at one contact point, pointing away from the touched
/// surface toward the hitbox.
///
/// Equality and hashing are exact on the component bits. Normals are expected
/// to come from the physics engine already quantized; use
/// [`ContactNormal::quantized`] when they are not.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct ContactNormal(Vec2);

impl ContactNormal {
    /// Normal of flat ground (surface below the hitbox).
    pub const UP: Self = Self(Vec2::Y);
    /// Normal of a flat ceiling (surface above the hitbox).
    pub const DOWN: Self = Self(Vec2::NEG_Y);
    /// Normal of a vertical wall to the right of the hitbox.
    pub const LEFT: Self = Self(Vec2::NEG_X);
    /// Normal of a vertical wall to the left of the hitbox.
    pub const RIGHT: Self = Self(Vec2::X);

    /// Create a normal from raw components.
    ///
    /// Negative zero is folded into positive zero so that `(-0.0, 1.0)` and
    /// `(0.0, 1.0)` compare equal.
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x + 0.0, y + 0.0))
    }

    /// Snap a raw engine normal onto a grid of size `step`.
    ///
    /// Solver output for axis-aligned geometry tends to carry tiny residuals
    /// (`1e-7` instead of `0.0`); snapping makes exact set membership usable.
    pub fn quantized(normal: Vec2, step: f32) -> Self {
        if step <= 0.0 {
            return Self::new(normal.x, normal.y);
        }
        let snapped = (normal / step).round() * step;
        Self::new(snapped.x, snapped.y)
    }

    /// The underlying vector.
    #[inline]
    pub fn vec(&self) -> Vec2 {
        self.0
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0.y
    }
}

impl From<Vec2> for ContactNormal {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl PartialEq for ContactNormal {
    fn eq(&self, other: &Self) -> bool {
        self.0.x.to_bits() == other.0.x.to_bits() && self.0.y.to_bits() == other.0.y.to_bits()
    }
}

impl Eq for ContactNormal {}

impl Hash for ContactNormal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.x.to_bits().hash(state);
        self.0.y.to_bits().hash(state);
    }
}

/// What happened to the contact between a hitbox and one collider this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactEventKind {
    /// First tick of contact, with the normals of all contact points.
    Begin(Vec<ContactNormal>),
    /// Contact continues, with this tick's normals.
    Persist(Vec<ContactNormal>),
    /// Contact ended.
    End,
}

/// One contact report from the physics collaborator.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HitboxContactEvent {
    /// Entity holding the [`ContactTracker`](crate::tracker::ContactTracker).
    pub hitbox: Entity,
    /// The external collider touching the hitbox.
    pub collider: Entity,
    pub kind: ContactEventKind,
}

impl HitboxContactEvent {
    pub fn new(hitbox: Entity, collider: Entity, kind: ContactEventKind) -> Self {
        Self {
            hitbox,
            collider,
            kind,
        }
    }

    /// Contact started against `collider`.
    pub fn begin(
        hitbox: Entity,
        collider: Entity,
        normals: impl IntoIterator<Item = ContactNormal>,
    ) -> Self {
        Self::new(
            hitbox,
            collider,
            ContactEventKind::Begin(normals.into_iter().collect()),
        )
    }

    /// Contact continues against `collider`.
    pub fn persist(
        hitbox: Entity,
        collider: Entity,
        normals: impl IntoIterator<Item = ContactNormal>,
    ) -> Self {
        Self::new(
            hitbox,
            collider,
            ContactEventKind::Persist(normals.into_iter().collect()),
        )
    }

    /// Contact ended against `collider`.
    pub fn end(hitbox: Entity, collider: Entity) -> Self {
        Self::new(hitbox, collider, ContactEventKind::End)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn negative_zero_equals_positive_zero() {
        assert_eq!(ContactNormal::new(-0.0, 1.0), ContactNormal::UP);

        let mut set = HashSet::new();
        set.insert(ContactNormal::new(-0.0, 1.0));
        assert!(set.contains(&ContactNormal::UP));
    }

    #[test]
    fn quantized_snaps_solver_noise() {
        let noisy = Vec2::new(1.0e-7, 0.999_999_9);
        assert_eq!(ContactNormal::quantized(noisy, 1.0e-4), ContactNormal::UP);

        let noisy_wall = Vec2::new(-0.999_999_8, -3.0e-8);
        assert_eq!(
            ContactNormal::quantized(noisy_wall, 1.0e-4),
            ContactNormal::LEFT
        );
    }

    #[test]
    fn quantized_with_zero_step_is_exact() {
        let n = ContactNormal::quantized(Vec2::new(0.3, 0.7), 0.0);
        assert_eq!(n.vec(), Vec2::new(0.3, 0.7));
    }

    #[test]
    fn distinct_normals_differ() {
        assert_ne!(ContactNormal::LEFT, ContactNormal::RIGHT);
        assert_ne!(ContactNormal::new(1.0, 1.0), ContactNormal::new(1.0, 0.5));
    }

    #[test]
    fn event_constructors() {
        let hitbox = Entity::from_raw(1);
        let wall = Entity::from_raw(2);

        let begin = HitboxContactEvent::begin(hitbox, wall, [ContactNormal::LEFT]);
        assert_eq!(begin.kind, ContactEventKind::Begin(vec![ContactNormal::LEFT]));

        let end = HitboxContactEvent::end(hitbox, wall);
        assert_eq!(end.hitbox, hitbox);
        assert_eq!(end.collider, wall);
        assert_eq!(end.kind, ContactEventKind::End);
    }
}
