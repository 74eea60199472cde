//! Side classification.
//!
//! Turns the tracker's aggregate normal set into four side flags. Walls and
//! ceiling are matched against exact axis normals; the floor accepts any
//! normal whose slope `|x / y|` stays within `max_floor_slope`.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::collision::ContactNormal;
use crate::notify::ChangeObserver;
use crate::tracker::ContactTracker;

/// Which sides of the hitbox currently bear a qualifying contact.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideFlags {
    pub ceiling: bool,
    pub right: bool,
    pub floor: bool,
    pub left: bool,
}

impl SideFlags {
    /// Classify a set of contact normals.
    ///
    /// A wall on the right pushes back with a leftward normal, hence
    /// `right = contains(LEFT)` and vice versa.
    pub fn from_normals<'a>(
        normals: impl IntoIterator<Item = &'a ContactNormal>,
        max_floor_slope: f32,
    ) -> Self {
        let mut flags = Self::default();
        for normal in normals {
            flags.ceiling |= *normal == ContactNormal::DOWN;
            flags.right |= *normal == ContactNormal::LEFT;
            flags.left |= *normal == ContactNormal::RIGHT;
            flags.floor |= is_floor_normal(*normal, max_floor_slope);
        }
        flags
    }

    /// Touching a wall on either side.
    pub fn touching_wall(&self) -> bool {
        self.left || self.right
    }

    /// Not touching anything.
    pub fn is_free(&self) -> bool {
        !(self.ceiling || self.right || self.floor || self.left)
    }
}

/// Whether `normal` belongs to walkable ground.
///
/// Pure vertical walls (`y == 0`) never count, regardless of the slope limit.
pub fn is_floor_normal(normal: ContactNormal, max_floor_slope: f32) -> bool {
    normal.y() != 0.0 && (normal.x() / normal.y()).abs() <= max_floor_slope
}

/// Observer of a [`ContactTracker`] holding the derived [`SideFlags`].
///
/// The flags are only recomputed when the tracker's normal set differs from
/// the set last classified.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct SideClassifier {
    /// Tracker entity this classifier listens to. `None` means "the entity
    /// this component lives on" and is resolved when the classifier is
    /// registered.
    source: Option<Entity>,
    /// Maximum `|x / y|` of a floor normal. `1.0` is 45 degrees.
    max_floor_slope: f32,
    #[reflect(ignore)]
    normals: HashSet<ContactNormal>,
    flags: SideFlags,
}

impl Default for SideClassifier {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SideClassifier {
    /// Classifier for a tracker on the same entity.
    pub fn new(max_floor_slope: f32) -> Self {
        Self {
            source: None,
            max_floor_slope,
            normals: HashSet::new(),
            flags: SideFlags::default(),
        }
    }

    /// Classifier for a tracker on another entity (e.g. a hitbox child).
    pub fn observing(source: Entity, max_floor_slope: f32) -> Self {
        Self {
            source: Some(source),
            ..Self::new(max_floor_slope)
        }
    }

    pub fn source(&self) -> Option<Entity> {
        self.source
    }

    pub(crate) fn resolve_source(&mut self, own_entity: Entity) -> Entity {
        *self.source.get_or_insert(own_entity)
    }

    pub fn max_floor_slope(&self) -> f32 {
        self.max_floor_slope
    }

    /// Change the floor slope limit and reclassify the cached normals.
    ///
    /// The plugin calls this on registration when the classifier's entity
    /// carries a [`ControllerConfig`](crate::config::ControllerConfig), so the
    /// config's `max_floor_slope` wins over the value given at construction.
    pub fn set_max_floor_slope(&mut self, max_floor_slope: f32) {
        self.max_floor_slope = max_floor_slope;
        self.flags = SideFlags::from_normals(&self.normals, max_floor_slope);
    }

    pub fn flags(&self) -> SideFlags {
        self.flags
    }

    /// The normal set the current flags were derived from.
    pub fn normals(&self) -> &HashSet<ContactNormal> {
        &self.normals
    }

    pub fn touching_ceiling(&self) -> bool {
        self.flags.ceiling
    }

    pub fn touching_right(&self) -> bool {
        self.flags.right
    }

    pub fn touching_floor(&self) -> bool {
        self.flags.floor
    }

    pub fn touching_left(&self) -> bool {
        self.flags.left
    }

    pub fn touching_wall(&self) -> bool {
        self.flags.touching_wall()
    }

    /// Reclassify against `normals` if they differ from the cached set.
    ///
    /// Returns whether a recomputation happened.
    pub fn update(&mut self, normals: HashSet<ContactNormal>) -> bool {
        if normals == self.normals {
            return false;
        }
        self.flags = SideFlags::from_normals(&normals, self.max_floor_slope);
        self.normals = normals;
        true
    }
}

impl ChangeObserver<ContactTracker> for SideClassifier {
    fn react_to_change(&mut self, source: Entity, subject: &ContactTracker) -> bool {
        if self.source != Some(source) {
            return false;
        }
        self.update(subject.current_normals())
    }
}
