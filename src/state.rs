//! State marker components.
//!
//! These components mirror the current [`SideFlags`](crate::classifier::SideFlags)
//! of a character. They are added and removed by `sync_state_markers`, so
//! game code can filter queries with `With<Grounded>` and friends instead of
//! reading the classifier.

use bevy::prelude::*;

/// Marker component indicating the hitbox touches floor.
///
/// This is a marker component - it has no data, just indicates state.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use hitbox_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the hitbox touches no floor.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Which side a touched wall is on.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
    Both,
}

/// Marker component indicating the hitbox touches a wall.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    pub side: WallSide,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self {
            side: WallSide::Right,
        }
    }
}

impl TouchingWall {
    pub fn new(side: WallSide) -> Self {
        Self { side }
    }

    /// Derive the side from left/right flags; `None` if neither is set.
    pub fn from_flags(left: bool, right: bool) -> Option<Self> {
        match (left, right) {
            (true, true) => Some(Self::new(WallSide::Both)),
            (true, false) => Some(Self::new(WallSide::Left)),
            (false, true) => Some(Self::new(WallSide::Right)),
            (false, false) => None,
        }
    }

    /// Check if a wall is on the left side.
    pub fn is_left(&self) -> bool {
        matches!(self.side, WallSide::Left | WallSide::Both)
    }

    /// Check if a wall is on the right side.
    pub fn is_right(&self) -> bool {
        matches!(self.side, WallSide::Right | WallSide::Both)
    }
}

/// Marker component indicating the hitbox touches a ceiling.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TouchingCeiling;
