//! # `hitbox_controller`
//!
//! Contact-driven 2D platformer controller with physics backend abstraction.
//!
//! This crate provides the movement core of a side-scrolling character:
//! - Tracks which colliders a hitbox touches and with which surface normals
//! - Classifies contact normals into ceiling/right/floor/left flags
//! - Publishes tracker changes to observers through a change-notification bus
//! - Runs a buffered jump with wall-jumps and early-release jump cancel
//! - Abstracts physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! Data flows one way, once per fixed tick:
//! 1. The physics backend reports contacts as [`HitboxContactEvent`](collision::HitboxContactEvent)s
//! 2. A [`ContactTracker`](tracker::ContactTracker) keeps the touch map and
//!    notifies its observers when the set of touched normals grows or shrinks
//! 3. A [`SideClassifier`](classifier::SideClassifier) recomputes its side flags
//! 4. The jump machine reads the flags and input and issues velocity
//!    overwrites and impulses back to the backend
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use hitbox_controller::prelude::*;
//!
//! // Create controller components for a player character
//! let bundle = HitboxControllerBundle::new(ControllerConfig::player());
//!
//! // Spawn it next to the physics components of your backend
//! let mut world = World::new();
//! world.spawn(bundle);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod classifier;
pub mod collision;
pub mod config;
pub mod intent;
pub mod jump;
pub mod notify;
pub mod state;
pub mod systems;
pub mod tracker;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{CharacterPhysicsBackend, NoOpBackendPlugin};
    pub use crate::classifier::{SideClassifier, SideFlags};
    pub use crate::collision::{ContactEventKind, ContactNormal, HitboxContactEvent};
    pub use crate::config::{ConfigError, ControllerConfig};
    pub use crate::intent::JumpInput;
    pub use crate::jump::{BodyCommand, JumpController};
    pub use crate::state::{Airborne, Grounded, TouchingCeiling, TouchingWall, WallSide};
    pub use crate::tracker::ContactTracker;
    pub use crate::{HitboxControllerBundle, HitboxControllerPlugin, HitboxControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dHitboxBundle};
}

/// System sets of the fixed-tick pipeline, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitboxControllerSet {
    /// Contact events are applied to trackers. Backends emit their events
    /// here, before `apply_contact_events`.
    Contacts,
    /// Pending tracker notifications are delivered to classifiers.
    Classification,
    /// Walking, wall-slide and jump commands are sent to the backend.
    Movement,
    /// Marker components are synced with the side flags.
    Markers,
}

/// Main plugin for the hitbox controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity access and impulses) and reports contacts.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use hitbox_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(HitboxControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct HitboxControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for HitboxControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for HitboxControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<classifier::SideClassifier>();
        app.register_type::<classifier::SideFlags>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::JumpInput>();
        app.register_type::<jump::JumpController>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::TouchingCeiling>();

        app.add_event::<collision::HitboxContactEvent>();

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                HitboxControllerSet::Contacts,
                HitboxControllerSet::Classification,
                HitboxControllerSet::Movement,
                HitboxControllerSet::Markers,
            )
                .chain(),
        );

        // Press edges are detected every frame so taps shorter than a fixed
        // tick still reach the jump machine
        app.add_systems(
            Update,
            (systems::latch_jump_input, systems::warn_invalid_configs),
        );

        app.add_systems(
            FixedUpdate,
            systems::apply_contact_events.in_set(HitboxControllerSet::Contacts),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::register_new_classifiers,
                notify::dispatch_changes::<tracker::ContactTracker, classifier::SideClassifier>,
            )
                .chain()
                .in_set(HitboxControllerSet::Classification),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_horizontal_movement::<B>,
                systems::apply_jump::<B>,
            )
                .chain()
                .in_set(HitboxControllerSet::Movement),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(HitboxControllerSet::Markers),
        );
    }
}

/// Everything a single-entity character needs: the hitbox's tracker, a
/// classifier observing it, the jump machine, input and configuration.
///
/// The classifier's floor slope is taken from the configuration. For a
/// hitbox on a separate collider entity, spawn a [`tracker::ContactTracker`]
/// there and use [`classifier::SideClassifier::observing`] instead.
#[derive(Bundle, Default)]
pub struct HitboxControllerBundle {
    pub tracker: tracker::ContactTracker,
    pub classifier: classifier::SideClassifier,
    pub controller: jump::JumpController,
    pub input: intent::JumpInput,
    pub config: config::ControllerConfig,
}

impl HitboxControllerBundle {
    pub fn new(config: config::ControllerConfig) -> Self {
        Self {
            tracker: tracker::ContactTracker::new(),
            classifier: classifier::SideClassifier::new(config.max_floor_slope),
            controller: jump::JumpController::new(),
            input: intent::JumpInput::new(),
            config,
        }
    }
}
