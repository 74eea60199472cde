//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! work with the hitbox controller. The controller never integrates motion
//! itself; it only overwrites velocities and hands impulses to the backend.
//! Contact reports flow the other way, as
//! [`HitboxContactEvent`](crate::collision::HitboxContactEvent)s written by
//! the backend plugin.

use bevy::prelude::*;

use crate::jump::BodyCommand;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the controller.
/// Lookups on entities missing the backend's body components are no-ops
/// (getters return zero).
///
/// For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend, including whatever
    /// system emits contact events for tracked hitboxes.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Overwrite the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply an impulse to an entity.
    ///
    /// Additive and consumed by the next physics step.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Forward a recorded command list, in order.
    fn apply_commands(world: &mut World, entity: Entity, commands: &[BodyCommand]) {
        for command in commands {
            match *command {
                BodyCommand::SetVelocity(velocity) => Self::set_velocity(world, entity, velocity),
                BodyCommand::ApplyImpulse(impulse) => Self::apply_impulse(world, entity, impulse),
            }
        }
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
