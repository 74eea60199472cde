//! Core controller systems.
//!
//! These systems move data along the pipeline contact events → tracker →
//! classifier → jump machine → physics backend. The movement systems are
//! generic over the physics backend to allow different physics engines to be
//! used.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::classifier::{SideClassifier, SideFlags};
use crate::collision::HitboxContactEvent;
use crate::config::ControllerConfig;
use crate::intent::JumpInput;
use crate::jump::{apply_horizontal, BodyCommands, JumpController, JumpTickInput};
use crate::notify::ChangeObserver;
use crate::state::{Airborne, Grounded, TouchingCeiling, TouchingWall};
use crate::tracker::ContactTracker;

/// Detect jump-button press edges.
///
/// Runs on the frame tick so short taps between two fixed ticks are not lost.
pub fn latch_jump_input(mut q_inputs: Query<&mut JumpInput>) {
    for mut input in &mut q_inputs {
        input.latch_press_edge();
    }
}

/// Register newly added classifiers with their source tracker.
///
/// A classifier without an explicit source observes the tracker on its own
/// entity. A [`ControllerConfig`] on the classifier's entity sets its floor
/// slope. The classifier immediately pulls the tracker's current state, so
/// contacts that arrived before registration are not missed.
pub fn register_new_classifiers(
    mut q_classifiers: Query<
        (Entity, &mut SideClassifier, Option<&ControllerConfig>),
        Added<SideClassifier>,
    >,
    mut q_trackers: Query<&mut ContactTracker>,
) {
    for (entity, mut classifier, config) in &mut q_classifiers {
        if let Some(config) = config {
            classifier.set_max_floor_slope(config.max_floor_slope);
        }
        let source = classifier.resolve_source(entity);
        let Ok(mut tracker) = q_trackers.get_mut(source) else {
            warn!("SideClassifier on {entity:?} observes {source:?}, which has no ContactTracker");
            continue;
        };
        tracker.register_observer(entity);
        classifier.react_to_change(source, &tracker);
    }
}

/// Feed contact reports into the matching trackers.
///
/// Events for entities without a [`ContactTracker`] are dropped.
pub fn apply_contact_events(
    mut events: EventReader<HitboxContactEvent>,
    mut q_trackers: Query<&mut ContactTracker>,
) {
    for event in events.read() {
        if let Ok(mut tracker) = q_trackers.get_mut(event.hitbox) {
            tracker.apply(event.collider, &event.kind);
        }
    }
}

/// Apply walking and wall-slide velocity.
pub fn apply_horizontal_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, SideFlags, i8)> = world
        .query_filtered::<(Entity, &ControllerConfig, &SideClassifier, &JumpInput), With<JumpController>>()
        .iter(world)
        .map(|(e, config, classifier, input)| (e, *config, classifier.flags(), input.horizontal()))
        .collect();

    for (entity, config, flags, horizontal) in entities {
        let mut body = BodyCommands::new(B::get_velocity(world, entity));
        apply_horizontal(flags, horizontal, &config, &mut body);
        B::apply_commands(world, entity, body.commands());
    }
}

/// Advance jump attempts and cancel watches.
pub fn apply_jump<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, SideFlags)> = world
        .query_filtered::<(Entity, &ControllerConfig, &SideClassifier), (With<JumpController>, With<JumpInput>)>()
        .iter(world)
        .map(|(e, config, classifier)| (e, *config, classifier.flags()))
        .collect();

    for (entity, config, flags) in entities {
        let input = {
            let Some(mut input) = world.get_mut::<JumpInput>(entity) else {
                continue;
            };
            JumpTickInput {
                pressed: input.take_press(),
                held: input.is_jump_pressed(),
            }
        };

        let mut body = BodyCommands::new(B::get_velocity(world, entity));
        {
            let Some(mut controller) = world.get_mut::<JumpController>(entity) else {
                continue;
            };
            controller.tick(flags, input, &config, &mut body);
        }

        B::apply_commands(world, entity, body.commands());
    }
}

/// Sync state marker components based on classifier flags.
pub fn sync_state_markers(
    mut commands: Commands,
    q_classifiers: Query<(
        Entity,
        &SideClassifier,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
        Has<TouchingCeiling>,
    )>,
) {
    for (entity, classifier, has_grounded, has_airborne, wall, has_ceiling) in &q_classifiers {
        let flags = classifier.flags();

        // Sync Grounded/Airborne
        if flags.floor && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !flags.floor && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        // Sync TouchingWall, replacing it when the side changes
        match TouchingWall::from_flags(flags.left, flags.right) {
            Some(new_wall) => {
                if wall.map(|w| w.side) != Some(new_wall.side) {
                    commands.entity(entity).insert(new_wall);
                }
            }
            None => {
                if wall.is_some() {
                    commands.entity(entity).remove::<TouchingWall>();
                }
            }
        }

        // Sync TouchingCeiling
        if flags.ceiling && !has_ceiling {
            commands.entity(entity).insert(TouchingCeiling);
        } else if !flags.ceiling && has_ceiling {
            commands.entity(entity).remove::<TouchingCeiling>();
        }
    }
}

/// Log configurations that fail validation when they are added.
pub fn warn_invalid_configs(q_configs: Query<(Entity, &ControllerConfig), Added<ControllerConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            warn!("invalid ControllerConfig on {entity:?}: {err}");
        }
    }
}
