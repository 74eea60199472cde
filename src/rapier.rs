//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use std::collections::HashSet;

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::{ContactNormal, HitboxContactEvent};
use crate::tracker::ContactTracker;
use crate::HitboxControllerSet;

/// Grid that Rapier contact normals are snapped to before they are compared.
pub const NORMAL_QUANTIZATION_STEP: f32 = 1e-4;

/// Rapier2D physics backend for the hitbox controller.
///
/// Velocity maps to [`Velocity::linvel`], impulses to [`ExternalImpulse`].
/// Contacts are read from the Rapier context by [`emit_rapier_contacts`].
pub struct Rapier2dBackend;

impl CharacterPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Fallback: apply as velocity change if no ExternalImpulse component
            vel.linvel += impulse;
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for the hitbox controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            emit_rapier_contacts
                .in_set(HitboxControllerSet::Contacts)
                .before(crate::systems::apply_contact_events),
        );
    }
}

/// Orient a manifold normal so it points from the touched surface toward the
/// hitbox, then quantize it.
///
/// Rapier reports manifold normals pointing from the pair's first collider
/// to its second.
pub fn oriented_normal(raw: Vec2, hitbox_is_first: bool) -> ContactNormal {
    let normal = if hitbox_is_first { -raw } else { raw };
    ContactNormal::quantized(normal, NORMAL_QUANTIZATION_STEP)
}

/// Turn this tick's contact snapshot of one hitbox into begin/persist/end
/// events, using the tracker to tell new colliders from known ones.
///
/// Colliders the tracker knows but the snapshot lacks get an end event.
/// Snapshot entries without normals are treated as absent.
pub fn diff_contacts(
    hitbox: Entity,
    tracker: &ContactTracker,
    snapshot: impl IntoIterator<Item = (Entity, Vec<ContactNormal>)>,
) -> Vec<HitboxContactEvent> {
    let mut events = Vec::new();
    let mut seen = HashSet::new();

    for (collider, normals) in snapshot {
        if normals.is_empty() || !seen.insert(collider) {
            continue;
        }
        let event = if tracker.is_touching(collider) {
            HitboxContactEvent::persist(hitbox, collider, normals)
        } else {
            HitboxContactEvent::begin(hitbox, collider, normals)
        };
        events.push(event);
    }

    events.extend(
        tracker
            .touching_colliders()
            .filter(|collider| !seen.contains(collider))
            .map(|collider| HitboxContactEvent::end(hitbox, collider)),
    );

    events
}

/// Emit contact events for every active hitbox from Rapier's contact pairs.
pub fn emit_rapier_contacts(
    rapier_context: ReadRapierContext,
    q_hitboxes: Query<(Entity, &ContactTracker), With<Collider>>,
    mut writer: EventWriter<HitboxContactEvent>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (hitbox, tracker) in &q_hitboxes {
        if !tracker.is_active() {
            continue;
        }

        let mut snapshot: Vec<(Entity, Vec<ContactNormal>)> = Vec::new();
        for pair in context.contact_pairs_with(hitbox) {
            if !pair.has_any_active_contact() {
                continue;
            }
            let (Some(first), Some(second)) = (pair.collider1(), pair.collider2()) else {
                continue;
            };
            let hitbox_is_first = first == hitbox;
            let other = if hitbox_is_first { second } else { first };

            let normals = pair
                .manifolds()
                .filter(|manifold| manifold.num_points() > 0)
                .map(|manifold| oriented_normal(manifold.normal(), hitbox_is_first))
                .collect();
            snapshot.push((other, normals));
        }

        for event in diff_contacts(hitbox, tracker, snapshot) {
            writer.write(event);
        }
    }
}

/// Physics components for a character body whose collider is its hitbox.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use hitbox_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 100.0, 0.0),
///         HitboxControllerBundle::new(ControllerConfig::player()),
///         Rapier2dHitboxBundle::new(),
///         Collider::cuboid(6.0, 12.0),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `velocity`: Zero velocity (overwritten by walking and jumps)
/// - `external_impulse`: Zero impulse (used for jump and cancel impulses)
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the side classifier
///   assumes an upright hitbox
#[derive(Bundle)]
pub struct Rapier2dHitboxBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub external_impulse: ExternalImpulse,
    pub locked_axes: LockedAxes,
}

impl Default for Rapier2dHitboxBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dHitboxBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
        }
    }

    /// Set the rigid body type, e.g. [`RigidBody::KinematicVelocityBased`]
    /// for scripted movement.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ContactEventKind;

    #[test]
    fn rapier_backend_velocity() {
        let mut world = World::new();
        let entity = world
            .spawn(Velocity::linear(Vec2::new(50.0, 30.0)))
            .id();

        let vel = Rapier2dBackend::get_velocity(&world, entity);
        assert!((vel.x - 50.0).abs() < 0.01);
        assert!((vel.y - 30.0).abs() < 0.01);

        Rapier2dBackend::set_velocity(&mut world, entity, Vec2::new(100.0, 0.0));

        let vel = Rapier2dBackend::get_velocity(&world, entity);
        assert!((vel.x - 100.0).abs() < 0.01);
        assert!(vel.y.abs() < 0.01);
    }

    #[test]
    fn rapier_backend_missing_body_is_noop() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();

        assert_eq!(Rapier2dBackend::get_velocity(&world, entity), Vec2::ZERO);
        Rapier2dBackend::set_velocity(&mut world, entity, Vec2::ONE);
        Rapier2dBackend::apply_impulse(&mut world, entity, Vec2::ONE);
        assert!(world.get::<Velocity>(entity).is_none());
    }

    #[test]
    fn impulses_accumulate_in_external_impulse() {
        let mut world = World::new();
        let entity = world
            .spawn((Velocity::zero(), ExternalImpulse::default()))
            .id();

        Rapier2dBackend::apply_impulse(&mut world, entity, Vec2::new(0.0, 300.0));
        Rapier2dBackend::apply_impulse(&mut world, entity, Vec2::new(0.0, -50.0));

        let impulse = world.get::<ExternalImpulse>(entity).unwrap();
        assert_eq!(impulse.impulse, Vec2::new(0.0, 250.0));
        // Velocity untouched until the physics step
        assert_eq!(Rapier2dBackend::get_velocity(&world, entity), Vec2::ZERO);
    }

    #[test]
    fn impulse_falls_back_to_velocity() {
        let mut world = World::new();
        let entity = world.spawn(Velocity::linear(Vec2::new(10.0, 0.0))).id();

        Rapier2dBackend::apply_impulse(&mut world, entity, Vec2::new(0.0, 300.0));

        assert_eq!(
            Rapier2dBackend::get_velocity(&world, entity),
            Vec2::new(10.0, 300.0)
        );
    }

    #[test]
    fn normals_point_toward_hitbox() {
        // Hitbox standing on ground: Rapier's normal points from first to second
        assert_eq!(oriented_normal(Vec2::NEG_Y, true), ContactNormal::UP);
        assert_eq!(oriented_normal(Vec2::Y, false), ContactNormal::UP);
    }

    #[test]
    fn normals_are_snapped() {
        let normal = oriented_normal(Vec2::new(1.0e-7, -0.999_999_9), true);
        assert_eq!(normal, ContactNormal::UP);
    }

    #[test]
    fn diff_emits_begin_persist_and_end() {
        let mut world = World::new();
        let hitbox = world.spawn_empty().id();
        let ground = world.spawn_empty().id();
        let wall = world.spawn_empty().id();
        let platform = world.spawn_empty().id();

        let mut tracker = ContactTracker::new();
        tracker.contact_begin(ground, [ContactNormal::UP]);
        tracker.contact_begin(platform, [ContactNormal::UP]);

        let events = diff_contacts(
            hitbox,
            &tracker,
            [
                (ground, vec![ContactNormal::UP]),
                (wall, vec![ContactNormal::LEFT]),
            ],
        );

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            HitboxContactEvent::persist(hitbox, ground, [ContactNormal::UP])
        );
        assert_eq!(
            events[1],
            HitboxContactEvent::begin(hitbox, wall, [ContactNormal::LEFT])
        );
        assert_eq!(events[2], HitboxContactEvent::end(hitbox, platform));
    }

    #[test]
    fn diff_treats_empty_normals_as_absent() {
        let mut world = World::new();
        let hitbox = world.spawn_empty().id();
        let ground = world.spawn_empty().id();

        let mut tracker = ContactTracker::new();
        tracker.contact_begin(ground, [ContactNormal::UP]);

        let events = diff_contacts(hitbox, &tracker, [(ground, Vec::new())]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContactEventKind::End);
    }

    #[test]
    fn hitbox_bundle_defaults() {
        let bundle = Rapier2dHitboxBundle::new();
        assert_eq!(bundle.rigid_body, RigidBody::Dynamic);
        assert_eq!(bundle.locked_axes, LockedAxes::ROTATION_LOCKED);

        let kinematic = Rapier2dHitboxBundle::new().with_body(RigidBody::KinematicVelocityBased);
        assert_eq!(kinematic.rigid_body, RigidBody::KinematicVelocityBased);
    }
}
