//! Change-notification bus.
//!
//! A subject owns a [`ChangeNotifier`] and calls [`ChangeNotifier::notify`]
//! after its state changed. No payload travels with the notification: every
//! registered observer is handed the publishing entity and a reference to the
//! subject, and pulls whatever state it needs. An observer registered with
//! several subjects uses the source entity to ignore unrelated publishers.
//!
//! Delivery happens in [`dispatch_changes`], which runs once per fixed tick.
//! Several `notify` calls between two dispatches coalesce into one delivery;
//! observers re-read the full subject state, so nothing is lost.

use std::collections::HashSet;

use bevy::ecs::component::Mutable;
use bevy::prelude::*;

/// Observer registry and pending-notification flag of one subject.
#[derive(Debug, Clone, Default)]
pub struct ChangeNotifier {
    observers: HashSet<Entity>,
    pending: bool,
    sent: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Registering the same observer twice is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `observer` is [`Entity::PLACEHOLDER`], which stands for "no
    /// observer" and can only come from a programming error.
    pub fn register(&mut self, observer: Entity) {
        assert!(
            observer != Entity::PLACEHOLDER,
            "precondition violated: observer must be a real entity"
        );
        self.observers.insert(observer);
    }

    /// Signal that the subject's state changed.
    pub fn notify(&mut self) {
        self.pending = true;
        self.sent += 1;
    }

    /// Whether a notification is waiting to be delivered.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Total number of `notify` calls since creation.
    pub fn notifications_sent(&self) -> u64 {
        self.sent
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_registered(&self, observer: Entity) -> bool {
        self.observers.contains(&observer)
    }

    /// Clear the pending flag and return the observers to call back, or
    /// `None` if nothing was published since the last delivery.
    pub fn take_pending(&mut self) -> Option<Vec<Entity>> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        Some(self.observers.iter().copied().collect())
    }
}

/// A component that publishes changes through a [`ChangeNotifier`].
pub trait Observable {
    fn notifier(&self) -> &ChangeNotifier;

    fn notifier_mut(&mut self) -> &mut ChangeNotifier;
}

/// A component that reacts to changes of subjects of type `S`.
pub trait ChangeObserver<S: ?Sized> {
    /// Called after `source` published a change. Implementations re-query
    /// `subject` for the state they care about.
    ///
    /// Returns whether the observer's own state changed.
    fn react_to_change(&mut self, source: Entity, subject: &S) -> bool;
}

/// Deliver pending notifications from every `S` subject to its registered
/// `O` observers.
///
/// Observers that no longer exist (or lack an `O` component) are skipped.
pub fn dispatch_changes<S, O>(mut subjects: Query<(Entity, &mut S)>, mut observers: Query<&mut O>)
where
    S: Component<Mutability = Mutable> + Observable,
    O: Component<Mutability = Mutable> + ChangeObserver<S>,
{
    for (source, mut subject) in &mut subjects {
        let Some(targets) = subject.notifier_mut().take_pending() else {
            continue;
        };

        for target in targets {
            if let Ok(mut observer) = observers.get_mut(target) {
                observer.react_to_change(source, &subject);
            }
        }
    }
}
