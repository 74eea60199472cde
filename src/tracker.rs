//! Contact surface tracking.
//!
//! [`ContactTracker`] keeps, for every collider currently touching the
//! hitbox, the set of distinct contact normals reported against it, and
//! publishes a change notification whenever the union of those normals gains
//! or loses a vector.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::collision::{ContactEventKind, ContactNormal};
use crate::notify::{ChangeNotifier, Observable};

/// Per-hitbox touch map.
///
/// A collider is present in the map if and only if the physics engine
/// currently reports at least one contact against it.
///
/// # Notification rule
///
/// On begin/persist the tracker notifies only if the reported normals were
/// not already a subset of the aggregate *before* the update. A collider that
/// swaps its own normals for a different set that other colliders already
/// cover therefore changes the map silently. Observers recompute from
/// [`current_normals`](Self::current_normals), so they never see stale data,
/// but anything that keys off the notification alone must account for this.
#[derive(Component, Debug, Clone)]
pub struct ContactTracker {
    touching: HashMap<Entity, HashSet<ContactNormal>>,
    active: bool,
    notifier: ChangeNotifier,
}

impl Default for ContactTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactTracker {
    /// Create an active tracker with an empty touch map.
    pub fn new() -> Self {
        Self {
            touching: HashMap::new(),
            active: true,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Union of all normals across all touching colliders.
    pub fn current_normals(&self) -> HashSet<ContactNormal> {
        self.touching.values().flatten().copied().collect()
    }

    /// Colliders currently in contact with the hitbox.
    pub fn touching_colliders(&self) -> impl Iterator<Item = Entity> + '_ {
        self.touching.keys().copied()
    }

    /// Normals currently stored for `collider`.
    pub fn normals_of(&self, collider: Entity) -> Option<&HashSet<ContactNormal>> {
        self.touching.get(&collider)
    }

    pub fn is_touching(&self, collider: Entity) -> bool {
        self.touching.contains_key(&collider)
    }

    /// Number of touching colliders.
    pub fn len(&self) -> usize {
        self.touching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register an observer with this tracker's notifier.
    pub fn register_observer(&mut self, observer: Entity) {
        self.notifier.register(observer);
    }

    /// Re-enable tracking after [`deactivate`](Self::deactivate).
    ///
    /// The touch map starts empty.
    pub fn activate(&mut self) {
        if !self.active {
            self.touching.clear();
            self.active = true;
        }
    }

    /// Stop tracking and clear the touch map.
    ///
    /// Observers are notified if any normals were held, since that
    /// information is now gone. Contact events are ignored while inactive.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let had_contacts = self.touching.values().any(|normals| !normals.is_empty());
        self.touching.clear();
        if had_contacts {
            self.notifier.notify();
        }
    }

    /// Route one contact event to the matching operation.
    ///
    /// Returns whether observers were notified.
    pub fn apply(&mut self, collider: Entity, kind: &ContactEventKind) -> bool {
        match kind {
            ContactEventKind::Begin(normals) => self.contact_begin(collider, normals.iter().copied()),
            ContactEventKind::Persist(normals) => {
                self.contact_persist(collider, normals.iter().copied())
            }
            ContactEventKind::End => self.contact_end(collider),
        }
    }

    /// Contact started against `collider`.
    ///
    /// Returns whether observers were notified.
    pub fn contact_begin(
        &mut self,
        collider: Entity,
        normals: impl IntoIterator<Item = ContactNormal>,
    ) -> bool {
        self.add_contact(collider, normals.into_iter().collect())
    }

    /// Contact continues against `collider`. Same rule as
    /// [`contact_begin`](Self::contact_begin).
    pub fn contact_persist(
        &mut self,
        collider: Entity,
        normals: impl IntoIterator<Item = ContactNormal>,
    ) -> bool {
        self.add_contact(collider, normals.into_iter().collect())
    }

    /// Contact ended against `collider`. Unknown colliders are ignored.
    ///
    /// Returns whether observers were notified.
    pub fn contact_end(&mut self, collider: Entity) -> bool {
        if !self.active {
            return false;
        }
        let Some(removed) = self.touching.remove(&collider) else {
            return false;
        };

        if self.adds_information(&removed) {
            trace!("hitbox lost contact normals from {collider:?}");
            self.notifier.notify();
            return true;
        }
        false
    }

    fn add_contact(&mut self, collider: Entity, normals: HashSet<ContactNormal>) -> bool {
        if !self.active {
            return false;
        }
        // Checked against the aggregate before mutation: "did the touch state
        // gain a vector", not "did this collider's entry change".
        let new_vectors_added = self.adds_information(&normals);

        if normals.is_empty() {
            // An entry without normals would keep a collider without contacts
            self.touching.remove(&collider);
        } else {
            match self.touching.get_mut(&collider) {
                None => {
                    self.touching.insert(collider, normals);
                }
                Some(stored) => {
                    if *stored != normals {
                        *stored = normals;
                    }
                }
            }
        }

        if new_vectors_added {
            trace!("hitbox gained contact normals from {collider:?}");
            self.notifier.notify();
        }
        new_vectors_added
    }

    /// True if `normals` holds a vector the current aggregate lacks.
    fn adds_information(&self, normals: &HashSet<ContactNormal>) -> bool {
        !self.current_normals().is_superset(normals)
    }
}

impl Observable for ContactTracker {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(id: u32) -> Entity {
        Entity::from_raw(id)
    }

    fn set(normals: &[ContactNormal]) -> HashSet<ContactNormal> {
        normals.iter().copied().collect()
    }

    #[test]
    fn new_tracker_is_active_and_empty() {
        let tracker = ContactTracker::new();
        assert!(tracker.is_active());
        assert!(tracker.is_empty());
        assert!(tracker.current_normals().is_empty());
    }

    #[test]
    fn begin_adds_entry_and_notifies() {
        let mut tracker = ContactTracker::new();

        assert!(tracker.contact_begin(e(1), [ContactNormal::UP]));
        assert!(tracker.is_touching(e(1)));
        assert_eq!(tracker.current_normals(), set(&[ContactNormal::UP]));
        assert_eq!(tracker.notifier().notifications_sent(), 1);
    }

    #[test]
    fn corner_contact_stores_multiple_normals() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP, ContactNormal::LEFT, ContactNormal::UP]);

        assert_eq!(
            tracker.normals_of(e(1)),
            Some(&set(&[ContactNormal::UP, ContactNormal::LEFT]))
        );
    }

    #[test]
    fn identical_normals_from_two_colliders_notify_once() {
        let mut tracker = ContactTracker::new();

        assert!(tracker.contact_begin(e(1), [ContactNormal::UP]));
        assert!(!tracker.contact_begin(e(2), [ContactNormal::UP]));

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.notifier().notifications_sent(), 1);
    }

    #[test]
    fn persist_with_same_normals_is_silent() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);

        assert!(!tracker.contact_persist(e(1), [ContactNormal::UP]));
        assert_eq!(tracker.notifier().notifications_sent(), 1);
    }

    #[test]
    fn persist_with_new_normal_replaces_and_notifies() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);

        assert!(tracker.contact_persist(e(1), [ContactNormal::new(0.6, 0.8)]));
        assert_eq!(tracker.current_normals(), set(&[ContactNormal::new(0.6, 0.8)]));
    }

    #[test]
    fn replacing_with_globally_known_normals_mutates_silently() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);
        tracker.contact_begin(e(2), [ContactNormal::LEFT]);
        let sent = tracker.notifier().notifications_sent();

        // e(1) switches from UP to LEFT; LEFT is already present via e(2)
        assert!(!tracker.contact_persist(e(1), [ContactNormal::LEFT]));
        assert_eq!(tracker.notifier().notifications_sent(), sent);

        // The map is still exact: UP is gone
        assert_eq!(tracker.current_normals(), set(&[ContactNormal::LEFT]));
    }

    #[test]
    fn removing_only_collider_empties_and_notifies_once() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);
        let before = tracker.notifier().notifications_sent();

        assert!(tracker.contact_end(e(1)));
        assert!(tracker.current_normals().is_empty());
        assert!(tracker.is_empty());
        assert_eq!(tracker.notifier().notifications_sent(), before + 1);
    }

    #[test]
    fn removing_redundant_collider_is_silent() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);
        tracker.contact_begin(e(2), [ContactNormal::UP]);

        assert!(!tracker.contact_end(e(2)));
        assert_eq!(tracker.current_normals(), set(&[ContactNormal::UP]));
    }

    #[test]
    fn end_for_unknown_collider_is_noop() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);

        assert!(!tracker.contact_end(e(99)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn empty_normal_report_removes_entry() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);

        tracker.contact_persist(e(1), []);
        assert!(!tracker.is_touching(e(1)));
    }

    #[test]
    fn aggregate_matches_union_after_mixed_sequence() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);
        tracker.contact_begin(e(2), [ContactNormal::LEFT, ContactNormal::UP]);
        tracker.contact_begin(e(3), [ContactNormal::DOWN]);
        tracker.contact_persist(e(2), [ContactNormal::LEFT]);
        tracker.contact_end(e(1));
        tracker.contact_end(e(3));
        tracker.contact_begin(e(4), [ContactNormal::RIGHT]);

        let expected: HashSet<ContactNormal> = tracker
            .touching_colliders()
            .flat_map(|c| tracker.normals_of(c).unwrap().iter().copied().collect::<Vec<_>>())
            .collect();

        assert_eq!(tracker.current_normals(), expected);
        assert_eq!(
            tracker.current_normals(),
            set(&[ContactNormal::LEFT, ContactNormal::RIGHT])
        );
    }

    #[test]
    fn apply_routes_event_kinds() {
        let mut tracker = ContactTracker::new();

        assert!(tracker.apply(e(1), &ContactEventKind::Begin(vec![ContactNormal::UP])));
        assert!(!tracker.apply(e(1), &ContactEventKind::Persist(vec![ContactNormal::UP])));
        assert!(tracker.apply(e(1), &ContactEventKind::End));
        assert!(tracker.is_empty());
    }

    #[test]
    fn deactivate_clears_and_ignores_events() {
        let mut tracker = ContactTracker::new();
        tracker.contact_begin(e(1), [ContactNormal::UP]);

        tracker.deactivate();
        assert!(!tracker.is_active());
        assert!(tracker.is_empty());
        assert_eq!(tracker.notifier().notifications_sent(), 2);

        assert!(!tracker.contact_begin(e(2), [ContactNormal::LEFT]));
        assert!(tracker.is_empty());

        tracker.activate();
        assert!(tracker.contact_begin(e(2), [ContactNormal::LEFT]));
        assert_eq!(tracker.current_normals(), set(&[ContactNormal::LEFT]));
    }

    #[test]
    fn deactivate_empty_tracker_is_silent() {
        let mut tracker = ContactTracker::new();
        tracker.deactivate();
        assert_eq!(tracker.notifier().notifications_sent(), 0);
    }
}
