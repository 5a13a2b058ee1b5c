//! Arena owning every spacecraft of a battle.
//!
//! The Arena is the container for all spacecraft. It provides:
//! - Storage with deterministic iteration order (`BTreeMap`)
//! - Spawn/despawn with monotonically increasing ids that are never reused
//! - Every operation that touches two spacecraft at once: targeting
//!   back-references, damage credit, fire notifications and target cycling
//! - Multiplayer record exchange for the whole battle
//!
//! # Cross-spacecraft references
//!
//! Spacecraft refer to each other only by [`SpacecraftId`]. A reference is
//! resolved through the arena on every use, so a despawned or destroyed
//! spacecraft can never be reached through a stale handle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use vanguard_core::arena::Arena;
//! use vanguard_core::class::SpacecraftClass;
//! use vanguard_core::config::SimulationContext;
//! use vanguard_core::spacecraft::{Hit, Spacecraft, TeamId};
//!
//! let ctx = SimulationContext::default();
//! let class = Arc::new(SpacecraftClass::new("falcon", 100.0));
//!
//! let mut arena = Arena::new();
//! let hunter = arena.spawn(Spacecraft::from_class(Arc::clone(&class)));
//! let prey = arena.spawn(Spacecraft::from_class(class));
//! arena.get_mut(hunter).unwrap().set_team(Some(TeamId::new("blue")));
//!
//! assert_eq!(arena.target_next_nearest_hostile(hunter), Some(prey));
//! assert_eq!(arena.get(prey).unwrap().targeted_by(), &[hunter]);
//!
//! let hit = Hit::new(40.0, Vec3::ZERO, Vec3::Y).by(hunter);
//! let report = arena.damage(prey, &hit, &ctx).unwrap();
//! assert_eq!(report.damage, 40.0);
//! assert!(arena.get(hunter).unwrap().stats().damage_dealt > 0.0);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::SimulationContext;
use crate::equipment::TargetView;
use crate::error::SyncError;
use crate::event::{EventData, EventId};
use crate::spacecraft::{Hit, HitReport, LifeState, Spacecraft, SpacecraftId};
use crate::sync::{GUEST_RECORD_LEN, HOST_RECORD_LEN};

/// Container of every spacecraft in a battle.
#[derive(Debug, Default)]
pub struct Arena {
    /// Monotonically increasing id counter.
    next_id: u64,
    /// Spacecraft storage with deterministic iteration order.
    spacecraft: BTreeMap<SpacecraftId, Spacecraft>,
    /// Completed simulation steps.
    tick: u64,
}

impl Arena {
    /// Creates an empty arena at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Adds a spacecraft and returns its id.
    pub fn spawn(&mut self, mut spacecraft: Spacecraft) -> SpacecraftId {
        let id = SpacecraftId::new(self.next_id);
        self.next_id += 1;
        spacecraft.set_handle(id);
        debug!(%id, spacecraft = spacecraft.id(), "spawned");
        self.spacecraft.insert(id, spacecraft);
        id
    }

    /// Removes a spacecraft, unlinking every targeting reference to and from it.
    pub fn despawn(&mut self, id: SpacecraftId) -> Option<Spacecraft> {
        let mut removed = self.spacecraft.remove(&id)?;
        if let Some(target) = removed.target() {
            if let Some(target) = self.spacecraft.get_mut(&target) {
                target.set_being_untargeted(id);
            }
        }
        for hunter in removed.targeted_by().to_vec() {
            if let Some(hunter) = self.spacecraft.get_mut(&hunter) {
                hunter.set_target_id(None);
            }
            removed.set_being_untargeted(hunter);
        }
        debug!(%id, spacecraft = removed.id(), "despawned");
        Some(removed)
    }

    /// Returns a spacecraft by id.
    #[must_use]
    pub fn get(&self, id: SpacecraftId) -> Option<&Spacecraft> {
        self.spacecraft.get(&id)
    }

    /// Returns a mutable spacecraft by id.
    #[must_use]
    pub fn get_mut(&mut self, id: SpacecraftId) -> Option<&mut Spacecraft> {
        self.spacecraft.get_mut(&id)
    }

    /// Ids in deterministic (ascending) order.
    pub fn ids_sorted(&self) -> impl Iterator<Item = SpacecraftId> + '_ {
        self.spacecraft.keys().copied()
    }

    /// Spacecraft in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SpacecraftId, &Spacecraft)> + '_ {
        self.spacecraft.iter().map(|(id, s)| (*id, s))
    }

    /// Mutable spacecraft in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SpacecraftId, &mut Spacecraft)> + '_ {
        self.spacecraft.iter_mut().map(|(id, s)| (*id, s))
    }

    /// Number of spacecraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spacecraft.len()
    }

    /// Returns true if the arena holds no spacecraft.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spacecraft.is_empty()
    }

    /// Completed simulation steps.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Despawns every destroyed spacecraft and returns them in id order.
    pub fn remove_destroyed(&mut self) -> Vec<Spacecraft> {
        let destroyed: Vec<_> = self
            .iter()
            .filter(|(_, s)| s.is_destroyed())
            .map(|(id, _)| id)
            .collect();
        destroyed
            .into_iter()
            .filter_map(|id| self.despawn(id))
            .collect()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advances every spacecraft by `dt` seconds, in id order.
    ///
    /// Latched fire requests are executed through [`fire`](Self::fire)
    /// first, so spacecraft targeting the shooter are notified.
    pub fn simulate(&mut self, dt: f32, ctx: &SimulationContext) {
        let ids: Vec<_> = self.ids_sorted().collect();
        for id in ids {
            let request = self
                .spacecraft
                .get_mut(&id)
                .and_then(Spacecraft::take_fire_request);
            if let Some(only_if_aimed_or_fixed) = request {
                self.fire(id, only_if_aimed_or_fixed);
            }

            let Some(target) = self.spacecraft.get(&id).map(Spacecraft::target) else {
                continue;
            };
            let view = target.and_then(|t| self.target_view(t));
            let Some(spacecraft) = self.spacecraft.get_mut(&id) else {
                continue;
            };
            spacecraft.simulate(dt, ctx, view);

            if let Some(lost) = target.filter(|t| spacecraft.target() != Some(*t)) {
                if let Some(lost) = self.spacecraft.get_mut(&lost) {
                    lost.set_being_untargeted(id);
                }
            }
        }
        self.tick += 1;
    }

    fn target_view(&self, id: SpacecraftId) -> Option<TargetView> {
        self.spacecraft.get(&id).map(|target| TargetView {
            id,
            position: target.position(),
            velocity: target.velocity(),
            alive: Self::is_targetable(target),
        })
    }

    fn is_targetable(spacecraft: &Spacecraft) -> bool {
        spacecraft.state() == LifeState::Alive
            && spacecraft.hitpoints() > 0.0
            && !spacecraft.is_away()
    }

    /// Fires every ready weapon of `id`.
    ///
    /// Raises `TargetFired` on every spacecraft targeting the shooter, then
    /// `Fired` on the shooter. Returns the number of projectiles.
    pub fn fire(&mut self, id: SpacecraftId, only_if_aimed_or_fixed: bool) -> u32 {
        let Some(shooter) = self.spacecraft.get_mut(&id) else {
            return 0;
        };
        let projectiles = shooter.discharge_weapons(only_if_aimed_or_fixed);
        if projectiles == 0 {
            return 0;
        }
        let hunters = shooter.targeted_by().to_vec();
        for hunter in hunters {
            if let Some(hunter) = self.spacecraft.get_mut(&hunter) {
                hunter.handle_event(EventId::TargetFired, &EventData::TargetFired { shooter: id });
            }
        }
        if let Some(shooter) = self.spacecraft.get_mut(&id) {
            shooter.handle_event(EventId::Fired, &EventData::Fired { projectiles });
        }
        projectiles
    }

    /// Resolves a hit on `target` and credits the attacker named in the hit.
    ///
    /// Returns `None` if the target does not exist or is destroyed.
    pub fn damage(
        &mut self,
        target: SpacecraftId,
        hit: &Hit,
        ctx: &SimulationContext,
    ) -> Option<HitReport> {
        let report = self.spacecraft.get_mut(&target)?.take_hit(hit, ctx)?;
        if let Some(attacker) = hit
            .by
            .filter(|by| *by != target)
            .and_then(|by| self.spacecraft.get_mut(&by))
        {
            attacker.credit_hit(&report, ctx);
        }
        if let Some(target) = self.spacecraft.get_mut(&target) {
            target.finish_hit(&report);
        }
        Some(report)
    }

    // =========================================================================
    // Targeting
    // =========================================================================

    /// Sets the target of `id`, keeping `targeted_by` lists consistent.
    ///
    /// Returns false if `id` does not exist, or the new target does not exist,
    /// is `id` itself, or is not targetable.
    pub fn set_target(&mut self, id: SpacecraftId, target: Option<SpacecraftId>) -> bool {
        let Some(hunter) = self.spacecraft.get(&id) else {
            return false;
        };
        let current = hunter.target();
        if let Some(new) = target {
            if hunter.state() != LifeState::Alive
                || new == id || !self.spacecraft.get(&new).is_some_and(Self::is_targetable) {
                return false;
            }
        }
        if current == target {
            return true;
        }

        if let Some(old) = current.and_then(|old| self.spacecraft.get_mut(&old)) {
            old.set_being_untargeted(id);
        }
        if let Some(new) = target.and_then(|new| self.spacecraft.get_mut(&new)) {
            new.set_being_targeted(id);
        }
        if let Some(spacecraft) = self.spacecraft.get_mut(&id) {
            spacecraft.set_target_id(target);
        }
        trace!(%id, ?target, "target changed");
        true
    }

    /// Cycles the target of `id` through hostiles ordered by distance.
    ///
    /// Returns the new target, or `None` if there are no hostiles.
    pub fn target_next_nearest_hostile(&mut self, id: SpacecraftId) -> Option<SpacecraftId> {
        self.cycle_target(id, |a, b| a.distance.total_cmp(&b.distance))
    }

    /// Cycles the target of `id` through hostiles ordered by score value,
    /// highest first; equal values go nearest first.
    pub fn target_next_best_hostile(&mut self, id: SpacecraftId) -> Option<SpacecraftId> {
        self.cycle_target(id, |a, b| {
            b.score_value
                .total_cmp(&a.score_value)
                .then(a.distance.total_cmp(&b.distance))
        })
    }

    fn cycle_target(
        &mut self,
        id: SpacecraftId,
        order: impl Fn(&Candidate, &Candidate) -> Ordering,
    ) -> Option<SpacecraftId> {
        let hunter = self.spacecraft.get(&id)?;
        let position = hunter.position();
        let current = hunter.target();

        let mut candidates: Vec<Candidate> = self
            .iter()
            .filter(|(other, s)| *other != id && Self::is_targetable(s) && hunter.is_hostile(s))
            .map(|(other, s)| Candidate {
                id: other,
                distance: s.position().distance(position),
                score_value: s.score_value(),
            })
            .collect();
        // Stable sort keeps id order for full ties
        candidates.sort_by(|a, b| order(a, b));

        let next = match current.and_then(|c| candidates.iter().position(|x| x.id == c)) {
            Some(index) => candidates.get((index + 1) % candidates.len()),
            None => candidates.first(),
        }
        .map(|c| c.id)?;
        self.set_target(id, Some(next));
        Some(next)
    }

    // =========================================================================
    // Multiplayer
    // =========================================================================

    /// Host records of every spacecraft, concatenated in id order.
    pub fn multi_host_data(&mut self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.spacecraft.len() * HOST_RECORD_LEN);
        for spacecraft in self.spacecraft.values_mut() {
            data.extend_from_slice(spacecraft.get_multi_host_data());
        }
        data
    }

    /// Applies concatenated host records, the `i`-th record to the `i`-th
    /// spacecraft in id order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BufferTooShort`] if `data` holds fewer records
    /// than the arena holds spacecraft. Nothing is applied in that case.
    pub fn apply_multi_host_data(&mut self, data: &[f32]) -> Result<(), SyncError> {
        let needed = self.spacecraft.len() * HOST_RECORD_LEN;
        if data.len() < needed {
            return Err(SyncError::BufferTooShort {
                needed,
                got: data.len(),
            });
        }
        for (index, spacecraft) in self.spacecraft.values_mut().enumerate() {
            spacecraft.apply_multi_host_data(data, index * HOST_RECORD_LEN)?;
        }
        Ok(())
    }

    /// Applies a guest record to the spacecraft it names.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BufferTooShort`] for short records and
    /// [`SyncError::NoSuchSpacecraft`] for unknown indices.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply_multi_guest_data(&mut self, data: &[f32]) -> Result<(), SyncError> {
        if data.len() < GUEST_RECORD_LEN {
            return Err(SyncError::BufferTooShort {
                needed: GUEST_RECORD_LEN,
                got: data.len(),
            });
        }
        let raw = data[0].round().max(0.0) as u64;
        self.spacecraft
            .get_mut(&SpacecraftId::new(raw))
            .ok_or(SyncError::NoSuchSpacecraft(raw))?
            .apply_multi_guest_data(data)
    }
}

/// Target cycling candidate.
struct Candidate {
    id: SpacecraftId,
    distance: f32,
    score_value: f64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::tests::helpers::{laser_class, spawn_fighter};

    mod storage_tests {
        use super::*;
        use crate::tests::helpers::standalone_fighter;

        #[test]
        fn spawn_assigns_sequential_ids_and_handles() {
            let mut arena = Arena::new();
            let a = arena.spawn(standalone_fighter());
            let b = arena.spawn(standalone_fighter());
            assert_eq!(a, SpacecraftId::new(0));
            assert_eq!(b, SpacecraftId::new(1));
            assert_eq!(arena.get(b).unwrap().handle(), Some(b));
            assert_eq!(arena.ids_sorted().collect::<Vec<_>>(), vec![a, b]);
        }

        #[test]
        fn ids_are_not_reused() {
            let mut arena = Arena::new();
            let a = arena.spawn(standalone_fighter());
            arena.despawn(a);
            let b = arena.spawn(standalone_fighter());
            assert_ne!(a, b);
            assert!(arena.get(a).is_none());
            assert_eq!(arena.len(), 1);
        }

        #[test]
        fn despawn_unlinks_targeting() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            let prey = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 100.0, 0.0));
            assert!(arena.set_target(hunter, Some(prey)));

            let removed = arena.despawn(prey).unwrap();
            assert!(removed.targeted_by().is_empty());
            assert_eq!(arena.get(hunter).unwrap().target(), None);
        }

        #[test]
        fn remove_destroyed_takes_only_destroyed() {
            let mut arena = Arena::new();
            let a = arena.spawn(standalone_fighter());
            let b = arena.spawn(standalone_fighter());
            arena.get_mut(a).unwrap().destroy(false);

            let removed = arena.remove_destroyed();
            assert_eq!(removed.len(), 1);
            assert_eq!(removed[0].handle(), Some(a));
            assert_eq!(arena.ids_sorted().collect::<Vec<_>>(), vec![b]);
        }
    }

    mod targeting_tests {
        use super::*;

        #[test]
        fn set_target_maintains_back_references() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            let first = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 100.0, 0.0));
            let second = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 200.0, 0.0));

            assert!(arena.set_target(hunter, Some(first)));
            assert_eq!(arena.get(first).unwrap().targeted_by(), &[hunter]);

            assert!(arena.set_target(hunter, Some(second)));
            assert!(arena.get(first).unwrap().targeted_by().is_empty());
            assert_eq!(arena.get(second).unwrap().targeted_by(), &[hunter]);

            assert!(arena.set_target(hunter, None));
            assert!(arena.get(second).unwrap().targeted_by().is_empty());
        }

        #[test]
        fn cannot_target_self_or_missing() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            assert!(!arena.set_target(hunter, Some(hunter)));
            assert!(!arena.set_target(hunter, Some(SpacecraftId::new(99))));
            assert!(!arena.set_target(SpacecraftId::new(99), None));
        }

        #[test]
        fn nearest_hostile_cycles_and_skips_friends() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            let far = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 300.0, 0.0));
            let _friend = spawn_fighter(&mut arena, "blue", Vec3::new(0.0, 10.0, 0.0));
            let near = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 100.0, 0.0));

            assert_eq!(arena.target_next_nearest_hostile(hunter), Some(near));
            assert_eq!(arena.target_next_nearest_hostile(hunter), Some(far));
            assert_eq!(arena.target_next_nearest_hostile(hunter), Some(near));
            assert!(arena.get(far).unwrap().targeted_by().is_empty());
        }

        #[test]
        fn best_hostile_prefers_score_value() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            let _plain = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 100.0, 0.0));
            let armed = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 500.0, 0.0));
            arena.get_mut(armed).unwrap().equip_weapon(laser_class(), 0);

            assert_eq!(arena.target_next_best_hostile(hunter), Some(armed));
        }

        #[test]
        fn no_hostiles_means_no_target() {
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            spawn_fighter(&mut arena, "blue", Vec3::new(0.0, 10.0, 0.0));
            assert_eq!(arena.target_next_nearest_hostile(hunter), None);
        }

        #[test]
        fn destroyed_target_is_dropped_on_simulate() {
            let ctx = SimulationContext::default();
            let mut arena = Arena::new();
            let hunter = spawn_fighter(&mut arena, "blue", Vec3::ZERO);
            let prey = spawn_fighter(&mut arena, "red", Vec3::new(0.0, 100.0, 0.0));
            arena.set_target(hunter, Some(prey));

            arena
                .damage(prey, &Hit::new(1000.0, Vec3::ZERO, Vec3::Y), &ctx)
                .unwrap();
            arena.simulate(crate::physics::FIXED_DT, &ctx);

            assert_eq!(arena.get(hunter).unwrap().target(), None);
            assert!(arena.get(prey).unwrap().targeted_by().is_empty());
        }
    }

    mod fire_tests {
        use super::*;

        #[test]
        fn targeters_hear_the_shot() {
            let mut arena = Arena::new();
            let shooter = spawn_fighter(&mut arena, "red", Vec3::ZERO);
            let watcher = spawn_fighter(&mut arena, "blue", Vec3::new(0.0, 100.0, 0.0));
            arena.get_mut(shooter).unwrap().equip_weapon(laser_class(), 0);
            arena.set_target(watcher, Some(shooter));

            let heard = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&heard);
            arena
                .get_mut(watcher)
                .unwrap()
                .add_event_handler(EventId::TargetFired, move |_, data| {
                    sink.borrow_mut().push(data.clone());
                    true
                });

            assert_eq!(arena.fire(shooter, false), 1);
            assert_eq!(
                *heard.borrow(),
                vec![EventData::TargetFired { shooter }]
            );

            // Cooling down: nothing fired, nobody notified
            assert_eq!(arena.fire(shooter, false), 0);
            assert_eq!(heard.borrow().len(), 1);
        }

        #[test]
        fn latched_requests_notify_targeters() {
            let ctx = SimulationContext::default();
            let mut arena = Arena::new();
            let shooter = spawn_fighter(&mut arena, "red", Vec3::ZERO);
            let watcher = spawn_fighter(&mut arena, "blue", Vec3::new(0.0, 100.0, 0.0));
            arena.get_mut(shooter).unwrap().equip_weapon(laser_class(), 0);
            arena.set_target(watcher, Some(shooter));

            let heard = Rc::new(RefCell::new(0));
            let sink = Rc::clone(&heard);
            arena
                .get_mut(watcher)
                .unwrap()
                .add_event_handler(EventId::TargetFired, move |_, _| {
                    *sink.borrow_mut() += 1;
                    true
                });

            arena.get_mut(shooter).unwrap().request_fire(false);
            arena.simulate(crate::physics::FIXED_DT, &ctx);
            assert_eq!(*heard.borrow(), 1);
            assert_eq!(arena.get_mut(shooter).unwrap().take_projectiles().len(), 1);
        }
    }

    mod sync_tests {
        use super::*;
        use crate::equipment::ManeuveringTargets;

        #[test]
        fn host_records_cover_every_spacecraft_in_order() {
            let mut host = Arena::new();
            spawn_fighter(&mut host, "blue", Vec3::new(1.0, 0.0, 0.0));
            spawn_fighter(&mut host, "red", Vec3::new(2.0, 0.0, 0.0));
            let data = host.multi_host_data();
            assert_eq!(data.len(), 2 * HOST_RECORD_LEN);

            let mut guest = Arena::new();
            let a = spawn_fighter(&mut guest, "blue", Vec3::ZERO);
            let b = spawn_fighter(&mut guest, "red", Vec3::ZERO);
            guest.apply_multi_host_data(&data).unwrap();
            assert_eq!(guest.get(a).unwrap().position(), Vec3::new(1.0, 0.0, 0.0));
            assert_eq!(guest.get(b).unwrap().position(), Vec3::new(2.0, 0.0, 0.0));

            assert!(guest.apply_multi_host_data(&data[..HOST_RECORD_LEN]).is_err());
        }

        #[test]
        fn guest_records_are_routed_by_index() {
            let mut guest = Arena::new();
            spawn_fighter(&mut guest, "blue", Vec3::ZERO);
            let pilot = spawn_fighter(&mut guest, "blue", Vec3::ZERO);
            guest.get_mut(pilot).unwrap().forward(None);
            let record = *guest.get_mut(pilot).unwrap().get_multi_guest_data();
            assert_eq!(record[0], 1.0);

            let mut host = Arena::new();
            spawn_fighter(&mut host, "blue", Vec3::ZERO);
            let remote = spawn_fighter(&mut host, "blue", Vec3::ZERO);
            host.apply_multi_guest_data(&record).unwrap();
            assert_eq!(
                host.get(remote).unwrap().maneuvering().targets(),
                guest.get(pilot).unwrap().maneuvering().targets()
            );
            assert_ne!(
                host.get(remote).unwrap().maneuvering().targets(),
                ManeuveringTargets::default()
            );

            let mut unknown = record;
            unknown[0] = 7.0;
            assert_eq!(
                host.apply_multi_guest_data(&unknown),
                Err(SyncError::NoSuchSpacecraft(7))
            );
        }
    }
}
