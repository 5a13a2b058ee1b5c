//! Spacecraft aggregate root.
//!
//! A [`Spacecraft`] owns its physical body, equipment, event bus, mission
//! statistics, outbox and network scratch buffers. It knows other
//! spacecraft only by [`SpacecraftId`]; anything touching two spacecraft at
//! once (targeting back-references, damage credit, fire notifications) goes
//! through the [`Arena`](crate::arena::Arena).
//!
//! # Lifecycle
//!
//! ```text
//! Alive --(hitpoints <= 0, next simulate)--> Destroying
//! Destroying --(explosion shown long enough)--> Dead
//! ```
//!
//! On reaching `Dead` the `Destructed` event fires. If every handler agrees,
//! the spacecraft is destroyed at once: equipment, target and handlers are
//! released. Otherwise it stays dead but intact until the owner calls
//! [`Spacecraft::destroy`] or [`Spacecraft::respawn`].

mod blinker;
mod damage;
mod loadout;
mod missiles;
mod stats;

pub use blinker::Blinker;
pub use damage::{Hit, HitReport};
pub use stats::MissionStats;

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::class::{
    JumpEngineClass, MissileClass, PropulsionClass, ShieldClass, SpacecraftClass, WeaponClass,
};
use crate::config::{GameplayConfig, SimulationContext};
use crate::effect::{Effect, Missile, Outbox, Projectile, SoundCue};
use crate::equipment::targeting::LockParameters;
use crate::equipment::{
    JumpEngine, JumpState, JumpTransition, ManeuveringComputer, MissileLauncher, Propulsion,
    Shield, TargetView, TargetingComputer, Weapon,
};
use crate::event::{self, EventBus, EventData, EventId};
use crate::physics::{Frame, PhysicalBody, RigidBody};
use crate::sync::{GUEST_RECORD_LEN, HOST_RECORD_LEN};

// =============================================================================
// Identifiers
// =============================================================================

/// Arena-unique spacecraft identifier. Never reused within an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpacecraftId(u64);

impl SpacecraftId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpacecraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spacecraft({})", self.0)
    }
}

/// Team affiliation. Spacecraft sharing a team are friendly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(String);

impl TeamId {
    /// Creates a team id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Team name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

bitflags! {
    /// Boolean status of a spacecraft.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Weapons and launchers refuse to fire
        const FIRING_DISABLED = 1 << 0;
        /// The jump engine is preparing, jumping out or jumping in
        const JUMPING = 1 << 1;
        /// Outside the battlefield
        const AWAY = 1 << 2;
        /// Fired since the last host record was taken
        const HOST_FIRED = 1 << 3;
        /// Fired since the last guest record was taken
        const GUEST_FIRED = 1 << 4;
    }
}

/// Coarse lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeState {
    /// Flying and fighting.
    Alive,
    /// Exploding; still integrated but no longer controllable.
    Destroying,
    /// Finished exploding.
    Dead,
}

/// Values derived from the body, recomputed lazily once per step.
#[derive(Debug, Clone, Default)]
struct DerivedCache {
    relative_velocity: OnceCell<Vec3>,
    turning: OnceCell<Mat3>,
    scaled_orientation: OnceCell<Mat3>,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Spacecraft
// =============================================================================

/// A combat spacecraft.
#[derive(Debug)]
pub struct Spacecraft {
    handle: Option<SpacecraftId>,
    class: Option<Arc<SpacecraftClass>>,
    id: String,
    name: Option<String>,
    squad: Option<String>,
    index_in_squad: u32,
    team: Option<TeamId>,

    hitpoints: f64,
    max_hitpoints: f64,
    armor: f64,
    score_value: f64,
    alive: bool,
    destroyed: bool,
    time_since_destruction: Option<f64>,
    flags: StatusFlags,
    fire_request: Option<bool>,

    body: Box<dyn PhysicalBody>,
    weapons: Vec<Weapon>,
    missile_launchers: Vec<MissileLauncher>,
    active_missile_launcher: Option<usize>,
    propulsion: Option<Propulsion>,
    maneuvering: ManeuveringComputer,
    jump_engine: Option<JumpEngine>,
    shield: Option<Shield>,
    targeting: TargetingComputer,
    targeted_by: Vec<SpacecraftId>,

    blinkers: Vec<Blinker>,
    initial_blink_time: f32,
    damage_indicators: Vec<f64>,

    stats: MissionStats,
    events: EventBus,
    outbox: Outbox,
    cache: DerivedCache,

    pub(crate) multi_host_buffer: [f32; HOST_RECORD_LEN],
    pub(crate) multi_guest_buffer: [f32; GUEST_RECORD_LEN],
}

impl Spacecraft {
    /// Creates a spacecraft of `class` attached to `body`, with no equipment.
    #[must_use]
    pub fn new(class: Arc<SpacecraftClass>, body: Box<dyn PhysicalBody>) -> Self {
        let blinkers = class.blinkers.iter().map(|b| Blinker::new(b, 0.0)).collect();
        let mut spacecraft = Self {
            handle: None,
            id: class.name.clone(),
            name: None,
            squad: None,
            index_in_squad: 0,
            team: None,
            hitpoints: class.hitpoints,
            max_hitpoints: class.hitpoints,
            armor: class.armor,
            score_value: class.score_value,
            alive: true,
            destroyed: false,
            time_since_destruction: None,
            flags: StatusFlags::empty(),
            fire_request: None,
            body,
            weapons: Vec::new(),
            missile_launchers: Vec::new(),
            active_missile_launcher: None,
            propulsion: None,
            maneuvering: ManeuveringComputer::new(class.max_speed, class.max_turn_rate),
            jump_engine: None,
            shield: None,
            targeting: TargetingComputer::new(),
            targeted_by: Vec::new(),
            blinkers,
            initial_blink_time: 0.0,
            damage_indicators: Vec::new(),
            stats: MissionStats::default(),
            events: EventBus::new(),
            outbox: Outbox::new(),
            cache: DerivedCache::default(),
            multi_host_buffer: [0.0; HOST_RECORD_LEN],
            multi_guest_buffer: [0.0; GUEST_RECORD_LEN],
            class: Some(class),
        };
        spacecraft.update_score_value();
        spacecraft
    }

    /// Creates a spacecraft with a [`RigidBody`] built from the class.
    #[must_use]
    pub fn from_class(class: Arc<SpacecraftClass>) -> Self {
        let body = RigidBody::new(class.mass, class.half_extents).with_drag(class.drag);
        Self::new(class, Box::new(body))
    }

    /// Logs and returns true if the spacecraft can no longer take commands.
    fn reject_destroyed(&self, operation: &'static str) -> bool {
        if self.destroyed || self.class.is_none() {
            warn!(spacecraft = %self.id, operation, "ignoring command on destroyed spacecraft");
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Arena handle, set on spawn.
    #[must_use]
    pub fn handle(&self) -> Option<SpacecraftId> {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: SpacecraftId) {
        self.handle = Some(handle);
    }

    /// Mission-unique string id: the name, else `"squad index"`, else the class name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name: the name, else `"Squad index"`, else the class name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.name, &self.squad) {
            (Some(name), _) => name.clone(),
            (None, Some(squad)) => format!("{} {}", capitalize(squad), self.index_in_squad),
            (None, None) => self.id.clone(),
        }
    }

    /// Sets the unique name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.refresh_id();
    }

    /// Puts the spacecraft into a squad.
    pub fn set_squad(&mut self, squad: impl Into<String>, index: u32) {
        self.squad = Some(squad.into());
        self.index_in_squad = index;
        self.refresh_id();
    }

    fn refresh_id(&mut self) {
        self.id = match (&self.name, &self.squad) {
            (Some(name), _) => name.clone(),
            (None, Some(squad)) => format!("{squad} {}", self.index_in_squad),
            (None, None) => self
                .class
                .as_ref()
                .map_or_else(String::new, |c| c.name.clone()),
        };
    }

    /// Squad name.
    #[must_use]
    pub fn squad(&self) -> Option<&str> {
        self.squad.as_deref()
    }

    /// Position within the squad.
    #[must_use]
    pub fn index_in_squad(&self) -> u32 {
        self.index_in_squad
    }

    /// Team, if any.
    #[must_use]
    pub fn team(&self) -> Option<&TeamId> {
        self.team.as_ref()
    }

    /// Changes team.
    pub fn set_team(&mut self, team: Option<TeamId>) {
        self.team = team;
    }

    /// Returns true if `other` is an enemy.
    #[must_use]
    pub fn is_hostile(&self, other: &Spacecraft) -> bool {
        self.is_hostile_to_team(other.team())
    }

    /// Returns true if a spacecraft of `team` is an enemy. Spacecraft
    /// without a team are hostile to everyone.
    #[must_use]
    pub fn is_hostile_to_team(&self, team: Option<&TeamId>) -> bool {
        match (&self.team, team) {
            (Some(own), Some(other)) => own != other,
            _ => true,
        }
    }

    // -------------------------------------------------------------------------
    // State queries
    // -------------------------------------------------------------------------

    /// Spacecraft class. `None` after a destroy that did not preserve it.
    #[must_use]
    pub fn class(&self) -> Option<&Arc<SpacecraftClass>> {
        self.class.as_ref()
    }

    /// Returns true until the explosion finishes.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns true once equipment and handlers have been released.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifeState {
        if !self.alive || self.destroyed {
            LifeState::Dead
        } else if self.time_since_destruction.is_some() {
            LifeState::Destroying
        } else {
            LifeState::Alive
        }
    }

    /// Seconds since destruction started, if it has.
    #[must_use]
    pub fn time_since_destruction(&self) -> Option<f64> {
        self.time_since_destruction
    }

    /// Current hitpoints.
    #[must_use]
    pub fn hitpoints(&self) -> f64 {
        self.hitpoints
    }

    /// Maximum hitpoints.
    #[must_use]
    pub fn max_hitpoints(&self) -> f64 {
        self.max_hitpoints
    }

    /// Flat damage reduction per hit.
    #[must_use]
    pub fn armor(&self) -> f64 {
        self.armor
    }

    /// Hitpoints over maximum, in `[0, 1]`.
    #[must_use]
    pub fn hull_integrity(&self) -> f64 {
        if self.max_hitpoints > 0.0 {
            (self.hitpoints / self.max_hitpoints).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Shield capacity over maximum; zero without a shield.
    #[must_use]
    pub fn shield_integrity(&self) -> f64 {
        self.shield.as_ref().map_or(0.0, Shield::integrity)
    }

    /// Sets hitpoints from an integrity ratio.
    pub fn set_hull_integrity(&mut self, integrity: f64) {
        if self.reject_destroyed("set_hull_integrity") {
            return;
        }
        self.hitpoints = integrity.clamp(0.0, 1.0) * self.max_hitpoints;
    }

    /// Sets shield capacity from an integrity ratio. No-op without a shield.
    pub fn set_shield_integrity(&mut self, integrity: f64) {
        if self.reject_destroyed("set_shield_integrity") {
            return;
        }
        if let Some(shield) = &mut self.shield {
            shield.set_integrity(integrity);
        }
    }

    /// Score awarded for destroying this spacecraft: class value plus
    /// equipped modules.
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.score_value
    }

    fn update_score_value(&mut self) {
        let hull = self.class.as_ref().map_or(0.0, |c| c.score_value);
        let weapons: f64 = self.weapons.iter().map(Weapon::score_value).sum();
        let launchers: f64 = self
            .missile_launchers
            .iter()
            .map(MissileLauncher::score_value)
            .sum();
        self.score_value = hull
            + weapons
            + launchers
            + self.propulsion.as_ref().map_or(0.0, Propulsion::score_value)
            + self.shield.as_ref().map_or(0.0, Shield::score_value)
            + self.jump_engine.as_ref().map_or(0.0, JumpEngine::score_value);
    }

    /// Sustained damage per second of all weapons against `armor`.
    #[must_use]
    pub fn firepower(&self, armor: f64) -> f64 {
        self.weapons.iter().map(|w| w.firepower(armor)).sum()
    }

    /// Longest weapon reach at the current speed.
    #[must_use]
    pub fn weapon_range(&self) -> f32 {
        let speed = self.body.velocity().length();
        self.weapons
            .iter()
            .map(|w| w.range(speed))
            .fold(0.0, f32::max)
    }

    /// Status flags.
    #[must_use]
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Clears a flag and returns whether it was set.
    pub(crate) fn take_flag(&mut self, flag: StatusFlags) -> bool {
        let was_set = self.flags.contains(flag);
        self.flags.remove(flag);
        was_set
    }

    /// Returns true while weapons are disabled.
    #[must_use]
    pub fn is_firing_disabled(&self) -> bool {
        self.flags.contains(StatusFlags::FIRING_DISABLED)
    }

    /// Enables or disables weapons and launchers. Idempotent.
    pub fn set_firing_disabled(&mut self, disabled: bool) {
        self.flags.set(StatusFlags::FIRING_DISABLED, disabled);
    }

    /// Returns true while the jump engine is in a jump phase.
    #[must_use]
    pub fn is_jumping(&self) -> bool {
        self.flags.contains(StatusFlags::JUMPING)
    }

    /// Returns true while outside the battlefield.
    #[must_use]
    pub fn is_away(&self) -> bool {
        self.flags.contains(StatusFlags::AWAY)
    }

    /// Places the spacecraft outside the battlefield, ready to jump in.
    pub fn set_away(&mut self) {
        if self.reject_destroyed("set_away") {
            return;
        }
        self.flags.insert(StatusFlags::AWAY);
        self.flags.remove(StatusFlags::JUMPING);
        if let Some(engine) = &mut self.jump_engine {
            engine.set_away();
        }
        self.body.reset();
    }

    // -------------------------------------------------------------------------
    // Body
    // -------------------------------------------------------------------------

    /// Physical body.
    #[must_use]
    pub fn body(&self) -> &dyn PhysicalBody {
        self.body.as_ref()
    }

    /// Mutable physical body.
    pub fn body_mut(&mut self) -> &mut dyn PhysicalBody {
        self.cache = DerivedCache::default();
        self.body.as_mut()
    }

    /// World-space position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    /// World-space velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.body.velocity()
    }

    /// Velocity in the spacecraft's local frame (strafe, forward, lift).
    #[must_use]
    pub fn relative_velocity(&self) -> Vec3 {
        *self
            .cache
            .relative_velocity
            .get_or_init(|| self.body.orientation().transpose() * self.body.velocity())
    }

    /// Rotation covered in one second at the current angular velocity,
    /// in the local frame.
    #[must_use]
    pub fn turning_matrix(&self) -> Mat3 {
        *self.cache.turning.get_or_init(|| {
            let local = self.body.orientation().transpose() * self.body.angular_velocity();
            Mat3::from_quat(Quat::from_scaled_axis(local))
        })
    }

    /// Orientation scaled by the class model scale.
    #[must_use]
    pub fn scaled_orientation(&self) -> Mat3 {
        *self.cache.scaled_orientation.get_or_init(|| {
            let scale = self.class.as_ref().map_or(1.0, |c| c.scale);
            self.body.orientation() * scale
        })
    }

    // -------------------------------------------------------------------------
    // Equipment
    // -------------------------------------------------------------------------

    /// Equipped weapons, ordered by slot.
    #[must_use]
    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Equipped launchers, ordered by slot.
    #[must_use]
    pub fn missile_launchers(&self) -> &[MissileLauncher] {
        &self.missile_launchers
    }

    /// Index of the active launcher.
    #[must_use]
    pub fn active_missile_launcher(&self) -> Option<usize> {
        self.active_missile_launcher
    }

    /// Active launcher.
    #[must_use]
    pub fn active_launcher(&self) -> Option<&MissileLauncher> {
        self.active_missile_launcher
            .and_then(|index| self.missile_launchers.get(index))
    }

    /// Propulsion.
    #[must_use]
    pub fn propulsion(&self) -> Option<&Propulsion> {
        self.propulsion.as_ref()
    }

    /// Shield.
    #[must_use]
    pub fn shield(&self) -> Option<&Shield> {
        self.shield.as_ref()
    }

    /// Jump engine.
    #[must_use]
    pub fn jump_engine(&self) -> Option<&JumpEngine> {
        self.jump_engine.as_ref()
    }

    /// Maneuvering computer.
    #[must_use]
    pub fn maneuvering(&self) -> &ManeuveringComputer {
        &self.maneuvering
    }

    /// Mutable maneuvering computer.
    pub fn maneuvering_mut(&mut self) -> &mut ManeuveringComputer {
        &mut self.maneuvering
    }

    /// Targeting computer.
    #[must_use]
    pub fn targeting(&self) -> &TargetingComputer {
        &self.targeting
    }

    /// Navigation lights.
    #[must_use]
    pub fn blinkers(&self) -> &[Blinker] {
        &self.blinkers
    }

    /// Sets the initial phase of every blinker.
    pub fn set_initial_blink_time(&mut self, time: f32) {
        self.initial_blink_time = time;
        if let Some(class) = &self.class {
            self.blinkers = class
                .blinkers
                .iter()
                .map(|b| Blinker::new(b, time))
                .collect();
        }
    }

    /// Mounts a weapon in a slot, replacing any weapon already there.
    ///
    /// Returns false if the slot does not exist.
    pub fn equip_weapon(&mut self, class: Arc<WeaponClass>, slot_index: usize) -> bool {
        if self.reject_destroyed("equip_weapon") {
            return false;
        }
        let Some(slot) = self
            .class
            .as_ref()
            .and_then(|c| c.weapon_slots.get(slot_index))
            .cloned()
        else {
            trace!(spacecraft = %self.id, slot_index, weapon = %class.name, "dropping weapon for missing slot");
            return false;
        };
        self.weapons.retain(|w| w.slot_index() != slot_index);
        let at = self.weapons.partition_point(|w| w.slot_index() < slot_index);
        self.weapons.insert(at, Weapon::new(class, slot_index, slot));
        self.update_score_value();
        true
    }

    /// Removes every weapon.
    pub fn unequip_weapons(&mut self) {
        self.weapons.clear();
        self.update_score_value();
    }

    /// Mounts a launcher in a slot, replacing any launcher already there.
    ///
    /// `count` defaults to the slot capacity. Returns false if the slot does
    /// not exist.
    pub fn equip_missile_launcher(
        &mut self,
        class: Arc<MissileClass>,
        slot_index: usize,
        count: Option<u32>,
    ) -> bool {
        if self.reject_destroyed("equip_missile_launcher") {
            return false;
        }
        let Some(slot) = self
            .class
            .as_ref()
            .and_then(|c| c.missile_launcher_slots.get(slot_index))
            .cloned()
        else {
            trace!(spacecraft = %self.id, slot_index, missile = %class.name, "dropping launcher for missing slot");
            return false;
        };
        let count = count.unwrap_or(slot.capacity);
        let active_slot = self.active_launcher().map(MissileLauncher::slot_index);

        self.missile_launchers.retain(|l| l.slot_index() != slot_index);
        let at = self
            .missile_launchers
            .partition_point(|l| l.slot_index() < slot_index);
        self.missile_launchers
            .insert(at, MissileLauncher::new(class, slot_index, slot, count));

        // Keep pointing at the same physical launcher after the insert
        self.active_missile_launcher = active_slot
            .filter(|s| *s != slot_index)
            .and_then(|s| self.missile_launchers.iter().position(|l| l.slot_index() == s))
            .or_else(|| {
                self.missile_launchers
                    .iter()
                    .position(MissileLauncher::has_missiles_left_to_launch)
            });
        self.update_score_value();
        true
    }

    /// Removes every launcher.
    pub fn unequip_missile_launchers(&mut self) {
        self.missile_launchers.clear();
        self.active_missile_launcher = None;
        self.update_score_value();
    }

    /// Installs propulsion.
    pub fn equip_propulsion(&mut self, class: Arc<PropulsionClass>) {
        if self.reject_destroyed("equip_propulsion") {
            return;
        }
        self.propulsion = Some(Propulsion::new(class));
        self.update_score_value();
    }

    /// Removes propulsion.
    pub fn unequip_propulsion(&mut self) {
        self.propulsion = None;
        self.update_score_value();
    }

    /// Installs a shield.
    pub fn equip_shield(&mut self, class: Arc<ShieldClass>) {
        if self.reject_destroyed("equip_shield") {
            return;
        }
        self.shield = Some(Shield::new(class));
        self.update_score_value();
    }

    /// Removes the shield.
    pub fn unequip_shield(&mut self) {
        self.shield = None;
        self.update_score_value();
    }

    /// Installs a jump engine.
    pub fn equip_jump_engine(&mut self, class: Arc<JumpEngineClass>, config: &GameplayConfig) {
        if self.reject_destroyed("equip_jump_engine") {
            return;
        }
        let mut engine = JumpEngine::new(class, config);
        if self.is_away() {
            engine.set_away();
        }
        self.jump_engine = Some(engine);
        self.update_score_value();
    }

    /// Removes the jump engine.
    pub fn unequip_jump_engine(&mut self) {
        self.jump_engine = None;
        self.flags.remove(StatusFlags::JUMPING);
        self.update_score_value();
    }

    // -------------------------------------------------------------------------
    // Targeting
    // -------------------------------------------------------------------------

    /// Current target.
    #[must_use]
    pub fn target(&self) -> Option<SpacecraftId> {
        self.targeting.target()
    }

    pub(crate) fn set_target_id(&mut self, target: Option<SpacecraftId>) {
        self.targeting.set_target(target);
    }

    /// Spacecraft currently targeting this one.
    #[must_use]
    pub fn targeted_by(&self) -> &[SpacecraftId] {
        &self.targeted_by
    }

    /// Records that `by` targets this spacecraft.
    pub fn set_being_targeted(&mut self, by: SpacecraftId) {
        if !self.targeted_by.contains(&by) {
            self.targeted_by.push(by);
        }
    }

    /// Records that `by` no longer targets this spacecraft.
    pub fn set_being_untargeted(&mut self, by: SpacecraftId) {
        self.targeted_by.retain(|id| *id != by);
    }

    /// Lead-corrected aim point on the current target.
    #[must_use]
    pub fn target_hit_position(&self) -> Option<Vec3> {
        self.targeting.target_hit_position()
    }

    /// Missile lock progress on the current target, in `[0, 1]`.
    #[must_use]
    pub fn missile_lock_ratio(&self) -> f32 {
        self.targeting.missile_lock_ratio()
    }

    /// Returns true if the target is within locking range of the active launcher.
    #[must_use]
    pub fn is_in_locking_range(&self) -> bool {
        self.targeting.is_in_locking_range()
    }

    fn lock_parameters(&self) -> Option<LockParameters> {
        self.active_launcher().map(|launcher| {
            let class = launcher.missile_class();
            LockParameters {
                lock_time: class.lock_time,
                locking_range: class.locking_range,
            }
        })
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Accelerate forward; `None` means full intensity.
    pub fn forward(&mut self, intensity: Option<f32>) {
        self.maneuvering.forward(intensity);
    }

    /// Accelerate backward.
    pub fn reverse(&mut self, intensity: Option<f32>) {
        self.maneuvering.reverse(intensity);
    }

    /// Strafe left.
    pub fn strafe_left(&mut self, intensity: Option<f32>) {
        self.maneuvering.strafe_left(intensity);
    }

    /// Strafe right.
    pub fn strafe_right(&mut self, intensity: Option<f32>) {
        self.maneuvering.strafe_right(intensity);
    }

    /// Lift up.
    pub fn raise(&mut self, intensity: Option<f32>) {
        self.maneuvering.raise(intensity);
    }

    /// Lift down.
    pub fn lower(&mut self, intensity: Option<f32>) {
        self.maneuvering.lower(intensity);
    }

    /// Turn left.
    pub fn yaw_left(&mut self, intensity: Option<f32>) {
        self.maneuvering.yaw_left(intensity);
    }

    /// Turn right.
    pub fn yaw_right(&mut self, intensity: Option<f32>) {
        self.maneuvering.yaw_right(intensity);
    }

    /// Nose up.
    pub fn pitch_up(&mut self, intensity: Option<f32>) {
        self.maneuvering.pitch_up(intensity);
    }

    /// Nose down.
    pub fn pitch_down(&mut self, intensity: Option<f32>) {
        self.maneuvering.pitch_down(intensity);
    }

    /// Roll left.
    pub fn roll_left(&mut self, intensity: Option<f32>) {
        self.maneuvering.roll_left(intensity);
    }

    /// Roll right.
    pub fn roll_right(&mut self, intensity: Option<f32>) {
        self.maneuvering.roll_right(intensity);
    }

    fn can_fire(&self) -> bool {
        self.alive
            && !self.destroyed
            && self.time_since_destruction.is_none()
            && self.hitpoints > 0.0
            && !self.flags.intersects(
                StatusFlags::FIRING_DISABLED | StatusFlags::JUMPING | StatusFlags::AWAY,
            )
    }

    /// Fires every ready weapon and returns the number of projectiles.
    ///
    /// Raises `Fired` when anything was fired. Spacecraft targeting this one
    /// are only notified when firing goes through
    /// [`Arena::fire`](crate::arena::Arena::fire).
    pub fn fire(&mut self, only_if_aimed_or_fixed: bool) -> u32 {
        let projectiles = self.discharge_weapons(only_if_aimed_or_fixed);
        if projectiles > 0 {
            self.handle_event(EventId::Fired, &EventData::Fired { projectiles });
        }
        projectiles
    }

    /// Fires weapons without raising events.
    pub(crate) fn discharge_weapons(&mut self, only_if_aimed_or_fixed: bool) -> u32 {
        if !self.can_fire() {
            return 0;
        }
        let frame = Frame::of(self.body.as_ref());
        let mut projectiles = 0;
        for weapon in &mut self.weapons {
            projectiles += weapon.fire(&frame, self.handle, only_if_aimed_or_fixed, &mut self.outbox);
        }
        if projectiles > 0 {
            self.stats.shots_fired += projectiles;
            self.flags
                .insert(StatusFlags::HOST_FIRED | StatusFlags::GUEST_FIRED);
        }
        projectiles
    }

    /// Latches a fire command to be executed at the start of the next step.
    pub fn request_fire(&mut self, only_if_aimed_or_fixed: bool) {
        self.fire_request = Some(
            self.fire_request
                .map_or(only_if_aimed_or_fixed, |only| only && only_if_aimed_or_fixed),
        );
    }

    pub(crate) fn take_fire_request(&mut self) -> Option<bool> {
        self.fire_request.take()
    }

    /// Requests a jump out. While preparing, `toggle` cancels instead.
    ///
    /// Returns false if the spacecraft is away, has no jump engine, or the
    /// engine refuses the command.
    pub fn jump_out(&mut self, toggle: bool) -> bool {
        if self.reject_destroyed("jump_out") {
            return false;
        }
        if self.is_away() {
            warn!(spacecraft = %self.id, "cannot jump out while away");
            return false;
        }
        let Some(engine) = &mut self.jump_engine else {
            warn!(spacecraft = %self.id, "cannot jump out without a jump engine");
            return false;
        };
        if !engine.jump_out(toggle) {
            return false;
        }
        if let Some(transition) = engine.take_transition() {
            self.apply_jump_transition(transition, 0.0);
        }
        true
    }

    /// Starts jumping in. Only valid while away.
    pub fn jump_in(&mut self, ctx: &SimulationContext) -> bool {
        if self.reject_destroyed("jump_in") {
            return false;
        }
        let Some(engine) = &mut self.jump_engine else {
            warn!(spacecraft = %self.id, "cannot jump in without a jump engine");
            return false;
        };
        if !engine.jump_in() {
            return false;
        }
        if let Some(transition) = engine.take_transition() {
            self.apply_jump_transition(transition, ctx.config.jump_out_acceleration);
        }
        true
    }

    fn apply_jump_transition(&mut self, transition: JumpTransition, acceleration: f32) {
        debug!(spacecraft = %self.id, ?transition, "jump transition");
        let event = match transition {
            JumpTransition::Preparing => {
                self.flags.insert(StatusFlags::JUMPING);
                Some(EventId::PreparingJump)
            }
            JumpTransition::Cancelled => {
                self.flags.remove(StatusFlags::JUMPING);
                Some(EventId::JumpCancelled)
            }
            JumpTransition::Engaged => Some(EventId::JumpEngaged),
            JumpTransition::Departed => {
                self.flags.remove(StatusFlags::JUMPING);
                self.flags.insert(StatusFlags::AWAY);
                self.body.reset();
                if let Some(propulsion) = &mut self.propulsion {
                    propulsion.reset_thruster_burn();
                }
                self.maneuvering.stop();
                Some(EventId::JumpedOut)
            }
            JumpTransition::JumpingIn => {
                self.flags.remove(StatusFlags::AWAY);
                self.flags.insert(StatusFlags::JUMPING);
                let duration = self
                    .jump_engine
                    .as_ref()
                    .map_or(0.0, JumpEngine::jump_in_duration);
                let forward = self.body.orientation().y_axis;
                self.body.set_velocity(forward * acceleration * duration);
                None
            }
            JumpTransition::Arrived => {
                self.flags.remove(StatusFlags::JUMPING);
                Some(EventId::Arrived)
            }
        };
        if let Some(event) = event {
            self.handle_event(event, &EventData::None);
        }
    }

    // -------------------------------------------------------------------------
    // Events and outbox
    // -------------------------------------------------------------------------

    /// Registers an event handler.
    pub fn add_event_handler<F>(&mut self, event: EventId, handler: F)
    where
        F: FnMut(&Spacecraft, &EventData) -> bool + 'static,
    {
        self.events.add_handler(event, handler);
    }

    /// Event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutable event bus.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Dispatches an event to this spacecraft's handlers.
    ///
    /// Returns the AND of all handler results; `true` with no handlers.
    pub fn handle_event(&mut self, event: EventId, data: &EventData) -> bool {
        let Some(mut handlers) = self.events.take(event) else {
            return true;
        };
        let result = event::dispatch(&mut handlers, self, data);
        self.events.restore(event, handlers);
        result
    }

    /// Mission statistics.
    #[must_use]
    pub fn stats(&self) -> &MissionStats {
        &self.stats
    }

    /// Pending outbox contents.
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Drains pending effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.outbox.take_effects()
    }

    /// Drains pending projectiles.
    pub fn take_projectiles(&mut self) -> Vec<Projectile> {
        self.outbox.take_projectiles()
    }

    /// Drains pending missiles.
    pub fn take_missiles(&mut self) -> Vec<Missile> {
        self.outbox.take_missiles()
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    /// Advances the spacecraft by `dt` seconds.
    ///
    /// `target` is the arena's view of the current target; pass `None` when
    /// the target no longer exists.
    pub fn simulate(&mut self, dt: f32, ctx: &SimulationContext, target: Option<TargetView>) {
        if self.class.is_none() || self.destroyed || !self.alive || self.is_away() {
            return;
        }

        if let Some(elapsed) = self.time_since_destruction {
            self.simulate_destruction(elapsed + f64::from(dt), dt, ctx);
            return;
        }

        if let Some(only_if_aimed_or_fixed) = self.fire_request.take() {
            self.fire(only_if_aimed_or_fixed);
        }

        let frame = Frame::of(self.body.as_ref());
        let projectile_speed = self.weapons.first().map(|w| w.class().projectile_speed);
        let lock = self.lock_parameters();
        if let Some(lost) = self
            .targeting
            .simulate(dt, &frame, target, projectile_speed, lock)
        {
            debug!(spacecraft = %self.id, %lost, "target lost");
        }

        if self.hitpoints <= 0.0 {
            self.start_destruction();
            self.body.simulate(dt);
            self.cache = DerivedCache::default();
            return;
        }

        if let Some(aim_point) = self.targeting.target_hit_position() {
            for weapon in &mut self.weapons {
                weapon.aim_towards(
                    aim_point,
                    &frame,
                    ctx.config.turret_turn_threshold,
                    ctx.config.turret_fire_threshold,
                    dt,
                );
            }
        }
        for weapon in &mut self.weapons {
            weapon.simulate(dt);
        }

        self.simulate_launchers(dt, ctx, &frame);
        // Jump forces replace thrust, so the jump phase runs first to tell
        // propulsion whether it may push this step
        let thrusters_suppressed = self.simulate_jump_engine(dt, ctx);

        if let Some(propulsion) = &mut self.propulsion {
            if !thrusters_suppressed {
                self.maneuvering
                    .update(dt, self.body.as_ref(), propulsion);
            }
            propulsion.simulate(dt, self.body.as_mut(), thrusters_suppressed);
        }

        if let Some(shield) = &mut self.shield {
            shield.simulate(dt, ctx.is_speculative());
        }
        for blinker in &mut self.blinkers {
            blinker.simulate(dt);
        }

        self.body.simulate(dt);
        self.cache = DerivedCache::default();
    }

    /// Drives the jump engine. Returns true if the jump owns the motion.
    fn simulate_jump_engine(&mut self, dt: f32, ctx: &SimulationContext) -> bool {
        let Some(engine) = &mut self.jump_engine else {
            return false;
        };
        let transition = engine.simulate(dt);
        let state = engine.state();
        if let Some(transition) = transition {
            self.apply_jump_transition(transition, ctx.config.jump_out_acceleration);
        }

        let forward = self.body.orientation().y_axis;
        let thrust = forward * ctx.config.jump_out_acceleration * self.body.mass();
        match state {
            JumpState::JumpingOut { .. } => {
                self.body.add_force(thrust, dt);
                true
            }
            JumpState::JumpingIn { .. } => {
                self.body.add_force(-thrust, dt);
                true
            }
            _ => false,
        }
    }

    fn start_destruction(&mut self) {
        let Some(class) = self.class.clone() else {
            return;
        };
        debug!(spacecraft = %self.id, "destruction started");
        let frame = Frame::of(self.body.as_ref());

        self.outbox.push_effect(Effect::Sound {
            cue: SoundCue::StopAmbient,
            position: frame.position,
        });
        if let Some(propulsion) = &mut self.propulsion {
            propulsion.reset_thruster_burn();
        }
        self.maneuvering.stop();
        // The arena unlinks the old target when it sees the change
        self.targeting.set_target(None);
        self.outbox.push_effect(Effect::Explosion {
            class: class.explosion.clone(),
            position: frame.position,
            orientation: frame.orientation,
            velocity: frame.velocity,
        });
        if !self.damage_indicators.is_empty() {
            self.damage_indicators.clear();
            self.outbox.push_effect(Effect::ClearDamageIndicators);
        }

        // Keep drifting with the explosion, but stop spinning
        self.body.reset();
        self.body.set_velocity(frame.velocity);
        self.time_since_destruction = Some(0.0);
    }

    fn simulate_destruction(&mut self, elapsed: f64, dt: f32, ctx: &SimulationContext) {
        self.time_since_destruction = Some(elapsed);
        self.body.simulate(dt);
        self.cache = DerivedCache::default();

        let shown_for = self
            .class
            .as_ref()
            .map_or(0.0, |c| c.explosion_duration * ctx.config.explosion_show_time_ratio);
        if elapsed > shown_for {
            self.finish_destruction();
        }
    }

    fn finish_destruction(&mut self) {
        let cleanup = self.handle_event(EventId::Destructed, &EventData::None);
        if !self.alive {
            return;
        }
        self.alive = false;
        debug!(spacecraft = %self.id, cleanup, "destructed");
        if cleanup {
            self.destroy(false);
        }
    }

    /// Releases equipment, target, back-references and handlers.
    ///
    /// With `preserve_class` the class stays readable for UI purposes.
    /// Destroying twice is a no-op.
    pub fn destroy(&mut self, preserve_class: bool) {
        if self.destroyed {
            return;
        }
        debug!(spacecraft = %self.id, preserve_class, "destroyed");
        self.destroyed = true;
        self.alive = false;
        self.weapons.clear();
        self.missile_launchers.clear();
        self.active_missile_launcher = None;
        self.propulsion = None;
        self.jump_engine = None;
        self.shield = None;
        self.targeting.set_target(None);
        self.targeted_by.clear();
        self.team = None;
        self.blinkers.clear();
        self.fire_request = None;
        self.events.clear_all();
        if !preserve_class {
            self.class = None;
        }
    }

    /// Brings a dead or damaged spacecraft back to full hitpoints.
    pub fn respawn(&mut self) {
        if self.reject_destroyed("respawn") {
            return;
        }
        debug!(spacecraft = %self.id, "respawned");
        self.hitpoints = self.max_hitpoints;
        self.time_since_destruction = None;
        self.alive = true;
        for blinker in &mut self.blinkers {
            blinker.reset();
        }
        if let Some(shield) = &mut self.shield {
            shield.start_recharge();
        }
        if !self.damage_indicators.is_empty() {
            self.damage_indicators.clear();
            self.outbox.push_effect(Effect::ClearDamageIndicators);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::tests::helpers::{fighter_class, laser_class, registry, standalone_fighter};

    #[test]
    fn identity_from_squad_and_name() {
        let mut ship = standalone_fighter();
        assert_eq!(ship.id(), "fighter");

        ship.set_squad("alpha", 2);
        assert_eq!(ship.id(), "alpha 2");
        assert_eq!(ship.display_name(), "Alpha 2");

        ship.set_name("Red Leader");
        assert_eq!(ship.id(), "Red Leader");
        assert_eq!(ship.display_name(), "Red Leader");
    }

    #[test]
    fn hostility_by_team() {
        let mut a = standalone_fighter();
        let mut b = standalone_fighter();
        assert!(a.is_hostile(&b));

        a.set_team(Some(TeamId::new("blue")));
        b.set_team(Some(TeamId::new("blue")));
        assert!(!a.is_hostile(&b));

        b.set_team(Some(TeamId::new("red")));
        assert!(a.is_hostile(&b));
    }

    #[test]
    fn score_value_tracks_equipment() {
        let mut ship = standalone_fighter();
        let base = ship.score_value();
        assert!(ship.equip_weapon(laser_class(), 0));
        assert_eq!(ship.score_value(), base + laser_class().score_value);
        ship.unequip_weapons();
        assert_eq!(ship.score_value(), base);
    }

    #[test]
    fn weapons_stay_ordered_by_slot_and_missing_slots_are_dropped() {
        let mut ship = standalone_fighter();
        assert!(ship.equip_weapon(laser_class(), 1));
        assert!(ship.equip_weapon(laser_class(), 0));
        assert!(ship.equip_weapon(laser_class(), 1));
        assert!(!ship.equip_weapon(laser_class(), 99));
        let slots: Vec<_> = ship.weapons().iter().map(Weapon::slot_index).collect();
        assert_eq!(slots, vec![0, 1]);
    }

    #[test]
    fn firing_disabled_gates_fire_and_is_idempotent() {
        let mut ship = standalone_fighter();
        ship.equip_weapon(laser_class(), 0);

        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);
        ship.add_event_handler(EventId::Fired, move |_, _| {
            *counter.borrow_mut() += 1;
            true
        });

        ship.set_firing_disabled(true);
        ship.set_firing_disabled(true);
        assert!(ship.is_firing_disabled());
        for _ in 0..5 {
            assert_eq!(ship.fire(false), 0);
        }
        assert!(ship.take_projectiles().is_empty());
        assert_eq!(ship.stats().shots_fired, 0);
        assert_eq!(*fired.borrow(), 0);

        ship.set_firing_disabled(false);
        assert_eq!(ship.fire(false), 1);
        assert_eq!(ship.stats().shots_fired, 1);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn requested_fire_happens_on_next_step() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        ship.equip_weapon(laser_class(), 0);
        ship.request_fire(false);
        assert!(ship.take_projectiles().is_empty());

        ship.simulate(crate::physics::FIXED_DT, &ctx, None);
        assert_eq!(ship.take_projectiles().len(), 1);
    }

    #[test]
    fn derived_caches_refresh_after_simulate() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        assert_eq!(ship.relative_velocity(), Vec3::ZERO);

        ship.body_mut().set_velocity(Vec3::new(0.0, 10.0, 0.0));
        ship.simulate(crate::physics::FIXED_DT, &ctx, None);
        assert!((ship.relative_velocity().y - 10.0).abs() < 1e-3);
        assert_eq!(ship.scaled_orientation(), Mat3::IDENTITY);
        assert_eq!(ship.turning_matrix(), Mat3::IDENTITY);
    }

    #[test]
    fn destroy_releases_everything_once() {
        let mut ship = Spacecraft::from_class(fighter_class());
        ship.equip_weapon(laser_class(), 0);
        ship.set_being_targeted(SpacecraftId::new(3));
        ship.add_event_handler(EventId::Fired, |_, _| true);

        ship.destroy(true);
        assert!(ship.is_destroyed());
        assert!(ship.weapons().is_empty());
        assert!(ship.targeted_by().is_empty());
        assert_eq!(ship.events().handler_count(EventId::Fired), 0);
        assert!(ship.class().is_some());

        ship.destroy(false);
        assert!(ship.class().is_some());
        assert!(!ship.equip_weapon(laser_class(), 0));
    }

    #[test]
    fn respawn_restores_hull_and_recharges_shield() {
        let ctx = SimulationContext::default();
        let mut ship = standalone_fighter();
        ship.equip_shield(registry().shield_class("deflector").unwrap());
        ship.damage(&Hit::new(50.0, Vec3::ZERO, Vec3::Y), &ctx);
        assert_eq!(ship.hitpoints(), 70.0);
        assert!(!ship.shield().unwrap().is_recharging());

        ship.respawn();
        assert_eq!(ship.hitpoints(), 100.0);
        assert_eq!(ship.state(), LifeState::Alive);
        assert!(ship.shield().unwrap().is_recharging());
        assert!(ship
            .take_effects()
            .contains(&Effect::ClearDamageIndicators));
    }
}
