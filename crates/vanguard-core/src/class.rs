//! Spacecraft and equipment classes, named loadouts and spawn specs.
//!
//! Classes are immutable templates shared through `Arc`. A
//! [`ClassRegistry`] holds every class and named loadout, usually loaded
//! from a single JSON document, and resolves `basedOn` loadout chains.
//!
//! # JSON Layout
//!
//! ```json
//! {
//!   "spacecraftClasses": [{ "name": "falcon", "hitpoints": 100.0 }],
//!   "weaponClasses": [{ "name": "laser", "damage": 10.0, "projectileSpeed": 800.0,
//!                       "projectileLifespan": 1.5, "cooldown": 0.25 }],
//!   "loadouts": [{ "name": "falcon-default", "weapons": [{ "class": "laser" }] }]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn one() -> u32 {
    1
}

// =============================================================================
// Equipment Classes
// =============================================================================

/// Rotation limits of a turret-mounted weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurretSpec {
    /// Maximum aim rotation speed (rad/s)
    pub rotation_speed: f32,
}

/// Weapon template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponClass {
    /// Unique class name
    pub name: String,
    /// Damage per projectile
    pub damage: f64,
    /// Projectile speed relative to the shooter (m/s)
    pub projectile_speed: f32,
    /// Projectile lifetime (s)
    pub projectile_lifespan: f32,
    /// Time between shots (s)
    pub cooldown: f32,
    /// Projectiles emitted per shot
    #[serde(default = "one")]
    pub barrels: u32,
    /// Turret mount; `None` for fixed forward-firing weapons
    #[serde(default)]
    pub turret: Option<TurretSpec>,
    /// Score contribution of the equipped weapon
    #[serde(default)]
    pub score_value: f64,
}

/// Missile template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileClass {
    /// Unique class name
    pub name: String,
    /// Damage on impact
    pub damage: f64,
    /// Launch speed relative to the launcher (m/s)
    pub launch_speed: f32,
    /// Time needed to lock onto a target (s); zero needs no lock
    #[serde(default)]
    pub lock_time: f32,
    /// Maximum distance at which a lock can be acquired (m)
    #[serde(default)]
    pub locking_range: f32,
    /// Time between launches (s)
    #[serde(default)]
    pub cooldown: f32,
    /// Missiles per salvo
    #[serde(default = "one")]
    pub salvo_size: u32,
    /// Time between missiles within a salvo (s)
    #[serde(default)]
    pub salvo_cooldown: f32,
    /// Whether the missile steers towards its target
    #[serde(default)]
    pub homing: bool,
    /// Score contribution per missile slot of an equipped launcher
    #[serde(default)]
    pub score_value: f64,
}

/// Propulsion template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropulsionClass {
    /// Unique class name
    pub name: String,
    /// Force at full burn along one axis (N)
    pub thrust: f32,
    /// Torque at full burn about one axis (N·m)
    pub angular_thrust: f32,
    /// Burn level cap for linear thrusters
    #[serde(default = "one")]
    pub max_move_burn_level: u32,
    /// Burn level cap for turning thrusters
    #[serde(default = "one")]
    pub max_turn_burn_level: u32,
    /// Score contribution
    #[serde(default)]
    pub score_value: f64,
}

/// Shield template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldClass {
    /// Unique class name
    pub name: String,
    /// Maximum capacity
    pub capacity: f64,
    /// Seconds after a hit before recharging starts
    pub recharge_delay: f32,
    /// Capacity regained per second while recharging
    pub recharge_rate: f64,
    /// Score contribution
    #[serde(default)]
    pub score_value: f64,
}

/// Jump engine template. Unset durations fall back to gameplay config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpEngineClass {
    /// Unique class name
    pub name: String,
    /// Override of the preparation time (s)
    #[serde(default)]
    pub prepare_duration: Option<f32>,
    /// Override of the jump-out time (s)
    #[serde(default)]
    pub jump_out_duration: Option<f32>,
    /// Override of the jump-in time (s)
    #[serde(default)]
    pub jump_in_duration: Option<f32>,
    /// Score contribution
    #[serde(default)]
    pub score_value: f64,
}

// =============================================================================
// Spacecraft Class
// =============================================================================

/// Weapon mount point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponSlot {
    /// Ship-local position of the barrel
    #[serde(default)]
    pub position: Vec3,
}

/// Missile launcher mount point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileLauncherSlot {
    /// Ship-local launch position
    #[serde(default)]
    pub position: Vec3,
    /// Maximum number of missiles
    pub capacity: u32,
}

/// Navigation light blinking with a fixed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkerSpec {
    /// Ship-local position
    #[serde(default)]
    pub position: Vec3,
    /// Blink period (s)
    pub period: f32,
}

/// Spacecraft template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacecraftClass {
    /// Unique class name
    pub name: String,
    /// Maximum hitpoints
    pub hitpoints: f64,
    /// Flat damage reduction per hit
    #[serde(default)]
    pub armor: f64,
    /// Score value of the bare hull
    #[serde(default)]
    pub score_value: f64,
    /// Model scale applied by renderers
    #[serde(default = "SpacecraftClass::default_scale")]
    pub scale: f32,
    /// Mass (kg)
    #[serde(default = "SpacecraftClass::default_mass")]
    pub mass: f32,
    /// Linear drag (fraction of velocity lost per second)
    #[serde(default)]
    pub drag: f32,
    /// Half size of the hull box
    #[serde(default = "SpacecraftClass::default_half_extents")]
    pub half_extents: Vec3,
    /// Speed reached at full forward intent (m/s)
    #[serde(default = "SpacecraftClass::default_max_speed")]
    pub max_speed: f32,
    /// Turn rate reached at full turning intent (rad/s)
    #[serde(default = "SpacecraftClass::default_max_turn_rate")]
    pub max_turn_rate: f32,
    /// Weapon mount points
    #[serde(default)]
    pub weapon_slots: Vec<WeaponSlot>,
    /// Missile launcher mount points
    #[serde(default)]
    pub missile_launcher_slots: Vec<MissileLauncherSlot>,
    /// Hull integrity thresholds (percent) that spawn damage indicators
    #[serde(default)]
    pub damage_indicator_thresholds: Vec<f64>,
    /// Explosion class spawned on destruction
    #[serde(default)]
    pub explosion: String,
    /// Duration of the explosion (s)
    #[serde(default = "SpacecraftClass::default_explosion_duration")]
    pub explosion_duration: f64,
    /// Navigation lights
    #[serde(default)]
    pub blinkers: Vec<BlinkerSpec>,
    /// Named loadout used when a spec names none
    #[serde(default)]
    pub default_loadout: Option<String>,
}

impl SpacecraftClass {
    fn default_scale() -> f32 {
        1.0
    }

    fn default_mass() -> f32 {
        1000.0
    }

    fn default_half_extents() -> Vec3 {
        Vec3::new(5.0, 10.0, 2.5)
    }

    fn default_max_speed() -> f32 {
        200.0
    }

    fn default_max_turn_rate() -> f32 {
        1.5
    }

    fn default_explosion_duration() -> f64 {
        2.0
    }

    /// Creates a bare class with default physical properties.
    #[must_use]
    pub fn new(name: impl Into<String>, hitpoints: f64) -> Self {
        Self {
            name: name.into(),
            hitpoints,
            armor: 0.0,
            score_value: 0.0,
            scale: Self::default_scale(),
            mass: Self::default_mass(),
            drag: 0.0,
            half_extents: Self::default_half_extents(),
            max_speed: Self::default_max_speed(),
            max_turn_rate: Self::default_max_turn_rate(),
            weapon_slots: Vec::new(),
            missile_launcher_slots: Vec::new(),
            damage_indicator_thresholds: Vec::new(),
            explosion: String::new(),
            explosion_duration: Self::default_explosion_duration(),
            blinkers: Vec::new(),
            default_loadout: None,
        }
    }
}

// =============================================================================
// Loadouts
// =============================================================================

/// Weapon entry of a loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponEquip {
    /// Weapon class name
    pub class: String,
    /// Slot index; defaults to the entry's position in the list
    #[serde(default)]
    pub slot: Option<usize>,
}

/// Missile launcher entry of a loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileEquip {
    /// Missile class name
    pub class: String,
    /// Initial missile count; defaults to the slot capacity
    #[serde(default)]
    pub count: Option<u32>,
    /// Slot index; defaults to the entry's position in the list
    #[serde(default)]
    pub slot: Option<usize>,
}

/// Equipment description, optionally layered over a named base loadout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Loadout {
    /// Name under which the loadout is registered
    pub name: Option<String>,
    /// Named loadout this one overrides
    pub based_on: Option<String>,
    /// Weapons by slot
    pub weapons: Vec<WeaponEquip>,
    /// Missile launchers by slot
    pub missiles: Vec<MissileEquip>,
    /// Propulsion class name
    pub propulsion: Option<String>,
    /// Shield class name
    pub shield: Option<String>,
    /// Jump engine class name
    pub jump_engine: Option<String>,
}

/// Resolves list positions into explicit slots, then lets `overlay` replace
/// entries of `base` slot by slot.
fn merge_slots<T: Clone>(
    base: &[T],
    overlay: &[T],
    slot_of: impl Fn(&T) -> Option<usize>,
    with_slot: impl Fn(&T, usize) -> T,
) -> Vec<T> {
    let mut merged = BTreeMap::new();
    for list in [base, overlay] {
        for (index, entry) in list.iter().enumerate() {
            let slot = slot_of(entry).unwrap_or(index);
            merged.insert(slot, with_slot(entry, slot));
        }
    }
    merged.into_values().collect()
}

impl Loadout {
    /// Layers `self` over `base`: equipment named here wins, everything
    /// else is inherited.
    #[must_use]
    pub fn over(&self, base: &Loadout) -> Loadout {
        Loadout {
            name: self.name.clone(),
            based_on: None,
            weapons: merge_slots(
                &base.weapons,
                &self.weapons,
                |w| w.slot,
                |w, slot| WeaponEquip {
                    slot: Some(slot),
                    ..w.clone()
                },
            ),
            missiles: merge_slots(
                &base.missiles,
                &self.missiles,
                |m| m.slot,
                |m, slot| MissileEquip {
                    slot: Some(slot),
                    ..m.clone()
                },
            ),
            propulsion: self.propulsion.clone().or_else(|| base.propulsion.clone()),
            shield: self.shield.clone().or_else(|| base.shield.clone()),
            jump_engine: self
                .jump_engine
                .clone()
                .or_else(|| base.jump_engine.clone()),
        }
    }
}

// =============================================================================
// Spawn Specs
// =============================================================================

/// Rotation axis of a spawn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// World X
    X,
    /// World Y
    Y,
    /// World Z
    Z,
}

/// One rotation of a spawn orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Axis to rotate about
    pub axis: Axis,
    /// Angle in degrees
    pub degrees: f32,
}

/// Composes spawn rotations in order, each about a world axis.
#[must_use]
pub fn orientation_from_rotations(rotations: &[Rotation]) -> Mat3 {
    rotations.iter().fold(Mat3::IDENTITY, |orientation, rotation| {
        let angle = rotation.degrees.to_radians();
        let step = match rotation.axis {
            Axis::X => Mat3::from_rotation_x(angle),
            Axis::Y => Mat3::from_rotation_y(angle),
            Axis::Z => Mat3::from_rotation_z(angle),
        };
        step * orientation
    })
}

/// Mission-file description of one spacecraft to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacecraftSpec {
    /// Spacecraft class name
    pub class: String,
    /// Unique name; overrides the squad-derived id
    #[serde(default)]
    pub name: Option<String>,
    /// Team name; spacecraft without a team are hostile to everyone
    #[serde(default)]
    pub team: Option<String>,
    /// Squad designation: `"name"` or `"name index"`
    #[serde(default)]
    pub squad: Option<String>,
    /// Spawn position
    #[serde(default)]
    pub position: Vec3,
    /// Spawn rotations applied in order
    #[serde(default)]
    pub rotations: Vec<Rotation>,
    /// Named loadout
    #[serde(default)]
    pub loadout: Option<String>,
    /// Inline loadout; may itself be `basedOn` a named one
    #[serde(default)]
    pub equipment: Option<Loadout>,
    /// Spawn outside the battlefield, waiting to jump in
    #[serde(default)]
    pub away: bool,
    /// Initial blinker phase (s)
    #[serde(default)]
    pub initial_blink_time: f32,
}

impl SpacecraftSpec {
    /// Minimal spec naming only the class.
    #[must_use]
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: None,
            team: None,
            squad: None,
            position: Vec3::ZERO,
            rotations: Vec::new(),
            loadout: None,
            equipment: None,
            away: false,
            initial_blink_time: 0.0,
        }
    }

    /// Parses a spec from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Splits a squad designation into name and index.
///
/// `"alpha"` is index 0; `"alpha 3"` is index 3.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSquad`] for empty designations, more than
/// two words, or a non-numeric index.
pub fn parse_squad(designation: &str) -> Result<(String, u32), ConfigError> {
    let invalid = || ConfigError::InvalidSquad(designation.to_string());
    let mut words = designation.split_whitespace();
    let name = words.next().ok_or_else(invalid)?;
    let index = match words.next() {
        Some(word) => word.parse().map_err(|_| invalid())?,
        None => 0,
    };
    if words.next().is_some() {
        return Err(invalid());
    }
    Ok((name.to_string(), index))
}

// =============================================================================
// Registry
// =============================================================================

/// On-disk form of the registry: flat lists keyed by `name`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RegistryDocument {
    spacecraft_classes: Vec<SpacecraftClass>,
    weapon_classes: Vec<WeaponClass>,
    missile_classes: Vec<MissileClass>,
    propulsion_classes: Vec<PropulsionClass>,
    shield_classes: Vec<ShieldClass>,
    jump_engine_classes: Vec<JumpEngineClass>,
    loadouts: Vec<Loadout>,
}

/// Lookup table of every class and named loadout.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    spacecraft: BTreeMap<String, Arc<SpacecraftClass>>,
    weapons: BTreeMap<String, Arc<WeaponClass>>,
    missiles: BTreeMap<String, Arc<MissileClass>>,
    propulsion: BTreeMap<String, Arc<PropulsionClass>>,
    shields: BTreeMap<String, Arc<ShieldClass>>,
    jump_engines: BTreeMap<String, Arc<JumpEngineClass>>,
    loadouts: BTreeMap<String, Loadout>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a registry from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        let mut registry = Self::new();
        document
            .spacecraft_classes
            .into_iter()
            .for_each(|c| registry.add_spacecraft_class(c));
        document
            .weapon_classes
            .into_iter()
            .for_each(|c| registry.add_weapon_class(c));
        document
            .missile_classes
            .into_iter()
            .for_each(|c| registry.add_missile_class(c));
        document
            .propulsion_classes
            .into_iter()
            .for_each(|c| registry.add_propulsion_class(c));
        document
            .shield_classes
            .into_iter()
            .for_each(|c| registry.add_shield_class(c));
        document
            .jump_engine_classes
            .into_iter()
            .for_each(|c| registry.add_jump_engine_class(c));
        for loadout in document.loadouts {
            registry.add_loadout(loadout);
        }
        Ok(registry)
    }

    /// Registers a spacecraft class, replacing any class of the same name.
    pub fn add_spacecraft_class(&mut self, class: SpacecraftClass) {
        self.spacecraft.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a weapon class.
    pub fn add_weapon_class(&mut self, class: WeaponClass) {
        self.weapons.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a missile class.
    pub fn add_missile_class(&mut self, class: MissileClass) {
        self.missiles.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a propulsion class.
    pub fn add_propulsion_class(&mut self, class: PropulsionClass) {
        self.propulsion.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a shield class.
    pub fn add_shield_class(&mut self, class: ShieldClass) {
        self.shields.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a jump engine class.
    pub fn add_jump_engine_class(&mut self, class: JumpEngineClass) {
        self.jump_engines.insert(class.name.clone(), Arc::new(class));
    }

    /// Registers a named loadout. Unnamed loadouts are ignored.
    pub fn add_loadout(&mut self, loadout: Loadout) {
        if let Some(name) = loadout.name.clone() {
            self.loadouts.insert(name, loadout);
        }
    }

    /// Looks up a spacecraft class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownClass`] if no such class is registered.
    pub fn spacecraft_class(&self, name: &str) -> Result<Arc<SpacecraftClass>, ConfigError> {
        self.spacecraft
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownClass(name.to_string()))
    }

    /// Looks up a weapon class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownWeaponClass`] if no such class is registered.
    pub fn weapon_class(&self, name: &str) -> Result<Arc<WeaponClass>, ConfigError> {
        self.weapons
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownWeaponClass(name.to_string()))
    }

    /// Looks up a missile class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMissileClass`] if no such class is registered.
    pub fn missile_class(&self, name: &str) -> Result<Arc<MissileClass>, ConfigError> {
        self.missiles
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownMissileClass(name.to_string()))
    }

    /// Looks up a propulsion class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPropulsionClass`] if no such class is registered.
    pub fn propulsion_class(&self, name: &str) -> Result<Arc<PropulsionClass>, ConfigError> {
        self.propulsion
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownPropulsionClass(name.to_string()))
    }

    /// Looks up a shield class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownShieldClass`] if no such class is registered.
    pub fn shield_class(&self, name: &str) -> Result<Arc<ShieldClass>, ConfigError> {
        self.shields
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownShieldClass(name.to_string()))
    }

    /// Looks up a jump engine class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownJumpEngineClass`] if no such class is registered.
    pub fn jump_engine_class(&self, name: &str) -> Result<Arc<JumpEngineClass>, ConfigError> {
        self.jump_engines
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownJumpEngineClass(name.to_string()))
    }

    /// Looks up a named loadout without resolving its base.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLoadout`] if no such loadout is registered.
    pub fn loadout(&self, name: &str) -> Result<&Loadout, ConfigError> {
        self.loadouts
            .get(name)
            .ok_or_else(|| ConfigError::UnknownLoadout(name.to_string()))
    }

    /// Flattens a loadout's `basedOn` chain into a single loadout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLoadout`] for a missing base and
    /// [`ConfigError::LoadoutCycle`] if the chain loops.
    pub fn resolve_loadout(&self, loadout: &Loadout) -> Result<Loadout, ConfigError> {
        let mut chain = vec![loadout];
        let mut visited = BTreeSet::new();
        let mut next = loadout.based_on.as_deref();
        while let Some(name) = next {
            if !visited.insert(name) {
                return Err(ConfigError::LoadoutCycle(name.to_string()));
            }
            let base = self.loadout(name)?;
            chain.push(base);
            next = base.based_on.as_deref();
        }
        let root = chain.pop().map(|l| l.over(&Loadout::default()));
        Ok(chain
            .into_iter()
            .rev()
            .fold(root.unwrap_or_default(), |base, overlay| overlay.over(&base)))
    }

    /// Resolves the loadout a spec asks for: inline equipment first, then
    /// the named loadout, then the class default.
    ///
    /// # Errors
    ///
    /// Propagates loadout lookup and resolution errors.
    pub fn loadout_for(
        &self,
        spec: &SpacecraftSpec,
        class: &SpacecraftClass,
    ) -> Result<Loadout, ConfigError> {
        if let Some(inline) = &spec.equipment {
            return self.resolve_loadout(inline);
        }
        match spec.loadout.as_deref().or(class.default_loadout.as_deref()) {
            Some(name) => self.resolve_loadout(self.loadout(name)?),
            None => Ok(Loadout::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon(class: &str) -> WeaponEquip {
        WeaponEquip {
            class: class.to_string(),
            slot: None,
        }
    }

    #[test]
    fn parse_squad_forms() {
        assert_eq!(parse_squad("alpha").unwrap(), ("alpha".to_string(), 0));
        assert_eq!(parse_squad("alpha 3").unwrap(), ("alpha".to_string(), 3));
        assert!(matches!(parse_squad(""), Err(ConfigError::InvalidSquad(_))));
        assert!(matches!(
            parse_squad("alpha x"),
            Err(ConfigError::InvalidSquad(_))
        ));
        assert!(matches!(
            parse_squad("alpha 1 2"),
            Err(ConfigError::InvalidSquad(_))
        ));
    }

    #[test]
    fn inline_equipment_overrides_base_slot_by_slot() {
        let mut registry = ClassRegistry::new();
        registry.add_loadout(Loadout {
            name: Some("base".into()),
            weapons: vec![weapon("laser"), weapon("laser")],
            propulsion: Some("engine".into()),
            shield: Some("deflector".into()),
            ..Loadout::default()
        });

        let inline = Loadout {
            based_on: Some("base".into()),
            weapons: vec![WeaponEquip {
                class: "cannon".into(),
                slot: Some(1),
            }],
            shield: Some("bulwark".into()),
            ..Loadout::default()
        };

        let resolved = registry.resolve_loadout(&inline).unwrap();
        let classes: Vec<_> = resolved.weapons.iter().map(|w| w.class.as_str()).collect();
        assert_eq!(classes, vec!["laser", "cannon"]);
        assert_eq!(resolved.weapons[1].slot, Some(1));
        assert_eq!(resolved.propulsion.as_deref(), Some("engine"));
        assert_eq!(resolved.shield.as_deref(), Some("bulwark"));
    }

    #[test]
    fn chained_bases_resolve_outermost_last() {
        let mut registry = ClassRegistry::new();
        registry.add_loadout(Loadout {
            name: Some("hull".into()),
            propulsion: Some("old".into()),
            jump_engine: Some("drive".into()),
            ..Loadout::default()
        });
        registry.add_loadout(Loadout {
            name: Some("refit".into()),
            based_on: Some("hull".into()),
            propulsion: Some("new".into()),
            ..Loadout::default()
        });
        let resolved = registry
            .resolve_loadout(registry.loadout("refit").unwrap())
            .unwrap();
        assert_eq!(resolved.propulsion.as_deref(), Some("new"));
        assert_eq!(resolved.jump_engine.as_deref(), Some("drive"));
    }

    #[test]
    fn cyclic_and_missing_bases_are_errors() {
        let mut registry = ClassRegistry::new();
        registry.add_loadout(Loadout {
            name: Some("loop".into()),
            based_on: Some("loop".into()),
            ..Loadout::default()
        });
        assert!(matches!(
            registry.resolve_loadout(registry.loadout("loop").unwrap()),
            Err(ConfigError::LoadoutCycle(_))
        ));

        let orphan = Loadout {
            based_on: Some("nowhere".into()),
            ..Loadout::default()
        };
        assert!(matches!(
            registry.resolve_loadout(&orphan),
            Err(ConfigError::UnknownLoadout(_))
        ));
    }

    #[test]
    fn long_acyclic_chains_resolve() {
        let mut registry = ClassRegistry::new();
        registry.add_loadout(Loadout {
            name: Some("tier0".into()),
            ..Loadout::default()
        });
        for tier in 1..=40 {
            registry.add_loadout(Loadout {
                name: Some(format!("tier{tier}")),
                based_on: Some(format!("tier{}", tier - 1)),
                ..Loadout::default()
            });
        }
        let top = registry.loadout("tier40").unwrap();
        assert!(registry.resolve_loadout(top).is_ok());

        // A loop further down the chain is still caught
        registry.add_loadout(Loadout {
            name: Some("tier0".into()),
            based_on: Some("tier20".into()),
            ..Loadout::default()
        });
        let top = registry.loadout("tier40").unwrap();
        assert!(matches!(
            registry.resolve_loadout(top),
            Err(ConfigError::LoadoutCycle(_))
        ));
    }

    #[test]
    fn unknown_lookups_are_typed() {
        let registry = ClassRegistry::new();
        assert!(matches!(
            registry.spacecraft_class("x"),
            Err(ConfigError::UnknownClass(_))
        ));
        assert!(matches!(
            registry.weapon_class("x"),
            Err(ConfigError::UnknownWeaponClass(_))
        ));
        assert!(matches!(
            registry.shield_class("x"),
            Err(ConfigError::UnknownShieldClass(_))
        ));
    }

    #[test]
    fn registry_from_json() {
        let registry = ClassRegistry::from_json(
            r#"{
                "spacecraftClasses": [{ "name": "falcon", "hitpoints": 120.0, "scoreValue": 40.0 }],
                "weaponClasses": [{ "name": "laser", "damage": 10.0, "projectileSpeed": 800.0,
                                    "projectileLifespan": 1.5, "cooldown": 0.25 }],
                "loadouts": [{ "name": "falcon-default", "weapons": [{ "class": "laser" }] }]
            }"#,
        )
        .unwrap();
        let falcon = registry.spacecraft_class("falcon").unwrap();
        assert_eq!(falcon.hitpoints, 120.0);
        assert_eq!(falcon.max_speed, 200.0);
        assert_eq!(registry.weapon_class("laser").unwrap().barrels, 1);
        assert_eq!(registry.loadout("falcon-default").unwrap().weapons.len(), 1);
    }

    #[test]
    fn rotations_compose_in_order() {
        let rotations = [
            Rotation {
                axis: Axis::Z,
                degrees: 90.0,
            },
            Rotation {
                axis: Axis::X,
                degrees: 90.0,
            },
        ];
        let orientation = orientation_from_rotations(&rotations);
        // Forward (+Y) -> -X after the yaw; the pitch about X leaves it alone
        assert!(orientation.y_axis.distance(Vec3::new(-1.0, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn spec_from_json_uses_defaults() {
        let spec = SpacecraftSpec::from_json(
            r#"{ "class": "falcon", "squad": "alpha 2", "team": "blue",
                 "rotations": [{ "axis": "z", "degrees": 45.0 }] }"#,
        )
        .unwrap();
        assert_eq!(spec.class, "falcon");
        assert_eq!(spec.team.as_deref(), Some("blue"));
        assert!(!spec.away);
        assert_eq!(spec.rotations[0].axis, Axis::Z);
    }
}
