//! Building spacecraft from mission specs and loadouts.

use tracing::{debug, warn};

use super::{Spacecraft, TeamId};
use crate::class::{orientation_from_rotations, ClassRegistry, Loadout, SpacecraftSpec};
use crate::config::{GameplayConfig, SimulationContext};
use crate::error::ConfigError;
use crate::physics::RigidBody;

impl Spacecraft {
    /// Builds a spacecraft from a mission spec.
    ///
    /// The class and every piece of equipment are looked up in `registry`.
    /// Weapons and launchers naming slots the class does not have are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown classes or loadouts, loadout
    /// cycles and malformed squad designations.
    pub fn from_spec(
        spec: &SpacecraftSpec,
        registry: &ClassRegistry,
        ctx: &SimulationContext,
    ) -> Result<Self, ConfigError> {
        let class = registry.spacecraft_class(&spec.class)?;
        let loadout = registry.loadout_for(spec, &class)?;
        let squad = spec.squad.as_deref().map(crate::class::parse_squad).transpose()?;

        let body = RigidBody::new(class.mass, class.half_extents)
            .with_drag(class.drag)
            .with_pose(spec.position, orientation_from_rotations(&spec.rotations));
        let mut spacecraft = Self::new(class, Box::new(body));

        if let Some((squad, index)) = squad {
            spacecraft.set_squad(squad, index);
        }
        if let Some(name) = &spec.name {
            spacecraft.set_name(name.clone());
        }
        spacecraft.set_team(spec.team.as_deref().map(TeamId::new));
        if spec.away {
            spacecraft.set_away();
        }
        spacecraft.apply_loadout(&loadout, registry, &ctx.config)?;
        spacecraft.set_initial_blink_time(spec.initial_blink_time);

        debug!(
            spacecraft = %spacecraft.id,
            class = %spec.class,
            weapons = spacecraft.weapons.len(),
            launchers = spacecraft.missile_launchers.len(),
            "spacecraft built"
        );
        Ok(spacecraft)
    }

    /// Equips everything a resolved loadout names.
    ///
    /// Entries without an explicit slot take the slot matching their
    /// position in the list.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the loadout names an unknown equipment
    /// class. Equipment applied before the failing entry stays equipped.
    pub fn apply_loadout(
        &mut self,
        loadout: &Loadout,
        registry: &ClassRegistry,
        config: &GameplayConfig,
    ) -> Result<(), ConfigError> {
        for (index, equip) in loadout.weapons.iter().enumerate() {
            let class = registry.weapon_class(&equip.class)?;
            self.equip_weapon(class, equip.slot.unwrap_or(index));
        }
        for (index, equip) in loadout.missiles.iter().enumerate() {
            let class = registry.missile_class(&equip.class)?;
            self.equip_missile_launcher(class, equip.slot.unwrap_or(index), equip.count);
        }
        if let Some(name) = &loadout.propulsion {
            self.equip_propulsion(registry.propulsion_class(name)?);
        }
        if let Some(name) = &loadout.shield {
            self.equip_shield(registry.shield_class(name)?);
        }
        if let Some(name) = &loadout.jump_engine {
            self.equip_jump_engine(registry.jump_engine_class(name)?, config);
        } else if self.is_away() {
            warn!(spacecraft = %self.id, "spawned away without a jump engine");
        }
        Ok(())
    }
}
