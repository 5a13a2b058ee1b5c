//! Test helper functions for building classes, spacecraft and arenas.
//!
//! This module provides factory functions that keep tests short and make
//! them agree on the same reference fighter.

use std::sync::{Arc, Once};

use glam::Vec3;

use crate::arena::Arena;
use crate::class::{
    BlinkerSpec, ClassRegistry, JumpEngineClass, Loadout, MissileClass, MissileEquip,
    MissileLauncherSlot, PropulsionClass, ShieldClass, SpacecraftClass, WeaponClass, WeaponEquip,
    WeaponSlot,
};
use crate::spacecraft::{Spacecraft, SpacecraftId, TeamId};

// =============================================================================
// Classes
// =============================================================================

/// Reference fighter: 100 hitpoints, no armor, score value 50.
///
/// Two weapon slots, three launcher slots holding four missiles each,
/// damage indicators at 75 and 50 percent hull integrity.
pub fn fighter_class() -> Arc<SpacecraftClass> {
    let mut class = SpacecraftClass::new("fighter", 100.0);
    class.score_value = 50.0;
    class.weapon_slots = vec![
        WeaponSlot {
            position: Vec3::new(-2.0, 5.0, 0.0),
        },
        WeaponSlot {
            position: Vec3::new(2.0, 5.0, 0.0),
        },
    ];
    class.missile_launcher_slots = (0..3u8)
        .map(|i| MissileLauncherSlot {
            position: Vec3::new(f32::from(i) - 1.0, 0.0, -2.0),
            capacity: 4,
        })
        .collect();
    class.damage_indicator_thresholds = vec![75.0, 50.0];
    class.explosion = "small".into();
    class.blinkers = vec![BlinkerSpec {
        position: Vec3::new(0.0, -10.0, 0.0),
        period: 1.0,
    }];
    Arc::new(class)
}

/// Fixed gun: 10 damage, 500 m/s, half-second cooldown, score value 5.
pub fn laser_class() -> Arc<WeaponClass> {
    Arc::new(WeaponClass {
        name: "laser".into(),
        damage: 10.0,
        projectile_speed: 500.0,
        projectile_lifespan: 2.0,
        cooldown: 0.5,
        barrels: 1,
        turret: None,
        score_value: 5.0,
    })
}

/// Dumb-fire missile with a two second cooldown.
pub fn missile_class(name: &str) -> Arc<MissileClass> {
    Arc::new(MissileClass {
        name: name.into(),
        damage: 50.0,
        launch_speed: 100.0,
        lock_time: 0.0,
        locking_range: 2000.0,
        cooldown: 2.0,
        salvo_size: 1,
        salvo_cooldown: 0.2,
        homing: false,
        score_value: 2.0,
    })
}

fn thruster_class() -> PropulsionClass {
    PropulsionClass {
        name: "thruster".into(),
        thrust: 100_000.0,
        angular_thrust: 10_000.0,
        max_move_burn_level: 10,
        max_turn_burn_level: 10,
        score_value: 10.0,
    }
}

fn deflector_class() -> ShieldClass {
    ShieldClass {
        name: "deflector".into(),
        capacity: 20.0,
        recharge_delay: 2.0,
        recharge_rate: 5.0,
        score_value: 10.0,
    }
}

/// Jump drive taking the configured durations.
pub fn drive_class() -> Arc<JumpEngineClass> {
    Arc::new(JumpEngineClass {
        name: "drive".into(),
        prepare_duration: Some(0.5),
        jump_out_duration: Some(0.5),
        jump_in_duration: Some(0.5),
        score_value: 0.0,
    })
}

/// Registry holding the reference classes and two loadouts:
/// `standard` (two lasers, one launcher, thruster, shield) and `jumper`
/// (`standard` plus a jump drive).
pub fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry.add_spacecraft_class(SpacecraftClass::clone(&fighter_class()));
    registry.add_weapon_class(WeaponClass::clone(&laser_class()));
    registry.add_missile_class(MissileClass::clone(&missile_class("dart")));
    registry.add_propulsion_class(thruster_class());
    registry.add_shield_class(deflector_class());
    registry.add_jump_engine_class(JumpEngineClass::clone(&drive_class()));

    let laser = || WeaponEquip {
        class: "laser".into(),
        slot: None,
    };
    registry.add_loadout(Loadout {
        name: Some("standard".into()),
        weapons: vec![laser(), laser()],
        missiles: vec![MissileEquip {
            class: "dart".into(),
            count: None,
            slot: None,
        }],
        propulsion: Some("thruster".into()),
        shield: Some("deflector".into()),
        ..Loadout::default()
    });
    registry.add_loadout(Loadout {
        name: Some("jumper".into()),
        based_on: Some("standard".into()),
        jump_engine: Some("drive".into()),
        ..Loadout::default()
    });
    registry
}

// =============================================================================
// Spacecraft
// =============================================================================

/// A bare reference fighter at the origin, outside any arena.
pub fn standalone_fighter() -> Spacecraft {
    Spacecraft::from_class(fighter_class())
}

/// Spawns a bare reference fighter of `team` at `position`.
pub fn spawn_fighter(arena: &mut Arena, team: &str, position: Vec3) -> SpacecraftId {
    let mut ship = standalone_fighter();
    ship.set_team(Some(TeamId::new(team)));
    ship.body_mut().set_position(position);
    arena.spawn(ship)
}

// =============================================================================
// Logging
// =============================================================================

static TRACING: Once = Once::new();

/// Routes `tracing` output through the test harness. Safe to call from
/// every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
