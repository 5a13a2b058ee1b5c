use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use vanguard_core::arena::Arena;
use vanguard_core::class::{PropulsionClass, SpacecraftClass, WeaponClass, WeaponSlot};
use vanguard_core::config::SimulationContext;
use vanguard_core::spacecraft::{Hit, Spacecraft, SpacecraftId, TeamId};

fn fighter() -> Spacecraft {
    let mut class = SpacecraftClass::new("fighter", 100.0);
    class.weapon_slots = vec![WeaponSlot {
        position: Vec3::new(0.0, 5.0, 0.0),
    }];
    let mut ship = Spacecraft::from_class(Arc::new(class));
    ship.equip_weapon(
        Arc::new(WeaponClass {
            name: "laser".into(),
            damage: 10.0,
            projectile_speed: 500.0,
            projectile_lifespan: 2.0,
            cooldown: 0.5,
            barrels: 1,
            turret: None,
            score_value: 5.0,
        }),
        0,
    );
    ship.equip_propulsion(Arc::new(PropulsionClass {
        name: "thruster".into(),
        thrust: 100_000.0,
        angular_thrust: 10_000.0,
        max_move_burn_level: 10,
        max_turn_burn_level: 10,
        score_value: 10.0,
    }));
    ship
}

/// Two teams of `per_team` fighters in a line, each targeting the nearest hostile.
fn battle(per_team: usize) -> (Arena, Vec<SpacecraftId>) {
    let mut arena = Arena::new();
    let mut ids = Vec::new();
    for (team, side) in [("blue", -1.0), ("red", 1.0)] {
        for i in 0..per_team {
            let mut ship = fighter();
            ship.set_team(Some(TeamId::new(team)));
            ship.body_mut()
                .set_position(Vec3::new(i as f32 * 20.0, side * 500.0, 0.0));
            ship.forward(None);
            ship.yaw_left(Some(0.3));
            ids.push(arena.spawn(ship));
        }
    }
    for &id in &ids {
        arena.target_next_nearest_hostile(id);
    }
    (arena, ids)
}

fn bench_arena_step(c: &mut Criterion) {
    let ctx = SimulationContext::default();
    let (mut arena, _) = battle(32);

    c.bench_function("arena_step_64", |b| {
        b.iter(|| {
            arena.simulate(black_box(1.0 / 60.0), &ctx);
            for (_, ship) in arena.iter_mut() {
                ship.take_projectiles();
                ship.take_effects();
            }
        })
    });
}

fn bench_damage(c: &mut Criterion) {
    let ctx = SimulationContext::default();
    let (mut arena, ids) = battle(2);
    let (hunter, prey) = (ids[0], ids[2]);

    c.bench_function("damage_credit", |b| {
        b.iter(|| {
            let hit = Hit::new(black_box(1.0), Vec3::ZERO, Vec3::Y).by(hunter);
            arena.damage(prey, &hit, &ctx);
            if let Some(prey) = arena.get_mut(prey) {
                prey.respawn();
                prey.take_effects();
            }
        })
    });
}

fn bench_host_records(c: &mut Criterion) {
    let (mut arena, _) = battle(32);
    let records = arena.multi_host_data();

    c.bench_function("host_records_encode_64", |b| {
        b.iter(|| black_box(arena.multi_host_data()))
    });
    c.bench_function("host_records_apply_64", |b| {
        b.iter(|| arena.apply_multi_host_data(black_box(&records)))
    });
}

criterion_group!(benches, bench_arena_step, bench_damage, bench_host_records);
criterion_main!(benches);
