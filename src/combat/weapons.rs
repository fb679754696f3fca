//! Weapon firing: one accumulator per equipped slot.
//!
//! Targeted weapons wait for their interval, then look for the nearest active
//! enemy in range of the head.  With no target the accumulator is pinned at
//! the interval so the weapon fires the instant something enters range.  Area
//! weapons (aura, mine layer) skip targeting entirely.

use super::damage::{damage_enemy, DamageSource, Hit};
use super::state::{Mine, Owner, Projectile, WeaponKind, WeaponSlot};
use crate::config::WeaponStats;
use crate::enemy::HitTag;
use crate::events::CombatEvent;
use crate::geometry::{nearest_enemy, spread_angles};
use crate::world::CombatWorld;
use bevy::prelude::*;
use std::collections::HashSet;

/// Fire interval for a slot after fire-rate scaling and overclock.
pub fn fire_interval(world: &CombatWorld, slot: &WeaponSlot) -> f32 {
    let stats = world.config.weapons.get(slot.kind);
    let rate = world.modifiers.fire_rate * world.traits.fire_rate_scaling(world.player.level);
    let mut interval = stats.interval_ms / rate.max(f32::EPSILON);
    if world.overclock.is_active() && slot.kind.is_targeted() {
        interval *= world.config.overclock_interval_factor;
    }
    interval
}

pub fn update_weapons(world: &mut CombatWorld, dt_ms: f32) {
    let mut first_shot: Option<WeaponKind> = None;

    for i in 0..world.loadout.slots.len() {
        let slot = world.loadout.slots[i];
        let stats = *world.config.weapons.get(slot.kind);
        let interval = fire_interval(world, &slot);
        let timer = slot.timer_ms + dt_ms;
        if timer < interval {
            world.loadout.slots[i].timer_ms = timer;
            continue;
        }

        let next_timer = match slot.kind {
            WeaponKind::Aura => {
                pulse_aura(world, &stats);
                0.0
            }
            WeaponKind::MineLayer => {
                lay_mine(world, &stats);
                0.0
            }
            kind => match nearest_enemy(&world.enemies, world.player.head(), stats.range) {
                Some(target) => {
                    fire_projectiles(world, &slot, &stats, target);
                    first_shot.get_or_insert(kind);
                    0.0
                }
                None => interval,
            },
        };
        world.loadout.slots[i].timer_ms = next_timer;
    }

    if let Some(weapon) = first_shot {
        let due = world
            .last_shoot_cue_ms
            .is_none_or(|last| world.clock_ms - last >= world.config.shoot_sound_throttle_ms as f64);
        if due {
            world.last_shoot_cue_ms = Some(world.clock_ms);
            world.emit(CombatEvent::Shoot { weapon });
        }
    }
}

fn fire_projectiles(world: &mut CombatWorld, slot: &WeaponSlot, stats: &WeaponStats, target: usize) {
    let origin = world.scale.to_world(world.player.head());
    let target_pos = world.scale.to_world(world.enemies[target].position);
    let target_id = world.enemies[target].id;
    let aim = (target_pos - origin).try_normalize().unwrap_or(Vec2::X);

    let count = stats.count + stats.count_per_level * slot.level.saturating_sub(1);
    let speed = world.scale.cells(stats.speed)
        * world.modifiers.projectile_speed
        * world.traits.projectile_speed;
    let life = if stats.lifetime_ms > 0.0 {
        stats.lifetime_ms
    } else {
        world.config.projectile_lifetime_ms
    };

    for angle in spread_angles(aim.to_angle(), count, stats.spread_deg.to_radians()) {
        let id = world.next_id();
        world.projectiles.push(Projectile {
            id,
            kind: slot.kind.projectile_kind(),
            owner: Owner::Player,
            source: Some(slot.kind),
            position: origin,
            velocity: Vec2::from_angle(angle) * speed,
            damage: stats.damage,
            radius: world.config.projectile_radius,
            piercing: stats.piercing.then(HashSet::new),
            homing_target: (slot.kind == WeaponKind::Serpent).then_some(target_id),
            life_ms: Some(life),
            removed: false,
        });
    }
}

/// Damage every active enemy within the aura radius whose aura cooldown has lapsed.
fn pulse_aura(world: &mut CombatWorld, stats: &WeaponStats) {
    let head = world.player.head();
    let radius = stats.radius * world.modifiers.area;
    let cooldown = world.config.aura_hit_cooldown_ms;
    for idx in 0..world.enemies.len() {
        let enemy = &mut world.enemies[idx];
        if !enemy.is_active() || enemy.is_hit_cooling(HitTag::Aura) {
            continue;
        }
        let reach = radius + enemy.radius;
        if enemy.position.distance_squared(head) > reach * reach {
            continue;
        }
        enemy.start_hit_cooldown(HitTag::Aura, cooldown);
        damage_enemy(
            world,
            idx,
            Hit::new(stats.damage, DamageSource::Weapon(WeaponKind::Aura)),
        );
    }
}

fn lay_mine(world: &mut CombatWorld, stats: &WeaponStats) {
    let id = world.next_id();
    let position = world.scale.to_world(world.player.tail());
    world.mines.push(Mine {
        id,
        position,
        damage: stats.damage,
        arm_ms: world.config.mine_arm_ms,
        life_ms: world.config.mine_lifetime_ms,
        detonated: false,
    });
}
