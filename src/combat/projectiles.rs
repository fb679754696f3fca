//! Projectile and hazard loop.
//!
//! Player projectiles are integrated and tested against enemies here.
//! Enemy-owned projectiles only move here; their contact with the player is
//! resolved by [`super::collision::resolve_contacts`].

use super::damage::{damage_enemy, DamageSource, Hit};
use super::state::Owner;
use crate::events::CombatEvent;
use crate::geometry::{nearest_enemy, steer_toward};
use crate::world::CombatWorld;
use bevy::prelude::*;

pub fn update_projectiles(world: &mut CombatWorld, dt_ms: f32) {
    steer_homing(world, dt_ms);
    integrate(world, dt_ms);
    hit_enemies(world);
    update_mines(world, dt_ms);
    update_shockwaves(world, dt_ms);
    update_pickups(world, dt_ms);

    world.arcs.retain_mut(|arc| {
        arc.ttl_ms -= dt_ms;
        arc.ttl_ms > 0.0
    });
    world.projectiles.retain(|p| !p.removed);
}

fn steer_homing(world: &mut CombatWorld, dt_ms: f32) {
    let max_turn = world.config.homing_turn_rate * dt_ms / 1000.0;
    let range = world.config.weapons.serpent.range;
    for i in 0..world.projectiles.len() {
        let p = &world.projectiles[i];
        if p.removed || p.owner != Owner::Player || p.homing_target.is_none() {
            continue;
        }
        let target = p
            .homing_target
            .and_then(|id| world.enemy(id))
            .filter(|e| e.is_active())
            .map(|e| (e.id, e.position));
        let target = target.or_else(|| {
            let from = world.scale.to_grid(p.position);
            nearest_enemy(&world.enemies, from, range)
                .map(|idx| (world.enemies[idx].id, world.enemies[idx].position))
        });
        let Some((target_id, target_grid)) = target else {
            continue;
        };
        let desired = world.scale.to_world(target_grid) - p.position;
        let p = &mut world.projectiles[i];
        p.homing_target = Some(target_id);
        p.velocity = steer_toward(p.velocity, desired, max_turn);
    }
}

fn integrate(world: &mut CombatWorld, dt_ms: f32) {
    let dt = dt_ms / 1000.0;
    let margin = world.config.projectile_oob_margin;
    let min = Vec2::splat(-margin);
    let max = Vec2::new(
        world.scale.cells(world.config.arena_width as f32) + margin,
        world.scale.cells(world.config.arena_height as f32) + margin,
    );
    for p in &mut world.projectiles {
        if p.removed {
            continue;
        }
        p.position += p.velocity * dt;
        if !p.position.is_finite() || !p.velocity.is_finite() {
            p.removed = true;
            continue;
        }
        if let Some(life) = p.life_ms.as_mut() {
            *life -= dt_ms;
            if *life <= 0.0 {
                p.removed = true;
                continue;
            }
        }
        if p.position.cmplt(min).any() || p.position.cmpgt(max).any() {
            p.removed = true;
        }
    }
}

/// Player projectiles against active enemies.  A non-piercing projectile is
/// spent on its first damaging contact; a piercing one skips ids it has hit.
fn hit_enemies(world: &mut CombatWorld) {
    for pi in 0..world.projectiles.len() {
        if world.projectiles[pi].owner != Owner::Player {
            continue;
        }
        for ei in 0..world.enemies.len() {
            let p = &world.projectiles[pi];
            let enemy = &world.enemies[ei];
            if p.removed {
                break;
            }
            if !enemy.is_active() || !p.can_hit(enemy.id) {
                continue;
            }
            let reach = p.radius + world.scale.cells(enemy.radius);
            let enemy_pos = world.scale.to_world(enemy.position);
            if p.position.distance_squared(enemy_pos) > reach * reach {
                continue;
            }
            let source = p.source.map_or(DamageSource::Reflected, DamageSource::Weapon);
            let damage = p.damage;
            let enemy_id = enemy.id;
            world.projectiles[pi].register_hit(enemy_id);
            damage_enemy(world, ei, Hit::new(damage, source).chaining());
        }
    }
}

fn update_mines(world: &mut CombatWorld, dt_ms: f32) {
    let trigger = world.scale.cells(world.config.mine_trigger_radius);
    let blast = world.scale.cells(world.config.mine_blast_radius * world.modifiers.area);

    for mi in 0..world.mines.len() {
        let mine = &mut world.mines[mi];
        mine.arm_ms -= dt_ms;
        mine.life_ms -= dt_ms;
        if !mine.is_armed() || mine.detonated {
            continue;
        }
        let position = mine.position;
        let triggered = world.enemies.iter().any(|e| {
            let reach = trigger + world.scale.cells(e.radius);
            e.is_active() && world.scale.to_world(e.position).distance_squared(position) <= reach * reach
        });
        if !triggered {
            continue;
        }
        world.mines[mi].detonated = true;
        let damage = world.mines[mi].damage;
        world.emit(CombatEvent::MineDetonated { position });
        for ei in 0..world.enemies.len() {
            let enemy = &world.enemies[ei];
            let reach = blast + world.scale.cells(enemy.radius);
            if enemy.is_active()
                && world.scale.to_world(enemy.position).distance_squared(position) <= reach * reach
            {
                damage_enemy(world, ei, Hit::new(damage, DamageSource::Mine));
            }
        }
    }
    world.mines.retain(|m| !m.detonated && m.life_ms > 0.0);
}

/// Expand each echo shockwave and damage every enemy the ring has reached,
/// once per wave.
fn update_shockwaves(world: &mut CombatWorld, dt_ms: f32) {
    let dt = dt_ms / 1000.0;
    for wi in 0..world.shockwaves.len() {
        let wave = &mut world.shockwaves[wi];
        wave.radius = (wave.radius + wave.expansion * dt).min(wave.max_radius);
        let (center, radius, damage) = (wave.center, wave.radius, wave.damage);
        for ei in 0..world.enemies.len() {
            let enemy = &world.enemies[ei];
            if !enemy.is_active() || world.shockwaves[wi].hit.contains(&enemy.id) {
                continue;
            }
            let reach = radius + world.scale.cells(enemy.radius);
            if world.scale.to_world(enemy.position).distance_squared(center) > reach * reach {
                continue;
            }
            let id = enemy.id;
            world.shockwaves[wi].hit.insert(id);
            damage_enemy(world, ei, Hit::new(damage, DamageSource::Shockwave));
        }
    }
    world.shockwaves.retain(|w| !w.is_done());
}

fn update_pickups(world: &mut CombatWorld, dt_ms: f32) {
    let head = world.scale.to_world(world.player.head());
    let step = world.config.magnet_pull_speed * dt_ms / 1000.0;
    for pickup in world.pickups.iter_mut().filter(|p| p.attracted) {
        let to_head = head - pickup.position;
        let distance = to_head.length();
        if distance <= step {
            pickup.position = head;
        } else {
            pickup.position += to_head / distance * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Projectile, ProjectileKind, Shockwave, WeaponKind};
    use crate::enemy::EnemyKind;
    use std::collections::HashSet;

    fn world() -> CombatWorld {
        let mut world = CombatWorld::default().with_seed(11);
        world.config.base_crit_chance = 0.0;
        world
    }

    fn boss_at(world: &mut CombatWorld, pos: Vec2) -> usize {
        let id = world.spawn_enemy(EnemyKind::Boss, pos);
        world.enemy_index(id).unwrap()
    }

    fn shot(world: &mut CombatWorld, at: Vec2, velocity: Vec2, piercing: bool) {
        let id = world.next_id();
        world.projectiles.push(Projectile {
            id,
            kind: ProjectileKind::Standard,
            owner: Owner::Player,
            source: Some(WeaponKind::Lance),
            position: at,
            velocity,
            damage: 5.0,
            radius: 4.0,
            piercing: piercing.then(HashSet::new),
            homing_target: None,
            life_ms: Some(1000.0),
            removed: false,
        });
    }

    #[test]
    fn non_finite_projectile_is_removed() {
        let mut w = world();
        shot(&mut w, Vec2::new(100.0, 100.0), Vec2::new(f32::NAN, 0.0), false);
        update_projectiles(&mut w, 16.0);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn expired_and_out_of_bounds_projectiles_are_culled() {
        let mut w = world();
        shot(&mut w, Vec2::new(100.0, 100.0), Vec2::ZERO, false);
        w.projectiles[0].life_ms = Some(10.0);
        shot(&mut w, Vec2::new(-1000.0, 100.0), Vec2::ZERO, false);
        shot(&mut w, Vec2::new(100.0, 100.0), Vec2::ZERO, false);
        update_projectiles(&mut w, 16.0);
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn non_piercing_projectile_damages_once() {
        let mut w = world();
        let a = boss_at(&mut w, Vec2::new(5.0, 5.0));
        let b = boss_at(&mut w, Vec2::new(5.0, 5.0));
        let hp = w.enemies[a].hp;
        let at = w.scale.to_world(Vec2::new(5.0, 5.0));
        shot(&mut w, at, Vec2::ZERO, false);
        for _ in 0..5 {
            update_projectiles(&mut w, 16.0);
        }
        let total_loss = (hp - w.enemies[a].hp) + (hp - w.enemies[b].hp);
        assert_eq!(total_loss, 5.0);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn piercing_projectile_hits_each_enemy_once() {
        let mut w = world();
        let a = boss_at(&mut w, Vec2::new(5.0, 5.0));
        let b = boss_at(&mut w, Vec2::new(5.0, 5.0));
        let hp = w.enemies[a].hp;
        let at = w.scale.to_world(Vec2::new(5.0, 5.0));
        shot(&mut w, at, Vec2::ZERO, true);
        for _ in 0..5 {
            update_projectiles(&mut w, 16.0);
        }
        assert_eq!(w.enemies[a].hp, hp - 5.0);
        assert_eq!(w.enemies[b].hp, hp - 5.0);
        assert_eq!(w.projectiles.len(), 1);
    }

    #[test]
    fn homing_projectile_turns_toward_target() {
        let mut w = world();
        let idx = boss_at(&mut w, Vec2::new(10.0, 15.0));
        let target_id = w.enemies[idx].id;
        let at = w.scale.to_world(Vec2::new(10.0, 5.0));
        shot(&mut w, at, Vec2::new(200.0, 0.0), false);
        w.projectiles[0].homing_target = Some(target_id);
        update_projectiles(&mut w, 16.0);
        assert!(w.projectiles[0].velocity.y > 0.0);
    }

    #[test]
    fn homing_projectile_retargets_when_target_gone() {
        let mut w = world();
        let idx = boss_at(&mut w, Vec2::new(10.0, 8.0));
        let at = w.scale.to_world(Vec2::new(10.0, 5.0));
        shot(&mut w, at, Vec2::new(200.0, 0.0), false);
        w.projectiles[0].homing_target = Some(9999);
        update_projectiles(&mut w, 16.0);
        assert_eq!(w.projectiles[0].homing_target, Some(w.enemies[idx].id));
    }

    #[test]
    fn armed_mine_detonates_on_contact() {
        let mut w = world();
        let idx = boss_at(&mut w, Vec2::new(8.0, 8.0));
        let hp = w.enemies[idx].hp;
        let id = w.next_id();
        w.mines.push(crate::combat::Mine {
            id,
            position: w.scale.to_world(Vec2::new(8.0, 8.0)),
            damage: 30.0,
            arm_ms: 20.0,
            life_ms: 5000.0,
            detonated: false,
        });
        update_projectiles(&mut w, 16.0);
        assert_eq!(w.mines.len(), 1, "not armed yet");
        update_projectiles(&mut w, 16.0);
        assert!(w.mines.is_empty());
        assert_eq!(w.enemies[idx].hp, hp - 30.0);
    }

    #[test]
    fn shockwave_hits_each_enemy_once() {
        let mut w = world();
        let idx = boss_at(&mut w, Vec2::new(8.0, 8.0));
        let hp = w.enemies[idx].hp;
        let id = w.next_id();
        w.shockwaves.push(Shockwave {
            id,
            center: w.scale.to_world(Vec2::new(8.0, 8.0)),
            radius: 0.0,
            max_radius: 200.0,
            expansion: 100.0,
            damage: 10.0,
            hit: HashSet::new(),
        });
        for _ in 0..25 {
            update_projectiles(&mut w, 100.0);
        }
        assert_eq!(w.enemies[idx].hp, hp - 10.0);
        assert!(w.shockwaves.is_empty());
    }

    #[test]
    fn attracted_pickups_move_to_head() {
        let mut w = world();
        let head = w.scale.to_world(w.player.head());
        let id = w.next_id();
        w.pickups.push(crate::combat::Pickup {
            id,
            position: head + Vec2::new(100.0, 0.0),
            value: 1,
            attracted: true,
        });
        update_projectiles(&mut w, 100.0);
        assert!(w.pickups[0].position.distance(head) < 100.0);
        for _ in 0..10 {
            update_projectiles(&mut w, 100.0);
        }
        assert_eq!(w.pickups[0].position, head);
    }
}
