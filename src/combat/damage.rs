//! Damage pipeline: modifiers, crits, the echo pool, chain hops and death.
//!
//! ## Steps for one hit
//!
//! 1. A removed enemy is never touched again.
//! 2. `damage = base × global modifier × combo scaling`.
//! 3. Crit roll (skipped when forced) multiplies by the crit multiplier.
//! 4. hp is reduced and the flash marker is set.
//! 5. The echo pool stores the dealt damage; on overflow it empties and
//!    queues a shockwave centred on the head.  The wave is resolved later by
//!    the hazard loop, never recursively from here.
//! 6. Chain: a bounded loop of at most [`MAX_CHAIN_HOPS`] hops to the nearest
//!    *other* active enemy, each carrying a fraction of the base damage.
//!    Chained hits never chain again.
//! 7. Death: flagged removed once, kill and combo counters, reward pickups,
//!    magnet pull, boss bookkeeping.

use super::state::{LightningArc, Pickup, Shockwave, WeaponKind};
use crate::constants::MAX_CHAIN_HOPS;
use crate::events::CombatEvent;
use crate::geometry::nearest_enemy_excluding;
use crate::world::CombatWorld;
use bevy::prelude::*;
use rand::Rng;
use std::collections::HashSet;

/// What caused a hit.  Controls chaining and echo accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Weapon(WeaponKind),
    Mine,
    Shockwave,
    Chain,
    TailReaction,
    /// An enemy projectile turned around by the reflect trait.
    Reflected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub base_damage: f32,
    pub force_crit: bool,
    pub allow_chain: bool,
    pub source: DamageSource,
}

impl Hit {
    pub fn new(base_damage: f32, source: DamageSource) -> Self {
        Self {
            base_damage,
            force_crit: false,
            allow_chain: false,
            source,
        }
    }

    pub fn chaining(mut self) -> Self {
        self.allow_chain = true;
        self
    }

    pub fn crit(mut self) -> Self {
        self.force_crit = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    pub dealt: f32,
    pub crit: bool,
    pub killed: bool,
    /// Enemies hit by the chain step.
    pub chained: u8,
}

/// Apply `hit` to the enemy at `idx`.  `None` when the enemy is missing or
/// already removed.
pub fn damage_enemy(world: &mut CombatWorld, idx: usize, hit: Hit) -> Option<DamageReport> {
    let (dealt, crit) = strike(world, idx, &hit)?;

    let mut chained = 0u8;
    if hit.allow_chain && source_chains(world, hit.source) {
        let base = hit.base_damage * world.traits.chain_fraction;
        let range = world.traits.chain_range;
        let mut from = idx;
        while chained < MAX_CHAIN_HOPS {
            let origin = world.enemies[from].position;
            let exclude = Some(world.enemies[from].id);
            let Some(next) = nearest_enemy_excluding(&world.enemies, origin, range, exclude) else {
                break;
            };
            let arc = LightningArc {
                from: world.scale.to_world(origin),
                to: world.scale.to_world(world.enemies[next].position),
                ttl_ms: world.config.lightning_arc_ms,
            };
            world.arcs.push(arc);
            world.emit(CombatEvent::ChainArc {
                from: arc.from,
                to: arc.to,
            });
            if strike(world, next, &Hit::new(base, DamageSource::Chain)).is_some() {
                resolve_death(world, next);
            }
            chained += 1;
            from = next;
        }
    }

    let killed = resolve_death(world, idx);
    Some(DamageReport {
        dealt,
        crit,
        killed,
        chained,
    })
}

fn source_chains(world: &CombatWorld, source: DamageSource) -> bool {
    let DamageSource::Weapon(kind) = source else {
        return false;
    };
    world.traits.chain_fraction > 0.0 && world.config.weapons.get(kind).chains
}

/// Steps 1–5.  Returns the damage dealt and whether it crit.
fn strike(world: &mut CombatWorld, idx: usize, hit: &Hit) -> Option<(f32, bool)> {
    let enemy = world.enemies.get(idx)?;
    if enemy.is_removed() {
        return None;
    }
    let id = enemy.id;

    let combo_scale = (1.0 + world.combo.count as f32 * world.traits.combo_damage_per_kill)
        .min(world.config.combo_damage_cap)
        .max(1.0);
    let mut damage = hit.base_damage * world.modifiers.damage * combo_scale;

    let crit = hit.force_crit || {
        let level_bonus =
            world.config.crit_chance_per_level * world.player.level.saturating_sub(1) as f32;
        let chance = world.config.base_crit_chance + level_bonus + world.modifiers.crit_bonus;
        world.rng.gen::<f32>() < chance
    };
    if crit {
        damage *= world.config.crit_multiplier;
    }
    let damage = damage.max(0.0);

    let enemy = &mut world.enemies[idx];
    enemy.hp -= damage;
    enemy.flash_ms = world.config.flash_duration_ms;
    world.emit(CombatEvent::EnemyDamaged {
        id,
        amount: damage,
        crit,
    });

    if hit.source != DamageSource::Shockwave {
        feed_echo(world, damage);
    }
    Some((damage, crit))
}

/// Store damage in the echo pool; release a shockwave on overflow.
fn feed_echo(world: &mut CombatWorld, damage: f32) {
    let capacity = world.traits.echo_capacity;
    if capacity <= 0.0 {
        return;
    }
    world.echo_pool += damage;
    if world.echo_pool < capacity {
        return;
    }
    world.echo_pool = 0.0;
    let center = world.scale.to_world(world.player.head());
    let magnitude = capacity * world.config.echo_burst_damage_ratio;
    let id = world.next_id();
    world.shockwaves.push(Shockwave {
        id,
        center,
        radius: 0.0,
        max_radius: world
            .scale
            .cells(world.config.echo_burst_radius * world.modifiers.area),
        expansion: world.scale.cells(world.config.shockwave_expansion),
        damage: magnitude,
        hit: HashSet::new(),
    });
    world.emit(CombatEvent::EchoBurst {
        position: center,
        magnitude,
    });
}

/// Step 7.  Returns `true` when this call killed the enemy.
fn resolve_death(world: &mut CombatWorld, idx: usize) -> bool {
    let enemy = &mut world.enemies[idx];
    if enemy.hp > 0.0 || !enemy.mark_removed() {
        return false;
    }
    let (id, kind, max_hp) = (enemy.id, enemy.kind, enemy.max_hp);
    // Boss-kind minions spawned by an intent carry no runtime.
    let ran_boss_engine = enemy.boss.is_some();
    let position = world.scale.to_world(enemy.position);

    world.kills += 1;
    world.combo.register_kill(world.config.combo_window_ms);
    world.emit(CombatEvent::EnemyDestroyed { id, kind, position });

    let drops = world.services.rewards.rewards_for(kind, position, max_hp);
    for drop in drops {
        let pickup_id = world.next_id();
        world.pickups.push(Pickup {
            id: pickup_id,
            position: drop.position,
            value: drop.value,
            attracted: false,
        });
    }

    if world.powerups.magnet_active(world.clock_ms) {
        let head = world.scale.to_world(world.player.head());
        let radius = world.scale.cells(world.config.magnet_radius);
        for pickup in &mut world.pickups {
            if pickup.position.distance_squared(head) <= radius * radius {
                pickup.attracted = true;
            }
        }
    }

    if ran_boss_engine {
        world.hitboxes.retain(|h| h.owner != id);
        world.boss_active = world
            .enemies
            .iter()
            .any(|e| e.boss.is_some() && !e.is_removed());
        world.boss_defeated = !world.boss_active;
        world.emit(CombatEvent::BossDefeated { id });
        info!("Boss #{id} defeated");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Hitbox;
    use crate::enemy::EnemyKind;
    use crate::stats::CharacterTraits;

    fn world() -> CombatWorld {
        let mut world = CombatWorld::default().with_seed(7);
        world.config.base_crit_chance = 0.0;
        world.config.crit_chance_per_level = 0.0;
        world
    }

    fn active(world: &mut CombatWorld, kind: EnemyKind, pos: Vec2) -> usize {
        let id = world.spawn_enemy(kind, pos);
        let idx = world.enemy_index(id).unwrap();
        world.enemies[idx].activate();
        idx
    }

    #[test]
    fn removed_enemy_is_never_damaged_again() {
        let mut w = world();
        let idx = active(&mut w, EnemyKind::Hunter, Vec2::new(2.0, 2.0));
        let report = damage_enemy(&mut w, idx, Hit::new(1000.0, DamageSource::Mine)).unwrap();
        assert!(report.killed);
        let hp_after_death = w.enemies[idx].hp;
        assert!(damage_enemy(&mut w, idx, Hit::new(5.0, DamageSource::Mine)).is_none());
        assert_eq!(w.enemies[idx].hp, hp_after_death);
        assert_eq!(w.kills, 1);
    }

    #[test]
    fn forced_crit_multiplies_damage() {
        let mut w = world();
        let idx = active(&mut w, EnemyKind::Boss, Vec2::new(2.0, 2.0));
        let report = damage_enemy(&mut w, idx, Hit::new(10.0, DamageSource::Mine).crit()).unwrap();
        assert!(report.crit);
        assert_eq!(report.dealt, 10.0 * w.config.crit_multiplier);
        assert!(w.enemies[idx].flash_ms > 0.0);
    }

    #[test]
    fn global_modifier_and_combo_scale_damage() {
        let mut w = world();
        w.modifiers.damage = 2.0;
        w.traits.combo_damage_per_kill = 0.1;
        w.combo.count = 5;
        let idx = active(&mut w, EnemyKind::Boss, Vec2::ZERO);
        let report = damage_enemy(&mut w, idx, Hit::new(10.0, DamageSource::Mine)).unwrap();
        assert!((report.dealt - 30.0).abs() < 1e-4);
    }

    #[test]
    fn combo_scaling_is_capped() {
        let mut w = world();
        w.traits.combo_damage_per_kill = 1.0;
        w.combo.count = 50;
        let idx = active(&mut w, EnemyKind::Boss, Vec2::ZERO);
        let report = damage_enemy(&mut w, idx, Hit::new(10.0, DamageSource::Mine)).unwrap();
        assert_eq!(report.dealt, 10.0 * w.config.combo_damage_cap);
    }

    #[test]
    fn death_spawns_reward_pickups() {
        let mut w = world();
        let idx = active(&mut w, EnemyKind::Shooter, Vec2::new(4.0, 4.0));
        damage_enemy(&mut w, idx, Hit::new(1000.0, DamageSource::Mine));
        let total: u32 = w.pickups.iter().map(|p| p.value).sum();
        assert_eq!(total, w.config.enemies.shooter.xp);
    }

    #[test]
    fn magnet_attracts_pickups_near_head_on_kill() {
        let mut w = world();
        w.powerups.magnet_until_ms = 10_000.0;
        let head = w.player.head();
        let idx = active(&mut w, EnemyKind::Hunter, head + Vec2::new(2.0, 0.0));
        damage_enemy(&mut w, idx, Hit::new(1000.0, DamageSource::Mine));
        assert!(!w.pickups.is_empty());
        assert!(w.pickups.iter().all(|p| p.attracted));
    }

    #[test]
    fn chain_hits_nearest_other_enemy_with_fraction() {
        let mut w = world().with_traits(CharacterTraits {
            chain_fraction: 0.5,
            chain_range: 3.0,
            ..Default::default()
        });
        let a = active(&mut w, EnemyKind::Boss, Vec2::new(5.0, 5.0));
        let b = active(&mut w, EnemyKind::Boss, Vec2::new(6.0, 5.0));
        let hp_b = w.enemies[b].hp;
        let hit = Hit::new(20.0, DamageSource::Weapon(WeaponKind::Cannon)).chaining();
        let report = damage_enemy(&mut w, a, hit).unwrap();
        assert_eq!(report.chained, 1);
        assert_eq!(w.enemies[b].hp, hp_b - 10.0);
        assert_eq!(w.arcs.len(), 1);
    }

    #[test]
    fn non_chaining_weapon_does_not_chain() {
        let mut w = world().with_traits(CharacterTraits {
            chain_fraction: 0.5,
            ..Default::default()
        });
        let a = active(&mut w, EnemyKind::Boss, Vec2::new(5.0, 5.0));
        let b = active(&mut w, EnemyKind::Boss, Vec2::new(6.0, 5.0));
        let hp_b = w.enemies[b].hp;
        let hit = Hit::new(20.0, DamageSource::Weapon(WeaponKind::Lance)).chaining();
        damage_enemy(&mut w, a, hit);
        assert_eq!(w.enemies[b].hp, hp_b);
    }

    #[test]
    fn boss_death_clears_boss_flags_and_hitboxes() {
        let mut w = world();
        let id = w.spawn_boss("warden", Vec2::new(10.0, 5.0)).unwrap();
        let idx = w.enemy_index(id).unwrap();
        w.hitboxes.push(Hitbox {
            id: Hitbox::composite_id(id, "claw"),
            owner: id,
            tag: "claw".into(),
            local_offset: Vec2::ZERO,
            position: Vec2::ZERO,
            size: Vec2::ONE,
            damage: 1.0,
            color: String::new(),
        });
        damage_enemy(&mut w, idx, Hit::new(1.0e6, DamageSource::Mine));
        assert!(w.boss_defeated);
        assert!(!w.boss_active);
        assert!(w.hitboxes.iter().all(|h| h.owner != id));
        let defeated = w
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::BossDefeated { .. }))
            .count();
        assert_eq!(defeated, 1);
    }

    #[test]
    fn boss_kind_minion_death_leaves_fight_running() {
        let mut w = world();
        let boss = w.spawn_boss("warden", Vec2::new(10.0, 5.0)).unwrap();
        let minion = active(&mut w, EnemyKind::Boss, Vec2::new(4.0, 4.0));
        assert!(w.enemies[minion].boss.is_none());

        let report = damage_enemy(&mut w, minion, Hit::new(1.0e6, DamageSource::Mine)).unwrap();
        assert!(report.killed);
        assert!(w.boss_active);
        assert!(!w.boss_defeated);
        assert!(!w
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::BossDefeated { .. })));
        assert!(w.enemy(boss).is_some_and(|e| e.is_active()));
    }
}
