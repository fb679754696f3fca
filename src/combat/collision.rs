//! Contact resolver: move-time wall/self checks and the per-tick contact pass.
//!
//! ## Per-tick order
//!
//! 1. Tail armor: every active enemy against the nearest body segment.
//! 2. While invulnerable, all confirmation counters are dropped and nothing
//!    else is checked.
//! 3. Enemy (and boss hitbox) contact with the head/neck capsule.  An enemy
//!    must sit inside the lethal band for `confirmation_frames` consecutive
//!    ticks before the hit is certified.
//! 4. Enemy projectiles, resolved immediately.
//!
//! A certified hit is mitigated by exactly one of, in order: dodge, phase
//! shift, shield.  Without any of them the run ends.

use super::damage::{damage_enemy, DamageSource, Hit};
use super::state::Owner;
use crate::enemy::{EntityId, HitTag};
use crate::error::FailureReason;
use crate::events::CombatEvent;
use crate::geometry::{distance_to_segment, nearest_segment, rect_touches_segment};
use crate::world::CombatWorld;
use bevy::prelude::*;
use rand::Rng;
use std::collections::HashSet;

/// Result of [`try_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// Violation while invulnerable: position clamped, step taken.
    Clamped,
    /// Violation absorbed by a shield charge.
    Shielded,
    Ended(FailureReason),
}

/// Validate and commit one player step to `next_head` (grid).
pub fn try_step(world: &mut CombatWorld, next_head: Vec2, grow: bool) -> StepOutcome {
    if let Some(reason) = world.run_outcome() {
        return StepOutcome::Ended(reason);
    }
    let Some(reason) = step_violation(world, next_head, grow) else {
        world.player.step_to(next_head, grow);
        return StepOutcome::Moved;
    };

    let clamped = clamp_to_arena(world, next_head);
    if world.player.is_invulnerable() {
        world.player.step_to(clamped, grow);
        return StepOutcome::Clamped;
    }
    if world.player.shields > 0 {
        world.player.shields -= 1;
        world
            .player
            .grant_invulnerability(world.config.shield_invulnerability_ms);
        world.emit(CombatEvent::ShieldHit);
        world.player.step_to(clamped, grow);
        return StepOutcome::Shielded;
    }
    world.end_run(reason);
    StepOutcome::Ended(reason)
}

fn step_violation(world: &CombatWorld, next: Vec2, grow: bool) -> Option<FailureReason> {
    let w = world.config.arena_width as f32;
    let h = world.config.arena_height as f32;
    if next.x < 0.0 || next.y < 0.0 || next.x > w - 1.0 || next.y > h - 1.0 {
        return Some(FailureReason::Wall);
    }
    if world.walls.contains(&next.round().as_ivec2()) {
        return Some(FailureReason::Wall);
    }
    // The tail tip vacates its cell this step unless the body grows.
    let body = &world.player.body;
    let end = if grow { body.len() } else { body.len().saturating_sub(1) };
    let hits_body = body
        .iter()
        .take(end)
        .skip(1)
        .any(|seg| seg.distance_squared(next) < 0.25);
    hits_body.then_some(FailureReason::SelfCollision)
}

fn clamp_to_arena(world: &CombatWorld, p: Vec2) -> Vec2 {
    let max = Vec2::new(
        (world.config.arena_width - 1) as f32,
        (world.config.arena_height - 1) as f32,
    );
    p.clamp(Vec2::ZERO, max)
}

/// The per-tick contact pass.
pub fn resolve_contacts(world: &mut CombatWorld) {
    tail_armor(world);

    if world.player.is_invulnerable() {
        world.contact_counters.clear();
        return;
    }
    enemy_contact(world);
    if world.is_running() {
        projectile_contact(world);
    }
}

fn tail_armor(world: &mut CombatWorld) {
    let player = &world.player;
    if player.body.len() <= 1 || player.tail_integrity <= 0.0 {
        return;
    }
    let reduction = (1.0 - world.traits.tail_damage_reduction).clamp(0.0, 1.0);
    for idx in 0..world.enemies.len() {
        if world.player.tail_integrity <= 0.0 {
            break;
        }
        let enemy = &world.enemies[idx];
        if !enemy.is_active() || enemy.is_hit_cooling(HitTag::TailArmor) {
            continue;
        }
        let Some((seg_idx, distance)) = nearest_segment(&world.player.body, enemy.position) else {
            continue;
        };
        if distance - enemy.radius > world.config.tail_contact_radius {
            continue;
        }
        let segment = world.player.body[seg_idx];
        let wear = world.config.enemies.get(enemy.kind).tail_damage * reduction;
        let normal = (enemy.position - segment).try_normalize().unwrap_or(Vec2::X);
        let knocked_to = clamp_to_arena(world, enemy.position + normal * world.config.tail_knockback);
        let id = enemy.id;

        let enemy = &mut world.enemies[idx];
        enemy.position = knocked_to;
        enemy.stun_ms = enemy.stun_ms.max(world.config.tail_stun_ms);
        enemy.start_hit_cooldown(HitTag::TailArmor, world.config.tail_hit_cooldown_ms);
        world.emit(CombatEvent::TailBlocked { enemy: id });

        if world.player.wear_tail(wear) {
            world.emit(CombatEvent::TailBreach);
            debug!("Tail integrity breached");
        }
        if world.traits.reactive_damage > 0.0 {
            let reactive = world.traits.reactive_damage;
            damage_enemy(world, idx, Hit::new(reactive, DamageSource::TailReaction));
        }
    }
}

fn enemy_contact(world: &mut CombatWorld) {
    let head = world.player.head();
    let neck = world.player.neck();
    let lethal = world.config.lethal_threshold;
    let proximity = world.config.proximity_threshold;

    let mut overlapping: HashSet<EntityId> = HashSet::new();
    let mut close_call = false;
    for enemy in world.enemies.iter().filter(|e| e.is_active()) {
        let clearance = distance_to_segment(enemy.position, head, neck) - enemy.radius;
        if clearance <= lethal {
            overlapping.insert(enemy.id);
        } else if clearance <= proximity {
            close_call = true;
        }
    }

    let head_w = world.scale.to_world(head);
    let neck_w = world.scale.to_world(neck);
    let lethal_w = world.scale.cells(lethal);
    for hitbox in &world.hitboxes {
        let owner_active = world.enemy(hitbox.owner).is_some_and(|e| e.is_active());
        if owner_active && rect_touches_segment(hitbox.position, hitbox.size / 2.0, head_w, neck_w, lethal_w) {
            overlapping.insert(hitbox.owner);
        }
    }

    // Anything not in the lethal band this tick loses its streak.
    world.contact_counters.retain(|id, _| overlapping.contains(id));
    let mut certified = false;
    for id in &overlapping {
        let count = world.contact_counters.entry(*id).or_insert(0);
        *count += 1;
        certified |= *count >= world.config.confirmation_frames;
    }

    if close_call && world.player.warning_cooldown_ms <= 0.0 {
        world.player.warning_cooldown_ms = world.config.warning_shake_cooldown_ms;
        world.emit(CombatEvent::WarningShake);
    }

    if certified {
        world.contact_counters.clear();
        resolve_certified_hit(world, FailureReason::EnemyContact);
    }
}

/// Dodge, then phase shift, then shield, then the end of the run.
fn resolve_certified_hit(world: &mut CombatWorld, reason: FailureReason) {
    let dodge = world.traits.dodge_chance;
    if dodge > 0.0 && world.rng.gen::<f32>() < dodge {
        world.emit(CombatEvent::Dodged);
        return;
    }
    if world
        .player
        .phase_shift
        .try_consume(world.config.phase_shift_cooldown_ms)
    {
        world
            .player
            .grant_invulnerability(world.config.phase_shift_duration_ms);
        world.emit(CombatEvent::PhaseShifted);
        return;
    }
    if world.player.shields > 0 {
        world.player.shields -= 1;
        world
            .player
            .grant_invulnerability(world.config.shield_invulnerability_ms);
        world.emit(CombatEvent::ShieldHit);
        return;
    }
    world.end_run(reason);
}

fn projectile_contact(world: &mut CombatWorld) {
    let head = world.scale.to_world(world.player.head());
    let neck = world.scale.to_world(world.player.neck());
    let lethal = world.scale.cells(world.config.lethal_threshold);

    for i in 0..world.projectiles.len() {
        if !world.is_running() || world.player.is_invulnerable() {
            break;
        }
        let p = &world.projectiles[i];
        if p.removed || p.owner != Owner::Enemy {
            continue;
        }
        if distance_to_segment(p.position, head, neck) > lethal + p.radius {
            continue;
        }
        let reflect = world.traits.reflect_chance;
        if reflect > 0.0 && world.rng.gen::<f32>() < reflect {
            let p = &mut world.projectiles[i];
            p.owner = Owner::Player;
            p.source = None;
            p.velocity = -p.velocity;
            p.homing_target = None;
            let id = p.id;
            world.emit(CombatEvent::ProjectileReflected { id });
            continue;
        }
        world.projectiles[i].removed = true;
        if world.player.shields > 0 {
            world.player.shields -= 1;
            world
                .player
                .grant_invulnerability(world.config.shield_invulnerability_ms);
            world.emit(CombatEvent::ShieldHit);
        } else {
            world.end_run(FailureReason::ProjectileContact);
        }
    }
}
