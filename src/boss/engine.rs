//! The boss engine: a timer-driven state machine per boss, with hp-threshold
//! phases layered on top and a small interpreter for the intents attached to
//! each state.
//!
//! ## Per-tick flow
//!
//! ```text
//! advance(boss, dt, player)
//!   ├─ look up BossConfig             (missing → no-op)
//!   ├─ movement                        (every tick)
//!   ├─ timer += dt
//!   └─ timer ≥ duration?
//!        ├─ pick phase (forward only) and destination state
//!        ├─ run current onExit
//!        ├─ switch state, timer = 0
//!        └─ run destination onEnter (+ bounded forced transitions)
//! ```
//!
//! Malformed configuration never panics: an unknown phase or state leaves the
//! boss stalled in its last valid state.

use super::definition::{BossConfig, BossIntent, BossStateDef, FieldEffect, HitboxDef, VolleyDef};
use super::movement::{anchor, steer_boss};
use crate::combat::{Hitbox, Owner, Projectile, ProjectileKind};
use crate::constants::{BOSS_DEFAULT_IDLE_STATE, MAX_FORCED_TRANSITIONS};
use crate::events::CombatEvent;
use crate::geometry::spread_angles;
use crate::world::CombatWorld;
use bevy::prelude::*;
use std::sync::Arc;

/// Advance every active boss by one tick.
pub fn run_bosses(world: &mut CombatWorld, dt_ms: f32) {
    let player_pos = world.player.head();
    // Minions spawned during the pass land past `count` and are not bosses.
    let count = world.enemies.len();
    for idx in 0..count {
        let enemy = &world.enemies[idx];
        if enemy.is_active() && enemy.boss.is_some() {
            advance(world, idx, dt_ms, player_pos);
        }
    }
}

/// One engine step for the boss at `idx`.
pub fn advance(world: &mut CombatWorld, idx: usize, dt_ms: f32, player_pos: Vec2) {
    let catalog = Arc::clone(&world.catalog);
    let Some(runtime) = world.enemies[idx].boss.as_ref() else {
        return;
    };
    let Some(config) = catalog.get(&runtime.config_id) else {
        trace!("Boss #{} has unknown config '{}'", world.enemies[idx].id, runtime.config_id);
        return;
    };

    steer_boss(world, idx, config.movement, player_pos, dt_ms);

    let Some(runtime) = world.enemies[idx].boss.as_mut() else {
        return;
    };
    runtime.state.timer_ms += dt_ms;
    let timer = runtime.state.timer_ms;
    let phase_idx = runtime.state.phase;
    let state_id = runtime.state.state_id.clone();

    let Some(phase) = config.phases.get(phase_idx) else {
        debug!("Boss '{}' has no phase {phase_idx}; stalling", config.id);
        return;
    };
    let Some(current) = phase.state(&state_id) else {
        debug!("Boss '{}' has no state '{state_id}'; stalling", config.id);
        return;
    };
    if timer < current.duration_ms {
        return;
    }

    let ratio = world.enemies[idx].hp_ratio();
    let target_phase = config.select_phase(phase_idx, ratio);
    let target_id = if target_phase != phase_idx {
        config.phases[target_phase].entry.as_str()
    } else {
        current.next.as_deref().unwrap_or(BOSS_DEFAULT_IDLE_STATE)
    };
    let Some(target) = config.phases[target_phase].state(target_id) else {
        debug!("Boss '{}' cannot reach state '{target_id}'; stalling", config.id);
        return;
    };

    execute_intents(world, idx, &current.on_exit, player_pos);
    switch_state(world, idx, target_phase, target);
    enter_state(world, idx, config, target_phase, target, player_pos);
}

/// Run the entry state's `onEnter` for a freshly spawned boss.
pub fn enter_initial_state(world: &mut CombatWorld, idx: usize) {
    let catalog = Arc::clone(&world.catalog);
    let Some(runtime) = world.enemies[idx].boss.as_ref() else {
        return;
    };
    let Some(config) = catalog.get(&runtime.config_id) else {
        return;
    };
    let phase_idx = runtime.state.phase;
    let Some(entry) = config
        .phases
        .get(phase_idx)
        .and_then(|p| p.state(&runtime.state.state_id))
    else {
        debug!("Boss '{}' entry state is missing; stalling", config.id);
        return;
    };
    let player_pos = world.player.head();
    enter_state(world, idx, config, phase_idx, entry, player_pos);
}

/// Execute `onEnter`, then honour transition requests from it up to the
/// per-tick limit.
fn enter_state<'a>(
    world: &mut CombatWorld,
    idx: usize,
    config: &'a BossConfig,
    phase_idx: usize,
    mut state: &'a BossStateDef,
    player_pos: Vec2,
) {
    let mut forced = 0;
    while let Some(request) = execute_intents(world, idx, &state.on_enter, player_pos) {
        if forced >= MAX_FORCED_TRANSITIONS {
            debug!(
                "Boss '{}' exceeded {MAX_FORCED_TRANSITIONS} forced transitions; staying in '{}'",
                config.id, state.id
            );
            break;
        }
        forced += 1;
        let Some(target) = config.phases[phase_idx].state(&request) else {
            debug!("Boss '{}' requested unknown state '{request}'", config.id);
            break;
        };
        execute_intents(world, idx, &state.on_exit, player_pos);
        switch_state(world, idx, phase_idx, target);
        state = target;
    }
}

fn switch_state(world: &mut CombatWorld, idx: usize, phase_idx: usize, target: &BossStateDef) {
    let id = world.enemies[idx].id;
    let Some(runtime) = world.enemies[idx].boss.as_mut() else {
        return;
    };
    let phase_changed = runtime.state.phase != phase_idx;
    runtime.state.phase = phase_idx;
    runtime.state.state_id = target.id.clone();
    runtime.state.timer_ms = 0.0;

    if phase_changed {
        debug!("Boss #{id} entered phase {phase_idx}");
        world.emit(CombatEvent::BossPhaseChanged { id, phase: phase_idx });
    }
    debug!("Boss #{id} → state '{}'", target.id);
    world.emit(CombatEvent::BossStateChanged {
        id,
        state: target.id.clone(),
    });
}

// ── Intent interpreter ────────────────────────────────────────────────────────

/// Interpret `intents` in order against the boss at `idx`.  Returns the first
/// transition request, if any; the caller decides whether to honour it.
pub fn execute_intents(
    world: &mut CombatWorld,
    idx: usize,
    intents: &[BossIntent],
    player_pos: Vec2,
) -> Option<String> {
    let mut request = None;
    for intent in intents {
        match intent {
            BossIntent::Transition { to } => {
                request.get_or_insert_with(|| to.clone());
            }
            BossIntent::SpawnHitbox(def) => spawn_hitbox(world, idx, def),
            BossIntent::DespawnHitbox { tag } => {
                let id = Hitbox::composite_id(world.enemies[idx].id, tag);
                world.hitboxes.retain(|h| h.id != id);
            }
            BossIntent::LockCamera => set_camera_lock(world, true),
            BossIntent::UnlockCamera => set_camera_lock(world, false),
            BossIntent::SpawnMinions { enemy, count, offset } => {
                let (boss, origin) = (world.enemies[idx].id, world.enemies[idx].position);
                let at = origin + mirrored(world, idx, Vec2::from(*offset));
                for _ in 0..*count {
                    world.spawn_enemy(*enemy, at);
                }
                world.emit(CombatEvent::MinionsSpawned {
                    boss,
                    kind: *enemy,
                    count: *count,
                });
            }
            BossIntent::ApplyFieldEffect { effect, duration_ms } => {
                let until_ms = world.clock_ms + *duration_ms as f64;
                match effect {
                    FieldEffect::Slow => world.powerups.slow_until_ms = until_ms,
                    FieldEffect::Magnet => world.powerups.magnet_until_ms = until_ms,
                }
                world.emit(CombatEvent::FieldEffectApplied {
                    effect: *effect,
                    until_ms,
                });
            }
            BossIntent::ProjectileVolley(volley) => fire_volley(world, idx, volley, player_pos),
        }
    }
    request
}

fn facing(world: &CombatWorld, idx: usize) -> f32 {
    world.enemies[idx].boss.as_ref().map_or(1.0, |b| b.facing)
}

fn mirrored(world: &CombatWorld, idx: usize, offset: Vec2) -> Vec2 {
    Vec2::new(offset.x * facing(world, idx), offset.y)
}

fn set_camera_lock(world: &mut CombatWorld, locked: bool) {
    world.camera_locked = locked;
    world.emit(CombatEvent::CameraLock { locked });
}

/// Insert a hitbox, replacing any live one with the same composite id.
fn spawn_hitbox(world: &mut CombatWorld, idx: usize, def: &HitboxDef) {
    let owner = world.enemies[idx].id;
    let id = Hitbox::composite_id(owner, &def.tag);
    let local_offset = Vec2::from(def.offset);
    let position = anchor(
        &world.scale,
        world.enemies[idx].position,
        local_offset,
        facing(world, idx),
    );
    let size = Vec2::from(def.size) * world.scale.cell_size;
    world.hitboxes.retain(|h| h.id != id);
    world.hitboxes.push(Hitbox {
        id,
        owner,
        tag: def.tag.clone(),
        local_offset,
        position,
        size,
        damage: def.damage,
        color: def.color.clone(),
    });
}

fn fire_volley(world: &mut CombatWorld, idx: usize, volley: &VolleyDef, player_pos: Vec2) {
    let origin = world.scale.to_world(world.enemies[idx].position);
    let offset = volley.angle_deg.to_radians();
    let base = if volley.track_player {
        let aim = world.scale.to_world(player_pos) - origin;
        aim.try_normalize().unwrap_or(Vec2::X).to_angle() + offset
    } else if facing(world, idx) < 0.0 {
        std::f32::consts::PI - offset
    } else {
        offset
    };
    let speed = world.scale.cells(volley.speed);
    let life = world.config.boss_projectile_lifetime_ms;
    let radius = world.config.projectile_radius;

    for angle in spread_angles(base, volley.count, volley.spread_deg.to_radians()) {
        let id = world.next_id();
        world.projectiles.push(Projectile {
            id,
            kind: ProjectileKind::BossProjectile,
            owner: Owner::Enemy,
            source: None,
            position: origin,
            velocity: Vec2::from_angle(angle) * speed,
            damage: volley.damage,
            radius,
            piercing: None,
            homing_target: None,
            life_ms: Some(life),
            removed: false,
        });
    }
}
