//! Enemy records: archetypes, lifecycle, per-effect hit cooldowns and the
//! boss runtime attached to the Boss archetype.
//!
//! Enemies are created by the spawn service (see [`crate::services`]) and
//! flagged [`Lifecycle::Removed`] by the damage pipeline on death.  Physical
//! removal from the world's list happens in
//! [`crate::world::CombatWorld::prune_removed_enemies`], never mid-tick.

use crate::boss::BossState;
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;

/// Stable identifier shared by enemies, projectiles and hazards.
pub type EntityId = u32;

/// Enemy archetype tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Hunter,
    Interceptor,
    Shooter,
    Dasher,
    Boss,
    Barrier,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Hunter,
        EnemyKind::Interceptor,
        EnemyKind::Shooter,
        EnemyKind::Dasher,
        EnemyKind::Boss,
        EnemyKind::Barrier,
    ];
}

/// Where an enemy is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Telegraphing its arrival; cannot hit or be targeted yet.
    Spawning,
    Active,
    /// Dead or despawned; awaiting the end-of-frame prune.
    Removed,
}

/// Sources of continuous damage that must not hit the same enemy more than
/// once per application window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTag {
    Aura,
    TailArmor,
}

/// Boss-only runtime attached to a Boss-archetype enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct BossRuntime {
    /// Selects the [`crate::boss::BossConfig`] in the catalog.
    pub config_id: String,
    pub state: BossState,
    /// +1 when facing right (toward +x), -1 when facing left.
    pub facing: f32,
    /// Direction of travel for sweep movement.
    pub sweep_dir: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub lifecycle: Lifecycle,
    /// Remaining telegraph time while `Spawning`.
    pub spawn_timer_ms: f32,
    /// Grid coordinates (cell units, fractional).
    pub position: Vec2,
    /// Cells per second.
    pub velocity: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Body radius in cells.
    pub radius: f32,
    /// Movement speed in cells per second.
    pub speed: f32,
    /// Tag → remaining ms.
    pub hit_cooldowns: HashMap<HitTag, f32>,
    /// Damage flash marker for the renderer.
    pub flash_ms: f32,
    pub stun_ms: f32,
    pub boss: Option<BossRuntime>,
}

impl Enemy {
    /// A freshly spawned enemy in the `Spawning` state.
    pub fn new(id: EntityId, kind: EnemyKind, position: Vec2, hp: f32, radius: f32, speed: f32) -> Self {
        Self {
            id,
            kind,
            lifecycle: Lifecycle::Spawning,
            spawn_timer_ms: 0.0,
            position,
            velocity: Vec2::ZERO,
            hp,
            max_hp: hp,
            radius,
            speed,
            hit_cooldowns: HashMap::new(),
            flash_ms: 0.0,
            stun_ms: 0.0,
            boss: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.lifecycle == Lifecycle::Removed
    }

    #[inline]
    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun_ms > 0.0
    }

    /// Skip the telegraph and make the enemy hittable immediately.
    pub fn activate(&mut self) {
        if self.lifecycle == Lifecycle::Spawning {
            self.lifecycle = Lifecycle::Active;
            self.spawn_timer_ms = 0.0;
        }
    }

    /// Flag for removal.  Returns `false` if it was already removed.
    pub fn mark_removed(&mut self) -> bool {
        if self.is_removed() {
            return false;
        }
        self.lifecycle = Lifecycle::Removed;
        true
    }

    /// hp / max_hp, clamped to `[0, 1]`.
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    pub fn is_hit_cooling(&self, tag: HitTag) -> bool {
        self.hit_cooldowns.get(&tag).is_some_and(|ms| *ms > 0.0)
    }

    pub fn start_hit_cooldown(&mut self, tag: HitTag, ms: f32) {
        self.hit_cooldowns.insert(tag, ms);
    }

    /// Decay telegraph, flash, stun and hit-cooldown timers.
    pub fn tick_status(&mut self, dt_ms: f32) {
        if self.lifecycle == Lifecycle::Spawning {
            self.spawn_timer_ms -= dt_ms;
            if self.spawn_timer_ms <= 0.0 {
                self.activate();
            }
        }
        self.flash_ms = (self.flash_ms - dt_ms).max(0.0);
        self.stun_ms = (self.stun_ms - dt_ms).max(0.0);
        self.hit_cooldowns.retain(|_, ms| {
            *ms -= dt_ms;
            *ms > 0.0
        });
    }
}
