//! FX / audio event records queued by the combat core.
//!
//! The core never renders or plays sound.  It appends descriptive records to
//! [`crate::world::CombatWorld::events`]; the plugin forwards them as Bevy
//! messages once the tick has settled.

use crate::combat::WeaponKind;
use crate::enemy::{EnemyKind, EntityId};
use crate::error::FailureReason;
use crate::boss::FieldEffect;
use bevy::prelude::*;

#[derive(Message, Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// Throttled shoot cue; `weapon` is the first weapon that fired.
    Shoot { weapon: WeaponKind },
    EnemyDamaged { id: EntityId, amount: f32, crit: bool },
    EnemyDestroyed { id: EntityId, kind: EnemyKind, position: Vec2 },
    /// World-space endpoints of a chain-lightning hop.
    ChainArc { from: Vec2, to: Vec2 },
    /// The echo pool overflowed and released a shockwave.
    EchoBurst { position: Vec2, magnitude: f32 },
    MineDetonated { position: Vec2 },
    ShieldHit,
    Dodged,
    PhaseShifted,
    ProjectileReflected { id: EntityId },
    /// A close call in the proximity band.
    WarningShake,
    TailBlocked { enemy: EntityId },
    /// Tail integrity reached zero.
    TailBreach,
    BossSpawned { id: EntityId, config_id: String },
    BossPhaseChanged { id: EntityId, phase: usize },
    BossStateChanged { id: EntityId, state: String },
    BossDefeated { id: EntityId },
    MinionsSpawned { boss: EntityId, kind: EnemyKind, count: u32 },
    FieldEffectApplied { effect: FieldEffect, until_ms: f64 },
    CameraLock { locked: bool },
    RunEnded { reason: FailureReason },
}
