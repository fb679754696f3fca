//! Seams to the collaborators that live outside the combat core.
//!
//! The core asks a [`SpawnService`] for the numbers of a new enemy and a
//! [`RewardPolicy`] for what an enemy drops on death.  Both are trait objects
//! held by [`Services`] so a game can plug in its own progression tables; the
//! defaults read [`CombatConfig`].

use crate::config::{CombatConfig, EnemyTable};
use crate::enemy::EnemyKind;
use bevy::prelude::*;

/// Numbers a spawned enemy starts with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyTemplate {
    pub hp: f32,
    pub radius: f32,
    pub speed: f32,
    pub spawn_ms: f32,
}

pub trait SpawnService: Send + Sync {
    fn enemy_template(&self, kind: EnemyKind, stage: u32) -> EnemyTemplate;
}

/// One pickup dropped by a dying enemy.  `position` is world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardDrop {
    pub position: Vec2,
    pub value: u32,
}

pub trait RewardPolicy: Send + Sync {
    /// Pickups for an enemy of `kind` dying at world position `position`.
    fn rewards_for(&self, kind: EnemyKind, position: Vec2, max_hp: f32) -> Vec<RewardDrop>;
}

/// Reads the archetype table and grows hp by a fixed fraction per stage.
pub struct StatTableSpawner {
    pub table: EnemyTable,
    pub hp_growth_per_stage: f32,
}

impl SpawnService for StatTableSpawner {
    fn enemy_template(&self, kind: EnemyKind, stage: u32) -> EnemyTemplate {
        let stats = self.table.get(kind);
        let growth = 1.0 + self.hp_growth_per_stage * stage.saturating_sub(1) as f32;
        EnemyTemplate {
            hp: stats.hp * growth,
            radius: stats.radius,
            speed: stats.speed,
            spawn_ms: stats.spawn_ms,
        }
    }
}

/// Splits an archetype's XP into chunks of at most `chunk_value`, laid out on
/// a small ring around the death position.
pub struct ChunkedRewards {
    pub table: EnemyTable,
    pub chunk_value: u32,
    /// Ring radius (px).
    pub scatter: f32,
}

impl RewardPolicy for ChunkedRewards {
    fn rewards_for(&self, kind: EnemyKind, position: Vec2, _max_hp: f32) -> Vec<RewardDrop> {
        let mut remaining = self.table.get(kind).xp;
        let chunk = self.chunk_value.max(1);
        let count = remaining.div_ceil(chunk);
        let mut drops = Vec::with_capacity(count as usize);
        for i in 0..count {
            let value = remaining.min(chunk);
            remaining -= value;
            let offset = if count == 1 {
                Vec2::ZERO
            } else {
                Vec2::from_angle(std::f32::consts::TAU * i as f32 / count as f32) * self.scatter
            };
            drops.push(RewardDrop {
                position: position + offset,
                value,
            });
        }
        drops
    }
}

/// The collaborators a [`crate::world::CombatWorld`] talks to.
pub struct Services {
    pub spawner: Box<dyn SpawnService>,
    pub rewards: Box<dyn RewardPolicy>,
}

impl Services {
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            spawner: Box::new(StatTableSpawner {
                table: config.enemies.clone(),
                hp_growth_per_stage: 0.15,
            }),
            rewards: Box::new(ChunkedRewards {
                table: config.enemies.clone(),
                chunk_value: config.pickup_chunk_value,
                scatter: config.cell_size * 0.5,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewards_are_chunked_and_conserve_xp() {
        let rewards = ChunkedRewards {
            table: EnemyTable::default(),
            chunk_value: 3,
            scatter: 10.0,
        };
        // Shooter drops 8 XP → 3 + 3 + 2.
        let drops = rewards.rewards_for(EnemyKind::Shooter, Vec2::new(100.0, 100.0), 26.0);
        let values: Vec<u32> = drops.iter().map(|d| d.value).collect();
        assert_eq!(values, vec![3, 3, 2]);
        for d in &drops {
            assert!((d.position.distance(Vec2::new(100.0, 100.0)) - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn single_chunk_lands_on_death_position() {
        let rewards = ChunkedRewards {
            table: EnemyTable::default(),
            chunk_value: 50,
            scatter: 10.0,
        };
        let drops = rewards.rewards_for(EnemyKind::Hunter, Vec2::new(5.0, 5.0), 20.0);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn stage_scaling_grows_hp_only() {
        let spawner = StatTableSpawner {
            table: EnemyTable::default(),
            hp_growth_per_stage: 0.5,
        };
        let first = spawner.enemy_template(EnemyKind::Hunter, 1);
        let third = spawner.enemy_template(EnemyKind::Hunter, 3);
        assert_eq!(third.hp, first.hp * 2.0);
        assert_eq!(third.speed, first.speed);
    }
}
