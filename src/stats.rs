//! Numbers the combat core reads but does not own.
//!
//! [`CombatModifiers`] are written by the reward/progression service between
//! ticks (upgrades, temporary buffs).  [`CharacterTraits`] come from the
//! character loadout and are fixed for a run.  Both deserialize from TOML so a
//! loadout can be authored alongside `assets/combat.toml`.

use crate::constants::TAIL_INTEGRITY_MAX;
use serde::Deserialize;

/// Global multipliers supplied by progression; 1.0 means "no change".
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatModifiers {
    pub damage: f32,
    /// Higher is faster: intervals are divided by this.
    pub fire_rate: f32,
    /// Scales aura, mine and shockwave radii.
    pub area: f32,
    pub projectile_speed: f32,
    /// Added to the crit chance.
    pub crit_bonus: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            fire_rate: 1.0,
            area: 1.0,
            projectile_speed: 1.0,
            crit_bonus: 0.0,
        }
    }
}

/// Per-character combat traits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterTraits {
    /// Fire-rate gain per player level above 1.
    pub fire_rate_per_level: f32,
    /// Damage gain per combo kill (combo builds only; 0 disables).
    pub combo_damage_per_kill: f32,
    pub dodge_chance: f32,
    /// Chance that an enemy projectile is reflected instead of hitting.
    pub reflect_chance: f32,
    /// Fraction of a hit's base damage carried to a chained neighbour (0 disables).
    pub chain_fraction: f32,
    /// Chain search radius in cells.
    pub chain_range: f32,
    /// Capacity of the echo damage pool (0 disables the mechanic).
    pub echo_capacity: f32,
    /// Fraction of tail-integrity loss ignored (0.25 → 25 % less).
    pub tail_damage_reduction: f32,
    /// Damage dealt back to an enemy blocked by the tail (0 disables).
    pub reactive_damage: f32,
    pub projectile_speed: f32,
    pub phase_shift_charges: u32,
    pub tail_integrity: f32,
}

impl Default for CharacterTraits {
    fn default() -> Self {
        Self {
            fire_rate_per_level: 0.0,
            combo_damage_per_kill: 0.0,
            dodge_chance: 0.0,
            reflect_chance: 0.0,
            chain_fraction: 0.0,
            chain_range: 4.0,
            echo_capacity: 0.0,
            tail_damage_reduction: 0.0,
            reactive_damage: 0.0,
            projectile_speed: 1.0,
            phase_shift_charges: 0,
            tail_integrity: TAIL_INTEGRITY_MAX,
        }
    }
}

impl CharacterTraits {
    /// Composed fire-rate multiplier for a player level.
    pub fn fire_rate_scaling(&self, level: u32) -> f32 {
        1.0 + self.fire_rate_per_level * level.saturating_sub(1) as f32
    }
}
