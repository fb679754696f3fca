//! Runtime combat configuration loaded from `assets/combat.toml`.
//!
//! [`CombatConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_combat_config`] reads
//! `assets/combat.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the numbers you care about.
//!
//! The weapon and enemy tables are nested sections:
//!
//! ```toml
//! confirmation_frames = 4
//!
//! [weapons.cannon]
//! damage = 12.0
//!
//! [enemies.dasher]
//! speed = 7.5
//! ```
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `CombatConfig::default()`.

use crate::combat::WeaponKind;
use crate::constants::*;
use crate::enemy::EnemyKind;
use crate::error::{CombatError, CombatResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Static numbers for one weapon type.
///
/// Speeds and ranges are in grid cells; the weapon system converts them to
/// world units with the live [`crate::combat::GridScale`].  Built-in values
/// live in [`crate::constants`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    pub damage: f32,
    pub interval_ms: f32,
    /// Projectile speed (cells/s).
    pub speed: f32,
    /// Targeting range (cells).
    pub range: f32,
    pub count: u32,
    /// Extra projectiles per weapon level above 1.
    pub count_per_level: u32,
    pub spread_deg: f32,
    /// 0 uses the global projectile lifetime.
    pub lifetime_ms: f32,
    /// Area radius (cells) for aura pulses.
    pub radius: f32,
    pub piercing: bool,
    /// Hits from this weapon may chain to a neighbour.
    pub chains: bool,
}

/// Per-weapon numbers.  A `[weapons.<name>]` table only replaces the keys it
/// names; every other key keeps that weapon's built-in value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WeaponTableOverrides")]
pub struct WeaponTable {
    pub cannon: WeaponStats,
    pub lance: WeaponStats,
    pub shards: WeaponStats,
    pub serpent: WeaponStats,
    pub rail: WeaponStats,
    pub aura: WeaponStats,
    pub mine_layer: WeaponStats,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            cannon: CANNON_STATS,
            lance: LANCE_STATS,
            shards: SHARDS_STATS,
            serpent: SERPENT_STATS,
            rail: RAIL_STATS,
            aura: AURA_STATS,
            mine_layer: MINE_LAYER_STATS,
        }
    }
}

impl WeaponTable {
    pub fn get(&self, kind: WeaponKind) -> &WeaponStats {
        match kind {
            WeaponKind::Cannon => &self.cannon,
            WeaponKind::Lance => &self.lance,
            WeaponKind::Shards => &self.shards,
            WeaponKind::Serpent => &self.serpent,
            WeaponKind::Rail => &self.rail,
            WeaponKind::Aura => &self.aura,
            WeaponKind::MineLayer => &self.mine_layer,
        }
    }
}

/// Keys present in one `[weapons.<name>]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeaponOverrides {
    damage: Option<f32>,
    interval_ms: Option<f32>,
    speed: Option<f32>,
    range: Option<f32>,
    count: Option<u32>,
    count_per_level: Option<u32>,
    spread_deg: Option<f32>,
    lifetime_ms: Option<f32>,
    radius: Option<f32>,
    piercing: Option<bool>,
    chains: Option<bool>,
}

impl WeaponOverrides {
    fn apply(self, base: WeaponStats) -> WeaponStats {
        WeaponStats {
            damage: self.damage.unwrap_or(base.damage),
            interval_ms: self.interval_ms.unwrap_or(base.interval_ms),
            speed: self.speed.unwrap_or(base.speed),
            range: self.range.unwrap_or(base.range),
            count: self.count.unwrap_or(base.count),
            count_per_level: self.count_per_level.unwrap_or(base.count_per_level),
            spread_deg: self.spread_deg.unwrap_or(base.spread_deg),
            lifetime_ms: self.lifetime_ms.unwrap_or(base.lifetime_ms),
            radius: self.radius.unwrap_or(base.radius),
            piercing: self.piercing.unwrap_or(base.piercing),
            chains: self.chains.unwrap_or(base.chains),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeaponTableOverrides {
    cannon: WeaponOverrides,
    lance: WeaponOverrides,
    shards: WeaponOverrides,
    serpent: WeaponOverrides,
    rail: WeaponOverrides,
    aura: WeaponOverrides,
    mine_layer: WeaponOverrides,
}

impl From<WeaponTableOverrides> for WeaponTable {
    fn from(o: WeaponTableOverrides) -> Self {
        let base = WeaponTable::default();
        Self {
            cannon: o.cannon.apply(base.cannon),
            lance: o.lance.apply(base.lance),
            shards: o.shards.apply(base.shards),
            serpent: o.serpent.apply(base.serpent),
            rail: o.rail.apply(base.rail),
            aura: o.aura.apply(base.aura),
            mine_layer: o.mine_layer.apply(base.mine_layer),
        }
    }
}

/// Static numbers for one enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub hp: f32,
    /// Body radius (cells).
    pub radius: f32,
    /// Movement speed (cells/s).
    pub speed: f32,
    /// Tail integrity lost when this archetype is blocked by the tail.
    pub tail_damage: f32,
    /// Experience dropped on death.
    pub xp: u32,
    /// Spawn telegraph length.
    pub spawn_ms: f32,
}

/// Per-archetype numbers, merged key by key like [`WeaponTable`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "EnemyTableOverrides")]
pub struct EnemyTable {
    pub hunter: EnemyStats,
    pub interceptor: EnemyStats,
    pub shooter: EnemyStats,
    pub dasher: EnemyStats,
    pub boss: EnemyStats,
    pub barrier: EnemyStats,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            hunter: HUNTER_STATS,
            interceptor: INTERCEPTOR_STATS,
            shooter: SHOOTER_STATS,
            dasher: DASHER_STATS,
            boss: BOSS_STATS,
            barrier: BARRIER_STATS,
        }
    }
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Hunter => &self.hunter,
            EnemyKind::Interceptor => &self.interceptor,
            EnemyKind::Shooter => &self.shooter,
            EnemyKind::Dasher => &self.dasher,
            EnemyKind::Boss => &self.boss,
            EnemyKind::Barrier => &self.barrier,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnemyOverrides {
    hp: Option<f32>,
    radius: Option<f32>,
    speed: Option<f32>,
    tail_damage: Option<f32>,
    xp: Option<u32>,
    spawn_ms: Option<f32>,
}

impl EnemyOverrides {
    fn apply(self, base: EnemyStats) -> EnemyStats {
        EnemyStats {
            hp: self.hp.unwrap_or(base.hp),
            radius: self.radius.unwrap_or(base.radius),
            speed: self.speed.unwrap_or(base.speed),
            tail_damage: self.tail_damage.unwrap_or(base.tail_damage),
            xp: self.xp.unwrap_or(base.xp),
            spawn_ms: self.spawn_ms.unwrap_or(base.spawn_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnemyTableOverrides {
    hunter: EnemyOverrides,
    interceptor: EnemyOverrides,
    shooter: EnemyOverrides,
    dasher: EnemyOverrides,
    boss: EnemyOverrides,
    barrier: EnemyOverrides,
}

impl From<EnemyTableOverrides> for EnemyTable {
    fn from(o: EnemyTableOverrides) -> Self {
        let base = EnemyTable::default();
        Self {
            hunter: o.hunter.apply(base.hunter),
            interceptor: o.interceptor.apply(base.interceptor),
            shooter: o.shooter.apply(base.shooter),
            dasher: o.dasher.apply(base.dasher),
            boss: o.boss.apply(base.boss),
            barrier: o.barrier.apply(base.barrier),
        }
    }
}

/// Runtime-tunable combat configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/combat.toml`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // ── Arena ─────────────────────────────────────────────────────────────────
    pub arena_width: i32,
    pub arena_height: i32,
    pub cell_size: f32,

    // ── Contact ───────────────────────────────────────────────────────────────
    pub lethal_threshold: f32,
    pub proximity_threshold: f32,
    pub confirmation_frames: u32,
    pub warning_shake_cooldown_ms: f32,
    pub shield_invulnerability_ms: f32,
    pub starting_shields: u32,
    pub phase_shift_duration_ms: f32,
    pub phase_shift_cooldown_ms: f32,

    // ── Damage ────────────────────────────────────────────────────────────────
    pub base_crit_chance: f32,
    pub crit_chance_per_level: f32,
    pub crit_multiplier: f32,
    pub flash_duration_ms: f32,
    pub lightning_arc_ms: f32,
    pub combo_window_ms: f32,
    pub combo_damage_cap: f32,

    // ── Overclock ─────────────────────────────────────────────────────────────
    pub overclock_active_ms: f32,
    pub overclock_cooldown_ms: f32,
    pub overclock_interval_factor: f32,

    // ── Audio ─────────────────────────────────────────────────────────────────
    pub shoot_sound_throttle_ms: f32,

    // ── Projectiles ───────────────────────────────────────────────────────────
    pub projectile_lifetime_ms: f32,
    pub projectile_radius: f32,
    pub projectile_oob_margin: f32,
    pub homing_turn_rate: f32,
    pub boss_projectile_lifetime_ms: f32,

    // ── Hazards ───────────────────────────────────────────────────────────────
    pub mine_arm_ms: f32,
    pub mine_trigger_radius: f32,
    pub mine_blast_radius: f32,
    pub mine_lifetime_ms: f32,
    pub shockwave_expansion: f32,
    pub echo_burst_radius: f32,
    pub echo_burst_damage_ratio: f32,
    pub aura_hit_cooldown_ms: f32,

    // ── Tail Armor ────────────────────────────────────────────────────────────
    pub tail_contact_radius: f32,
    pub tail_knockback: f32,
    pub tail_stun_ms: f32,
    pub tail_hit_cooldown_ms: f32,

    // ── Pickups ───────────────────────────────────────────────────────────────
    pub pickup_chunk_value: u32,
    pub magnet_radius: f32,
    pub magnet_pull_speed: f32,

    // ── Tables ────────────────────────────────────────────────────────────────
    pub weapons: WeaponTable,
    pub enemies: EnemyTable,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            // Arena
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            cell_size: CELL_SIZE_PX,
            // Contact
            lethal_threshold: LETHAL_THRESHOLD_CELLS,
            proximity_threshold: PROXIMITY_THRESHOLD_CELLS,
            confirmation_frames: CONFIRMATION_FRAMES,
            warning_shake_cooldown_ms: WARNING_SHAKE_COOLDOWN_MS,
            shield_invulnerability_ms: SHIELD_INVULNERABILITY_MS,
            starting_shields: STARTING_SHIELDS,
            phase_shift_duration_ms: PHASE_SHIFT_DURATION_MS,
            phase_shift_cooldown_ms: PHASE_SHIFT_COOLDOWN_MS,
            // Damage
            base_crit_chance: BASE_CRIT_CHANCE,
            crit_chance_per_level: CRIT_CHANCE_PER_LEVEL,
            crit_multiplier: CRIT_MULTIPLIER,
            flash_duration_ms: FLASH_DURATION_MS,
            lightning_arc_ms: LIGHTNING_ARC_MS,
            combo_window_ms: COMBO_WINDOW_MS,
            combo_damage_cap: COMBO_DAMAGE_CAP,
            // Overclock
            overclock_active_ms: OVERCLOCK_ACTIVE_MS,
            overclock_cooldown_ms: OVERCLOCK_COOLDOWN_MS,
            overclock_interval_factor: OVERCLOCK_INTERVAL_FACTOR,
            // Audio
            shoot_sound_throttle_ms: SHOOT_SOUND_THROTTLE_MS,
            // Projectiles
            projectile_lifetime_ms: PROJECTILE_LIFETIME_MS,
            projectile_radius: PROJECTILE_RADIUS_PX,
            projectile_oob_margin: PROJECTILE_OOB_MARGIN_PX,
            homing_turn_rate: HOMING_TURN_RATE,
            boss_projectile_lifetime_ms: BOSS_PROJECTILE_LIFETIME_MS,
            // Hazards
            mine_arm_ms: MINE_ARM_MS,
            mine_trigger_radius: MINE_TRIGGER_RADIUS_CELLS,
            mine_blast_radius: MINE_BLAST_RADIUS_CELLS,
            mine_lifetime_ms: MINE_LIFETIME_MS,
            shockwave_expansion: SHOCKWAVE_EXPANSION_CELLS,
            echo_burst_radius: ECHO_BURST_RADIUS_CELLS,
            echo_burst_damage_ratio: ECHO_BURST_DAMAGE_RATIO,
            aura_hit_cooldown_ms: AURA_HIT_COOLDOWN_MS,
            // Tail Armor
            tail_contact_radius: TAIL_CONTACT_RADIUS_CELLS,
            tail_knockback: TAIL_KNOCKBACK_CELLS,
            tail_stun_ms: TAIL_STUN_MS,
            tail_hit_cooldown_ms: TAIL_HIT_COOLDOWN_MS,
            // Pickups
            pickup_chunk_value: PICKUP_CHUNK_VALUE,
            magnet_radius: MAGNET_RADIUS_CELLS,
            magnet_pull_speed: MAGNET_PULL_SPEED_PX,
            // Tables
            weapons: WeaponTable::default(),
            enemies: EnemyTable::default(),
        }
    }
}

impl CombatConfig {
    /// Parse a TOML document, keeping defaults for anything it omits.
    pub fn from_toml_str(text: &str) -> CombatResult<Self> {
        toml::from_str::<CombatConfig>(text).map_err(|e| CombatError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Reject values the contact resolver and unit conversion cannot run with.
    pub fn validate(&self) -> CombatResult<()> {
        validate::at_least_one("confirmation_frames", self.confirmation_frames)?;
        validate::positive("cell_size", self.cell_size)?;
        validate::positive("lethal_threshold", self.lethal_threshold)?;
        validate::ordered(
            "proximity_threshold",
            self.lethal_threshold,
            self.proximity_threshold,
        )?;
        validate::positive("crit_multiplier", self.crit_multiplier)?;
        validate::positive("overclock_interval_factor", self.overclock_interval_factor)?;
        for kind in WeaponKind::ALL {
            validate::positive("weapon interval_ms", self.weapons.get(kind).interval_ms)?;
        }
        Ok(())
    }
}

/// Range checks shared by [`CombatConfig::validate`].
pub mod validate {
    use crate::error::{CombatError, CombatResult};

    pub fn positive(name: &'static str, value: f32) -> CombatResult<()> {
        if value > 0.0 && value.is_finite() {
            Ok(())
        } else {
            Err(CombatError::UnsafeConstant {
                name,
                value,
                safe_range: "(0.0, ∞)",
            })
        }
    }

    pub fn at_least_one(name: &'static str, value: u32) -> CombatResult<()> {
        if value >= 1 {
            Ok(())
        } else {
            Err(CombatError::UnsafeConstant {
                name,
                value: value as f32,
                safe_range: "[1, ∞)",
            })
        }
    }

    /// `upper` must lie strictly above `lower`.
    pub fn ordered(name: &'static str, lower: f32, upper: f32) -> CombatResult<()> {
        if upper > lower {
            Ok(())
        } else {
            Err(CombatError::UnsafeConstant {
                name,
                value: upper,
                safe_range: "above lethal_threshold",
            })
        }
    }
}

/// Startup system: attempt to load `assets/combat.toml` and overwrite the
/// `CombatConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse errors and values that
/// fail validation are logged and leave the defaults in place.
pub fn load_combat_config(mut config: ResMut<CombatConfig>) {
    let path = "assets/combat.toml";
    match std::fs::read_to_string(path) {
        Ok(contents) => match CombatConfig::from_toml_str(&contents) {
            Ok(loaded) => match loaded.validate() {
                Ok(()) => {
                    *config = loaded;
                    info!("Loaded combat config from {path}");
                }
                Err(e) => warn!("Rejected {path}: {e}; using defaults"),
            },
            Err(e) => warn!("Failed to parse {path}: {e}; using defaults"),
        },
        Err(_) => {
            info!("No {path} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_constants() {
        let config = CombatConfig::default();
        assert_eq!(config.confirmation_frames, CONFIRMATION_FRAMES);
        assert_eq!(config.cell_size, CELL_SIZE_PX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let text = r#"
            confirmation_frames = 5

            [weapons.cannon]
            damage = 99.0

            [enemies.dasher]
            speed = 9.0
        "#;
        let config = CombatConfig::from_toml_str(text).unwrap();
        assert_eq!(config.confirmation_frames, 5);
        assert_eq!(config.weapons.cannon.damage, 99.0);
        assert_eq!(config.enemies.dasher.speed, 9.0);
        assert_eq!(config.lethal_threshold, LETHAL_THRESHOLD_CELLS);
        // Untouched tables are left alone entirely.
        assert_eq!(config.weapons.rail, RAIL_STATS);
    }

    #[test]
    fn overridden_table_keeps_its_own_builtins() {
        let text = r#"
            [weapons.cannon]
            damage = 12.0

            [enemies.boss]
            hp = 900.0
        "#;
        let config = CombatConfig::from_toml_str(text).unwrap();
        let cannon = config.weapons.cannon;
        assert_eq!(cannon.damage, 12.0);
        assert_eq!(cannon.interval_ms, CANNON_STATS.interval_ms);
        assert_eq!(cannon.interval_ms, 400.0);
        assert!(cannon.chains);

        let boss = config.enemies.boss;
        assert_eq!(boss.hp, 900.0);
        assert_eq!(boss.spawn_ms, 0.0);
        assert_eq!(boss.radius, 1.4);
        assert_eq!(boss.xp, BOSS_STATS.xp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn table_defaults_come_from_constants() {
        let config = CombatConfig::default();
        assert_eq!(config.weapons.get(WeaponKind::Shards), &SHARDS_STATS);
        assert_eq!(config.enemies.get(EnemyKind::Dasher), &DASHER_STATS);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = CombatConfig::from_toml_str("confirmation_frames = \"three\"").unwrap_err();
        assert!(matches!(err, CombatError::ConfigParse { .. }));
    }

    #[test]
    fn zero_confirmation_frames_is_rejected() {
        let config = CombatConfig {
            confirmation_frames: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CombatError::UnsafeConstant {
                name: "confirmation_frames",
                ..
            })
        ));
    }

    #[test]
    fn proximity_band_must_enclose_lethal_zone() {
        let config = CombatConfig {
            lethal_threshold: 1.0,
            proximity_threshold: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
