//! Centralised combat tuning constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::CombatConfig`] mirrors these as its defaults; any subset can
//! be overridden from `assets/combat.toml`.
//!
//! ## Units
//!
//! - Durations, cooldowns and timers are **milliseconds**.
//! - Distances suffixed `_CELLS` are grid units; distances suffixed `_PX` are
//!   world units (pixels).
//! - Speeds are per **second** in the unit named by the suffix.

use crate::config::{EnemyStats, WeaponStats};

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Arena width in grid cells.  Cells `0..ARENA_WIDTH` are in bounds.
pub const ARENA_WIDTH: i32 = 32;

/// Arena height in grid cells.
pub const ARENA_HEIGHT: i32 = 24;

/// World-space size of one grid cell (px).
///
/// The grid/world-scale provider may change this at runtime (zoomed arenas);
/// everything that converts grid speeds to world velocities reads the live value.
pub const CELL_SIZE_PX: f32 = 20.0;

// ── Contact: Head/Neck Capsule ────────────────────────────────────────────────

/// Clearance (cells) between an enemy's edge and the head/neck capsule at or
/// below which the enemy counts as overlapping the lethal zone.
pub const LETHAL_THRESHOLD_CELLS: f32 = 0.35;

/// Outer edge of the proximity band (cells).  Enemies between the lethal
/// threshold and this distance are close calls: they reset their confirmation
/// counter and may shake the camera, but never hit.
pub const PROXIMITY_THRESHOLD_CELLS: f32 = 1.1;

/// Consecutive lethal-overlap ticks required before a contact hit is certified.
///
/// 1 disables the debounce entirely.  3 removes single-frame flicker at 60 Hz
/// while still feeling instant (≈50 ms).
pub const CONFIRMATION_FRAMES: u32 = 3;

/// Minimum spacing between two warning-shake events.
pub const WARNING_SHAKE_COOLDOWN_MS: f32 = 250.0;

/// Invulnerability window granted after a shield absorbs a hit.
pub const SHIELD_INVULNERABILITY_MS: f32 = 1500.0;

/// Shield charges at the start of a run.
pub const STARTING_SHIELDS: u32 = 1;

/// Invulnerability window granted by the phase-shift consumable.
pub const PHASE_SHIFT_DURATION_MS: f32 = 2000.0;

/// Cooldown between two phase-shift activations.
pub const PHASE_SHIFT_COOLDOWN_MS: f32 = 30_000.0;

// ── Damage ────────────────────────────────────────────────────────────────────

/// Crit chance before level scaling and progression bonuses.
pub const BASE_CRIT_CHANCE: f32 = 0.05;

/// Additional crit chance per player level.
pub const CRIT_CHANCE_PER_LEVEL: f32 = 0.005;

/// Damage multiplier applied on a critical hit.
pub const CRIT_MULTIPLIER: f32 = 2.0;

/// Lifetime of the damage flash marker consumed by the renderer.
pub const FLASH_DURATION_MS: f32 = 90.0;

/// Lifetime of a chain-lightning arc record.
pub const LIGHTNING_ARC_MS: f32 = 150.0;

/// Kills must follow each other within this window to keep the combo alive.
pub const COMBO_WINDOW_MS: f32 = 2500.0;

/// Upper bound on the combo damage multiplier.
pub const COMBO_DAMAGE_CAP: f32 = 2.0;

// ── Overclock ─────────────────────────────────────────────────────────────────

/// Length of an overclock window.
pub const OVERCLOCK_ACTIVE_MS: f32 = 5000.0;

/// Recharge time after an overclock window ends.  Deliberately longer than
/// the active window.
pub const OVERCLOCK_COOLDOWN_MS: f32 = 20_000.0;

/// Fire-interval factor applied while overclock is active.
pub const OVERCLOCK_INTERVAL_FACTOR: f32 = 0.5;

// ── Audio ─────────────────────────────────────────────────────────────────────

/// At most one shoot cue per this much simulation time, however many weapons
/// fire on the same tick.
pub const SHOOT_SOUND_THROTTLE_MS: f32 = 100.0;

// ── Projectiles ───────────────────────────────────────────────────────────────

/// Default projectile lifetime when a weapon does not specify one.
pub const PROJECTILE_LIFETIME_MS: f32 = 2000.0;

/// Collision radius of a projectile (px).
pub const PROJECTILE_RADIUS_PX: f32 = 4.0;

/// Projectiles further than this outside the arena rectangle are culled (px).
pub const PROJECTILE_OOB_MARGIN_PX: f32 = 40.0;

/// Maximum steering rate of homing projectiles (rad/s).
pub const HOMING_TURN_RATE: f32 = 6.0;

/// Lifetime of projectiles fired by boss volleys.
pub const BOSS_PROJECTILE_LIFETIME_MS: f32 = 4000.0;

// ── Hazards ───────────────────────────────────────────────────────────────────

/// Delay before a freshly laid mine can trigger.
pub const MINE_ARM_MS: f32 = 400.0;

/// Enemy clearance (cells) that triggers an armed mine.
pub const MINE_TRIGGER_RADIUS_CELLS: f32 = 0.8;

/// Blast radius of a detonating mine (cells).
pub const MINE_BLAST_RADIUS_CELLS: f32 = 2.5;

/// Mines that never trigger fizzle after this long.
pub const MINE_LIFETIME_MS: f32 = 8000.0;

/// Expansion speed of echo shockwaves (cells/s).
pub const SHOCKWAVE_EXPANSION_CELLS: f32 = 14.0;

/// Maximum radius of an echo shockwave (cells).
pub const ECHO_BURST_RADIUS_CELLS: f32 = 5.0;

/// Shockwave damage = echo capacity × this ratio.
pub const ECHO_BURST_DAMAGE_RATIO: f32 = 0.5;

/// Hit-cooldown applied by the melee aura per enemy.
pub const AURA_HIT_COOLDOWN_MS: f32 = 400.0;

// ── Tail Armor ────────────────────────────────────────────────────────────────

/// Starting and maximum tail integrity.
pub const TAIL_INTEGRITY_MAX: f32 = 100.0;

/// Enemy clearance (cells) to the nearest body segment that counts as a block.
pub const TAIL_CONTACT_RADIUS_CELLS: f32 = 0.5;

/// Distance an enemy is shoved back along the contact normal (cells).
pub const TAIL_KNOCKBACK_CELLS: f32 = 1.5;

/// Stun applied to an enemy blocked by the tail.
pub const TAIL_STUN_MS: f32 = 600.0;

/// Minimum time between two tail blocks of the same enemy.
pub const TAIL_HIT_COOLDOWN_MS: f32 = 500.0;

// ── Pickups ───────────────────────────────────────────────────────────────────

/// Largest XP value carried by a single pickup chunk.
pub const PICKUP_CHUNK_VALUE: u32 = 5;

/// Radius (cells) around the head within which the magnet attracts pickups.
pub const MAGNET_RADIUS_CELLS: f32 = 8.0;

/// Speed at which attracted pickups travel toward the head (px/s).
pub const MAGNET_PULL_SPEED_PX: f32 = 420.0;

// ── Boss Engine ───────────────────────────────────────────────────────────────

/// State entered when a state definition has no `next`.
pub const BOSS_DEFAULT_IDLE_STATE: &str = "idle";

/// Upper bound on transition-request intents honoured per boss per tick.
/// Keeps a misconfigured pair of states that request each other from looping.
pub const MAX_FORCED_TRANSITIONS: u32 = 4;

/// Radius (cells) at which orbiting bosses circle the player.
pub const ORBIT_RADIUS_CELLS: f32 = 6.0;

/// Angular speed of orbiting bosses (rad/s).
pub const ORBIT_ANGULAR_SPEED: f32 = 0.8;

/// Per-hop chain limit for chain damage.  Chained hits never chain again.
pub const MAX_CHAIN_HOPS: u8 = 1;

// ── Weapon Tables ─────────────────────────────────────────────────────────────

/// Shared baseline for the per-weapon entries below.
pub const WEAPON_BASE: WeaponStats = WeaponStats {
    damage: 10.0,
    interval_ms: 500.0,
    speed: 18.0,
    range: 10.0,
    count: 1,
    count_per_level: 0,
    spread_deg: 0.0,
    lifetime_ms: 0.0,
    radius: 0.0,
    piercing: false,
    chains: false,
};

pub const CANNON_STATS: WeaponStats = WeaponStats {
    interval_ms: 400.0,
    chains: true,
    ..WEAPON_BASE
};

pub const LANCE_STATS: WeaponStats = WeaponStats {
    damage: 18.0,
    interval_ms: 1200.0,
    speed: 24.0,
    range: 12.0,
    piercing: true,
    ..WEAPON_BASE
};

pub const SHARDS_STATS: WeaponStats = WeaponStats {
    damage: 6.0,
    interval_ms: 900.0,
    speed: 16.0,
    range: 7.0,
    count: 5,
    count_per_level: 1,
    spread_deg: 50.0,
    lifetime_ms: 700.0,
    ..WEAPON_BASE
};

pub const SERPENT_STATS: WeaponStats = WeaponStats {
    damage: 14.0,
    interval_ms: 1500.0,
    speed: 10.0,
    range: 14.0,
    lifetime_ms: 3000.0,
    chains: true,
    ..WEAPON_BASE
};

pub const RAIL_STATS: WeaponStats = WeaponStats {
    damage: 40.0,
    interval_ms: 2500.0,
    speed: 40.0,
    range: 20.0,
    piercing: true,
    ..WEAPON_BASE
};

/// Aura pulses around the head; it never fires a projectile.
pub const AURA_STATS: WeaponStats = WeaponStats {
    damage: 4.0,
    interval_ms: 250.0,
    speed: 0.0,
    range: 0.0,
    radius: 2.5,
    ..WEAPON_BASE
};

pub const MINE_LAYER_STATS: WeaponStats = WeaponStats {
    damage: 30.0,
    interval_ms: 2000.0,
    speed: 0.0,
    range: 0.0,
    ..WEAPON_BASE
};

// ── Enemy Tables ──────────────────────────────────────────────────────────────

pub const ENEMY_BASE: EnemyStats = EnemyStats {
    hp: 20.0,
    radius: 0.4,
    speed: 3.0,
    tail_damage: 10.0,
    xp: 5,
    spawn_ms: 600.0,
};

pub const HUNTER_STATS: EnemyStats = ENEMY_BASE;

pub const INTERCEPTOR_STATS: EnemyStats = EnemyStats {
    hp: 14.0,
    speed: 4.5,
    tail_damage: 8.0,
    ..ENEMY_BASE
};

pub const SHOOTER_STATS: EnemyStats = EnemyStats {
    hp: 26.0,
    speed: 1.5,
    tail_damage: 6.0,
    xp: 8,
    ..ENEMY_BASE
};

pub const DASHER_STATS: EnemyStats = EnemyStats {
    hp: 18.0,
    radius: 0.35,
    speed: 7.0,
    tail_damage: 15.0,
    xp: 7,
    ..ENEMY_BASE
};

/// Bosses appear without a telegraph.
pub const BOSS_STATS: EnemyStats = EnemyStats {
    hp: 1200.0,
    radius: 1.4,
    speed: 2.0,
    tail_damage: 30.0,
    xp: 100,
    spawn_ms: 0.0,
};

pub const BARRIER_STATS: EnemyStats = EnemyStats {
    hp: 60.0,
    radius: 0.5,
    speed: 0.0,
    tail_damage: 20.0,
    xp: 3,
    ..ENEMY_BASE
};

// ── Simulation ────────────────────────────────────────────────────────────────

/// Fixed simulation step used by the plugin (Hz).
pub const TICK_RATE_HZ: f64 = 60.0;
