//! Combat module: weapons, projectiles and hazards, contact resolution and
//! the damage pipeline.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | Projectile, hazard, hitbox and pickup records; weapon loadout; overclock, combo and power-up timers; grid scale |
//! | [`weapons`] | Per-slot fire accumulators, targeting, aura pulses, mine laying |
//! | [`projectiles`] | Projectile integration and enemy hits; mines, shockwaves, arcs, pickups |
//! | [`collision`] | Move-time wall/self checks; tail armor, confirmation counters, projectile contact |
//! | [`damage`] | Crits, echo pool, chain hops, death and rewards |
//!
//! All functions take the [`crate::world::CombatWorld`] by `&mut` and are
//! called in a fixed order from [`crate::world::CombatWorld::simulate_tick`].

pub mod collision;
pub mod damage;
pub mod projectiles;
pub mod state;
pub mod weapons;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use collision::{resolve_contacts, try_step, StepOutcome};
pub use damage::{damage_enemy, DamageReport, DamageSource, Hit};
pub use projectiles::update_projectiles;
pub use state::{
    ComboState, GridScale, Hitbox, LightningArc, Mine, OverclockState, Owner, Pickup,
    PowerUpState, Projectile, ProjectileKind, Shockwave, WeaponKind, WeaponLoadout, WeaponSlot,
};
pub use weapons::{fire_interval, update_weapons};
