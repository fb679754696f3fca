//! Records owned by the combat world: projectiles, hazards, boss hitboxes,
//! pickups, the weapon loadout and the small timed toggles around them.
//!
//! Positions of everything in this module are **world** coordinates (px);
//! [`GridScale`] converts from the grid coordinates enemies and the player
//! body use.

use crate::enemy::EntityId;
use bevy::prelude::*;
use std::collections::HashSet;

// ── Units ─────────────────────────────────────────────────────────────────────

/// Grid ↔ world conversion supplied by the arena layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridScale {
    pub cell_size: f32,
}

impl GridScale {
    /// World position of a grid coordinate (cell centres map to `+0.5`).
    pub fn to_world(&self, grid: Vec2) -> Vec2 {
        (grid + Vec2::splat(0.5)) * self.cell_size
    }

    pub fn to_grid(&self, world: Vec2) -> Vec2 {
        world / self.cell_size - Vec2::splat(0.5)
    }

    /// Grid distance or speed → world units.
    pub fn cells(&self, cells: f32) -> f32 {
        cells * self.cell_size
    }
}

// ── Weapons ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponKind {
    Cannon,
    Lance,
    Shards,
    Serpent,
    Rail,
    Aura,
    MineLayer,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 7] = [
        WeaponKind::Cannon,
        WeaponKind::Lance,
        WeaponKind::Shards,
        WeaponKind::Serpent,
        WeaponKind::Rail,
        WeaponKind::Aura,
        WeaponKind::MineLayer,
    ];

    /// Weapons that look for a target before firing.  Area weapons do not.
    pub fn is_targeted(self) -> bool {
        !matches!(self, WeaponKind::Aura | WeaponKind::MineLayer)
    }

    pub fn projectile_kind(self) -> ProjectileKind {
        match self {
            WeaponKind::Lance => ProjectileKind::PiercingLance,
            WeaponKind::Shards => ProjectileKind::Shard,
            WeaponKind::Serpent => ProjectileKind::HomingSerpent,
            WeaponKind::Rail => ProjectileKind::Rail,
            _ => ProjectileKind::Standard,
        }
    }
}

/// One equipped weapon and its fire accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSlot {
    pub kind: WeaponKind,
    pub level: u32,
    pub timer_ms: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponLoadout {
    pub slots: Vec<WeaponSlot>,
}

impl Default for WeaponLoadout {
    fn default() -> Self {
        Self {
            slots: vec![WeaponSlot {
                kind: WeaponKind::Cannon,
                level: 1,
                timer_ms: 0.0,
            }],
        }
    }
}

impl WeaponLoadout {
    /// Equip `kind`, or level it up when already equipped.
    pub fn equip(&mut self, kind: WeaponKind) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.kind == kind) {
            slot.level += 1;
            return;
        }
        self.slots.push(WeaponSlot {
            kind,
            level: 1,
            timer_ms: 0.0,
        });
    }

    pub fn slot(&self, kind: WeaponKind) -> Option<&WeaponSlot> {
        self.slots.iter().find(|s| s.kind == kind)
    }

    pub fn reset_timers(&mut self) {
        for slot in &mut self.slots {
            slot.timer_ms = 0.0;
        }
    }
}

/// Global fire-rate toggle: a short active window followed by a longer
/// cooldown.  Independent of the weapon accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OverclockState {
    #[default]
    Ready,
    Active {
        remaining_ms: f32,
    },
    Cooling {
        remaining_ms: f32,
    },
}

impl OverclockState {
    pub fn is_active(&self) -> bool {
        matches!(self, OverclockState::Active { .. })
    }

    /// Start an active window.  Only succeeds from `Ready`.
    pub fn try_activate(&mut self, active_ms: f32) -> bool {
        if *self != OverclockState::Ready {
            return false;
        }
        *self = OverclockState::Active {
            remaining_ms: active_ms,
        };
        true
    }

    pub fn tick(&mut self, dt_ms: f32, cooldown_ms: f32) {
        *self = match *self {
            OverclockState::Ready => OverclockState::Ready,
            OverclockState::Active { remaining_ms } if remaining_ms - dt_ms > 0.0 => {
                OverclockState::Active {
                    remaining_ms: remaining_ms - dt_ms,
                }
            }
            OverclockState::Active { .. } => OverclockState::Cooling {
                remaining_ms: cooldown_ms,
            },
            OverclockState::Cooling { remaining_ms } if remaining_ms - dt_ms > 0.0 => {
                OverclockState::Cooling {
                    remaining_ms: remaining_ms - dt_ms,
                }
            }
            OverclockState::Cooling { .. } => OverclockState::Ready,
        };
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    Standard,
    PiercingLance,
    Shard,
    Rail,
    HomingSerpent,
    BossProjectile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub owner: Owner,
    /// Weapon that fired it; `None` for boss volleys and reflected shots.
    pub source: Option<WeaponKind>,
    pub position: Vec2,
    /// px/s.
    pub velocity: Vec2,
    pub damage: f32,
    pub radius: f32,
    /// Present for piercing projectiles: ids already damaged.
    pub piercing: Option<HashSet<EntityId>>,
    pub homing_target: Option<EntityId>,
    pub life_ms: Option<f32>,
    pub removed: bool,
}

impl Projectile {
    pub fn can_hit(&self, target: EntityId) -> bool {
        if self.removed {
            return false;
        }
        match &self.piercing {
            Some(hit) => !hit.contains(&target),
            None => true,
        }
    }

    /// Record a damaging contact.  A non-piercing projectile is spent.
    pub fn register_hit(&mut self, target: EntityId) {
        match &mut self.piercing {
            Some(hit) => {
                hit.insert(target);
            }
            None => self.removed = true,
        }
    }
}

// ── Hazards ───────────────────────────────────────────────────────────────────

/// Proximity mine laid at the tail.
#[derive(Debug, Clone, PartialEq)]
pub struct Mine {
    pub id: EntityId,
    pub position: Vec2,
    pub damage: f32,
    pub arm_ms: f32,
    pub life_ms: f32,
    pub detonated: bool,
}

impl Mine {
    pub fn is_armed(&self) -> bool {
        self.arm_ms <= 0.0
    }
}

/// Expanding ring released when the echo pool overflows.
#[derive(Debug, Clone, PartialEq)]
pub struct Shockwave {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    /// px/s.
    pub expansion: f32,
    pub damage: f32,
    /// Enemies already damaged by this wave.
    pub hit: HashSet<EntityId>,
}

impl Shockwave {
    pub fn is_done(&self) -> bool {
        self.radius >= self.max_radius
    }
}

/// Visual record of a chain-lightning hop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningArc {
    pub from: Vec2,
    pub to: Vec2,
    pub ttl_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub id: EntityId,
    pub position: Vec2,
    pub value: u32,
    /// Set by a magnet pull; attracted pickups drift toward the head.
    pub attracted: bool,
}

/// Boss melee/area hazard.  Lives until despawned by tag or by the boss's death.
#[derive(Debug, Clone, PartialEq)]
pub struct Hitbox {
    /// `"{owner}:{tag}"`.
    pub id: String,
    pub owner: EntityId,
    pub tag: String,
    /// Offset from the boss in cells, authored facing right.
    pub local_offset: Vec2,
    pub position: Vec2,
    /// Width and height (px).
    pub size: Vec2,
    pub damage: f32,
    pub color: String,
}

impl Hitbox {
    pub fn composite_id(owner: EntityId, tag: &str) -> String {
        format!("{owner}:{tag}")
    }
}

// ── Timed state ───────────────────────────────────────────────────────────────

/// Field effects written by boss intents, as absolute clock expiries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerUpState {
    pub slow_until_ms: f64,
    pub magnet_until_ms: f64,
}

impl PowerUpState {
    pub fn slow_active(&self, now_ms: f64) -> bool {
        now_ms < self.slow_until_ms
    }

    pub fn magnet_active(&self, now_ms: f64) -> bool {
        now_ms < self.magnet_until_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComboState {
    pub count: u32,
    pub window_ms: f32,
}

impl ComboState {
    pub fn register_kill(&mut self, window_ms: f32) {
        self.count += 1;
        self.window_ms = window_ms;
    }

    pub fn tick(&mut self, dt_ms: f32) {
        if self.count == 0 {
            return;
        }
        self.window_ms -= dt_ms;
        if self.window_ms <= 0.0 {
            self.count = 0;
            self.window_ms = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_scale_maps_cell_centres() {
        let scale = GridScale { cell_size: 20.0 };
        assert_eq!(scale.to_world(Vec2::new(0.0, 0.0)), Vec2::new(10.0, 10.0));
        assert_eq!(scale.to_grid(Vec2::new(50.0, 30.0)), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn overclock_cycles_through_cooldown() {
        let mut oc = OverclockState::default();
        assert!(oc.try_activate(100.0));
        assert!(!oc.try_activate(100.0));
        oc.tick(60.0, 500.0);
        assert!(oc.is_active());
        oc.tick(60.0, 500.0);
        assert_eq!(oc, OverclockState::Cooling { remaining_ms: 500.0 });
        assert!(!oc.try_activate(100.0));
        oc.tick(500.0, 500.0);
        assert_eq!(oc, OverclockState::Ready);
    }

    #[test]
    fn piercing_projectile_tracks_hits() {
        let mut p = Projectile {
            id: 1,
            kind: ProjectileKind::PiercingLance,
            owner: Owner::Player,
            source: Some(WeaponKind::Lance),
            position: Vec2::ZERO,
            velocity: Vec2::X,
            damage: 1.0,
            radius: 1.0,
            piercing: Some(HashSet::new()),
            homing_target: None,
            life_ms: None,
            removed: false,
        };
        assert!(p.can_hit(7));
        p.register_hit(7);
        assert!(!p.can_hit(7));
        assert!(p.can_hit(8));
        assert!(!p.removed);

        p.piercing = None;
        p.register_hit(8);
        assert!(p.removed);
        assert!(!p.can_hit(9));
    }

    #[test]
    fn combo_lapses_after_window() {
        let mut combo = ComboState::default();
        combo.register_kill(100.0);
        combo.register_kill(100.0);
        combo.tick(50.0);
        assert_eq!(combo.count, 2);
        combo.tick(60.0);
        assert_eq!(combo.count, 0);
    }

    #[test]
    fn equip_levels_existing_weapon() {
        let mut loadout = WeaponLoadout::default();
        loadout.equip(WeaponKind::Cannon);
        loadout.equip(WeaponKind::Aura);
        assert_eq!(loadout.slots.len(), 2);
        assert_eq!(loadout.slot(WeaponKind::Cannon).map(|s| s.level), Some(2));
    }
}
