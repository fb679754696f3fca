//! The combat world: every piece of mutable state for one run, and the
//! per-tick pipeline that drives it.
//!
//! ## Tick order
//!
//! ```text
//! simulate_tick(dt)
//!   ├─ timers      clock, player defences, overclock, combo, enemy status
//!   ├─ weapons     accumulators fire projectiles / pulse the aura / lay mines
//!   ├─ projectiles integrate, collide with enemies, advance hazards
//!   ├─ contacts    tail armor, confirmation counters, enemy projectiles
//!   └─ bosses      one `advance` per active boss
//! ```
//!
//! The order is load-bearing: a projectile spawned this tick is resolved
//! before the contact pass, and the boss engine always sees the settled
//! result of the tick's damage.  Dead enemies are only flagged here; the
//! physical prune runs after the tick ([`CombatWorld::prune_removed_enemies`]).

use crate::boss::{self, BossCatalog, BossRuntime, BossState};
use crate::combat::{
    self, ComboState, GridScale, Hitbox, LightningArc, Mine, OverclockState, Pickup,
    PowerUpState, Projectile, Shockwave, WeaponLoadout,
};
use crate::config::CombatConfig;
use crate::enemy::{Enemy, EnemyKind, EntityId};
use crate::error::{CombatError, CombatResult, FailureReason};
use crate::events::CombatEvent;
use crate::player::PlayerState;
use crate::services::Services;
use crate::stats::{CharacterTraits, CombatModifiers};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Length of the player body at the start of a run.
const STARTING_BODY_LEN: usize = 4;

#[derive(Resource)]
pub struct CombatWorld {
    pub config: CombatConfig,
    pub catalog: Arc<BossCatalog>,
    pub services: Services,
    pub modifiers: CombatModifiers,
    pub traits: CharacterTraits,
    pub scale: GridScale,
    /// Interior wall cells.
    pub walls: HashSet<IVec2>,
    pub stage: u32,

    pub player: PlayerState,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub mines: Vec<Mine>,
    pub shockwaves: Vec<Shockwave>,
    pub arcs: Vec<LightningArc>,
    pub pickups: Vec<Pickup>,
    pub hitboxes: Vec<Hitbox>,

    pub loadout: WeaponLoadout,
    pub overclock: OverclockState,
    pub powerups: PowerUpState,
    pub combo: ComboState,
    /// Stored damage for the echo mechanic.
    pub echo_pool: f32,
    pub kills: u32,
    pub boss_active: bool,
    pub boss_defeated: bool,
    pub camera_locked: bool,
    /// Enemy id → consecutive lethal-overlap ticks.
    pub contact_counters: HashMap<EntityId, u32>,

    pub events: Vec<CombatEvent>,
    pub rng: StdRng,
    pub clock_ms: f64,
    pub(crate) last_shoot_cue_ms: Option<f64>,
    next_id: EntityId,
    outcome: Option<FailureReason>,
}

impl Default for CombatWorld {
    fn default() -> Self {
        let config = CombatConfig::default();
        let services = Services::from_config(&config);
        Self::new(config, Arc::new(BossCatalog::default()), services)
    }
}

impl CombatWorld {
    pub fn new(config: CombatConfig, catalog: Arc<BossCatalog>, services: Services) -> Self {
        let traits = CharacterTraits::default();
        let player = starting_player(&config, &traits);
        Self {
            scale: GridScale {
                cell_size: config.cell_size,
            },
            config,
            catalog,
            services,
            modifiers: CombatModifiers::default(),
            traits,
            walls: HashSet::new(),
            stage: 1,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            mines: Vec::new(),
            shockwaves: Vec::new(),
            arcs: Vec::new(),
            pickups: Vec::new(),
            hitboxes: Vec::new(),
            loadout: WeaponLoadout::default(),
            overclock: OverclockState::default(),
            powerups: PowerUpState::default(),
            combo: ComboState::default(),
            echo_pool: 0.0,
            kills: 0,
            boss_active: false,
            boss_defeated: false,
            camera_locked: false,
            contact_counters: HashMap::new(),
            events: Vec::new(),
            rng: StdRng::from_entropy(),
            clock_ms: 0.0,
            last_shoot_cue_ms: None,
            next_id: 1,
            outcome: None,
        }
    }

    /// Replace the RNG with a seeded one so rolls are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Install character traits and rebuild the player defences from them.
    pub fn with_traits(mut self, traits: CharacterTraits) -> Self {
        self.traits = traits;
        self.player = starting_player(&self.config, &self.traits);
        self
    }

    // ── Lifecycle boundaries ──────────────────────────────────────────────────

    /// New-run boundary: everything back to its starting value.
    pub fn reset_run(&mut self) {
        self.clear_field();
        self.player = starting_player(&self.config, &self.traits);
        self.loadout.reset_timers();
        self.overclock = OverclockState::default();
        self.powerups = PowerUpState::default();
        self.combo = ComboState::default();
        self.echo_pool = 0.0;
        self.kills = 0;
        self.stage = 1;
        self.events.clear();
        self.clock_ms = 0.0;
        self.last_shoot_cue_ms = None;
        self.outcome = None;
        info!("Combat run reset");
    }

    /// New-stage boundary: the field is cleared, progression is kept.
    pub fn reset_stage(&mut self) {
        self.clear_field();
        self.loadout.reset_timers();
        self.stage += 1;
        debug!("Entering stage {}", self.stage);
    }

    fn clear_field(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.mines.clear();
        self.shockwaves.clear();
        self.arcs.clear();
        self.pickups.clear();
        self.hitboxes.clear();
        self.contact_counters.clear();
        self.boss_active = false;
        self.boss_defeated = false;
        self.camera_locked = false;
    }

    // ── Spawning ──────────────────────────────────────────────────────────────

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create an enemy through the spawn service.  It starts telegraphing
    /// unless its archetype has no spawn delay.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, grid_pos: Vec2) -> EntityId {
        let template = self.services.spawner.enemy_template(kind, self.stage);
        let id = self.next_id();
        let mut enemy = Enemy::new(
            id,
            kind,
            grid_pos,
            template.hp,
            template.radius,
            template.speed,
        );
        enemy.spawn_timer_ms = template.spawn_ms;
        if template.spawn_ms <= 0.0 {
            enemy.activate();
        }
        self.enemies.push(enemy);
        id
    }

    /// Spawn a boss running `config_id`, already active and in its entry state.
    pub fn spawn_boss(&mut self, config_id: &str, grid_pos: Vec2) -> CombatResult<EntityId> {
        let catalog = Arc::clone(&self.catalog);
        let config = catalog
            .get(config_id)
            .ok_or_else(|| CombatError::UnknownBossConfig {
                id: config_id.to_string(),
            })?;
        let entry = config
            .phases
            .first()
            .ok_or_else(|| CombatError::EmptyPhaseTable {
                boss: config_id.to_string(),
            })?
            .entry
            .clone();
        let id = self.spawn_enemy(EnemyKind::Boss, grid_pos);
        let idx = self.enemies.len() - 1;
        let enemy = &mut self.enemies[idx];
        enemy.activate();
        enemy.boss = Some(BossRuntime {
            config_id: config_id.to_string(),
            state: BossState::new(entry),
            facing: 1.0,
            sweep_dir: 1.0,
        });
        self.boss_active = true;
        self.boss_defeated = false;
        self.emit(CombatEvent::BossSpawned {
            id,
            config_id: config_id.to_string(),
        });
        info!("Boss '{}' spawned as #{id}", config.name);
        boss::enter_initial_state(self, idx);
        Ok(id)
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    /// Advance the simulation by `dt_ms`.  Does nothing once the run has ended.
    pub fn simulate_tick(&mut self, dt_ms: f32) {
        if !self.is_running() {
            return;
        }
        self.clock_ms += dt_ms as f64;
        self.player.tick(dt_ms);
        self.overclock
            .tick(dt_ms, self.config.overclock_cooldown_ms);
        self.combo.tick(dt_ms);
        for enemy in &mut self.enemies {
            enemy.tick_status(dt_ms);
        }

        combat::update_weapons(self, dt_ms);
        combat::update_projectiles(self, dt_ms);
        combat::resolve_contacts(self);
        if self.is_running() {
            boss::run_bosses(self, dt_ms);
        }
    }

    /// Move ordinary enemies toward the head.  Stand-in for the game's enemy
    /// AI; bosses are moved by the boss engine instead.
    pub fn steer_enemies(&mut self, dt_ms: f32) {
        let head = self.player.head();
        let dt = dt_ms / 1000.0;
        for enemy in &mut self.enemies {
            if !enemy.is_active() || enemy.is_boss() || enemy.is_stunned() {
                continue;
            }
            let to_head = (head - enemy.position).normalize_or_zero();
            enemy.velocity = to_head * enemy.speed;
            enemy.position += enemy.velocity * dt;
        }
    }

    /// End-of-frame cleanup: physically drop enemies flagged removed.
    pub fn prune_removed_enemies(&mut self) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| !e.is_removed());
        before - self.enemies.len()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn run_outcome(&self) -> Option<FailureReason> {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn try_activate_overclock(&mut self) -> bool {
        self.overclock
            .try_activate(self.config.overclock_active_ms)
    }

    // ── Events ────────────────────────────────────────────────────────────────

    pub fn emit(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Terminal transition.  The first reason wins.
    pub(crate) fn end_run(&mut self, reason: FailureReason) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(reason);
        info!("Run ended: {reason} ({})", reason.code());
        self.emit(CombatEvent::RunEnded { reason });
    }
}

fn starting_player(config: &CombatConfig, traits: &CharacterTraits) -> PlayerState {
    let head = Vec2::new(
        (config.arena_width / 2) as f32,
        (config.arena_height / 2) as f32,
    );
    PlayerState::new(
        PlayerState::straight(head, STARTING_BODY_LEN),
        config.starting_shields,
        traits.phase_shift_charges,
        traits.tail_integrity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_enemy_uses_template_and_telegraphs() {
        let mut world = CombatWorld::default().with_seed(1);
        let id = world.spawn_enemy(EnemyKind::Hunter, Vec2::new(3.0, 3.0));
        let enemy = world.enemy(id).unwrap();
        assert_eq!(enemy.hp, world.config.enemies.hunter.hp);
        assert!(!enemy.is_active(), "hunters telegraph before becoming active");
    }

    #[test]
    fn spawn_boss_rejects_unknown_config() {
        let mut world = CombatWorld::default().with_seed(1);
        assert_eq!(
            world.spawn_boss("no-such-boss", Vec2::ZERO),
            Err(CombatError::UnknownBossConfig {
                id: "no-such-boss".into()
            })
        );
        assert!(!world.boss_active);
        assert!(world.enemies.is_empty());
    }

    #[test]
    fn reset_stage_keeps_progression() {
        let mut world = CombatWorld::default().with_seed(1);
        world.kills = 7;
        world.player.level = 3;
        world.spawn_enemy(EnemyKind::Hunter, Vec2::ZERO);
        world.reset_stage();
        assert!(world.enemies.is_empty());
        assert_eq!(world.kills, 7);
        assert_eq!(world.player.level, 3);
        assert_eq!(world.stage, 2);

        world.reset_run();
        assert_eq!(world.kills, 0);
        assert_eq!(world.player.level, 1);
        assert_eq!(world.stage, 1);
    }

    #[test]
    fn ended_run_ignores_further_ticks() {
        let mut world = CombatWorld::default().with_seed(1);
        world.end_run(FailureReason::Wall);
        world.end_run(FailureReason::SelfCollision);
        assert_eq!(world.run_outcome(), Some(FailureReason::Wall));
        world.simulate_tick(16.0);
        assert_eq!(world.clock_ms, 0.0);
        let ended: Vec<_> = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::RunEnded { .. }))
            .collect();
        assert_eq!(ended.len(), 1);
    }

    #[test]
    fn prune_drops_only_removed_enemies() {
        let mut world = CombatWorld::default().with_seed(1);
        let a = world.spawn_enemy(EnemyKind::Hunter, Vec2::ZERO);
        world.spawn_enemy(EnemyKind::Hunter, Vec2::ONE);
        let idx = world.enemy_index(a).unwrap();
        world.enemies[idx].mark_removed();
        assert_eq!(world.prune_removed_enemies(), 1);
        assert_eq!(world.enemies.len(), 1);
    }
}
