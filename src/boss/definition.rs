//! Boss definitions: phases, state tables and the intents attached to them.
//!
//! Everything here is immutable configuration except [`BossState`], the
//! runtime cursor stored on the boss's enemy record.
//!
//! ## TOML layout (`assets/bosses.toml`)
//!
//! ```toml
//! [[boss]]
//! id = "warden"
//! name = "The Warden"
//! movement = "chase"
//!
//! [[boss.phases]]
//! threshold = 1.0
//! entry = "idle"
//!
//! [[boss.phases.states]]
//! id = "idle"
//! duration_ms = 1500.0
//! next = "slam"
//! on_enter = [{ kind = "lock_camera" }]
//! ```

use crate::constants::BOSS_DEFAULT_IDLE_STATE;
use crate::enemy::EnemyKind;
use crate::error::{CombatError, CombatResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Field effects a boss can impose on the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEffect {
    Slow,
    Magnet,
}

/// Continuous movement pattern, run every tick regardless of the state timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    #[default]
    Chase,
    /// Circle the player at a fixed radius.
    Orbit,
    /// Patrol left and right along the spawn row.
    Sweep,
    Anchored,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HitboxDef {
    pub tag: String,
    /// Offset from the boss (cells), authored facing right.
    #[serde(default)]
    pub offset: [f32; 2],
    /// Width and height (cells).
    pub size: [f32; 2],
    pub damage: f32,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VolleyDef {
    /// Base angle in degrees, authored facing right.  With `track_player`
    /// it is added to the bearing toward the player instead.
    #[serde(default)]
    pub angle_deg: f32,
    /// Cells per second.
    pub speed: f32,
    pub damage: f32,
    pub count: u32,
    #[serde(default)]
    pub spread_deg: f32,
    #[serde(default)]
    pub track_player: bool,
}

/// A declarative effect.  The engine interprets these against the live world.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BossIntent {
    /// Switch to another state of the current phase once the current intent
    /// list has run.
    Transition {
        to: String,
    },
    SpawnHitbox(HitboxDef),
    DespawnHitbox {
        tag: String,
    },
    LockCamera,
    UnlockCamera,
    SpawnMinions {
        enemy: EnemyKind,
        count: u32,
        #[serde(default)]
        offset: [f32; 2],
    },
    ApplyFieldEffect {
        effect: FieldEffect,
        duration_ms: f32,
    },
    ProjectileVolley(VolleyDef),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossStateDef {
    pub id: String,
    pub duration_ms: f32,
    /// `None` falls back to the default idle state.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub on_enter: Vec<BossIntent>,
    #[serde(default)]
    pub on_exit: Vec<BossIntent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossPhaseConfig {
    /// Active once hp ratio is at or below this value.
    pub threshold: f32,
    pub entry: String,
    pub states: Vec<BossStateDef>,
}

impl BossPhaseConfig {
    pub fn state(&self, id: &str) -> Option<&BossStateDef> {
        self.states.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BossConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub movement: MovementPattern,
    /// Ordered by strictly descending threshold.
    pub phases: Vec<BossPhaseConfig>,
}

impl BossConfig {
    /// Highest phase index at or after `current` whose threshold is ≥ `hp_ratio`.
    /// Never returns an index below `current`.
    pub fn select_phase(&self, current: usize, hp_ratio: f32) -> usize {
        self.phases
            .iter()
            .enumerate()
            .skip(current)
            .filter(|(_, phase)| phase.threshold >= hp_ratio)
            .map(|(i, _)| i)
            .last()
            .unwrap_or(current)
    }
}

/// Runtime FSM cursor.  The only mutable boss data.
#[derive(Debug, Clone, PartialEq)]
pub struct BossState {
    pub state_id: String,
    pub timer_ms: f32,
    pub phase: usize,
}

impl BossState {
    pub fn new(entry: String) -> Self {
        Self {
            state_id: entry,
            timer_ms: 0.0,
            phase: 0,
        }
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Every boss the game knows, keyed by id.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
pub struct BossCatalog {
    #[serde(rename = "boss", default)]
    pub bosses: Vec<BossConfig>,
}

impl BossCatalog {
    pub fn get(&self, id: &str) -> Option<&BossConfig> {
        self.bosses.iter().find(|b| b.id == id)
    }

    pub fn from_toml_str(text: &str) -> CombatResult<Self> {
        toml::from_str::<BossCatalog>(text).map_err(|e| CombatError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Check phase ordering and that every referenced state id resolves.
    pub fn validate(&self) -> CombatResult<()> {
        for boss in &self.bosses {
            validate_boss(boss)?;
        }
        Ok(())
    }
}

fn validate_boss(boss: &BossConfig) -> CombatResult<()> {
    if boss.phases.is_empty() {
        return Err(CombatError::EmptyPhaseTable {
            boss: boss.id.clone(),
        });
    }
    let unknown = |state: &str| CombatError::UnknownBossState {
        boss: boss.id.clone(),
        state: state.to_string(),
    };
    let mut previous: Option<f32> = None;
    for (index, phase) in boss.phases.iter().enumerate() {
        if !(phase.threshold > 0.0 && phase.threshold <= 1.0) {
            return Err(CombatError::InvalidThreshold {
                boss: boss.id.clone(),
                index,
                value: phase.threshold,
            });
        }
        if previous.is_some_and(|p| phase.threshold >= p) {
            return Err(CombatError::UnorderedPhases {
                boss: boss.id.clone(),
                index,
            });
        }
        previous = Some(phase.threshold);

        if phase.state(&phase.entry).is_none() {
            return Err(unknown(&phase.entry));
        }
        for state in &phase.states {
            let next = state.next.as_deref().unwrap_or(BOSS_DEFAULT_IDLE_STATE);
            if phase.state(next).is_none() {
                return Err(unknown(next));
            }
            for intent in state.on_enter.iter().chain(&state.on_exit) {
                if let BossIntent::Transition { to } = intent {
                    if phase.state(to).is_none() {
                        return Err(unknown(to));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Startup system: replace the built-in catalog with `assets/bosses.toml`
/// when it exists, parses and validates.
pub fn load_boss_catalog(mut catalog: ResMut<BossCatalog>) {
    let path = "assets/bosses.toml";
    let Ok(contents) = std::fs::read_to_string(path) else {
        info!("No {path} found; using built-in boss catalog");
        return;
    };
    match BossCatalog::from_toml_str(&contents).and_then(|c| c.validate().map(|()| c)) {
        Ok(loaded) => {
            info!("Loaded {} boss definitions from {path}", loaded.bosses.len());
            *catalog = loaded;
        }
        Err(e) => warn!("Rejected {path}: {e}; using built-in boss catalog"),
    }
}

// ── Built-in catalog ──────────────────────────────────────────────────────────

fn state(
    id: &str,
    duration_ms: f32,
    next: Option<&str>,
    on_enter: Vec<BossIntent>,
    on_exit: Vec<BossIntent>,
) -> BossStateDef {
    BossStateDef {
        id: id.to_string(),
        duration_ms,
        next: next.map(str::to_string),
        on_enter,
        on_exit,
    }
}

fn hitbox(tag: &str, offset: [f32; 2], size: [f32; 2], damage: f32, color: &str) -> BossIntent {
    BossIntent::SpawnHitbox(HitboxDef {
        tag: tag.to_string(),
        offset,
        size,
        damage,
        color: color.to_string(),
    })
}

fn despawn(tag: &str) -> BossIntent {
    BossIntent::DespawnHitbox {
        tag: tag.to_string(),
    }
}

fn volley(count: u32, spread_deg: f32, speed: f32, track_player: bool) -> BossIntent {
    BossIntent::ProjectileVolley(VolleyDef {
        angle_deg: 0.0,
        speed,
        damage: 10.0,
        count,
        spread_deg,
        track_player,
    })
}

fn minions(enemy: EnemyKind, count: u32, offset: [f32; 2]) -> BossIntent {
    BossIntent::SpawnMinions {
        enemy,
        count,
        offset,
    }
}

impl Default for BossCatalog {
    fn default() -> Self {
        let warden = BossConfig {
            id: "warden".into(),
            name: "The Warden".into(),
            movement: MovementPattern::Chase,
            phases: vec![
                BossPhaseConfig {
                    threshold: 1.0,
                    entry: "idle".into(),
                    states: vec![
                        state("idle", 1500.0, Some("slam"), vec![], vec![]),
                        state(
                            "slam",
                            800.0,
                            Some("idle"),
                            vec![hitbox("slam", [1.5, 0.0], [2.0, 2.0], 20.0, "#ff5533")],
                            vec![despawn("slam")],
                        ),
                    ],
                },
                BossPhaseConfig {
                    threshold: 0.5,
                    entry: "enrage".into(),
                    states: vec![
                        state(
                            "enrage",
                            600.0,
                            Some("idle"),
                            vec![BossIntent::LockCamera, minions(EnemyKind::Hunter, 3, [0.0, 2.0])],
                            vec![],
                        ),
                        state("idle", 1000.0, Some("volley"), vec![], vec![]),
                        state("volley", 700.0, Some("idle"), vec![volley(8, 360.0, 8.0, false)], vec![]),
                    ],
                },
            ],
        };

        let hydra = BossConfig {
            id: "hydra".into(),
            name: "Hydra".into(),
            movement: MovementPattern::Orbit,
            phases: vec![
                BossPhaseConfig {
                    threshold: 1.0,
                    entry: "idle".into(),
                    states: vec![
                        state("idle", 1200.0, Some("spit"), vec![], vec![]),
                        state("spit", 500.0, Some("idle"), vec![volley(3, 30.0, 10.0, true)], vec![]),
                    ],
                },
                BossPhaseConfig {
                    threshold: 0.6,
                    entry: "split".into(),
                    states: vec![
                        state(
                            "split",
                            400.0,
                            Some("idle"),
                            vec![
                                minions(EnemyKind::Interceptor, 2, [-2.0, 0.0]),
                                BossIntent::ApplyFieldEffect {
                                    effect: FieldEffect::Slow,
                                    duration_ms: 3000.0,
                                },
                            ],
                            vec![],
                        ),
                        state("idle", 900.0, Some("spit"), vec![], vec![]),
                        state("spit", 500.0, Some("idle"), vec![volley(5, 60.0, 10.0, true)], vec![]),
                    ],
                },
                BossPhaseConfig {
                    threshold: 0.25,
                    entry: "frenzy".into(),
                    states: vec![
                        state(
                            "frenzy",
                            300.0,
                            None,
                            vec![
                                BossIntent::ApplyFieldEffect {
                                    effect: FieldEffect::Magnet,
                                    duration_ms: 5000.0,
                                },
                                BossIntent::Transition { to: "spit".into() },
                            ],
                            vec![],
                        ),
                        state("idle", 600.0, Some("spit"), vec![], vec![]),
                        state("spit", 400.0, None, vec![volley(7, 90.0, 12.0, true)], vec![]),
                    ],
                },
            ],
        };

        let overseer = BossConfig {
            id: "overseer".into(),
            name: "The Overseer".into(),
            movement: MovementPattern::Sweep,
            phases: vec![
                BossPhaseConfig {
                    threshold: 1.0,
                    entry: "idle".into(),
                    states: vec![
                        state("idle", 1000.0, Some("beam"), vec![], vec![]),
                        state(
                            "beam",
                            1200.0,
                            None,
                            vec![hitbox("beam", [0.0, 3.5], [1.0, 6.0], 25.0, "#66ccff")],
                            vec![despawn("beam")],
                        ),
                    ],
                },
                BossPhaseConfig {
                    threshold: 0.4,
                    entry: "lockdown".into(),
                    states: vec![
                        state(
                            "lockdown",
                            500.0,
                            Some("idle"),
                            vec![BossIntent::LockCamera, minions(EnemyKind::Barrier, 2, [0.0, -2.0])],
                            vec![BossIntent::UnlockCamera],
                        ),
                        state("idle", 800.0, Some("beam"), vec![], vec![]),
                        state(
                            "beam",
                            1200.0,
                            None,
                            vec![hitbox("beam", [0.0, 3.5], [1.5, 6.0], 30.0, "#66ccff")],
                            vec![despawn("beam")],
                        ),
                    ],
                },
            ],
        };

        Self {
            bosses: vec![warden, hydra, overseer],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = BossCatalog::default();
        assert!(catalog.validate().is_ok());
        assert!(catalog.get("warden").is_some());
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn select_phase_never_goes_back() {
        let catalog = BossCatalog::default();
        let hydra = catalog.get("hydra").unwrap();
        assert_eq!(hydra.select_phase(0, 1.0), 0);
        assert_eq!(hydra.select_phase(0, 0.5), 1);
        assert_eq!(hydra.select_phase(0, 0.1), 2);
        // Healed back to full: stays in phase 2.
        assert_eq!(hydra.select_phase(2, 1.0), 2);
    }

    #[test]
    fn intents_parse_from_toml() {
        let text = r#"
            [[boss]]
            id = "test"
            name = "Test"
            movement = "anchored"

            [[boss.phases]]
            threshold = 1.0
            entry = "idle"

            [[boss.phases.states]]
            id = "idle"
            duration_ms = 100.0
            on_enter = [
                { kind = "spawn_hitbox", tag = "claw", offset = [1.0, 0.0], size = [1.0, 1.0], damage = 5.0 },
                { kind = "spawn_minions", enemy = "dasher", count = 2 },
                { kind = "apply_field_effect", effect = "magnet", duration_ms = 500.0 },
                { kind = "projectile_volley", speed = 5.0, damage = 3.0, count = 4, spread_deg = 90.0 },
                { kind = "lock_camera" },
            ]
            on_exit = [{ kind = "despawn_hitbox", tag = "claw" }]
        "#;
        let catalog = BossCatalog::from_toml_str(text).unwrap();
        assert!(catalog.validate().is_ok());
        let boss = catalog.get("test").unwrap();
        assert_eq!(boss.movement, MovementPattern::Anchored);
        let idle = boss.phases[0].state("idle").unwrap();
        assert_eq!(idle.on_enter.len(), 5);
        assert!(matches!(
            idle.on_enter[1],
            BossIntent::SpawnMinions {
                enemy: EnemyKind::Dasher,
                count: 2,
                ..
            }
        ));
        assert_eq!(idle.on_exit[0], despawn("claw"));
    }

    #[test]
    fn validation_rejects_bad_tables() {
        let mut catalog = BossCatalog::default();
        catalog.bosses[0].phases[1].threshold = 1.0;
        assert!(matches!(
            catalog.validate(),
            Err(CombatError::UnorderedPhases { index: 1, .. })
        ));

        let mut catalog = BossCatalog::default();
        catalog.bosses[0].phases[0].entry = "nowhere".into();
        assert!(matches!(catalog.validate(), Err(CombatError::UnknownBossState { .. })));

        let mut catalog = BossCatalog::default();
        catalog.bosses[0].phases.clear();
        assert!(matches!(catalog.validate(), Err(CombatError::EmptyPhaseTable { .. })));

        let mut catalog = BossCatalog::default();
        catalog.bosses[1].phases[0].threshold = 0.0;
        assert!(matches!(catalog.validate(), Err(CombatError::InvalidThreshold { .. })));
    }
}
