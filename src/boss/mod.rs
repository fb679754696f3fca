//! Boss encounters: data-driven definitions and the engine that runs them.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`definition`] | Phases, states, intents, the catalog and its loader |
//! | [`engine`] | Per-tick state machine and intent interpreter |
//! | [`movement`] | Continuous movement patterns and hitbox anchoring |

pub mod definition;
pub mod engine;
pub mod movement;

pub use crate::enemy::BossRuntime;
pub use definition::{
    load_boss_catalog, BossCatalog, BossConfig, BossIntent, BossPhaseConfig, BossState,
    BossStateDef, FieldEffect, HitboxDef, MovementPattern, VolleyDef,
};
pub use engine::{advance, enter_initial_state, execute_intents, run_bosses};
pub use movement::{hitboxes_of, steer_boss};
