//! Combat error types and the fatal-to-run failure taxonomy.
//!
//! Two very different things live here:
//!
//! - [`CombatError`] is returned by configuration and boss-catalog loading and
//!   validation.  The per-tick simulation never produces one: missing lookups
//!   at runtime degrade to a no-op for that tick instead.
//! - [`FailureReason`] is not an error in the Rust sense.  It is the terminal
//!   state of a run (wall impact, self-intersection, certified enemy contact,
//!   certified projectile contact) and is surfaced verbatim to the player.
//!
//! ## Usage
//!
//! ```rust
//! use serpent_arena::error::{CombatError, CombatResult};
//!
//! fn require_positive(name: &'static str, value: f32) -> CombatResult<()> {
//!     if value > 0.0 {
//!         Ok(())
//!     } else {
//!         Err(CombatError::UnsafeConstant { name, value, safe_range: "(0.0, ∞)" })
//!     }
//! }
//! assert!(require_positive("cell_size", 20.0).is_ok());
//! ```

use std::fmt;

/// Top-level error enum for configuration and catalog handling.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatError {
    /// A TOML document could not be parsed into the expected structure.
    ConfigParse {
        /// File the text came from (or `"<inline>"`).
        path: String,
        /// Parser message.
        message: String,
    },

    /// A boss was requested with an id that the catalog does not contain.
    UnknownBossConfig { id: String },

    /// A state id referenced by a phase (entry or `next`) does not exist.
    UnknownBossState { boss: String, state: String },

    /// A boss definition has no phases at all.
    EmptyPhaseTable { boss: String },

    /// Phase thresholds must be strictly descending.
    UnorderedPhases { boss: String, index: usize },

    /// A phase threshold is outside `(0, 1]`.
    InvalidThreshold {
        boss: String,
        index: usize,
        value: f32,
    },

    /// Tuning constant is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for CombatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatError::ConfigParse { path, message } => {
                write!(f, "failed to parse {path}: {message}")
            }
            CombatError::UnknownBossConfig { id } => write!(f, "unknown boss config '{id}'"),
            CombatError::UnknownBossState { boss, state } => {
                write!(f, "boss '{boss}' references unknown state '{state}'")
            }
            CombatError::EmptyPhaseTable { boss } => {
                write!(f, "boss '{boss}' has an empty phase table")
            }
            CombatError::UnorderedPhases { boss, index } => write!(
                f,
                "boss '{boss}' phase {index} threshold is not below the previous phase"
            ),
            CombatError::InvalidThreshold { boss, index, value } => write!(
                f,
                "boss '{boss}' phase {index} threshold {value} is outside (0, 1]"
            ),
            CombatError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for CombatError {}

/// Convenience alias: a `Result` using `CombatError` as the error type.
pub type CombatResult<T> = Result<T, CombatError>;

// ── Run termination ───────────────────────────────────────────────────────────

/// Why a run ended.  Each cause has its own player-visible text and a stable
/// machine code for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// Head left the arena or entered a wall cell.
    Wall,
    /// Head ran into the player's own body.
    SelfCollision,
    /// An enemy stayed in the lethal zone for the full confirmation window.
    EnemyContact,
    /// An enemy projectile reached the head/neck capsule.
    ProjectileContact,
}

impl FailureReason {
    /// Stable identifier for analytics and UI lookups.
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::Wall => "WALL",
            FailureReason::SelfCollision => "SELF",
            FailureReason::EnemyContact => "ENEMY_CONTACT",
            FailureReason::ProjectileContact => "PROJECTILE_CONTACT",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::Wall => "Crashed into the wall",
            FailureReason::SelfCollision => "Bit your own tail",
            FailureReason::EnemyContact => "Caught by an enemy",
            FailureReason::ProjectileContact => "Shot down",
        };
        f.write_str(text)
    }
}
