//! Serpent Arena combat core.
//!
//! A deterministic, tick-driven simulation of the fights in a grid-based
//! serpent arena: weapons and their projectiles, proximity mines and echo
//! shockwaves, the contact resolver that decides when the serpent dies, the
//! damage pipeline (crits, chain lightning, echo, rewards) and a data-driven
//! boss state machine.
//!
//! [`world::CombatWorld`] owns all mutable state for a run and is usable on
//! its own; [`plugin::CombatPlugin`] wires it into a Bevy app on the fixed
//! timestep.

pub mod boss;
pub mod combat;
pub mod config;
pub mod constants;
pub mod enemy;
pub mod error;
pub mod events;
pub mod geometry;
pub mod player;
pub mod plugin;
pub mod services;
pub mod stats;
pub mod world;
