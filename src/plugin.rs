//! Bevy integration: resources, startup loading and the fixed-step schedule.
//!
//! ```text
//! Startup      load_combat_config → load_boss_catalog → init_combat_world
//! FixedUpdate  steer_enemies → combat_tick          (while the run is live)
//!              prune_removed_enemies → forward_combat_events
//! ```

use crate::boss::{load_boss_catalog, BossCatalog};
use crate::config::{load_combat_config, CombatConfig};
use crate::constants::TICK_RATE_HZ;
use crate::events::CombatEvent;
use crate::services::Services;
use crate::world::CombatWorld;
use bevy::prelude::*;
use std::sync::Arc;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .init_resource::<BossCatalog>()
            .add_message::<CombatEvent>()
            .insert_resource(Time::<Fixed>::from_hz(TICK_RATE_HZ))
            .add_systems(
                Startup,
                (load_combat_config, load_boss_catalog, init_combat_world).chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    (steer_enemies_system, combat_tick_system)
                        .chain()
                        .run_if(run_in_progress),
                    prune_removed_enemies_system,
                    forward_combat_events_system,
                )
                    .chain(),
            );
    }
}

/// Build the world from the loaded config and catalog, unless one was
/// inserted up front (tests and scripted scenarios do this).
pub fn init_combat_world(
    mut commands: Commands,
    existing: Option<Res<CombatWorld>>,
    config: Res<CombatConfig>,
    catalog: Res<BossCatalog>,
) {
    if existing.is_some() {
        return;
    }
    let services = Services::from_config(&config);
    commands.insert_resource(CombatWorld::new(
        config.clone(),
        Arc::new(catalog.clone()),
        services,
    ));
    info!(
        "Combat world ready: {}x{} arena, {} boss definitions",
        config.arena_width,
        config.arena_height,
        catalog.bosses.len()
    );
}

pub fn run_in_progress(world: Option<Res<CombatWorld>>) -> bool {
    world.is_some_and(|w| w.is_running())
}

fn fixed_dt_ms(time: &Time<Fixed>) -> f32 {
    time.timestep().as_secs_f32() * 1000.0
}

pub fn steer_enemies_system(mut world: ResMut<CombatWorld>, time: Res<Time<Fixed>>) {
    world.steer_enemies(fixed_dt_ms(&time));
}

pub fn combat_tick_system(mut world: ResMut<CombatWorld>, time: Res<Time<Fixed>>) {
    world.simulate_tick(fixed_dt_ms(&time));
}

pub fn prune_removed_enemies_system(world: Option<ResMut<CombatWorld>>) {
    let Some(mut world) = world else {
        return;
    };
    let pruned = world.prune_removed_enemies();
    if pruned > 0 {
        trace!("Pruned {pruned} removed enemies");
    }
}

/// Hand queued FX/audio records to the rest of the app as messages.
pub fn forward_combat_events_system(
    world: Option<ResMut<CombatWorld>>,
    mut writer: MessageWriter<CombatEvent>,
) {
    let Some(mut world) = world else {
        return;
    };
    for event in world.drain_events() {
        writer.write(event);
    }
}
