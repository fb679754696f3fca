//! Headless tests for [`CombatPlugin`].
//!
//! These tests use [`MinimalPlugins`] (no window, no rendering) and run the
//! `FixedUpdate` schedule by hand so every test controls exactly how many
//! simulation ticks happen.
//!
//! Covered scenarios:
//! 1. Startup loads `assets/*.toml` and builds the world.
//! 2. A world inserted before startup is kept.
//! 3. One `FixedUpdate` advances the clock by one fixed step.
//! 4. Queued combat events are forwarded as messages.
//! 5. Once the run has ended, `FixedUpdate` no longer ticks the world.
//! 6. Removed enemies are pruned after the tick.

use bevy::prelude::*;
use serpent_arena::boss::BossCatalog;
use serpent_arena::combat::{try_step, StepOutcome};
use serpent_arena::config::CombatConfig;
use serpent_arena::enemy::EnemyKind;
use serpent_arena::error::FailureReason;
use serpent_arena::events::CombatEvent;
use serpent_arena::plugin::CombatPlugin;
use serpent_arena::world::CombatWorld;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Minimal headless app with the combat plugin, after the Startup schedule.
fn started_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, CombatPlugin));
    app.update();
    app
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn combat_world(app: &mut App) -> Mut<'_, CombatWorld> {
    app.world_mut().resource_mut::<CombatWorld>()
}

fn forwarded(app: &App) -> Vec<CombatEvent> {
    let messages = app.world().resource::<Messages<CombatEvent>>();
    let mut cursor = messages.get_cursor();
    cursor.read(messages).cloned().collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// The shipped asset files parse, validate and match the built-in defaults.
#[test]
fn startup_loads_assets_and_builds_world() {
    let app = started_app();
    assert!(app.world().contains_resource::<CombatWorld>());
    assert_eq!(
        *app.world().resource::<CombatConfig>(),
        CombatConfig::default()
    );
    let catalog = app.world().resource::<BossCatalog>();
    assert_eq!(*catalog, BossCatalog::default());
    assert!(catalog.validate().is_ok());
}

/// Tests and scripted runs insert their own world; startup must not replace it.
#[test]
fn pre_inserted_world_survives_startup() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, CombatPlugin));
    let mut world = CombatWorld::default().with_seed(42);
    world.kills = 42;
    app.insert_resource(world);
    app.update();
    assert_eq!(app.world().resource::<CombatWorld>().kills, 42);
}

#[test]
fn fixed_update_advances_one_step() {
    let mut app = started_app();
    let before = app.world().resource::<CombatWorld>().clock_ms;
    tick(&mut app);
    let after = app.world().resource::<CombatWorld>().clock_ms;
    assert!((after - before - 1000.0 / 60.0).abs() < 1e-3);
}

#[test]
fn boss_events_are_forwarded_as_messages() {
    let mut app = started_app();
    let id = combat_world(&mut app)
        .spawn_boss("warden", Vec2::new(24.0, 4.0))
        .unwrap();
    tick(&mut app);

    let events = forwarded(&app);
    assert!(events.contains(&CombatEvent::BossSpawned {
        id,
        config_id: "warden".into()
    }));
    assert!(app.world().resource::<CombatWorld>().events.is_empty());
}

#[test]
fn ended_run_stops_ticking() {
    let mut app = started_app();
    {
        let mut world = combat_world(&mut app);
        world.player.shields = 0;
        let outcome = try_step(&mut world, Vec2::new(-1.0, 0.0), false);
        assert_eq!(outcome, StepOutcome::Ended(FailureReason::Wall));
    }
    let clock = app.world().resource::<CombatWorld>().clock_ms;
    for _ in 0..5 {
        tick(&mut app);
    }
    assert_eq!(app.world().resource::<CombatWorld>().clock_ms, clock);
    assert!(forwarded(&app).contains(&CombatEvent::RunEnded {
        reason: FailureReason::Wall
    }));
}

#[test]
fn dead_enemies_are_pruned_after_the_tick() {
    let mut app = started_app();
    {
        let mut world = combat_world(&mut app);
        let id = world.spawn_enemy(EnemyKind::Barrier, Vec2::new(2.0, 2.0));
        let idx = world.enemy_index(id).unwrap();
        world.enemies[idx].mark_removed();
    }
    tick(&mut app);
    assert!(app.world().resource::<CombatWorld>().enemies.is_empty());
}
