use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use rand::Rng;
use serpent_arena::combat::{try_step, StepOutcome, WeaponKind};
use serpent_arena::enemy::EnemyKind;
use serpent_arena::plugin::{combat_tick_system, init_combat_world, CombatPlugin};
use serpent_arena::world::CombatWorld;
use std::env;
use std::time::Duration;

/// Headless scenario selected by `SERPENT_SCENARIO`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    /// Waves of ordinary enemies against a fully equipped serpent.
    Swarm,
    /// A single boss fight.
    Boss,
}

impl Scenario {
    fn from_env() -> Self {
        match env::var("SERPENT_SCENARIO").ok().as_deref() {
            Some("boss") => Scenario::Boss,
            // Logging is not up yet; unknown names fall back silently.
            _ => Scenario::Swarm,
        }
    }
}

#[derive(Resource)]
struct DemoConfig {
    frame_limit: u32,
    frame_count: u32,
}

/// Steers the serpent one cell at a time, turning away from walls and its own body.
#[derive(Resource)]
struct Autopilot {
    direction: IVec2,
    step_ms: f32,
    accumulator_ms: f32,
    spawn_ms: f32,
    spawn_accumulator_ms: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            direction: IVec2::X,
            step_ms: 150.0,
            accumulator_ms: 0.0,
            spawn_ms: 1200.0,
            spawn_accumulator_ms: 0.0,
        }
    }
}

fn setup_scenario(scenario: Res<Scenario>, mut world: ResMut<CombatWorld>) {
    let centre = world.player.head();
    match *scenario {
        Scenario::Swarm => {
            for kind in [WeaponKind::Shards, WeaponKind::Aura, WeaponKind::MineLayer] {
                world.loadout.equip(kind);
            }
        }
        Scenario::Boss => {
            for kind in [WeaponKind::Lance, WeaponKind::Serpent, WeaponKind::Rail] {
                world.loadout.equip(kind);
            }
            let spot = Vec2::new(centre.x + 8.0, centre.y - 6.0);
            if let Err(err) = world.spawn_boss("warden", spot) {
                warn!("Boss scenario could not start: {err}");
            }
        }
    }
    info!("Scenario {:?} ready", *scenario);
}

fn autopilot_system(
    mut pilot: ResMut<Autopilot>,
    mut world: ResMut<CombatWorld>,
    time: Res<Time<Fixed>>,
) {
    pilot.accumulator_ms += time.timestep().as_secs_f32() * 1000.0;
    if pilot.accumulator_ms < pilot.step_ms {
        return;
    }
    pilot.accumulator_ms -= pilot.step_ms;

    let head = world.player.head().round().as_ivec2();
    let max = IVec2::new(world.config.arena_width - 2, world.config.arena_height - 2);
    let dir = pilot.direction;
    let candidates = [dir, IVec2::new(-dir.y, dir.x), IVec2::new(dir.y, -dir.x)];
    let free = |d: &IVec2| {
        let next = head + *d;
        let inside = next.cmpge(IVec2::ONE).all() && next.cmple(max).all();
        inside
            && !world
                .player
                .body
                .iter()
                .any(|s| s.round().as_ivec2() == next)
    };
    if let Some(choice) = candidates.iter().find(|d| free(d)) {
        pilot.direction = *choice;
    }

    let next = (head + pilot.direction).as_vec2();
    if let StepOutcome::Ended(reason) = try_step(&mut world, next, false) {
        info!("Autopilot stepped into trouble: {reason}");
    }
}

fn spawn_waves_system(
    scenario: Res<Scenario>,
    mut pilot: ResMut<Autopilot>,
    mut world: ResMut<CombatWorld>,
    time: Res<Time<Fixed>>,
) {
    pilot.spawn_accumulator_ms += time.timestep().as_secs_f32() * 1000.0;
    if pilot.spawn_accumulator_ms < pilot.spawn_ms {
        return;
    }
    pilot.spawn_accumulator_ms = 0.0;
    if *scenario == Scenario::Boss && world.boss_active {
        return;
    }

    let kinds = [
        EnemyKind::Hunter,
        EnemyKind::Interceptor,
        EnemyKind::Shooter,
        EnemyKind::Dasher,
    ];
    let w = world.config.arena_width as f32;
    let h = world.config.arena_height as f32;
    let kind = kinds[world.rng.gen_range(0..kinds.len())];
    let edge = if world.rng.gen_bool(0.5) { 1.0 } else { w - 2.0 };
    let y = world.rng.gen_range(1.0..h - 1.0);
    world.spawn_enemy(kind, Vec2::new(edge, y));
}

fn finish_system(
    mut demo: ResMut<DemoConfig>,
    world: Res<CombatWorld>,
    mut exit: MessageWriter<AppExit>,
) {
    demo.frame_count += 1;
    let ended = world.run_outcome();
    if ended.is_none() && !world.boss_defeated && demo.frame_count < demo.frame_limit {
        return;
    }
    match ended {
        Some(reason) => info!("Run ended after {} frames: {reason}", demo.frame_count),
        None if world.boss_defeated => info!("Boss defeated after {} frames", demo.frame_count),
        None => info!("Survived {} frames", demo.frame_count),
    }
    info!(
        "kills={} enemies={} shields={} tail_integrity={:.0} clock={:.0}ms",
        world.kills,
        world.enemies.len(),
        world.player.shields,
        world.player.tail_integrity,
        world.clock_ms
    );
    exit.write(AppExit::Success);
}

fn main() {
    let scenario = Scenario::from_env();
    let frame_limit = env::var("SERPENT_FRAMES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1800);

    App::new()
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
            LogPlugin::default(),
            CombatPlugin,
        ))
        .insert_resource(scenario)
        .insert_resource(DemoConfig {
            frame_limit,
            frame_count: 0,
        })
        .init_resource::<Autopilot>()
        .add_systems(Startup, setup_scenario.after(init_combat_world))
        .add_systems(
            FixedUpdate,
            (autopilot_system, spawn_waves_system).before(combat_tick_system),
        )
        .add_systems(Update, finish_system)
        .run();
}
