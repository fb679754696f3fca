//! Continuous boss movement.  Runs every tick, independently of the state
//! timer, and keeps the boss's hitboxes attached to it.

use super::definition::MovementPattern;
use crate::combat::{GridScale, Hitbox};
use crate::constants::{ORBIT_ANGULAR_SPEED, ORBIT_RADIUS_CELLS};
use crate::enemy::EntityId;
use crate::world::CombatWorld;
use bevy::prelude::*;

/// Integrate one movement step for the boss at `idx` and re-anchor its hitboxes.
/// Stunned bosses hold position but still turn to face the player.
pub fn steer_boss(
    world: &mut CombatWorld,
    idx: usize,
    pattern: MovementPattern,
    player_pos: Vec2,
    dt_ms: f32,
) {
    let dt = dt_ms / 1000.0;
    let max = Vec2::new(
        (world.config.arena_width - 1) as f32,
        (world.config.arena_height - 1) as f32,
    );

    let enemy = &mut world.enemies[idx];
    let (position, speed, stunned) = (enemy.position, enemy.speed, enemy.is_stunned());
    let Some(runtime) = enemy.boss.as_mut() else {
        return;
    };

    let velocity = if stunned {
        Vec2::ZERO
    } else {
        match pattern {
            MovementPattern::Chase => (player_pos - position).normalize_or_zero() * speed,
            MovementPattern::Orbit if dt > 0.0 => {
                let bearing = (position - player_pos).to_angle() + ORBIT_ANGULAR_SPEED * dt;
                let goal = player_pos + Vec2::from_angle(bearing) * ORBIT_RADIUS_CELLS;
                let to_goal = goal - position;
                let step = (speed * dt).min(to_goal.length());
                to_goal.normalize_or_zero() * step / dt
            }
            MovementPattern::Sweep => {
                let next_x = position.x + runtime.sweep_dir * speed * dt;
                if next_x <= 0.0 || next_x >= max.x {
                    runtime.sweep_dir = -runtime.sweep_dir;
                }
                Vec2::new(runtime.sweep_dir * speed, 0.0)
            }
            MovementPattern::Orbit | MovementPattern::Anchored => Vec2::ZERO,
        }
    };
    let origin = (position + velocity * dt).clamp(Vec2::ZERO, max);

    let horizontal = if velocity.x.abs() > 1e-4 {
        velocity.x
    } else {
        player_pos.x - origin.x
    };
    if horizontal.abs() > 1e-4 {
        runtime.facing = horizontal.signum();
    }
    let facing = runtime.facing;

    enemy.velocity = velocity;
    enemy.position = origin;
    let owner = enemy.id;
    let scale = world.scale;
    for hitbox in world.hitboxes.iter_mut().filter(|h| h.owner == owner) {
        hitbox.position = anchor(&scale, origin, hitbox.local_offset, facing);
    }
}

/// World position of a hitbox with `local_offset` (cells, authored facing
/// right) on a boss at grid `origin`.
pub fn anchor(scale: &GridScale, origin: Vec2, local_offset: Vec2, facing: f32) -> Vec2 {
    scale.to_world(origin + Vec2::new(local_offset.x * facing, local_offset.y))
}

/// Hitboxes owned by `owner`, for renderers and tests.
pub fn hitboxes_of(world: &CombatWorld, owner: EntityId) -> impl Iterator<Item = &Hitbox> {
    world.hitboxes.iter().filter(move |h| h.owner == owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::BossState;
    use crate::enemy::{BossRuntime, EnemyKind};

    fn boss_at(world: &mut CombatWorld, pos: Vec2) -> usize {
        let id = world.spawn_enemy(EnemyKind::Boss, pos);
        let idx = world.enemy_index(id).unwrap();
        world.enemies[idx].activate();
        world.enemies[idx].boss = Some(BossRuntime {
            config_id: "test".into(),
            state: BossState::new("idle".into()),
            facing: 1.0,
            sweep_dir: 1.0,
        });
        idx
    }

    #[test]
    fn chase_closes_distance_and_faces_player() {
        let mut w = CombatWorld::default().with_seed(1);
        let idx = boss_at(&mut w, Vec2::new(25.0, 12.0));
        let player = Vec2::new(5.0, 12.0);
        let before = w.enemies[idx].position.distance(player);
        steer_boss(&mut w, idx, MovementPattern::Chase, player, 500.0);
        assert!(w.enemies[idx].position.distance(player) < before);
        assert_eq!(w.enemies[idx].boss.as_ref().unwrap().facing, -1.0);
    }

    #[test]
    fn sweep_turns_at_arena_edge() {
        let mut w = CombatWorld::default().with_seed(1);
        let edge = (w.config.arena_width - 1) as f32;
        let idx = boss_at(&mut w, Vec2::new(edge - 0.1, 3.0));
        steer_boss(&mut w, idx, MovementPattern::Sweep, Vec2::new(5.0, 12.0), 500.0);
        let boss = &w.enemies[idx];
        assert_eq!(boss.boss.as_ref().unwrap().sweep_dir, -1.0);
        assert!(boss.position.x <= edge);
        assert_eq!(boss.position.y, 3.0);
    }

    #[test]
    fn stunned_boss_holds_position() {
        let mut w = CombatWorld::default().with_seed(1);
        let idx = boss_at(&mut w, Vec2::new(20.0, 12.0));
        w.enemies[idx].stun_ms = 300.0;
        steer_boss(&mut w, idx, MovementPattern::Chase, Vec2::new(5.0, 12.0), 100.0);
        assert_eq!(w.enemies[idx].position, Vec2::new(20.0, 12.0));
    }

    #[test]
    fn hitboxes_follow_and_mirror() {
        let mut w = CombatWorld::default().with_seed(1);
        let idx = boss_at(&mut w, Vec2::new(20.0, 12.0));
        let owner = w.enemies[idx].id;
        w.hitboxes.push(Hitbox {
            id: Hitbox::composite_id(owner, "claw"),
            owner,
            tag: "claw".into(),
            local_offset: Vec2::new(2.0, 0.0),
            position: Vec2::ZERO,
            size: Vec2::splat(20.0),
            damage: 5.0,
            color: String::new(),
        });
        steer_boss(&mut w, idx, MovementPattern::Anchored, Vec2::new(5.0, 12.0), 16.0);
        let expected = w.scale.to_world(Vec2::new(18.0, 12.0));
        assert_eq!(hitboxes_of(&w, owner).next().unwrap().position, expected);
    }
}
