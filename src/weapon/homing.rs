//! Homing weapon: keeps `spawn_count` steering units alive around the player.
//!
//! Units persist until their owning weapon entity disappears.  They steer
//! toward the player at a bounded turn rate, so they sweep loops around the
//! character, and each one damages a given enemy only once.

use super::{AttackContext, FireTimer, Weapon, WeaponAction, WeaponKind, WeaponInstance, WeaponStats};
use crate::config::GameConfig;
use crate::constants::{HOMING_HIT_RADIUS, HOMING_SPAWN_SPACING};
use crate::events::DamageEnemyRequest;
use crate::player::Player;
use crate::spatial_partition::EnemyRegistry;
use bevy::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct HomingWeapon {
    stats: WeaponStats,
    timer: FireTimer,
    pub spawn_count: u32,
    pub speed: f32,
    pub rotate_speed_deg: f32,
    /// Fixed per-hit damage; the weapon damage stat does not apply.
    pub damage: f32,
    pub spacing: f32,
    live_units: u32,
}

impl HomingWeapon {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            stats: WeaponStats::new(
                config.homing_damage,
                config.weapon_fire_rate,
                config.weapon_range,
                config.weapon_critical_chance,
            ),
            timer: FireTimer::default(),
            spawn_count: config.homing_spawn_count,
            speed: config.homing_speed,
            rotate_speed_deg: config.homing_rotate_speed_deg,
            damage: config.homing_damage,
            spacing: HOMING_SPAWN_SPACING,
            live_units: 0,
        }
    }

    /// Number of units currently alive; refreshed from the ECS before each tick.
    pub fn set_live_units(&mut self, count: u32) {
        self.live_units = count;
    }

    pub fn live_units(&self) -> u32 {
        self.live_units
    }

    pub fn set_spawn_count(&mut self, count: u32) {
        self.spawn_count = count;
    }
}

impl Weapon for HomingWeapon {
    fn kind(&self) -> WeaponKind {
        WeaponKind::Homing
    }

    fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut WeaponStats {
        &mut self.stats
    }

    fn timer_mut(&mut self) -> &mut FireTimer {
        &mut self.timer
    }

    /// Units act on their own; the periodic trigger has nothing to add.
    fn attack(&mut self, _ctx: &mut AttackContext) -> Vec<WeaponAction> {
        Vec::new()
    }

    /// Spawn the deficit, offset sideways from the aim so units don't stack.
    fn advance(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        let deficit = self.spawn_count.saturating_sub(self.live_units);
        let lateral = ctx.aim.perp();
        let actions = (0..deficit)
            .map(|i| {
                let index = self.live_units + i;
                WeaponAction::SpawnHoming {
                    position: ctx.origin + lateral * (index as f32 * self.spacing),
                    unit: HomingUnit::new(
                        ctx.aim,
                        self.speed,
                        self.rotate_speed_deg,
                        self.damage,
                    ),
                }
            })
            .collect();
        self.live_units += deficit;
        actions
    }

    fn apply_upgrade(&mut self, level: u32) {
        self.set_spawn_count(1 + level);
        info!("Homing weapon level {level}: {} units", self.spawn_count);
    }
}

// ── Units ─────────────────────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, PartialEq)]
pub struct HomingUnit {
    /// Unit heading.
    pub heading: Vec2,
    pub speed: f32,
    pub rotate_speed_deg: f32,
    pub damage: f32,
    hit: HashSet<Entity>,
}

/// The weapon entity a unit belongs to.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomingOwner(pub Entity);

impl HomingUnit {
    pub fn new(heading: Vec2, speed: f32, rotate_speed_deg: f32, damage: f32) -> Self {
        Self {
            heading: heading.normalize_or(Vec2::X),
            speed,
            rotate_speed_deg,
            damage,
            hit: HashSet::new(),
        }
    }

    /// Turn toward `target` by at most `rotate_speed × dt`, then advance.
    /// Returns the new position.
    pub fn steer(&mut self, position: Vec2, target: Vec2, dt: f32) -> Vec2 {
        let desired = (target - position).normalize_or_zero();
        if desired != Vec2::ZERO {
            let diff = self.heading.perp_dot(desired).atan2(self.heading.dot(desired));
            let max_turn = self.rotate_speed_deg.to_radians() * dt;
            let turn = diff.clamp(-max_turn, max_turn);
            self.heading = Vec2::from_angle(turn).rotate(self.heading).normalize_or(self.heading);
        }
        position + self.heading * self.speed * dt
    }

    /// True the first time `enemy` is hit by this unit.
    pub fn register_hit(&mut self, enemy: Entity) -> bool {
        self.hit.insert(enemy)
    }

    /// Drop hit records for enemies no longer in the snapshot, so the set
    /// stays bounded by the living population.
    pub fn forget_missing(&mut self, registry: &EnemyRegistry) {
        self.hit.retain(|&enemy| registry.get(enemy).is_some());
    }
}

/// Steer units, apply their hits, and clean up orphans.
pub fn homing_unit_system(
    mut commands: Commands,
    time: Res<Time>,
    registry: Res<EnemyRegistry>,
    q_player: Query<&Transform, (With<Player>, Without<HomingUnit>)>,
    mut q_units: Query<(Entity, &mut Transform, &mut HomingUnit, &HomingOwner)>,
    q_weapons: Query<(), With<WeaponInstance>>,
    mut damage: MessageWriter<DamageEnemyRequest>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let player_pos = player_transform.translation.truncate();
    let dt = time.delta_secs();

    for (entity, mut transform, mut unit, owner) in q_units.iter_mut() {
        if q_weapons.get(owner.0).is_err() {
            commands.entity(entity).despawn();
            continue;
        }

        unit.forget_missing(&registry);
        let position = unit.steer(transform.translation.truncate(), player_pos, dt);
        transform.translation = position.extend(transform.translation.z);

        for hit in registry.query_circle(position, HOMING_HIT_RADIUS) {
            if unit.register_hit(hit.entity) {
                damage.write(DamageEnemyRequest {
                    target: hit.entity,
                    amount: unit.damage,
                    critical: false,
                    source: position,
                    knockback: 0.0,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{registry_with, rng};
    use super::*;

    fn spawn_positions(actions: &[WeaponAction]) -> Vec<Vec2> {
        actions
            .iter()
            .filter_map(|a| match a {
                WeaponAction::SpawnHoming { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn spawns_only_the_deficit() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[]);
        let mut weapon = HomingWeapon::from_config(&GameConfig::default());
        weapon.set_spawn_count(3);
        weapon.set_live_units(1);
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.016,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };

        let positions = spawn_positions(&weapon.tick(&mut ctx));
        assert_eq!(positions.len(), 2);
        assert_ne!(positions[0], positions[1], "units must be offset laterally");
        assert_eq!(weapon.live_units(), 3);
        assert!(spawn_positions(&weapon.tick(&mut ctx)).is_empty());
    }

    #[test]
    fn upgrade_raises_spawn_count() {
        let mut weapon = HomingWeapon::from_config(&GameConfig::default());
        weapon.apply_upgrade(2);
        assert_eq!(weapon.spawn_count, 3);
    }

    #[test]
    fn turn_rate_is_bounded() {
        // Heading +X, target directly behind: at most 200°/s × 0.1 s = 20° of turn.
        let mut unit = HomingUnit::new(Vec2::X, 5.0, 200.0, 2.0);
        unit.steer(Vec2::ZERO, Vec2::new(-10.0, 0.1), 0.1);
        let turned = Vec2::X.angle_to(unit.heading).to_degrees().abs();
        assert!((turned - 20.0).abs() < 0.01, "turned {turned}°");
    }

    #[test]
    fn unit_hits_each_enemy_once() {
        let mut world = World::new();
        let enemy = world.spawn_empty().id();
        let mut unit = HomingUnit::new(Vec2::X, 5.0, 200.0, 2.0);
        assert!(unit.register_hit(enemy));
        assert!(!unit.register_hit(enemy));
    }

    #[test]
    fn hit_records_for_despawned_enemies_are_pruned() {
        let mut world = World::new();
        let (registry, enemies) = registry_with(&mut world, &[(Vec2::X, 0.3)]);
        let gone = world.spawn_empty().id();
        let mut unit = HomingUnit::new(Vec2::X, 5.0, 200.0, 2.0);
        unit.register_hit(enemies[0]);
        unit.register_hit(gone);

        unit.forget_missing(&registry);

        assert!(!unit.register_hit(enemies[0]), "living enemy is still remembered");
        assert!(unit.register_hit(gone), "record for the missing entity was dropped");
    }
}
