//! Nearest-target projectile weapon.

use super::{AttackContext, FireTimer, Weapon, WeaponAction, WeaponKind, WeaponStats};
use crate::config::GameConfig;
use crate::constants::{PROJECTILE_RADIUS, WEAPON_KNOCKBACK_IMPULSE};
use crate::events::DamageEnemyRequest;
use crate::spatial_partition::EnemyRegistry;
use bevy::prelude::*;

#[derive(Debug, Clone)]
pub struct ProjectileWeapon {
    stats: WeaponStats,
    timer: FireTimer,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
}

impl ProjectileWeapon {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            stats: WeaponStats::new(
                config.weapon_damage,
                config.weapon_fire_rate,
                config.weapon_range,
                config.weapon_critical_chance,
            ),
            timer: FireTimer::default(),
            projectile_speed: config.projectile_speed,
            projectile_lifetime: config.projectile_lifetime,
        }
    }
}

impl Weapon for ProjectileWeapon {
    fn kind(&self) -> WeaponKind {
        WeaponKind::Projectile
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

    fn attack(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        let Some(target) = ctx.enemies.nearest_within(ctx.origin, self.stats.range) else {
            return Vec::new();
        };
        let direction = (target.position - ctx.origin).normalize_or(ctx.aim);
        let (damage, critical) = self.stats.roll_damage(ctx.rng);
        vec![WeaponAction::SpawnProjectile {
            position: ctx.origin,
            projectile: Projectile {
                velocity: direction * self.projectile_speed,
                damage,
                critical,
                age: 0.0,
                lifetime: self.projectile_lifetime,
                radius: PROJECTILE_RADIUS,
            },
        }]
    }
}

/// A fired round.  Destroyed on its first hit or when `age ≥ lifetime`.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub velocity: Vec2,
    pub damage: f32,
    pub critical: bool,
    pub age: f32,
    pub lifetime: f32,
    pub radius: f32,
}

pub fn projectile_motion_system(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut Transform, &mut Projectile)>,
) {
    let dt = time.delta_secs();
    for (entity, mut transform, mut projectile) in q.iter_mut() {
        projectile.age += dt;
        if projectile.age >= projectile.lifetime {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation += (projectile.velocity * dt).extend(0.0);
    }
}

/// First overlapping enemy (in spawn order) takes the hit; the round is spent.
pub fn projectile_hit_system(
    mut commands: Commands,
    registry: Res<EnemyRegistry>,
    q: Query<(Entity, &Transform, &Projectile)>,
    mut damage: MessageWriter<DamageEnemyRequest>,
) {
    for (entity, transform, projectile) in q.iter() {
        let position = transform.translation.truncate();
        let Some(hit) = registry
            .query_circle(position, projectile.radius)
            .into_iter()
            .next()
        else {
            continue;
        };
        damage.write(DamageEnemyRequest {
            target: hit.entity,
            amount: projectile.damage,
            critical: projectile.critical,
            source: position,
            knockback: WEAPON_KNOCKBACK_IMPULSE,
        });
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{registry_with, rng};
    use super::*;

    #[test]
    fn fires_at_nearest_enemy_in_range() {
        let mut world = World::new();
        let (registry, _) = registry_with(
            &mut world,
            &[(Vec2::new(0.0, 4.0), 0.4), (Vec2::new(-2.0, 0.0), 0.4)],
        );
        let mut weapon = ProjectileWeapon::from_config(&GameConfig::default());
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.016,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };

        let actions = weapon.tick(&mut ctx);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            WeaponAction::SpawnProjectile { projectile, .. } => {
                let dir = projectile.velocity.normalize();
                assert!((dir - Vec2::NEG_X).length() < 1e-5, "aimed at {dir:?}");
            }
            other => panic!("expected a projectile, got {other:?}"),
        }

        // Fire timer blocks the next shot until one interval has passed.
        ctx.now = 0.5;
        assert!(weapon.tick(&mut ctx).is_empty());
    }

    #[test]
    fn no_target_in_range_fires_nothing() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[(Vec2::new(50.0, 0.0), 0.4)]);
        let mut weapon = ProjectileWeapon::from_config(&GameConfig::default());
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.016,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };
        assert!(weapon.tick(&mut ctx).is_empty());
    }

    #[test]
    fn critical_rolls_are_independent_per_shot() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[(Vec2::new(1.0, 0.0), 0.4)]);
        let mut weapon = ProjectileWeapon::from_config(&GameConfig::default());
        weapon.stats_mut().critical_chance = 0.5;
        let mut rng = rng();
        let mut crits = 0;
        let shots = 400;
        for shot in 0..shots {
            let mut ctx = AttackContext {
                now: shot as f32 * 2.0,
                dt: 0.016,
                origin: Vec2::ZERO,
                aim: Vec2::X,
                enemies: &registry,
                rng: &mut rng,
            };
            for action in weapon.tick(&mut ctx) {
                if let WeaponAction::SpawnProjectile { projectile, .. } = action {
                    if projectile.critical {
                        assert_eq!(projectile.damage, 20.0);
                        crits += 1;
                    } else {
                        assert_eq!(projectile.damage, 10.0);
                    }
                }
            }
        }
        assert!(
            (120..280).contains(&crits),
            "expected roughly half critical, got {crits}/{shots}"
        );
    }
}
