//! Melee cone weapon.
//!
//! Each trigger snaps the aim to the nearest compass direction and spawns a
//! short-lived cone in front of the player.  The cone hits every enemy that
//! enters it, each at most once, and despawns after `SLASH_LIFETIME`.

use super::{
    snap_to_8_directions, AttackContext, FireTimer, Weapon, WeaponAction, WeaponKind, WeaponStats,
};
use crate::config::GameConfig;
use crate::constants::{SLASH_LIFETIME, WEAPON_KNOCKBACK_IMPULSE};
use crate::events::DamageEnemyRequest;
use crate::spatial_partition::EnemyRegistry;
use bevy::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct SlashWeapon {
    stats: WeaponStats,
    timer: FireTimer,
    pub offset: f32,
    /// Full opening angle in degrees.
    pub angle_deg: f32,
    pub lifetime: f32,
}

impl SlashWeapon {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            stats: WeaponStats::new(
                config.slash_damage,
                1.0 / config.slash_attack_interval,
                config.slash_range,
                config.weapon_critical_chance,
            ),
            timer: FireTimer::default(),
            offset: config.slash_offset,
            angle_deg: config.slash_angle_deg,
            lifetime: SLASH_LIFETIME,
        }
    }
}

impl Weapon for SlashWeapon {
    fn kind(&self) -> WeaponKind {
        WeaponKind::Slash
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
        let direction = snap_to_8_directions(ctx.aim);
        let (damage, critical) = self.stats.roll_damage(ctx.rng);
        vec![WeaponAction::SpawnSlash {
            position: ctx.origin + direction * self.offset,
            volume: SlashVolume {
                direction,
                radius: self.stats.range,
                half_angle: (self.angle_deg * 0.5).to_radians(),
                damage,
                critical,
                age: 0.0,
                lifetime: self.lifetime,
                hit: HashSet::new(),
            },
        }]
    }
}

/// Directional hit-volume anchored at its entity's translation.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct SlashVolume {
    pub direction: Vec2,
    pub radius: f32,
    /// Half the opening angle, radians.
    pub half_angle: f32,
    pub damage: f32,
    pub critical: bool,
    pub age: f32,
    pub lifetime: f32,
    hit: HashSet<Entity>,
}

impl SlashVolume {
    /// Whether a body of `body_radius` at `point` overlaps the cone.
    pub fn contains(&self, anchor: Vec2, point: Vec2, body_radius: f32) -> bool {
        let offset = point - anchor;
        let distance = offset.length();
        if distance > self.radius + body_radius {
            return false;
        }
        // A body sitting on the anchor is always inside.
        if distance <= body_radius {
            return true;
        }
        self.direction.angle_to(offset).abs() <= self.half_angle
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Apply hits for every live slash, then age them out.
pub fn slash_volume_system(
    mut commands: Commands,
    time: Res<Time>,
    registry: Res<EnemyRegistry>,
    mut q: Query<(Entity, &Transform, &mut SlashVolume)>,
    mut damage: MessageWriter<DamageEnemyRequest>,
) {
    let dt = time.delta_secs();
    for (entity, transform, mut volume) in q.iter_mut() {
        let anchor = transform.translation.truncate();
        for enemy in registry.query_circle(anchor, volume.radius) {
            if !volume.contains(anchor, enemy.position, enemy.radius) {
                continue;
            }
            if !volume.hit.insert(enemy.entity) {
                continue;
            }
            damage.write(DamageEnemyRequest {
                target: enemy.entity,
                amount: volume.damage,
                critical: volume.critical,
                source: anchor,
                knockback: WEAPON_KNOCKBACK_IMPULSE,
            });
        }

        volume.age += dt;
        if volume.is_expired() {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{registry_with, rng};
    use super::*;

    fn slash_from(weapon: &mut SlashWeapon, aim: Vec2) -> (Vec2, SlashVolume) {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[]);
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.016,
            origin: Vec2::ZERO,
            aim,
            enemies: &registry,
            rng: &mut rng,
        };
        match weapon.tick(&mut ctx).pop() {
            Some(WeaponAction::SpawnSlash { position, volume }) => (position, volume),
            other => panic!("expected a slash, got {other:?}"),
        }
    }

    #[test]
    fn slash_is_offset_along_snapped_direction() {
        let mut weapon = SlashWeapon::from_config(&GameConfig::default());
        let (position, volume) = slash_from(&mut weapon, Vec2::new(0.2, 1.0));
        assert_eq!(volume.direction, Vec2::Y);
        assert!((position - Vec2::new(0.0, weapon.offset)).length() < 1e-6);
    }

    #[test]
    fn cone_includes_front_and_excludes_behind() {
        let mut weapon = SlashWeapon::from_config(&GameConfig::default());
        let (anchor, volume) = slash_from(&mut weapon, Vec2::X);

        assert!(volume.contains(anchor, anchor + Vec2::new(1.5, 0.2), 0.1));
        assert!(!volume.contains(anchor, anchor + Vec2::new(-1.0, 0.0), 0.1));
        // In front but outside the opening angle.
        assert!(!volume.contains(anchor, anchor + Vec2::new(0.5, 1.5), 0.1));
        // Beyond reach even with the body radius.
        assert!(!volume.contains(anchor, anchor + Vec2::new(3.0, 0.0), 0.4));
    }

    #[test]
    fn lifetime_does_not_follow_fire_rate() {
        let mut slow = GameConfig::default();
        slow.slash_attack_interval = 5.0;
        let mut weapon = SlashWeapon::from_config(&slow);
        let (_, volume) = slash_from(&mut weapon, Vec2::X);
        assert_eq!(volume.lifetime, SLASH_LIFETIME);
        assert!((weapon.stats().fire_rate() - 0.2).abs() < 1e-6);
    }
}
