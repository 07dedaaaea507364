//! Orbit/spin weapon.
//!
//! Each trigger starts one *episode*: `weapon_count` volumes revolve around
//! the player for `spin_duration` seconds.  An overlap check runs when the
//! episode starts and then every `ORBIT_DAMAGE_TICK` seconds; an enemy is
//! damaged at most once per episode no matter how long it stays in contact.
//! Triggers that arrive mid-episode are ignored.

use super::{AttackContext, FireTimer, Weapon, WeaponAction, WeaponKind, WeaponStats};
use crate::config::GameConfig;
use crate::constants::{ORBIT_DAMAGE_TICK, ORBIT_HIT_RADIUS, ORBIT_KNOCKBACK_IMPULSE};
use bevy::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum SpinState {
    Idle,
    Spinning {
        elapsed: f32,
        since_check: f32,
        damaged: HashSet<Entity>,
    },
}

#[derive(Debug, Clone)]
pub struct OrbitWeapon {
    stats: WeaponStats,
    timer: FireTimer,
    pub orbit_radius: f32,
    /// Degrees per second.
    pub orbit_speed_deg: f32,
    pub weapon_count: u32,
    pub spin_duration: f32,
    spin: SpinState,
}

impl OrbitWeapon {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            stats: WeaponStats::new(
                config.weapon_damage,
                config.weapon_fire_rate,
                config.weapon_range,
                config.weapon_critical_chance,
            ),
            timer: FireTimer::default(),
            orbit_radius: config.orbit_radius,
            orbit_speed_deg: config.orbit_speed_deg,
            weapon_count: config.orbit_weapon_count.max(1),
            spin_duration: config.spin_duration,
            spin: SpinState::Idle,
        }
    }

    pub fn spin_state(&self) -> &SpinState {
        &self.spin
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.spin, SpinState::Spinning { .. })
    }

    /// World positions of the orbiting volumes; empty while idle.
    pub fn volume_positions(&self, origin: Vec2) -> Vec<Vec2> {
        let SpinState::Spinning { elapsed, .. } = &self.spin else {
            return Vec::new();
        };
        let base = (elapsed * self.orbit_speed_deg).rem_euclid(360.0);
        let spacing = 360.0 / self.weapon_count as f32;
        (0..self.weapon_count)
            .map(|i| {
                let angle = (base + i as f32 * spacing).to_radians();
                origin + Vec2::from_angle(angle) * self.orbit_radius
            })
            .collect()
    }

    fn damage_check(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        let positions = self.volume_positions(ctx.origin);
        let SpinState::Spinning { damaged, .. } = &mut self.spin else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        for position in positions {
            for hit in ctx.enemies.query_circle(position, ORBIT_HIT_RADIUS) {
                if !damaged.insert(hit.entity) {
                    continue;
                }
                let (amount, critical) = self.stats.roll_damage(ctx.rng);
                actions.push(WeaponAction::Damage {
                    target: hit.entity,
                    amount,
                    critical,
                    source: ctx.origin,
                    knockback: ORBIT_KNOCKBACK_IMPULSE,
                });
            }
        }
        actions
    }
}

impl Weapon for OrbitWeapon {
    fn kind(&self) -> WeaponKind {
        WeaponKind::Orbit
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
        if self.is_spinning() {
            return Vec::new();
        }
        self.spin = SpinState::Spinning {
            elapsed: 0.0,
            since_check: 0.0,
            damaged: HashSet::new(),
        };
        self.damage_check(ctx)
    }

    fn advance(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        let SpinState::Spinning {
            elapsed,
            since_check,
            ..
        } = &mut self.spin
        else {
            return Vec::new();
        };

        *elapsed += ctx.dt;
        if *elapsed >= self.spin_duration {
            self.spin = SpinState::Idle;
            return Vec::new();
        }

        *since_check += ctx.dt;
        let mut checks = 0;
        while *since_check >= ORBIT_DAMAGE_TICK {
            *since_check -= ORBIT_DAMAGE_TICK;
            checks += 1;
        }

        let mut actions = Vec::new();
        for _ in 0..checks {
            actions.extend(self.damage_check(ctx));
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{damage_targets, registry_with, rng};
    use super::*;

    fn weapon() -> OrbitWeapon {
        OrbitWeapon::from_config(&GameConfig::default())
    }

    #[test]
    fn enemy_overlapping_whole_episode_is_damaged_once() {
        let mut world = World::new();
        // A body large enough to overlap the volume at every angle.
        let (registry, entities) = registry_with(&mut world, &[(Vec2::ZERO, 3.0)]);
        let mut weapon = weapon();
        let mut rng = rng();

        let mut hits = Vec::new();
        let dt = 0.05;
        let mut now = 0.0;
        while now < 0.95 {
            let mut ctx = AttackContext {
                now,
                dt,
                origin: Vec2::ZERO,
                aim: Vec2::X,
                enemies: &registry,
                rng: &mut rng,
            };
            hits.extend(damage_targets(&weapon.tick(&mut ctx)));
            now += dt;
        }
        assert_eq!(hits, vec![entities[0]], "exactly one hit per episode");
    }

    #[test]
    fn retrigger_while_spinning_is_a_no_op() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[]);
        let mut weapon = weapon();
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.1,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };
        weapon.attack(&mut ctx);
        weapon.advance(&mut ctx);
        let before = weapon.spin_state().clone();
        weapon.attack(&mut ctx);
        assert_eq!(weapon.spin_state(), &before, "episode must not restart");
    }

    #[test]
    fn episode_ends_and_volumes_disappear() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[]);
        let mut weapon = weapon();
        weapon.spin_duration = 0.3;
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.1,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };
        weapon.attack(&mut ctx);
        assert_eq!(weapon.volume_positions(Vec2::ZERO).len(), 1);
        for _ in 0..4 {
            weapon.advance(&mut ctx);
        }
        assert!(!weapon.is_spinning());
        assert!(weapon.volume_positions(Vec2::ZERO).is_empty());
    }

    #[test]
    fn volumes_are_evenly_phase_offset() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[]);
        let mut weapon = weapon();
        weapon.weapon_count = 4;
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.0,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };
        weapon.attack(&mut ctx);
        let positions = weapon.volume_positions(Vec2::ZERO);
        assert_eq!(positions.len(), 4);
        assert!((positions[0] - Vec2::new(2.0, 0.0)).length() < 1e-4);
        assert!((positions[1] - Vec2::new(0.0, 2.0)).length() < 1e-4);
        assert!((positions[2] - Vec2::new(-2.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn distant_enemy_is_never_hit() {
        let mut world = World::new();
        let (registry, _) = registry_with(&mut world, &[(Vec2::new(10.0, 0.0), 0.4)]);
        let mut weapon = weapon();
        let mut rng = rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.1,
            origin: Vec2::ZERO,
            aim: Vec2::X,
            enemies: &registry,
            rng: &mut rng,
        };
        let mut total = weapon.tick(&mut ctx).len();
        for _ in 0..9 {
            total += weapon.advance(&mut ctx).len();
        }
        assert_eq!(total, 0);
    }
}
