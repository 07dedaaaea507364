//! Weapon attack model.
//!
//! Every weapon shares the same periodic trigger: a [`FireTimer`] that fires
//! once `now ≥ next_fire_time` and then schedules the next attack
//! `1 / fire_rate` seconds later.  Variant behaviour sits behind the
//! [`Weapon`] trait; [`WeaponInstance`] is the component that stores one
//! variant and dispatches to it.
//!
//! ## Sub-module layout
//!
//! | Module | Variant | Hit entity |
//! |--------|---------|------------|
//! | [`projectile`] | nearest-target shooter | `Projectile`, destroyed on hit |
//! | [`orbit`] | spin episode with orbiting volumes | none (volumes live in the weapon state) |
//! | [`homing`] | persistent steering units | `HomingUnit`, one hit per enemy |
//! | [`slash`] | 8-way melee cone | `SlashVolume`, fixed short lifetime |
//!
//! Weapons never touch the ECS.  [`weapon_tick_system`] builds an
//! [`AttackContext`] for each weapon, ticks it, and turns the returned
//! [`WeaponAction`]s into entities and [`DamageEnemyRequest`] messages.

pub mod homing;
pub mod orbit;
pub mod projectile;
pub mod slash;

pub use homing::{HomingOwner, HomingUnit, HomingWeapon};
pub use orbit::{OrbitWeapon, SpinState};
pub use projectile::{Projectile, ProjectileWeapon};
pub use slash::{SlashVolume, SlashWeapon};

use crate::config::{GameConfig, GameRng};
use crate::constants::{CRITICAL_DAMAGE_MULTIPLIER, MIN_FIRE_RATE};
use crate::events::DamageEnemyRequest;
use crate::menu::GameState;
use crate::player::{AimDirection, Player};
use crate::preferences::StarterWeapon;
use crate::progression::WeaponId;
use crate::spatial_partition::{rebuild_enemy_registry_system, EnemyRegistry};
use crate::stats::PlayerStats;
use bevy::prelude::*;
use rand::{Rng, RngCore};
use std::collections::HashMap;

// ── Shared stats and timing ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponKind {
    Projectile,
    Orbit,
    Homing,
    Slash,
}

impl WeaponKind {
    /// Ranged weapons scale with intelligence, wisdom and luck; the melee
    /// cone scales with strength.
    pub fn is_ranged(self) -> bool {
        !matches!(self, WeaponKind::Slash)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponStats {
    pub damage: f32,
    fire_rate: f32,
    pub range: f32,
    pub critical_chance: f32,
}

impl WeaponStats {
    pub fn new(damage: f32, fire_rate: f32, range: f32, critical_chance: f32) -> Self {
        let mut stats = Self {
            damage,
            fire_rate: MIN_FIRE_RATE,
            range,
            critical_chance: critical_chance.clamp(0.0, 1.0),
        };
        stats.set_fire_rate(fire_rate);
        stats
    }

    pub fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    /// Attacks per second, floored at `MIN_FIRE_RATE` so the interval stays finite.
    pub fn set_fire_rate(&mut self, rate: f32) {
        self.fire_rate = if rate.is_finite() {
            rate.max(MIN_FIRE_RATE)
        } else {
            MIN_FIRE_RATE
        };
    }

    /// Damage for one hit with an independent critical roll.
    pub fn roll_damage(&self, rng: &mut dyn RngCore) -> (f32, bool) {
        let critical = roll_critical(rng, self.critical_chance);
        let amount = if critical {
            self.damage * CRITICAL_DAMAGE_MULTIPLIER
        } else {
            self.damage
        };
        (amount, critical)
    }
}

pub fn roll_critical(rng: &mut dyn RngCore, chance: f32) -> bool {
    rng.gen::<f32>() < chance
}

/// `next_fire_time` gate shared by every weapon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FireTimer {
    next_fire_time: f32,
}

impl FireTimer {
    pub fn next_fire_time(&self) -> f32 {
        self.next_fire_time
    }

    /// True at most once per interval; schedules the next attack when it fires.
    pub fn ready(&mut self, now: f32, fire_rate: f32) -> bool {
        if now < self.next_fire_time {
            return false;
        }
        self.next_fire_time = now + 1.0 / fire_rate.max(MIN_FIRE_RATE);
        true
    }
}

/// Eight compass directions in enumeration order E, NE, N, NW, W, SW, S, SE.
pub fn compass_directions() -> [Vec2; 8] {
    let d = std::f32::consts::FRAC_1_SQRT_2;
    [
        Vec2::X,
        Vec2::new(d, d),
        Vec2::Y,
        Vec2::new(-d, d),
        Vec2::NEG_X,
        Vec2::new(-d, -d),
        Vec2::NEG_Y,
        Vec2::new(d, -d),
    ]
}

/// Compass direction with the largest dot product; the first one wins ties.
pub fn snap_to_8_directions(aim: Vec2) -> Vec2 {
    let mut best = Vec2::X;
    let mut best_dot = f32::NEG_INFINITY;
    for dir in compass_directions() {
        let dot = aim.dot(dir);
        if dot > best_dot {
            best = dir;
            best_dot = dot;
        }
    }
    best
}

// ── Weapon capability ─────────────────────────────────────────────────────────

/// Everything a weapon may read during one tick.
pub struct AttackContext<'a> {
    pub now: f32,
    pub dt: f32,
    pub origin: Vec2,
    /// Unit aim vector.
    pub aim: Vec2,
    pub enemies: &'a EnemyRegistry,
    pub rng: &'a mut dyn RngCore,
}

/// What a weapon wants done after a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WeaponAction {
    Damage {
        target: Entity,
        amount: f32,
        critical: bool,
        source: Vec2,
        knockback: f32,
    },
    SpawnProjectile {
        position: Vec2,
        projectile: Projectile,
    },
    SpawnSlash {
        position: Vec2,
        volume: SlashVolume,
    },
    SpawnHoming {
        position: Vec2,
        unit: HomingUnit,
    },
}

pub trait Weapon {
    fn kind(&self) -> WeaponKind;
    fn stats(&self) -> &WeaponStats;
    fn stats_mut(&mut self) -> &mut WeaponStats;
    fn timer_mut(&mut self) -> &mut FireTimer;

    /// One attack; called when the fire timer allows it.
    fn attack(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction>;

    /// Continuous per-tick behaviour, run before the fire-timer check.
    fn advance(&mut self, _ctx: &mut AttackContext) -> Vec<WeaponAction> {
        Vec::new()
    }

    /// Weapon-specific response to a level-up upgrade.
    fn apply_upgrade(&mut self, level: u32) {
        info!("{:?} weapon upgraded to level {level}", self.kind());
    }

    fn tick(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        let mut actions = self.advance(ctx);
        let rate = self.stats().fire_rate();
        if self.timer_mut().ready(ctx.now, rate) {
            actions.extend(self.attack(ctx));
        }
        actions
    }
}

// ── Instance component ────────────────────────────────────────────────────────

/// One equipped weapon.  Lives on a child entity of the player.
#[derive(Component, Debug, Clone)]
pub enum WeaponInstance {
    Projectile(ProjectileWeapon),
    Orbit(OrbitWeapon),
    Homing(HomingWeapon),
    Slash(SlashWeapon),
}

/// Which unlockable weapon this instance is; `None` for the starter weapon.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponSlot(pub Option<WeaponId>);

impl WeaponInstance {
    pub fn for_id(id: WeaponId, config: &GameConfig) -> Self {
        match id {
            WeaponId::Paku => Self::Orbit(OrbitWeapon::from_config(config)),
            WeaponId::Keris => Self::Homing(HomingWeapon::from_config(config)),
            WeaponId::BukuMantra => Self::Projectile(ProjectileWeapon::from_config(config)),
            WeaponId::BonekaSantet => Self::Slash(SlashWeapon::from_config(config)),
        }
    }

    pub fn for_starter(starter: StarterWeapon, config: &GameConfig) -> Self {
        match starter {
            StarterWeapon::WeaponA => Self::Projectile(ProjectileWeapon::from_config(config)),
            StarterWeapon::WeaponB => Self::Slash(SlashWeapon::from_config(config)),
            StarterWeapon::WeaponC => Self::Orbit(OrbitWeapon::from_config(config)),
        }
    }

    pub fn as_weapon(&self) -> &dyn Weapon {
        match self {
            Self::Projectile(w) => w,
            Self::Orbit(w) => w,
            Self::Homing(w) => w,
            Self::Slash(w) => w,
        }
    }

    pub fn as_weapon_mut(&mut self) -> &mut dyn Weapon {
        match self {
            Self::Projectile(w) => w,
            Self::Orbit(w) => w,
            Self::Homing(w) => w,
            Self::Slash(w) => w,
        }
    }

    pub fn kind(&self) -> WeaponKind {
        self.as_weapon().kind()
    }

    pub fn stats(&self) -> &WeaponStats {
        self.as_weapon().stats()
    }

    pub fn stats_mut(&mut self) -> &mut WeaponStats {
        self.as_weapon_mut().stats_mut()
    }

    pub fn tick(&mut self, ctx: &mut AttackContext) -> Vec<WeaponAction> {
        self.as_weapon_mut().tick(ctx)
    }

    pub fn apply_upgrade(&mut self, level: u32) {
        self.as_weapon_mut().apply_upgrade(level);
    }

    /// Bring a freshly created weapon in line with the upgrades already taken.
    pub fn apply_player_stats(&mut self, stats: &PlayerStats) {
        let ranged = self.kind().is_ranged();
        let weapon_stats = self.stats_mut();
        if ranged {
            weapon_stats.damage *= stats.intelligence();
            let rate = weapon_stats.fire_rate() * stats.wisdom();
            weapon_stats.set_fire_rate(rate);
            weapon_stats.critical_chance = stats.luck();
        } else {
            weapon_stats.damage *= stats.strength();
        }
    }
}

/// Attach `weapon` to `player` as a child entity.
pub fn spawn_weapon(
    commands: &mut Commands,
    player: Entity,
    weapon: WeaponInstance,
    slot: WeaponSlot,
) {
    let kind = weapon.kind();
    commands.spawn((
        weapon,
        slot,
        Transform::default(),
        Visibility::default(),
        ChildOf(player),
    ));
    info!("Weapon equipped: {kind:?} ({slot:?})");
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EnemyRegistry::default())
            .add_message::<DamageEnemyRequest>()
            .add_systems(
                Update,
                (
                    rebuild_enemy_registry_system,
                    weapon_tick_system,
                    projectile::projectile_motion_system,
                    projectile::projectile_hit_system,
                    homing::homing_unit_system,
                    slash::slash_volume_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Tick every equipped weapon and carry out the actions it returns.
#[allow(clippy::too_many_arguments)]
pub fn weapon_tick_system(
    mut commands: Commands,
    time: Res<Time>,
    registry: Res<EnemyRegistry>,
    aim: Res<AimDirection>,
    mut rng: ResMut<GameRng>,
    q_player: Query<&Transform, With<Player>>,
    mut q_weapons: Query<(Entity, &mut WeaponInstance)>,
    q_homing: Query<&HomingOwner>,
    mut damage: MessageWriter<DamageEnemyRequest>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let origin = player_transform.translation.truncate();

    let mut live_units: HashMap<Entity, u32> = HashMap::new();
    for owner in q_homing.iter() {
        *live_units.entry(owner.0).or_default() += 1;
    }

    for (weapon_entity, mut weapon) in q_weapons.iter_mut() {
        if let WeaponInstance::Homing(homing) = &mut *weapon {
            homing.set_live_units(live_units.get(&weapon_entity).copied().unwrap_or(0));
        }

        let mut ctx = AttackContext {
            now: time.elapsed_secs(),
            dt: time.delta_secs(),
            origin,
            aim: aim.0.normalize_or(Vec2::X),
            enemies: &*registry,
            rng: &mut rng.0,
        };

        for action in weapon.tick(&mut ctx) {
            match action {
                WeaponAction::Damage {
                    target,
                    amount,
                    critical,
                    source,
                    knockback,
                } => {
                    damage.write(DamageEnemyRequest {
                        target,
                        amount,
                        critical,
                        source,
                        knockback,
                    });
                }
                WeaponAction::SpawnProjectile {
                    position,
                    projectile,
                } => {
                    commands.spawn((
                        projectile,
                        Transform::from_translation(position.extend(0.0)),
                        Visibility::default(),
                    ));
                }
                WeaponAction::SpawnSlash { position, volume } => {
                    commands.spawn((
                        volume,
                        Transform::from_translation(position.extend(0.0)),
                        Visibility::default(),
                    ));
                }
                WeaponAction::SpawnHoming { position, unit } => {
                    commands.spawn((
                        unit,
                        HomingOwner(weapon_entity),
                        Transform::from_translation(position.extend(0.0)),
                        Visibility::default(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::spatial_partition::EnemyEntry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A registry holding one enemy per position, spawn order = index.
    pub fn registry_with(world: &mut World, positions: &[(Vec2, f32)]) -> (EnemyRegistry, Vec<Entity>) {
        let mut entities = Vec::new();
        let mut entries = Vec::new();
        for (order, &(position, radius)) in positions.iter().enumerate() {
            let entity = world.spawn_empty().id();
            entities.push(entity);
            entries.push(EnemyEntry {
                entity,
                position,
                radius,
                order: order as u64,
            });
        }
        let mut registry = EnemyRegistry::default();
        registry.rebuild(entries);
        (registry, entities)
    }

    pub fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    pub fn damage_targets(actions: &[WeaponAction]) -> Vec<Entity> {
        actions
            .iter()
            .filter_map(|a| match a {
                WeaponAction::Damage { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn fire_timer_fires_once_per_interval() {
        let mut timer = FireTimer::default();
        assert!(timer.ready(0.0, 2.0), "first attack is immediate");
        assert!(!timer.ready(0.25, 2.0));
        assert!(timer.ready(0.5, 2.0));
        assert!((timer.next_fire_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_fire_rate_is_clamped() {
        let stats = WeaponStats::new(10.0, 0.0, 5.0, 0.1);
        assert_eq!(stats.fire_rate(), MIN_FIRE_RATE);
        let mut timer = FireTimer::default();
        assert!(timer.ready(0.0, 0.0));
        assert!(timer.next_fire_time().is_finite());
    }

    #[test]
    fn snap_picks_nearest_compass_direction() {
        let d = std::f32::consts::FRAC_1_SQRT_2;
        assert_eq!(snap_to_8_directions(Vec2::new(1.0, 0.3)), Vec2::X);
        assert_eq!(snap_to_8_directions(Vec2::new(0.9, 1.0)), Vec2::new(d, d));
        assert_eq!(snap_to_8_directions(Vec2::new(-0.1, -1.0)), Vec2::NEG_Y);
        // All dot products are zero: enumeration order decides.
        assert_eq!(snap_to_8_directions(Vec2::ZERO), Vec2::X);
    }

    #[test]
    fn critical_roll_doubles_damage() {
        let stats = WeaponStats::new(10.0, 1.0, 5.0, 1.0);
        // StepRng(0, 0) always yields 0, which is below any positive chance.
        let mut always_low = StepRng::new(0, 0);
        assert_eq!(stats.roll_damage(&mut always_low), (20.0, true));

        let no_crit = WeaponStats::new(10.0, 1.0, 5.0, 0.0);
        assert_eq!(no_crit.roll_damage(&mut always_low), (10.0, false));
    }

    #[test]
    fn player_stats_scale_new_weapons() {
        let config = GameConfig::default();
        let mut stats = PlayerStats::default();
        stats.upgrade_intelligence(1.2);
        stats.upgrade_strength(1.5);

        let mut ranged = WeaponInstance::for_id(WeaponId::BukuMantra, &config);
        ranged.apply_player_stats(&stats);
        assert!((ranged.stats().damage - config.weapon_damage * 1.2).abs() < 1e-4);

        let mut melee = WeaponInstance::for_id(WeaponId::BonekaSantet, &config);
        melee.apply_player_stats(&stats);
        assert!((melee.stats().damage - config.slash_damage * 1.5).abs() < 1e-4);
    }

    #[test]
    fn starter_mapping_matches_weapon_kinds() {
        let config = GameConfig::default();
        assert_eq!(
            WeaponInstance::for_starter(StarterWeapon::WeaponA, &config).kind(),
            WeaponKind::Projectile
        );
        assert_eq!(
            WeaponInstance::for_starter(StarterWeapon::WeaponB, &config).kind(),
            WeaponKind::Slash
        );
        assert_eq!(
            WeaponInstance::for_starter(StarterWeapon::WeaponC, &config).kind(),
            WeaponKind::Orbit
        );
    }
}
