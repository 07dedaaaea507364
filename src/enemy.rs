//! Enemy agents: wave spawning, straight-line pursuit, damage intake, and the
//! timed death sequence.
//!
//! ## Lifecycle
//!
//! ```text
//! Alive ──(health ≤ 0)──▶ Dying { elapsed, velocity } ──(elapsed ≥ fade_time)──▶ Removed
//! ```
//!
//! Every timed behaviour (hit flash, distance cull, death fade) is a countdown
//! on [`Enemy`] advanced once per frame by [`enemy_lifecycle_system`].  A dying
//! enemy ignores further damage, deals no contact damage, and is skipped by
//! the weapon registry.

use crate::config::{GameConfig, GameRng};
use crate::constants::*;
use crate::events::{DamageEnemyRequest, EnemyKilled, FloatingTextRequest, HealthChanged, PlayerDied};
use crate::health::{DamageOutcome, Health};
use crate::menu::GameState;
use crate::pickup::spawn_xp_orb;
use crate::player::Player;
use crate::stats::PlayerStats;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::{Rng, RngCore};
use serde::Deserialize;

// ── Data ──────────────────────────────────────────────────────────────────────

/// Per-type enemy template; any field left out of `assets/game.toml` keeps its
/// default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyData {
    pub max_health: f32,
    pub move_speed: f32,
    pub damage: f32,
    pub xp_drop_amount: f32,
}

impl Default for EnemyData {
    fn default() -> Self {
        Self {
            max_health: ENEMY_MAX_HEALTH,
            move_speed: ENEMY_MOVE_SPEED,
            damage: ENEMY_DAMAGE,
            xp_drop_amount: ENEMY_XP_DROP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyPhase {
    Alive,
    Dying { elapsed: f32, velocity: Vec2 },
    Removed,
}

/// Result of one [`Enemy::advance`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyTick {
    Keep,
    /// Too far from the player; remove immediately.
    Cull,
    /// Death fade finished.
    Remove,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Enemy {
    current_health: f32,
    max_health: f32,
    pub move_speed: f32,
    pub damage: f32,
    pub xp_drop: f32,
    /// Body radius used by weapon overlap queries.
    pub radius: f32,
    pub facing_left: bool,
    phase: EnemyPhase,
    flash_remaining: f32,
    cull_timer: f32,
    fade_time: f32,
    max_distance: f32,
    knockback_force: f32,
}

/// Monotonic spawn index; weapons enumerate enemies in this order.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

impl Enemy {
    pub fn from_data(data: &EnemyData, config: &GameConfig) -> Self {
        Self {
            current_health: data.max_health,
            max_health: data.max_health,
            move_speed: data.move_speed,
            damage: data.damage,
            xp_drop: data.xp_drop_amount,
            radius: config.enemy_collider_radius,
            facing_left: false,
            phase: EnemyPhase::Alive,
            flash_remaining: 0.0,
            cull_timer: ENEMY_CULL_CHECK_INTERVAL,
            fade_time: config.enemy_fade_time,
            max_distance: config.enemy_max_distance_from_player,
            knockback_force: config.enemy_death_knockback,
        }
    }

    pub fn current_health(&self) -> f32 {
        self.current_health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn phase(&self) -> EnemyPhase {
        self.phase
    }

    pub fn is_alive(&self) -> bool {
        self.phase == EnemyPhase::Alive
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_remaining > 0.0
    }

    /// Opacity: 1 while alive, linear fade to 0 while dying.
    pub fn alpha(&self) -> f32 {
        match self.phase {
            EnemyPhase::Alive => 1.0,
            EnemyPhase::Dying { elapsed, .. } => (1.0 - elapsed / self.fade_time).clamp(0.0, 1.0),
            EnemyPhase::Removed => 0.0,
        }
    }

    /// Knockback velocity of the death sequence, if dying.
    pub fn dying_velocity(&self) -> Option<Vec2> {
        match self.phase {
            EnemyPhase::Dying { velocity, .. } => Some(velocity),
            _ => None,
        }
    }

    /// Apply `amount` damage.  A hit that brings health to zero starts the
    /// death sequence; any hit after that is `Ignored`.
    pub fn take_damage(
        &mut self,
        amount: f32,
        position: Vec2,
        player_position: Option<Vec2>,
        rng: &mut dyn RngCore,
    ) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        self.current_health -= amount;
        if self.current_health > 0.0 {
            self.flash_remaining = ENEMY_FLASH_DURATION;
            return DamageOutcome::Damaged { applied: amount };
        }

        let direction = death_knockback_direction(position, player_position, rng);
        self.flash_remaining = 0.0;
        self.phase = EnemyPhase::Dying {
            elapsed: 0.0,
            velocity: direction * self.knockback_force,
        };
        DamageOutcome::Died { applied: amount }
    }

    /// Advance flash, cull check and death fade by `dt`.
    ///
    /// `distance_to_player` is `None` when there is no player; culling is
    /// skipped in that case.
    pub fn advance(&mut self, dt: f32, distance_to_player: Option<f32>) -> EnemyTick {
        self.flash_remaining = (self.flash_remaining - dt).max(0.0);

        match &mut self.phase {
            EnemyPhase::Alive => {
                self.cull_timer -= dt;
                if self.cull_timer > 0.0 {
                    return EnemyTick::Keep;
                }
                self.cull_timer += ENEMY_CULL_CHECK_INTERVAL;
                match distance_to_player {
                    Some(distance) if distance > self.max_distance => EnemyTick::Cull,
                    _ => EnemyTick::Keep,
                }
            }
            EnemyPhase::Dying { elapsed, velocity } => {
                *elapsed += dt;
                *velocity = velocity.lerp(Vec2::ZERO, (dt * ENEMY_KNOCKBACK_DAMPING).min(1.0));
                if *elapsed >= self.fade_time {
                    self.phase = EnemyPhase::Removed;
                    EnemyTick::Remove
                } else {
                    EnemyTick::Keep
                }
            }
            EnemyPhase::Removed => EnemyTick::Remove,
        }
    }
}

/// Away from the player with a small random perturbation, or a random
/// horizontal direction when there is no player.
pub fn death_knockback_direction(
    position: Vec2,
    player_position: Option<Vec2>,
    rng: &mut dyn RngCore,
) -> Vec2 {
    let Some(player) = player_position else {
        return if rng.gen::<bool>() { Vec2::X } else { Vec2::NEG_X };
    };
    let away = (position - player).normalize_or(Vec2::X);
    let jitter = Vec2::new(
        rng.gen_range(-ENEMY_KNOCKBACK_JITTER_X..=ENEMY_KNOCKBACK_JITTER_X),
        rng.gen_range(-ENEMY_KNOCKBACK_JITTER_Y..=ENEMY_KNOCKBACK_JITTER_Y),
    );
    (away + jitter).normalize_or(away)
}

// ── Waves ─────────────────────────────────────────────────────────────────────

#[derive(Resource, Debug, Clone, Default)]
pub struct EnemySpawnState {
    pub timer_secs: f32,
    pub session_elapsed_secs: f32,
    pub total_spawned: u64,
}

fn deterministic_spawn_offset(index: u64, radius: f32) -> Vec2 {
    const GOLDEN_ANGLE: f32 = 2.3999631;
    let a = index as f32 * GOLDEN_ANGLE;
    Vec2::new(a.cos(), a.sin()) * radius
}

/// Seconds until the next spawn after `elapsed_secs` of play.
fn spawn_interval(config: &GameConfig, elapsed_secs: f32) -> f32 {
    let stage = (elapsed_secs / config.enemy_stage_secs.max(1.0)).floor();
    (config.enemy_spawn_base_interval - stage * config.enemy_spawn_interval_step)
        .max(config.enemy_spawn_min_interval)
}

/// Spawn one enemy from `data` at `position`.
pub fn spawn_enemy(
    commands: &mut Commands,
    data: &EnemyData,
    config: &GameConfig,
    position: Vec2,
    order: u64,
) -> Entity {
    commands
        .spawn((
            Enemy::from_data(data, config),
            SpawnOrder(order),
            Transform::from_translation(position.extend(0.1)),
            Visibility::default(),
            RigidBody::Dynamic,
            Collider::ball(config.enemy_collider_radius),
            Velocity::zero(),
            ExternalImpulse::default(),
            LockedAxes::ROTATION_LOCKED,
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EnemySpawnState::default())
            .add_systems(OnExit(GameState::MainMenu), reset_spawn_state_system)
            .add_systems(
                Update,
                (
                    enemy_session_clock_system,
                    enemy_spawn_system,
                    enemy_damage_system,
                    enemy_contact_damage_system,
                    enemy_lifecycle_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                FixedUpdate,
                enemy_pursuit_system.run_if(in_state(GameState::Playing)),
            );
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

fn reset_spawn_state_system(mut state: ResMut<EnemySpawnState>) {
    *state = EnemySpawnState::default();
}

fn enemy_session_clock_system(time: Res<Time>, mut state: ResMut<EnemySpawnState>) {
    state.session_elapsed_secs += time.delta_secs();
}

fn enemy_spawn_system(
    mut commands: Commands,
    time: Res<Time>,
    mut state: ResMut<EnemySpawnState>,
    config: Res<GameConfig>,
    q_player: Query<&Transform, With<Player>>,
    q_enemies: Query<(), With<Enemy>>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };

    state.timer_secs -= time.delta_secs();
    if state.timer_secs > 0.0 {
        return;
    }
    if q_enemies.iter().count() >= config.enemy_max_alive {
        state.timer_secs = state.timer_secs.max(0.25);
        return;
    }
    let Some(template) = config
        .enemy_templates
        .get(state.total_spawned as usize % config.enemy_templates.len().max(1))
    else {
        return;
    };

    let player_pos = player_transform.translation.truncate();
    let pos = player_pos + deterministic_spawn_offset(state.total_spawned, config.enemy_spawn_radius);
    spawn_enemy(&mut commands, template, &config, pos, state.total_spawned);

    state.total_spawned += 1;
    state.timer_secs = spawn_interval(&config, state.session_elapsed_secs);
}

/// Straight-line pursuit every physics step; dying enemies drift on their
/// knockback velocity instead.
pub fn enemy_pursuit_system(
    q_player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut q_enemy: Query<(&Transform, &mut Velocity, &mut Enemy)>,
) {
    let player_pos = q_player.single().ok().map(|t| t.translation.truncate());

    for (transform, mut velocity, mut enemy) in q_enemy.iter_mut() {
        if let Some(knockback) = enemy.dying_velocity() {
            velocity.linvel = knockback;
            continue;
        }
        let Some(target) = player_pos else {
            velocity.linvel = Vec2::ZERO;
            continue;
        };
        let dir = (target - transform.translation.truncate()).normalize_or_zero();
        velocity.linvel = dir * enemy.move_speed;
        if dir.x != 0.0 {
            enemy.facing_left = dir.x < 0.0;
        }
    }
}

/// Apply weapon hits.  Requests for entities without an [`Enemy`] are dropped.
#[allow(clippy::too_many_arguments)]
pub fn enemy_damage_system(
    mut commands: Commands,
    mut requests: MessageReader<DamageEnemyRequest>,
    mut rng: ResMut<GameRng>,
    q_player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut q_enemy: Query<(&Transform, &mut Enemy, Option<&mut ExternalImpulse>)>,
    mut killed: MessageWriter<EnemyKilled>,
    mut floating_text: MessageWriter<FloatingTextRequest>,
) {
    let player_pos = q_player.single().ok().map(|t| t.translation.truncate());

    for request in requests.read() {
        let Ok((transform, mut enemy, impulse)) = q_enemy.get_mut(request.target) else {
            debug!("Damage request for {} ignored: not an enemy", request.target);
            continue;
        };
        let position = transform.translation.truncate();

        let outcome = enemy.take_damage(request.amount, position, player_pos, &mut rng.0);
        if outcome == DamageOutcome::Ignored {
            continue;
        }

        let label = if request.critical {
            format!("{:.0}!", request.amount)
        } else {
            format!("{:.0}", request.amount)
        };
        floating_text.write(FloatingTextRequest {
            text: label,
            position: position + Vec2::Y * FLOATING_TEXT_HEIGHT,
            color: Color::WHITE,
        });

        match outcome {
            DamageOutcome::Damaged { .. } => {
                if request.knockback > 0.0 {
                    if let Some(mut impulse) = impulse {
                        let away = (position - request.source).normalize_or_zero();
                        impulse.impulse += away * request.knockback;
                    }
                }
            }
            DamageOutcome::Died { .. } => {
                commands.entity(request.target).insert(ColliderDisabled);
                killed.write(EnemyKilled {
                    entity: request.target,
                    position,
                });
                spawn_xp_orb(&mut commands, position, enemy.xp_drop);
            }
            DamageOutcome::Ignored => {}
        }
    }
}

/// Contact damage: each new player/enemy contact hurts the player once.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn enemy_contact_damage_system(
    mut collision_events: MessageReader<CollisionEvent>,
    mut q_player: Query<(Entity, &Transform, &mut Health, Option<&mut PlayerStats>), With<Player>>,
    q_enemy: Query<&Enemy>,
    mut floating_text: MessageWriter<FloatingTextRequest>,
    mut health_changed: MessageWriter<HealthChanged>,
    mut player_died: MessageWriter<PlayerDied>,
) {
    let Ok((player, transform, mut health, mut stats)) = q_player.single_mut() else {
        return;
    };

    for event in collision_events.read() {
        let CollisionEvent::Started(e1, e2, _) = *event else {
            continue;
        };
        let other = if e1 == player {
            e2
        } else if e2 == player {
            e1
        } else {
            continue;
        };
        let Ok(enemy) = q_enemy.get(other) else {
            continue;
        };
        if !enemy.is_alive() || health.current() <= 0.0 {
            continue;
        }

        let outcome = health.take_damage(enemy.damage);
        let applied = match outcome {
            DamageOutcome::Ignored => continue,
            DamageOutcome::Damaged { applied } | DamageOutcome::Died { applied } => applied,
        };

        if let Some(stats) = stats.as_deref_mut() {
            stats.sync_current_hp(health.current());
        }
        floating_text.write(FloatingTextRequest {
            text: format!("{applied:.0}"),
            position: transform.translation.truncate() + Vec2::Y * FLOATING_TEXT_HEIGHT,
            color: Color::srgb(1.0, 0.2, 0.2),
        });
        health_changed.write(HealthChanged {
            ratio: health.ratio(),
        });
        if matches!(outcome, DamageOutcome::Died { .. }) {
            info!("Player died");
            player_died.write(PlayerDied);
        }
    }
}

/// Advance timers and remove culled or fully faded enemies.
pub fn enemy_lifecycle_system(
    mut commands: Commands,
    time: Res<Time>,
    q_player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut q_enemy: Query<(Entity, &Transform, &mut Enemy)>,
) {
    let dt = time.delta_secs();
    let player_pos = q_player.single().ok().map(|t| t.translation.truncate());

    for (entity, transform, mut enemy) in q_enemy.iter_mut() {
        let distance = player_pos.map(|p| p.distance(transform.translation.truncate()));
        match enemy.advance(dt, distance) {
            EnemyTick::Keep => {}
            EnemyTick::Cull => {
                debug!("Culled distant enemy {entity}");
                commands.entity(entity).despawn();
            }
            EnemyTick::Remove => commands.entity(entity).despawn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pickup::XpOrb;
    use bevy::state::app::StatesPlugin;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn enemy() -> Enemy {
        Enemy::from_data(&EnemyData::default(), &GameConfig::default())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[derive(Resource, Default)]
    struct Counts {
        killed: usize,
        health_changed: usize,
        died: usize,
    }

    fn count_messages(
        mut counts: ResMut<Counts>,
        mut killed: MessageReader<EnemyKilled>,
        mut health: MessageReader<HealthChanged>,
        mut died: MessageReader<PlayerDied>,
    ) {
        counts.killed += killed.read().count();
        counts.health_changed += health.read().count();
        counts.died += died.read().count();
    }

    fn enemy_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<GameState>();
        app.add_message::<CollisionEvent>();
        app.add_plugins(crate::events::GameEventsPlugin);
        app.insert_resource(GameConfig::default());
        app.insert_resource(GameRng::seeded(3));
        app.init_resource::<Counts>();
        app
    }

    #[test]
    fn damage_after_death_is_ignored() {
        let mut e = enemy();
        let mut rng = rng();
        assert_eq!(
            e.take_damage(1.0, Vec2::ZERO, None, &mut rng),
            DamageOutcome::Damaged { applied: 1.0 }
        );
        assert!(matches!(
            e.take_damage(5.0, Vec2::ZERO, None, &mut rng),
            DamageOutcome::Died { .. }
        ));
        let health_after_death = e.current_health();

        assert_eq!(
            e.take_damage(5.0, Vec2::ZERO, None, &mut rng),
            DamageOutcome::Ignored
        );
        assert_eq!(e.current_health(), health_after_death);
        assert!(!e.is_alive());
    }

    #[test]
    fn death_knockback_points_away_from_player() {
        let mut rng = rng();
        for _ in 0..32 {
            let dir = death_knockback_direction(Vec2::new(5.0, 0.0), Some(Vec2::ZERO), &mut rng);
            assert!(dir.x > 0.9, "direction {dir:?} should point away from the player");
            assert!((dir.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn death_knockback_without_player_is_horizontal() {
        let mut rng = rng();
        for _ in 0..16 {
            let dir = death_knockback_direction(Vec2::ZERO, None, &mut rng);
            assert!(dir == Vec2::X || dir == Vec2::NEG_X);
        }
    }

    #[test]
    fn fade_runs_for_fade_time_then_removes() {
        let mut e = enemy();
        let mut rng = rng();
        e.take_damage(100.0, Vec2::new(1.0, 0.0), Some(Vec2::ZERO), &mut rng);
        let initial_speed = e.dying_velocity().unwrap().length();

        assert_eq!(e.advance(0.4, Some(1.0)), EnemyTick::Keep);
        assert!((e.alpha() - 0.5).abs() < 1e-4, "alpha {}", e.alpha());
        assert!(e.dying_velocity().unwrap().length() < initial_speed);

        assert_eq!(e.advance(0.41, Some(1.0)), EnemyTick::Remove);
        assert_eq!(e.phase(), EnemyPhase::Removed);
        assert_eq!(e.alpha(), 0.0);
    }

    #[test]
    fn cull_check_is_periodic_and_stops_when_dying() {
        let mut e = enemy();
        assert_eq!(e.advance(1.0, Some(100.0)), EnemyTick::Keep, "check not due yet");
        assert_eq!(e.advance(1.0, Some(100.0)), EnemyTick::Cull);

        let mut dying = enemy();
        let mut rng = rng();
        dying.take_damage(100.0, Vec2::ZERO, None, &mut rng);
        assert_eq!(dying.advance(0.5, Some(1_000.0)), EnemyTick::Keep);
    }

    #[test]
    fn flash_starts_on_hit_but_not_on_death() {
        let mut e = enemy();
        let mut rng = rng();
        e.take_damage(1.0, Vec2::ZERO, None, &mut rng);
        assert!(e.is_flashing());
        e.advance(ENEMY_FLASH_DURATION + 0.01, None);
        assert!(!e.is_flashing());

        e.take_damage(100.0, Vec2::ZERO, None, &mut rng);
        assert!(!e.is_flashing());
    }

    #[test]
    fn spawn_offset_is_deterministic() {
        let a = deterministic_spawn_offset(17, 12.0);
        let b = deterministic_spawn_offset(17, 12.0);
        assert!((a - b).length() < 1e-6);
        assert!((a.length() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn spawn_interval_shrinks_to_floor() {
        let cfg = GameConfig::default();
        let early = spawn_interval(&cfg, 0.0);
        let later = spawn_interval(&cfg, cfg.enemy_stage_secs * 3.0);
        assert!(later < early);
        assert_eq!(spawn_interval(&cfg, 1.0e6), cfg.enemy_spawn_min_interval);
    }

    #[test]
    fn lethal_damage_request_kills_and_drops_orb() {
        let mut app = enemy_test_app();
        app.add_systems(Update, (enemy_damage_system, count_messages).chain());

        app.world_mut()
            .spawn((Player, Transform::from_translation(Vec3::ZERO)));
        let target = app
            .world_mut()
            .spawn((
                Enemy::from_data(&EnemyData::default(), &GameConfig::default()),
                Transform::from_translation(Vec3::new(3.0, 0.0, 0.0)),
            ))
            .id();

        app.world_mut().write_message(DamageEnemyRequest {
            target,
            amount: 50.0,
            critical: false,
            source: Vec2::ZERO,
            knockback: 5.0,
        });
        app.update();

        let enemy = app.world().get::<Enemy>(target).unwrap();
        assert!(!enemy.is_alive());
        assert_eq!(app.world().resource::<Counts>().killed, 1);
        let orbs: Vec<f32> = app
            .world_mut()
            .query::<&XpOrb>()
            .iter(app.world())
            .map(|o| o.xp_value)
            .collect();
        assert_eq!(orbs, vec![ENEMY_XP_DROP]);

        // A second hit on the dying enemy neither kills it again nor drops another orb.
        app.world_mut().write_message(DamageEnemyRequest {
            target,
            amount: 50.0,
            critical: false,
            source: Vec2::ZERO,
            knockback: 0.0,
        });
        app.update();
        assert_eq!(app.world().resource::<Counts>().killed, 1);
        assert_eq!(app.world_mut().query::<&XpOrb>().iter(app.world()).count(), 1);
    }

    #[test]
    fn damage_request_for_non_enemy_is_a_no_op() {
        let mut app = enemy_test_app();
        app.add_systems(Update, (enemy_damage_system, count_messages).chain());
        let bystander = app.world_mut().spawn(Transform::default()).id();

        app.world_mut().write_message(DamageEnemyRequest {
            target: bystander,
            amount: 10.0,
            critical: false,
            source: Vec2::ZERO,
            knockback: 0.0,
        });
        app.update();
        assert_eq!(app.world().resource::<Counts>().killed, 0);
    }

    #[test]
    fn contact_damages_player_unless_invincible() {
        let mut app = enemy_test_app();
        app.add_systems(Update, (enemy_contact_damage_system, count_messages).chain());

        let player = app
            .world_mut()
            .spawn((Player, Transform::default(), Health::new(10.0)))
            .id();
        let attacker = app
            .world_mut()
            .spawn(Enemy::from_data(
                &EnemyData {
                    damage: 4.0,
                    ..Default::default()
                },
                &GameConfig::default(),
            ))
            .id();

        app.world_mut().write_message(CollisionEvent::Started(
            attacker,
            player,
            bevy_rapier2d::rapier::geometry::CollisionEventFlags::empty(),
        ));
        app.update();
        assert_eq!(app.world().get::<Health>(player).unwrap().current(), 6.0);
        assert_eq!(app.world().resource::<Counts>().health_changed, 1);

        app.world_mut()
            .get_mut::<Health>(player)
            .unwrap()
            .set_invincible(true);
        app.world_mut().write_message(CollisionEvent::Started(
            player,
            attacker,
            bevy_rapier2d::rapier::geometry::CollisionEventFlags::empty(),
        ));
        app.update();
        assert_eq!(app.world().get::<Health>(player).unwrap().current(), 6.0);
    }

    #[test]
    fn lethal_contact_signals_player_death_once() {
        let mut app = enemy_test_app();
        app.add_systems(Update, (enemy_contact_damage_system, count_messages).chain());

        let player = app
            .world_mut()
            .spawn((Player, Transform::default(), Health::new(3.0)))
            .id();
        let attacker = app
            .world_mut()
            .spawn(Enemy::from_data(
                &EnemyData {
                    damage: 5.0,
                    ..Default::default()
                },
                &GameConfig::default(),
            ))
            .id();

        for _ in 0..2 {
            app.world_mut().write_message(CollisionEvent::Started(
                attacker,
                player,
                bevy_rapier2d::rapier::geometry::CollisionEventFlags::empty(),
            ));
            app.update();
        }
        assert_eq!(app.world().get::<Health>(player).unwrap().current(), 0.0);
        assert_eq!(app.world().resource::<Counts>().died, 1);
    }
}
