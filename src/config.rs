//! Runtime gameplay configuration loaded from `assets/game.toml`.
//!
//! [`GameConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_game_config`] reads
//! `assets/game.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the constants you care about.
//!
//! Values that would break the simulation (zero fire rate, luck outside
//! `[0, 1]`, non-positive durations) are rejected by [`GameConfig::sanitize`]
//! and replaced with their defaults; each rejection is reported to
//! [`Diagnostics`].
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `GameConfig::default()`.

use crate::constants::*;
use crate::enemy::EnemyData;
use crate::error::{
    validate_fire_rate, validate_positive, validate_unit_interval, Diagnostics, GameError,
    GameResult,
};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

pub const CONFIG_PATH: &str = "assets/game.toml";

/// Runtime-tunable gameplay configuration.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub rng_seed: Option<u64>,

    // ── Progression ───────────────────────────────────────────────────────────
    pub base_xp_required: f32,
    pub xp_growth_rate: f32,
    pub max_level: u32,
    pub max_upgrade_level: u32,

    // ── Player: Stats ─────────────────────────────────────────────────────────
    pub player_max_hp: f32,
    pub player_strength: f32,
    pub player_intelligence: f32,
    pub player_wisdom: f32,
    pub player_speed: f32,
    pub player_luck: f32,
    pub player_dodge_count: u32,

    // ── Player: Movement / Dodge ──────────────────────────────────────────────
    pub player_acceleration: f32,
    pub player_deceleration: f32,
    pub player_collider_radius: f32,
    pub dodge_speed: f32,
    pub dodge_duration: f32,
    pub dodge_cooldown: f32,

    // ── Weapons ───────────────────────────────────────────────────────────────
    pub weapon_damage: f32,
    pub weapon_fire_rate: f32,
    pub weapon_range: f32,
    pub weapon_critical_chance: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub spin_duration: f32,
    pub orbit_radius: f32,
    pub orbit_speed_deg: f32,
    pub orbit_weapon_count: u32,
    pub homing_spawn_count: u32,
    pub homing_speed: f32,
    pub homing_rotate_speed_deg: f32,
    pub homing_damage: f32,
    pub slash_attack_interval: f32,
    pub slash_damage: f32,
    pub slash_range: f32,
    pub slash_angle_deg: f32,
    pub slash_offset: f32,

    // ── Enemy ─────────────────────────────────────────────────────────────────
    pub enemy_templates: Vec<EnemyData>,
    pub enemy_collider_radius: f32,
    pub enemy_max_distance_from_player: f32,
    pub enemy_death_knockback: f32,
    pub enemy_fade_time: f32,

    // ── Enemy: Waves ──────────────────────────────────────────────────────────
    pub enemy_spawn_radius: f32,
    pub enemy_spawn_base_interval: f32,
    pub enemy_spawn_interval_step: f32,
    pub enemy_spawn_min_interval: f32,
    pub enemy_stage_secs: f32,
    pub enemy_max_alive: usize,

    // ── Pickups / Presentation ────────────────────────────────────────────────
    pub xp_pickup_radius: f32,
    pub hud_font_size: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            // Progression
            base_xp_required: BASE_XP_REQUIRED,
            xp_growth_rate: XP_GROWTH_RATE,
            max_level: MAX_LEVEL,
            max_upgrade_level: MAX_UPGRADE_LEVEL,
            // Player: Stats
            player_max_hp: PLAYER_MAX_HP,
            player_strength: PLAYER_STRENGTH,
            player_intelligence: PLAYER_INTELLIGENCE,
            player_wisdom: PLAYER_WISDOM,
            player_speed: PLAYER_SPEED,
            player_luck: PLAYER_LUCK,
            player_dodge_count: PLAYER_DODGE_COUNT,
            // Player: Movement / Dodge
            player_acceleration: PLAYER_ACCELERATION,
            player_deceleration: PLAYER_DECELERATION,
            player_collider_radius: PLAYER_COLLIDER_RADIUS,
            dodge_speed: DODGE_SPEED,
            dodge_duration: DODGE_DURATION,
            dodge_cooldown: DODGE_COOLDOWN,
            // Weapons
            weapon_damage: WEAPON_DAMAGE,
            weapon_fire_rate: WEAPON_FIRE_RATE,
            weapon_range: WEAPON_RANGE,
            weapon_critical_chance: WEAPON_CRITICAL_CHANCE,
            projectile_speed: PROJECTILE_SPEED,
            projectile_lifetime: PROJECTILE_LIFETIME,
            spin_duration: SPIN_DURATION,
            orbit_radius: ORBIT_RADIUS,
            orbit_speed_deg: ORBIT_SPEED_DEG,
            orbit_weapon_count: ORBIT_WEAPON_COUNT,
            homing_spawn_count: HOMING_SPAWN_COUNT,
            homing_speed: HOMING_SPEED,
            homing_rotate_speed_deg: HOMING_ROTATE_SPEED_DEG,
            homing_damage: HOMING_DAMAGE,
            slash_attack_interval: SLASH_ATTACK_INTERVAL,
            slash_damage: SLASH_DAMAGE,
            slash_range: SLASH_RANGE,
            slash_angle_deg: SLASH_ANGLE_DEG,
            slash_offset: SLASH_OFFSET,
            // Enemy
            enemy_templates: vec![EnemyData::default()],
            enemy_collider_radius: ENEMY_COLLIDER_RADIUS,
            enemy_max_distance_from_player: ENEMY_MAX_DISTANCE_FROM_PLAYER,
            enemy_death_knockback: ENEMY_DEATH_KNOCKBACK,
            enemy_fade_time: ENEMY_FADE_TIME,
            // Enemy: Waves
            enemy_spawn_radius: ENEMY_SPAWN_RADIUS,
            enemy_spawn_base_interval: ENEMY_SPAWN_BASE_INTERVAL,
            enemy_spawn_interval_step: ENEMY_SPAWN_INTERVAL_STEP,
            enemy_spawn_min_interval: ENEMY_SPAWN_MIN_INTERVAL,
            enemy_stage_secs: ENEMY_STAGE_SECS,
            enemy_max_alive: ENEMY_MAX_ALIVE,
            // Pickups / Presentation
            xp_pickup_radius: XP_PICKUP_RADIUS,
            hud_font_size: HUD_FONT_SIZE,
        }
    }
}

impl GameConfig {
    /// Replace every out-of-range value with its compiled default.
    ///
    /// Returns the number of values that were rejected.
    pub fn sanitize(&mut self, diagnostics: &mut Diagnostics) -> usize {
        let defaults = GameConfig::default();
        let mut rejected = 0;

        let mut check = |result: GameResult<()>, field: &mut f32, default: f32| {
            if let Err(err) = result {
                diagnostics.report(err);
                *field = default;
                rejected += 1;
            }
        };

        check(
            validate_positive("base_xp_required", self.base_xp_required),
            &mut self.base_xp_required,
            defaults.base_xp_required,
        );
        check(
            validate_positive("xp_growth_rate", self.xp_growth_rate),
            &mut self.xp_growth_rate,
            defaults.xp_growth_rate,
        );
        check(
            validate_fire_rate("weapon_fire_rate", self.weapon_fire_rate),
            &mut self.weapon_fire_rate,
            defaults.weapon_fire_rate,
        );
        check(
            validate_positive("slash_attack_interval", self.slash_attack_interval),
            &mut self.slash_attack_interval,
            defaults.slash_attack_interval,
        );
        check(
            validate_unit_interval("player_luck", self.player_luck),
            &mut self.player_luck,
            defaults.player_luck,
        );
        check(
            validate_unit_interval("weapon_critical_chance", self.weapon_critical_chance),
            &mut self.weapon_critical_chance,
            defaults.weapon_critical_chance,
        );
        check(
            validate_positive("spin_duration", self.spin_duration),
            &mut self.spin_duration,
            defaults.spin_duration,
        );
        check(
            validate_positive("dodge_duration", self.dodge_duration),
            &mut self.dodge_duration,
            defaults.dodge_duration,
        );
        check(
            validate_positive("enemy_fade_time", self.enemy_fade_time),
            &mut self.enemy_fade_time,
            defaults.enemy_fade_time,
        );
        check(
            validate_positive("enemy_spawn_min_interval", self.enemy_spawn_min_interval),
            &mut self.enemy_spawn_min_interval,
            defaults.enemy_spawn_min_interval,
        );

        if self.max_level == 0 {
            self.max_level = defaults.max_level;
            rejected += 1;
        }
        if self.max_upgrade_level == 0 {
            diagnostics.report(GameError::UnsafeConstant {
                name: "max_upgrade_level",
                value: 0.0,
                safe_range: ">= 1",
            });
            self.max_upgrade_level = defaults.max_upgrade_level;
            rejected += 1;
        }
        if self.player_dodge_count == 0 {
            self.player_dodge_count = 1;
            rejected += 1;
        }
        if self.enemy_templates.is_empty() {
            self.enemy_templates = defaults.enemy_templates;
            rejected += 1;
        }

        rejected
    }
}

/// Startup system: attempt to load `assets/game.toml` and overwrite the
/// `GameConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are logged
/// but do not abort the game.  A missing file is not an error.
pub fn load_game_config(mut config: ResMut<GameConfig>, mut diagnostics: ResMut<Diagnostics>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match toml::from_str::<GameConfig>(&contents) {
            Ok(loaded) => {
                *config = loaded;
                println!("✓ Loaded game config from {CONFIG_PATH}");
            }
            Err(e) => {
                warn!("Failed to parse {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            println!("ℹ No {CONFIG_PATH} found; using compiled defaults");
        }
    }

    let rejected = config.sanitize(&mut diagnostics);
    if rejected > 0 {
        warn!("{rejected} config value(s) out of range; defaults restored");
    }
}

// ── Randomness ────────────────────────────────────────────────────────────────

/// Shared RNG for critical rolls, upgrade shuffles, and death knockback.
#[derive(Resource)]
pub struct GameRng(pub StdRng);

impl Default for GameRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Startup system: reseed [`GameRng`] when the config pins a seed.
/// Must run after [`load_game_config`].
pub fn seed_game_rng(config: Res<GameConfig>, mut rng: ResMut<GameRng>) {
    if let Some(seed) = config.rng_seed {
        *rng = GameRng::seeded(seed);
        println!("ℹ RNG seeded with {seed}");
    }
}
