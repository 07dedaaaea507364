//! Centralised gameplay and tuning constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//!
//! World units follow the sprite grid of the original art: one unit is one
//! tile, and the camera scale ([`CAMERA_SCALE`]) maps units to pixels.
//!
//! ## Tuning guidance
//!
//! Most values can be overridden at runtime through `assets/game.toml`
//! (see [`crate::config::GameConfig`]).  The constants here remain the
//! authoritative defaults.

// ── Camera ───────────────────────────────────────────────────────────────────

/// Orthographic projection scale (world units per screen pixel).
///
/// `1/48` shows roughly 26 × 15 units in a 1280 × 720 window.
pub const CAMERA_SCALE: f32 = 1.0 / 48.0;

// ── Spatial Grid ─────────────────────────────────────────────────────────────

/// Cell size of the enemy spatial registry (world units).
///
/// Must be at least half the largest overlap query radius (orbit volumes and
/// slash cones are ≤ 2.5 u) to keep queries at 3×3 cells.
pub const GRID_CELL_SIZE: f32 = 4.0;

// ── Progression ──────────────────────────────────────────────────────────────

/// XP required to go from level 1 to level 2.
pub const BASE_XP_REQUIRED: f32 = 10.0;

/// Geometric growth of the XP requirement per level.
///
/// Requirement at level L is `BASE_XP_REQUIRED × XP_GROWTH_RATE^(L−1)`.
pub const XP_GROWTH_RATE: f32 = 1.5;

/// Hard level cap.  XP beyond the cap accumulates but never converts.
pub const MAX_LEVEL: u32 = 100;

/// Maximum number of times a single upgrade kind may be selected.
pub const MAX_UPGRADE_LEVEL: u32 = 5;

/// Options shown on the level-up panel.
pub const UPGRADE_OPTION_COUNT: usize = 3;

// ── Upgrade magnitudes ───────────────────────────────────────────────────────

pub const MAX_HP_UPGRADE_AMOUNT: f32 = 20.0;
pub const STRENGTH_UPGRADE_MULTIPLIER: f32 = 1.2;
pub const INTELLIGENCE_UPGRADE_MULTIPLIER: f32 = 1.2;
pub const WISDOM_UPGRADE_MULTIPLIER: f32 = 1.2;
pub const SPEED_UPGRADE_MULTIPLIER: f32 = 1.15;
pub const LUCK_UPGRADE_AMOUNT: f32 = 0.05;
pub const DODGE_COUNT_UPGRADE_AMOUNT: u32 = 1;

// ── Player: Stats ────────────────────────────────────────────────────────────

pub const PLAYER_MAX_HP: f32 = 100.0;
pub const PLAYER_STRENGTH: f32 = 1.0;
pub const PLAYER_INTELLIGENCE: f32 = 1.0;
pub const PLAYER_WISDOM: f32 = 1.0;

/// Top movement speed (u/s).  Speed upgrades multiply this.
pub const PLAYER_SPEED: f32 = 5.0;

/// Base critical chance fed to ranged weapons; clamped to `[0, 1]`.
pub const PLAYER_LUCK: f32 = 0.1;

pub const PLAYER_DODGE_COUNT: u32 = 2;

// ── Player: Movement ─────────────────────────────────────────────────────────

/// Velocity change per second while input is held (u/s²).
pub const PLAYER_ACCELERATION: f32 = 10.0;

/// Velocity change per second while no input is held (u/s²).
pub const PLAYER_DECELERATION: f32 = 10.0;

pub const PLAYER_COLLIDER_RADIUS: f32 = 0.4;

// ── Player: Dodge ────────────────────────────────────────────────────────────

/// Burst speed applied in the input direction when a dodge starts.
pub const DODGE_SPEED: f32 = 10.0;

/// Seconds of dodge movement + invincibility.
pub const DODGE_DURATION: f32 = 0.3;

/// Shared gate between dodges; all charges restore once it elapses.
pub const DODGE_COOLDOWN: f32 = 2.0;

// ── Weapons: Common ──────────────────────────────────────────────────────────

pub const WEAPON_DAMAGE: f32 = 10.0;

/// Attacks per second.
pub const WEAPON_FIRE_RATE: f32 = 1.0;

pub const WEAPON_RANGE: f32 = 5.0;
pub const WEAPON_CRITICAL_CHANCE: f32 = 0.1;

/// Floor applied to any fire rate so the attack interval stays finite.
pub const MIN_FIRE_RATE: f32 = 0.01;

pub const CRITICAL_DAMAGE_MULTIPLIER: f32 = 2.0;

/// Impulse magnitude of a generic weapon knockback.
pub const WEAPON_KNOCKBACK_IMPULSE: f32 = 5.0;

// ── Weapons: Projectile ──────────────────────────────────────────────────────

pub const PROJECTILE_SPEED: f32 = 10.0;
pub const PROJECTILE_LIFETIME: f32 = 3.0;
pub const PROJECTILE_RADIUS: f32 = 0.2;

// ── Weapons: Orbit / Spin ────────────────────────────────────────────────────

/// Length of one spin episode (seconds).
pub const SPIN_DURATION: f32 = 1.0;

pub const ORBIT_RADIUS: f32 = 2.0;

/// Angular speed of orbiting volumes (degrees per second).
pub const ORBIT_SPEED_DEG: f32 = 360.0;

pub const ORBIT_WEAPON_COUNT: u32 = 1;

/// Cadence of the overlap check during an episode (seconds).
pub const ORBIT_DAMAGE_TICK: f32 = 0.1;

pub const ORBIT_HIT_RADIUS: f32 = 0.5;
pub const ORBIT_KNOCKBACK_IMPULSE: f32 = 8.0;

// ── Weapons: Homing ──────────────────────────────────────────────────────────

pub const HOMING_SPAWN_COUNT: u32 = 1;
pub const HOMING_SPEED: f32 = 5.0;

/// Maximum heading change (degrees per second).
pub const HOMING_ROTATE_SPEED_DEG: f32 = 200.0;

/// Fixed damage per hit; not scaled by the weapon damage stat.
pub const HOMING_DAMAGE: f32 = 2.0;

/// Lateral offset between consecutively spawned units.
pub const HOMING_SPAWN_SPACING: f32 = 1.0;

pub const HOMING_HIT_RADIUS: f32 = 0.3;

// ── Weapons: Melee Cone ──────────────────────────────────────────────────────

/// Seconds between slashes.
pub const SLASH_ATTACK_INTERVAL: f32 = 1.0;
pub const SLASH_DAMAGE: f32 = 10.0;
pub const SLASH_RANGE: f32 = 2.0;

/// Full opening angle of the slash cone (degrees).
pub const SLASH_ANGLE_DEG: f32 = 60.0;

/// Distance from the attack origin to the slash anchor.
pub const SLASH_OFFSET: f32 = 0.3;

/// Lifetime of a slash hit-volume, independent of fire rate.
pub const SLASH_LIFETIME: f32 = 0.5;

// ── Enemy ────────────────────────────────────────────────────────────────────

pub const ENEMY_MAX_HEALTH: f32 = 3.0;
pub const ENEMY_MOVE_SPEED: f32 = 2.0;
pub const ENEMY_DAMAGE: f32 = 1.0;
pub const ENEMY_XP_DROP: f32 = 1.0;
pub const ENEMY_COLLIDER_RADIUS: f32 = 0.4;

/// Enemies further than this from the player are culled by the periodic check.
pub const ENEMY_MAX_DISTANCE_FROM_PLAYER: f32 = 20.0;

/// Period of the distance cull check (seconds).
pub const ENEMY_CULL_CHECK_INTERVAL: f32 = 2.0;

/// Initial speed of the death knockback.
pub const ENEMY_DEATH_KNOCKBACK: f32 = 1.0;

/// Seconds the death fade lasts before the enemy is removed.
pub const ENEMY_FADE_TIME: f32 = 0.8;

/// Exponential damping rate applied to death knockback velocity (per second).
pub const ENEMY_KNOCKBACK_DAMPING: f32 = 3.0;

/// Random perturbation added to the death knockback direction.
pub const ENEMY_KNOCKBACK_JITTER_X: f32 = 0.3;
pub const ENEMY_KNOCKBACK_JITTER_Y: f32 = 0.2;

pub const ENEMY_FLASH_DURATION: f32 = 0.1;

// ── Enemy: Waves ─────────────────────────────────────────────────────────────

/// Distance from the player at which new enemies appear.
pub const ENEMY_SPAWN_RADIUS: f32 = 12.0;

pub const ENEMY_SPAWN_BASE_INTERVAL: f32 = 1.5;

/// Interval reduction per elapsed stage.
pub const ENEMY_SPAWN_INTERVAL_STEP: f32 = 0.15;

pub const ENEMY_SPAWN_MIN_INTERVAL: f32 = 0.3;
pub const ENEMY_STAGE_SECS: f32 = 30.0;
pub const ENEMY_MAX_ALIVE: usize = 150;

// ── XP Orbs ──────────────────────────────────────────────────────────────────

pub const XP_PICKUP_RADIUS: f32 = 1.0;
pub const XP_ORB_RADIUS: f32 = 0.15;

// ── Presentation ─────────────────────────────────────────────────────────────

/// Height above an entity at which damage numbers appear.
pub const FLOATING_TEXT_HEIGHT: f32 = 1.5;
pub const FLOATING_TEXT_LIFETIME: f32 = 2.0;
pub const FLOATING_TEXT_RISE_SPEED: f32 = 1.5;
pub const FLOATING_TEXT_FONT_SIZE: f32 = 24.0;
pub const HUD_FONT_SIZE: f32 = 20.0;
