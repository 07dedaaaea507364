//! Player module: character entity, input handling, movement and dodge.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | ECS components (`Player`, `PlayerMovement`) and resources (`AimDirection`, `PlayerIntent`) |
//! | [`dodge`] | `DodgeController`: charges, shared cooldown gate, timed burst |
//! | [`control`] | Input systems, 8-way accelerated movement, dodge start/tick |
//!
//! All public items are re-exported at this level so that the rest of the
//! crate can use flat `crate::player::*` imports.

pub mod control;
pub mod dodge;
pub mod state;

// ── Flat re-exports ───────────────────────────────────────────────────────────

pub use control::{
    apply_player_movement_system, dodge_start_system, dodge_tick_system,
    keyboard_to_intent_system, mouse_aim_system, player_intent_clear_system,
};
pub use dodge::{DodgeController, DodgeUpdate};
pub use state::{move_towards, AimDirection, Player, PlayerIntent, PlayerMovement};

use crate::config::GameConfig;
use crate::health::Health;
use crate::menu::GameState;
use crate::preferences::SelectedStarterWeapon;
use crate::stats::PlayerStats;
use crate::weapon::{spawn_weapon, WeaponInstance, WeaponSlot};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PlayerIntent::default())
            .insert_resource(AimDirection::default())
            .add_systems(OnExit(GameState::MainMenu), spawn_player)
            .add_systems(
                Update,
                (
                    player_intent_clear_system,
                    keyboard_to_intent_system,
                    mouse_aim_system,
                    dodge_start_system,
                    dodge_tick_system,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                FixedUpdate,
                apply_player_movement_system.run_if(in_state(GameState::Playing)),
            );
    }
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

/// Spawn the player at the world origin with the chosen starter weapon.
///
/// The body is a locked-rotation dynamic ball so enemies can push against it;
/// `ActiveEvents::COLLISION_EVENTS` feeds the enemy contact-damage system.
pub fn spawn_player(
    mut commands: Commands,
    config: Res<GameConfig>,
    starter: Res<SelectedStarterWeapon>,
) {
    let stats = PlayerStats::from_config(&config);
    let mut weapon = WeaponInstance::for_starter(starter.0, &config);
    weapon.apply_player_stats(&stats);

    let player = commands
        .spawn((
            Player,
            Health::new(stats.max_hp()),
            stats,
            PlayerMovement::from_config(&config),
            DodgeController::from_config(&config),
            // Physics
            RigidBody::Dynamic,
            Collider::ball(config.player_collider_radius),
            Velocity::zero(),
            LockedAxes::ROTATION_LOCKED,
            ActiveEvents::COLLISION_EVENTS,
            // Transform / visibility
            Transform::from_translation(Vec3::ZERO),
            Visibility::default(),
        ))
        .id();

    spawn_weapon(&mut commands, player, weapon, WeaponSlot(None));

    println!(
        "✓ Player spawned at origin with starter {}",
        starter.0.as_str()
    );
}
