//! Player input, movement and dodge systems.
//!
//! ## Pipeline
//!
//! 1. [`player_intent_clear_system`] resets `PlayerIntent` (Update).
//! 2. [`keyboard_to_intent_system`] translates WASD/arrows/Space (Update).
//! 3. [`dodge_start_system`] / [`dodge_tick_system`] run the dodge burst (Update).
//! 4. [`apply_player_movement_system`] integrates velocity (FixedUpdate).
//!
//! The **input abstraction layer** (`PlayerIntent`) keeps movement testable:
//! tests populate the resource directly and run only the apply step.

use super::dodge::{DodgeController, DodgeUpdate};
use super::state::{AimDirection, Player, PlayerIntent, PlayerMovement};
use crate::health::Health;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_rapier2d::prelude::*;

// ── Step 1: Clear ─────────────────────────────────────────────────────────────

pub fn player_intent_clear_system(mut intent: ResMut<PlayerIntent>) {
    *intent = PlayerIntent::default();
}

// ── Step 2: Keyboard → Intent ─────────────────────────────────────────────────

/// WASD or arrow keys set `movement`; Space requests a dodge.
pub fn keyboard_to_intent_system(keys: Res<ButtonInput<KeyCode>>, mut intent: ResMut<PlayerIntent>) {
    let mut movement = Vec2::ZERO;
    if keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]) {
        movement.y += 1.0;
    }
    if keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]) {
        movement.y -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        movement.x -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        movement.x += 1.0;
    }
    intent.movement = movement;
    intent.dodge = keys.just_pressed(KeyCode::Space);
}

/// Aim along the cursor's offset from the screen centre (the camera follows
/// the player, so the centre is the player).
pub fn mouse_aim_system(
    q_window: Query<&Window, With<PrimaryWindow>>,
    mut aim: ResMut<AimDirection>,
) {
    let Ok(window) = q_window.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let centre = Vec2::new(window.width(), window.height()) * 0.5;
    // Screen Y grows downward; world Y grows upward.
    let offset = Vec2::new(cursor.x - centre.x, centre.y - cursor.y);
    if offset.length_squared() > 1e-4 {
        aim.0 = offset.normalize();
    }
}

// ── Step 3: Dodge ─────────────────────────────────────────────────────────────

/// Start a dodge on request: burst velocity plus invincibility.
pub fn dodge_start_system(
    mut q: Query<(&mut DodgeController, &mut Health, &mut Velocity), With<Player>>,
    intent: Res<PlayerIntent>,
    time: Res<Time>,
) {
    if !intent.dodge {
        return;
    }
    let Ok((mut dodge, mut health, mut velocity)) = q.single_mut() else {
        return;
    };
    if let Some(burst) = dodge.try_start(time.elapsed_secs(), intent.movement) {
        velocity.linvel = burst;
        health.set_invincible(true);
        debug!("Dodge started ({} charges left)", dodge.current_count());
    }
}

/// End the burst after its duration and restore charges after the cooldown.
pub fn dodge_tick_system(
    mut q: Query<(&mut DodgeController, &mut Health), With<Player>>,
    time: Res<Time>,
) {
    let Ok((mut dodge, mut health)) = q.single_mut() else {
        return;
    };
    if dodge.update(time.elapsed_secs()) == DodgeUpdate::Ended {
        health.set_invincible(false);
    }
}

// ── Step 4: Apply intent → velocity ───────────────────────────────────────────

/// Accelerate toward `movement × max_speed`; skipped while dodging so the
/// burst velocity is kept.
pub fn apply_player_movement_system(
    mut q: Query<(&mut Velocity, &mut PlayerMovement, &DodgeController), With<Player>>,
    intent: Res<PlayerIntent>,
    time: Res<Time>,
) {
    let Ok((mut velocity, mut movement, dodge)) = q.single_mut() else {
        return;
    };
    if dodge.is_dodging() {
        return;
    }

    velocity.linvel = movement.step(velocity.linvel, intent.movement, time.delta_secs());

    if intent.movement.x < 0.0 {
        movement.facing_left = true;
    } else if intent.movement.x > 0.0 {
        movement.facing_left = false;
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use std::time::Duration;

    // ── helpers ───────────────────────────────────────────────────────────────

    /// Minimal app with a manually-advanced clock: no window, no physics.
    fn build_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(PlayerIntent::default());
        app.insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
            Duration::from_millis(100),
        ));
        app
    }

    fn spawn_test_player(app: &mut App) -> Entity {
        let config = GameConfig::default();
        app.world_mut()
            .spawn((
                Player,
                PlayerMovement::from_config(&config),
                DodgeController::from_config(&config),
                Health::new(config.player_max_hp),
                Velocity::zero(),
            ))
            .id()
    }

    #[test]
    fn movement_accelerates_toward_input() {
        let mut app = build_test_app();
        let player = spawn_test_player(&mut app);
        app.add_systems(Update, apply_player_movement_system);
        app.insert_resource(PlayerIntent {
            movement: Vec2::new(-1.0, 0.0),
            dodge: false,
        });
        // First update primes the clock; later ones advance 0.1 s each.
        for _ in 0..4 {
            app.update();
        }

        let velocity = app.world().get::<Velocity>(player).unwrap().linvel;
        assert!(velocity.x < 0.0, "expected leftward velocity, got {velocity:?}");
        assert!(
            app.world().get::<PlayerMovement>(player).unwrap().facing_left,
            "sprite should face left"
        );
    }

    #[test]
    fn dodge_grants_invincibility_then_clears_it() {
        let mut app = build_test_app();
        let player = spawn_test_player(&mut app);
        app.add_systems(Update, (dodge_start_system, dodge_tick_system).chain());
        app.update();

        app.insert_resource(PlayerIntent {
            movement: Vec2::X,
            dodge: true,
        });
        app.update();
        assert!(app.world().get::<Health>(player).unwrap().is_invincible());
        let burst = app.world().get::<Velocity>(player).unwrap().linvel;
        assert!((burst.x - crate::constants::DODGE_SPEED).abs() < 1e-4);

        app.insert_resource(PlayerIntent::default());
        for _ in 0..5 {
            app.update();
        }
        assert!(
            !app.world().get::<Health>(player).unwrap().is_invincible(),
            "invincibility must end with the dodge"
        );
    }

    #[test]
    fn movement_is_suppressed_while_dodging() {
        let mut app = build_test_app();
        let player = spawn_test_player(&mut app);
        app.add_systems(
            Update,
            (dodge_start_system, apply_player_movement_system).chain(),
        );
        app.update();
        app.insert_resource(PlayerIntent {
            movement: Vec2::Y,
            dodge: true,
        });
        app.update();

        let velocity = app.world().get::<Velocity>(player).unwrap().linvel;
        assert!(
            (velocity.y - crate::constants::DODGE_SPEED).abs() < 1e-4,
            "burst velocity must not be overwritten, got {velocity:?}"
        );
    }
}
