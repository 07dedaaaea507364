//! Player components and resources.
//!
//! All ECS components and Bevy resources that describe player state live here.
//! Systems that mutate this state are in the sibling modules:
//! - [`super::control`]: input, movement and dodge
//! - [`super::dodge`]: the dodge charge/cooldown model

use crate::config::GameConfig;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player character.
#[derive(Component)]
pub struct Player;

/// Velocity integration parameters and facing for the player.
#[derive(Component, Debug, Clone)]
pub struct PlayerMovement {
    /// Top speed (u/s).  Raised by Speed upgrades.
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Sprite faces left; follows the sign of horizontal input.
    pub facing_left: bool,
}

impl PlayerMovement {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            max_speed: config.player_speed,
            acceleration: config.player_acceleration,
            deceleration: config.player_deceleration,
            facing_left: false,
        }
    }

    /// Velocity after one step of `dt` seconds toward `input × max_speed`.
    pub fn step(&self, velocity: Vec2, input: Vec2, dt: f32) -> Vec2 {
        let direction = input.normalize_or_zero();
        let target = direction * self.max_speed;
        let rate = if direction == Vec2::ZERO {
            self.deceleration
        } else {
            self.acceleration
        };
        move_towards(velocity, target, rate * dt)
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

// ── Resources ──────────────────────────────────────────────────────────────────

/// World-space unit vector the melee weapons aim along.
///
/// Updated every frame by `mouse_aim_system` (cursor offset from screen
/// centre).  Keeps its last value while the cursor is outside the window.
#[derive(Resource, Clone, Copy)]
pub struct AimDirection(pub Vec2);

impl Default for AimDirection {
    fn default() -> Self {
        Self(Vec2::X)
    }
}

/// Frame-local player input, decoupled from the device that produced it.
///
/// Cleared at the start of every frame by `player_intent_clear_system`, then
/// written by the input systems.  Tests populate it directly.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// Raw 8-way movement input; normalized by the movement step.
    pub movement: Vec2,
    /// Dodge pressed this frame.
    pub dodge: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_caps_step_length() {
        let v = move_towards(Vec2::ZERO, Vec2::new(5.0, 0.0), 1.0);
        assert_eq!(v, Vec2::new(1.0, 0.0));
        let v = move_towards(Vec2::new(4.5, 0.0), Vec2::new(5.0, 0.0), 1.0);
        assert_eq!(v, Vec2::new(5.0, 0.0), "snaps when within one step");
    }

    #[test]
    fn step_decelerates_without_input() {
        let movement = PlayerMovement::from_config(&GameConfig::default());
        let v = movement.step(Vec2::new(5.0, 0.0), Vec2::ZERO, 0.1);
        assert!((v.x - 4.0).abs() < 1e-5, "deceleration 10 u/s² over 0.1 s");
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let movement = PlayerMovement::from_config(&GameConfig::default());
        let mut v = Vec2::ZERO;
        for _ in 0..100 {
            v = movement.step(v, Vec2::new(1.0, 1.0), 0.1);
        }
        assert!((v.length() - movement.max_speed).abs() < 1e-4);
    }
}
