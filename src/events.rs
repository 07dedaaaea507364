//! Gameplay messages shared between the simulation and its collaborators.
//!
//! Progression-specific messages live in [`crate::progression`].

use bevy::prelude::*;

/// An enemy entered its dying sequence.
#[derive(Message, Debug, Clone, Copy)]
pub struct EnemyKilled {
    pub entity: Entity,
    pub position: Vec2,
}

#[derive(Message, Debug, Clone, Copy, Default)]
pub struct PlayerDied;

/// Player health after any change, as a `[0, 1]` ratio.
#[derive(Message, Debug, Clone, Copy)]
pub struct HealthChanged {
    pub ratio: f32,
}

/// Fire-and-forget damage number (or any short label) in world space.
#[derive(Message, Debug, Clone)]
pub struct FloatingTextRequest {
    pub text: String,
    pub position: Vec2,
    pub color: Color,
}

/// Weapon hit on an enemy.  Unknown or non-enemy targets are ignored.
#[derive(Message, Debug, Clone, Copy)]
pub struct DamageEnemyRequest {
    pub target: Entity,
    pub amount: f32,
    pub critical: bool,
    /// Knockback pushes away from this point.
    pub source: Vec2,
    /// Impulse magnitude; `0.0` for none.
    pub knockback: f32,
}

/// Registers every message in this module.
pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<EnemyKilled>()
            .add_message::<PlayerDied>()
            .add_message::<HealthChanged>()
            .add_message::<FloatingTextRequest>()
            .add_message::<DamageEnemyRequest>();
    }
}
