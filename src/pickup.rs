//! XP orbs: dropped by dying enemies, collected by walking over them.
//!
//! ## Flow
//!
//! 1. `spawn_xp_orb()` is called by the enemy damage system when an enemy
//!    enters its dying sequence, carrying the template's `xp_drop_amount`.
//! 2. `xp_pickup_system` collects every orb within `xp_pickup_radius` of the
//!    player, despawns it, and feeds its value to
//!    [`ProgressionEngine::gain_xp`].
//!
//! Orbs are plain transforms without a physics body, so they never push or
//! get pushed by anything.

use crate::config::GameConfig;
use crate::menu::GameState;
use crate::player::Player;
use crate::progression::ProgressionEngine;
use bevy::prelude::*;

// ── Components ────────────────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct XpOrb {
    pub xp_value: f32,
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            xp_pickup_system.run_if(in_state(GameState::Playing)),
        );
    }
}

// ── Spawn helper ──────────────────────────────────────────────────────────────

/// Spawn an orb worth `xp_value` at `pos`.  Non-positive values spawn nothing.
pub fn spawn_xp_orb(commands: &mut Commands, pos: Vec2, xp_value: f32) {
    if xp_value <= 0.0 || !xp_value.is_finite() {
        debug!("Skipping XP orb with value {xp_value}");
        return;
    }
    commands.spawn((
        XpOrb { xp_value },
        Transform::from_translation(pos.extend(0.05)),
        Visibility::default(),
    ));
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Collect orbs near the player and award their XP.
pub fn xp_pickup_system(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut engine: ResMut<ProgressionEngine>,
    q_player: Query<&Transform, With<Player>>,
    q_orbs: Query<(Entity, &Transform, &XpOrb)>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let player_pos = player_transform.translation.truncate();
    let radius_sq = config.xp_pickup_radius * config.xp_pickup_radius;

    for (entity, transform, orb) in q_orbs.iter() {
        if transform.translation.truncate().distance_squared(player_pos) > radius_sq {
            continue;
        }
        commands.entity(entity).despawn();
        engine.gain_xp(orb.xp_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn pickup_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<GameState>();
        app.insert_resource(GameConfig::default());
        app.insert_resource(ProgressionEngine::from_config(&GameConfig::default()));
        app.add_systems(Update, xp_pickup_system);
        app
    }

    #[test]
    fn orbs_in_radius_are_collected() {
        let mut app = pickup_test_app();
        app.world_mut().spawn((Player, Transform::default()));
        let near = app
            .world_mut()
            .spawn((XpOrb { xp_value: 3.0 }, Transform::from_xyz(0.5, 0.0, 0.0)))
            .id();
        let far = app
            .world_mut()
            .spawn((XpOrb { xp_value: 3.0 }, Transform::from_xyz(8.0, 0.0, 0.0)))
            .id();

        app.update();

        assert!(app.world().get_entity(near).is_err());
        assert!(app.world().get_entity(far).is_ok());
        assert_eq!(app.world().resource::<ProgressionEngine>().current_xp(), 3.0);
    }

    #[test]
    fn nothing_is_collected_without_a_player() {
        let mut app = pickup_test_app();
        let orb = app
            .world_mut()
            .spawn((XpOrb { xp_value: 1.0 }, Transform::default()))
            .id();
        app.update();
        assert!(app.world().get_entity(orb).is_ok());
    }
}
