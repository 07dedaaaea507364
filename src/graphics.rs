use crate::constants::CAMERA_SCALE;
use crate::menu::GameState;
use crate::player::Player;
use bevy::prelude::*;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera).add_systems(
            Update,
            camera_follow_system.run_if(not(in_state(GameState::MainMenu))),
        );
    }
}

/// Setup camera for 2D rendering
///
/// World units are tiles; `CAMERA_SCALE` maps one tile to 48 pixels.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: CAMERA_SCALE,
            ..OrthographicProjection::default_2d()
        }),
    ));
    println!("✓ Camera spawned (scale {CAMERA_SCALE})");
}

/// Keep the camera centred on the player every frame.
///
/// Camera Z is preserved.
pub fn camera_follow_system(
    q_player: Query<&Transform, With<Player>>,
    mut q_camera: Query<&mut Transform, (With<Camera>, Without<Player>)>,
) {
    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let Ok(mut cam) = q_camera.single_mut() else {
        return;
    };

    cam.translation.x = player_transform.translation.x;
    cam.translation.y = player_transform.translation.y;
}
