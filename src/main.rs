use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;

use santet_survivors::config::{self, GameConfig, GameRng};
use santet_survivors::enemy::EnemyPlugin;
use santet_survivors::error::Diagnostics;
use santet_survivors::events::GameEventsPlugin;
use santet_survivors::floating_text::FloatingTextPlugin;
use santet_survivors::graphics::CameraPlugin;
use santet_survivors::hud::HudPlugin;
use santet_survivors::menu::MainMenuPlugin;
use santet_survivors::pickup::PickupPlugin;
use santet_survivors::player::PlayerPlugin;
use santet_survivors::preferences::PreferencesPlugin;
use santet_survivors::progression::ProgressionPlugin;
use santet_survivors::rendering::GizmoRenderingPlugin;
use santet_survivors::weapon::WeaponPlugin;

/// Top-down world: no gravity.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Santet Survivors".into(),
            resolution: WindowResolution::new(1200, 680),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.05, 0.04, 0.07)))
    // Compiled defaults; load_game_config overwrites them from
    // assets/game.toml (if present) in the Startup schedule.
    .insert_resource(GameConfig::default())
    .init_resource::<Diagnostics>()
    .init_resource::<GameRng>()
    // One physics unit per world unit (tile).
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
    // MainMenuPlugin owns the GameState machine; it goes first.
    .add_plugins((
        MainMenuPlugin,
        GameEventsPlugin,
        PreferencesPlugin,
        ProgressionPlugin,
        PlayerPlugin,
        WeaponPlugin,
        EnemyPlugin,
        PickupPlugin,
        HudPlugin,
        FloatingTextPlugin,
        CameraPlugin,
        GizmoRenderingPlugin,
    ))
    .add_systems(
        Startup,
        (
            // Config first so every other startup system sees the final values.
            config::load_game_config,
            config::seed_game_rng.after(config::load_game_config),
            setup_physics_config,
        ),
    );

    app.run();
}
