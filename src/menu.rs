//! Top-level `GameState` machine, main menu, and game-over screen.
//!
//! ## States
//!
//! | State      | Description                                              |
//! |------------|----------------------------------------------------------|
//! | `MainMenu` | Initial state; starter weapon picker                     |
//! | `Playing`  | Simulation running; all game systems active              |
//! | `LevelUp`  | Upgrade panel open; virtual time paused                  |
//! | `GameOver` | Player died; virtual time paused until back to the menu  |
//!
//! ## Systems (registered by `MainMenuPlugin`)
//!
//! | System                    | Schedule                              | Purpose                          |
//! |---------------------------|---------------------------------------|----------------------------------|
//! | `cleanup_game_world`      | `OnEnter(MainMenu)`                   | Despawn the previous run         |
//! | `setup_main_menu`         | `OnEnter(MainMenu)`                   | Spawn menu UI                    |
//! | `cleanup_main_menu`       | `OnExit(MainMenu)`                    | Despawn menu UI entities         |
//! | `main_menu_input_system`  | `Update / in MainMenu`                | 1/2/3 pick + save, Enter plays   |
//! | `pause_virtual_time`      | `OnEnter(LevelUp)`, `OnEnter(GameOver)` | Freeze clock and physics       |
//! | `resume_virtual_time`     | `OnExit(LevelUp)`, `OnExit(GameOver)` | Unfreeze clock and physics       |
//! | `player_died_system`      | `Update / in Playing`                 | `PlayerDied` → `GameOver`        |
//! | `game_over_input_system`  | `Update / in GameOver`                | Enter returns to the menu        |

use crate::enemy::Enemy;
use crate::error::Diagnostics;
use crate::events::PlayerDied;
use crate::floating_text::FloatingText;
use crate::pickup::XpOrb;
use crate::player::Player;
use crate::preferences::{save_preference, PreferenceStore, SelectedStarterWeapon, StarterWeapon};
use crate::weapon::{HomingUnit, Projectile, SlashVolume};
use bevy::prelude::*;
use bevy_rapier2d::prelude::RapierConfiguration;

// ── Game state ────────────────────────────────────────────────────────────────

/// Top-level application state machine.
///
/// Every simulation system runs under `.run_if(in_state(GameState::Playing))`,
/// so nothing advances while a menu or the level-up panel is shown.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Main-menu screen; shown on startup.
    #[default]
    MainMenu,
    /// Active gameplay.
    Playing,
    /// Waiting for an upgrade selection.
    LevelUp,
    /// Player has died; game-over overlay shown.
    GameOver,
}

// ── Component markers ─────────────────────────────────────────────────────────

/// Root node of the main-menu UI; entire tree is despawned on `OnExit(MainMenu)`.
#[derive(Component)]
pub struct MainMenuRoot;

/// The line showing the current starter weapon choice.
#[derive(Component)]
pub struct MenuSelectionText;

/// Root node of the game-over overlay.
#[derive(Component)]
pub struct GameOverRoot;

// ── Plugin ────────────────────────────────────────────────────────────────────

/// Registers `GameState`, menu setup/teardown, and the virtual-time pause hooks.
///
/// This plugin must be added to the app **before** any plugin that calls
/// `.run_if(in_state(GameState::Playing))`, so the state is always registered
/// first.
pub struct MainMenuPlugin;

impl Plugin for MainMenuPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_systems(
                OnEnter(GameState::MainMenu),
                (cleanup_game_world, setup_main_menu).chain(),
            )
            .add_systems(OnExit(GameState::MainMenu), cleanup_main_menu)
            .add_systems(OnEnter(GameState::LevelUp), pause_virtual_time)
            .add_systems(OnExit(GameState::LevelUp), resume_virtual_time)
            .add_systems(
                OnEnter(GameState::GameOver),
                (pause_virtual_time, setup_game_over),
            )
            .add_systems(
                OnExit(GameState::GameOver),
                (cleanup_game_over, resume_virtual_time),
            )
            .add_systems(
                Update,
                (
                    main_menu_input_system.run_if(in_state(GameState::MainMenu)),
                    player_died_system.run_if(in_state(GameState::Playing)),
                    game_over_input_system.run_if(in_state(GameState::GameOver)),
                ),
            );
    }
}

// ── Colour helpers ────────────────────────────────────────────────────────────

fn title_color() -> Color {
    Color::srgb(0.85, 0.25, 0.30)
}
fn subtitle_color() -> Color {
    Color::srgb(0.70, 0.65, 0.70)
}
fn hint_color() -> Color {
    Color::srgb(0.40, 0.38, 0.45)
}

fn selection_label(weapon: StarterWeapon) -> String {
    format!("Starter weapon: {}", weapon.label())
}

// ── Main menu ─────────────────────────────────────────────────────────────────

/// Spawn the full-screen main-menu overlay.
///
/// ```text
/// ┌─────────────────────────────────────────────┐
/// │              SANTET SURVIVORS               │
/// │   Starter weapon: Buku Mantra (projectile)  │
/// │  [1] Buku Mantra [2] Boneka Santet [3] Paku │
/// │              ENTER to play                  │
/// └─────────────────────────────────────────────┘
/// ```
pub fn setup_main_menu(mut commands: Commands, selected: Res<SelectedStarterWeapon>) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(14.0),
                ..default()
            },
            BackgroundColor(Color::BLACK),
            MainMenuRoot,
        ))
        .with_children(|root| {
            root.spawn((
                Text::new("SANTET SURVIVORS"),
                TextFont {
                    font_size: 56.0,
                    ..default()
                },
                TextColor(title_color()),
            ));
            root.spawn((
                Text::new(selection_label(selected.0)),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(subtitle_color()),
                MenuSelectionText,
            ));
            let options = StarterWeapon::ALL
                .iter()
                .enumerate()
                .map(|(i, w)| format!("[{}] {}", i + 1, w.label()))
                .collect::<Vec<_>>()
                .join("   ");
            root.spawn((
                Text::new(options),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(subtitle_color()),
            ));
            root.spawn((
                Text::new("ENTER to play"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(hint_color()),
            ));
        });
}

pub fn cleanup_main_menu(mut commands: Commands, query: Query<Entity, With<MainMenuRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

/// Keys 1/2/3 choose (and persist) the starter weapon; Enter starts the run.
pub fn main_menu_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    store: Res<PreferenceStore>,
    mut selected: ResMut<SelectedStarterWeapon>,
    mut diagnostics: ResMut<Diagnostics>,
    mut q_text: Query<&mut Text, With<MenuSelectionText>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let choice = [
        (KeyCode::Digit1, StarterWeapon::WeaponA),
        (KeyCode::Digit2, StarterWeapon::WeaponB),
        (KeyCode::Digit3, StarterWeapon::WeaponC),
    ]
    .into_iter()
    .find(|(key, _)| keys.just_pressed(*key))
    .map(|(_, weapon)| weapon);

    if let Some(weapon) = choice {
        selected.0 = weapon;
        if let Err(err) = save_preference(&store.path, weapon) {
            diagnostics.report(err);
        }
    }

    // Also catches the preference loaded at startup.
    if selected.is_changed() {
        for mut text in q_text.iter_mut() {
            text.0 = selection_label(selected.0);
        }
    }

    if keys.just_pressed(KeyCode::Enter) {
        next_state.set(GameState::Playing);
    }
}

/// Despawn everything left over from the previous run.
#[allow(clippy::type_complexity)]
pub fn cleanup_game_world(
    mut commands: Commands,
    q_world: Query<
        Entity,
        Or<(
            With<Player>,
            With<Enemy>,
            With<XpOrb>,
            With<Projectile>,
            With<SlashVolume>,
            With<HomingUnit>,
            With<FloatingText>,
        )>,
    >,
) {
    for entity in q_world.iter() {
        commands.entity(entity).despawn();
    }
}

// ── Pause hooks ───────────────────────────────────────────────────────────────

/// Freeze the game clock and the Rapier pipeline so bodies stop drifting.
pub fn pause_virtual_time(
    mut time: ResMut<Time<Virtual>>,
    mut physics: Query<&mut RapierConfiguration>,
) {
    time.pause();
    for mut cfg in physics.iter_mut() {
        cfg.physics_pipeline_active = false;
    }
}

pub fn resume_virtual_time(
    mut time: ResMut<Time<Virtual>>,
    mut physics: Query<&mut RapierConfiguration>,
) {
    time.unpause();
    for mut cfg in physics.iter_mut() {
        cfg.physics_pipeline_active = true;
    }
}

// ── Game over ─────────────────────────────────────────────────────────────────

pub fn player_died_system(
    mut died: MessageReader<PlayerDied>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if died.read().next().is_some() {
        next_state.set(GameState::GameOver);
    }
}

pub fn setup_game_over(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                position_type: PositionType::Absolute,
                row_gap: Val::Px(12.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.82)),
            ZIndex(300),
            GameOverRoot,
        ))
        .with_children(|overlay| {
            overlay.spawn((
                Text::new("GAME OVER"),
                TextFont {
                    font_size: 46.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.22, 0.22)),
            ));
            overlay.spawn((
                Text::new("ENTER to return to the menu"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(subtitle_color()),
            ));
        });
}

pub fn cleanup_game_over(mut commands: Commands, query: Query<Entity, With<GameOverRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

pub fn game_over_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keys.just_pressed(KeyCode::Enter) {
        next_state.set(GameState::MainMenu);
    }
}
