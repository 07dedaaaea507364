//! Text HUD and the level-up panel.
//!
//! The HUD is the observer side of the progression and combat messages: it
//! folds [`ProgressionEvent`], [`HealthChanged`] and [`EnemyKilled`] into
//! [`HudState`] and redraws one text block when that changes.
//!
//! The level-up panel lists the engine's current options while in
//! `GameState::LevelUp`; keys 1/2/3 send the matching
//! [`SelectUpgradeRequest`].

use crate::config::GameConfig;
use crate::events::{EnemyKilled, HealthChanged};
use crate::menu::GameState;
use crate::progression::{ProgressionEngine, ProgressionEvent, SelectUpgradeRequest, WeaponId};
use bevy::prelude::*;

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct HudState {
    pub level: u32,
    pub xp_ratio: f32,
    pub health_ratio: f32,
    pub kills: u32,
    pub weapons: Vec<WeaponId>,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            level: 1,
            xp_ratio: 0.0,
            health_ratio: 1.0,
            kills: 0,
            weapons: Vec::new(),
        }
    }
}

impl HudState {
    pub fn apply(&mut self, event: ProgressionEvent) {
        match event {
            ProgressionEvent::XpProgressChanged(ratio) => self.xp_ratio = ratio,
            ProgressionEvent::LevelChanged(level) => self.level = level,
            ProgressionEvent::WeaponUnlocked(weapon) => {
                if !self.weapons.contains(&weapon) {
                    self.weapons.push(weapon);
                }
            }
            ProgressionEvent::XpGained(_) | ProgressionEvent::LevelUp(_) => {}
        }
    }

    pub fn render(&self) -> String {
        let weapons = if self.weapons.is_empty() {
            "-".to_string()
        } else {
            self.weapons
                .iter()
                .map(|w| w.display_name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Lv {}  XP {:>3.0}%  HP {:>3.0}%  Kills {}\nWeapons: {}",
            self.level,
            self.xp_ratio * 100.0,
            self.health_ratio * 100.0,
            self.kills,
            weapons
        )
    }
}

// ── Component markers ─────────────────────────────────────────────────────────

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HudText;

#[derive(Component)]
pub struct LevelUpPanelRoot;

#[derive(Component)]
pub struct LevelUpPanelText;

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudState>()
            .add_systems(OnExit(GameState::MainMenu), setup_hud)
            .add_systems(OnEnter(GameState::MainMenu), cleanup_hud)
            .add_systems(OnEnter(GameState::LevelUp), setup_level_up_panel)
            .add_systems(OnExit(GameState::LevelUp), cleanup_level_up_panel)
            .add_systems(
                Update,
                (
                    hud_observer_system,
                    hud_text_system,
                    level_up_panel_text_system.run_if(in_state(GameState::LevelUp)),
                    level_up_input_system.run_if(in_state(GameState::LevelUp)),
                )
                    .chain(),
            );
    }
}

// ── HUD ───────────────────────────────────────────────────────────────────────

pub fn setup_hud(mut commands: Commands, config: Res<GameConfig>, mut state: ResMut<HudState>) {
    *state = HudState::default();
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudRoot,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(state.render()),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
                HudText,
            ));
        });
}

pub fn cleanup_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

/// Fold notifications into [`HudState`], in delivery order.
pub fn hud_observer_system(
    mut state: ResMut<HudState>,
    mut progression: MessageReader<ProgressionEvent>,
    mut health: MessageReader<HealthChanged>,
    mut killed: MessageReader<EnemyKilled>,
) {
    for event in progression.read() {
        state.apply(*event);
    }
    if let Some(last) = health.read().last() {
        state.health_ratio = last.ratio;
    }
    let kills = killed.read().count() as u32;
    if kills > 0 {
        state.kills += kills;
    }
}

pub fn hud_text_system(state: Res<HudState>, mut q_text: Query<&mut Text, With<HudText>>) {
    if !state.is_changed() {
        return;
    }
    for mut text in q_text.iter_mut() {
        text.0 = state.render();
    }
}

// ── Level-up panel ────────────────────────────────────────────────────────────

fn panel_text(engine: &ProgressionEngine) -> String {
    let mut lines = vec![format!("LEVEL {}!  Choose an upgrade:", engine.level())];
    for (i, entry) in engine.options().iter().enumerate() {
        lines.push(format!("[{}] {} - {}", i + 1, entry.name, entry.description));
    }
    if engine.pending_selections() > 1 {
        lines.push(format!("({} more after this)", engine.pending_selections() - 1));
    }
    lines.join("\n")
}

pub fn setup_level_up_panel(mut commands: Commands, engine: Res<ProgressionEngine>) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            ZIndex(200),
            LevelUpPanelRoot,
        ))
        .with_children(|overlay| {
            overlay.spawn((
                Text::new(panel_text(&engine)),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                LevelUpPanelText,
            ));
        });
}

pub fn cleanup_level_up_panel(mut commands: Commands, query: Query<Entity, With<LevelUpPanelRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

/// Redraw when a selection leaves another one pending with fresh options.
pub fn level_up_panel_text_system(
    engine: Res<ProgressionEngine>,
    mut q_text: Query<&mut Text, With<LevelUpPanelText>>,
) {
    if !engine.is_changed() {
        return;
    }
    for mut text in q_text.iter_mut() {
        text.0 = panel_text(&engine);
    }
}

pub fn level_up_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    engine: Res<ProgressionEngine>,
    mut requests: MessageWriter<SelectUpgradeRequest>,
) {
    let keys_in_order = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3];
    let Some(index) = keys_in_order.iter().position(|k| keys.just_pressed(*k)) else {
        return;
    };
    if let Some(entry) = engine.options().get(index) {
        requests.write(SelectUpgradeRequest {
            entry: entry.clone(),
        });
    }
}
