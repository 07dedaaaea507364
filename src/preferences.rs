//! Starter weapon preference, persisted as a single TOML key.
//!
//! ```toml
//! selected_weapon = "WeaponB"
//! ```
//!
//! Read once at startup into [`SelectedStarterWeapon`], written whenever the
//! main menu changes the selection.  A missing file is the default choice; an
//! unreadable file or unknown value falls back to the default with a
//! diagnostic.

use crate::error::{Diagnostics, GameError, GameResult};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PREFERENCES_PATH: &str = "saves/preferences.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StarterWeapon {
    #[default]
    WeaponA,
    WeaponB,
    WeaponC,
}

impl StarterWeapon {
    pub const ALL: [StarterWeapon; 3] = [Self::WeaponA, Self::WeaponB, Self::WeaponC];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            StarterWeapon::WeaponA => "WeaponA",
            StarterWeapon::WeaponB => "WeaponB",
            StarterWeapon::WeaponC => "WeaponC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == value)
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            StarterWeapon::WeaponA => "Buku Mantra (projectile)",
            StarterWeapon::WeaponB => "Boneka Santet (melee cone)",
            StarterWeapon::WeaponC => "Paku (orbit)",
        }
    }
}

/// On-disk layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PreferenceFile {
    selected_weapon: String,
}

/// The starter weapon for the next run.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectedStarterWeapon(pub StarterWeapon);

/// Where preferences are stored.
#[derive(Resource, Debug, Clone)]
pub struct PreferenceStore {
    pub path: PathBuf,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from(PREFERENCES_PATH),
        }
    }
}

fn io_error(path: &Path, details: impl ToString) -> GameError {
    GameError::PreferenceIo {
        path: path.display().to_string(),
        details: details.to_string(),
    }
}

/// Read the stored choice.  `Ok(None)` when no file exists yet.
pub fn load_preference(path: &Path) -> GameResult<Option<StarterWeapon>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
    let file: PreferenceFile = toml::from_str(&contents).map_err(|err| io_error(path, err))?;
    StarterWeapon::parse(&file.selected_weapon)
        .map(Some)
        .ok_or_else(|| io_error(path, format!("unknown weapon '{}'", file.selected_weapon)))
}

pub fn save_preference(path: &Path, weapon: StarterWeapon) -> GameResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| io_error(path, err))?;
    }
    let serialized = toml::to_string_pretty(&PreferenceFile {
        selected_weapon: weapon.as_str().to_string(),
    })
    .map_err(|err| io_error(path, err))?;
    fs::write(path, serialized).map_err(|err| io_error(path, err))
}

pub struct PreferencesPlugin;

impl Plugin for PreferencesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PreferenceStore>()
            .init_resource::<SelectedStarterWeapon>()
            .add_systems(Startup, load_preferences_system);
    }
}

pub fn load_preferences_system(
    store: Res<PreferenceStore>,
    mut selected: ResMut<SelectedStarterWeapon>,
    mut diagnostics: ResMut<Diagnostics>,
) {
    match load_preference(&store.path) {
        Ok(Some(weapon)) => {
            selected.0 = weapon;
            println!("✓ Starter weapon preference: {}", weapon.as_str());
        }
        Ok(None) => println!("ℹ No saved preference; starting with {}", selected.0.as_str()),
        Err(err) => {
            diagnostics.report(err);
            selected.0 = StarterWeapon::default();
        }
    }
}
