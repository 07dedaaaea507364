//! Santet Survivors game library
//!
//! A top-down horde-survival game: the player walks, dodges and aims while
//! equipped weapons fire on their own; defeated enemies drop XP, and each
//! level-up pauses the run for an upgrade choice.

pub mod config;
pub mod constants;
pub mod enemy;
pub mod error;
pub mod events;
pub mod floating_text;
pub mod graphics;
pub mod health;
pub mod hud;
pub mod menu;
pub mod pickup;
pub mod player;
pub mod preferences;
pub mod progression;
pub mod rendering;
pub mod spatial_partition;
pub mod stats;
pub mod weapon;
