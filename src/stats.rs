//! Player stat block.
//!
//! Fields are private: the only way to change a stat is one of the named
//! `upgrade_*` operations, which the progression engine calls when an upgrade
//! is selected.

use crate::config::GameConfig;
use bevy::prelude::*;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct PlayerStats {
    max_hp: f32,
    current_hp: f32,
    strength: f32,
    intelligence: f32,
    wisdom: f32,
    speed: f32,
    luck: f32,
    dodge_count: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl PlayerStats {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            max_hp: config.player_max_hp,
            current_hp: config.player_max_hp,
            strength: config.player_strength,
            intelligence: config.player_intelligence,
            wisdom: config.player_wisdom,
            speed: config.player_speed,
            luck: config.player_luck.clamp(0.0, 1.0),
            dodge_count: config.player_dodge_count.max(1),
        }
    }

    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    pub fn current_hp(&self) -> f32 {
        self.current_hp
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn intelligence(&self) -> f32 {
        self.intelligence
    }

    pub fn wisdom(&self) -> f32 {
        self.wisdom
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn luck(&self) -> f32 {
        self.luck
    }

    pub fn dodge_count(&self) -> u32 {
        self.dodge_count
    }

    // ── Upgrade operations ────────────────────────────────────────────────────

    /// Raise the cap and heal by the same absolute amount.
    pub fn upgrade_max_hp(&mut self, amount: f32) {
        self.max_hp += amount;
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
    }

    pub fn upgrade_strength(&mut self, multiplier: f32) {
        self.strength *= multiplier;
    }

    pub fn upgrade_intelligence(&mut self, multiplier: f32) {
        self.intelligence *= multiplier;
    }

    pub fn upgrade_wisdom(&mut self, multiplier: f32) {
        self.wisdom *= multiplier;
    }

    pub fn upgrade_speed(&mut self, multiplier: f32) {
        self.speed *= multiplier;
    }

    pub fn upgrade_luck(&mut self, amount: f32) {
        self.luck = (self.luck + amount).clamp(0.0, 1.0);
    }

    pub fn upgrade_dodge_count(&mut self, amount: u32) {
        self.dodge_count = (self.dodge_count + amount).max(1);
    }

    /// Mirror the live health pool so the HUD and upgrades agree on current HP.
    pub fn sync_current_hp(&mut self, current: f32) {
        self.current_hp = current.clamp(0.0, self.max_hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luck_is_clamped_to_unit_interval() {
        let mut stats = PlayerStats::default();
        for _ in 0..30 {
            stats.upgrade_luck(0.05);
        }
        assert_eq!(stats.luck(), 1.0, "luck must never exceed 1.0");
        stats.upgrade_luck(-5.0);
        assert_eq!(stats.luck(), 0.0, "luck must never drop below 0.0");
    }

    #[test]
    fn multipliers_compound() {
        let mut stats = PlayerStats::default();
        stats.upgrade_strength(1.2);
        stats.upgrade_strength(1.2);
        assert!((stats.strength() - 1.44).abs() < 1e-5);
    }

    #[test]
    fn max_hp_upgrade_heals_by_the_same_amount() {
        let mut stats = PlayerStats::default();
        stats.sync_current_hp(50.0);
        stats.upgrade_max_hp(20.0);
        assert_eq!(stats.max_hp(), 120.0);
        assert_eq!(stats.current_hp(), 70.0);
    }

    #[test]
    fn dodge_count_stays_at_least_one() {
        let config = GameConfig {
            player_dodge_count: 0,
            ..Default::default()
        };
        let stats = PlayerStats::from_config(&config);
        assert_eq!(stats.dodge_count(), 1);
    }
}
