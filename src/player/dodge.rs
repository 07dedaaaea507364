//! Dodge charges, cooldown gate, and the timed dodge burst.
//!
//! All timing is in absolute seconds (`now`) so the controller can be driven
//! by `Time<Virtual>` in the game and by plain numbers in tests.

use crate::config::GameConfig;
use bevy::prelude::*;

/// Result of [`DodgeController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DodgeUpdate {
    Idle,
    Dodging,
    /// The dodge burst finished on this update.
    Ended,
}

#[derive(Component, Debug, Clone)]
pub struct DodgeController {
    max_count: u32,
    current_count: u32,
    cooldown: f32,
    duration: f32,
    speed: f32,
    /// `None` until the first dodge, so the first one is never gated.
    last_dodge_time: Option<f32>,
    dodge_started: Option<f32>,
}

impl DodgeController {
    pub fn new(max_count: u32, cooldown: f32, duration: f32, speed: f32) -> Self {
        let max_count = max_count.max(1);
        Self {
            max_count,
            current_count: max_count,
            cooldown,
            duration,
            speed,
            last_dodge_time: None,
            dodge_started: None,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.player_dodge_count,
            config.dodge_cooldown,
            config.dodge_duration,
            config.dodge_speed,
        )
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn is_dodging(&self) -> bool {
        self.dodge_started.is_some()
    }

    fn cooldown_elapsed(&self, now: f32) -> bool {
        self.last_dodge_time
            .is_none_or(|last| now >= last + self.cooldown)
    }

    /// Start a dodge if a charge is available, the cooldown gate is open, and
    /// `input` is nonzero.  Returns the burst velocity.
    pub fn try_start(&mut self, now: f32, input: Vec2) -> Option<Vec2> {
        let direction = input.normalize_or_zero();
        if self.current_count == 0 || !self.cooldown_elapsed(now) || direction == Vec2::ZERO {
            return None;
        }
        self.current_count -= 1;
        self.last_dodge_time = Some(now);
        self.dodge_started = Some(now);
        Some(direction * self.speed)
    }

    /// Advance the burst and restore charges.
    ///
    /// Once the cooldown has elapsed since the last dodge, charges are
    /// restored to the maximum in one step.
    pub fn update(&mut self, now: f32) -> DodgeUpdate {
        if self.last_dodge_time.is_some() && self.cooldown_elapsed(now) {
            self.current_count = self.max_count;
        }

        match self.dodge_started {
            Some(start) if now >= start + self.duration => {
                self.dodge_started = None;
                DodgeUpdate::Ended
            }
            Some(_) => DodgeUpdate::Dodging,
            None => DodgeUpdate::Idle,
        }
    }

    pub fn set_max_dodge_count(&mut self, count: u32) {
        self.max_count = count.max(1);
        self.current_count = self.max_count;
    }
}
