//! Player health pool.

use bevy::prelude::*;

/// What a call to [`Health::take_damage`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Invincible; nothing changed.
    Ignored,
    Damaged { applied: f32 },
    /// Health reached zero on this hit.
    Died { applied: f32 },
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
    invincible: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            invincible: false,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Callers must stop calling this once `Died` has been returned.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.invincible {
            return DamageOutcome::Ignored;
        }
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        let applied = before - self.current;
        if self.current <= 0.0 {
            DamageOutcome::Died { applied }
        } else {
            DamageOutcome::Damaged { applied }
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    /// Raise the cap and the current value by the same delta.
    pub fn increase_max_health(&mut self, delta: f32) {
        self.max += delta;
        self.current = (self.current + delta).clamp(0.0, self.max);
    }

    pub fn set_max_health(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.current = self.current.min(self.max);
    }

    pub fn set_current_health(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }

    pub fn set_invincible(&mut self, invincible: bool) {
        self.invincible = invincible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invincible_health_ignores_damage() {
        let mut health = Health::new(100.0);
        health.set_invincible(true);
        assert_eq!(health.take_damage(50.0), DamageOutcome::Ignored);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn damage_clamps_at_zero_and_signals_death() {
        let mut health = Health::new(10.0);
        assert_eq!(
            health.take_damage(4.0),
            DamageOutcome::Damaged { applied: 4.0 }
        );
        assert_eq!(
            health.take_damage(50.0),
            DamageOutcome::Died { applied: 6.0 }
        );
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn increase_max_raises_both() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        health.increase_max_health(20.0);
        assert_eq!(health.max(), 120.0);
        assert_eq!(health.current(), 90.0);
    }

    #[test]
    fn setters_clamp_to_range() {
        let mut health = Health::new(100.0);
        health.set_current_health(250.0);
        assert_eq!(health.current(), 100.0);
        health.set_current_health(-5.0);
        assert_eq!(health.current(), 0.0);
        health.set_current_health(80.0);
        health.set_max_health(50.0);
        assert_eq!(health.current(), 50.0);
        health.heal(1000.0);
        assert_eq!(health.current(), 50.0);
    }
}
