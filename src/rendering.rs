//! Gizmo rendering for every gameplay entity.
//!
//! Nothing in the game carries a mesh or sprite; each frame the systems here
//! redraw the world from component state:
//!
//! | Layer          | Shape                          | Source                         |
//! |----------------|--------------------------------|--------------------------------|
//! | Player         | circle + dodge ring + HP bar   | `Health`, `DodgeController`    |
//! | Aim indicator  | line + dot                     | `AimDirection`                 |
//! | Enemies        | circle, red flash, fading      | `Enemy::alpha` / `is_flashing` |
//! | XP orbs        | small circle                   | `XpOrb`                        |
//! | Projectiles    | circle                         | `Projectile::radius`           |
//! | Orbit volumes  | circles around the player      | `OrbitWeapon::volume_positions`|
//! | Homing units   | circle + heading tick          | `HomingUnit::heading`          |
//! | Slash cones    | two edges + arc                | `SlashVolume`                  |

use crate::constants::{HOMING_HIT_RADIUS, ORBIT_HIT_RADIUS, XP_ORB_RADIUS};
use crate::enemy::Enemy;
use crate::health::Health;
use crate::menu::GameState;
use crate::pickup::XpOrb;
use crate::player::{AimDirection, DodgeController, Player, PlayerMovement};
use crate::weapon::{HomingUnit, Projectile, SlashVolume, WeaponInstance};
use bevy::prelude::*;

/// Segments used to approximate a slash arc.
const SLASH_ARC_SEGMENTS: usize = 8;

pub struct GizmoRenderingPlugin;

impl Plugin for GizmoRenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (player_gizmo_system, enemy_gizmo_system, weapon_gizmo_system)
                .run_if(not(in_state(GameState::MainMenu))),
        );
    }
}

// ── Colours ───────────────────────────────────────────────────────────────────

fn enemy_color(enemy: &Enemy) -> Color {
    let base = if enemy.is_flashing() {
        Color::srgb(1.0, 0.15, 0.15)
    } else {
        Color::srgb(0.55, 0.2, 0.75)
    };
    base.with_alpha(enemy.alpha())
}

/// The cone outline of a slash anchored at `anchor`: left edge tip, arc
/// points from left to right, right edge tip.
pub fn slash_outline(anchor: Vec2, volume: &SlashVolume) -> Vec<Vec2> {
    let dir = volume.direction.normalize_or(Vec2::X);
    (0..=SLASH_ARC_SEGMENTS)
        .map(|i| {
            let t = i as f32 / SLASH_ARC_SEGMENTS as f32;
            let angle = volume.half_angle * (1.0 - 2.0 * t);
            anchor + Vec2::from_angle(angle).rotate(dir) * volume.radius
        })
        .collect()
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Player body, dodge ring, aim indicator and health bar.
pub fn player_gizmo_system(
    mut gizmos: Gizmos,
    q_player: Query<(&Transform, &Health, &DodgeController, &PlayerMovement), With<Player>>,
    aim: Res<AimDirection>,
) {
    let Ok((transform, health, dodge, movement)) = q_player.single() else {
        return;
    };
    let pos = transform.translation.truncate();
    let hp_frac = health.ratio();

    let body = Color::srgb(0.9, 0.85, 0.7);
    gizmos.circle_2d(pos, 0.4, body);
    let eye = if movement.facing_left { -0.15 } else { 0.15 };
    gizmos.circle_2d(pos + Vec2::new(eye, 0.1), 0.05, body);
    if dodge.is_dodging() {
        gizmos.circle_2d(pos, 0.55, Color::srgba(0.4, 0.9, 1.0, 0.8));
    }

    if aim.0.length_squared() > 0.01 {
        let aim_tip = pos + aim.0.normalize_or_zero() * 1.0;
        gizmos.line_2d(pos, aim_tip, Color::srgb(1.0, 0.5, 0.0));
        gizmos.circle_2d(aim_tip, 0.06, Color::srgb(1.0, 0.5, 0.0));
    }

    // Health bar
    let bar_half = 0.5;
    let bar_start = pos + Vec2::new(-bar_half, 0.7);
    let bar_end_full = pos + Vec2::new(bar_half, 0.7);
    gizmos.line_2d(bar_start, bar_end_full, Color::srgba(0.4, 0.0, 0.0, 0.8));
    if hp_frac > 0.0 {
        let bar_end_hp = bar_start + Vec2::new(bar_half * 2.0 * hp_frac, 0.0);
        gizmos.line_2d(bar_start, bar_end_hp, Color::srgb(1.0 - hp_frac, hp_frac, 0.0));
    }
}

pub fn enemy_gizmo_system(
    mut gizmos: Gizmos,
    q_enemies: Query<(&Transform, &Enemy)>,
    q_orbs: Query<&Transform, With<XpOrb>>,
) {
    for (transform, enemy) in q_enemies.iter() {
        let pos = transform.translation.truncate();
        gizmos.circle_2d(pos, enemy.radius, enemy_color(enemy));
        // Eye on the facing side
        let eye = if enemy.facing_left { -0.15 } else { 0.15 };
        gizmos.circle_2d(
            pos + Vec2::new(eye, 0.1),
            0.05,
            Color::srgba(1.0, 0.9, 0.3, enemy.alpha()),
        );
    }

    for transform in q_orbs.iter() {
        gizmos.circle_2d(
            transform.translation.truncate(),
            XP_ORB_RADIUS,
            Color::srgb(0.3, 1.0, 0.5),
        );
    }
}

/// Projectiles, orbit volumes, homing units and slash cones.
pub fn weapon_gizmo_system(
    mut gizmos: Gizmos,
    q_player: Query<&Transform, With<Player>>,
    q_weapons: Query<&WeaponInstance>,
    q_projectiles: Query<(&Transform, &Projectile)>,
    q_homing: Query<(&Transform, &HomingUnit)>,
    q_slashes: Query<(&Transform, &SlashVolume)>,
) {
    let proj_color = Color::srgb(1.0, 0.9, 0.2);
    for (transform, projectile) in q_projectiles.iter() {
        gizmos.circle_2d(transform.translation.truncate(), projectile.radius, proj_color);
    }

    if let Ok(player_transform) = q_player.single() {
        let origin = player_transform.translation.truncate();
        for weapon in q_weapons.iter() {
            if let WeaponInstance::Orbit(orbit) = weapon {
                for p in orbit.volume_positions(origin) {
                    gizmos.circle_2d(p, ORBIT_HIT_RADIUS, Color::srgb(0.75, 0.75, 0.8));
                }
            }
        }
    }

    let homing_color = Color::srgb(0.9, 0.3, 0.9);
    for (transform, unit) in q_homing.iter() {
        let pos = transform.translation.truncate();
        gizmos.circle_2d(pos, HOMING_HIT_RADIUS, homing_color);
        gizmos.line_2d(pos, pos + unit.heading * HOMING_HIT_RADIUS * 2.0, homing_color);
    }

    for (transform, volume) in q_slashes.iter() {
        let anchor = transform.translation.truncate();
        let fade = (1.0 - volume.age / volume.lifetime).clamp(0.0, 1.0);
        let color = Color::srgba(1.0, 0.35, 0.2, fade);
        let outline = slash_outline(anchor, volume);
        if let (Some(first), Some(last)) = (outline.first(), outline.last()) {
            gizmos.line_2d(anchor, *first, color);
            gizmos.line_2d(anchor, *last, color);
        }
        for pair in outline.windows(2) {
            gizmos.line_2d(pair[0], pair[1], color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::spatial_partition::EnemyRegistry;
    use crate::weapon::test_support;
    use crate::weapon::{AttackContext, SlashWeapon, Weapon, WeaponAction};

    #[test]
    fn slash_outline_spans_the_cone() {
        let mut weapon = SlashWeapon::from_config(&GameConfig::default());
        let registry = EnemyRegistry::default();
        let mut rng = test_support::rng();
        let mut ctx = AttackContext {
            now: 0.0,
            dt: 0.0,
            origin: Vec2::ZERO,
            aim: Vec2::Y,
            enemies: &registry,
            rng: &mut rng,
        };
        let actions = weapon.attack(&mut ctx);
        let Some(WeaponAction::SpawnSlash { volume, .. }) = actions.first() else {
            panic!("slash weapon produced no volume");
        };

        let outline = slash_outline(Vec2::ZERO, volume);
        assert_eq!(outline.len(), SLASH_ARC_SEGMENTS + 1);
        for p in &outline {
            assert!((p.length() - volume.radius).abs() < 1e-4);
            assert!(p.y > 0.0);
        }
        let mid = outline[SLASH_ARC_SEGMENTS / 2];
        assert!(mid.x.abs() < 1e-4);
    }
}
