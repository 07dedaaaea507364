//! Floating damage numbers.
//!
//! Any system can write a [`FloatingTextRequest`]; this module turns each one
//! into a world-space `Text2d` that rises and fades out over
//! `FLOATING_TEXT_LIFETIME` seconds.

use crate::constants::{
    CAMERA_SCALE, FLOATING_TEXT_FONT_SIZE, FLOATING_TEXT_LIFETIME, FLOATING_TEXT_RISE_SPEED,
};
use crate::events::FloatingTextRequest;
use bevy::prelude::*;

#[derive(Component, Debug, Clone)]
pub struct FloatingText {
    pub age: f32,
    pub lifetime: f32,
    pub base_color: Color,
}

impl FloatingText {
    pub fn alpha(&self) -> f32 {
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

pub struct FloatingTextPlugin;

impl Plugin for FloatingTextPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (spawn_floating_text_system, floating_text_system).chain(),
        );
    }
}

pub fn spawn_floating_text_system(
    mut commands: Commands,
    mut requests: MessageReader<FloatingTextRequest>,
) {
    for request in requests.read() {
        commands.spawn((
            FloatingText {
                age: 0.0,
                lifetime: FLOATING_TEXT_LIFETIME,
                base_color: request.color,
            },
            Text2d::new(request.text.clone()),
            TextFont {
                font_size: FLOATING_TEXT_FONT_SIZE,
                ..default()
            },
            TextColor(request.color),
            // Glyphs are laid out in pixels; scale them back into world units.
            Transform::from_translation(request.position.extend(5.0))
                .with_scale(Vec3::splat(CAMERA_SCALE)),
        ));
    }
}

pub fn floating_text_system(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut FloatingText, &mut Transform, &mut TextColor)>,
) {
    let dt = time.delta_secs();
    for (entity, mut text, mut transform, mut color) in q.iter_mut() {
        text.age += dt;
        if text.age >= text.lifetime {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation.y += FLOATING_TEXT_RISE_SPEED * dt;
        color.0 = text.base_color.with_alpha(text.alpha());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    #[test]
    fn text_rises_fades_and_expires() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(200)));
        app.add_message::<FloatingTextRequest>();
        app.add_plugins(FloatingTextPlugin);

        app.world_mut().write_message(FloatingTextRequest {
            text: "12".into(),
            position: Vec2::new(1.0, 2.0),
            color: Color::WHITE,
        });
        app.update();
        app.update();
        app.update();

        let (text, transform) = app
            .world_mut()
            .query::<(&FloatingText, &Transform)>()
            .single(app.world())
            .unwrap();
        assert!(text.alpha() < 1.0);
        assert!(transform.translation.y > 2.0);

        for _ in 0..15 {
            app.update();
        }
        assert_eq!(
            app.world_mut()
                .query::<&FloatingText>()
                .iter(app.world())
                .count(),
            0
        );
    }
}
