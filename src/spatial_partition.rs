//! Enemy registry: spatial grid for nearest-target and overlap queries.
//!
//! Weapons never look enemies up through the ECS directly.  Once per frame
//! [`rebuild_enemy_registry_system`] snapshots every *living* enemy into
//! [`EnemyRegistry`], and weapon code queries that snapshot read-only.
//!
//! ## Ordering
//!
//! Entries are kept in spawn order (`SpawnOrder`), and every query returns
//! results in that order.  Nearest-target search replaces the current best
//! only on a strictly smaller distance, so equidistant enemies resolve to the
//! earliest spawned.
//!
//! ## Cell Size Choice
//!
//! Cell size (`GRID_CELL_SIZE` in `constants.rs`) must be chosen relative to the
//! query radius.  With `GRID_CELL_SIZE = 4`:
//!   - an orbit/slash overlap query (≤ 2.5 u) checks a 3×3 = 9 cell area
//!   - a projectile targeting query at `range = 5` checks a 5×5 = 25 cell area

use crate::constants::GRID_CELL_SIZE;
use crate::enemy::{Enemy, SpawnOrder};
use bevy::prelude::*;
use std::collections::HashMap;

/// One living enemy as seen by the weapons this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyEntry {
    pub entity: Entity,
    pub position: Vec2,
    /// Body radius; overlap queries add it to the query radius.
    pub radius: f32,
    pub order: u64,
}

/// Resource holding the enemy snapshot for this frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct EnemyRegistry {
    /// Sorted by `order`.
    entries: Vec<EnemyEntry>,
    /// Map from cell coordinates to indices into `entries`.
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl EnemyRegistry {
    /// Compute grid cell coordinates for a world position
    fn world_to_cell(pos: Vec2) -> (i32, i32) {
        let x = (pos.x / GRID_CELL_SIZE).floor() as i32;
        let y = (pos.y / GRID_CELL_SIZE).floor() as i32;
        (x, y)
    }

    /// Compute how many cells in each direction we need to check for a given max distance
    fn radius_in_cells(max_distance: f32) -> i32 {
        ((max_distance / GRID_CELL_SIZE).ceil() as i32).max(1)
    }

    /// Replace the snapshot.  Entries are sorted by spawn order here.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = EnemyEntry>) {
        self.entries.clear();
        self.entries.extend(entries);
        self.entries.sort_by_key(|e| e.order);

        // Retain allocations but clear contents to avoid re-allocating Vec capacity
        for v in self.cells.values_mut() {
            v.clear();
        }
        for (index, entry) in self.entries.iter().enumerate() {
            self.cells
                .entry(Self::world_to_cell(entry.position))
                .or_default()
                .push(index);
        }
        self.cells.retain(|_, v| !v.is_empty());
    }

    pub fn get(&self, entity: Entity) -> Option<&EnemyEntry> {
        self.entries.iter().find(|e| e.entity == entity)
    }

    /// Indices of entries in cells that overlap the circle, ascending
    /// (i.e. in spawn order).  A conservative over-approximation: callers do
    /// the exact distance check.
    fn candidates(&self, center: Vec2, max_distance: f32) -> Vec<usize> {
        let cell = Self::world_to_cell(center);
        let cells_to_check = Self::radius_in_cells(max_distance);

        let mut indices = Vec::new();
        for dx in -cells_to_check..=cells_to_check {
            for dy in -cells_to_check..=cells_to_check {
                if let Some(bucket) = self.cells.get(&(cell.0 + dx, cell.1 + dy)) {
                    indices.extend_from_slice(bucket);
                }
            }
        }
        indices.sort_unstable();
        indices
    }

    /// Nearest enemy whose centre lies within `range` of `origin`.
    pub fn nearest_within(&self, origin: Vec2, range: f32) -> Option<&EnemyEntry> {
        let mut best: Option<(&EnemyEntry, f32)> = None;
        for index in self.candidates(origin, range) {
            let entry = &self.entries[index];
            let dist = entry.position.distance(origin);
            if dist > range {
                continue;
            }
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((entry, dist)),
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Enemies whose body overlaps the circle `(center, radius)`, in spawn order.
    pub fn query_circle(&self, center: Vec2, radius: f32) -> Vec<EnemyEntry> {
        // Widen the cell search so large bodies near the edge are not missed.
        let widest = self.entries.iter().map(|e| e.radius).fold(0.0, f32::max);
        self.candidates(center, radius + widest)
            .into_iter()
            .map(|index| self.entries[index])
            .filter(|entry| entry.position.distance(center) <= radius + entry.radius)
            .collect()
    }
}

/// System to rebuild the registry each frame.
/// Must run BEFORE weapon ticks and hit checks.
pub fn rebuild_enemy_registry_system(
    mut registry: ResMut<EnemyRegistry>,
    query: Query<(Entity, &Transform, &Enemy, &SpawnOrder)>,
) {
    registry.rebuild(
        query
            .iter()
            .filter(|(_, _, enemy, _)| enemy.is_alive())
            .map(|(entity, transform, enemy, order)| EnemyEntry {
                entity,
                position: transform.translation.truncate(),
                radius: enemy.radius,
                order: order.0,
            }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(world: &mut World, x: f32, y: f32, order: u64) -> EnemyEntry {
        EnemyEntry {
            entity: world.spawn_empty().id(),
            position: Vec2::new(x, y),
            radius: 0.4,
            order,
        }
    }

    #[test]
    fn nearest_prefers_closest_within_range() {
        let mut world = World::new();
        let far = entry(&mut world, 4.0, 0.0, 0);
        let near = entry(&mut world, 0.0, 2.0, 1);
        let out_of_range = entry(&mut world, 0.5, 9.0, 2);
        let mut registry = EnemyRegistry::default();
        registry.rebuild([far, near, out_of_range]);

        let hit = registry.nearest_within(Vec2::ZERO, 5.0).unwrap();
        assert_eq!(hit.entity, near.entity);
        assert!(registry.nearest_within(Vec2::new(100.0, 0.0), 5.0).is_none());
    }

    #[test]
    fn equidistant_tie_goes_to_earliest_spawn() {
        let mut world = World::new();
        let later = entry(&mut world, -3.0, 0.0, 7);
        let earlier = entry(&mut world, 3.0, 0.0, 2);
        let mut registry = EnemyRegistry::default();
        // Insertion order must not matter, only spawn order.
        registry.rebuild([later, earlier]);

        let hit = registry.nearest_within(Vec2::ZERO, 5.0).unwrap();
        assert_eq!(hit.entity, earlier.entity);
    }

    #[test]
    fn circle_query_accounts_for_body_radius() {
        let mut world = World::new();
        let touching = entry(&mut world, 0.85, 0.0, 0);
        let clear = entry(&mut world, 1.0, 0.0, 1);
        let mut registry = EnemyRegistry::default();
        registry.rebuild([touching, clear]);

        let hits = registry.query_circle(Vec2::ZERO, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, touching.entity);
    }

    #[test]
    fn query_spans_cell_boundaries() {
        let mut world = World::new();
        let a = entry(&mut world, GRID_CELL_SIZE - 0.1, 0.0, 0);
        let b = entry(&mut world, GRID_CELL_SIZE + 0.1, 0.0, 1);
        let mut registry = EnemyRegistry::default();
        registry.rebuild([b, a]);

        let hits = registry.query_circle(Vec2::new(GRID_CELL_SIZE, 0.0), 0.5);
        let entities: Vec<_> = hits.iter().map(|e| e.entity).collect();
        assert_eq!(entities, vec![a.entity, b.entity], "results in spawn order");
    }
}
