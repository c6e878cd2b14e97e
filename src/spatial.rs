//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force. Entries
//! carry their radius so circle-vs-circle candidates can be found with one
//! query.

use crate::components::{Body, Hunter, Position};
use bevy_ecs::prelude::*;
use glam::Vec2;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Divides the page into cells and tracks which entities are in each cell.
#[derive(Resource, Debug, Clone)]
pub struct SpatialGrid {
    /// Cell size in pixels.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Largest radius inserted since the last clear.
    max_radius: f32,
    len: usize,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub pos: Vec2,
    pub radius: f32,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            max_radius: 0.0,
            len: 0,
        }
    }

    /// Convert page coordinates to cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.max_radius = 0.0;
        self.len = 0;
    }

    pub fn insert(&mut self, entity: Entity, pos: Vec2, radius: f32) {
        let cell = self.world_to_cell(pos);
        self.cells
            .entry(cell)
            .or_default()
            .push(SpatialEntry { entity, pos, radius });
        self.max_radius = self.max_radius.max(radius);
        self.len += 1;
    }

    /// Entries whose circle overlaps the query circle (strictly).
    /// Sorted by center distance, closest first.
    pub fn query_overlapping(&self, center: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let reach = radius + self.max_radius;
        let mut results: Vec<SpatialEntry> = self
            .candidates(center, reach)
            .copied()
            .filter(|e| e.pos.distance(center) < radius + e.radius)
            .collect();
        sort_by_distance(&mut results, center);
        results
    }

    /// Entries whose center lies within `radius`, closest first.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let mut results: Vec<SpatialEntry> = self
            .candidates(center, radius)
            .copied()
            .filter(|e| e.pos.distance_squared(center) <= radius * radius)
            .collect();
        sort_by_distance(&mut results, center);
        results
    }

    pub fn nearest(&self, center: Vec2, max_radius: f32) -> Option<SpatialEntry> {
        self.query_radius(center, max_radius).into_iter().next()
    }

    fn candidates(&self, center: Vec2, reach: f32) -> impl Iterator<Item = &SpatialEntry> + '_ {
        let span = (reach / self.cell_size).ceil() as i32 + 1;
        let (cx, cy) = self.world_to_cell(center);
        (-span..=span)
            .flat_map(move |dx| (-span..=span).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.cells.get(&cell))
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn sort_by_distance(entries: &mut [SpatialEntry], center: Vec2) {
    entries.sort_by(|a, b| {
        a.pos
            .distance_squared(center)
            .total_cmp(&b.pos.distance_squared(center))
    });
}

/// System that rebuilds the hunter grid each tick.
///
/// ## Data Access
/// - Reads: Hunter, Position, Body
/// - Writes: SpatialGrid
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &Position, &Body), With<Hunter>>,
) {
    grid.clear();
    for (entity, pos, body) in query.iter() {
        if body.is_removed() {
            continue;
        }
        grid.insert(entity, pos.0, body.radius());
    }
}
