//! Terrain
//!
//! A sparse grid of sand blocks. Agents walk on its surface, fallback
//! behavior digs into it, and deposits keep their drop zones cleared.
//!
//! Cell `(0, 0, 0)` has its minimum corner at `origin`; the footprint spans
//! `0..width` on x and `0..depth` on z, layers count up from y = 0.

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec3};
use rand::Rng;
use std::collections::HashSet;

use crate::config::TerrainConfig;

/// Resource: the block grid
#[derive(Resource, Debug, Clone)]
pub struct Terrain {
    blocks: HashSet<IVec3>,
    origin: Vec3,
    block_size: f32,
    width: i32,
    depth: i32,
    height: i32,
    max_blocks: usize,
    /// Cells dug out, in the order they were removed
    holes: Vec<IVec3>,
}

impl Terrain {
    /// Empty terrain centred on the world origin
    pub fn new(config: &TerrainConfig) -> Self {
        let origin = Vec3::new(
            -(config.width as f32) * config.block_size / 2.0,
            0.0,
            -(config.depth as f32) * config.block_size / 2.0,
        );
        Self {
            blocks: HashSet::new(),
            origin,
            block_size: config.block_size,
            width: config.width,
            depth: config.depth,
            height: config.height,
            max_blocks: config.max_blocks,
            holes: Vec::new(),
        }
    }

    /// Terrain filled with `sand_layers` solid layers
    pub fn generate(config: &TerrainConfig) -> Self {
        let mut terrain = Self::new(config);
        for y in 0..config.sand_layers.min(config.height) {
            for x in 0..config.width {
                for z in 0..config.depth {
                    terrain.create_block(IVec3::new(x, y, z));
                }
            }
        }
        tracing::debug!("Generated terrain with {} blocks", terrain.block_count());
        terrain
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn holes(&self) -> &[IVec3] {
        &self.holes
    }

    pub fn in_bounds(&self, cell: IVec3) -> bool {
        (0..self.width).contains(&cell.x)
            && (0..self.depth).contains(&cell.z)
            && (0..self.height).contains(&cell.y)
    }

    pub fn has_block(&self, cell: IVec3) -> bool {
        self.blocks.contains(&cell)
    }

    /// Place a block; false when out of bounds, occupied, or at capacity
    pub fn create_block(&mut self, cell: IVec3) -> bool {
        if !self.in_bounds(cell) || self.blocks.len() >= self.max_blocks {
            return false;
        }
        self.blocks.insert(cell)
    }

    /// Remove a block; false when there was none
    pub fn destroy_block(&mut self, cell: IVec3) -> bool {
        if self.blocks.remove(&cell) {
            self.holes.push(cell);
            true
        } else {
            false
        }
    }

    pub fn world_to_grid(&self, pos: Vec3) -> IVec3 {
        ((pos - self.origin) / self.block_size).floor().as_ivec3()
    }

    /// Centre of a cell in world space
    pub fn grid_to_world(&self, cell: IVec3) -> Vec3 {
        self.origin + (cell.as_vec3() + Vec3::splat(0.5)) * self.block_size
    }

    /// Topmost occupied layer of a column
    pub fn highest_block_at(&self, x: i32, z: i32) -> Option<i32> {
        (0..self.height)
            .rev()
            .find(|&y| self.blocks.contains(&IVec3::new(x, y, z)))
    }

    /// Height an agent standing at `pos` rests at
    pub fn surface_height(&self, pos: Vec3) -> f32 {
        let cell = self.world_to_grid(pos);
        match self.highest_block_at(cell.x, cell.z) {
            Some(y) => self.origin.y + (y + 1) as f32 * self.block_size,
            None => self.origin.y,
        }
    }

    /// Put `pos` on the ground at its column
    pub fn ground(&self, pos: Vec3) -> Vec3 {
        Vec3::new(pos.x, self.surface_height(pos), pos.z)
    }

    /// Clamp a point into the footprint on the ground plane
    pub fn clamp_to_footprint(&self, pos: Vec3) -> Vec3 {
        let min_x = self.origin.x;
        let min_z = self.origin.z;
        let max_x = self.origin.x + self.width as f32 * self.block_size - 0.01;
        let max_z = self.origin.z + self.depth as f32 * self.block_size - 0.01;
        Vec3::new(pos.x.clamp(min_x, max_x), pos.y, pos.z.clamp(min_z, max_z))
    }

    pub fn contains_point(&self, pos: Vec3) -> bool {
        let cell = self.world_to_grid(pos);
        (0..self.width).contains(&cell.x) && (0..self.depth).contains(&cell.z)
    }

    /// Uniform random point on the ground inside the footprint
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec3 {
        let x = self.origin.x + rng.gen_range(0.0..self.width as f32 * self.block_size);
        let z = self.origin.z + rng.gen_range(0.0..self.depth as f32 * self.block_size);
        self.ground(Vec3::new(x, 0.0, z))
    }

    /// Top block of a random column, if the column has any
    pub fn random_surface_block(&self, rng: &mut impl Rng) -> Option<IVec3> {
        let x = rng.gen_range(0..self.width);
        let z = rng.gen_range(0..self.depth);
        self.highest_block_at(x, z).map(|y| IVec3::new(x, y, z))
    }

    /// Solid neighbours of a cell, in a fixed order
    pub fn solid_neighbours(&self, cell: IVec3) -> Vec<IVec3> {
        [
            IVec3::X,
            IVec3::NEG_X,
            IVec3::Z,
            IVec3::NEG_Z,
            IVec3::NEG_Y,
        ]
        .iter()
        .map(|d| cell + *d)
        .filter(|c| self.has_block(*c))
        .collect()
    }

    /// Cells within `radius` of `centre` on the ground plane, lowest `levels` layers
    pub fn cells_within(&self, centre: Vec3, radius: f32, levels: i32) -> Vec<IVec3> {
        let reach = (radius / self.block_size).ceil() as i32 + 1;
        let c = self.world_to_grid(centre);
        let mut cells = Vec::new();
        for y in 0..levels.min(self.height) {
            for x in (c.x - reach)..=(c.x + reach) {
                for z in (c.z - reach)..=(c.z + reach) {
                    let cell = IVec3::new(x, y, z);
                    let p = self.grid_to_world(cell);
                    let dx = p.x - centre.x;
                    let dz = p.z - centre.z;
                    if (dx * dx + dz * dz).sqrt() <= radius && self.in_bounds(cell) {
                        cells.push(cell);
                    }
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config() -> TerrainConfig {
        TerrainConfig {
            width: 10,
            depth: 10,
            height: 4,
            sand_layers: 2,
            block_size: 1.0,
            max_blocks: 1000,
        }
    }

    #[test]
    fn test_generate_fills_layers() {
        let terrain = Terrain::generate(&config());
        assert_eq!(terrain.block_count(), 200);
        assert_eq!(terrain.highest_block_at(3, 3), Some(1));
        assert_eq!(terrain.surface_height(Vec3::ZERO), 2.0);
    }

    #[test]
    fn test_grid_conversion() {
        let terrain = Terrain::new(&config());
        let cell = IVec3::new(5, 0, 5);
        let centre = terrain.grid_to_world(cell);
        assert_eq!(centre, Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(terrain.world_to_grid(centre), cell);
        assert_eq!(terrain.world_to_grid(Vec3::new(-5.0, 0.0, -5.0)), IVec3::ZERO);
    }

    #[test]
    fn test_create_and_destroy() {
        let mut terrain = Terrain::new(&config());
        let cell = IVec3::new(1, 0, 1);
        assert!(terrain.create_block(cell));
        assert!(!terrain.create_block(cell));
        assert!(!terrain.create_block(IVec3::new(99, 0, 0)));
        assert!(terrain.destroy_block(cell));
        assert!(!terrain.destroy_block(cell));
        assert_eq!(terrain.holes(), &[cell]);
    }

    #[test]
    fn test_capacity_respected() {
        let mut cfg = config();
        cfg.max_blocks = 5;
        let terrain = Terrain::generate(&cfg);
        assert_eq!(terrain.block_count(), 5);
    }

    #[test]
    fn test_surface_after_digging() {
        let mut terrain = Terrain::generate(&config());
        let cell = terrain.world_to_grid(Vec3::ZERO);
        terrain.destroy_block(IVec3::new(cell.x, 1, cell.z));
        assert_eq!(terrain.surface_height(Vec3::ZERO), 1.0);
        terrain.destroy_block(IVec3::new(cell.x, 0, cell.z));
        assert_eq!(terrain.surface_height(Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_random_point_in_footprint() {
        let terrain = Terrain::generate(&config());
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            assert!(terrain.contains_point(terrain.random_point(&mut rng)));
        }
    }

    #[test]
    fn test_cells_within_radius() {
        let terrain = Terrain::generate(&config());
        let cells = terrain.cells_within(Vec3::new(0.5, 0.0, 0.5), 1.0, 1);
        // centre plus four neighbours on one level
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|c| c.y == 0));
    }
}
