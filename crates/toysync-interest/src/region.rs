//! The region graph interface
//!
//! The region topology is built elsewhere; this layer only asks two
//! questions: which region contains a position, and which regions count as
//! extended neighbors of a region. `StaticRegionMap` is a plain AABB-cell
//! implementation for tests and demos.

use std::collections::HashMap;

use toysync_core::{RegionId, Vec3};

/// Neighbor-query interface over the opaque region graph
pub trait RegionMap {
    /// Region containing `position`, if any
    fn region_for(&self, position: Vec3) -> Option<RegionId>;

    /// Extended neighborhood of `region` (not including `region` itself)
    fn extended_neighbors(&self, region: RegionId) -> Vec<RegionId>;
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min, max }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Static region map over AABB cells with an explicit neighbor relation
#[derive(Debug, Default)]
pub struct StaticRegionMap {
    cells: Vec<(Aabb, RegionId)>,
    neighbors: HashMap<RegionId, Vec<RegionId>>,
}

impl StaticRegionMap {
    pub fn new() -> Self {
        StaticRegionMap::default()
    }

    /// Register a region covering `bounds`. First match wins on overlap.
    pub fn add_region(&mut self, region: RegionId, bounds: Aabb) -> &mut Self {
        self.cells.push((bounds, region));
        self.neighbors.entry(region).or_default();
        self
    }

    /// Declare the extended neighborhood of a region
    pub fn set_neighbors(&mut self, region: RegionId, neighbors: Vec<RegionId>) -> &mut Self {
        self.neighbors.insert(region, neighbors);
        self
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.cells.iter().map(|(_, id)| *id)
    }
}

impl RegionMap for StaticRegionMap {
    fn region_for(&self, position: Vec3) -> Option<RegionId> {
        self.cells
            .iter()
            .find(|(bounds, _)| bounds.contains(position))
            .map(|(_, id)| *id)
    }

    fn extended_neighbors(&self, region: RegionId) -> Vec<RegionId> {
        self.neighbors.get(&region).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_region_map_lookup() {
        let mut map = StaticRegionMap::new();
        map.add_region(
            RegionId::new(1),
            Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0)),
        );
        map.add_region(
            RegionId::new(2),
            Aabb::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0)),
        );
        map.set_neighbors(RegionId::new(1), vec![RegionId::new(2)]);

        assert_eq!(map.region_for(Vec3::new(5.0, 5.0, 5.0)), Some(RegionId::new(1)));
        assert_eq!(map.region_for(Vec3::new(15.0, 5.0, 5.0)), Some(RegionId::new(2)));
        assert_eq!(map.region_for(Vec3::new(50.0, 0.0, 0.0)), None);

        assert_eq!(map.extended_neighbors(RegionId::new(1)), vec![RegionId::new(2)]);
        assert!(map.extended_neighbors(RegionId::new(2)).is_empty());
    }
}
