//! Interest manager - region membership follows each client's vantage
//!
//! Every client's viewing position resolves to at most one region; the
//! client's desired controller set is that region plus its extended
//! neighbors. Reconciliation diffs the desired set against actual
//! membership and applies only the difference, so a client moving within
//! one region (the common case) is a single map lookup and an early
//! return.

use std::collections::{HashMap, HashSet};

use toysync_core::{ClientId, RegionId, Vec3};
use toysync_state::Gateway;
use tracing::{debug, trace};

use crate::{ControllerRegistry, RegionMap};

/// Vertical band treated as the surface when no region contains the
/// position. Interiors stacked above the band are unaffected; positions
/// inside the band with no containing region resolve to `region`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutdoorBand {
    pub min_y: f32,
    pub max_y: f32,
    pub region: RegionId,
}

impl OutdoorBand {
    pub fn contains(&self, position: Vec3) -> bool {
        position.y >= self.min_y && position.y <= self.max_y
    }
}

/// Per-client region tracking and subscription reconciliation
#[derive(Debug, Default)]
pub struct InterestManager {
    last_regions: HashMap<ClientId, Option<RegionId>>,
    outdoor: Option<OutdoorBand>,
}

impl InterestManager {
    pub fn new() -> Self {
        InterestManager::default()
    }

    pub fn with_outdoor_band(band: OutdoorBand) -> Self {
        InterestManager {
            last_regions: HashMap::new(),
            outdoor: Some(band),
        }
    }

    /// Last region a client's vantage resolved to, if it has been seen
    pub fn last_region(&self, client: ClientId) -> Option<Option<RegionId>> {
        self.last_regions.get(&client).copied()
    }

    /// Reconcile one client's subscriptions against its current vantage
    /// position. Returns `true` when membership changed.
    ///
    /// The resolved region is recorded before any subscription change, so
    /// a failed fan-out is not retried on the next unchanged-position
    /// call. Controllers the region map names but the registry does not
    /// know are skipped.
    pub fn reconcile(
        &mut self,
        client: ClientId,
        position: Vec3,
        map: &dyn RegionMap,
        registry: &mut ControllerRegistry,
        gateway: &mut dyn Gateway,
    ) -> bool {
        let resolved = self.resolve(position, map);

        if self.last_regions.get(&client) == Some(&resolved) {
            trace!(%client, "vantage region unchanged");
            return false;
        }
        self.last_regions.insert(client, resolved);

        let desired: HashSet<RegionId> = match resolved {
            Some(region) => {
                let mut set: HashSet<RegionId> = map
                    .extended_neighbors(region)
                    .into_iter()
                    .collect();
                set.insert(region);
                set.retain(|r| registry.region(*r).is_some());
                set
            }
            None => HashSet::new(),
        };
        debug!(%client, region = ?resolved, regions = desired.len(), "vantage region changed");

        let mut changed = false;
        let regions: Vec<RegionId> = registry.region_ids().collect();
        for region in regions {
            let controller = match registry.region_mut(region) {
                Some(c) => c,
                None => continue,
            };
            if desired.contains(&region) {
                changed |= controller.add_subscriber(client, gateway);
            } else {
                changed |= controller.remove_subscriber(client, gateway);
            }
        }
        changed
    }

    /// Drop a client's tracking state (disconnect path)
    pub fn forget_client(&mut self, client: ClientId) {
        self.last_regions.remove(&client);
    }

    fn resolve(&self, position: Vec3, map: &dyn RegionMap) -> Option<RegionId> {
        if let Some(region) = map.region_for(position) {
            return Some(region);
        }
        match self.outdoor {
            Some(band) if band.contains(position) => Some(band.region),
            _ => None,
        }
    }
}
