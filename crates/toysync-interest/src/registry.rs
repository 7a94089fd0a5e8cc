//! Controller registry - process-scoped controller state for one round
//!
//! Created at round start with one controller per region plus the global
//! fallback; torn down by drop at round end. Toys are attached to their
//! anchor region's controller, or to the global controller when
//! unanchored. The global controller's membership is every connected
//! client, maintained on connect/disconnect.

use std::collections::{HashMap, HashSet};

use toysync_core::{ClientId, RegionId, SyncError, SyncResult, Toy, ToyId};
use toysync_state::{Gateway, Synchronizer};
use tracing::{debug, error};

use crate::{Controller, ControllerScope};

/// All controllers of the active round
#[derive(Debug)]
pub struct ControllerRegistry {
    global: Controller,
    regions: HashMap<RegionId, Controller>,
    connected: HashSet<ClientId>,
}

impl ControllerRegistry {
    /// Round-start init: one controller per region plus the global one
    pub fn new(regions: impl IntoIterator<Item = RegionId>) -> Self {
        ControllerRegistry {
            global: Controller::new(ControllerScope::Global),
            regions: regions
                .into_iter()
                .map(|r| (r, Controller::new(ControllerScope::Region(r))))
                .collect(),
            connected: HashSet::new(),
        }
    }

    pub fn global(&self) -> &Controller {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut Controller {
        &mut self.global
    }

    pub fn region(&self, region: RegionId) -> Option<&Controller> {
        self.regions.get(&region)
    }

    pub fn region_mut(&mut self, region: RegionId) -> Option<&mut Controller> {
        self.regions.get_mut(&region)
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.keys().copied()
    }

    pub fn region_controllers_mut(&mut self) -> impl Iterator<Item = &mut Controller> {
        self.regions.values_mut()
    }

    pub fn connected(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.connected.iter().copied()
    }

    pub fn is_connected(&self, client: ClientId) -> bool {
        self.connected.contains(&client)
    }

    /// A client finished connecting: join the global membership and get
    /// the first-connect baseline sync of global toys.
    pub fn client_connected(&mut self, client: ClientId, gateway: &mut dyn Gateway) {
        if !self.connected.insert(client) {
            return;
        }
        debug!(%client, "client connected");
        self.global.add_subscriber(client, gateway);
    }

    /// A client disconnected: silent removal everywhere, cached snapshots
    /// and visibility entries pruned. Nothing is sent to a gone
    /// connection.
    pub fn client_disconnected(&mut self, client: ClientId) {
        if !self.connected.remove(&client) {
            return;
        }
        debug!(%client, "client disconnected");
        self.global.drop_subscriber(client);
        for controller in self.regions.values_mut() {
            controller.drop_subscriber(client);
        }
    }

    /// Attach a spawned toy's synchronizer to its anchor controller.
    ///
    /// Non-gated toys are announced to every connected client (the host
    /// engine's global spawn); gated toys become visible per subscriber
    /// through their controller.
    pub fn attach_toy(
        &mut self,
        anchor: Option<RegionId>,
        sync: Synchronizer,
        gateway: &mut dyn Gateway,
    ) -> SyncResult<ToyId> {
        let toy = sync.id();

        if !sync.is_visibility_gated() {
            for &client in &self.connected {
                if let Err(e) = gateway.notify_spawn(toy, client) {
                    error!(%toy, %client, "spawn announce failed: {e}");
                }
            }
        }

        let controller = match anchor {
            Some(region) => self
                .regions
                .get_mut(&region)
                .ok_or(SyncError::UnknownRegion(region))?,
            None => &mut self.global,
        };
        controller.attach(sync, gateway);
        Ok(toy)
    }

    /// Detach a toy before it is destroyed, announcing the despawn to
    /// whoever could see it. Returns the synchronizer to the caller.
    pub fn detach_toy(
        &mut self,
        toy: ToyId,
        gateway: &mut dyn Gateway,
    ) -> Option<Synchronizer> {
        let mut sync = self.detach_from_any(toy)?;

        if sync.is_visibility_gated() {
            // hide_for emits the despawn for each shown subscriber.
            let shown: Vec<ClientId> = self
                .connected
                .iter()
                .copied()
                .filter(|&c| sync.is_visible_for(c))
                .collect();
            for client in shown {
                if let Err(e) = sync.hide_for(client, gateway) {
                    error!(%toy, %client, "despawn announce failed: {e}");
                }
            }
        } else {
            for &client in &self.connected {
                if let Err(e) = gateway.notify_despawn(toy, client) {
                    error!(%toy, %client, "despawn announce failed: {e}");
                }
            }
        }

        Some(sync)
    }

    fn detach_from_any(&mut self, toy: ToyId) -> Option<Synchronizer> {
        if let Some(sync) = self.global.detach(toy) {
            return Some(sync);
        }
        self.regions.values_mut().find_map(|c| c.detach(toy))
    }

    /// Mutable access to a managed toy's live state
    pub fn toy_mut(&mut self, toy: ToyId) -> Option<&mut Toy> {
        self.synchronizer_mut(toy).map(Synchronizer::toy_mut)
    }

    pub fn synchronizer_mut(&mut self, toy: ToyId) -> Option<&mut Synchronizer> {
        if let Some(sync) = self.global.synchronizer_mut(toy) {
            return Some(sync);
        }
        self.regions
            .values_mut()
            .find_map(|c| c.synchronizer_mut(toy))
    }

    /// Force a baseline resync of every toy the client can currently
    /// see: the global controller plus each region controller the client
    /// is subscribed to (host-triggered recovery, e.g. after a rejoin).
    pub fn resync_client(&mut self, client: ClientId, gateway: &mut dyn Gateway) {
        if !self.connected.contains(&client) {
            return;
        }
        self.global.sync_for(client, gateway);
        for controller in self.regions.values_mut() {
            if controller.is_subscriber(client) {
                controller.sync_for(client, gateway);
            }
        }
    }

    /// One full drift-detection/dispatch pass over every controller
    pub fn tick(&mut self, gateway: &mut dyn Gateway) {
        self.global.tick(gateway);
        for controller in self.regions.values_mut() {
            controller.tick(gateway);
        }
    }
}
