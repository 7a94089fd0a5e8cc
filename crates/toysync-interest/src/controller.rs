//! Region controller - subscription membership for one region's toys
//!
//! A controller owns the synchronizers of the toys anchored to its region
//! (exclusive ownership, one controller per synchronizer at a time) and
//! the set of subscribed clients. Membership changes fan out to every
//! owned synchronizer; a failure for one (subscriber, synchronizer) pair
//! is logged and never stops the rest of the fan-out.

use std::collections::HashSet;

use toysync_core::{ClientId, RegionId, ToyId, ToyKind};
use toysync_state::{Gateway, Synchronizer};
use tracing::error;

/// What a controller is responsible for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerScope {
    /// Fallback owner for toys not anchored to any region; its membership
    /// is every connected client
    Global,
    /// Toys anchored to one region
    Region(RegionId),
}

/// Subscription-membership owner for one region (or the global fallback)
#[derive(Debug)]
pub struct Controller {
    scope: ControllerScope,
    subscribers: HashSet<ClientId>,
    synchronizers: Vec<Synchronizer>,
}

impl Controller {
    pub fn new(scope: ControllerScope) -> Self {
        Controller {
            scope,
            subscribers: HashSet::new(),
            synchronizers: Vec::new(),
        }
    }

    pub fn scope(&self) -> ControllerScope {
        self.scope
    }

    pub fn region(&self) -> Option<RegionId> {
        match self.scope {
            ControllerScope::Global => None,
            ControllerScope::Region(region) => Some(region),
        }
    }

    pub fn is_subscriber(&self, client: ClientId) -> bool {
        self.subscribers.contains(&client)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.subscribers.iter().copied()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn toy_count(&self) -> usize {
        self.synchronizers.len()
    }

    /// Add a client to the membership. Idempotent: a second call is a
    /// no-op and triggers no dispatch.
    ///
    /// Visibility-gated toys are shown before they are synced, so the
    /// client has the object instantiated before field patches arrive.
    pub fn add_subscriber(&mut self, client: ClientId, gateway: &mut dyn Gateway) -> bool {
        if !self.subscribers.insert(client) {
            return false;
        }

        for sync in &mut self.synchronizers {
            if sync.is_visibility_gated() {
                if let Err(e) = sync.show_for(client, gateway) {
                    error!(toy = %sync.id(), %client, "show failed: {e}");
                    continue;
                }
            }
            if let Err(e) = sync.update_subscriber(client, gateway) {
                error!(toy = %sync.id(), %client, "subscribe sync failed: {e}");
            }
        }
        true
    }

    /// Remove a client from the membership. No-op on a non-member.
    ///
    /// Gated toys are hidden; lights go dark via the light-off shortcut so
    /// a client leaving the region does not keep stale illumination.
    pub fn remove_subscriber(&mut self, client: ClientId, gateway: &mut dyn Gateway) -> bool {
        if !self.subscribers.remove(&client) {
            return false;
        }

        for sync in &mut self.synchronizers {
            let result = match sync.kind() {
                ToyKind::Light => sync.disable_for(client, gateway),
                _ => sync.hide_for(client, gateway),
            };
            if let Err(e) = result {
                error!(toy = %sync.id(), %client, "unsubscribe cleanup failed: {e}");
            }
        }
        true
    }

    /// Force a full field-sync of every owned toy for one client,
    /// regardless of drift state (baseline resync).
    pub fn sync_for(&mut self, client: ClientId, gateway: &mut dyn Gateway) {
        for sync in &mut self.synchronizers {
            if let Err(e) = sync.update_subscriber(client, gateway) {
                error!(toy = %sync.id(), %client, "forced sync failed: {e}");
            }
        }
    }

    /// Attach a synchronizer to this controller (exclusive ownership).
    ///
    /// Gated toys are immediately shown to the current membership.
    pub fn attach(&mut self, mut sync: Synchronizer, gateway: &mut dyn Gateway) {
        if sync.is_visibility_gated() {
            for &client in &self.subscribers {
                if let Err(e) = sync
                    .show_for(client, gateway)
                    .and_then(|_| sync.update_subscriber(client, gateway).map(|_| ()))
                {
                    error!(toy = %sync.id(), %client, "attach announce failed: {e}");
                }
            }
        }
        self.synchronizers.push(sync);
    }

    /// Detach the synchronizer owning `toy`, returning it to the caller
    pub fn detach(&mut self, toy: ToyId) -> Option<Synchronizer> {
        let index = self.synchronizers.iter().position(|s| s.id() == toy)?;
        Some(self.synchronizers.remove(index))
    }

    pub fn synchronizer(&self, toy: ToyId) -> Option<&Synchronizer> {
        self.synchronizers.iter().find(|s| s.id() == toy)
    }

    pub fn synchronizer_mut(&mut self, toy: ToyId) -> Option<&mut Synchronizer> {
        self.synchronizers.iter_mut().find(|s| s.id() == toy)
    }

    /// Drop a client without any outbound notification (disconnect path):
    /// membership and every cached snapshot are pruned.
    pub fn drop_subscriber(&mut self, client: ClientId) {
        self.subscribers.remove(&client);
        for sync in &mut self.synchronizers {
            sync.forget(client);
        }
    }

    /// One drift-detection pass: every dirty toy pushes minimal patches to
    /// the current membership. Failures are isolated per pair.
    pub fn tick(&mut self, gateway: &mut dyn Gateway) {
        for sync in &mut self.synchronizers {
            match sync.detect_drift() {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(toy = %sync.id(), "drift detection failed: {e}");
                    continue;
                }
            }
            for &client in &self.subscribers {
                if let Err(e) = sync.update_subscriber(client, gateway) {
                    error!(toy = %sync.id(), %client, "drift dispatch failed: {e}");
                }
            }
        }
    }
}
