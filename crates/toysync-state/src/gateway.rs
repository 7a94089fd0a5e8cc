//! The gateway collaborator - transport send and visibility toggles
//!
//! The core is fire-and-forget towards the host networking stack: patches
//! go out on a reliable ordered per-connection channel, spawn/despawn
//! notifications instantiate or destroy the object on the client. No acks
//! are observed at this layer.

use std::collections::HashSet;

use toysync_core::{ClientId, SyncError, SyncResult, ToyId};
use toysync_wire::Patch;

/// Outbound interface towards one host networking stack
pub trait Gateway {
    /// Send a patch to one subscriber connection
    fn send(&mut self, client: ClientId, patch: &Patch) -> SyncResult<()>;

    /// Instantiate the toy on the client ("become visible")
    fn notify_spawn(&mut self, toy: ToyId, client: ClientId) -> SyncResult<()>;

    /// Destroy the toy on the client ("become hidden")
    fn notify_despawn(&mut self, toy: ToyId, client: ClientId) -> SyncResult<()>;
}

/// One observed outbound call
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayEvent {
    Patch { client: ClientId, patch: Patch },
    Spawn { toy: ToyId, client: ClientId },
    Despawn { toy: ToyId, client: ClientId },
}

/// In-memory gateway that records every outbound call.
///
/// Used by the test suites across the workspace and usable as a loopback
/// for demos. Clients listed in `fail_for` reject sends, simulating a bad
/// connection for fan-out isolation tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    pub events: Vec<GatewayEvent>,
    pub fail_for: HashSet<ClientId>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        MemoryGateway::default()
    }

    /// Patches recorded for one client, in send order
    pub fn patches_for(&self, client: ClientId) -> Vec<&Patch> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GatewayEvent::Patch { client: c, patch } if *c == client => Some(patch),
                _ => None,
            })
            .collect()
    }

    /// Events addressed to one client, in order
    pub fn events_for(&self, client: ClientId) -> Vec<&GatewayEvent> {
        self.events
            .iter()
            .filter(|e| match e {
                GatewayEvent::Patch { client: c, .. } => *c == client,
                GatewayEvent::Spawn { client: c, .. } => *c == client,
                GatewayEvent::Despawn { client: c, .. } => *c == client,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Gateway for MemoryGateway {
    fn send(&mut self, client: ClientId, patch: &Patch) -> SyncResult<()> {
        if self.fail_for.contains(&client) {
            return Err(SyncError::SendFailed {
                client,
                reason: "connection rejected by test".into(),
            });
        }
        self.events.push(GatewayEvent::Patch {
            client,
            patch: patch.clone(),
        });
        Ok(())
    }

    fn notify_spawn(&mut self, toy: ToyId, client: ClientId) -> SyncResult<()> {
        self.events.push(GatewayEvent::Spawn { toy, client });
        Ok(())
    }

    fn notify_despawn(&mut self, toy: ToyId, client: ClientId) -> SyncResult<()> {
        self.events.push(GatewayEvent::Despawn { toy, client });
        Ok(())
    }
}
