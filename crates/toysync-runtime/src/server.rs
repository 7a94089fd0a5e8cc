//! The sync server - cooperative tick loop over one round
//!
//! All sync state is owned by one `SyncServer` and mutated from its tick
//! loop only. The single concurrent structure is the vantage-event intake
//! queue: host callbacks (spectate-target change, camera switch) push from
//! wherever they fire, the loop drains events once their debounce expires.
//! Queued events for the same client are executed, not collapsed; each
//! execution re-reads the client's current position.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use toysync_core::{ClientId, RegionId, Vec3};
use toysync_interest::{ControllerRegistry, InterestManager, RegionMap};
use toysync_state::Gateway;
use tracing::{debug, info};

use crate::RuntimeConfig;

/// Where clients are looking from.
///
/// The vantage position is the spectated player's or active camera's
/// position, not necessarily the client's own body.
pub trait Presence {
    /// Currently connected clients
    fn clients(&self) -> Vec<ClientId>;

    /// Current vantage position of one client
    fn position_of(&self, client: ClientId) -> Option<Vec3>;
}

/// In-memory presence table, for tests and loopback demos
#[derive(Debug, Default)]
pub struct MemoryPresence {
    positions: HashMap<ClientId, Vec3>,
}

impl MemoryPresence {
    pub fn new() -> Self {
        MemoryPresence::default()
    }

    pub fn set(&mut self, client: ClientId, position: Vec3) {
        self.positions.insert(client, position);
    }

    pub fn remove(&mut self, client: ClientId) {
        self.positions.remove(&client);
    }
}

impl Presence for MemoryPresence {
    fn clients(&self) -> Vec<ClientId> {
        self.positions.keys().copied().collect()
    }

    fn position_of(&self, client: ClientId) -> Option<Vec3> {
        self.positions.get(&client).copied()
    }
}

#[derive(Debug)]
struct VantageEvent {
    client: ClientId,
    due: Instant,
}

/// Cloneable handle onto the vantage-event intake queue.
///
/// Host-side callbacks hold a clone and push; the tick loop drains.
#[derive(Clone, Debug)]
pub struct VantageEvents {
    queue: Arc<Mutex<VecDeque<VantageEvent>>>,
    debounce: Duration,
}

impl VantageEvents {
    pub fn new(debounce: Duration) -> Self {
        VantageEvents {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            debounce,
        }
    }

    /// Enqueue a debounced reconciliation for one client
    pub fn push(&self, client: ClientId) {
        self.push_at(client, Instant::now());
    }

    /// Enqueue with an explicit timestamp (deterministic tests)
    pub fn push_at(&self, client: ClientId, now: Instant) {
        self.queue.lock().push_back(VantageEvent {
            client,
            due: now + self.debounce,
        });
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Pop every event whose debounce has expired, in queue order
    fn drain_due(&self, now: Instant) -> Vec<ClientId> {
        let mut queue = self.queue.lock();
        let mut due = Vec::new();
        while let Some(event) = queue.front() {
            if event.due > now {
                break;
            }
            // front() just matched; the pop cannot fail.
            if let Some(event) = queue.pop_front() {
                due.push(event.client);
            }
        }
        due
    }
}

/// Counters over the server's lifetime
#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub ticks: u64,
    /// Reconcile passes that changed a client's membership
    pub reconciliations: u64,
    /// Reconcile passes that changed nothing (fast path included)
    pub fast_path_skips: u64,
    pub vantage_events: u64,
    pub last_tick_duration: Duration,
}

/// One round's sync state and its tick loop
pub struct SyncServer<M, G, P> {
    pub(crate) config: RuntimeConfig,
    pub(crate) map: M,
    pub(crate) gateway: G,
    pub(crate) presence: P,
    pub(crate) registry: ControllerRegistry,
    pub(crate) manager: InterestManager,
    vantage: VantageEvents,
    stats: RuntimeStats,
    pub(crate) next_toy: u64,
}

impl<M: RegionMap, G: Gateway, P: Presence> SyncServer<M, G, P> {
    /// Round-start init: controllers for `regions` plus the global one
    pub fn new(
        config: RuntimeConfig,
        map: M,
        regions: impl IntoIterator<Item = RegionId>,
        gateway: G,
        presence: P,
    ) -> Self {
        let manager = match config.outdoor_band() {
            Some(band) => InterestManager::with_outdoor_band(band),
            None => InterestManager::new(),
        };
        let vantage = VantageEvents::new(config.vantage_debounce);
        SyncServer {
            registry: ControllerRegistry::new(regions),
            manager,
            vantage,
            stats: RuntimeStats::default(),
            next_toy: 1,
            config,
            map,
            gateway,
            presence,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.registry
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn presence_mut(&mut self) -> &mut P {
        &mut self.presence
    }

    /// Handle for host callbacks to push vantage events
    pub fn vantage_events(&self) -> VantageEvents {
        self.vantage.clone()
    }

    /// A client finished connecting: global membership plus an immediate
    /// interest reconciliation at its current position.
    pub fn client_connected(&mut self, client: ClientId) {
        self.registry.client_connected(client, &mut self.gateway);
        self.reconcile_client(client);
    }

    /// Disconnect: prune everything, no outbound traffic
    pub fn client_disconnected(&mut self, client: ClientId) {
        self.registry.client_disconnected(client);
        self.manager.forget_client(client);
    }

    /// Force a full baseline resync of everything one client can see
    /// (host-triggered recovery)
    pub fn resync_client(&mut self, client: ClientId) {
        self.registry.resync_client(client, &mut self.gateway);
    }

    /// Reconcile one client against its current vantage position
    pub fn reconcile_client(&mut self, client: ClientId) -> bool {
        let Some(position) = self.presence.position_of(client) else {
            return false;
        };
        let changed = self.manager.reconcile(
            client,
            position,
            &self.map,
            &mut self.registry,
            &mut self.gateway,
        );
        if changed {
            self.stats.reconciliations += 1;
        } else {
            self.stats.fast_path_skips += 1;
        }
        changed
    }

    /// Drain vantage events whose debounce expired and reconcile each.
    /// Events for gone clients are dropped.
    pub fn poll_vantage(&mut self, now: Instant) {
        for client in self.vantage.drain_due(now) {
            self.stats.vantage_events += 1;
            if !self.registry.is_connected(client) {
                debug!(%client, "vantage event for gone client dropped");
                continue;
            }
            self.reconcile_client(client);
        }
    }

    /// One full pass: reconcile every connected client, then run drift
    /// detection and dispatch over all controllers.
    pub fn tick(&mut self) {
        let started = Instant::now();

        for client in self.presence.clients() {
            if self.registry.is_connected(client) {
                self.reconcile_client(client);
            }
        }
        self.registry.tick(&mut self.gateway);

        self.stats.ticks += 1;
        self.stats.last_tick_duration = started.elapsed();
    }

    /// Drive the loop until `shutdown` fires. Vantage events are polled at
    /// debounce granularity, the full pass at the tick cadence.
    pub async fn run(&mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            tick = ?self.config.tick_interval,
            debounce = ?self.config.vantage_debounce,
            "sync server running"
        );
        let mut poll = tokio::time::interval(self.config.vantage_debounce);
        let mut cadence = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(ticks = self.stats.ticks, "sync server stopped");
                    return;
                }
                _ = poll.tick() => self.poll_vantage(Instant::now()),
                _ = cadence.tick() => self.tick(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vantage_queue_debounce_and_order() {
        let events = VantageEvents::new(Duration::from_millis(50));
        let now = Instant::now();
        let a = ClientId::new(1);
        let b = ClientId::new(2);

        events.push_at(a, now);
        events.push_at(b, now + Duration::from_millis(20));
        assert_eq!(events.len(), 2);

        // Nothing due before the debounce expires.
        assert!(events.drain_due(now + Duration::from_millis(40)).is_empty());

        // First event due, second still pending.
        assert_eq!(
            events.drain_due(now + Duration::from_millis(60)),
            vec![a]
        );
        assert_eq!(
            events.drain_due(now + Duration::from_millis(80)),
            vec![b]
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_vantage_queue_does_not_collapse_duplicates() {
        let events = VantageEvents::new(Duration::from_millis(50));
        let now = Instant::now();
        let a = ClientId::new(1);

        events.push_at(a, now);
        events.push_at(a, now);
        assert_eq!(
            events.drain_due(now + Duration::from_millis(60)),
            vec![a, a]
        );
    }

    #[test]
    fn test_shared_handle_feeds_the_same_queue() {
        let events = VantageEvents::new(Duration::from_millis(50));
        let handle = events.clone();
        let now = Instant::now();

        handle.push_at(ClientId::new(1), now);
        assert_eq!(events.len(), 1);
    }
}
