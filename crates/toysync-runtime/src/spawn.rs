//! Spawn plumbing - toy construction and lifecycle
//!
//! A spawn builds the toy with its authoritative initial values, wraps it
//! in a synchronizer with the per-spawn field toggles applied, and attaches
//! it to the anchor region's controller (the global controller when
//! unanchored). Despawn detaches the synchronizer and hands the toy back
//! before the host destroys the object.

use toysync_core::{
    Color, PrimitiveShape, RegionId, SyncResult, TargetKind, Toy, ToyDetail, ToyId, ToyKind,
    Transform,
};
use toysync_interest::RegionMap;
use toysync_state::{Gateway, Synchronizer};
use toysync_wire::FieldMask;
use tracing::info;

use crate::{Presence, SyncServer};

/// Per-spawn sync toggles
#[derive(Clone, Copy, Debug)]
pub struct SpawnOptions {
    /// Region the toy is anchored to; `None` means globally visible
    pub anchor: Option<RegionId>,
    /// Replicate position/rotation/scale changes
    pub sync_transform: bool,
    /// Replicate color changes (primitives with a live color source)
    pub sync_color: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        SpawnOptions {
            anchor: None,
            sync_transform: true,
            sync_color: true,
        }
    }
}

impl SpawnOptions {
    pub fn anchored(region: RegionId) -> Self {
        SpawnOptions {
            anchor: Some(region),
            ..SpawnOptions::default()
        }
    }

    fn enabled_mask(&self, kind: ToyKind) -> FieldMask {
        let mut mask = FieldMask::NONE;
        if self.sync_transform {
            mask |= FieldMask::TRANSFORM;
        }
        match kind {
            ToyKind::Primitive => {
                if self.sync_color {
                    mask.insert(FieldMask::PRIMITIVE_COLOR);
                }
            }
            ToyKind::Light => {
                mask.insert(FieldMask::LIGHT_INTENSITY);
                mask.insert(FieldMask::LIGHT_RANGE);
                mask.insert(FieldMask::LIGHT_COLOR);
                mask.insert(FieldMask::LIGHT_SHADOWS);
            }
            ToyKind::Generic | ToyKind::Target => {}
        }
        mask
    }
}

impl<M: RegionMap, G: Gateway, P: Presence> SyncServer<M, G, P> {
    /// Spawn a mesh primitive. Anchored primitives are born hidden and
    /// become visible per subscriber through their region controller.
    pub fn spawn_primitive(
        &mut self,
        transform: Transform,
        shape: PrimitiveShape,
        color: Color,
        collision: bool,
        options: SpawnOptions,
    ) -> SyncResult<ToyId> {
        self.spawn(
            transform,
            ToyDetail::Primitive { shape, color, collision },
            options,
        )
    }

    /// Spawn a point light
    pub fn spawn_light(
        &mut self,
        transform: Transform,
        color: Color,
        intensity: f32,
        range: f32,
        shadows: bool,
        options: SpawnOptions,
    ) -> SyncResult<ToyId> {
        self.spawn(
            transform,
            ToyDetail::Light { color, intensity, range, shadows },
            options,
        )
    }

    /// Spawn a shooting target (transform sync only)
    pub fn spawn_target(
        &mut self,
        transform: Transform,
        kind: TargetKind,
        options: SpawnOptions,
    ) -> SyncResult<ToyId> {
        self.spawn(transform, ToyDetail::Target { kind }, options)
    }

    fn spawn(
        &mut self,
        transform: Transform,
        detail: ToyDetail,
        options: SpawnOptions,
    ) -> SyncResult<ToyId> {
        let id = ToyId::new(self.next_toy);
        let toy = Toy::new(id, transform, detail);
        let enabled = options.enabled_mask(toy.kind());
        let kind = toy.kind();

        let sync = Synchronizer::with_enabled(toy, enabled)?;
        self.registry
            .attach_toy(options.anchor, sync, &mut self.gateway)?;
        self.next_toy += 1;

        info!(toy = %id, kind = kind.name(), region = ?options.anchor, "toy spawned");
        Ok(id)
    }

    /// Detach and tear down a toy, returning it to the caller. `None` if
    /// no controller owns it.
    pub fn despawn(&mut self, toy: ToyId) -> Option<Toy> {
        let sync = self.registry.detach_toy(toy, &mut self.gateway)?;
        info!(%toy, "toy despawned");
        Some(sync.into_toy())
    }

    /// Mutable access to a spawned toy's live state. Changes replicate on
    /// the next drift-detection pass.
    pub fn toy_mut(&mut self, toy: ToyId) -> Option<&mut Toy> {
        self.registry.toy_mut(toy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryPresence, RuntimeConfig};
    use std::time::{Duration, Instant};
    use toysync_core::{ClientId, Vec3};
    use toysync_interest::{Aabb, StaticRegionMap};
    use toysync_state::{GatewayEvent, MemoryGateway};

    type TestServer = SyncServer<StaticRegionMap, MemoryGateway, MemoryPresence>;

    // Two adjacent regions along x; region 1 neighbors region 2 and vice
    // versa.
    fn server() -> TestServer {
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
        map.set_neighbors(RegionId::new(2), vec![RegionId::new(1)]);
        let regions: Vec<RegionId> = map.region_ids().collect();
        SyncServer::new(
            RuntimeConfig::default(),
            map,
            regions,
            MemoryGateway::new(),
            MemoryPresence::new(),
        )
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut server = server();
        let a = server
            .spawn_light(
                Transform::IDENTITY,
                Color::WHITE,
                1.0,
                10.0,
                false,
                SpawnOptions::default(),
            )
            .unwrap();
        let b = server
            .spawn_target(Transform::IDENTITY, TargetKind::Sport, SpawnOptions::default())
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_spawn_options_disable_transform_sync() {
        let mut server = server();
        let id = server
            .spawn_primitive(
                Transform::IDENTITY,
                PrimitiveShape::Cube,
                Color::WHITE,
                true,
                SpawnOptions {
                    sync_transform: false,
                    ..SpawnOptions::default()
                },
            )
            .unwrap();

        let client = ClientId::new(1);
        server.presence_mut().set(client, Vec3::new(5.0, 5.0, 5.0));
        server.client_connected(client);

        // Move the toy; with transform sync off nothing replicates, a
        // color change still does.
        server.toy_mut(id).unwrap().transform.position = Vec3::new(3.0, 0.0, 0.0);
        server.tick();
        assert!(server.gateway_mut().patches_for(client).is_empty());

        if let ToyDetail::Primitive { color, .. } = &mut server.toy_mut(id).unwrap().detail {
            *color = Color::BLACK;
        }
        server.tick();
        let gw = server.gateway_mut();
        let patches = gw.patches_for(client);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].mask.bits(), FieldMask::PRIMITIVE_COLOR);
    }

    #[test]
    fn test_despawn_returns_the_toy() {
        let mut server = server();
        let id = server
            .spawn_target(Transform::IDENTITY, TargetKind::Binary, SpawnOptions::default())
            .unwrap();

        let toy = server.despawn(id).unwrap();
        assert_eq!(toy.id, id);
        assert!(server.despawn(id).is_none());
    }

    // End-to-end: connect, spawn, move across regions, mutate, disconnect.
    #[test]
    fn test_round_lifecycle() {
        let mut server = server();
        let client = ClientId::new(1);

        // Client in region 1; a primitive anchored to region 2 is in its
        // extended neighborhood.
        server.presence_mut().set(client, Vec3::new(5.0, 5.0, 5.0));
        server.client_connected(client);
        let id = server
            .spawn_primitive(
                Transform::IDENTITY,
                PrimitiveShape::Sphere,
                Color::WHITE,
                false,
                SpawnOptions::anchored(RegionId::new(2)),
            )
            .unwrap();
        server.tick();
        {
            let gw = server.gateway_mut();
            let events = gw.events_for(client);
            assert_eq!(events.len(), 1);
            assert!(matches!(events[0], GatewayEvent::Spawn { .. }));
            gw.clear();
        }

        // Mutation replicates as a minimal patch on the next tick.
        server.toy_mut(id).unwrap().transform.position = Vec3::new(12.0, 0.0, 0.0);
        server.tick();
        {
            let gw = server.gateway_mut();
            let patches = gw.patches_for(client);
            assert_eq!(patches.len(), 1);
            assert_eq!(patches[0].mask.bits(), FieldMask::POSITION);
            gw.clear();
        }

        // A vantage event after moving far away: the region no longer
        // resolves, the primitive despawns client-side.
        server.presence_mut().set(client, Vec3::new(500.0, 0.0, 0.0));
        let now = Instant::now();
        server.vantage_events().push_at(client, now);
        server.poll_vantage(now + Duration::from_millis(60));
        {
            let gw = server.gateway_mut();
            let events = gw.events_for(client);
            assert_eq!(events.len(), 1);
            assert!(matches!(events[0], GatewayEvent::Despawn { .. }));
            gw.clear();
        }

        server.client_disconnected(client);
        server.tick();
        assert!(server.gateway_mut().events.is_empty());
        assert!(server.stats().ticks >= 3);
    }
}
