//! Per-object synchronizer
//!
//! Owns the toy, the canonical snapshot, and one cached snapshot per
//! subscriber. Each tick the owning controller asks it to detect drift
//! (live toy vs canonical, exact equality on enabled fields); on drift the
//! canonical snapshot is refreshed whole and every subscriber gets a
//! per-subscriber minimal patch.
//!
//! Primitives are visibility-gated: invisible by default to
//! non-subscribers, shown/hidden per subscriber. Lights carry the one
//! protocol exception: `disable_for` emits a single-field intensity=0
//! patch that bypasses mask computation.

use std::collections::{HashMap, HashSet};

use bytes::BytesMut;
use toysync_core::{ClientId, SyncResult, Toy, ToyId, ToyKind};
use toysync_wire::{codec, FieldLayout, FieldMask, Patch};

use crate::{encode_delta, Gateway, ToySnapshot};

/// Synchronization driver for one toy
#[derive(Debug)]
pub struct Synchronizer {
    toy: Toy,
    layout: FieldLayout,
    /// Per-instance field toggles (e.g. "don't sync rotation")
    enabled: FieldMask,
    /// Current belief about the toy's true state
    canonical: ToySnapshot,
    /// Authoritative initial values, the default for new subscribers
    reset: ToySnapshot,
    /// What each subscriber last received
    cached: HashMap<ClientId, ToySnapshot>,
    /// Per-subscriber visibility; `Some` iff the kind is visibility-gated
    visible: Option<HashSet<ClientId>>,
}

impl Synchronizer {
    /// Build a synchronizer owning `toy`, with every layout field enabled
    pub fn new(toy: Toy) -> SyncResult<Self> {
        Self::with_enabled(toy, FieldMask::new(u64::MAX))
    }

    /// Build with a per-instance enabled mask (restricted to the layout)
    pub fn with_enabled(toy: Toy, enabled: FieldMask) -> SyncResult<Self> {
        let layout = FieldLayout::for_kind(toy.kind());
        layout.verify()?;

        let snapshot = ToySnapshot::capture(&toy);
        let visible = match toy.kind() {
            ToyKind::Primitive => Some(HashSet::new()),
            _ => None,
        };

        Ok(Synchronizer {
            enabled: enabled.intersect(layout.full_mask()),
            canonical: snapshot.clone(),
            reset: snapshot,
            cached: HashMap::new(),
            visible,
            layout,
            toy,
        })
    }

    pub fn id(&self) -> ToyId {
        self.toy.id
    }

    pub fn kind(&self) -> ToyKind {
        self.toy.kind()
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn enabled(&self) -> FieldMask {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: FieldMask) {
        self.enabled = enabled.intersect(self.layout.full_mask());
    }

    pub fn toy(&self) -> &Toy {
        &self.toy
    }

    /// Mutable access to the live object. Drift is picked up on the next
    /// detection pass, not here.
    ///
    /// The toy's kind must not change: layouts and snapshots are fixed at
    /// construction, and a swapped detail kind fails the next drift pass
    /// with `SchemaMismatch`.
    pub fn toy_mut(&mut self) -> &mut Toy {
        &mut self.toy
    }

    pub fn canonical(&self) -> &ToySnapshot {
        &self.canonical
    }

    /// True for kinds that are invisible-by-default to non-subscribers
    pub fn is_visibility_gated(&self) -> bool {
        self.visible.is_some()
    }

    pub fn is_visible_for(&self, client: ClientId) -> bool {
        match &self.visible {
            Some(set) => set.contains(&client),
            None => true,
        }
    }

    /// Compare the live toy against the canonical snapshot on enabled
    /// fields; on any mismatch refresh the whole snapshot and report dirty.
    ///
    /// `SchemaMismatch` means the live detail was swapped to a different
    /// kind through `toy_mut`, which this layer cannot recover from.
    pub fn detect_drift(&mut self) -> SyncResult<bool> {
        let live = ToySnapshot::capture(&self.toy);
        let drift = live.diff_mask(&self.canonical)?.intersect(self.enabled);
        if drift.is_empty() {
            return Ok(false);
        }
        self.canonical = live;
        Ok(true)
    }

    /// Bring one subscriber up to date with a minimal patch.
    ///
    /// Returns `Ok(true)` if a patch was sent, `Ok(false)` if the
    /// subscriber was already in sync (zero bandwidth) or is not shown
    /// this object. The cached snapshot is updated only for the fields
    /// actually sent, and only after a successful send.
    pub fn update_subscriber(
        &mut self,
        client: ClientId,
        gateway: &mut dyn Gateway,
    ) -> SyncResult<bool> {
        if !self.is_visible_for(client) {
            return Ok(false);
        }

        let reset = &self.reset;
        let cached = self.cached.entry(client).or_insert_with(|| reset.clone());

        let (mask, payload) = encode_delta(&self.canonical, cached, self.enabled)?;
        if mask.is_empty() {
            return Ok(false);
        }

        let patch = Patch::new(self.toy.id, mask, payload);
        gateway.send(client, &patch)?;

        cached.copy_fields_from(&self.canonical, mask)?;
        Ok(true)
    }

    /// Make a visibility-gated toy visible to one subscriber. Idempotent.
    ///
    /// Emits the spawn notification and resets the cached snapshot to the
    /// authoritative reset state; the caller follows up with
    /// `update_subscriber` so the client gets complete state in one patch.
    pub fn show_for(&mut self, client: ClientId, gateway: &mut dyn Gateway) -> SyncResult<()> {
        let Some(visible) = &mut self.visible else {
            return Ok(());
        };
        if visible.contains(&client) {
            return Ok(());
        }

        gateway.notify_spawn(self.toy.id, client)?;
        visible.insert(client);
        self.cached.insert(client, self.reset.clone());
        Ok(())
    }

    /// Hide a visibility-gated toy from one subscriber. Idempotent.
    ///
    /// The cached snapshot is kept on purpose: a quick resubscribe still
    /// saves bandwidth for unchanged fields. `forget` prunes it when the
    /// subscriber disconnects for good.
    pub fn hide_for(&mut self, client: ClientId, gateway: &mut dyn Gateway) -> SyncResult<()> {
        let Some(visible) = &mut self.visible else {
            return Ok(());
        };
        if !visible.remove(&client) {
            return Ok(());
        }

        gateway.notify_despawn(self.toy.id, client)
    }

    /// Light-off shortcut: a single-field intensity=0 patch, bypassing the
    /// general mask computation, recorded directly in the cached snapshot.
    /// Always a one-field patch regardless of other pending drift.
    pub fn disable_for(&mut self, client: ClientId, gateway: &mut dyn Gateway) -> SyncResult<()> {
        if self.toy.kind() != ToyKind::Light {
            return Ok(());
        }

        let mut payload = BytesMut::with_capacity(4);
        codec::put_f32(&mut payload, 0.0);
        let patch = Patch::new(
            self.toy.id,
            FieldMask::new(FieldMask::LIGHT_INTENSITY),
            payload.freeze(),
        );
        gateway.send(client, &patch)?;

        let reset = &self.reset;
        let cached = self.cached.entry(client).or_insert_with(|| reset.clone());
        if let ToySnapshot::Light { intensity, .. } = cached {
            *intensity = 0.0;
        }
        Ok(())
    }

    /// Disconnect cleanup: drop the subscriber's cached snapshot and
    /// visibility entry without emitting anything.
    pub fn forget(&mut self, client: ClientId) {
        self.cached.remove(&client);
        if let Some(visible) = &mut self.visible {
            visible.remove(&client);
        }
    }

    /// Number of subscribers with a cached snapshot (diagnostics)
    pub fn cached_subscribers(&self) -> usize {
        self.cached.len()
    }

    /// Consume the synchronizer, handing the owned toy back
    pub fn into_toy(self) -> Toy {
        self.toy
    }

    #[cfg(test)]
    pub(crate) fn cached_for(&self, client: ClientId) -> Option<&ToySnapshot> {
        self.cached.get(&client)
    }
}
