//! Fixed-capacity recycling storage for hostile entities
//!
//! The backing store is allocated once. Liveness is read from each entity's
//! own flags; the pool keeps no second copy of it.

use super::enemy::{EnemyHandle, EnemyKind, HostileEntity};

/// Slots for one enemy kind
#[derive(Debug, Clone)]
pub struct EntityPool {
    kind: EnemyKind,
    slots: Vec<HostileEntity>,
}

impl EntityPool {
    pub fn new(kind: EnemyKind, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|slot| HostileEntity::dormant(kind, slot as u32))
            .collect();
        Self { kind, slots }
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First slot that is neither active nor dying, or `None` when exhausted
    pub fn get(&mut self) -> Option<&mut HostileEntity> {
        self.slots.iter_mut().find(|e| e.is_reusable())
    }

    /// Resolve a handle to the slot's current life
    pub fn entity(&self, handle: EnemyHandle) -> Option<&HostileEntity> {
        if handle.kind != self.kind {
            return None;
        }
        self.slots
            .get(handle.slot as usize)
            .filter(|e| e.matches(handle))
    }

    pub fn entity_mut(&mut self, handle: EnemyHandle) -> Option<&mut HostileEntity> {
        if handle.kind != self.kind {
            return None;
        }
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|e| e.matches(handle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostileEntity> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut HostileEntity> {
        self.slots.iter_mut()
    }

    /// Entities that are active (including ones still fading out)
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|e| e.is_active()).count()
    }
}

/// One pool per enemy kind
#[derive(Debug, Clone)]
pub struct EnemyPools {
    pools: Vec<EntityPool>,
}

impl EnemyPools {
    pub fn new(capacity: usize) -> Self {
        Self {
            pools: EnemyKind::ALL
                .iter()
                .map(|&kind| EntityPool::new(kind, capacity))
                .collect(),
        }
    }

    pub fn pool(&self, kind: EnemyKind) -> &EntityPool {
        &self.pools[kind.index()]
    }

    pub fn pool_mut(&mut self, kind: EnemyKind) -> &mut EntityPool {
        &mut self.pools[kind.index()]
    }

    pub fn entity(&self, handle: EnemyHandle) -> Option<&HostileEntity> {
        self.pool(handle.kind).entity(handle)
    }

    pub fn entity_mut(&mut self, handle: EnemyHandle) -> Option<&mut HostileEntity> {
        self.pool_mut(handle.kind).entity_mut(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostileEntity> {
        self.pools.iter().flat_map(|p| p.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut HostileEntity> {
        self.pools.iter_mut().flat_map(|p| p.iter_mut())
    }

    /// Handles of entities that can currently be hit
    pub fn alive_handles(&self) -> Vec<EnemyHandle> {
        self.iter()
            .filter(|e| e.is_alive())
            .map(|e| e.handle())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.pools.iter().map(|p| p.active_count()).sum()
    }
}
