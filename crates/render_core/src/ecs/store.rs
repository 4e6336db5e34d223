//! `EntityStore`: the top-level archetype ECS tying together component
//! registration, prototype caching, entity spawn/destroy, and the
//! bit-interleaved reverse (slot → id) mapping.

use std::any::TypeId;
use std::collections::HashMap;

use crate::ecs::component::{Component, ComponentTypeId, ComponentTypeMap};
use crate::ecs::entity::{EntityId, EntityIdGenerator, EntityMeta};
use crate::ecs::prototype::{CachedPrototype, ComponentLayout, EntityPrototype};
use crate::ecs::query::EntityQuery;
use crate::error::EntityStoreError;

/// Spreads the bits of a 32-bit value across the even bit positions of a
/// 64-bit word, leaving the odd positions zero.
///
/// Standard parallel bit-interleave ("Morton"/Z-order) construction: the
/// word is progressively split and shifted left by masks that double in
/// granularity at each step.
const fn interleave_dword_with_0(mut v: u64) -> u64 {
    v &= 0x0000_0000_FFFF_FFFF;
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & 0x5555_5555_5555_5555;
    v
}

/// Interleaves two 32-bit values into one 64-bit group id: `even`'s bits
/// occupy the low (even-indexed) positions, `odd`'s occupy the high
/// (odd-indexed) positions. Used to derive a `group_id` from
/// `(chunk_index, proto_cache_id)` that is unique per `(prototype, chunk)`
/// pair without a secondary allocator.
const fn interleave_dwords(even: u32, odd: u32) -> u64 {
    interleave_dword_with_0(even as u64) | (interleave_dword_with_0(odd as u64) << 1)
}

/// Descriptor for one allocated `(prototype, chunk)` pair, keyed by its
/// bit-interleaved `group_id`. Lets a caller holding only a dense
/// `(proto_cache_id, chunk_index, row)` triple — as produced while walking
/// query results — recover the owning [`EntityId`] without a per-row
/// reverse index.
#[derive(Debug, Clone, Copy)]
struct PrototypeGroupChunk {
    proto_cache_id: u32,
    chunk_index: u32,
}

/// The archetype entity store: owns component type registration, the
/// prototype cache, per-entity metadata, and id generation.
pub struct EntityStore {
    id_gen: EntityIdGenerator,
    type_ids: HashMap<TypeId, ComponentTypeId>,
    layouts: Vec<ComponentLayout>,
    prototypes: Vec<CachedPrototype>,
    prototype_by_map: HashMap<ComponentTypeMap, u32>,
    meta: HashMap<EntityId, EntityMeta>,
    groups: HashMap<u64, PrototypeGroupChunk>,
}

impl EntityStore {
    /// Builds an empty store seeded with `seed` for its [`EntityIdGenerator`].
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            id_gen: EntityIdGenerator::new(seed),
            type_ids: HashMap::new(),
            layouts: Vec::new(),
            prototypes: Vec::new(),
            prototype_by_map: HashMap::new(),
            meta: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Registers a component type, assigning it a stable [`ComponentTypeId`]
    /// on first call; subsequent calls for the same `T` return the same id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityStoreError::TooManyComponentTypes`] if this would
    /// exceed [`crate::ecs::MAX_COMPONENT_TYPES`] distinct types.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentTypeId, EntityStoreError> {
        let key = TypeId::of::<T>();
        if let Some(&id) = self.type_ids.get(&key) {
            return Ok(id);
        }
        if self.layouts.len() >= crate::ecs::MAX_COMPONENT_TYPES {
            return Err(EntityStoreError::TooManyComponentTypes {
                count: self.layouts.len() + 1,
                max: crate::ecs::MAX_COMPONENT_TYPES,
            });
        }
        let id = ComponentTypeId::new(self.layouts.len() as u8);
        self.layouts.push(ComponentLayout {
            type_id: id,
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
        });
        self.type_ids.insert(key, id);
        tracing::debug!(component = T::NAME, id = id.index(), "registered component type");
        Ok(id)
    }

    /// Finds or creates the [`CachedPrototype`] for the exact set of
    /// component types in `types`, returning its `proto_cache_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`EntityPrototype::new`]'s errors (too many types, or a
    /// row that doesn't fit a chunk).
    pub fn ensure_prototype(&mut self, types: &[ComponentTypeId]) -> Result<u32, EntityStoreError> {
        let layouts: Vec<ComponentLayout> = types
            .iter()
            .map(|id| self.layouts[id.index()])
            .collect();
        let prototype = EntityPrototype::new(layouts)?;
        let map = prototype.component_map();
        if let Some(&id) = self.prototype_by_map.get(&map) {
            return Ok(id);
        }
        let id = self.prototypes.len() as u32;
        self.prototypes.push(CachedPrototype::new(prototype));
        self.prototype_by_map.insert(map, id);
        tracing::debug!(proto_cache_id = id, "created new cached prototype");
        Ok(id)
    }

    /// Spawns a new entity of the given prototype, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if `proto_cache_id` was not produced by
    /// [`EntityStore::ensure_prototype`] on this store.
    pub fn spawn(&mut self, proto_cache_id: u32) -> EntityId {
        let id = self.id_gen.next();
        let cached = self
            .prototypes
            .get_mut(proto_cache_id as usize)
            .expect("unknown proto_cache_id");
        let chunks_before = cached.chunks().len();
        let (chunk_index, row) = cached.insert(id);
        if cached.chunks().len() > chunks_before {
            let group_id = interleave_dwords(chunk_index, proto_cache_id);
            self.groups.insert(
                group_id,
                PrototypeGroupChunk {
                    proto_cache_id,
                    chunk_index,
                },
            );
        }
        self.meta.insert(
            id,
            EntityMeta {
                id,
                proto_cache_id,
                chunk_index,
                row,
            },
        );
        tracing::trace!(entity = id.raw(), proto_cache_id, chunk_index, row, "spawned entity");
        id
    }

    /// Destroys `id`, compacting its prototype chunk by swapping the last
    /// row into its place. Returns `true` if the entity was alive.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(meta) = self.meta.remove(&id) else {
            return false;
        };
        let cached = &mut self.prototypes[meta.proto_cache_id as usize];
        let prototype = cached.prototype().clone();
        let chunk = &mut cached.chunks_mut()[meta.chunk_index as usize];
        if let Some(moved_id) = chunk.swap_remove(&prototype, meta.row) {
            if let Some(moved_meta) = self.meta.get_mut(&moved_id) {
                moved_meta.row = meta.row;
            }
        }
        tracing::trace!(entity = id.raw(), "destroyed entity");
        true
    }

    /// Whether `id` currently refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.meta.contains_key(&id)
    }

    /// Looks up an entity's storage location.
    #[must_use]
    pub fn meta(&self, id: EntityId) -> Option<&EntityMeta> {
        self.meta.get(&id)
    }

    /// Total number of live entities across all prototypes.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.meta.len()
    }

    /// Borrows a cached prototype by its `proto_cache_id`.
    #[must_use]
    pub fn prototype(&self, proto_cache_id: u32) -> &CachedPrototype {
        &self.prototypes[proto_cache_id as usize]
    }

    /// Mutably borrows a cached prototype, for writing component data into
    /// its chunks after [`EntityStore::spawn`] (construction/streaming
    /// systems are the intended callers; steady-state gameplay code should
    /// prefer dedicated per-component setters once those exist).
    #[must_use]
    pub fn prototype_mut(&mut self, proto_cache_id: u32) -> &mut CachedPrototype {
        &mut self.prototypes[proto_cache_id as usize]
    }

    /// Iterates `(proto_cache_id, &CachedPrototype)` pairs whose component
    /// set satisfies `query`.
    pub fn query_prototypes<'a>(
        &'a self,
        query: &'a EntityQuery,
    ) -> impl Iterator<Item = (u32, &'a CachedPrototype)> + 'a {
        self.prototypes
            .iter()
            .enumerate()
            .filter(move |(_, cached)| query.matches(cached.prototype().component_map()))
            .map(|(i, cached)| (i as u32, cached))
    }

    /// Recovers the [`EntityId`] occupying `(proto_cache_id, chunk_index,
    /// row)`, using the bit-interleaved `group_id` reverse mapping to
    /// validate the chunk exists before reading its row.
    #[must_use]
    pub fn entity_id_for_slot(
        &self,
        proto_cache_id: u32,
        chunk_index: u32,
        row: usize,
    ) -> Option<EntityId> {
        let group_id = interleave_dwords(chunk_index, proto_cache_id);
        let group = self.groups.get(&group_id)?;
        debug_assert_eq!(group.proto_cache_id, proto_cache_id);
        debug_assert_eq!(group.chunk_index, chunk_index);
        let cached = self.prototypes.get(proto_cache_id as usize)?;
        let chunk = cached.chunks().get(chunk_index as usize)?;
        if row >= chunk.len() {
            return None;
        }
        Some(chunk.entity_id_at(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {
        const NAME: &'static str = "Position";
    }

    #[derive(Clone, Copy)]
    #[repr(C)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }
    impl Component for Velocity {
        const NAME: &'static str = "Velocity";
    }

    #[test]
    fn interleave_is_injective_for_small_values() {
        let mut seen = std::collections::HashSet::new();
        for a in 0..64u32 {
            for b in 0..64u32 {
                assert!(seen.insert(interleave_dwords(a, b)));
            }
        }
    }

    #[test]
    fn spawn_destroy_roundtrip_and_reverse_lookup() {
        let mut store = EntityStore::new(1);
        let pos = store.register_component::<Position>().unwrap();
        let proto = store.ensure_prototype(&[pos]).unwrap();

        let a = store.spawn(proto);
        let b = store.spawn(proto);
        assert!(store.is_alive(a) && store.is_alive(b));
        assert_eq!(store.entity_count(), 2);

        let meta_b = *store.meta(b).unwrap();
        assert_eq!(
            store.entity_id_for_slot(proto, meta_b.chunk_index, meta_b.row),
            Some(b)
        );

        assert!(store.destroy(a));
        assert!(!store.is_alive(a));
        assert!(store.is_alive(b));
        // `b` was swapped into `a`'s old row.
        let meta_b_after = *store.meta(b).unwrap();
        assert_eq!(
            store.entity_id_for_slot(proto, meta_b_after.chunk_index, meta_b_after.row),
            Some(b)
        );
    }

    #[test]
    fn query_matches_only_prototypes_with_required_components() {
        let mut store = EntityStore::new(2);
        let pos = store.register_component::<Position>().unwrap();
        let vel = store.register_component::<Velocity>().unwrap();
        let pos_only = store.ensure_prototype(&[pos]).unwrap();
        let pos_vel = store.ensure_prototype(&[pos, vel]).unwrap();

        let vel_map = ComponentTypeMap::empty().with(vel);
        let query = EntityQuery::new().all_of(vel_map);
        let matched: Vec<u32> = store.query_prototypes(&query).map(|(id, _)| id).collect();
        assert_eq!(matched, vec![pos_vel]);
        assert_ne!(pos_only, pos_vel);
    }
}
