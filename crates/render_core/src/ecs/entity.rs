//! Entity identity: a 32-bit id drawn from a maximum-length LFSR, plus the
//! per-entity metadata that locates its storage.

/// Fixed-point in the LFSR's 32-bit state space that can never be produced
/// by stepping a nonzero seed, and is reserved to mean "no entity".
pub const NULL_ENTITY: EntityId = EntityId(0);

/// A 32-bit entity identifier.
///
/// Ids are drawn from a maximum-length 32-bit linear feedback shift
/// register rather than handed out sequentially. Within a single run of
/// [`EntityIdGenerator`] every id from `next()` is distinct until the
/// generator has cycled through its full non-zero period (2^32 - 1 values);
/// `0` is never produced, matching [`NULL_ENTITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Returns the raw 32-bit value. Exposed for hashing/serialization at
    /// the storage layer; callers should otherwise treat this as opaque.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Reconstructs an id from a raw value previously obtained from
    /// [`EntityId::raw`]. Used by chunk storage, which persists ids as
    /// plain `u32`s; not for minting new ids (use
    /// [`EntityIdGenerator::next`] for that).
    #[must_use]
    pub(crate) const fn from_raw_for_storage(raw: u32) -> Self {
        Self(raw)
    }

    /// An id is null only if it is the fixed [`NULL_ENTITY`] sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Generates distinct, never-zero [`EntityId`]s for the lifetime of a single
/// [`crate::ecs::EntityStore`] by stepping a maximum-length 32-bit Galois
/// LFSR.
///
/// A Galois LFSR with a primitive feedback polynomial visits all 2^32 - 1
/// nonzero states before repeating, which is exactly the guarantee the data
/// model needs ("never reuses an id within one run; never yields 0") without
/// the bookkeeping a monotonic counter plus free-list would require. The
/// taps below (`x^32 + x^31 + x^29 + x + 1`) are a standard maximal-length
/// polynomial for a 32-bit Galois LFSR.
#[derive(Debug, Clone)]
pub struct EntityIdGenerator {
    state: u32,
}

impl EntityIdGenerator {
    const TAPS: u32 = 0xD000_0001;

    /// Seeds the generator. Any nonzero seed lies on the LFSR's single
    /// maximal cycle; `0` is special-cased to a fixed nonzero start so a
    /// caller can't accidentally construct a generator that only ever
    /// produces the null id.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x0000_0001 } else { seed },
        }
    }

    /// Steps the LFSR and returns the next id. Never returns
    /// [`NULL_ENTITY`].
    pub fn next(&mut self) -> EntityId {
        let lsb = self.state & 1;
        self.state >>= 1;
        if lsb == 1 {
            self.state ^= Self::TAPS;
        }
        debug_assert_ne!(self.state, 0, "maximal-length LFSR must never reach 0");
        EntityId(self.state)
    }
}

impl Default for EntityIdGenerator {
    fn default() -> Self {
        Self::new(0xACE1_u32 as u32 | 1)
    }
}

/// Where one entity's components live: which cached prototype it belongs to
/// and which chunk/row within that prototype's chunk array holds its row.
///
/// `chunk_index` and `row` together are the original design's `alloc_id` —
/// split into two fields here because [`crate::ecs::PrototypeChunk`] storage
/// is addressed by an explicit `(chunk, row)` pair rather than a single flat
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMeta {
    /// The entity this metadata describes.
    pub id: EntityId,
    /// Index of the [`crate::ecs::CachedPrototype`] this entity's archetype
    /// was assigned in the prototype cache.
    pub proto_cache_id: u32,
    /// Index of the chunk, within its prototype's chunk list, holding this
    /// entity's row.
    pub chunk_index: u32,
    /// Row within that chunk. Stable until the entity is destroyed;
    /// destruction may relocate a *different* entity into the freed row,
    /// per the store's swap-remove compaction policy.
    pub row: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn never_yields_zero() {
        let mut gen = EntityIdGenerator::new(1);
        for _ in 0..1_000_000 {
            assert!(!gen.next().is_null());
        }
    }

    #[test]
    fn ids_are_distinct_within_a_run() {
        let mut gen = EntityIdGenerator::new(12345);
        let mut seen = HashSet::new();
        for _ in 0..500_000 {
            let id = gen.next();
            assert!(seen.insert(id.raw()), "id {:?} repeated", id);
        }
    }

    #[test]
    fn zero_seed_is_remapped_to_a_nonzero_start() {
        let mut gen = EntityIdGenerator::new(0);
        assert!(!gen.next().is_null());
    }
}
