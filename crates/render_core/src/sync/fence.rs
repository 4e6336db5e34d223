//! GPU `Fence`s and the `Lockable<R>` guard that uses them to decide when a
//! pooled resource is safe to reuse.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Identifies a [`Fence`] issued by a [`FenceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceId(u64);

impl FenceId {
    /// Reconstructs an id from a raw value previously obtained from
    /// [`FenceId::raw`] — used by `render_gpu` when decoding a
    /// `FenceSync`/`FenceWait` command word back into an id. Not for
    /// minting new ids; those only come from [`FenceTable::create`].
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value, for packing into a command word.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A reference-counted handle representing in-flight GPU work.
///
/// Every clone of a `Fence` shares the same refcount; a resource holder
/// calls [`Fence::ref_`] when it starts depending on the fence and
/// [`Fence::deref`] when that dependency is resolved (typically once a
/// `FenceWait` command for this fence has executed). A fence whose count has
/// dropped back to 1 is held only by the [`FenceTable`] itself, meaning
/// nothing external is still waiting on it.
#[derive(Debug, Clone)]
pub struct Fence {
    id: FenceId,
    label: &'static str,
    refs: Arc<AtomicU32>,
}

impl Fence {
    /// This fence's id.
    #[must_use]
    pub const fn id(&self) -> FenceId {
        self.id
    }

    /// The label it was created with, for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Current reference count.
    #[must_use]
    pub fn refcount(&self) -> u32 {
        self.refs.load(Ordering::Acquire)
    }

    /// Increments the reference count, recording a new dependent.
    pub fn ref_(&self) {
        self.refs.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrements the reference count, releasing one dependent.
    ///
    /// # Panics
    ///
    /// Panics on an unbalanced `deref` (count already zero) — this is a
    /// programmer error in the caller's ref/deref pairing.
    pub fn deref(&self) {
        let prev = self.refs.fetch_sub(1, Ordering::AcqRel);
        assert!(prev > 0, "fence refcount underflow");
    }
}

/// Owns fence id allocation and tracks every live [`Fence`], matching the
/// renderer's `queryFence`/`doneFence` pair.
#[derive(Default)]
pub struct FenceTable {
    next_id: u64,
    fences: HashMap<FenceId, Fence>,
}

impl FenceTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new fence with an initial refcount of 1 (held by the
    /// table itself) and records it.
    pub fn create(&mut self, label: &'static str) -> Fence {
        let id = FenceId(self.next_id);
        self.next_id += 1;
        let fence = Fence {
            id,
            label,
            refs: Arc::new(AtomicU32::new(1)),
        };
        self.fences.insert(id, fence.clone());
        tracing::trace!(fence = id.0, label, "fence created");
        fence
    }

    /// Looks up a previously created fence by id.
    #[must_use]
    pub fn get(&self, id: FenceId) -> Option<&Fence> {
        self.fences.get(&id)
    }

    /// Releases the table's own reference to `id` and, if no other
    /// dependents remain, removes it from the table. Matches
    /// `Renderer::doneFence`.
    pub fn done(&mut self, id: FenceId) {
        if let Some(fence) = self.fences.get(&id) {
            fence.deref();
            if fence.refcount() == 0 {
                self.fences.remove(&id);
                tracing::trace!(fence = id.0, "fence retired");
            }
        }
    }
}

/// Wraps a pooled resource `R` with the set of fences currently guarding
/// outstanding GPU work against it.
///
/// A resource is safe to hand back out (re-`lock`) only once every fence
/// already attached has drained to a refcount of 1 — i.e. nothing besides
/// the table itself still depends on the work it represents.
pub struct Lockable<R> {
    value: R,
    fences: Vec<Fence>,
}

impl<R> Lockable<R> {
    /// Wraps `value` with no outstanding fences.
    #[must_use]
    pub const fn new(value: R) -> Self {
        Self {
            value,
            fences: Vec::new(),
        }
    }

    /// Attempts to lock this resource against `fence`. Succeeds (recording
    /// the fence and returning `true`) only if every fence currently
    /// attached has a refcount of 1 or less; otherwise leaves the resource
    /// untouched and returns `false` so the caller's query path can fall
    /// back to allocating a fresh resource instead.
    pub fn lock(&mut self, fence: Fence) -> bool {
        if self.fences.iter().any(|f| f.refcount() > 1) {
            return false;
        }
        fence.ref_();
        self.fences.push(fence);
        true
    }

    /// Clears every attached fence, returning the resource to the
    /// unlocked state. Matches `Renderer::releaseRenderTarget`, which is a
    /// thin wrapper over this.
    pub fn unlock(&mut self) {
        for fence in self.fences.drain(..) {
            fence.deref();
        }
    }

    /// Whether this resource currently has any fence attached with a
    /// refcount above 1 (i.e. is genuinely still in flight).
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.fences.iter().any(|f| f.refcount() > 1)
    }

    /// Borrows the wrapped resource.
    #[must_use]
    pub const fn get(&self) -> &R {
        &self.value
    }

    /// Mutably borrows the wrapped resource.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_succeeds_when_unlocked() {
        let mut table = FenceTable::new();
        let fence = table.create("frame");
        let mut lockable = Lockable::new(1920_u32);
        assert!(lockable.lock(fence));
        assert!(lockable.is_locked());
    }

    #[test]
    fn lock_fails_while_a_prior_fence_is_still_referenced() {
        let mut table = FenceTable::new();
        let fence_a = table.create("a");
        let mut lockable = Lockable::new(());
        assert!(lockable.lock(fence_a.clone()));
        // An external dependent (e.g. a recorded FenceWait not yet executed)
        // bumps refcount above 1.
        fence_a.ref_();

        let fence_b = table.create("b");
        assert!(!lockable.lock(fence_b));
    }

    #[test]
    fn unlock_releases_all_fences_and_allows_relock() {
        let mut table = FenceTable::new();
        let fence_a = table.create("a");
        let mut lockable = Lockable::new(());
        lockable.lock(fence_a.clone());
        lockable.unlock();
        assert_eq!(fence_a.refcount(), 1);

        let fence_b = table.create("b");
        assert!(lockable.lock(fence_b));
    }

    #[test]
    fn done_retires_a_fence_once_unreferenced() {
        let mut table = FenceTable::new();
        let fence = table.create("x");
        let id = fence.id();
        table.done(id);
        assert!(table.get(id).is_none());
    }
}
