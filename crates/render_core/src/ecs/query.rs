//! Declarative entity queries matched against cached prototypes by bitmap
//! comparison, no per-entity branching required.

use crate::ecs::component::ComponentTypeMap;

/// Whether a query's matched component is read or written by the caller.
///
/// Not enforced by the store itself (the store has no borrow checker over
/// chunk slices it hands out) — it exists so callers can declare intent and
/// a scheduler (the [`crate::sync`] world, or an external job system) can
/// use it to decide which queries may run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// The query only reads this component type.
    Read,
    /// The query writes this component type.
    Write,
}

/// One component type a query touches, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryAccess {
    /// The map bit this access applies to (a singleton
    /// [`ComponentTypeMap`] with exactly one type set).
    pub component: ComponentTypeMap,
    /// Read or write.
    pub mode: AccessMode,
}

/// A reusable predicate selecting which cached prototypes a system should
/// iterate, built from three bitmap tests:
///
/// - `all_of`: the prototype must carry every one of these component types.
/// - `any_of`: the prototype must carry at least one, if the set is
///   nonempty (an empty `any_of` imposes no constraint).
/// - `none_of`: the prototype must carry none of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityQuery {
    all_of: ComponentTypeMap,
    any_of: ComponentTypeMap,
    none_of: ComponentTypeMap,
}

impl EntityQuery {
    /// An unconstrained query matching every prototype.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            all_of: ComponentTypeMap::empty(),
            any_of: ComponentTypeMap::empty(),
            none_of: ComponentTypeMap::empty(),
        }
    }

    /// Requires every component type set in `map`.
    #[must_use]
    pub const fn all_of(mut self, map: ComponentTypeMap) -> Self {
        self.all_of = map;
        self
    }

    /// Requires at least one component type set in `map` (no-op if `map` is
    /// empty).
    #[must_use]
    pub const fn any_of(mut self, map: ComponentTypeMap) -> Self {
        self.any_of = map;
        self
    }

    /// Excludes any prototype carrying a component type set in `map`.
    #[must_use]
    pub const fn none_of(mut self, map: ComponentTypeMap) -> Self {
        self.none_of = map;
        self
    }

    /// Tests whether a prototype's full component set satisfies this query.
    #[must_use]
    pub const fn matches(&self, prototype_map: ComponentTypeMap) -> bool {
        if !prototype_map.contains_all(self.all_of) {
            return false;
        }
        if !self.any_of.is_empty() && !prototype_map.intersects(self.any_of) {
            return false;
        }
        prototype_map.disjoint(self.none_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentTypeId;

    #[test]
    fn all_of_excludes_partial_matches() {
        let position = ComponentTypeMap::empty().with(ComponentTypeId::new(0));
        let velocity = ComponentTypeMap::empty().with(ComponentTypeId::new(1));
        let both = position.with(ComponentTypeId::new(1));

        let query = EntityQuery::new().all_of(position.with(ComponentTypeId::new(1)));
        assert!(!query.matches(position));
        assert!(!query.matches(velocity));
        assert!(query.matches(both));
    }

    #[test]
    fn none_of_rejects_any_overlap() {
        let position = ComponentTypeMap::empty().with(ComponentTypeId::new(0));
        let tag = ComponentTypeMap::empty().with(ComponentTypeId::new(7));
        let query = EntityQuery::new()
            .all_of(position)
            .none_of(tag);
        assert!(query.matches(position));
        assert!(!query.matches(position.with(ComponentTypeId::new(7))));
    }

    #[test]
    fn empty_any_of_imposes_no_constraint() {
        let position = ComponentTypeMap::empty().with(ComponentTypeId::new(0));
        let query = EntityQuery::new().all_of(position);
        assert!(query.matches(position));
    }
}
