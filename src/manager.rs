//! The [`EcsManager`] is the facade over all storage: the slot allocator, the
//! presence matrix, the range tracker, and one column per declared component
//! type. All structural mutation goes through it, and the pieces are updated
//! together so no operation leaves them disagreeing.
//!
//! Out-of-frontier semantics, held consistently across the API: the presence
//! queries (`has_entity`, `has_component`, `has_components`) answer `Ok(false)`
//! for a handle whose slot lies at or beyond the frontier, since such a handle
//! cannot name a live entity; the data and mutation operations
//! (`get_component`, `add_component`, `remove_component`, `remove_entity`)
//! treat the same handle as a caller bug and fail with
//! [`EcsError::OutOfRange`]. Only the null sentinel is an error everywhere.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::trace;

use crate::component::{AnyColumn, Column, Component, ComponentSet};
use crate::entity::{EntityId, SlotAllocator};
use crate::presence::PresenceMatrix;
use crate::range::RangeTracker;
use crate::EcsError;

// ---------------------------------------------------------------------------
// EcsManager
// ---------------------------------------------------------------------------

/// Fixed-type-set, slot-indexed component store.
///
/// `L` is a tuple of the component types this store tracks, fixed at compile
/// time: `EcsManager::<(Position, Velocity)>::new()`. Structural mutation
/// (entity and component add/remove) is single-writer; see the crate docs for
/// the partitioned-parallel read/write contract.
pub struct EcsManager<L: ComponentSet> {
    pub(crate) slots: SlotAllocator,
    pub(crate) presence: PresenceMatrix,
    pub(crate) ranges: RangeTracker,
    pub(crate) columns: Vec<Box<dyn AnyColumn>>,
    /// TypeId of each declared component -> column index.
    by_type: HashMap<TypeId, usize>,
    /// `type_name` per column, for error reporting.
    names: Vec<&'static str>,
    _set: PhantomData<L>,
}

impl<L: ComponentSet> EcsManager<L> {
    /// Create a store that grows its slot storage without bound.
    pub fn new() -> Self {
        Self::with_allocator(SlotAllocator::new())
    }

    /// Create a store with a hard slot limit. Creating an entity when all
    /// `capacity` slots are live fails with [`EcsError::CapacityExceeded`].
    pub fn bounded(capacity: usize) -> Self {
        Self::with_allocator(SlotAllocator::bounded(capacity))
    }

    fn with_allocator(slots: SlotAllocator) -> Self {
        let type_ids = L::type_ids();
        let mut by_type = HashMap::with_capacity(type_ids.len());
        for (index, type_id) in type_ids.into_iter().enumerate() {
            if by_type.insert(type_id, index).is_some() {
                panic!(
                    "component type '{}' is declared more than once in the store's type set",
                    L::type_names()[index]
                );
            }
        }
        Self {
            slots,
            presence: PresenceMatrix::new(L::LEN),
            ranges: RangeTracker::new(L::LEN),
            columns: L::build_columns(),
            by_type,
            names: L::type_names(),
            _set: PhantomData,
        }
    }

    /// Whether `T` is one of this store's declared component types. Usable
    /// without an instance: `EcsManager::<(Pos, Vel)>::contains::<Pos>()`.
    pub fn contains<T: 'static>() -> bool {
        L::contains::<T>()
    }

    // -- entity operations --------------------------------------------------

    /// Allocate a slot, activate it with all presence flags cleared, and
    /// return its handle.
    ///
    /// Reuses the lowest free slot before growing the frontier; the scan is
    /// O(frontier) worst case, which slot-reuse locality amortizes in churny
    /// workloads.
    pub fn create_entity(&mut self) -> Result<EntityId, EcsError> {
        let slot = self.slots.allocate()?;
        if slot == self.presence.rows() {
            // Frontier outgrew the backing storage: every column grows in
            // lockstep so all stay index-aligned.
            self.presence.push_row();
            for column in &mut self.columns {
                column.push_default();
            }
        }
        self.presence.clear_row(slot);
        trace!(slot, "entity created");
        Ok(EntityId::new(slot))
    }

    /// Create an entity and add each of the supplied component values in
    /// argument order. Sugar over [`create_entity`](Self::create_entity) plus
    /// one [`add_component`](Self::add_component) per value; if a later add
    /// fails (e.g. a duplicate type in the tuple) the entity keeps the
    /// components added before the failure.
    pub fn create_entity_with<V: ComponentValues>(
        &mut self,
        values: V,
    ) -> Result<EntityId, EcsError> {
        let id = self.create_entity()?;
        values.add_all(self, id)?;
        Ok(id)
    }

    /// Deactivate an entity's slot. Presence flags are cleared immediately,
    /// so a dangling handle cannot observe stale component presence; column
    /// values are left in place until the slot is reused. Releasing the
    /// highest live slot shrinks the frontier.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), EcsError> {
        let slot = self.locate(id)?;
        if !self.slots.is_active(slot) {
            return Err(EcsError::EntityNotActive { entity: id });
        }
        self.presence.clear_row(slot);
        self.slots.release(slot);
        trace!(slot, "entity removed");
        Ok(())
    }

    /// Whether `id` names a currently live entity. `Ok(false)` for slots at
    /// or beyond the frontier.
    pub fn has_entity(&self, id: EntityId) -> Result<bool, EcsError> {
        if !id.is_valid() {
            return Err(EcsError::NullHandle);
        }
        Ok(self.slots.is_active(id.slot()))
    }

    /// Count of currently live entities (not the frontier size).
    pub fn size(&self) -> usize {
        self.slots.live()
    }

    /// One past the highest slot in use. Diagnostic; this is the bound of
    /// [`records`](Self::records) and of full-range views.
    pub fn frontier(&self) -> usize {
        self.slots.end_slot()
    }

    // -- component operations -----------------------------------------------

    /// Attach a component value to a live entity.
    ///
    /// Fails with [`EcsError::AlreadyPresent`] if the entity already has the
    /// component; there is no implicit overwrite. On success the presence
    /// flag is set, the column entry is overwritten, and the component's
    /// occupancy interval expands to include the slot.
    pub fn add_component<T: Component>(
        &mut self,
        id: EntityId,
        value: T,
    ) -> Result<(), EcsError> {
        let column = self.column_index::<T>()?;
        let slot = self.require_active(id)?;
        if self.presence.get(slot, column) {
            return Err(EcsError::AlreadyPresent {
                component: self.names[column],
                entity: id,
            });
        }
        self.column_mut::<T>(column).data[slot] = value;
        self.presence.set(slot, column, true);
        self.ranges.record(column, slot);
        Ok(())
    }

    /// Detach a component from a live entity. Clears the presence flag only;
    /// the stored value and the occupancy interval are untouched.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Result<(), EcsError> {
        let column = self.column_index::<T>()?;
        let slot = self.require_active(id)?;
        if !self.presence.get(slot, column) {
            return Err(EcsError::NotPresent {
                component: self.names[column],
                entity: id,
            });
        }
        self.presence.set(slot, column, false);
        Ok(())
    }

    /// Shared reference to an entity's component value.
    pub fn get_component<T: Component>(&self, id: EntityId) -> Result<&T, EcsError> {
        let column = self.require_present::<T>(id)?;
        Ok(&self.column::<T>(column).data[id.slot()])
    }

    /// Mutable reference to an entity's component value.
    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Result<&mut T, EcsError> {
        let column = self.require_present::<T>(id)?;
        let slot = id.slot();
        Ok(&mut self.column_mut::<T>(column).data[slot])
    }

    /// Whether a live entity currently has the component. `Ok(false)` when
    /// the entity is inactive or the slot lies beyond the frontier.
    pub fn has_component<T: Component>(&self, id: EntityId) -> Result<bool, EcsError> {
        let column = self.column_index::<T>()?;
        if !id.is_valid() {
            return Err(EcsError::NullHandle);
        }
        let slot = id.slot();
        Ok(self.slots.is_active(slot) && self.presence.get(slot, column))
    }

    /// Logical AND of [`has_component`](Self::has_component) across a tuple
    /// of types: `ecs.has_components::<(Pos, Vel)>(id)`.
    pub fn has_components<Q: ComponentSet>(&self, id: EntityId) -> Result<bool, EcsError> {
        if !id.is_valid() {
            return Err(EcsError::NullHandle);
        }
        let slot = id.slot();
        if !self.slots.is_active(slot) {
            return Ok(false);
        }
        for (type_id, name) in Q::type_ids().into_iter().zip(Q::type_names()) {
            let column = *self
                .by_type
                .get(&type_id)
                .ok_or(EcsError::UnknownComponent { component: name })?;
            if !self.presence.get(slot, column) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // -- diagnostics ---------------------------------------------------------

    /// Iterate every slot record inside the frontier, live or not. Intended
    /// for whole-table scans and debugging, as opposed to typed views.
    pub fn records(&self) -> impl Iterator<Item = SlotRecord<'_>> {
        (0..self.slots.end_slot()).map(move |slot| SlotRecord {
            id: EntityId::new(slot),
            active: self.slots.is_active(slot),
            presence: self.presence.row(slot),
        })
    }

    /// `type_name` of each declared component, in column order. Pairs with
    /// the presence flags in [`SlotRecord`].
    pub fn component_names(&self) -> &[&'static str] {
        &self.names
    }

    // -- internal helpers ----------------------------------------------------

    /// Resolve a handle to a slot index inside the frontier.
    pub(crate) fn locate(&self, id: EntityId) -> Result<usize, EcsError> {
        if !id.is_valid() {
            return Err(EcsError::NullHandle);
        }
        let slot = id.slot();
        if slot >= self.slots.end_slot() {
            return Err(EcsError::OutOfRange {
                slot,
                frontier: self.slots.end_slot(),
            });
        }
        Ok(slot)
    }

    /// Resolve a handle to the slot of a live entity.
    pub(crate) fn require_active(&self, id: EntityId) -> Result<usize, EcsError> {
        let slot = self.locate(id)?;
        if !self.slots.is_active(slot) {
            return Err(EcsError::EntityNotActive { entity: id });
        }
        Ok(slot)
    }

    /// Resolve `T`'s column and check the component is present on the entity.
    fn require_present<T: Component>(&self, id: EntityId) -> Result<usize, EcsError> {
        let column = self.column_index::<T>()?;
        let slot = self.require_active(id)?;
        if !self.presence.get(slot, column) {
            return Err(EcsError::NotPresent {
                component: self.names[column],
                entity: id,
            });
        }
        Ok(column)
    }

    /// Column index for `T`, or [`EcsError::UnknownComponent`] when `T` is
    /// not in the declared set.
    pub(crate) fn column_index<T: 'static>(&self) -> Result<usize, EcsError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::UnknownComponent {
                component: std::any::type_name::<T>(),
            })
    }

    pub(crate) fn column<T: Component>(&self, column: usize) -> &Column<T> {
        self.columns[column]
            .as_any()
            .downcast_ref()
            .expect("column index resolved to a different component type")
    }

    pub(crate) fn column_mut<T: Component>(&mut self, column: usize) -> &mut Column<T> {
        self.columns[column]
            .as_any_mut()
            .downcast_mut()
            .expect("column index resolved to a different component type")
    }
}

impl<L: ComponentSet> Default for EcsManager<L> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SlotRecord
// ---------------------------------------------------------------------------

/// Snapshot of one slot for whole-table iteration: the fixed handle, the
/// activity flag, and the per-component presence flags in column order.
#[derive(Debug, Clone, Copy)]
pub struct SlotRecord<'a> {
    pub id: EntityId,
    pub active: bool,
    pub presence: &'a [bool],
}

// ---------------------------------------------------------------------------
// ComponentValues -- value tuples for create_entity_with
// ---------------------------------------------------------------------------

/// A tuple of component values added to a fresh entity in argument order.
pub trait ComponentValues {
    fn add_all<L: ComponentSet>(
        self,
        ecs: &mut EcsManager<L>,
        id: EntityId,
    ) -> Result<(), EcsError>;
}

macro_rules! impl_component_values {
    ($(($ty:ident, $idx:tt)),+) => {
        impl<$($ty: Component),+> ComponentValues for ($($ty,)+) {
            fn add_all<L: ComponentSet>(
                self,
                ecs: &mut EcsManager<L>,
                id: EntityId,
            ) -> Result<(), EcsError> {
                $(ecs.add_component(id, self.$idx)?;)+
                Ok(())
            }
        }
    };
}

impl_component_values!((A, 0));
impl_component_values!((A, 0), (B, 1));
impl_component_values!((A, 0), (B, 1), (C, 2));
impl_component_values!((A, 0), (B, 1), (C, 2), (D, 3));
impl_component_values!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4));
impl_component_values!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5));
impl_component_values!((A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5), (G, 6));
impl_component_values!(
    (A, 0),
    (B, 1),
    (C, 2),
    (D, 3),
    (E, 4),
    (F, 5),
    (G, 6),
    (H, 7)
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Vel {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Tag(u32);

    type Ecs = EcsManager<(Pos, Vel, Tag)>;

    #[test]
    fn create_returns_increasing_ids_until_removal() {
        let mut ecs = Ecs::new();
        let a = ecs.create_entity().unwrap();
        let b = ecs.create_entity().unwrap();
        let c = ecs.create_entity().unwrap();
        assert_eq!((a.slot(), b.slot(), c.slot()), (0, 1, 2));

        // Removing a non-tail slot leaves a hole; the lowest free id wins.
        ecs.remove_entity(b).unwrap();
        let d = ecs.create_entity().unwrap();
        assert_eq!(d.slot(), 1);
        assert_eq!(ecs.size(), 3);
    }

    #[test]
    fn tail_removal_compacts_frontier() {
        let mut ecs = Ecs::new();
        let _a = ecs.create_entity().unwrap();
        let b = ecs.create_entity().unwrap();
        assert_eq!(ecs.frontier(), 2);
        ecs.remove_entity(b).unwrap();
        assert_eq!(ecs.frontier(), 1);
        let c = ecs.create_entity().unwrap();
        assert_eq!(c.slot(), 1);
        assert_eq!(ecs.frontier(), 2);
    }

    #[test]
    fn add_get_remove_symmetry() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();

        ecs.add_component(e, Pos { x: 1.0, y: 2.0 }).unwrap();
        assert!(ecs.has_component::<Pos>(e).unwrap());
        assert_eq!(ecs.get_component::<Pos>(e).unwrap(), &Pos { x: 1.0, y: 2.0 });

        ecs.remove_component::<Pos>(e).unwrap();
        assert!(!ecs.has_component::<Pos>(e).unwrap());
        assert!(matches!(
            ecs.remove_component::<Pos>(e),
            Err(EcsError::NotPresent { .. })
        ));

        // Re-add after removal overwrites the stale value.
        ecs.add_component(e, Pos { x: 9.0, y: 9.0 }).unwrap();
        assert_eq!(ecs.get_component::<Pos>(e).unwrap(), &Pos { x: 9.0, y: 9.0 });
    }

    #[test]
    fn double_add_is_an_error() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();
        ecs.add_component(e, Tag(1)).unwrap();
        assert!(matches!(
            ecs.add_component(e, Tag(2)),
            Err(EcsError::AlreadyPresent { .. })
        ));
        // The original value survives the rejected add.
        assert_eq!(ecs.get_component::<Tag>(e).unwrap(), &Tag(1));
    }

    #[test]
    fn presence_is_per_entity() {
        let mut ecs = Ecs::new();
        let e1 = ecs.create_entity().unwrap();
        let e2 = ecs.create_entity().unwrap();
        ecs.add_component(e1, Tag(7)).unwrap();
        assert!(ecs.has_component::<Tag>(e1).unwrap());
        assert!(!ecs.has_component::<Tag>(e2).unwrap());

        ecs.remove_component::<Tag>(e1).unwrap();
        ecs.add_component(e2, Tag(8)).unwrap();
        assert!(!ecs.has_component::<Tag>(e1).unwrap());
        assert!(ecs.has_component::<Tag>(e2).unwrap());
    }

    #[test]
    fn slot_reuse_starts_with_cleared_presence() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();
        ecs.add_component(e, Pos { x: 5.0, y: 5.0 }).unwrap();
        ecs.remove_entity(e).unwrap();

        let reused = ecs.create_entity().unwrap();
        assert_eq!(reused.slot(), e.slot());
        assert!(!ecs.has_component::<Pos>(reused).unwrap());
        assert!(matches!(
            ecs.get_component::<Pos>(reused),
            Err(EcsError::NotPresent { .. })
        ));
    }

    #[test]
    fn removed_entity_rejects_all_ops() {
        let mut ecs = Ecs::new();
        let _keep = ecs.create_entity().unwrap();
        let e = ecs.create_entity().unwrap();
        // A live entity above keeps the frontier from compacting past `e`.
        let _tail = ecs.create_entity().unwrap();
        ecs.add_component(e, Vel { dx: 1.0, dy: 1.0 }).unwrap();
        ecs.remove_entity(e).unwrap();

        assert!(!ecs.has_entity(e).unwrap());
        assert!(matches!(
            ecs.remove_entity(e),
            Err(EcsError::EntityNotActive { .. })
        ));
        assert!(matches!(
            ecs.add_component(e, Tag(0)),
            Err(EcsError::EntityNotActive { .. })
        ));
        assert!(matches!(
            ecs.get_component::<Vel>(e),
            Err(EcsError::EntityNotActive { .. })
        ));
        // Dangling handle cannot see stale presence either.
        assert!(!ecs.has_component::<Vel>(e).unwrap());
    }

    #[test]
    fn out_of_frontier_handles() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();

        let beyond = EntityId::new(100);
        // Presence queries answer false; data ops report the misuse.
        assert!(!ecs.has_entity(beyond).unwrap());
        assert!(!ecs.has_component::<Pos>(beyond).unwrap());
        assert!(matches!(
            ecs.get_component::<Pos>(beyond),
            Err(EcsError::OutOfRange { .. })
        ));
        assert!(matches!(
            ecs.remove_entity(beyond),
            Err(EcsError::OutOfRange { .. })
        ));

        assert!(matches!(ecs.has_entity(EntityId::NULL), Err(EcsError::NullHandle)));
        assert!(matches!(
            ecs.get_component::<Pos>(EntityId::NULL),
            Err(EcsError::NullHandle)
        ));
        let _ = e;
    }

    #[test]
    fn undeclared_component_type_is_rejected() {
        let mut ecs = EcsManager::<(Pos,)>::new();
        let e = ecs.create_entity().unwrap();
        assert!(matches!(
            ecs.add_component(e, Vel::default()),
            Err(EcsError::UnknownComponent { .. })
        ));
        assert!(matches!(
            ecs.has_component::<Vel>(e),
            Err(EcsError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn has_components_tuple() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();
        ecs.add_component(e, Pos::default()).unwrap();
        ecs.add_component(e, Vel::default()).unwrap();

        assert!(ecs.has_components::<(Pos, Vel)>(e).unwrap());
        assert!(!ecs.has_components::<(Pos, Vel, Tag)>(e).unwrap());
        assert!(ecs.has_components::<(Vel,)>(e).unwrap());
    }

    #[test]
    fn create_entity_with_adds_in_order() {
        let mut ecs = Ecs::new();
        let e = ecs
            .create_entity_with((Pos { x: 1.0, y: 2.0 }, Tag(3)))
            .unwrap();
        assert_eq!(ecs.get_component::<Pos>(e).unwrap(), &Pos { x: 1.0, y: 2.0 });
        assert_eq!(ecs.get_component::<Tag>(e).unwrap(), &Tag(3));
        assert!(!ecs.has_component::<Vel>(e).unwrap());
    }

    #[test]
    fn bounded_store_enforces_capacity() {
        let mut ecs = EcsManager::<(Tag,)>::bounded(3);
        for _ in 0..3 {
            ecs.create_entity().unwrap();
        }
        assert!(matches!(
            ecs.create_entity(),
            Err(EcsError::CapacityExceeded { capacity: 3 })
        ));
        ecs.remove_entity(EntityId::new(1)).unwrap();
        assert_eq!(ecs.create_entity().unwrap().slot(), 1);
    }

    #[test]
    fn static_membership_query() {
        assert!(Ecs::contains::<Pos>());
        assert!(Ecs::contains::<Tag>());
        assert!(!Ecs::contains::<u64>());
    }

    #[test]
    fn records_expose_activity_and_presence() {
        let mut ecs = Ecs::new();
        let a = ecs.create_entity().unwrap();
        let b = ecs.create_entity().unwrap();
        let _c = ecs.create_entity().unwrap();
        ecs.add_component(a, Pos::default()).unwrap();
        ecs.remove_entity(b).unwrap();

        let records: Vec<_> = ecs.records().collect();
        assert_eq!(records.len(), 3);
        assert!(records[0].active);
        assert_eq!(records[0].presence, &[true, false, false]);
        assert!(!records[1].active);
        assert!(records[2].active);
        assert_eq!(records[2].presence, &[false, false, false]);
        assert_eq!(records[2].id, EntityId::new(2));
    }

    #[test]
    fn get_component_mut_writes_through() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity().unwrap();
        ecs.add_component(e, Pos { x: 0.0, y: 0.0 }).unwrap();
        ecs.get_component_mut::<Pos>(e).unwrap().x = 42.0;
        assert_eq!(ecs.get_component::<Pos>(e).unwrap().x, 42.0);
    }

    #[test]
    #[should_panic(expected = "declared more than once")]
    fn duplicate_declared_type_panics() {
        let _ecs = EcsManager::<(Pos, Pos)>::new();
    }

    #[test]
    fn heavy_churn_reuses_one_slot() {
        let mut ecs = EcsManager::<(Tag,)>::bounded(8);
        // Would exhaust the bounded store if slots were not reused.
        for i in 0..100_000 {
            let e = ecs.create_entity().unwrap();
            assert_eq!(e.slot(), 0);
            ecs.add_component(e, Tag(i)).unwrap();
            ecs.remove_entity(e).unwrap();
        }
        assert_eq!(ecs.size(), 0);
        assert_eq!(ecs.frontier(), 0);
    }
}
