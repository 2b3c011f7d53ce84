//! Views: lazy, restartable iteration over the entities that hold a requested
//! combination of component types.
//!
//! A view walks the slot space, skipping slots that are inactive or missing
//! any requested component. Before scanning it intersects the requested
//! types' occupancy intervals (and, for partitioned views, the partition's
//! slot range), so iteration never touches the provably empty head and tail
//! of the store.
//!
//! ## Soundness
//!
//! Read-only views (`&T` items) come from [`EcsManager::view`], which takes
//! `&self`. Mutable views (`&mut T` items) come from [`EcsManager::view_mut`]
//! and [`EcsManager::view_parts_mut`], which take `&mut self` and therefore
//! hold the store's unique borrow for the lifetime of the view.
//!
//! While that exclusive borrow is held, each requested column's base data
//! pointer is captured once, up front. All per-slot fetches offset those
//! pointers; they never go back through the store, so no `&mut EcsManager`
//! is ever created during iteration. That matters for
//! [`EcsManager::view_parts_mut`]: worker threads write component values
//! through the captured pointers (each partition touching only its own,
//! disjoint slots) while every thread reads activity and presence flags
//! through a shared store reference, and neither access aliases the other.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::component::{Component, ComponentSet};
use crate::entity::EntityId;
use crate::manager::EcsManager;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ViewItem -- one element of a view tuple
// ---------------------------------------------------------------------------

/// A single element of a view fetch: `&T` (read) or `&mut T` (write).
pub trait ViewItem<L: ComponentSet> {
    /// The reference type yielded per matching slot.
    type Item<'w>;
    /// Base pointer into the column's slot-indexed storage.
    type Ptr: Copy;
    /// Whether this item borrows mutably.
    const MUTABLE: bool;
    /// The component type's `TypeId`.
    fn type_of() -> TypeId;
    /// Column index for the component, or an error if it is not declared.
    fn column_index(ecs: &EcsManager<L>) -> Result<usize, EcsError>;
    /// Capture the column's base data pointer.
    ///
    /// # Safety
    ///
    /// `column` must be this component's column in `*ecs`. For a mutable
    /// item the pointer must originate from an exclusive (`&mut`) borrow of
    /// the store; shared items only read through it.
    unsafe fn base_ptr(ecs: *mut EcsManager<L>, column: usize) -> Self::Ptr;
    /// Fetch one item at `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must be within the column's storage, and for the duration of
    /// the returned borrow no other reference to the same slot's value may
    /// exist. Callers uphold this with the exclusive-store or
    /// disjoint-partition contract.
    unsafe fn fetch<'w>(ptr: Self::Ptr, slot: usize) -> Self::Item<'w>;
}

// Impl for `&T` -- immutable borrow
impl<L: ComponentSet, T: Component> ViewItem<L> for &T {
    type Item<'w> = &'w T;
    type Ptr = *const T;
    const MUTABLE: bool = false;

    fn type_of() -> TypeId {
        TypeId::of::<T>()
    }

    fn column_index(ecs: &EcsManager<L>) -> Result<usize, EcsError> {
        ecs.column_index::<T>()
    }

    unsafe fn base_ptr(ecs: *mut EcsManager<L>, column: usize) -> *const T {
        // Shared access only; sound even when `ecs` was cast from `&self`.
        unsafe { (*ecs).column::<T>(column).data.as_ptr() }
    }

    unsafe fn fetch<'w>(ptr: *const T, slot: usize) -> &'w T {
        unsafe { &*ptr.add(slot) }
    }
}

// Impl for `&mut T` -- mutable borrow through a captured column pointer.
impl<L: ComponentSet, T: Component> ViewItem<L> for &mut T {
    type Item<'w> = &'w mut T;
    type Ptr = *mut T;
    const MUTABLE: bool = true;

    fn type_of() -> TypeId {
        TypeId::of::<T>()
    }

    fn column_index(ecs: &EcsManager<L>) -> Result<usize, EcsError> {
        ecs.column_index::<T>()
    }

    unsafe fn base_ptr(ecs: *mut EcsManager<L>, column: usize) -> *mut T {
        // Safety: per the trait contract `ecs` originates from `&mut self`
        // and no other store reference is live yet, so the temporary
        // exclusive reborrow here is unique. The returned pointer keeps
        // that write provenance; fetches use it without touching the store
        // again.
        unsafe { (*ecs).column_mut::<T>(column).data.as_mut_ptr() }
    }

    unsafe fn fetch<'w>(ptr: *mut T, slot: usize) -> &'w mut T {
        unsafe { &mut *ptr.add(slot) }
    }
}

// ---------------------------------------------------------------------------
// ViewQuery -- a tuple of ViewItems
// ---------------------------------------------------------------------------

/// A tuple of view items: `(&A, &B)`, `(&mut A, &B)`, etc. Components are
/// yielded in the order the types were requested.
pub trait ViewQuery<L: ComponentSet> {
    /// The per-slot output tuple.
    type Item<'w>;
    /// The captured column base pointers, one per item.
    type Ptrs: Copy;
    /// Whether any item borrows mutably.
    const HAS_MUTABLE: bool;
    /// Column indices for every requested type, in request order.
    fn column_indices(ecs: &EcsManager<L>) -> Result<Vec<usize>, EcsError>;
    /// Panics if the same component type is borrowed mutably more than once,
    /// or both mutably and immutably.
    fn validate_access();
    /// Capture every item's base pointer.
    ///
    /// # Safety
    ///
    /// As [`ViewItem::base_ptr`], with `columns` the result of
    /// [`column_indices`](Self::column_indices).
    unsafe fn base_ptrs(ecs: *mut EcsManager<L>, columns: &[usize]) -> Self::Ptrs;
    /// Fetch one row.
    ///
    /// # Safety
    ///
    /// As [`ViewItem::fetch`] for every item.
    unsafe fn fetch_row<'w>(ptrs: Self::Ptrs, slot: usize) -> Self::Item<'w>;
}

/// Panics if the same component type has overlapping mutable access.
fn validate_no_access_conflicts(items: &[(bool, TypeId)]) {
    let mut mutable_ids: Vec<TypeId> = Vec::new();
    let mut read_ids: Vec<TypeId> = Vec::new();
    for &(is_mutable, type_id) in items {
        if is_mutable {
            if mutable_ids.contains(&type_id) {
                panic!("view contains duplicate mutable access to the same component type");
            }
            if read_ids.contains(&type_id) {
                panic!(
                    "view contains overlapping read and mutable access to the same component type"
                );
            }
            mutable_ids.push(type_id);
        } else {
            if mutable_ids.contains(&type_id) {
                panic!(
                    "view contains overlapping read and mutable access to the same component type"
                );
            }
            read_ids.push(type_id);
        }
    }
}

// -- ViewQuery impls for tuples of 1..4 -------------------------------------

impl<L: ComponentSet, A: ViewItem<L>> ViewQuery<L> for (A,) {
    type Item<'w> = (A::Item<'w>,);
    type Ptrs = (A::Ptr,);
    const HAS_MUTABLE: bool = A::MUTABLE;

    fn column_indices(ecs: &EcsManager<L>) -> Result<Vec<usize>, EcsError> {
        Ok(vec![A::column_index(ecs)?])
    }

    fn validate_access() {
        // Single item -- no conflicts possible.
    }

    unsafe fn base_ptrs(ecs: *mut EcsManager<L>, columns: &[usize]) -> Self::Ptrs {
        unsafe { (A::base_ptr(ecs, columns[0]),) }
    }

    unsafe fn fetch_row<'w>(ptrs: Self::Ptrs, slot: usize) -> Self::Item<'w> {
        unsafe { (A::fetch(ptrs.0, slot),) }
    }
}

impl<L: ComponentSet, A: ViewItem<L>, B: ViewItem<L>> ViewQuery<L> for (A, B) {
    type Item<'w> = (A::Item<'w>, B::Item<'w>);
    type Ptrs = (A::Ptr, B::Ptr);
    const HAS_MUTABLE: bool = A::MUTABLE || B::MUTABLE;

    fn column_indices(ecs: &EcsManager<L>) -> Result<Vec<usize>, EcsError> {
        Ok(vec![A::column_index(ecs)?, B::column_index(ecs)?])
    }

    fn validate_access() {
        if (A::MUTABLE || B::MUTABLE) && A::type_of() == B::type_of() {
            if A::MUTABLE && B::MUTABLE {
                panic!("view contains duplicate mutable access to the same component type");
            }
            panic!(
                "view contains overlapping read and mutable access to the same component type"
            );
        }
    }

    unsafe fn base_ptrs(ecs: *mut EcsManager<L>, columns: &[usize]) -> Self::Ptrs {
        unsafe { (A::base_ptr(ecs, columns[0]), B::base_ptr(ecs, columns[1])) }
    }

    unsafe fn fetch_row<'w>(ptrs: Self::Ptrs, slot: usize) -> Self::Item<'w> {
        unsafe { (A::fetch(ptrs.0, slot), B::fetch(ptrs.1, slot)) }
    }
}

impl<L: ComponentSet, A: ViewItem<L>, B: ViewItem<L>, C: ViewItem<L>> ViewQuery<L> for (A, B, C) {
    type Item<'w> = (A::Item<'w>, B::Item<'w>, C::Item<'w>);
    type Ptrs = (A::Ptr, B::Ptr, C::Ptr);
    const HAS_MUTABLE: bool = A::MUTABLE || B::MUTABLE || C::MUTABLE;

    fn column_indices(ecs: &EcsManager<L>) -> Result<Vec<usize>, EcsError> {
        Ok(vec![
            A::column_index(ecs)?,
            B::column_index(ecs)?,
            C::column_index(ecs)?,
        ])
    }

    fn validate_access() {
        let items = [
            (A::MUTABLE, A::type_of()),
            (B::MUTABLE, B::type_of()),
            (C::MUTABLE, C::type_of()),
        ];
        validate_no_access_conflicts(&items);
    }

    unsafe fn base_ptrs(ecs: *mut EcsManager<L>, columns: &[usize]) -> Self::Ptrs {
        unsafe {
            (
                A::base_ptr(ecs, columns[0]),
                B::base_ptr(ecs, columns[1]),
                C::base_ptr(ecs, columns[2]),
            )
        }
    }

    unsafe fn fetch_row<'w>(ptrs: Self::Ptrs, slot: usize) -> Self::Item<'w> {
        unsafe {
            (
                A::fetch(ptrs.0, slot),
                B::fetch(ptrs.1, slot),
                C::fetch(ptrs.2, slot),
            )
        }
    }
}

impl<L: ComponentSet, A: ViewItem<L>, B: ViewItem<L>, C: ViewItem<L>, D: ViewItem<L>> ViewQuery<L>
    for (A, B, C, D)
{
    type Item<'w> = (A::Item<'w>, B::Item<'w>, C::Item<'w>, D::Item<'w>);
    type Ptrs = (A::Ptr, B::Ptr, C::Ptr, D::Ptr);
    const HAS_MUTABLE: bool = A::MUTABLE || B::MUTABLE || C::MUTABLE || D::MUTABLE;

    fn column_indices(ecs: &EcsManager<L>) -> Result<Vec<usize>, EcsError> {
        Ok(vec![
            A::column_index(ecs)?,
            B::column_index(ecs)?,
            C::column_index(ecs)?,
            D::column_index(ecs)?,
        ])
    }

    fn validate_access() {
        let items = [
            (A::MUTABLE, A::type_of()),
            (B::MUTABLE, B::type_of()),
            (C::MUTABLE, C::type_of()),
            (D::MUTABLE, D::type_of()),
        ];
        validate_no_access_conflicts(&items);
    }

    unsafe fn base_ptrs(ecs: *mut EcsManager<L>, columns: &[usize]) -> Self::Ptrs {
        unsafe {
            (
                A::base_ptr(ecs, columns[0]),
                B::base_ptr(ecs, columns[1]),
                C::base_ptr(ecs, columns[2]),
                D::base_ptr(ecs, columns[3]),
            )
        }
    }

    unsafe fn fetch_row<'w>(ptrs: Self::Ptrs, slot: usize) -> Self::Item<'w> {
        unsafe {
            (
                A::fetch(ptrs.0, slot),
                B::fetch(ptrs.1, slot),
                C::fetch(ptrs.2, slot),
                D::fetch(ptrs.3, slot),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Scan bounds
// ---------------------------------------------------------------------------

/// Resolve a view's column indices, panicking on an undeclared type -- asking
/// for a type outside the store's set is caller misuse, not a runtime state.
fn resolve_columns<L: ComponentSet, Q: ViewQuery<L>>(ecs: &EcsManager<L>) -> Vec<usize> {
    Q::column_indices(ecs).unwrap_or_else(|err| panic!("{err}"))
}

/// Half-open scan bounds for one partition, pruned by the occupancy
/// intervals of the requested columns. `None` means the view is empty.
///
/// Partitions split `[0, frontier)` into `total_parts` contiguous ranges of
/// `frontier / total_parts` slots each, with the remainder going to the last
/// partition.
fn pruned_bounds<L: ComponentSet>(
    ecs: &EcsManager<L>,
    columns: &[usize],
    part: usize,
    total_parts: usize,
) -> Option<(usize, usize)> {
    let frontier = ecs.frontier();
    let part_len = frontier / total_parts;
    let part_start = part * part_len;
    let part_end = if part + 1 == total_parts {
        frontier
    } else {
        part_start + part_len
    };

    let (first, last) = ecs.ranges.combine(columns)?;
    let start = part_start.max(first);
    let end = part_end.min(last + 1);
    (start < end).then_some((start, end))
}

fn slot_matches<L: ComponentSet>(ecs: &EcsManager<L>, columns: &[usize], slot: usize) -> bool {
    ecs.slots.is_active(slot) && columns.iter().all(|&column| ecs.presence.get(slot, column))
}

// ---------------------------------------------------------------------------
// View (read-only)
// ---------------------------------------------------------------------------

/// A restartable, non-owning view over the entities holding all of `Q`'s
/// component types, optionally restricted to one partition of the slot space.
///
/// The view is lazy: scan bounds are recomputed by every [`iter`](Self::iter)
/// call, so restarting after the store changed reflects current state rather
/// than a snapshot. Column indices are resolved eagerly, so a request for an
/// undeclared type fails at construction, before anything is iterated.
pub struct View<'w, L: ComponentSet, Q: ViewQuery<L>> {
    ecs: &'w EcsManager<L>,
    columns: Vec<usize>,
    part: usize,
    total_parts: usize,
    _marker: PhantomData<Q>,
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> View<'w, L, Q> {
    fn new(ecs: &'w EcsManager<L>, part: usize, total_parts: usize) -> Self {
        assert!(total_parts >= 1, "total_parts must be at least 1");
        assert!(
            part < total_parts,
            "partition {part} out of range for {total_parts} partitions"
        );
        let columns = resolve_columns::<L, Q>(ecs);
        Self {
            ecs,
            columns,
            part,
            total_parts,
            _marker: PhantomData,
        }
    }

    /// Start (or restart) iteration. An empty view yields nothing; that is a
    /// normal outcome, not an error.
    pub fn iter(&self) -> ViewIter<'w, L, Q> {
        // Safety: this view is read-only (mutable items are rejected before
        // construction), so the cast pointer is only ever read through.
        let ptrs = unsafe {
            Q::base_ptrs(
                self.ecs as *const EcsManager<L> as *mut EcsManager<L>,
                &self.columns,
            )
        };
        let bounds = pruned_bounds(self.ecs, &self.columns, self.part, self.total_parts);
        ViewIter::new(self.ecs, self.columns.clone(), ptrs, bounds)
    }
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> IntoIterator for &View<'w, L, Q> {
    type Item = (EntityId, Q::Item<'w>);
    type IntoIter = ViewIter<'w, L, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// ViewMut (exclusive)
// ---------------------------------------------------------------------------

/// Like [`View`], but constructed from `&mut EcsManager`, which makes `&mut T`
/// items sound: the view holds the store's unique borrow for its lifetime.
pub struct ViewMut<'w, L: ComponentSet, Q: ViewQuery<L>> {
    ecs: &'w mut EcsManager<L>,
    columns: Vec<usize>,
    part: usize,
    total_parts: usize,
    _marker: PhantomData<Q>,
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> ViewMut<'w, L, Q> {
    fn new(ecs: &'w mut EcsManager<L>, part: usize, total_parts: usize) -> Self {
        assert!(total_parts >= 1, "total_parts must be at least 1");
        assert!(
            part < total_parts,
            "partition {part} out of range for {total_parts} partitions"
        );
        let columns = resolve_columns::<L, Q>(ecs);
        Self {
            ecs,
            columns,
            part,
            total_parts,
            _marker: PhantomData,
        }
    }

    /// Start (or restart) iteration.
    pub fn iter(&mut self) -> ViewIter<'_, L, Q> {
        // Capture column pointers from the exclusive borrow before the
        // shared reborrow below; fetches go through the pointers only.
        let ecs_ptr: *mut EcsManager<L> = self.ecs;
        // Safety: `ecs_ptr` comes from the unique `&mut` this view holds,
        // and no other store reference exists at this point.
        let ptrs = unsafe { Q::base_ptrs(ecs_ptr, &self.columns) };
        let ecs: &EcsManager<L> = self.ecs;
        let bounds = pruned_bounds(ecs, &self.columns, self.part, self.total_parts);
        ViewIter::new(ecs, self.columns.clone(), ptrs, bounds)
    }
}

impl<'w, 'v, L: ComponentSet, Q: ViewQuery<L>> IntoIterator for &'v mut ViewMut<'w, L, Q> {
    type Item = (EntityId, Q::Item<'v>);
    type IntoIter = ViewIter<'v, L, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// ViewIter
// ---------------------------------------------------------------------------

/// Forward-only iterator yielding `(EntityId, (refs...))` for each slot in
/// the pruned range that is active and has every requested component.
///
/// The store reference is used for activity and presence reads only;
/// component values are fetched through the column pointers captured at
/// construction time.
pub struct ViewIter<'w, L: ComponentSet, Q: ViewQuery<L>> {
    ecs: &'w EcsManager<L>,
    columns: Vec<usize>,
    ptrs: Q::Ptrs,
    cursor: usize,
    end: usize,
    _marker: PhantomData<Q>,
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> ViewIter<'w, L, Q> {
    fn new(
        ecs: &'w EcsManager<L>,
        columns: Vec<usize>,
        ptrs: Q::Ptrs,
        bounds: Option<(usize, usize)>,
    ) -> Self {
        let (cursor, end) = bounds.unwrap_or((0, 0));
        Self {
            ecs,
            columns,
            ptrs,
            cursor,
            end,
            _marker: PhantomData,
        }
    }
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> Iterator for ViewIter<'w, L, Q> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.end {
            let slot = self.cursor;
            self.cursor += 1;
            if slot_matches(self.ecs, &self.columns, slot) {
                // Safety: `slot` is inside the frontier, so every column has
                // storage for it; each matching slot is yielded once, so no
                // two live borrows name the same value.
                let row = unsafe { Q::fetch_row(self.ptrs, slot) };
                return Some((EntityId::new(slot), row));
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// ViewPartMut -- one partition for parallel consumption
// ---------------------------------------------------------------------------

/// One index-disjoint partition of a mutable view, handed out by
/// [`EcsManager::view_parts_mut`] for consumption on an independent worker.
///
/// Bounds are fixed when the partitions are created; the structural freeze
/// contract (no entity/component add/remove during the parallel phase) makes
/// that safe.
pub struct ViewPartMut<'w, L: ComponentSet, Q: ViewQuery<L>> {
    inner: ViewIter<'w, L, Q>,
    part: usize,
}

// Safety: the captured column pointers are the only write path, partitions
// never fetch the same slot, and component types are `Send + Sync` by the
// `Component` bound. The shared store reference is used for presence and
// activity reads only, which no thread mutates while partitions are alive.
unsafe impl<'w, L: ComponentSet, Q: ViewQuery<L>> Send for ViewPartMut<'w, L, Q> {}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> ViewPartMut<'w, L, Q> {
    /// Which partition this is, in `[0, total_parts)`.
    pub fn part(&self) -> usize {
        self.part
    }
}

impl<'w, L: ComponentSet, Q: ViewQuery<L>> Iterator for ViewPartMut<'w, L, Q> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

// ---------------------------------------------------------------------------
// EcsManager view methods
// ---------------------------------------------------------------------------

impl<L: ComponentSet> EcsManager<L> {
    /// A read-only view over the full slot range.
    ///
    /// # Panics
    ///
    /// Panics if `Q` contains mutable items (use [`view_mut`](Self::view_mut))
    /// or requests a type outside the declared set.
    pub fn view<Q: ViewQuery<L>>(&self) -> View<'_, L, Q> {
        self.view_part(0, 1)
    }

    /// A read-only view restricted to the `part`-th of `total_parts`
    /// contiguous partitions of the slot range.
    ///
    /// # Panics
    ///
    /// Panics on mutable items, an undeclared type, `total_parts == 0`, or
    /// `part >= total_parts`.
    pub fn view_part<Q: ViewQuery<L>>(&self, part: usize, total_parts: usize) -> View<'_, L, Q> {
        assert!(
            !Q::HAS_MUTABLE,
            "EcsManager::view() cannot be used with mutable view items (&mut T). \
             Use EcsManager::view_mut() instead, which requires &mut self."
        );
        View::new(self, part, total_parts)
    }

    /// A mutable view over the full slot range. Takes `&mut self`, which
    /// guarantees exclusive access and makes `&mut T` items sound.
    ///
    /// # Panics
    ///
    /// Panics if the same component type is borrowed mutably more than once
    /// in `Q`, or if `Q` requests a type outside the declared set.
    pub fn view_mut<Q: ViewQuery<L>>(&mut self) -> ViewMut<'_, L, Q> {
        self.view_part_mut(0, 1)
    }

    /// A mutable view restricted to one partition of the slot range.
    ///
    /// # Panics
    ///
    /// As [`view_mut`](Self::view_mut), plus `total_parts == 0` or
    /// `part >= total_parts`.
    pub fn view_part_mut<Q: ViewQuery<L>>(
        &mut self,
        part: usize,
        total_parts: usize,
    ) -> ViewMut<'_, L, Q> {
        Q::validate_access();
        ViewMut::new(self, part, total_parts)
    }

    /// Split the slot range into `total_parts` index-disjoint mutable
    /// partitions for parallel consumption.
    ///
    /// The parts may be moved to independent threads and consumed
    /// concurrently: partitions never overlap, so no two workers can touch
    /// the same component value, and fetches go through column pointers
    /// captured here rather than back through the store. The caller must
    /// keep the entity/component structure frozen until every part is
    /// dropped; the `&mut self` borrow enforces that on this store handle.
    ///
    /// # Panics
    ///
    /// As [`view_mut`](Self::view_mut), plus `total_parts == 0`.
    pub fn view_parts_mut<Q: ViewQuery<L>>(
        &mut self,
        total_parts: usize,
    ) -> Vec<ViewPartMut<'_, L, Q>> {
        assert!(total_parts >= 1, "total_parts must be at least 1");
        Q::validate_access();
        let columns = resolve_columns::<L, Q>(self);
        // Capture the column pointers from the exclusive borrow before the
        // shared reborrow the iterators hold; every partition shares the
        // same bases and offsets them into its own disjoint slot range.
        let ecs_ptr: *mut EcsManager<L> = self;
        // Safety: `ecs_ptr` comes from this method's unique `&mut self` and
        // no other store reference exists at this point.
        let ptrs = unsafe { Q::base_ptrs(ecs_ptr, &columns) };
        let ecs: &EcsManager<L> = self;
        (0..total_parts)
            .map(|part| {
                let bounds = pruned_bounds(ecs, &columns, part, total_parts);
                ViewPartMut {
                    inner: ViewIter::new(ecs, columns.clone(), ptrs, bounds),
                    part,
                }
            })
            .collect()
    }

    /// Fetch several components of one entity at once, in request order:
    /// `let (pos, vel) = ecs.get_components::<(&Pos, &Vel)>(id)?;`
    ///
    /// # Panics
    ///
    /// Panics if `Q` contains mutable items; mutate through
    /// [`get_component_mut`](Self::get_component_mut) or a view instead.
    pub fn get_components<Q: ViewQuery<L>>(&self, id: EntityId) -> Result<Q::Item<'_>, EcsError> {
        assert!(
            !Q::HAS_MUTABLE,
            "EcsManager::get_components() cannot be used with mutable items (&mut T)."
        );
        let columns = Q::column_indices(self)?;
        let slot = self.require_active(id)?;
        for &column in &columns {
            if !self.presence.get(slot, column) {
                return Err(EcsError::NotPresent {
                    component: self.component_names()[column],
                    entity: id,
                });
            }
        }
        // Safety: read-only items only, and `slot` is a live slot inside
        // the frontier, so every column has storage for it.
        unsafe {
            let ptrs = Q::base_ptrs(self as *const Self as *mut Self, &columns);
            Ok(Q::fetch_row(ptrs, slot))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
