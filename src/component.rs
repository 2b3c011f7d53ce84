//! Component type constraints and column storage.
//!
//! The store is parameterized by a tuple of component types declared once at
//! construction. Each declared type gets one densely packed column, index-
//! aligned with the slot space; all columns grow in lockstep. Columns are
//! held type-erased behind [`AnyColumn`] and recovered with a downcast, with
//! a `TypeId`-to-index map resolved when the store is built.

use std::any::{Any, TypeId};

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Constraint on every storable component type.
///
/// Components must be independently default-constructible value types; slots
/// are filled with `T::default()` when the storage grows and overwritten on
/// add. The `'static` bound rejects references and other borrowed types, and
/// `Send + Sync` underwrites the partitioned-parallel iteration contract.
pub trait Component: Default + Send + Sync + 'static {}

impl<T: Default + Send + Sync + 'static> Component for T {}

// ---------------------------------------------------------------------------
// Column storage
// ---------------------------------------------------------------------------

/// One densely packed column of a single component type.
///
/// `data[slot]` is meaningful only while the slot is active and the matching
/// presence flag is set; otherwise it holds stale leftover data that must not
/// be read. Removal never resets entries.
#[derive(Debug)]
pub struct Column<T: Component> {
    pub(crate) data: Vec<T>,
}

impl<T: Component> Column<T> {
    fn new() -> Self {
        Self { data: Vec::new() }
    }
}

/// Object-safe face of [`Column<T>`], used so heterogeneous columns can live
/// in one `Vec` and grow together without knowing their element types.
pub trait AnyColumn: Send + Sync {
    /// Append one default-constructed entry.
    fn push_default(&mut self);
    /// Number of entries (equals the backing slot count).
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyColumn for Column<T> {
    fn push_default(&mut self) {
        self.data.push(T::default());
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// ComponentSet -- the declared type list
// ---------------------------------------------------------------------------

/// A fixed, compile-time-known list of component types, expressed as a tuple.
///
/// Implemented for tuples of 1 to 8 [`Component`] types. The membership query
/// [`contains`](ComponentSet::contains) is usable without a store instance:
/// `EcsManager::<(Pos, Vel)>::contains::<Pos>()`.
pub trait ComponentSet: Send + Sync + 'static {
    /// Number of types in the set.
    const LEN: usize;

    /// Whether `T` is one of the declared types.
    fn contains<T: 'static>() -> bool;

    /// The `TypeId` of each declared type, in declaration order.
    fn type_ids() -> Vec<TypeId>;

    /// `std::any::type_name` of each declared type, in declaration order.
    fn type_names() -> Vec<&'static str>;

    /// One empty column per declared type, in declaration order.
    fn build_columns() -> Vec<Box<dyn AnyColumn>>;
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            const LEN: usize = impl_component_set!(@count $($ty),+);

            fn contains<T: 'static>() -> bool {
                $(TypeId::of::<$ty>() == TypeId::of::<T>())||+
            }

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$ty>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$ty>()),+]
            }

            fn build_columns() -> Vec<Box<dyn AnyColumn>> {
                vec![$(Box::new(Column::<$ty>::new())),+]
            }
        }
    };
    (@count $head:ident $(, $tail:ident)*) => {
        1 $(+ impl_component_set!(@one $tail))*
    };
    (@one $ty:ident) => { 1 };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

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

    #[test]
    fn membership_is_static() {
        assert!(<(Pos, Vel) as ComponentSet>::contains::<Pos>());
        assert!(<(Pos, Vel) as ComponentSet>::contains::<Vel>());
        assert!(!<(Pos, Vel) as ComponentSet>::contains::<u64>());
        assert!(!<(Pos,) as ComponentSet>::contains::<Vel>());
    }

    #[test]
    fn columns_match_declaration_order() {
        let columns = <(Pos, Vel) as ComponentSet>::build_columns();
        assert_eq!(columns.len(), 2);
        assert!(columns[0].as_any().downcast_ref::<Column<Pos>>().is_some());
        assert!(columns[1].as_any().downcast_ref::<Column<Vel>>().is_some());
        assert_eq!(<(Pos, Vel) as ComponentSet>::LEN, 2);
    }

    #[test]
    fn columns_grow_with_defaults() {
        let mut columns = <(Pos,) as ComponentSet>::build_columns();
        columns[0].push_default();
        columns[0].push_default();
        let column = columns[0].as_any().downcast_ref::<Column<Pos>>().unwrap();
        assert_eq!(column.data.len(), 2);
        assert_eq!(column.data[1], Pos::default());
    }
}
