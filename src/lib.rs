//! Colonnade -- slot-based, column-oriented entity component storage.
//!
//! Entities are rows and component types are columns. Every declared
//! component type gets one typed column holding a slot-parallel `Vec<T>`;
//! a presence matrix records which entity actually holds which component.
//! An entity's handle *is* its slot index, so component lookup is a direct
//! indexed access with no per-entity indirection. Iteration walks the slot
//! space, pruned by per-column occupancy intervals, and can be split into
//! index-disjoint partitions for parallel mutation.
//!
//! # Quick Start
//!
//! ```
//! use colonnade::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! // The component set is declared up front, as a type.
//! let mut ecs = EcsManager::<(Position, Velocity)>::new();
//!
//! let e = ecs.create_entity_with((
//!     Position { x: 0.0, y: 0.0 },
//!     Velocity { dx: 1.0, dy: 0.0 },
//! ))?;
//!
//! for (_id, (pos, vel)) in &mut ecs.view_mut::<(&mut Position, &Velocity)>() {
//!     pos.x += vel.dx;
//! }
//!
//! assert_eq!(ecs.get_component::<Position>(e)?.x, 1.0);
//! # Ok::<(), colonnade::EcsError>(())
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod manager;
pub mod presence;
pub mod range;
#[allow(unsafe_code)]
pub mod view;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by storage operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A bounded store has every slot live; creating another entity requires
    /// removing one first.
    #[error("store is full: all {capacity} slots are live")]
    CapacityExceeded { capacity: usize },

    /// The null handle was passed where a real entity was required.
    #[error("null entity handle")]
    NullHandle,

    /// The handle's slot lies beyond the store's frontier, so it cannot name
    /// any entity this store ever created.
    #[error("slot {slot} is out of range (frontier is {frontier})")]
    OutOfRange { slot: usize, frontier: usize },

    /// The handle's slot is within range but not currently live -- the
    /// entity was removed.
    #[error("entity {entity:?} is not active")]
    EntityNotActive { entity: entity::EntityId },

    /// The entity already holds this component; remove it before adding a
    /// new value.
    #[error("component '{component}' is already present on entity {entity:?}")]
    AlreadyPresent {
        component: &'static str,
        entity: entity::EntityId,
    },

    /// The entity does not hold this component.
    #[error("component '{component}' is not present on entity {entity:?}")]
    NotPresent {
        component: &'static str,
        entity: entity::EntityId,
    },

    /// A component type was referenced that is not in the store's declared
    /// type set.
    #[error("component type '{component}' is not declared in this store's type set")]
    UnknownComponent { component: &'static str },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentSet};
    pub use crate::entity::EntityId;
    pub use crate::manager::{ComponentValues, EcsManager, SlotRecord};
    pub use crate::view::{View, ViewItem, ViewIter, ViewMut, ViewPartMut, ViewQuery};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
