//! Strong, zero-cost handles for mesh entities
//!
//! Cells and vertices carry *global* indices: the same cell or vertex has the
//! same id on every rank that knows about it. This is what lets the reductions
//! compare results from different partitions (for example the tie-break on a
//! shared vertex, or the "visit each face once" rule of the COD sampler).
//!
//! Both handles are `repr(transparent)` over `usize`.

use std::fmt;

/// Boundary indicator attached to faces on the domain boundary.
pub type BoundaryId = i32;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Wrap a raw global index.
            #[inline]
            pub const fn new(raw: usize) -> Self {
                Self(raw)
            }

            /// Returns the raw global index.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> usize {
                id.0
            }
        }
    };
}

entity_id!(
    /// Global index of a mesh cell.
    CellId
);
entity_id!(
    /// Global index of a mesh vertex.
    VertexId
);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_raw_index() {
        assert!(CellId::new(3) < CellId::new(7));
        let mut ids = vec![VertexId::new(5), VertexId::new(1), VertexId::new(3)];
        ids.sort();
        assert_eq!(ids, vec![VertexId::new(1), VertexId::new(3), VertexId::new(5)]);
    }

    #[test]
    fn formatting() {
        let c = CellId::new(42);
        assert_eq!(format!("{c:?}"), "CellId(42)");
        assert_eq!(format!("{c}"), "42");
        assert_eq!(usize::from(VertexId::new(9)), 9);
    }
}
