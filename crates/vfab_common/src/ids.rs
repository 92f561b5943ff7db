//! Opaque ID newtypes for simulation entities.
//!
//! Every id is a thin `u32` wrapper that is `Copy`, `Hash`, `Ord`, and
//! `Serialize`/`Deserialize`. Ids that index an [`Arena`](crate::Arena) also
//! implement [`ArenaId`](crate::ArenaId).

/// Declares an opaque `u32` id newtype with `from_raw`/`as_raw`, `Display`,
/// and an [`ArenaId`](crate::ArenaId) implementation.
///
/// Crates outside `vfab_common` may use this to declare their own ids.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub const fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Index of a physical FPGA within a simulation run.
    FpgaId
);

define_id!(
    /// Index of a region within its fabric, in declaration order.
    RegionId
);

define_id!(
    /// Handle to a virtual FPGA instance in the coordinator's arena.
    VFpgaId
);

define_id!(
    /// Logical id of a configuration task. Ids start at 1; slot value 0 means free.
    TaskId
);

define_id!(
    /// Catalog id of an accelerator template (and its netlist).
    AcceleratorId
);

define_id!(
    /// Id of a cloudlet (a workload submitted to a VM).
    CloudletId
);

define_id!(
    /// Id of a segment, unique within its cloudlet.
    SegmentId
);

define_id!(
    /// Handle to a PLL acquired from a fabric's clock manager.
    PllId
);
